//! Command-line and environment configuration of the server and the client.

use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default address of the statistics server
pub const DEFAULT_API_URL: &str = "http://localhost:8118";

/// Settings of the statistics server
#[derive(Args, Clone, Debug)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "DASHBOARD_BIND", default_value = "127.0.0.1:8118")]
    pub bind: SocketAddr,

    /// Directory holding students.csv and teachers.csv
    #[arg(long, env = "DASHBOARD_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Compressed snapshot of the imported dataset
    #[arg(long, env = "DASHBOARD_SNAPSHOT", default_value = "database/dataset.bin.gz")]
    pub snapshot: PathBuf,

    /// Lifetime of cached responses, in seconds
    #[arg(long = "cache-ttl", env = "CACHE_TTL", default_value_t = 3600)]
    pub cache_ttl_secs: u64,

    /// Markdown file served as the dashboard homepage
    #[arg(long, env = "HOMEPAGE_PATH", default_value = "HOMEPAGE.md")]
    pub homepage: PathBuf,

    /// Argon2 PHC string of the editor password; editing is disabled when unset
    #[arg(long, env = "DASHBOARD_EDITOR_HASH", hide_env_values = true)]
    pub editor_hash: Option<String>,

    /// Comma-separated list of allowed CORS origins
    #[arg(
        long,
        env = "CORS_ORIGINS",
        default_value = "http://localhost:5180,http://localhost:5173",
        value_delimiter = ','
    )]
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: SocketAddr::from(([127, 0, 0, 1], 8118)),
            data_dir: PathBuf::from("data"),
            snapshot: PathBuf::from("database/dataset.bin.gz"),
            cache_ttl_secs: 3600,
            homepage: PathBuf::from("HOMEPAGE.md"),
            editor_hash: None,
            cors_origins: vec![
                "http://localhost:5180".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

/// Settings of the dashboard client
#[derive(Args, Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the statistics server
    #[arg(long, env = "DASHBOARD_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Per-request timeout, in seconds
    #[arg(long = "timeout", env = "DASHBOARD_TIMEOUT", default_value_t = 30)]
    pub timeout_secs: u64,

    /// File holding the editor session token
    #[arg(long, env = "DASHBOARD_SESSION_FILE", default_value = ".dashboard-session")]
    pub session_file: PathBuf,
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            session_file: PathBuf::from(".dashboard-session"),
        }
    }
}
