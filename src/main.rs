#![cfg(not(tarpaulin_include))]

use anyhow::Context;
use clap::{Parser, Subcommand};
use survey_dashboard::config::ServerConfig;
use survey_dashboard::{app, importer, session, snapshot};

#[derive(Parser)]
#[command(name = "survey-dashboard")]
#[command(about = "Statistics server of the AI-in-education survey dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    server: ServerConfig,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Import the CSV exports and write the snapshot without serving
    Import,
    /// Print the Argon2 hash of a password, for DASHBOARD_EDITOR_HASH
    HashPassword { password: String },
}

/// Main entry point of the statistics server
///
/// Logging goes through `env_logger`; set `RUST_LOG` to change the level
/// (default `info`).
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            app::run(cli.server).await.context("server stopped with an error")?;
        }
        Commands::Import => {
            let dataset = importer::import_dir(&cli.server.data_dir)
                .with_context(|| format!("failed to import {}", cli.server.data_dir.display()))?;
            snapshot::save_dataset(&dataset, &cli.server.snapshot)
                .with_context(|| format!("failed to write {}", cli.server.snapshot.display()))?;
            println!(
                "Imported {} students and {} teachers into {}",
                dataset.students.len(),
                dataset.teachers.len(),
                cli.server.snapshot.display()
            );
        }
        Commands::HashPassword { password } => {
            println!("{}", session::hash_password(&password)?);
        }
    }
    Ok(())
}
