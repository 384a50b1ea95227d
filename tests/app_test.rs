use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use survey_dashboard::app::{AppState, router};
use survey_dashboard::config::ServerConfig;
use survey_dashboard::dataset::Dataset;
use survey_dashboard::session::hash_password;
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;

const PASSWORD: &str = "redazione";

struct TestServer {
    app: Router,
    state: Arc<AppState>,
    dir: TempDir,
}

impl TestServer {
    fn new(editor: bool) -> Self {
        let dir = tempdir().expect("temp dir");
        let config = ServerConfig {
            data_dir: Path::new(env!("CARGO_MANIFEST_DIR")).join("data"),
            snapshot: dir.path().join("database").join("dataset.bin.gz"),
            homepage: dir.path().join("HOMEPAGE.md"),
            editor_hash: editor.then(|| hash_password(PASSWORD).expect("hash")),
            ..ServerConfig::default()
        };
        let state = Arc::new(AppState::new(config, Dataset::default()).expect("valid config"));
        TestServer {
            app: router(Arc::clone(&state)),
            state,
            dir,
        }
    }

    fn homepage(&self) -> PathBuf {
        self.dir.path().join("HOMEPAGE.md")
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> (StatusCode, HeaderMap, Bytes) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self.app.clone().oneshot(request).await.expect("infallible service");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        (status, headers, bytes)
    }

    async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let (status, _, bytes) = self.send("GET", uri, None, None).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn import(&self) {
        let (status, _, bytes) = self.send("POST", "/api/import", None, None).await;
        assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&bytes));
    }

    async fn login(&self) -> String {
        let (status, headers, bytes) = self
            .send("POST", "/api/login", Some(json!({ "password": PASSWORD })), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let cookie = headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("session cookie set");
        assert!(cookie.starts_with("session_id="));
        let body: Value = serde_json::from_slice(&bytes).expect("login json");
        body["token"].as_str().expect("token").to_string()
    }
}

#[tokio::test]
async fn health_reports_counts() {
    let server = TestServer::new(false);
    let (status, body) = server.get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["student_responses"], 0);

    server.import().await;
    let (_, body) = server.get_json("/health").await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["student_responses"], 24);
    assert_eq!(body["teacher_responses"], 18);
}

#[tokio::test]
async fn import_clears_cached_responses() {
    let server = TestServer::new(false);
    server.import().await;

    let (status, body) = server.get_json("/api/students").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_responses"], 24);
    server.get_json("/api/teachers?include_non_teaching=true").await;
    assert_eq!(server.state.cache_stats().total_keys, 2);

    server.get_json("/api/students").await;
    assert_eq!(server.state.cache_stats().hits, 1);

    server.import().await;
    assert_eq!(server.state.cache_stats().total_keys, 0);
    assert!(server.dir.path().join("database/dataset.bin.gz").exists(), "snapshot refreshed");

    let (_, stats) = server.get_json("/api/cache/stats").await;
    assert_eq!(stats["total_keys"], 0);
}

#[tokio::test]
async fn teacher_filters_select_category() {
    let server = TestServer::new(false);
    server.import().await;

    let (_, active) = server.get_json("/api/teachers").await;
    let (_, training) = server.get_json("/api/teachers?only_non_teaching=true").await;
    let (_, all) = server.get_json("/api/teachers?include_non_teaching=true").await;
    assert_eq!(active["total_responses"], 12);
    assert_eq!(training["total_responses"], 6);
    assert_eq!(all["total_responses"], 18);
}

#[tokio::test]
async fn statistics_endpoints() {
    let server = TestServer::new(false);
    server.import().await;

    let (status, ci) = server.get_json("/api/statistics/comparison-with-ci").await;
    assert_eq!(status, StatusCode::OK);
    assert!(ci["comparisons"].as_array().is_some_and(|c| !c.is_empty()));

    let (status, matrix) = server
        .get_json("/api/statistics/correlation-matrix/teacher?method=spearman")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(matrix["method"], "spearman");
    assert_eq!(matrix["respondent_type"], "teacher");

    let (status, error) = server.get_json("/api/statistics/correlation-matrix/parent").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["detail"].as_str().is_some_and(|d| d.contains("parent")));

    let (status, _) = server
        .get_json("/api/statistics/correlation-matrix/student?method=kendall")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, stats) = server.get_json("/api/questions/student/7/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["response_format"], "scale_1_7");

    let (status, _) = server.get_json("/api/questions/teacher/9/stats?teacher_type=retired").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server.get_json("/api/respondent/X999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn charts_and_exports() {
    let server = TestServer::new(false);
    server.import().await;

    let (status, headers, body) = server
        .send("GET", "/charts/correlation/student.svg?grouped=true&min_correlation=0.3", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/svg+xml");
    assert!(String::from_utf8_lossy(&body).contains("<svg"));

    let (status, _, _) = server.send("GET", "/charts/questions/student/7/boxplot.svg", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = server.send("GET", "/charts/questions/student/27/boxplot.svg", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = server.send("GET", "/charts/comparison.svg", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, headers, body) = server.send("GET", "/api/export/comparison.csv", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_DISPOSITION].to_str().is_ok_and(|d| d.contains("confronto.csv")));
    assert!(body.starts_with(b"variable,label"));

    let (status, _, body) = server.send("GET", "/api/export/correlation/teacher.xlsx", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with(b"PK"));

    let (status, _, _) = server.send("GET", "/api/export/correlation/teacher.pdf", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn homepage_editing_requires_a_session() {
    let server = TestServer::new(true);

    let (status, _) = server.get_json("/api/homepage").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    std::fs::write(server.homepage(), "# Benvenuti\n").expect("homepage written");
    let (status, page) = server.get_json("/api/homepage").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["content"], "# Benvenuti\n");

    let update = json!({ "content": "# Nuovo testo\n" });
    let (status, _, _) = server.send("POST", "/api/homepage", Some(update.clone()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = server
        .send("POST", "/api/login", Some(json!({ "password": "sbagliata" })), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let token = server.login().await;
    let (status, _, body) = server.send("POST", "/api/homepage", Some(update), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).expect("update json");
    assert_eq!(body["success"], true);
    assert_eq!(
        std::fs::read_to_string(server.homepage()).expect("homepage readable"),
        "# Nuovo testo\n"
    );

    let backups = std::fs::read_dir(server.dir.path())
        .expect("temp dir readable")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("HOMEPAGE_backup_"))
        .count();
    assert_eq!(backups, 1);

    let (status, _, _) = server
        .send("POST", "/api/homepage", Some(json!({ "content": "   " })), Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = server.send("POST", "/api/logout", None, Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _, _) = server
        .send("POST", "/api/homepage", Some(json!({ "content": "x" })), Some(&token))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_is_refused_when_editing_is_disabled() {
    let server = TestServer::new(false);
    let (status, _, _) = server
        .send("POST", "/api/login", Some(json!({ "password": PASSWORD })), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(server.state.sessions().is_empty());
}
