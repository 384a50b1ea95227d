use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard};
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::analytics;
use crate::cache::{CacheStats, ResponseCache};
use crate::config::ServerConfig;
use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use crate::export;
use crate::graph::boxplot::{self, BoxSeries, DomainMode};
use crate::graph::heatmap::{self, HeatmapFilter};
use crate::graph::{ChartOptions, error_bars};
use crate::importer;
use crate::model::{
    CorrelationMatrix, CorrelationMethod, ErrorBody, HealthStatus, HomepageContent, HomepageUpdate,
    ImportSummary, LabeledQuartiles, LoginResponse, QuestionCatalog, QuestionStatsResponse,
    RespondentType, ResponseFormat, TeacherCategory, TeacherFilter,
};
use crate::questions;
use crate::session::{EditorCredentials, SessionStore};
use crate::snapshot;

/// Cookie carrying the editor session token, as an alternative to the
/// `Authorization` header
pub const SESSION_COOKIE: &str = "session_id";

/// Shared state of every handler
pub struct AppState {
    config: ServerConfig,
    dataset: RwLock<Dataset>,
    cache: Mutex<ResponseCache>,
    sessions: SessionStore,
    editor: EditorCredentials,
}

impl AppState {
    pub fn new(config: ServerConfig, dataset: Dataset) -> Result<Self> {
        let editor = EditorCredentials::new(config.editor_hash.clone())?;
        let cache = ResponseCache::new(config.cache_ttl());
        Ok(AppState {
            config,
            dataset: RwLock::new(dataset),
            cache: Mutex::new(cache),
            sessions: SessionStore::default(),
            editor,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn dataset(&self) -> RwLockReadGuard<'_, Dataset> {
        self.dataset.read().unwrap_or_else(|e| e.into_inner())
    }

    fn cache(&self) -> MutexGuard<'_, ResponseCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache().stats()
    }

    /// Serve `key` from the cache, computing and storing it on a miss
    fn cached<T, F>(&self, key: &str, compute: F) -> Result<serde_json::Value>
    where
        T: Serialize,
        F: FnOnce(&Dataset) -> Result<T>,
    {
        if let Some(hit) = self.cache().get(key) {
            return Ok(hit);
        }
        let value = serde_json::to_value(compute(&*self.dataset())?)?;
        self.cache().set(key, value.clone());
        Ok(value)
    }

    /// Re-read the CSV exports, swap the dataset in and drop every cached response
    ///
    /// The snapshot is refreshed too; failing to write it is logged, not fatal.
    pub fn import(&self) -> Result<ImportSummary> {
        let fresh = importer::import_dir(&self.config.data_dir)?;
        if let Err(e) = snapshot::save_dataset(&fresh, &self.config.snapshot) {
            warn!("Could not write snapshot {}: {}", self.config.snapshot.display(), e);
        }
        let summary = ImportSummary {
            status: "success".to_string(),
            students_imported: fresh.students.len() as u32,
            teachers_imported: fresh.teachers.len() as u32,
        };

        *self.dataset.write().unwrap_or_else(|e| e.into_inner()) = fresh;
        self.cache().clear(None);
        info!("Cache cleared after data import");
        Ok(summary)
    }
}

/// Dataset the server starts with: the snapshot when readable, otherwise an
/// empty dataset waiting for `POST /api/import`
pub fn initial_dataset(config: &ServerConfig) -> Dataset {
    if config.snapshot.exists() {
        match snapshot::load_dataset(&config.snapshot) {
            Ok(ds) => {
                info!(
                    "Loaded snapshot with {} students and {} teachers",
                    ds.students.len(),
                    ds.teachers.len()
                );
                return ds;
            }
            Err(e) => warn!("Ignoring unreadable snapshot {}: {}", config.snapshot.display(), e),
        }
    }
    Dataset::default()
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("{}", self);
        }
        (status, Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}

type Shared = State<Arc<AppState>>;

/// Build the router over a shared state
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/import", post(import_data))
        .route("/api/students", get(students))
        .route("/api/teachers", get(teachers))
        .route("/api/comparison", get(comparison))
        .route("/api/tools", get(tools))
        .route("/api/overview", get(overview))
        .route("/api/questions", get(question_catalog))
        .route("/api/questions/:respondent_type/:column_index/stats", get(question_stats))
        .route("/api/likert-questions", get(likert_questions))
        .route("/api/demographics", get(demographics))
        .route("/api/usage-analysis", get(usage_analysis))
        .route("/api/correlations", get(correlations))
        .route("/api/statistics/comparison-with-ci", get(comparison_with_ci))
        .route("/api/statistics/correlation-matrix/:respondent_type", get(correlation_matrix))
        .route("/api/respondents/list", get(respondents))
        .route("/api/respondent/:code", get(respondent))
        .route("/api/homepage", get(get_homepage).post(update_homepage))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/cache/stats", get(cache_stats))
        .route("/api/export/comparison.csv", get(export_comparison))
        .route("/api/export/correlation/:file", get(export_correlation))
        .route("/charts/comparison.svg", get(comparison_chart))
        .route("/charts/correlation/:file", get(correlation_chart))
        .route("/charts/questions/:respondent_type/:column_index/boxplot.svg", get(question_boxplot))
        .layer(middleware::from_fn(log_requests))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    info!(
        "{} {} -> {} in {:?}",
        method,
        path,
        response.status().as_u16(),
        started.elapsed()
    );
    response
}

/// Start the server and block until it stops
///
/// # Arguments
/// * `config` - Bind address, data paths and credentials
///
/// # Returns
/// * `Result<()>` - I/O errors from binding or serving
pub async fn run(config: ServerConfig) -> Result<()> {
    let dataset = initial_dataset(&config);
    let bind = config.bind;
    let state = Arc::new(AppState::new(config, dataset)?);
    let app = router(state);

    let listener = TcpListener::bind(bind).await?;
    info!("Listening on http://{}", bind);
    axum::serve(listener, app).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Query and body types
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
struct CatalogQuery {
    respondent_type: Option<RespondentType>,
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize, Default)]
struct MatrixQuery {
    method: Option<String>,
    #[serde(default)]
    include_non_teaching: bool,
    #[serde(default)]
    only_non_teaching: bool,
}

impl MatrixQuery {
    fn method(&self) -> Result<CorrelationMethod> {
        self.method.as_deref().unwrap_or("pearson").parse()
    }

    fn filter(&self) -> TeacherFilter {
        TeacherFilter {
            include_non_teaching: self.include_non_teaching,
            only_non_teaching: self.only_non_teaching,
        }
    }
}

#[derive(Deserialize, Default)]
struct TeacherTypeQuery {
    teacher_type: Option<String>,
}

impl TeacherTypeQuery {
    fn category(&self) -> Result<Option<TeacherCategory>> {
        match self.teacher_type.as_deref() {
            None | Some("") | Some("all") => Ok(None),
            Some("active") => Ok(Some(TeacherCategory::Active)),
            Some("training") => Ok(Some(TeacherCategory::Training)),
            Some(other) => Err(DashboardError::BadRequest(format!(
                "teacher_type non valido: '{}'",
                other
            ))),
        }
    }
}

#[derive(Deserialize, Default)]
struct RespondentQuery {
    respondent_type: Option<String>,
}

#[derive(Deserialize, Default)]
struct HeatmapQuery {
    method: Option<String>,
    min_correlation: Option<f64>,
    #[serde(default)]
    significant_only: bool,
    #[serde(default)]
    grouped: bool,
    #[serde(default)]
    include_non_teaching: bool,
    #[serde(default)]
    only_non_teaching: bool,
}

#[derive(Deserialize)]
struct LoginRequest {
    password: String,
}

#[derive(Deserialize)]
struct HomepageRequest {
    #[serde(default)]
    content: String,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Questionnaire Analysis API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "import": "/api/import",
            "students": "/api/students",
            "teachers": "/api/teachers",
            "comparison": "/api/comparison"
        }
    }))
}

async fn health(State(state): Shared) -> Json<HealthStatus> {
    Json(analytics::health(&state.dataset()))
}

async fn import_data(State(state): Shared) -> Result<Json<ImportSummary>> {
    let worker = Arc::clone(&state);
    let summary = tokio::task::spawn_blocking(move || worker.import())
        .await
        .map_err(|e| DashboardError::Io(std::io::Error::other(e)))??;
    Ok(Json(summary))
}

async fn students(State(state): Shared) -> Result<Json<serde_json::Value>> {
    state
        .cached("students", |ds| Ok(analytics::student_summary(ds)))
        .map(Json)
}

async fn teachers(State(state): Shared, Query(filter): Query<TeacherFilter>) -> Result<Json<serde_json::Value>> {
    let category = filter.category();
    state
        .cached(&format!("teachers_{}", category.key()), |ds| {
            Ok(analytics::teacher_summary(ds, category))
        })
        .map(Json)
}

async fn comparison(State(state): Shared, Query(filter): Query<TeacherFilter>) -> Result<Json<serde_json::Value>> {
    let category = filter.category();
    state
        .cached(&format!("comparison_{}", category.key()), |ds| {
            Ok(analytics::comparison(ds, category))
        })
        .map(Json)
}

async fn tools(State(state): Shared) -> Result<Json<serde_json::Value>> {
    state.cached("tools", |ds| Ok(analytics::tools(ds))).map(Json)
}

async fn overview(State(state): Shared) -> Result<Json<serde_json::Value>> {
    state.cached("overview", |ds| Ok(analytics::overview(ds))).map(Json)
}

async fn question_catalog(Query(query): Query<CatalogQuery>) -> Json<QuestionCatalog> {
    Json(questions::catalogue(query.respondent_type, query.response_format))
}

async fn question_stats(
    State(state): Shared,
    Path((respondent_type, column_index)): Path<(String, u32)>,
    Query(query): Query<TeacherTypeQuery>,
) -> Result<Json<QuestionStatsResponse>> {
    let respondent_type: RespondentType = respondent_type.parse()?;
    let stats = analytics::question_stats(&state.dataset(), respondent_type, column_index, query.category()?)?;
    Ok(Json(stats))
}

async fn likert_questions(State(state): Shared) -> Result<Json<serde_json::Value>> {
    state
        .cached("likert_questions", |ds| Ok(analytics::likert_questions(ds)))
        .map(Json)
}

async fn demographics(State(state): Shared) -> Result<Json<serde_json::Value>> {
    state
        .cached("demographics", |ds| Ok(analytics::demographics(ds)))
        .map(Json)
}

async fn usage_analysis(State(state): Shared) -> Result<Json<serde_json::Value>> {
    state
        .cached("usage_analysis", |ds| Ok(analytics::usage_analysis(ds)))
        .map(Json)
}

async fn correlations(State(state): Shared) -> Result<Json<serde_json::Value>> {
    state
        .cached("correlations", |ds| Ok(analytics::correlation_highlights(ds)))
        .map(Json)
}

async fn comparison_with_ci(
    State(state): Shared,
    Query(filter): Query<TeacherFilter>,
) -> Result<Json<serde_json::Value>> {
    let category = filter.category();
    state
        .cached(&format!("comparison_ci_{}", category.key()), |ds| {
            Ok(analytics::comparison_with_ci(ds, category))
        })
        .map(Json)
}

fn matrix_for(
    state: &AppState,
    respondent_type: RespondentType,
    method: CorrelationMethod,
    filter: TeacherFilter,
) -> Result<CorrelationMatrix> {
    let category = filter.category();
    let key = format!(
        "correlation_{}_{}_{}",
        respondent_type,
        method.as_str(),
        category.key()
    );
    let value = state.cached(&key, |ds| {
        Ok(analytics::correlation_matrix(ds, respondent_type, method, category))
    })?;
    Ok(serde_json::from_value(value)?)
}

async fn correlation_matrix(
    State(state): Shared,
    Path(respondent_type): Path<String>,
    Query(query): Query<MatrixQuery>,
) -> Result<Json<CorrelationMatrix>> {
    let respondent_type: RespondentType = respondent_type.parse()?;
    let matrix = matrix_for(&state, respondent_type, query.method()?, query.filter())?;
    Ok(Json(matrix))
}

async fn respondents(State(state): Shared, Query(query): Query<RespondentQuery>) -> Result<Json<serde_json::Value>> {
    let list = analytics::respondents(&state.dataset(), query.respondent_type.as_deref())?;
    Ok(Json(serde_json::to_value(list)?))
}

async fn respondent(State(state): Shared, Path(code): Path<String>) -> Result<Json<serde_json::Value>> {
    let detail = analytics::respondent(&state.dataset(), &code)?;
    Ok(Json(serde_json::to_value(detail)?))
}

async fn cache_stats(State(state): Shared) -> Json<CacheStats> {
    Json(state.cache_stats())
}

// ---------------------------------------------------------------------------
// Homepage and editor sessions
// ---------------------------------------------------------------------------

fn modified_timestamp(path: &std::path::Path) -> Result<i64> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(chrono::DateTime::<chrono::Utc>::from(modified).timestamp())
}

fn backup_path(path: &std::path::Path, mtime: i64) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "HOMEPAGE".to_string());
    path.with_file_name(format!("{}_backup_{}.md", stem, mtime))
}

/// Token from `Authorization: Bearer`, falling back to the session cookie
fn session_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()))
}

async fn get_homepage(State(state): Shared) -> Result<Json<HomepageContent>> {
    let path = &state.config.homepage;
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DashboardError::NotFound("File HOMEPAGE.md non trovato".to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Json(HomepageContent {
        content,
        last_modified: modified_timestamp(path)?,
    }))
}

async fn update_homepage(
    State(state): Shared,
    headers: HeaderMap,
    jar: CookieJar,
    Json(body): Json<HomepageRequest>,
) -> Result<Json<HomepageUpdate>> {
    state.sessions.require(session_token(&headers, &jar).as_deref())?;
    if body.content.trim().is_empty() {
        return Err(DashboardError::BadRequest("Contenuto mancante".to_string()));
    }

    let path = &state.config.homepage;
    if path.exists() {
        let backup = backup_path(path, modified_timestamp(path)?);
        std::fs::copy(path, &backup)?;
        info!("Backup created: {}", backup.display());
    } else if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &body.content)?;
    info!("{} updated", path.display());

    Ok(Json(HomepageUpdate {
        success: true,
        message: "Contenuto aggiornato con successo".to_string(),
        last_modified: modified_timestamp(path)?,
    }))
}

async fn login(
    State(state): Shared,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    state.editor.check(&body.password)?;
    state.sessions.purge_expired();
    let token = state.sessions.create();

    let mut cookie = Cookie::new(SESSION_COOKIE, token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token,
            expires_in: state.sessions.ttl().as_secs(),
        }),
    ))
}

async fn logout(State(state): Shared, headers: HeaderMap, jar: CookieJar) -> (CookieJar, StatusCode) {
    if let Some(token) = session_token(&headers, &jar) {
        if state.sessions.revoke(&token) {
            info!("Editor session closed");
        }
    }
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Charts and exports
// ---------------------------------------------------------------------------

fn svg_response(svg: String) -> Response {
    ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response()
}

fn attachment(content_type: &'static str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// `student.svg` → `student`
fn strip_extension<'a>(file: &'a str, extension: &str) -> Result<&'a str> {
    file.strip_suffix(extension)
        .ok_or_else(|| DashboardError::NotFound(format!("Risorsa '{}' non trovata", file)))
}

async fn comparison_chart(State(state): Shared, Query(filter): Query<TeacherFilter>) -> Result<Response> {
    let category = filter.category();
    let data = analytics::comparison_with_ci(&state.dataset(), category);
    let layout = error_bars::layout(&data.comparisons);
    for w in &layout.warnings {
        warn!("Comparison chart: {}: {}", w.subject, w.message);
    }
    let title = format!("Studenti vs {} (IC 95%)", category.label());
    let svg = error_bars::render_svg(&layout, category, &ChartOptions::titled(title))?;
    Ok(svg_response(svg))
}

async fn correlation_chart(
    State(state): Shared,
    Path(file): Path<String>,
    Query(query): Query<HeatmapQuery>,
) -> Result<Response> {
    let respondent_type: RespondentType = strip_extension(&file, ".svg")?.parse()?;
    let method: CorrelationMethod = query.method.as_deref().unwrap_or("pearson").parse()?;
    let filter = TeacherFilter {
        include_non_teaching: query.include_non_teaching,
        only_non_teaching: query.only_non_teaching,
    };
    let matrix = matrix_for(&state, respondent_type, method, filter)?;
    let heatmap_filter = HeatmapFilter::new(query.min_correlation.unwrap_or(0.0), query.significant_only);
    let title = match respondent_type {
        RespondentType::Student => "Matrice di correlazione - Studenti",
        RespondentType::Teacher => "Matrice di correlazione - Insegnanti",
    };
    let options = ChartOptions::titled(title);

    let svg = if query.grouped {
        heatmap::render_grouped_svg(&heatmap::build_grouped(&matrix, &heatmap_filter), &options)?
    } else {
        heatmap::render_svg(&heatmap::build_grid(&matrix, &heatmap_filter), &options)?
    };
    Ok(svg_response(svg))
}

async fn question_boxplot(
    State(state): Shared,
    Path((respondent_type, column_index)): Path<(String, u32)>,
) -> Result<Response> {
    let respondent_type: RespondentType = respondent_type.parse()?;
    let ds = state.dataset();

    let likert = analytics::likert_questions(&ds)
        .into_iter()
        .find(|q| q.question.respondent_type == respondent_type && q.question.column_index == column_index);
    let (title, groups, mode): (String, Vec<LabeledQuartiles>, DomainMode) = match likert {
        Some(q) => (q.question.question_text, q.groups, DomainMode::default()),
        None => match analytics::question_stats(&ds, respondent_type, column_index, None)? {
            QuestionStatsResponse::Numeric {
                question,
                response_count,
                boxplot,
                ..
            } => {
                let group = LabeledQuartiles {
                    key: respondent_type.to_string(),
                    label: question.question_text.clone(),
                    n: response_count,
                    stats: boxplot,
                };
                (question.question_text, vec![group], DomainMode::Auto)
            }
            other => {
                return Err(DashboardError::BadRequest(format!(
                    "Nessun box plot per la domanda {} ({:?})",
                    other.question().column_index,
                    other.response_format()
                )));
            }
        },
    };
    drop(ds);

    if groups.is_empty() {
        return Err(DashboardError::NotFound("Nessuna risposta per questa domanda".to_string()));
    }
    let series: Vec<BoxSeries> = groups.iter().map(BoxSeries::from_group).collect();
    let svg = boxplot::render_svg(&series, &ChartOptions::titled(title), mode)?;
    Ok(svg_response(svg))
}

async fn export_comparison(State(state): Shared, Query(filter): Query<TeacherFilter>) -> Result<Response> {
    let data = analytics::comparison_with_ci(&state.dataset(), filter.category());
    let csv = export::comparison_csv(&data)?;
    Ok(attachment("text/csv; charset=utf-8", "confronto.csv", csv.into_bytes()))
}

async fn export_correlation(
    State(state): Shared,
    Path(file): Path<String>,
    Query(query): Query<MatrixQuery>,
) -> Result<Response> {
    let respondent_type: RespondentType = strip_extension(&file, ".xlsx")?.parse()?;
    let matrix = matrix_for(&state, respondent_type, query.method()?, query.filter())?;
    let bytes = export::correlation_xlsx(&matrix)?;
    Ok(attachment(
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        &format!("correlazioni_{}.xlsx", respondent_type),
        bytes,
    ))
}
