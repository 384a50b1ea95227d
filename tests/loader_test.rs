use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use survey_dashboard::analytics;
use survey_dashboard::client::DashboardApi;
use survey_dashboard::dataset::Dataset;
use survey_dashboard::importer::import_dir;
use survey_dashboard::loader::{CONNECTION_FAILED, DataLoader, LOAD_FAILED, LoadState, RetryPolicy};
use survey_dashboard::model::{ComparisonReport, GroupSummary, HealthStatus, ImportSummary, TeacherFilter, ToolsSummary};
use survey_dashboard::{DashboardError, Result};
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

/// Serves payloads computed from the sample data, failing on demand
struct ScriptedApi {
    ds: Dataset,
    imported: AtomicBool,
    backend_down: AtomicBool,
    /// Remaining calls to `students` that fail
    failures: AtomicU32,
    student_calls: AtomicU32,
    import_calls: AtomicU32,
}

impl ScriptedApi {
    fn new(failures: u32, imported: bool) -> Self {
        let ds = import_dir(Path::new(env!("CARGO_MANIFEST_DIR")).join("data")).expect("sample data");
        ScriptedApi {
            ds,
            imported: AtomicBool::new(imported),
            backend_down: AtomicBool::new(false),
            failures: AtomicU32::new(failures),
            student_calls: AtomicU32::new(0),
            import_calls: AtomicU32::new(0),
        }
    }
}

impl DashboardApi for ScriptedApi {
    async fn health(&self) -> Result<HealthStatus> {
        if self.backend_down.load(Ordering::SeqCst) {
            return Err(DashboardError::Http("connection refused".to_string()));
        }
        let n = if self.imported.load(Ordering::SeqCst) { 1 } else { 0 };
        Ok(HealthStatus {
            status: "healthy".to_string(),
            student_responses: n,
            teacher_responses: n,
        })
    }

    async fn import(&self) -> Result<ImportSummary> {
        self.import_calls.fetch_add(1, Ordering::SeqCst);
        self.imported.store(true, Ordering::SeqCst);
        Ok(ImportSummary {
            status: "success".to_string(),
            students_imported: self.ds.students.len() as u32,
            teachers_imported: self.ds.teachers.len() as u32,
        })
    }

    async fn students(&self) -> Result<GroupSummary> {
        self.student_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |f| f.checked_sub(1))
            .is_ok();
        if failing {
            return Err(DashboardError::Http("timeout".to_string()));
        }
        Ok(analytics::student_summary(&self.ds))
    }

    async fn teachers(&self, filter: TeacherFilter) -> Result<GroupSummary> {
        Ok(analytics::teacher_summary(&self.ds, filter.category()))
    }

    async fn comparison(&self, filter: TeacherFilter) -> Result<ComparisonReport> {
        Ok(analytics::comparison(&self.ds, filter.category()))
    }

    async fn tools(&self) -> Result<ToolsSummary> {
        Ok(analytics::tools(&self.ds))
    }
}

#[tokio::test(start_paused = true)]
async fn retries_with_backoff_then_succeeds() {
    let loader = DataLoader::new(ScriptedApi::new(2, true), RetryPolicy::default());
    let cancel = CancellationToken::new();

    let started = Instant::now();
    let data = loader.run(&cancel).await.expect("third attempt succeeds");
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_secs(3), "waited 1 s then 2 s, got {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(7));
    assert_eq!(loader.api().student_calls.load(Ordering::SeqCst), 3);
    assert_eq!(loader.api().import_calls.load(Ordering::SeqCst), 0);
    assert_eq!(data.students.total_responses, 24);
    assert!(matches!(
        loader.state(),
        LoadState::Ready(ref ready) if ready.tools == data.tools
    ));
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_max_retries() {
    let loader = DataLoader::new(ScriptedApi::new(u32::MAX, true), RetryPolicy::default());
    let cancel = CancellationToken::new();

    let started = Instant::now();
    let result = loader.run(&cancel).await;

    assert!(matches!(result, Err(DashboardError::Http(_))));
    assert!(started.elapsed() >= Duration::from_secs(7), "1 + 2 + 4 s of backoff");
    assert_eq!(loader.api().student_calls.load(Ordering::SeqCst), 4);
    match loader.state() {
        LoadState::Failed(message) => assert!(message.starts_with(LOAD_FAILED), "{}", message),
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn imports_once_when_backend_is_empty() {
    let loader = DataLoader::new(ScriptedApi::new(0, false), RetryPolicy::default());
    let mut states = loader.subscribe();
    let cancel = CancellationToken::new();

    loader.run(&cancel).await.expect("load succeeds");

    assert_eq!(loader.api().import_calls.load(Ordering::SeqCst), 1);
    assert!(states.has_changed().expect("sender alive"));
    assert!(matches!(*states.borrow_and_update(), LoadState::Ready(_)));
}

#[tokio::test(start_paused = true)]
async fn unreachable_backend_fails_without_retry() {
    let api = ScriptedApi::new(0, true);
    api.backend_down.store(true, Ordering::SeqCst);
    let loader = DataLoader::new(api, RetryPolicy::default());

    let result = loader.run(&CancellationToken::new()).await;

    assert!(matches!(result, Err(DashboardError::Http(_))));
    assert_eq!(loader.api().student_calls.load(Ordering::SeqCst), 0);
    match loader.state() {
        LoadState::Failed(message) => {
            assert!(message.starts_with(CONNECTION_FAILED), "{}", message);
            assert!(message.contains("connection refused"));
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_backoff() {
    let loader = DataLoader::new(ScriptedApi::new(u32::MAX, true), RetryPolicy::default());
    let cancel = CancellationToken::new();

    let (result, _) = tokio::join!(loader.run(&cancel), async {
        sleep(Duration::from_millis(1500)).await;
        cancel.cancel();
    });

    assert!(matches!(result, Err(DashboardError::Cancelled)));
    assert_eq!(loader.state(), LoadState::Cancelled);
    assert_eq!(loader.api().student_calls.load(Ordering::SeqCst), 2, "no attempt after the cancel");
}

#[tokio::test(start_paused = true)]
async fn second_run_while_busy_is_rejected() {
    let loader = DataLoader::new(ScriptedApi::new(1, true), RetryPolicy::default());
    let cancel = CancellationToken::new();

    let (first, second) = tokio::join!(loader.run(&cancel), loader.run(&cancel));

    assert!(first.is_ok());
    assert!(matches!(second, Err(DashboardError::Busy)));
    assert!(matches!(loader.state(), LoadState::Ready(_)));

    let again = loader.run(&cancel).await;
    assert!(again.is_ok(), "the flag is released once a run ends");
}

#[test]
fn backoff_delays_double() {
    let policy = RetryPolicy::default();
    let delays: Vec<Duration> = (0..policy.max_retries).map(|r| policy.delay(r)).collect();
    assert_eq!(
        delays,
        vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]
    );
    assert!(!LoadState::Idle.is_busy());
    assert!(LoadState::Loading { attempt: 2 }.is_busy());
}
