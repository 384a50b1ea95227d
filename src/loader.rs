//! Startup sequence of the dashboard: health check, one-time import, then the
//! four primary payloads fetched concurrently with retry.
//!
//! Progress is published on a [`watch`] channel. A [`CancellationToken`]
//! owned by the view aborts in-flight requests and backoff sleeps; once it
//! fires the loader ends in [`LoadState::Cancelled`] and never publishes data.

use crate::client::DashboardApi;
use crate::error::{DashboardError, Result};
use crate::model::{DashboardData, TeacherFilter};
use log::{info, warn};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub const CONNECTION_FAILED: &str = "Impossibile connettersi al backend: ";
pub const IMPORT_FAILED: &str = "Errore durante l'importazione: ";
pub const LOAD_FAILED: &str = "Errore durante il caricamento dei dati: ";

/// Exponential backoff of the primary fetch batch
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    /// # Returns
    /// * `RetryPolicy` - 3 retries waiting 1 s, 2 s then 4 s
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `retry` (0-based)
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use survey_dashboard::loader::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.delay(0), Duration::from_secs(1));
    /// assert_eq!(policy.delay(2), Duration::from_secs(4));
    /// ```
    pub fn delay(&self, retry: u32) -> Duration {
        self.initial_delay.mul_f64(self.multiplier.powi(retry as i32))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoadState {
    Idle,
    CheckingHealth,
    Importing,
    /// Attempt number, starting at 1
    Loading { attempt: u32 },
    Ready(Box<DashboardData>),
    Failed(String),
    Cancelled,
}

impl LoadState {
    /// Whether a loading indicator should be shown
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            LoadState::CheckingHealth | LoadState::Importing | LoadState::Loading { .. }
        )
    }
}

/// Clears the in-flight flag when a run ends, however it ends
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct DataLoader<A> {
    api: A,
    policy: RetryPolicy,
    filter: TeacherFilter,
    state: watch::Sender<LoadState>,
    running: AtomicBool,
}

impl<A: DashboardApi> DataLoader<A> {
    pub fn new(api: A, policy: RetryPolicy) -> Self {
        let (state, _) = watch::channel(LoadState::Idle);
        DataLoader {
            api,
            policy,
            filter: TeacherFilter::default(),
            state,
            running: AtomicBool::new(false),
        }
    }

    /// Teacher filter applied to the teacher and comparison payloads
    pub fn with_filter(mut self, filter: TeacherFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    fn publish(&self, state: LoadState) {
        self.state.send_replace(state);
    }

    /// Run `fut` unless `cancel` fires first
    async fn cancellable<T>(cancel: &CancellationToken, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DashboardError::Cancelled),
            result = fut => result,
        }
    }

    async fn fetch_all(&self) -> Result<DashboardData> {
        let (students, teachers, comparison, tools) = tokio::try_join!(
            self.api.students(),
            self.api.teachers(self.filter),
            self.api.comparison(self.filter),
            self.api.tools(),
        )?;
        Ok(DashboardData {
            students,
            teachers,
            comparison,
            tools,
        })
    }

    /// Fetch the four payloads, retrying the whole batch on failure
    async fn load(&self, cancel: &CancellationToken) -> Result<DashboardData> {
        let mut retry = 0;
        loop {
            self.publish(LoadState::Loading { attempt: retry + 1 });
            match Self::cancellable(cancel, self.fetch_all()).await {
                Ok(data) => return Ok(data),
                Err(DashboardError::Cancelled) => return Err(DashboardError::Cancelled),
                Err(e) if retry < self.policy.max_retries => {
                    let delay = self.policy.delay(retry);
                    warn!("Load attempt {} failed: {}; retrying in {:?}", retry + 1, e, delay);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(DashboardError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Run the whole startup sequence
    ///
    /// # Arguments
    /// * `cancel` - Token of the owning view
    ///
    /// # Returns
    /// * `Ok(DashboardData)` - Also published as [`LoadState::Ready`]
    /// * `Err(DashboardError::Busy)` - Another run is in flight; the state is untouched
    /// * `Err(DashboardError::Cancelled)` - The token fired
    /// * `Err(e)` - The last failure; [`LoadState::Failed`] carries it
    ///   prefixed with the Italian message of the failing stage
    pub async fn run(&self, cancel: &CancellationToken) -> Result<DashboardData> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DashboardError::Busy);
        }
        let _guard = RunGuard(&self.running);

        match self.sequence(cancel).await {
            Ok(data) if !cancel.is_cancelled() => {
                info!("Dashboard data loaded");
                self.publish(LoadState::Ready(Box::new(data.clone())));
                Ok(data)
            }
            Ok(_) | Err((_, DashboardError::Cancelled)) => {
                info!("Dashboard load cancelled");
                self.publish(LoadState::Cancelled);
                Err(DashboardError::Cancelled)
            }
            Err((stage, e)) => {
                let message = format!("{}{}", stage, e);
                warn!("Dashboard load failed: {}", message);
                self.publish(LoadState::Failed(message));
                Err(e)
            }
        }
    }

    /// Health, import and load; a failure carries the message prefix of its stage
    async fn sequence(
        &self,
        cancel: &CancellationToken,
    ) -> std::result::Result<DashboardData, (&'static str, DashboardError)> {
        self.publish(LoadState::CheckingHealth);
        let health = Self::cancellable(cancel, self.api.health())
            .await
            .map_err(|e| (CONNECTION_FAILED, e))?;

        if health.is_empty() {
            info!("Backend has no data, importing");
            self.publish(LoadState::Importing);
            let summary = Self::cancellable(cancel, self.api.import())
                .await
                .map_err(|e| (IMPORT_FAILED, e))?;
            info!(
                "Imported {} students and {} teachers",
                summary.students_imported, summary.teachers_imported
            );
        }

        self.load(cancel).await.map_err(|e| (LOAD_FAILED, e))
    }
}
