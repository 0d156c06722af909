//! Application state for Axum handlers.

use std::sync::Arc;
use std::time::Duration;
use todokv_core::{IdGenerator, TodoRepository};
use todokv_runtime::TodoService;
use todokv_runtime::metrics::PrometheusHandle;
use tokio_util::task::TaskTracker;

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default readiness probe deadline.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_millis(500);

/// The service as handlers see it: type-erased repository and id source.
pub type SharedService = Arc<TodoService<Arc<dyn TodoRepository>, Arc<dyn IdGenerator>>>;

/// Application state shared across all HTTP handlers.
///
/// Cloning is cheap; every clone points at the same service.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use todokv_testing::{InMemoryTodoRepository, SequentialIdGenerator};
/// use todokv_web::AppState;
///
/// let state = AppState::new(InMemoryTodoRepository::new(), SequentialIdGenerator::default())
///     .with_request_timeout(Duration::from_secs(2));
/// assert_eq!(state.request_timeout(), Duration::from_secs(2));
/// ```
#[derive(Clone)]
pub struct AppState {
    service: SharedService,
    request_timeout: Duration,
    ready_timeout: Duration,
    metrics: Option<PrometheusHandle>,
    tasks: TaskTracker,
}

impl AppState {
    /// Create state over `repository`, drawing new identifiers from `ids`.
    #[must_use]
    pub fn new<R, G>(repository: R, ids: G) -> Self
    where
        R: TodoRepository + 'static,
        G: IdGenerator + 'static,
    {
        let repository: Arc<dyn TodoRepository> = Arc::new(repository);
        let ids: Arc<dyn IdGenerator> = Arc::new(ids);
        Self {
            service: Arc::new(TodoService::new(repository, ids)),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            ready_timeout: DEFAULT_READY_TIMEOUT,
            metrics: None,
            tasks: TaskTracker::new(),
        }
    }

    /// Set the deadline placed on every todo request.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the deadline of the readiness probe.
    #[must_use]
    pub const fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Serve `/metrics` from `handle`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Run blocking service calls on `tasks`, so the owner can wait for them
    /// to finish before releasing the store.
    #[must_use]
    pub fn with_task_tracker(mut self, tasks: TaskTracker) -> Self {
        self.tasks = tasks;
        self
    }

    /// The shared service.
    #[must_use]
    pub const fn service(&self) -> &SharedService {
        &self.service
    }

    /// Per-request deadline.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Readiness probe deadline.
    #[must_use]
    pub const fn ready_timeout(&self) -> Duration {
        self.ready_timeout
    }

    /// Tracker of in-flight blocking service calls.
    #[must_use]
    pub const fn tasks(&self) -> &TaskTracker {
        &self.tasks
    }

    /// Prometheus handle, if metrics are exported.
    #[must_use]
    pub const fn metrics(&self) -> Option<&PrometheusHandle> {
        self.metrics.as_ref()
    }
}
