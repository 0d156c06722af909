//! Process lifecycle: open the store, serve HTTP, shut down gracefully.
//!
//! # Graceful Shutdown
//!
//! When a shutdown signal is received (Ctrl+C or SIGTERM):
//! 1. The listener stops accepting new connections
//! 2. In-flight requests get `shutdown_timeout` to finish
//! 3. Requests still running after that are dropped and answered with 503;
//!    dropping a request cancels its service call
//! 4. Blocking service calls are awaited for at most [`DRAIN_TIMEOUT`]
//! 5. The store file is closed, releasing its lock

use crate::config::{Config, ServerConfig};
use axum::extract::{Request, State};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use todokv_core::TodoError;
use todokv_redb::{Database, RedbTodoRepository};
use todokv_runtime::UuidGenerator;
use todokv_runtime::metrics::PrometheusHandle;
use todokv_web::{AppError, AppState, router};
use tracing::{error, info, warn};

/// How long aborted requests and their blocking calls get to unwind.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Fatal server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The store could not be opened.
    #[error("storage error: {0}")]
    Storage(#[from] TodoError),

    /// The listener could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Requested address
        address: String,
        /// Underlying error
        source: io::Error,
    },

    /// The HTTP server failed while running.
    #[error("server error: {0}")]
    Serve(#[from] io::Error),

    /// A server or startup task panicked.
    #[error("task failed: {0}")]
    Task(#[from] JoinError),
}

/// A bound HTTP server ready to run.
pub struct Application {
    listener: TcpListener,
    router: axum::Router,
    shutdown_timeout: Duration,
}

impl Application {
    /// Bind the listener described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if the address cannot be bound.
    pub async fn bind(config: &ServerConfig, router: axum::Router) -> Result<Self, ServerError> {
        let address = config.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind { address, source })?;
        Ok(Self {
            listener,
            router,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// Address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the socket address cannot be read.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// See [`Application::run_until`].
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `signal` completes, then drain in-flight requests for at
    /// most the shutdown timeout. Requests still running after that are
    /// dropped and answered with 503.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Serve` if the server fails, `ServerError::Task`
    /// if the server task panics.
    pub async fn run_until<F>(self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let Self {
            listener,
            router,
            shutdown_timeout,
        } = self;

        if let Ok(address) = listener.local_addr() {
            info!(%address, "HTTP server listening");
        }

        let stop = CancellationToken::new();
        let graceful = stop.clone();
        let abort = CancellationToken::new();
        let router = router.layer(from_fn_with_state(abort.clone(), abort_on_shutdown));
        let mut server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { graceful.cancelled().await })
                .await
        });

        tokio::select! {
            () = signal => {
                info!("Shutdown requested, draining in-flight requests");
            }
            joined = &mut server => {
                // Stopped without being asked to.
                joined??;
                return Ok(());
            }
        }

        stop.cancel();
        let joined = match tokio::time::timeout(shutdown_timeout, &mut server).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(
                    timeout_ms = u64::try_from(shutdown_timeout.as_millis()).unwrap_or(u64::MAX),
                    "Shutdown timed out, aborting in-flight requests"
                );
                abort.cancel();
                match tokio::time::timeout(DRAIN_TIMEOUT, &mut server).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        warn!("Connections still open after abort, stopping server");
                        server.abort();
                        server.await
                    }
                }
            }
        };

        match joined {
            Ok(served) => served?,
            Err(e) if e.is_cancelled() => {}
            Err(e) => return Err(e.into()),
        }

        info!("HTTP server stopped");
        Ok(())
    }
}

/// Open the store, serve the API until Ctrl+C or SIGTERM, then close the store.
///
/// # Errors
///
/// See [`serve_until`].
pub async fn serve(config: Config, metrics: Option<PrometheusHandle>) -> Result<(), ServerError> {
    serve_until(config, metrics, shutdown_signal()).await
}

/// Open the store, serve the API until `signal` completes, then close the
/// store.
///
/// Startup fails fast if another process holds the store file.
///
/// # Errors
///
/// - `Storage`: the store cannot be opened (`Busy` when it is locked)
/// - `Bind`: the listen address cannot be bound
/// - `Serve`/`Task`: the server fails while running
pub async fn serve_until<F>(
    config: Config,
    metrics: Option<PrometheusHandle>,
    signal: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send,
{
    let storage = config.storage.clone();
    let db = Arc::new(
        tokio::task::spawn_blocking(move || Database::open_with_config(&storage)).await??,
    );

    let tasks = TaskTracker::new();
    let result = run_with_database(&config, metrics, Arc::clone(&db), tasks.clone(), signal).await;

    tasks.close();
    if tokio::time::timeout(DRAIN_TIMEOUT, tasks.wait()).await.is_err() {
        warn!(in_flight = tasks.len(), "Blocking calls still running after shutdown");
    }
    if let Err(e) = Database::close_shared(db) {
        warn!(error = %e, "Database not closed cleanly");
    }
    result
}

async fn run_with_database<F>(
    config: &Config,
    metrics: Option<PrometheusHandle>,
    db: Arc<Database>,
    tasks: TaskTracker,
    signal: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send,
{
    let repository = RedbTodoRepository::new(db)?;
    let mut state = AppState::new(repository, UuidGenerator)
        .with_task_tracker(tasks)
        .with_request_timeout(config.request_timeout)
        .with_ready_timeout(config.ready_timeout);
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }

    Application::bind(&config.server, router(state))
        .await?
        .run_until(signal)
        .await
}

/// Races each request against `abort`. A request still running when it fires
/// is dropped and answered with 503.
async fn abort_on_shutdown(
    State(abort): State<CancellationToken>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    tokio::select! {
        response = next.run(request) => response,
        () = abort.cancelled() => {
            warn!(%path, "Request aborted by shutdown");
            AppError::unavailable("service unavailable").into_response()
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// A handler that cannot be installed is logged and never fires.
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        () = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
