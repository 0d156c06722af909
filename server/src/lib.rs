//! # todokv server
//!
//! Wires the redb-backed repository, the todo service and the HTTP router
//! into a process: environment configuration, tracing, Prometheus metrics
//! and graceful shutdown.
//!
//! # Environment
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `8080` |
//! | `DB_PATH` | `todo.db` |
//! | `DB_LOCK_TIMEOUT_MS` | `1000` |
//! | `REQUEST_TIMEOUT_MS` | `5000` |
//! | `READY_TIMEOUT_MS` | `500` |
//! | `SHUTDOWN_TIMEOUT_SECS` | `10` |
//! | `LOG_LEVEL` | `info` |
//! | `LOG_FORMAT` | `pretty` |

pub mod config;
pub mod lifecycle;
pub mod telemetry;

pub use config::{Config, ConfigError};
pub use lifecycle::{Application, ServerError, serve, serve_until, shutdown_signal};
