//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters via the `metrics` facade)
//!
//! Consumers:
//!     → stdout (human or JSON lines)
//!     → Metrics endpoint (Prometheus scrape, opt-in)
//! ```
//!
//! # Design Decisions
//! - Structured fields (directory, error, uid) instead of formatted strings
//! - Secrets never reach a log line: tokens and keys redact their `Debug`
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
