//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Publish to store → Ensure system account → Reconcile ownership
//!
//! Running (startup.rs, signals.rs):
//!     File change / SIGHUP → Reload → store.set()
//!
//! Shutdown (shutdown.rs):
//!     SIGTERM/SIGINT → Trigger shutdown → Background tasks exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then account, then ownership
//! - The store outlives every consumer and is handed out as `Arc<ConfigStore>`

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{Daemon, Startup, StartupError};
