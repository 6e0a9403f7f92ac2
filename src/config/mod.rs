//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (YAML)
//!     → loader.rs (expand env, parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Configuration (validated, immutable)
//!     → store.rs (atomic publish, signing key derived on token change)
//!     → shared via Arc<ConfigStore> to all subsystems
//!
//! On change (system account recorded, ...):
//!     store.update() publishes a modified clone
//!     → writer.rs persists it (temp file + rename, own lock)
//!
//! On reload (file change or SIGHUP):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → store.set() replaces the snapshot wholesale
//! ```
//!
//! # Design Decisions
//! - Config is immutable once published; changes replace the whole snapshot
//! - All fields have defaults to allow minimal configs
//! - Readers never wait on disk writes: store and writer have separate locks

pub mod error;
pub mod loader;
pub mod schema;
pub mod signing;
pub mod store;
pub mod validation;
pub mod watcher;
pub mod writer;

pub use error::ConfigError;
pub use loader::load_config;
pub use schema::{AuthToken, Configuration, SystemConfiguration, DEFAULT_LOCATION};
pub use signing::SigningKey;
pub use store::{ConfigStore, Published};
pub use writer::ConfigWriter;
