//! System account provisioning.
//!
//! # Data Flow
//! ```text
//! ConfigStore (system.username)
//!     → account.rs (passwd lookup)
//!     → release.rs (os-release ID, only when the account is missing)
//!     → templates.rs (OS family → account-creation commands)
//!     → executor.rs (run commands, no shell)
//!     → provisioner.rs (record uid/gid in the store, persist via ConfigWriter)
//! ```
//!
//! # Design Decisions
//! - Lookup, release reading, and command execution are traits so the
//!   flow can run against an in-memory host in tests
//! - All operations block; callers on the runtime use `spawn_blocking`

pub mod account;
pub mod executor;
pub mod provisioner;
pub mod release;
pub mod templates;

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

pub use account::{AccountDatabase, PasswdDatabase, SystemIdentity};
pub use executor::{CommandExecutor, ProcessExecutor};
pub use provisioner::{IdentityProvisioner, ProvisionOutcome};
pub use release::{OsRelease, ReleaseReader};
pub use templates::{AccountCommand, AccountTemplate, TemplateRegistry};

/// Errors that end a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid system account name {0:?}")]
    InvalidUsername(String),

    /// The passwd lookup itself failed (not "no such account").
    #[error("failed to look up system account {username:?}: {source}")]
    LookupFailed {
        username: String,
        #[source]
        source: io::Error,
    },

    /// Account creation reported success but the account still cannot be found.
    #[error("system account {0:?} does not exist after creation")]
    UnknownAccount(String),

    #[error("failed to determine system release: {0}")]
    ReleaseUnavailable(#[source] io::Error),

    #[error("account creation command `{command}` failed: {source}")]
    ProvisioningFailed {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The account exists but recording it in the configuration file failed.
    #[error("failed to persist system account: {0}")]
    PersistFailed(#[source] ConfigError),

    #[error(transparent)]
    Store(ConfigError),
}
