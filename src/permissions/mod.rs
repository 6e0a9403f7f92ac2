//! Workload directory ownership.
//!
//! # Data Flow
//! ```text
//! system.data
//!     → reconciler.rs (list entries, fail only if listing fails)
//!     → naming.rs (directory + canonical UUIDv4 name, everything else inert)
//!     → ownership.rs (chown per directory, bounded fan-out on blocking pool)
//!     → ReconcileReport (per-directory failures logged, not returned)
//! ```
//!
//! # Design Decisions
//! - One bad directory never blocks daemon startup
//! - Operations target disjoint directories, so completion order is free

pub mod naming;
pub mod ownership;
pub mod reconciler;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use naming::is_workload_directory_name;
pub use ownership::{ChownOwnership, OwnershipChanger};
pub use reconciler::{PermissionReconciler, ReconcileOptions, ReconcileReport};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to list data directory {}: {source}", path.display())]
    ListFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_is_the_only_failure() {
        let err = ReconcileError::ListFailed {
            path: PathBuf::from("/srv/data"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        match &err {
            ReconcileError::ListFailed { path, .. } => assert_eq!(path, &PathBuf::from("/srv/data")),
        }
        assert!(err.to_string().contains("/srv/data"));
    }
}
