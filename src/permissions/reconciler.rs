//! Boot-time ownership reconciliation of workload directories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::SystemConfiguration;
use crate::observability::metrics;
use crate::permissions::naming::is_workload_directory_name;
use crate::permissions::ownership::{ChownOwnership, OwnershipChanger};
use crate::permissions::ReconcileError;
use crate::system::SystemIdentity;

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub enabled: bool,
    pub recursive: bool,
    /// Maximum ownership changes in flight at once.
    pub max_in_flight: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self::from(&SystemConfiguration::default())
    }
}

impl From<&SystemConfiguration> for ReconcileOptions {
    fn from(system: &SystemConfiguration) -> Self {
        Self {
            enabled: system.set_permissions_on_boot,
            recursive: system.recursive_permissions,
            max_in_flight: system.permission_workers,
        }
    }
}

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub struct PermissionReconciler {
    options: ReconcileOptions,
    changer: Arc<dyn OwnershipChanger>,
}

impl PermissionReconciler {
    pub fn new(options: ReconcileOptions) -> Self {
        Self::with_changer(options, Arc::new(ChownOwnership))
    }

    pub fn with_changer(options: ReconcileOptions, changer: Arc<dyn OwnershipChanger>) -> Self {
        Self { options, changer }
    }

    /// Reassign every workload directory under `root` to `identity`.
    ///
    /// Fails only if `root` cannot be listed. Individual ownership failures
    /// are logged and counted in the report; they never fail the call and
    /// never stop sibling directories from being processed.
    pub async fn reconcile(
        &self,
        root: &Path,
        identity: &SystemIdentity,
    ) -> Result<ReconcileReport, ReconcileError> {
        let mut report = ReconcileReport::default();
        if !self.options.enabled {
            tracing::debug!("Ownership reconciliation disabled");
            return Ok(report);
        }

        let (targets, skipped) = list_workload_directories(root).await?;
        report.skipped = skipped;

        tracing::info!(
            root = %root.display(),
            directories = targets.len(),
            recursive = self.options.recursive,
            "Reconciling workload directory ownership"
        );

        let limit = Arc::new(Semaphore::new(self.options.max_in_flight.max(1)));
        let mut tasks = JoinSet::new();

        for (name, path) in targets {
            // The semaphore is local and never closed.
            let Ok(permit) = limit.clone().acquire_owned().await else {
                break;
            };
            let changer = self.changer.clone();
            let identity = identity.clone();
            let recursive = self.options.recursive;

            tasks.spawn_blocking(move || {
                let _permit = permit;
                let result = changer.change_owner(&path, &identity, recursive);
                (name, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {
                    report.updated += 1;
                    metrics::record_ownership_change(true);
                }
                Ok((name, Err(e))) => {
                    tracing::warn!(directory = %name, error = %e, "Failed to change ownership of workload directory");
                    report.failed += 1;
                    metrics::record_ownership_change(false);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Ownership change task did not complete");
                    report.failed += 1;
                    metrics::record_ownership_change(false);
                }
            }
        }

        tracing::info!(
            updated = report.updated,
            failed = report.failed,
            skipped = report.skipped,
            "Ownership reconciliation finished"
        );
        Ok(report)
    }
}

/// Read the whole listing before anything is scheduled.
///
/// Returns matching directories and the number of skipped entries.
async fn list_workload_directories(
    root: &Path,
) -> Result<(Vec<(String, PathBuf)>, usize), ReconcileError> {
    let list_failed = |source| ReconcileError::ListFailed {
        path: root.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(root).await.map_err(list_failed)?;
    let mut targets = Vec::new();
    let mut skipped = 0;

    while let Some(entry) = entries.next_entry().await.map_err(list_failed)? {
        let is_dir = match entry.file_type().await {
            Ok(file_type) => file_type.is_dir(),
            Err(e) => {
                tracing::debug!(entry = ?entry.file_name(), error = %e, "Cannot stat entry, skipping");
                false
            }
        };
        let name = entry.file_name().into_string().ok();

        match name {
            Some(name) if is_dir && is_workload_directory_name(&name) => {
                targets.push((name, entry.path()));
            }
            _ => skipped += 1,
        }
    }

    Ok((targets, skipped))
}
