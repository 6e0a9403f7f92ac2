//! Startup orchestration.
//!
//! # Responsibilities
//! - Publish the loaded configuration into the store
//! - Ensure the system account exists and record it
//! - Reconcile workload directory ownership
//! - Keep the configuration current until shutdown
//!
//! # Design Decisions
//! - Fail fast: provisioning errors and an unlistable data directory are fatal
//! - Blocking work (account tooling, disk writes) runs on the blocking pool
//! - Reload failures keep the current snapshot

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::watcher::ConfigWatcher;
use crate::config::{load_config, ConfigError, ConfigStore, ConfigWriter, Configuration};
use crate::lifecycle::signals::{SignalEvent, SignalListener};
use crate::lifecycle::Shutdown;
use crate::permissions::{
    ChownOwnership, OwnershipChanger, PermissionReconciler, ReconcileError, ReconcileOptions,
    ReconcileReport,
};
use crate::system::{IdentityProvisioner, ProvisionError, SystemIdentity};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] io::Error),
}

pub struct Startup {
    config_path: PathBuf,
    debug_forced: bool,
    provisioner: IdentityProvisioner,
    ownership: Arc<dyn OwnershipChanger>,
}

impl Startup {
    /// Boot against the real host.
    pub fn new(config_path: impl Into<PathBuf>, debug_forced: bool) -> Self {
        Self {
            config_path: config_path.into(),
            debug_forced,
            provisioner: IdentityProvisioner::system(),
            ownership: Arc::new(ChownOwnership),
        }
    }

    pub fn with_provisioner(mut self, provisioner: IdentityProvisioner) -> Self {
        self.provisioner = provisioner;
        self
    }

    pub fn with_ownership_changer(mut self, ownership: Arc<dyn OwnershipChanger>) -> Self {
        self.ownership = ownership;
        self
    }

    pub async fn boot(self, mut config: Configuration) -> Result<Daemon, StartupError> {
        if self.debug_forced {
            config.debug = true;
        }
        let store = Arc::new(ConfigStore::with_config(config));
        let writer = Arc::new(ConfigWriter::new(Some(self.config_path), self.debug_forced));

        let outcome = {
            let store = store.clone();
            let writer = writer.clone();
            let provisioner = self.provisioner;
            tokio::task::spawn_blocking(move || provisioner.ensure(&store, &writer)).await??
        };

        let config = store.get()?;
        let reconciler = PermissionReconciler::with_changer(
            ReconcileOptions::from(&config.system),
            self.ownership,
        );
        let report = reconciler.reconcile(&config.system.data, &outcome.identity).await?;

        tracing::info!(
            username = %outcome.identity.username,
            account_created = outcome.created,
            "Startup complete"
        );

        Ok(Daemon {
            store,
            writer,
            identity: outcome.identity,
            report,
        })
    }
}

/// A booted daemon: the live store plus what startup established.
pub struct Daemon {
    store: Arc<ConfigStore>,
    writer: Arc<ConfigWriter>,
    identity: SystemIdentity,
    report: ReconcileReport,
}

impl Daemon {
    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn writer(&self) -> &Arc<ConfigWriter> {
        &self.writer
    }

    pub fn identity(&self) -> &SystemIdentity {
        &self.identity
    }

    pub fn reconcile_report(&self) -> ReconcileReport {
        self.report
    }

    /// Apply reloads from file changes and SIGHUP until SIGINT/SIGTERM or
    /// `shutdown` fires.
    pub async fn serve(self, shutdown: Shutdown) -> Result<(), StartupError> {
        let mut stop = shutdown.subscribe();
        let mut signals = SignalListener::install().map_err(StartupError::Signals)?;

        let path = self.writer.path().map(Path::to_path_buf);
        let (mut updates, _watch) = match &path {
            Some(path) => {
                let (watcher, updates) = ConfigWatcher::new(path);
                match watcher.run() {
                    Ok(handle) => (Some(updates), Some(handle)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Config watcher unavailable; reload with SIGHUP");
                        (None, None)
                    }
                }
            }
            None => (None, None),
        };

        loop {
            tokio::select! {
                Some(config) = recv_update(&mut updates) => self.apply(config),
                event = signals.next() => match event {
                    SignalEvent::Reload => self.reload(path.as_deref()).await,
                    SignalEvent::Shutdown => {
                        tracing::info!("Shutdown signal received");
                        shutdown.trigger();
                        break;
                    }
                },
                _ = stop.recv() => break,
            }
        }

        tracing::info!("Daemon stopped");
        Ok(())
    }

    fn apply(&self, mut config: Configuration) {
        if self.writer.debug_forced() {
            config.debug = true;
        }
        let key_rotated = self.store.set(config);
        tracing::info!(key_rotated, "Configuration reloaded");
    }

    async fn reload(&self, path: Option<&Path>) {
        let Some(path) = path.map(Path::to_path_buf) else {
            tracing::warn!("Reload requested but no configuration path is known");
            return;
        };

        match tokio::task::spawn_blocking(move || load_config(&path)).await {
            Ok(Ok(config)) => self.apply(config),
            Ok(Err(e)) => tracing::error!(error = %e, "Failed to reload config. Keeping current configuration."),
            Err(e) => tracing::error!(error = %e, "Config reload task failed"),
        }
    }
}

async fn recv_update(
    updates: &mut Option<tokio::sync::mpsc::UnboundedReceiver<Configuration>>,
) -> Option<Configuration> {
    match updates {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
