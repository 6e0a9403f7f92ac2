//! Persisting the active snapshot to disk.
//!
//! # Responsibilities
//! - Serialize the active snapshot to the configured path
//! - Keep a process-only debug override out of the persisted document
//! - Never leave a truncated file at the destination
//!
//! # Design Decisions
//! - Own mutex, separate from the store's writer lock: a slow disk never
//!   blocks configuration readers or publishers
//! - Write to a temp file in the destination directory, then rename

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::config::error::ConfigError;
use crate::config::schema::Configuration;
use crate::config::store::ConfigStore;
use crate::observability::metrics;

/// Permission bits of the persisted document.
pub const CONFIG_FILE_MODE: u32 = 0o644;

#[derive(Debug)]
pub struct ConfigWriter {
    path: Option<PathBuf>,
    /// Debug mode was forced for this process (e.g. `--debug`).
    debug_forced: bool,
    lock: Mutex<()>,
}

impl ConfigWriter {
    pub fn new(path: Option<PathBuf>, debug_forced: bool) -> Self {
        Self {
            path,
            debug_forced,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn debug_forced(&self) -> bool {
        self.debug_forced
    }

    /// Write the store's active snapshot.
    ///
    /// The snapshot is read under the write lock, so the last write to land
    /// always carries the newest snapshot of any racing writers.
    pub fn write_to_disk(&self, store: &ConfigStore) -> Result<(), ConfigError> {
        let path = self.path.as_deref().ok_or(ConfigError::PathNotConfigured)?;
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let config = store.get()?;
        self.write_locked(path, &config)
    }

    /// Write `config` in its persisted form.
    pub fn write_snapshot(&self, config: &Configuration) -> Result<(), ConfigError> {
        let path = self.path.as_deref().ok_or(ConfigError::PathNotConfigured)?;
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_locked(path, config)
    }

    fn write_locked(&self, path: &Path, config: &Configuration) -> Result<(), ConfigError> {
        let persisted = self.persisted_form(config);
        let document = serde_yaml::to_string(&persisted).map_err(ConfigError::Serialize)?;

        let result = write_atomic(path, document.as_bytes());
        metrics::record_config_write(result.is_ok());
        result?;

        tracing::debug!(path = %path.display(), "Configuration written to disk");
        Ok(())
    }

    fn persisted_form(&self, config: &Configuration) -> Configuration {
        let mut copy = config.clone();
        if self.debug_forced {
            copy.debug = false;
        }
        copy
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(CONFIG_FILE_MODE))?;
    }

    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| ConfigError::Io(e.error))?;
    Ok(())
}
