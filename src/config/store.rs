//! The process-wide configuration store.
//!
//! # Responsibilities
//! - Hold the active [`Configuration`] snapshot and its [`SigningKey`]
//! - Publish replacement snapshots atomically
//! - Rebuild the signing key only when the token changes
//!
//! # Design Decisions
//! - Snapshot and key are published together as one [`Published`] value
//!   behind an `ArcSwapOption`, so readers never take a lock and never see
//!   a snapshot paired with another snapshot's key
//! - Writers serialize on a mutex; key derivation happens while it is held
//!   and before the swap
//! - The store is an owned value handed to consumers behind an `Arc`

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;

use crate::config::error::ConfigError;
use crate::config::schema::Configuration;
use crate::config::signing::SigningKey;
use crate::observability::metrics;

/// A snapshot together with the key derived from its token.
#[derive(Debug)]
pub struct Published {
    config: Arc<Configuration>,
    key: Arc<SigningKey>,
}

impl Published {
    pub fn config(&self) -> &Arc<Configuration> {
        &self.config
    }

    pub fn signing_key(&self) -> &Arc<SigningKey> {
        &self.key
    }
}

#[derive(Debug, Default)]
pub struct ConfigStore {
    current: ArcSwapOption<Published>,
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with an initial snapshot already published.
    pub fn with_config(config: Configuration) -> Self {
        let store = Self::new();
        store.set(config);
        store
    }

    /// The active snapshot.
    pub fn get(&self) -> Result<Arc<Configuration>, ConfigError> {
        self.published().map(|p| p.config.clone())
    }

    /// The key consistent with the active snapshot.
    pub fn signing_key(&self) -> Result<Arc<SigningKey>, ConfigError> {
        self.published().map(|p| p.key.clone())
    }

    /// Snapshot and key as observed at one instant.
    pub fn published(&self) -> Result<Arc<Published>, ConfigError> {
        self.current.load_full().ok_or(ConfigError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.current.load().is_some()
    }

    /// Replace the active snapshot.
    ///
    /// Returns `true` when the signing key was rebuilt.
    pub fn set(&self, config: impl Into<Arc<Configuration>>) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.publish_locked(config.into())
    }

    /// Clone the active snapshot, apply `f` to the clone, and publish it.
    ///
    /// Runs under the writer lock so concurrent updates are not lost.
    pub fn update<F>(&self, f: F) -> Result<Arc<Configuration>, ConfigError>
    where
        F: FnOnce(&mut Configuration),
    {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = self.published()?;
        let mut next = Configuration::clone(&previous.config);
        f(&mut next);
        let next = Arc::new(next);
        self.publish_locked(next.clone());
        Ok(next)
    }

    fn publish_locked(&self, config: Arc<Configuration>) -> bool {
        let previous = self.current.load_full();
        let reuse = previous
            .as_ref()
            .filter(|p| p.config.authentication_token == config.authentication_token)
            .map(|p| p.key.clone());

        let rotated = reuse.is_none();
        let key = match reuse {
            Some(key) => key,
            None => Arc::new(SigningKey::derive(&config.authentication_token)),
        };

        self.current.store(Some(Arc::new(Published { config, key })));

        if rotated {
            tracing::info!("Signing key derived from new authentication token");
        }
        metrics::record_config_update(rotated);
        rotated
    }
}
