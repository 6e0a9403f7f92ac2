//! Ensuring the workload account exists and is recorded in the configuration.
//!
//! # Flow
//! ```text
//! lookup(username)
//!     found     → record ids → persist → Ensured
//!     unknown   → read release ID → select template → run commands
//!                 → lookup again → record ids → persist → Ensured
//!     error     → Failed
//! ```
//!
//! Lookup always runs first, so a retry after a failed persist does not
//! create the account twice.

use crate::config::validation::is_valid_username;
use crate::config::{ConfigStore, ConfigWriter};
use crate::observability::metrics;
use crate::system::account::{AccountDatabase, PasswdDatabase, SystemIdentity};
use crate::system::executor::{CommandExecutor, ProcessExecutor};
use crate::system::release::{OsRelease, ReleaseReader};
use crate::system::templates::TemplateRegistry;
use crate::system::ProvisionError;

/// Result of a successful provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOutcome {
    pub identity: SystemIdentity,
    /// The account did not exist and was created by this run.
    pub created: bool,
}

pub struct IdentityProvisioner {
    accounts: Box<dyn AccountDatabase>,
    release: Box<dyn ReleaseReader>,
    executor: Box<dyn CommandExecutor>,
    templates: TemplateRegistry,
}

impl IdentityProvisioner {
    pub fn new(
        accounts: Box<dyn AccountDatabase>,
        release: Box<dyn ReleaseReader>,
        executor: Box<dyn CommandExecutor>,
        templates: TemplateRegistry,
    ) -> Self {
        Self {
            accounts,
            release,
            executor,
            templates,
        }
    }

    /// Provisioner backed by the host's passwd database, os-release, and
    /// account tooling.
    pub fn system() -> Self {
        Self::new(
            Box::new(PasswdDatabase),
            Box::new(OsRelease::default()),
            Box::new(ProcessExecutor),
            TemplateRegistry::with_defaults(),
        )
    }

    /// Ensure the configured account exists, then record its ids in the
    /// store and persist the snapshot.
    ///
    /// Blocking: lookups, process spawns, and the disk write all happen on
    /// the calling thread.
    pub fn ensure(
        &self,
        store: &ConfigStore,
        writer: &ConfigWriter,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        let username = store.get().map_err(ProvisionError::Store)?.system.username.clone();
        if !is_valid_username(&username) {
            return Err(ProvisionError::InvalidUsername(username));
        }

        let (identity, created) = match self.lookup(&username)? {
            Some(identity) => {
                tracing::debug!(username = %username, uid = identity.uid, "System account found");
                (identity, false)
            }
            None => {
                tracing::info!(username = %username, "System account not found, creating it");
                self.create(&username)?;
                let identity = self
                    .lookup(&username)?
                    .ok_or_else(|| ProvisionError::UnknownAccount(username.clone()))?;
                (identity, true)
            }
        };

        self.record(store, writer, &identity)?;

        tracing::info!(
            username = %identity.username,
            uid = identity.uid,
            gid = identity.gid,
            created,
            "System account ensured"
        );
        Ok(ProvisionOutcome { identity, created })
    }

    fn lookup(&self, username: &str) -> Result<Option<SystemIdentity>, ProvisionError> {
        self.accounts
            .lookup(username)
            .map_err(|source| ProvisionError::LookupFailed {
                username: username.to_string(),
                source,
            })
    }

    fn create(&self, username: &str) -> Result<(), ProvisionError> {
        let system_id = self.release.system_id().map_err(ProvisionError::ReleaseUnavailable)?;
        let template = self.templates.select(&system_id);
        tracing::debug!(system = %system_id, template = template.name(), "Selected account template");

        for command in template.commands(username) {
            self.executor
                .execute(&command)
                .map_err(|source| ProvisionError::ProvisioningFailed {
                    command: command.to_string(),
                    source,
                })?;
        }

        metrics::record_account_created(template.name());
        Ok(())
    }

    fn record(
        &self,
        store: &ConfigStore,
        writer: &ConfigWriter,
        identity: &SystemIdentity,
    ) -> Result<(), ProvisionError> {
        let updated = store
            .update(|config| {
                config.system.username = identity.username.clone();
                config.system.user = identity.as_system_user();
            })
            .map_err(ProvisionError::Store)?;

        writer.write_snapshot(&updated).map_err(ProvisionError::PersistFailed)
    }
}

impl Default for IdentityProvisioner {
    fn default() -> Self {
        Self::system()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, Configuration};
    use crate::system::templates::AccountCommand;
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// In-memory passwd shared between the fake database and fake executor.
    #[derive(Clone, Default)]
    struct FakeHost {
        accounts: Arc<Mutex<HashMap<String, SystemIdentity>>>,
        commands: Arc<Mutex<Vec<String>>>,
    }

    struct FakeDb(FakeHost);

    impl AccountDatabase for FakeDb {
        fn lookup(&self, username: &str) -> io::Result<Option<SystemIdentity>> {
            Ok(self.0.accounts.lock().unwrap().get(username).cloned())
        }
    }

    struct FailingDb;

    impl AccountDatabase for FailingDb {
        fn lookup(&self, _: &str) -> io::Result<Option<SystemIdentity>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "nss unavailable"))
        }
    }

    struct FixedRelease(&'static str);

    impl ReleaseReader for FixedRelease {
        fn system_id(&self) -> io::Result<String> {
            Ok(self.0.to_string())
        }
    }

    /// Records commands; the last command of a template creates the account.
    struct FakeExecutor {
        host: FakeHost,
        creates: bool,
        fail_on: Option<&'static str>,
    }

    impl CommandExecutor for FakeExecutor {
        fn execute(&self, command: &AccountCommand) -> io::Result<()> {
            self.host.commands.lock().unwrap().push(command.to_string());
            if Some(command.program.as_str()) == self.fail_on {
                return Err(io::Error::new(io::ErrorKind::Other, "exit status 9"));
            }
            if self.creates && (command.program == "useradd" || command.program == "adduser") {
                let name = command.args.last().cloned().unwrap_or_default();
                self.host
                    .accounts
                    .lock()
                    .unwrap()
                    .insert(name.clone(), SystemIdentity::new(name, 998, 997));
            }
            Ok(())
        }
    }

    fn provisioner(host: &FakeHost, release: &'static str, creates: bool) -> IdentityProvisioner {
        IdentityProvisioner::new(
            Box::new(FakeDb(host.clone())),
            Box::new(FixedRelease(release)),
            Box::new(FakeExecutor { host: host.clone(), creates, fail_on: None }),
            TemplateRegistry::with_defaults(),
        )
    }

    fn fixture() -> (tempfile::TempDir, ConfigStore, ConfigWriter) {
        let dir = tempfile::tempdir().unwrap();
        let writer = ConfigWriter::new(Some(dir.path().join("config.yml")), false);
        let store = ConfigStore::with_config(Configuration::default());
        (dir, store, writer)
    }

    #[test]
    fn test_existing_account_is_recorded() {
        let host = FakeHost::default();
        host.accounts
            .lock()
            .unwrap()
            .insert("hostd".into(), SystemIdentity::new("hostd", 1001, 1002));
        let (dir, store, writer) = fixture();

        let outcome = provisioner(&host, "debian", true).ensure(&store, &writer).unwrap();
        assert!(!outcome.created);
        assert_eq!(store.get().unwrap().system.user.uid, 1001);
        assert_eq!(store.get().unwrap().system.user.gid, 1002);
        assert!(host.commands.lock().unwrap().is_empty());

        let persisted = crate::config::load_config(&dir.path().join("config.yml")).unwrap();
        assert_eq!(persisted.system.user.uid, 1001);
    }

    #[test]
    fn test_creates_missing_account_with_useradd() {
        let host = FakeHost::default();
        let (_dir, store, writer) = fixture();

        let outcome = provisioner(&host, "ubuntu", true).ensure(&store, &writer).unwrap();
        assert!(outcome.created);
        assert_eq!(outcome.identity, SystemIdentity::new("hostd", 998, 997));
        assert_eq!(
            *host.commands.lock().unwrap(),
            vec!["useradd --system --no-create-home --shell /bin/false hostd".to_string()]
        );
    }

    #[test]
    fn test_alpine_creates_group_then_user() {
        let host = FakeHost::default();
        let (_dir, store, writer) = fixture();

        provisioner(&host, "alpine", true).ensure(&store, &writer).unwrap();
        let commands = host.commands.lock().unwrap();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].starts_with("addgroup"));
        assert!(commands[1].starts_with("adduser"));
    }

    #[test]
    fn test_idempotent() {
        let host = FakeHost::default();
        let (_dir, store, writer) = fixture();
        let provisioner = provisioner(&host, "debian", true);

        let first = provisioner.ensure(&store, &writer).unwrap();
        let second = provisioner.ensure(&store, &writer).unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.identity, second.identity);
        assert_eq!(host.commands.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_lookup_error_is_fatal() {
        let host = FakeHost::default();
        let (_dir, store, writer) = fixture();
        let provisioner = IdentityProvisioner::new(
            Box::new(FailingDb),
            Box::new(FixedRelease("debian")),
            Box::new(FakeExecutor { host: host.clone(), creates: true, fail_on: None }),
            TemplateRegistry::with_defaults(),
        );

        let err = provisioner.ensure(&store, &writer).unwrap_err();
        assert!(matches!(err, ProvisionError::LookupFailed { .. }));
        assert!(host.commands.lock().unwrap().is_empty());
    }

    #[test]
    fn test_creation_failure() {
        let host = FakeHost::default();
        let (_dir, store, writer) = fixture();
        let provisioner = IdentityProvisioner::new(
            Box::new(FakeDb(host.clone())),
            Box::new(FixedRelease("alpine")),
            Box::new(FakeExecutor { host: host.clone(), creates: true, fail_on: Some("addgroup") }),
            TemplateRegistry::with_defaults(),
        );

        let err = provisioner.ensure(&store, &writer).unwrap_err();
        match err {
            ProvisionError::ProvisioningFailed { command, .. } => assert_eq!(command, "addgroup -S hostd"),
            other => panic!("unexpected error: {other}"),
        }
        // The user step never ran.
        assert_eq!(host.commands.lock().unwrap().len(), 1);
        assert_eq!(store.get().unwrap().system.user.uid, 0);
    }

    #[test]
    fn test_still_unknown_after_creation() {
        let host = FakeHost::default();
        let (_dir, store, writer) = fixture();

        let err = provisioner(&host, "debian", false).ensure(&store, &writer).unwrap_err();
        assert!(matches!(err, ProvisionError::UnknownAccount(name) if name == "hostd"));
    }

    #[test]
    fn test_persist_failure_surfaces_after_account_exists() {
        let host = FakeHost::default();
        let store = ConfigStore::with_config(Configuration::default());
        let writer = ConfigWriter::new(None, false);

        let err = provisioner(&host, "debian", true).ensure(&store, &writer).unwrap_err();
        assert!(matches!(err, ProvisionError::PersistFailed(ConfigError::PathNotConfigured)));
        assert!(host.accounts.lock().unwrap().contains_key("hostd"));
    }

    #[test]
    fn test_invalid_username_rejected_before_lookup() {
        let host = FakeHost::default();
        let mut config = Configuration::default();
        config.system.username = "--help".into();
        let store = ConfigStore::with_config(config);
        let writer = ConfigWriter::new(None, false);

        let err = provisioner(&host, "debian", true).ensure(&store, &writer).unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidUsername(_)));
        assert!(host.commands.lock().unwrap().is_empty());
    }

    #[test]
    fn test_uninitialized_store() {
        let host = FakeHost::default();
        let store = ConfigStore::new();
        let writer = ConfigWriter::new(None, false);

        let err = provisioner(&host, "debian", true).ensure(&store, &writer).unwrap_err();
        assert!(matches!(err, ProvisionError::Store(ConfigError::NotInitialized)));
    }
}
