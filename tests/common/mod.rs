//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use hostd::system::{
    AccountCommand, AccountDatabase, CommandExecutor, IdentityProvisioner, ReleaseReader,
    SystemIdentity, TemplateRegistry,
};
use nix::unistd::{getgid, getuid};

/// Identity of the test process; chown to it always succeeds.
pub fn current_identity(username: &str) -> SystemIdentity {
    SystemIdentity::new(username, getuid().as_raw(), getgid().as_raw())
}

/// An in-memory passwd plus a log of account commands run against it.
#[derive(Clone, Default)]
pub struct FakeHost {
    pub accounts: Arc<Mutex<HashMap<String, SystemIdentity>>>,
    pub commands: Arc<Mutex<Vec<String>>>,
}

impl FakeHost {
    /// Provisioner whose account creation registers `identity`.
    pub fn provisioner(&self, release: &'static str, identity: SystemIdentity) -> IdentityProvisioner {
        IdentityProvisioner::new(
            Box::new(FakeAccounts(self.clone())),
            Box::new(FixedRelease(release)),
            Box::new(FakeExecutor {
                host: self.clone(),
                identity,
            }),
            TemplateRegistry::with_defaults(),
        )
    }

    pub fn command_count(&self) -> usize {
        self.commands.lock().unwrap().len()
    }
}

struct FakeAccounts(FakeHost);

impl AccountDatabase for FakeAccounts {
    fn lookup(&self, username: &str) -> io::Result<Option<SystemIdentity>> {
        Ok(self.0.accounts.lock().unwrap().get(username).cloned())
    }
}

struct FixedRelease(&'static str);

impl ReleaseReader for FixedRelease {
    fn system_id(&self) -> io::Result<String> {
        Ok(self.0.to_string())
    }
}

struct FakeExecutor {
    host: FakeHost,
    identity: SystemIdentity,
}

impl CommandExecutor for FakeExecutor {
    fn execute(&self, command: &AccountCommand) -> io::Result<()> {
        self.host.commands.lock().unwrap().push(command.to_string());
        if command.program == "useradd" || command.program == "adduser" {
            self.host
                .accounts
                .lock()
                .unwrap()
                .insert(self.identity.username.clone(), self.identity.clone());
        }
        Ok(())
    }
}

/// A config file and data directory laid out under one temp dir.
pub struct Layout {
    pub dir: tempfile::TempDir,
    pub config_path: PathBuf,
    pub data: PathBuf,
}

impl Layout {
    pub fn new(extra_yaml: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("volumes");
        fs::create_dir(&data).unwrap();

        let config_path = dir.path().join("config.yml");
        let document = format!(
            "token_id: node-1\ntoken: initial-token\nsystem:\n  data: {}\n  username: hostd\n{}",
            data.display(),
            extra_yaml
        );
        fs::write(&config_path, document).unwrap();

        Self {
            dir,
            config_path,
            data,
        }
    }

    pub fn add_dir(&self, name: &str) -> PathBuf {
        let path = self.data.join(name);
        fs::create_dir(&path).unwrap();
        path
    }

    pub fn add_file(&self, name: &str) {
        fs::write(self.data.join(name), b"x").unwrap();
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}
