//! Operating-system account lookup.

use std::io;

use nix::unistd::User;

use crate::config::schema::SystemUser;

/// A resolved account: name plus numeric user and group ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemIdentity {
    pub username: String,
    pub uid: u32,
    pub gid: u32,
}

impl SystemIdentity {
    pub fn new(username: impl Into<String>, uid: u32, gid: u32) -> Self {
        Self {
            username: username.into(),
            uid,
            gid,
        }
    }

    /// The ids as recorded in the configuration document.
    pub fn as_system_user(&self) -> SystemUser {
        SystemUser {
            uid: self.uid,
            gid: self.gid,
        }
    }
}

/// Source of account records.
pub trait AccountDatabase: Send + Sync {
    /// `Ok(None)` means the account does not exist; `Err` means the lookup
    /// itself failed.
    fn lookup(&self, username: &str) -> io::Result<Option<SystemIdentity>>;
}

/// The host's passwd database.
#[derive(Debug, Default, Clone, Copy)]
pub struct PasswdDatabase;

impl AccountDatabase for PasswdDatabase {
    fn lookup(&self, username: &str) -> io::Result<Option<SystemIdentity>> {
        let user = User::from_name(username).map_err(io::Error::from)?;
        Ok(user.map(|u| SystemIdentity::new(u.name, u.uid.as_raw(), u.gid.as_raw())))
    }
}
