//! Changing on-disk ownership.

use std::io;
use std::path::Path;

use nix::fcntl::AtFlags;
use nix::unistd::{fchownat, Gid, Uid};
use walkdir::WalkDir;

use crate::system::SystemIdentity;

/// Reassigns ownership of one workload directory.
pub trait OwnershipChanger: Send + Sync + 'static {
    fn change_owner(&self, path: &Path, identity: &SystemIdentity, recursive: bool) -> io::Result<()>;
}

/// `fchownat(2)` with `AT_SYMLINK_NOFOLLOW` via nix.
///
/// The final path component is never dereferenced: an entry swapped for a
/// symlink between listing and chown has the link itself re-owned, not its
/// target. Recursive mode walks without following links and leaves symlink
/// entries untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChownOwnership;

impl OwnershipChanger for ChownOwnership {
    fn change_owner(&self, path: &Path, identity: &SystemIdentity, recursive: bool) -> io::Result<()> {
        let uid = Uid::from_raw(identity.uid);
        let gid = Gid::from_raw(identity.gid);

        if !recursive {
            return chown_no_follow(path, uid, gid);
        }

        for entry in WalkDir::new(path).follow_links(false).follow_root_links(false) {
            let entry = entry?;
            if entry.path_is_symlink() {
                continue;
            }
            chown_no_follow(entry.path(), uid, gid)?;
        }
        Ok(())
    }
}

fn chown_no_follow(path: &Path, uid: Uid, gid: Gid) -> io::Result<()> {
    fchownat(None, path, Some(uid), Some(gid), AtFlags::AT_SYMLINK_NOFOLLOW).map_err(io::Error::from)
}
