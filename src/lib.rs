//! Host daemon configuration runtime library.

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod permissions;
pub mod system;

pub use config::{ConfigStore, ConfigWriter, Configuration};
pub use lifecycle::{Daemon, Shutdown, Startup};
pub use permissions::PermissionReconciler;
pub use system::IdentityProvisioner;
