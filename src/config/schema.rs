//! Configuration schema definitions.
//!
//! This module defines the complete configuration document for the daemon.
//! All types derive Serde traits and fall back to their `Default` impls for
//! any field the document omits.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default location of the configuration document.
pub const DEFAULT_LOCATION: &str = "/etc/hostd/config.yml";

/// Root configuration snapshot.
///
/// A snapshot is never mutated once it has been published to a
/// [`ConfigStore`](crate::config::ConfigStore); updates clone it, modify the
/// clone, and publish the clone.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Configuration {
    /// Run in debug mode. A `--debug` flag overrides this for the running
    /// process without being persisted.
    pub debug: bool,

    /// Unique identifier of this node in the panel.
    pub uuid: String,

    /// Identifier used by the panel to look up [`Self::authentication_token`].
    #[serde(rename = "token_id")]
    pub authentication_token_id: String,

    /// Shared secret. Inbound requests are validated against a key derived
    /// from it.
    #[serde(rename = "token")]
    pub authentication_token: AuthToken,

    pub api: ApiConfiguration,

    pub system: SystemConfiguration,

    pub docker: DockerConfiguration,

    /// Seconds between disk usage checks.
    pub disk_check_timeout: u64,

    pub throttles: ThrottleConfiguration,

    /// Location of the panel this daemon reports to.
    #[serde(rename = "remote")]
    pub panel_location: String,

    pub observability: ObservabilityConfig,
}

/// Authentication token.
///
/// Compared by value; never printed by `Debug`.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("AuthToken(<empty>)")
        } else {
            f.write_str("AuthToken(<redacted>)")
        }
    }
}

impl From<&str> for AuthToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// Internal API webserver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfiguration {
    /// Interface the webserver binds to.
    pub host: String,

    /// Port the webserver binds to.
    pub port: u16,

    pub ssl: SslConfiguration,

    /// Maximum upload size through the panel, in megabytes.
    pub upload_limit: u64,
}

impl Default for ApiConfiguration {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            ssl: SslConfiguration::default(),
            upload_limit: 100,
        }
    }
}

/// TLS settings for the API.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SslConfiguration {
    pub enabled: bool,

    /// Path to certificate file (PEM).
    #[serde(rename = "cert")]
    pub certificate_file: String,

    /// Path to private key file (PEM).
    #[serde(rename = "key")]
    pub key_file: String,
}

/// Host-level settings: directories, the system account, and boot-time
/// ownership reconciliation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfiguration {
    pub root_directory: PathBuf,

    pub log_directory: PathBuf,

    /// Directory holding one sub-directory per workload.
    pub data: PathBuf,

    /// Account that owns workload data.
    pub username: String,

    /// Numeric ids recorded for [`Self::username`] once provisioned.
    pub user: SystemUser,

    /// Reassign ownership of workload directories at boot.
    pub set_permissions_on_boot: bool,

    /// Descend into workload directories when reassigning ownership.
    pub recursive_permissions: bool,

    /// Upper bound on concurrent ownership changes.
    pub permission_workers: usize,

    pub sftp: SftpConfiguration,
}

impl Default for SystemConfiguration {
    fn default() -> Self {
        Self {
            root_directory: PathBuf::from("/var/lib/hostd"),
            log_directory: PathBuf::from("/var/log/hostd"),
            data: PathBuf::from("/var/lib/hostd/volumes"),
            username: "hostd".to_string(),
            user: SystemUser::default(),
            set_permissions_on_boot: true,
            recursive_permissions: false,
            permission_workers: 16,
            sftp: SftpConfiguration::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SystemUser {
    pub uid: u32,
    pub gid: u32,
}

/// Built-in SFTP server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SftpConfiguration {
    /// When false, an external SFTP server must be run instead.
    #[serde(rename = "use_internal")]
    pub use_internal_system: bool,

    pub disable_disk_checking: bool,

    #[serde(rename = "bind_address")]
    pub address: String,

    #[serde(rename = "bind_port")]
    pub port: u16,

    pub read_only: bool,
}

impl Default for SftpConfiguration {
    fn default() -> Self {
        Self {
            use_internal_system: true,
            disable_disk_checking: false,
            address: "0.0.0.0".to_string(),
            port: 2022,
            read_only: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DockerConfiguration {
    pub network: DockerNetworkConfiguration,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DockerNetworkConfiguration {
    pub interface: String,
    pub name: String,
    pub driver: String,
}

impl Default for DockerNetworkConfiguration {
    fn default() -> Self {
        Self {
            interface: "172.18.0.1".to_string(),
            name: "hostd_nw".to_string(),
            driver: "bridge".to_string(),
        }
    }
}

/// Output throttling applied to workload processes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThrottleConfiguration {
    /// Overage warnings (inclusive) tolerated before a process is killed.
    pub kill_at_count: u32,

    /// Seconds before accumulated warnings start decaying.
    #[serde(rename = "decay")]
    pub decay_seconds: u64,

    /// Bytes a process may emit per interval.
    #[serde(rename = "bytes")]
    pub bytes_per_interval: u64,

    /// Milliseconds between throttle checks.
    pub check_interval: u64,
}

impl Default for ThrottleConfiguration {
    fn default() -> Self {
        Self {
            kill_at_count: 5,
            decay_seconds: 10,
            bytes_per_interval: 4096,
            check_interval: 100,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert!(!config.debug);
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.system.username, "hostd");
        assert!(config.system.set_permissions_on_boot);
        assert!(!config.system.recursive_permissions);
        assert_eq!(config.throttles.kill_at_count, 5);
        assert_eq!(config.system.sftp.port, 2022);
    }

    #[test]
    fn test_minimal_document_keeps_defaults() {
        let config: Configuration = serde_yaml::from_str("token: abc\nremote: https://panel\n").unwrap();
        assert_eq!(config.authentication_token, AuthToken::new("abc"));
        assert_eq!(config.panel_location, "https://panel");
        assert_eq!(config.api.upload_limit, 100);
        assert_eq!(config.throttles.bytes_per_interval, 4096);
    }

    #[test]
    fn test_renamed_fields() {
        let doc = "token_id: id1\nsystem:\n  user:\n    uid: 998\n    gid: 997\n  sftp:\n    bind_port: 2200\nthrottles:\n  decay: 30\n";
        let config: Configuration = serde_yaml::from_str(doc).unwrap();
        assert_eq!(config.authentication_token_id, "id1");
        assert_eq!(config.system.user, SystemUser { uid: 998, gid: 997 });
        assert_eq!(config.system.sftp.port, 2200);
        assert_eq!(config.throttles.decay_seconds, 30);
    }

    #[test]
    fn test_token_is_redacted_in_debug() {
        let mut config = Configuration::default();
        config.authentication_token = AuthToken::new("super-secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("AuthToken(<redacted>)"));
    }

    #[test]
    fn test_token_serializes_as_plain_string() {
        let mut config = Configuration::default();
        config.authentication_token = AuthToken::new("abc123");
        let doc = serde_yaml::to_string(&config).unwrap();
        assert!(doc.contains("token: abc123"));
    }
}
