//! Options file model and loader.
//!
//! The file is the JSON `options.json` written by the add-on supervisor.
//! Field names follow that file verbatim, including `convert_to_PFX`.

use crate::error::ConfigError;
use crate::ssh::{HostKeyCheck, HostKeyPolicy, SshAuth, SshConfig};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// Options file location inside the add-on container.
pub const ADDON_CONFIG_PATH: &str = "/data/options.json";

/// Fallback for running outside the container.
pub const LOCAL_CONFIG_PATH: &str = "data/options.json";

pub const DEFAULT_PRIVKEY_NAME: &str = "privkey.pem";
pub const DEFAULT_CERT_NAME: &str = "cert.pem";
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Placeholder host shipped in the default options; treated as "local".
pub const PLACEHOLDER_HOST: &str = "example.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub ssh_host: String,

    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,

    pub ssh_logins: SshLogins,

    pub ssh_path: String,

    #[serde(default = "default_privkey_name")]
    pub ssl_privkey_name: String,

    #[serde(default = "default_cert_name")]
    pub ssl_cert_name: String,

    #[serde(default)]
    pub host_key_policy: HostKeyPolicy,

    /// Defaults to `~/.ssh/known_hosts`.
    #[serde(default)]
    pub known_hosts_path: Option<PathBuf>,

    #[serde(default)]
    pub copy: Vec<DestinationSpec>,
}

/// Credentials for the source host.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SshLogins {
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub password: String,

    /// Private key file; takes precedence over the password when set.
    #[serde(default)]
    pub key_file: Option<String>,

    #[serde(default)]
    pub key_passphrase: Option<String>,
}

impl std::fmt::Debug for SshLogins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshLogins")
            .field("username", &self.username)
            .field("key_file", &self.key_file)
            .finish_non_exhaustive()
    }
}

/// One copy target.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct DestinationSpec {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Logical name used for the PFX friendly name and filename.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ssl_name: String,

    #[serde(default)]
    pub host_address: Option<String>,

    #[serde(default)]
    pub host_port: Option<u16>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,

    #[serde(rename = "convert_to_PFX", default, deserialize_with = "null_as_default")]
    pub convert_to_pfx: bool,

    #[serde(default)]
    pub ssl_password: Option<String>,

    #[serde(default)]
    pub host_username: Option<String>,

    #[serde(default)]
    pub host_password: Option<String>,
}

impl std::fmt::Debug for DestinationSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationSpec")
            .field("name", &self.name)
            .field("ssl_name", &self.ssl_name)
            .field("host_address", &self.host_address)
            .field("host_port", &self.host_port)
            .field("path", &self.path)
            .field("convert_to_pfx", &self.convert_to_pfx)
            .field("host_username", &self.host_username)
            .finish_non_exhaustive()
    }
}

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_ssh_port() -> u16 {
    DEFAULT_SSH_PORT
}

fn default_privkey_name() -> String {
    DEFAULT_PRIVKEY_NAME.to_string()
}

fn default_cert_name() -> String {
    DEFAULT_CERT_NAME.to_string()
}

impl SyncConfig {
    /// Load from `path`, or from the first default location that exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => default_config_path()?,
        };
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SyncConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Connection settings for the source host.
    pub fn source_ssh_config(&self) -> SshConfig {
        let auth = match &self.ssh_logins.key_file {
            Some(path) if !path.is_empty() => SshAuth::KeyFile {
                path: path.clone(),
                passphrase: self.ssh_logins.key_passphrase.clone(),
            },
            _ => SshAuth::Password(self.ssh_logins.password.clone()),
        };
        SshConfig {
            host: self.ssh_host.clone(),
            port: self.ssh_port,
            username: self.ssh_logins.username.clone(),
            auth,
        }
    }

    pub fn host_key_check(&self) -> HostKeyCheck {
        HostKeyCheck::new(self.host_key_policy, self.known_hosts_path.clone())
    }
}

impl DestinationSpec {
    /// True when the payload is written to the local filesystem.
    ///
    /// Local means no usable host: an empty or placeholder address, or no
    /// port.
    pub fn is_local(&self) -> bool {
        let address = self
            .host_address
            .as_deref()
            .unwrap_or_default()
            .trim();
        address.is_empty()
            || address.eq_ignore_ascii_case(PLACEHOLDER_HOST)
            || !matches!(self.host_port, Some(port) if port != 0)
    }

    /// Destination directory; an empty path means the working directory.
    pub fn target_dir(&self) -> &str {
        if self.path.is_empty() {
            "."
        } else {
            &self.path
        }
    }

    /// Connection settings for a remote destination.
    pub fn ssh_config(&self) -> SshConfig {
        SshConfig {
            host: self
                .host_address
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string(),
            port: self
                .host_port
                .filter(|port| *port != 0)
                .unwrap_or(DEFAULT_SSH_PORT),
            username: self.host_username.clone().unwrap_or_default(),
            auth: SshAuth::Password(self.host_password.clone().unwrap_or_default()),
        }
    }

    /// Label used in status output.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.ssl_name
        } else {
            &self.name
        }
    }
}

fn default_config_path() -> Result<PathBuf, ConfigError> {
    let candidates = [PathBuf::from(ADDON_CONFIG_PATH), PathBuf::from(LOCAL_CONFIG_PATH)];
    candidates
        .iter()
        .find(|p| p.exists())
        .cloned()
        .ok_or_else(|| ConfigError::NotFound(candidates.to_vec()))
}
