pub mod host_keys;
pub mod session;
pub mod sftp;

pub use host_keys::{HostKeyCheck, HostKeyPolicy};
pub use sftp::SshConnector;

use std::fmt;

/// SSH connection configuration.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: SshAuth,
}

impl SshConfig {
    /// `host:port`, used in log lines and error messages.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// SSH authentication method.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub enum SshAuth {
    Password(String),
    KeyFile {
        path: String,
        passphrase: Option<String>,
    },
}

impl fmt::Debug for SshAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SshAuth::Password(_) => f.write_str("Password(<redacted>)"),
            SshAuth::KeyFile { path, .. } => f.debug_struct("KeyFile").field("path", path).finish(),
        }
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 22,
            username: "root".to_string(),
            auth: SshAuth::Password(String::new()),
        }
    }
}
