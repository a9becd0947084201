//! Server host key verification.
//!
//! The policy is chosen per run. `AcceptAny` trusts every key on sight and
//! only logs its fingerprint; `AcceptNew` records unknown hosts in a
//! known_hosts file and refuses keys that changed; `Strict` accepts only
//! keys that are already recorded.

use russh::keys::ssh_key::{HashAlg, PublicKey};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How unknown or changed server keys are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostKeyPolicy {
    #[default]
    AcceptAny,
    AcceptNew,
    Strict,
}

/// Host key policy plus the known_hosts file it consults.
///
/// `known_hosts` of `None` means the user's `~/.ssh/known_hosts`.
#[derive(Clone, Debug, Default)]
pub struct HostKeyCheck {
    pub policy: HostKeyPolicy,
    pub known_hosts: Option<PathBuf>,
}

impl HostKeyCheck {
    pub fn new(policy: HostKeyPolicy, known_hosts: Option<PathBuf>) -> Self {
        Self { policy, known_hosts }
    }

    /// Decide whether `key` presented by `host:port` is acceptable.
    ///
    /// Returns `Ok(false)` for an unknown key under `Strict`, and an error
    /// when a recorded key no longer matches.
    pub fn verify(&self, host: &str, port: u16, key: &PublicKey) -> Result<bool, anyhow::Error> {
        let fingerprint = key.fingerprint(HashAlg::Sha256);

        match self.policy {
            HostKeyPolicy::AcceptAny => {
                log::warn!(
                    "Accepting host key for {}:{} without verification ({})",
                    host,
                    port,
                    fingerprint
                );
                Ok(true)
            }
            HostKeyPolicy::AcceptNew => {
                if self.is_known(host, port, key)? {
                    return Ok(true);
                }
                self.learn(host, port, key)?;
                log::info!("Recorded new host key for {}:{} ({})", host, port, fingerprint);
                Ok(true)
            }
            HostKeyPolicy::Strict => {
                let known = self.is_known(host, port, key)?;
                if !known {
                    log::error!(
                        "Host key for {}:{} is not in known_hosts ({})",
                        host,
                        port,
                        fingerprint
                    );
                }
                Ok(known)
            }
        }
    }

    fn is_known(&self, host: &str, port: u16, key: &PublicKey) -> Result<bool, anyhow::Error> {
        let result = match &self.known_hosts {
            Some(path) if !path.exists() => return Ok(false),
            Some(path) => russh::keys::check_known_hosts_path(host, port, key, path),
            None => russh::keys::check_known_hosts(host, port, key),
        };
        result.map_err(|e| anyhow::anyhow!("host key verification failed for {}:{}: {}", host, port, e))
    }

    fn learn(&self, host: &str, port: u16, key: &PublicKey) -> Result<(), anyhow::Error> {
        let result = match &self.known_hosts {
            Some(path) => {
                ensure_parent(path)?;
                russh::keys::known_hosts::learn_known_hosts_path(host, port, key, path)
            }
            None => russh::keys::known_hosts::learn_known_hosts(host, port, key),
        };
        result.map_err(|e| anyhow::anyhow!("failed to record host key for {}:{}: {}", host, port, e))
    }
}

fn ensure_parent(path: &Path) -> Result<(), anyhow::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
