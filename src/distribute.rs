//! Writing fetched material to every configured destination.
//!
//! Destinations are processed strictly in order. Whatever goes wrong with
//! one of them is recorded in its [`DestinationOutcome`] and the loop moves
//! on to the next.

use crate::config::DestinationSpec;
use crate::error::{DestinationError, WriteError};
use crate::fetch::SslMaterial;
use crate::pfx::{build_pfx, pfx_filename, DEFAULT_PFX_NAME};
use crate::transfer::{ensure_dir, join_remote, Connector, DirStatus, RemoteFs};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// One file to place at a destination.
#[derive(Debug, Clone)]
pub struct PayloadFile<'a> {
    pub name: String,
    pub data: Cow<'a, [u8]>,
}

/// Where a destination's files end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Local(PathBuf),
    Remote { endpoint: String, path: String },
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Local(path) => write!(f, "{}", path.display()),
            Target::Remote { endpoint, path } => write!(f, "{}:{}", endpoint, path),
        }
    }
}

/// Result of processing one destination.
#[derive(Debug)]
pub struct DestinationOutcome {
    pub name: String,
    pub target: Target,
    /// Paths written, in write order.
    pub result: Result<Vec<String>, DestinationError>,
}

impl DestinationOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Files to write for `dest`: one PFX archive, or the two PEM files under
/// their names on the source host.
pub fn build_payload<'a>(
    material: &'a SslMaterial,
    dest: &DestinationSpec,
) -> Result<Vec<PayloadFile<'a>>, DestinationError> {
    if dest.convert_to_pfx {
        // The friendly name and the filename share one logical name.
        let ssl_name = if dest.ssl_name.is_empty() {
            DEFAULT_PFX_NAME
        } else {
            dest.ssl_name.as_str()
        };
        let pfx = build_pfx(
            &material.privkey_bytes,
            &material.cert_bytes,
            dest.ssl_password.as_deref().unwrap_or_default(),
            ssl_name,
        )?;
        return Ok(vec![PayloadFile {
            name: pfx_filename(ssl_name),
            data: Cow::Owned(pfx),
        }]);
    }

    Ok(vec![
        PayloadFile {
            name: material.privkey_filename.clone(),
            data: Cow::Borrowed(&material.privkey_bytes),
        },
        PayloadFile {
            name: material.cert_filename.clone(),
            data: Cow::Borrowed(&material.cert_bytes),
        },
    ])
}

/// Process every destination in order.
pub async fn distribute(
    material: &SslMaterial,
    destinations: &[DestinationSpec],
    connector: &dyn Connector,
) -> Vec<DestinationOutcome> {
    let mut outcomes = Vec::with_capacity(destinations.len());

    for (idx, dest) in destinations.iter().enumerate() {
        let target = target_of(dest);
        log::info!("{}. {}", idx + 1, dest.display_name());
        log::info!("   SSL Name: {}", dest.ssl_name);
        log::info!("   Target: {}", target);
        log::info!("   Convert to PFX: {}", dest.convert_to_pfx);

        let result = distribute_one(material, dest, connector).await;
        match &result {
            Ok(written) => {
                let kind = if dest.convert_to_pfx { "PFX" } else { "PEM" };
                let verb = if dest.is_local() { "saved locally" } else { "uploaded" };
                for path in written {
                    log::info!("   ✓ {} {}: {}", kind, verb, path);
                }
            }
            Err(e) => log::error!("   ✗ {}", e),
        }

        outcomes.push(DestinationOutcome {
            name: dest.display_name().to_string(),
            target,
            result,
        });
    }

    outcomes
}

fn target_of(dest: &DestinationSpec) -> Target {
    if dest.is_local() {
        Target::Local(PathBuf::from(dest.target_dir()))
    } else {
        Target::Remote {
            endpoint: dest.ssh_config().endpoint(),
            path: dest.target_dir().to_string(),
        }
    }
}

async fn distribute_one(
    material: &SslMaterial,
    dest: &DestinationSpec,
    connector: &dyn Connector,
) -> Result<Vec<String>, DestinationError> {
    let files = build_payload(material, dest)?;

    if dest.is_local() {
        return Ok(write_local(Path::new(dest.target_dir()), &files).await?);
    }

    let session = connector.connect(&dest.ssh_config()).await?;
    let result = write_remote(session.as_ref(), dest.target_dir(), &files).await;
    if let Err(e) = session.close().await {
        log::warn!("   Failed to close session: {}", e);
    }
    Ok(result?)
}

/// Create `dir` if needed and write each file, replacing existing ones.
pub async fn write_local(dir: &Path, files: &[PayloadFile<'_>]) -> Result<Vec<String>, WriteError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| WriteError::LocalDir {
            path: dir.to_path_buf(),
            source,
        })?;

    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = dir.join(&file.name);
        tokio::fs::write(&path, &file.data)
            .await
            .map_err(|source| WriteError::LocalFile {
                path: path.clone(),
                source,
            })?;
        written.push(path.display().to_string());
    }
    Ok(written)
}

/// Ensure `dir` exists on the remote host and upload each file into it.
pub async fn write_remote(
    fs: &dyn RemoteFs,
    dir: &str,
    files: &[PayloadFile<'_>],
) -> Result<Vec<String>, WriteError> {
    let status = ensure_dir(fs, dir)
        .await
        .map_err(|source| WriteError::RemoteDir {
            path: dir.to_string(),
            source,
        })?;
    if status == DirStatus::Created {
        log::info!("   Created remote directory {}", dir);
    }

    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = join_remote(dir, &file.name);
        fs.write_file(&path, &file.data)
            .await
            .map_err(|source| WriteError::RemoteFile {
                path: path.clone(),
                source,
            })?;
        written.push(path);
    }
    Ok(written)
}
