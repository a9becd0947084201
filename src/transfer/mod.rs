//! Remote filesystem seam between the pipeline and the SFTP transport.
//!
//! The pipeline only talks to [`RemoteFs`] and [`Connector`]; the russh
//! backed implementation lives in [`crate::ssh::sftp`].

#[cfg(test)]
pub mod memory;

use crate::error::{ConnectError, TransferError};
use crate::ssh::SshConfig;
use async_trait::async_trait;

/// One name in a remote directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteFileEntry {
    pub name: String,
    pub is_dir: bool,
}

/// What kind of object lives at a remote path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteKind {
    File,
    Dir,
}

/// Result of [`ensure_dir`] on a path that now exists as a directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirStatus {
    Created,
    AlreadyExisted,
}

/// One open, authenticated file-transfer session.
#[async_trait]
pub trait RemoteFs: Send + Sync {
    /// List a directory, excluding `.` and `..`.
    async fn list_dir(&self, path: &str) -> Result<Vec<RemoteFileEntry>, TransferError>;

    /// Read a whole file into memory.
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, TransferError>;

    /// Create or truncate `path` and write `data` to it.
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), TransferError>;

    /// `Ok(None)` when nothing exists at `path`.
    async fn stat(&self, path: &str) -> Result<Option<RemoteKind>, TransferError>;

    /// Create a single directory; the parent must exist.
    async fn create_dir(&self, path: &str) -> Result<(), TransferError>;

    /// Release the session. Consumes it so it cannot be closed twice.
    async fn close(self: Box<Self>) -> Result<(), TransferError>;
}

/// Opens [`RemoteFs`] sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &SshConfig) -> Result<Box<dyn RemoteFs>, ConnectError>;
}

/// Join a remote directory and a filename with forward slashes.
pub fn join_remote(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        return name.to_string();
    }
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

/// Create `path` and any missing ancestors, one component at a time.
///
/// Components that already exist as directories are left alone, so calling
/// this repeatedly on the same path is safe. Relative paths are created
/// relative to the session's working directory.
pub async fn ensure_dir(fs: &dyn RemoteFs, path: &str) -> Result<DirStatus, TransferError> {
    let absolute = path.starts_with('/');
    let mut current = String::new();
    let mut status = DirStatus::AlreadyExisted;

    for part in path.split('/').filter(|p| !p.is_empty()) {
        if current.is_empty() && !absolute {
            current.push_str(part);
        } else {
            current.push('/');
            current.push_str(part);
        }

        match fs.stat(&current).await? {
            Some(RemoteKind::Dir) => {}
            Some(RemoteKind::File) => return Err(TransferError::NotADirectory(current)),
            None => match fs.create_dir(&current).await {
                Ok(()) => {
                    log::debug!("Created remote directory {}", current);
                    status = DirStatus::Created;
                }
                // Lost a race with another writer; fine if it is a directory.
                Err(e) => match fs.stat(&current).await? {
                    Some(RemoteKind::Dir) => {}
                    _ => return Err(e),
                },
            },
        }
    }

    Ok(status)
}
