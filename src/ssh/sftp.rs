use super::session::SshSession;
use super::{HostKeyCheck, SshConfig};
use crate::error::{ConnectError, TransferError};
use crate::transfer::{Connector, RemoteFileEntry, RemoteFs, RemoteKind};
use async_trait::async_trait;
use russh_sftp::client::error::Error as SftpError;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::StatusCode;
use tokio::io::AsyncWriteExt;

/// SFTP operations over one SSH connection.
pub struct SftpClient {
    ssh: SshSession,
    session: SftpSession,
}

impl SftpClient {
    /// Connect, authenticate and start the SFTP subsystem.
    ///
    /// The SSH connection is torn down again if the subsystem cannot be
    /// opened.
    pub async fn open(config: SshConfig, host_keys: HostKeyCheck) -> Result<Self, ConnectError> {
        let endpoint = config.endpoint();
        log::info!("Connecting to {} as {}...", endpoint, config.username);

        let mut ssh = SshSession::new(config, host_keys);
        ssh.connect().await?;

        match ssh.open_sftp().await {
            Ok(session) => {
                log::info!("✓ SFTP connection established");
                Ok(Self { ssh, session })
            }
            Err(e) => {
                if let Err(close_err) = ssh.disconnect().await {
                    log::warn!("Failed to disconnect from {}: {}", endpoint, close_err);
                }
                Err(e)
            }
        }
    }
}

fn is_not_found(err: &SftpError) -> bool {
    matches!(err, SftpError::Status(status) if status.status_code == StatusCode::NoSuchFile)
}

#[async_trait]
impl RemoteFs for SftpClient {
    async fn list_dir(&self, path: &str) -> Result<Vec<RemoteFileEntry>, TransferError> {
        let dir = self.session.read_dir(path).await?;
        let mut entries = Vec::new();

        for entry in dir {
            let name = entry.file_name();
            if name == "." || name == ".." {
                continue;
            }
            let is_dir = entry.file_type().is_dir();
            entries.push(RemoteFileEntry { name, is_dir });
        }

        Ok(entries)
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>, TransferError> {
        let data = self.session.read(path).await?;
        log::debug!("Downloaded {} ({} bytes)", path, data.len());
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), TransferError> {
        let mut file = self.session.create(path).await?;
        file.write_all(data).await?;
        file.shutdown().await?;
        log::debug!("Uploaded {} ({} bytes)", path, data.len());
        Ok(())
    }

    async fn stat(&self, path: &str) -> Result<Option<RemoteKind>, TransferError> {
        match self.session.metadata(path).await {
            Ok(attrs) if attrs.is_dir() => Ok(Some(RemoteKind::Dir)),
            Ok(_) => Ok(Some(RemoteKind::File)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_dir(&self, path: &str) -> Result<(), TransferError> {
        self.session.create_dir(path).await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), TransferError> {
        let Self { mut ssh, session } = *self;
        let endpoint = ssh.config().endpoint();

        let sftp_result = session.close().await;
        if let Err(e) = ssh.disconnect().await {
            log::warn!("SSH disconnect from {} failed: {}", endpoint, e);
        }
        log::debug!("Closed session to {}", endpoint);
        sftp_result.map_err(TransferError::from)
    }
}

/// Opens russh-backed SFTP sessions with a fixed host key policy.
#[derive(Clone, Debug, Default)]
pub struct SshConnector {
    host_keys: HostKeyCheck,
}

impl SshConnector {
    pub fn new(host_keys: HostKeyCheck) -> Self {
        Self { host_keys }
    }
}

#[async_trait]
impl Connector for SshConnector {
    async fn connect(&self, config: &SshConfig) -> Result<Box<dyn RemoteFs>, ConnectError> {
        let client = SftpClient::open(config.clone(), self.host_keys.clone()).await?;
        Ok(Box::new(client))
    }
}
