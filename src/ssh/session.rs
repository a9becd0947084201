use super::{HostKeyCheck, SshAuth, SshConfig};
use crate::error::ConnectError;
use russh::*;
use russh::keys::*;
use russh_sftp::client::SftpSession;
use std::sync::Arc;
use tokio::sync::Mutex;

/// SSH session manager.
pub struct SshSession {
    config: SshConfig,
    host_keys: HostKeyCheck,
    handle: Option<Arc<Mutex<client::Handle<SshHandler>>>>,
}

/// SSH client handler; only host key verification is customised.
struct SshHandler {
    host: String,
    port: u16,
    host_keys: HostKeyCheck,
}

impl client::Handler for SshHandler {
    type Error = anyhow::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        self.host_keys.verify(&self.host, self.port, server_public_key)
    }
}

impl SshSession {
    pub fn new(config: SshConfig, host_keys: HostKeyCheck) -> Self {
        Self {
            config,
            host_keys,
            handle: None,
        }
    }

    /// Establish and authenticate the SSH connection.
    pub async fn connect(&mut self) -> Result<(), ConnectError> {
        let endpoint = self.config.endpoint();
        if self.config.username.is_empty() {
            return Err(ConnectError::MissingUsername(endpoint));
        }

        let handler = SshHandler {
            host: self.config.host.clone(),
            port: self.config.port,
            host_keys: self.host_keys.clone(),
        };

        let mut session = client::connect(
            Arc::new(client::Config::default()),
            (self.config.host.as_str(), self.config.port),
            handler,
        )
        .await
        .map_err(|e| ConnectError::Transport {
            endpoint: endpoint.clone(),
            reason: format!("{:#}", e),
        })?;

        let transport = |e: russh::Error| ConnectError::Transport {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        };

        let result = match &self.config.auth {
            SshAuth::Password(password) => session
                .authenticate_password(&self.config.username, password)
                .await
                .map_err(transport)?,
            SshAuth::KeyFile { path, passphrase } => {
                let key_pair = load_secret_key(path, passphrase.as_deref()).map_err(|e| {
                    ConnectError::KeyFile {
                        path: path.clone(),
                        reason: e.to_string(),
                    }
                })?;
                let pk = PrivateKeyWithHashAlg::new(Arc::new(key_pair), None);
                session
                    .authenticate_publickey(&self.config.username, pk)
                    .await
                    .map_err(transport)?
            }
        };

        match result {
            client::AuthResult::Success => {}
            client::AuthResult::Failure { .. } => {
                let _ = session
                    .disconnect(Disconnect::ByApplication, "Authentication failed", "en")
                    .await;
                return Err(ConnectError::AuthRejected {
                    endpoint,
                    username: self.config.username.clone(),
                });
            }
        }

        self.handle = Some(Arc::new(Mutex::new(session)));
        log::debug!("SSH connected to {}", endpoint);
        Ok(())
    }

    /// Open the SFTP subsystem on a fresh channel.
    pub async fn open_sftp(&self) -> Result<SftpSession, ConnectError> {
        let subsystem = |reason: String| ConnectError::Subsystem {
            endpoint: self.config.endpoint(),
            reason,
        };

        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| subsystem("not connected".to_string()))?;

        let channel = handle
            .lock()
            .await
            .channel_open_session()
            .await
            .map_err(|e| subsystem(e.to_string()))?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| subsystem(e.to_string()))?;

        SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| subsystem(e.to_string()))
    }

    /// Disconnect the SSH session. A no-op when not connected.
    pub async fn disconnect(&mut self) -> Result<(), anyhow::Error> {
        if let Some(handle) = self.handle.take() {
            let h = handle.lock().await;
            h.disconnect(Disconnect::ByApplication, "Session finished", "en")
                .await?;
        }
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    pub fn config(&self) -> &SshConfig {
        &self.config
    }
}
