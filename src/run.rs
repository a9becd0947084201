use crate::config::SyncConfig;
use crate::distribute::{distribute, DestinationOutcome};
use crate::error::SyncError;
use crate::fetch::fetch_ssl_material;
use crate::transfer::Connector;

/// What a completed run did.
#[derive(Debug)]
pub struct RunReport {
    pub privkey_filename: String,
    pub cert_filename: String,
    pub destinations: Vec<DestinationOutcome>,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.destinations.iter().filter(|d| !d.is_success()).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

/// Fetch from the source host once and distribute to every destination.
///
/// The source session is closed before returning on every path.
pub async fn run(config: &SyncConfig, connector: &dyn Connector) -> Result<RunReport, SyncError> {
    log::info!("=== SSL Sync Configuration ===");
    log::info!("SSH Host: {}:{}", config.ssh_host, config.ssh_port);
    log::info!("Remote Path: {}", config.ssh_path);
    log::info!("Private Key: {}", config.ssl_privkey_name);
    log::info!("Certificate: {}", config.ssl_cert_name);

    let source = connector.connect(&config.source_ssh_config()).await?;

    let fetched = fetch_ssl_material(
        source.as_ref(),
        &config.ssh_path,
        &config.ssl_privkey_name,
        &config.ssl_cert_name,
    )
    .await;

    let report = match fetched {
        Ok(material) => {
            log::info!("=== Copy Configurations ===");
            let destinations = distribute(&material, &config.copy, connector).await;
            Ok(RunReport {
                privkey_filename: material.privkey_filename.clone(),
                cert_filename: material.cert_filename.clone(),
                destinations,
            })
        }
        Err(e) => {
            log::error!("✗ {}", e);
            Err(SyncError::Fetch(e))
        }
    };

    match source.close().await {
        Ok(()) => log::info!("✓ Connection closed"),
        Err(e) => log::warn!("Closing source connection failed: {}", e),
    }

    report
}
