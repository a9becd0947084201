use crate::error::{FetchError, ResolveError};
use crate::resolve::resolve_remote_filename;
use crate::transfer::{join_remote, RemoteFs};
use std::collections::HashSet;

/// Private key and certificate as fetched from the source host.
#[derive(Clone)]
pub struct SslMaterial {
    pub privkey_filename: String,
    pub cert_filename: String,
    pub privkey_bytes: Vec<u8>,
    pub cert_bytes: Vec<u8>,
}

impl std::fmt::Debug for SslMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SslMaterial")
            .field("privkey_filename", &self.privkey_filename)
            .field("cert_filename", &self.cert_filename)
            .field("privkey_len", &self.privkey_bytes.len())
            .field("cert_len", &self.cert_bytes.len())
            .finish()
    }
}

/// List `remote_dir`, resolve both logical names and download the files.
///
/// Either file missing fails the whole fetch.
pub async fn fetch_ssl_material(
    fs: &dyn RemoteFs,
    remote_dir: &str,
    privkey_name: &str,
    cert_name: &str,
) -> Result<SslMaterial, FetchError> {
    let entries = fs
        .list_dir(remote_dir)
        .await
        .map_err(|source| FetchError::List {
            path: remote_dir.to_string(),
            source,
        })?;

    let available: HashSet<String> = entries
        .into_iter()
        .filter(|entry| !entry.is_dir)
        .map(|entry| entry.name)
        .collect();
    log::debug!("{} file(s) available in {}", available.len(), remote_dir);

    let privkey_filename = resolve_remote_filename(&available, privkey_name)
        .ok_or_else(|| ResolveError::PrivateKeyNotFound(privkey_name.to_string()))?;
    let cert_filename = resolve_remote_filename(&available, cert_name)
        .ok_or_else(|| ResolveError::CertificateNotFound(cert_name.to_string()))?;

    let privkey_bytes = read_nonempty(fs, remote_dir, &privkey_filename).await?;
    let cert_bytes = read_nonempty(fs, remote_dir, &cert_filename).await?;

    log::info!("✓ Loaded {} ({} bytes)", privkey_filename, privkey_bytes.len());
    log::info!("✓ Loaded {} ({} bytes)", cert_filename, cert_bytes.len());

    Ok(SslMaterial {
        privkey_filename,
        cert_filename,
        privkey_bytes,
        cert_bytes,
    })
}

async fn read_nonempty(fs: &dyn RemoteFs, dir: &str, name: &str) -> Result<Vec<u8>, FetchError> {
    let path = join_remote(dir, name);
    let data = fs
        .read_file(&path)
        .await
        .map_err(|source| FetchError::Read {
            path: path.clone(),
            source,
        })?;
    if data.is_empty() {
        return Err(FetchError::Empty(path));
    }
    Ok(data)
}
