//! SSL Sync — fetch a TLS key/certificate pair over SFTP and copy it to
//! local directories or other SFTP hosts, optionally as a PKCS12 bundle.

pub mod config;
pub mod distribute;
pub mod error;
pub mod fetch;
pub mod pfx;
pub mod resolve;
pub mod run;
pub mod ssh;
pub mod transfer;

#[cfg(test)]
mod testutil;

pub use config::{DestinationSpec, SyncConfig};
pub use error::SyncError;
pub use fetch::SslMaterial;
pub use run::{run, RunReport};
