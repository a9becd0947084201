//! Error types for the sync pipeline.
//!
//! Source-side failures (`ConnectError` on the source host, `FetchError`)
//! abort the run through [`SyncError`]. Destination-side
//! failures are collected per target as [`DestinationError`] and never stop
//! the remaining destinations.

use std::path::PathBuf;
use thiserror::Error;

/// Low-level failure of a single remote filesystem operation.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("no such file or directory: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("SFTP error: {0}")]
    Sftp(#[from] russh_sftp::client::error::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to open an authenticated SFTP session.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("connection to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("authentication rejected for {username}@{endpoint}")]
    AuthRejected { endpoint: String, username: String },

    #[error("failed to load private key {path}: {reason}")]
    KeyFile { path: String, reason: String },

    #[error("SFTP subsystem unavailable on {endpoint}: {reason}")]
    Subsystem { endpoint: String, reason: String },

    #[error("no username configured for {0}")]
    MissingUsername(String),
}

/// A logical filename that matched nothing in the remote listing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("private key not found: {0}")]
    PrivateKeyNotFound(String),

    #[error("certificate not found: {0}")]
    CertificateNotFound(String),
}

/// Failure to obtain the key/certificate pair from the source directory.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("failed to list {path}: {source}")]
    List {
        path: String,
        #[source]
        source: TransferError,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: TransferError,
    },

    #[error("remote file is empty: {0}")]
    Empty(String),
}

/// Failure to assemble a PKCS12 archive from PEM input.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid PEM private key: {0}")]
    InvalidPrivateKey(#[source] openssl::error::ErrorStack),

    #[error("invalid PEM certificate: {0}")]
    InvalidCertificate(#[source] openssl::error::ErrorStack),

    #[error("private key does not match the certificate public key")]
    KeyMismatch,

    #[error("PKCS12 encoding failed: {0}")]
    Encode(#[source] openssl::error::ErrorStack),
}

/// Failure to place payload bytes at a destination.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create directory {}: {source}", .path.display())]
    LocalDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    LocalFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create remote directory {path}: {source}")]
    RemoteDir {
        path: String,
        #[source]
        source: TransferError,
    },

    #[error("failed to upload {path}: {source}")]
    RemoteFile {
        path: String,
        #[source]
        source: TransferError,
    },
}

/// Failure to locate or parse the options file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration not found (looked in {})", join_paths(.0))]
    NotFound(Vec<PathBuf>),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error scoped to one destination; recorded and skipped.
#[derive(Debug, Error)]
pub enum DestinationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Fatal error for the whole run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("source connection failed: {0}")]
    Connect(#[from] ConnectError),

    #[error("fetching SSL material failed: {0}")]
    Fetch(#[from] FetchError),
}
