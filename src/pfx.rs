//! PKCS12 (PFX) assembly from PEM input.
//!
//! A non-empty password selects AES-256-CBC for both the key and the
//! certificate bags with a SHA-256 MAC. An empty password produces a
//! container whose bags are not encrypted at all.

use crate::error::BuildError;
use crate::resolve::has_suffix_ignore_case;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::PKey;
use openssl::x509::X509;

const PFX_SUFFIX: &str = ".pfx";

/// Used when a destination has no logical SSL name.
pub const DEFAULT_PFX_NAME: &str = "certificate";

/// OpenSSL's marker for "store this bag unencrypted".
const NID_UNENCRYPTED: i32 = -1;

/// Build a DER-encoded PKCS12 archive holding one key and one certificate.
///
/// The key must be an unencrypted PEM private key and the certificate a
/// single PEM X.509 certificate; no CA chain is embedded. `friendly_name`
/// is stored on both bags when non-empty.
pub fn build_pfx(
    privkey_pem: &[u8],
    cert_pem: &[u8],
    password: &str,
    friendly_name: &str,
) -> Result<Vec<u8>, BuildError> {
    let pkey = PKey::private_key_from_pem(privkey_pem).map_err(BuildError::InvalidPrivateKey)?;
    let cert = X509::from_pem(cert_pem).map_err(BuildError::InvalidCertificate)?;

    let cert_key = cert.public_key().map_err(BuildError::InvalidCertificate)?;
    if !cert_key.public_eq(&pkey) {
        return Err(BuildError::KeyMismatch);
    }

    let mut builder = Pkcs12::builder();
    builder.pkey(&pkey).cert(&cert);
    if !friendly_name.is_empty() {
        builder.name(friendly_name);
    }

    if password.is_empty() {
        let unencrypted = Nid::from_raw(NID_UNENCRYPTED);
        builder.key_algorithm(unencrypted).cert_algorithm(unencrypted);
    } else {
        builder
            .key_algorithm(Nid::AES_256_CBC)
            .cert_algorithm(Nid::AES_256_CBC)
            .mac_md(MessageDigest::sha256());
    }

    let pkcs12 = builder.build2(password).map_err(BuildError::Encode)?;
    pkcs12.to_der().map_err(BuildError::Encode)
}

/// Output filename for a PFX destination: `ssl_name` with `.pfx` appended
/// unless it already carries the extension.
pub fn pfx_filename(ssl_name: &str) -> String {
    let name = if ssl_name.is_empty() {
        DEFAULT_PFX_NAME
    } else {
        ssl_name
    };
    if has_suffix_ignore_case(name, PFX_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{PFX_SUFFIX}")
    }
}
