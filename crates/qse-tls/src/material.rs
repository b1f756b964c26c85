//! Certificate file loading and parsing.
//!
//! Two genuinely different inputs with different formats and purposes: the
//! PKCS#12 container carries the client identity (private key + chain,
//! password-protected), while the root certificate is a bare public X.509
//! document (PEM or DER) that seeds the whitelist trust store.

use std::path::Path;

use qse_core::errors::{QseError, Result};
use rustls::RootCertStore;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tracing::debug;

/// Client identity extracted from a PKCS#12 container.
#[derive(Debug)]
pub(crate) struct ClientIdentity {
    /// Certificate chain, leaf first, as stored in the container.
    pub chain: Vec<CertificateDer<'static>>,
    /// PKCS#8 private key.
    pub key: PrivateKeyDer<'static>,
}

impl ClientIdentity {
    /// Clone the identity parts for a second `ClientConfig`.
    pub(crate) fn clone_parts(&self) -> (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>) {
        (self.chain.clone(), self.key.clone_key())
    }
}

/// Read a certificate input file, mapping a missing file to
/// [`QseError::NotFound`]. A failed disk read is not transient in this
/// design, so there are no retries.
fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => QseError::NotFound {
            path: path.to_path_buf(),
        },
        _ => QseError::certificate_format(format!("failed to read {}: {e}", path.display())),
    })
}

/// Parse the PKCS#12 container and extract the client identity.
///
/// The container MAC is verified before any bag is opened; a MAC mismatch is
/// reported as [`QseError::Authentication`] (wrong password) without echoing
/// the password anywhere.
pub(crate) fn load_client_identity(path: &Path, password: &str) -> Result<ClientIdentity> {
    let bytes = read_file(path)?;

    let pfx = p12::PFX::parse(&bytes).map_err(|e| {
        QseError::certificate_format(format!("invalid PKCS#12 container {}: {e}", path.display()))
    })?;

    if !pfx.verify_mac(password) {
        return Err(QseError::Authentication {
            message: "PKCS#12 MAC verification failed (wrong container password?)".into(),
        });
    }

    let keys = pfx.key_bags(password).map_err(|e| {
        QseError::certificate_format(format!("failed to decrypt PKCS#12 key bags: {e}"))
    })?;
    let certs = pfx.cert_bags(password).map_err(|e| {
        QseError::certificate_format(format!("failed to decrypt PKCS#12 certificate bags: {e}"))
    })?;

    let key = keys.into_iter().next().ok_or_else(|| {
        QseError::certificate_format("PKCS#12 container holds no private key".to_string())
    })?;
    if certs.is_empty() {
        return Err(QseError::certificate_format(
            "PKCS#12 container holds no certificates".to_string(),
        ));
    }

    debug!(
        path = %path.display(),
        chain_len = certs.len(),
        "loaded client identity"
    );

    Ok(ClientIdentity {
        chain: certs.into_iter().map(CertificateDer::from).collect(),
        key: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key)),
    })
}

/// Parse the root certificate (PEM or DER) into a fresh whitelist store.
///
/// The returned store contains only the supplied issuer(s); the system trust
/// store is deliberately not consulted.
pub(crate) fn load_root_store(path: &Path) -> Result<RootCertStore> {
    let bytes = read_file(path)?;

    let ders: Vec<CertificateDer<'static>> = if bytes.starts_with(b"-----") {
        rustls_pemfile::certs(&mut bytes.as_slice())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                QseError::certificate_format(format!(
                    "invalid PEM root certificate {}: {e}",
                    path.display()
                ))
            })?
    } else {
        vec![CertificateDer::from(bytes)]
    };

    if ders.is_empty() {
        return Err(QseError::certificate_format(format!(
            "no certificate found in {}",
            path.display()
        )));
    }

    let mut store = RootCertStore::empty();
    for der in ders {
        store.add(der).map_err(|e| {
            QseError::certificate_format(format!(
                "invalid root certificate {}: {e}",
                path.display()
            ))
        })?;
    }

    debug!(path = %path.display(), roots = store.len(), "loaded root trust store");
    Ok(store)
}
