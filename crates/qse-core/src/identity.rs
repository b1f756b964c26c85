//! Client identity material: certificate paths plus the container password.

use std::fmt;
use std::path::{Path, PathBuf};

/// Filesystem locations of the externally issued certificate material, plus
/// the PKCS#12 container password.
///
/// Immutable once constructed. The password is only read during trust-context
/// construction and is redacted from all `Debug` output; it must never appear
/// in logs, error messages, or diagnostics.
#[derive(Clone)]
pub struct CertificateBundle {
    client_cert_path: PathBuf,
    client_cert_password: String,
    root_cert_path: PathBuf,
}

impl CertificateBundle {
    /// Bundle a PKCS#12 client certificate (with private key), its password,
    /// and the X.509 root certificate of the issuing authority.
    pub fn new(
        client_cert_path: impl Into<PathBuf>,
        client_cert_password: impl Into<String>,
        root_cert_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client_cert_path: client_cert_path.into(),
            client_cert_password: client_cert_password.into(),
            root_cert_path: root_cert_path.into(),
        }
    }

    /// Path to the PKCS#12 client certificate container.
    pub fn client_cert_path(&self) -> &Path {
        &self.client_cert_path
    }

    /// Container password. Read once during trust-context construction.
    pub fn client_cert_password(&self) -> &str {
        &self.client_cert_password
    }

    /// Path to the X.509 root certificate (public key only, no password).
    pub fn root_cert_path(&self) -> &Path {
        &self.root_cert_path
    }
}

impl fmt::Debug for CertificateBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateBundle")
            .field("client_cert_path", &self.client_cert_path)
            .field("client_cert_password", &"<redacted>")
            .field("root_cert_path", &self.root_cert_path)
            .finish()
    }
}
