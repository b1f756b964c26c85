//! Trust context construction.

use std::fmt;
use std::sync::Arc;

use qse_core::errors::{QseError, Result};
use qse_core::identity::CertificateBundle;
use rustls::crypto::CryptoProvider;
use rustls::{ClientConfig, RootCertStore};
use tracing::debug;

use crate::material;
use crate::verifier::ChainOnlyVerifier;

/// Hostname verification policy for a single connection.
///
/// Replaces the process-wide verifier override some clients use: the policy
/// travels with each connection attempt, so concurrent connections with
/// different trust requirements never interfere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HostnameVerification {
    /// Standard verification: chain trust plus SAN/hostname matching.
    #[default]
    Standard,
    /// Chain trust only. Documented trade-off for the self-signed deployment
    /// pattern where the target host is an IP or alias missing from the
    /// certificate SAN. Explicit opt-in; never the silent default.
    SkipForSelfSigned,
}

/// Minimum negotiated TLS protocol version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MinTlsVersion {
    /// Allow TLS 1.2 and newer.
    Tls12,
    /// Require TLS 1.3.
    Tls13,
}

/// Builds a [`TrustContext`] from a [`CertificateBundle`].
///
/// Identity loading and trust-store loading are separate steps: the two
/// inputs have different formats and purposes, and one side can later be
/// swapped without touching the other's parsing.
#[derive(Debug)]
pub struct TrustContextBuilder {
    bundle: CertificateBundle,
    min_version: Option<MinTlsVersion>,
}

impl TrustContextBuilder {
    /// Start building from certificate material.
    pub fn new(bundle: CertificateBundle) -> Self {
        Self {
            bundle,
            min_version: None,
        }
    }

    /// Require a minimum TLS protocol version. Without this, the highest
    /// mutually supported version is negotiated (rustls safe defaults).
    pub fn min_tls_version(mut self, version: MinTlsVersion) -> Self {
        self.min_version = Some(version);
        self
    }

    /// Load both certificate inputs (exactly one read each) and produce the
    /// immutable, reusable context.
    ///
    /// All-or-nothing: any failure — wrong password, malformed material,
    /// missing file, unsupported algorithm — yields an error and no context.
    pub fn build(self) -> Result<TrustContext> {
        let identity =
            material::load_client_identity(
                self.bundle.client_cert_path(),
                self.bundle.client_cert_password(),
            )?;
        let roots = Arc::new(material::load_root_store(self.bundle.root_cert_path())?);
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let standard = {
            let (chain, key) = identity.clone_parts();
            versioned_builder(Arc::clone(&provider), self.min_version)?
                .with_root_certificates(Arc::clone(&roots))
                .with_client_auth_cert(chain, key)
                .map_err(map_config_error)?
        };

        let chain_only = {
            let (chain, key) = identity.clone_parts();
            let verifier = Arc::new(ChainOnlyVerifier::new(
                Arc::clone(&roots),
                Arc::clone(&provider),
            ));
            versioned_builder(provider, self.min_version)?
                .dangerous()
                .with_custom_certificate_verifier(verifier)
                .with_client_auth_cert(chain, key)
                .map_err(map_config_error)?
        };

        debug!(
            client_cert = %self.bundle.client_cert_path().display(),
            root_cert = %self.bundle.root_cert_path().display(),
            min_version = ?self.min_version,
            "trust context built"
        );

        Ok(TrustContext {
            standard: Arc::new(standard),
            chain_only: Arc::new(chain_only),
        })
    }
}

/// Reusable TLS trust and identity context.
///
/// Bundles the validated client identity (private key + chain) with the
/// whitelist root store, materialized as rustls client configs for both
/// hostname-verification policies. Immutable after construction; cloning is
/// cheap and the same context can back any number of concurrent HTTPS or
/// WebSocket connections without re-reading the input files.
#[derive(Clone)]
pub struct TrustContext {
    standard: Arc<ClientConfig>,
    chain_only: Arc<ClientConfig>,
}

impl TrustContext {
    /// The rustls client config for the requested verification policy.
    pub fn client_config(&self, policy: HostnameVerification) -> Arc<ClientConfig> {
        match policy {
            HostnameVerification::Standard => Arc::clone(&self.standard),
            HostnameVerification::SkipForSelfSigned => Arc::clone(&self.chain_only),
        }
    }
}

impl fmt::Debug for TrustContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustContext").finish_non_exhaustive()
    }
}

/// Shared builder stem: crypto provider plus protocol version selection.
fn versioned_builder(
    provider: Arc<CryptoProvider>,
    min_version: Option<MinTlsVersion>,
) -> Result<rustls::ConfigBuilder<ClientConfig, rustls::WantsVerifier>> {
    let builder = ClientConfig::builder_with_provider(provider);
    let versions: &[&rustls::SupportedProtocolVersion] = match min_version {
        None | Some(MinTlsVersion::Tls12) => rustls::DEFAULT_VERSIONS,
        Some(MinTlsVersion::Tls13) => &[&rustls::version::TLS13],
    };
    builder
        .with_protocol_versions(versions)
        .map_err(map_config_error)
}

/// Map a rustls config-construction error onto the taxonomy: algorithm
/// rejections become `UnsupportedAlgorithm`, everything else is malformed
/// material.
fn map_config_error(e: rustls::Error) -> QseError {
    let message = e.to_string();
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("unsupported") || lowered.contains("algorithm") {
        QseError::UnsupportedAlgorithm { message }
    } else {
        QseError::certificate_format(message)
    }
}
