//! # qse-tls
//!
//! Turns externally issued certificate material — a password-protected
//! PKCS#12 client container and a public X.509 root certificate — into a
//! reusable [`TrustContext`] for mutual-TLS connections.
//!
//! The trust model is a whitelist: only server certificates chaining to the
//! supplied root are accepted, and the system trust store is never consulted.
//! Hostname verification is an explicit per-connection policy
//! ([`HostnameVerification`]), not process-wide state, because these
//! deployments are routinely addressed by an IP or alias absent from the
//! server certificate's SAN.
//!
//! Construction is all-or-nothing: a context is either fully validated or an
//! error, never partially initialized.

#![deny(unsafe_code)]

mod context;
mod material;
mod verifier;

pub use context::{HostnameVerification, MinTlsVersion, TrustContext, TrustContextBuilder};
