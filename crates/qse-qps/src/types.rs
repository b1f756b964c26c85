//! Ticket client configuration and wire types.

use qse_core::constants::{QPS_PORT, XRFKEY};
use qse_tls::HostnameVerification;
use serde::Serialize;
use serde_json::Value;

/// Configuration for a [`crate::TicketClient`].
#[derive(Clone, Debug)]
pub struct QpsConfig {
    /// Host name or IP of the proxy service.
    pub host: String,
    /// Optional virtual proxy prefix selecting an alternate routing
    /// configuration on the remote engine. Inserted as a path segment
    /// between `/qps` and `/ticket`.
    pub virtual_proxy: Option<String>,
    /// Hostname verification policy for the TLS layer.
    pub hostname_verification: HostnameVerification,
    /// Override for the scheme/host/port part of the endpoint URL.
    /// When set, replaces `https://{host}:4243` entirely (test servers).
    pub base_url: Option<String>,
}

impl QpsConfig {
    /// Config for `host` with standard hostname verification and no
    /// virtual proxy.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            virtual_proxy: None,
            hostname_verification: HostnameVerification::Standard,
            base_url: None,
        }
    }

    /// The full ticket endpoint URL, anti-forgery key included.
    #[must_use]
    pub fn ticket_url(&self) -> String {
        let base = self
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}:{QPS_PORT}", self.host));
        let proxy = self
            .virtual_proxy
            .as_deref()
            .map(|p| format!("/{p}"))
            .unwrap_or_default();
        format!("{base}/qps{proxy}/ticket?xrfkey={XRFKEY}")
    }
}

/// JSON body of a ticket request.
///
/// The shape is fixed: no attribute-based entitlement is supported here, so
/// `Attributes` always serializes as an empty array.
#[derive(Clone, Debug, Serialize)]
pub struct TicketRequestBody {
    /// User identifier the ticket is issued for.
    #[serde(rename = "UserId")]
    pub user_id: String,
    /// Directory the user belongs to.
    #[serde(rename = "UserDirectory")]
    pub user_directory: String,
    /// Always empty; present because the service requires the field.
    #[serde(rename = "Attributes")]
    pub attributes: Vec<Value>,
}

impl TicketRequestBody {
    /// Body for `(user_directory, user_id)` with no attributes.
    #[must_use]
    pub fn new(user_directory: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_directory: user_directory.into(),
            attributes: Vec::new(),
        }
    }
}
