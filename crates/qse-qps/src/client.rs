//! Ticket request execution.

use std::time::Duration;

use qse_core::constants::{HTTP_TIMEOUT_SECS, XRFKEY, XRFKEY_HEADER};
use qse_core::errors::{QseError, Result};
use qse_tls::TrustContext;
use reqwest::header::ACCEPT;
use tracing::{debug, error, instrument};

use crate::types::{QpsConfig, TicketRequestBody};

/// Client for the proxy service's ticket endpoint.
///
/// Holds a connection pool configured with the trust context's TLS identity;
/// one client serves any number of ticket requests. The anti-forgery key is
/// sent both as the `X-Qlik-xrfkey` header and the `xrfkey` query parameter,
/// byte-identical, as the service requires.
pub struct TicketClient {
    config: QpsConfig,
    client: reqwest::Client,
}

impl TicketClient {
    /// Create a client for `config`, drawing TLS identity and trust from
    /// `context` under the config's hostname verification policy.
    ///
    /// Connect and read timeouts are fixed at 30 seconds each; exceeding
    /// either fails the request, with no automatic retry.
    pub fn new(config: QpsConfig, context: &TrustContext) -> Result<Self> {
        let tls = context.client_config(config.hostname_verification);
        let client = reqwest::Client::builder()
            .use_preconfigured_tls((*tls).clone())
            .connect_timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .read_timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| QseError::transport(format!("http client construction: {e}")))?;
        Ok(Self { config, client })
    }

    /// Request a ticket for `(user_directory, user_id)`.
    ///
    /// Returns the raw response body; the caller extracts the ticket value.
    /// Dropping the returned future aborts the in-flight exchange and
    /// releases the connection.
    #[instrument(skip_all, fields(host = %self.config.host, user_directory = %user_directory, user_id = %user_id))]
    pub async fn request_ticket(&self, user_directory: &str, user_id: &str) -> Result<String> {
        self.execute(&TicketRequestBody::new(user_directory, user_id))
            .await
    }

    /// Blocking form of [`request_ticket`](Self::request_ticket) with
    /// identical request shape and timeout semantics.
    ///
    /// Runs the exchange on a private single-threaded runtime; must not be
    /// called from within an async runtime (use the async form there).
    pub fn request_ticket_blocking(&self, user_directory: &str, user_id: &str) -> Result<String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| QseError::transport(format!("runtime construction: {e}")))?;
        runtime.block_on(self.request_ticket(user_directory, user_id))
    }

    /// Single request path shared by both forms: same URL, headers, and
    /// body construction regardless of how completion is awaited.
    async fn execute(&self, body: &TicketRequestBody) -> Result<String> {
        let url = self.config.ticket_url();
        debug!(url = %url, "requesting ticket");

        let response = self
            .client
            .post(&url)
            .header(XRFKEY_HEADER, XRFKEY)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| QseError::transport(format!("reading ticket response: {e}")))?;

        if !status.is_success() {
            error!(status = status.as_u16(), "ticket request rejected");
            return Err(QseError::TicketRequest {
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(status = status.as_u16(), "ticket issued");
        Ok(text)
    }
}

fn map_send_error(e: reqwest::Error) -> QseError {
    if e.is_timeout() {
        QseError::Timeout {
            operation: "ticket request".into(),
            seconds: HTTP_TIMEOUT_SECS,
        }
    } else {
        QseError::transport(format!("ticket request: {e}"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
