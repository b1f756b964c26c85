//! Engine channel state machine and driver task.

use std::sync::{Arc, Mutex};

use futures::{SinkExt, StreamExt};
use qse_core::constants::{ENGINE_USER_HEADER, ENGINE_USER_VALUE};
use qse_core::errors::{QseError, Result};
use qse_core::events::{ChannelEvent, ChannelState};
use qse_core::listener::{ChannelListener, ListenerId};
use qse_tls::{HostnameVerification, TrustContext};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream, connect_async_tls_with_config};
use tracing::{debug, error, instrument};

use crate::registry::ListenerRegistry;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close code reported when the connection ends without a close frame.
const ABNORMAL_CLOSE: u16 = 1006;

/// Configuration for an [`EngineChannel`].
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// WebSocket URL of the engine (`wss://{host}/...`).
    pub url: String,
    /// Hostname verification policy for the TLS layer. The self-signed
    /// deployment pattern this client targets typically needs
    /// [`HostnameVerification::SkipForSelfSigned`]; standard verification
    /// is the default and must be relaxed explicitly.
    pub hostname_verification: HostnameVerification,
}

impl EngineConfig {
    /// Config for `url` with standard hostname verification.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            hostname_verification: HostnameVerification::Standard,
        }
    }
}

/// Command sent from the channel handle to its driver task.
enum Command {
    Send(String),
    Close,
}

/// Persistent WebSocket channel to the engine.
///
/// The channel identifies as the privileged internal engine user via the
/// `X-Qlik-User` upgrade header, so no ticket is involved on this path.
/// All activity after [`open`](Self::open) is delivered to registered
/// listeners from the channel's driver task; dispatch cycles for one channel
/// never overlap, while distinct channels are fully independent.
pub struct EngineChannel {
    config: EngineConfig,
    listeners: Arc<ListenerRegistry>,
    state: Arc<Mutex<ChannelState>>,
    cmd_tx: Mutex<Option<mpsc::Sender<Command>>>,
    driver: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl EngineChannel {
    /// A channel in the `Disconnected` state. Listeners registered before
    /// [`open`](Self::open) see the `Connected` event.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            listeners: Arc::new(ListenerRegistry::new()),
            state: Arc::new(Mutex::new(ChannelState::Disconnected)),
            cmd_tx: Mutex::new(None),
            driver: tokio::sync::Mutex::new(None),
        }
    }

    /// Register a listener; returns the handle for later removal.
    pub fn add_listener(&self, listener: Arc<dyn ChannelListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Remove a previously registered listener. Safe to call at any time,
    /// including from within a listener callback.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ChannelState {
        *self.state.lock().expect("state lock poisoned")
    }

    /// Perform the WebSocket handshake and start the driver task.
    ///
    /// On success the channel is `Open`, `Connected` has been dispatched,
    /// and message events follow on the driver task. On failure the channel
    /// goes straight to `Closed` and the handshake error is returned.
    #[instrument(skip_all, fields(url = %self.config.url))]
    pub async fn open(&self, context: &TrustContext) -> Result<()> {
        {
            let mut state = self.state.lock().expect("state lock poisoned");
            match *state {
                ChannelState::Disconnected | ChannelState::Closed => {
                    *state = ChannelState::Connecting;
                }
                _ => return Err(QseError::transport("channel already connecting or open")),
            }
        }

        let mut request = self
            .config
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| QseError::handshake(format!("invalid engine url: {e}")))?;
        let _ = request
            .headers_mut()
            .insert(ENGINE_USER_HEADER, HeaderValue::from_static(ENGINE_USER_VALUE));

        let connector =
            Connector::Rustls(context.client_config(self.config.hostname_verification));

        let (ws, _response) =
            match connect_async_tls_with_config(request, None, false, Some(connector)).await {
                Ok(pair) => pair,
                Err(e) => {
                    *self.state.lock().expect("state lock poisoned") = ChannelState::Closed;
                    error!(error = %e, "websocket handshake failed");
                    return Err(QseError::handshake(format!(
                        "handshake with {}: {e}",
                        self.config.url
                    )));
                }
            };

        *self.state.lock().expect("state lock poisoned") = ChannelState::Open;
        debug!("channel open");
        self.listeners.notify(&ChannelEvent::Connected);

        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let handle = tokio::spawn(drive(
            ws,
            cmd_rx,
            Arc::clone(&self.listeners),
            Arc::clone(&self.state),
        ));
        *self.cmd_tx.lock().expect("command lock poisoned") = Some(cmd_tx);
        *self.driver.lock().await = Some(handle);
        Ok(())
    }

    /// Send a text frame. Pure pass-through: the payload (a JSON-RPC
    /// envelope) is not inspected or transformed.
    pub async fn send(&self, payload: impl Into<String>) -> Result<()> {
        let tx = self
            .cmd_tx
            .lock()
            .expect("command lock poisoned")
            .clone()
            .ok_or_else(|| QseError::transport("channel is not open"))?;
        tx.send(Command::Send(payload.into()))
            .await
            .map_err(|_| QseError::transport("channel is closed"))
    }

    /// Close the connection with a normal close frame and wait for the
    /// driver to finish. The `Closed` event has been dispatched by the time
    /// this returns.
    pub async fn close(&self) -> Result<()> {
        let tx = self.cmd_tx.lock().expect("command lock poisoned").clone();
        if let Some(tx) = tx {
            // A dropped receiver means the driver already wound down.
            let _ = tx.send(Command::Close).await;
        }
        if let Some(handle) = self.driver.lock().await.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "channel driver task failed");
            }
        }
        Ok(())
    }
}

/// Driver task: owns the socket, serializes listener dispatch, and emits
/// exactly one `Closed` event when the connection ends.
async fn drive(
    ws: WsStream,
    mut cmd_rx: mpsc::Receiver<Command>,
    listeners: Arc<ListenerRegistry>,
    state: Arc<Mutex<ChannelState>>,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let mut local_close = false;
    let mut commands_open = true;

    let (code, reason, initiated_by_remote) = loop {
        tokio::select! {
            cmd = cmd_rx.recv(), if commands_open => match cmd {
                Some(Command::Send(payload)) => {
                    if let Err(e) = ws_tx.send(Message::Text(payload.into())).await {
                        error!(error = %e, "websocket send failed");
                        listeners.notify(&ChannelEvent::Error {
                            description: "message send failed".into(),
                        });
                        break (ABNORMAL_CLOSE, String::new(), false);
                    }
                }
                Some(Command::Close) => {
                    local_close = true;
                    *state.lock().expect("state lock poisoned") = ChannelState::Closing;
                    // The close reply (or stream end) finishes the loop.
                    if ws_tx.send(Message::Close(None)).await.is_err() {
                        break (1000, String::new(), false);
                    }
                }
                None => {
                    // Channel handle dropped: wind down as a local close.
                    local_close = true;
                    commands_open = false;
                    let _ = ws_tx.send(Message::Close(None)).await;
                }
            },
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    listeners.notify(&ChannelEvent::MessageReceived {
                        payload: text.as_str().to_owned(),
                    });
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame.map_or((1000, String::new()), |f| {
                        (u16::from(f.code), f.reason.as_str().to_owned())
                    });
                    break (code, reason, !local_close);
                }
                // Ping/pong is answered by the transport; binary frames have
                // no meaning on this JSON-RPC channel.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!(error = %e, "websocket transport error");
                    listeners.notify(&ChannelEvent::Error {
                        description: "websocket transport failure".into(),
                    });
                    break (ABNORMAL_CLOSE, String::new(), !local_close);
                }
                None => break (ABNORMAL_CLOSE, String::new(), !local_close),
            },
        }
    };

    *state.lock().expect("state lock poisoned") = ChannelState::Closed;
    debug!(code, reason = %reason, initiated_by_remote, "channel closed");
    listeners.notify(&ChannelEvent::Closed {
        code,
        reason,
        initiated_by_remote,
    });
}
