//! End-to-end channel tests against in-process WebSocket servers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use futures::{SinkExt, StreamExt};
use qse_core::errors::QseError;
use qse_core::identity::CertificateBundle;
use qse_engine::{ChannelEvent, ChannelListener, ChannelState, EngineChannel, EngineConfig};
use qse_tls::{TrustContext, TrustContextBuilder};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

const PASSWORD: &str = "fixture-pw";

/// Trust context from generated material. The in-process servers speak
/// plain `ws://`, so the TLS side only needs to construct.
fn fixture_context() -> TrustContext {
    let dir = tempfile::tempdir().expect("tempdir");
    let ca_key = rcgen::KeyPair::generate().expect("ca key");
    let mut ca_params = rcgen::CertificateParams::default();
    ca_params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    let ca_cert = ca_params.self_signed(&ca_key).expect("ca cert");

    let client_key = rcgen::KeyPair::generate().expect("client key");
    let client_cert = rcgen::CertificateParams::default()
        .signed_by(&client_key, &ca_cert, &ca_key)
        .expect("client cert");

    let pfx = p12::PFX::new(
        client_cert.der().as_ref(),
        &client_key.serialize_der(),
        Some(ca_cert.der().as_ref()),
        PASSWORD,
        "QlikClient",
    )
    .expect("pkcs12 assembly");

    let pfx_path = dir.path().join("client.pfx");
    let root_path = dir.path().join("root.pem");
    std::fs::write(&pfx_path, pfx.to_der()).expect("write pfx");
    std::fs::write(&root_path, ca_cert.pem()).expect("write root");

    TrustContextBuilder::new(CertificateBundle::new(pfx_path, PASSWORD, root_path))
        .build()
        .expect("trust context")
}

/// Listener that records every event it sees.
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<ChannelEvent>>,
}

impl ChannelListener for Recorder {
    fn on_event(&self, event: &ChannelEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

impl Recorder {
    fn events(&self) -> Vec<ChannelEvent> {
        self.events.lock().unwrap().clone()
    }

    fn saw_closed(&self) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, ChannelEvent::Closed { .. }))
    }
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    (listener, url)
}

async fn wait_until(cond: impl Fn() -> bool, what: &str) {
    for _ in 0..250 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test]
async fn handshake_sends_engine_identity_header() {
    let (listener, url) = bind().await;
    let (header_tx, header_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut captured = None;
        let mut ws = accept_hdr_async(stream, |req: &Request, resp: Response| {
            captured = req
                .headers()
                .get("X-Qlik-User")
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            Ok(resp)
        })
        .await
        .unwrap();
        header_tx.send(captured).unwrap();
        // Hold the connection until the client closes.
        while let Some(Ok(_)) = ws.next().await {}
    });

    let channel = EngineChannel::new(EngineConfig::new(url));
    let recorder = Arc::new(Recorder::default());
    let _ = channel.add_listener(recorder.clone());

    channel.open(&fixture_context()).await.unwrap();
    assert_eq!(channel.state(), ChannelState::Open);
    assert_eq!(
        header_rx.await.unwrap().as_deref(),
        Some("UserDirectory=internal; UserId=sa_engine")
    );
    assert_eq!(recorder.events().first(), Some(&ChannelEvent::Connected));

    channel.close().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn message_order_is_preserved_for_every_listener() {
    let (listener, url) = bind().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_hdr_async(stream, |_: &Request, resp: Response| Ok(resp))
            .await
            .unwrap();
        for payload in ["m1", "m2", "m3"] {
            ws.send(Message::text(payload)).await.unwrap();
        }
        ws.send(Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "done".into(),
        })))
        .await
        .unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let channel = EngineChannel::new(EngineConfig::new(url));
    let first = Arc::new(Recorder::default());
    let second = Arc::new(Recorder::default());
    let _ = channel.add_listener(first.clone());
    let _ = channel.add_listener(second.clone());

    channel.open(&fixture_context()).await.unwrap();
    wait_until(|| first.saw_closed() && second.saw_closed(), "closed event").await;

    let expected = vec![
        ChannelEvent::Connected,
        ChannelEvent::MessageReceived { payload: "m1".into() },
        ChannelEvent::MessageReceived { payload: "m2".into() },
        ChannelEvent::MessageReceived { payload: "m3".into() },
        ChannelEvent::Closed {
            code: 1000,
            reason: "done".into(),
            initiated_by_remote: true,
        },
    ];
    assert_eq!(first.events(), expected);
    assert_eq!(second.events(), expected);
    assert_eq!(channel.state(), ChannelState::Closed);

    server.await.unwrap();
}

#[tokio::test]
async fn local_close_reports_normal_code_and_local_initiation() {
    let (listener, url) = bind().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_hdr_async(stream, |_: &Request, resp: Response| Ok(resp))
            .await
            .unwrap();
        // Read until the client's close frame; the close reply is automatic.
        while let Some(Ok(_)) = ws.next().await {}
    });

    let channel = EngineChannel::new(EngineConfig::new(url));
    let recorder = Arc::new(Recorder::default());
    let _ = channel.add_listener(recorder.clone());

    channel.open(&fixture_context()).await.unwrap();
    channel.close().await.unwrap();

    assert_eq!(channel.state(), ChannelState::Closed);
    assert_eq!(
        recorder.events().last(),
        Some(&ChannelEvent::Closed {
            code: 1000,
            reason: String::new(),
            initiated_by_remote: false,
        })
    );

    server.await.unwrap();
}

#[tokio::test]
async fn send_passes_payload_through_unchanged() {
    let (listener, url) = bind().await;
    let (payload_tx, payload_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_hdr_async(stream, |_: &Request, resp: Response| Ok(resp))
            .await
            .unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                payload_tx.send(text.as_str().to_owned()).unwrap();
                break;
            }
        }
        while let Some(Ok(_)) = ws.next().await {}
    });

    let channel = EngineChannel::new(EngineConfig::new(url));
    channel.open(&fixture_context()).await.unwrap();

    let rpc = r#"{"jsonrpc":"2.0","id":1,"method":"GetDocList","params":[]}"#;
    channel.send(rpc).await.unwrap();
    assert_eq!(payload_rx.await.unwrap(), rpc);

    channel.close().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn failed_handshake_is_a_handshake_error_and_closes_the_channel() {
    let (listener, url) = bind().await;

    // Accept the TCP connection, then hang up before the upgrade.
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });

    let channel = EngineChannel::new(EngineConfig::new(url));
    let err = channel.open(&fixture_context()).await.unwrap_err();
    assert_matches!(err, QseError::Handshake { .. });
    assert_eq!(channel.state(), ChannelState::Closed);

    server.await.unwrap();
}

#[tokio::test]
async fn listener_removed_between_events_misses_later_events() {
    let (listener, url) = bind().await;
    let (go_tx, go_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_hdr_async(stream, |_: &Request, resp: Response| Ok(resp))
            .await
            .unwrap();
        ws.send(Message::text("before")).await.unwrap();
        go_rx.await.unwrap();
        ws.send(Message::text("after")).await.unwrap();
        ws.send(Message::Close(None)).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let channel = EngineChannel::new(EngineConfig::new(url));
    let removed = Arc::new(Recorder::default());
    let kept = Arc::new(Recorder::default());
    let removed_id = channel.add_listener(removed.clone());
    let _ = channel.add_listener(kept.clone());

    channel.open(&fixture_context()).await.unwrap();
    wait_until(|| removed.events().len() >= 2, "first message").await;

    // Removal completes before the next dispatch cycle begins.
    assert!(channel.remove_listener(removed_id));
    go_tx.send(()).unwrap();
    wait_until(|| kept.saw_closed(), "closed event").await;

    assert_eq!(
        removed.events(),
        vec![
            ChannelEvent::Connected,
            ChannelEvent::MessageReceived { payload: "before".into() },
        ]
    );
    assert!(
        kept.events()
            .contains(&ChannelEvent::MessageReceived { payload: "after".into() })
    );

    server.await.unwrap();
}
