//! End-to-end tests against a real WebSocket publisher.
//!
//! A `tokio-tungstenite` server on `127.0.0.1:0` plays the publisher; the
//! engine dials it through the default WebSocket connector.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tablesync::prelude::*;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};

type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

async fn next_json(ws: &mut ServerWs) -> Value {
    loop {
        let msg = ws
            .next()
            .await
            .expect("client hung up")
            .expect("read should succeed");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("client sent JSON");
        }
    }
}

fn engine_for(url: String) -> SyncEngine {
    SyncEngine::websocket(
        EngineConfig::default().with_ws_url(url),
        MemoryIdentity::signed_in(PlayerIdentity::new("0xabc")),
        StaticSignature::new("0xsig"),
    )
}

#[tokio::test]
async fn test_subscribe_receive_state_and_send_action() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut path = String::new();
        let mut ws = tokio_tungstenite::accept_hdr_async(
            stream,
            |req: &Request, resp: Response| {
                path = req.uri().to_string();
                Ok(resp)
            },
        )
        .await
        .expect("upgrade should succeed");

        let subscribe = next_json(&mut ws).await;
        let state = json!({
            "gameId": "table-9",
            "event": "state",
            "data": {
                "format": "sit-n-go",
                "variant": "omaha",
                "gameState": {"gameOptions": {
                    "smallBlind": 0, "bigBlind": "0",
                    "minBuyIn": "100", "maxBuyIn": "1000",
                    "minPlayers": 2, "maxPlayers": 6
                }}
            }
        });
        ws.send(Message::Text(state.to_string().into())).await.unwrap();

        let action = next_json(&mut ws).await;
        (path, subscribe, action, ws)
    });

    let engine = engine_for(format!("ws://{addr}/ws"));
    engine.subscribe("table-9").await.unwrap();

    let mut rx = engine.watch();
    let snap = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.game_state.is_some()),
    )
    .await
    .expect("state should arrive")
    .unwrap()
    .clone();
    assert!(snap.is_live());
    assert_eq!(snap.variant.as_deref(), Some("omaha"));
    assert!(snap.validation_error.is_none());

    engine.send_action("call", None).await.unwrap();

    let (path, subscribe, action, _ws) =
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server should finish")
            .unwrap();
    assert_eq!(path, "/ws?tableAddress=table-9&playerId=0xabc");
    assert_eq!(subscribe["type"], "subscribe");
    assert_eq!(subscribe["gameId"], "table-9");
    assert_eq!(subscribe["signature"], "0xsig");
    assert_eq!(
        action,
        json!({
            "type": "action",
            "gameId": "table-9",
            "playerAddress": "0xabc",
            "action": "call"
        })
    );

    engine.unsubscribe().await.unwrap();
    assert_eq!(engine.snapshot().phase, SessionPhase::Closed);
}

#[tokio::test]
async fn test_server_closing_clears_snapshot() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _subscribe = next_json(&mut ws).await;
        ws.send(Message::Text(r#"{"type": "welcome"}"#.to_string().into()))
            .await
            .unwrap();
        ws.close(None).await.unwrap();
    });

    let engine = engine_for(format!("ws://{addr}"));
    engine.subscribe("table-1").await.unwrap();

    let mut rx = engine.watch();
    tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.phase == SessionPhase::Closed),
    )
    .await
    .expect("close should be observed")
    .unwrap();
    assert!(engine.snapshot().table_id.is_none());
}

#[tokio::test]
async fn test_refused_connection_is_a_transport_error() {
    // Grab a free port, then stop listening on it.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let engine = engine_for(format!("ws://{addr}"));
    engine.subscribe("table-1").await.unwrap();

    let mut rx = engine.watch();
    let snap = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.error.is_some()),
    )
    .await
    .expect("failure should be reported")
    .unwrap()
    .clone();
    assert!(matches!(snap.error, Some(SyncError::Transport(_))));
    assert!(!snap.is_loading);
    assert_eq!(snap.phase, SessionPhase::Idle);
}
