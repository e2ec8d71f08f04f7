//! Drives the subscriber against an in-process Socket.IO server.

#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use pedidos_probes::config::ProbeConfig;
use pedidos_probes::error::ProbeError;
use pedidos_probes::subscriber::{self, StopReason, SubscriberProbe};

const OPEN: &str =
    r#"0{"sid":"eio-test","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
const SUBSCRIBE: &str = r#"42["subscribe","pedidos"]"#;
const WAIT: Duration = Duration::from_secs(5);

type Collected = Arc<Mutex<Vec<Value>>>;

async fn listen() -> (TcpListener, String) {
    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    (listener, format!("http://{addr}"))
}

async fn send(ws: &mut WebSocketStream<TcpStream>, frame: &str) {
    if ws.send(Message::text(frame.to_string())).await.is_err() {
        panic!("server send failed");
    }
}

/// Next text frame, or `None` once the client has gone.
async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> Option<String> {
    while let Some(Ok(msg)) = ws.next().await {
        match msg {
            Message::Text(text) => return Some(text.as_str().to_string()),
            Message::Close(_) => return None,
            _ => {}
        }
    }
    None
}

/// Reads frames until one satisfies `wanted`, skipping everything else.
async fn wait_for(ws: &mut WebSocketStream<TcpStream>, wanted: impl Fn(&str) -> bool) {
    loop {
        match timeout(WAIT, next_text(ws)).await {
            Ok(Some(frame)) if wanted(&frame) => return,
            Ok(Some(_)) => {}
            _ => panic!("client went away before the expected frame"),
        }
    }
}

/// Accepts one client and walks it through the namespace connect and the
/// subscription request.
async fn handshake(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let Ok((stream, _)) = listener.accept().await else {
        panic!("accept failed");
    };
    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
        panic!("websocket handshake failed");
    };
    send(&mut ws, OPEN).await;
    wait_for(&mut ws, |frame| frame.starts_with("40")).await;
    send(&mut ws, r#"40{"sid":"sock-xyz"}"#).await;
    wait_for(&mut ws, |frame| frame == SUBSCRIBE).await;
    ws
}

/// Counts subscription requests among the frames sent until the client
/// leaves or goes quiet.
async fn count_subscribes(ws: &mut WebSocketStream<TcpStream>) -> usize {
    let mut count = 0;
    while let Ok(Some(frame)) = timeout(Duration::from_millis(500), next_text(ws)).await {
        if frame == SUBSCRIBE {
            count += 1;
        }
    }
    count
}

async fn connect(url: &str, collected: &Collected) -> SubscriberProbe {
    let config = ProbeConfig::from_lookup(|key| match key {
        "SOCKET_URL" => Some(url.to_string()),
        _ => None,
    });
    let sink = Arc::clone(collected);
    let connected = subscriber::connect_with(&config, move |event| {
        if let Ok(mut seen) = sink.lock() {
            seen.push(event.payload().clone());
        }
    });
    let Ok(Ok(subscriber)) = timeout(WAIT, connected).await else {
        panic!("subscriber failed to connect");
    };
    subscriber
}

fn snapshot(collected: &Collected) -> Vec<Value> {
    collected.lock().map(|seen| seen.clone()).unwrap_or_default()
}

async fn wait_until_collected(collected: &Collected, count: usize) {
    let waited = timeout(WAIT, async {
        while snapshot(collected).len() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "notifications did not arrive");
}

#[tokio::test]
async fn notifications_are_delivered_in_arrival_order() {
    let events = vec![json!({"id": 1, "total": 10}), json!({"id": 2}), json!("texto")];
    let (listener, url) = listen().await;
    let script = events.clone();
    let server = tokio::spawn(async move {
        let mut ws = handshake(&listener).await;
        for event in script {
            send(&mut ws, &format!("42{}", json!(["pedido:nuevo", event]))).await;
        }
        send(&mut ws, r#"42["pedido:cancelado",{"id":0}]"#).await;
        count_subscribes(&mut ws).await
    });

    let collected = Collected::default();
    let subscriber = connect(&url, &collected).await;
    wait_until_collected(&collected, events.len()).await;
    let stopped = subscriber.run_until(async {}).await;

    assert!(matches!(stopped, Ok(StopReason::Shutdown)));
    assert_eq!(snapshot(&collected), events);
    let Ok(extra_subscribes) = server.await else {
        panic!("server task failed");
    };
    assert_eq!(extra_subscribes, 0);
}

#[tokio::test]
async fn zero_notifications_produce_no_calls() {
    let (listener, url) = listen().await;
    let (subscribed_tx, subscribed_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let mut ws = handshake(&listener).await;
        let _ = subscribed_tx.send(());
        count_subscribes(&mut ws).await
    });

    let collected = Collected::default();
    let subscriber = connect(&url, &collected).await;
    assert!(timeout(WAIT, subscribed_rx).await.is_ok());
    let stopped = subscriber.run_until(async {}).await;

    assert!(matches!(stopped, Ok(StopReason::Shutdown)));
    assert!(snapshot(&collected).is_empty());
    let Ok(extra_subscribes) = server.await else {
        panic!("server task failed");
    };
    assert_eq!(extra_subscribes, 0);
}

#[tokio::test]
async fn server_disconnect_ends_the_run() {
    let (listener, url) = listen().await;
    let server = tokio::spawn(async move {
        let mut ws = handshake(&listener).await;
        send(&mut ws, "41").await;
        count_subscribes(&mut ws).await
    });

    let collected = Collected::default();
    let subscriber = connect(&url, &collected).await;
    let stopped = timeout(WAIT, subscriber.run_until(std::future::pending())).await;

    assert!(matches!(stopped, Ok(Ok(StopReason::ServerClosed))));
    assert!(server.await.is_ok());
}

#[tokio::test]
async fn unsupported_url_is_rejected_before_connecting() {
    let config = ProbeConfig::from_lookup(|key| match key {
        "SOCKET_URL" => Some("ftp://localhost:3000".to_string()),
        _ => None,
    });
    assert!(matches!(
        subscriber::connect(&config).await,
        Err(ProbeError::InvalidEndpoint(_))
    ));
}
