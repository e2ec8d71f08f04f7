//! Socket.IO subscriber wiring.
//!
//! Builds a `rust_socketio` client that subscribes to the configured channel
//! once connected and reports every notification on the configured event.
//! Handshake, heartbeats and framing belong to the client library.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use rust_socketio::asynchronous::{Client, ClientBuilder};
use rust_socketio::{Event, Payload, TransportType};
use serde_json::Value;
use tokio::sync::Notify;
use url::Url;

use crate::config::ProbeConfig;
use crate::error::ProbeError;

/// Event name of the subscription request.
pub const SUBSCRIBE_EVENT: &str = "subscribe";

/// Default Socket.IO namespace.
pub const ROOT_NAMESPACE: &str = "/";

/// Server URL split the way Socket.IO clients read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    /// `http(s)` URL with the path cleared and the query string kept.
    pub url: String,
    /// Namespace taken from the URL path (`/` when empty).
    pub namespace: String,
}

impl ServerAddress {
    /// Parses `SOCKET_URL`. `ws(s)` is accepted as an alias for `http(s)`,
    /// a non-root path names the namespace, and query parameters such as
    /// auth tokens are passed through to the handshake.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidEndpoint`] if the URL does not parse,
    /// has no host, or uses an unsupported scheme.
    pub fn parse(raw: &str) -> Result<Self, ProbeError> {
        let mut url =
            Url::parse(raw).map_err(|e| ProbeError::InvalidEndpoint(format!("{raw}: {e}")))?;

        if url.host_str().is_none() {
            return Err(ProbeError::InvalidEndpoint(format!("{raw}: missing host")));
        }

        let scheme = match url.scheme() {
            "http" | "ws" => "http",
            "https" | "wss" => "https",
            other => {
                return Err(ProbeError::InvalidEndpoint(format!(
                    "{raw}: unsupported scheme {other:?}"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| ProbeError::InvalidEndpoint(format!("{raw}: cannot use {scheme}")))?;

        let namespace = match url.path().trim_end_matches('/') {
            "" => ROOT_NAMESPACE.to_string(),
            path => path.to_string(),
        };
        url.set_path("/");
        url.set_fragment(None);

        Ok(Self {
            url: url.into(),
            namespace,
        })
    }
}

/// An inbound notification as delivered to a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    /// Event name.
    pub name: String,
    /// Event arguments in the order the sender emitted them.
    pub args: Vec<Value>,
}

impl InboundEvent {
    /// Returns the payload as a handler with a single parameter sees it:
    /// the first argument, or `null` when the event carried none.
    #[must_use]
    pub fn payload(&self) -> &Value {
        self.args.first().unwrap_or(&Value::Null)
    }
}

/// Why [`SubscriberProbe::run_until`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The server closed the connection.
    ServerClosed,
    /// The caller's shutdown future resolved.
    Shutdown,
}

/// A connected subscriber.
pub struct SubscriberProbe {
    client: Client,
    closed: Arc<Notify>,
    address: ServerAddress,
}

impl fmt::Debug for SubscriberProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberProbe")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl SubscriberProbe {
    /// Waits until the server closes the connection or `shutdown`
    /// resolves, in which case the client disconnects first.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Transport`] if the disconnect fails.
    pub async fn run_until<S>(self, shutdown: S) -> Result<StopReason, ProbeError>
    where
        S: Future<Output = ()>,
    {
        tokio::select! {
            () = self.closed.notified() => Ok(StopReason::ServerClosed),
            () = shutdown => {
                self.client.disconnect().await?;
                Ok(StopReason::Shutdown)
            }
        }
    }
}

/// Connects the subscriber with notifications written to the log.
///
/// # Errors
///
/// Returns [`ProbeError::InvalidEndpoint`] if `SOCKET_URL` is unusable and
/// [`ProbeError::Transport`] if the connection cannot be established.
pub async fn connect(config: &ProbeConfig) -> Result<SubscriberProbe, ProbeError> {
    connect_with(config, log_notification).await
}

/// Connects the subscriber, passing every notification to `on_notification`.
///
/// # Errors
///
/// Returns [`ProbeError::InvalidEndpoint`] if `SOCKET_URL` is unusable and
/// [`ProbeError::Transport`] if the connection cannot be established.
pub async fn connect_with<F>(
    config: &ProbeConfig,
    mut on_notification: F,
) -> Result<SubscriberProbe, ProbeError>
where
    F: FnMut(&InboundEvent) + Send + Sync + 'static,
{
    let address = ServerAddress::parse(&config.socket_url)?;
    tracing::info!(
        url = %address.url,
        namespace = %address.namespace,
        channel = %config.socket_channel,
        event = %config.socket_event,
        "starting subscriber"
    );

    let closed = Arc::new(Notify::new());
    let close_signal = Arc::clone(&closed);
    let channel = config.socket_channel.clone();
    let event_name = config.socket_event.clone();
    let namespace = address.namespace.clone();

    let client = ClientBuilder::new(address.url.clone())
        .namespace(address.namespace.clone())
        .transport_type(TransportType::Websocket)
        .reconnect(false)
        .on(Event::Connect, move |payload: Payload, client: Client| {
            let channel = channel.clone();
            let id = connection_id(&payload).unwrap_or_else(|| namespace.clone());
            async move {
                tracing::info!(id = %id, "connected to realtime server");
                if let Err(e) = client.emit(SUBSCRIBE_EVENT, Value::String(channel)).await {
                    tracing::warn!(error = %e, "subscribe request failed");
                }
            }
            .boxed()
        })
        .on(
            config.socket_event.as_str(),
            move |payload: Payload, _client: Client| {
                let event = InboundEvent {
                    name: event_name.clone(),
                    args: payload_args(payload),
                };
                on_notification(&event);
                async {}.boxed()
            },
        )
        .on(Event::Error, |payload: Payload, _client: Client| {
            let detail = Value::Array(payload_args(payload));
            async move {
                tracing::warn!(error = %detail, "socket error");
            }
            .boxed()
        })
        .on(Event::Close, move |_payload: Payload, _client: Client| {
            close_signal.notify_one();
            async {}.boxed()
        })
        .connect()
        .await?;

    Ok(SubscriberProbe {
        client,
        closed,
        address,
    })
}

/// Logs one notification with its payload verbatim.
pub fn log_notification(event: &InboundEvent) {
    tracing::info!(event = %event.name, payload = %event.payload(), "notification received");
}

/// Flattens a library payload into JSON arguments. Binary payloads are
/// reported by size only.
fn payload_args(payload: Payload) -> Vec<Value> {
    match payload {
        Payload::Text(values) => values,
        Payload::Binary(bytes) => vec![serde_json::json!({ "binary_len": bytes.len() })],
        #[allow(deprecated)]
        Payload::String(raw) => vec![serde_json::from_str(&raw).unwrap_or(Value::String(raw))],
    }
}

/// Socket id carried by the connect acknowledgement, when the library
/// passes it through.
fn connection_id(payload: &Payload) -> Option<String> {
    match payload {
        Payload::Text(values) => values
            .first()
            .and_then(|v| v.get("sid"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
