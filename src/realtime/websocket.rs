use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::reconnect::{PushChannelOptions, ReconnectState};
use super::{ConnectionStatus, InboundPayload};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Outbound = Arc<Mutex<Option<mpsc::UnboundedSender<Message>>>>;

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Opened,
    Message(InboundPayload),
    Closed,
    Error(String),
}

/// Handle to a WebSocket connection that reconnects on its own.
///
/// Dropping the handle disconnects.
pub struct PushChannel {
    status: watch::Receiver<ConnectionStatus>,
    outbound: Outbound,
    cancel: CancellationToken,
}

enum SessionEnd {
    Cancelled,
    Closed,
    Failed(String),
}

impl PushChannel {
    pub fn connect(
        url: impl Into<String>,
        options: PushChannelOptions,
    ) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let url = url.into();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let outbound: Outbound = Arc::new(Mutex::new(None));
        let cancel = CancellationToken::new();

        tokio::spawn(run_channel(
            url,
            options,
            status_tx,
            Arc::clone(&outbound),
            event_tx,
            cancel.clone(),
        ));

        (
            Self {
                status: status_rx,
                outbound,
                cancel,
            },
            event_rx,
        )
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Serialize `payload` and write it as a text frame. Returns `false`, and
    /// writes nothing, unless the channel is connected.
    pub fn send<T: Serialize + ?Sized>(&self, payload: &T) -> bool {
        if self.status() != ConnectionStatus::Connected {
            return false;
        }
        let text = match serde_json::to_string(payload) {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "push payload could not be serialized");
                return false;
            }
        };
        match self.outbound.lock().unwrap().as_ref() {
            Some(tx) => tx.send(Message::Text(text)).is_ok(),
            None => false,
        }
    }

    /// Close the socket and cancel any pending reconnect. Idempotent.
    pub fn disconnect(&self) {
        self.cancel.cancel();
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_channel(
    url: String,
    options: PushChannelOptions,
    status: watch::Sender<ConnectionStatus>,
    outbound: Outbound,
    events: mpsc::UnboundedSender<ChannelEvent>,
    cancel: CancellationToken,
) {
    let mut reconnect = ReconnectState::default();

    loop {
        status.send_replace(ConnectionStatus::Connecting);
        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            result = connect_async(url.as_str()) => result,
        };

        match connected {
            Ok((socket, _)) => {
                info!(%url, "push channel connected");
                reconnect.on_open();
                let (tx, rx) = mpsc::unbounded_channel();
                *outbound.lock().unwrap() = Some(tx);
                status.send_replace(ConnectionStatus::Connected);
                let _ = events.send(ChannelEvent::Opened);

                let end = pump(socket, rx, &events, &cancel).await;
                *outbound.lock().unwrap() = None;
                match end {
                    SessionEnd::Cancelled => break,
                    SessionEnd::Closed => debug!(%url, "push channel closed by server"),
                    SessionEnd::Failed(message) => {
                        warn!(%url, error = %message, "push channel failed");
                        status.send_replace(ConnectionStatus::Error);
                        let _ = events.send(ChannelEvent::Error(message));
                    }
                }
            }
            Err(err) => {
                warn!(%url, error = %err, "push channel connect failed");
                status.send_replace(ConnectionStatus::Error);
                let _ = events.send(ChannelEvent::Error(err.to_string()));
            }
        }

        status.send_replace(ConnectionStatus::Disconnected);
        let _ = events.send(ChannelEvent::Closed);

        let Some(delay) = reconnect.next_delay(&options) else {
            debug!(%url, attempts = reconnect.attempts(), "push channel not reconnecting");
            break;
        };
        debug!(%url, attempt = reconnect.attempts(), ?delay, "push channel reconnect scheduled");
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    *outbound.lock().unwrap() = None;
    status.send_replace(ConnectionStatus::Disconnected);
}

async fn pump(
    socket: Socket,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    events: &mpsc::UnboundedSender<ChannelEvent>,
    cancel: &CancellationToken,
) -> SessionEnd {
    let (mut write, mut read) = socket.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = write.close().await;
                return SessionEnd::Cancelled;
            }
            Some(message) = outbound.recv() => {
                if let Err(err) = write.send(message).await {
                    return SessionEnd::Failed(err.to_string());
                }
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(ChannelEvent::Message(InboundPayload::from_text(text)));
                }
                Some(Ok(Message::Binary(data))) => {
                    let _ = events.send(ChannelEvent::Message(InboundPayload::Binary(data)));
                }
                Some(Ok(Message::Close(_))) | None => return SessionEnd::Closed,
                Some(Ok(_)) => {}
                Some(Err(err)) => return SessionEnd::Failed(err.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    use super::*;

    async fn dead_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        format!("ws://{addr}/ws")
    }

    async fn drain(mut rx: mpsc::UnboundedReceiver<ChannelEvent>) -> Vec<ChannelEvent> {
        let mut seen = Vec::new();
        tokio::time::timeout(Duration::from_secs(10), async {
            while let Some(event) = rx.recv().await {
                seen.push(event);
            }
        })
        .await
        .expect("channel task should finish");
        seen
    }

    #[tokio::test]
    async fn delivers_frames_and_sends_while_connected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut socket = accept_async(stream).await.expect("handshake");
            socket
                .send(Message::Text(r#"{"type":"hello"}"#.to_string()))
                .await
                .expect("send json");
            socket
                .send(Message::Text("plain words".to_string()))
                .await
                .expect("send raw");
            loop {
                match socket.next().await {
                    Some(Ok(Message::Text(text))) => return text,
                    Some(Ok(_)) => continue,
                    other => panic!("expected a text frame, got {other:?}"),
                }
            }
        });

        let (channel, mut rx) = PushChannel::connect(
            format!("ws://{addr}/ws"),
            PushChannelOptions {
                reconnect: false,
                ..Default::default()
            },
        );

        assert_eq!(rx.recv().await, Some(ChannelEvent::Opened));
        assert_eq!(channel.status(), ConnectionStatus::Connected);
        assert_eq!(
            rx.recv().await,
            Some(ChannelEvent::Message(InboundPayload::Json(json!({ "type": "hello" }))))
        );
        assert_eq!(
            rx.recv().await,
            Some(ChannelEvent::Message(InboundPayload::Raw("plain words".to_string())))
        );

        assert!(channel.send(&json!({ "type": "typing" })));
        let received = server.await.expect("server task");
        assert_eq!(received, r#"{"type":"typing"}"#);

        channel.disconnect();
        channel.disconnect();
        let mut status = channel.watch_status();
        tokio::time::timeout(
            Duration::from_secs(5),
            status.wait_for(|status| *status == ConnectionStatus::Disconnected),
        )
        .await
        .expect("disconnect should settle")
        .expect("status sender alive");
    }

    #[tokio::test]
    async fn send_is_dropped_when_not_connected() {
        let (channel, rx) = PushChannel::connect(
            dead_url().await,
            PushChannelOptions {
                reconnect: false,
                ..Default::default()
            },
        );
        let events = drain(rx).await;
        assert!(matches!(events[0], ChannelEvent::Error(_)));
        assert_eq!(events[1], ChannelEvent::Closed);
        assert_eq!(channel.status(), ConnectionStatus::Disconnected);
        assert!(!channel.send(&json!({ "type": "typing" })));
    }

    #[tokio::test]
    async fn failed_connects_retry_exactly_max_times() {
        let (_channel, rx) = PushChannel::connect(
            dead_url().await,
            PushChannelOptions {
                reconnect: true,
                reconnect_interval: Duration::from_millis(10),
                max_reconnect_attempts: 3,
            },
        );
        let events = drain(rx).await;
        let errors = events
            .iter()
            .filter(|event| matches!(event, ChannelEvent::Error(_)))
            .count();
        let closes = events
            .iter()
            .filter(|event| **event == ChannelEvent::Closed)
            .count();
        assert_eq!(errors, 4);
        assert_eq!(closes, 4);
    }

    #[tokio::test]
    async fn successful_open_resets_the_attempt_counter() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let mut listener = Some(listener);
            for round in 0..3 {
                let Some(active) = listener.as_ref() else {
                    break;
                };
                let (stream, _) = active.accept().await.expect("accept");
                if round == 2 {
                    listener = None;
                }
                let mut socket = accept_async(stream).await.expect("handshake");
                let _ = socket.close(None).await;
            }
        });

        let (_channel, rx) = PushChannel::connect(
            format!("ws://{addr}/ws"),
            PushChannelOptions {
                reconnect: true,
                reconnect_interval: Duration::from_millis(20),
                max_reconnect_attempts: 2,
            },
        );
        let events = drain(rx).await;
        let opens = events
            .iter()
            .filter(|event| **event == ChannelEvent::Opened)
            .count();
        let errors = events
            .iter()
            .filter(|event| matches!(event, ChannelEvent::Error(_)))
            .count();
        assert_eq!(opens, 3);
        assert_eq!(errors, 2);
    }

    #[tokio::test]
    async fn dropping_the_handle_stops_reconnecting() {
        let (channel, rx) = PushChannel::connect(
            dead_url().await,
            PushChannelOptions {
                reconnect: true,
                reconnect_interval: Duration::from_secs(3600),
                max_reconnect_attempts: 5,
            },
        );
        let mut status = channel.watch_status();
        status
            .wait_for(|status| *status == ConnectionStatus::Disconnected)
            .await
            .expect("status sender alive");
        drop(channel);
        let events = drain(rx).await;
        assert_eq!(events.len(), 2);
    }
}
