//! Websocket transport: native frames relayed onto the protocol message model.
//!
//! The websocket runtime already frames messages (text/binary/ping/pong/close),
//! so no binary codec is involved. A background relay task converts each
//! native frame to a [`Message`] and pushes it onto a capacity-1 relay queue;
//! `read_message` dequeues from that queue. Conversion table:
//!
//! - text   -> Message / `application/json`
//! - binary -> Message / `application/octet-stream`
//! - ping   -> Ping, pong -> Pong
//! - close  -> Goodbye (zero content; close reason is logged at debug)
//!
//! A dead relay queue (connection gone) surfaces as `Closed` from
//! `read_message`, keeping the websocket flavor on the same error contract as
//! the stream transport.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use livelink_core::{
    LiveLinkError, Message, MessageType, Result, CONTENT_TYPE_JSON, CONTENT_TYPE_OCTET_STREAM,
};

use super::Transport;

/// Bounded deadline for flushing the Goodbye close frame.
const GOODBYE_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// [`Transport`] over a websocket connection.
pub struct WsTransport<S> {
    sink: Mutex<SplitSink<WebSocketStream<S>, WsMessage>>,
    relay: Mutex<mpsc::Receiver<Message>>,
    relay_task: JoinHandle<()>,
}

impl WsTransport<MaybeTlsStream<TcpStream>> {
    /// Dial a websocket endpoint (`ws://` / `wss://`) and wrap it.
    pub async fn connect(url: &str) -> Result<Self> {
        let (socket, _response) = connect_async(url).await.map_err(map_ws_err)?;
        Ok(Self::from_socket(socket))
    }
}

impl<S> WsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wrap an already-established websocket connection and start the relay
    /// task.
    pub fn from_socket(socket: WebSocketStream<S>) -> Self {
        let (sink, stream) = socket.split();
        let (relay_tx, relay_rx) = mpsc::channel(1);
        let relay_task = tokio::spawn(relay_loop(stream, relay_tx));
        WsTransport {
            sink: Mutex::new(sink),
            relay: Mutex::new(relay_rx),
            relay_task,
        }
    }
}

/// Reads native frames and feeds converted messages to the relay queue.
/// Exits when the connection ends or the transport is dropped.
async fn relay_loop<S>(
    mut stream: SplitStream<WebSocketStream<S>>,
    relay_tx: mpsc::Sender<Message>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    while let Some(frame) = stream.next().await {
        let message = match frame {
            Ok(WsMessage::Text(text)) => {
                Message::with_content(CONTENT_TYPE_JSON, Bytes::copy_from_slice(text.as_bytes()))
            }
            Ok(WsMessage::Binary(bytes)) => {
                Message::with_content(CONTENT_TYPE_OCTET_STREAM, bytes)
            }
            Ok(WsMessage::Ping(_)) => {
                tracing::debug!("ping");
                Message::ping()
            }
            Ok(WsMessage::Pong(_)) => {
                tracing::debug!("pong");
                Message::pong()
            }
            Ok(WsMessage::Close(close)) => {
                if let Some(close) = close {
                    tracing::debug!(code = ?close.code, reason = %close.reason, "close frame");
                }
                Message::goodbye()
            }
            Ok(WsMessage::Frame(_)) => continue,
            Err(err) => {
                tracing::debug!(error = %err, "websocket read failed");
                break;
            }
        };

        if relay_tx.send(message).await.is_err() {
            break;
        }
    }
}

#[async_trait]
impl<S> Transport for WsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn name(&self) -> &'static str {
        "ws"
    }

    async fn write_message(&self, message: Message) -> Result<()> {
        let frame = match message.message_type() {
            MessageType::Message if message.content_type() == CONTENT_TYPE_JSON => {
                WsMessage::Text(utf8_content(&message)?.into())
            }
            MessageType::Message => WsMessage::Binary(message.content().clone()),
            MessageType::Hello => WsMessage::Text(utf8_content(&message)?.into()),
            MessageType::Goodbye => {
                let close = WsMessage::Close(Some(CloseFrame {
                    code: CloseCode::Normal,
                    reason: "".into(),
                }));
                let mut sink = self.sink.lock().await;
                return match tokio::time::timeout(GOODBYE_SEND_TIMEOUT, sink.send(close)).await {
                    Ok(sent) => sent.map_err(map_ws_err),
                    Err(_) => Err(LiveLinkError::Transport(
                        "goodbye close frame send timed out".into(),
                    )),
                };
            }
            MessageType::Ping => WsMessage::Ping(Bytes::new()),
            MessageType::Pong => WsMessage::Pong(Bytes::new()),
        };

        self.sink.lock().await.send(frame).await.map_err(map_ws_err)
    }

    async fn read_message(&self) -> Result<Message> {
        self.relay
            .lock()
            .await
            .recv()
            .await
            .ok_or(LiveLinkError::Closed)
    }

    async fn close(&self) -> Result<()> {
        let mut sink = self.sink.lock().await;
        let _ = sink.close().await;
        self.relay_task.abort();
        Ok(())
    }
}

impl<S> Drop for WsTransport<S> {
    fn drop(&mut self) {
        self.relay_task.abort();
    }
}

fn utf8_content(message: &Message) -> Result<String> {
    String::from_utf8(message.content().to_vec())
        .map_err(|_| LiveLinkError::BadFrame("text frame content is not UTF-8".into()))
}

fn map_ws_err(err: WsError) -> LiveLinkError {
    match err {
        WsError::ConnectionClosed | WsError::AlreadyClosed => LiveLinkError::Closed,
        WsError::Io(err) => LiveLinkError::Connection(err),
        other => LiveLinkError::Transport(other.to_string()),
    }
}
