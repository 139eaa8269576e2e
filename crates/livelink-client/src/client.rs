//! Client runtime: handshake, supervised loops, consumer channels.
//!
//! A `Client` owns exactly one transport. Construction sends the Hello
//! handshake synchronously, then starts two supervised background tasks:
//!
//! - **read loop**: pulls messages off the transport; errors go to the
//!   errors channel, ping/pong are consumed internally, everything else goes
//!   to the incoming channel.
//! - **heartbeat loop**: sends a Ping every [`HEARTBEAT_INTERVAL`],
//!   best-effort, until the closing signal is raised.
//!
//! Both consumer channels have capacity 1 and sends are awaited: a slow or
//! absent consumer stalls the read loop. That is the back-pressure contract,
//! not an accident; there is no drop or overflow policy.
//!
//! A `Client` is terminal: once [`Client::close`] runs there is no reconnect.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::net::ToSocketAddrs;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use livelink_core::{LiveLinkError, Message, MessageType, Result};

use crate::transport::{StreamTransport, Transport, WsTransport};

/// Cadence of the heartbeat Ping.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Protocol client over one transport.
pub struct Client {
    transport: Arc<dyn Transport>,
    incoming: mpsc::Receiver<Message>,
    errors: mpsc::Receiver<LiveLinkError>,
    closing: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Client {
    /// Dial a TCP endpoint and perform the handshake.
    pub async fn connect_tcp(
        addr: impl ToSocketAddrs,
        client_id: impl Into<String>,
        host: impl Into<String>,
    ) -> Result<Client> {
        let transport = StreamTransport::connect(addr).await?;
        Client::start(Arc::new(transport), client_id, host).await
    }

    /// Dial a websocket endpoint and perform the handshake.
    pub async fn connect_ws(
        url: &str,
        client_id: impl Into<String>,
        host: impl Into<String>,
    ) -> Result<Client> {
        let transport = WsTransport::connect(url).await?;
        Client::start(Arc::new(transport), client_id, host).await
    }

    async fn start(
        transport: Arc<dyn Transport>,
        client_id: impl Into<String>,
        host: impl Into<String>,
    ) -> Result<Client> {
        let (client, handshake_err) = Client::with_transport(transport, client_id, host).await;
        match handshake_err {
            None => Ok(client),
            Some(err) => {
                client.close().await;
                Err(err)
            }
        }
    }

    /// Build a client on an already-established transport.
    ///
    /// Sends Hello synchronously before spawning any background work. On a
    /// handshake failure the (loop-less) client is still returned alongside
    /// the error so the caller can inspect or close it.
    pub async fn with_transport(
        transport: Arc<dyn Transport>,
        client_id: impl Into<String>,
        host: impl Into<String>,
    ) -> (Client, Option<LiveLinkError>) {
        let (incoming_tx, incoming_rx) = mpsc::channel(1);
        let (errors_tx, errors_rx) = mpsc::channel(1);
        let (closing, closing_rx) = watch::channel(false);

        let mut client = Client {
            transport: transport.clone(),
            incoming: incoming_rx,
            errors: errors_rx,
            closing,
            tasks: Vec::new(),
        };

        let hello = Message::hello(client_id, host);
        if let Err(err) = transport.write_message(hello).await {
            return (client, Some(err));
        }

        client.tasks.push(spawn_supervised(
            "read",
            read_loop(transport.clone(), incoming_tx, errors_tx, closing_rx.clone()),
        ));
        client.tasks.push(spawn_supervised(
            "heartbeat",
            heartbeat_loop(transport, closing_rx),
        ));

        (client, None)
    }

    /// Application messages, FIFO. Unordered relative to [`errors`](Self::errors).
    pub fn incoming(&mut self) -> &mut mpsc::Receiver<Message> {
        &mut self.incoming
    }

    /// Connection and protocol errors observed by the read loop, FIFO.
    pub fn errors(&mut self) -> &mut mpsc::Receiver<LiveLinkError> {
        &mut self.errors
    }

    /// Raise the closing signal and close the transport.
    ///
    /// The heartbeat loop stops; the read loop observes the transport close
    /// as an error, delivers it on the errors channel, and exits. No Goodbye
    /// frame is sent; deployed peers do not expect a close handshake.
    pub async fn close(&self) {
        let _ = self.closing.send(true);
        if let Err(err) = self.transport.close().await {
            tracing::debug!(transport = self.transport.name(), error = %err, "transport close failed");
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        let _ = self.closing.send(true);
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn read_loop(
    transport: Arc<dyn Transport>,
    incoming_tx: mpsc::Sender<Message>,
    errors_tx: mpsc::Sender<LiveLinkError>,
    closing_rx: watch::Receiver<bool>,
) {
    loop {
        match transport.read_message().await {
            Err(err) => {
                // Blocking send: nothing is dropped, a missing consumer
                // stalls the loop. A dropped receiver ends it.
                if errors_tx.send(err).await.is_err() {
                    return;
                }
                // Pre-close errors retry; once closing is raised the error
                // stream would never end, so stop here.
                if *closing_rx.borrow() {
                    return;
                }
            }
            Ok(message) => match message.message_type() {
                MessageType::Ping => tracing::debug!("ping"),
                MessageType::Pong => tracing::debug!("pong"),
                _ => {
                    if incoming_tx.send(message).await.is_err() {
                        return;
                    }
                }
            },
        }
    }
}

async fn heartbeat_loop(transport: Arc<dyn Transport>, mut closing_rx: watch::Receiver<bool>) {
    // interval() fires immediately; the first heartbeat belongs one full
    // interval after the handshake.
    let mut tick = interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // No bias: "timer fired" vs "closing raised" is first-ready-wins.
        tokio::select! {
            _ = tick.tick() => {
                if let Err(err) = transport.write_message(Message::ping()).await {
                    tracing::debug!(transport = transport.name(), error = %err, "heartbeat ping dropped");
                }
            }
            _ = closing_rx.changed() => return,
        }
    }
}

/// Spawn a background loop whose panic is caught and logged instead of
/// unwinding the process. The returned handle doubles as the termination
/// report: it resolves when the loop ends, however it ends.
fn spawn_supervised(
    name: &'static str,
    task: impl Future<Output = ()> + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(panic) = AssertUnwindSafe(task).catch_unwind().await {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            tracing::warn!(task = name, %reason, "background task faulted");
        }
    })
}
