//! Stream transport: the binary wire codec over a raw byte connection.
//!
//! Works over any `AsyncRead + AsyncWrite` stream: TCP in production,
//! `tokio::io::duplex` pairs in tests. Frame writes happen under a single
//! writer-lock hold (encode to a scratch buffer, then write + flush), so a
//! peer observes either a fully flushed frame or an I/O error, never a
//! partial frame, including with concurrent writers.

use std::io;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{watch, Mutex};

use livelink_core::{codec, LiveLinkError, Message, Result};

use super::Transport;

/// Read half plus its frame-reassembly buffer, locked as a unit.
struct FrameReader<S> {
    io: ReadHalf<S>,
    buf: BytesMut,
}

/// [`Transport`] over a buffered bidirectional byte stream.
pub struct StreamTransport<S> {
    name: &'static str,
    reader: Mutex<FrameReader<S>>,
    writer: Mutex<WriteHalf<S>>,
    // Raised once by close(); readers blocked in I/O observe it via select.
    closed: watch::Sender<bool>,
}

impl StreamTransport<TcpStream> {
    /// Dial a TCP endpoint and wrap it.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::build(stream, "tcp"))
    }
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Wrap an already-established byte stream.
    pub fn new(stream: S) -> Self {
        Self::build(stream, "stream")
    }

    fn build(stream: S, name: &'static str) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        let (closed, _) = watch::channel(false);
        StreamTransport {
            name,
            reader: Mutex::new(FrameReader {
                io: read_half,
                buf: BytesMut::with_capacity(4 * 1024),
            }),
            writer: Mutex::new(write_half),
            closed,
        }
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

#[async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn write_message(&self, message: Message) -> Result<()> {
        if self.is_closed() {
            return Err(LiveLinkError::Closed);
        }

        let mut frame = BytesMut::new();
        codec::encode(&message, &mut frame)?;

        // Single-writer critical section: the whole frame goes out under one
        // lock hold, so concurrent writers cannot interleave mid-frame.
        let mut writer = self.writer.lock().await;
        writer.write_all(&frame).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn read_message(&self) -> Result<Message> {
        let mut closed_rx = self.closed.subscribe();
        if *closed_rx.borrow() {
            return Err(LiveLinkError::Closed);
        }

        let mut guard = self.reader.lock().await;
        let reader = &mut *guard;
        loop {
            if let Some(message) = codec::decode(&mut reader.buf)? {
                return Ok(message);
            }

            tokio::select! {
                read = reader.io.read_buf(&mut reader.buf) => {
                    if read? == 0 {
                        if reader.buf.is_empty() {
                            return Err(LiveLinkError::Closed);
                        }
                        return Err(LiveLinkError::Connection(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "connection closed mid-frame",
                        )));
                    }
                }
                _ = closed_rx.changed() => {
                    return Err(LiveLinkError::Closed);
                }
            }
        }
    }

    async fn close(&self) -> Result<()> {
        if self.closed.send_replace(true) {
            // Already closed.
            return Ok(());
        }
        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
        Ok(())
    }
}
