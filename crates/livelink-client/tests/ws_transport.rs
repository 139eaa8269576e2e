//! Websocket transport integration tests.
//!
//! Most tests run both roles over an in-memory duplex pair via
//! `from_raw_socket`; the last one exercises a real loopback dial.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::io::DuplexStream;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::Role;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;

use livelink_client::{Client, Transport, WsTransport};
use livelink_core::{
    LiveLinkError, Message, MessageType, CONTENT_TYPE_JSON, CONTENT_TYPE_OCTET_STREAM,
};

async fn ws_pair() -> (WsTransport<DuplexStream>, WebSocketStream<DuplexStream>) {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let client = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;
    let server = WebSocketStream::from_raw_socket(server_io, Role::Server, None).await;
    (WsTransport::from_socket(client), server)
}

#[tokio::test]
async fn text_and_binary_frames_become_messages() {
    let (transport, mut server) = ws_pair().await;

    server
        .send(WsMessage::Text(r#"{"n":1}"#.into()))
        .await
        .unwrap();
    let text = transport.read_message().await.unwrap();
    assert_eq!(text.message_type(), MessageType::Message);
    assert_eq!(text.content_type(), CONTENT_TYPE_JSON);
    let body: serde_json::Value = text.read_json().unwrap();
    assert_eq!(body["n"], 1);

    server
        .send(WsMessage::Binary(Bytes::from_static(&[1, 2, 3])))
        .await
        .unwrap();
    let binary = transport.read_message().await.unwrap();
    assert_eq!(binary.message_type(), MessageType::Message);
    assert_eq!(binary.content_type(), CONTENT_TYPE_OCTET_STREAM);
    assert_eq!(binary.content().as_ref(), &[1, 2, 3]);
}

#[tokio::test]
async fn native_ping_pong_surface_as_control_messages() {
    let (transport, mut server) = ws_pair().await;

    server.send(WsMessage::Ping(Bytes::new())).await.unwrap();
    assert_eq!(
        transport.read_message().await.unwrap().message_type(),
        MessageType::Ping
    );

    server.send(WsMessage::Pong(Bytes::new())).await.unwrap();
    assert_eq!(
        transport.read_message().await.unwrap().message_type(),
        MessageType::Pong
    );
}

#[tokio::test]
async fn close_frame_becomes_goodbye_then_closed() {
    let (transport, mut server) = ws_pair().await;

    server.send(WsMessage::Close(None)).await.unwrap();

    let goodbye = transport.read_message().await.unwrap();
    assert_eq!(goodbye.message_type(), MessageType::Goodbye);
    assert_eq!(goodbye.content_length(), 0);

    // The relay loop is gone once the connection ends.
    let result = timeout(Duration::from_secs(1), transport.read_message()).await;
    assert!(matches!(result, Ok(Err(LiveLinkError::Closed))));
}

#[tokio::test]
async fn writes_map_to_native_frames() {
    let (transport, mut server) = ws_pair().await;

    transport
        .write_message(Message::json(&serde_json::json!({"op": "set"})).unwrap())
        .await
        .unwrap();
    match server.next().await.unwrap().unwrap() {
        WsMessage::Text(text) => assert!(text.contains("\"op\"")),
        other => panic!("expected text frame, got {other:?}"),
    }

    transport
        .write_message(Message::with_content(
            CONTENT_TYPE_OCTET_STREAM,
            Bytes::from_static(&[9, 9]),
        ))
        .await
        .unwrap();
    match server.next().await.unwrap().unwrap() {
        WsMessage::Binary(bytes) => assert_eq!(bytes.as_ref(), &[9, 9]),
        other => panic!("expected binary frame, got {other:?}"),
    }

    transport
        .write_message(Message::hello("abc", "host1"))
        .await
        .unwrap();
    match server.next().await.unwrap().unwrap() {
        WsMessage::Text(text) => assert!(text.contains("\"ClientID\":\"abc\"")),
        other => panic!("expected text hello, got {other:?}"),
    }

    transport.write_message(Message::ping()).await.unwrap();
    assert!(matches!(
        server.next().await.unwrap().unwrap(),
        WsMessage::Ping(_)
    ));

    transport.write_message(Message::pong()).await.unwrap();
    assert!(matches!(
        server.next().await.unwrap().unwrap(),
        WsMessage::Pong(_)
    ));
}

#[tokio::test]
async fn goodbye_write_sends_a_normal_close_frame() {
    let (transport, mut server) = ws_pair().await;

    transport.write_message(Message::goodbye()).await.unwrap();
    match server.next().await.unwrap().unwrap() {
        WsMessage::Close(Some(frame)) => assert_eq!(frame.code, CloseCode::Normal),
        other => panic!("expected close frame, got {other:?}"),
    }
}

#[tokio::test]
async fn client_dials_a_loopback_websocket_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        // Handshake arrives first, as a text frame.
        match ws.next().await.unwrap().unwrap() {
            WsMessage::Text(text) => {
                assert!(text.contains("\"ClientID\":\"abc\""));
                assert!(text.contains("\"Host\":\"host1\""));
            }
            other => panic!("expected hello text frame, got {other:?}"),
        }

        ws.send(WsMessage::Text(r#"{"greeting":"hi"}"#.into()))
            .await
            .unwrap();

        // Drain until the client closes.
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut client = Client::connect_ws(&format!("ws://{addr}/"), "abc", "host1")
        .await
        .unwrap();

    let message = timeout(Duration::from_secs(5), client.incoming().recv())
        .await
        .unwrap()
        .unwrap();
    let body: serde_json::Value = message.read_json().unwrap();
    assert_eq!(body["greeting"], "hi");

    client.close().await;
    server.await.unwrap();
}
