//! Message model tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde::{Deserialize, Serialize};

use livelink_core::{Hello, LiveLinkError, Message, MessageType, CONTENT_TYPE_JSON};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Note {
    text: String,
}

#[test]
fn hello_carries_client_id_and_host() {
    let message = Message::hello("abc", "host1");
    assert_eq!(message.message_type(), MessageType::Hello);
    assert_eq!(message.content_type(), CONTENT_TYPE_JSON);

    let hello: Hello = message.read_json().unwrap();
    assert_eq!(hello.client_id, "abc");
    assert_eq!(hello.host, "host1");
}

#[test]
fn hello_wire_field_names_are_stable() {
    let message = Message::hello("abc", "host1");
    let raw: serde_json::Value = message.read_json().unwrap();
    assert_eq!(raw["ClientID"], "abc");
    assert_eq!(raw["Host"], "host1");
}

#[test]
fn json_message_round_trips_through_read_json() {
    let note = Note {
        text: "hi".to_string(),
    };
    let message = Message::json(&note).unwrap();
    assert_eq!(message.message_type(), MessageType::Message);
    assert_eq!(message.content_length(), message.content().len());

    let back: Note = message.read_json().unwrap();
    assert_eq!(back, note);
}

#[test]
fn read_json_rejects_control_messages() {
    let err = Message::ping().read_json::<Note>().expect_err("ping has no JSON");
    match err {
        LiveLinkError::ContentType { expected, actual } => {
            assert_eq!(expected, CONTENT_TYPE_JSON);
            assert_eq!(actual, "");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn read_json_rejects_non_json_content_type() {
    let message = Message::with_content("application/octet-stream", &b"\x01\x02"[..]);
    let err = message.read_json::<Note>().expect_err("binary content");
    assert!(matches!(err, LiveLinkError::ContentType { .. }));
}

#[test]
fn read_json_surfaces_malformed_json() {
    let message = Message::with_content(CONTENT_TYPE_JSON, &b"{not json"[..]);
    let err = message.read_json::<Note>().expect_err("malformed JSON");
    assert!(matches!(err, LiveLinkError::Decode(_)));
}

#[test]
fn control_constructors_have_no_content() {
    for (message, message_type) in [
        (Message::ping(), MessageType::Ping),
        (Message::pong(), MessageType::Pong),
        (Message::goodbye(), MessageType::Goodbye),
    ] {
        assert_eq!(message.message_type(), message_type);
        assert_eq!(message.content_length(), 0);
        assert_eq!(message.content_type(), "");
    }
}
