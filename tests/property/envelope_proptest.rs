//! Property-based tests for client envelopes and server frames

use proptest::prelude::*;
use roomchat::shared::{Envelope, EnvelopeKind, ServerFrame};

proptest! {
    #[test]
    fn test_decode_never_panics(text in ".*") {
        let _ = Envelope::decode(&text);
    }

    #[test]
    fn test_content_survives_decoding(content in ".*", room_id in any::<i64>()) {
        let frame = serde_json::json!({
            "type": "send_message",
            "room_id": room_id,
            "content": content,
        })
        .to_string();

        let envelope = Envelope::decode(&frame).unwrap();
        prop_assert_eq!(envelope.kind(), EnvelopeKind::SendMessage);
        prop_assert_eq!(envelope.room_id, room_id);
        prop_assert_eq!(envelope.content, content);
    }

    #[test]
    fn test_unrecognized_types_are_unknown(kind in "[a-z_]{0,16}") {
        prop_assume!(!["send_message", "read", "join", "leave"].contains(&kind.as_str()));
        prop_assert_eq!(EnvelopeKind::parse(&kind), EnvelopeKind::Unknown);
    }

    #[test]
    fn test_error_frames_are_tagged(message in ".*") {
        let encoded = ServerFrame::error(message.clone()).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(&value["type"], "error");
        prop_assert_eq!(value["message"].as_str(), Some(message.as_str()));
    }
}
