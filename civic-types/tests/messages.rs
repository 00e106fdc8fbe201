use civic_types::*;

#[test]
fn chat_request_wire_shape() {
    let req = ChatRequest {
        message: "Where do I pay my water bill?".into(),
        conversation_id: None,
        language: Language::Es,
    };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "message": "Where do I pay my water bill?",
            "conversation_id": null,
            "language": "es"
        })
    );
}

#[test]
fn chat_request_carries_pinned_conversation() {
    let req = ChatRequest {
        message: "and on weekends?".into(),
        conversation_id: Some("c-42".into()),
        language: Language::En,
    };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["conversation_id"], "c-42");
    assert_eq!(json["language"], "en");
}

#[test]
fn entry_roundtrip_serde() {
    let entry = ConversationEntry::assistant("Permits are issued at City Hall.");
    let json = serde_json::to_string(&entry).unwrap();
    assert!(json.contains("\"role\":\"assistant\""));
    let back: ConversationEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(back, entry);
}

#[test]
fn failure_message_is_localized() {
    assert_ne!(
        Language::En.turn_failed_message(),
        Language::Es.turn_failed_message()
    );
    assert!(Language::Es.turn_failed_message().starts_with("Lo siento"));
}

#[test]
fn text_shorthand_builds_chunk() {
    assert_eq!(
        StreamEvent::text("hi"),
        StreamEvent::TextChunk { text: "hi".into() }
    );
}
