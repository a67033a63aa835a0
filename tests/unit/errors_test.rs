use sidemarks::types::errors::*;

// === StoreError Tests ===

#[test]
fn store_error_unavailable_display() {
    let err = StoreError::Unavailable("context invalidated".to_string());
    assert_eq!(err.to_string(), "Store unavailable: context invalidated");
}

#[test]
fn store_error_from_serde_json() {
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err: StoreError = json_err.into();
    assert!(matches!(err, StoreError::Serialization(_)));
}

#[test]
fn store_error_from_rusqlite() {
    let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(matches!(err, StoreError::Database(_)));
    assert!(err.to_string().starts_with("Store database error:"));
}

// === BookmarkError Tests ===

#[test]
fn bookmark_error_no_conversation_id_display() {
    let err = BookmarkError::NoConversationId("https://chatgpt.com/".to_string());
    assert_eq!(err.to_string(), "No conversation id in url: https://chatgpt.com/");
}

#[test]
fn bookmark_error_unsupported_platform_display() {
    let err = BookmarkError::UnsupportedPlatform("https://example.com/c/x".to_string());
    assert_eq!(err.to_string(), "Unsupported platform for url: https://example.com/c/x");
}

#[test]
fn bookmark_error_wraps_store_error_transparently() {
    let err: BookmarkError = StoreError::Unavailable("gone".to_string()).into();
    assert_eq!(err.to_string(), "Store unavailable: gone");
}

// === DomError Tests ===

#[test]
fn dom_error_display() {
    assert_eq!(DomError::Detached.to_string(), "Element detached from document");
    assert_eq!(DomError::NoBody.to_string(), "Document has no body");
    assert_eq!(
        DomError::Operation("boom".to_string()).to_string(),
        "DOM operation failed: boom"
    );
}

// === MessageError Tests ===

#[test]
fn message_error_missing_field_display() {
    let err = MessageError::MissingField {
        action: "removeBookmark".to_string(),
        field: "conversationId",
    };
    assert_eq!(
        err.to_string(),
        "Missing field 'conversationId' for action removeBookmark"
    );
}

#[test]
fn message_error_unknown_action_display() {
    let err = MessageError::UnknownAction("fly".to_string());
    assert_eq!(err.to_string(), "Unknown action: fly");
}

// === DeliveryError Tests ===

#[test]
fn delivery_error_display() {
    assert_eq!(DeliveryError::NoReceiver(3).to_string(), "No receiver in tab 3");
    assert_eq!(DeliveryError::TabNotFound(9).to_string(), "Tab not found: 9");
    assert_eq!(
        DeliveryError::InjectionFailed("blocked".to_string()).to_string(),
        "Injection failed: blocked"
    );
}

// === SettingsError Tests ===

#[test]
fn settings_error_display() {
    let err = SettingsError::InvalidKey("timing.nope".to_string());
    assert_eq!(err.to_string(), "Invalid settings key: timing.nope");
    let err = SettingsError::InvalidValue("expected u64".to_string());
    assert_eq!(err.to_string(), "Invalid settings value: expected u64");
}

// === ShortcutError Tests ===

#[test]
fn shortcut_error_conflict_display() {
    let err = ShortcutError::Conflict("Ctrl+Shift+B".to_string());
    assert_eq!(err.to_string(), "Shortcut conflict: Ctrl+Shift+B");
}

#[test]
fn errors_implement_error_trait() {
    let errs: Vec<Box<dyn std::error::Error>> = vec![
        Box::new(StoreError::Unavailable("x".to_string())),
        Box::new(DomError::Detached),
        Box::new(MessageError::InvalidJson("x".to_string())),
        Box::new(DeliveryError::NoReceiver(1)),
        Box::new(ShortcutError::NotFound("x".to_string())),
    ];
    assert!(errs.iter().all(|e| e.source().is_none()));
}
