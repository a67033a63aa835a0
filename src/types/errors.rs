use thiserror::Error;

// === StoreError ===

/// Errors raised by the key-value store behind the bookmark repository.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached (closed, locked, not mounted).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// A stored value could not be (de)serialized.
    #[error("Store serialization error: {0}")]
    Serialization(String),
    /// The underlying database reported an error.
    #[error("Store database error: {0}")]
    Database(String),
}

#[cfg(not(target_arch = "wasm32"))]
impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

// === BookmarkError ===

/// Errors related to bookmark store operations.
#[derive(Debug, Error)]
pub enum BookmarkError {
    /// No conversation identity could be extracted from the URL.
    #[error("No conversation id in url: {0}")]
    NoConversationId(String),
    /// The page is not one of the supported chat platforms.
    #[error("Unsupported platform for url: {0}")]
    UnsupportedPlatform(String),
    /// Reading or writing the persisted mapping failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// === DomError ===

/// Errors related to page DOM access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    /// The element is no longer attached to the document.
    #[error("Element detached from document")]
    Detached,
    /// The document has no body to attach to.
    #[error("Document has no body")]
    NoBody,
    /// The host DOM rejected the operation.
    #[error("DOM operation failed: {0}")]
    Operation(String),
}

// === MessageError ===

/// Errors raised while decoding a cross-context message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessageError {
    /// The message could not be parsed as JSON.
    #[error("Invalid message: {0}")]
    InvalidJson(String),
    /// The action name is not one the page understands.
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    /// A field the action requires is absent.
    #[error("Missing field '{field}' for action {action}")]
    MissingField { action: String, field: &'static str },
}

// === DeliveryError ===

/// Errors raised while delivering a message from a control surface to a page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// No page logic is listening in the target tab.
    #[error("No receiver in tab {0}")]
    NoReceiver(u32),
    /// The page logic could not be injected into the tab.
    #[error("Injection failed: {0}")]
    InjectionFailed(String),
    /// The target tab does not exist.
    #[error("Tab not found: {0}")]
    TabNotFound(u32),
}

// === SettingsError ===

/// Errors related to settings persistence.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read or write the settings file.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The value does not fit the setting's type.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === ShortcutError ===

/// Errors related to keyboard shortcut registration.
#[derive(Debug, Error)]
pub enum ShortcutError {
    /// The key combination is already bound to another command.
    #[error("Shortcut conflict: {0}")]
    Conflict(String),
    /// The provided key combination is invalid.
    #[error("Invalid shortcut keys: {0}")]
    InvalidKeys(String),
    /// No shortcut is registered for the given command.
    #[error("Shortcut not found: {0}")]
    NotFound(String),
}
