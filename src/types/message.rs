use serde::{Deserialize, Serialize};

use super::bookmark::BookmarkColor;
use super::errors::MessageError;

pub const ACTION_PING: &str = "ping";
pub const ACTION_TOGGLE: &str = "chatgpt-action-1";
pub const ACTION_KEYBOARD_TOGGLE: &str = "keyboard-toggle-bookmark";
pub const ACTION_UPDATE_COLOR: &str = "updateBookmarkColor";
pub const ACTION_CLEAR_ALL: &str = "clearAllBookmarks";
pub const ACTION_REMOVE: &str = "removeBookmark";
pub const ACTION_REFRESH: &str = "refreshBookmarks";

/// Message exchanged between a control surface and the page logic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionMessage {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ExtensionMessage {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn ping() -> Self {
        Self::new(ACTION_PING)
    }

    pub fn with_link_url(mut self, url: impl Into<String>) -> Self {
        self.link_url = Some(url.into());
        self
    }

    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn from_json(raw: &str) -> Result<Self, MessageError> {
        serde_json::from_str(raw).map_err(|e| MessageError::InvalidJson(e.to_string()))
    }
}

/// Reply sent back for messages that expect one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReply {
    pub status: String,
}

impl MessageReply {
    pub fn ready() -> Self {
        Self {
            status: "ready".to_string(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}

/// A decoded page command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCommand {
    Ping,
    /// Default-color toggle on a sidebar link.
    Toggle { link_url: String },
    /// Palette color on a sidebar link.
    SetColor { link_url: String, color: BookmarkColor },
    /// Toggle on the conversation shown in the current location.
    KeyboardToggle,
    /// Repaint visible markers without touching storage.
    RecolorAll { color: String },
    ClearAll,
    Remove { conversation_id: String },
    Refresh,
}

impl PageCommand {
    /// Decodes a message into a command.
    ///
    /// Messages carrying `linkUrl` come from the link context menu and only
    /// accept the toggle and palette actions; the rest come from the popup,
    /// the keyboard command or the readiness probe.
    pub fn from_message(msg: &ExtensionMessage) -> Result<PageCommand, MessageError> {
        let action = msg.action.as_str();
        if action.is_empty() {
            return Err(MessageError::UnknownAction(String::new()));
        }

        if let Some(link_url) = &msg.link_url {
            if action == ACTION_TOGGLE {
                return Ok(PageCommand::Toggle {
                    link_url: link_url.clone(),
                });
            }
            return match BookmarkColor::from_action_id(action) {
                Some(color) => Ok(PageCommand::SetColor {
                    link_url: link_url.clone(),
                    color,
                }),
                None => Err(MessageError::UnknownAction(action.to_string())),
            };
        }

        match action {
            ACTION_PING => Ok(PageCommand::Ping),
            ACTION_KEYBOARD_TOGGLE => Ok(PageCommand::KeyboardToggle),
            ACTION_UPDATE_COLOR => {
                let color = required(msg.color.as_deref(), action, "color")?;
                Ok(PageCommand::RecolorAll { color })
            }
            ACTION_CLEAR_ALL => Ok(PageCommand::ClearAll),
            ACTION_REMOVE => {
                let conversation_id =
                    required(msg.conversation_id.as_deref(), action, "conversationId")?;
                Ok(PageCommand::Remove { conversation_id })
            }
            ACTION_REFRESH => Ok(PageCommand::Refresh),
            ACTION_TOGGLE => Err(MessageError::MissingField {
                action: action.to_string(),
                field: "linkUrl",
            }),
            other if BookmarkColor::from_action_id(other).is_some() => {
                Err(MessageError::MissingField {
                    action: other.to_string(),
                    field: "linkUrl",
                })
            }
            other => Err(MessageError::UnknownAction(other.to_string())),
        }
    }
}

fn required(value: Option<&str>, action: &str, field: &'static str) -> Result<String, MessageError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(MessageError::MissingField {
            action: action.to_string(),
            field,
        }),
    }
}
