//! Page-side message handler.
//!
//! Decodes an [`ExtensionMessage`] and routes it to the [`PageApp`]. Only a
//! malformed message is an error; a failing operation is logged and the
//! message counts as handled, since nothing on the sending side waits for
//! the outcome.

use tracing::{debug, info, warn};

use crate::app::PageApp;
use crate::dom::PageDom;
use crate::managers::bookmark_repository::BookmarkRepository;
use crate::types::errors::MessageError;
use crate::types::message::{ExtensionMessage, MessageReply, PageCommand};

/// Handles one message at instant `now`.
///
/// Returns the reply to send back, which only `ping` produces.
pub fn handle_message<D: PageDom, R: BookmarkRepository>(
    app: &mut PageApp<D, R>,
    message: &ExtensionMessage,
    now: u64,
) -> Result<Option<MessageReply>, MessageError> {
    let command = PageCommand::from_message(message).inspect_err(|e| {
        debug!(action = %message.action, error = %e, "rejected message");
    })?;
    debug!(?command, "handling message");

    match command {
        PageCommand::Ping => return Ok(Some(MessageReply::ready())),
        PageCommand::Toggle { link_url } => match app.toggle(&link_url) {
            Ok((id, outcome)) => info!(conversation = %id, ?outcome, "toggle handled"),
            Err(e) => warn!(link = %link_url, error = %e, "toggle failed"),
        },
        PageCommand::SetColor { link_url, color } => match app.set_color(&link_url, color) {
            Ok((id, outcome)) => info!(conversation = %id, ?outcome, "color handled"),
            Err(e) => warn!(link = %link_url, error = %e, "set color failed"),
        },
        PageCommand::KeyboardToggle => {
            if let Err(e) = app.keyboard_toggle(now) {
                warn!(error = %e, "keyboard toggle failed");
            }
        }
        PageCommand::RecolorAll { color } => {
            let repainted = app.recolor_all(&color);
            debug!(repainted, %color, "recolored markers");
        }
        PageCommand::ClearAll => {
            if let Err(e) = app.clear_all() {
                warn!(error = %e, "clear all failed");
            }
        }
        PageCommand::Remove { conversation_id } => {
            if let Err(e) = app.remove(&conversation_id) {
                warn!(conversation = %conversation_id, error = %e, "remove failed");
            }
        }
        PageCommand::Refresh => {
            if let Err(e) = app.reconcile() {
                warn!(error = %e, "refresh failed");
            }
        }
    }
    Ok(None)
}

/// Parses a raw JSON message and handles it.
pub fn handle_raw_message<D: PageDom, R: BookmarkRepository>(
    app: &mut PageApp<D, R>,
    raw: &str,
    now: u64,
) -> Result<Option<MessageReply>, MessageError> {
    let message = ExtensionMessage::from_json(raw)?;
    handle_message(app, &message, now)
}
