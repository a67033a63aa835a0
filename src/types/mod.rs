// SideMarks shared types
// Data model, platform table, messages, settings and errors used across the crate.

pub mod bookmark;
pub mod errors;
pub mod message;
pub mod platform;
pub mod settings;
