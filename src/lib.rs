//! SideMarks: color bookmarks for the conversation sidebars of AI chat web apps.
//!
//! This library crate exposes all modules for use by the binaries, the
//! browser build and integration tests.

pub mod app;
pub mod database;
pub mod dom;
pub mod managers;
pub mod message_handler;
pub mod services;
pub mod types;

#[cfg(not(target_arch = "wasm32"))]
pub mod host_handler;
#[cfg(not(target_arch = "wasm32"))]
pub mod logging;
#[cfg(not(target_arch = "wasm32"))]
pub mod paths;
#[cfg(not(target_arch = "wasm32"))]
pub mod runtime;

#[cfg(target_arch = "wasm32")]
pub mod web;
