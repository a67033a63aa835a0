// SideMarks services
// Services hold the page and background logic: reconciliation, watching, feedback, the list viewer and command dispatch.

pub mod command_dispatcher;
#[cfg(not(target_arch = "wasm32"))]
pub mod control_surface;
pub mod feedback;
pub mod list_viewer;
pub mod page_watcher;
pub mod reconciler;
#[cfg(not(target_arch = "wasm32"))]
pub mod settings_engine;
