// SideMarks state managers
// Managers own the persisted state: the bookmark mapping and the keyboard bindings.

pub mod bookmark_manager;
pub mod bookmark_repository;
pub mod shortcut_manager;
