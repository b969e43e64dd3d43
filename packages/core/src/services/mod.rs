//! Editing services built on the tree model.

pub mod editor;
pub mod history;

pub use editor::{EditorEvent, MapEditor};
pub use history::HistoryManager;
