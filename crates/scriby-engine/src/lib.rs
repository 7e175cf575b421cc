pub mod editing;
pub mod export;
pub mod history;
pub mod io;
pub mod keymap;
pub mod models;
pub mod navigation;
pub mod session;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::*;
pub use history::{History, HistoryEntry, Snapshot};
pub use io::*;
pub use models::*;
pub use navigation::{PageListEntry, page_list};
pub use session::{Session, SessionOptions};
