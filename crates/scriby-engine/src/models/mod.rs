pub mod block;
pub mod page;
pub mod page_id;
pub mod workspace;

pub use block::{Block, BlockType};
pub use page::Page;
pub use page_id::PageId;
pub use workspace::{DEFAULT_APP_NAME, Theme, UNTITLED, WELCOME_TITLE, Workspace};
