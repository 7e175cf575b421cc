use serde::{Deserialize, Serialize};

use crate::history::History;
use crate::models::{Block, PageId};

/// One document: a title, an ordered block list and its version history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub id: PageId,
    #[serde(default)]
    pub title: String,
    /// Flattened markup: every block's markup joined with `\n`.
    ///
    /// Older data only has this field; [`Page::ensure_blocks`] derives the
    /// block list from it.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(flatten)]
    pub history: History,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<PageId>,
}

impl Page {
    /// A fresh page with one empty text block and no history
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: PageId::new(),
            title: title.into(),
            content: String::new(),
            blocks: vec![Block::empty()],
            history: History::new(),
            parent_id: None,
        }
    }

    /// Build a page from flattened content, one block per line.
    pub fn from_content(title: impl Into<String>, content: impl Into<String>) -> Self {
        let mut page = Self {
            content: content.into(),
            blocks: Vec::new(),
            ..Self::new(title)
        };
        page.ensure_blocks();
        page
    }

    /// Deep copy with a fresh id and a " (Copy)" title suffix
    pub fn duplicate(&self) -> Self {
        Self {
            id: PageId::new(),
            title: format!("{} (Copy)", self.title),
            ..self.clone()
        }
    }

    /// Migrate legacy pages that only carry flattened `content`.
    ///
    /// Returns true when the block list was (re)built. Pages that already have
    /// blocks are left alone.
    pub fn ensure_blocks(&mut self) -> bool {
        if !self.blocks.is_empty() {
            return false;
        }
        self.blocks = blocks_from_content(&self.content);
        true
    }

    /// Seed the history of a page that has content but no snapshots yet.
    pub fn ensure_history(&mut self, ts: i64) -> bool {
        if !self.history.is_empty() || self.content.is_empty() {
            self.history.clamp_index();
            return false;
        }
        self.history.record(&self.content, ts)
    }

    /// Recompute `content` from the block list.
    pub fn sync_content(&mut self) {
        self.content = self
            .blocks
            .iter()
            .map(|block| block.html.as_str())
            .collect::<Vec<_>>()
            .join("\n");
    }

    /// Snapshot the current flattened content if it changed.
    pub fn record_snapshot(&mut self, ts: i64) -> bool {
        self.history.record(&self.content, ts)
    }

    /// Replace the live content with history entry `index`.
    ///
    /// The block list is rebuilt from the restored content. Later entries are
    /// kept and the restore itself is not recorded.
    pub fn restore(&mut self, index: usize) -> bool {
        let Some(snapshot) = self.history.get(index) else {
            return false;
        };
        self.content = snapshot.content.clone();
        self.blocks = blocks_from_content(&self.content);
        self.history.select(index)
    }
}

fn blocks_from_content(content: &str) -> Vec<Block> {
    if content.is_empty() {
        return vec![Block::empty()];
    }
    content.split('\n').map(Block::text).collect()
}
