//! Block-level editing on a page.
//!
//! Each operation mirrors one editor event (typing, Enter, Backspace on an
//! empty block, a move) and keeps `Page::content` in sync with the block
//! list. Operations that cannot apply return `None`/`false` and leave the
//! page untouched. Recording history is left to the caller.

use std::ops::Range;

use crate::editing::highlight::{find_matches, highlight, strip_highlights};
use crate::editing::inline::{FormatCommand, RichText, replace_text};
use crate::models::{Block, Page};

/// One row of the rendered editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    pub index: usize,
    /// Block markup with search highlights applied
    pub markup: String,
    pub rich: RichText,
    /// Search hits as character ranges of the block's plain text
    pub matches: Vec<Range<usize>>,
}

impl Page {
    /// Replace block `index`'s markup with what the user typed.
    pub fn edit_block(&mut self, index: usize, markup: &str) -> bool {
        let Some(block) = self.blocks.get_mut(index) else {
            return false;
        };
        // Literal newlines would split the block when content is flattened
        let markup = strip_highlights(markup).replace('\n', "<br>");
        if block.html == markup {
            return false;
        }
        block.html = markup;
        self.sync_content();
        true
    }

    /// Replace block `index`'s visible text. Tags around the parts that did
    /// not change are kept as they are.
    pub fn edit_block_text(&mut self, index: usize, text: &str) -> bool {
        let Some(block) = self.blocks.get_mut(index) else {
            return false;
        };
        let Some(markup) = replace_text(&block.html, text) else {
            return false;
        };
        block.html = markup;
        self.sync_content();
        true
    }

    /// Enter: insert an empty block after `index`. Returns the index to focus.
    pub fn split_block(&mut self, index: usize) -> Option<usize> {
        if index >= self.blocks.len() {
            return None;
        }
        self.blocks.insert(index + 1, Block::empty());
        self.sync_content();
        Some(index + 1)
    }

    /// Backspace on an empty block: remove it unless it is the only one.
    /// Returns the index to focus.
    pub fn remove_empty_block(&mut self, index: usize) -> Option<usize> {
        if self.blocks.len() <= 1 || !self.blocks.get(index)?.is_blank() {
            return None;
        }
        self.blocks.remove(index);
        self.sync_content();
        Some(index.saturating_sub(1))
    }

    /// Move block `from` to position `to`.
    pub fn move_block(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= self.blocks.len() || to >= self.blocks.len() {
            return false;
        }
        let moved = self.blocks.remove(from);
        self.blocks.insert(to, moved);
        self.sync_content();
        true
    }

    /// Apply a formatting command to block `index` over a character range
    /// (`None` for the whole block).
    pub fn apply_format(
        &mut self,
        index: usize,
        command: FormatCommand,
        range: Option<Range<usize>>,
    ) -> bool {
        let Some(block) = self.blocks.get_mut(index) else {
            return false;
        };
        let mut rich = RichText::parse(&block.html);
        if !rich.apply(command, range) {
            return false;
        }
        let markup = rich.to_markup();
        if markup == block.html {
            return false;
        }
        block.html = markup;
        self.sync_content();
        true
    }

    /// Rows for the editor view, migrating legacy pages on first render.
    pub fn render_blocks(&mut self, query: &str) -> Vec<RenderedBlock> {
        if self.ensure_blocks() {
            log::debug!("Migrated page {} to blocks", self.id);
        }
        self.blocks
            .iter()
            .enumerate()
            .map(|(index, block)| {
                let rich = RichText::parse(&block.html);
                RenderedBlock {
                    index,
                    markup: highlight(&block.html, query),
                    matches: find_matches(&rich.plain_text(), query),
                    rich,
                }
            })
            .collect()
    }
}
