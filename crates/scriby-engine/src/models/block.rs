use serde::{Deserialize, Serialize};

use crate::editing::inline::RichText;

/// Block kinds. Only plain text blocks exist today; formatting lives in the
/// block's markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    #[default]
    Text,
}

/// One editable unit of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type", default)]
    pub kind: BlockType,
    /// Inline markup, see [`RichText`] for the tags that are understood.
    #[serde(default)]
    pub html: String,
}

impl Block {
    pub fn text(html: impl Into<String>) -> Self {
        Self {
            kind: BlockType::Text,
            html: html.into(),
        }
    }

    pub fn empty() -> Self {
        Self::text("")
    }

    /// Visible text with all markup removed
    pub fn plain_text(&self) -> String {
        RichText::parse(&self.html).plain_text()
    }

    /// True when the block shows no text. Markup-only blocks, including line
    /// breaks, count as blank.
    pub fn is_blank(&self) -> bool {
        self.plain_text().chars().all(|c| c == '\n')
    }
}
