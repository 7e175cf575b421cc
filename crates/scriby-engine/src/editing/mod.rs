/*!
 * # Block editor
 *
 * A page's content is an ordered list of [`Block`](crate::models::Block)s,
 * each holding inline markup. Editing happens at two levels:
 *
 * - **Block level** ([`blocks`]): edit, split on Enter, remove on Backspace
 *   in an empty block, move. These are `Page` methods that keep the page's
 *   flattened `content` in sync.
 * - **Inline level** ([`inline`]): formatting commands are applied to a
 *   parsed [`RichText`] and serialized back to canonical markup, so the model
 *   never depends on a host rich-text widget. Typed text is spliced into the
 *   existing markup instead, so headings and lists survive editing.
 *
 * [`highlight`] decorates rendered markup with search markers without ever
 * writing them into the stored blocks.
 *
 * ```rust
 * use scriby_engine::{FormatCommand, Page};
 *
 * let mut page = Page::from_content("Notes", "first line");
 * let focus = page.split_block(0).unwrap();
 * page.edit_block_text(focus, "second line");
 * page.apply_format(focus, FormatCommand::Bold, None);
 *
 * assert_eq!(page.content, "first line\n<b>second line</b>");
 * ```
 */

pub mod blocks;
pub mod highlight;
pub mod inline;

pub use blocks::RenderedBlock;
pub use highlight::{HIGHLIGHT_CLOSE, HIGHLIGHT_OPEN, find_matches, highlight, strip_highlights};
pub use inline::{BlockStyle, FormatCommand, InlineSpan, Mark, Marks, RichText, replace_text};
