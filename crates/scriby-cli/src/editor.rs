//! Single-line text input with a selection and its own undo stack.
//!
//! Positions are character indices, matching the ranges the engine takes for
//! formatting commands.

use std::ops::Range;

const UNDO_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
struct State {
    text: String,
    cursor: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditKind {
    Insert,
    Delete,
    Other,
}

#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    text: String,
    cursor: usize,
    anchor: Option<usize>,
    undo: Vec<State>,
    redo: Vec<State>,
    last_edit: Option<EditKind>,
}

impl EditBuffer {
    /// Buffer holding `text` with the cursor at the end
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self {
            text,
            cursor,
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Selected character range, if non-empty
    pub fn selection(&self) -> Option<Range<usize>> {
        let anchor = self.anchor?;
        let range = anchor.min(self.cursor)..anchor.max(self.cursor);
        (!range.is_empty()).then_some(range)
    }

    fn byte_at(&self, index: usize) -> usize {
        self.text
            .char_indices()
            .nth(index)
            .map_or(self.text.len(), |(byte, _)| byte)
    }

    fn checkpoint(&mut self, kind: EditKind) {
        let coalesce = kind != EditKind::Other && self.last_edit == Some(kind);
        if !coalesce {
            self.undo.push(State {
                text: self.text.clone(),
                cursor: self.cursor,
            });
            if self.undo.len() > UNDO_LIMIT {
                self.undo.remove(0);
            }
        }
        self.redo.clear();
        self.last_edit = Some(kind);
    }

    fn delete_range(&mut self, range: Range<usize>) {
        let start = self.byte_at(range.start);
        let end = self.byte_at(range.end);
        self.text.replace_range(start..end, "");
        self.cursor = range.start;
        self.anchor = None;
    }

    pub fn insert_char(&mut self, c: char) {
        let kind = if c.is_whitespace() {
            EditKind::Other
        } else {
            EditKind::Insert
        };
        self.checkpoint(kind);
        if let Some(range) = self.selection() {
            self.delete_range(range);
        }
        let at = self.byte_at(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
        self.anchor = None;
    }

    /// Delete the selection or the character before the cursor.
    pub fn backspace(&mut self) -> bool {
        if let Some(range) = self.selection() {
            self.checkpoint(EditKind::Other);
            self.delete_range(range);
            return true;
        }
        if self.cursor == 0 {
            return false;
        }
        self.checkpoint(EditKind::Delete);
        self.delete_range(self.cursor - 1..self.cursor);
        true
    }

    /// Delete the selection or the character under the cursor.
    pub fn delete(&mut self) -> bool {
        if let Some(range) = self.selection() {
            self.checkpoint(EditKind::Other);
            self.delete_range(range);
            return true;
        }
        if self.cursor >= self.len() {
            return false;
        }
        self.checkpoint(EditKind::Delete);
        self.delete_range(self.cursor..self.cursor + 1);
        true
    }

    fn move_to(&mut self, index: usize, select: bool) {
        if select {
            self.anchor.get_or_insert(self.cursor);
        } else {
            self.anchor = None;
        }
        self.cursor = index.min(self.len());
        self.last_edit = None;
    }

    pub fn move_left(&mut self, select: bool) {
        self.move_to(self.cursor.saturating_sub(1), select);
    }

    pub fn move_right(&mut self, select: bool) {
        self.move_to(self.cursor + 1, select);
    }

    pub fn home(&mut self, select: bool) {
        self.move_to(0, select);
    }

    pub fn end(&mut self, select: bool) {
        self.move_to(self.len(), select);
    }

    pub fn select_all(&mut self) {
        self.anchor = Some(0);
        self.cursor = self.len();
    }

    pub fn undo(&mut self) -> bool {
        let Some(state) = self.undo.pop() else {
            return false;
        };
        self.redo.push(State {
            text: std::mem::replace(&mut self.text, state.text),
            cursor: self.cursor,
        });
        self.cursor = state.cursor;
        self.anchor = None;
        self.last_edit = None;
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(state) = self.redo.pop() else {
            return false;
        };
        self.undo.push(State {
            text: std::mem::replace(&mut self.text, state.text),
            cursor: self.cursor,
        });
        self.cursor = state.cursor;
        self.anchor = None;
        self.last_edit = None;
        true
    }
}
