use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use scriby_engine::keymap::{self, Action, KeyChord};
use scriby_engine::{FormatCommand, PageListEntry, Session, Store};
use std::path::PathBuf;
use std::time::Instant;

use crate::editor::EditBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Sidebar,
    Editor,
}

/// What a rename prompt commits to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameTarget {
    /// The page at this workspace index
    Page(usize),
    /// The workspace's app name
    Workspace,
}

#[derive(Debug, Clone)]
pub enum Mode {
    Normal,
    /// Editing the selected block's text
    Editing(EditBuffer),
    /// Typing into the search box
    Search,
    /// Typing a new page title or app name
    Rename(RenameTarget, EditBuffer),
    /// Asking before deleting the page at this workspace index
    ConfirmDelete(usize),
    /// Browsing the current page's history
    History { selected: usize },
}

pub struct App<S: Store> {
    pub session: Session<S>,
    pub mode: Mode,
    pub pane: Pane,
    pub search: String,
    /// Row in the filtered page list
    pub sidebar_selected: usize,
    pub block_selected: usize,
    pub sidebar_collapsed: bool,
    pub export_dir: PathBuf,
    pub should_quit: bool,
}

impl<S: Store> App<S> {
    pub fn new(session: Session<S>, export_dir: PathBuf) -> Self {
        let mut app = Self {
            session,
            mode: Mode::Normal,
            pane: Pane::Editor,
            search: String::new(),
            sidebar_selected: 0,
            block_selected: 0,
            sidebar_collapsed: false,
            export_dir,
            should_quit: false,
        };
        app.sync_sidebar();
        app
    }

    pub fn page_entries(&self) -> Vec<PageListEntry> {
        self.session.page_list(&self.search)
    }

    fn block_count(&self) -> usize {
        self.session.workspace().current_page().blocks.len()
    }

    /// Point the sidebar cursor at the current page when it is listed.
    fn sync_sidebar(&mut self) {
        let entries = self.page_entries();
        if let Some(row) = entries.iter().position(|e| e.is_current) {
            self.sidebar_selected = row;
        } else {
            self.sidebar_selected = self
                .sidebar_selected
                .min(entries.len().saturating_sub(1));
        }
    }

    fn clamp_block(&mut self) {
        self.block_selected = self
            .block_selected
            .min(self.block_count().saturating_sub(1));
    }

    fn page_changed(&mut self) {
        self.block_selected = 0;
        self.sync_sidebar();
    }

    fn selected_entry(&self) -> Option<PageListEntry> {
        self.page_entries().into_iter().nth(self.sidebar_selected)
    }

    fn block_text(&self, index: usize) -> String {
        self.session
            .workspace()
            .current_page()
            .blocks
            .get(index)
            .map(|block| block.plain_text())
            .unwrap_or_default()
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if ctrl
            && let KeyCode::Char(c) = key.code
            && let Some(action) = keymap::lookup(KeyChord {
                ctrl,
                shift: key.modifiers.contains(KeyModifiers::SHIFT),
                key: c,
            })
        {
            self.run_action(action, now);
            return;
        }

        match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Normal => self.handle_normal(key, now),
            Mode::Editing(buffer) => self.handle_editing(buffer, key, now),
            Mode::Search => self.handle_search(key),
            Mode::Rename(target, buffer) => self.handle_rename(target, buffer, key, now),
            Mode::ConfirmDelete(index) => {
                if key.code == KeyCode::Char('y') && self.session.delete_page(index, now) {
                    self.page_changed();
                }
            }
            Mode::History { selected } => self.handle_history(selected, key, now),
        }
    }

    fn run_action(&mut self, action: Action, now: Instant) {
        if let Some(command) = action.format_command() {
            self.format(command, now);
            return;
        }
        match action {
            Action::NewPage => {
                self.session.create_page(now);
                self.page_changed();
                self.pane = Pane::Editor;
                self.mode = Mode::Editing(EditBuffer::new(""));
            }
            Action::FocusSearch => {
                self.sidebar_collapsed = false;
                self.pane = Pane::Sidebar;
                self.mode = Mode::Search;
            }
            Action::Undo | Action::Redo => {
                if let Mode::Editing(buffer) = &mut self.mode {
                    let changed = if action == Action::Undo {
                        buffer.undo()
                    } else {
                        buffer.redo()
                    };
                    if changed {
                        let text = buffer.text().to_string();
                        self.session
                            .edit_block_text(self.block_selected, &text, now);
                    }
                }
            }
            Action::Save => match self.session.save_now(now) {
                Ok(()) => self
                    .session
                    .show_toast(scriby_engine::session::SAVED_MESSAGE, now),
                Err(e) => {
                    log::error!("Save failed: {e}");
                    self.session.show_toast(format!("Save failed: {e}"), now);
                }
            },
            Action::ToggleTheme => {
                self.session.toggle_theme(now);
            }
            Action::Export => {
                if let Err(e) = self.session.export_current(&self.export_dir, now) {
                    log::error!("Export failed: {e}");
                    self.session.show_toast(format!("Export failed: {e}"), now);
                }
            }
            Action::OpenHistory => {
                let len = self.session.history_entries().len();
                if len == 0 {
                    self.session.show_toast("No history yet", now);
                } else {
                    self.mode = Mode::History { selected: len - 1 };
                }
            }
            Action::CollapseSidebar => {
                self.sidebar_collapsed = !self.sidebar_collapsed;
                if self.sidebar_collapsed {
                    self.pane = Pane::Editor;
                }
            }
            Action::Bold | Action::Italic | Action::Underline | Action::ClearFormatting => {}
        }
    }

    /// Apply a formatting command to the selected block, limited to the
    /// editor selection when there is one.
    fn format(&mut self, command: FormatCommand, now: Instant) {
        let range = match &self.mode {
            Mode::Editing(buffer) => buffer.selection(),
            _ => None,
        };
        self.session
            .apply_format(self.block_selected, command, range, now);
    }

    fn start_editing(&mut self, index: usize) {
        self.block_selected = index;
        self.pane = Pane::Editor;
        self.mode = Mode::Editing(EditBuffer::new(self.block_text(index)));
    }

    fn handle_normal(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('/') => self.run_action(Action::FocusSearch, now),
            KeyCode::Tab => {
                self.pane = match self.pane {
                    Pane::Sidebar => Pane::Editor,
                    Pane::Editor if !self.sidebar_collapsed => Pane::Sidebar,
                    Pane::Editor => Pane::Editor,
                };
            }
            _ => match self.pane {
                Pane::Sidebar => self.handle_sidebar(key, now),
                Pane::Editor => self.handle_blocks(key, now),
            },
        }
    }

    fn handle_sidebar(&mut self, key: KeyEvent, now: Instant) {
        let entries = self.page_entries();
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Up | KeyCode::Char('K') if alt || key.code == KeyCode::Char('K') => {
                self.move_page(&entries, -1, now);
            }
            KeyCode::Down | KeyCode::Char('J') if alt || key.code == KeyCode::Char('J') => {
                self.move_page(&entries, 1, now);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.sidebar_selected = self.sidebar_selected.saturating_sub(1);
                self.open_selected_page(now);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.sidebar_selected + 1 < entries.len() {
                    self.sidebar_selected += 1;
                }
                self.open_selected_page(now);
            }
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => self.pane = Pane::Editor,
            KeyCode::Char('n') => self.run_action(Action::NewPage, now),
            KeyCode::Char('c') => {
                if let Some(entry) = self.selected_entry()
                    && self.session.duplicate_page(entry.index, now).is_some()
                {
                    self.page_changed();
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(entry) = self.selected_entry() {
                    if self.session.workspace().len() > 1 {
                        self.mode = Mode::ConfirmDelete(entry.index);
                    } else {
                        self.session.show_toast("Cannot delete the only page", now);
                    }
                }
            }
            KeyCode::Char('r') => {
                if let Some(entry) = self.selected_entry() {
                    let title = self
                        .session
                        .workspace()
                        .page(entry.index)
                        .map(|page| page.title.clone())
                        .unwrap_or_default();
                    self.mode = Mode::Rename(RenameTarget::Page(entry.index), EditBuffer::new(title));
                }
            }
            KeyCode::Char('R') => {
                let name = self.session.workspace().app_name.clone();
                self.mode = Mode::Rename(RenameTarget::Workspace, EditBuffer::new(name));
            }
            KeyCode::Esc => {
                self.search.clear();
                self.sync_sidebar();
            }
            _ => {}
        }
    }

    fn open_selected_page(&mut self, now: Instant) {
        if let Some(entry) = self.selected_entry()
            && !entry.is_current
            && self.session.set_current_page(entry.index, now)
        {
            self.block_selected = 0;
        }
    }

    /// Reorder within the visible list, swapping with the neighbouring row.
    fn move_page(&mut self, entries: &[PageListEntry], delta: isize, now: Instant) {
        let Some(from) = entries.get(self.sidebar_selected) else {
            return;
        };
        let Some(to) = self
            .sidebar_selected
            .checked_add_signed(delta)
            .and_then(|row| entries.get(row))
        else {
            return;
        };
        if self.session.reorder_pages(from.index, to.index, now) {
            self.sync_sidebar();
        }
    }

    fn handle_blocks(&mut self, key: KeyEvent, now: Instant) {
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let index = self.block_selected;
        match key.code {
            KeyCode::Up | KeyCode::Char('K') if alt || key.code == KeyCode::Char('K') => {
                if index > 0 && self.session.move_block(index, index - 1, now) {
                    self.block_selected -= 1;
                }
            }
            KeyCode::Down | KeyCode::Char('J') if alt || key.code == KeyCode::Char('J') => {
                if self.session.move_block(index, index + 1, now) {
                    self.block_selected += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.block_selected = index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.block_selected = index + 1;
                self.clamp_block();
            }
            KeyCode::Enter | KeyCode::Char('i') => self.start_editing(index),
            KeyCode::Char('o') => {
                if let Some(focus) = self.session.split_block(index, now) {
                    self.start_editing(focus);
                }
            }
            KeyCode::Backspace | KeyCode::Char('d') => {
                if let Some(focus) = self.session.remove_empty_block(index, now) {
                    self.block_selected = focus;
                }
            }
            KeyCode::Char('x') | KeyCode::Char(' ') => {
                self.format(FormatCommand::ToggleCheckbox, now);
            }
            KeyCode::Char('[') => self.format(FormatCommand::InsertCheckbox, now),
            KeyCode::Char('>') => self.format(FormatCommand::Blockquote, now),
            KeyCode::Char('`') => self.format(FormatCommand::InlineCode, now),
            KeyCode::Char('~') => self.format(FormatCommand::CodeBlock, now),
            KeyCode::Left | KeyCode::Char('h') if !self.sidebar_collapsed => {
                self.pane = Pane::Sidebar;
            }
            _ => {}
        }
    }

    fn handle_editing(&mut self, mut buffer: EditBuffer, key: KeyEvent, now: Instant) {
        let index = self.block_selected;
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let mut changed = false;

        match key.code {
            KeyCode::Esc => return,
            KeyCode::Enter if shift || alt => {
                buffer.insert_char('\n');
                changed = true;
            }
            KeyCode::Enter => {
                if let Some(focus) = self.session.split_block(index, now) {
                    self.start_editing(focus);
                    return;
                }
            }
            KeyCode::Backspace if buffer.is_empty() => {
                if let Some(focus) = self.session.remove_empty_block(index, now) {
                    self.start_editing(focus);
                    return;
                }
            }
            KeyCode::Backspace => changed = buffer.backspace(),
            KeyCode::Delete => changed = buffer.delete(),
            KeyCode::Left => buffer.move_left(shift),
            KeyCode::Right => buffer.move_right(shift),
            KeyCode::Home => buffer.home(shift),
            KeyCode::End => buffer.end(shift),
            KeyCode::Up if alt => {
                if index > 0 && self.session.move_block(index, index - 1, now) {
                    self.block_selected -= 1;
                }
            }
            KeyCode::Down if alt => {
                if self.session.move_block(index, index + 1, now) {
                    self.block_selected += 1;
                }
            }
            KeyCode::Up => {
                if index > 0 {
                    self.start_editing(index - 1);
                    return;
                }
            }
            KeyCode::Down => {
                if index + 1 < self.block_count() {
                    self.start_editing(index + 1);
                    return;
                }
            }
            KeyCode::Char('a') if ctrl => buffer.select_all(),
            KeyCode::Char(c) if !ctrl => {
                buffer.insert_char(c);
                changed = true;
            }
            _ => {}
        }

        if changed {
            self.session
                .edit_block_text(self.block_selected, buffer.text(), now);
        }
        self.mode = Mode::Editing(buffer);
    }

    fn handle_search(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.search.clear();
                self.sync_sidebar();
                return;
            }
            KeyCode::Enter => return,
            KeyCode::Backspace => {
                self.search.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.search.push(c);
            }
            _ => {}
        }
        self.sync_sidebar();
        self.mode = Mode::Search;
    }

    fn handle_rename(
        &mut self,
        target: RenameTarget,
        mut buffer: EditBuffer,
        key: KeyEvent,
        now: Instant,
    ) {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return,
            KeyCode::Enter => {
                match target {
                    RenameTarget::Page(index) => {
                        self.session.rename_page(index, buffer.text(), now);
                        self.sync_sidebar();
                    }
                    RenameTarget::Workspace => self.session.set_app_name(buffer.text(), now),
                }
                return;
            }
            KeyCode::Backspace => {
                buffer.backspace();
            }
            KeyCode::Delete => {
                buffer.delete();
            }
            KeyCode::Left => buffer.move_left(shift),
            KeyCode::Right => buffer.move_right(shift),
            KeyCode::Home => buffer.home(shift),
            KeyCode::End => buffer.end(shift),
            KeyCode::Char('a') if ctrl => buffer.select_all(),
            KeyCode::Char(c) if !ctrl => buffer.insert_char(c),
            _ => {}
        }
        self.mode = Mode::Rename(target, buffer);
    }

    fn handle_history(&mut self, selected: usize, key: KeyEvent, now: Instant) {
        let len = self.session.history_entries().len();
        let selected = match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return,
            KeyCode::Up | KeyCode::Char('k') => selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => (selected + 1).min(len.saturating_sub(1)),
            KeyCode::Enter => {
                if self.session.restore(selected, now) {
                    self.clamp_block();
                    self.session
                        .show_toast(format!("Restored version {}", selected + 1), now);
                }
                return;
            }
            _ => selected,
        };
        self.mode = Mode::History { selected };
    }
}
