//! The session controller.
//!
//! A [`Session`] owns the workspace, the store it persists to and the timers
//! that debounce saving and drive the status line. Front ends hold one
//! session and call into it from their event handlers; nothing else mutates
//! the workspace.
//!
//! Time is passed in explicitly (`now: Instant`) so the event loop decides
//! when timers are checked: call [`Session::tick`] on every loop iteration
//! and sleep no longer than [`Session::next_deadline`].

pub mod timer;

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::editing::{FormatCommand, RenderedBlock};
use crate::history::HistoryEntry;
use crate::io::{Store, StoreError, load_or_default, write_export};
use crate::models::{Theme, Workspace};
use crate::navigation::{PageListEntry, page_list};

pub use timer::Timer;

pub const SAVED_MESSAGE: &str = "All changes saved";
pub const DUPLICATED_MESSAGE: &str = "Page duplicated";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Quiet period after the last edit before the workspace is written
    pub autosave_delay: Duration,
    /// How long the "saving" indicator stays up after a write
    pub saving_indicator: Duration,
    /// How long a toast message is shown
    pub toast_duration: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            autosave_delay: Duration::from_millis(400),
            saving_indicator: Duration::from_millis(600),
            toast_duration: Duration::from_millis(2000),
        }
    }
}

/// Wall clock in epoch milliseconds, used to timestamp snapshots
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct Session<S: Store> {
    workspace: Workspace,
    store: S,
    autosave: Timer,
    saving_indicator: Timer,
    toast_timer: Timer,
    toast: Option<String>,
    dirty: bool,
    clock: fn() -> i64,
}

impl<S: Store> Session<S> {
    /// Open the workspace held by `store`, or the default one.
    pub fn open(store: S, options: SessionOptions) -> Self {
        let workspace = load_or_default(&store);
        Self::with_workspace(workspace, store, options)
    }

    pub fn with_workspace(workspace: Workspace, store: S, options: SessionOptions) -> Self {
        let mut session = Self {
            workspace,
            store,
            autosave: Timer::new("autosave", options.autosave_delay),
            saving_indicator: Timer::new("saving-indicator", options.saving_indicator),
            toast_timer: Timer::new("toast", options.toast_duration),
            toast: None,
            dirty: false,
            clock: now_millis,
        };
        session.prepare_current_page();
        session
    }

    /// Replace the snapshot clock (epoch milliseconds).
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_saving(&self) -> bool {
        self.saving_indicator.is_pending()
    }

    pub fn toast(&self) -> Option<&str> {
        self.toast.as_deref()
    }

    /// Earliest pending timer deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        [&self.autosave, &self.saving_indicator, &self.toast_timer]
            .into_iter()
            .filter_map(Timer::deadline)
            .min()
    }

    /// Fire due timers. Returns true when visible state changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;

        if self.autosave.fire(now) {
            match self.flush(now) {
                Ok(()) => self.show_toast(SAVED_MESSAGE, now),
                Err(e) => {
                    log::error!("Autosave failed: {e}");
                    self.show_toast(format!("Save failed: {e}"), now);
                }
            }
            changed = true;
        }
        if self.saving_indicator.fire(now) {
            changed = true;
        }
        if self.toast_timer.fire(now) {
            self.toast = None;
            changed = true;
        }

        changed
    }

    /// Write immediately, dropping any pending autosave.
    pub fn save_now(&mut self, now: Instant) -> Result<(), StoreError> {
        self.autosave.cancel();
        self.flush(now)
    }

    fn flush(&mut self, now: Instant) -> Result<(), StoreError> {
        self.saving_indicator.schedule(now);
        self.store.save(&self.workspace)?;
        self.dirty = false;
        Ok(())
    }

    pub fn show_toast(&mut self, message: impl Into<String>, now: Instant) {
        self.toast = Some(message.into());
        self.toast_timer.schedule(now);
    }

    fn mark_dirty(&mut self, now: Instant) {
        self.dirty = true;
        self.autosave.schedule(now);
    }

    /// Migrate the current page if needed before it is shown.
    fn prepare_current_page(&mut self) -> bool {
        let ts = (self.clock)();
        let page = self.workspace.current_page_mut();
        let migrated = page.ensure_blocks();
        page.ensure_history(ts) || migrated
    }

    fn after_navigation(&mut self, now: Instant) {
        self.prepare_current_page();
        self.mark_dirty(now);
    }

    /// Record a snapshot of the current page and schedule a save.
    fn after_content_change(&mut self, now: Instant) {
        let ts = (self.clock)();
        self.workspace.current_page_mut().record_snapshot(ts);
        self.mark_dirty(now);
    }

    // Pages

    pub fn page_list(&self, filter: &str) -> Vec<PageListEntry> {
        page_list(&self.workspace, filter)
    }

    pub fn create_page(&mut self, now: Instant) -> usize {
        let index = self.workspace.create_page();
        log::debug!("Created page {index}");
        self.after_navigation(now);
        index
    }

    pub fn duplicate_page(&mut self, index: usize, now: Instant) -> Option<usize> {
        let copy = self.workspace.duplicate_page(index)?;
        self.after_navigation(now);
        self.show_toast(DUPLICATED_MESSAGE, now);
        Some(copy)
    }

    pub fn delete_page(&mut self, index: usize, now: Instant) -> bool {
        if !self.workspace.delete_page(index) {
            log::debug!("Refused to delete page {index}");
            return false;
        }
        self.after_navigation(now);
        true
    }

    pub fn reorder_pages(&mut self, from: usize, to: usize, now: Instant) -> bool {
        if !self.workspace.reorder_pages(from, to) {
            return false;
        }
        self.after_navigation(now);
        true
    }

    pub fn rename_page(&mut self, index: usize, title: &str, now: Instant) -> bool {
        if !self.workspace.rename_page(index, title) {
            return false;
        }
        self.mark_dirty(now);
        true
    }

    pub fn set_current_page(&mut self, index: usize, now: Instant) -> bool {
        if !self.workspace.set_current_page(index) {
            return false;
        }
        self.after_navigation(now);
        true
    }

    pub fn select_theme(&mut self, theme: Theme, now: Instant) {
        self.workspace.select_theme(theme);
        self.mark_dirty(now);
    }

    pub fn toggle_theme(&mut self, now: Instant) -> Theme {
        let theme = self.workspace.toggle_theme();
        self.mark_dirty(now);
        theme
    }

    pub fn set_app_name(&mut self, name: &str, now: Instant) {
        self.workspace.set_app_name(name);
        self.mark_dirty(now);
    }

    // Blocks of the current page

    pub fn render_blocks(&mut self, query: &str) -> Vec<RenderedBlock> {
        self.workspace.current_page_mut().render_blocks(query)
    }

    pub fn edit_block(&mut self, index: usize, markup: &str, now: Instant) -> bool {
        if !self.workspace.current_page_mut().edit_block(index, markup) {
            return false;
        }
        self.after_content_change(now);
        true
    }

    pub fn edit_block_text(&mut self, index: usize, text: &str, now: Instant) -> bool {
        if !self.workspace.current_page_mut().edit_block_text(index, text) {
            return false;
        }
        self.after_content_change(now);
        true
    }

    pub fn split_block(&mut self, index: usize, now: Instant) -> Option<usize> {
        let focus = self.workspace.current_page_mut().split_block(index)?;
        self.after_content_change(now);
        Some(focus)
    }

    pub fn remove_empty_block(&mut self, index: usize, now: Instant) -> Option<usize> {
        let focus = self.workspace.current_page_mut().remove_empty_block(index)?;
        self.after_content_change(now);
        Some(focus)
    }

    pub fn move_block(&mut self, from: usize, to: usize, now: Instant) -> bool {
        if !self.workspace.current_page_mut().move_block(from, to) {
            return false;
        }
        self.after_content_change(now);
        true
    }

    pub fn apply_format(
        &mut self,
        index: usize,
        command: FormatCommand,
        range: Option<Range<usize>>,
        now: Instant,
    ) -> bool {
        if !self
            .workspace
            .current_page_mut()
            .apply_format(index, command, range)
        {
            return false;
        }
        self.after_content_change(now);
        true
    }

    // History of the current page

    pub fn history_entries(&self) -> Vec<HistoryEntry> {
        self.workspace.current_page().history.list_entries()
    }

    /// Restore history entry `index` of the current page. Not recorded as a
    /// new snapshot; the content being replaced is already the newest entry.
    pub fn restore(&mut self, index: usize, now: Instant) -> bool {
        if !self.workspace.current_page_mut().restore(index) {
            return false;
        }
        self.mark_dirty(now);
        true
    }

    // Export

    pub fn export_current(&mut self, dir: &Path, now: Instant) -> Result<PathBuf, StoreError> {
        let path = write_export(dir, self.workspace.current_page())?;
        self.show_toast(format!("Exported to {}", path.display()), now);
        Ok(path)
    }
}
