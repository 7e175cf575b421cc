use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::Page;

pub const DEFAULT_APP_NAME: &str = "Scriby";
pub const UNTITLED: &str = "Untitled";
pub const WELCOME_TITLE: &str = "Welcome";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// The whole persisted application state.
///
/// Invariants: `pages` is never empty and `current_page` always indexes into
/// it. Every mutator below keeps both; operations that would break them are
/// no-ops and report `false`/`None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pages: Vec<Page>,
    #[serde(default)]
    current_page: usize,
    #[serde(default)]
    pub theme: Theme,
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            pages: vec![Page::new(WELCOME_TITLE)],
            current_page: 0,
            theme: Theme::Light,
        }
    }
}

impl Workspace {
    /// Build a workspace from existing pages. An empty list gets the default
    /// welcome page.
    pub fn with_pages(pages: Vec<Page>) -> Self {
        let mut workspace = Self {
            pages,
            ..Self::default()
        };
        workspace.normalize();
        workspace
    }

    /// Repair invariants after deserializing data we did not write ourselves.
    pub fn normalize(&mut self) {
        if self.pages.is_empty() {
            log::warn!("Workspace has no pages, adding default page");
            self.pages.push(Page::new(WELCOME_TITLE));
        }
        if self.current_page >= self.pages.len() {
            self.current_page = self.pages.len() - 1;
        }
        for page in &mut self.pages {
            page.history.clamp_index();
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_page
    }

    pub fn current_page(&self) -> &Page {
        &self.pages[self.current_page]
    }

    pub fn current_page_mut(&mut self) -> &mut Page {
        &mut self.pages[self.current_page]
    }

    pub fn set_current_page(&mut self, index: usize) -> bool {
        if index >= self.pages.len() {
            return false;
        }
        self.current_page = index;
        true
    }

    /// Append a page named after the first free "Untitled" title and make it
    /// current. Returns its index.
    pub fn create_page(&mut self) -> usize {
        let title = self.next_untitled_title();
        self.pages.push(Page::new(title));
        self.current_page = self.pages.len() - 1;
        self.current_page
    }

    /// Insert a deep copy of page `index` right after it and make it current.
    pub fn duplicate_page(&mut self, index: usize) -> Option<usize> {
        let copy = self.pages.get(index)?.duplicate();
        self.pages.insert(index + 1, copy);
        self.current_page = index + 1;
        Some(self.current_page)
    }

    /// Remove page `index`. Refused when it is the last remaining page.
    ///
    /// The current index only moves when it falls off the end of the list.
    pub fn delete_page(&mut self, index: usize) -> bool {
        if self.pages.len() <= 1 || index >= self.pages.len() {
            return false;
        }
        self.pages.remove(index);
        if self.current_page >= self.pages.len() {
            self.current_page = self.pages.len() - 1;
        }
        true
    }

    /// Move page `from` to position `to`; the moved page becomes current.
    pub fn reorder_pages(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= self.pages.len() || to >= self.pages.len() {
            return false;
        }
        let moved = self.pages.remove(from);
        self.pages.insert(to, moved);
        self.current_page = to;
        true
    }

    /// Commit a new title, trimmed, falling back to "Untitled" when blank.
    pub fn rename_page(&mut self, index: usize, title: &str) -> bool {
        let Some(page) = self.pages.get_mut(index) else {
            return false;
        };
        let trimmed = title.trim();
        page.title = if trimmed.is_empty() {
            UNTITLED.to_string()
        } else {
            trimmed.to_string()
        };
        true
    }

    pub fn select_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn set_app_name(&mut self, name: &str) {
        let trimmed = name.trim();
        self.app_name = if trimmed.is_empty() {
            default_app_name()
        } else {
            trimmed.to_string()
        };
    }

    fn next_untitled_title(&self) -> String {
        let taken: HashSet<&str> = self.pages.iter().map(|p| p.title.as_str()).collect();
        if !taken.contains(UNTITLED) {
            return UNTITLED.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{UNTITLED} {n}");
            if !taken.contains(candidate.as_str()) {
                return candidate;
            }
            n += 1;
        }
    }
}
