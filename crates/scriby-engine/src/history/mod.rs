//! Per-page version history.
//!
//! Every time a page's flattened content changes, a [`Snapshot`] of the full
//! content is appended. The log is bounded: once it holds more than
//! [`HISTORY_CAPACITY`] entries the oldest one is dropped.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum number of snapshots kept per page
pub const HISTORY_CAPACITY: usize = 50;

/// One recorded state of a page's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub content: String,
    /// Milliseconds since the Unix epoch
    pub ts: i64,
}

/// A displayable history row, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// 1-based position in the log
    pub ordinal: usize,
    pub ts: i64,
    pub label: String,
}

/// Bounded snapshot log.
///
/// Serialized as the `history` and `historyIndex` fields of the owning page.
/// A missing `historyIndex` means the newest entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    #[serde(rename = "history", default)]
    entries: VecDeque<Snapshot>,
    #[serde(rename = "historyIndex", default, skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `content` unless it equals the newest snapshot.
    ///
    /// Returns true when a snapshot was appended. The index always ends up
    /// pointing at the newest entry.
    pub fn record(&mut self, content: &str, ts: i64) -> bool {
        let changed = self
            .entries
            .back()
            .is_none_or(|last| last.content != content);

        if changed {
            self.entries.push_back(Snapshot {
                content: content.to_string(),
                ts,
            });
            while self.entries.len() > HISTORY_CAPACITY {
                self.entries.pop_front();
            }
        }

        self.index = Some(self.newest());
        changed
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.entries.get(index)
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.entries.back()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the entry the page content was last recorded or restored from
    pub fn index(&self) -> usize {
        self.index.unwrap_or_else(|| self.newest())
    }

    fn newest(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    /// Point the index at `index` without touching the log.
    pub(crate) fn select(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        self.index = Some(index);
        true
    }

    /// Keep the index inside the log after loading hand-edited or old data.
    pub(crate) fn clamp_index(&mut self) {
        let newest = self.newest();
        if let Some(index) = &mut self.index {
            *index = (*index).min(newest);
        }
    }

    pub fn list_entries(&self) -> Vec<HistoryEntry> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, snapshot)| HistoryEntry {
                ordinal: i + 1,
                ts: snapshot.ts,
                label: format!("Version {} – {}", i + 1, format_timestamp(snapshot.ts)),
            })
            .collect()
    }
}

/// Render epoch milliseconds as local wall-clock time
pub fn format_timestamp(ts: i64) -> String {
    match DateTime::from_timestamp_millis(ts) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => ts.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_appends_changed_content() {
        let mut history = History::new();
        assert!(history.record("a", 1));
        assert!(history.record("b", 2));
        assert_eq!(history.len(), 2);
        assert_eq!(history.index(), 1);
        assert_eq!(history.latest().unwrap().content, "b");
    }

    #[test]
    fn test_unchanged_content_does_not_grow_log() {
        let mut history = History::new();
        history.record("same", 1);
        assert!(!history.record("same", 2));
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().ts, 1);
    }

    #[test]
    fn test_empty_history_records_empty_content() {
        let mut history = History::new();
        assert!(history.record("", 1));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::new();
        for i in 0..(HISTORY_CAPACITY + 7) {
            history.record(&format!("v{i}"), i as i64);
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.get(0).unwrap().content, "v7");
        assert_eq!(
            history.latest().unwrap().content,
            format!("v{}", HISTORY_CAPACITY + 6)
        );
        assert_eq!(history.index(), HISTORY_CAPACITY - 1);
    }

    #[test]
    fn test_select_rejects_out_of_range() {
        let mut history = History::new();
        history.record("a", 1);
        history.record("b", 2);
        assert!(history.select(0));
        assert_eq!(history.index(), 0);
        assert!(!history.select(2));
        assert_eq!(history.index(), 0);
    }

    #[test]
    fn test_clamp_index() {
        let mut history: History =
            serde_json::from_str(r#"{"history":[{"content":"a","ts":1}],"historyIndex":9}"#)
                .unwrap();
        history.clamp_index();
        assert_eq!(history.index(), 0);

        let mut empty = History::new();
        empty.clamp_index();
        assert_eq!(empty.index(), 0);
    }

    #[test]
    fn test_missing_index_points_at_newest() {
        let json = r#"{"history":[{"content":"a","ts":1},{"content":"b","ts":2},{"content":"c","ts":3}]}"#;
        let mut history: History = serde_json::from_str(json).unwrap();
        assert_eq!(history.index(), 2);
        history.clamp_index();
        assert_eq!(history.index(), 2);

        history.record("d", 4);
        let saved = serde_json::to_string(&history).unwrap();
        assert!(saved.contains(r#""historyIndex":3"#));
    }

    #[test]
    fn test_list_entries_oldest_first() {
        let mut history = History::new();
        history.record("a", 1_700_000_000_000);
        history.record("b", 1_700_000_060_000);

        let entries = history.list_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ordinal, 1);
        assert_eq!(entries[1].ordinal, 2);
        assert!(entries[0].label.starts_with("Version 1 – "));
        assert!(entries[1].label.starts_with("Version 2 – "));
        assert!(entries[0].ts < entries[1].ts);
    }

    #[test]
    fn test_format_timestamp_shape() {
        let formatted = format_timestamp(1_700_000_000_000);
        assert_eq!(formatted.len(), "2023-11-14 22:13:20".len());
        assert!(formatted.starts_with("2023-11-1"));
    }
}
