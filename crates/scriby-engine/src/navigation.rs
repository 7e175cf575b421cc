use crate::models::{UNTITLED, Workspace};

/// A row in the sidebar page list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageListEntry {
    /// Position of the page in the workspace, valid for model operations
    pub index: usize,
    pub title: String,
    pub is_current: bool,
    /// Page has a parent and is drawn indented
    pub is_nested: bool,
}

/// Pages whose titles contain `filter` (case-insensitive), in workspace
/// order. An empty filter lists every page.
pub fn page_list(workspace: &Workspace, filter: &str) -> Vec<PageListEntry> {
    let needle = filter.to_lowercase();
    workspace
        .pages()
        .iter()
        .enumerate()
        .filter(|(_, page)| needle.is_empty() || page.title.to_lowercase().contains(&needle))
        .map(|(index, page)| PageListEntry {
            index,
            title: if page.title.is_empty() {
                UNTITLED.to_string()
            } else {
                page.title.clone()
            },
            is_current: index == workspace.current_index(),
            is_nested: page.parent_id.is_some(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Page;
    use pretty_assertions::assert_eq;

    fn workspace() -> Workspace {
        let mut nested = Page::new("Meeting Notes");
        let mut pages = vec![Page::new("Welcome"), Page::new("Shopping")];
        nested.parent_id = Some(pages[0].id);
        pages.push(nested);
        pages.push(Page::new(""));
        Workspace::with_pages(pages)
    }

    fn titles(entries: &[PageListEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.title.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_lists_all_in_order() {
        let entries = page_list(&workspace(), "");
        assert_eq!(
            titles(&entries),
            vec!["Welcome", "Shopping", "Meeting Notes", "Untitled"]
        );
        assert!(entries[0].is_current);
        assert!(!entries[1].is_current);
        assert!(entries[2].is_nested);
        assert!(!entries[0].is_nested);
    }

    #[test]
    fn test_filter_is_case_insensitive_and_keeps_indices() {
        let entries = page_list(&workspace(), "NOTES");
        assert_eq!(titles(&entries), vec!["Meeting Notes"]);
        assert_eq!(entries[0].index, 2);
    }

    #[test]
    fn test_filter_matches_substrings() {
        let entries = page_list(&workspace(), "o");
        assert_eq!(titles(&entries), vec!["Welcome", "Shopping", "Meeting Notes"]);
    }

    #[test]
    fn test_filter_without_matches() {
        assert!(page_list(&workspace(), "zzz").is_empty());
    }

    #[test]
    fn test_current_marker_follows_workspace() {
        let mut ws = workspace();
        ws.set_current_page(1);
        let current: Vec<usize> = page_list(&ws, "")
            .iter()
            .filter(|e| e.is_current)
            .map(|e| e.index)
            .collect();
        assert_eq!(current, vec![1]);
    }
}
