use crate::export::{export_filename, page_to_markdown};
use crate::models::{Page, Workspace};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the single file holding the whole workspace
pub const DATA_FILE_NAME: &str = "scriby-data.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid workspace data: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single slot holding the serialized workspace.
///
/// Every save writes the complete workspace; there are no partial updates.
pub trait Store {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<Workspace>, StoreError>;
    fn save(&mut self, workspace: &Workspace) -> Result<(), StoreError>;
}

/// Workspace stored as JSON in one file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store using the default file name inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(DATA_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Store for JsonFileStore {
    fn load(&self) -> Result<Option<Workspace>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let mut workspace: Workspace = serde_json::from_str(&content)?;
        workspace.normalize();
        Ok(Some(workspace))
    }

    fn save(&mut self, workspace: &Workspace) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(workspace)?;

        // Write-then-rename so a crash never leaves a half-written slot
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;
        log::debug!("Saved workspace to {}", self.path.display());
        Ok(())
    }
}

/// In-memory slot, used by tests and as a scratch store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Option<String>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the slot with raw serialized data
    pub fn with_data(data: impl Into<String>) -> Self {
        Self {
            data: Some(data.into()),
            saves: 0,
        }
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Number of completed writes
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<Option<Workspace>, StoreError> {
        let Some(data) = &self.data else {
            return Ok(None);
        };
        let mut workspace: Workspace = serde_json::from_str(data)?;
        workspace.normalize();
        Ok(Some(workspace))
    }

    fn save(&mut self, workspace: &Workspace) -> Result<(), StoreError> {
        self.data = Some(serde_json::to_string(workspace)?);
        self.saves += 1;
        Ok(())
    }
}

/// Load the stored workspace, falling back to the default one when the slot
/// is empty or unreadable.
pub fn load_or_default(store: &dyn Store) -> Workspace {
    match store.load() {
        Ok(Some(workspace)) => workspace,
        Ok(None) => {
            log::info!("No saved workspace found, starting with the default");
            Workspace::default()
        }
        Err(e) => {
            log::warn!("Failed to load workspace, starting with the default: {e}");
            Workspace::default()
        }
    }
}

/// Write `page` as Markdown into `dir`, returning the file path.
pub fn write_export(dir: &Path, page: &Page) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(&page.title));
    fs::write(&path, page_to_markdown(page))?;
    log::info!("Exported page to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Theme;
    use crate::tests::{create_test_data_dir, sample_workspace};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = create_test_data_dir();
        let store = JsonFileStore::in_dir(dir.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = create_test_data_dir();
        let mut store = JsonFileStore::in_dir(dir.path());
        let workspace = sample_workspace();

        store.save(&workspace).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded, workspace);
        assert!(!dir.path().join("scriby-data.json.tmp").exists());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = create_test_data_dir();
        let path = dir.path().join("nested").join("deeper").join(DATA_FILE_NAME);
        let mut store = JsonFileStore::new(&path);

        store.save(&Workspace::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_overwrites_whole_workspace() {
        let dir = create_test_data_dir();
        let mut store = JsonFileStore::in_dir(dir.path());
        let mut workspace = sample_workspace();
        store.save(&workspace).unwrap();

        workspace.toggle_theme();
        workspace.delete_page(1);
        store.save(&workspace).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.len(), workspace.len());
        assert_eq!(loaded.theme, Theme::Dark);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = create_test_data_dir();
        let path = dir.path().join(DATA_FILE_NAME);
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let corrupt = MemoryStore::with_data("[1, 2");
        assert_eq!(load_or_default(&corrupt).pages()[0].title, "Welcome");

        let empty = MemoryStore::new();
        assert_eq!(load_or_default(&empty).len(), 1);
    }

    #[test]
    fn test_legacy_browser_data_loads() {
        let json = r#"{
            "appName": "Scriby",
            "pages": [
                {"id": 1700000000000, "title": "Welcome", "content": "", "history": [], "historyIndex": 0},
                {"id": 1700000000001, "title": "Notes", "content": "a\nb", "parentId": 1700000000000}
            ],
            "currentPage": 1,
            "theme": "dark"
        }"#;
        let store = MemoryStore::with_data(json);
        let mut workspace = load_or_default(&store);

        assert_eq!(workspace.len(), 2);
        assert_eq!(workspace.current_index(), 1);
        assert_eq!(workspace.theme, Theme::Dark);

        let page = workspace.current_page_mut();
        assert!(page.ensure_blocks());
        assert_eq!(page.blocks.len(), 2);
        assert!(page.parent_id.is_some());
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let mut store = MemoryStore::new();
        store.save(&Workspace::default()).unwrap();
        store.save(&Workspace::default()).unwrap();
        assert_eq!(store.saves(), 2);
        assert!(store.data().unwrap().contains("\"appName\":\"Scriby\""));
    }

    #[test]
    fn test_write_export() {
        let dir = create_test_data_dir();
        let page = Page::from_content("Plan / Ideas", "<h1>Plan</h1><b>do</b> it");

        let path = write_export(dir.path(), &page).unwrap();

        assert_eq!(path.file_name().unwrap(), "Plan - Ideas.md");
        assert_eq!(fs::read_to_string(path).unwrap(), "# Plan\n**do** it");
    }
}
