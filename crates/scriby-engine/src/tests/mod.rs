use crate::models::{Page, Workspace};
use tempfile::TempDir;


/// Fixed snapshot timestamp for deterministic tests
pub const TEST_TS: i64 = 1_700_000_000_000;

/// Create a temporary directory to hold workspace data
pub fn create_test_data_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// A workspace with a few pages, formatted content and history
pub fn sample_workspace() -> Workspace {
    let mut welcome = Page::from_content("Welcome", "<b>Hello</b> there\nsecond line");
    welcome.record_snapshot(TEST_TS);

    let mut plan = Page::from_content("Plan", "first draft");
    plan.record_snapshot(TEST_TS);
    plan.edit_block(0, "<i>second</i> draft");
    plan.record_snapshot(TEST_TS + 1_000);

    let mut child = Page::new("Plan details");
    child.parent_id = Some(plan.id);

    let mut workspace = Workspace::with_pages(vec![welcome, plan, child]);
    workspace.set_current_page(1);
    workspace
}
