use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque page identifier.
///
/// New pages get a random UUID. Data written by older versions of the app
/// used a millisecond timestamp instead, which is kept as-is so that
/// `parentId` links keep pointing at the right page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageId {
    Legacy(u64),
    Uuid(Uuid),
}

impl PageId {
    pub fn new() -> Self {
        PageId::Uuid(Uuid::new_v4())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageId::Legacy(ts) => write!(f, "{ts}"),
            PageId::Uuid(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(PageId::new(), PageId::new());
    }

    #[test]
    fn test_legacy_numeric_id_deserializes() {
        let id: PageId = serde_json::from_str("1700000000000").unwrap();
        assert_eq!(id, PageId::Legacy(1_700_000_000_000));
        assert_eq!(serde_json::to_string(&id).unwrap(), "1700000000000");
    }

    #[test]
    fn test_uuid_id_deserializes() {
        let uuid = Uuid::new_v4();
        let json = format!("\"{uuid}\"");
        let id: PageId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, PageId::Uuid(uuid));
    }
}
