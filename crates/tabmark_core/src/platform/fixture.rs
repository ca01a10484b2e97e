use std::path::Path;

use serde::{Deserialize, Serialize};

use super::MemoryPlatform;
use crate::error::PlatformError;
use crate::model::{BookmarkNode, Tab};

/// Recorded platform state: `{ "tabs": [...], "tree": {...} }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub tabs: Vec<Tab>,
    #[serde(default)]
    pub tree: Option<BookmarkNode>,
}

impl Fixture {
    pub fn from_json_str(input: &str) -> Result<Self, PlatformError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, PlatformError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PlatformError::Unavailable(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn into_platform(self) -> MemoryPlatform {
        MemoryPlatform::new(self.tabs, self.tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformService;

    #[tokio::test]
    async fn fixture_seeds_platform() {
        let fixture = Fixture::from_json_str(
            r#"{
                "tabs": [{"id": 1, "url": "https://a"}, {"url": "chrome://newtab"}],
                "tree": {"id": "0", "children": [{"id": "1", "title": "Bar", "children": []}]}
            }"#,
        )
        .unwrap();
        let platform = fixture.into_platform();
        assert_eq!(platform.tabs().len(), 2);
        let tree = platform.get_bookmark_tree().await.unwrap();
        assert_eq!(tree.children().len(), 1);
    }

    #[test]
    fn bad_json_is_decode_error() {
        let err = Fixture::from_json_str("{\"tabs\": 3}").unwrap_err();
        assert!(matches!(err, PlatformError::Decode(_)));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = Fixture::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, PlatformError::Unavailable(_)));
    }
}
