//! Platform records mirrored by the engine.
//!
//! Field names follow the platform's camelCase JSON so snapshots can be
//! decoded straight from the extension API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

pub use tabmark_ids::{NodeId, TabId, WindowId};

/// A bookmark folder or entry.
///
/// `url` is present only on leaves and `children` only on folders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkNode {
    pub id: NodeId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Arc<BookmarkNode>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<f64>,
}

impl BookmarkNode {
    pub fn folder(
        id: impl Into<NodeId>,
        title: impl Into<String>,
        children: Vec<BookmarkNode>,
    ) -> Self {
        let id = id.into();
        let children = children
            .into_iter()
            .enumerate()
            .map(|(idx, mut child)| {
                child.parent_id.get_or_insert_with(|| id.clone());
                child.index.get_or_insert(idx as u32);
                Arc::new(child)
            })
            .collect();
        Self {
            id,
            title: title.into(),
            url: None,
            children: Some(children),
            parent_id: None,
            index: None,
            date_added: None,
        }
    }

    pub fn leaf(id: impl Into<NodeId>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: Some(url.into()),
            children: None,
            parent_id: None,
            index: None,
            date_added: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.children.is_some()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Children of a folder; empty for leaves.
    pub fn children(&self) -> &[Arc<BookmarkNode>] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// A browser tab as reported by the platform.
///
/// Only the fields the engine reads are typed; everything else the platform
/// sends is kept in `extra` and passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    /// Missing for tabs the platform does not let us address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TabId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tab {
    pub fn new(id: i64, url: impl Into<String>) -> Self {
        Self {
            id: Some(TabId::new(id)),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// A tab the platform reports without an id.
    pub fn unaddressable(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn in_window(mut self, window_id: i64) -> Self {
        self.window_id = Some(WindowId::new(window_id));
        self
    }

    pub fn url_str(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }
}

/// Filter passed to `query_tabs`. Empty matches every tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TabQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
}

impl TabQuery {
    pub fn matches(&self, tab: &Tab) -> bool {
        if let Some(window_id) = self.window_id {
            if tab.window_id != Some(window_id) {
                return false;
            }
        }
        if let Some(active) = self.active {
            if tab.active != active {
                return false;
            }
        }
        if let Some(pinned) = self.pinned {
            if tab.pinned != pinned {
                return false;
            }
        }
        true
    }
}

/// Properties changed by `update_tab`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabUpdate {
    pub active: bool,
}

impl TabUpdate {
    pub fn activate() -> Self {
        Self { active: true }
    }
}
