//! Bookmark tree store: tree root, selected directory, and view mode.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreKind;
use crate::model::{BookmarkNode, NodeId};
use crate::store::{Reducer, Store};
use crate::tree::{self, NodeDictionary};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookmarkView {
    #[default]
    Tree,
    Search,
}

#[derive(Debug, Clone, Default)]
pub struct BookmarkTreeState {
    /// `None` until the first successful fetch.
    pub root: Option<Arc<BookmarkNode>>,
    /// `None` selects the root.
    pub selected_dir_id: Option<NodeId>,
    pub view: BookmarkView,
}

// Roots compare by allocation before falling back to structural equality.
impl PartialEq for BookmarkTreeState {
    fn eq(&self, other: &Self) -> bool {
        let same_root = match (&self.root, &other.root) {
            (Some(mine), Some(theirs)) => Arc::ptr_eq(mine, theirs) || mine == theirs,
            (None, None) => true,
            _ => false,
        };
        same_root && self.selected_dir_id == other.selected_dir_id && self.view == other.view
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookmarkAction {
    TreeLoaded(Arc<BookmarkNode>),
    SelectDir(NodeId),
    ClearSelection,
    SetView(BookmarkView),
}

pub struct BookmarkReducer;

impl Reducer for BookmarkReducer {
    type State = BookmarkTreeState;
    type Action = BookmarkAction;

    const STORE: StoreKind = StoreKind::Bookmarks;

    fn reduce(state: &BookmarkTreeState, action: BookmarkAction) -> BookmarkTreeState {
        match action {
            BookmarkAction::TreeLoaded(root) => {
                let selected_dir_id = state
                    .selected_dir_id
                    .clone()
                    .filter(|id| tree::contains_folder(&root, id));
                if selected_dir_id.is_none() && state.selected_dir_id.is_some() {
                    debug!(
                        stale = ?state.selected_dir_id,
                        "selected directory vanished; resetting to root"
                    );
                }
                BookmarkTreeState {
                    root: Some(root),
                    selected_dir_id,
                    view: state.view,
                }
            }
            BookmarkAction::SelectDir(id) => BookmarkTreeState {
                selected_dir_id: Some(id),
                ..state.clone()
            },
            BookmarkAction::ClearSelection => BookmarkTreeState {
                selected_dir_id: None,
                ..state.clone()
            },
            BookmarkAction::SetView(view) => BookmarkTreeState {
                view,
                ..state.clone()
            },
        }
    }

    fn action_name(action: &BookmarkAction) -> &'static str {
        match action {
            BookmarkAction::TreeLoaded(_) => "tree_loaded",
            BookmarkAction::SelectDir(_) => "select_dir",
            BookmarkAction::ClearSelection => "clear_selection",
            BookmarkAction::SetView(_) => "set_view",
        }
    }
}

// =============================================================================
// Selectors
// =============================================================================

pub fn node_dictionary(state: &BookmarkTreeState) -> NodeDictionary {
    state
        .root
        .as_ref()
        .map(tree::flatten)
        .unwrap_or_default()
}

/// Children of `id`; empty when the id is unknown or names a leaf.
pub fn children_of(dict: &NodeDictionary, id: &NodeId) -> Vec<Arc<BookmarkNode>> {
    dict.get(id)
        .map(|node| node.children().to_vec())
        .unwrap_or_default()
}

/// The selected directory, falling back to the root when unset or dangling.
pub fn selected_node(
    state: &BookmarkTreeState,
    dict: &NodeDictionary,
) -> Option<Arc<BookmarkNode>> {
    state
        .selected_dir_id
        .as_ref()
        .and_then(|id| dict.get(id))
        .or(state.root.as_ref())
        .cloned()
}

/// Bookmark entries whose title or url contains `query` (case-insensitive),
/// in document order.
pub fn search(state: &BookmarkTreeState, query: &str) -> Vec<Arc<BookmarkNode>> {
    let needle = query.trim().to_lowercase();
    let Some(root) = state.root.as_ref() else {
        return Vec::new();
    };
    if needle.is_empty() {
        return Vec::new();
    }
    tree::preorder(root)
        .map(|(_, node)| node)
        .filter(|node| node.is_leaf())
        .filter(|node| {
            node.title.to_lowercase().contains(&needle)
                || node
                    .url
                    .as_deref()
                    .is_some_and(|url| url.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Ids from the root down to the selected directory.
pub fn breadcrumbs(state: &BookmarkTreeState) -> Vec<NodeId> {
    let Some(root) = state.root.as_ref() else {
        return Vec::new();
    };
    state
        .selected_dir_id
        .as_ref()
        .and_then(|id| tree::ancestors(root, id))
        .unwrap_or_else(|| vec![root.id.clone()])
}

// =============================================================================
// Store
// =============================================================================

/// Owner of the bookmark snapshot, with the node dictionary memoized per tree.
#[derive(Default)]
pub struct BookmarkStore {
    inner: Store<BookmarkReducer>,
    dictionary: Mutex<Arc<NodeDictionary>>,
}

impl BookmarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<BookmarkTreeState> {
        self.inner.snapshot()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<Arc<BookmarkTreeState>> {
        self.inner.subscribe()
    }

    pub fn dispatch(&self, action: BookmarkAction) -> bool {
        self.inner.dispatch(action)
    }

    /// No validation here; selectors fall back to the root for unknown ids.
    pub fn select_dir(&self, id: NodeId) -> bool {
        self.dispatch(BookmarkAction::SelectDir(id))
    }

    pub fn clear_selection(&self) -> bool {
        self.dispatch(BookmarkAction::ClearSelection)
    }

    pub fn set_view(&self, view: BookmarkView) -> bool {
        self.dispatch(BookmarkAction::SetView(view))
    }

    /// Node dictionary for the current tree, rebuilt only when the root changes.
    pub fn dictionary(&self) -> Arc<NodeDictionary> {
        self.dictionary_for(&self.snapshot())
    }

    fn dictionary_for(&self, state: &BookmarkTreeState) -> Arc<NodeDictionary> {
        let mut cached = self
            .dictionary
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !cached.is_snapshot_of(state.root.as_ref()) {
            *cached = Arc::new(node_dictionary(state));
            debug!(nodes = cached.len(), "rebuilt node dictionary");
        }
        Arc::clone(&cached)
    }

    pub fn children_of(&self, id: &NodeId) -> Vec<Arc<BookmarkNode>> {
        children_of(&self.dictionary(), id)
    }

    pub fn selected_node(&self) -> Option<Arc<BookmarkNode>> {
        let state = self.snapshot();
        selected_node(&state, &self.dictionary_for(&state))
    }

    pub fn visible_directories(&self) -> Vec<tree::DirectoryRow> {
        self.snapshot()
            .root
            .as_deref()
            .map(tree::visible_directories)
            .unwrap_or_default()
    }

    pub fn search(&self, query: &str) -> Vec<Arc<BookmarkNode>> {
        search(&self.snapshot(), query)
    }

    pub fn breadcrumbs(&self) -> Vec<NodeId> {
        breadcrumbs(&self.snapshot())
    }
}
