//! Tree flattening and traversal for bookmark snapshots.
//!
//! Every walk here uses an explicit work stack, so tree depth never grows the
//! call stack.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use crate::model::{BookmarkNode, NodeId};

/// Pre-order (document order) walk yielding each node with its depth.
///
/// The starting node has depth 0.
pub struct Preorder<'a> {
    stack: Vec<(usize, &'a Arc<BookmarkNode>)>,
}

impl<'a> Preorder<'a> {
    pub fn new(root: &'a Arc<BookmarkNode>) -> Self {
        Self {
            stack: vec![(0, root)],
        }
    }

    /// Walk the children of `root` without yielding `root` itself.
    fn below(root: &'a BookmarkNode) -> Self {
        Self {
            stack: root.children().iter().rev().map(|child| (0, child)).collect(),
        }
    }
}

impl<'a> Iterator for Preorder<'a> {
    type Item = (usize, &'a Arc<BookmarkNode>);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        for child in node.children().iter().rev() {
            self.stack.push((depth + 1, child));
        }
        Some((depth, node))
    }
}

pub fn preorder(root: &Arc<BookmarkNode>) -> Preorder<'_> {
    Preorder::new(root)
}

/// Flat id → node lookup for one tree snapshot.
///
/// Built in a single traversal and never patched; a new tree means a new
/// dictionary.
#[derive(Debug, Clone, Default)]
pub struct NodeDictionary {
    root: Option<Arc<BookmarkNode>>,
    nodes: HashMap<NodeId, Arc<BookmarkNode>>,
}

impl NodeDictionary {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &NodeId) -> Option<&Arc<BookmarkNode>> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Arc<BookmarkNode>)> {
        self.nodes.iter()
    }

    pub fn root(&self) -> Option<&Arc<BookmarkNode>> {
        self.root.as_ref()
    }

    /// True when this dictionary was built from exactly `root` (same allocation).
    pub fn is_snapshot_of(&self, root: Option<&Arc<BookmarkNode>>) -> bool {
        match (self.root.as_ref(), root) {
            (Some(mine), Some(theirs)) => Arc::ptr_eq(mine, theirs),
            (None, None) => true,
            _ => false,
        }
    }
}

/// Flatten a tree into its node dictionary.
///
/// Duplicate ids are last-write-wins in document order. They indicate a
/// malformed upstream tree; [`audit`] reports them.
pub fn flatten(root: &Arc<BookmarkNode>) -> NodeDictionary {
    let nodes = preorder(root)
        .map(|(_, node)| (node.id.clone(), Arc::clone(node)))
        .collect();
    NodeDictionary {
        root: Some(Arc::clone(root)),
        nodes,
    }
}

/// A folder row in the folder-tree view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryRow {
    pub id: NodeId,
    pub title: String,
    /// 0 for the root's direct children.
    pub depth: usize,
    pub child_count: usize,
}

/// Folders in document order, excluding the root itself.
pub fn visible_directories(root: &BookmarkNode) -> Vec<DirectoryRow> {
    Preorder::below(root)
        .filter(|(_, node)| node.is_folder())
        .map(|(depth, node)| DirectoryRow {
            id: node.id.clone(),
            title: node.title.clone(),
            depth,
            child_count: node.children().len(),
        })
        .collect()
}

/// Ids on the path from `root` down to `target`, both ends included.
pub fn ancestors(root: &Arc<BookmarkNode>, target: &NodeId) -> Option<Vec<NodeId>> {
    let mut path: Vec<NodeId> = Vec::new();
    for (depth, node) in preorder(root) {
        path.truncate(depth);
        path.push(node.id.clone());
        if node.id == *target {
            return Some(path);
        }
    }
    None
}

/// True when `id` names a folder somewhere under `root` (root included).
pub fn contains_folder(root: &Arc<BookmarkNode>, id: &NodeId) -> bool {
    preorder(root).any(|(_, node)| node.id == *id && node.is_folder())
}

/// Integrity report for a tree snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeAudit {
    pub node_count: usize,
    pub max_depth: usize,
    /// Ids seen more than once, sorted.
    pub duplicate_ids: Vec<NodeId>,
    /// Nodes carrying both a url and children, in document order.
    pub mixed_nodes: Vec<NodeId>,
}

impl TreeAudit {
    pub fn is_clean(&self) -> bool {
        self.duplicate_ids.is_empty() && self.mixed_nodes.is_empty()
    }
}

pub fn audit(root: &Arc<BookmarkNode>) -> TreeAudit {
    let mut report = TreeAudit::default();
    let mut seen = HashSet::new();
    let mut duplicates = HashSet::new();
    for (depth, node) in preorder(root) {
        report.node_count += 1;
        report.max_depth = report.max_depth.max(depth);
        if !seen.insert(&node.id) {
            duplicates.insert(node.id.clone());
        }
        if node.url.is_some() && node.children.is_some() {
            report.mixed_nodes.push(node.id.clone());
        }
    }
    let mut duplicates: Vec<NodeId> = duplicates.into_iter().collect();
    duplicates.sort();
    report.duplicate_ids = duplicates;
    report
}
