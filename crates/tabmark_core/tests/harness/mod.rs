//! Shared fixtures for session integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use tabmark_core::{BookmarkNode, EngineConfig, MemoryPlatform, PopupSession, Tab};

/// Root plus eight descendants:
///
/// ```text
/// 0
/// ├── 1 Bookmarks bar
/// │   ├── 3 Rust
/// │   └── 4 Work
/// │       ├── 6 CI
/// │       └── 7 Docs
/// └── 2 Other
///     ├── 5 Crates
///     └── 8 Archive (empty)
/// ```
pub fn nine_node_tree() -> BookmarkNode {
    BookmarkNode::folder(
        "0",
        "",
        vec![
            BookmarkNode::folder(
                "1",
                "Bookmarks bar",
                vec![
                    BookmarkNode::leaf("3", "Rust", "https://www.rust-lang.org"),
                    BookmarkNode::folder(
                        "4",
                        "Work",
                        vec![
                            BookmarkNode::leaf("6", "CI", "https://ci.example.com"),
                            BookmarkNode::leaf("7", "Docs", "https://docs.rs"),
                        ],
                    ),
                ],
            ),
            BookmarkNode::folder(
                "2",
                "Other",
                vec![
                    BookmarkNode::leaf("5", "Crates", "https://crates.io"),
                    BookmarkNode::folder("8", "Archive", vec![]),
                ],
            ),
        ],
    )
}

/// Same tree with the "Work" folder removed.
pub fn tree_without_work() -> BookmarkNode {
    BookmarkNode::folder(
        "0",
        "",
        vec![
            BookmarkNode::folder(
                "1",
                "Bookmarks bar",
                vec![BookmarkNode::leaf("3", "Rust", "https://www.rust-lang.org")],
            ),
            BookmarkNode::folder("2", "Other", vec![]),
        ],
    )
}

pub fn tabs(ids: &[i64]) -> Vec<Tab> {
    ids.iter()
        .map(|&id| Tab::new(id, format!("https://site{}.example", id)).in_window(1))
        .collect()
}

pub fn session_with(tabs: Vec<Tab>, tree: Option<BookmarkNode>) -> (Arc<MemoryPlatform>, PopupSession) {
    let platform = Arc::new(MemoryPlatform::new(tabs, tree));
    let session = PopupSession::open(platform.clone(), &EngineConfig::default())
        .expect("open session");
    (platform, session)
}
