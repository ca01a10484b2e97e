//! End-to-end behaviour of `PopupSession` over an in-memory platform.

mod harness;

use std::sync::Arc;
use std::time::Duration;

use harness::{nine_node_tree, session_with, tabs, tree_without_work};
use tabmark_core::{
    BookmarkView, CallKind, EngineError, FocusDelta, FocusEnd, NodeId, PlatformCall,
    PlatformError, StoreKind, Tab, TabId,
};

#[tokio::test]
async fn test_nine_node_tree_flattens_to_nine_entries() {
    let (_platform, session) = session_with(vec![], Some(nine_node_tree()));
    assert_eq!(session.fetch_tree().await.expect("fetch tree"), 9);

    let dict = session.bookmarks().dictionary();
    assert_eq!(dict.len(), 9);
    for id in ["0", "1", "2", "3", "4", "5", "6", "7", "8"] {
        assert!(dict.contains(&NodeId::from(id)), "missing node {}", id);
    }

    let children: Vec<String> = session
        .bookmarks()
        .children_of(&NodeId::from("4"))
        .iter()
        .map(|n| n.title.clone())
        .collect();
    assert_eq!(children, vec!["CI", "Docs"]);

    let folders: Vec<String> = session
        .bookmarks()
        .visible_directories()
        .into_iter()
        .map(|row| row.id.to_string())
        .collect();
    assert_eq!(folders, vec!["1", "4", "2", "8"]);
}

#[tokio::test]
async fn test_stale_directory_selection_resets_to_root() {
    let (platform, session) = session_with(vec![], Some(nine_node_tree()));
    session.fetch_tree().await.expect("first fetch");
    session.bookmarks().select_dir(NodeId::from("4"));
    session.bookmarks().set_view(BookmarkView::Search);
    assert_eq!(
        session.bookmarks().selected_node().map(|n| n.id.clone()),
        Some(NodeId::from("4"))
    );

    platform.set_tree(tree_without_work());
    session.fetch_tree().await.expect("second fetch");

    let state = session.bookmarks().snapshot();
    assert_eq!(state.selected_dir_id, None);
    assert_eq!(state.view, BookmarkView::Search);
    assert_eq!(
        session.bookmarks().selected_node().map(|n| n.id.clone()),
        Some(NodeId::from("0"))
    );
}

#[tokio::test]
async fn test_surviving_selection_is_kept_across_refresh() {
    let (platform, session) = session_with(vec![], Some(nine_node_tree()));
    session.fetch_tree().await.expect("first fetch");
    session.bookmarks().select_dir(NodeId::from("2"));

    platform.set_tree(tree_without_work());
    session.fetch_tree().await.expect("second fetch");
    assert_eq!(
        session.bookmarks().snapshot().selected_dir_id,
        Some(NodeId::from("2"))
    );
    assert!(session.bookmarks().children_of(&NodeId::from("2")).is_empty());
}

#[tokio::test]
async fn test_focus_clamps_after_shorter_fetch() {
    let (platform, session) = session_with(tabs(&[1, 2, 3, 4, 5]), None);
    session.fetch_tabs().await.expect("fetch");
    session.tabs().set_focus_index(4);
    session.tabs().toggle_check(TabId::new(2));
    session.tabs().toggle_check(TabId::new(5));

    platform.set_tabs(tabs(&[1, 2]));
    session.fetch_tabs().await.expect("refetch");

    let state = session.tabs().snapshot();
    assert_eq!(state.tab_index, Some(1));
    assert_eq!(state.checked_tab_ids.len(), 1);
    assert!(state.checked_tab_ids.contains(&TabId::new(2)));

    platform.set_tabs(vec![]);
    session.fetch_tabs().await.expect("empty fetch");
    let state = session.tabs().snapshot();
    assert_eq!(state.tab_index, None);
    assert!(state.checked_tab_ids.is_empty());
}

#[tokio::test]
async fn test_three_tab_focus_walk() {
    let (_platform, session) = session_with(tabs(&[10, 11, 12]), None);
    session.fetch_tabs().await.expect("fetch");
    let store = session.tabs();

    store.set_focus_index(0);
    assert!(store.move_focus_index(FocusDelta::Down));
    assert!(store.move_focus_index(FocusDelta::Down));
    assert_eq!(store.snapshot().tab_index, Some(2));
    assert!(!store.move_focus_index(FocusDelta::Down));
    assert_eq!(store.snapshot().tab_index, Some(2));

    store.set_focus_index_end(FocusEnd::Start);
    assert!(!store.move_focus_index(FocusDelta::Up));
    assert_eq!(store.focused_id(), Some(TabId::new(10)));
}

#[tokio::test]
async fn test_toggle_all_cycle() {
    let (_platform, session) = session_with(tabs(&[1, 2, 3]), None);
    session.fetch_tabs().await.expect("fetch");
    let store = session.tabs();

    store.toggle_check(TabId::new(2));
    store.toggle_check_all();
    assert!(store.all_checked());
    assert_eq!(store.snapshot().checked_tab_ids.len(), 3);

    store.toggle_check_all();
    assert!(store.snapshot().checked_tab_ids.is_empty());

    store.toggle_check_all();
    assert_eq!(store.snapshot().checked_tab_ids.len(), 3);
}

#[tokio::test]
async fn test_self_surface_tabs_are_hidden() {
    let list = vec![
        Tab::new(1, "https://example.com"),
        Tab::new(2, "chrome://bookmarks/?id=4"),
        Tab::unaddressable("chrome://newtab"),
    ];
    let (_platform, session) = session_with(list, None);
    assert_eq!(session.fetch_tabs().await.expect("fetch"), 2);

    let state = session.tabs().snapshot();
    assert!(state.tabs.iter().all(|t| !t.url_str().starts_with("chrome://bookmarks")));

    session.tabs().check_all();
    let state = session.tabs().snapshot();
    assert_eq!(state.checked_tab_ids.len(), 1);
    assert!(session.tabs().all_checked());
}

#[tokio::test]
async fn test_fetch_failure_keeps_last_snapshot() {
    let (platform, session) = session_with(tabs(&[1, 2]), Some(nine_node_tree()));
    session.fetch_tabs().await.expect("fetch");
    session.tabs().set_focus_index(1);
    let before = session.tabs().snapshot();

    platform.set_tabs(vec![]);
    platform.fail_next(CallKind::QueryTabs, PlatformError::Unavailable("gone".into()));
    let err = session.fetch_tabs().await.expect_err("fetch should fail");
    assert!(matches!(
        err,
        EngineError::Fetch {
            store: StoreKind::Tabs,
            ..
        }
    ));
    assert!(Arc::ptr_eq(&before, &session.tabs().snapshot()));

    platform.fail_next(CallKind::GetBookmarkTree, PlatformError::Decode("bad".into()));
    let err = session.fetch_tree().await.expect_err("tree should fail");
    assert_eq!(err.store(), Some(StoreKind::Bookmarks));
    assert!(session.bookmarks().snapshot().root.is_none());
}

#[tokio::test]
async fn test_refresh_all_isolates_failures() {
    let (platform, session) = session_with(tabs(&[1, 2, 3]), Some(nine_node_tree()));
    platform.fail_next(CallKind::GetBookmarkTree, PlatformError::Unavailable("down".into()));

    let report = session.refresh_all().await;
    assert!(!report.is_ok());
    assert_eq!(*report.tabs.as_ref().expect("tabs ok"), 3);
    assert!(report.tree.is_err());
    assert_eq!(session.tabs().snapshot().tabs.len(), 3);
    assert!(session.bookmarks().snapshot().root.is_none());

    let report = session.refresh_all().await;
    assert!(report.is_ok());
    assert_eq!(session.bookmarks().dictionary().len(), 9);
}

#[tokio::test]
async fn test_close_checked_is_optimistic() {
    let (platform, session) = session_with(tabs(&[1, 2, 3]), None);
    session.fetch_tabs().await.expect("fetch");
    session.tabs().toggle_check(TabId::new(1));
    session.tabs().toggle_check(TabId::new(3));

    let closed = session.close_checked_tabs().await.expect("close");
    assert_eq!(closed, vec![TabId::new(1), TabId::new(3)]);

    let state = session.tabs().snapshot();
    assert!(state.checked_tab_ids.is_empty());
    assert_eq!(state.tabs.len(), 3, "list only changes on the next fetch");

    session.fetch_tabs().await.expect("refetch");
    let ids: Vec<Option<TabId>> = session.tabs().snapshot().tabs.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![Some(TabId::new(2))]);
    assert_eq!(
        platform.calls()[1],
        PlatformCall::RemoveTabs(vec![TabId::new(1), TabId::new(3)])
    );
}

#[tokio::test]
async fn test_rejected_close_does_not_restore_checks() {
    let (platform, session) = session_with(tabs(&[1, 2]), None);
    session.fetch_tabs().await.expect("fetch");
    session.tabs().check_all();
    platform.fail_next(CallKind::RemoveTabs, PlatformError::Rejected("locked".into()));

    let err = session.close_checked_tabs().await.expect_err("close should fail");
    assert!(matches!(
        err,
        EngineError::Mutation {
            operation: "close_checked_tabs",
            ..
        }
    ));
    assert!(session.tabs().snapshot().checked_tab_ids.is_empty());
    assert_eq!(platform.tabs().len(), 2);
}

#[tokio::test]
async fn test_close_checked_with_nothing_checked_sends_nothing() {
    let (platform, session) = session_with(tabs(&[1]), None);
    session.fetch_tabs().await.expect("fetch");
    let closed = session.close_checked_tabs().await.expect("close");
    assert!(closed.is_empty());
    assert_eq!(platform.call_count(CallKind::RemoveTabs), 0);
}

#[tokio::test]
async fn test_close_and_activate_focused() {
    let (platform, session) = session_with(tabs(&[1, 2, 3]), None);
    session.fetch_tabs().await.expect("fetch");

    assert_eq!(session.close_focused_tab().await.expect("no focus"), None);
    assert_eq!(session.activate_focused_tab().await.expect("no focus"), None);
    assert_eq!(platform.calls().len(), 1);

    session.tabs().set_focus_index(1);
    let activated = session.activate_focused_tab().await.expect("activate");
    assert_eq!(activated, Some(TabId::new(2)));
    assert!(platform.tabs()[1].active);
    assert_eq!(session.tabs().snapshot().tab_index, Some(1));

    let closed = session.close_focused_tab().await.expect("close");
    assert_eq!(closed, Some(TabId::new(2)));
    session.close_tab(TabId::new(3)).await.expect("close tab");
    session.fetch_tabs().await.expect("refetch");
    let state = session.tabs().snapshot();
    assert_eq!(state.tabs.len(), 1);
    assert_eq!(state.tab_index, Some(0));
}

#[tokio::test]
async fn test_focused_unaddressable_tab_is_skipped() {
    let list = vec![Tab::unaddressable("devtools://inspector")];
    let (platform, session) = session_with(list, None);
    session.fetch_tabs().await.expect("fetch");
    session.tabs().set_focus_index(0);

    assert!(!session.tabs().toggle_check_focused());
    assert_eq!(session.close_focused_tab().await.expect("close"), None);
    assert_eq!(platform.call_count(CallKind::RemoveTabs), 0);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_fetches_commit_in_completion_order() {
    let (platform, session) = session_with(tabs(&[1, 2, 3]), None);

    platform.delay_next(CallKind::QueryTabs, Duration::from_millis(100));
    let slow = session.fetch_tabs();
    futures::pin_mut!(slow);
    assert!(futures::poll!(slow.as_mut()).is_pending());

    platform.set_tabs(tabs(&[9]));
    platform.delay_next(CallKind::QueryTabs, Duration::from_millis(10));
    let (slow, fast) = futures::join!(slow, session.fetch_tabs());

    assert_eq!(fast.expect("fast"), 1);
    assert_eq!(slow.expect("slow"), 3);
    assert_eq!(session.tabs().snapshot().tabs.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_actions_apply_while_fetch_in_flight() {
    let (platform, session) = session_with(tabs(&[1, 2, 3]), None);
    session.fetch_tabs().await.expect("fetch");

    platform.set_tabs(tabs(&[1, 2]));
    platform.delay_next(CallKind::QueryTabs, Duration::from_millis(50));
    let pending = session.fetch_tabs();
    futures::pin_mut!(pending);
    assert!(futures::poll!(pending.as_mut()).is_pending());

    session.tabs().set_focus_index_end(FocusEnd::End);
    session.tabs().toggle_check(TabId::new(1));
    session.tabs().toggle_check(TabId::new(3));
    assert_eq!(session.tabs().snapshot().tab_index, Some(2));

    pending.await.expect("fetch completes");
    let state = session.tabs().snapshot();
    assert_eq!(state.tab_index, Some(1));
    assert_eq!(state.checked_tab_ids.iter().copied().collect::<Vec<_>>(), vec![TabId::new(1)]);
}

#[tokio::test]
async fn test_subscribers_wake_on_commit() {
    let (_platform, session) = session_with(tabs(&[1]), Some(nine_node_tree()));
    let mut tabs_rx = session.tabs().subscribe();
    let mut tree_rx = session.bookmarks().subscribe();

    session.refresh_all().await;
    assert!(tabs_rx.has_changed().expect("tabs sender alive"));
    assert!(tree_rx.has_changed().expect("tree sender alive"));
    assert_eq!(tabs_rx.borrow_and_update().tabs.len(), 1);

    session.close();
    assert!(tabs_rx.changed().await.is_err());
}
