//! Tab collection store: tab list, checked set, and focus cursor.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StoreKind;
use crate::model::{Tab, TabId};
use crate::store::{Reducer, Store};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabsState {
    pub tabs: Vec<Tab>,
    pub checked_tab_ids: BTreeSet<TabId>,
    /// `None` means no tab is focused.
    pub tab_index: Option<usize>,
}

/// Direction of a single focus step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusDelta {
    /// Towards index 0 (-1).
    Up,
    /// Towards the end of the list (+1).
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusEnd {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TabsAction {
    /// A fresh tab list from the platform.
    TabsLoaded(Vec<Tab>),
    ToggleCheck(TabId),
    CheckAll,
    UncheckAll,
    MoveFocusIndex(FocusDelta),
    SetFocusIndex(usize),
    SetFocusIndexEnd(FocusEnd),
}

pub struct TabsReducer;

impl Reducer for TabsReducer {
    type State = TabsState;
    type Action = TabsAction;

    const STORE: StoreKind = StoreKind::Tabs;

    fn reduce(state: &TabsState, action: TabsAction) -> TabsState {
        match action {
            TabsAction::TabsLoaded(tabs) => {
                let present: HashSet<TabId> = tabs.iter().filter_map(|tab| tab.id).collect();
                let checked_tab_ids = state
                    .checked_tab_ids
                    .iter()
                    .filter(|id| present.contains(id))
                    .copied()
                    .collect();
                let tab_index = clamp_focus(state.tab_index, tabs.len());
                TabsState {
                    tabs,
                    checked_tab_ids,
                    tab_index,
                }
            }
            TabsAction::ToggleCheck(id) => {
                let mut next = state.clone();
                if !next.checked_tab_ids.remove(&id) && contains_id(&state.tabs, id) {
                    next.checked_tab_ids.insert(id);
                }
                next
            }
            TabsAction::CheckAll => TabsState {
                checked_tab_ids: addressable_ids(&state.tabs).collect(),
                ..state.clone()
            },
            TabsAction::UncheckAll => TabsState {
                checked_tab_ids: BTreeSet::new(),
                ..state.clone()
            },
            TabsAction::MoveFocusIndex(delta) => {
                let target = match (state.tab_index, delta) {
                    (None, FocusDelta::Down) => Some(0),
                    (None, FocusDelta::Up) => None,
                    (Some(i), FocusDelta::Down) => i.checked_add(1),
                    (Some(i), FocusDelta::Up) => i.checked_sub(1),
                };
                match target {
                    Some(i) if i < state.tabs.len() => TabsState {
                        tab_index: Some(i),
                        ..state.clone()
                    },
                    _ => state.clone(),
                }
            }
            TabsAction::SetFocusIndex(i) => TabsState {
                tab_index: Some(i),
                ..state.clone()
            },
            TabsAction::SetFocusIndexEnd(end) => {
                let tab_index = match end {
                    FocusEnd::Start if state.tabs.is_empty() => None,
                    FocusEnd::Start => Some(0),
                    FocusEnd::End => state.tabs.len().checked_sub(1),
                };
                TabsState {
                    tab_index,
                    ..state.clone()
                }
            }
        }
    }

    fn action_name(action: &TabsAction) -> &'static str {
        match action {
            TabsAction::TabsLoaded(_) => "tabs_loaded",
            TabsAction::ToggleCheck(_) => "toggle_check",
            TabsAction::CheckAll => "check_all",
            TabsAction::UncheckAll => "uncheck_all",
            TabsAction::MoveFocusIndex(_) => "move_focus_index",
            TabsAction::SetFocusIndex(_) => "set_focus_index",
            TabsAction::SetFocusIndexEnd(_) => "set_focus_index_end",
        }
    }
}

/// Pull an out-of-range cursor back onto the last tab (`None` when empty).
fn clamp_focus(index: Option<usize>, len: usize) -> Option<usize> {
    match index {
        Some(i) if i >= len => len.checked_sub(1),
        other => other,
    }
}

fn addressable_ids(tabs: &[Tab]) -> impl Iterator<Item = TabId> + '_ {
    tabs.iter().filter_map(|tab| tab.id)
}

fn contains_id(tabs: &[Tab], id: TabId) -> bool {
    tabs.iter().any(|tab| tab.id == Some(id))
}

// =============================================================================
// Selectors
// =============================================================================

/// Number of tabs that carry an id and can be checked.
pub fn addressable_count(state: &TabsState) -> usize {
    addressable_ids(&state.tabs).count()
}

/// Every addressable tab is checked. Vacuously true for an empty list.
pub fn all_checked(state: &TabsState) -> bool {
    addressable_count(state) == state.checked_tab_ids.len()
}

pub fn focused_node(state: &TabsState) -> Option<&Tab> {
    state.tab_index.and_then(|i| state.tabs.get(i))
}

pub fn focused_id(state: &TabsState) -> Option<TabId> {
    focused_node(state).and_then(|tab| tab.id)
}

/// Checked tabs in list order.
pub fn checked_tabs(state: &TabsState) -> Vec<&Tab> {
    state
        .tabs
        .iter()
        .filter(|tab| tab.id.is_some_and(|id| state.checked_tab_ids.contains(&id)))
        .collect()
}

// =============================================================================
// Store
// =============================================================================

/// Owner of the tab snapshot.
#[derive(Default)]
pub struct TabsStore {
    inner: Store<TabsReducer>,
}

impl TabsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<TabsState> {
        self.inner.snapshot()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<Arc<TabsState>> {
        self.inner.subscribe()
    }

    pub fn dispatch(&self, action: TabsAction) -> bool {
        self.inner.dispatch(action)
    }

    pub fn toggle_check(&self, id: TabId) -> bool {
        self.dispatch(TabsAction::ToggleCheck(id))
    }

    pub fn check_all(&self) -> bool {
        self.dispatch(TabsAction::CheckAll)
    }

    pub fn uncheck_all(&self) -> bool {
        self.dispatch(TabsAction::UncheckAll)
    }

    /// Clear when everything is checked, otherwise check everything.
    ///
    /// "None checked" and "some checked" both select all.
    pub fn toggle_check_all(&self) -> bool {
        if all_checked(&self.snapshot()) {
            self.uncheck_all()
        } else {
            self.check_all()
        }
    }

    pub fn move_focus_index(&self, delta: FocusDelta) -> bool {
        self.dispatch(TabsAction::MoveFocusIndex(delta))
    }

    pub fn set_focus_index(&self, index: usize) -> bool {
        self.dispatch(TabsAction::SetFocusIndex(index))
    }

    pub fn set_focus_index_end(&self, end: FocusEnd) -> bool {
        self.dispatch(TabsAction::SetFocusIndexEnd(end))
    }

    /// Toggle the focused tab; no-op without an addressable focus.
    pub fn toggle_check_focused(&self) -> bool {
        match focused_id(&self.snapshot()) {
            Some(id) => self.toggle_check(id),
            None => false,
        }
    }

    pub fn focused_id(&self) -> Option<TabId> {
        focused_id(&self.snapshot())
    }

    pub fn all_checked(&self) -> bool {
        all_checked(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_tabs() -> Vec<Tab> {
        vec![
            Tab::new(1, "https://one"),
            Tab::new(2, "https://two"),
            Tab::new(3, "https://three"),
        ]
    }

    fn loaded(tabs: Vec<Tab>) -> TabsStore {
        let store = TabsStore::new();
        store.dispatch(TabsAction::TabsLoaded(tabs));
        store
    }

    fn ids(state: &TabsState) -> Vec<i64> {
        state.checked_tab_ids.iter().map(|id| id.get()).collect()
    }

    #[test]
    fn initial_state_is_empty_without_focus() {
        let state = TabsStore::new().snapshot();
        assert!(state.tabs.is_empty());
        assert!(state.checked_tab_ids.is_empty());
        assert_eq!(state.tab_index, None);
    }

    #[test]
    fn focus_up_stops_at_zero() {
        let store = loaded(three_tabs());
        store.set_focus_index(1);
        assert!(store.move_focus_index(FocusDelta::Up));
        assert_eq!(store.snapshot().tab_index, Some(0));
        assert!(!store.move_focus_index(FocusDelta::Up));
        assert_eq!(store.snapshot().tab_index, Some(0));
    }

    #[test]
    fn focus_down_stops_at_last() {
        let store = loaded(three_tabs());
        store.set_focus_index_end(FocusEnd::End);
        assert_eq!(store.snapshot().tab_index, Some(2));
        assert!(!store.move_focus_index(FocusDelta::Down));
        assert_eq!(store.snapshot().tab_index, Some(2));
    }

    #[test]
    fn focus_down_from_nothing_lands_on_first() {
        let store = loaded(three_tabs());
        assert!(!store.move_focus_index(FocusDelta::Up));
        assert_eq!(store.snapshot().tab_index, None);
        assert!(store.move_focus_index(FocusDelta::Down));
        assert_eq!(store.snapshot().tab_index, Some(0));
    }

    #[test]
    fn focus_moves_nowhere_on_empty_list() {
        let store = TabsStore::new();
        assert!(!store.move_focus_index(FocusDelta::Down));
        store.set_focus_index_end(FocusEnd::Start);
        assert_eq!(store.snapshot().tab_index, None);
        store.set_focus_index_end(FocusEnd::End);
        assert_eq!(store.snapshot().tab_index, None);
    }

    #[test]
    fn shorter_list_clamps_focus() {
        let store = loaded(three_tabs());
        store.set_focus_index(2);
        store.dispatch(TabsAction::TabsLoaded(vec![Tab::new(1, "https://one")]));
        assert_eq!(store.snapshot().tab_index, Some(0));
        store.dispatch(TabsAction::TabsLoaded(Vec::new()));
        assert_eq!(store.snapshot().tab_index, None);
    }

    #[test]
    fn reload_keeps_valid_focus() {
        let store = loaded(three_tabs());
        store.set_focus_index(1);
        let mut tabs = three_tabs();
        tabs.push(Tab::new(4, "https://four"));
        store.dispatch(TabsAction::TabsLoaded(tabs));
        assert_eq!(store.snapshot().tab_index, Some(1));
    }

    #[test]
    fn reload_purges_vanished_checked_ids() {
        let store = loaded(three_tabs());
        store.check_all();
        store.dispatch(TabsAction::TabsLoaded(vec![
            Tab::new(1, "https://one"),
            Tab::new(3, "https://three"),
        ]));
        assert_eq!(ids(&store.snapshot()), vec![1, 3]);
    }

    #[test]
    fn toggle_check_twice_is_a_no_op() {
        let store = loaded(three_tabs());
        let before = store.snapshot();
        store.toggle_check(TabId::new(2));
        assert_eq!(ids(&store.snapshot()), vec![2]);
        store.toggle_check(TabId::new(2));
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn toggle_check_ignores_unknown_ids() {
        let store = loaded(three_tabs());
        assert!(!store.toggle_check(TabId::new(99)));
        assert!(store.snapshot().checked_tab_ids.is_empty());
    }

    #[test]
    fn toggle_check_all_cycles_between_all_and_none() {
        let store = loaded(three_tabs());
        store.toggle_check_all();
        assert_eq!(ids(&store.snapshot()), vec![1, 2, 3]);
        store.toggle_check_all();
        assert!(store.snapshot().checked_tab_ids.is_empty());
    }

    #[test]
    fn toggle_check_all_from_partial_selects_all() {
        let store = loaded(three_tabs());
        store.toggle_check(TabId::new(3));
        store.toggle_check_all();
        assert_eq!(ids(&store.snapshot()), vec![1, 2, 3]);
    }

    #[test]
    fn id_less_tabs_are_never_checked() {
        let mut tabs = three_tabs();
        tabs.insert(1, Tab::unaddressable("chrome://newtab"));
        let store = loaded(tabs);
        store.check_all();
        let state = store.snapshot();
        assert_eq!(ids(&state), vec![1, 2, 3]);
        assert_eq!(addressable_count(&state), 3);
        assert!(all_checked(&state));
        assert_eq!(checked_tabs(&state).len(), 3);
        store.toggle_check_all();
        assert!(store.snapshot().checked_tab_ids.is_empty());
    }

    #[test]
    fn toggle_check_focused_uses_cursor() {
        let store = loaded(three_tabs());
        assert!(!store.toggle_check_focused());
        store.set_focus_index(2);
        assert!(store.toggle_check_focused());
        assert_eq!(ids(&store.snapshot()), vec![3]);
    }

    #[test]
    fn toggle_check_focused_skips_id_less_tab() {
        let store = loaded(vec![Tab::unaddressable("devtools://x")]);
        store.set_focus_index(0);
        assert!(!store.toggle_check_focused());
    }

    #[test]
    fn focused_selectors_follow_index() {
        let store = loaded(three_tabs());
        assert_eq!(store.focused_id(), None);
        store.set_focus_index(1);
        let state = store.snapshot();
        assert_eq!(focused_id(&state), Some(TabId::new(2)));
        assert_eq!(focused_node(&state).map(Tab::url_str), Some("https://two"));
    }

    #[test]
    fn checked_tabs_preserve_list_order() {
        let store = loaded(three_tabs());
        store.toggle_check(TabId::new(3));
        store.toggle_check(TabId::new(1));
        let state = store.snapshot();
        let urls: Vec<&str> = checked_tabs(&state).into_iter().map(Tab::url_str).collect();
        assert_eq!(urls, vec!["https://one", "https://three"]);
    }

    #[test]
    fn empty_list_counts_as_all_checked() {
        let store = TabsStore::new();
        assert!(store.all_checked());
        assert!(!store.toggle_check_all());
    }
}
