//! In-memory platform for deterministic tests and headless runs.
//!
//! Holds a tab list and a bookmark tree, applies removals and activation to
//! them, and records every call. Failures and delays can be queued per call
//! kind; each queued entry is consumed by the next call of that kind.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::PlatformService;
use crate::error::PlatformError;
use crate::model::{BookmarkNode, Tab, TabId, TabQuery, TabUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    QueryTabs,
    RemoveTabs,
    UpdateTab,
    GetBookmarkTree,
}

/// One recorded request, with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    QueryTabs(TabQuery),
    RemoveTabs(Vec<TabId>),
    UpdateTab(TabId, TabUpdate),
    GetBookmarkTree,
}

impl PlatformCall {
    pub fn kind(&self) -> CallKind {
        match self {
            PlatformCall::QueryTabs(_) => CallKind::QueryTabs,
            PlatformCall::RemoveTabs(_) => CallKind::RemoveTabs,
            PlatformCall::UpdateTab(..) => CallKind::UpdateTab,
            PlatformCall::GetBookmarkTree => CallKind::GetBookmarkTree,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    tabs: Vec<Tab>,
    tree: Option<BookmarkNode>,
    failures: HashMap<CallKind, VecDeque<PlatformError>>,
    delays: HashMap<CallKind, VecDeque<Duration>>,
    calls: Vec<PlatformCall>,
}

impl Inner {
    /// Record the call and take its scripted delay and failure, if any.
    fn begin(&mut self, call: PlatformCall) -> (Option<Duration>, Option<PlatformError>) {
        let kind = call.kind();
        self.calls.push(call);
        let delay = self.delays.get_mut(&kind).and_then(VecDeque::pop_front);
        let failure = self.failures.get_mut(&kind).and_then(VecDeque::pop_front);
        (delay, failure)
    }
}

#[derive(Debug, Default)]
pub struct MemoryPlatform {
    inner: Mutex<Inner>,
}

impl MemoryPlatform {
    pub fn new(tabs: Vec<Tab>, tree: Option<BookmarkNode>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                tabs,
                tree,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_tabs(&self, tabs: Vec<Tab>) {
        self.lock().tabs = tabs;
    }

    pub fn set_tree(&self, tree: BookmarkNode) {
        self.lock().tree = Some(tree);
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.lock().tabs.clone()
    }

    /// Make the next call of `kind` fail with `error`.
    pub fn fail_next(&self, kind: CallKind, error: PlatformError) {
        self.lock()
            .failures
            .entry(kind)
            .or_default()
            .push_back(error);
    }

    /// Make the next call of `kind` wait `delay` before answering.
    ///
    /// Results are computed when the call starts, so a delayed query returns
    /// the data as it was at call time.
    pub fn delay_next(&self, kind: CallKind, delay: Duration) {
        self.lock().delays.entry(kind).or_default().push_back(delay);
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, kind: CallKind) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.kind() == kind)
            .count()
    }
}

async fn settle<T>(
    delay: Option<Duration>,
    outcome: Result<T, PlatformError>,
) -> Result<T, PlatformError> {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    outcome
}

#[async_trait]
impl PlatformService for MemoryPlatform {
    fn name(&self) -> &str {
        "memory"
    }

    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<Tab>, PlatformError> {
        let (delay, outcome) = {
            let mut inner = self.lock();
            let (delay, failure) = inner.begin(PlatformCall::QueryTabs(query.clone()));
            let outcome = match failure {
                Some(err) => Err(err),
                None => Ok(inner
                    .tabs
                    .iter()
                    .filter(|tab| query.matches(tab))
                    .cloned()
                    .collect()),
            };
            (delay, outcome)
        };
        settle(delay, outcome).await
    }

    async fn remove_tabs(&self, ids: &[TabId]) -> Result<(), PlatformError> {
        let (delay, outcome) = {
            let mut inner = self.lock();
            let (delay, failure) = inner.begin(PlatformCall::RemoveTabs(ids.to_vec()));
            let outcome = match failure {
                Some(err) => Err(err),
                None => {
                    inner
                        .tabs
                        .retain(|tab| tab.id.map_or(true, |id| !ids.contains(&id)));
                    Ok(())
                }
            };
            (delay, outcome)
        };
        settle(delay, outcome).await
    }

    async fn update_tab(&self, id: TabId, update: &TabUpdate) -> Result<(), PlatformError> {
        let (delay, outcome) = {
            let mut inner = self.lock();
            let (delay, failure) = inner.begin(PlatformCall::UpdateTab(id, *update));
            let outcome = match failure {
                Some(err) => Err(err),
                None => apply_update(&mut inner.tabs, id, update),
            };
            (delay, outcome)
        };
        settle(delay, outcome).await
    }

    async fn get_bookmark_tree(&self) -> Result<BookmarkNode, PlatformError> {
        let (delay, outcome) = {
            let mut inner = self.lock();
            let (delay, failure) = inner.begin(PlatformCall::GetBookmarkTree);
            let outcome = match failure {
                Some(err) => Err(err),
                None => inner
                    .tree
                    .clone()
                    .ok_or_else(|| PlatformError::Unavailable("no bookmark tree loaded".into())),
            };
            (delay, outcome)
        };
        settle(delay, outcome).await
    }
}

/// Activating a tab deactivates the other tabs of its window.
fn apply_update(tabs: &mut [Tab], id: TabId, update: &TabUpdate) -> Result<(), PlatformError> {
    let window = tabs
        .iter()
        .find(|tab| tab.id == Some(id))
        .map(|tab| tab.window_id)
        .ok_or_else(|| PlatformError::Rejected(format!("no tab with id {}", id)))?;
    for tab in tabs.iter_mut() {
        if tab.id == Some(id) {
            tab.active = update.active;
        } else if update.active && tab.window_id == window {
            tab.active = false;
        }
    }
    Ok(())
}
