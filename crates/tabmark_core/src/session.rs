//! Popup session: owns both stores and drives them from the platform.
//!
//! Async operations read the platform without holding any snapshot and commit
//! their result in one dispatch. Overlapping fetches are not cancelled; the
//! one that completes last wins.

use std::sync::Arc;

use tracing::{info, warn};

use crate::bookmarks::{BookmarkAction, BookmarkStore};
use crate::config::{EngineConfig, SurfaceFilter};
use crate::error::{EngineError, EngineResult, StoreKind};
use crate::model::{TabId, TabQuery, TabUpdate};
use crate::platform::PlatformService;
use crate::tabs::{TabsAction, TabsStore};
use crate::tree;

/// Outcome of [`PopupSession::refresh_all`]; each store fails independently.
#[derive(Debug)]
pub struct RefreshReport {
    /// Number of tabs committed.
    pub tabs: EngineResult<usize>,
    /// Number of nodes in the committed tree.
    pub tree: EngineResult<usize>,
}

impl RefreshReport {
    pub fn is_ok(&self) -> bool {
        self.tabs.is_ok() && self.tree.is_ok()
    }
}

pub struct PopupSession {
    service: Arc<dyn PlatformService>,
    filter: SurfaceFilter,
    query: TabQuery,
    tabs: TabsStore,
    bookmarks: BookmarkStore,
}

impl PopupSession {
    /// Create empty stores bound to `service`. Nothing is fetched yet.
    pub fn open(service: Arc<dyn PlatformService>, config: &EngineConfig) -> EngineResult<Self> {
        let filter = config.surface_filter()?;
        info!(platform = service.name(), "popup session opened");
        Ok(Self {
            service,
            filter,
            query: config.tab_query.clone(),
            tabs: TabsStore::new(),
            bookmarks: BookmarkStore::new(),
        })
    }

    pub fn tabs(&self) -> &TabsStore {
        &self.tabs
    }

    pub fn bookmarks(&self) -> &BookmarkStore {
        &self.bookmarks
    }

    /// Query tabs, hide the self surface, and commit the list.
    pub async fn fetch_tabs(&self) -> EngineResult<usize> {
        let tabs = self.service.query_tabs(&self.query).await.map_err(|e| {
            warn!(error = %e, "tab query failed; keeping last snapshot");
            EngineError::fetch(StoreKind::Tabs, e)
        })?;
        let received = tabs.len();
        let tabs = self.filter.retain_foreign(tabs);
        let count = tabs.len();
        self.tabs.dispatch(TabsAction::TabsLoaded(tabs));
        let state = self.tabs.snapshot();
        info!(
            received,
            kept = count,
            checked = state.checked_tab_ids.len(),
            focus = ?state.tab_index,
            "tabs committed"
        );
        Ok(count)
    }

    /// Fetch the bookmark tree and commit it, resetting a vanished selection.
    pub async fn fetch_tree(&self) -> EngineResult<usize> {
        let root = self.service.get_bookmark_tree().await.map_err(|e| {
            warn!(error = %e, "bookmark tree fetch failed; keeping last snapshot");
            EngineError::fetch(StoreKind::Bookmarks, e)
        })?;
        let root = Arc::new(root);
        let report = tree::audit(&root);
        if !report.is_clean() {
            warn!(
                duplicates = ?report.duplicate_ids,
                mixed = ?report.mixed_nodes,
                "bookmark tree failed integrity audit"
            );
        }
        self.bookmarks.dispatch(BookmarkAction::TreeLoaded(root));
        info!(
            nodes = report.node_count,
            max_depth = report.max_depth,
            selected = ?self.bookmarks.snapshot().selected_dir_id,
            "bookmark tree committed"
        );
        Ok(report.node_count)
    }

    /// Refresh both stores concurrently.
    pub async fn refresh_all(&self) -> RefreshReport {
        let (tabs, tree) = futures::join!(self.fetch_tabs(), self.fetch_tree());
        RefreshReport { tabs, tree }
    }

    /// Clear the checked set, then ask the platform to close those tabs.
    ///
    /// The tab list is not touched; closed tabs disappear on the next fetch.
    /// Returns the ids that were sent, which is empty when nothing was checked.
    pub async fn close_checked_tabs(&self) -> EngineResult<Vec<TabId>> {
        let ids: Vec<TabId> = self
            .tabs
            .snapshot()
            .checked_tab_ids
            .iter()
            .copied()
            .collect();
        self.tabs.uncheck_all();
        if ids.is_empty() {
            return Ok(ids);
        }
        self.remove(&ids, "close_checked_tabs").await?;
        Ok(ids)
    }

    pub async fn close_tab(&self, id: TabId) -> EngineResult<()> {
        self.remove(&[id], "close_tab").await
    }

    /// Close the focused tab. `Ok(None)` when nothing addressable is focused.
    pub async fn close_focused_tab(&self) -> EngineResult<Option<TabId>> {
        let Some(id) = self.tabs.focused_id() else {
            return Ok(None);
        };
        self.remove(&[id], "close_focused_tab").await?;
        Ok(Some(id))
    }

    /// Bring the focused tab to the front. Local state is unchanged.
    pub async fn activate_focused_tab(&self) -> EngineResult<Option<TabId>> {
        let Some(id) = self.tabs.focused_id() else {
            return Ok(None);
        };
        self.service
            .update_tab(id, &TabUpdate::activate())
            .await
            .map_err(|e| {
                warn!(tab = %id, error = %e, "tab activation failed");
                EngineError::mutation("activate_focused_tab", e)
            })?;
        Ok(Some(id))
    }

    async fn remove(&self, ids: &[TabId], operation: &'static str) -> EngineResult<()> {
        self.service.remove_tabs(ids).await.map_err(|e| {
            warn!(operation, count = ids.len(), error = %e, "tab removal failed");
            EngineError::mutation(operation, e)
        })?;
        info!(operation, count = ids.len(), "tab removal requested");
        Ok(())
    }

    /// Tear the session down, dropping both stores.
    pub fn close(self) {
        info!(platform = self.service.name(), "popup session closed");
    }
}
