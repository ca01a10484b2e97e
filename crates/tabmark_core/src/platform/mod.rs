//! Seam between the engine and the browser's tab and bookmark APIs.
//!
//! The engine only ever talks to a [`PlatformService`]. Production code wires
//! in the real extension bridge; tests and the CLI use [`MemoryPlatform`].

mod fixture;
mod memory;

pub use fixture::Fixture;
pub use memory::{CallKind, MemoryPlatform, PlatformCall};

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::model::{BookmarkNode, Tab, TabId, TabQuery, TabUpdate};

#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<Tab>, PlatformError>;

    async fn remove_tabs(&self, ids: &[TabId]) -> Result<(), PlatformError>;

    async fn update_tab(&self, id: TabId, update: &TabUpdate) -> Result<(), PlatformError>;

    /// The whole bookmark tree under its (possibly synthetic) root.
    async fn get_bookmark_tree(&self) -> Result<BookmarkNode, PlatformError>;
}
