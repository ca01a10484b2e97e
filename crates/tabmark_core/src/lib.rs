//! Tabmark core: navigation and selection state for the bookmark popup.
//!
//! Two stores hold immutable snapshots:
//! - [`TabsStore`]: open tabs, the checked set, and the focus cursor
//! - [`BookmarkStore`]: the bookmark tree, the selected folder, and the view
//!
//! [`PopupSession`] owns both and feeds them from a [`PlatformService`].
//! Everything a renderer needs is read through selectors; nothing derived is
//! stored.

pub mod bookmarks;
pub mod config;
pub mod error;
pub mod model;
pub mod platform;
pub mod session;
pub mod store;
pub mod tabs;
pub mod tree;

pub use bookmarks::{BookmarkAction, BookmarkStore, BookmarkTreeState, BookmarkView};
pub use config::{EngineConfig, SurfaceFilter, DEFAULT_SELF_SURFACE_PATTERN};
pub use error::{EngineError, EngineResult, PlatformError, StoreKind};
pub use model::{BookmarkNode, NodeId, Tab, TabId, TabQuery, TabUpdate, WindowId};
pub use platform::{CallKind, Fixture, MemoryPlatform, PlatformCall, PlatformService};
pub use session::{PopupSession, RefreshReport};
pub use tabs::{FocusDelta, FocusEnd, TabsAction, TabsState, TabsStore};
pub use tree::{flatten, DirectoryRow, NodeDictionary, TreeAudit};
