//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::model::{Tab, TabQuery};

/// Url pattern of the extension's own bookmark-manager page.
pub const DEFAULT_SELF_SURFACE_PATTERN: &str = r"chrome://bookmarks";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Regex matched against tab urls; matching tabs are hidden from the list.
    pub self_surface_pattern: String,
    /// Filter sent with every tab query.
    pub tab_query: TabQuery,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            self_surface_pattern: DEFAULT_SELF_SURFACE_PATTERN.to_string(),
            tab_query: TabQuery::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(input: &str) -> EngineResult<Self> {
        let config: EngineConfig =
            toml::from_str(input).map_err(|e| EngineError::Config(e.to_string()))?;
        config.surface_filter()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn surface_filter(&self) -> EngineResult<SurfaceFilter> {
        SurfaceFilter::new(&self.self_surface_pattern)
    }
}

/// Compiled self-surface matcher.
#[derive(Debug, Clone)]
pub struct SurfaceFilter {
    pattern: Regex,
}

impl SurfaceFilter {
    pub fn new(pattern: &str) -> EngineResult<Self> {
        let pattern = Regex::new(pattern).map_err(|e| {
            EngineError::Config(format!("invalid self_surface_pattern: {}", e))
        })?;
        Ok(Self { pattern })
    }

    pub fn is_self_surface(&self, tab: &Tab) -> bool {
        tab.url
            .as_deref()
            .map(|url| self.pattern.is_match(url))
            .unwrap_or(false)
    }

    /// Drop tabs that belong to this extension's own surface.
    pub fn retain_foreign(&self, tabs: Vec<Tab>) -> Vec<Tab> {
        tabs.into_iter()
            .filter(|tab| !self.is_self_surface(tab))
            .collect()
    }
}
