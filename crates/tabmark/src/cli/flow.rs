//! Popup flow format and parsing.
//!
//! A flow is a versioned JSON script of actions, refreshes, scripted platform
//! failures, and assertions, replayed headlessly against a fixture.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use tabmark_core::{BookmarkView, CallKind, NodeId, PlatformError, TabId};

use super::keymap::command_for;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopupFlow {
    pub version: u32,
    #[serde(default)]
    pub env: FlowEnv,
    pub steps: Vec<FlowStep>,
}

impl PopupFlow {
    pub fn parse(raw: &str) -> Result<Self> {
        let flow: PopupFlow = serde_json::from_str(raw).context("parse flow json")?;
        flow.validate()?;
        Ok(flow)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            bail!("Unsupported popup flow version {}", self.version);
        }
        if self.steps.is_empty() {
            bail!("popup flow must include at least one step");
        }
        for (idx, step) in self.steps.iter().enumerate() {
            step.validate()
                .with_context(|| format!("invalid step {}", idx))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowEnv {
    /// Fixture path, relative to the flow file.
    #[serde(default)]
    pub fixture: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTarget {
    #[default]
    All,
    Tabs,
    Tree,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    #[default]
    Rejected,
    Unavailable,
    Decode,
}

impl FailureKind {
    pub fn error(self, message: &str) -> PlatformError {
        let message = message.to_string();
        match self {
            FailureKind::Rejected => PlatformError::Rejected(message),
            FailureKind::Unavailable => PlatformError::Unavailable(message),
            FailureKind::Decode => PlatformError::Decode(message),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowStep {
    /// Exactly one of the fields must be set.
    Action {
        #[serde(default)]
        key: Option<String>,
        #[serde(default)]
        select_dir: Option<NodeId>,
        #[serde(default)]
        view: Option<BookmarkView>,
        #[serde(default)]
        focus: Option<usize>,
        #[serde(default)]
        toggle: Option<TabId>,
        #[serde(default)]
        label: Option<String>,
    },
    Refresh {
        #[serde(default)]
        target: RefreshTarget,
        #[serde(default)]
        label: Option<String>,
    },
    /// Make the next platform call of `call` fail.
    FailNext {
        call: CallKind,
        #[serde(default)]
        error: FailureKind,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        label: Option<String>,
    },
    Assert {
        #[serde(flatten)]
        assert: FlowAssertion,
        #[serde(default)]
        label: Option<String>,
    },
}

impl FlowStep {
    fn validate(&self) -> Result<()> {
        match self {
            FlowStep::Action {
                key,
                select_dir,
                view,
                focus,
                toggle,
                ..
            } => {
                let set = [
                    key.is_some(),
                    select_dir.is_some(),
                    view.is_some(),
                    focus.is_some(),
                    toggle.is_some(),
                ]
                .iter()
                .filter(|s| **s)
                .count();
                if set != 1 {
                    bail!("action step must set exactly one of key/select_dir/view/focus/toggle");
                }
                if let Some(key) = key {
                    if command_for(key).is_none() {
                        bail!("unknown key '{}'", key);
                    }
                }
                Ok(())
            }
            FlowStep::Refresh { .. } | FlowStep::FailNext { .. } => Ok(()),
            FlowStep::Assert { assert, .. } => {
                if assert.is_empty() {
                    bail!("assert step must define at least one check");
                }
                Ok(())
            }
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            FlowStep::Action { label, .. }
            | FlowStep::Refresh { label, .. }
            | FlowStep::FailNext { label, .. }
            | FlowStep::Assert { label, .. } => label.as_deref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FlowStep::Action { .. } => "action",
            FlowStep::Refresh { .. } => "refresh",
            FlowStep::FailNext { .. } => "fail_next",
            FlowStep::Assert { .. } => "assert",
        }
    }
}

/// Checks against the popup state. Unset fields are not checked.
///
/// `focus` and `selected_dir` accept `null` to assert "no focus" and "root".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowAssertion {
    #[serde(default)]
    pub tab_count: Option<usize>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub focus: Option<Option<usize>>,
    #[serde(default)]
    pub focused_id: Option<TabId>,
    #[serde(default)]
    pub checked: Option<Vec<TabId>>,
    #[serde(default)]
    pub all_checked: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub selected_dir: Option<Option<NodeId>>,
    #[serde(default)]
    pub view: Option<BookmarkView>,
    #[serde(default)]
    pub dictionary_size: Option<usize>,
    #[serde(default)]
    pub children_count: Option<usize>,
    #[serde(default)]
    pub breadcrumbs: Option<Vec<NodeId>>,
    /// Tabs still open on the platform, which lags the popup after a close.
    #[serde(default)]
    pub platform_tab_count: Option<usize>,
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub tab_urls_contain: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub tab_urls_not_contain: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub error_contains: Vec<String>,
    #[serde(default)]
    pub no_error: Option<bool>,
}

impl FlowAssertion {
    pub fn is_empty(&self) -> bool {
        self.tab_count.is_none()
            && self.focus.is_none()
            && self.focused_id.is_none()
            && self.checked.is_none()
            && self.all_checked.is_none()
            && self.selected_dir.is_none()
            && self.view.is_none()
            && self.dictionary_size.is_none()
            && self.children_count.is_none()
            && self.breadcrumbs.is_none()
            && self.platform_tab_count.is_none()
            && self.tab_urls_contain.is_empty()
            && self.tab_urls_not_contain.is_empty()
            && self.error_contains.is_empty()
            && self.no_error.is_none()
    }
}

/// A present key (even `null`) becomes `Some`; a missing key stays `None`.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrVec {
        One(String),
        Many(Vec<String>),
    }

    match StringOrVec::deserialize(deserializer)? {
        StringOrVec::One(value) => Ok(vec![value]),
        StringOrVec::Many(values) => Ok(values),
    }
}
