//! Popup key bindings.
//!
//! Keys are named the way flows spell them: single characters (`j`, `G`,
//! `/`) or names (`space`, `enter`, `esc`, `up`, `down`, `home`, `end`).

use tabmark_core::{BookmarkView, FocusDelta, FocusEnd};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupCommand {
    MoveFocus(FocusDelta),
    FocusEnd(FocusEnd),
    ToggleFocused,
    ToggleAll,
    CloseChecked,
    CloseFocused,
    ActivateFocused,
    ClearSelection,
    SetView(BookmarkView),
    Refresh,
}

impl PopupCommand {
    /// Commands that talk to the platform.
    pub fn is_async(&self) -> bool {
        matches!(
            self,
            PopupCommand::CloseChecked
                | PopupCommand::CloseFocused
                | PopupCommand::ActivateFocused
                | PopupCommand::Refresh
        )
    }
}

pub fn command_for(key: &str) -> Option<PopupCommand> {
    let command = match key {
        "j" | "down" => PopupCommand::MoveFocus(FocusDelta::Down),
        "k" | "up" => PopupCommand::MoveFocus(FocusDelta::Up),
        "g" | "home" => PopupCommand::FocusEnd(FocusEnd::Start),
        "G" | "end" => PopupCommand::FocusEnd(FocusEnd::End),
        " " | "space" => PopupCommand::ToggleFocused,
        "a" => PopupCommand::ToggleAll,
        "x" => PopupCommand::CloseChecked,
        "d" => PopupCommand::CloseFocused,
        "enter" => PopupCommand::ActivateFocused,
        "h" | "backspace" => PopupCommand::ClearSelection,
        "/" => PopupCommand::SetView(BookmarkView::Search),
        "esc" => PopupCommand::SetView(BookmarkView::Tree),
        "r" => PopupCommand::Refresh,
        _ => match key.to_ascii_lowercase().as_str() {
            "down" | "up" | "home" | "end" | "space" | "enter" | "backspace" | "esc" => {
                return command_for(&key.to_ascii_lowercase())
            }
            _ => return None,
        },
    };
    Some(command)
}

/// Key hint shown under the tab list, highest priority first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionHint {
    pub key: &'static str,
    pub label: &'static str,
    pub priority: u8,
}

fn ordered_hints(items: &[(&'static str, &'static str)]) -> Vec<ActionHint> {
    let mut hints = Vec::with_capacity(items.len());
    let mut priority: i16 = 100;
    for &(key, label) in items {
        hints.push(ActionHint {
            key,
            label,
            priority: priority.max(1) as u8,
        });
        priority -= 5;
    }
    hints
}

/// Hints for the tab list. Bulk close only shows when something is checked.
pub fn tab_hints(any_checked: bool) -> Vec<ActionHint> {
    let mut items = vec![
        ("j/k", "Navigate"),
        ("space", "Check"),
        ("a", "Check all"),
        ("enter", "Go to tab"),
        ("d", "Close tab"),
        ("/", "Search"),
        ("r", "Refresh"),
    ];
    if any_checked {
        items.insert(3, ("x", "Close checked"));
    }
    ordered_hints(&items)
}

pub fn format_hints(hints: &[ActionHint]) -> String {
    hints
        .iter()
        .map(|hint| format!("[{}] {}", hint.key, hint.label))
        .collect::<Vec<_>>()
        .join("  ")
}
