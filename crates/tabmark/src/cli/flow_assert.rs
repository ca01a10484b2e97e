use std::fmt;

use regex::Regex;
use serde::Serialize;
use tabmark_core::{BookmarkView, MemoryPlatform, NodeId, PopupSession, TabId};

use super::flow::FlowAssertion;

/// Everything a flow assertion can look at, captured after a step.
#[derive(Debug, Clone, Serialize)]
pub struct FlowSnapshot {
    pub tab_count: usize,
    pub focus: Option<usize>,
    pub focused_id: Option<TabId>,
    pub checked: Vec<TabId>,
    pub all_checked: bool,
    pub selected_dir: Option<NodeId>,
    pub view: BookmarkView,
    pub dictionary_size: usize,
    pub children_count: usize,
    pub breadcrumbs: Vec<NodeId>,
    pub platform_tab_count: usize,
    pub tab_urls: Vec<String>,
    pub last_error: Option<String>,
}

impl FlowSnapshot {
    pub fn capture(
        session: &PopupSession,
        platform: &MemoryPlatform,
        last_error: Option<&str>,
    ) -> Self {
        let tabs = session.tabs().snapshot();
        let bookmarks = session.bookmarks();
        let tree = bookmarks.snapshot();
        let mut checked: Vec<TabId> = tabs.checked_tab_ids.iter().copied().collect();
        checked.sort();

        Self {
            tab_count: tabs.tabs.len(),
            focus: tabs.tab_index,
            focused_id: session.tabs().focused_id(),
            checked,
            all_checked: session.tabs().all_checked(),
            selected_dir: tree.selected_dir_id.clone(),
            view: tree.view,
            dictionary_size: bookmarks.dictionary().len(),
            children_count: bookmarks
                .selected_node()
                .map(|node| node.children().len())
                .unwrap_or(0),
            breadcrumbs: bookmarks.breadcrumbs(),
            platform_tab_count: platform.tabs().len(),
            tab_urls: tabs.tabs.iter().map(|t| t.url_str().to_string()).collect(),
            last_error: last_error.map(str::to_string),
        }
    }
}

#[derive(Debug)]
pub struct FlowAssertError {
    pub failures: Vec<String>,
}

impl fmt::Display for FlowAssertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} assertion(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n  - {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for FlowAssertError {}

fn check_eq<T: PartialEq + fmt::Debug>(
    failures: &mut Vec<String>,
    name: &str,
    expected: Option<&T>,
    actual: &T,
) {
    if let Some(expected) = expected {
        if expected != actual {
            failures.push(format!(
                "{}: expected {:?}, got {:?}",
                name, expected, actual
            ));
        }
    }
}

pub fn assert_flow(assertion: &FlowAssertion, snapshot: &FlowSnapshot) -> Result<(), FlowAssertError> {
    let mut failures = Vec::new();

    check_eq(&mut failures, "tab_count", assertion.tab_count.as_ref(), &snapshot.tab_count);
    check_eq(&mut failures, "focus", assertion.focus.as_ref(), &snapshot.focus);
    if let Some(expected) = assertion.focused_id {
        check_eq(&mut failures, "focused_id", Some(&Some(expected)), &snapshot.focused_id);
    }
    if let Some(expected) = &assertion.checked {
        let mut expected = expected.clone();
        expected.sort();
        check_eq(&mut failures, "checked", Some(&expected), &snapshot.checked);
    }
    check_eq(&mut failures, "all_checked", assertion.all_checked.as_ref(), &snapshot.all_checked);
    check_eq(
        &mut failures,
        "selected_dir",
        assertion.selected_dir.as_ref(),
        &snapshot.selected_dir,
    );
    check_eq(&mut failures, "view", assertion.view.as_ref(), &snapshot.view);
    check_eq(
        &mut failures,
        "dictionary_size",
        assertion.dictionary_size.as_ref(),
        &snapshot.dictionary_size,
    );
    check_eq(
        &mut failures,
        "children_count",
        assertion.children_count.as_ref(),
        &snapshot.children_count,
    );
    check_eq(
        &mut failures,
        "breadcrumbs",
        assertion.breadcrumbs.as_ref(),
        &snapshot.breadcrumbs,
    );
    check_eq(
        &mut failures,
        "platform_tab_count",
        assertion.platform_tab_count.as_ref(),
        &snapshot.platform_tab_count,
    );

    let urls = snapshot.tab_urls.join("\n");
    check_patterns(&mut failures, "tab_urls_contain", &assertion.tab_urls_contain, &urls, true);
    check_patterns(
        &mut failures,
        "tab_urls_not_contain",
        &assertion.tab_urls_not_contain,
        &urls,
        false,
    );

    let error = snapshot.last_error.as_deref().unwrap_or("");
    if !assertion.error_contains.is_empty() && snapshot.last_error.is_none() {
        failures.push("error_contains: no error was recorded".to_string());
    } else {
        check_patterns(&mut failures, "error_contains", &assertion.error_contains, error, true);
    }
    if assertion.no_error == Some(true) {
        if let Some(err) = &snapshot.last_error {
            failures.push(format!("no_error: last step failed with '{}'", err));
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(FlowAssertError { failures })
    }
}

fn check_patterns(
    failures: &mut Vec<String>,
    name: &str,
    patterns: &[String],
    text: &str,
    should_match: bool,
) {
    for pattern in patterns {
        match Regex::new(pattern) {
            Ok(regex) => {
                let matched = regex.is_match(text);
                if matched != should_match {
                    let verb = if should_match { "missing" } else { "unexpected" };
                    failures.push(format!("{}: {} /{}/", name, verb, pattern));
                }
            }
            Err(err) => failures.push(format!("{}: invalid regex '{}': {}", name, pattern, err)),
        }
    }
}
