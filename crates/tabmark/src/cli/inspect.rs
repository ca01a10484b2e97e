//! `tabmark inspect`: print popup state for a recorded fixture.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabmark_core::tree::{self, TreeAudit};
use tabmark_core::{
    BookmarkNode, BookmarkView, DirectoryRow, EngineConfig, Fixture, MemoryPlatform, NodeId,
    PlatformError, PlatformService, PopupSession, TabId, TabsState,
};
use tracing::warn;

use super::error::HelpfulError;
use super::keymap::{format_hints, tab_hints};
use super::output::{directory_rows, print_table, tab_rows};

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Fixture JSON: {"tabs": [...], "tree": {...}}
    pub fixture: PathBuf,

    /// Select this folder before printing
    #[arg(long)]
    pub dir: Option<String>,

    /// Search bookmark titles and urls
    #[arg(long)]
    pub search: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Load a fixture into a fresh in-memory platform and open a session on it.
pub fn open_fixture(
    path: &Path,
    config: &EngineConfig,
) -> Result<(Arc<MemoryPlatform>, PopupSession)> {
    if !path.exists() {
        return Err(HelpfulError::file_not_found(path).into());
    }
    let fixture = Fixture::load(path).map_err(|e| match e {
        PlatformError::Decode(details) => HelpfulError::invalid_fixture(path, &details),
        other => HelpfulError::new(other.to_string()),
    })?;
    let platform = Arc::new(fixture.into_platform());
    let session = PopupSession::open(platform.clone(), config).context("open popup session")?;
    Ok((platform, session))
}

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")
}

#[derive(Debug, Serialize)]
struct TabRow {
    id: Option<TabId>,
    title: Option<String>,
    url: Option<String>,
    checked: bool,
    focused: bool,
}

#[derive(Debug, Serialize)]
struct BookmarkHit {
    id: NodeId,
    title: String,
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    platform: String,
    tabs: Vec<TabRow>,
    focus: Option<usize>,
    all_checked: bool,
    view: BookmarkView,
    selected_dir: Option<NodeId>,
    breadcrumbs: Vec<NodeId>,
    directories: Vec<DirectoryRow>,
    children: Vec<BookmarkHit>,
    search: Option<Vec<BookmarkHit>>,
    dictionary_size: usize,
    audit: Option<TreeAudit>,
    errors: Vec<String>,
}

pub fn run(args: InspectArgs, config: &EngineConfig) -> Result<()> {
    let (platform, session) = open_fixture(&args.fixture, config)?;
    let rt = runtime()?;
    let refresh = rt.block_on(session.refresh_all());

    let errors: Vec<String> = [refresh.tabs.as_ref().err(), refresh.tree.as_ref().err()]
        .into_iter()
        .flatten()
        .map(|e| {
            warn!(error = %e, "refresh failed during inspect");
            e.to_string()
        })
        .collect();

    if let Some(dir) = args.dir.as_deref() {
        session.bookmarks().select_dir(NodeId::parse(dir).context("invalid --dir")?);
    }

    let search: Option<Vec<BookmarkHit>> = args
        .search
        .as_deref()
        .map(|query| {
            session.bookmarks().set_view(BookmarkView::Search);
            session.bookmarks().search(query)
        })
        .map(|hits| hits.iter().map(|n| hit(n)).collect());

    let report = build_report(platform.as_ref(), &session, search, errors);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &session.tabs().snapshot());
    }
    session.close();
    Ok(())
}

fn hit(node: &BookmarkNode) -> BookmarkHit {
    BookmarkHit {
        id: node.id.clone(),
        title: node.title.clone(),
        url: node.url.clone(),
    }
}

fn build_report(
    platform: &MemoryPlatform,
    session: &PopupSession,
    search: Option<Vec<BookmarkHit>>,
    errors: Vec<String>,
) -> InspectReport {
    let tabs = session.tabs().snapshot();
    let bookmarks = session.bookmarks();
    let tree_state = bookmarks.snapshot();

    let rows = tabs
        .tabs
        .iter()
        .enumerate()
        .map(|(idx, tab)| TabRow {
            id: tab.id,
            title: tab.title.clone(),
            url: tab.url.clone(),
            checked: tab.id.is_some_and(|id| tabs.checked_tab_ids.contains(&id)),
            focused: tabs.tab_index == Some(idx),
        })
        .collect();

    let children: Vec<BookmarkHit> = bookmarks
        .selected_node()
        .map(|node| node.children().iter().map(|c| hit(c)).collect())
        .unwrap_or_default();

    InspectReport {
        platform: platform.name().to_string(),
        tabs: rows,
        focus: tabs.tab_index,
        all_checked: session.tabs().all_checked(),
        view: tree_state.view,
        selected_dir: tree_state.selected_dir_id.clone(),
        breadcrumbs: bookmarks.breadcrumbs(),
        directories: bookmarks.visible_directories(),
        children,
        search,
        dictionary_size: bookmarks.dictionary().len(),
        audit: tree_state.root.as_ref().map(tree::audit),
        errors,
    }
}

fn print_report(report: &InspectReport, tabs: &TabsState) {
    println!("Tabs ({})", tabs.tabs.len());
    print_table(&["", "", "ID", "TITLE", "URL"], tab_rows(tabs));
    println!("{}", format_hints(&tab_hints(!tabs.checked_tab_ids.is_empty())));
    println!();

    println!(
        "Folders ({}), {} nodes",
        report.directories.len(),
        report.dictionary_size
    );
    print_table(
        &["", "ID", "FOLDER", "ITEMS"],
        directory_rows(&report.directories, report.selected_dir.as_ref()),
    );

    if !report.breadcrumbs.is_empty() {
        let path: Vec<String> = report.breadcrumbs.iter().map(|id| id.to_string()).collect();
        println!("Path: {}", path.join(" / "));
    }
    if !report.children.is_empty() {
        let rows = report
            .children
            .iter()
            .map(|c| {
                vec![
                    c.id.to_string(),
                    c.title.clone(),
                    c.url.clone().unwrap_or_else(|| "(folder)".to_string()),
                ]
            })
            .collect();
        print_table(&["ID", "TITLE", "URL"], rows);
    }

    if let Some(hits) = &report.search {
        println!("Search results ({})", hits.len());
        for hit in hits {
            println!("  {}  {}  {}", hit.id, hit.title, hit.url.as_deref().unwrap_or(""));
        }
    }

    if let Some(audit) = report.audit.as_ref().filter(|a| !a.is_clean()) {
        println!(
            "Warning: tree audit found {} duplicate id(s), {} mixed node(s)",
            audit.duplicate_ids.len(),
            audit.mixed_nodes.len()
        );
    }
    for error in &report.errors {
        println!("Warning: {}", error);
    }
}
