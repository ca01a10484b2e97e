//! Table output for popup state.

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use tabmark_core::{DirectoryRow, NodeId, TabsState};

const MAX_TITLE_CHARS: usize = 48;

pub fn build_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }
    table
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    println!("{}", build_table(headers, rows));
}

/// Shorten to `max` characters, marking the cut with "...".
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// One row per tab: focus marker, check box, id, title, url.
pub fn tab_rows(state: &TabsState) -> Vec<Vec<String>> {
    state
        .tabs
        .iter()
        .enumerate()
        .map(|(idx, tab)| {
            let focus = if state.tab_index == Some(idx) { ">" } else { "" };
            let check = match tab.id {
                Some(id) if state.checked_tab_ids.contains(&id) => "[x]",
                Some(_) => "[ ]",
                None => " - ",
            };
            vec![
                focus.to_string(),
                check.to_string(),
                tab.id.map(|id| id.to_string()).unwrap_or_default(),
                truncate(tab.title.as_deref().unwrap_or(""), MAX_TITLE_CHARS),
                truncate(tab.url_str(), MAX_TITLE_CHARS),
            ]
        })
        .collect()
}

/// One row per folder, indented by depth; the selected folder is starred.
pub fn directory_rows(rows: &[DirectoryRow], selected: Option<&NodeId>) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let marker = if selected == Some(&row.id) { "*" } else { "" };
            vec![
                marker.to_string(),
                row.id.to_string(),
                format!("{}{}", "  ".repeat(row.depth), row.title),
                row.child_count.to_string(),
            ]
        })
        .collect()
}
