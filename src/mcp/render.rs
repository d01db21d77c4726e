//! Plain-text rendering of registry results for agents and the terminal.

use std::fmt::Write;

use crate::models::*;
use crate::registry::TREE_ENTRY_LIMIT;

pub const EMPTY_LIST: &str = "No resources found.";

fn status(cloned: bool) -> &'static str {
    if cloned {
        "cloned"
    } else {
        "not cloned"
    }
}

/// Render the merged view.
///
/// Example output:
/// ```text
/// svelte [global, cloned]
///   https://github.com/sveltejs/svelte.dev (main)
///   Svelte 5 docs
/// ```
pub fn render_list(listings: &[ResourceListing]) -> String {
    if listings.is_empty() {
        return EMPTY_LIST.to_string();
    }

    let mut output = String::new();
    for (i, listing) in listings.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        let record = &listing.resource.record;
        let _ = writeln!(
            output,
            "{} [{}, {}]",
            record.name,
            listing.resource.scope,
            status(listing.cloned)
        );
        let _ = writeln!(output, "  {} ({})", record.url, record.branch);
        if !record.notes.is_empty() {
            let _ = writeln!(output, "  {}", record.notes);
        }
    }
    output
}

pub fn render_added(resource: &Resource) -> String {
    format!(
        "Added {} resource '{}' from {} ({}).",
        resource.scope,
        resource.name(),
        resource.record.url,
        resource.record.branch
    )
}

pub fn render_removed(resource: &Resource) -> String {
    format!("Removed {} resource '{}'.", resource.scope, resource.name())
}

pub fn render_info(info: &ResourceInfo) -> String {
    let record = &info.resource.record;
    let mut output = String::new();
    let _ = writeln!(output, "Name:       {}", record.name);
    let _ = writeln!(output, "Scope:      {}", info.resource.scope);
    let _ = writeln!(output, "URL:        {}", record.url);
    let _ = writeln!(output, "Branch:     {}", record.branch);
    if !record.notes.is_empty() {
        let _ = writeln!(output, "Notes:      {}", record.notes);
    }
    let _ = writeln!(output, "Path:       {}", info.path.display());
    let _ = writeln!(output, "Status:     {}", status(info.cloned));
    let _ = writeln!(output, "Cloned at:  {}", record.cloned_at.to_rfc3339());
    let _ = writeln!(output, "Updated at: {}", record.updated_at.to_rfc3339());
    if let (Some(bytes), Some(files)) = (info.size_bytes, info.file_count) {
        let _ = writeln!(output, "Size:       {} ({} files)", format_size(bytes), files);
    }
    if let Some(commit) = &info.last_commit {
        let _ = writeln!(output, "Last commit: {}", commit);
    }
    output
}

fn outcome_text(outcome: &ItemOutcome) -> String {
    match outcome {
        ItemOutcome::Updated => "updated".to_string(),
        ItemOutcome::Restored => "restored".to_string(),
        ItemOutcome::NotCloned => "not cloned (run restore first)".to_string(),
        ItemOutcome::AlreadyCloned => "already cloned".to_string(),
        ItemOutcome::Failed(message) => format!("failed: {}", message),
    }
}

/// One line per resource, e.g. `svelte: updated`.
pub fn render_batch(report: &BatchReport) -> String {
    if report.is_empty() {
        return EMPTY_LIST.to_string();
    }

    let mut output = String::new();
    for item in &report.items {
        let _ = writeln!(output, "{}: {}", item.name, outcome_text(&item.outcome));
    }
    output
}

pub fn no_matches(query: &str) -> String {
    format!("No matches found for '{}'.", query)
}

/// Matches grouped under a heading per resource.
pub fn render_search(report: &SearchReport) -> String {
    if report.is_empty() {
        return no_matches(&report.query);
    }

    let mut output = String::new();
    for (i, section) in report.sections.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        if let Some(error) = &section.error {
            let _ = writeln!(output, "## {} (search failed)", section.name);
            let _ = writeln!(output, "{}", error);
            continue;
        }
        let _ = writeln!(output, "## {} ({} matches)", section.name, section.hits.len());
        for hit in &section.hits {
            let _ = writeln!(output, "{}:{}: {}", hit.path, hit.line, hit.text);
        }
    }
    output
}

pub fn render_tree(listing: &TreeListing) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}/", listing.name);
    if listing.entries.is_empty() {
        output.push_str("(empty)\n");
    }
    for entry in &listing.entries {
        let _ = writeln!(output, "  {}", entry);
    }
    if listing.truncated {
        let _ = writeln!(
            output,
            "\n(showing the first {} entries; narrow the path or lower the depth to see more)",
            TREE_ENTRY_LIMIT
        );
    }
    output
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
