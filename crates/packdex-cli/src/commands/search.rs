//! Search command

use packdex_repo::{RepoManager, ScoredResult, SearchOptions};
use serde::Serialize;

use super::{OutputFormat, print_structured, print_table};
use crate::error::Result;

const DESCRIPTION_WIDTH: usize = 50;

/// One search hit as printed
#[derive(Debug, Serialize, PartialEq)]
struct SearchRow {
    name: String,
    version: String,
    app_version: String,
    description: String,
}

impl From<&ScoredResult> for SearchRow {
    fn from(result: &ScoredResult) -> Self {
        let entry = &result.version_entry;
        Self {
            name: result.qualified_name(),
            version: entry.version.clone(),
            app_version: entry.app_version.clone().unwrap_or_default(),
            description: entry.description.clone().unwrap_or_default(),
        }
    }
}

/// Search the cached repository indexes
pub fn run(manager: &RepoManager, options: &SearchOptions, output: OutputFormat) -> Result<()> {
    let results = manager.search_packages(options)?;
    let rows: Vec<SearchRow> = results.iter().map(SearchRow::from).collect();

    if print_structured(&rows, output)? {
        return Ok(());
    }

    if rows.is_empty() {
        println!("No results found");
        return Ok(());
    }

    let table: Vec<_> = rows
        .into_iter()
        .map(|row| {
            vec![
                row.name,
                row.version,
                row.app_version,
                truncate(&row.description, DESCRIPTION_WIDTH),
            ]
        })
        .collect();
    print_table(&["NAME", "CHART VERSION", "APP VERSION", "DESCRIPTION"], &table);
    Ok(())
}

/// Cut `text` to at most `max` characters, marking the cut with "..."
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
