use anyhow::{bail, Result};

use crate::config::Config;
use crate::engine::SearchEngine;

/// `shakesearch search`: loads the configured corpus and prints one page of
/// snippets for `query`, starting after `existing` matches.
pub fn run_search(config: &Config, query: &str, existing: usize) -> Result<()> {
    if query.is_empty() {
        bail!("missing search query");
    }

    let engine = SearchEngine::load(&config.corpus.path, config.search.options())?;
    let total = engine.total_matches(query)?;
    let snippets = engine.search(query, existing)?;

    print!("{}", render(&snippets, total, existing));
    Ok(())
}

fn render(snippets: &[&str], total: usize, existing: usize) -> String {
    if snippets.is_empty() {
        return if total == 0 {
            "No results.\n".to_string()
        } else {
            format!("No more results ({} total matches).\n", total)
        };
    }

    let mut out = format!(
        "{} total matches, showing {}-{}\n",
        total,
        existing + 1,
        existing + snippets.len()
    );
    for (i, snippet) in snippets.iter().enumerate() {
        out.push_str(&format!("\n--- [{}] ---\n{}\n", existing + i + 1, snippet));
    }
    out
}
