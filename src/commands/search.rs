//! Search commands: reindex, search, related, recent, history, stats.

use super::{nothing, open_kb, print_json};
use crate::search::SearchHit;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub fn reindex(root: &Path) -> Result<()> {
    let mut kb = open_kb(root)?;
    let path = kb.refresh_index()?;
    let count = kb.engine().snapshot().map(|s| s.len()).unwrap_or(0);
    println!(
        "{} Indexed {count} entries into {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

pub fn search(
    root: &Path,
    query: &str,
    categories: Vec<String>,
    limit: usize,
    source: Option<&str>,
) -> Result<()> {
    let mut kb = open_kb(root)?;
    let categories = (!categories.is_empty()).then_some(categories);
    let hits = kb.search(query, categories.as_deref(), limit, source)?;
    print_hits(&hits, "No results");
    print_snapshot_age(kb.engine().snapshot_taken_at());
    Ok(())
}

pub fn related(root: &Path, entry: &str, limit: usize) -> Result<()> {
    let kb = open_kb(root)?;
    let hits = kb.engine().get_related(entry, limit);
    print_hits(&hits, "No related entries");
    print_snapshot_age(kb.engine().snapshot_taken_at());
    Ok(())
}

pub fn recent(root: &Path, days: i64) -> Result<()> {
    let kb = open_kb(root)?;
    let updates = kb.engine().get_recent_updates(days);
    if updates.is_empty() {
        nothing(&format!("No updates in the last {days} days"));
    }
    for update in updates {
        println!(
            "{}  {}/{}",
            update.updated.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            update.category,
            update.entry_id.bold()
        );
    }
    Ok(())
}

pub fn history(root: &Path, source: Option<&str>, limit: usize) -> Result<()> {
    let kb = open_kb(root)?;
    let records = kb.log().history(source, limit);
    if records.is_empty() {
        nothing("No recorded searches");
    }
    for record in records {
        println!(
            "{}  {} {:?} ({} results)",
            record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            record.source.bold(),
            record.query,
            record.results.len()
        );
    }
    Ok(())
}

pub fn stats(root: &Path, source: Option<&str>, days: i64) -> Result<()> {
    let kb = open_kb(root)?;
    print_json(&kb.log().analyze(source, days))
}

fn print_hits(hits: &[SearchHit], empty: &str) {
    if hits.is_empty() {
        nothing(empty);
        return;
    }
    for hit in hits {
        let preview: String = hit.content.chars().take(72).collect();
        println!(
            "{:.4}  {}  {}",
            hit.relevance,
            hit.key.bold(),
            preview.replace('\n', " ").dimmed()
        );
    }
}

fn print_snapshot_age(taken_at: Option<chrono::DateTime<chrono::Utc>>) {
    match taken_at {
        Some(at) => println!(
            "{}",
            format!("snapshot taken {}", at.format("%Y-%m-%d %H:%M:%S")).dimmed()
        ),
        None => println!(
            "{}",
            "no snapshot yet - run 'crewkb reindex'".dimmed()
        ),
    }
}
