//! Entry commands: init, add, get, update, list, query, categories, tagged.

use super::{nothing, open_kb, parse_object, print_json};
use crate::integration::KnowledgeBase;
use crate::store::{EntryQuery, EntryUpdate, KnowledgeEntry, NewEntry};
use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Map;
use std::path::Path;

pub fn init(root: &Path) -> Result<()> {
    let kb = KnowledgeBase::init(root)
        .with_context(|| format!("Failed to initialize {}", root.display()))?;

    println!(
        "{} Initialized knowledge base at {}",
        "✓".green().bold(),
        root.display()
    );
    println!();
    println!("Categories:");
    for (name, info) in kb.store().categories().iter() {
        println!("  {} - {}", name.bold(), info.description);
    }
    Ok(())
}

pub struct AddArgs {
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub source: String,
    pub confidence: f64,
    pub references: Vec<String>,
    pub metadata: Option<String>,
}

pub fn add(root: &Path, args: AddArgs) -> Result<()> {
    let kb = open_kb(root)?;
    let metadata = match args.metadata.as_deref() {
        Some(raw) => parse_object(raw).context("Invalid --metadata")?,
        None => Map::new(),
    };

    let new = NewEntry::new(args.content, args.category)
        .with_tags(args.tags)
        .with_source(args.source)
        .with_confidence(args.confidence)
        .with_references(args.references)
        .with_metadata(metadata);
    let id = kb.store().add(new)?;

    println!("{} Added {}", "✓".green().bold(), id.bold());
    Ok(())
}

pub fn get(root: &Path, category: &str, id: &str) -> Result<()> {
    let kb = open_kb(root)?;
    match kb.store().get(category, id)? {
        Some(entry) => print_json(&entry),
        None => {
            nothing(&format!("No entry {id} in {category}"));
            Ok(())
        }
    }
}

pub struct UpdateArgs {
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<String>,
    pub confidence: Option<f64>,
}

pub fn update(root: &Path, id: &str, args: UpdateArgs) -> Result<()> {
    let kb = open_kb(root)?;
    let metadata = args
        .metadata
        .as_deref()
        .map(parse_object)
        .transpose()
        .context("Invalid --metadata")?;

    let update = EntryUpdate {
        content: args.content,
        tags: args.tags,
        metadata,
        confidence: args.confidence,
    };
    if update.is_empty() {
        nothing("Nothing to update");
        return Ok(());
    }

    match kb.store().update(id, update)? {
        Some(entry) => {
            println!(
                "{} Updated {} to v{}",
                "✓".green().bold(),
                entry.id.bold(),
                entry.version
            );
        }
        None => nothing(&format!("No entry {id}")),
    }
    Ok(())
}

pub fn list(root: &Path, category: &str) -> Result<()> {
    let kb = open_kb(root)?;
    let ids = kb.store().list(category)?;
    if ids.is_empty() {
        nothing(&format!("No entries in {category}"));
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

pub fn query(root: &Path, query: EntryQuery) -> Result<()> {
    let kb = open_kb(root)?;
    let entries = kb.store().query(&query)?;
    if entries.is_empty() {
        nothing("No matching entries");
    }
    for entry in &entries {
        print_entry_line(entry);
    }
    Ok(())
}

pub fn categories(root: &Path) -> Result<()> {
    let kb = open_kb(root)?;
    for (name, info) in kb.store().categories().iter() {
        let count = kb.store().list(name)?.len();
        println!("{} ({count}) - {}", name.bold(), info.description);
        if !info.tags.is_empty() {
            println!("    tags: {}", info.tags.join(", ").dimmed());
        }
    }
    Ok(())
}

pub fn tagged(root: &Path, tag: &str) -> Result<()> {
    let kb = open_kb(root)?;
    let entries = kb.store().tag_entries(tag)?;
    if entries.is_empty() {
        nothing(&format!("No entries tagged {tag}"));
    }
    for entry in &entries {
        print_entry_line(entry);
    }
    Ok(())
}

fn print_entry_line(entry: &KnowledgeEntry) {
    let preview: String = entry.content.chars().take(72).collect();
    println!(
        "{} {} v{} {:.2}  {}",
        entry.category.dimmed(),
        entry.id.bold(),
        entry.version,
        entry.confidence,
        preview.replace('\n', " ")
    );
}
