//! Document and model commands.

use super::{nothing, open_kb, parse_object, print_json, read_body};
use crate::integration::MODEL_CATEGORY;
use crate::KnowledgeError;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

pub fn store(
    root: &Path,
    category: &str,
    id: &str,
    json: Option<&str>,
    file: Option<&Path>,
) -> Result<()> {
    let kb = open_kb(root)?;
    let body = read_body(json, file)?;
    let entry = if category == MODEL_CATEGORY {
        kb.update_model_capabilities(id, body)?
    } else {
        kb.store_entry(category, id, body)?
    };

    println!(
        "{} Stored {}/{} (v{})",
        "✓".green().bold(),
        category,
        entry.id.bold(),
        entry.version
    );
    Ok(())
}

pub fn model(root: &Path, model_id: &str) -> Result<()> {
    let mut kb = open_kb(root)?;
    match kb.get_model_config(model_id)? {
        Some(config) => print_json(&config),
        None => {
            nothing(&format!("No capabilities recorded for {model_id}"));
            Ok(())
        }
    }
}

pub fn compat(root: &Path, template_id: &str, model_id: &str) -> Result<()> {
    let kb = open_kb(root)?;
    if kb.validate_model_compatibility(template_id, model_id)? {
        println!(
            "{} {template_id} is compatible with {model_id}",
            "✓".green().bold()
        );
    } else {
        println!(
            "{} {template_id} is not compatible with {model_id}",
            "✗".red().bold()
        );
    }
    Ok(())
}

pub fn templates(root: &Path, model_id: &str) -> Result<()> {
    let kb = open_kb(root)?;
    let templates = kb.compatible_templates(model_id)?;
    if templates.is_empty() {
        nothing(&format!("No templates compatible with {model_id}"));
    }
    for template in templates {
        println!("{template}");
    }
    Ok(())
}

pub fn template(root: &Path, template_id: &str) -> Result<()> {
    let mut kb = open_kb(root)?;
    match kb.get_prompt_template(template_id)? {
        Some(template) => print_json(&template),
        None => {
            nothing(&format!("No template {template_id}"));
            Ok(())
        }
    }
}

pub fn domain(root: &Path, domain: &str) -> Result<()> {
    let mut kb = open_kb(root)?;
    let hits = kb.get_domain_knowledge(domain)?;
    if hits.is_empty() {
        nothing(&format!("No domain knowledge for {domain}"));
        return Ok(());
    }
    print_json(&hits)
}

pub fn tips(root: &Path, model_id: &str) -> Result<()> {
    let kb = open_kb(root)?;
    let tips = kb.get_optimization_tips(model_id)?;
    if tips.is_empty() {
        nothing(&format!("No optimization tips for {model_id}"));
    }
    for tip in tips {
        println!("• {tip}");
    }
    Ok(())
}

pub fn perf(root: &Path, model_id: &str, metrics: &str) -> Result<()> {
    let kb = open_kb(root)?;
    let metrics = parse_object(metrics).context("Invalid metrics")?;
    if kb.update_model_performance(model_id, metrics)? {
        println!(
            "{} Recorded performance metrics for {}",
            "✓".green().bold(),
            model_id.bold()
        );
        Ok(())
    } else {
        Err(KnowledgeError::NotFound(format!("{MODEL_CATEGORY}/{model_id}")).into())
    }
}
