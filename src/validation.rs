//! Name validation for ids, categories and tags.
//!
//! Every user-supplied name ends up in a file path, so names are checked
//! before any path is constructed to rule out traversal (`../`) and
//! platform-reserved names.

use crate::error::{KnowledgeError, Result};

/// Maximum allowed length for entry ids and category names.
pub const MAX_NAME_LENGTH: usize = 128;

/// Reserved names that cannot be used as ids (case-insensitive).
const RESERVED_NAMES: &[&str] = &[
    ".", "..", "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7",
    "com8", "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

fn invalid(name: &str, reason: impl Into<String>) -> KnowledgeError {
    KnowledgeError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validates that an entry id or category name is safe for use in file paths.
///
/// A name is valid if it is non-empty, at most [`MAX_NAME_LENGTH`]
/// characters, made only of ASCII alphanumerics, dashes and underscores,
/// and not a reserved system name.
///
/// ```
/// use crewkb::validation::validate_name;
///
/// assert!(validate_name("model-x").is_ok());
/// assert!(validate_name("prompt_templates").is_ok());
/// assert!(validate_name("").is_err());
/// assert!(validate_name("../etc/passwd").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "name cannot be empty"));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(invalid(
            name,
            format!(
                "too long: {} characters (max {MAX_NAME_LENGTH})",
                name.len()
            ),
        ));
    }

    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid_chars {
        return Err(invalid(
            name,
            "use only alphanumeric characters, dashes (-), and underscores (_)",
        ));
    }

    if RESERVED_NAMES.contains(&name.to_lowercase().as_str()) {
        return Err(invalid(name, "reserved name"));
    }

    Ok(())
}

/// Map an arbitrary tag onto a file-name-safe stem.
///
/// Tags are free text, so instead of rejecting them every character outside
/// `[A-Za-z0-9_-]` is replaced with `_`. Distinct tags may share a stem; the
/// tag index filters on the entry's actual tags at read time.
pub fn sanitize_tag(tag: &str) -> String {
    let stem: String = tag
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.is_empty() {
        "_".to_string()
    } else {
        stem
    }
}

/// Clap value parser for id and category arguments.
pub fn clap_name_validator(s: &str) -> std::result::Result<String, String> {
    validate_name(s).map_err(|e| e.to_string())?;
    Ok(s.to_string())
}
