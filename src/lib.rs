pub mod commands;
pub mod completions;
pub mod config;
pub mod error;
pub mod fs;
pub mod integration;
pub mod search;
pub mod store;
pub mod validation;

pub use error::{KnowledgeError, Result};
pub use integration::KnowledgeBase;
