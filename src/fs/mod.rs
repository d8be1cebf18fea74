pub mod layout;
pub mod locking;

pub use layout::KnowledgeDir;
