//! Personal prompt catalog.
//!
//! Prompt libraries (JSON files) are merged into one [`Catalog`], ranked
//! against a typed query, and kept up to date through [`CatalogStore`], which
//! writes every change into a single designated user library.

pub mod catalog;
pub mod config;
pub mod error;
pub mod ranker;
pub mod record;
pub mod scorer;
pub mod store;

pub use catalog::{
    Catalog, CatalogEntry, CatalogLoader, LoadReport, LoadStatus, Source, SourceKind,
    SourceStatus, read_source,
};
pub use config::{LauncherConfig, resolve_config_path};
pub use error::{PersistenceFailure, StoreError};
pub use ranker::{RELEVANCE_FLOOR, RankedPrompt, Ranking, rank, usage_bonus};
pub use record::{PromptId, PromptRecord, slugify};
pub use scorer::{score, searchable_text};
pub use store::{CatalogStore, Outcome, TextSink, WriterSink};

/// Split a comma- and/or whitespace-separated list, dropping empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
