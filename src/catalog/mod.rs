//! Prompt catalog wiring.
//!
//! This module wraps prompt libraries on disk (for example
//! `data/prompts.json` and the user's `data/user_prompts.json`) and merges
//! them, in registration order, into one [`Catalog`]. Callers use
//! [`CatalogLoader`] to (re)build the catalog and [`Catalog`] for lookups by
//! id; mutation goes through [`crate::CatalogStore`].

pub mod loader;
pub mod source;

pub use loader::{CatalogLoader, LoadReport, SourceStatus};
pub use source::{LoadStatus, Source, SourceKind, SourceRead, read_source};

use crate::record::{PromptId, PromptRecord};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Default relative path to the bundled prompt library.
pub const DEFAULT_LIBRARY_PATH: &str = "data/prompts.json";
/// Default relative path to the user's own library.
pub const DEFAULT_USER_LIBRARY_PATH: &str = "data/user_prompts.json";

/// A record plus the index of the source it currently belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub record: PromptRecord,
    /// Position of the owning source in the loader's list; `None` for records
    /// that were never read from a source.
    pub origin: Option<usize>,
}

/// Ordered, id-unique view over every loaded prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_id: BTreeMap<PromptId, usize>,
}

impl Catalog {
    /// Build a catalog from loose records, keeping the first of any duplicate id.
    pub fn from_records(records: impl IntoIterator<Item = PromptRecord>) -> Self {
        let mut catalog = Self::default();
        for record in records {
            catalog.merge(record, None, None);
        }
        catalog
    }

    /// Insert a record coming from `origin`.
    ///
    /// A record whose id is already present replaces the earlier one in place
    /// when it comes from another source, unless the earlier one belongs to
    /// `preferred` (the writable source). Records from `preferred` replace
    /// copies from any other source, whichever was registered first, so edits
    /// and usage counts written there always win. A repeat inside the same
    /// source is dropped.
    pub(crate) fn merge(
        &mut self,
        record: PromptRecord,
        origin: Option<usize>,
        preferred: Option<usize>,
    ) {
        let Some(&pos) = self.by_id.get(&record.id) else {
            self.push(record, origin);
            return;
        };
        let current = self.entries[pos].origin;
        if current == origin {
            warn!(id = %record.id, "duplicate prompt id within one source; keeping the first");
        } else if current.is_some() && current == preferred {
            debug!(id = %record.id, "writable copy shadows a library prompt");
        } else {
            self.entries[pos] = CatalogEntry { record, origin };
        }
    }

    pub(crate) fn push(&mut self, record: PromptRecord, origin: Option<usize>) {
        self.by_id.insert(record.id.clone(), self.entries.len());
        self.entries.push(CatalogEntry { record, origin });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Records in catalog order.
    pub fn records(&self) -> impl Iterator<Item = &PromptRecord> {
        self.entries.iter().map(|entry| &entry.record)
    }

    pub fn get(&self, id: &PromptId) -> Option<&PromptRecord> {
        self.by_id.get(id).map(|&pos| &self.entries[pos].record)
    }

    pub(crate) fn entry_mut(&mut self, id: &PromptId) -> Option<&mut CatalogEntry> {
        let pos = *self.by_id.get(id)?;
        self.entries.get_mut(pos)
    }

    pub fn contains(&self, id: &PromptId) -> bool {
        self.by_id.contains_key(id)
    }
}
