//! Owner of the working catalog and every mutation applied to it.
//!
//! [`CatalogStore`] holds the loader, the merged catalog and the designated
//! writable source. Every successful mutation updates the catalog first and
//! then writes the affected record into the writable source with a fresh
//! read-modify-write of that file; no other source is ever written. A failed
//! write is logged and handed back in [`Outcome::warning`] while the in-memory
//! change stands, so the session stays usable.

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::catalog::source::SourceDocument;
use crate::catalog::{Catalog, CatalogLoader, LoadReport, Source, SourceKind, SourceStatus};
use crate::error::{PersistenceFailure, StoreError};
use crate::ranker::{RankedPrompt, rank};
use crate::record::{PromptId, PromptRecord, slugify};

/// Fields rewritten on the persisted object by [`CatalogStore::update`].
const EDITABLE_FIELDS: &[&str] = &["name", "tags", "prompt"];
const USAGE_FIELDS: &[&str] = &["usage_count"];

/// Result of a mutation plus any write failure it ran into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub value: T,
    pub warning: Option<PersistenceFailure>,
}

impl<T> Outcome<T> {
    pub fn is_persisted(&self) -> bool {
        self.warning.is_none()
    }
}

#[derive(Debug)]
pub struct CatalogStore {
    loader: CatalogLoader,
    catalog: Catalog,
    statuses: Vec<SourceStatus>,
}

impl CatalogStore {
    /// Register `sources`, pick the writable one and load the catalog.
    ///
    /// `writable` names the source that receives mutations; it is registered
    /// as a user source if missing from `sources`. Without it, the first
    /// [`SourceKind::User`] source is used.
    pub fn open(sources: impl IntoIterator<Item = Source>, writable: Option<&Path>) -> Self {
        let mut loader = CatalogLoader::new(sources);
        let writable = match writable {
            Some(path) => match loader.position(path) {
                Some(idx) => Some(idx),
                None => {
                    loader.register(Source::user(path));
                    loader.position(path)
                }
            },
            None => loader
                .sources()
                .iter()
                .position(|source| source.kind == SourceKind::User),
        };
        if writable.is_none() {
            warn!("no writable prompt source; changes will only last for this session");
        }
        loader.set_writable(writable);

        let report = loader.load();
        let mut store = Self {
            loader,
            catalog: Catalog::default(),
            statuses: Vec::new(),
        };
        store.apply(report);
        store
    }

    fn apply(&mut self, report: LoadReport) {
        self.catalog = report.catalog;
        self.statuses = report.statuses;
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Load status of every source from the most recent (re)load.
    pub fn statuses(&self) -> &[SourceStatus] {
        &self.statuses
    }

    pub fn sources(&self) -> &[Source] {
        self.loader.sources()
    }

    pub fn writable_location(&self) -> Option<&Path> {
        self.loader
            .writable()
            .and_then(|idx| self.loader.sources().get(idx))
            .map(|source| source.location.as_path())
    }

    pub fn get(&self, id: &PromptId) -> Option<&PromptRecord> {
        self.catalog.get(id)
    }

    /// Rebuild the catalog from all sources, replacing it in one step.
    pub fn reload(&mut self) -> &[SourceStatus] {
        let report = self.loader.reload();
        self.apply(report);
        &self.statuses
    }

    /// Register an extra library (no-op if present) and reload everything.
    pub fn add_source(&mut self, location: impl Into<PathBuf>) -> &[SourceStatus] {
        let report = self.loader.add_source(Source::library(location));
        self.apply(report);
        &self.statuses
    }

    pub fn rank(&self, query: &str, limit: usize) -> Vec<RankedPrompt<'_>> {
        rank(query, &self.catalog, limit)
    }

    /// Create a prompt with an id derived from its name.
    pub fn add(
        &mut self,
        name: &str,
        text: &str,
        tags: Vec<String>,
    ) -> Result<Outcome<PromptRecord>, StoreError> {
        let name = required("name", name)?;
        required("text", text)?;

        let id = self.unique_id(&slugify(name));
        let record = PromptRecord::new(id, name, text, clean_tags(tags));
        self.catalog.push(record.clone(), self.loader.writable());
        info!(id = %record.id, "added prompt");

        let warning = self.persist(|doc| doc.append(&record));
        Ok(Outcome {
            value: record,
            warning,
        })
    }

    /// Replace name, text and tags of an existing prompt.
    ///
    /// Usage count and placeholders are kept. A prompt that came from a
    /// read-only library is copied into the writable source.
    pub fn update(
        &mut self,
        id: &PromptId,
        name: &str,
        text: &str,
        tags: Vec<String>,
    ) -> Result<Outcome<PromptRecord>, StoreError> {
        let name = required("name", name)?;
        required("text", text)?;

        let writable = self.loader.writable();
        let entry = self
            .catalog
            .entry_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;
        entry.record.name = name.to_string();
        entry.record.text = text.to_string();
        entry.record.tags = clean_tags(tags);
        if writable.is_some() {
            entry.origin = writable;
        }
        let record = entry.record.clone();
        info!(id = %record.id, "updated prompt");

        let warning = self.persist(|doc| doc.upsert(&record, EDITABLE_FIELDS));
        Ok(Outcome {
            value: record,
            warning,
        })
    }

    /// Count one more use of `id`; unknown ids are ignored and yield `None`.
    ///
    /// The new count is written to the writable source before returning, so a
    /// fresh load sees it.
    pub fn increment_usage(&mut self, id: &PromptId) -> Option<Outcome<u64>> {
        let writable = self.loader.writable();
        let Some(entry) = self.catalog.entry_mut(id) else {
            debug!(%id, "usage increment for unknown prompt ignored");
            return None;
        };
        entry.record.usage_count = entry.record.usage_count.saturating_add(1);
        if writable.is_some() {
            entry.origin = writable;
        }
        let record = entry.record.clone();

        let warning = self.persist(|doc| doc.upsert(&record, USAGE_FIELDS));
        Some(Outcome {
            value: record.usage_count,
            warning,
        })
    }

    /// A prompt was chosen: record the use and return the prompt.
    pub fn select(&mut self, id: &PromptId) -> Option<Outcome<PromptRecord>> {
        let usage = self.increment_usage(id)?;
        let record = self.catalog.get(id)?.clone();
        Some(Outcome {
            value: record,
            warning: usage.warning,
        })
    }

    /// [`CatalogStore::select`], then hand the prompt text to `sink`.
    pub fn select_into<S: TextSink + ?Sized>(
        &mut self,
        id: &PromptId,
        sink: &mut S,
    ) -> anyhow::Result<Option<Outcome<PromptRecord>>> {
        let Some(outcome) = self.select(id) else {
            return Ok(None);
        };
        sink.deliver(&outcome.value.text)?;
        Ok(Some(outcome))
    }

    fn unique_id(&self, base: &str) -> PromptId {
        let mut candidate = PromptId(base.to_string());
        let mut suffix = 1;
        while self.catalog.contains(&candidate) {
            candidate = PromptId(format!("{base}-{suffix}"));
            suffix += 1;
        }
        candidate
    }

    fn persist(
        &self,
        edit: impl FnOnce(&mut SourceDocument) -> anyhow::Result<()>,
    ) -> Option<PersistenceFailure> {
        let Some(path) = self.writable_location() else {
            let failure = PersistenceFailure::no_writable_source();
            warn!("{failure}");
            return Some(failure);
        };

        let written = SourceDocument::open(path).and_then(|mut doc| {
            edit(&mut doc)?;
            doc.save(path)
        });
        match written {
            Ok(()) => None,
            Err(err) => {
                let failure = PersistenceFailure::new(path, format!("{err:#}"));
                warn!("{failure}; keeping the change in memory only");
                Some(failure)
            }
        }
    }
}

/// Receiver of a selected prompt's text (clipboard, paste target, stdout).
pub trait TextSink {
    fn deliver(&mut self, text: &str) -> anyhow::Result<()>;
}

/// [`TextSink`] over any writer; writes the text verbatim.
#[derive(Debug)]
pub struct WriterSink<W: Write>(pub W);

impl<W: Write> TextSink for WriterSink<W> {
    fn deliver(&mut self, text: &str) -> anyhow::Result<()> {
        self.0.write_all(text.as_bytes())?;
        self.0.flush()?;
        Ok(())
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation { field });
    }
    Ok(trimmed)
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}
