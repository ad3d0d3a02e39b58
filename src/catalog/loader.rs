//! Builds a [`Catalog`] from an ordered list of prompt libraries.
//!
//! Loading is all-or-nothing per source and never fails overall: each source
//! contributes its records or an explanatory [`LoadStatus`], and the caller
//! swaps the finished catalog in one assignment.

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::catalog::source::{LoadStatus, Source, read_source};

/// Load outcome for one registered source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub source: Source,
    pub status: LoadStatus,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub catalog: Catalog,
    /// One entry per source, in registration order.
    pub statuses: Vec<SourceStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogLoader {
    sources: Vec<Source>,
    /// Index of the source whose records win every id collision.
    writable: Option<usize>,
}

impl CatalogLoader {
    /// Register `sources` in order, dropping repeated locations.
    pub fn new(sources: impl IntoIterator<Item = Source>) -> Self {
        let mut loader = Self::default();
        for source in sources {
            loader.register(source);
        }
        loader
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Mark the source at `idx` as the writable one; its records shadow
    /// every other source regardless of registration order.
    pub fn set_writable(&mut self, idx: Option<usize>) {
        self.writable = idx.filter(|&idx| idx < self.sources.len());
    }

    pub fn writable(&self) -> Option<usize> {
        self.writable
    }

    /// Position of the source at `location`, if registered.
    pub fn position(&self, location: &Path) -> Option<usize> {
        self.sources
            .iter()
            .position(|source| same_location(&source.location, location))
    }

    /// Append `source` unless its location is already registered.
    pub fn register(&mut self, source: Source) -> bool {
        if self.position(&source.location).is_some() {
            return false;
        }
        self.sources.push(source);
        true
    }

    /// Read every source and merge the records in registration order.
    pub fn load(&self) -> LoadReport {
        let mut catalog = Catalog::default();
        let mut statuses = Vec::with_capacity(self.sources.len());

        for (idx, source) in self.sources.iter().enumerate() {
            let read = read_source(&source.location);
            if read.status.is_ok() {
                debug!(source = %source.location.display(), status = %read.status, "loaded prompt source");
            } else {
                warn!(source = %source.location.display(), status = %read.status, "prompt source contributed no records");
            }
            for record in read.records {
                catalog.merge(record, Some(idx), self.writable);
            }
            statuses.push(SourceStatus {
                source: source.clone(),
                status: read.status,
            });
        }

        info!(
            prompts = catalog.len(),
            sources = self.sources.len(),
            "prompt catalog loaded"
        );
        LoadReport { catalog, statuses }
    }

    /// Same as [`CatalogLoader::load`]; named for call sites that refresh.
    pub fn reload(&self) -> LoadReport {
        self.load()
    }

    /// Register another source (ignored if already present) and reload.
    pub fn add_source(&mut self, source: Source) -> LoadReport {
        if !self.register(source) {
            debug!("prompt source already registered; reloading only");
        }
        self.load()
    }
}

fn same_location(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
