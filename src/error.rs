//! Error taxonomy for catalog mutations.
//!
//! Validation and lookup failures abort a mutation before any state changes
//! and surface as [`StoreError`]. Write failures on the writable source do not
//! abort anything: the in-memory change stands and the failure travels back
//! next to the result as a [`PersistenceFailure`].

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::record::PromptId;

/// Rejections from the mutation entry points of [`crate::CatalogStore`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A required field was empty after trimming.
    #[error("{field} must not be empty")]
    Validation {
        /// Name of the offending field (`name` or `text`).
        field: &'static str,
    },

    /// No record in the catalog carries the requested id.
    #[error("prompt '{id}' not found")]
    NotFound {
        /// The id that was looked up.
        id: PromptId,
    },
}

/// A write to the writable source that did not make it to disk.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("could not persist {}: {reason}", .location.display())]
pub struct PersistenceFailure {
    /// Path of the writable source, or empty when none is configured.
    pub location: PathBuf,
    /// Rendered cause chain.
    pub reason: String,
}

impl PersistenceFailure {
    pub(crate) fn new(location: &Path, reason: impl fmt::Display) -> Self {
        Self {
            location: location.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn no_writable_source() -> Self {
        Self {
            location: PathBuf::new(),
            reason: "no writable source is configured".to_string(),
        }
    }
}
