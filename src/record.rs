//! Prompt records as they appear in library files.
//!
//! Library files are written by hand as often as by this crate, so ingestion
//! goes through [`PromptRecord::from_value`]: every field except `id` has a
//! default, `null` lists are treated as empty, and the payload may be stored
//! under either `prompt` or `text`. Records are always written back under
//! `prompt`.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier of a prompt, unique within the merged catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptId(pub String);

impl PromptId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PromptId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PromptId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRecord {
    pub id: PromptId,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(rename = "prompt", alias = "text", default)]
    pub text: String,
    /// Template slots; carried through untouched.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub placeholders: Vec<String>,
    #[serde(default)]
    pub usage_count: u64,
}

impl PromptRecord {
    /// Build a fresh record for a prompt created in this session.
    pub fn new(id: PromptId, name: &str, text: &str, tags: Vec<String>) -> Self {
        Self {
            id,
            name: name.to_string(),
            tags,
            text: text.to_string(),
            placeholders: Vec::new(),
            usage_count: 0,
        }
    }

    /// Validate and convert one untyped library entry.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            bail!("prompt entry must be a JSON object");
        }
        let record: PromptRecord = serde_json::from_value(value)?;
        if record.id.0.trim().is_empty() {
            bail!("prompt entry has an empty id");
        }
        Ok(record)
    }

    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self)
            .with_context(|| format!("serializing prompt '{}'", self.id))
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Derive an id candidate from a display name: trimmed, lowercased, every
/// space replaced by a hyphen.
pub fn slugify(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}
