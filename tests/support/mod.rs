#![allow(dead_code)]

use anyhow::{Context, Result};
use promptdeck::{CatalogStore, PromptId, Source};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// Scratch directory holding a shared library and a user library.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new().context("creating temp workspace")?,
        })
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn library(&self) -> PathBuf {
        self.path("prompts.json")
    }

    pub fn user(&self) -> PathBuf {
        self.path("user_prompts.json")
    }

    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path(name);
        fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    pub fn write_json(&self, name: &str, value: &Value) -> Result<PathBuf> {
        self.write(name, &serde_json::to_string_pretty(value)?)
    }

    /// Store over `prompts.json` (library) and `user_prompts.json` (user).
    pub fn store(&self) -> CatalogStore {
        CatalogStore::open(
            [Source::library(self.library()), Source::user(self.user())],
            None,
        )
    }
}

pub fn prompt(id: &str, name: &str, tags: &[&str], usage_count: u64) -> Value {
    json!({
        "id": id,
        "name": name,
        "tags": tags,
        "prompt": format!("text of {id}"),
        "placeholders": [],
        "usage_count": usage_count,
    })
}

pub fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Persisted entries of a library, whichever envelope it uses.
pub fn entries(path: &Path) -> Result<Vec<Value>> {
    let value = read_json(path)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("prompts") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    Ok(items)
}

pub fn entry<'a>(entries: &'a [Value], id: &str) -> Option<&'a Value> {
    entries.iter().find(|e| e["id"] == id)
}

pub fn ids(store: &CatalogStore) -> Vec<String> {
    store.catalog().records().map(|r| r.id.0.clone()).collect()
}

pub fn id(raw: &str) -> PromptId {
    PromptId::from(raw)
}
