//! Reading and writing individual prompt libraries.
//!
//! A library is a UTF-8 JSON file holding either a bare array of prompt
//! objects or an object with a `prompts` array. Reads never fail: whatever
//! goes wrong is folded into a [`LoadStatus`] and the library contributes no
//! records. Writes go through [`SourceDocument`], which keeps the file's
//! envelope and any keys this crate does not know about.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::record::PromptRecord;

const PROMPTS_KEY: &str = "prompts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Shared or imported library; never written to.
    Library,
    /// The user's own library; the default target for mutations.
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub location: PathBuf,
    pub kind: SourceKind,
}

impl Source {
    pub fn library(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            kind: SourceKind::Library,
        }
    }

    pub fn user(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            kind: SourceKind::User,
        }
    }
}

/// Outcome of reading one library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Parsed; `skipped` counts entries that were not valid prompt objects.
    Loaded { records: usize, skipped: usize },
    /// File exists but holds nothing but whitespace.
    Empty,
    Missing,
    /// File exists but could not be read (permissions, not a file, ...).
    Unreadable(String),
    ParseError(String),
    /// Valid JSON that is neither an array nor an object with `prompts`.
    UnsupportedShape,
}

impl LoadStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, LoadStatus::Loaded { .. } | LoadStatus::Empty)
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::Loaded { records, skipped: 0 } => write!(f, "loaded {records} prompt(s)"),
            LoadStatus::Loaded { records, skipped } => {
                write!(f, "loaded {records} prompt(s), skipped {skipped} invalid")
            }
            LoadStatus::Empty => f.write_str("empty"),
            LoadStatus::Missing => f.write_str("missing"),
            LoadStatus::Unreadable(reason) => write!(f, "unreadable: {reason}"),
            LoadStatus::ParseError(reason) => write!(f, "parse error: {reason}"),
            LoadStatus::UnsupportedShape => {
                f.write_str("unsupported shape (expected an array or an object with `prompts`)")
            }
        }
    }
}

#[derive(Debug)]
pub struct SourceRead {
    pub records: Vec<PromptRecord>,
    pub status: LoadStatus,
}

impl SourceRead {
    fn nothing(status: LoadStatus) -> Self {
        Self {
            records: Vec::new(),
            status,
        }
    }
}

/// Read one library, degrading every failure to zero records.
pub fn read_source(path: &Path) -> SourceRead {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return SourceRead::nothing(LoadStatus::Missing);
        }
        Err(err) => return SourceRead::nothing(LoadStatus::Unreadable(err.to_string())),
    };
    if raw.trim().is_empty() {
        return SourceRead::nothing(LoadStatus::Empty);
    }

    let value: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => return SourceRead::nothing(LoadStatus::ParseError(err.to_string())),
    };
    let Some(entries) = into_entries(value) else {
        return SourceRead::nothing(LoadStatus::UnsupportedShape);
    };

    let mut records = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for (idx, entry) in entries.into_iter().enumerate() {
        match PromptRecord::from_value(entry) {
            Ok(record) => records.push(record),
            Err(err) => {
                skipped += 1;
                warn!(
                    source = %path.display(),
                    entry = idx,
                    "skipping invalid prompt entry: {err:#}"
                );
            }
        }
    }
    let status = LoadStatus::Loaded {
        records: records.len(),
        skipped,
    };
    SourceRead { records, status }
}

fn into_entries(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut obj) => match obj.remove(PROMPTS_KEY) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// Editable view of the writable library, read fresh before every mutation.
#[derive(Debug)]
pub(crate) struct SourceDocument {
    /// Remaining keys of an object-shaped library; `None` for a bare array.
    envelope: Option<Map<String, Value>>,
    entries: Vec<Value>,
}

impl SourceDocument {
    /// Open the library for a read-modify-write cycle.
    ///
    /// A missing or blank file starts as an empty array. Content that does not
    /// parse, or has an unexpected shape, is an error so the caller never
    /// overwrites a library it could not understand.
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
        };
        if raw.trim().is_empty() {
            return Ok(Self {
                envelope: None,
                entries: Vec::new(),
            });
        }

        let root: Value =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        match root {
            Value::Array(entries) => Ok(Self {
                envelope: None,
                entries,
            }),
            Value::Object(mut obj) => match obj.remove(PROMPTS_KEY) {
                Some(Value::Array(entries)) => Ok(Self {
                    envelope: Some(obj),
                    entries,
                }),
                _ => bail!("{} has no `prompts` array", path.display()),
            },
            _ => bail!(
                "{} is neither a prompt array nor an object with a `prompts` array",
                path.display()
            ),
        }
    }

    pub(crate) fn append(&mut self, record: &PromptRecord) -> Result<()> {
        self.entries.push(record.to_value()?);
        Ok(())
    }

    /// Overwrite `fields` on the first entry with the record's id, or append
    /// the whole record when the library does not hold it yet.
    pub(crate) fn upsert(&mut self, record: &PromptRecord, fields: &[&str]) -> Result<()> {
        let fresh = record.to_value()?;
        let id = record.id.as_str();
        let existing = self
            .entries
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .find(|entry| entry.get("id").and_then(Value::as_str) == Some(id));

        match existing {
            Some(entry) => copy_fields(entry, &fresh, fields),
            None => self.entries.push(fresh),
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> &[Value] {
        &self.entries
    }

    fn to_json(&self) -> Value {
        let entries = Value::Array(self.entries.clone());
        match &self.envelope {
            Some(obj) => {
                let mut obj = obj.clone();
                obj.insert(PROMPTS_KEY.to_string(), entries);
                Value::Object(obj)
            }
            None => entries,
        }
    }

    /// Atomically replace the file with the pretty-printed document.
    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        let mut tmp = NamedTempFile::new_in(&dir)
            .with_context(|| format!("creating temporary file in {}", dir.display()))?;
        serde_json::to_writer_pretty(&mut tmp, &self.to_json())
            .with_context(|| format!("serializing {}", path.display()))?;
        tmp.write_all(b"\n")?;
        tmp.flush()?;
        tmp.persist(path)
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }
}

fn copy_fields(entry: &mut Map<String, Value>, fresh: &Value, fields: &[&str]) {
    for field in fields {
        if let Some(value) = fresh.get(*field) {
            entry.insert((*field).to_string(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PromptId;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_bare_array_and_wrapped_object() {
        let dir = TempDir::new().unwrap();
        let bare = write(&dir, "bare.json", r#"[{"id": "a", "name": "A", "prompt": "x"}]"#);
        let wrapped = write(
            &dir,
            "wrapped.json",
            r#"{"version": 2, "prompts": [{"id": "b", "name": "B", "text": "y"}]}"#,
        );

        let bare = read_source(&bare);
        let wrapped = read_source(&wrapped);
        assert_eq!(bare.records[0].id.as_str(), "a");
        assert_eq!(wrapped.records[0].text, "y");
        assert_eq!(
            wrapped.status,
            LoadStatus::Loaded {
                records: 1,
                skipped: 0
            }
        );
    }

    #[test]
    fn degrades_missing_blank_and_odd_shapes() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            read_source(&dir.path().join("nope.json")).status,
            LoadStatus::Missing
        );
        assert_eq!(
            read_source(&write(&dir, "blank.json", "  \n\t")).status,
            LoadStatus::Empty
        );
        assert_eq!(
            read_source(&write(&dir, "obj.json", r#"{"items": []}"#)).status,
            LoadStatus::UnsupportedShape
        );
        assert_eq!(
            read_source(&write(&dir, "num.json", "42")).status,
            LoadStatus::UnsupportedShape
        );
        assert!(matches!(
            read_source(&write(&dir, "bad.json", "[{")).status,
            LoadStatus::ParseError(_)
        ));
        assert!(LoadStatus::Empty.is_ok());
        assert!(!LoadStatus::Missing.is_ok());
        assert!(!LoadStatus::UnsupportedShape.is_ok());
    }

    #[test]
    fn skips_invalid_entries_individually() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "mixed.json",
            r#"[{"id": "ok", "name": "Ok"}, {"name": "no id"}, 7, {"id": "ok2"}]"#,
        );
        let read = read_source(&path);
        assert_eq!(read.records.len(), 2);
        assert_eq!(
            read.status,
            LoadStatus::Loaded {
                records: 2,
                skipped: 2
            }
        );
    }

    #[test]
    fn document_upsert_patches_only_named_fields() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "user.json",
            r#"{"owner": "me", "prompts": [{"id": "a", "name": "Old", "prompt": "old", "usage_count": 4, "color": "red"}]}"#,
        );
        let mut doc = SourceDocument::open(&path).unwrap();
        let mut record = PromptRecord::new(PromptId::from("a"), "New", "new", vec!["t".into()]);
        record.usage_count = 0;
        doc.upsert(&record, &["name", "tags", "prompt"]).unwrap();
        doc.save(&path).unwrap();

        let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["owner"], "me");
        let entry = &saved["prompts"][0];
        assert_eq!(entry["name"], "New");
        assert_eq!(entry["tags"], json!(["t"]));
        assert_eq!(entry["usage_count"], 4);
        assert_eq!(entry["color"], "red");
    }

    #[test]
    fn document_append_writes_a_full_record() {
        let dir = TempDir::new().unwrap();
        let mut doc = SourceDocument::open(&dir.path().join("user.json")).unwrap();
        doc.append(&PromptRecord::new(PromptId::from("a"), "A", "body", vec![]))
            .unwrap();
        let entry = &doc.entries()[0];
        assert!(entry.is_object());
        assert_eq!(entry["id"], "a");
        assert_eq!(entry["prompt"], "body");
        assert_eq!(entry["usage_count"], 0);
    }

    #[test]
    fn document_refuses_malformed_content() {
        let dir = TempDir::new().unwrap();
        assert!(SourceDocument::open(&write(&dir, "bad.json", "{oops")).is_err());
        assert!(SourceDocument::open(&write(&dir, "obj.json", r#"{"a": 1}"#)).is_err());
        let fresh = SourceDocument::open(&dir.path().join("new.json")).unwrap();
        assert!(fresh.entries().is_empty());
    }

    #[test]
    fn save_keeps_non_ascii_literal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/user.json");
        let mut doc = SourceDocument::open(&path).unwrap();
        doc.append(&PromptRecord::new(
            PromptId::from("gruss"),
            "Grüße",
            "Schöne Grüße",
            vec![],
        ))
        .unwrap();
        doc.save(&path).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Schöne Grüße"));
        assert!(raw.contains("\n  {"));
    }
}
