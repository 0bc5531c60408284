//! Ordered, deduplicating in-process memory store.

use crate::error::MemoryError;
use crate::message::MessageEnvelope;
use crate::record::{Embedder, Record};
use log::{debug, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Longest raw input echoed back in decode errors.
const MAX_ECHOED_INPUT_CHARS: usize = 200;

/// Where `export` writes the records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Return the live records to the caller.
    pub to_memory: bool,
    /// Write the records to this JSON file.
    pub file_path: Option<PathBuf>,
}

impl ExportOptions {
    /// Export to the caller.
    pub fn memory() -> Self {
        Self {
            to_memory: true,
            file_path: None,
        }
    }

    /// Export to a JSON file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            to_memory: false,
            file_path: Some(path.into()),
        }
    }
}

/// Result of an export.
#[derive(Debug, Clone, PartialEq)]
pub enum Exported<R> {
    /// Copy of the live records.
    Records(Vec<R>),
    /// Path of the written file.
    File(PathBuf),
}

/// Input accepted by `load`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadSource {
    /// JSON file on disk.
    Path(PathBuf),
    /// Raw JSON text.
    Text(String),
    /// Already-parsed structured value.
    Value(Value),
}

impl LoadSource {
    /// Treat the string as a file path when such a file exists, otherwise as raw text.
    pub fn detect(input: &str) -> Self {
        if Path::new(input).is_file() {
            Self::Path(PathBuf::from(input))
        } else {
            Self::Text(input.to_string())
        }
    }
}

impl From<&str> for LoadSource {
    fn from(input: &str) -> Self {
        Self::detect(input)
    }
}

impl From<String> for LoadSource {
    fn from(input: String) -> Self {
        Self::detect(&input)
    }
}

impl From<&Path> for LoadSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for LoadSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Value> for LoadSource {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Ordered collection of records owned by a single agent.
///
/// Insertion order is preserved, a record whose id is already stored is
/// skipped, and reads hand out copies.
pub struct MemoryStore<R = MessageEnvelope> {
    records: Vec<R>,
    embedder: Option<Arc<dyn Embedder<R>>>,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            embedder: None,
        }
    }
}

impl<R: Clone> Clone for MemoryStore<R> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
            embedder: self.embedder.clone(),
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for MemoryStore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("records", &self.records)
            .field("embedder", &self.embedder.is_some())
            .finish()
    }
}

impl<R: Record> MemoryStore<R> {
    /// Create an empty store without an embedder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that can embed records on `add`.
    pub fn with_embedder(embedder: Arc<dyn Embedder<R>>) -> Self {
        Self {
            records: Vec::new(),
            embedder: Some(embedder),
        }
    }

    /// Append records in order, skipping any whose id is already stored.
    ///
    /// Accepts a single record (`Some(record)`, `[record]`), a sequence, or
    /// nothing. With `embed` set, the embedder must exist and the batch is
    /// appended only once every record has been embedded. Returns the number of
    /// records appended.
    pub fn add<I>(&mut self, records: I, embed: bool) -> Result<usize, MemoryError>
    where
        I: IntoIterator<Item = R>,
    {
        let embedder = if embed {
            Some(self.embedder.clone().ok_or(MemoryError::MissingEmbedder)?)
        } else {
            None
        };

        let mut seen: HashSet<String> = self
            .records
            .iter()
            .filter_map(|record| record.record_id().map(str::to_string))
            .collect();
        let mut staged = Vec::new();
        for mut record in records {
            if let Some(id) = record.record_id()
                && !seen.insert(id.to_string())
            {
                debug!("skipping duplicate memory record (id={id})");
                continue;
            }
            if let Some(embedder) = &embedder {
                let embedding = embedder.embed(&record)?;
                record.attach_embedding(embedding);
            }
            staged.push(record);
        }

        let added = staged.len();
        self.records.extend(staged);
        debug!("memory add (added={}, size={})", added, self.records.len());
        Ok(added)
    }

    /// Remove the records at the given positions, keeping the rest in order.
    ///
    /// Out-of-range positions are skipped with a warning. Returns the number of
    /// records removed.
    pub fn delete<I>(&mut self, indices: I) -> usize
    where
        I: IntoIterator<Item = usize>,
    {
        if self.records.is_empty() {
            warn!("memory is empty, skipping delete");
            return 0;
        }

        let size = self.records.len();
        let (valid, invalid): (BTreeSet<usize>, BTreeSet<usize>) =
            indices.into_iter().partition(|index| *index < size);
        if !invalid.is_empty() {
            warn!(
                "skipping delete for invalid indices (indices={:?}, size={})",
                invalid, size
            );
        }

        let mut position = 0;
        self.records.retain(|_| {
            let keep = !valid.contains(&position);
            position += 1;
            keep
        });
        valid.len()
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of live records.
    pub fn size(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrow the live records in order.
    pub fn records(&self) -> &[R] {
        &self.records
    }
}

impl<R: Record + Clone> MemoryStore<R> {
    /// Return a copy of the last `recent_n` records (all when `None`).
    ///
    /// The filter receives `(index, record)` with the index local to the
    /// windowed slice. Asking for more records than stored returns everything
    /// with a warning.
    pub fn get_memory(
        &self,
        recent_n: Option<usize>,
        filter: Option<&dyn Fn(usize, &R) -> bool>,
    ) -> Vec<R> {
        let window = match recent_n {
            None => &self.records[..],
            Some(recent_n) => {
                if recent_n > self.records.len() {
                    warn!(
                        "requested more memories than stored (requested={}, size={})",
                        recent_n,
                        self.records.len()
                    );
                }
                let start = self.records.len().saturating_sub(recent_n);
                &self.records[start..]
            }
        };

        match filter {
            Some(filter) => window
                .iter()
                .enumerate()
                .filter(|(index, record)| filter(*index, *record))
                .map(|(_, record)| record.clone())
                .collect(),
            None => window.to_vec(),
        }
    }
}

impl<R: Record + Clone + Serialize> MemoryStore<R> {
    /// Export to the caller or to a JSON file; the in-memory target wins when both are set.
    pub fn export(&self, options: &ExportOptions) -> Result<Exported<R>, MemoryError> {
        if options.to_memory {
            return Ok(Exported::Records(self.records.clone()));
        }
        let Some(path) = options.file_path.as_ref() else {
            return Err(MemoryError::MissingExportTarget);
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.records)?;
        fs::write(path, contents)?;
        info!(
            "memory exported (path={}, records={})",
            path.display(),
            self.records.len()
        );
        Ok(Exported::File(path.clone()))
    }
}

impl<R: Record + DeserializeOwned> MemoryStore<R> {
    /// Load records from a file, raw JSON text, or a parsed value.
    ///
    /// A sequence loads each element, a mapping loads one record, null loads
    /// nothing. With `overwrite`, existing records are dropped only after the
    /// input parsed and decoded successfully. Returns the number appended.
    pub fn load(
        &mut self,
        source: impl Into<LoadSource>,
        overwrite: bool,
    ) -> Result<usize, MemoryError> {
        let value = parse_source(source.into())?;
        let records = records_from_value(value)?;
        if overwrite {
            debug!("memory load overwriting (previous_size={})", self.records.len());
            self.clear();
        }
        self.add(records, false)
    }
}

/// Parse a load source into a structured value.
fn parse_source(source: LoadSource) -> Result<Value, MemoryError> {
    match source {
        LoadSource::Path(path) => {
            debug!("loading memory from file (path={})", path.display());
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents).map_err(|source| MemoryError::Decode {
                input: path.display().to_string(),
                source,
            })
        }
        LoadSource::Text(text) => {
            let value: Value =
                serde_json::from_str(&text).map_err(|source| MemoryError::Decode {
                    input: echo_input(&text),
                    source,
                })?;
            if !value.is_object() && !value.is_array() {
                warn!("loaded memory is neither a mapping nor a sequence; records may be unusable");
            }
            Ok(value)
        }
        LoadSource::Value(value) => Ok(value),
    }
}

/// Decode records from a parsed value.
fn records_from_value<R: DeserializeOwned>(value: Value) -> Result<Vec<R>, MemoryError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(MemoryError::from))
            .collect(),
        other => Ok(vec![serde_json::from_value(other)?]),
    }
}

/// Shorten raw input for error messages.
fn echo_input(text: &str) -> String {
    if text.chars().count() <= MAX_ECHOED_INPUT_CHARS {
        return text.to_string();
    }
    let mut echoed: String = text.chars().take(MAX_ECHOED_INPUT_CHARS).collect();
    echoed.push_str("...");
    echoed
}

#[cfg(test)]
mod tests {
    use super::{ExportOptions, Exported, LoadSource, MemoryStore};
    use crate::{Embedder, MemoryError, MessageEnvelope, Record, Role};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn message(name: &str, content: &str) -> MessageEnvelope {
        MessageEnvelope::new(name, content, Role::User)
    }

    fn contents(store: &MemoryStore) -> Vec<String> {
        store
            .records()
            .iter()
            .map(MessageEnvelope::render_as_text)
            .collect()
    }

    #[test]
    fn add_skips_records_already_stored() {
        let mut store: MemoryStore = MemoryStore::new();
        let first = message("A", "one");
        let second = message("B", "two");
        store.add([first.clone(), second], false).expect("add");

        let added = store.add(Some(first.clone()), false).expect("add again");
        assert_eq!(added, 0);
        assert_eq!(store.size(), 2);
        assert_eq!(store.records()[0].id(), first.id());
    }

    #[test]
    fn add_dedups_within_a_single_batch() {
        let mut store: MemoryStore = MemoryStore::new();
        let first = message("A", "one");
        let added = store
            .add(vec![first.clone(), first.clone()], false)
            .expect("add");
        assert_eq!(added, 1);
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn add_nothing_is_a_noop() {
        let mut store: MemoryStore = MemoryStore::new();
        assert_eq!(store.add(None, false).expect("add"), 0);
        assert_eq!(store.add(Vec::new(), false).expect("add"), 0);
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn records_without_id_are_always_appended() {
        let mut store: MemoryStore<Value> = MemoryStore::new();
        let record = json!({ "content": "anonymous" });
        store.add([record.clone(), record], false).expect("add");
        assert_eq!(store.size(), 2);
    }

    #[test]
    fn embed_without_embedder_fails_before_appending() {
        let mut store: MemoryStore = MemoryStore::new();
        let err = store.add([message("A", "one")], true).unwrap_err();
        assert!(matches!(err, MemoryError::MissingEmbedder));
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn embed_attaches_vectors_without_changing_identity() {
        let embedder: Arc<dyn Embedder<MessageEnvelope>> =
            Arc::new(|record: &MessageEnvelope| -> Result<Vec<f32>, MemoryError> {
                Ok(vec![record.name().len() as f32])
            });
        let mut store = MemoryStore::with_embedder(embedder);
        let record = message("Ann", "hello");
        store.add([record.clone()], true).expect("add");

        let stored = &store.records()[0];
        assert_eq!(stored.id(), record.id());
        assert_eq!(stored.embedding(), Some(&[3.0][..]));
    }

    #[test]
    fn embed_failure_leaves_batch_unapplied() {
        let embedder: Arc<dyn Embedder<MessageEnvelope>> =
            Arc::new(|record: &MessageEnvelope| -> Result<Vec<f32>, MemoryError> {
                if record.name() == "bad" {
                    Err(MemoryError::Embedding("rejected".to_string()))
                } else {
                    Ok(vec![1.0])
                }
            });
        let mut store = MemoryStore::with_embedder(embedder);
        let result = store.add([message("good", "x"), message("bad", "y")], true);
        assert!(result.is_err());
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn delete_keeps_relative_order() {
        let mut store: MemoryStore = MemoryStore::new();
        store
            .add(
                ["a", "b", "c", "d", "e"].map(|name| message(name, "x")),
                false,
            )
            .expect("add");

        let removed = store.delete([1, 3]);
        assert_eq!(removed, 2);
        assert_eq!(contents(&store), vec!["a: x", "c: x", "e: x"]);

        let removed = store.delete(Some(0));
        assert_eq!(removed, 1);
        assert_eq!(contents(&store), vec!["c: x", "e: x"]);
    }

    #[test]
    fn delete_ignores_out_of_range_indices() {
        let mut store: MemoryStore = MemoryStore::new();
        store
            .add([message("a", "x"), message("b", "x")], false)
            .expect("add");
        let removed = store.delete([1, 7]);
        assert_eq!(removed, 1);
        assert_eq!(contents(&store), vec!["a: x"]);
    }

    #[test]
    fn delete_on_empty_store_is_noop() {
        let mut store: MemoryStore = MemoryStore::new();
        store.add([message("a", "x")], false).expect("add");
        assert!(!store.is_empty());
        store.clear();
        assert_eq!(store.delete([0]), 0);
        assert_eq!(store.size(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn get_memory_windows_from_the_end() {
        let mut store: MemoryStore = MemoryStore::new();
        store
            .add(["a", "b", "c"].map(|name| message(name, "x")), false)
            .expect("add");

        let last_two: Vec<String> = store
            .get_memory(Some(2), None)
            .iter()
            .map(MessageEnvelope::render_as_text)
            .collect();
        assert_eq!(last_two, vec!["b: x", "c: x"]);

        assert_eq!(store.get_memory(Some(10), None).len(), 3);
        assert_eq!(store.get_memory(Some(0), None).len(), 0);
        assert_eq!(store.get_memory(None, None).len(), 3);
    }

    #[test]
    fn get_memory_filter_sees_local_indices() {
        let mut store: MemoryStore = MemoryStore::new();
        store
            .add(["a", "b", "c", "d"].map(|name| message(name, "x")), false)
            .expect("add");

        let even_local = |index: usize, _: &MessageEnvelope| index % 2 == 0;
        let names: Vec<String> = store
            .get_memory(Some(3), Some(&even_local))
            .iter()
            .map(|record| record.name().to_string())
            .collect();
        assert_eq!(names, vec!["b", "d"]);
    }

    #[test]
    fn get_memory_returns_copies() {
        let mut store: MemoryStore = MemoryStore::new();
        store.add([message("a", "x")], false).expect("add");
        let mut copy = store.get_memory(None, None);
        copy[0].set_content("changed");
        copy.clear();
        assert_eq!(contents(&store), vec!["a: x"]);
    }

    #[test]
    fn export_requires_a_target() {
        let store: MemoryStore = MemoryStore::new();
        let err = store.export(&ExportOptions::default()).unwrap_err();
        assert!(matches!(err, MemoryError::MissingExportTarget));
    }

    #[test]
    fn export_to_memory_returns_records() {
        let mut store: MemoryStore = MemoryStore::new();
        let record = message("a", "x");
        store.add([record.clone()], false).expect("add");
        let exported = store.export(&ExportOptions::memory()).expect("export");
        assert_eq!(exported, Exported::Records(vec![record]));
    }

    #[test]
    fn export_file_round_trips_through_load() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("memory.json");
        let mut store: MemoryStore = MemoryStore::new();
        store
            .add(
                [
                    MessageEnvelope::new("system", "rules", Role::System),
                    MessageEnvelope::new("A", json!([3, 3]), Role::User),
                    MessageEnvelope::thought("центр"),
                ],
                false,
            )
            .expect("add");

        let exported = store.export(&ExportOptions::file(&path)).expect("export");
        assert_eq!(exported, Exported::File(path.clone()));

        let mut restored: MemoryStore = MemoryStore::new();
        restored.load(path.as_path(), true).expect("load");
        assert_eq!(restored.size(), store.size());
        assert_eq!(contents(&restored), contents(&store));
        assert_eq!(restored.records(), store.records());
    }

    #[test]
    fn load_detects_file_paths_in_strings() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("memory.json");
        std::fs::write(
            &path,
            r#"[{"id": "1", "name": "A", "content": "hi", "role": "user", "timestamp": "t"}]"#,
        )
        .expect("write");

        let source = LoadSource::from(path.to_string_lossy().to_string());
        assert_eq!(source, LoadSource::Path(path.clone()));

        let mut store: MemoryStore = MemoryStore::new();
        assert_eq!(store.load(source, false).expect("load"), 1);
        assert_eq!(contents(&store), vec!["A: hi"]);
    }

    #[test]
    fn load_malformed_text_keeps_existing_records() {
        let mut store: MemoryStore = MemoryStore::new();
        store.add([message("a", "x")], false).expect("add");

        let err = store.load("{not json", true).unwrap_err();
        match err {
            MemoryError::Decode { input, .. } => assert_eq!(input, "{not json"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn load_undecodable_records_keeps_existing_records() {
        let mut store: MemoryStore = MemoryStore::new();
        store.add([message("a", "x")], false).expect("add");

        let result = store.load(json!([{ "name": "A", "role": "tool" }]), true);
        assert!(result.is_err());
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn load_appends_or_overwrites() {
        let mut store: MemoryStore = MemoryStore::new();
        store.add([message("a", "x")], false).expect("add");

        let single = json!({ "id": "m1", "name": "B", "content": "y", "role": "assistant" });
        store.load(single.clone(), false).expect("load");
        assert_eq!(contents(&store), vec!["a: x", "B: y"]);

        store.load(single.clone(), false).expect("load duplicate");
        assert_eq!(store.size(), 2);

        store.load(json!([single]), true).expect("overwrite");
        assert_eq!(contents(&store), vec!["B: y"]);
    }

    #[test]
    fn load_scalar_text_into_generic_store() {
        let mut store: MemoryStore<Value> = MemoryStore::new();
        store.load("42", false).expect("load");
        assert_eq!(store.records(), &[json!(42)]);
        assert_eq!(store.records()[0].record_id(), None);

        store.load("null", false).expect("load null");
        assert_eq!(store.size(), 1);
    }
}
