//! Embedded document store.
//!
//! Durable, versioned, keyed storage backed by one directory per collection
//! and one JSON file per record. The store is opened against a monotonically
//! increasing schema version; every migration step between the recorded and
//! the current version is applied in order, exactly once, and creating a
//! collection that already exists is a no-op. A corrupt or unopenable store
//! is recovered by deleting the store directory and recreating it, so callers
//! must be prepared to rebuild bootstrap state after a recovery.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use banter_core::error::{BanterError, Result};

/// Declares a secondary ordering over a collection.
#[derive(Debug, Clone, Copy)]
pub struct IndexSpec {
    pub name: &'static str,
    pub field: &'static str,
}

/// Declares a collection: its name, the record field holding the primary
/// key, and an optional secondary index.
#[derive(Debug, Clone, Copy)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub key_path: &'static str,
    pub index: Option<IndexSpec>,
}

/// One schema version step: the collections it introduces.
#[derive(Debug, Clone)]
pub struct MigrationStep {
    pub version: u32,
    pub collections: &'static [CollectionSpec],
}

/// The full store schema: name, current version, and the ordered steps that
/// lead to it.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: &'static str,
    pub version: u32,
    pub steps: Vec<MigrationStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexState {
    name: String,
    field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CollectionState {
    name: String,
    key_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<IndexState>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    name: String,
    version: u32,
    collections: Vec<CollectionState>,
}

const MANIFEST_FILE: &str = "manifest.json";

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Handle to an open store.
///
/// The handle is shared behind an `Arc`; all collection operations take
/// `&self` and are safe to issue concurrently.
#[derive(Debug)]
pub struct DocumentStore {
    root: PathBuf,
    collections: HashMap<String, CollectionState>,
}

impl DocumentStore {
    /// Opens the store under `base_dir`, applying pending schema migrations.
    ///
    /// A store that cannot be opened (unreadable manifest, or a manifest
    /// version newer than this build supports) is wiped and recreated from
    /// scratch; callers rebuild their bootstrap state afterwards.
    pub async fn open(base_dir: &Path, schema: &Schema) -> Result<Self> {
        let root = base_dir.join(schema.name);
        match Self::try_open(&root, schema).await {
            Ok(store) => Ok(store),
            Err(err) => {
                tracing::warn!("store at {:?} is unusable ({err}), recreating it", root);
                match fs::remove_dir_all(&root).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
                Self::try_open(&root, schema).await
            }
        }
    }

    async fn try_open(root: &Path, schema: &Schema) -> Result<Self> {
        fs::create_dir_all(root).await?;
        let manifest_path = root.join(MANIFEST_FILE);

        let mut manifest = match fs::read_to_string(&manifest_path).await {
            Ok(raw) => serde_json::from_str::<Manifest>(&raw)
                .map_err(|e| BanterError::storage(format!("corrupt store manifest: {e}")))?,
            Err(e) if e.kind() == ErrorKind::NotFound => Manifest {
                name: schema.name.to_string(),
                version: 0,
                collections: Vec::new(),
            },
            Err(e) => return Err(e.into()),
        };

        if manifest.version > schema.version {
            return Err(BanterError::storage(format!(
                "store version {} is newer than the supported version {}",
                manifest.version, schema.version
            )));
        }

        let from = manifest.version;
        for step in &schema.steps {
            if step.version <= from || step.version > schema.version {
                continue;
            }
            for spec in step.collections {
                if manifest.collections.iter().any(|c| c.name == spec.name) {
                    continue;
                }
                manifest.collections.push(CollectionState {
                    name: spec.name.to_string(),
                    key_path: spec.key_path.to_string(),
                    index: spec.index.map(|i| IndexState {
                        name: i.name.to_string(),
                        field: i.field.to_string(),
                    }),
                });
            }
            tracing::debug!("applied store migration step {}", step.version);
        }
        manifest.version = schema.version;

        for collection in &manifest.collections {
            fs::create_dir_all(root.join(&collection.name)).await?;
        }
        write_atomic(&manifest_path, &serde_json::to_vec_pretty(&manifest)?).await?;

        let collections = manifest
            .collections
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();

        Ok(Self {
            root: root.to_path_buf(),
            collections,
        })
    }

    /// Fetches one record by primary key.
    pub async fn get<T: DeserializeOwned>(&self, collection: &str, key: &str) -> Result<Option<T>> {
        let meta = self.collection(collection)?;
        let path = self.record_path(&meta.name, key);
        match fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| BanterError::storage(format!("corrupt record {key}: {e}"))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetches every record of a collection, ordered by primary key.
    ///
    /// Unreadable record files are skipped with a warning rather than failing
    /// the whole read, so one torn write cannot hide an entire collection.
    pub async fn get_all<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        let meta = self.collection(collection)?.clone();
        let mut records = self.read_records(&meta).await?;
        records.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(decode_values(records.into_iter().map(|(_, v)| v)))
    }

    /// Fetches every record ordered by the collection's secondary index.
    pub async fn get_all_by_index<T: DeserializeOwned>(
        &self,
        collection: &str,
        index: &str,
    ) -> Result<Vec<T>> {
        let meta = self.collection(collection)?.clone();
        let field = match &meta.index {
            Some(state) if state.name == index => state.field.clone(),
            _ => {
                return Err(BanterError::storage(format!(
                    "collection '{collection}' has no index '{index}'"
                )));
            }
        };
        let mut records = self.read_records(&meta).await?;
        records.sort_by(|(_, a), (_, b)| compare_index_values(a.get(&field), b.get(&field)));
        Ok(decode_values(records.into_iter().map(|(_, v)| v)))
    }

    /// Inserts or replaces a record by its primary key.
    pub async fn put<T: Serialize>(&self, collection: &str, record: &T) -> Result<()> {
        let meta = self.collection(collection)?;
        let value = serde_json::to_value(record)?;
        let key = self.key_of(meta, &value)?;
        let path = self.record_path(&meta.name, &key);
        write_atomic(&path, &serde_json::to_vec_pretty(&value)?).await?;
        Ok(())
    }

    /// Inserts a record, failing if the key is already present.
    pub async fn add<T: Serialize>(&self, collection: &str, record: &T) -> Result<()> {
        let meta = self.collection(collection)?;
        let value = serde_json::to_value(record)?;
        let key = self.key_of(meta, &value)?;
        let path = self.record_path(&meta.name, &key);

        // create_new makes the duplicate check atomic.
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(BanterError::duplicate_key(collection, key));
            }
            Err(e) => return Err(e.into()),
        }
        write_atomic(&path, &serde_json::to_vec_pretty(&value)?).await?;
        Ok(())
    }

    /// Deletes a record. Deleting an absent key is not an error.
    pub async fn delete(&self, collection: &str, key: &str) -> Result<()> {
        let meta = self.collection(collection)?;
        let path = self.record_path(&meta.name, key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn collection(&self, name: &str) -> Result<&CollectionState> {
        self.collections
            .get(name)
            .ok_or_else(|| BanterError::storage(format!("unknown collection '{name}'")))
    }

    fn key_of(&self, meta: &CollectionState, value: &Value) -> Result<String> {
        match value.get(&meta.key_path) {
            Some(Value::String(key)) if !key.is_empty() => Ok(key.clone()),
            _ => Err(BanterError::storage(format!(
                "record violates the key shape of '{}': '{}' must be a non-empty string",
                meta.name, meta.key_path
            ))),
        }
    }

    fn record_path(&self, collection: &str, key: &str) -> PathBuf {
        self.root
            .join(collection)
            .join(format!("{}.json", encode_key(key)))
    }

    async fn read_records(&self, meta: &CollectionState) -> Result<Vec<(String, Value)>> {
        let dir = self.root.join(&meta.name);
        let mut entries = fs::read_dir(&dir).await?;
        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = match fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("skipping unreadable record {:?}: {e}", path);
                    continue;
                }
            };
            let value: Value = match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("skipping corrupt record {:?}: {e}", path);
                    continue;
                }
            };
            match self.key_of(meta, &value) {
                Ok(key) => records.push((key, value)),
                Err(e) => tracing::warn!("skipping keyless record {:?}: {e}", path),
            }
        }
        Ok(records)
    }
}

/// Coalesces concurrent opens of the same store into a single open call.
///
/// Components receive the opener by reference and share the resulting
/// `Arc<DocumentStore>`; the first caller performs the actual open while
/// later callers wait for it.
pub struct StoreOpener {
    base: PathBuf,
    schema: Schema,
    cell: tokio::sync::OnceCell<Arc<DocumentStore>>,
}

impl StoreOpener {
    pub fn new(base: impl Into<PathBuf>, schema: Schema) -> Self {
        Self {
            base: base.into(),
            schema,
            cell: tokio::sync::OnceCell::new(),
        }
    }

    /// Returns the shared store handle, opening it on first use.
    pub async fn get(&self) -> Result<Arc<DocumentStore>> {
        self.cell
            .get_or_try_init(|| async {
                DocumentStore::open(&self.base, &self.schema).await.map(Arc::new)
            })
            .await
            .cloned()
    }
}

fn decode_values<T: DeserializeOwned>(values: impl Iterator<Item = Value>) -> Vec<T> {
    values
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("skipping record with unexpected shape: {e}");
                None
            }
        })
        .collect()
}

fn compare_index_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering::*;
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(_)), Some(_)) => Less,
        (Some(_), Some(Value::Number(_))) => Greater,
        (Some(_), Some(_)) => Equal,
        (Some(_), None) => Greater,
        (None, Some(_)) => Less,
        (None, None) => Equal,
    }
}

/// Escapes a record key into a safe file name.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.') {
            out.push(byte as char);
        } else {
            out.push('%');
            out.push_str(&format!("{byte:02X}"));
        }
    }
    out
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.{seq}.tmp"));

    let mut file = fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&tmp, path).await
}
