//! JSON whole-file registry.
//!
//! # Responsibility
//! - Hold every live instance in one ordered mapping.
//! - Dump the mapping to one JSON file and load it back at startup.
//!
//! # Invariants
//! - Saves go through a temp file in the target directory and a rename, so
//!   readers never observe a partially written file.
//! - Saves hold an exclusive `fs2` lock on `.<file>.lock`; loads hold a
//!   shared one.
//! - A corrupt file never aborts startup: the registry falls back to an
//!   empty mapping and logs a warning. Bad records are skipped one by one.

use super::{ObjectStore, StorageResult};
use crate::model::instance::{Instance, CLASS_KEY};
use crate::model::kind::ModelKind;
use crate::model::value::AttrValue;
use fs2::FileExt;
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

const DEFAULT_FILE_NAME: &str = "file.json";

type RawRecords = BTreeMap<String, serde_json::Value>;

/// Registry backed by a single JSON file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    objects: BTreeMap<String, Instance>,
}

impl FileStorage {
    /// Opens the registry at `path` and loads any persisted state.
    ///
    /// # Errors
    /// - Returns `Io` when the file exists but cannot be read or locked.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let mut storage = Self {
            path: path.into(),
            objects: BTreeMap::new(),
        };
        storage.reload()?;
        Ok(storage)
    }

    /// Location of the registry file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn base_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(DEFAULT_FILE_NAME)
    }

    fn open_lock_file(&self) -> std::io::Result<File> {
        let lock_path = self.dir().join(format!(".{}.lock", self.base_name()));
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(lock_path)
    }

    fn write_atomically(&self, content: &str) -> StorageResult<()> {
        let dir = self.dir();
        let base = self.base_name();
        let mut counter = 0u32;
        let tmp_path = loop {
            let candidate = dir.join(format!(".{base}.tmp-{}-{counter}", std::process::id()));
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
            {
                Ok(mut tmp) => {
                    let written = tmp
                        .write_all(content.as_bytes())
                        .and_then(|()| tmp.flush())
                        .and_then(|()| tmp.sync_all());
                    if let Err(err) = written {
                        let _ = fs::remove_file(&candidate);
                        return Err(err.into());
                    }
                    break candidate;
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    counter = counter.saturating_add(1);
                }
                Err(err) => return Err(err.into()),
            }
        };

        if let Err(err) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }
        if let Ok(dir_file) = File::open(dir) {
            let _ = dir_file.sync_all();
        }
        Ok(())
    }
}

impl ObjectStore for FileStorage {
    fn new(&mut self, instance: Instance) {
        self.objects.insert(instance.key(), instance);
    }

    fn all(&self) -> &BTreeMap<String, Instance> {
        &self.objects
    }

    fn get(&self, key: &str) -> Option<&Instance> {
        self.objects.get(key)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut Instance> {
        self.objects.get_mut(key)
    }

    fn delete(&mut self, key: &str) -> bool {
        self.objects.remove(key).is_some()
    }

    fn save(&self) -> StorageResult<()> {
        let started_at = Instant::now();
        let dump: BTreeMap<&str, BTreeMap<String, AttrValue>> = self
            .objects
            .iter()
            .map(|(key, instance)| (key.as_str(), instance.to_dict()))
            .collect();
        let content = serde_json::to_string_pretty(&dump)?;

        let lock_file = self.open_lock_file()?;
        FileExt::lock_exclusive(&lock_file)?;
        let result = self.write_atomically(&content);
        drop(lock_file);

        match &result {
            Ok(()) => info!(
                "event=storage_save module=storage status=ok objects={} bytes={} duration_ms={}",
                self.objects.len(),
                content.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=storage_save module=storage status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn reload(&mut self) -> StorageResult<()> {
        let started_at = Instant::now();
        self.objects.clear();

        if !self.path.exists() {
            info!(
                "event=storage_load module=storage status=ok mode=missing path={}",
                self.path.display()
            );
            return Ok(());
        }

        let content = {
            let lock_file = self.open_lock_file()?;
            FileExt::lock_shared(&lock_file)?;
            let content = fs::read_to_string(&self.path);
            drop(lock_file);
            content?
        };

        if content.trim().is_empty() {
            info!("event=storage_load module=storage status=ok mode=empty");
            return Ok(());
        }

        let records: RawRecords = match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(err) => {
                warn!(
                    "event=storage_load module=storage status=error error_code=malformed_file path={} error={}; starting empty",
                    self.path.display(),
                    err
                );
                return Ok(());
            }
        };

        let mut skipped = 0usize;
        for (key, raw) in records {
            match decode_record(&key, raw) {
                Ok(instance) => {
                    let canonical = instance.key();
                    if canonical != key {
                        warn!(
                            "event=storage_load module=storage status=rekey from={} to={}",
                            key, canonical
                        );
                    }
                    self.objects.insert(canonical, instance);
                }
                Err(reason) => {
                    skipped += 1;
                    warn!(
                        "event=storage_load module=storage status=skip key={} reason={}",
                        key, reason
                    );
                }
            }
        }

        info!(
            "event=storage_load module=storage status=ok mode=file objects={} skipped={} duration_ms={}",
            self.objects.len(),
            skipped,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

/// Resolves the kind for one record and rebuilds the instance.
///
/// The `__class__` tag wins; the key prefix is used when the tag is absent.
fn decode_record(key: &str, raw: serde_json::Value) -> Result<Instance, String> {
    let fields: BTreeMap<String, AttrValue> =
        serde_json::from_value(raw).map_err(|err| format!("record is not a mapping: {err}"))?;

    let tag = match fields.get(CLASS_KEY) {
        Some(tag) => tag
            .as_str()
            .ok_or_else(|| format!("non-string `{CLASS_KEY}`"))?
            .to_string(),
        None => key.split('.').next().unwrap_or_default().to_string(),
    };
    let kind = ModelKind::parse(&tag).ok_or_else(|| format!("unknown type tag `{tag}`"))?;
    Instance::from_fields(kind, &fields).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::FileStorage;
    use crate::model::instance::Instance;
    use crate::model::kind::ModelKind;
    use crate::storage::ObjectStore;

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let storage = FileStorage::open(dir.path().join("file.json"))
            .expect("registry should open");
        assert!(storage.is_empty());
    }

    #[test]
    fn save_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let mut storage = FileStorage::open(dir.path().join("file.json"))
            .expect("registry should open");
        storage.new(Instance::new(ModelKind::State));
        storage.save().expect("save should succeed");

        let leftovers: Vec<String> = std::fs::read_dir(dir.path())
            .expect("registry dir should be readable")
            .map(|entry| {
                let entry = entry.expect("dir entry should be readable");
                entry.file_name().to_string_lossy().into_owned()
            })
            .filter(|name| name.contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty(), "unexpected temp files: {leftovers:?}");
    }

    #[test]
    fn record_without_tag_uses_key_prefix() {
        let instance = Instance::new(ModelKind::Amenity);
        let mut fields = instance.to_dict();
        fields.remove("__class__");
        let raw = serde_json::to_value(&fields).expect("value should serialize");
        let decoded = super::decode_record(&instance.key(), raw).expect("record should decode");
        assert_eq!(decoded, instance);
    }
}
