use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{append_record, check_admin_key, ensure_share_token_in, MessageStore};
use crate::errors::StoreError;
use crate::id::MessageId;
use crate::message::{MessageRecord, NewMessage};

pub const DATA_FILE_NAME: &str = "messages.json";

/// Store kept in a pretty-printed JSON array, re-read on every call so edits
/// made by hand show up without a restart.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    admin_key: Option<String>,
    rng: StdRng,
}

impl JsonFileStore {
    /// Opens `data_dir/messages.json`, creating the directory and an empty
    /// file if needed.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(DATA_FILE_NAME);
        if !path.exists() {
            fs::write(&path, "[]")?;
            info!(path = %path.display(), "created empty message file");
        }
        Ok(Self {
            path,
            admin_key: None,
            rng: StdRng::from_entropy(),
        })
    }

    pub fn admin_key(mut self, key: Option<String>) -> Self {
        self.admin_key = key;
        self
    }

    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file or one that is not valid JSON reads as empty. A valid
    /// document that is not an array is an error, so writes never replace it.
    fn read(&self) -> Result<Snapshot, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "could not read message file");
                return Ok(Snapshot::default());
            }
        };
        let document: Value = match serde_json::from_str(&text) {
            Ok(document) => document,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "invalid json in message file");
                return Ok(Snapshot::default());
            }
        };
        let entries: Vec<Value> = serde_json::from_value(document)?;
        Ok(Snapshot::parse(entries, &self.path))
    }

    fn write(&self, snapshot: Snapshot) -> Result<(), StoreError> {
        let payload = serde_json::to_string_pretty(&snapshot.into_entries()?)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

/// The file's entries plus the ones that parse as records. Entries that do
/// not parse are written back untouched.
#[derive(Debug, Default)]
struct Snapshot {
    entries: Vec<Value>,
    /// Index into `entries` of each parsed record.
    positions: Vec<usize>,
    records: Vec<MessageRecord>,
}

impl Snapshot {
    fn parse(entries: Vec<Value>, path: &Path) -> Self {
        let mut positions = Vec::with_capacity(entries.len());
        let mut records = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            match MessageRecord::deserialize(entry) {
                Ok(record) => {
                    positions.push(position);
                    records.push(record);
                }
                Err(err) => warn!(path = %path.display(), position, %err, "skipping unreadable message"),
            }
        }
        Self {
            entries,
            positions,
            records,
        }
    }

    /// Records past the parsed ones are appended after every entry.
    fn into_entries(self) -> Result<Vec<Value>, StoreError> {
        let mut entries = self.entries;
        for (i, record) in self.records.into_iter().enumerate() {
            let value = serde_json::to_value(record)?;
            match self.positions.get(i) {
                Some(&position) => entries[position] = value,
                None => entries.push(value),
            }
        }
        Ok(entries)
    }
}

impl MessageStore for JsonFileStore {
    fn list_messages(&self) -> Result<Vec<MessageRecord>, StoreError> {
        Ok(self.read()?.records)
    }

    fn append_message(&mut self, draft: NewMessage) -> Result<MessageRecord, StoreError> {
        let mut snapshot = self.read()?;
        let record = append_record(&mut snapshot.records, draft, Utc::now(), &mut self.rng)?;
        self.write(snapshot)?;
        Ok(record)
    }

    fn delete_all(&mut self, admin_key: &str) -> Result<(), StoreError> {
        check_admin_key(self.admin_key.as_deref(), admin_key)?;
        self.write(Snapshot::default())?;
        info!(path = %self.path.display(), "all messages deleted");
        Ok(())
    }

    fn ensure_share_token(&mut self, id: &MessageId) -> Result<MessageRecord, StoreError> {
        let mut snapshot = self.read()?;
        let (record, changed) = ensure_share_token_in(&mut snapshot.records, id, &mut self.rng)?;
        if changed {
            self.write(snapshot)?;
        }
        Ok(record)
    }
}
