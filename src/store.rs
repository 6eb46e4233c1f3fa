use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::Context;
use log::debug;

/// What changed in the store, delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub key: String,
    pub change: Change,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Set,
    Removed,
}

/// Synchronous string-keyed value store. Values are opaque strings; record
/// and directory layers store JSON documents in them.
pub trait Store {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&mut self, key: &str) -> anyhow::Result<()>;
    /// All keys, in unspecified but stable order.
    fn keys(&self) -> Vec<String>;
    /// Push notification of store mutations. Receivers whose other end has
    /// been dropped are pruned on the next mutation.
    fn subscribe(&mut self) -> Receiver<StoreEvent>;
}

fn notify(subscribers: &mut Vec<Sender<StoreEvent>>, event: StoreEvent) {
    subscribers.retain(|tx| tx.send(event.clone()).is_ok());
}

/// In-memory store, used as the injected fake in tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        notify(
            &mut self.subscribers,
            StoreEvent {
                key: key.to_string(),
                change: Change::Set,
            },
        );
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        if self.entries.remove(key).is_some() {
            notify(
                &mut self.subscribers,
                StoreEvent {
                    key: key.to_string(),
                    change: Change::Removed,
                },
            );
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }
}

/// File-backed store: a single JSON object mapping keys to string values,
/// rewritten in full on every mutation. Small data, no partial writes to
/// reason about.
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl JsonFileStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let entries = if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read store file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("store file {} is not valid JSON", path.display()))?
        } else {
            BTreeMap::new()
        };
        debug!("opened store {} with {} keys", path.display(), entries.len());
        Ok(JsonFileStore {
            path: path.to_path_buf(),
            entries,
            subscribers: Vec::new(),
        })
    }

    fn persist(&self) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, text)
            .with_context(|| format!("failed to write store file {}", self.path.display()))
    }
}

impl Store for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()?;
        notify(
            &mut self.subscribers,
            StoreEvent {
                key: key.to_string(),
                change: Change::Set,
            },
        );
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
            notify(
                &mut self.subscribers,
                StoreEvent {
                    key: key.to_string(),
                    change: Change::Removed,
                },
            );
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }
}
