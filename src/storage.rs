use crate::error::Result;
use crate::migration::{ensure_all, ensure_structure, ensure_year};
use crate::schema::Store;
use log::{info, warn};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Where the serialized store lives between runs.
pub trait StoreStorage {
    /// The last saved blob, or `None` when nothing was ever saved.
    fn read(&self) -> Result<Option<String>>;

    /// Replaces the saved blob.
    fn write(&self, blob: &str) -> Result<()>;
}

/// A single JSON file. Writes go to a sibling temp file that is renamed over the
/// target, so a crash never leaves a half-written blob behind.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoreStorage for JsonFileStorage {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&self.path)?))
    }

    fn write(&self, blob: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, blob)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Keeps the blob in memory. Useful for tests and for embedding without a disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blob: RefCell<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: RefCell::new(Some(blob.into())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.blob.borrow().clone()
    }
}

impl StoreStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.blob.borrow().clone())
    }

    fn write(&self, blob: &str) -> Result<()> {
        *self.blob.borrow_mut() = Some(blob.to_string());
        Ok(())
    }
}

/// How the store came to be when the application started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A saved blob was decoded and migrated.
    Loaded,
    /// Nothing was saved yet.
    Fresh,
    /// The saved blob could not be decoded and was discarded.
    Reinitialized { reason: String },
}

impl LoadOutcome {
    /// Whether the user should be told their saved data was lost.
    pub fn needs_notice(&self) -> bool {
        matches!(self, LoadOutcome::Reinitialized { .. })
    }
}

impl Store {
    /// The fresh-start store: `year` selected, all three users created and zero-filled.
    pub fn fresh(year: i32) -> Self {
        let mut store = Store::empty(year);
        ensure_year(&mut store, year);
        store
    }

    /// Drops every record and starts over.
    pub fn reinitialize(&mut self, year: i32) {
        *self = Store::fresh(year);
    }
}

/// Decodes a persisted blob, migrating every pair it contains and the current selection.
///
/// Undecodable input never fails the load: the store is rebuilt from scratch and the
/// outcome says so.
pub fn load_store(blob: Option<&str>, today_year: i32) -> (Store, LoadOutcome) {
    let Some(blob) = blob else {
        info!("No saved data found, starting fresh for {}", today_year);
        return (Store::fresh(today_year), LoadOutcome::Fresh);
    };

    match serde_json::from_str::<Store>(blob) {
        Ok(mut store) => {
            ensure_all(&mut store);
            let (year, user) = (store.current_year, store.current_user);
            ensure_structure(&mut store, year, user);
            info!(
                "Loaded {} years of data, selection {} / {}",
                store.years.len(),
                year,
                user
            );
            (store, LoadOutcome::Loaded)
        }
        Err(e) => {
            warn!("Saved data is corrupt, reinitializing: {}", e);
            (
                Store::fresh(today_year),
                LoadOutcome::Reinitialized {
                    reason: e.to_string(),
                },
            )
        }
    }
}

pub fn save_store(store: &Store) -> Result<String> {
    Ok(serde_json::to_string(store)?)
}
