//! `localStorage` persistence for the browser canvas.

use fof_core::model::Diagram;
use fof_core::storage::{SnapshotStore, StorageError, decode_snapshot, encode_snapshot};
use web_sys::Storage;

/// Key the working diagram is stored under.
pub const DEFAULT_STORAGE_KEY: &str = "fof:diagram";

pub struct LocalStorageStore {
    storage: Storage,
    key: String,
}

impl LocalStorageStore {
    /// `None` when the page has no `localStorage` (private mode, sandboxed
    /// iframes, non-browser hosts).
    pub fn open(key: &str) -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self {
            storage,
            key: key.to_string(),
        })
    }

    fn try_load(&self) -> Result<Option<Diagram>, StorageError> {
        let raw = self
            .storage
            .get_item(&self.key)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?;
        raw.map(|raw| decode_snapshot(&raw)).transpose()
    }

    fn try_save(&self, diagram: &Diagram) -> Result<(), StorageError> {
        let encoded = encode_snapshot(diagram)?;
        // Quota errors surface here as a DOMException.
        self.storage
            .set_item(&self.key, &encoded)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }
}

impl SnapshotStore for LocalStorageStore {
    fn load(&self) -> Option<Diagram> {
        match self.try_load() {
            Ok(diagram) => diagram,
            Err(err) => {
                log::warn!("localStorage load failed: {err}");
                None
            }
        }
    }

    fn save(&mut self, diagram: &Diagram) -> bool {
        match self.try_save(diagram) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("localStorage save failed: {err}");
                false
            }
        }
    }
}
