//! Diagram persistence collaborators.
//!
//! The editor only sees [`SnapshotStore`]: a load that may find nothing and
//! a save that reports success as a flag. Concrete stores keep a richer
//! [`StorageError`] internally and log it before folding it into the flag.

use crate::model::Diagram;
use thiserror::Error;

/// Why a store could not read or write a snapshot.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("snapshot of {size} bytes exceeds quota of {quota} bytes")]
    QuotaExceeded { size: usize, quota: usize },
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Load/save of the working diagram.
pub trait SnapshotStore {
    /// The last saved diagram, or `None` when nothing usable is stored.
    fn load(&self) -> Option<Diagram>;

    /// Persist `diagram`. Returns `false` on any failure; the caller keeps
    /// its in-memory state either way.
    fn save(&mut self, diagram: &Diagram) -> bool;
}

/// Encode a diagram the way every store writes it.
pub fn encode_snapshot(diagram: &Diagram) -> Result<String, StorageError> {
    Ok(serde_json::to_string(diagram)?)
}

/// Decode a stored snapshot, dropping edges whose endpoints are gone.
pub fn decode_snapshot(raw: &str) -> Result<Diagram, StorageError> {
    let mut diagram: Diagram = serde_json::from_str(raw)?;
    let dropped = diagram.retain_valid_edges();
    if dropped > 0 {
        log::warn!("stored snapshot had {dropped} dangling edges");
    }
    diagram.prune_orphan_handles();
    Ok(diagram)
}

/// In-process store, optionally bounded to a byte quota.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Option<String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses snapshots larger than `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            slot: None,
            quota: Some(bytes),
        }
    }

    /// Raw stored payload, if any.
    pub fn raw(&self) -> Option<&str> {
        self.slot.as_deref()
    }

    /// Replace the stored payload directly, bypassing encoding.
    pub fn put_raw(&mut self, raw: impl Into<String>) {
        self.slot = Some(raw.into());
    }

    fn try_save(&mut self, diagram: &Diagram) -> Result<(), StorageError> {
        let encoded = encode_snapshot(diagram)?;
        if let Some(quota) = self.quota
            && encoded.len() > quota
        {
            return Err(StorageError::QuotaExceeded {
                size: encoded.len(),
                quota,
            });
        }
        self.slot = Some(encoded);
        Ok(())
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Option<Diagram> {
        let raw = self.slot.as_deref()?;
        decode_snapshot(raw)
            .map_err(|e| log::warn!("discarding stored diagram: {e}"))
            .ok()
    }

    fn save(&mut self, diagram: &Diagram) -> bool {
        match self.try_save(diagram) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("save failed: {e}");
                false
            }
        }
    }
}
