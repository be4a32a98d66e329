//! JSON fact snapshot loading.

use std::path::Path;

use tracing::{debug, instrument};

use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::memory::MemoryStore;
use crate::infrastructure::traits::FileSystem;

/// Load a fact snapshot into an in-memory store.
#[instrument(level = "debug", skip(fs))]
pub fn load_snapshot(fs: &dyn FileSystem, path: &Path) -> InfraResult<MemoryStore> {
    if !fs.exists(path) {
        return Err(InfraError::SnapshotMissing(path.to_path_buf()));
    }
    let content = fs
        .read_to_string(path)
        .map_err(|e| InfraError::io(format!("reading snapshot {}", path.display()), e))?;
    let store = MemoryStore::from_json(&content).map_err(|source| InfraError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        "loaded snapshot: {} visits, {} observations, {} measurements, {} display configs",
        store.visits.len(),
        store.observations.len(),
        store.measurements.len(),
        store.display_configs.len()
    );
    Ok(store)
}
