//! Session persistence
//!
//! Features:
//! - Versioned JSON snapshot (schema version lives in the storage key)
//! - All-or-nothing validation of stored objects
//! - Deferred reconstruction once the plank has been laid out

pub mod restore;
pub mod snapshot;
pub mod storage;

pub use restore::{RestoreStep, RestoreTask, SurfaceWait, reconstruct, wait_for_surface};
pub use snapshot::{STORAGE_KEY, Snapshot, SnapshotError};
pub use storage::{MemoryStorage, Storage, StorageError};
