//! Service layer for Titan
//!
//! Remote resolution, repository bookkeeping, and the orchestration of
//! push/pull operations against an external transfer engine.

pub mod cancellation;
pub mod operation_service;
pub mod remote;
pub mod repository_service;
pub mod transfer;

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use cancellation::CancellationToken;
pub use operation_service::{OperationService, ProgressSink};
pub use remote::{RemoteProvider, RemoteRegistry};
pub use repository_service::RepositoryService;
pub use transfer::{NopTransferEngine, TransferEngine, TransferError, TransferRequest};

// Guarded state is only mutated in short non-panicking sections, so a
// poisoned lock still holds consistent data.

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
