//! # cureroom-store
//!
//! Byte-level key/value persistence for drying rooms. The runtime encodes
//! snapshots with its codec and hands the bytes to a [`SnapshotStore`];
//! the store itself knows nothing about rooms beyond the key helpers in
//! [`keys`].
//!
//! Two implementations ship here:
//!
//! - [`MemoryStore`]: a shared in-process map, used by tests and demos.
//! - [`FileStore`]: one file per key under a data directory.

mod error;
mod file;
pub mod keys;
mod memory;

use std::future::Future;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;

/// Asynchronous key/value storage for encoded room state.
///
/// Implementations must be cheap to clone; each room actor holds its own
/// handle to the same backing store. [`MemoryStore`] shares its map
/// through an `Arc` and [`FileStore`] is just a directory path, so either
/// clone is cheap.
///
/// The methods return `impl Future + Send` instead of being `async fn`.
/// The two are the same to an implementor (an `async fn` body satisfies
/// the signature), but spelling out `Send` lets the room actor, which runs
/// on `tokio::spawn`, hold the future across an `.await` without a boxed
/// trait object.
///
/// Values are opaque bytes. Keys come from [`keys`], which keeps every
/// room inside its own namespace:
///
/// ```rust
/// use cureroom_store::{MemoryStore, SnapshotStore, keys};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let store = MemoryStore::new();
/// store.put(&keys::backup("room1"), b"{}".to_vec()).await.unwrap();
///
/// // The backup lives beside the latest snapshot, never on top of it.
/// assert!(store.get(&keys::latest("room1")).await.unwrap().is_none());
/// assert!(store.get("room1-backup").await.unwrap().is_some());
/// # });
/// ```
pub trait SnapshotStore: Clone + Send + Sync + 'static {
    /// Reads the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send;

    /// Writes `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: Vec<u8>) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}
