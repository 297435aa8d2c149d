//! Error types for the store layer.

/// Errors that can occur while reading or writing persisted state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The key cannot be mapped to a storage location.
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),

    /// The room id ends like one of another room's derived keys.
    #[error("room id {0:?} collides with a derived storage key")]
    ReservedRoomId(String),
}
