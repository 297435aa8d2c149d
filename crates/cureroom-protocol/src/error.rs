//! Error types for the protocol layer.
//!
//! Every crate in the workspace owns one error enum, and this is the one
//! for turning values into bytes and back. Seeing a `ProtocolError` tells
//! you the frame or snapshot itself was the problem: the socket, the store
//! and the room actor are all fine.
//!
//! Higher layers wrap it rather than flatten it. The store path reaches it
//! through `RoomError::Protocol`, and the gateway maps it to a `400` reply
//! because a frame that does not decode is the client's mistake, not the
//! server's.

/// Errors raised while converting protocol values to and from bytes.
///
/// `#[derive(thiserror::Error)]` writes the `std::error::Error` impl, and
/// each `#[error("...")]` attribute becomes the `Display` text that lands in
/// logs and in the `message` of an error frame. The serde variants keep the
/// original `serde_json::Error` so its line and column survive.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    ///
    /// Rare with the types in this crate: it means a value could not be
    /// represented at all, such as a map with non-string keys.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed input, missing fields, or a
    /// value of the wrong shape.
    ///
    /// Numbers are the exception. Setpoints and device indices accept any
    /// JSON number and are clamped later, so `{"value":1e20}` decodes fine
    /// and never ends up here. A string where a number belongs still does.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The bytes decoded, but do not form a usable message (for example
    /// a text frame that is not valid UTF-8).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
