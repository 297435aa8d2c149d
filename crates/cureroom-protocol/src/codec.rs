//! Codec trait and the JSON implementation.
//!
//! Snapshots written to the store and frames exchanged with the dashboard
//! both go through a [`Codec`], so the on-disk format and the wire format
//! can be swapped together without touching the room runtime.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Converts values to bytes and back.
///
/// `Send + Sync + 'static` because a single codec instance is shared by
/// every room actor and every gateway connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do not
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Serializes a value into a UTF-8 string, for text-only channels.
    ///
    /// # Errors
    /// Returns `ProtocolError::InvalidMessage` if the codec produced bytes
    /// that are not valid UTF-8.
    fn encode_text<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        let bytes = self.encode(value)?;
        String::from_utf8(bytes)
            .map_err(|e| ProtocolError::InvalidMessage(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// JSON keeps persisted snapshots readable and matches what a browser
/// dashboard sends natively.
///
/// ```rust
/// use cureroom_protocol::{Codec, Command, JsonCodec, Mode};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Command::SetMode { mode: Mode::Automatic }).unwrap();
/// let decoded: Command = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, Command::SetMode { mode: Mode::Automatic });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }

    fn encode_text<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Command, SensorKind, SensorSample};

    #[test]
    fn test_decode_rejects_truncated_input() {
        let codec = JsonCodec;
        let result: Result<Command, _> = codec.decode(br#"{"type":"SetMode""#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_encode_text_matches_bytes() {
        let codec = JsonCodec;
        let cmd = Command::UpdateSensor {
            sample: SensorSample {
                sensor_id: 2,
                kind: SensorKind::Humidity,
                value: 51.5,
            },
        };
        let text = codec.encode_text(&cmd).unwrap();
        assert_eq!(text.as_bytes(), codec.encode(&cmd).unwrap().as_slice());
    }
}
