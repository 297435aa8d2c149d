//! Shared vocabulary for cureroom.
//!
//! Every layer of the workspace speaks in these types:
//!
//! - **Types** ([`RoomId`], [`Mode`], [`Command`], [`Alert`], ...): the
//!   commands the presentation layer sends into a room and the advisory
//!   records that come back out.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those values are
//!   turned into bytes for snapshots and for the gateway.
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding or
//!   decoding.
//!
//! ```text
//! Presentation (JSON) → Protocol (Command) → Supervisor (RoomState)
//! ```

mod codec;
mod error;
mod lenient;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Alert, Command, Mode, RoomId, SensorKind, SensorSample, Severity,
};
