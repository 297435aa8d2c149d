//! Forgiving number parsing for command payloads.
//!
//! Setpoints and device indices arrive from a dashboard that may send
//! `65.5`, `1e20` or `-1`. Rejecting those at decode time would turn an
//! input the supervisor clamps or ignores into a protocol error, so every
//! JSON number is mapped onto the nearest `i64` instead.

use std::fmt;

use serde::Deserializer;
use serde::de::{self, Unexpected, Visitor};

/// Deserializes any number as an `i64`: fractions round half away from
/// zero and out-of-range values saturate at `i64::MIN`/`i64::MAX`.
pub(crate) fn integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(IntegerVisitor)
}

struct IntegerVisitor;

impl<'de> Visitor<'de> for IntegerVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
        Ok(value)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
        Ok(i64::try_from(value).unwrap_or(i64::MAX))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<i64, E> {
        if value.is_nan() {
            return Err(E::invalid_value(Unexpected::Float(value), &self));
        }
        // Float-to-int `as` casts saturate.
        Ok(value.round() as i64)
    }
}
