//! Storage key layout.
//!
//! | Key                         | Contents                     |
//! |-----------------------------|------------------------------|
//! | `{room}`                    | latest durable snapshot      |
//! | `{room}-backup`             | manual backup snapshot       |
//! | `{room}-alert-history`      | notification log             |

/// Suffixes appended to a room id to derive its secondary keys.
pub const DERIVED_SUFFIXES: [&str; 2] = ["-backup", "-alert-history"];

/// Checks that `room` can own the key namespace above.
///
/// The id must itself be a valid key, and must not end in a derived
/// suffix: room `a-backup` would otherwise write its snapshot over room
/// `a`'s backup.
pub fn check_room_id(room: &str) -> Result<(), crate::StoreError> {
    validate(room)?;
    if DERIVED_SUFFIXES.iter().any(|suffix| room.ends_with(suffix)) {
        return Err(crate::StoreError::ReservedRoomId(room.to_owned()));
    }
    Ok(())
}

/// Key of the latest durable snapshot for `room`.
pub fn latest(room: &str) -> String {
    room.to_owned()
}

/// Key of the manual backup for `room`.
pub fn backup(room: &str) -> String {
    format!("{room}-backup")
}

/// Key of the persisted notification log for `room`.
pub fn alert_history(room: &str) -> String {
    format!("{room}-alert-history")
}

/// Rejects keys that are empty or could escape a storage directory.
pub(crate) fn validate(key: &str) -> Result<(), crate::StoreError> {
    let bad = key.is_empty()
        || key.starts_with('.')
        || key.contains(['/', '\\', '\0'])
        || key.contains("..");
    if bad {
        Err(crate::StoreError::InvalidKey(key.to_owned()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(latest("room1"), "room1");
        assert_eq!(backup("room1"), "room1-backup");
        assert_eq!(alert_history("room1"), "room1-alert-history");
    }

    #[test]
    fn test_validate_rejects_path_escapes() {
        assert!(validate("room1").is_ok());
        assert!(validate("room1-backup").is_ok());
        assert!(validate("").is_err());
        assert!(validate("../etc").is_err());
        assert!(validate("a/b").is_err());
        assert!(validate("a\\b").is_err());
        assert!(validate(".hidden").is_err());
    }

    #[test]
    fn test_room_ids_cannot_shadow_derived_keys() {
        assert!(check_room_id("room1").is_ok());
        assert!(check_room_id("backup").is_ok());
        assert!(check_room_id("a-backups").is_ok());
        assert!(matches!(
            check_room_id("a-backup"),
            Err(crate::StoreError::ReservedRoomId(_))
        ));
        assert!(check_room_id("a-alert-history").is_err());
        assert!(matches!(
            check_room_id("../a"),
            Err(crate::StoreError::InvalidKey(_))
        ));
        assert!(check_room_id("").is_err());
    }
}
