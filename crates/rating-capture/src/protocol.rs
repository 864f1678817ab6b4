//! Buffer record wire contract
//!
//! Every line in the buffer file has the form
//! `<prefix><userId>#<itemId>#<ratingValue>`. The prefixes are shared with
//! the downstream model updater and are versioned through
//! [`PROTOCOL_VERSION`]; changing their literal value is a major bump.

use crate::error::RecordError;
use crate::types::{ChangeEvent, ChangeKind, ItemId, Rating, RatingValue, UserId};
use std::fmt;

/// Prefix of a record for a newly created rating
pub const NEW_PREFIX: &str = "NEW#";

/// Prefix of a record for an updated rating
pub const UPDATE_PREFIX: &str = "UPDATE#";

/// Separator between record fields
pub const FIELD_SEPARATOR: char = '#';

/// Terminator appended after every record in the buffer file
pub const RECORD_TERMINATOR: char = '\n';

/// Version of the record format
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion {
    /// Bumped when existing records stop being readable
    pub major: u16,
    /// Bumped for additive changes
    pub minor: u16,
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Record format written by this crate
pub const PROTOCOL_VERSION: ProtocolVersion = ProtocolVersion { major: 1, minor: 0 };

/// Result of comparing a consumer's expected version against ours
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compatibility {
    /// Consumer can read every record we write
    Compatible,
    /// Consumer expects a newer minor revision; records are still readable
    Deprecated,
    /// Consumer cannot read our records
    Incompatible(String),
}

/// Check whether a consumer built against `expected` can read our records
#[must_use]
pub fn check_compatibility(expected: ProtocolVersion) -> Compatibility {
    let current = PROTOCOL_VERSION;

    if current.major != expected.major {
        return Compatibility::Incompatible(format!(
            "major version mismatch: current={current} expected={expected}"
        ));
    }

    if current.minor >= expected.minor {
        Compatibility::Compatible
    } else {
        Compatibility::Deprecated
    }
}

impl ChangeKind {
    /// Record prefix for this kind of change
    #[inline]
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Created => NEW_PREFIX,
            Self::Updated => UPDATE_PREFIX,
        }
    }
}

/// Render an event as a buffer record, without the line terminator
#[must_use]
pub fn format_record(event: &ChangeEvent) -> String {
    format!(
        "{prefix}{user}{sep}{item}{sep}{rating}",
        prefix = event.change_kind().prefix(),
        user = event.user_id(),
        item = event.item_id(),
        rating = event.rating(),
        sep = FIELD_SEPARATOR,
    )
}

/// Parse one buffer record back into an event
///
/// A single trailing terminator is accepted.
pub fn parse_record(line: &str) -> Result<ChangeEvent, RecordError> {
    let line = line.strip_suffix(RECORD_TERMINATOR).unwrap_or(line);

    let (change_kind, body) = if let Some(body) = line.strip_prefix(NEW_PREFIX) {
        (ChangeKind::Created, body)
    } else if let Some(body) = line.strip_prefix(UPDATE_PREFIX) {
        (ChangeKind::Updated, body)
    } else {
        return Err(RecordError::UnknownPrefix(line.to_string()));
    };

    let fields: Vec<&str> = body.split(FIELD_SEPARATOR).collect();
    let [user, item, rating] = fields.as_slice() else {
        return Err(RecordError::FieldCount {
            found: fields.len(),
        });
    };

    let user_id = unsigned(user)
        .and_then(|s| s.parse().ok())
        .map(UserId)
        .ok_or_else(|| RecordError::InvalidUserId((*user).to_string()))?;
    let item_id = unsigned(item)
        .and_then(|s| s.parse().ok())
        .map(ItemId)
        .ok_or_else(|| RecordError::InvalidItemId((*item).to_string()))?;
    let value = unsigned(rating)
        .and_then(|s| s.parse::<f64>().ok())
        .and_then(|v| RatingValue::new(v).ok())
        .ok_or_else(|| RecordError::InvalidRating((*rating).to_string()))?;

    Ok(ChangeEvent::from_rating(
        change_kind,
        &Rating::new(user_id, item_id, value),
    ))
}

/// `field` unless it carries an explicit `+`, which the writer never emits
fn unsigned(field: &str) -> Option<&str> {
    (!field.starts_with('+')).then_some(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn event(kind: ChangeKind, user: u64, item: u64, value: f64) -> ChangeEvent {
        let rating = Rating::new(UserId(user), ItemId(item), RatingValue::new(value).unwrap());
        ChangeEvent::from_rating(kind, &rating)
    }

    #[test]
    fn prefixes_are_distinct() {
        assert_ne!(NEW_PREFIX, UPDATE_PREFIX);
        assert_eq!(ChangeKind::Created.prefix(), "NEW#");
        assert_eq!(ChangeKind::Updated.prefix(), "UPDATE#");
    }

    #[test]
    fn format_matches_wire_contract() {
        assert_eq!(
            format_record(&event(ChangeKind::Created, 7, 42, 4.5)),
            "NEW#7#42#4.5"
        );
        assert_eq!(
            format_record(&event(ChangeKind::Updated, 7, 42, 5.0)),
            "UPDATE#7#42#5.0"
        );
    }

    #[test]
    fn parse_accepts_terminated_line() {
        let parsed = parse_record("UPDATE#7#42#5.0\n").unwrap();
        assert_eq!(parsed, event(ChangeKind::Updated, 7, 42, 5.0));
    }

    #[test]
    fn parse_rejects_malformed_lines() {
        assert!(matches!(
            parse_record("DEL#7#42#5.0"),
            Err(RecordError::UnknownPrefix(_))
        ));
        assert_eq!(
            parse_record("NEW#7#42"),
            Err(RecordError::FieldCount { found: 2 })
        );
        assert_eq!(
            parse_record("NEW#7#42#5.0#"),
            Err(RecordError::FieldCount { found: 4 })
        );
        assert_eq!(
            parse_record("NEW#x#42#5.0"),
            Err(RecordError::InvalidUserId("x".to_string()))
        );
        assert_eq!(
            parse_record("NEW#7#-1#5.0"),
            Err(RecordError::InvalidItemId("-1".to_string()))
        );
        assert_eq!(
            parse_record("NEW#7#42#NaN"),
            Err(RecordError::InvalidRating("NaN".to_string()))
        );
    }

    #[test]
    fn parse_rejects_explicit_plus_sign() {
        assert_eq!(
            parse_record("NEW#+7#42#4.5"),
            Err(RecordError::InvalidUserId("+7".to_string()))
        );
        assert_eq!(
            parse_record("UPDATE#7#+42#4.5"),
            Err(RecordError::InvalidItemId("+42".to_string()))
        );
        assert_eq!(
            parse_record("NEW#7#42#+4.5"),
            Err(RecordError::InvalidRating("+4.5".to_string()))
        );
    }

    #[test]
    fn compatibility_follows_version_rules() {
        assert_eq!(check_compatibility(PROTOCOL_VERSION), Compatibility::Compatible);
        assert_eq!(
            check_compatibility(ProtocolVersion { major: 1, minor: 1 }),
            Compatibility::Deprecated
        );
        assert!(matches!(
            check_compatibility(ProtocolVersion { major: 2, minor: 0 }),
            Compatibility::Incompatible(_)
        ));
    }

    proptest! {
        #[test]
        fn format_is_single_line_and_stable(
            user in any::<u64>(),
            item in any::<u64>(),
            value in -1.0e6f64..1.0e6,
            updated in any::<bool>(),
        ) {
            let kind = if updated { ChangeKind::Updated } else { ChangeKind::Created };
            let e = event(kind, user, item, value);
            let line = format_record(&e);

            prop_assert_eq!(&line, &format_record(&e));
            prop_assert!(line.starts_with(kind.prefix()));
            prop_assert!(!line.contains(RECORD_TERMINATOR));
            prop_assert_eq!(line.matches(FIELD_SEPARATOR).count(), 3);
            prop_assert_eq!(parse_record(&line).unwrap(), e);
        }
    }
}
