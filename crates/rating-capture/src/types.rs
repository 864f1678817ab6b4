//! Entities handed over by the persistence layer and the change events
//! derived from them.

use crate::error::RatingError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// User identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rated item identifier (a movie in the recommender)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Finite rating score
///
/// Whole values always render with one fractional digit (`5.0`), so the
/// textual form matches what downstream consumers already parse.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct RatingValue(f64);

impl RatingValue {
    /// Create a rating value, rejecting NaN and infinities
    pub fn new(value: f64) -> Result<Self, RatingError> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(RatingError::NotFinite(value))
        }
    }

    /// Raw score
    #[inline]
    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for RatingValue {
    type Error = RatingError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingValue> for f64 {
    fn from(value: RatingValue) -> Self {
        value.0
    }
}

impl fmt::Display for RatingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0.abs() < 1e16 {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A user's rating of an item, as saved by the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Who rated
    pub user_id: UserId,
    /// What was rated
    pub item_id: ItemId,
    /// The score
    pub value: RatingValue,
}

impl Rating {
    /// Create new rating
    #[inline]
    #[must_use]
    pub fn new(user_id: UserId, item_id: ItemId, value: RatingValue) -> Self {
        Self {
            user_id,
            item_id,
            value,
        }
    }
}

/// Registered user entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier
    pub id: UserId,
    /// Login name
    pub username: String,
}

/// Movie entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    /// Identifier
    pub id: ItemId,
    /// Display title
    pub title: String,
}

/// Every entity kind the persistence layer can report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    /// A rating row
    Rating(Rating),
    /// A user row
    User(User),
    /// A movie row
    Movie(Movie),
}

impl Entity {
    /// Kind tag of this entity
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Rating(_) => EntityKind::Rating,
            Self::User(_) => EntityKind::User,
            Self::Movie(_) => EntityKind::Movie,
        }
    }
}

impl From<Rating> for Entity {
    fn from(rating: Rating) -> Self {
        Self::Rating(rating)
    }
}

/// Entity kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// [`Entity::Rating`]
    Rating,
    /// [`Entity::User`]
    User,
    /// [`Entity::Movie`]
    Movie,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rating => "rating",
            Self::User => "user",
            Self::Movie => "movie",
        };
        f.write_str(name)
    }
}

/// Whether the persisted entity was new or modified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// First save of the entity
    Created,
    /// Later modification of a saved entity
    Updated,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Updated => f.write_str("updated"),
        }
    }
}

/// A completed rating write, ready to be buffered
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChangeEvent {
    entity_kind: EntityKind,
    change_kind: ChangeKind,
    user_id: UserId,
    item_id: ItemId,
    rating: RatingValue,
}

impl ChangeEvent {
    /// Build the event for a persisted rating
    #[must_use]
    pub fn from_rating(change_kind: ChangeKind, rating: &Rating) -> Self {
        Self {
            entity_kind: EntityKind::Rating,
            change_kind,
            user_id: rating.user_id,
            item_id: rating.item_id,
            rating: rating.value,
        }
    }

    /// Always [`EntityKind::Rating`] today
    #[inline]
    #[must_use]
    pub fn entity_kind(&self) -> EntityKind {
        self.entity_kind
    }

    /// Created or updated
    #[inline]
    #[must_use]
    pub fn change_kind(&self) -> ChangeKind {
        self.change_kind
    }

    /// Rating author
    #[inline]
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Rated item
    #[inline]
    #[must_use]
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// Rating value as persisted
    #[inline]
    #[must_use]
    pub fn rating(&self) -> RatingValue {
        self.rating
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_value_rejects_non_finite() {
        assert!(RatingValue::new(f64::NAN).is_err());
        assert!(RatingValue::new(f64::INFINITY).is_err());
        assert!(RatingValue::try_from(f64::NEG_INFINITY).is_err());
        assert_eq!(RatingValue::new(3.5).unwrap().get(), 3.5);
    }

    #[test]
    fn rating_value_display_keeps_decimal_point() {
        assert_eq!(RatingValue::new(5.0).unwrap().to_string(), "5.0");
        assert_eq!(RatingValue::new(4.5).unwrap().to_string(), "4.5");
        assert_eq!(RatingValue::new(0.0).unwrap().to_string(), "0.0");
        assert_eq!(RatingValue::new(3.25).unwrap().to_string(), "3.25");
    }

    #[test]
    fn entity_kind_tags() {
        let rating = Rating::new(UserId(1), ItemId(2), RatingValue::new(3.0).unwrap());
        assert_eq!(Entity::from(rating).kind(), EntityKind::Rating);

        let movie = Entity::Movie(Movie {
            id: ItemId(2),
            title: "Heat".to_string(),
        });
        assert_eq!(movie.kind(), EntityKind::Movie);
        assert_eq!(movie.kind().to_string(), "movie");
    }

    #[test]
    fn change_event_copies_rating_fields() {
        let rating = Rating::new(UserId(7), ItemId(42), RatingValue::new(4.5).unwrap());
        let event = ChangeEvent::from_rating(ChangeKind::Updated, &rating);

        assert_eq!(event.entity_kind(), EntityKind::Rating);
        assert_eq!(event.change_kind(), ChangeKind::Updated);
        assert_eq!(event.user_id(), UserId(7));
        assert_eq!(event.item_id(), ItemId(42));
        assert_eq!(event.rating().get(), 4.5);
    }
}
