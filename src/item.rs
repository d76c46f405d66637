//! Identifiers and the positioned item record
//!
//! Every sortable entity (a topic inside a course, an activity inside a topic)
//! is reduced to an [`ItemId`] and a floating-point `position`. The list it
//! belongs to is named by a [`ScopeId`].

use crate::error::OrderingError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Opaque identifier of an item, unique within its list
///
/// Backends hand out either numeric or string keys, so both are accepted.
/// Integers sort before strings; this ordering is only used to break ties
/// between items whose positions collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Int(i64),
    Str(String),
}

impl PartialOrd for ItemId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ItemId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ItemId::Int(a), ItemId::Int(b)) => a.cmp(b),
            (ItemId::Str(a), ItemId::Str(b)) => a.cmp(b),
            (ItemId::Int(_), ItemId::Str(_)) => Ordering::Less,
            (ItemId::Str(_), ItemId::Int(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Int(id) => write!(f, "{}", id),
            ItemId::Str(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        ItemId::Int(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        ItemId::Str(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        ItemId::Str(id)
    }
}

/// Numeric ids coming from JS, where every number is an `f64`
///
/// Only whole numbers inside the `i64` range are accepted.
impl TryFrom<f64> for ItemId {
    type Error = OrderingError;

    fn try_from(number: f64) -> Result<Self, Self::Error> {
        // i64::MAX as f64 rounds up to 2^63, hence the strict bound
        if number.fract() != 0.0 || number < i64::MIN as f64 || number >= i64::MAX as f64 {
            return Err(OrderingError::InvalidItemId(number.to_string()));
        }
        Ok(ItemId::Int(number as i64))
    }
}

/// Kind of parent that owns an ordered list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    /// Topics ordered within a course
    Course,
    /// Activities ordered within a topic
    Topic,
}

/// Names one independent ordering domain
///
/// Two scopes never share position keys: moving an activity inside
/// topic T leaves the topics of the surrounding course untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId {
    pub kind: ScopeKind,
    pub id: String,
}

impl ScopeId {
    /// Topics of the given course
    pub fn course(id: impl Into<String>) -> Self {
        Self {
            kind: ScopeKind::Course,
            id: id.into(),
        }
    }

    /// Activities of the given topic
    pub fn topic(id: impl Into<String>) -> Self {
        Self {
            kind: ScopeKind::Topic,
            id: id.into(),
        }
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ScopeKind::Course => write!(f, "course:{}", self.id),
            ScopeKind::Topic => write!(f, "topic:{}", self.id),
        }
    }
}

/// A sortable entity as seen by the ordering layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedItem {
    /// Stable identifier
    pub id: ItemId,

    /// Sparse ordering key; the list order is ascending by this value
    pub position: f64,

    /// Remaining snapshot fields (title, description, ...), opaque here
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl PositionedItem {
    /// Create an item without payload
    pub fn new(id: impl Into<ItemId>, position: f64) -> Self {
        Self {
            id: id.into(),
            position,
            data: serde_json::Value::Null,
        }
    }

    /// Attach snapshot fields
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Total order used by sorted views: position, then id
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        self.position
            .total_cmp(&other.position)
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_from_number() {
        assert_eq!(ItemId::try_from(42.0), Ok(ItemId::Int(42)));
        assert_eq!(ItemId::try_from(-3.0), Ok(ItemId::Int(-3)));
        assert!(matches!(
            ItemId::try_from(1.5),
            Err(OrderingError::InvalidItemId(_))
        ));
        assert!(ItemId::try_from(f64::NAN).is_err());
        assert!(ItemId::try_from(f64::INFINITY).is_err());
        assert!(ItemId::try_from(1.0e19).is_err());
    }

    #[test]
    fn test_item_id_ordering() {
        assert!(ItemId::Int(1) < ItemId::Int(2));
        assert!(ItemId::from("a") < ItemId::from("b"));
        // Integers before strings
        assert!(ItemId::Int(99) < ItemId::from("a"));
    }

    #[test]
    fn test_item_id_deserializes_untagged() {
        let ids: Vec<ItemId> = serde_json::from_str(r#"[7, "topic-1"]"#).unwrap();
        assert_eq!(ids, vec![ItemId::Int(7), ItemId::from("topic-1")]);
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(ScopeId::course("c1").to_string(), "course:c1");
        assert_eq!(ScopeId::topic("t9").to_string(), "topic:t9");
        assert_ne!(ScopeId::course("x"), ScopeId::topic("x"));
    }

    #[test]
    fn test_sort_cmp_ties_broken_by_id() {
        let a = PositionedItem::new(2i64, 100.0);
        let b = PositionedItem::new(1i64, 100.0);
        assert_eq!(a.sort_cmp(&b), Ordering::Greater);

        let c = PositionedItem::new(1i64, 50.0);
        assert_eq!(c.sort_cmp(&a), Ordering::Less);
    }

    #[test]
    fn test_snapshot_payload_roundtrip() {
        let json = serde_json::json!({
            "id": "a1",
            "position": 1000.0,
            "data": {"title": "Intro"}
        });
        let item: PositionedItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.id, ItemId::from("a1"));
        assert_eq!(item.data["title"], "Intro");

        let bare: PositionedItem =
            serde_json::from_value(serde_json::json!({"id": 3, "position": 1.5})).unwrap();
        assert!(bare.data.is_null());
    }
}
