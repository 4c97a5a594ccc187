//! Closed set of model kinds and their declared attributes.
//!
//! # Responsibility
//! - Map type-tag strings to kinds and back.
//! - Publish each kind's declared attributes with types and defaults.
//!
//! # Invariants
//! - `ModelKind::parse(kind.name()) == Some(kind)` for every kind.
//! - Tags are case-sensitive.

use super::value::AttrType;
use std::fmt::{Display, Formatter};

/// Concrete type of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModelKind {
    BaseModel,
    User,
    State,
    City,
    Amenity,
    Place,
    Review,
}

const USER_ATTRS: &[(&str, AttrType)] = &[
    ("email", AttrType::Str),
    ("password", AttrType::Str),
    ("first_name", AttrType::Str),
    ("last_name", AttrType::Str),
];

const STATE_ATTRS: &[(&str, AttrType)] = &[("name", AttrType::Str)];

const CITY_ATTRS: &[(&str, AttrType)] = &[("state_id", AttrType::Str), ("name", AttrType::Str)];

const AMENITY_ATTRS: &[(&str, AttrType)] = &[("name", AttrType::Str)];

const PLACE_ATTRS: &[(&str, AttrType)] = &[
    ("city_id", AttrType::Str),
    ("user_id", AttrType::Str),
    ("name", AttrType::Str),
    ("description", AttrType::Str),
    ("number_rooms", AttrType::Int),
    ("number_bathrooms", AttrType::Int),
    ("max_guest", AttrType::Int),
    ("price_by_night", AttrType::Int),
    ("latitude", AttrType::Float),
    ("longitude", AttrType::Float),
    ("amenity_ids", AttrType::List),
];

const REVIEW_ATTRS: &[(&str, AttrType)] = &[
    ("place_id", AttrType::Str),
    ("user_id", AttrType::Str),
    ("text", AttrType::Str),
];

impl ModelKind {
    /// Every registered kind, in tag order used by `help`.
    pub const ALL: [ModelKind; 7] = [
        ModelKind::BaseModel,
        ModelKind::User,
        ModelKind::State,
        ModelKind::City,
        ModelKind::Amenity,
        ModelKind::Place,
        ModelKind::Review,
    ];

    /// Type-tag string stored under `__class__`.
    pub fn name(self) -> &'static str {
        match self {
            Self::BaseModel => "BaseModel",
            Self::User => "User",
            Self::State => "State",
            Self::City => "City",
            Self::Amenity => "Amenity",
            Self::Place => "Place",
            Self::Review => "Review",
        }
    }

    /// Resolves a type-tag string.
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == tag)
    }

    /// Declared attributes for this kind.
    pub fn declared_attributes(self) -> &'static [(&'static str, AttrType)] {
        match self {
            Self::BaseModel => &[],
            Self::User => USER_ATTRS,
            Self::State => STATE_ATTRS,
            Self::City => CITY_ATTRS,
            Self::Amenity => AMENITY_ATTRS,
            Self::Place => PLACE_ATTRS,
            Self::Review => REVIEW_ATTRS,
        }
    }

    /// Declared type of `attribute`, if this kind declares it.
    pub fn declared_type(self, attribute: &str) -> Option<AttrType> {
        self.declared_attributes()
            .iter()
            .find(|(name, _)| *name == attribute)
            .map(|(_, ty)| *ty)
    }
}

impl Display for ModelKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
