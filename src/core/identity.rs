//! Entity identity: taxonomy kinds and fixed-length hexadecimal record ids

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Length of a rendered [`RecordId`] (128-bit ULID as lowercase hex)
pub const RECORD_ID_LEN: usize = 32;

/// The taxonomy entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Delivery/store location (root of the hierarchy)
    Location,
    /// Product category, attached to a location
    Category,
    /// Sub-category, attached to a category
    Subcategory,
    /// Generic (active ingredient / generic product name)
    Generic,
    /// Supplier with contact details
    Supplier,
}

/// How a keyword is matched when listing a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordConfig {
    /// A keyword that parses as a [`RecordId`] also matches that exact id
    pub match_id: bool,
    /// The keyword is also matched as a substring of the slug
    pub match_slug: bool,
}

impl EntityKind {
    /// Machine name used on the command line and in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Location => "location",
            EntityKind::Category => "category",
            EntityKind::Subcategory => "subcategory",
            EntityKind::Generic => "generic",
            EntityKind::Supplier => "supplier",
        }
    }

    /// Human label used in messages
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Location => "Location",
            EntityKind::Category => "Category",
            EntityKind::Subcategory => "Sub Category",
            EntityKind::Generic => "Generic",
            EntityKind::Supplier => "Supplier",
        }
    }

    /// Label of the display-name field in validation messages
    pub fn name_label(&self) -> &'static str {
        match self {
            EntityKind::Supplier => "Supplier name",
            _ => "Name",
        }
    }

    /// Storage table holding records of this kind
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Location => "locations",
            EntityKind::Category => "categories",
            EntityKind::Subcategory => "subcategories",
            EntityKind::Generic => "generics",
            EntityKind::Supplier => "suppliers",
        }
    }

    /// Kind of the required parent reference, if this kind has one
    pub fn parent(&self) -> Option<EntityKind> {
        match self {
            EntityKind::Category => Some(EntityKind::Location),
            EntityKind::Subcategory => Some(EntityKind::Category),
            _ => None,
        }
    }

    /// Maximum display-name length in characters
    pub fn name_max_len(&self) -> usize {
        match self {
            EntityKind::Supplier => 300,
            _ => 50,
        }
    }

    /// Keyword matching used by `list` for this kind
    pub fn keyword_config(&self) -> KeywordConfig {
        match self {
            EntityKind::Location | EntityKind::Category | EntityKind::Subcategory => {
                KeywordConfig {
                    match_id: true,
                    match_slug: false,
                }
            }
            EntityKind::Generic => KeywordConfig {
                match_id: false,
                match_slug: false,
            },
            EntityKind::Supplier => KeywordConfig {
                match_id: false,
                match_slug: true,
            },
        }
    }

    /// All kinds, parents before children
    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Location,
            EntityKind::Category,
            EntityKind::Subcategory,
            EntityKind::Generic,
            EntityKind::Supplier,
        ]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "location" | "loc" => Ok(EntityKind::Location),
            "category" | "cat" => Ok(EntityKind::Category),
            "subcategory" | "sub-category" | "sub_category" | "sub" => {
                Ok(EntityKind::Subcategory)
            }
            "generic" | "gen" => Ok(EntityKind::Generic),
            "supplier" | "sup" => Ok(EntityKind::Supplier),
            _ => Err(IdParseError::InvalidKind(s.to_string())),
        }
    }
}

/// A record identifier: a ULID rendered as 32 lowercase hex characters.
///
/// ULIDs are time-ordered, so ids of records created later compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(Ulid);

impl RecordId {
    /// Generate a fresh id
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Wrap an existing ULID
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// The ULID behind this id
    pub fn ulid(&self) -> Ulid {
        self.0
    }

    /// Parse an id from its hex form
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }

    /// Whether `s` is syntactically a record id (no storage round-trip)
    pub fn is_well_formed(s: &str) -> bool {
        s.len() == RECORD_ID_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from(self.0))
    }
}

impl FromStr for RecordId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != RECORD_ID_LEN {
            return Err(IdParseError::InvalidLength(s.to_string(), s.len()));
        }
        // from_str_radix alone would accept a leading '+'
        if !Self::is_well_formed(s) {
            return Err(IdParseError::InvalidHex(s.to_string()));
        }
        let value = u128::from_str_radix(s, 16)
            .map_err(|_| IdParseError::InvalidHex(s.to_string()))?;
        Ok(Self(Ulid::from(value)))
    }
}

impl Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing kinds and record ids
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid entity kind: '{0}' (valid: location, category, subcategory, generic, supplier)")]
    InvalidKind(String),

    #[error("invalid id '{0}': expected 32 hex characters, got {1}")]
    InvalidLength(String, usize),

    #[error("invalid id '{0}': not hexadecimal")]
    InvalidHex(String),
}
