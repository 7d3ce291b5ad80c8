//! Value types for OSM entities

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{OsmError, Result};
use crate::memory::ItemType;

pub type ObjectId = i64;
pub type ObjectVersion = u32;
pub type ChangesetId = u32;
pub type UserId = u32;

/// Longest tag key, tag value, role or user name, in bytes
pub const MAX_OSM_STRING_LENGTH: usize = 256 * 4;

// =============================================================================
// Location
// =============================================================================

/// Fixed-point coordinate pair (1e-7 degree resolution).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    x: i32,
    y: i32,
}

impl Location {
    pub const COORDINATE_PRECISION: i32 = 10_000_000;
    pub const UNDEFINED_COORDINATE: i32 = i32::MAX;

    /// Location from raw fixed-point values
    pub const fn from_raw(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Location from degrees
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            x: (lon * Self::COORDINATE_PRECISION as f64).round() as i32,
            y: (lat * Self::COORDINATE_PRECISION as f64).round() as i32,
        }
    }

    pub const fn undefined() -> Self {
        Self {
            x: Self::UNDEFINED_COORDINATE,
            y: Self::UNDEFINED_COORDINATE,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.x != Self::UNDEFINED_COORDINATE || self.y != Self::UNDEFINED_COORDINATE
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn lon(&self) -> f64 {
        self.x as f64 / Self::COORDINATE_PRECISION as f64
    }

    pub fn lat(&self) -> f64 {
        self.y as f64 / Self::COORDINATE_PRECISION as f64
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::undefined()
    }
}

/// Reference to a node, optionally with its coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeRef {
    pub id: ObjectId,
    pub location: Location,
}

impl NodeRef {
    pub fn new(id: ObjectId, location: Option<Location>) -> Self {
        Self {
            id,
            location: location.unwrap_or_default(),
        }
    }
}

/// Bounding box given by its bottom-left and top-right corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BBox {
    pub bottom_left: Location,
    pub top_right: Location,
}

impl BBox {
    pub fn new(bottom_left: Location, top_right: Location) -> Self {
        Self {
            bottom_left,
            top_right,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.bottom_left.is_defined() && self.top_right.is_defined()
    }
}

// =============================================================================
// Timestamp
// =============================================================================

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Seconds since the Unix epoch; 0 means "not set"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u32);

impl Timestamp {
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u32 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }

    /// Parse `YYYY-MM-DDThh:mm:ssZ`
    pub fn parse_iso(s: &str) -> Option<Self> {
        let secs = NaiveDateTime::parse_from_str(s, ISO_FORMAT)
            .ok()?
            .and_utc()
            .timestamp();
        u32::try_from(secs).ok().map(Self)
    }
}

impl From<u32> for Timestamp {
    fn from(secs: u32) -> Self {
        Self(secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return Ok(());
        }
        match DateTime::<Utc>::from_timestamp(self.0 as i64, 0) {
            Some(time) => write!(f, "{}", time.format(ISO_FORMAT)),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Area ids
// =============================================================================

/// Area ids are derived from the id of the way or relation they come from:
/// twice the id, plus one for relations, keeping the sign.
///
/// Fails for ids whose area id does not fit in an `ObjectId`.
pub fn object_id_to_area_id(id: ObjectId, item_type: ItemType) -> Result<ObjectId> {
    let offset = u64::from(item_type == ItemType::Relation);
    let area_id = id
        .unsigned_abs()
        .checked_mul(2)
        .and_then(|doubled| doubled.checked_add(offset))
        .and_then(|magnitude| i64::try_from(magnitude).ok())
        .ok_or_else(|| OsmError::InvalidAttribute {
            name: "id".to_string(),
            value: id.to_string(),
        })?;
    Ok(if id < 0 { -area_id } else { area_id })
}

/// Id of the way or relation an area was built from
pub fn area_id_to_object_id(area_id: ObjectId) -> ObjectId {
    area_id / 2
}

/// True if the area was built from a way (false: from a relation)
pub fn area_from_way(area_id: ObjectId) -> bool {
    area_id % 2 == 0
}
