//! Memory Module
//!
//! The append-only arena that holds every OSM item, plus the byte-level
//! layout shared by builders (write side) and views (read side).
//!
//! ## Item Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header (8 bytes, little endian)                              │
//! │   Size: u32 (4) | Type: u16 (2) | Flags: u16 (2)             │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Fixed fields (kind specific)                                 │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Strings (NUL terminated) and nested items                    │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Padding to ALIGN_BYTES (not counted in Size)                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Size` covers the header, the fixed fields and everything nested in the
//! item. Items follow each other back to back, each starting on an
//! `ALIGN_BYTES` boundary.

mod buffer;
mod item;

use serde::{Deserialize, Serialize};

pub use buffer::Buffer;
pub use item::{ItemIter, ItemView};

// =============================================================================
// Shared Constants
// =============================================================================

/// Every item starts on, and is padded to, a multiple of this many bytes
pub const ALIGN_BYTES: usize = 8;

/// Header size: Size (4) + Type (2) + Flags (2) = 8 bytes
pub const ITEM_HEADER_SIZE: usize = 8;

pub(crate) const SIZE_OFFSET: usize = 0;
pub(crate) const TYPE_OFFSET: usize = 4;
pub(crate) const FLAGS_OFFSET: usize = 6;

/// Header flag: the item was removed
pub(crate) const FLAG_REMOVED: u16 = 0x0001;

/// Round `length` up to the next multiple of `ALIGN_BYTES`
pub const fn padded_length(length: usize) -> usize {
    (length + ALIGN_BYTES - 1) & !(ALIGN_BYTES - 1)
}

// =============================================================================
// Item Types
// =============================================================================

/// Type code stored in every item header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ItemType {
    Undefined = 0x00,
    Node = 0x01,
    Way = 0x02,
    Relation = 0x03,
    Area = 0x04,
    Changeset = 0x05,
    TagList = 0x11,
    WayNodeList = 0x12,
    RelationMemberList = 0x13,
    RelationMemberListWithFullMembers = 0x23,
    OuterRing = 0x40,
    InnerRing = 0x41,
    ChangesetDiscussion = 0x80,
}

impl ItemType {
    /// Decode a type code; unknown codes map to `Undefined`
    pub fn from_u16(code: u16) -> Self {
        match code {
            0x01 => ItemType::Node,
            0x02 => ItemType::Way,
            0x03 => ItemType::Relation,
            0x04 => ItemType::Area,
            0x05 => ItemType::Changeset,
            0x11 => ItemType::TagList,
            0x12 => ItemType::WayNodeList,
            0x13 => ItemType::RelationMemberList,
            0x23 => ItemType::RelationMemberListWithFullMembers,
            0x40 => ItemType::OuterRing,
            0x41 => ItemType::InnerRing,
            0x80 => ItemType::ChangesetDiscussion,
            _ => ItemType::Undefined,
        }
    }

    /// Node, way, relation or area
    pub fn is_osm_object(self) -> bool {
        matches!(
            self,
            ItemType::Node | ItemType::Way | ItemType::Relation | ItemType::Area
        )
    }

    /// Lists of node references (way nodes and area rings)
    pub fn is_node_ref_list(self) -> bool {
        matches!(
            self,
            ItemType::WayNodeList | ItemType::OuterRing | ItemType::InnerRing
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Undefined => "undefined",
            ItemType::Node => "node",
            ItemType::Way => "way",
            ItemType::Relation => "relation",
            ItemType::Area => "area",
            ItemType::Changeset => "changeset",
            ItemType::TagList => "tag_list",
            ItemType::WayNodeList => "way_node_list",
            ItemType::RelationMemberList => "relation_member_list",
            ItemType::RelationMemberListWithFullMembers => {
                "relation_member_list_with_full_members"
            }
            ItemType::OuterRing => "outer_ring",
            ItemType::InnerRing => "inner_ring",
            ItemType::ChangesetDiscussion => "changeset_discussion",
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Little-endian field access
// =============================================================================
//
// Callers check bounds once (when a view or builder is created); these
// helpers index directly.

pub(crate) fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

pub(crate) fn read_i32(data: &[u8], offset: usize) -> i32 {
    read_u32(data, offset) as i32
}

pub(crate) fn read_i64(data: &[u8], offset: usize) -> i64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&data[offset..offset + 8]);
    i64::from_le_bytes(raw)
}

pub(crate) fn write_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_i32(data: &mut [u8], offset: usize, value: i32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_i64(data: &mut [u8], offset: usize, value: i64) {
    data[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

/// Read a NUL terminated string starting at `offset`.
///
/// Returns the string (without the NUL) and the offset just past the NUL,
/// or `None` if no terminator exists before the end of `data` or the bytes
/// are not UTF-8.
pub(crate) fn read_cstr(data: &[u8], offset: usize) -> Option<(&str, usize)> {
    let rest = data.get(offset..)?;
    let nul = rest.iter().position(|&b| b == 0)?;
    let s = std::str::from_utf8(&rest[..nul]).ok()?;
    Some((s, offset + nul + 1))
}
