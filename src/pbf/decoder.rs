//! Block body decoding
//!
//! Decompressing and parsing a data block is left to the caller: anything
//! that turns the raw body bytes into a `Buffer` of items can be plugged in.

use std::ops::BitOr;

use bytes::Bytes;

use crate::error::Result;
use crate::memory::{Buffer, ItemType};

use super::ReadMeta;

/// Set of object kinds a decoder should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EntityBits(u8);

impl EntityBits {
    pub const NOTHING: EntityBits = EntityBits(0);
    pub const NODE: EntityBits = EntityBits(0x01);
    pub const WAY: EntityBits = EntityBits(0x02);
    pub const RELATION: EntityBits = EntityBits(0x04);
    pub const AREA: EntityBits = EntityBits(0x08);
    pub const CHANGESET: EntityBits = EntityBits(0x10);
    pub const ALL: EntityBits = EntityBits(0x1F);

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether objects of `item_type` are included. Non-object types never are.
    pub fn contains(self, item_type: ItemType) -> bool {
        let bit = match item_type {
            ItemType::Node => Self::NODE,
            ItemType::Way => Self::WAY,
            ItemType::Relation => Self::RELATION,
            ItemType::Area => Self::AREA,
            ItemType::Changeset => Self::CHANGESET,
            _ => return false,
        };
        self.0 & bit.0 != 0
    }
}

impl BitOr for EntityBits {
    type Output = EntityBits;

    fn bitor(self, rhs: EntityBits) -> EntityBits {
        EntityBits(self.0 | rhs.0)
    }
}

/// Turns the body of one data block into a buffer of items
pub trait BlockDecoder {
    fn decode(&self, data: Bytes, read_types: EntityBits, read_meta: ReadMeta) -> Result<Buffer>;
}

impl<F> BlockDecoder for F
where
    F: Fn(Bytes, EntityBits, ReadMeta) -> Result<Buffer>,
{
    fn decode(&self, data: Bytes, read_types: EntityBits, read_meta: ReadMeta) -> Result<Buffer> {
        self(data, read_types, read_meta)
    }
}
