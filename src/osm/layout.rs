//! Byte offsets of the fixed fields of each item kind.
//!
//! Offsets of item fields are relative to the start of the item; offsets of
//! inline records (node refs, members, comments) are relative to the start of
//! the record.
//!
//! ```text
//! OSM object (node, way, relation, area)
//!   @8  id: i64        @16 version: u32    @20 changeset: u32
//!   @24 uid: u32       @28 timestamp: u32  @32 flags: u32
//!   node only: @40 x: i32, @44 y: i32
//!   then: user_size: u16, user bytes + NUL, padding
//!
//! Changeset
//!   @8  id: u32        @12 num_changes: u32  @16 num_comments: u32
//!   @20 uid: u32       @24 created_at: u32   @28 closed_at: u32
//!   @32 bounds: 4 x i32                      @48 user_size: u16
//!   @56 user bytes + NUL, padding
//! ```

/// Bytes reserved for the user name when an object or changeset is created
pub(crate) const USER_SLOT: usize = 8;

pub(crate) mod object {
    pub(crate) const ID: usize = 8;
    pub(crate) const VERSION: usize = 16;
    pub(crate) const CHANGESET: usize = 20;
    pub(crate) const UID: usize = 24;
    pub(crate) const TIMESTAMP: usize = 28;
    pub(crate) const FLAGS: usize = 32;
    pub(crate) const FIXED_SIZE: usize = 40;

    pub(crate) const NODE_X: usize = 40;
    pub(crate) const NODE_Y: usize = 44;
    pub(crate) const NODE_FIXED_SIZE: usize = 48;

    pub(crate) const FLAG_VISIBLE: u32 = 0x1;

    /// Where the user_size field sits; the name follows it
    pub(crate) const fn user_size_offset(fixed_size: usize) -> usize {
        fixed_size
    }

    pub(crate) const fn user_offset(fixed_size: usize) -> usize {
        fixed_size + 2
    }
}

pub(crate) mod changeset {
    pub(crate) const ID: usize = 8;
    pub(crate) const NUM_CHANGES: usize = 12;
    pub(crate) const NUM_COMMENTS: usize = 16;
    pub(crate) const UID: usize = 20;
    pub(crate) const CREATED_AT: usize = 24;
    pub(crate) const CLOSED_AT: usize = 28;
    pub(crate) const BOUNDS: usize = 32;
    pub(crate) const USER_SIZE: usize = 48;
    pub(crate) const FIXED_SIZE: usize = 56;
    pub(crate) const USER: usize = FIXED_SIZE;
}

pub(crate) mod node_ref {
    pub(crate) const ID: usize = 0;
    pub(crate) const X: usize = 8;
    pub(crate) const Y: usize = 12;
    pub(crate) const SIZE: usize = 16;
}

pub(crate) mod member {
    pub(crate) const REF: usize = 0;
    pub(crate) const TYPE: usize = 8;
    pub(crate) const FLAGS: usize = 10;
    pub(crate) const ROLE_SIZE: usize = 12;
    pub(crate) const SIZE: usize = 16;

    pub(crate) const FLAG_FULL_MEMBER: u16 = 0x1;
}

pub(crate) mod comment {
    pub(crate) const DATE: usize = 0;
    pub(crate) const UID: usize = 4;
    pub(crate) const TEXT_SIZE: usize = 8;
    pub(crate) const USER_SIZE: usize = 12;
    pub(crate) const SIZE: usize = 16;
}
