//! Builder Module
//!
//! Builders append one item each to a `Buffer`, keeping the size field of
//! that item and of every enclosing item up to date as content is added.
//!
//! ## Nesting
//! ```text
//! NodeBuilder ─────────────── item @0 (size covers everything below)
//!   └── TagListBuilder ────── item @56, parent chain [0]
//! ```
//!
//! A child builder is created from `parent.as_parent()`, which mutably
//! borrows the parent: the parent cannot append anything until the child is
//! dropped. Parents are recorded as offsets, never as addresses, so buffer
//! growth does not invalidate them.
//!
//! Dropping a builder pads its item to `ALIGN_BYTES`. The padding is counted
//! in the size of the parent items but not in the item's own size.

mod list;
mod object;

use crate::memory::{
    padded_length, write_u16, write_u32, Buffer, ItemType, ALIGN_BYTES, FLAGS_OFFSET,
    FLAG_REMOVED, SIZE_OFFSET, TYPE_OFFSET,
};

pub use list::{
    ChangesetDiscussionBuilder, InnerRingBuilder, InnerRingKind, NodeRefListBuilder,
    NodeRefListKind, OuterRingBuilder, OuterRingKind, RelationMemberListBuilder, TagListBuilder,
    WayNodeListBuilder, WayNodeListKind,
};
pub use object::{
    AreaBuilder, AreaKind, ChangesetBuilder, NodeBuilder, NodeKind, ObjectBuilder, ObjectKind,
    RelationBuilder, RelationKind, WayBuilder, WayKind,
};

// =============================================================================
// Parent Handle
// =============================================================================

/// Where a new builder writes: a buffer, plus the offsets of the items that
/// will contain the new one (outermost first).
pub struct Parent<'a> {
    buffer: &'a mut Buffer,
    ancestors: Vec<usize>,
}

impl<'a> From<&'a mut Buffer> for Parent<'a> {
    fn from(buffer: &'a mut Buffer) -> Self {
        Self {
            buffer,
            ancestors: Vec::new(),
        }
    }
}

// =============================================================================
// Generic Builder
// =============================================================================

/// Cursor over one item under construction
pub struct Builder<'a> {
    buffer: &'a mut Buffer,
    ancestors: Vec<usize>,
    item_offset: usize,
}

impl<'a> Builder<'a> {
    /// Start a new item of `item_type` with `fixed_size` zeroed bytes.
    pub fn new(parent: Parent<'a>, item_type: ItemType, fixed_size: usize) -> Self {
        let Parent { buffer, ancestors } = parent;
        assert!(
            buffer.written() % ALIGN_BYTES == 0,
            "a new item must start on an aligned offset"
        );
        debug_assert!(fixed_size % ALIGN_BYTES == 0);

        let item_offset = buffer.reserve_space(fixed_size);
        let item = &mut buffer.bytes_mut()[item_offset..];
        write_u32(item, SIZE_OFFSET, fixed_size as u32);
        write_u16(item, TYPE_OFFSET, item_type as u16);

        for &ancestor in &ancestors {
            buffer.add_to_item_size(ancestor, fixed_size as u32);
        }

        Self {
            buffer,
            ancestors,
            item_offset,
        }
    }

    /// Offset of the item in the buffer
    pub fn item_offset(&self) -> usize {
        self.item_offset
    }

    /// Current content length of the item
    pub fn size(&self) -> u32 {
        self.buffer.item_size(self.item_offset)
    }

    /// Handle for creating a child builder nested in this item
    pub fn as_parent(&mut self) -> Parent<'_> {
        let mut ancestors = Vec::with_capacity(self.ancestors.len() + 1);
        ancestors.extend_from_slice(&self.ancestors);
        ancestors.push(self.item_offset);
        Parent {
            buffer: &mut *self.buffer,
            ancestors,
        }
    }

    /// Add `size` to this item and to every enclosing item
    pub fn add_size(&mut self, size: u32) {
        self.buffer.add_to_item_size(self.item_offset, size);
        self.add_size_to_ancestors(size);
    }

    fn add_size_to_ancestors(&mut self, size: u32) {
        for &ancestor in &self.ancestors {
            self.buffer.add_to_item_size(ancestor, size);
        }
    }

    /// Reserve `size` zeroed bytes at the end of the buffer and return their
    /// offset. Sizes are not touched.
    pub fn reserve_space(&mut self, size: usize) -> usize {
        self.buffer.reserve_space(size)
    }

    /// Append raw bytes; returns the number written. The caller accounts for
    /// them with `add_size`.
    pub fn append(&mut self, data: &[u8]) -> u32 {
        let offset = self.buffer.reserve_space(data.len());
        self.buffer.bytes_mut()[offset..offset + data.len()].copy_from_slice(data);
        data.len() as u32
    }

    /// Append bytes followed by a NUL; returns the number written
    pub fn append_with_zero(&mut self, data: &[u8]) -> u32 {
        // reserve_space zero-fills, so the terminator is already there
        let offset = self.buffer.reserve_space(data.len() + 1);
        self.buffer.bytes_mut()[offset..offset + data.len()].copy_from_slice(data);
        data.len() as u32 + 1
    }

    /// Copy a complete item into this one; returns the padded size added
    pub fn append_item(&mut self, item: &[u8]) -> u32 {
        self.buffer.add_item(item) as u32
    }

    /// Pad the buffer to the next boundary.
    ///
    /// With `own_size`, the padding becomes part of this item (used between
    /// records inside a list); otherwise only enclosing items count it.
    pub fn add_padding(&mut self, own_size: bool) {
        let size = self.size() as usize;
        let padding = padded_length(size) - size;
        if padding == 0 {
            return;
        }
        self.buffer.reserve_space(padding);
        if own_size {
            self.add_size(padding as u32);
        } else {
            self.add_size_to_ancestors(padding as u32);
        }
    }

    /// Mutable bytes from the start of the item to the end of the buffer
    pub(crate) fn item_bytes_mut(&mut self) -> &mut [u8] {
        let offset = self.item_offset;
        &mut self.buffer.bytes_mut()[offset..]
    }

    /// Bytes from the start of the item to the end of the buffer
    pub(crate) fn item_bytes(&self) -> &[u8] {
        &self.buffer.written_bytes()[self.item_offset..]
    }

    pub(crate) fn set_removed(&mut self, removed: bool) {
        let item = self.item_bytes_mut();
        let flags = crate::memory::read_u16(item, FLAGS_OFFSET);
        let flags = if removed {
            flags | FLAG_REMOVED
        } else {
            flags & !FLAG_REMOVED
        };
        write_u16(item, FLAGS_OFFSET, flags);
    }
}

impl Drop for Builder<'_> {
    fn drop(&mut self) {
        self.add_padding(false);
    }
}
