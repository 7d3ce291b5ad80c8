//! Arena Buffer
//!
//! Growable byte store holding a sequence of padded items.

use bytes::BytesMut;

use super::item::{ItemIter, ItemView};
use super::{padded_length, read_u32, write_u32, ALIGN_BYTES, SIZE_OFFSET};
use crate::config::Config;
use crate::osm::ObjectView;

/// Append-only store for OSM items.
///
/// Builders write into the region after `committed()`; `commit()` publishes
/// that region to readers. Growing may move the storage, so everything that
/// refers into a buffer does so by offset.
#[derive(Debug, Default, Clone)]
pub struct Buffer {
    /// Written bytes (committed + in progress)
    data: BytesMut,
    /// End of the region visible to readers
    committed: usize,
}

impl Buffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(padded_length(capacity)),
            committed: 0,
        }
    }

    /// Create an empty buffer sized by `config.buffer_capacity`
    pub fn from_config(config: &Config) -> Self {
        Self::with_capacity(config.buffer_capacity)
    }

    /// Bytes written so far, committed or not
    pub fn written(&self) -> usize {
        self.data.len()
    }

    /// Bytes visible to readers
    pub fn committed(&self) -> usize {
        self.committed
    }

    /// True if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True if both marks sit on an item boundary
    pub fn is_aligned(&self) -> bool {
        self.data.len() % ALIGN_BYTES == 0 && self.committed % ALIGN_BYTES == 0
    }

    /// Current allocation size
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Make room for `size` more bytes and return the offset they start at.
    ///
    /// The new bytes are zeroed. May reallocate.
    pub fn reserve_space(&mut self, size: usize) -> usize {
        let offset = self.data.len();
        self.data.resize(offset + size, 0);
        offset
    }

    /// Publish everything written since the last commit.
    ///
    /// Returns the offset where the newly committed region starts, which is
    /// the offset of the first item built since the last commit.
    pub fn commit(&mut self) -> usize {
        assert!(
            self.is_aligned(),
            "commit() requires all builders to be finished"
        );
        let offset = self.committed;
        self.committed = self.data.len();
        offset
    }

    /// Throw away everything written since the last commit.
    ///
    /// This is how a half-built object is abandoned after a length error.
    pub fn rollback(&mut self) {
        self.data.truncate(self.committed);
    }

    /// Remove all content
    pub fn clear(&mut self) {
        self.data.clear();
        self.committed = 0;
    }

    /// Copy a complete item (header included) to the end of the buffer and
    /// pad it. Returns the number of bytes added.
    pub fn add_item(&mut self, item: &[u8]) -> usize {
        let padded = padded_length(item.len());
        let offset = self.reserve_space(padded);
        self.data[offset..offset + item.len()].copy_from_slice(item);
        padded
    }

    /// Committed bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.committed]
    }

    /// All written bytes, including items still under construction
    pub fn written_bytes(&self) -> &[u8] {
        &self.data
    }

    /// View of the committed item starting at `offset`
    pub fn get_item(&self, offset: usize) -> Option<ItemView<'_>> {
        ItemView::parse(self.as_slice(), offset)
    }

    /// Iterate over the committed top-level items
    pub fn items(&self) -> ItemIter<'_> {
        ItemIter::new(self.as_slice(), 0, self.committed)
    }

    /// Iterate over the committed top-level nodes, ways, relations and areas
    pub fn objects(&self) -> impl Iterator<Item = ObjectView<'_>> + '_ {
        self.items().filter_map(ObjectView::new)
    }

    // =========================================================================
    // Builder Access
    // =========================================================================

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub(crate) fn item_size(&self, item_offset: usize) -> u32 {
        read_u32(&self.data, item_offset + SIZE_OFFSET)
    }

    /// Add `size` to the size field of the item at `item_offset`
    pub(crate) fn add_to_item_size(&mut self, item_offset: usize, size: u32) {
        let current = self.item_size(item_offset);
        write_u32(&mut self.data, item_offset + SIZE_OFFSET, current + size);
    }
}
