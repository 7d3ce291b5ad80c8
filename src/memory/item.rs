//! Item views
//!
//! Bounds-checked, read-only access to items stored in a buffer.

use super::{
    padded_length, read_u16, read_u32, ItemType, FLAGS_OFFSET, FLAG_REMOVED, ITEM_HEADER_SIZE,
    SIZE_OFFSET, TYPE_OFFSET,
};

/// A single item: the bytes covered by its size field.
#[derive(Debug, Clone, Copy)]
pub struct ItemView<'a> {
    data: &'a [u8],
}

impl<'a> ItemView<'a> {
    /// Parse the item starting at `offset` in `data`.
    ///
    /// Returns `None` if the header does not fit, the size is smaller than
    /// a header, or the item runs past the end of `data`.
    pub fn parse(data: &'a [u8], offset: usize) -> Option<Self> {
        let header_end = offset.checked_add(ITEM_HEADER_SIZE)?;
        if header_end > data.len() {
            return None;
        }
        let size = read_u32(data, offset + SIZE_OFFSET) as usize;
        if size < ITEM_HEADER_SIZE {
            return None;
        }
        let end = offset.checked_add(size)?;
        let bytes = data.get(offset..end)?;
        Some(Self { data: bytes })
    }

    /// Content length (excludes trailing padding)
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Physical extent in the buffer
    pub fn padded_size(&self) -> usize {
        padded_length(self.data.len())
    }

    pub fn item_type(&self) -> ItemType {
        ItemType::from_u16(read_u16(self.data, TYPE_OFFSET))
    }

    pub fn removed(&self) -> bool {
        read_u16(self.data, FLAGS_OFFSET) & FLAG_REMOVED != 0
    }

    /// Raw bytes of the item (header included, padding excluded)
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Iterate over items nested in this one, starting at `offset` from the
    /// start of the item
    pub fn subitems_from(&self, offset: usize) -> ItemIter<'a> {
        ItemIter::new(self.data, offset, self.data.len())
    }
}

/// Iterator over back-to-back padded items.
///
/// Stops at the end of the range or at the first malformed item.
#[derive(Debug, Clone)]
pub struct ItemIter<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> ItemIter<'a> {
    pub(crate) fn new(data: &'a [u8], pos: usize, end: usize) -> Self {
        Self { data, pos, end }
    }
}

impl<'a> Iterator for ItemIter<'a> {
    type Item = ItemView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }
        match ItemView::parse(&self.data[..self.end], self.pos) {
            Some(item) => {
                self.pos += item.padded_size();
                Some(item)
            }
            None => {
                self.pos = self.end;
                None
            }
        }
    }
}
