//! Typed read views over items
//!
//! Views borrow the buffer and decode fields on access. Construction checks
//! the fixed part of the item fits; variable parts are checked as they are
//! walked, and walking stops at the first inconsistency.

use crate::memory::{
    padded_length, read_i32, read_i64, read_u16, read_u32, ItemIter, ItemType, ItemView,
    ITEM_HEADER_SIZE,
};

use super::layout::{changeset, comment, member, node_ref, object};
use super::types::{BBox, ChangesetId, Location, NodeRef, ObjectId, Timestamp, UserId};

/// Bytes `[offset, offset + size - 1)` as a string; `size` counts the NUL.
/// `None` if out of bounds or not UTF-8.
fn sized_str(data: &[u8], offset: usize, size: usize) -> Option<&str> {
    let end = offset + size.saturating_sub(1);
    data.get(offset..end)
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
}

// =============================================================================
// OSM Objects
// =============================================================================

/// A node, way, relation or area
#[derive(Debug, Clone, Copy)]
pub struct ObjectView<'a> {
    item: ItemView<'a>,
    fixed_size: usize,
    user_size: usize,
}

impl<'a> ObjectView<'a> {
    /// View `item` as an OSM object; `None` for other kinds, if the fixed
    /// part is incomplete or if the user name is not UTF-8
    pub fn new(item: ItemView<'a>) -> Option<Self> {
        let item_type = item.item_type();
        if !item_type.is_osm_object() {
            return None;
        }
        let fixed_size = if item_type == ItemType::Node {
            object::NODE_FIXED_SIZE
        } else {
            object::FIXED_SIZE
        };
        let data = item.as_bytes();
        if data.len() < object::user_offset(fixed_size) {
            return None;
        }
        let user_size = read_u16(data, object::user_size_offset(fixed_size)) as usize;
        if user_size == 0 || object::user_offset(fixed_size) + user_size > data.len() {
            return None;
        }
        sized_str(data, object::user_offset(fixed_size), user_size)?;
        Some(Self {
            item,
            fixed_size,
            user_size,
        })
    }

    pub fn item(&self) -> ItemView<'a> {
        self.item
    }

    pub fn item_type(&self) -> ItemType {
        self.item.item_type()
    }

    fn data(&self) -> &'a [u8] {
        self.item.as_bytes()
    }

    pub fn id(&self) -> ObjectId {
        read_i64(self.data(), object::ID)
    }

    pub fn version(&self) -> u32 {
        read_u32(self.data(), object::VERSION)
    }

    pub fn changeset(&self) -> ChangesetId {
        read_u32(self.data(), object::CHANGESET)
    }

    pub fn uid(&self) -> UserId {
        read_u32(self.data(), object::UID)
    }

    pub fn timestamp(&self) -> Timestamp {
        Timestamp::from_secs(read_u32(self.data(), object::TIMESTAMP))
    }

    pub fn visible(&self) -> bool {
        read_u32(self.data(), object::FLAGS) & object::FLAG_VISIBLE != 0
    }

    pub fn deleted(&self) -> bool {
        !self.visible()
    }

    pub fn removed(&self) -> bool {
        self.item.removed()
    }

    /// Node location; undefined for other kinds
    pub fn location(&self) -> Location {
        if self.item_type() != ItemType::Node {
            return Location::undefined();
        }
        Location::from_raw(
            read_i32(self.data(), object::NODE_X),
            read_i32(self.data(), object::NODE_Y),
        )
    }

    pub fn user(&self) -> &'a str {
        sized_str(
            self.data(),
            object::user_offset(self.fixed_size),
            self.user_size,
        )
        .unwrap_or_default()
    }

    /// Items nested after the user name
    pub fn subitems(&self) -> ItemIter<'a> {
        self.item
            .subitems_from(padded_length(object::user_offset(self.fixed_size) + self.user_size))
    }

    pub fn tags(&self) -> TagListView<'a> {
        self.subitems()
            .find(|item| item.item_type() == ItemType::TagList)
            .map(TagListView::from_item)
            .unwrap_or_default()
    }

    /// Way nodes (empty for other kinds)
    pub fn nodes(&self) -> NodeRefListView<'a> {
        self.subitems()
            .find(|item| item.item_type() == ItemType::WayNodeList)
            .and_then(NodeRefListView::new)
            .unwrap_or_default()
    }

    /// Relation members (empty for other kinds)
    pub fn members(&self) -> MemberIter<'a> {
        self.subitems()
            .find(|item| item.item_type() == ItemType::RelationMemberList)
            .map(MemberIter::from_item)
            .unwrap_or_default()
    }

    pub fn outer_rings(&self) -> impl Iterator<Item = NodeRefListView<'a>> + 'a {
        self.subitems()
            .filter(|item| item.item_type() == ItemType::OuterRing)
            .filter_map(NodeRefListView::new)
    }

    pub fn inner_rings(&self) -> impl Iterator<Item = NodeRefListView<'a>> + 'a {
        self.subitems()
            .filter(|item| item.item_type() == ItemType::InnerRing)
            .filter_map(NodeRefListView::new)
    }
}

// =============================================================================
// Tags
// =============================================================================

/// Key/value pairs of a tag list, in insertion order
#[derive(Debug, Clone, Copy, Default)]
pub struct TagListView<'a> {
    data: &'a [u8],
}

impl<'a> TagListView<'a> {
    pub fn new(item: ItemView<'a>) -> Option<Self> {
        (item.item_type() == ItemType::TagList).then(|| Self::from_item(item))
    }

    fn from_item(item: ItemView<'a>) -> Self {
        Self {
            data: item.as_bytes(),
        }
    }

    pub fn iter(&self) -> TagIter<'a> {
        TagIter {
            data: self.data,
            pos: ITEM_HEADER_SIZE,
        }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Value of the first tag with this key
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

impl<'a> IntoIterator for TagListView<'a> {
    type Item = (&'a str, &'a str);
    type IntoIter = TagIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct TagIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for TagIter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }
        let parsed = crate::memory::read_cstr(self.data, self.pos).and_then(|(key, pos)| {
            crate::memory::read_cstr(self.data, pos).map(|(value, end)| (key, value, end))
        });
        match parsed {
            Some((key, value, end)) => {
                self.pos = end;
                Some((key, value))
            }
            None => {
                self.pos = self.data.len();
                None
            }
        }
    }
}

// =============================================================================
// Node References
// =============================================================================

/// Way node list, outer ring or inner ring
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeRefListView<'a> {
    data: &'a [u8],
}

impl<'a> NodeRefListView<'a> {
    pub fn new(item: ItemView<'a>) -> Option<Self> {
        item.item_type().is_node_ref_list().then(|| Self {
            data: item.as_bytes(),
        })
    }

    pub fn len(&self) -> usize {
        self.data.len().saturating_sub(ITEM_HEADER_SIZE) / node_ref::SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<NodeRef> {
        if index >= self.len() {
            return None;
        }
        let base = ITEM_HEADER_SIZE + index * node_ref::SIZE;
        Some(NodeRef {
            id: read_i64(self.data, base + node_ref::ID),
            location: Location::from_raw(
                read_i32(self.data, base + node_ref::X),
                read_i32(self.data, base + node_ref::Y),
            ),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeRef> + 'a {
        let list = *self;
        (0..list.len()).filter_map(move |i| list.get(i))
    }

    /// First and last reference point to the same node
    pub fn is_closed(&self) -> bool {
        match (self.get(0), self.len().checked_sub(1).and_then(|i| self.get(i))) {
            (Some(first), Some(last)) => self.len() > 1 && first.id == last.id,
            _ => false,
        }
    }
}

// =============================================================================
// Relation Members
// =============================================================================

/// One relation member
#[derive(Debug, Clone, Copy)]
pub struct MemberView<'a> {
    pub member_type: ItemType,
    pub member_ref: ObjectId,
    pub role: &'a str,
    pub full_member: Option<ObjectView<'a>>,
}

/// Iterator over the members of a relation member list
#[derive(Debug, Clone, Default)]
pub struct MemberIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> MemberIter<'a> {
    pub fn new(item: ItemView<'a>) -> Option<Self> {
        (item.item_type() == ItemType::RelationMemberList).then(|| Self::from_item(item))
    }

    fn from_item(item: ItemView<'a>) -> Self {
        Self {
            data: item.as_bytes(),
            pos: ITEM_HEADER_SIZE,
        }
    }

    fn stop(&mut self) -> Option<MemberView<'a>> {
        self.pos = self.data.len();
        None
    }
}

impl<'a> Iterator for MemberIter<'a> {
    type Item = MemberView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let base = self.pos;
        if base + member::SIZE > self.data.len() {
            return self.stop();
        }
        let flags = read_u16(self.data, base + member::FLAGS);
        let role_size = read_u16(self.data, base + member::ROLE_SIZE) as usize;
        let role_start = base + member::SIZE;
        if role_size == 0 || role_start + role_size > self.data.len() {
            return self.stop();
        }
        let role = match sized_str(self.data, role_start, role_size) {
            Some(role) => role,
            None => return self.stop(),
        };
        let mut next = role_start + padded_length(role_size);

        let full_member = if flags & member::FLAG_FULL_MEMBER != 0 {
            match ItemView::parse(self.data, next).and_then(ObjectView::new) {
                Some(object) => {
                    next += object.item().padded_size();
                    Some(object)
                }
                None => return self.stop(),
            }
        } else {
            None
        };

        self.pos = next;
        Some(MemberView {
            member_type: ItemType::from_u16(read_u16(self.data, base + member::TYPE)),
            member_ref: read_i64(self.data, base + member::REF),
            role,
            full_member,
        })
    }
}

// =============================================================================
// Changesets
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct ChangesetView<'a> {
    item: ItemView<'a>,
    user_size: usize,
}

impl<'a> ChangesetView<'a> {
    pub fn new(item: ItemView<'a>) -> Option<Self> {
        if item.item_type() != ItemType::Changeset {
            return None;
        }
        let data = item.as_bytes();
        if data.len() < changeset::FIXED_SIZE {
            return None;
        }
        let user_size = read_u16(data, changeset::USER_SIZE) as usize;
        if user_size == 0 || changeset::USER + user_size > data.len() {
            return None;
        }
        sized_str(data, changeset::USER, user_size)?;
        Some(Self { item, user_size })
    }

    fn data(&self) -> &'a [u8] {
        self.item.as_bytes()
    }

    pub fn id(&self) -> ChangesetId {
        read_u32(self.data(), changeset::ID)
    }

    pub fn num_changes(&self) -> u32 {
        read_u32(self.data(), changeset::NUM_CHANGES)
    }

    pub fn num_comments(&self) -> u32 {
        read_u32(self.data(), changeset::NUM_COMMENTS)
    }

    pub fn uid(&self) -> UserId {
        read_u32(self.data(), changeset::UID)
    }

    pub fn created_at(&self) -> Timestamp {
        Timestamp::from_secs(read_u32(self.data(), changeset::CREATED_AT))
    }

    pub fn closed_at(&self) -> Timestamp {
        Timestamp::from_secs(read_u32(self.data(), changeset::CLOSED_AT))
    }

    /// Still open if no close time was recorded
    pub fn open(&self) -> bool {
        !self.closed_at().is_valid()
    }

    pub fn bounds(&self) -> BBox {
        let data = self.data();
        let at = changeset::BOUNDS;
        BBox::new(
            Location::from_raw(read_i32(data, at), read_i32(data, at + 4)),
            Location::from_raw(read_i32(data, at + 8), read_i32(data, at + 12)),
        )
    }

    pub fn removed(&self) -> bool {
        self.item.removed()
    }

    pub fn user(&self) -> &'a str {
        sized_str(self.data(), changeset::USER, self.user_size).unwrap_or_default()
    }

    pub fn subitems(&self) -> ItemIter<'a> {
        self.item
            .subitems_from(padded_length(changeset::USER + self.user_size))
    }

    pub fn tags(&self) -> TagListView<'a> {
        self.subitems()
            .find(|item| item.item_type() == ItemType::TagList)
            .map(TagListView::from_item)
            .unwrap_or_default()
    }

    pub fn discussion(&self) -> CommentIter<'a> {
        self.subitems()
            .find(|item| item.item_type() == ItemType::ChangesetDiscussion)
            .map(|item| CommentIter {
                data: item.as_bytes(),
                pos: ITEM_HEADER_SIZE,
            })
            .unwrap_or_default()
    }
}

/// One changeset comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentView<'a> {
    pub date: Timestamp,
    pub uid: UserId,
    pub user: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct CommentIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for CommentIter<'a> {
    type Item = CommentView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let base = self.pos;
        if base + comment::SIZE > self.data.len() {
            self.pos = self.data.len();
            return None;
        }
        let user_size = read_u16(self.data, base + comment::USER_SIZE) as usize;
        let text_size = read_u32(self.data, base + comment::TEXT_SIZE) as usize;
        let user_start = base + comment::SIZE;
        let text_start = user_start + user_size;
        if user_size == 0 || text_size == 0 || text_start + text_size > self.data.len() {
            self.pos = self.data.len();
            return None;
        }
        let (user, text) = match sized_str(self.data, user_start, user_size)
            .zip(sized_str(self.data, text_start, text_size))
        {
            Some(strings) => strings,
            None => {
                self.pos = self.data.len();
                return None;
            }
        };
        self.pos = base + padded_length(comment::SIZE + user_size + text_size);
        Some(CommentView {
            date: Timestamp::from_secs(read_u32(self.data, base + comment::DATE)),
            uid: read_u32(self.data, base + comment::UID),
            user,
            text,
        })
    }
}
