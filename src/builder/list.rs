//! List builders: tags, node references, relation members and changeset
//! comments.

use std::marker::PhantomData;

use crate::error::{OsmError, Result, StringField};
use crate::memory::{write_i32, write_i64, write_u16, write_u32, ItemType, ITEM_HEADER_SIZE};
use crate::osm::layout::{comment, member, node_ref};
use crate::osm::{
    Location, NodeRef, ObjectId, ObjectView, Timestamp, UserId, MAX_OSM_STRING_LENGTH,
};

use super::{Builder, Parent};

fn check_length(field: StringField, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(OsmError::LengthExceeded {
            field,
            length: value.len(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Tag List
// =============================================================================

/// Builds a list of key/value pairs
pub struct TagListBuilder<'a> {
    builder: Builder<'a>,
}

impl<'a> TagListBuilder<'a> {
    pub fn new(parent: impl Into<Parent<'a>>) -> Self {
        Self {
            builder: Builder::new(parent.into(), ItemType::TagList, ITEM_HEADER_SIZE),
        }
    }

    /// Add one tag. Fails without writing anything if the key or value is
    /// longer than `MAX_OSM_STRING_LENGTH`.
    pub fn add_tag(&mut self, key: &str, value: &str) -> Result<()> {
        check_length(StringField::TagKey, key, MAX_OSM_STRING_LENGTH)?;
        check_length(StringField::TagValue, value, MAX_OSM_STRING_LENGTH)?;
        let n = self.builder.append_with_zero(key.as_bytes());
        self.builder.add_size(n);
        let n = self.builder.append_with_zero(value.as_bytes());
        self.builder.add_size(n);
        Ok(())
    }

    pub fn add_tags<I, K, V>(&mut self, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in tags {
            self.add_tag(key.as_ref(), value.as_ref())?;
        }
        Ok(())
    }

    pub fn item_offset(&self) -> usize {
        self.builder.item_offset()
    }
}

// =============================================================================
// Node Reference Lists
// =============================================================================

/// The item type a node reference list is stored as
pub trait NodeRefListKind {
    const ITEM_TYPE: ItemType;
}

pub struct WayNodeListKind;
pub struct OuterRingKind;
pub struct InnerRingKind;

impl NodeRefListKind for WayNodeListKind {
    const ITEM_TYPE: ItemType = ItemType::WayNodeList;
}

impl NodeRefListKind for OuterRingKind {
    const ITEM_TYPE: ItemType = ItemType::OuterRing;
}

impl NodeRefListKind for InnerRingKind {
    const ITEM_TYPE: ItemType = ItemType::InnerRing;
}

/// Builds a list of fixed-size node references
pub struct NodeRefListBuilder<'a, K: NodeRefListKind> {
    builder: Builder<'a>,
    _kind: PhantomData<K>,
}

pub type WayNodeListBuilder<'a> = NodeRefListBuilder<'a, WayNodeListKind>;
pub type OuterRingBuilder<'a> = NodeRefListBuilder<'a, OuterRingKind>;
pub type InnerRingBuilder<'a> = NodeRefListBuilder<'a, InnerRingKind>;

impl<'a, K: NodeRefListKind> NodeRefListBuilder<'a, K> {
    pub fn new(parent: impl Into<Parent<'a>>) -> Self {
        Self {
            builder: Builder::new(parent.into(), K::ITEM_TYPE, ITEM_HEADER_SIZE),
            _kind: PhantomData,
        }
    }

    pub fn add_node_ref(&mut self, node_ref: NodeRef) {
        let offset = self.builder.reserve_space(node_ref::SIZE);
        let record = &mut self.builder.buffer.bytes_mut()[offset..offset + node_ref::SIZE];
        write_i64(record, node_ref::ID, node_ref.id);
        write_i32(record, node_ref::X, node_ref.location.x());
        write_i32(record, node_ref::Y, node_ref.location.y());
        self.builder.add_size(node_ref::SIZE as u32);
    }

    /// Add a reference by id, with coordinates if known
    pub fn add_node(&mut self, id: ObjectId, location: Option<Location>) {
        self.add_node_ref(NodeRef::new(id, location));
    }

    pub fn item_offset(&self) -> usize {
        self.builder.item_offset()
    }
}

// =============================================================================
// Relation Member List
// =============================================================================

/// Builds the member list of a relation
pub struct RelationMemberListBuilder<'a> {
    builder: Builder<'a>,
}

impl<'a> RelationMemberListBuilder<'a> {
    pub fn new(parent: impl Into<Parent<'a>>) -> Self {
        Self {
            builder: Builder::new(parent.into(), ItemType::RelationMemberList, ITEM_HEADER_SIZE),
        }
    }

    /// Add a member.
    ///
    /// The role is padded on its own so every member starts aligned. If
    /// `full_member` is given, a copy of that object follows the role.
    pub fn add_member(
        &mut self,
        member_type: ItemType,
        member_ref: ObjectId,
        role: &str,
        full_member: Option<&ObjectView<'_>>,
    ) -> Result<()> {
        check_length(StringField::Role, role, MAX_OSM_STRING_LENGTH)?;

        let offset = self.builder.reserve_space(member::SIZE);
        let record = &mut self.builder.buffer.bytes_mut()[offset..offset + member::SIZE];
        write_i64(record, member::REF, member_ref);
        write_u16(record, member::TYPE, member_type as u16);
        if full_member.is_some() {
            write_u16(record, member::FLAGS, member::FLAG_FULL_MEMBER);
        }
        write_u16(record, member::ROLE_SIZE, role.len() as u16 + 1);
        self.builder.add_size(member::SIZE as u32);

        let n = self.builder.append_with_zero(role.as_bytes());
        self.builder.add_size(n);
        self.builder.add_padding(true);

        if let Some(object) = full_member {
            let n = self.builder.append_item(object.item().as_bytes());
            self.builder.add_size(n);
        }
        Ok(())
    }

    pub fn item_offset(&self) -> usize {
        self.builder.item_offset()
    }
}

// =============================================================================
// Changeset Discussion
// =============================================================================

const COMMENT_ORDER: &str =
    "add_comment() and add_comment_text() must be called in that order for every comment";

/// Builds the comments of a changeset.
///
/// Each comment is `add_comment()` followed by `add_comment_text()`; any
/// other order is a programming error and panics.
pub struct ChangesetDiscussionBuilder<'a> {
    builder: Builder<'a>,
    /// Offset of the comment record still waiting for its text
    pending_comment: Option<usize>,
}

impl<'a> ChangesetDiscussionBuilder<'a> {
    pub fn new(parent: impl Into<Parent<'a>>) -> Self {
        Self {
            builder: Builder::new(parent.into(), ItemType::ChangesetDiscussion, ITEM_HEADER_SIZE),
            pending_comment: None,
        }
    }

    pub fn add_comment(&mut self, date: Timestamp, uid: UserId, user: &str) -> Result<()> {
        assert!(self.pending_comment.is_none(), "{}", COMMENT_ORDER);
        check_length(StringField::User, user, MAX_OSM_STRING_LENGTH)?;

        let offset = self.builder.reserve_space(comment::SIZE);
        let record = &mut self.builder.buffer.bytes_mut()[offset..offset + comment::SIZE];
        write_u32(record, comment::DATE, date.as_secs());
        write_u32(record, comment::UID, uid);
        write_u16(record, comment::USER_SIZE, user.len() as u16 + 1);
        self.builder.add_size(comment::SIZE as u32);

        let n = self.builder.append_with_zero(user.as_bytes());
        self.builder.add_size(n);
        self.pending_comment = Some(offset);
        Ok(())
    }

    pub fn add_comment_text(&mut self, text: &str) -> Result<()> {
        let offset = self.pending_comment.take().expect(COMMENT_ORDER);
        check_length(StringField::CommentText, text, u32::MAX as usize - 1)?;

        write_u32(
            &mut self.builder.buffer.bytes_mut()[offset..],
            comment::TEXT_SIZE,
            text.len() as u32 + 1,
        );
        let n = self.builder.append_with_zero(text.as_bytes());
        self.builder.add_size(n);
        self.builder.add_padding(true);
        Ok(())
    }

    pub fn item_offset(&self) -> usize {
        self.builder.item_offset()
    }
}

impl Drop for ChangesetDiscussionBuilder<'_> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            assert!(self.pending_comment.is_none(), "{}", COMMENT_ORDER);
        }
    }
}
