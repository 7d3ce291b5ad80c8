//! Object builders: nodes, ways, relations, areas and changesets.
//!
//! Every object is created with a small slot for the user name. `set_user`
//! fills that slot, growing it when the name does not fit, which is why it
//! must run before any nested list is opened.

use std::marker::PhantomData;

use crate::error::{OsmError, Result, StringField};
use crate::memory::{
    padded_length, read_u16, read_u32, write_i32, write_i64, write_u16, write_u32, ItemType,
};
use crate::osm::layout::{changeset, object, USER_SLOT};
use crate::osm::{
    object_id_to_area_id, BBox, ChangesetId, Location, NodeRef, ObjectId, ObjectVersion,
    ObjectView, Timestamp, UserId, MAX_OSM_STRING_LENGTH,
};

use super::list::{TagListBuilder, WayNodeListBuilder};
use super::{Builder, Parent};

const SET_USER_ONCE: &str = "set_user() must be called at most once and before any sub-builders";

/// Write `user` into the user slot of the item under construction.
///
/// `slot_start` is where the initial slot begins (relative to the item),
/// `user_size_at` where the u16 size lives and `user_at` where the name
/// starts. `user_set` is raised once a name has been written.
fn write_user(
    builder: &mut Builder<'_>,
    user_set: &mut bool,
    slot_start: usize,
    user_size_at: usize,
    user_at: usize,
    user: &str,
) -> Result<()> {
    let current_size = read_u16(builder.item_bytes(), user_size_at);
    assert!(
        !*user_set && current_size == 1 && builder.size() as usize <= slot_start + USER_SLOT,
        "{}",
        SET_USER_ONCE
    );
    if user.len() > MAX_OSM_STRING_LENGTH {
        return Err(OsmError::LengthExceeded {
            field: StringField::User,
            length: user.len(),
            max: MAX_OSM_STRING_LENGTH,
        });
    }

    let available = slot_start + USER_SLOT - user_at - 1;
    if user.len() > available {
        let needed = padded_length(user.len() - available);
        builder.reserve_space(needed);
        builder.add_size(needed as u32);
    }

    let item = builder.item_bytes_mut();
    item[user_at..user_at + user.len()].copy_from_slice(user.as_bytes());
    write_u16(item, user_size_at, user.len() as u16 + 1);
    *user_set = true;
    Ok(())
}

/// Parse a numeric attribute value
fn parse_attr<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| OsmError::InvalidAttribute {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn parse_timestamp(name: &str, value: &str) -> Result<Timestamp> {
    if value.is_empty() {
        return Ok(Timestamp::default());
    }
    Timestamp::parse_iso(value).ok_or_else(|| OsmError::InvalidAttribute {
        name: name.to_string(),
        value: value.to_string(),
    })
}

// =============================================================================
// Object Kinds
// =============================================================================

/// Layout descriptor for one kind of OSM object
pub trait ObjectKind {
    const ITEM_TYPE: ItemType;
    /// Bytes before the user slot (header and fixed fields)
    const FIXED_SIZE: usize;
}

pub struct NodeKind;
pub struct WayKind;
pub struct RelationKind;
pub struct AreaKind;

impl ObjectKind for NodeKind {
    const ITEM_TYPE: ItemType = ItemType::Node;
    const FIXED_SIZE: usize = object::NODE_FIXED_SIZE;
}

impl ObjectKind for WayKind {
    const ITEM_TYPE: ItemType = ItemType::Way;
    const FIXED_SIZE: usize = object::FIXED_SIZE;
}

impl ObjectKind for RelationKind {
    const ITEM_TYPE: ItemType = ItemType::Relation;
    const FIXED_SIZE: usize = object::FIXED_SIZE;
}

impl ObjectKind for AreaKind {
    const ITEM_TYPE: ItemType = ItemType::Area;
    const FIXED_SIZE: usize = object::FIXED_SIZE;
}

// =============================================================================
// Object Builder
// =============================================================================

/// Builds one node, way, relation or area.
///
/// Setters return `&mut Self` so they can be chained. Nested lists are built
/// with their own builders from `as_parent()`.
pub struct ObjectBuilder<'a, K: ObjectKind> {
    builder: Builder<'a>,
    user_set: bool,
    _kind: PhantomData<K>,
}

pub type NodeBuilder<'a> = ObjectBuilder<'a, NodeKind>;
pub type WayBuilder<'a> = ObjectBuilder<'a, WayKind>;
pub type RelationBuilder<'a> = ObjectBuilder<'a, RelationKind>;
pub type AreaBuilder<'a> = ObjectBuilder<'a, AreaKind>;

impl<'a, K: ObjectKind> ObjectBuilder<'a, K> {
    pub fn new(parent: impl Into<Parent<'a>>) -> Self {
        let mut builder = Builder::new(parent.into(), K::ITEM_TYPE, K::FIXED_SIZE + USER_SLOT);
        let item = builder.item_bytes_mut();
        write_u32(item, object::FLAGS, object::FLAG_VISIBLE);
        write_u16(item, object::user_size_offset(K::FIXED_SIZE), 1);
        if K::ITEM_TYPE == ItemType::Node {
            let undefined = Location::undefined();
            write_i32(item, object::NODE_X, undefined.x());
            write_i32(item, object::NODE_Y, undefined.y());
        }
        Self {
            builder,
            user_set: false,
            _kind: PhantomData,
        }
    }

    pub fn item_offset(&self) -> usize {
        self.builder.item_offset()
    }

    /// Handle for nesting a list builder in this object
    pub fn as_parent(&mut self) -> Parent<'_> {
        self.builder.as_parent()
    }

    fn flags(&self) -> u32 {
        read_u32(self.builder.item_bytes(), object::FLAGS)
    }

    pub fn set_id(&mut self, id: ObjectId) -> &mut Self {
        write_i64(self.builder.item_bytes_mut(), object::ID, id);
        self
    }

    pub fn set_version(&mut self, version: ObjectVersion) -> &mut Self {
        write_u32(self.builder.item_bytes_mut(), object::VERSION, version);
        self
    }

    pub fn set_visible(&mut self, visible: bool) -> &mut Self {
        let flags = if visible {
            self.flags() | object::FLAG_VISIBLE
        } else {
            self.flags() & !object::FLAG_VISIBLE
        };
        write_u32(self.builder.item_bytes_mut(), object::FLAGS, flags);
        self
    }

    pub fn set_deleted(&mut self, deleted: bool) -> &mut Self {
        self.set_visible(!deleted)
    }

    pub fn set_changeset(&mut self, changeset: ChangesetId) -> &mut Self {
        write_u32(self.builder.item_bytes_mut(), object::CHANGESET, changeset);
        self
    }

    pub fn set_uid(&mut self, uid: UserId) -> &mut Self {
        write_u32(self.builder.item_bytes_mut(), object::UID, uid);
        self
    }

    /// Negative ids (anonymous edits) become 0
    pub fn set_uid_from_signed(&mut self, uid: i32) -> &mut Self {
        self.set_uid(u32::try_from(uid).unwrap_or(0))
    }

    pub fn set_timestamp(&mut self, timestamp: Timestamp) -> &mut Self {
        write_u32(
            self.builder.item_bytes_mut(),
            object::TIMESTAMP,
            timestamp.as_secs(),
        );
        self
    }

    pub fn set_removed(&mut self, removed: bool) -> &mut Self {
        self.builder.set_removed(removed);
        self
    }

    /// Set an attribute from its textual form.
    ///
    /// Known names: `id`, `version`, `changeset`, `timestamp`, `uid`,
    /// `visible`. Unknown names are ignored.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        match name {
            "id" => {
                self.set_id(parse_attr(name, value)?);
            }
            "version" => {
                self.set_version(parse_attr(name, value)?);
            }
            "changeset" => {
                self.set_changeset(parse_attr(name, value)?);
            }
            "timestamp" => {
                self.set_timestamp(parse_timestamp(name, value)?);
            }
            "uid" => {
                self.set_uid_from_signed(parse_attr(name, value)?);
            }
            "visible" => match value {
                "true" => {
                    self.set_visible(true);
                }
                "false" => {
                    self.set_visible(false);
                }
                _ => {
                    return Err(OsmError::InvalidAttribute {
                        name: name.to_string(),
                        value: value.to_string(),
                    })
                }
            },
            _ => {}
        }
        Ok(self)
    }

    /// Set the user name. Must be called at most once, and before any list
    /// is nested in this object.
    pub fn set_user(&mut self, user: &str) -> Result<&mut Self> {
        write_user(
            &mut self.builder,
            &mut self.user_set,
            K::FIXED_SIZE,
            object::user_size_offset(K::FIXED_SIZE),
            object::user_offset(K::FIXED_SIZE),
            user,
        )?;
        Ok(self)
    }

    /// Add a tag list holding `tags`
    pub fn add_tags<I, TK, TV>(&mut self, tags: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (TK, TV)>,
        TK: AsRef<str>,
        TV: AsRef<str>,
    {
        {
            let mut tag_list = TagListBuilder::new(self.as_parent());
            tag_list.add_tags(tags)?;
        }
        Ok(self)
    }
}

impl<'a> ObjectBuilder<'a, NodeKind> {
    pub fn set_location(&mut self, location: Location) -> &mut Self {
        let item = self.builder.item_bytes_mut();
        write_i32(item, object::NODE_X, location.x());
        write_i32(item, object::NODE_Y, location.y());
        self
    }
}

impl<'a> ObjectBuilder<'a, WayKind> {
    /// Add a way node list holding `nodes`
    pub fn add_node_refs<I>(&mut self, nodes: I) -> &mut Self
    where
        I: IntoIterator<Item = NodeRef>,
    {
        {
            let mut list = WayNodeListBuilder::new(self.as_parent());
            for node_ref in nodes {
                list.add_node_ref(node_ref);
            }
        }
        self
    }
}

impl<'a> ObjectBuilder<'a, AreaKind> {
    /// Copy the attributes of the way or relation this area is built from.
    ///
    /// The id is remapped into area id space; ids too large for that fail
    /// with `InvalidAttribute`.
    pub fn initialize_from_object(&mut self, source: &ObjectView<'_>) -> Result<&mut Self> {
        self.set_id(object_id_to_area_id(source.id(), source.item_type())?)
            .set_version(source.version())
            .set_changeset(source.changeset())
            .set_timestamp(source.timestamp())
            .set_visible(source.visible())
            .set_uid(source.uid());
        self.set_user(source.user())
    }
}

// =============================================================================
// Changeset Builder
// =============================================================================

/// Builds one changeset
pub struct ChangesetBuilder<'a> {
    builder: Builder<'a>,
    user_set: bool,
}

impl<'a> ChangesetBuilder<'a> {
    pub fn new(parent: impl Into<Parent<'a>>) -> Self {
        let mut builder = Builder::new(
            parent.into(),
            ItemType::Changeset,
            changeset::FIXED_SIZE + USER_SLOT,
        );
        let item = builder.item_bytes_mut();
        let undefined = BBox::default();
        write_changeset_bounds(item, &undefined);
        write_u16(item, changeset::USER_SIZE, 1);
        Self {
            builder,
            user_set: false,
        }
    }

    pub fn item_offset(&self) -> usize {
        self.builder.item_offset()
    }

    pub fn as_parent(&mut self) -> Parent<'_> {
        self.builder.as_parent()
    }

    fn set_u32(&mut self, offset: usize, value: u32) -> &mut Self {
        write_u32(self.builder.item_bytes_mut(), offset, value);
        self
    }

    pub fn set_id(&mut self, id: ChangesetId) -> &mut Self {
        self.set_u32(changeset::ID, id)
    }

    pub fn set_uid(&mut self, uid: UserId) -> &mut Self {
        self.set_u32(changeset::UID, uid)
    }

    pub fn set_uid_from_signed(&mut self, uid: i32) -> &mut Self {
        self.set_uid(u32::try_from(uid).unwrap_or(0))
    }

    pub fn set_created_at(&mut self, timestamp: Timestamp) -> &mut Self {
        self.set_u32(changeset::CREATED_AT, timestamp.as_secs())
    }

    pub fn set_closed_at(&mut self, timestamp: Timestamp) -> &mut Self {
        self.set_u32(changeset::CLOSED_AT, timestamp.as_secs())
    }

    pub fn set_num_changes(&mut self, num_changes: u32) -> &mut Self {
        self.set_u32(changeset::NUM_CHANGES, num_changes)
    }

    pub fn set_num_comments(&mut self, num_comments: u32) -> &mut Self {
        self.set_u32(changeset::NUM_COMMENTS, num_comments)
    }

    pub fn set_bounds(&mut self, bounds: BBox) -> &mut Self {
        write_changeset_bounds(self.builder.item_bytes_mut(), &bounds);
        self
    }

    pub fn set_removed(&mut self, removed: bool) -> &mut Self {
        self.builder.set_removed(removed);
        self
    }

    /// Set an attribute from its textual form.
    ///
    /// Known names: `id`, `num_changes`, `comments_count`, `created_at`,
    /// `closed_at`, `uid`. Unknown names are ignored.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        match name {
            "id" => {
                self.set_id(parse_attr(name, value)?);
            }
            "num_changes" => {
                self.set_num_changes(parse_attr(name, value)?);
            }
            "comments_count" => {
                self.set_num_comments(parse_attr(name, value)?);
            }
            "created_at" => {
                self.set_created_at(parse_timestamp(name, value)?);
            }
            "closed_at" => {
                self.set_closed_at(parse_timestamp(name, value)?);
            }
            "uid" => {
                self.set_uid_from_signed(parse_attr(name, value)?);
            }
            _ => {}
        }
        Ok(self)
    }

    /// Set the user name. Must be called at most once, and before any list
    /// is nested in this changeset.
    pub fn set_user(&mut self, user: &str) -> Result<&mut Self> {
        write_user(
            &mut self.builder,
            &mut self.user_set,
            changeset::FIXED_SIZE,
            changeset::USER_SIZE,
            changeset::USER,
            user,
        )?;
        Ok(self)
    }

    /// Add a tag list holding `tags`
    pub fn add_tags<I, TK, TV>(&mut self, tags: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (TK, TV)>,
        TK: AsRef<str>,
        TV: AsRef<str>,
    {
        {
            let mut tag_list = TagListBuilder::new(self.as_parent());
            tag_list.add_tags(tags)?;
        }
        Ok(self)
    }
}

fn write_changeset_bounds(item: &mut [u8], bounds: &BBox) {
    let at = changeset::BOUNDS;
    write_i32(item, at, bounds.bottom_left.x());
    write_i32(item, at + 4, bounds.bottom_left.y());
    write_i32(item, at + 8, bounds.top_right.x());
    write_i32(item, at + 12, bounds.top_right.y());
}
