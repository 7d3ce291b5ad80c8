//! OSM Module
//!
//! Entity value types, the fixed-field layout of each item kind, and typed
//! read views over built items.

pub(crate) mod layout;
mod types;
mod view;

pub use types::{
    area_from_way, area_id_to_object_id, object_id_to_area_id, BBox, ChangesetId, Location,
    NodeRef, ObjectId, ObjectVersion, Timestamp, UserId, MAX_OSM_STRING_LENGTH,
};
pub use view::{
    ChangesetView, CommentIter, CommentView, MemberIter, MemberView, NodeRefListView,
    ObjectView, TagIter, TagListView,
};
