//! Tests for RelationMemberListBuilder
//!
//! These tests verify:
//! - Members read back in order with type, ref and role
//! - Roles are padded so every member stays aligned
//! - Full member copies
//! - Role length limit

use osmbuf::builder::{NodeBuilder, RelationBuilder, RelationMemberListBuilder};
use osmbuf::memory::{padded_length, ALIGN_BYTES};
use osmbuf::osm::{MemberView, ObjectView, MAX_OSM_STRING_LENGTH};
use osmbuf::{Buffer, ItemType, OsmError};

// =============================================================================
// Helper Functions
// =============================================================================

fn members(buffer: &Buffer) -> Vec<MemberView<'_>> {
    buffer.objects().next().unwrap().members().collect()
}

// =============================================================================
// Member Tests
// =============================================================================

#[test]
fn test_members_in_order() {
    let mut buffer = Buffer::new();
    {
        let mut relation = RelationBuilder::new(&mut buffer);
        relation.set_id(300);
        {
            let mut list = RelationMemberListBuilder::new(relation.as_parent());
            list.add_member(ItemType::Way, 10, "outer", None).unwrap();
            list.add_member(ItemType::Way, 11, "inner", None).unwrap();
            list.add_member(ItemType::Node, 5, "", None).unwrap();
            list.add_member(ItemType::Relation, 7, "subarea", None)
                .unwrap();
        }
    }
    buffer.commit();

    let members = members(&buffer);
    let summary: Vec<_> = members
        .iter()
        .map(|m| (m.member_type, m.member_ref, m.role))
        .collect();
    assert_eq!(
        summary,
        vec![
            (ItemType::Way, 10, "outer"),
            (ItemType::Way, 11, "inner"),
            (ItemType::Node, 5, ""),
            (ItemType::Relation, 7, "subarea"),
        ]
    );
    assert!(members.iter().all(|m| m.full_member.is_none()));
}

#[test]
fn test_member_records_are_aligned() {
    let mut buffer = Buffer::new();
    let offset;
    {
        let mut list = RelationMemberListBuilder::new(&mut buffer);
        offset = list.item_offset();
        list.add_member(ItemType::Node, 1, "abc", None).unwrap();
        list.add_member(ItemType::Node, 2, "abcdefghij", None)
            .unwrap();
    }
    buffer.commit();

    let item = buffer.get_item(offset).unwrap();
    // header + (16 + 4 -> 24) + (16 + 11 -> 32)
    assert_eq!(item.size(), 8 + 24 + 32);
    assert_eq!(item.size() % ALIGN_BYTES, 0);
}

#[test]
fn test_empty_member_list() {
    let mut buffer = Buffer::new();
    {
        let mut relation = RelationBuilder::new(&mut buffer);
        let _list = RelationMemberListBuilder::new(relation.as_parent());
    }
    buffer.commit();
    assert!(members(&buffer).is_empty());
}

#[test]
fn test_role_too_long() {
    let mut buffer = Buffer::new();
    {
        let mut relation = RelationBuilder::new(&mut buffer);
        let mut list = RelationMemberListBuilder::new(relation.as_parent());
        list.add_member(ItemType::Way, 1, "ok", None).unwrap();
        let err = list
            .add_member(
                ItemType::Way,
                2,
                &"r".repeat(MAX_OSM_STRING_LENGTH + 1),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, OsmError::LengthExceeded { .. }));
    }
    buffer.commit();

    let members = members(&buffer);
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].role, "ok");
}

// =============================================================================
// Full Member Tests
// =============================================================================

#[test]
fn test_full_member_copy() {
    let mut nodes = Buffer::new();
    {
        let mut node = NodeBuilder::new(&mut nodes);
        node.set_id(5);
        node.set_user("someone").unwrap();
        node.add_tags([("barrier", "gate")]).unwrap();
    }
    nodes.commit();
    let node = nodes.objects().next().unwrap();
    let node_size = node.item().padded_size();

    let mut buffer = Buffer::new();
    {
        let mut relation = RelationBuilder::new(&mut buffer);
        relation.set_id(1);
        {
            let mut list = RelationMemberListBuilder::new(relation.as_parent());
            list.add_member(ItemType::Node, 5, "via", Some(&node))
                .unwrap();
            list.add_member(ItemType::Way, 6, "from", None).unwrap();
        }
    }
    buffer.commit();

    let relation = buffer.objects().next().unwrap();
    let list = relation
        .subitems()
        .find(|item| item.item_type() == ItemType::RelationMemberList)
        .unwrap();
    assert_eq!(list.size(), 8 + 16 + padded_length(4) + node_size + 16 + 8);

    let members: Vec<_> = relation.members().collect();
    assert_eq!(members.len(), 2);
    let copy: ObjectView<'_> = members[0].full_member.unwrap();
    assert_eq!(copy.id(), 5);
    assert_eq!(copy.user(), "someone");
    assert_eq!(copy.tags().get("barrier"), Some("gate"));
    assert_eq!(members[1].member_ref, 6);
    assert_eq!(members[1].role, "from");
}
