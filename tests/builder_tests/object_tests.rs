//! Tests for the object builders
//!
//! These tests verify:
//! - Default attributes of new nodes, ways and areas
//! - Setters and textual attributes
//! - User slot growth and the set_user ordering rule
//! - Way node lists and area initialization
//! - Stepping over siblings by padded size

use osmbuf::builder::{
    AreaBuilder, NodeBuilder, OuterRingBuilder, RelationBuilder, TagListBuilder, WayBuilder,
    WayNodeListBuilder,
};
use osmbuf::memory::padded_length;
use osmbuf::osm::{area_id_to_object_id, Location, NodeRef, ObjectView, Timestamp};
use osmbuf::{Buffer, ItemType, OsmError};

// =============================================================================
// Helper Functions
// =============================================================================

fn first_object(buffer: &Buffer) -> ObjectView<'_> {
    buffer.objects().next().unwrap()
}

fn build_way(buffer: &mut Buffer, id: i64, user: &str, node_count: i64) {
    let mut way = WayBuilder::new(buffer);
    way.set_id(id).set_version(1);
    way.set_user(user).unwrap();
    way.add_tags([("highway", "residential")]).unwrap();
    way.add_node_refs((1..=node_count).map(|n| NodeRef::new(n, None)));
}

// =============================================================================
// Node Tests
// =============================================================================

#[test]
fn test_new_node_defaults() {
    let mut buffer = Buffer::new();
    {
        let _node = NodeBuilder::new(&mut buffer);
    }
    buffer.commit();

    let node = first_object(&buffer);
    assert_eq!(node.item_type(), ItemType::Node);
    assert_eq!(node.id(), 0);
    assert!(node.visible());
    assert!(!node.removed());
    assert_eq!(node.user(), "");
    assert!(!node.location().is_defined());
    assert!(node.tags().is_empty());
}

#[test]
fn test_node_setters() {
    let mut buffer = Buffer::new();
    {
        let mut node = NodeBuilder::new(&mut buffer);
        node.set_id(-17)
            .set_version(3)
            .set_changeset(99)
            .set_uid(42)
            .set_timestamp(Timestamp::from_secs(1_425_213_296))
            .set_location(Location::new(13.377, 52.516));
        node.set_user("mapper").unwrap();
        node.add_tags([("amenity", "cafe"), ("name", "Kaffee")])
            .unwrap();
    }
    buffer.commit();

    let node = first_object(&buffer);
    assert_eq!(node.id(), -17);
    assert_eq!(node.version(), 3);
    assert_eq!(node.changeset(), 99);
    assert_eq!(node.uid(), 42);
    assert_eq!(node.timestamp().to_string(), "2015-03-01T12:34:56Z");
    assert_eq!(node.location(), Location::new(13.377, 52.516));
    assert_eq!(node.user(), "mapper");
    assert_eq!(node.tags().get("name"), Some("Kaffee"));
}

#[test]
fn test_set_deleted_and_removed() {
    let mut buffer = Buffer::new();
    {
        let mut node = NodeBuilder::new(&mut buffer);
        node.set_deleted(true).set_removed(true);
    }
    buffer.commit();

    let node = first_object(&buffer);
    assert!(node.deleted());
    assert!(node.removed());
}

#[test]
fn test_negative_uid_becomes_zero() {
    let mut buffer = Buffer::new();
    {
        let mut node = NodeBuilder::new(&mut buffer);
        node.set_uid_from_signed(-1);
    }
    buffer.commit();
    assert_eq!(first_object(&buffer).uid(), 0);
}

// =============================================================================
// Attribute Tests
// =============================================================================

#[test]
fn test_set_attribute() {
    let mut buffer = Buffer::new();
    {
        let mut node = NodeBuilder::new(&mut buffer);
        node.set_attribute("id", "123").unwrap();
        node.set_attribute("version", "4").unwrap();
        node.set_attribute("changeset", "555").unwrap();
        node.set_attribute("timestamp", "2015-03-01T12:34:56Z")
            .unwrap();
        node.set_attribute("uid", "77").unwrap();
        node.set_attribute("visible", "false").unwrap();
        node.set_attribute("unknown", "whatever").unwrap();
    }
    buffer.commit();

    let node = first_object(&buffer);
    assert_eq!(node.id(), 123);
    assert_eq!(node.version(), 4);
    assert_eq!(node.changeset(), 555);
    assert_eq!(node.timestamp().as_secs(), 1_425_213_296);
    assert_eq!(node.uid(), 77);
    assert!(!node.visible());
}

#[test]
fn test_set_attribute_rejects_bad_values() {
    let mut buffer = Buffer::new();
    let mut node = NodeBuilder::new(&mut buffer);

    assert!(matches!(
        node.set_attribute("id", "abc"),
        Err(OsmError::InvalidAttribute { .. })
    ));
    assert!(matches!(
        node.set_attribute("visible", "maybe"),
        Err(OsmError::InvalidAttribute { .. })
    ));
    assert!(matches!(
        node.set_attribute("timestamp", "yesterday"),
        Err(OsmError::InvalidAttribute { .. })
    ));
}

#[test]
fn test_empty_timestamp_attribute() {
    let mut buffer = Buffer::new();
    {
        let mut node = NodeBuilder::new(&mut buffer);
        node.set_attribute("timestamp", "").unwrap();
    }
    buffer.commit();
    assert!(!first_object(&buffer).timestamp().is_valid());
}

// =============================================================================
// User Tests
// =============================================================================

#[test]
fn test_short_user_fits_initial_slot() {
    let mut buffer = Buffer::new();
    {
        let mut way = WayBuilder::new(&mut buffer);
        way.set_user("abcde").unwrap();
    }
    buffer.commit();

    let way = first_object(&buffer);
    assert_eq!(way.user(), "abcde");
    assert_eq!(way.item().size(), 48);
}

#[test]
fn test_long_user_grows_slot() {
    let mut buffer = Buffer::new();
    let user = "a".repeat(100);
    {
        let mut way = WayBuilder::new(&mut buffer);
        way.set_user(&user).unwrap();
        way.add_tags([("k", "v")]).unwrap();
    }
    buffer.commit();

    let way = first_object(&buffer);
    assert_eq!(way.user(), user);
    assert_eq!(way.tags().get("k"), Some("v"));
    // fixed 40 + user size 2 + name and NUL, padded
    assert_eq!(way.item().size(), padded_length(42 + 101) + 16);
}

#[test]
fn test_user_too_long() {
    let mut buffer = Buffer::new();
    let mut way = WayBuilder::new(&mut buffer);
    let err = way.set_user(&"u".repeat(1025)).err().unwrap();
    assert!(matches!(err, OsmError::LengthExceeded { length: 1025, .. }));
}

#[test]
fn test_rejected_user_leaves_siblings_untouched() {
    let mut buffer = Buffer::new();
    build_way(&mut buffer, 1, "a much longer user name", 3);
    buffer.commit();
    let before = buffer.written_bytes().to_vec();

    {
        let mut node = NodeBuilder::new(&mut buffer);
        node.set_id(2);
        assert!(node.set_user(&"u".repeat(2000)).is_err());
    }

    assert_eq!(&buffer.written_bytes()[..before.len()], &before[..]);
    buffer.rollback();
    assert_eq!(buffer.written_bytes(), &before[..]);
    assert_eq!(first_object(&buffer).user(), "a much longer user name");
}

#[test]
#[should_panic(expected = "set_user() must be called at most once")]
fn test_set_user_twice_panics() {
    let mut buffer = Buffer::new();
    let mut node = NodeBuilder::new(&mut buffer);
    node.set_user("first").unwrap();
    let _ = node.set_user("second");
}

#[test]
#[should_panic(expected = "before any sub-builders")]
fn test_set_user_after_tags_panics() {
    let mut buffer = Buffer::new();
    let mut node = NodeBuilder::new(&mut buffer);
    node.add_tags([("k", "v")]).unwrap();
    let _ = node.set_user("late");
}

// =============================================================================
// Way Tests
// =============================================================================

#[test]
fn test_way_node_list() {
    let mut buffer = Buffer::new();
    {
        let mut way = WayBuilder::new(&mut buffer);
        way.set_id(10);
        {
            let mut nodes = WayNodeListBuilder::new(way.as_parent());
            nodes.add_node(1, Some(Location::new(1.0, 1.0)));
            nodes.add_node(2, None);
            nodes.add_node(1, Some(Location::new(1.0, 1.0)));
        }
    }
    buffer.commit();

    let way = first_object(&buffer);
    let nodes = way.nodes();
    assert_eq!(nodes.len(), 3);
    assert!(nodes.is_closed());
    assert_eq!(nodes.get(0).unwrap().location, Location::new(1.0, 1.0));
    assert!(!nodes.get(1).unwrap().location.is_defined());
}

#[test]
fn test_siblings_step_by_padded_size() {
    for tag_count in 0..3 {
        for node_count in 0..4 {
            let mut buffer = Buffer::new();
            {
                let mut way = WayBuilder::new(&mut buffer);
                way.set_id(1);
                {
                    let mut tags = TagListBuilder::new(way.as_parent());
                    for i in 0..tag_count {
                        tags.add_tag(&format!("key{}", i), "value").unwrap();
                    }
                }
                way.add_node_refs((0..node_count).map(|n| NodeRef::new(n, None)));
            }
            buffer.commit();

            let way = first_object(&buffer);
            let subitems: Vec<_> = way.subitems().collect();
            assert_eq!(subitems.len(), 2);
            assert_eq!(subitems[0].item_type(), ItemType::TagList);
            assert_eq!(subitems[1].item_type(), ItemType::WayNodeList);
            assert_eq!(way.tags().len(), tag_count);
            assert_eq!(way.nodes().len(), node_count as usize);
            assert_eq!(
                way.item().size(),
                48 + subitems[0].padded_size() + subitems[1].padded_size()
            );
        }
    }
}

#[test]
fn test_consecutive_objects() {
    let mut buffer = Buffer::new();
    build_way(&mut buffer, 1, "a", 2);
    build_way(&mut buffer, 2, "a much longer user name", 5);
    build_way(&mut buffer, 3, "", 0);
    buffer.commit();

    let objects: Vec<_> = buffer.objects().collect();
    assert_eq!(objects.len(), 3);
    assert_eq!(objects[1].user(), "a much longer user name");
    assert_eq!(objects[1].nodes().len(), 5);
    assert_eq!(objects[2].id(), 3);
    assert!(objects[2].nodes().is_empty());
}

#[test]
fn test_length_error_then_rollback() {
    let mut buffer = Buffer::new();
    build_way(&mut buffer, 1, "ok", 2);
    buffer.commit();
    let before = buffer.as_slice().to_vec();

    {
        let mut way = WayBuilder::new(&mut buffer);
        way.set_id(2);
        assert!(way.add_tags([("k", "v".repeat(2000))]).is_err());
    }
    assert_eq!(&buffer.written_bytes()[..before.len()], &before[..]);

    buffer.rollback();
    assert_eq!(buffer.objects().count(), 1);
    assert_eq!(buffer.as_slice(), &before[..]);
}

// =============================================================================
// Area Tests
// =============================================================================

#[test]
fn test_area_from_way() {
    let mut buffer = Buffer::new();
    {
        let mut way = WayBuilder::new(&mut buffer);
        way.set_id(21)
            .set_version(2)
            .set_changeset(5)
            .set_uid(9)
            .set_timestamp(Timestamp::from_secs(1000));
        way.set_user("builder").unwrap();
    }
    buffer.commit();

    let mut areas = Buffer::new();
    {
        let way = first_object(&buffer);
        let mut area = AreaBuilder::new(&mut areas);
        area.initialize_from_object(&way).unwrap();
        {
            let mut ring = OuterRingBuilder::new(area.as_parent());
            for id in [1, 2, 3, 1] {
                ring.add_node(id, None);
            }
        }
    }
    areas.commit();

    let area = first_object(&areas);
    assert_eq!(area.item_type(), ItemType::Area);
    assert_eq!(area.id(), 42);
    assert_eq!(area_id_to_object_id(area.id()), 21);
    assert_eq!(area.version(), 2);
    assert_eq!(area.changeset(), 5);
    assert_eq!(area.uid(), 9);
    assert_eq!(area.user(), "builder");
    assert_eq!(area.outer_rings().count(), 1);
    assert!(area.outer_rings().next().unwrap().is_closed());
}

#[test]
fn test_area_from_relation_keeps_sign() {
    let mut buffer = Buffer::new();
    {
        let mut relation = RelationBuilder::new(&mut buffer);
        relation.set_id(-5);
    }
    buffer.commit();

    let mut areas = Buffer::new();
    {
        let relation = first_object(&buffer);
        let mut area = AreaBuilder::new(&mut areas);
        area.initialize_from_object(&relation).unwrap();
    }
    areas.commit();

    assert_eq!(first_object(&areas).id(), -11);
}

#[test]
fn test_area_from_way_with_oversized_id() {
    let mut buffer = Buffer::new();
    {
        let mut way = WayBuilder::new(&mut buffer);
        way.set_id(i64::MAX / 2 + 1);
    }
    buffer.commit();

    let mut areas = Buffer::new();
    {
        let way = first_object(&buffer);
        let mut area = AreaBuilder::new(&mut areas);
        assert!(matches!(
            area.initialize_from_object(&way),
            Err(OsmError::InvalidAttribute { .. })
        ));
    }
    areas.rollback();
    assert!(areas.is_empty());
}
