//! Tests for TagListBuilder
//!
//! These tests verify:
//! - Tags read back in insertion order
//! - Item size accounting and padding
//! - Length limits on keys and values
//! - Sibling items are untouched by a failed add

use osmbuf::builder::{NodeBuilder, TagListBuilder};
use osmbuf::memory::ALIGN_BYTES;
use osmbuf::osm::{ObjectView, TagListView, MAX_OSM_STRING_LENGTH};
use osmbuf::{Buffer, OsmError};

// =============================================================================
// Helper Functions
// =============================================================================

fn tag_list(buffer: &Buffer, offset: usize) -> TagListView<'_> {
    TagListView::new(buffer.get_item(offset).unwrap()).unwrap()
}

// =============================================================================
// Basic Tests
// =============================================================================

#[test]
fn test_empty_tag_list() {
    let mut buffer = Buffer::new();
    {
        let _tags = TagListBuilder::new(&mut buffer);
    }
    buffer.commit();

    let tags = tag_list(&buffer, 0);
    assert!(tags.is_empty());
    assert_eq!(buffer.get_item(0).unwrap().size(), 8);
    assert_eq!(buffer.written(), 8);
}

#[test]
fn test_tags_in_insertion_order() {
    let mut buffer = Buffer::new();
    {
        let mut tags = TagListBuilder::new(&mut buffer);
        tags.add_tag("highway", "primary").unwrap();
        tags.add_tag("name", "Main Street").unwrap();
        tags.add_tag("amenity", "").unwrap();
    }
    buffer.commit();

    let tags: Vec<_> = tag_list(&buffer, 0).iter().collect();
    assert_eq!(
        tags,
        vec![
            ("highway", "primary"),
            ("name", "Main Street"),
            ("amenity", ""),
        ]
    );
}

#[test]
fn test_duplicate_keys_are_kept() {
    let mut buffer = Buffer::new();
    {
        let mut tags = TagListBuilder::new(&mut buffer);
        tags.add_tags([("a", "1"), ("a", "2")]).unwrap();
    }
    buffer.commit();

    let tags = tag_list(&buffer, 0);
    assert_eq!(tags.len(), 2);
    assert_eq!(tags.get("a"), Some("1"));
}

#[test]
fn test_size_counts_terminators_and_pads_on_drop() {
    let mut buffer = Buffer::new();
    {
        let mut tags = TagListBuilder::new(&mut buffer);
        tags.add_tag("ab", "cde").unwrap();
    }
    buffer.commit();

    // header 8 + "ab\0" 3 + "cde\0" 4
    assert_eq!(buffer.get_item(0).unwrap().size(), 15);
    assert_eq!(buffer.written(), 16);
    assert_eq!(buffer.written() % ALIGN_BYTES, 0);
}

#[test]
fn test_tag_list_inside_node_grows_node() {
    let mut buffer = Buffer::new();
    {
        let mut node = NodeBuilder::new(&mut buffer);
        node.set_id(1).add_tags([("k", "v")]).unwrap();
    }
    buffer.commit();

    // node 48 + user slot 8, tag list 12 padded to 16
    let node = ObjectView::new(buffer.get_item(0).unwrap()).unwrap();
    assert_eq!(node.item().size(), 56 + 16);
    assert_eq!(node.tags().get("k"), Some("v"));
}

// =============================================================================
// Length Limits
// =============================================================================

#[test]
fn test_max_length_key_is_accepted() {
    let mut buffer = Buffer::new();
    let key = "k".repeat(MAX_OSM_STRING_LENGTH);
    {
        let mut tags = TagListBuilder::new(&mut buffer);
        tags.add_tag(&key, "v").unwrap();
    }
    buffer.commit();
    assert_eq!(tag_list(&buffer, 0).get(&key), Some("v"));
}

#[test]
fn test_key_too_long() {
    let mut buffer = Buffer::new();
    let mut tags = TagListBuilder::new(&mut buffer);
    let err = tags
        .add_tag(&"k".repeat(MAX_OSM_STRING_LENGTH + 1), "v")
        .unwrap_err();
    assert!(matches!(
        err,
        OsmError::LengthExceeded {
            length: 1025,
            max: 1024,
            ..
        }
    ));
}

#[test]
fn test_value_too_long_writes_nothing() {
    let mut buffer = Buffer::new();
    {
        let mut tags = TagListBuilder::new(&mut buffer);
        tags.add_tag("ok", "yes").unwrap();
        let result = tags.add_tag("long", &"v".repeat(MAX_OSM_STRING_LENGTH + 1));
        assert!(result.is_err());
    }
    buffer.commit();

    let tags: Vec<_> = tag_list(&buffer, 0).iter().collect();
    assert_eq!(tags, vec![("ok", "yes")]);
}

#[test]
fn test_failed_add_leaves_earlier_siblings_identical() {
    let mut buffer = Buffer::new();
    {
        let mut tags = TagListBuilder::new(&mut buffer);
        tags.add_tag("first", "list").unwrap();
    }
    buffer.commit();
    let before = buffer.as_slice().to_vec();

    {
        let mut tags = TagListBuilder::new(&mut buffer);
        tags.add_tag(&"x".repeat(2000), "v").unwrap_err();
    }

    assert_eq!(&buffer.written_bytes()[..before.len()], &before[..]);
    buffer.rollback();
    assert_eq!(buffer.written_bytes(), &before[..]);
}
