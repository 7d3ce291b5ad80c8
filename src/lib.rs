//! # osmbuf
//!
//! Binary in-memory representation of OpenStreetMap data and random access
//! to PBF files:
//! - Append-only arena buffers of aligned, size-prefixed items
//! - Typed builders for nodes, ways, relations, areas and changesets
//! - A block index over PBF files that decodes single blocks on demand
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Entity Builders (builder::object/list)          │
//! │     Node / Way / Relation / Area / Changeset / Tag list      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Generic Builder (builder)                    │
//! │          (size propagation through parent chain)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Buffer (memory)                            │
//! │             (committed / written marks)                      │
//! └─────────────────────▲───────────────────────────────────────┘
//!                       │ decoded blocks
//! ┌─────────────────────┴───────────────────────────────────────┐
//! │                BlockIndexTable (pbf)                         │
//! │        (header scan, on-demand block decode)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod memory;
pub mod osm;
pub mod builder;
pub mod pbf;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{OsmError, PbfError, Result};
pub use config::Config;
pub use memory::{Buffer, ItemType};
pub use pbf::{BlockIndexTable, ReadMeta};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of osmbuf
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
