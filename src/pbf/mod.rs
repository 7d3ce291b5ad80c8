//! PBF Module
//!
//! Random access to OSM PBF files.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Blob 0                                                  │
//! │   HeaderLen: u32 BE (4) | BlobHeader (HeaderLen) | Body │
//! │   BlobHeader.type = "OSMHeader"                         │
//! ├─────────────────────────────────────────────────────────┤
//! │ Blob 1..n                                               │
//! │   HeaderLen: u32 BE (4) | BlobHeader (HeaderLen) | Body │
//! │   BlobHeader.type = "OSMData"                           │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! `BlockIndexTable` reads only the BlobHeaders to find where every data
//! body starts; bodies are read and decoded one at a time on request.

mod decoder;
mod header;
mod index;
mod snapshot;

pub use decoder::{BlockDecoder, EntityBits};
pub use header::{BlobHeader, HeaderDecoder, ProtoHeaderDecoder};
pub use index::{BlockIndexTable, BlockStart, FirstItem};
pub use snapshot::{BlockRecord, IndexSnapshot};

/// BlobHeader type of the first blob
pub const HEADER_BLOB_TYPE: &str = "OSMHeader";

/// BlobHeader type of every following blob
pub const DATA_BLOB_TYPE: &str = "OSMData";

/// Size of the length prefix in front of every BlobHeader
pub const HEADER_LENGTH_SIZE: u64 = 4;

/// Whether decoded objects carry metadata (version, timestamp, user, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMeta {
    No,
    #[default]
    Yes,
}
