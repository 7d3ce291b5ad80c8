//! Index snapshots
//!
//! Scanning headers touches every block of a large file. A snapshot stores
//! the scan result so a table can be reopened without it.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{OsmError, PbfError, Result};
use crate::memory::ItemType;
use crate::osm::ObjectId;

use super::decoder::BlockDecoder;
use super::index::{BlockIndexTable, BlockStart, FirstItem};

/// One block start as stored in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub file_offset: u64,
    pub datasize: u32,
    pub first_item: Option<(ObjectId, ItemType)>,
}

/// Serializable copy of a `BlockIndexTable`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// Size of the indexed file; a snapshot only applies to that exact size
    pub file_size: u64,
    pub blocks: Vec<BlockRecord>,
}

impl IndexSnapshot {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        bincode::serialize_into(&mut writer, self)
            .map_err(|e| OsmError::Serialization(e.to_string()))?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        bincode::deserialize_from(reader).map_err(|e| OsmError::Serialization(e.to_string()))
    }

    /// Check that the blocks are in file order and inside the file
    fn validate(&self, file_size: u64) -> Result<()> {
        if self.file_size != file_size {
            return Err(PbfError::Truncated {
                offset: self.file_size,
                file_size,
            }
            .into());
        }

        let mut previous_end = 0u64;
        for block in &self.blocks {
            if block.file_offset < previous_end {
                return Err(OsmError::Serialization(format!(
                    "block at offset {} overlaps the previous block",
                    block.file_offset
                )));
            }
            let end = block.file_offset.saturating_add(block.datasize as u64);
            if end > file_size {
                return Err(PbfError::Truncated {
                    offset: end,
                    file_size,
                }
                .into());
            }
            previous_end = end;
        }
        Ok(())
    }
}

impl<D> BlockIndexTable<D> {
    /// Capture the current block starts, including resolved first items
    pub fn snapshot(&self) -> IndexSnapshot {
        let blocks = self
            .block_starts()
            .iter()
            .map(|start| BlockRecord {
                file_offset: start.file_offset,
                datasize: start.datasize,
                first_item: match start.first_item() {
                    FirstItem::Resolved { id, item_type } => Some((id, item_type)),
                    FirstItem::Unresolved => None,
                },
            })
            .collect();

        IndexSnapshot {
            file_size: self.file_size(),
            blocks,
        }
    }
}

impl<D: BlockDecoder> BlockIndexTable<D> {
    /// Reopen `path` from a snapshot instead of scanning its headers.
    ///
    /// Fails if the file size no longer matches or a block lies outside
    /// the file.
    pub fn from_snapshot(
        path: impl AsRef<Path>,
        decoder: D,
        snapshot: &IndexSnapshot,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let file_size = file.metadata()?.len();
        snapshot.validate(file_size)?;

        let block_starts = snapshot
            .blocks
            .iter()
            .map(|record| {
                BlockStart::with_first_item(record.file_offset, record.datasize, record.first_item)
            })
            .collect::<Vec<_>>();

        info!(
            path = %path.display(),
            blocks = block_starts.len(),
            "Restored block index from snapshot"
        );

        Ok(Self::from_parts(path, file, file_size, block_starts, decoder))
    }
}
