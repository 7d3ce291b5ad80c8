//! Block Index Table
//!
//! Scans a PBF file once, reading only the BlobHeaders, and remembers where
//! every data block body starts. Any block can then be decoded on its own.
//!
//! ```text
//! offset 0                                                     file_size
//! ├─ len ─ OSMHeader hdr ─ body ─┼─ len ─ OSMData hdr ─ body ─┼─ ... ─┤
//!                                                    ▲
//!                                  BlockStart { file_offset, datasize }
//! ```

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::config::Config;
use crate::error::{OsmError, PbfError, Result};
use crate::memory::{Buffer, ItemType};
use crate::osm::ObjectId;

use super::decoder::{BlockDecoder, EntityBits};
use super::header::{HeaderDecoder, ProtoHeaderDecoder};
use super::{ReadMeta, DATA_BLOB_TYPE, HEADER_BLOB_TYPE, HEADER_LENGTH_SIZE};

// =============================================================================
// Block Start
// =============================================================================

/// First object of a block, known once the block has been decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstItem {
    Unresolved,
    Resolved { id: ObjectId, item_type: ItemType },
}

/// Position of one data block body in the file
#[derive(Debug, Clone)]
pub struct BlockStart {
    /// Offset of the body (just past its BlobHeader)
    pub file_offset: u64,
    /// Length of the body in bytes
    pub datasize: u32,
    first_item: OnceLock<(ObjectId, ItemType)>,
}

impl BlockStart {
    pub fn new(file_offset: u64, datasize: u32) -> Self {
        Self {
            file_offset,
            datasize,
            first_item: OnceLock::new(),
        }
    }

    pub(crate) fn with_first_item(
        file_offset: u64,
        datasize: u32,
        first_item: Option<(ObjectId, ItemType)>,
    ) -> Self {
        let start = Self::new(file_offset, datasize);
        if let Some(first) = first_item {
            let _ = start.first_item.set(first);
        }
        start
    }

    pub fn first_item(&self) -> FirstItem {
        match self.first_item.get() {
            Some(&(id, item_type)) => FirstItem::Resolved { id, item_type },
            None => FirstItem::Unresolved,
        }
    }

    /// Offset just past the body
    pub fn end_offset(&self) -> u64 {
        self.file_offset + self.datasize as u64
    }

    fn resolve(&self, buffer: &Buffer) {
        if self.first_item.get().is_some() {
            return;
        }
        if let Some(object) = buffer.objects().next() {
            // another caller may have resolved it first
            let _ = self.first_item.set((object.id(), object.item_type()));
        }
    }
}

// =============================================================================
// Block Index Table
// =============================================================================

/// Random-access index over the data blocks of one PBF file
pub struct BlockIndexTable<D> {
    path: PathBuf,
    /// Seek and read happen under one lock
    file: Mutex<File>,
    file_size: u64,
    block_starts: Vec<BlockStart>,
    decoder: D,
    read_meta: ReadMeta,
}

impl<D: BlockDecoder> BlockIndexTable<D> {
    /// Index `path` with the default configuration
    pub fn open(path: impl AsRef<Path>, decoder: D) -> Result<Self> {
        Self::open_with_config(path, decoder, &Config::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, decoder: D, config: &Config) -> Result<Self> {
        Self::open_with_header_decoder(path, decoder, config, &ProtoHeaderDecoder)
    }

    /// Index `path`, parsing BlobHeaders with `header_decoder`.
    ///
    /// Fails as a whole on the first malformed header; no partial table is
    /// ever returned.
    pub fn open_with_header_decoder(
        path: impl AsRef<Path>,
        decoder: D,
        config: &Config,
        header_decoder: &impl HeaderDecoder,
    ) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;
        let file_size = file.metadata()?.len();

        let block_starts = scan_blocks(&mut file, file_size, config, header_decoder)?;

        info!(
            path = %path.display(),
            file_size,
            blocks = block_starts.len(),
            "Indexed PBF file"
        );

        Ok(Self {
            path,
            file: Mutex::new(file),
            file_size,
            block_starts,
            decoder,
            read_meta: config.read_meta,
        })
    }

    pub(crate) fn from_parts(
        path: PathBuf,
        file: File,
        file_size: u64,
        block_starts: Vec<BlockStart>,
        decoder: D,
    ) -> Self {
        Self {
            path,
            file: Mutex::new(file),
            file_size,
            block_starts,
            decoder,
            read_meta: ReadMeta::default(),
        }
    }

    /// Read and decode the data block at `index`.
    ///
    /// The block is always decoded with every object kind; `read_meta` only
    /// controls whether metadata is kept. The first decode of a block records
    /// its first object in the matching `BlockStart`.
    ///
    /// # Panics
    /// If `index >= self.len()`.
    pub fn get_parsed_block(&self, index: usize, read_meta: ReadMeta) -> Result<Buffer> {
        assert!(
            index < self.block_starts.len(),
            "block index {} out of range for table with {} blocks",
            index,
            self.block_starts.len()
        );
        let start = &self.block_starts[index];

        let data = self.read_body(start)?;
        trace!(index, offset = start.file_offset, size = start.datasize, "Decoding block");

        let buffer = self.decoder.decode(data, EntityBits::ALL, read_meta)?;
        start.resolve(&buffer);
        Ok(buffer)
    }

    /// `get_parsed_block` with the `read_meta` setting the table was opened with
    pub fn get_block(&self, index: usize) -> Result<Buffer> {
        self.get_parsed_block(index, self.read_meta)
    }

    fn read_body(&self, start: &BlockStart) -> Result<Bytes> {
        let mut data = vec![0u8; start.datasize as usize];
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(start.file_offset))?;
        file.read_exact(&mut data)
            .map_err(|e| OsmError::from_read(e, "block body"))?;
        Ok(Bytes::from(data))
    }
}

impl<D> BlockIndexTable<D> {
    pub fn block_starts(&self) -> &[BlockStart] {
        &self.block_starts
    }

    pub fn len(&self) -> usize {
        self.block_starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.block_starts.is_empty()
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// =============================================================================
// Header Scan
// =============================================================================

fn scan_blocks(
    file: &mut File,
    file_size: u64,
    config: &Config,
    header_decoder: &impl HeaderDecoder,
) -> Result<Vec<BlockStart>> {
    let mut block_starts = Vec::with_capacity(config.index_capacity_hint);

    // The OSMHeader blob is required, even in an otherwise empty file.
    let mut offset = skip_blob(file, 0, file_size, config, header_decoder, HEADER_BLOB_TYPE)?.1;

    while offset < file_size {
        let (body_offset, next_offset, datasize) =
            skip_blob(file, offset, file_size, config, header_decoder, DATA_BLOB_TYPE)?;
        debug!(block = block_starts.len(), offset = body_offset, datasize, "Indexed block");
        block_starts.push(BlockStart::new(body_offset, datasize));
        offset = next_offset;
    }

    Ok(block_starts)
}

/// Digest the blob at `offset` and seek past its body.
/// Returns the body offset, the offset of the next blob and the body size.
fn skip_blob(
    file: &mut File,
    offset: u64,
    file_size: u64,
    config: &Config,
    header_decoder: &impl HeaderDecoder,
    expected_type: &str,
) -> Result<(u64, u64, u32)> {
    let (header_size, datasize) = digest_header(file, config, header_decoder, expected_type)?;

    let body_offset = checked_offset(offset, HEADER_LENGTH_SIZE + header_size as u64, file_size)?;
    let next_offset = checked_offset(body_offset, datasize as u64, file_size)?;
    if next_offset > file_size {
        return Err(PbfError::UnexpectedEof("block body").into());
    }

    file.seek(SeekFrom::Start(next_offset))?;
    Ok((body_offset, next_offset, datasize))
}

/// Read one length prefix and BlobHeader at the current position.
/// Returns the header size and the body size.
fn digest_header(
    file: &mut File,
    config: &Config,
    header_decoder: &impl HeaderDecoder,
    expected_type: &str,
) -> Result<(u32, u32)> {
    let mut length = [0u8; HEADER_LENGTH_SIZE as usize];
    file.read_exact(&mut length)
        .map_err(|e| OsmError::from_read(e, "BlobHeader length"))?;
    let header_size = u32::from_be_bytes(length);

    if header_size > config.max_header_size {
        return Err(PbfError::HeaderSizeInvalid {
            size: header_size,
            max: config.max_header_size,
        }
        .into());
    }

    let mut message = vec![0u8; header_size as usize];
    file.read_exact(&mut message)
        .map_err(|e| OsmError::from_read(e, "BlobHeader"))?;
    let header = header_decoder.decode_header(&message)?;

    let datasize = match header.datasize {
        Some(size) if size > 0 => size as u32,
        _ => return Err(PbfError::MissingDataSize.into()),
    };

    if header.blob_type != expected_type {
        return Err(PbfError::UnexpectedType {
            expected: expected_type.to_string(),
            found: header.blob_type,
        }
        .into());
    }

    if datasize as u64 > config.max_block_size {
        return Err(PbfError::BlockTooLarge {
            size: datasize as u64,
            max: config.max_block_size,
        }
        .into());
    }

    Ok((header_size, datasize))
}

fn checked_offset(offset: u64, advance: u64, file_size: u64) -> Result<u64> {
    offset.checked_add(advance).ok_or_else(|| {
        PbfError::Truncated {
            offset: u64::MAX,
            file_size,
        }
        .into()
    })
}
