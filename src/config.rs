//! Configuration for osmbuf
//!
//! Centralized configuration with sensible defaults.

use crate::error::{OsmError, Result};
use crate::pbf::ReadMeta;

/// Main configuration for buffers and block index tables
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Buffer Configuration
    // -------------------------------------------------------------------------
    /// Initial capacity (in bytes) of buffers created through the config
    pub buffer_capacity: usize,

    // -------------------------------------------------------------------------
    // Block Index Configuration
    // -------------------------------------------------------------------------
    /// Largest accepted BlobHeader. Headers without index data are usually
    /// only 13-14 bytes.
    pub max_header_size: u32,

    /// Largest accepted block body. Blocks are usually 60 KiB - 500 KiB, so
    /// anything above 20 MiB is suspicious.
    pub max_block_size: u64,

    /// Number of block starts to allocate up front when indexing a file
    pub index_capacity_hint: usize,

    /// Whether decoded blocks should carry per-object metadata
    pub read_meta: ReadMeta,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_capacity: 64 * 1024, // 64 KiB
            max_header_size: 64,
            max_block_size: 20 * 1024 * 1024, // 20 MiB
            index_capacity_hint: 1000,
            read_meta: ReadMeta::Yes,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject limits that would make every file unreadable
    pub fn validate(&self) -> Result<()> {
        if self.max_header_size == 0 {
            return Err(OsmError::Config("max_header_size must be > 0".to_string()));
        }
        if self.max_block_size == 0 {
            return Err(OsmError::Config("max_block_size must be > 0".to_string()));
        }
        if self.max_block_size > u32::MAX as u64 {
            return Err(OsmError::Config(format!(
                "max_block_size {} does not fit a 32-bit datasize",
                self.max_block_size
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the initial buffer capacity (in bytes)
    pub fn buffer_capacity(mut self, bytes: usize) -> Self {
        self.config.buffer_capacity = bytes;
        self
    }

    /// Set the maximum BlobHeader size (in bytes)
    pub fn max_header_size(mut self, bytes: u32) -> Self {
        self.config.max_header_size = bytes;
        self
    }

    /// Set the maximum block body size (in bytes)
    pub fn max_block_size(mut self, bytes: u64) -> Self {
        self.config.max_block_size = bytes;
        self
    }

    /// Set the number of index entries to preallocate
    pub fn index_capacity_hint(mut self, entries: usize) -> Self {
        self.config.index_capacity_hint = entries;
        self
    }

    /// Set whether decoded blocks carry metadata
    pub fn read_meta(mut self, read_meta: ReadMeta) -> Self {
        self.config.read_meta = read_meta;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
