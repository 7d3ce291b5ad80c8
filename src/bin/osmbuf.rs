//! osmbuf Binary
//!
//! Inspects the block layout of PBF files.

use std::path::PathBuf;

use bytes::Bytes;
use clap::{Parser, Subcommand};
use osmbuf::pbf::{BlockIndexTable, EntityBits, IndexSnapshot};
use osmbuf::{Buffer, Config, OsmError, ReadMeta};
use tracing_subscriber::{fmt, EnvFilter};

/// osmbuf
#[derive(Parser, Debug)]
#[command(name = "osmbuf")]
#[command(about = "Block index tool for OSM PBF files")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a PBF file and print where its data blocks start
    Index {
        /// PBF file to scan
        file: PathBuf,

        /// Write the index to this snapshot file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Largest accepted block body in MiB
        #[arg(long, default_value = "20")]
        max_block_mb: u64,
    },

    /// Print a previously saved index snapshot
    Show {
        /// Snapshot file
        snapshot: PathBuf,
    },
}

/// Scanning never decodes a block, so any decoder will do.
fn no_decode(_data: Bytes, _types: EntityBits, _meta: ReadMeta) -> osmbuf::Result<Buffer> {
    Err(OsmError::Pbf(osmbuf::PbfError::Decode(
        "block decoding is not available in the CLI".to_string(),
    )))
}

fn main() {
    // Initialize tracing/logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,osmbuf=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("osmbuf v{}", osmbuf::VERSION);

    let result = match args.command {
        Command::Index {
            file,
            save,
            max_block_mb,
        } => run_index(file, save, max_block_mb),
        Command::Show { snapshot } => run_show(snapshot),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

/// Config for `index`, with the block limit given in MiB
fn index_config(max_block_mb: u64) -> osmbuf::Result<Config> {
    let max_block_size = max_block_mb.checked_mul(1024 * 1024).ok_or_else(|| {
        OsmError::Config(format!("--max-block-mb {} is too large", max_block_mb))
    })?;
    let config = Config::builder().max_block_size(max_block_size).build();
    config.validate()?;
    Ok(config)
}

fn run_index(file: PathBuf, save: Option<PathBuf>, max_block_mb: u64) -> osmbuf::Result<()> {
    let config = index_config(max_block_mb)?;

    let table = BlockIndexTable::open_with_config(&file, no_decode, &config)?;

    println!(
        "{}: {} bytes, {} data blocks",
        file.display(),
        table.file_size(),
        table.len()
    );
    for (i, start) in table.block_starts().iter().enumerate() {
        println!(
            "{:>6}  offset {:>12}  size {:>9}",
            i, start.file_offset, start.datasize
        );
    }

    if let Some(path) = save {
        table.snapshot().save(&path)?;
        tracing::info!("Snapshot written to {}", path.display());
    }
    Ok(())
}

fn run_show(path: PathBuf) -> osmbuf::Result<()> {
    let snapshot = IndexSnapshot::load(&path)?;

    println!(
        "{}: file size {} bytes, {} data blocks",
        path.display(),
        snapshot.file_size,
        snapshot.blocks.len()
    );
    for (i, block) in snapshot.blocks.iter().enumerate() {
        match block.first_item {
            Some((id, item_type)) => println!(
                "{:>6}  offset {:>12}  size {:>9}  first {} {}",
                i, block.file_offset, block.datasize, item_type, id
            ),
            None => println!(
                "{:>6}  offset {:>12}  size {:>9}",
                i, block.file_offset, block.datasize
            ),
        }
    }
    Ok(())
}
