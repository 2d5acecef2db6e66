//! This example demonstrates a merged walk over directories and an embedded table.
//!
//! The example shows how to:
//! - Layer on-disk directories with files compiled into the binary
//! - Expose a sub-directory of a source as its root with `SubFs`
//! - Walk the merged tree in path order
//!
//! To run the example:
//! ```bash
//! RUST_LOG=multifs=debug cargo run --example walk -- dir_a dir_b
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use multifs::{EmbeddedFs, MultiFs, NativeFs, Priority, SubFs, WalkControl};
use tracing_subscriber::EnvFilter;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

static EMBEDDED: &[(&str, &[u8])] = &[
    ("embed_dir/A", b"embedded A\n"),
    ("embed_dir/E", b"embedded E\n"),
    ("embed_dir/nested/F", b"embedded F\n"),
];

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Walks on-disk directories merged with an embedded table.
#[derive(Parser, Debug)]
#[command(author, long_about = None)]
struct Args {
    /// Directories to register, highest priority first
    dirs: Vec<PathBuf>,

    /// The directory to walk
    #[arg(short, long, default_value = ".")]
    root: String,
}

//--------------------------------------------------------------------------------------------------
// Functions: main
//--------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut fs = MultiFs::new();
    for dir in &args.dirs {
        fs.insert(Arc::new(NativeFs::new(dir)), Priority::Last);
    }

    let embedded = Arc::new(EmbeddedFs::new(EMBEDDED));
    fs.insert(Arc::new(SubFs::new(embedded, "embed_dir")), Priority::Last);

    fs.walk(&args.root, |path, metadata, error| {
        match (metadata, error) {
            (_, Some(error)) => tracing::warn!("{}: {}", path.to_rooted_string(), error),
            (Some(metadata), None) if metadata.is_dir() => {
                tracing::info!("{}/", path.to_rooted_string())
            }
            (Some(metadata), None) => {
                tracing::info!("{} ({} bytes)", path.to_rooted_string(), metadata.get_size())
            }
            (None, None) => {}
        }

        WalkControl::Continue
    })?;

    Ok(())
}
