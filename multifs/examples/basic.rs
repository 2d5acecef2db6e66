//! This example demonstrates first-match lookups across layered directories.
//!
//! The example shows how to:
//! - Register on-disk directories at the head and tail of the priority list
//! - Read a file through the overlay
//! - Change which directory answers by registering another one at the head
//!
//! To run the example:
//! ```bash
//! cargo run --example basic -- dir_a dir_b dir_c --file A
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use multifs::{MultiFs, NativeFs, Priority};
use tracing_subscriber::EnvFilter;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Reads one file through two, then three, layered directories.
#[derive(Parser, Debug)]
#[command(author, long_about = None)]
struct Args {
    /// Directory registered first
    first: PathBuf,

    /// Directory registered last
    last: PathBuf,

    /// Directory registered first after the initial read
    late: PathBuf,

    /// The file to read
    #[arg(short, long, default_value = "A")]
    file: String,
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
    fs.insert(Arc::new(NativeFs::new(&args.first)), Priority::First);
    fs.insert(Arc::new(NativeFs::new(&args.last)), Priority::Last);

    let content = fs.read_file(&args.file)?;
    tracing::info!(
        "{} with {} and {}:\n{}",
        args.file,
        args.first.display(),
        args.last.display(),
        String::from_utf8_lossy(&content)
    );

    fs.insert(Arc::new(NativeFs::new(&args.late)), Priority::First);

    let content = fs.read_file(&args.file)?;
    tracing::info!(
        "{} with {}, {} and {}:\n{}",
        args.file,
        args.first.display(),
        args.last.display(),
        args.late.display(),
        String::from_utf8_lossy(&content)
    );

    Ok(())
}
