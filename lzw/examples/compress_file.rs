//! Compresses a file, then decompresses it back next to it.
//!
//! `cargo run --example compress_file -- some/file.txt`

use anyhow::{bail, Context, Result};

fn main() -> Result<()> {
    env_logger::builder().format_timestamp(None).init();

    let source = match std::env::args().nth(1) {
        Some(source) => std::path::PathBuf::from(source),
        None => bail!("Usage: compress_file <file>"),
    };
    let compressed = source.with_extension("lzw");
    let decompressed = source.with_extension("out");

    let (read, written) = lzw15::io::compress_file(&source, &compressed)
        .with_context(|| format!("Couldn't compress {}", source.display()))?;
    println!(
        "{} -> {}: {read} to {written} bytes",
        source.display(),
        compressed.display()
    );

    let (read, written) = lzw15::io::decompress_file(&compressed, &decompressed)
        .with_context(|| format!("Couldn't decompress {}", compressed.display()))?;
    println!(
        "{} -> {}: {read} to {written} bytes",
        compressed.display(),
        decompressed.display()
    );

    Ok(())
}
