use anyhow::Result;

const TEXT: &[u8] = b"TOBEORNOTTOBEORTOBEORNOT";

fn main() -> Result<()> {
    env_logger::builder().format_timestamp(None).init();

    let compressed = lzw15::compress_to_vec(TEXT);
    assert_eq!(
        compressed,
        [
            0x2A, 0x13, 0xC8, 0x44, 0x52, 0x79, 0x48, 0x9C, 0x4F, 0x2A, 0x40, 0xE0, 0xB0, 0x78,
            0x64, 0x1A, 0x11, 0x0A, 0x80, 0x00
        ]
    );

    // The iterators can also be chained without collecting in between.
    let decompressed = lzw15::decompress(lzw15::compress(TEXT.iter().copied()))
        .collect::<Result<Vec<u8>, _>>()?;
    assert_eq!(decompressed, TEXT);

    let encoder = lzw15::ByteEncoder::new(12)?;
    let small_codebook: Vec<u8> = encoder.encode(TEXT.iter().copied()).collect();
    assert_eq!(lzw15::decompress_to_vec(small_codebook)?, TEXT);

    Ok(())
}
