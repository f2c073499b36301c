//! A whole buffer LZW15 implementation, slow but easy to follow.
//!
//! It shares no code with the `lzw15` crate and computes the code width from the size of the
//! codebook instead of counting bumps, so the streaming implementation can be checked against it.

pub mod table;

use std::io::{Cursor, Error, ErrorKind};

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};
use lzw15::{BUMP_CODE, CLEAR_CODE, END_OF_INFO_CODE, MIN_WIDTH};
use table::{CompressionTable, DecompressionTable};

/// Bits needed to write `size - 1`, the biggest code of a codebook of `size` entries, plus one.
fn bit_length(size: usize) -> u32 {
    usize::BITS - size.leading_zeros()
}

fn write_code<W: BitWrite>(writer: &mut W, width: u32, code: u16) -> Result<(), Error> {
    writer.write(width, code)
}

/// Compresses `data` with a codebook capped at `2.pow(max_width)` entries.
pub fn compress(data: &[u8], max_width: u8) -> Result<Vec<u8>, Error> {
    let max_code_size = 1usize << max_width;
    let mut writer = BitWriter::endian(Vec::new(), BigEndian);
    let mut table = CompressionTable::new();
    let mut current_prefix: Vec<u8> = vec![];

    for &k in data {
        let width = bit_length(table.len());
        let mut added = false;

        let mut current_string = current_prefix.clone();
        current_string.push(k);
        if current_prefix.is_empty() || table.contains(&current_string) {
            current_prefix = current_string;
        } else {
            let code = table
                .code_for(&current_prefix)
                .ok_or_else(|| Error::new(ErrorKind::Other, "prefix missing from the table"))?;
            write_code(&mut writer, width, code)?;
            table.add(current_string);
            added = true;
            current_prefix.clear();
            current_prefix.push(k);
        }

        if table.len() > max_code_size {
            let code = table
                .code_for(&current_prefix)
                .ok_or_else(|| Error::new(ErrorKind::Other, "prefix missing from the table"))?;
            write_code(&mut writer, width, code)?;
            write_code(&mut writer, width, END_OF_INFO_CODE)?;
            writer.byte_align()?;
            table.reset();
            current_prefix.clear();
        } else if added && table.len().is_power_of_two() && table.len() > 256 {
            write_code(&mut writer, width, BUMP_CODE)?;
        }
    }

    let width = bit_length(table.len());
    if let Some(code) = table.code_for(&current_prefix) {
        write_code(&mut writer, width, code)?;
    }
    write_code(&mut writer, width, END_OF_INFO_CODE)?;
    writer.byte_align()?;

    Ok(writer.into_writer())
}

/// Decompresses every block of `data`.
///
/// Trailing bits that do not make a whole code are ignored.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut reader = BitReader::endian(Cursor::new(data), BigEndian);
    let mut table = DecompressionTable::new();
    let mut char_stream = vec![];
    let mut previous_entry: Option<Vec<u8>> = None;
    let mut width = MIN_WIDTH as u32;

    loop {
        let code: u16 = match reader.read(width) {
            Ok(code) => code,
            Err(error) if error.kind() == ErrorKind::UnexpectedEof => break,
            Err(error) => return Err(error),
        };

        match code {
            END_OF_INFO_CODE => {
                reader.byte_align();
                table.reset();
                previous_entry = None;
                width = MIN_WIDTH as u32;
            }
            CLEAR_CODE => {
                table.reset();
                previous_entry = None;
                width = MIN_WIDTH as u32;
            }
            BUMP_CODE => width += 1,
            code => {
                let entry = match (table.string_for(code), &previous_entry) {
                    (Some(string), _) => string.clone(),
                    (None, Some(previous)) if code as usize == table.len() => {
                        let mut entry = previous.clone();
                        entry.push(previous[0]);
                        entry
                    }
                    _ => {
                        return Err(Error::new(
                            ErrorKind::InvalidData,
                            format!("Unexpected code {code}, next code is {}", table.len()),
                        ))
                    }
                };

                char_stream.extend_from_slice(&entry);
                if let Some(mut previous) = previous_entry.take() {
                    previous.push(entry[0]);
                    table.add(previous);
                }
                previous_entry = Some(entry);
            }
        }
    }

    Ok(char_stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{prelude::StdRng, Rng, RngCore, SeedableRng};

    fn text(len: usize) -> Vec<u8> {
        let words = ["lorem", "ipsum", "dolor", "sit", "amet", "gabba", "yo", "\n"];
        let mut rng = StdRng::seed_from_u64(1);
        let mut text = Vec::with_capacity(len + 8);
        while text.len() < len {
            text.extend_from_slice(words[rng.gen_range(0..words.len())].as_bytes());
            text.push(b' ');
        }
        text.truncate(len);
        text
    }

    fn random(len: usize) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(2);
        let mut data = vec![0; len];
        rng.fill_bytes(&mut data);
        data
    }

    fn streamed(data: &[u8], max_width: u8) -> Vec<u8> {
        lzw15::ByteEncoder::new(max_width)
            .unwrap()
            .encode(data.iter().copied())
            .collect()
    }

    #[test]
    fn bit_length_of_codebook_sizes() {
        assert_eq!(bit_length(259), 9);
        assert_eq!(bit_length(511), 9);
        assert_eq!(bit_length(512), 10);
        assert_eq!(bit_length(32768), 16);
    }

    #[test]
    fn reference_gabba() -> Result<(), Error> {
        let compressed = compress(b"gabba gabba yo gabba", 15)?;

        assert_eq!(
            compressed,
            [
                0x33, 0x98, 0x4C, 0x46, 0x23, 0x08, 0x82, 0x07, 0x05, 0x83, 0x9E, 0x4D, 0xF0,
                0x88, 0x24, 0x1A, 0x00
            ]
        );
        assert_eq!(decompress(&compressed)?, b"gabba gabba yo gabba");

        Ok(())
    }

    #[test]
    fn reference_empty() -> Result<(), Error> {
        assert_eq!(compress(&[], 15)?, [0x80, 0x00]);
        assert!(decompress(&[0x80, 0x00])?.is_empty());

        Ok(())
    }

    #[test]
    fn reference_roundtrip() -> Result<(), Error> {
        for data in [text(100_000), random(50_000)] {
            for max_width in [9, 10, 12, 15] {
                assert_eq!(decompress(&compress(&data, max_width)?)?, data);
            }
        }

        Ok(())
    }

    #[test]
    fn streaming_matches_reference_on_text() -> Result<(), Error> {
        let data = text(200_000);

        for max_width in 9..=15 {
            assert_eq!(
                streamed(&data, max_width),
                compress(&data, max_width)?,
                "max width {max_width}"
            );
        }

        Ok(())
    }

    #[test]
    fn streaming_matches_reference_on_random_data() -> Result<(), Error> {
        // Random data fills the codebook fast, so this goes through many flushes.
        let data = random(100_000);

        for max_width in [9, 11, 15] {
            assert_eq!(
                streamed(&data, max_width),
                compress(&data, max_width)?,
                "max width {max_width}"
            );
        }

        Ok(())
    }

    #[test]
    fn streaming_decodes_reference() -> Result<(), Box<dyn std::error::Error>> {
        let data = text(50_000);
        let compressed = compress(&data, 12)?;

        assert_eq!(lzw15::decompress_to_vec(&compressed)?, data);

        Ok(())
    }

    #[test]
    fn reference_rejects_unknown_code() {
        // 0x61, then 0x1FF which was never assigned.
        let error = decompress(&[0x30, 0xFF, 0xC0]).err().unwrap();

        assert_eq!(error.kind(), ErrorKind::InvalidData);
    }
}
