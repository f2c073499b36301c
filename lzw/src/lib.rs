//! Streaming LZW encoder and decoder.
//!
//! This crate implements the TIFF flavour of LZW, with more control codes and larger codebooks:
//! codes start 9 bits wide and grow up to 15 bits, for a codebook of at most 32768 entries.
//!
//! Everything is built around iterators. The [encoder::Encoder] turns bytes into codepoints,
//! the [packer::BitPacker] turns codepoints into variable width bit fields, and the reverse
//! pipeline goes through the [unpacker::BitUnpacker] and the [decoder::Decoder].
//! Each stage pulls from the previous one lazily.
//!
//! # Control codes
//!
//! * `END_OF_INFO_CODE` (256): flushes the current block. The codebook is reset, and the next
//!   codepoint starts on a byte boundary.
//! * `BUMP_CODE` (257): the following codepoints are one bit wider.
//! * `CLEAR_CODE` (258): the codebook is reset.
//!
//! # Examples
//!
//! ```
//! use lzw15::decoder::DecodingError;
//!
//! fn main() -> Result<(), DecodingError> {
//!     let data = b"gabba gabba yo gabba";
//!
//!     let compressed = lzw15::compress_to_vec(&data[..]);
//!     assert_eq!(compressed.len(), 17);
//!
//!     let decompressed = lzw15::decompress_to_vec(&compressed[..])?;
//!     assert_eq!(decompressed, data);
//!     Ok(())
//! }
//! ```

pub mod bits;
pub mod decoder;
pub mod encoder;
pub mod io;
pub mod packer;
pub mod unpacker;

use std::borrow::Borrow;

use decoder::{Decoder, DecodingError, Pulled};
use encoder::{Codepoints, Encoder, EncodingError};
use packer::{BitPacker, Packed};
use unpacker::{BitUnpacker, Unpacked};

/// Flushes the codebook and realigns the bit stream on the next byte.
pub const END_OF_INFO_CODE: u16 = 256;
/// Increases the width of the following codepoints by one bit.
pub const BUMP_CODE: u16 = 257;
/// Resets the codebook.
pub const CLEAR_CODE: u16 = 258;
/// First code assigned to a multi byte string.
pub const FIRST_CODE: u16 = 259;
/// Codebook size above which the first bump happens.
pub const NEXT_BUMP_CODE: usize = 511;
/// Width of codepoints at the start of a block.
pub const MIN_WIDTH: u8 = 9;
/// Default maximum width, in bits.
pub const MAX_WIDTH: u8 = 15;
/// Hard ceiling of the codebook size.
pub const MAX_CODE: usize = 1 << MAX_WIDTH;

/// Compress bytes with the default maximum width of 15 bits.
///
/// The returned iterator is lazy: nothing is read from `data` until it is polled.
pub fn compress<I>(data: I) -> Compress<I::IntoIter>
where
    I: IntoIterator<Item = u8>,
{
    ByteEncoder::default().encode(data)
}

/// Compress bytes with the default maximum width.
/// Convenient wrapper that creates a [Vec<u8>] under the hood.
pub fn compress_to_vec<I>(data: I) -> Vec<u8>
where
    I: IntoIterator,
    I::Item: Borrow<u8>,
{
    compress(data.into_iter().map(|byte| *byte.borrow())).collect()
}

/// Decompress bytes produced by [compress].
///
/// Each item is either a decoded byte, or the error that stopped decoding.
pub fn decompress<I>(data: I) -> Decompress<I::IntoIter>
where
    I: IntoIterator<Item = u8>,
{
    ByteDecoder::new().decode(data)
}

/// Decompress bytes produced by [compress].
/// Convenient wrapper that creates a [Vec<u8>] under the hood.
///
/// # Errors
///
/// Fails with a [DecodingError] if the data is not a valid LZW stream.
pub fn decompress_to_vec<I>(data: I) -> Result<Vec<u8>, DecodingError>
where
    I: IntoIterator,
    I::Item: Borrow<u8>,
{
    decompress(data.into_iter().map(|byte| *byte.borrow())).collect()
}

/// Takes a stream of uncompressed bytes and produces a stream of compressed bytes.
/// Combines an [Encoder] with a [BitPacker].
///
/// A `ByteEncoder` is meant for a single stream.
pub struct ByteEncoder {
    encoder: Encoder,
    packer: BitPacker,
}

impl ByteEncoder {
    /// Creates an encoder whose codepoints never need more than `max_width` bits to be
    /// addressed, so a codebook of at most `2.pow(max_width)` entries.
    ///
    /// # Errors
    ///
    /// The width must be between [MIN_WIDTH] and [MAX_WIDTH] included.
    pub fn new(max_width: u8) -> Result<Self, EncodingError> {
        if !(MIN_WIDTH..=MAX_WIDTH).contains(&max_width) {
            return Err(EncodingError::MaxWidth(max_width));
        }

        let encoder = Encoder::new(1 << max_width)?;
        let packer = BitPacker::new(encoder.code_size());
        Ok(Self { encoder, packer })
    }

    /// Returns an iterator over the compressed bytes.
    pub fn encode<I>(self, data: I) -> Compress<I::IntoIter>
    where
        I: IntoIterator<Item = u8>,
    {
        let codepoints = self.encoder.into_codepoints(data);
        Compress {
            inner: self.packer.pack(codepoints),
        }
    }
}

impl Default for ByteEncoder {
    fn default() -> Self {
        let encoder = Encoder::default();
        let packer = BitPacker::new(encoder.code_size());
        Self { encoder, packer }
    }
}

/// Iterator over compressed bytes, see [compress].
pub struct Compress<I>
where
    I: Iterator<Item = u8>,
{
    inner: Packed<Codepoints<Encoder, I>>,
}

impl<I> Iterator for Compress<I>
where
    I: Iterator<Item = u8>,
{
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Decodes bytes produced by a [ByteEncoder].
/// Combines a [BitUnpacker] with a [Decoder].
pub struct ByteDecoder {
    decoder: Decoder,
    unpacker: BitUnpacker,
}

impl ByteDecoder {
    /// Creates a decoder for a single stream, made of one or more blocks.
    pub fn new() -> Self {
        let decoder = Decoder::new();
        let unpacker = BitUnpacker::new(decoder.code_size());
        Self { decoder, unpacker }
    }

    /// Returns an iterator over the decompressed bytes.
    ///
    /// Unlike [Decoder::decode], decoding does not stop at the first `END_OF_INFO_CODE`:
    /// the codebook is reset and the next block is decoded, until the data runs out.
    pub fn decode<I>(self, data: I) -> Decompress<I::IntoIter>
    where
        I: IntoIterator<Item = u8>,
    {
        Decompress {
            codepoints: self.unpacker.unpack(data),
            decoder: self.decoder,
            cursor: 0,
            failed: false,
        }
    }
}

impl Default for ByteDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over decompressed bytes, see [decompress].
pub struct Decompress<I>
where
    I: Iterator<Item = u8>,
{
    codepoints: Unpacked<I>,
    decoder: Decoder,
    cursor: usize,
    failed: bool,
}

impl<I> Iterator for Decompress<I>
where
    I: Iterator<Item = u8>,
{
    type Item = Result<u8, DecodingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            match self
                .decoder
                .next_byte(&mut self.codepoints, &mut self.cursor)
            {
                Ok(Pulled::Byte(byte)) => return Some(Ok(byte)),
                Ok(Pulled::EndOfInfo) => {
                    log::trace!("End of block, resetting the codebook");
                    self.decoder.reset();
                    self.cursor = 0;
                }
                Ok(Pulled::Exhausted) => return None,
                Err(error) => {
                    self.failed = true;
                    return Some(Err(error));
                }
            }
        }
    }
}
