//! Packs codepoints into variable width bit fields.
//!
//! The packer knows very little about LZW: it only reacts to `END_OF_INFO_CODE`, `BUMP_CODE` and
//! `CLEAR_CODE`. The width of the codepoints is never computed from the codebook, it starts at
//! 9 bits and grows by one after each `BUMP_CODE`.
//!
//! # Contract with the encoder
//!
//! This only works because the producer of the codepoints grows its codebook by exactly one entry
//! per non control codepoint, and emits a `BUMP_CODE` as soon as its codebook reaches
//! `2.pow(width)` entries. Any other growth rate makes the packer write codes too narrow, which
//! the unpacker would then read as garbage. The [crate::encoder::Encoder] follows this rule, and
//! the [crate::unpacker::BitUnpacker] mirrors the packer.

use std::fmt::Display;

use crate::{BUMP_CODE, CLEAR_CODE, END_OF_INFO_CODE, MAX_CODE, MIN_WIDTH};

/// Codepoints are `u16`, no width above this one is ever needed.
pub const MAX_CODEPOINT_WIDTH: u8 = 16;

/// The error type for packing operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackingError {
    /// A codepoint needing more bits than the current width: the producer of the codepoints
    /// did not send `BUMP_CODE` in time.
    CodepointTooWide { codepoint: u16, width: u8 },
}

impl Display for PackingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackingError::CodepointTooWide { codepoint, width } => f.write_fmt(format_args!(
                "Codepoint {codepoint} does not fit in {width} bits."
            )),
        }
    }
}

impl std::error::Error for PackingError {}

/// Translates a stream of codepoints into a stream of bytes, for the [crate::unpacker::BitUnpacker].
///
/// Codepoints are written most significant bit first.
pub struct BitPacker {
    initial_code_size: usize,
}

impl BitPacker {
    /// Takes the size of the codebook at the start of a block, so after a reset.
    pub fn new(initial_code_size: usize) -> Self {
        Self { initial_code_size }
    }

    /// Returns an iterator over the packed bytes.
    ///
    /// Each codepoint is written with the current width. `END_OF_INFO_CODE` is followed by
    /// padding up to the next byte boundary, and resets the width, like `CLEAR_CODE`.
    /// `BUMP_CODE` is still written with the old width, the following codepoints are one bit wider.
    ///
    /// # Errors
    ///
    /// A codepoint that does not fit in the current width means that the producer of the
    /// codepoints broke the contract described in the [module documentation](self). Packing
    /// stops there, without writing the pending bits, and the error is kept in
    /// [Packed::error].
    ///
    /// ```
    /// use lzw15::packer::BitPacker;
    ///
    /// let packer = BitPacker::new(258);
    /// let packed: Vec<u8> = packer.pack([1, 257]).collect();
    ///
    /// assert_eq!(packed, [0x00, 0xC0, 0x40]);
    /// ```
    pub fn pack<I>(&self, codepoints: I) -> Packed<I::IntoIter>
    where
        I: IntoIterator<Item = u16>,
    {
        Packed {
            codepoints: codepoints.into_iter(),
            initial_code_size: self.initial_code_size,
            code_size: self.initial_code_size,
            first_in_block: true,
            width: MIN_WIDTH,
            cursor: 0,
            byte_buffer: 0,
            finished: false,
            error: None,
        }
    }
}

/// Iterator over packed bytes, see [BitPacker::pack].
pub struct Packed<I> {
    codepoints: I,
    initial_code_size: usize,
    code_size: usize,
    first_in_block: bool,
    width: u8,
    cursor: u8,
    byte_buffer: u32,
    finished: bool,
    error: Option<PackingError>,
}

impl<I> Packed<I> {
    /// Width of the next codepoint.
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Size of the codebook of the consumer: the initial size, plus one for each data codepoint
    /// since the last reset, except the first one of the block. Control codes add nothing.
    ///
    /// [crate::unpacker::Unpacked::code_size] counts the same way.
    pub fn code_size(&self) -> usize {
        self.code_size
    }

    /// The error that stopped packing, if any.
    pub fn error(&self) -> Option<&PackingError> {
        self.error.as_ref()
    }

    /// Returns the error that stopped packing, if any.
    pub fn into_result(self) -> Result<(), PackingError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    #[inline]
    fn write(&mut self, data: u16) {
        let amount = self.width;
        debug_assert!((data as u32) >> amount == 0);

        // At most 7 pending bits plus 16 new ones, it always fits.
        let shift = 32 - amount - self.cursor;
        self.byte_buffer |= (data as u32) << shift;
        self.cursor += amount;
    }

    #[inline]
    fn fill(&mut self) {
        self.cursor = (self.cursor + 7) / 8 * 8;
    }

    #[inline]
    fn take_byte(&mut self) -> u8 {
        let byte = (self.byte_buffer >> 24) as u8;
        self.byte_buffer <<= 8;
        self.cursor = self.cursor.saturating_sub(8);
        byte
    }

    fn reset(&mut self) {
        self.width = MIN_WIDTH;
        self.code_size = self.initial_code_size;
        self.first_in_block = true;
    }

    fn track(&mut self, codepoint: u16) {
        match codepoint {
            END_OF_INFO_CODE => {
                self.fill();
                self.reset();
            }
            CLEAR_CODE => self.reset(),
            BUMP_CODE => {
                if self.width < MAX_CODEPOINT_WIDTH {
                    self.width += 1;
                } else {
                    log::warn!("Ignoring bump past {} bits", MAX_CODEPOINT_WIDTH);
                }
            }
            _ => {
                // The first word of a block does not add anything to the codebook.
                if self.first_in_block {
                    self.first_in_block = false;
                } else {
                    self.code_size += 1;
                    if self.code_size == MAX_CODE + 2 {
                        log::warn!(
                            "Codebook of the consumer past {} entries, check the encoder",
                            MAX_CODE + 1
                        );
                    }
                }
            }
        }
    }
}

impl<I> Iterator for Packed<I>
where
    I: Iterator<Item = u16>,
{
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        if self.error.is_some() {
            return None;
        }

        loop {
            if self.cursor >= 8 {
                return Some(self.take_byte());
            }
            if self.finished {
                return if self.cursor > 0 {
                    Some(self.take_byte())
                } else {
                    None
                };
            }

            match self.codepoints.next() {
                Some(codepoint) if (codepoint as u32) >> self.width != 0 => {
                    let error = PackingError::CodepointTooWide {
                        codepoint,
                        width: self.width,
                    };
                    log::error!("{error}");
                    self.error = Some(error);
                    return None;
                }
                Some(codepoint) => {
                    self.write(codepoint);
                    self.track(codepoint);
                }
                None => self.finished = true,
            }
        }
    }
}
