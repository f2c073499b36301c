//! Reads codepoints back from variable width bit fields, the mirror of [crate::packer].

use crate::{
    bits::{bytes_to_bits, Bits},
    packer::MAX_CODEPOINT_WIDTH,
    BUMP_CODE, CLEAR_CODE, END_OF_INFO_CODE, MIN_WIDTH,
};

/// An adaptive width bit unpacker, decoding streams written by the [crate::packer::BitPacker].
pub struct BitUnpacker {
    initial_code_size: usize,
}

impl BitUnpacker {
    /// Takes the size of the codebook at the start of a block, so after a reset.
    pub fn new(initial_code_size: usize) -> Self {
        Self { initial_code_size }
    }

    /// Returns an iterator over the codepoints packed in `data`.
    ///
    /// Codepoints start 9 bits wide and get one bit wider after each `BUMP_CODE`. After an
    /// `END_OF_INFO_CODE`, the rest of the current byte is skipped and the width goes back to 9 bits,
    /// but the iterator goes on: stopping there is up to the consumer.
    /// Trailing bits that do not make a whole codepoint are dropped.
    ///
    /// ```
    /// use lzw15::unpacker::BitUnpacker;
    ///
    /// let unpacker = BitUnpacker::new(258);
    /// let codepoints: Vec<u16> = unpacker.unpack([0x00, 0xC0, 0x40]).collect();
    ///
    /// assert_eq!(codepoints, [1, 257]);
    /// ```
    pub fn unpack<I>(&self, data: I) -> Unpacked<I::IntoIter>
    where
        I: IntoIterator<Item = u8>,
    {
        Unpacked {
            bits: bytes_to_bits(data),
            initial_code_size: self.initial_code_size,
            code_size: self.initial_code_size,
            first_in_block: true,
            width: MIN_WIDTH,
            offset: 0,
            ignore: 0,
        }
    }
}

/// Iterator over unpacked codepoints, see [BitUnpacker::unpack].
pub struct Unpacked<I> {
    bits: Bits<I>,
    initial_code_size: usize,
    code_size: usize,
    first_in_block: bool,
    width: u8,
    offset: u8,
    ignore: u8,
}

impl<I> Unpacked<I> {
    /// Width of the next codepoint.
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Size of the codebook of the consumer, counted like [crate::packer::Packed::code_size]:
    /// one entry per data codepoint since the last reset, except the first one of the block.
    pub fn code_size(&self) -> usize {
        self.code_size
    }

    fn reset(&mut self) {
        self.width = MIN_WIDTH;
        self.code_size = self.initial_code_size;
        self.first_in_block = true;
    }
}

impl<I> Unpacked<I>
where
    I: Iterator<Item = u8>,
{
    #[inline]
    fn next_bit(&mut self) -> Option<bool> {
        let bit = self.bits.next()?;
        self.offset = (self.offset + 1) % 8;
        Some(bit)
    }
}

impl<I> Iterator for Unpacked<I>
where
    I: Iterator<Item = u8>,
{
    type Item = u16;

    fn next(&mut self) -> Option<Self::Item> {
        while self.ignore > 0 {
            self.next_bit()?;
            self.ignore -= 1;
        }

        let mut codepoint = 0u16;
        for _ in 0..self.width {
            codepoint = (codepoint << 1) | u16::from(self.next_bit()?);
        }

        match codepoint {
            BUMP_CODE => {
                if self.width < MAX_CODEPOINT_WIDTH {
                    self.width += 1;
                } else {
                    log::warn!("Ignoring bump past {} bits", MAX_CODEPOINT_WIDTH);
                }
            }
            END_OF_INFO_CODE => {
                self.ignore = (8 - self.offset) % 8;
                self.reset();
            }
            CLEAR_CODE => self.reset(),
            _ => {
                if self.first_in_block {
                    self.first_in_block = false;
                } else {
                    self.code_size += 1;
                }
            }
        }

        Some(codepoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{packer::BitPacker, FIRST_CODE};

    fn unpack(data: &[u8]) -> Vec<u16> {
        BitUnpacker::new(FIRST_CODE as usize)
            .unpack(data.iter().copied())
            .collect()
    }

    #[test]
    fn unpack_with_bump() {
        let codepoints: Vec<u16> = BitUnpacker::new(258).unpack([0x00, 0xC0, 0x40]).collect();

        assert_eq!(codepoints, [1, 257]);
    }

    #[test]
    fn unpack_end_of_info_alone() {
        assert_eq!(unpack(&[0x80, 0x00]), [END_OF_INFO_CODE]);
    }

    #[test]
    fn unpack_does_not_stop_at_end_of_info() {
        let codepoints = unpack(&[0x30, 0xC0, 0x00, 0x30, 0xC0, 0x00]);

        assert_eq!(
            codepoints,
            [0x61, END_OF_INFO_CODE, 0x61, END_OF_INFO_CODE]
        );
    }

    #[test]
    fn unpack_nothing() {
        assert!(unpack(&[]).is_empty());
    }

    #[test]
    fn trailing_bits_are_dropped() {
        // A single byte is not enough for a 9 bits codepoint.
        assert!(unpack(&[0xFF]).is_empty());
    }

    #[test]
    fn end_of_info_resets_width() {
        let codepoints = unpack(&[0x80, 0xA0, 0x00, 0xFF, 0x80]);

        assert_eq!(codepoints, [BUMP_CODE, END_OF_INFO_CODE, 0x1FF]);
    }

    #[test]
    fn width_follows_packer() {
        let codepoints = [97, 98, BUMP_CODE, 600, BUMP_CODE, 1500, END_OF_INFO_CODE, 99];
        let packed: Vec<u8> = BitPacker::new(FIRST_CODE as usize)
            .pack(codepoints)
            .collect();

        let mut unpacked = BitUnpacker::new(FIRST_CODE as usize).unpack(packed);
        let mut widths = vec![];
        let mut output = vec![];
        while let Some(codepoint) = unpacked.next() {
            output.push(codepoint);
            widths.push(unpacked.width());
        }

        assert_eq!(output, codepoints);
        assert_eq!(widths, [9, 9, 10, 10, 11, 11, 9, 9]);
    }

    #[test]
    fn code_size_counts_data_codepoints() {
        let codepoints = [97, 98, BUMP_CODE, 99, END_OF_INFO_CODE];
        let packed: Vec<u8> = BitPacker::new(FIRST_CODE as usize)
            .pack(codepoints)
            .collect();

        let mut unpacked = BitUnpacker::new(FIRST_CODE as usize).unpack(packed);
        let mut sizes = vec![];
        while unpacked.next().is_some() {
            sizes.push(unpacked.code_size());
        }

        assert_eq!(sizes, [259, 260, 260, 261, 259]);
    }

    #[test]
    fn code_size_matches_packer() {
        let codepoints = [97, 98, 99, BUMP_CODE, 100, CLEAR_CODE, 101, 102];
        let mut packed = BitPacker::new(FIRST_CODE as usize).pack(codepoints);
        let bytes: Vec<u8> = packed.by_ref().collect();

        let mut unpacked = BitUnpacker::new(FIRST_CODE as usize).unpack(bytes);
        for _ in 0..codepoints.len() {
            unpacked.next();
        }

        assert_eq!(unpacked.code_size(), packed.code_size());
    }

    #[test]
    fn clear_resets_width() {
        let codepoints = [97, 98, BUMP_CODE, 600, CLEAR_CODE, 98, 97, 259, END_OF_INFO_CODE];
        let packed: Vec<u8> = BitPacker::new(FIRST_CODE as usize)
            .pack(codepoints)
            .collect();

        let mut unpacked = BitUnpacker::new(FIRST_CODE as usize).unpack(packed);
        let mut widths = vec![];
        let mut output = vec![];
        while let Some(codepoint) = unpacked.next() {
            output.push(codepoint);
            widths.push(unpacked.width());
        }

        assert_eq!(output, codepoints);
        assert_eq!(widths, [9, 9, 10, 10, 9, 9, 9, 9, 9]);
    }

    #[test]
    fn clear_does_not_realign() {
        // Same layout as the packer: 257, then 97 and 258 in 10 bits, then 98 in 9 bits.
        let codepoints = unpack(&[0x80, 0x8C, 0x28, 0x11, 0x88]);

        assert_eq!(codepoints, [BUMP_CODE, 97, CLEAR_CODE, 98]);
    }
}
