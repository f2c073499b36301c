//! Conversions between bytes, bits and unsigned integers.
//!
//! Bits are `bool`s, and are always ordered most significant first.

/// Iterator over the bits of a byte stream, see [bytes_to_bits].
#[derive(Debug, Clone)]
pub struct Bits<I> {
    bytes: I,
    byte: u8,
    remaining: u8,
}

impl<I> Iterator for Bits<I>
where
    I: Iterator<Item = u8>,
{
    type Item = bool;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            self.byte = self.bytes.next()?;
            self.remaining = 8;
        }

        self.remaining -= 1;
        Some((self.byte >> self.remaining) & 1 == 1)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lower, upper) = self.bytes.size_hint();
        let remaining = self.remaining as usize;
        (
            lower.saturating_mul(8).saturating_add(remaining),
            upper.and_then(|upper| upper.checked_mul(8)?.checked_add(remaining)),
        )
    }
}

/// Breaks bytes into bits, 8 per byte, most significant bit first.
///
/// The iterator is lazy, so it is fine to use on an endless source.
///
/// ```
/// use lzw15::bits::bytes_to_bits;
///
/// let bits: Vec<u8> = bytes_to_bits([0x01, 0x30]).map(u8::from).collect();
/// assert_eq!(bits, [0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0, 0, 0]);
/// ```
pub fn bytes_to_bits<I>(bytes: I) -> Bits<I::IntoIter>
where
    I: IntoIterator<Item = u8>,
{
    Bits {
        bytes: bytes.into_iter(),
        byte: 0,
        remaining: 0,
    }
}

/// Interprets bits as an unsigned integer, most significant bit first.
///
/// An empty sequence is 0. Only the last 32 bits are significant.
pub fn bits_to_int<I>(bits: I) -> u32
where
    I: IntoIterator<Item = bool>,
{
    bits.into_iter()
        .fold(0, |value, bit| (value << 1) | u32::from(bit))
}

/// Iterator over the bits of an integer, see [int_to_bits].
#[derive(Debug, Clone)]
pub struct IntBits {
    value: u32,
    remaining: u8,
}

impl Iterator for IntBits {
    type Item = bool;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        self.remaining -= 1;
        let bit = self
            .value
            .checked_shr(self.remaining as u32)
            .map_or(false, |shifted| shifted & 1 == 1);
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for IntBits {}

/// Produces `width` bits representing `value`, most significant bit first, padded with zeros
/// on the left.
///
/// The value is never truncated: if it needs more than `width` bits, all of its significant bits
/// are produced. Callers are expected to pick a wide enough `width`.
///
/// ```
/// use lzw15::bits::int_to_bits;
///
/// let bits: Vec<u8> = int_to_bits(304, 16).map(u8::from).collect();
/// assert_eq!(bits, [0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0, 0, 0]);
/// ```
pub fn int_to_bits(value: u32, width: u8) -> IntBits {
    let significant = (u32::BITS - value.leading_zeros()) as u8;
    IntBits {
        value,
        remaining: width.max(significant),
    }
}

/// Iterator over the bytes packed from bits, see [bits_to_bytes].
#[derive(Debug, Clone)]
pub struct BitBytes<I> {
    bits: I,
}

impl<I> Iterator for BitBytes<I>
where
    I: Iterator<Item = bool>,
{
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        let mut byte = u8::from(self.bits.next()?) << 7;
        for shift in (0..7).rev() {
            match self.bits.next() {
                Some(bit) => byte |= u8::from(bit) << shift,
                None => break,
            }
        }
        Some(byte)
    }
}

/// Packs bits into bytes, most significant bit first.
///
/// If the number of bits is not a multiple of 8, the low bits of the last byte are zeros. Note
/// that `bytes_to_bits(bits_to_bytes(bits))` will then be longer than `bits`.
///
/// ```
/// use lzw15::bits::bits_to_bytes;
///
/// let bits = [false, false, false, false, false, false, false, false, true];
/// let bytes: Vec<u8> = bits_to_bytes(bits).collect();
/// assert_eq!(bytes, [0x00, 0x80]);
/// ```
pub fn bits_to_bytes<I>(bits: I) -> BitBytes<I::IntoIter>
where
    I: IntoIterator<Item = bool>,
{
    BitBytes {
        bits: bits.into_iter(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(values: &[u8]) -> Vec<bool> {
        values.iter().map(|&value| value == 1).collect()
    }

    #[test]
    fn bytes_to_bits_msb_first() {
        let output: Vec<bool> = bytes_to_bits([0x01, 0x30]).collect();

        assert_eq!(
            output,
            bits(&[0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0, 0, 0])
        );
    }

    #[test]
    fn bytes_to_bits_is_lazy() {
        let output: Vec<bool> = bytes_to_bits(std::iter::repeat(0xA5)).take(12).collect();

        assert_eq!(output, bits(&[1, 0, 1, 0, 0, 1, 0, 1, 1, 0, 1, 0]));
    }

    #[test]
    fn bytes_to_bits_empty() {
        assert_eq!(bytes_to_bits(std::iter::empty()).count(), 0);
    }

    #[test]
    fn bits_to_int_304() {
        assert_eq!(bits_to_int(bits(&[1, 0, 0, 1, 1, 0, 0, 0, 0])), 304);
    }

    #[test]
    fn bits_to_int_empty_is_zero() {
        assert_eq!(bits_to_int(std::iter::empty()), 0);
    }

    #[test]
    fn int_to_bits_pads_left() {
        let output: Vec<bool> = int_to_bits(304, 16).collect();

        assert_eq!(
            output,
            bits(&[0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0, 0, 0])
        );
    }

    #[test]
    fn int_to_bits_does_not_truncate() {
        let output: Vec<bool> = int_to_bits(304, 4).collect();

        assert_eq!(output, bits(&[1, 0, 0, 1, 1, 0, 0, 0, 0]));
    }

    #[test]
    fn int_to_bits_zero() {
        assert_eq!(int_to_bits(0, 0).count(), 0);
        assert_eq!(int_to_bits(0, 9).len(), 9);
    }

    #[test]
    fn int_to_bits_wider_than_u32() {
        let output: Vec<bool> = int_to_bits(1, 40).collect();

        assert_eq!(output.len(), 40);
        assert!(output[..39].iter().all(|&bit| !bit));
        assert!(output[39]);
    }

    #[test]
    fn bits_to_bytes_pads_last_byte() {
        let output: Vec<u8> = bits_to_bytes(bits(&[0, 0, 0, 0, 0, 0, 0, 0, 1])).collect();

        assert_eq!(output, [0x00, 0x80]);
    }

    #[test]
    fn bits_to_bytes_whole_bytes() {
        let output: Vec<u8> =
            bits_to_bytes(bits(&[0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0, 0, 0])).collect();

        assert_eq!(output, [0x01, 0x30]);
    }

    #[test]
    fn codepoint_through_bits() {
        let packed: Vec<u8> = bits_to_bytes(int_to_bits(257, 9)).collect();
        let unpacked = bits_to_int(bytes_to_bits(packed).take(9));

        assert_eq!(unpacked, 257);
    }
}
