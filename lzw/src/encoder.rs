//! Contains the codepoint encoder, the compressing half of LZW.

use std::{
    borrow::{Borrow, BorrowMut},
    collections::VecDeque,
    fmt::Display,
};

use crate::{
    BUMP_CODE, END_OF_INFO_CODE, FIRST_CODE, MAX_CODE, MAX_WIDTH, MIN_WIDTH, NEXT_BUMP_CODE,
};

/// The error type for encoding operations.
///
/// Encoding itself never fails, only configuration can be wrong.
#[derive(Debug)]
pub enum EncodingError {
    /// Maximum codebook size out of bounds. It should be between 259 and 32768 included.
    MaxCodeSize(usize),
    /// Maximum code width out of bounds. It should be between 9 and 15 included.
    MaxWidth(u8),
}

impl Display for EncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingError::MaxCodeSize(max_code_size) => f.write_fmt(format_args!(
                "Max code size must be between {} and {}, was {max_code_size}.",
                FIRST_CODE, MAX_CODE
            )),
            EncodingError::MaxWidth(max_width) => f.write_fmt(format_args!(
                "Max width must be between {} and {}, was {max_width}.",
                MIN_WIDTH, MAX_WIDTH
            )),
        }
    }
}

impl std::error::Error for EncodingError {}

/// Most nodes of the codebook have zero or one child, so we only allocate a full table of
/// children once a node gets a second one.
#[derive(Debug, Clone)]
enum Node {
    NoChild,
    OneChild(u8, u16),
    ManyChildren(Vec<u16>),
}

/// The codebook, as a trie: each string is its prefix code plus one byte.
///
/// Codes 256 to 258 are the control codes, they are never the prefix of anything.
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(MAX_CODE + 1),
        };
        tree.reset();
        tree
    }

    #[inline(always)]
    fn reset(&mut self) {
        self.nodes.clear();
        self.nodes.resize(FIRST_CODE as usize, Node::NoChild);
    }

    #[inline(always)]
    fn find_word(&self, prefix_index: u16, next_char: u8) -> Option<u16> {
        match &self.nodes[prefix_index as usize] {
            Node::NoChild => None,
            &Node::OneChild(child_char, child_index) => {
                if child_char == next_char {
                    Some(child_index)
                } else {
                    None
                }
            }
            Node::ManyChildren(child_indices) => {
                let child_index = child_indices[next_char as usize];
                if child_index > 0 {
                    Some(child_index)
                } else {
                    None
                }
            }
        }
    }

    #[inline(always)]
    fn add(&mut self, prefix_index: u16, k: u8) -> u16 {
        debug_assert!(self.nodes.len() <= u16::MAX as usize);
        let new_index = self.nodes.len() as u16;
        let prefix_index = prefix_index as usize;

        match &mut self.nodes[prefix_index] {
            Node::NoChild => {
                self.nodes[prefix_index] = Node::OneChild(k, new_index);
            }
            &mut Node::OneChild(other_k, other_index) => {
                let mut children = vec![0; 256];
                children[other_k as usize] = other_index;
                children[k as usize] = new_index;
                self.nodes[prefix_index] = Node::ManyChildren(children);
            }
            Node::ManyChildren(children) => {
                children[k as usize] = new_index;
            }
        };
        self.nodes.push(Node::NoChild);
        new_index
    }

    #[inline(always)]
    fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Turns bytes into LZW codepoints.
///
/// The codebook grows by one entry for each codepoint emitted. When it grows past
/// the maximum code size, the encoder flushes: it emits its pending code, an `END_OF_INFO_CODE`,
/// and starts over with a fresh codebook. When it grows past `2.pow(width) - 1` entries,
/// a `BUMP_CODE` tells the consumer that the following codes are one bit wider.
///
/// Every stream ends with a flush, so it is always terminated by `END_OF_INFO_CODE`.
pub struct Encoder {
    tree: Tree,
    max_code_size: usize,
    prefix: Option<u16>,
    next_bump_code: usize,
    code_width: u8,
}

impl Encoder {
    /// Creates an encoder that will flush its codebook once it gets bigger than `max_code_size`.
    ///
    /// # Errors
    ///
    /// `max_code_size` must be between [FIRST_CODE], the size of the initial codebook,
    /// and [MAX_CODE].
    pub fn new(max_code_size: usize) -> Result<Self, EncodingError> {
        if !(FIRST_CODE as usize..=MAX_CODE).contains(&max_code_size) {
            return Err(EncodingError::MaxCodeSize(max_code_size));
        }

        Ok(Self {
            tree: Tree::new(),
            max_code_size,
            prefix: None,
            next_bump_code: NEXT_BUMP_CODE,
            code_width: MIN_WIDTH,
        })
    }

    /// The count of known codes, including the ones implicit in the data that were not
    /// emitted yet.
    pub fn code_size(&self) -> usize {
        self.tree.len()
    }

    /// The width the consumer is expected to use for the next codes.
    pub fn code_width(&self) -> u8 {
        self.code_width
    }

    /// Returns an iterator over the codepoints of `data`, borrowing the encoder.
    ///
    /// ```
    /// use lzw15::encoder::Encoder;
    ///
    /// let mut encoder = Encoder::default();
    /// let codepoints: Vec<u16> = encoder.encode(b"gabba gabba yo gabba".iter().copied()).collect();
    ///
    /// assert_eq!(
    ///     codepoints,
    ///     [103, 97, 98, 98, 97, 32, 259, 261, 263, 121, 111, 264, 260, 262, 256]
    /// );
    /// ```
    pub fn encode<I>(&mut self, data: I) -> Codepoints<&mut Encoder, I::IntoIter>
    where
        I: IntoIterator<Item = u8>,
    {
        Codepoints::new(self, data.into_iter())
    }

    /// Same as [Encoder::encode], but the iterator owns the encoder.
    pub fn into_codepoints<I>(self, data: I) -> Codepoints<Encoder, I::IntoIter>
    where
        I: IntoIterator<Item = u8>,
    {
        Codepoints::new(self, data.into_iter())
    }

    fn encode_byte(&mut self, k: u8, codepoints: &mut VecDeque<u16>) {
        match self.prefix {
            None => self.prefix = Some(k as u16),
            Some(prefix) => {
                if let Some(word) = self.tree.find_word(prefix, k) {
                    self.prefix = Some(word);
                } else {
                    codepoints.push_back(prefix);
                    self.tree.add(prefix, k);
                    self.prefix = Some(k as u16);
                }
            }
        }

        // The flush resets the bump threshold, so it goes first.
        if self.code_size() > self.max_code_size {
            log::debug!("Codebook full at {} entries, flushing", self.code_size());
            self.flush(codepoints);
        }
        if self.code_size() > self.next_bump_code {
            self.bump(codepoints);
        }
    }

    fn flush(&mut self, codepoints: &mut VecDeque<u16>) {
        if let Some(prefix) = self.prefix.take() {
            codepoints.push_back(prefix);
        }
        codepoints.push_back(END_OF_INFO_CODE);
        self.reset();
    }

    fn bump(&mut self, codepoints: &mut VecDeque<u16>) {
        codepoints.push_back(BUMP_CODE);
        self.code_width += 1;
        self.next_bump_code = (self.next_bump_code << 1) | 1;
        log::debug!("Bumping code width to {}", self.code_width);
    }

    fn reset(&mut self) {
        log::trace!("Resetting the codebook");
        self.tree.reset();
        self.prefix = None;
        self.next_bump_code = NEXT_BUMP_CODE;
        self.code_width = MIN_WIDTH;
    }
}

impl Default for Encoder {
    /// An encoder with a codebook capped at [MAX_CODE] entries.
    fn default() -> Self {
        Self {
            tree: Tree::new(),
            max_code_size: MAX_CODE,
            prefix: None,
            next_bump_code: NEXT_BUMP_CODE,
            code_width: MIN_WIDTH,
        }
    }
}

/// Iterator over codepoints, see [Encoder::encode].
///
/// A single byte can produce up to four codepoints: the code of the previous string,
/// the flushed pending code, `END_OF_INFO_CODE` and `BUMP_CODE`.
pub struct Codepoints<E, I> {
    encoder: E,
    data: I,
    pending: VecDeque<u16>,
    finished: bool,
}

impl<E, I> Codepoints<E, I>
where
    E: BorrowMut<Encoder>,
{
    fn new(encoder: E, data: I) -> Self {
        Self {
            encoder,
            data,
            pending: VecDeque::with_capacity(4),
            finished: false,
        }
    }

    /// Size of the codebook after the bytes read so far.
    pub fn code_size(&self) -> usize {
        self.encoder.borrow().code_size()
    }
}

impl<E, I> Iterator for Codepoints<E, I>
where
    E: BorrowMut<Encoder>,
    I: Iterator<Item = u8>,
{
    type Item = u16;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(codepoint) = self.pending.pop_front() {
                return Some(codepoint);
            }
            if self.finished {
                return None;
            }

            let encoder = self.encoder.borrow_mut();
            match self.data.next() {
                Some(k) => encoder.encode_byte(k, &mut self.pending),
                None => {
                    encoder.flush(&mut self.pending);
                    self.finished = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(data: &[u8], max_code_size: usize) -> Vec<u16> {
        Encoder::new(max_code_size)
            .unwrap()
            .into_codepoints(data.iter().copied())
            .collect()
    }

    #[test]
    fn encode_gabba() {
        let codepoints = encode(b"gabba gabba yo gabba", MAX_CODE);

        assert_eq!(
            codepoints,
            [103, 97, 98, 98, 97, 32, 259, 261, 263, 121, 111, 264, 260, 262, 256]
        );
    }

    #[test]
    fn encode_tobeornot() {
        let codepoints = encode(b"TOBEORNOTTOBEORTOBEORNOT", MAX_CODE);

        assert_eq!(
            codepoints,
            [84, 79, 66, 69, 79, 82, 78, 79, 84, 259, 261, 263, 268, 262, 264, 266, 256]
        );
    }

    #[test]
    fn encode_repeated_byte() {
        let codepoints = encode(b"aaaaaaa", MAX_CODE);

        assert_eq!(codepoints, [97, 259, 260, 97, 256]);
    }

    #[test]
    fn encode_empty() {
        assert_eq!(encode(&[], MAX_CODE), [END_OF_INFO_CODE]);
    }

    #[test]
    fn encode_multiple_with_same_encoder() {
        let data = b"gabba gabba yo gabba";
        let mut encoder = Encoder::default();

        let first: Vec<u16> = encoder.encode(data.iter().copied()).collect();
        let second: Vec<u16> = encoder.encode(data.iter().copied()).collect();

        assert_eq!(first, second);
        assert_eq!(encoder.code_size(), FIRST_CODE as usize);
    }

    #[test]
    fn max_code_size_too_small() {
        let result = Encoder::new(258).err().unwrap();
        let expected = EncodingError::MaxCodeSize(258);

        assert_eq!(expected.to_string(), result.to_string());
    }

    #[test]
    fn max_code_size_too_big() {
        assert!(Encoder::new(MAX_CODE + 1).is_err());
        assert!(Encoder::new(MAX_CODE).is_ok());
        assert!(Encoder::new(FIRST_CODE as usize).is_ok());
    }

    #[test]
    fn codebook_grows_at_most_one_entry_per_byte() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i * 7 % 13 + i / 100) as u8).collect();
        let mut encoder = Encoder::default();
        let mut codepoints = VecDeque::new();

        let mut previous = encoder.code_size();
        for &k in &data {
            encoder.encode_byte(k, &mut codepoints);
            let size = encoder.code_size();

            assert!(size >= previous);
            assert!(size <= previous + 1);
            previous = size;
        }
    }

    #[test]
    fn overflow_flushes_once() {
        let data: Vec<u8> = (0..61).collect();
        let mut encoder = Encoder::new(300).unwrap();
        let mut codepoints = encoder.encode(data.iter().copied());

        let mut seen = vec![];
        let mut size_after_flush = None;
        while let Some(codepoint) = codepoints.next() {
            if codepoint == END_OF_INFO_CODE && size_after_flush.is_none() {
                size_after_flush = Some(codepoints.code_size());
            }
            seen.push(codepoint);
        }

        let end_of_infos: Vec<usize> = seen
            .iter()
            .enumerate()
            .filter(|(_, &codepoint)| codepoint == END_OF_INFO_CODE)
            .map(|(index, _)| index)
            .collect();

        assert_eq!(end_of_infos, [43, 62]);
        assert_eq!(size_after_flush, Some(FIRST_CODE as usize));
        assert_eq!(&seen[40..46], [40, 41, 42, 256, 43, 44]);
    }

    #[test]
    fn bump_when_codebook_reaches_512() {
        let data: Vec<u8> = (0..=255).chain(0..=255).collect();
        let codepoints = encode(&data, MAX_CODE);

        let bump = codepoints
            .iter()
            .position(|&codepoint| codepoint == BUMP_CODE)
            .unwrap();

        // The first pass adds 255 strings, enough to go past 511 entries but not 1023.
        assert!(codepoints[..bump].iter().all(|&codepoint| codepoint < 511));
        assert_eq!(codepoints.iter().filter(|&&c| c == BUMP_CODE).count(), 1);
    }

    #[test]
    fn code_width_follows_bumps() {
        let data: Vec<u8> = (0..=255).chain(0..=255).collect();
        let mut encoder = Encoder::default();
        let mut codepoints = encoder.encode(data.iter().copied());

        for codepoint in codepoints.by_ref() {
            if codepoint == BUMP_CODE {
                break;
            }
        }
        drop(codepoints);

        assert_eq!(encoder.code_width(), MIN_WIDTH + 1);
    }
}
