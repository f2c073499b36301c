//! Contains the codepoint decoder, the decompressing half of LZW.

use std::fmt::Display;

use crate::{BUMP_CODE, CLEAR_CODE, END_OF_INFO_CODE, FIRST_CODE, MAX_CODE};

/// The error type for decoding operations.
#[derive(Debug)]
pub enum DecodingError {
    /// `END_OF_INFO_CODE` was given to [Decoder::decode_codepoint]. It ends a block, and should be
    /// handled by whoever reads the codepoint stream.
    EndOfInfo,
    /// A code that is neither in the codebook nor the next one to be added.
    UnexpectedCode { code: u16, next_code: usize },
    /// The codebook grew past its hard ceiling without being reset.
    TableOverflow(usize),
}

impl Display for DecodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodingError::EndOfInfo => {
                f.write_str("End of information code not supported directly by the decoder.")
            }
            DecodingError::UnexpectedCode { code, next_code } => f.write_fmt(format_args!(
                "Unexpected code {code}, the next code in the codebook is {next_code}."
            )),
            DecodingError::TableOverflow(size) => f.write_fmt(format_args!(
                "Codebook overflow, {size} entries without a reset."
            )),
        }
    }
}

impl std::error::Error for DecodingError {}

impl From<DecodingError> for std::io::Error {
    fn from(error: DecodingError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, error)
    }
}

#[derive(Debug, Clone)]
enum Depth {
    Root,
    Child { depth: u16, parent: u16 },
}

impl Depth {
    fn get_depth(&self) -> u16 {
        match self {
            Depth::Root => 0,
            Depth::Child { depth, parent: _ } => *depth,
        }
    }

    fn get_parent(&self) -> Option<u16> {
        match self {
            Depth::Root => None,
            Depth::Child { depth: _, parent } => Some(*parent),
        }
    }
}

struct TreeNode {
    k: u8,
    root: u8,
    depth: Depth,
}

impl TreeNode {
    fn root(k: u8) -> Self {
        Self {
            k,
            root: k,
            depth: Depth::Root,
        }
    }
}

/// The codebook, each word pointing to its prefix.
///
/// Words are rebuilt by walking up to the root, so nothing but the last byte is stored per entry.
struct Tree {
    nodes: Vec<TreeNode>,
}

impl Tree {
    fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(MAX_CODE + 1),
        };
        tree.clear();
        tree
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.extend((0..=u8::MAX).map(TreeNode::root));
        // Control codes, never written out.
        self.nodes
            .extend((END_OF_INFO_CODE..FIRST_CODE).map(|_| TreeNode::root(0)));
    }

    fn write_word(&self, word: u16, buffer: &mut Vec<u8>) {
        let depth = self.nodes[word as usize].depth.get_depth() as usize;
        buffer.clear();
        buffer.resize(depth + 1, 0);

        let mut next_word = Some(word);
        let mut index = depth;
        while let Some(word) = next_word {
            let node = &self.nodes[word as usize];
            buffer[index] = node.k;
            next_word = node.depth.get_parent();
            index = index.saturating_sub(1);
        }
    }

    fn add(&mut self, prefix: u16, k: u8) -> Result<u16, DecodingError> {
        if self.nodes.len() > MAX_CODE {
            return Err(DecodingError::TableOverflow(self.nodes.len()));
        }

        let new_index = self.nodes.len() as u16;
        let parent_node = &self.nodes[prefix as usize];
        let root = parent_node.root;
        let depth = Depth::Child {
            depth: parent_node.depth.get_depth() + 1,
            parent: prefix,
        };

        self.nodes.push(TreeNode { k, root, depth });
        Ok(new_index)
    }

    fn root_for(&self, prefix: u16) -> u8 {
        self.nodes[prefix as usize].root
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Turns LZW codepoints back into bytes.
///
/// The codebook is rebuilt in lockstep with the one of the [crate::encoder::Encoder]: every
/// codepoint after the first one of a block adds the previous word plus the first byte of the
/// current one. Decoders keep their state from call to call, so each stream needs its own.
pub struct Decoder {
    tree: Tree,
    prefix: Option<u16>,
    buffer: Vec<u8>,
}

/// What [Decoder::next_byte] found.
pub(crate) enum Pulled {
    Byte(u8),
    EndOfInfo,
    Exhausted,
}

impl Decoder {
    /// Creates a decoder with a fresh codebook, expecting the start of a block.
    pub fn new() -> Self {
        Self {
            tree: Tree::new(),
            prefix: None,
            buffer: Vec::with_capacity(4096),
        }
    }

    /// Current size of the codebook, control codes included.
    pub fn code_size(&self) -> usize {
        self.tree.len()
    }

    /// Resets the codebook, as if a `CLEAR_CODE` was read.
    pub fn reset(&mut self) {
        self.tree.clear();
        self.prefix = None;
        self.buffer.clear();
    }

    /// The bytes of the last decoded word.
    pub fn output(&self) -> &[u8] {
        &self.buffer[..]
    }

    /// Returns an iterator over the bytes of `codepoints`.
    ///
    /// `BUMP_CODE` is skipped, since widths are a concern of the bit unpacking.
    /// The iterator ends at the first `END_OF_INFO_CODE`, leaving whatever follows in the source.
    ///
    /// ```
    /// use lzw15::decoder::{Decoder, DecodingError};
    ///
    /// fn main() -> Result<(), DecodingError> {
    ///     let codepoints = [103, 97, 98, 98, 97, 32, 259, 261, 263, 121, 111, 264, 260, 262, 256];
    ///
    ///     let mut decoder = Decoder::new();
    ///     let decoded: Vec<u8> = decoder.decode(codepoints).collect::<Result<_, _>>()?;
    ///
    ///     assert_eq!(decoded, b"gabba gabba yo gabba");
    ///     Ok(())
    /// }
    /// ```
    pub fn decode<I>(&mut self, codepoints: I) -> Decode<'_, I::IntoIter>
    where
        I: IntoIterator<Item = u16>,
    {
        let cursor = self.buffer.len();
        Decode {
            decoder: self,
            codepoints: codepoints.into_iter(),
            cursor,
            done: false,
        }
    }

    /// Returns the byte at `cursor` in the last decoded word, or decodes the next codepoints
    /// until there is one. `BUMP_CODE` is skipped, and `END_OF_INFO_CODE` is left to the caller.
    pub(crate) fn next_byte<I>(
        &mut self,
        codepoints: &mut I,
        cursor: &mut usize,
    ) -> Result<Pulled, DecodingError>
    where
        I: Iterator<Item = u16>,
    {
        loop {
            if let Some(&byte) = self.buffer.get(*cursor) {
                *cursor += 1;
                return Ok(Pulled::Byte(byte));
            }

            match codepoints.next() {
                None => return Ok(Pulled::Exhausted),
                Some(END_OF_INFO_CODE) => return Ok(Pulled::EndOfInfo),
                Some(BUMP_CODE) => {}
                Some(codepoint) => {
                    self.decode_codepoint(codepoint)?;
                    *cursor = 0;
                }
            }
        }
    }

    /// Decodes a single codepoint, updating the codebook, and returns its bytes.
    ///
    /// `CLEAR_CODE` resets the codebook and `BUMP_CODE` is ignored, both return no bytes.
    ///
    /// # Errors
    ///
    /// `END_OF_INFO_CODE` is refused with [DecodingError::EndOfInfo]. Codes that do not fit the
    /// codebook fail with [DecodingError::UnexpectedCode].
    pub fn decode_codepoint(&mut self, codepoint: u16) -> Result<&[u8], DecodingError> {
        match codepoint {
            END_OF_INFO_CODE => Err(DecodingError::EndOfInfo),
            CLEAR_CODE => {
                self.reset();
                Ok(&self.buffer[..])
            }
            BUMP_CODE => Ok(&[]),
            code if (code as usize) < self.tree.len() => {
                self.tree.write_word(code, &mut self.buffer);
                if let Some(prefix) = self.prefix {
                    self.tree.add(prefix, self.buffer[0])?;
                }
                self.prefix = Some(code);
                Ok(&self.buffer[..])
            }
            code => match self.prefix {
                // The encoder used the word it was just defining: it can only be the previous
                // word followed by its own first byte.
                Some(prefix) if code as usize == self.tree.len() => {
                    let first_k = self.tree.root_for(prefix);
                    self.tree.write_word(prefix, &mut self.buffer);
                    self.buffer.push(first_k);
                    self.tree.add(prefix, first_k)?;
                    self.prefix = Some(code);
                    Ok(&self.buffer[..])
                }
                _ => Err(DecodingError::UnexpectedCode {
                    code,
                    next_code: self.tree.len(),
                }),
            },
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over decoded bytes, see [Decoder::decode].
pub struct Decode<'a, I> {
    decoder: &'a mut Decoder,
    codepoints: I,
    cursor: usize,
    done: bool,
}

impl<'a, I> Iterator for Decode<'a, I>
where
    I: Iterator<Item = u16>,
{
    type Item = Result<u8, DecodingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self
            .decoder
            .next_byte(&mut self.codepoints, &mut self.cursor)
        {
            Ok(Pulled::Byte(byte)) => Some(Ok(byte)),
            Ok(Pulled::EndOfInfo | Pulled::Exhausted) => {
                self.done = true;
                None
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}
