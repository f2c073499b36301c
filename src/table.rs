use indexmap::IndexSet;

/// Codes 256 to 258 are control codes, they have no string.
const CONTROL_CODES: usize = 3;

/// Strings to codes, the position in the set gives the code.
pub struct CompressionTable {
    entries: IndexSet<Vec<u8>>,
}

impl CompressionTable {
    pub fn new() -> Self {
        let mut table = Self {
            entries: IndexSet::with_capacity(lzw15::MAX_CODE + 1),
        };
        table.reset();
        table
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.entries.extend((0..=255u8).map(|byte| vec![byte]));
    }

    pub fn code_for(&self, string: &[u8]) -> Option<u16> {
        let index = self.entries.get_index_of(string)?;
        let code = if index < 256 {
            index
        } else {
            index + CONTROL_CODES
        };
        Some(code as u16)
    }

    pub fn contains(&self, string: &[u8]) -> bool {
        self.entries.contains(string)
    }

    pub fn add(&mut self, entry: Vec<u8>) {
        self.entries.insert(entry);
    }

    /// Count of codes in use, control codes included.
    pub fn len(&self) -> usize {
        self.entries.len() + CONTROL_CODES
    }
}

impl Default for CompressionTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Codes to strings, the code is the index.
pub struct DecompressionTable {
    entries: Vec<Vec<u8>>,
}

impl DecompressionTable {
    pub fn new() -> Self {
        let mut table = Self {
            entries: Vec::with_capacity(lzw15::MAX_CODE + 1),
        };
        table.reset();
        table
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.entries.extend((0..=255u8).map(|byte| vec![byte]));
        self.entries
            .extend(std::iter::repeat(vec![]).take(CONTROL_CODES));
    }

    pub fn string_for(&self, code: u16) -> Option<&Vec<u8>> {
        match self.entries.get(code as usize) {
            Some(string) if !string.is_empty() => Some(string),
            _ => None,
        }
    }

    pub fn add(&mut self, entry: Vec<u8>) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for DecompressionTable {
    fn default() -> Self {
        Self::new()
    }
}
