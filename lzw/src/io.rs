//! File helpers around [crate::compress] and [crate::decompress].

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Iterator over the bytes of a reader, see [file_bytes].
///
/// Reading stops at the first error, which is kept in [FileBytes::error].
pub struct FileBytes<R>
where
    R: Read,
{
    read: R,
    buffer: Vec<u8>,
    position: usize,
    filled: usize,
    error: Option<std::io::Error>,
}

impl<R> FileBytes<R>
where
    R: Read,
{
    fn new(read: R, buffer_size: usize) -> Self {
        Self {
            read,
            buffer: vec![0; buffer_size.max(1)],
            position: 0,
            filled: 0,
            error: None,
        }
    }

    /// The error that ended the iteration early, if any.
    pub fn error(&self) -> Option<&std::io::Error> {
        self.error.as_ref()
    }

    /// Returns the error that ended the iteration early, if any.
    pub fn into_result(self) -> Result<(), std::io::Error> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl<R> Iterator for FileBytes<R>
where
    R: Read,
{
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position == self.filled {
            if self.error.is_some() {
                return None;
            }
            self.filled = loop {
                match self.read.read(&mut self.buffer[..]) {
                    Ok(filled) => break filled,
                    Err(error) if error.kind() == std::io::ErrorKind::Interrupted => {}
                    Err(error) => {
                        self.error = Some(error);
                        return None;
                    }
                }
            };
            self.position = 0;
            if self.filled == 0 {
                return None;
            }
        }

        let byte = self.buffer[self.position];
        self.position += 1;
        Some(byte)
    }
}

/// Iterates over the bytes of any reader, reading 1024 bytes at a time.
pub fn file_bytes<R: Read>(read: R) -> FileBytes<R> {
    FileBytes::new(read, DEFAULT_BUFFER_SIZE)
}

/// Same as [file_bytes], with a custom buffer size.
pub fn file_bytes_with_capacity<R: Read>(read: R, buffer_size: usize) -> FileBytes<R> {
    FileBytes::new(read, buffer_size)
}

/// Opens a file and iterates over its bytes. The file is closed when the iterator is dropped.
pub fn read_bytes<P: AsRef<Path>>(path: P) -> Result<FileBytes<File>, std::io::Error> {
    Ok(file_bytes(File::open(path)?))
}

/// Creates or truncates a file, and writes all the given bytes to it.
pub fn write_bytes<P, I>(path: P, data: I) -> Result<(), std::io::Error>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = u8>,
{
    let mut write = BufWriter::new(File::create(path)?);
    for byte in data {
        write.write_all(&[byte])?;
    }
    write.flush()
}

/// Compresses the file at `from` into the file at `into`.
///
/// Returns the size of the source and of the compressed data.
pub fn compress_file<P, Q>(from: P, into: Q) -> Result<(usize, usize), std::io::Error>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut read = 0;
    let mut written = 0;
    let mut bytes = read_bytes(from)?;

    let compressed =
        crate::compress(bytes.by_ref().inspect(|_| read += 1)).inspect(|_| written += 1);
    write_bytes(&into, compressed)?;
    // The encoder saw a short read as the end of the data, so the output is a valid stream
    // of truncated data. It must not outlive the error.
    if let Err(error) = bytes.into_result() {
        std::fs::remove_file(&into)?;
        return Err(error);
    }

    log::info!("Compressed from {read} to {written} bytes");
    Ok((read, written))
}

/// Decompresses the file at `from` into the file at `into`.
///
/// Returns the size of the compressed data and of the decompressed one.
///
/// # Errors
///
/// Invalid LZW data is reported as [std::io::ErrorKind::InvalidData].
pub fn decompress_file<P, Q>(from: P, into: Q) -> Result<(usize, usize), std::io::Error>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut read = 0;
    let mut bytes = read_bytes(from)?;

    let decompressed: Vec<u8> =
        crate::decompress(bytes.by_ref().inspect(|_| read += 1)).collect::<Result<_, _>>()?;
    bytes.into_result()?;

    let written = decompressed.len();
    write_bytes(into, decompressed)?;

    log::info!("Decompressed from {read} to {written} bytes");
    Ok((read, written))
}
