//! Reads and writes the `.um` binary image format: a sequence of 32-bit
//! words, big-endian, with no header, footer, or alignment padding
//! (`spec.md` §6).

use byteorder::{ReadBytesExt, WriteBytesExt, BigEndian};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ImageError {
    #[error("file is empty")]
    Empty,
    #[error("file size {0} is not a multiple of 4")]
    NotWordAligned(u64),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Reads every big-endian word from `reader` until EOF.
pub fn read<R: Read>(reader: &mut R) -> Result<Vec<u32>, ImageError> {
    let mut words = Vec::new();
    loop {
        match reader.read_u32::<BigEndian>() {
            Ok(w) => words.push(w),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(ImageError::Io(e)),
        }
    }
    Ok(words)
}

/// Writes `words` as big-endian words with no header or padding.
pub fn write<W: Write>(writer: &mut W, words: &[u32]) -> io::Result<()> {
    for &w in words {
        writer.write_u32::<BigEndian>(w)?;
    }
    Ok(())
}

/// Reads a `.um` file from disk, validating the size-positive and
/// divisible-by-4 contract from `spec.md` §6 up front (so a short trailing
/// read is reported as a clean error rather than silently truncating).
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<u32>, ImageError> {
    let path = path.as_ref();
    let size = std::fs::metadata(path)?.len();
    if size == 0 {
        return Err(ImageError::Empty);
    }
    if size % 4 != 0 {
        return Err(ImageError::NotWordAligned(size));
    }
    read(&mut BufReader::new(File::open(path)?))
}

pub fn write_file<P: AsRef<Path>>(path: P, words: &[u32]) -> io::Result<()> {
    write(&mut BufWriter::new(File::create(path)?), words)
}
