//! Buffer-or-spill byte sources for tar entries.
//!
//! A parser needs to read a file's content from the start any number of
//! times (the PEM scanner seeks backwards during recovery), but a tar stream
//! is forward-only. Small files are buffered in memory; oversized ones
//! (layer blobs, static binaries) spill to a uniquely named temporary file
//! so peak memory stays bounded by roughly one buffered file.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::ScanError;

/// Declared sizes at or above this spill to disk (1 GiB).
pub const SPILL_THRESHOLD: u64 = 1 << 30;

/// Seekable, re-openable source for one file's bytes.
///
/// Dropping the source releases its resources; for spilled sources that
/// deletes the temporary file, exactly once, on success and failure paths
/// alike.
pub enum ByteSource {
    /// Content held in memory.
    Memory(Vec<u8>),
    /// Content spilled to a temporary file.
    Spilled(NamedTempFile),
}

impl ByteSource {
    /// Drain `reader` into a source, choosing memory or disk by the
    /// entry's declared size.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Buffer`] if the content cannot be read, or the
    /// temporary file cannot be created or written. Either is fatal to the
    /// whole per-file operation.
    pub fn from_reader<R: Read>(
        path: &str,
        declared_size: u64,
        reader: &mut R,
    ) -> Result<Self, ScanError> {
        let buffer_err = |source| ScanError::Buffer {
            path: path.to_string(),
            source,
        };

        if declared_size >= SPILL_THRESHOLD {
            debug!(path, declared_size, "spilling oversized entry to disk");
            let prefix = path.replace('/', "-");
            let mut tmp = tempfile::Builder::new()
                .prefix(&prefix)
                .tempfile()
                .map_err(buffer_err)?;
            io::copy(reader, tmp.as_file_mut()).map_err(buffer_err)?;
            Ok(Self::Spilled(tmp))
        } else {
            let mut content = Vec::with_capacity(usize::try_from(declared_size).unwrap_or(0));
            reader.read_to_end(&mut content).map_err(buffer_err)?;
            Ok(Self::Memory(content))
        }
    }

    /// Open a fresh seekable reader positioned at the start.
    ///
    /// # Errors
    ///
    /// Returns an IO error if a spilled file cannot be re-opened.
    pub fn open(&self) -> io::Result<SourceReader<'_>> {
        match self {
            Self::Memory(content) => Ok(SourceReader::Memory(Cursor::new(content))),
            Self::Spilled(tmp) => Ok(SourceReader::Spilled(tmp.reopen()?)),
        }
    }

    /// Path of the spill file, if this source was spilled.
    #[must_use]
    pub fn spill_path(&self) -> Option<&Path> {
        match self {
            Self::Memory(_) => None,
            Self::Spilled(tmp) => Some(tmp.path()),
        }
    }
}

/// A reader handed out by [`ByteSource::open`].
pub enum SourceReader<'a> {
    /// Cursor over in-memory content.
    Memory(Cursor<&'a Vec<u8>>),
    /// Independent handle onto the spill file.
    Spilled(File),
}

impl Read for SourceReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Memory(c) => c.read(buf),
            Self::Spilled(f) => f.read(buf),
        }
    }
}

impl Seek for SourceReader<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::Memory(c) => c.seek(pos),
            Self::Spilled(f) => f.seek(pos),
        }
    }
}
