use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use bytes::Bytes;

/// Provides the bytes of one file going into a torrent.
///
/// The builder asks for the size up front (to pick a piece length and fill
/// in `length`) and then opens the source once to stream it through the
/// hasher.
pub trait ContentSource: fmt::Debug + Send + Sync {
    /// Declared size in bytes.
    fn len(&self) -> io::Result<u64>;

    fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Opens a fresh reader positioned at the first byte.
    fn open(&self) -> io::Result<Box<dyn Read + Send + '_>>;

    /// Where the content lives, for error messages.
    fn origin(&self) -> PathBuf {
        PathBuf::from("<memory>")
    }
}

/// Content held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource(Bytes);

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }
}

impl ContentSource for MemorySource {
    fn len(&self) -> io::Result<u64> {
        Ok(self.0.len() as u64)
    }

    fn open(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(Cursor::new(self.0.as_ref())))
    }
}

/// Content streamed from a file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContentSource for FileSource {
    fn len(&self) -> io::Result<u64> {
        let metadata = std::fs::metadata(&self.path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", self.path.display()),
            ));
        }
        Ok(metadata.len())
    }

    fn open(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(File::open(&self.path)?))
    }

    fn origin(&self) -> PathBuf {
        self.path.clone()
    }
}
