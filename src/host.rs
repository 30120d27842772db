use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("file {} is {size} bytes, larger than a 32-bit size", .path.display())]
    TooLarge { path: PathBuf, size: u64 },
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Bytes read by the host on the application's behalf. Return them with
/// [`Host::free_file_memory`] when done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContents {
    bytes: Vec<u8>,
}

impl FileContents {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Services the host exposes to the application.
///
/// Only the debug file helpers live here. They are not on any hot path and an
/// application must keep working when every call fails.
pub trait Host {
    fn read_entire_file(&mut self, path: &Path) -> Result<FileContents, FileError>;

    fn write_entire_file(&mut self, path: &Path, bytes: &[u8]) -> Result<(), FileError>;

    fn free_file_memory(&mut self, contents: FileContents) {
        drop(contents);
    }
}

/// `std::fs` backed host, paths relative to `root` when one is set.
#[derive(Debug, Default, Clone)]
pub struct StdFileHost {
    root: Option<PathBuf>,
}

impl StdFileHost {
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path),
            None => path.to_path_buf(),
        }
    }
}

impl Host for StdFileHost {
    fn read_entire_file(&mut self, path: &Path) -> Result<FileContents, FileError> {
        let path = self.resolve(path);
        let size = std::fs::metadata(&path)
            .map_err(|e| FileError::io(&path, e))?
            .len();
        if size > u32::MAX as u64 {
            return Err(FileError::TooLarge { path, size });
        }
        let bytes = std::fs::read(&path).map_err(|e| FileError::io(&path, e))?;
        log::debug!("read {} bytes from {}", bytes.len(), path.display());
        Ok(FileContents::new(bytes))
    }

    fn write_entire_file(&mut self, path: &Path, bytes: &[u8]) -> Result<(), FileError> {
        let path = self.resolve(path);
        std::fs::write(&path, bytes).map_err(|e| FileError::io(&path, e))?;
        log::debug!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

/// Host without a file system: reads fail, writes are discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {
    fn read_entire_file(&mut self, path: &Path) -> Result<FileContents, FileError> {
        Err(FileError::NotFound(path.to_path_buf()))
    }

    fn write_entire_file(&mut self, _path: &Path, _bytes: &[u8]) -> Result<(), FileError> {
        Ok(())
    }
}
