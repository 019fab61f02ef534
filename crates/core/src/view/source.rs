use std::io;
use std::path::Path;

/// Supplies the raw bytes of a document.
pub trait DocumentSource: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads documents from the local file system.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSystemSource;

impl DocumentSource for FileSystemSource {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tracing::trace!(path = %path.display(), "reading document from file system");
        std::fs::read(path)
    }
}
