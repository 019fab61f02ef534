use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use xmlview_core::DocumentSource;

#[derive(Debug)]
enum Entry {
    Contents(Vec<u8>),
    Failure(io::ErrorKind),
}

/// Document source backed by an in-memory path map.
///
/// Unknown paths fail with [`io::ErrorKind::NotFound`].
#[derive(Debug, Default)]
pub struct MockDocumentSource {
    entries: Mutex<HashMap<PathBuf, Entry>>,
    reads: Mutex<Vec<PathBuf>>,
}

impl MockDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Makes reads of `path` fail with `kind`.
    pub fn with_failure(self, path: impl Into<PathBuf>, kind: io::ErrorKind) -> Self {
        self.entries.lock().expect("source entries poisoned").insert(path.into(), Entry::Failure(kind));
        self
    }

    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.entries
            .lock()
            .expect("source entries poisoned")
            .insert(path.into(), Entry::Contents(contents.into()));
    }

    pub fn remove(&self, path: &Path) {
        self.entries.lock().expect("source entries poisoned").remove(path);
    }

    /// Paths requested so far, in order.
    pub fn reads(&self) -> Vec<PathBuf> {
        self.reads.lock().expect("source reads poisoned").clone()
    }
}

impl DocumentSource for MockDocumentSource {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.reads.lock().expect("source reads poisoned").push(path.to_path_buf());
        match self.entries.lock().expect("source entries poisoned").get(path) {
            Some(Entry::Contents(bytes)) => Ok(bytes.clone()),
            Some(Entry::Failure(kind)) => Err(io::Error::new(*kind, format!("mock failure for {}", path.display()))),
            None => Err(io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn reads_registered_contents() {
        let source = MockDocumentSource::new().with_file("a.xml", "<a/>");
        assert_eq!(source.read(Path::new("a.xml")).expect("present"), b"<a/>");
        assert_eq!(source.reads(), [PathBuf::from("a.xml")]);
    }

    #[rstest]
    #[case("missing.xml", io::ErrorKind::NotFound)]
    #[case("locked.xml", io::ErrorKind::PermissionDenied)]
    fn failing_reads(#[case] path: &str, #[case] kind: io::ErrorKind) {
        let source = MockDocumentSource::new().with_failure("locked.xml", io::ErrorKind::PermissionDenied);
        assert_eq!(source.read(Path::new(path)).expect_err("fails").kind(), kind);
    }

    #[rstest]
    fn removed_files_are_gone() {
        let source = MockDocumentSource::new().with_file("a.xml", "<a/>");
        source.remove(Path::new("a.xml"));
        assert!(source.read(Path::new("a.xml")).is_err());
    }
}
