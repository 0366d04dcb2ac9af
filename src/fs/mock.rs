// src/fs/mock.rs

use super::FileSystem;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// In-memory filesystem for tests.
///
/// Clones share the same storage, so a test can hand one clone to the code
/// under test and inspect writes through another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    writes: Arc<Mutex<Vec<PathBuf>>>,
    read_only_dirs: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut files = self.files.lock().unwrap();
        files.insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Make every write below `dir` fail, to exercise error paths.
    pub fn deny_writes_under(&self, dir: impl AsRef<Path>) {
        let mut dirs = self.read_only_dirs.lock().unwrap();
        dirs.push(dir.as_ref().to_path_buf());
    }

    /// Contents of `path` as UTF-8, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let files = self.files.lock().unwrap();
        files
            .get(path.as_ref())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Every successful write, in order.
    pub fn written_paths(&self) -> Vec<PathBuf> {
        self.writes.lock().unwrap().clone()
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(content) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        {
            let dirs = self.read_only_dirs.lock().unwrap();
            if dirs.iter().any(|d| path.starts_with(d)) {
                return Err(anyhow!("Permission denied: {:?}", path));
            }
        }
        self.add_file(path, contents);
        self.writes.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}
