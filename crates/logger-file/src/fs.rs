//! File-system seam for the rotating sink

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;

/// The file operations a rotating sink performs
pub trait FileSystem: Send + Sync + 'static {
    /// Open `path` for appending, creating it if missing
    fn open_append(&self, path: &Path) -> io::Result<Box<dyn Write + Send>>;

    /// Current length of the file in bytes
    fn len(&self, path: &Path) -> io::Result<u64>;

    /// Last modification time of the file
    fn modified(&self, path: &Path) -> io::Result<SystemTime>;

    /// Whether a file exists at `path`
    fn exists(&self, path: &Path) -> bool;

    /// Rename `from` to `to`
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Delete a file
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Names of the files directly inside `dir`
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>>;

    /// Create `dir` and its parents
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;
}

/// The real file system
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn open_append(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Box::new(file))
    }

    fn len(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        fs::metadata(path)?.modified()
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use memory::{FailOn, MemoryFileSystem};

#[cfg(any(test, feature = "test-support"))]
mod memory {
    use super::FileSystem;
    use parking_lot::Mutex;
    use std::collections::{BTreeMap, HashSet};
    use std::io::{self, Write};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::SystemTime;

    /// Operations a [`MemoryFileSystem`] can be told to fail
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub enum FailOn {
        /// Every open of this path
        Open(PathBuf),
        /// Every rename whose source is this path
        Rename(PathBuf),
        /// Every removal of this path
        Remove(PathBuf),
        /// Every listing of this directory
        List(PathBuf),
    }

    #[derive(Debug)]
    struct MemFile {
        data: Vec<u8>,
        modified: SystemTime,
    }

    #[derive(Debug, Default)]
    struct State {
        files: BTreeMap<PathBuf, MemFile>,
        failures: HashSet<FailOn>,
    }

    /// In-memory file system with failure injection. Clones share contents.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryFileSystem {
        state: Arc<Mutex<State>>,
    }

    impl MemoryFileSystem {
        /// Create an empty file system
        pub fn new() -> Self {
            Self::default()
        }

        /// Create or replace a file
        pub fn insert(
            &self,
            path: impl Into<PathBuf>,
            data: impl Into<Vec<u8>>,
            modified: SystemTime,
        ) {
            self.state.lock().files.insert(
                path.into(),
                MemFile {
                    data: data.into(),
                    modified,
                },
            );
        }

        /// Contents of a file, if it exists
        pub fn read(&self, path: &Path) -> Option<String> {
            self.state
                .lock()
                .files
                .get(path)
                .map(|f| String::from_utf8_lossy(&f.data).into_owned())
        }

        /// All file paths, sorted
        pub fn paths(&self) -> Vec<PathBuf> {
            self.state.lock().files.keys().cloned().collect()
        }

        /// Make an operation fail with `PermissionDenied` from now on
        pub fn fail(&self, on: FailOn) {
            self.state.lock().failures.insert(on);
        }

        /// Stop failing an operation
        pub fn heal(&self, on: &FailOn) {
            self.state.lock().failures.remove(on);
        }

        fn check(state: &State, on: FailOn) -> io::Result<()> {
            if state.failures.contains(&on) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("injected failure: {on:?}"),
                ));
            }
            Ok(())
        }

        fn not_found(path: &Path) -> io::Error {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        }
    }

    struct MemWriter {
        state: Arc<Mutex<State>>,
        path: PathBuf,
    }

    impl Write for MemWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut state = self.state.lock();
            // Writes after the file was renamed away or removed are dropped
            if let Some(file) = state.files.get_mut(&self.path) {
                file.data.extend_from_slice(buf);
                file.modified = SystemTime::now();
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl FileSystem for MemoryFileSystem {
        fn open_append(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
            let mut state = self.state.lock();
            Self::check(&state, FailOn::Open(path.to_path_buf()))?;
            state
                .files
                .entry(path.to_path_buf())
                .or_insert_with(|| MemFile {
                    data: Vec::new(),
                    modified: SystemTime::now(),
                });
            Ok(Box::new(MemWriter {
                state: self.state.clone(),
                path: path.to_path_buf(),
            }))
        }

        fn len(&self, path: &Path) -> io::Result<u64> {
            let state = self.state.lock();
            let file = state.files.get(path).ok_or_else(|| Self::not_found(path))?;
            Ok(file.data.len() as u64)
        }

        fn modified(&self, path: &Path) -> io::Result<SystemTime> {
            let state = self.state.lock();
            let file = state.files.get(path).ok_or_else(|| Self::not_found(path))?;
            Ok(file.modified)
        }

        fn exists(&self, path: &Path) -> bool {
            self.state.lock().files.contains_key(path)
        }

        fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            let mut state = self.state.lock();
            Self::check(&state, FailOn::Rename(from.to_path_buf()))?;
            let file = state.files.remove(from).ok_or_else(|| Self::not_found(from))?;
            state.files.insert(to.to_path_buf(), file);
            Ok(())
        }

        fn remove_file(&self, path: &Path) -> io::Result<()> {
            let mut state = self.state.lock();
            Self::check(&state, FailOn::Remove(path.to_path_buf()))?;
            state
                .files
                .remove(path)
                .map(|_| ())
                .ok_or_else(|| Self::not_found(path))
        }

        fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
            let state = self.state.lock();
            Self::check(&state, FailOn::List(dir.to_path_buf()))?;
            Ok(state
                .files
                .keys()
                .filter(|path| path.parent() == Some(dir))
                .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
                .collect())
        }

        fn create_dir_all(&self, _dir: &Path) -> io::Result<()> {
            Ok(())
        }
    }
}
