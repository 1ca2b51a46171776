use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::error::{Error, Result};

/// File access used by the generator. Every mutation the generator performs goes
/// through one of these calls.
pub trait Filesystem {
    fn exists(&self, path: &Path) -> bool;

    /// Reads a whole file. A missing file is `Ok(None)`, not an error.
    fn read_to_string(&self, path: &Path) -> Result<Option<String>>;

    /// Replaces the whole file.
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    fn append(&self, path: &Path, contents: &str) -> Result<()>;

    fn create_dir_all(&self, path: &Path) -> Result<()>;
}

/// The real filesystem. Whole-file writes land through a temp file in the same directory
/// followed by a rename, so readers never see a half-written file.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io("read", path, e)),
        }
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        // A symlinked config keeps its link; the file it points at is replaced.
        let target = match fs::canonicalize(path) {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == ErrorKind::NotFound => path.to_path_buf(),
            Err(e) => return Err(Error::io("resolve", path, e)),
        };
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| Error::io("create temp file in", dir, e))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| Error::io("write", tmp.path().to_path_buf(), e))?;

        // A replaced file keeps its mode; a new one gets the usual 0644.
        let permissions = match fs::metadata(&target) {
            Ok(meta) => Some(meta.permissions()),
            Err(_) => fresh_file_permissions(),
        };
        if let Some(permissions) = permissions {
            tmp.as_file()
                .set_permissions(permissions)
                .map_err(|e| Error::io("set permissions on", &target, e))?;
        }

        tmp.persist(&target)
            .map_err(|e| Error::io("replace", &target, e.error))?;
        Ok(())
    }

    fn append(&self, path: &Path, contents: &str) -> Result<()> {
        let mut f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::io("open", path, e))?;
        f.write_all(contents.as_bytes())
            .map_err(|e| Error::io("append to", path, e))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| Error::io("create directory", path, e))
    }
}

#[cfg(unix)]
fn fresh_file_permissions() -> Option<fs::Permissions> {
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn fresh_file_permissions() -> Option<fs::Permissions> {
    None
}

/// A filesystem held in memory, for driving the generator without touching disk.
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: RefCell<BTreeMap<PathBuf, String>>,
    dirs: RefCell<BTreeSet<PathBuf>>,
    mutations: Cell<usize>,
    read_only: bool,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files.borrow_mut().insert(path.into(), contents.into());
        self
    }

    /// Every mutating call fails with `PermissionDenied`.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.borrow().get(path.as_ref()).cloned()
    }

    pub fn has_dir(&self, path: impl AsRef<Path>) -> bool {
        self.dirs.borrow().contains(path.as_ref())
    }

    /// Number of successful writes, appends and directory creations so far.
    pub fn mutations(&self) -> usize {
        self.mutations.get()
    }

    fn check_writable(&self, op: &'static str, path: &Path) -> Result<()> {
        if self.read_only {
            return Err(Error::io(
                op,
                path,
                std::io::Error::new(ErrorKind::PermissionDenied, "read-only filesystem"),
            ));
        }
        Ok(())
    }

    fn bump(&self) {
        self.mutations.set(self.mutations.get() + 1);
    }
}

impl Filesystem for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path) || self.dirs.borrow().contains(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.files.borrow().get(path).cloned())
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        self.check_writable("replace", path)?;
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_string());
        self.bump();
        Ok(())
    }

    fn append(&self, path: &Path, contents: &str) -> Result<()> {
        self.check_writable("append to", path)?;
        self.files
            .borrow_mut()
            .entry(path.to_path_buf())
            .or_default()
            .push_str(contents);
        self.bump();
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.check_writable("create directory", path)?;
        let mut dirs = self.dirs.borrow_mut();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
        self.bump();
        Ok(())
    }
}

/// What a dry run would have done to one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedWrite {
    Write(PathBuf),
    Append(PathBuf),
    CreateDir(PathBuf),
}

/// Reads through to `inner`, records mutations instead of performing them.
#[derive(Debug)]
pub struct DryRunFs<F> {
    inner: F,
    planned: RefCell<Vec<PlannedWrite>>,
}

impl<F: Filesystem> DryRunFs<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            planned: RefCell::new(Vec::new()),
        }
    }

    pub fn planned(&self) -> Vec<PlannedWrite> {
        self.planned.borrow().clone()
    }
}

impl<F: Filesystem> Filesystem for DryRunFs<F> {
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<Option<String>> {
        self.inner.read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        tracing::info!(path = %path.display(), bytes = contents.len(), "dry-run: would write file");
        self.planned
            .borrow_mut()
            .push(PlannedWrite::Write(path.to_path_buf()));
        Ok(())
    }

    fn append(&self, path: &Path, contents: &str) -> Result<()> {
        tracing::info!(path = %path.display(), bytes = contents.len(), "dry-run: would append to file");
        self.planned
            .borrow_mut()
            .push(PlannedWrite::Append(path.to_path_buf()));
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        tracing::info!(path = %path.display(), "dry-run: would create directory");
        self.planned
            .borrow_mut()
            .push(PlannedWrite::CreateDir(path.to_path_buf()));
        Ok(())
    }
}
