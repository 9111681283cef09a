//! Working tree handles.
//!
//! The mutation engine reads and writes files only through [`WorkingTree`],
//! so it runs unchanged against a real checkout ([`FsWorkingTree`]) or an
//! in-memory map ([`MemoryWorkingTree`]).
//!
//! Precondition: no other process mutates the tree while a run is active.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::core::invariants::is_contained;

/// Scoped file operations, relative to the tree root.
pub trait WorkingTree {
    /// Read a file; `Ok(None)` when it does not exist.
    fn read(&self, path: &Path) -> Result<Option<String>>;
    /// Truncate-and-write; the parent directory must already exist.
    fn write(&self, path: &Path, contents: &str) -> Result<()>;
    /// Create `path` and all missing ancestors; succeeds if it already exists.
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn dir_exists(&self, path: &Path) -> bool;
}

/// Working tree backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FsWorkingTree {
    root: PathBuf,
}

impl FsWorkingTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        if !is_contained(path) {
            return Err(anyhow!(
                "path '{}' escapes the working tree",
                path.display()
            ));
        }
        Ok(self.root.join(path))
    }
}

impl WorkingTree for FsWorkingTree {
    fn read(&self, path: &Path) -> Result<Option<String>> {
        let full = self.resolve(path)?;
        match fs::read_to_string(&full) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("read {}", full.display())),
        }
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let full = self.resolve(path)?;
        fs::write(&full, contents).with_context(|| format!("write {}", full.display()))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let full = self.resolve(path)?;
        fs::create_dir_all(&full).with_context(|| format!("create directory {}", full.display()))
    }

    fn dir_exists(&self, path: &Path) -> bool {
        self.resolve(path).map(|full| full.is_dir()).unwrap_or(false)
    }
}

/// In-memory working tree with filesystem-like rules.
///
/// Writing a file whose parent directory was never created fails, the same
/// way it would on disk.
#[derive(Debug, Default)]
pub struct MemoryWorkingTree {
    files: RefCell<BTreeMap<PathBuf, String>>,
    dirs: RefCell<BTreeSet<PathBuf>>,
}

impl MemoryWorkingTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating its ancestors.
    pub fn with_file(self, path: impl AsRef<Path>, contents: &str) -> Self {
        let path = normalize(path.as_ref());
        if let Some(parent) = path.parent() {
            self.insert_dirs(parent);
        }
        self.files.borrow_mut().insert(path, contents.to_string());
        self
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.borrow().get(&normalize(path.as_ref())).cloned()
    }

    /// Snapshot of every file, keyed by normalized path.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, String> {
        self.files.borrow().clone()
    }

    fn insert_dirs(&self, path: &Path) {
        let mut dirs = self.dirs.borrow_mut();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }

    fn parent_exists(&self, path: &Path) -> bool {
        match path.parent() {
            None => true,
            Some(parent) if parent.as_os_str().is_empty() => true,
            Some(parent) => self.dirs.borrow().contains(parent),
        }
    }
}

impl WorkingTree for MemoryWorkingTree {
    fn read(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.file(path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        if !is_contained(path) {
            return Err(anyhow!(
                "path '{}' escapes the working tree",
                path.display()
            ));
        }
        let path = normalize(path);
        if !self.parent_exists(&path) {
            return Err(anyhow!("parent directory of '{}' missing", path.display()));
        }
        if self.dirs.borrow().contains(&path) {
            return Err(anyhow!("'{}' is a directory", path.display()));
        }
        self.files.borrow_mut().insert(path, contents.to_string());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        if !is_contained(path) {
            return Err(anyhow!(
                "path '{}' escapes the working tree",
                path.display()
            ));
        }
        let path = normalize(path);
        if self.files.borrow().contains_key(&path) {
            return Err(anyhow!("'{}' is a file", path.display()));
        }
        self.insert_dirs(&path);
        Ok(())
    }

    fn dir_exists(&self, path: &Path) -> bool {
        let path = normalize(path);
        path.as_os_str().is_empty() || self.dirs.borrow().contains(&path)
    }
}

/// Drop `.` components so `./a.txt` and `a.txt` address the same entry.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_tree_reads_missing_file_as_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let tree = FsWorkingTree::new(temp.path());
        assert_eq!(tree.read(Path::new("nope.txt")).expect("read"), None);
    }

    #[test]
    fn fs_tree_writes_and_creates_dirs() {
        let temp = tempfile::tempdir().expect("tempdir");
        let tree = FsWorkingTree::new(temp.path());
        tree.create_dir_all(Path::new("src/hooks")).expect("mkdir");
        tree.create_dir_all(Path::new("src/hooks")).expect("mkdir again");
        assert!(tree.dir_exists(Path::new("src/hooks")));
        tree.write(Path::new("src/hooks/index.ts"), "export {};")
            .expect("write");
        assert_eq!(
            fs::read_to_string(temp.path().join("src/hooks/index.ts")).expect("read"),
            "export {};"
        );
    }

    #[test]
    fn fs_tree_rejects_escaping_paths() {
        let temp = tempfile::tempdir().expect("tempdir");
        let tree = FsWorkingTree::new(temp.path());
        assert!(tree.write(Path::new("../evil"), "x").is_err());
        assert!(tree.read(Path::new("/etc/hostname")).is_err());
        assert!(!tree.dir_exists(Path::new("..")));
    }

    #[test]
    fn memory_tree_requires_parent_dir() {
        let tree = MemoryWorkingTree::new();
        assert!(tree.write(Path::new("a/b.txt"), "x").is_err());
        tree.create_dir_all(Path::new("a")).expect("mkdir");
        tree.write(Path::new("a/b.txt"), "x").expect("write");
        assert_eq!(tree.file("a/b.txt").as_deref(), Some("x"));
        assert!(tree.dir_exists(Path::new("")));
    }

    #[test]
    fn memory_tree_normalizes_current_dir() {
        let tree = MemoryWorkingTree::new().with_file("./docs/a.md", "# A");
        assert_eq!(tree.file("docs/a.md").as_deref(), Some("# A"));
        assert!(tree.dir_exists(Path::new("./docs")));
    }
}
