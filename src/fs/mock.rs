// src/fs/mock.rs

use super::FileSystem;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File,
    Dir(Vec<String>), // List of child names
    /// Link to another entry, keyed like every other path.
    Symlink(PathBuf),
}

/// In-memory directory tree for discovery tests.
///
/// The tree is rooted at `.`; relative paths such as `gen/out.txt` are
/// stored as `./gen/out.txt` so they line up with `read_dir(".")` results.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    /// Add a file, creating its parent directories implicitly.
    pub fn add_file(&self, path: impl AsRef<Path>) {
        let path = key(path.as_ref());
        let mut entries = self.entries();
        entries.insert(path.clone(), MockEntry::File);
        link_to_parent(&mut entries, &path);
    }

    /// Add an (empty) directory, creating its parents implicitly.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries();
        ensure_dir(&mut entries, &key(path.as_ref()));
    }

    /// Add a symlink at `path` pointing at `target` (both relative to the
    /// mock root). The target does not have to exist.
    pub fn add_symlink(&self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        let path = key(path.as_ref());
        let mut entries = self.entries();
        entries.insert(path.clone(), MockEntry::Symlink(key(target.as_ref())));
        link_to_parent(&mut entries, &path);
    }

    /// Entry at `path`, following one level of symlink.
    fn resolved(&self, path: &Path) -> Option<MockEntry> {
        let entries = self.entries();
        match entries.get(&key(path)) {
            Some(MockEntry::Symlink(target)) => entries.get(target).cloned(),
            other => other.cloned(),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn key(path: &Path) -> PathBuf {
    if path.is_relative() && !path.starts_with(".") {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}

fn parent_of(path: &Path) -> Option<&Path> {
    path.parent().map(|parent| {
        if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        }
    })
}

fn ensure_dir(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    if entries.contains_key(path) {
        return;
    }
    entries.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
    link_to_parent(entries, path);
}

fn link_to_parent(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    let Some(parent) = parent_of(path) else {
        return;
    };
    if parent == path {
        return; // Avoid infinite loop at root
    }

    ensure_dir(entries, parent);
    if let (Some(MockEntry::Dir(children)), Some(name)) = (
        entries.get_mut(parent),
        path.file_name().and_then(|n| n.to_str()),
    ) {
        if !children.iter().any(|c| c == name) {
            children.push(name.to_string());
        }
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.entries().contains_key(&key(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.resolved(path), Some(MockEntry::File))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.resolved(path), Some(MockEntry::Dir(_)))
    }

    fn is_symlink(&self, path: &Path) -> bool {
        matches!(self.entries().get(&key(path)), Some(MockEntry::Symlink(_)))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let path = key(path);
        match self.resolved(&path) {
            Some(MockEntry::Dir(children)) => {
                let mut paths: Vec<PathBuf> =
                    children.iter().map(|name| path.join(name)).collect();
                paths.sort();
                Ok(paths)
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
