//! In-memory storage used for archive imports and tests

use super::{normalize_path, ProjectIo};
use crate::core::errors::{ProjectError, ProjectResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
enum Entry {
    File(Vec<u8>),
    Dir,
}

/// An ephemeral filesystem held in a sorted map
///
/// Keys are normalized paths; the root directory is the empty string and
/// always exists.
#[derive(Debug, Default)]
pub struct MemoryIo {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl MemoryIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored files, directories excluded
    pub fn file_count(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|entry| matches!(entry, Entry::File(_)))
            .count()
    }

    fn insert_parents(entries: &mut BTreeMap<String, Entry>, path: &str) -> ProjectResult<()> {
        let mut current = String::new();
        let segments: Vec<&str> = path.split('/').collect();
        for segment in &segments[..segments.len().saturating_sub(1)] {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            match entries.get(&current) {
                Some(Entry::File(_)) => {
                    return Err(ProjectError::InvalidTree(format!(
                        "{current} is a file, cannot create {path}"
                    )))
                }
                Some(Entry::Dir) => {}
                None => {
                    entries.insert(current.clone(), Entry::Dir);
                }
            }
        }
        Ok(())
    }

    fn is_child_of(key: &str, dir: &str) -> bool {
        if dir.is_empty() {
            return !key.is_empty();
        }
        key.len() > dir.len() && key.starts_with(dir) && key.as_bytes()[dir.len()] == b'/'
    }
}

impl ProjectIo for MemoryIo {
    async fn read_file(&self, path: &str) -> ProjectResult<Vec<u8>> {
        let key = normalize_path(path);
        match self.entries.read().get(&key) {
            Some(Entry::File(contents)) => Ok(contents.clone()),
            _ => Err(ProjectError::MissingFile {
                path: path.to_string(),
            }),
        }
    }

    async fn write_file(&self, path: &str, contents: &[u8]) -> ProjectResult<()> {
        let key = normalize_path(path);
        let mut entries = self.entries.write();
        if matches!(entries.get(&key), Some(Entry::Dir)) || key.is_empty() {
            return Err(ProjectError::InvalidTree(format!("{path} is a directory")));
        }
        Self::insert_parents(&mut entries, &key)?;
        entries.insert(key, Entry::File(contents.to_vec()));
        Ok(())
    }

    async fn path_exists(&self, path: &str) -> bool {
        let key = normalize_path(path);
        key.is_empty() || self.entries.read().contains_key(&key)
    }

    async fn ensure_dir(&self, path: &str) -> ProjectResult<()> {
        let key = normalize_path(path);
        if key.is_empty() {
            return Ok(());
        }
        let mut entries = self.entries.write();
        if matches!(entries.get(&key), Some(Entry::File(_))) {
            return Err(ProjectError::InvalidTree(format!("{path} is a file")));
        }
        Self::insert_parents(&mut entries, &key)?;
        entries.insert(key, Entry::Dir);
        Ok(())
    }

    async fn read_dir(&self, path: &str) -> ProjectResult<Vec<String>> {
        let dir = normalize_path(path);
        let entries = self.entries.read();
        if !dir.is_empty() && !matches!(entries.get(&dir), Some(Entry::Dir)) {
            return Err(ProjectError::MissingFile {
                path: path.to_string(),
            });
        }

        let names = entries
            .iter()
            .filter(|(key, _)| Self::is_child_of(key, &dir))
            .filter_map(|(key, entry)| {
                let relative = if dir.is_empty() {
                    key.as_str()
                } else {
                    &key[dir.len() + 1..]
                };
                if relative.contains('/') {
                    return None;
                }
                Some(match entry {
                    Entry::Dir => format!("{relative}/"),
                    Entry::File(_) => relative.to_string(),
                })
            })
            .collect();
        Ok(names)
    }

    async fn unlink(&self, path: &str) -> ProjectResult<()> {
        let key = normalize_path(path);
        let mut entries = self.entries.write();
        match entries.get(&key) {
            Some(Entry::File(_)) => {
                entries.remove(&key);
                Ok(())
            }
            Some(Entry::Dir) => Err(ProjectError::InvalidTree(format!(
                "{path} is a directory"
            ))),
            None => Err(ProjectError::MissingFile {
                path: path.to_string(),
            }),
        }
    }

    async fn remove_dir_all(&self, path: &str) -> ProjectResult<()> {
        let dir = normalize_path(path);
        let mut entries = self.entries.write();
        if !matches!(entries.get(&dir), Some(Entry::Dir)) {
            return Err(ProjectError::MissingFile {
                path: path.to_string(),
            });
        }
        entries.retain(|key, _| key != &dir && !Self::is_child_of(key, &dir));
        Ok(())
    }
}
