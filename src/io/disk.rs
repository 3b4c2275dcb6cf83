//! Disk-backed project storage on top of `tokio::fs`

use super::{normalize_path, ProjectIo};
use crate::core::errors::{IoContext, ProjectResult};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Project storage rooted at a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct DiskIo {
    root: PathBuf,
}

impl DiskIo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let normalized = normalize_path(path);
        if normalized.is_empty() {
            self.root.clone()
        } else {
            self.root.join(normalized)
        }
    }
}

impl ProjectIo for DiskIo {
    async fn read_file(&self, path: &str) -> ProjectResult<Vec<u8>> {
        fs::read(self.resolve(path))
            .await
            .with_file_context("read", path)
    }

    async fn write_file(&self, path: &str, contents: &[u8]) -> ProjectResult<()> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .with_file_context("create directory for", path)?;
        }
        fs::write(&target, contents)
            .await
            .with_file_context("write", path)
    }

    async fn path_exists(&self, path: &str) -> bool {
        fs::try_exists(self.resolve(path)).await.unwrap_or(false)
    }

    async fn ensure_dir(&self, path: &str) -> ProjectResult<()> {
        fs::create_dir_all(self.resolve(path))
            .await
            .with_file_context("create directory", path)
    }

    async fn read_dir(&self, path: &str) -> ProjectResult<Vec<String>> {
        let mut dir = fs::read_dir(self.resolve(path))
            .await
            .with_file_context("list", path)?;
        let mut names = Vec::new();

        while let Some(entry) = dir.next_entry().await.with_file_context("list", path)? {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry
                .file_type()
                .await
                .with_file_context("inspect", path)?;
            if file_type.is_dir() {
                name.push('/');
            }
            names.push(name);
        }

        names.sort();
        Ok(names)
    }

    async fn unlink(&self, path: &str) -> ProjectResult<()> {
        fs::remove_file(self.resolve(path))
            .await
            .with_file_context("remove", path)
    }

    async fn remove_dir_all(&self, path: &str) -> ProjectResult<()> {
        fs::remove_dir_all(self.resolve(path))
            .await
            .with_file_context("remove directory", path)
    }

    fn local_path(&self, path: &str) -> Option<PathBuf> {
        Some(self.resolve(path))
    }
}
