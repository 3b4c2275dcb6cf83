//! Project file I/O
//!
//! All project paths are `/`-separated strings relative to the root of a
//! [`ProjectIo`]. Directory entries returned by [`ProjectIo::read_dir`]
//! carry a trailing `/` so callers can tell them apart from files.

pub mod archive;
pub mod disk;
pub mod memory;

use crate::core::errors::{ProjectError, ProjectResult};
use std::path::PathBuf;

pub use disk::DiskIo;
pub use memory::MemoryIo;

/// Storage backend for a project or an unpacked import
#[allow(async_fn_in_trait)]
pub trait ProjectIo {
    /// Read a whole file
    async fn read_file(&self, path: &str) -> ProjectResult<Vec<u8>>;

    /// Write a whole file, creating missing parent directories
    async fn write_file(&self, path: &str, contents: &[u8]) -> ProjectResult<()>;

    async fn path_exists(&self, path: &str) -> bool;

    /// Create a directory and all of its parents
    async fn ensure_dir(&self, path: &str) -> ProjectResult<()>;

    /// List the names of the direct children of a directory
    async fn read_dir(&self, path: &str) -> ProjectResult<Vec<String>>;

    async fn unlink(&self, path: &str) -> ProjectResult<()>;

    async fn remove_dir_all(&self, path: &str) -> ProjectResult<()>;

    /// Location on the local filesystem, if the backend has one
    fn local_path(&self, _path: &str) -> Option<PathBuf> {
        None
    }

    async fn read_to_string(&self, path: &str) -> ProjectResult<String> {
        let bytes = self.read_file(path).await?;
        String::from_utf8(bytes).map_err(|e| ProjectError::malformed(path, e))
    }
}

/// Join project path segments, skipping empty ones
pub fn join_path(base: &str, rest: &str) -> String {
    let base = base.trim_end_matches('/');
    let rest = rest.trim_start_matches('/');
    match (base.is_empty() || base == ".", rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{rest}"),
    }
}

/// Normalize a path to the canonical form used as a key: no leading,
/// trailing or doubled separators
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path_skips_empty_base() {
        assert_eq!(join_path("", "data"), "data");
        assert_eq!(join_path(".", "data"), "data");
        assert_eq!(join_path("project/", "/data"), "project/data");
        assert_eq!(join_path("project", ""), "project");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/alpha.ufo//glyphs/"), "alpha.ufo/glyphs");
        assert_eq!(normalize_path("./a/./b"), "a/b");
        assert_eq!(normalize_path("/"), "");
    }
}
