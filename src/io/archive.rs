//! Zip archive unpacking into a [`ProjectIo`]

use super::{join_path, ProjectIo};
use crate::core::errors::{ProjectError, ProjectResult};
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

/// Unpack every entry of a zip blob below `target_dir`
///
/// Entries whose names would escape the target directory are skipped.
/// Returns the number of files written.
pub async fn unpack<I: ProjectIo>(blob: &[u8], io: &I, target_dir: &str) -> ProjectResult<usize> {
    let entries = read_entries(blob)?;
    let mut written = 0;

    for (name, contents) in entries {
        let path = join_path(target_dir, &name);
        match contents {
            Some(contents) => {
                io.write_file(&path, &contents).await?;
                written += 1;
            }
            None => io.ensure_dir(&path).await?,
        }
    }

    debug!("Unpacked {} files into '{}'", written, target_dir);
    Ok(written)
}

/// Decode all entries up front; directories map to `None`
fn read_entries(blob: &[u8]) -> ProjectResult<Vec<(String, Option<Vec<u8>>)>> {
    let reader = Cursor::new(blob);
    let mut archive =
        ZipArchive::new(reader).map_err(|e| ProjectError::Archive(format!("Failed to open zip: {e}")))?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| ProjectError::Archive(format!("Failed to read zip entry: {e}")))?;

        let name = match file.enclosed_name() {
            Some(path) => path.to_string_lossy().replace('\\', "/"),
            None => continue,
        };

        if file.is_dir() {
            entries.push((name, None));
            continue;
        }

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| ProjectError::Archive(format!("Failed to extract {name}: {e}")))?;
        entries.push((name, Some(contents)));
    }

    Ok(entries)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::io::MemoryIo;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Build a zip blob from (name, contents) pairs; names ending in `/`
    /// become directory entries
    pub(crate) fn zip_blob<C: AsRef<[u8]>>(entries: &[(&str, C)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, contents) in entries {
            if name.ends_with('/') {
                writer.add_directory(name.trim_end_matches('/'), options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(contents.as_ref()).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn test_unpack_into_memory() {
        let blob = zip_blob(&[
            ("alpha.ufo/", ""),
            ("alpha.ufo/metainfo.plist", "<plist/>"),
            ("alpha.ufo/glyphs/contents.plist", "<plist/>"),
        ]);
        let io = MemoryIo::new();

        let written = unpack(&blob, &io, "").await.unwrap();
        assert_eq!(written, 2);
        assert_eq!(io.read_dir("").await.unwrap(), vec!["alpha.ufo/"]);
        assert!(io.path_exists("alpha.ufo/glyphs/contents.plist").await);
    }

    #[tokio::test]
    async fn test_garbage_is_an_archive_error() {
        let io = MemoryIo::new();
        let error = unpack(b"not a zip", &io, "").await.unwrap_err();
        assert!(matches!(error, ProjectError::Archive(_)));
    }
}
