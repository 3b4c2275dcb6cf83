//! UFO file I/O operations
//!
//! Plist helpers for the small UFO bookkeeping files (metainfo, layer
//! contents, glyph contents) and loading a glyph layer with norad.

use crate::core::errors::{ProjectError, ProjectResult};
use crate::io::{join_path, ProjectIo};
use norad::Font;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tempfile::TempDir;
use tracing::debug;

pub const METAINFO_FILE: &str = "metainfo.plist";
pub const LAYER_CONTENTS_FILE: &str = "layercontents.plist";
pub const CONTENTS_FILE: &str = "contents.plist";
pub const DEFAULT_LAYER_NAME: &str = "public.default";
pub const DEFAULT_LAYER_DIR: &str = "glyphs";

/// The UFO `metainfo.plist`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaInfo {
    pub creator: String,
    pub format_version: u32,
}

impl MetaInfo {
    /// Metainfo written into new projects
    pub fn v3() -> Self {
        Self {
            creator: "org.bezy.project".to_string(),
            format_version: 3,
        }
    }
}

/// Glyph name → file name mapping of a glyph directory
pub type GlyphContents = BTreeMap<String, String>;

/// Parse a plist file into a serde type
pub async fn read_plist<T, I>(io: &I, path: &str) -> ProjectResult<T>
where
    T: DeserializeOwned,
    I: ProjectIo,
{
    let bytes = io.read_file(path).await?;
    plist::from_bytes(&bytes).map_err(|e| ProjectError::malformed(path, e))
}

/// Serialize a value as an XML plist and write it
pub async fn write_plist<T, I>(io: &I, path: &str, value: &T) -> ProjectResult<()>
where
    T: Serialize,
    I: ProjectIo,
{
    let mut buffer = Vec::new();
    plist::to_writer_xml(&mut buffer, value).map_err(|e| ProjectError::malformed(path, e))?;
    io.write_file(path, &buffer).await
}

/// Read the `formatVersion` of the UFO at `ufo_dir`
pub async fn read_format_version<I: ProjectIo>(io: &I, ufo_dir: &str) -> ProjectResult<u32> {
    let metainfo: MetaInfo = read_plist(io, &join_path(ufo_dir, METAINFO_FILE)).await?;
    Ok(metainfo.format_version)
}

/// Load a single glyph directory with norad
///
/// norad reads complete UFOs from the local filesystem, so the directory is
/// materialized as the default layer of a throwaway UFO first. This works
/// for every [`ProjectIo`], including the in-memory one used for imports.
pub async fn load_layer_font<I: ProjectIo>(io: &I, glyph_dir: &str) -> ProjectResult<Font> {
    let temp_dir = TempDir::new().map_err(|source| ProjectError::Io {
        operation: "create temporary directory for",
        path: glyph_dir.to_string(),
        source,
    })?;
    let ufo_path = temp_dir.path().join("layer.ufo");
    let target_glyphs = ufo_path.join(DEFAULT_LAYER_DIR);
    tokio::fs::create_dir_all(&target_glyphs)
        .await
        .map_err(|source| ProjectError::Io {
            operation: "stage",
            path: glyph_dir.to_string(),
            source,
        })?;

    let staging = crate::io::DiskIo::new(&ufo_path);
    write_plist(&staging, METAINFO_FILE, &MetaInfo::v3()).await?;
    write_plist(
        &staging,
        LAYER_CONTENTS_FILE,
        &vec![vec![DEFAULT_LAYER_NAME, DEFAULT_LAYER_DIR]],
    )
    .await?;

    let mut copied = 0;
    for name in io.read_dir(glyph_dir).await? {
        if name.ends_with('/') {
            continue;
        }
        let contents = io.read_file(&join_path(glyph_dir, &name)).await?;
        staging
            .write_file(&join_path(DEFAULT_LAYER_DIR, &name), &contents)
            .await?;
        copied += 1;
    }
    debug!("Staged {} files from '{}' for loading", copied, glyph_dir);

    // norad parses synchronously; the staging dir lives until the task ends.
    let loaded = tokio::task::spawn_blocking(move || {
        let font = Font::load(&ufo_path);
        drop(temp_dir);
        font
    })
    .await
    .map_err(|e| ProjectError::GlyphSource {
        path: glyph_dir.to_string(),
        reason: e.to_string(),
    })?;
    loaded.map_err(|e| ProjectError::GlyphSource {
        path: glyph_dir.to_string(),
        reason: e.to_string(),
    })
}
