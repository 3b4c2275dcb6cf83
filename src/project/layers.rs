//! Glyph layers: symbolic names mapped to directories
//!
//! The mapping lives in the UFO `layercontents.plist`, an ordered list of
//! `[name, directory]` pairs. Lookups return the first matching entry.

use crate::core::errors::{ProjectError, ProjectResult};
use crate::data::ufo::{
    read_format_version, read_plist, write_plist, GlyphContents, CONTENTS_FILE,
    DEFAULT_LAYER_DIR, DEFAULT_LAYER_NAME, LAYER_CONTENTS_FILE,
};
use crate::io::{join_path, ProjectIo};
use tracing::debug;

/// One `[name, directory]` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerEntry {
    pub name: String,
    pub directory: String,
}

impl LayerEntry {
    pub fn new(name: impl Into<String>, directory: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
        }
    }
}

/// The ordered layer table of one UFO
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerTable {
    entries: Vec<LayerEntry>,
}

impl LayerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LayerEntry] {
        &self.entries
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// Directory of the first layer called `name`
    pub fn resolve(&self, name: &str) -> ProjectResult<&str> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.directory.as_str())
            .ok_or_else(|| ProjectError::not_found("glyph layer", name))
    }

    /// Append a layer; names must be unique
    pub fn push(&mut self, entry: LayerEntry) -> ProjectResult<()> {
        if self.contains(&entry.name) {
            return Err(ProjectError::already_exists("glyph layer", entry.name));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> ProjectResult<LayerEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.name == name)
            .ok_or_else(|| ProjectError::not_found("glyph layer", name))?;
        Ok(self.entries.remove(index))
    }

    pub async fn load<I: ProjectIo>(io: &I, path: &str) -> ProjectResult<Self> {
        let raw: Vec<Vec<String>> = read_plist(io, path).await?;
        let mut table = Self::new();
        for pair in raw {
            match <[String; 2]>::try_from(pair) {
                Ok([name, directory]) => table.entries.push(LayerEntry { name, directory }),
                Err(pair) => {
                    return Err(ProjectError::malformed(
                        path,
                        format!("expected [name, directory], found {pair:?}"),
                    ))
                }
            }
        }
        Ok(table)
    }

    pub async fn save<I: ProjectIo>(&self, io: &I, path: &str) -> ProjectResult<()> {
        let raw: Vec<[&str; 2]> = self
            .entries
            .iter()
            .map(|entry| [entry.name.as_str(), entry.directory.as_str()])
            .collect();
        write_plist(io, path, &raw).await
    }
}

/// Default directory of a layer that was created without one
pub fn default_layer_dir(name: &str) -> String {
    format!("glyphs.{name}")
}

/// Register a new layer in the UFO at `ufo_dir` and create its directory
/// with an empty `contents.plist`
///
/// Returns the path of the layer directory.
pub async fn create_layer<I: ProjectIo>(
    io: &I,
    ufo_dir: &str,
    name: &str,
    directory: Option<&str>,
) -> ProjectResult<String> {
    let table_path = join_path(ufo_dir, LAYER_CONTENTS_FILE);
    let mut table = LayerTable::load(io, &table_path).await?;
    let directory = directory.map(str::to_string).unwrap_or_else(|| default_layer_dir(name));
    table.push(LayerEntry::new(name, directory.as_str()))?;

    let layer_dir = join_path(ufo_dir, &directory);
    io.ensure_dir(&layer_dir).await?;
    table.save(io, &table_path).await?;
    write_plist(io, &join_path(&layer_dir, CONTENTS_FILE), &GlyphContents::new()).await?;

    debug!("Created glyph layer '{}' in '{}'", name, layer_dir);
    Ok(layer_dir)
}

/// Remove a layer from the table and delete its directory recursively
pub async fn delete_layer<I: ProjectIo>(io: &I, ufo_dir: &str, name: &str) -> ProjectResult<()> {
    let table_path = join_path(ufo_dir, LAYER_CONTENTS_FILE);
    let mut table = LayerTable::load(io, &table_path).await?;
    let entry = table.remove(name)?;
    table.save(io, &table_path).await?;

    let layer_dir = join_path(ufo_dir, &entry.directory);
    match io.remove_dir_all(&layer_dir).await {
        Ok(()) => {}
        Err(e) if e.is_missing_file() => debug!("Layer directory '{}' was already gone", layer_dir),
        Err(e) => return Err(e),
    }

    debug!("Deleted glyph layer '{}'", name);
    Ok(())
}

/// Glyph directory of `layer_name` inside the UFO at `ufo_dir`
///
/// UFOs before format version 3 have a single `glyphs` directory; newer
/// ones are looked up in their layer table, `public.default` by default.
pub async fn glyph_set_dir<I: ProjectIo>(
    io: &I,
    ufo_dir: &str,
    layer_name: Option<&str>,
) -> ProjectResult<String> {
    let version = read_format_version(io, ufo_dir).await?;
    if version < 3 {
        return Ok(join_path(ufo_dir, DEFAULT_LAYER_DIR));
    }

    let table = LayerTable::load(io, &join_path(ufo_dir, LAYER_CONTENTS_FILE)).await?;
    let directory = table.resolve(layer_name.unwrap_or(DEFAULT_LAYER_NAME))?;
    Ok(join_path(ufo_dir, directory))
}
