//! Importing masters from UFO sources and zipped uploads
//!
//! An upload is a zip archive whose top level holds `.ufo` directories
//! and/or `*.ufo.zip` archives that each contain one `.ufo` directory.

use super::cache::SkeletonLoader;
use super::layout::{FONTINFO_FILE, GROUPS_FILE};
use super::properties_db::write_db;
use super::registry::generated_skeleton_name;
use super::Project;
use crate::core::errors::{ProjectError, ProjectResult};
use crate::data::conversions::tree_from_glyphs;
use crate::data::ufo::{load_layer_font, read_plist, write_plist, GlyphContents, CONTENTS_FILE};
use crate::io::{archive, join_path, MemoryIo, ProjectIo};
use crate::model::GlyphTree;
use crate::rules::RuleController;
use tracing::{debug, info, warn};

pub const ZIPPED_UFO_SUFFIX: &str = ".ufo.zip";
pub const UFO_DIR_SUFFIX: &str = ".ufo/";

/// A master created by an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedMaster {
    pub name: String,
    pub skeleton: String,
}

/// Master name for a top-level `.ufo/` entry of an upload
///
/// Spaces are not allowed in master names and become underscores.
pub fn master_name_from_entry(prefix: &str, entry: &str) -> String {
    let full = format!("{prefix}{entry}");
    let stem = full.split(UFO_DIR_SUFFIX).next().unwrap_or_default();
    stem.replace(' ', "_")
}

/// Copies the glyph sources of a single UFO into a project layer
#[allow(async_fn_in_trait)]
pub trait SourceImporter {
    /// Copy the glyphs of the UFO at `source_dir` into `target_dir` and
    /// return a master tree carrying the imported properties
    ///
    /// `glyphs` restricts the import to the named glyphs.
    async fn import_glyphs<S: ProjectIo, T: ProjectIo>(
        &self,
        source_io: &S,
        source_dir: &str,
        glyphs: Option<&[String]>,
        target_io: &T,
        target_dir: &str,
    ) -> ProjectResult<GlyphTree>;
}

/// Imports the default layer of a UFO with norad
#[derive(Debug, Default, Clone, Copy)]
pub struct UfoSourceImporter;

impl SourceImporter for UfoSourceImporter {
    async fn import_glyphs<S: ProjectIo, T: ProjectIo>(
        &self,
        source_io: &S,
        source_dir: &str,
        glyphs: Option<&[String]>,
        target_io: &T,
        target_dir: &str,
    ) -> ProjectResult<GlyphTree> {
        let glyph_dir = super::layers::glyph_set_dir(source_io, source_dir, None).await?;
        let wanted = |name: &str| glyphs.is_none_or(|names| names.iter().any(|n| n == name));

        let contents: GlyphContents = read_plist(source_io, &join_path(&glyph_dir, CONTENTS_FILE)).await?;
        let mut copied = GlyphContents::new();
        for (name, file) in contents.iter().filter(|(name, _)| wanted(name)) {
            let bytes = source_io.read_file(&join_path(&glyph_dir, file)).await?;
            target_io.write_file(&join_path(target_dir, file), &bytes).await?;
            copied.insert(name.clone(), file.clone());
        }
        write_plist(target_io, &join_path(target_dir, CONTENTS_FILE), &copied).await?;

        let font = load_layer_font(source_io, &glyph_dir).await?;
        let tree = tree_from_glyphs(
            font.default_layer().iter().filter(|glyph| wanted(glyph.name().as_str())),
            true,
        )?;
        info!("Imported {} glyphs from '{}'", copied.len(), source_dir);
        Ok(tree)
    }
}

impl<I, R, L> Project<I, R, L>
where
    I: ProjectIo,
    R: RuleController,
    L: SkeletonLoader,
{
    /// Import the first UFO found in a zipped upload
    ///
    /// Only one master is imported per upload; further sources are ignored.
    pub async fn import_zipped_masters<M: SourceImporter>(
        &mut self,
        importer: &M,
        blob: &[u8],
        name_prefix: &str,
    ) -> ProjectResult<Vec<ImportedMaster>> {
        let upload = MemoryIo::new();
        archive::unpack(blob, &upload, "").await?;

        for entry in upload.read_dir("").await? {
            if !entry.ends_with(ZIPPED_UFO_SUFFIX) {
                continue;
            }
            let nested = upload.read_file(&entry).await?;
            upload.unlink(&entry).await?;
            archive::unpack(&nested, &upload, "").await?;
            debug!("Unpacked nested archive '{}'", entry);
        }

        let mut imported = Vec::new();
        let entries = upload.read_dir("").await?;
        let Some(entry) = entries.iter().find(|entry| entry.ends_with(UFO_DIR_SUFFIX)) else {
            warn!("No UFO sources found in the upload");
            return Ok(imported);
        };

        let name = master_name_from_entry(name_prefix, entry);
        let source_dir = entry.trim_end_matches('/');
        self.import_master(importer, &name, source_dir, None, &upload, true).await?;
        imported.push(ImportedMaster {
            skeleton: self.master_config(&name)?.skeleton.clone(),
            name,
        });
        Ok(imported)
    }

    /// Create master `name` from the UFO at `source_dir` of `source_io`
    ///
    /// The master gets its own rule file and skeleton layer, is opened with
    /// the imported properties and, when `save_db` is set, those properties
    /// are persisted. `groups.plist` and `fontinfo.plist` are taken over if
    /// the project has none yet.
    pub async fn import_master<M: SourceImporter, S: ProjectIo>(
        &mut self,
        importer: &M,
        name: &str,
        source_dir: &str,
        glyphs: Option<&[String]>,
        source_io: &S,
        save_db: bool,
    ) -> ProjectResult<&GlyphTree> {
        let cps_file = format!("{name}.cps");
        let skeleton = generated_skeleton_name(name);
        self.create_master(name, &cps_file, &skeleton, None).await?;

        let rule_file = self.layout.rule_file(&cps_file);
        if !self.io.path_exists(&rule_file).await {
            let header = format!("/* rules of master {name} */\n");
            self.io.write_file(&rule_file, header.as_bytes()).await?;
        }

        let target_dir = self.layer_dir(&skeleton).await?;
        let mut tree = importer
            .import_glyphs(source_io, source_dir, glyphs, &self.io, &target_dir)
            .await?;
        tree.set_master_id(name);

        if save_db {
            let config = self.master_config(name)?;
            write_db(&self.io, &self.layout.properties_db_dir(), &config.properties_file, &tree).await?;
        }

        self.cache.source_trees.remove(&skeleton);
        self.cache.open.insert(name.to_string(), tree);

        if self.import_plist_file(source_io, source_dir, GROUPS_FILE, false).await? {
            self.glyph_classes = None;
        }
        if self.import_plist_file(source_io, source_dir, FONTINFO_FILE, false).await? {
            self.font_info = None;
        }

        info!("Imported master '{}' from '{}'", name, source_dir);
        self.cache
            .open
            .get(name)
            .ok_or_else(|| ProjectError::not_found("master", name))
    }

    /// Copy a plist file from an imported UFO into the project root
    ///
    /// An existing project file is only replaced with `override_existing`.
    /// Content that does not parse as a plist is copied anyway. Returns
    /// whether the file was copied.
    pub async fn import_plist_file<S: ProjectIo>(
        &self,
        source_io: &S,
        source_dir: &str,
        file_name: &str,
        override_existing: bool,
    ) -> ProjectResult<bool> {
        let source = join_path(source_dir, file_name);
        let target = self.layout.root_file(file_name);

        let target_exists = self.io.path_exists(&target).await;
        if target_exists && !override_existing {
            warn!("{} exists in the project, skipping import", file_name);
            return Ok(false);
        }
        if !source_io.path_exists(&source).await {
            warn!("No {} found for import", file_name);
            return Ok(false);
        }

        if target_exists {
            warn!("The existing {} will be overridden", file_name);
        }
        let content = source_io.read_file(&source).await?;
        if let Err(e) = plist::Value::from_reader(std::io::Cursor::new(&content)) {
            warn!("{} does not parse as a plist, copying it anyway: {}", file_name, e);
        }
        self.io.write_file(&target, &content).await?;
        info!("Imported {} into the project", file_name);
        Ok(true)
    }
}
