//! Font-wide data taken over from imported sources: glyph classes from
//! `groups.plist` and the `fontinfo.plist` dictionary

use super::cache::SkeletonLoader;
use super::Project;
use crate::core::errors::{ProjectError, ProjectResult};
use crate::data::ufo::read_plist;
use crate::io::ProjectIo;
use crate::rules::RuleController;
use plist::{Dictionary, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Glyph name → names of the groups it belongs to
pub type GlyphClasses = BTreeMap<String, Vec<String>>;

/// Invert a `groups.plist` mapping
pub fn reverse_groups(groups: &BTreeMap<String, Vec<String>>) -> GlyphClasses {
    let mut classes = GlyphClasses::new();
    for (group, glyphs) in groups {
        for glyph in glyphs {
            classes.entry(glyph.clone()).or_default().push(group.clone());
        }
    }
    classes
}

/// Font info used when the project has no `fontinfo.plist`
pub fn minimal_font_info() -> Dictionary {
    let mut info = Dictionary::new();
    info.insert("familyName".to_string(), Value::String("Untitled".to_string()));
    info.insert("styleName".to_string(), Value::String("Regular".to_string()));
    info.insert("unitsPerEm".to_string(), Value::Integer(1000i64.into()));
    info.insert("ascender".to_string(), Value::Integer(800i64.into()));
    info.insert("descender".to_string(), Value::Integer((-200i64).into()));
    info.insert("xHeight".to_string(), Value::Integer(500i64.into()));
    info.insert("capHeight".to_string(), Value::Integer(700i64.into()));
    info
}

impl<I, R, L> Project<I, R, L>
where
    I: ProjectIo,
    R: RuleController,
    L: SkeletonLoader,
{
    /// For every glyph, the groups that list it
    ///
    /// Read once from `groups.plist`; a project without that file has no
    /// glyph classes.
    pub async fn glyph_classes_reverse_lookup(&mut self) -> ProjectResult<&GlyphClasses> {
        if self.glyph_classes.is_none() {
            let path = self.layout.groups_file();
            let classes = match read_plist::<BTreeMap<String, Vec<String>>, _>(&self.io, &path).await {
                Ok(groups) => reverse_groups(&groups),
                Err(e) if e.is_missing_file() => {
                    warn!("No groups.plist file found, thus no glyph classes are defined");
                    GlyphClasses::new()
                }
                Err(e) => return Err(e),
            };
            debug!("Glyph classes cover {} glyphs", classes.len());
            self.glyph_classes = Some(classes);
        }
        self.glyph_classes
            .as_ref()
            .ok_or_else(|| ProjectError::not_found("glyph classes", GROUPS_NAME))
    }

    /// The project's font info, falling back to a minimal built-in one
    pub async fn font_info(&mut self) -> ProjectResult<&Dictionary> {
        if self.font_info.is_none() {
            let path = self.layout.fontinfo_file();
            let info = match read_plist::<Dictionary, _>(&self.io, &path).await {
                Ok(info) => info,
                Err(e) if e.is_missing_file() => {
                    warn!("No fontinfo found, falling back to minimal builtin fontinfo");
                    minimal_font_info()
                }
                Err(e) => return Err(e),
            };
            self.font_info = Some(info);
        }
        self.font_info
            .as_ref()
            .ok_or_else(|| ProjectError::not_found("font info", FONTINFO_NAME))
    }

    /// Forget cached font-wide data so the next access re-reads the files
    pub fn invalidate_font_data(&mut self) {
        self.glyph_classes = None;
        self.font_info = None;
    }
}

const GROUPS_NAME: &str = super::layout::GROUPS_FILE;
const FONTINFO_NAME: &str = super::layout::FONTINFO_FILE;
