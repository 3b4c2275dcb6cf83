//! Where things live inside a project directory

use crate::io::join_path;

/// Data directory below the project root
pub const DATA_DIR: &str = "data/org.bezy.project";
pub const DESCRIPTOR_FILE: &str = "project.yaml";
pub const RULES_DIR: &str = "cps";
pub const GENERATED_RULES_DIR: &str = "generated";
pub const GLOBAL_RULES_FILE: &str = "global.cps";
pub const PROPERTIES_DB_DIR: &str = "propertiesDB";
pub const GROUPS_FILE: &str = "groups.plist";
pub const FONTINFO_FILE: &str = "fontinfo.plist";

/// Suffix of properties files handled by the database strategy
pub const DB_SUFFIX: &str = ".db";

/// Paths of a project rooted at `base_dir` of its [`ProjectIo`](crate::io::ProjectIo)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectLayout {
    base_dir: String,
}

impl ProjectLayout {
    pub fn new(base_dir: impl Into<String>) -> Self {
        Self {
            base_dir: crate::io::normalize_path(&base_dir.into()),
        }
    }

    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// A file or directory directly below the project root
    pub fn root_file(&self, name: &str) -> String {
        join_path(&self.base_dir, name)
    }

    pub fn data_dir(&self) -> String {
        self.root_file(DATA_DIR)
    }

    pub fn descriptor_file(&self) -> String {
        join_path(&self.data_dir(), DESCRIPTOR_FILE)
    }

    pub fn rules_dir(&self) -> String {
        join_path(&self.data_dir(), RULES_DIR)
    }

    pub fn generated_rules_dir(&self) -> String {
        join_path(&self.rules_dir(), GENERATED_RULES_DIR)
    }

    /// A rule file addressed by its source name
    pub fn rule_file(&self, source: &str) -> String {
        join_path(&self.rules_dir(), source)
    }

    pub fn properties_db_dir(&self) -> String {
        join_path(&self.data_dir(), PROPERTIES_DB_DIR)
    }

    pub fn metainfo_file(&self) -> String {
        self.root_file(crate::data::ufo::METAINFO_FILE)
    }

    pub fn layer_contents_file(&self) -> String {
        self.root_file(crate::data::ufo::LAYER_CONTENTS_FILE)
    }

    pub fn groups_file(&self) -> String {
        self.root_file(GROUPS_FILE)
    }

    pub fn fontinfo_file(&self) -> String {
        self.root_file(FONTINFO_FILE)
    }
}
