//! Lightweight per-master handles

/// What the project knows about a master without loading it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterHandle {
    pub name: String,
    /// Project path of the skeleton glyph directory
    pub glyph_set_dir: String,
    /// Rule file of the master, relative to the rules directory
    pub cps_file: String,
}

impl MasterHandle {
    pub fn new(
        name: impl Into<String>,
        glyph_set_dir: impl Into<String>,
        cps_file: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            glyph_set_dir: glyph_set_dir.into(),
            cps_file: cps_file.into(),
        }
    }
}
