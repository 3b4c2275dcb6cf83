//! Multi-master font projects
//!
//! A [`Project`] owns the master registry (`project.yaml`), knows where glyph
//! layers, rule files and property databases live, and keeps the session
//! caches of skeleton trees and opened masters.
//!
//! All operations are `async` and run on whatever [`ProjectIo`] the project
//! was built with. [`blocking::BlockingProject`] drives the same operations
//! from synchronous code.

pub mod blocking;
pub mod cache;
pub mod descriptor;
pub mod fontinfo;
pub mod import;
pub mod layers;
pub mod layout;
pub mod master;
pub mod notifier;
pub mod properties_db;
pub mod registry;
pub mod resolver;
pub mod watcher;

pub use blocking::BlockingProject;
pub use cache::{MasterCache, SkeletonLoader, UfoSkeletonLoader};
pub use descriptor::{MasterConfig, ProjectDescriptor};
pub use fontinfo::GlyphClasses;
pub use import::{ImportedMaster, SourceImporter, UfoSourceImporter};
pub use layers::{LayerEntry, LayerTable};
pub use layout::ProjectLayout;
pub use master::MasterHandle;
pub use notifier::{ChangeNotifier, ChangeOutcome, NotifierState, RuleUpdate};
pub use properties_db::PropertiesDb;
pub use resolver::{PropertiesSource, PropertyResolver};
pub use watcher::RulesWatcher;

use crate::core::errors::{ProjectError, ProjectResult};
use crate::data::ufo::{write_plist, MetaInfo, DEFAULT_LAYER_DIR, DEFAULT_LAYER_NAME};
use crate::io::{join_path, ProjectIo};
use crate::rules::{MemoryRuleController, RuleController, SelectorEngine, SimpleSelectorEngine};
use tracing::{debug, info};

/// Contents of the rule file every new project starts with
const GLOBAL_RULES_TEMPLATE: &str = "/* all masters use this rule file by default */\n";

/// A font project with its masters, layers and caches
pub struct Project<I, R = MemoryRuleController, L = UfoSkeletonLoader> {
    io: I,
    layout: ProjectLayout,
    descriptor: ProjectDescriptor,
    rules: R,
    selector_engine: Box<dyn SelectorEngine>,
    loader: L,
    cache: MasterCache,
    notifier: ChangeNotifier,
    glyph_classes: Option<GlyphClasses>,
    font_info: Option<plist::Dictionary>,
}

impl<I: ProjectIo> Project<I> {
    /// A project with in-memory rules and the norad skeleton loader
    pub fn new(io: I) -> Self {
        Self::with_collaborators(io, MemoryRuleController::new(), UfoSkeletonLoader)
    }
}

impl<I, R, L> Project<I, R, L>
where
    I: ProjectIo,
    R: RuleController,
    L: SkeletonLoader,
{
    pub fn with_collaborators(io: I, rules: R, loader: L) -> Self {
        Self {
            io,
            layout: ProjectLayout::default(),
            descriptor: ProjectDescriptor::default(),
            rules,
            selector_engine: Box::new(SimpleSelectorEngine),
            loader,
            cache: MasterCache::default(),
            notifier: ChangeNotifier::default(),
            glyph_classes: None,
            font_info: None,
        }
    }

    /// Place the project in a subdirectory of its storage
    pub fn with_base_dir(mut self, base_dir: impl Into<String>) -> Self {
        self.layout = ProjectLayout::new(base_dir);
        self
    }

    pub fn with_selector_engine(mut self, engine: impl SelectorEngine + 'static) -> Self {
        self.selector_engine = Box::new(engine);
        self
    }

    pub fn io(&self) -> &I {
        &self.io
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn descriptor(&self) -> &ProjectDescriptor {
        &self.descriptor
    }

    /// Create the directory layout of an empty project
    pub async fn init(&mut self) -> ProjectResult<()> {
        let layout = self.layout.clone();
        self.io.ensure_dir(layout.base_dir()).await?;
        write_plist(&self.io, &layout.metainfo_file(), &MetaInfo::v3()).await?;

        self.io.ensure_dir(&layout.data_dir()).await?;
        self.save_descriptor().await?;
        self.io.ensure_dir(&layout.rules_dir()).await?;
        self.io.ensure_dir(&layout.generated_rules_dir()).await?;
        self.io.ensure_dir(&layout.properties_db_dir()).await?;

        LayerTable::new().save(&self.io, &layout.layer_contents_file()).await?;
        self.create_layer(DEFAULT_LAYER_NAME, Some(DEFAULT_LAYER_DIR)).await?;

        self.io
            .write_file(
                &layout.rule_file(layout::GLOBAL_RULES_FILE),
                GLOBAL_RULES_TEMPLATE.as_bytes(),
            )
            .await?;

        info!("Initialized project in '{}'", display_dir(layout.base_dir()));
        Ok(())
    }

    /// Read the descriptor of an existing project
    pub async fn load(&mut self) -> ProjectResult<()> {
        let path = self.layout.descriptor_file();
        debug!("Loading {}", path);
        self.descriptor = ProjectDescriptor::read(&self.io, &path).await?;
        info!(
            "Loaded project '{}' with {} masters",
            display_dir(self.layout.base_dir()),
            self.descriptor.masters.len()
        );
        Ok(())
    }

    pub(crate) async fn save_descriptor(&self) -> ProjectResult<()> {
        self.descriptor.write(&self.io, &self.layout.descriptor_file()).await
    }

    pub fn has_master(&self, name: &str) -> bool {
        self.descriptor.masters.contains_key(name)
    }

    /// Registered master names in sorted order
    pub fn masters(&self) -> Vec<&str> {
        self.descriptor.masters.keys().map(String::as_str).collect()
    }

    pub fn master_config(&self, name: &str) -> ProjectResult<&MasterConfig> {
        self.descriptor
            .masters
            .get(name)
            .ok_or_else(|| ProjectError::not_found("master", name))
    }

    /// The project's layer table
    pub async fn layers(&self) -> ProjectResult<LayerTable> {
        LayerTable::load(&self.io, &self.layout.layer_contents_file()).await
    }

    /// Directory of a glyph layer; fails if the directory is missing even
    /// though the table mentions it
    pub async fn layer_dir(&self, name: &str) -> ProjectResult<String> {
        let table = self.layers().await?;
        let directory = join_path(self.layout.base_dir(), table.resolve(name)?);
        if !self.io.path_exists(&directory).await {
            return Err(ProjectError::not_found("glyph layer directory", directory));
        }
        Ok(directory)
    }

    /// Add a glyph layer; the directory defaults to `glyphs.<name>`
    pub async fn create_layer(&self, name: &str, directory: Option<&str>) -> ProjectResult<String> {
        layers::create_layer(&self.io, self.layout.base_dir(), name, directory).await
    }

    pub async fn delete_layer(&self, name: &str) -> ProjectResult<()> {
        layers::delete_layer(&self.io, self.layout.base_dir(), name).await
    }

    pub(crate) fn resolver(&self) -> PropertyResolver<'_, I, R> {
        PropertyResolver {
            io: &self.io,
            db_dir: self.layout.properties_db_dir(),
            rules: &self.rules,
            engine: self.selector_engine.as_ref(),
        }
    }
}

fn display_dir(dir: &str) -> &str {
    if dir.is_empty() {
        "."
    } else {
        dir
    }
}
