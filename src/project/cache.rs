//! Skeleton trees, opened masters and master handles
//!
//! Each skeleton layer is loaded once per session. Opening a master clones
//! the shared skeleton tree, so masters built on the same skeleton never see
//! each other's properties.

use super::master::MasterHandle;
use super::resolver::apply_rule_set;
use super::Project;
use crate::core::errors::{ProjectError, ProjectResult};
use crate::data::conversions::tree_from_font;
use crate::data::ufo::load_layer_font;
use crate::io::{join_path, ProjectIo};
use crate::model::GlyphTree;
use crate::rules::RuleController;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Turns a glyph directory into a skeleton tree
#[allow(async_fn_in_trait)]
pub trait SkeletonLoader {
    async fn load_skeleton<I: ProjectIo>(&self, io: &I, glyph_dir: &str) -> ProjectResult<GlyphTree>;
}

/// Loads skeletons from UFO glyph directories with norad
#[derive(Debug, Default, Clone, Copy)]
pub struct UfoSkeletonLoader;

impl SkeletonLoader for UfoSkeletonLoader {
    async fn load_skeleton<I: ProjectIo>(&self, io: &I, glyph_dir: &str) -> ProjectResult<GlyphTree> {
        let font = load_layer_font(io, glyph_dir).await?;
        tree_from_font(&font, false)
    }
}

/// Session caches of a project
#[derive(Debug, Default)]
pub struct MasterCache {
    pub(crate) source_trees: HashMap<String, GlyphTree>,
    pub(crate) handles: HashMap<String, MasterHandle>,
    pub(crate) open: BTreeMap<String, GlyphTree>,
}

impl MasterCache {
    pub fn has_source_tree(&self, skeleton: &str) -> bool {
        self.source_trees.contains_key(skeleton)
    }

    pub fn source_tree_count(&self) -> usize {
        self.source_trees.len()
    }

    pub fn is_open(&self, master: &str) -> bool {
        self.open.contains_key(master)
    }

    /// Drop everything cached for a master that no longer exists
    pub(crate) fn forget_master(&mut self, master: &str) {
        self.handles.remove(master);
        self.open.remove(master);
    }
}

impl<I, R, L> Project<I, R, L>
where
    I: ProjectIo,
    R: RuleController,
    L: SkeletonLoader,
{
    pub fn cache(&self) -> &MasterCache {
        &self.cache
    }

    /// The shared tree of a skeleton layer, loaded on first use
    pub async fn source_tree(&mut self, skeleton: &str) -> ProjectResult<&GlyphTree> {
        if !self.cache.source_trees.contains_key(skeleton) {
            let glyph_dir = self.layer_dir(skeleton).await?;
            let tree = self.loader.load_skeleton(&self.io, &glyph_dir).await?;
            debug!("Loaded skeleton '{}' ({} nodes)", skeleton, tree.len());
            self.cache.source_trees.insert(skeleton.to_string(), tree);
        }
        self.cache
            .source_trees
            .get(skeleton)
            .ok_or_else(|| ProjectError::not_found("skeleton", skeleton))
    }

    /// Make a master available and return its resolved tree
    ///
    /// Opening an already open master returns the existing tree.
    pub async fn open_master(&mut self, name: &str) -> ProjectResult<&GlyphTree> {
        if !self.cache.open.contains_key(name) {
            let config = self.master_config(name)?.clone();
            let mut tree = self.source_tree(&config.skeleton).await?.clone();
            tree.set_master_id(name);
            let resolver = self.resolver();
            resolver.resolve(&config.properties_file, &mut tree).await?;
            if config.cps_file != config.properties_file {
                if let Some(rule_set) = resolver.master_rules(&config.cps_file).await? {
                    let nodes = tree.walk_depth_first();
                    apply_rule_set(resolver.engine, &rule_set, &mut tree, &nodes);
                }
            }

            info!("Opened master '{}' on skeleton '{}'", name, config.skeleton);
            self.cache.open.insert(name.to_string(), tree);
        }
        self.cache
            .open
            .get(name)
            .ok_or_else(|| ProjectError::not_found("master", name))
    }

    /// Handle of a registered master, built once and then cached
    pub async fn master_handle(&mut self, name: &str) -> ProjectResult<&MasterHandle> {
        if !self.cache.handles.contains_key(name) {
            let config = self.master_config(name)?.clone();
            let table = self.layers().await?;
            let glyph_set_dir = join_path(self.layout.base_dir(), table.resolve(&config.skeleton)?);
            let handle = MasterHandle::new(name, glyph_set_dir, config.cps_file);
            self.cache.handles.insert(name.to_string(), handle);
        }
        self.cache
            .handles
            .get(name)
            .ok_or_else(|| ProjectError::not_found("master", name))
    }

    /// Resolved tree of an open master
    pub fn master_tree(&self, name: &str) -> Option<&GlyphTree> {
        self.cache.open.get(name)
    }

    pub fn master_tree_mut(&mut self, name: &str) -> Option<&mut GlyphTree> {
        self.cache.open.get_mut(name)
    }

    /// Names of the open masters in sorted order
    pub fn active_masters(&self) -> Vec<&str> {
        self.cache.open.keys().map(String::as_str).collect()
    }

    /// Drop the resolved tree of a master; returns false if it was not open
    pub fn close_master(&mut self, name: &str) -> bool {
        let closed = self.cache.open.remove(name).is_some();
        if closed {
            debug!("Closed master '{}'", name);
        }
        closed
    }
}
