//! Synchronous access to a [`Project`]
//!
//! The CLI and other non-async callers drive the project through a
//! current-thread tokio runtime owned by the wrapper.

use super::cache::{SkeletonLoader, UfoSkeletonLoader};
use super::import::{ImportedMaster, SourceImporter};
use super::master::MasterHandle;
use super::notifier::ChangeOutcome;
use super::watcher::RulesWatcher;
use super::{GlyphClasses, LayerTable, Project};
use crate::core::errors::{ProjectError, ProjectResult};
use crate::io::ProjectIo;
use crate::model::{GlyphTree, Property};
use crate::rules::{MemoryRuleController, RuleController};
use tokio::runtime::{Builder, Runtime};

pub struct BlockingProject<I, R = MemoryRuleController, L = UfoSkeletonLoader> {
    runtime: Runtime,
    project: Project<I, R, L>,
}

impl<I, R, L> BlockingProject<I, R, L>
where
    I: ProjectIo,
    R: RuleController,
    L: SkeletonLoader,
{
    pub fn new(project: Project<I, R, L>) -> ProjectResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| ProjectError::Io {
                operation: "start runtime for",
                path: project.layout().base_dir().to_string(),
                source,
            })?;
        Ok(Self { runtime, project })
    }

    pub fn project(&self) -> &Project<I, R, L> {
        &self.project
    }

    pub fn project_mut(&mut self) -> &mut Project<I, R, L> {
        &mut self.project
    }

    pub fn into_inner(self) -> Project<I, R, L> {
        self.project
    }

    pub fn init(&mut self) -> ProjectResult<()> {
        self.runtime.block_on(self.project.init())
    }

    pub fn load(&mut self) -> ProjectResult<()> {
        self.runtime.block_on(self.project.load())
    }

    pub fn create_master(
        &mut self,
        name: &str,
        cps_file: &str,
        skeleton: &str,
        initial_properties: Option<Vec<Property>>,
    ) -> ProjectResult<MasterHandle> {
        self.runtime
            .block_on(self.project.create_master(name, cps_file, skeleton, initial_properties))
            .cloned()
    }

    pub fn delete_master(&mut self, name: &str) -> ProjectResult<()> {
        self.runtime.block_on(self.project.delete_master(name))
    }

    pub fn open_master(&mut self, name: &str) -> ProjectResult<&GlyphTree> {
        self.runtime.block_on(self.project.open_master(name))
    }

    pub fn master_handle(&mut self, name: &str) -> ProjectResult<MasterHandle> {
        self.runtime.block_on(self.project.master_handle(name)).cloned()
    }

    pub fn layers(&self) -> ProjectResult<LayerTable> {
        self.runtime.block_on(self.project.layers())
    }

    pub fn layer_dir(&self, name: &str) -> ProjectResult<String> {
        self.runtime.block_on(self.project.layer_dir(name))
    }

    pub fn create_layer(&self, name: &str, directory: Option<&str>) -> ProjectResult<String> {
        self.runtime.block_on(self.project.create_layer(name, directory))
    }

    pub fn delete_layer(&self, name: &str) -> ProjectResult<()> {
        self.runtime.block_on(self.project.delete_layer(name))
    }

    pub fn import_zipped_masters<M: SourceImporter>(
        &mut self,
        importer: &M,
        blob: &[u8],
        name_prefix: &str,
    ) -> ProjectResult<Vec<ImportedMaster>> {
        self.runtime
            .block_on(self.project.import_zipped_masters(importer, blob, name_prefix))
    }

    pub fn handle_file_change(&mut self, path: &str) -> ProjectResult<ChangeOutcome> {
        self.runtime.block_on(self.project.handle_file_change(path))
    }

    pub fn process_watcher_events(&mut self, watcher: &RulesWatcher) -> ProjectResult<Vec<ChangeOutcome>> {
        self.runtime.block_on(self.project.process_watcher_events(watcher))
    }

    pub fn glyph_classes_reverse_lookup(&mut self) -> ProjectResult<&GlyphClasses> {
        self.runtime.block_on(self.project.glyph_classes_reverse_lookup())
    }

    pub fn font_info(&mut self) -> ProjectResult<&plist::Dictionary> {
        self.runtime.block_on(self.project.font_info())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryIo;

    #[test]
    fn test_blocking_lifecycle() {
        let mut project = BlockingProject::new(Project::new(MemoryIo::new())).unwrap();
        project.init().unwrap();

        let handle = project
            .create_master("bold", "bold.cps", "public.default", None)
            .unwrap();
        assert_eq!(handle.glyph_set_dir, "glyphs");
        assert_eq!(project.master_handle("bold").unwrap(), handle);
        assert!(project.layers().unwrap().contains("public.default"));

        project.delete_master("bold").unwrap();
        assert!(project.project().masters().is_empty());
        assert!(project.delete_master("bold").unwrap_err().is_not_found());
    }
}
