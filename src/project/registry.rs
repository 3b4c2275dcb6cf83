//! Creating and deleting masters

use super::cache::SkeletonLoader;
use super::descriptor::MasterConfig;
use super::layout::DB_SUFFIX;
use super::master::MasterHandle;
use super::properties_db::{remove_db, write_db};
use super::Project;
use crate::core::errors::{ProjectError, ProjectResult};
use crate::io::ProjectIo;
use crate::model::{ElementKind, GlyphTree, Property};
use crate::rules::RuleController;
use tracing::{debug, info, warn};

/// Name of the skeleton layer generated for a master
pub fn generated_skeleton_name(master: &str) -> String {
    format!("skeleton.{master}")
}

impl<I, R, L> Project<I, R, L>
where
    I: ProjectIo,
    R: RuleController,
    L: SkeletonLoader,
{
    /// Register a new master
    ///
    /// Initial properties end up on the master node and are written to the
    /// master's properties database right away. A skeleton named
    /// `skeleton.<name>` gets its own freshly created glyph layer; any other
    /// skeleton has to be a layer of the project already.
    pub async fn create_master(
        &mut self,
        name: &str,
        cps_file: &str,
        skeleton: &str,
        initial_properties: Option<Vec<Property>>,
    ) -> ProjectResult<&MasterHandle> {
        if self.has_master(name) {
            return Err(ProjectError::already_exists("master", name));
        }
        let generated = skeleton == generated_skeleton_name(name);
        if !generated {
            self.layers().await?.resolve(skeleton)?;
        }

        let properties_file = format!("{name}{DB_SUFFIX}");
        if let Some(properties) = initial_properties {
            let mut tree = GlyphTree::new(ElementKind::Master);
            tree.set_master_id(name);
            tree.set_properties(tree.root(), properties);
            write_db(&self.io, &self.layout.properties_db_dir(), &properties_file, &tree).await?;
        }

        if generated {
            self.create_layer(skeleton, None).await?;
        }

        self.descriptor.masters.insert(
            name.to_string(),
            MasterConfig {
                cps_file: cps_file.to_string(),
                properties_file,
                skeleton: skeleton.to_string(),
            },
        );
        self.save_descriptor().await?;

        info!("Created master '{}' (skeleton '{}')", name, skeleton);
        self.master_handle(name).await
    }

    /// Remove a master with its rule file, properties database and
    /// generated skeleton layer
    pub async fn delete_master(&mut self, name: &str) -> ProjectResult<()> {
        let config = self.master_config(name)?.clone();

        let shared_cps = self
            .descriptor
            .masters
            .iter()
            .any(|(other, other_config)| other != name && other_config.cps_file == config.cps_file);
        if shared_cps {
            debug!("Keeping rule file '{}', other masters use it", config.cps_file);
        } else if let Err(e) = self.io.unlink(&self.layout.rule_file(&config.cps_file)).await {
            warn!("Could not remove rule file '{}': {}", config.cps_file, e);
        }

        remove_db(&self.io, &self.layout.properties_db_dir(), &config.properties_file).await?;
        self.save_descriptor().await?;

        if config.skeleton == generated_skeleton_name(name) {
            self.delete_layer(&config.skeleton).await?;
            self.cache.source_trees.remove(&config.skeleton);
        }

        self.descriptor.masters.remove(name);
        self.cache.forget_master(name);
        self.save_descriptor().await?;

        info!("Deleted master '{}'", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryIo;
    use crate::project::properties_db::read_db;

    async fn project() -> Project<MemoryIo> {
        let mut project = Project::new(MemoryIo::new());
        project.init().await.unwrap();
        project
    }

    #[tokio::test]
    async fn test_create_registers_and_persists() {
        let mut project = project().await;
        let handle = project
            .create_master("bold", "bold.cps", "skeleton.bold", None)
            .await
            .unwrap()
            .clone();

        assert_eq!(handle.glyph_set_dir, "glyphs.skeleton.bold");
        assert_eq!(handle.cps_file, "bold.cps");
        assert_eq!(project.master_config("bold").unwrap().properties_file, "bold.db");

        let yaml = project
            .io()
            .read_to_string("data/org.bezy.project/project.yaml")
            .await
            .unwrap();
        assert!(yaml.contains("bold"));
        assert!(project.layers().await.unwrap().contains("skeleton.bold"));
    }

    #[tokio::test]
    async fn test_initial_properties_go_to_database() {
        let mut project = project().await;
        project
            .create_master(
                "light",
                "global.cps",
                "public.default",
                Some(vec![Property::new("weight", "300")]),
            )
            .await
            .unwrap();

        let db = read_db(project.io(), "data/org.bezy.project/propertiesDB", "light.db")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(db.get("/").unwrap(), &[Property::new("weight", "300")]);
        assert!(!project.layers().await.unwrap().contains("skeleton.light"));
    }

    #[tokio::test]
    async fn test_duplicate_create_leaves_registry_unchanged() {
        let mut project = project().await;
        project
            .create_master("bold", "bold.cps", "public.default", None)
            .await
            .unwrap();
        let before = project.descriptor().clone();

        let error = project
            .create_master("bold", "other.cps", "skeleton.bold", None)
            .await
            .unwrap_err();
        assert!(matches!(error, ProjectError::AlreadyExists { .. }));
        assert_eq!(project.descriptor(), &before);
        assert!(!project.layers().await.unwrap().contains("skeleton.bold"));
    }

    #[tokio::test]
    async fn test_unknown_skeleton_layer_is_rejected() {
        let mut project = project().await;
        let error = project
            .create_master("bold", "bold.cps", "nowhere", None)
            .await
            .unwrap_err();
        assert!(error.is_not_found());
        assert!(!project.has_master("bold"));
    }

    #[tokio::test]
    async fn test_delete_removes_files_and_layer() {
        let mut project = project().await;
        project
            .create_master("bold", "bold.cps", "skeleton.bold", Some(vec![Property::new("w", "1")]))
            .await
            .unwrap();
        project
            .io()
            .write_file("data/org.bezy.project/cps/bold.cps", b"/* bold */")
            .await
            .unwrap();

        project.delete_master("bold").await.unwrap();

        let io = project.io();
        assert!(!project.has_master("bold"));
        assert!(!io.path_exists("data/org.bezy.project/cps/bold.cps").await);
        assert!(!io.path_exists("data/org.bezy.project/propertiesDB/bold.db").await);
        assert!(!io.path_exists("glyphs.skeleton.bold").await);
        assert!(!project.layers().await.unwrap().contains("skeleton.bold"));
        assert!(project.master_handle("bold").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_keeps_shared_rule_file_and_tolerates_missing_files() {
        let mut project = project().await;
        project
            .create_master("a", "global.cps", "public.default", None)
            .await
            .unwrap();
        project
            .create_master("b", "global.cps", "public.default", None)
            .await
            .unwrap();

        project.delete_master("a").await.unwrap();
        assert!(project.io().path_exists("data/org.bezy.project/cps/global.cps").await);
        assert_eq!(project.masters(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_delete_unknown_master() {
        let mut project = project().await;
        project.create_master("bold", "bold.cps", "public.default", None).await.unwrap();
        let before = project.descriptor().clone();

        let error = project.delete_master("ghost").await.unwrap_err();
        assert!(error.is_not_found());
        assert_eq!(project.descriptor(), &before);
        assert_eq!(project.masters(), vec!["bold"]);
    }
}
