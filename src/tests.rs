//! Cross-module scenarios: caching, resolution, change handling and import

use crate::core::errors::{ProjectError, ProjectResult};
use crate::io::{MemoryIo, ProjectIo};
use crate::model::{ElementKind, GlyphTree, Property};
use crate::project::{ChangeOutcome, Project, RuleUpdate, SkeletonLoader};
use crate::rules::{MemoryRuleController, Rule, RuleController, RuleSet};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const RULES_DIR: &str = "data/org.bezy.project/cps";

/// Builds a fixed skeleton and counts how often it was asked to
#[derive(Debug, Default)]
struct CountingLoader {
    loads: AtomicUsize,
}

impl SkeletonLoader for CountingLoader {
    async fn load_skeleton<I: ProjectIo>(&self, _io: &I, _glyph_dir: &str) -> ProjectResult<GlyphTree> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let mut tree = GlyphTree::new(ElementKind::Master);
        for name in ["a", "b"] {
            let glyph = tree.append_child(tree.root(), ElementKind::Glyph)?;
            tree.element_mut(glyph).id = Some(name.to_string());
            tree.append_child(glyph, ElementKind::Contour)?;
        }
        Ok(tree)
    }
}

/// In-memory rules that count every controller call and can be told to
/// fail reloads
#[derive(Debug, Default)]
struct ScriptedRules {
    inner: MemoryRuleController,
    calls: AtomicUsize,
    fail_replace: AtomicBool,
}

impl RuleController for ScriptedRules {
    async fn get_rule(&self, source: &str) -> ProjectResult<RuleSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_rule(source).await
    }

    async fn replace_rule(&self, source: &str) -> ProjectResult<RuleSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(ProjectError::malformed(source, "unexpected end of rule"));
        }
        self.inner.replace_rule(source).await
    }
}

type TestProject = Project<MemoryIo, ScriptedRules, CountingLoader>;

async fn project() -> TestProject {
    let mut project = Project::with_collaborators(
        MemoryIo::new(),
        ScriptedRules::default(),
        CountingLoader::default(),
    );
    project.init().await.unwrap();
    project
}

/// A project whose master `bold` takes its properties from `bold.cps`
async fn rule_project(rules: Vec<Rule>) -> TestProject {
    let mut project = project().await;
    project.rules().inner.insert("bold.cps", rules);
    project
        .io()
        .write_file(
            "data/org.bezy.project/project.yaml",
            b"masters:\n  bold:\n    cpsFile: bold.cps\n    propertiesFile: bold.cps\n    skeleton: public.default\n",
        )
        .await
        .unwrap();
    project.load().await.unwrap();
    project
}

fn weight_rules(weight: &str) -> Vec<Rule> {
    vec![Rule::new("glyph", vec![Property::new("weight", weight)])]
}

mod cache {
    use super::*;

    #[tokio::test]
    async fn test_skeleton_is_loaded_once_per_session() {
        let mut project = project().await;
        project.create_master("light", "global.cps", "public.default", None).await.unwrap();
        project.create_master("bold", "global.cps", "public.default", None).await.unwrap();

        project.open_master("light").await.unwrap();
        project.open_master("bold").await.unwrap();

        assert_eq!(project.loader_loads(), 1);
        assert_eq!(project.cache().source_tree_count(), 1);
        assert!(project.cache().has_source_tree("public.default"));
        assert_eq!(project.active_masters(), vec!["bold", "light"]);
    }

    #[tokio::test]
    async fn test_masters_on_one_skeleton_are_isolated() {
        let mut project = project().await;
        project.create_master("light", "global.cps", "public.default", None).await.unwrap();
        project.create_master("bold", "global.cps", "public.default", None).await.unwrap();
        project.open_master("light").await.unwrap();
        project.open_master("bold").await.unwrap();

        let light = project.master_tree_mut("light").unwrap();
        let glyph = light.find(ElementKind::Glyph, "a").unwrap();
        light.set_property(glyph, "weight", "300");

        let bold = project.master_tree("bold").unwrap();
        assert_eq!(bold.master_id(), Some("bold"));
        assert!(bold.properties(glyph).is_empty());
        let skeleton = project.source_tree("public.default").await.unwrap();
        assert!(skeleton.properties(glyph).is_empty());
        assert_eq!(skeleton.master_id(), None);
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let mut project = project().await;
        project.create_master("bold", "global.cps", "public.default", None).await.unwrap();
        project.open_master("bold").await.unwrap();

        let tree = project.master_tree_mut("bold").unwrap();
        let glyph = tree.find(ElementKind::Glyph, "b").unwrap();
        tree.set_property(glyph, "edited", "1");

        let reopened = project.open_master("bold").await.unwrap();
        assert_eq!(reopened.element(glyph).property("edited"), Some("1"));
        assert_eq!(project.loader_loads(), 1);

        assert!(project.close_master("bold"));
        assert!(!project.close_master("bold"));
        let fresh = project.open_master("bold").await.unwrap();
        assert!(fresh.properties(glyph).is_empty());
    }

    #[tokio::test]
    async fn test_master_handles_are_cached() {
        let mut project = project().await;
        project.create_master("bold", "bold.cps", "skeleton.bold", None).await.unwrap();

        let first = project.master_handle("bold").await.unwrap().clone();
        assert_eq!(first.glyph_set_dir, "glyphs.skeleton.bold");

        project.io().remove_dir_all("glyphs.skeleton.bold").await.unwrap();
        assert_eq!(project.master_handle("bold").await.unwrap(), &first);
        assert!(project.master_handle("ghost").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_open_unknown_master() {
        let mut project = project().await;
        assert!(project.open_master("ghost").await.unwrap_err().is_not_found());
        assert_eq!(project.loader_loads(), 0);
    }

    impl TestProject {
        fn loader_loads(&self) -> usize {
            self.loader().loads.load(Ordering::SeqCst)
        }
    }
}

mod registry {
    use super::*;
    use crate::project::properties_db::write_db;

    #[tokio::test]
    async fn test_duplicate_create_and_unknown_delete() {
        let mut project = project().await;
        project.create_master("bold", "bold.cps", "skeleton.bold", None).await.unwrap();
        let before = project.descriptor().clone();
        let layers_before = project.layers().await.unwrap();

        let error = project
            .create_master("bold", "bold.cps", "skeleton.bold", None)
            .await
            .unwrap_err();
        assert!(matches!(error, ProjectError::AlreadyExists { .. }));
        assert_eq!(project.descriptor(), &before);
        assert_eq!(project.layers().await.unwrap(), layers_before);

        assert!(project.delete_master("ghost").await.unwrap_err().is_not_found());
        assert_eq!(project.descriptor(), &before);
    }

    #[tokio::test]
    async fn test_layer_cycle() {
        let project = project().await;
        let dir = project.create_layer("extra", None).await.unwrap();
        assert_eq!(dir, "glyphs.extra");
        assert_eq!(project.layer_dir("extra").await.unwrap(), "glyphs.extra");

        let error = project.create_layer("extra", Some("elsewhere")).await.unwrap_err();
        assert!(matches!(error, ProjectError::AlreadyExists { .. }));

        project.delete_layer("extra").await.unwrap();
        assert!(!project.io().path_exists("glyphs.extra").await);
        assert!(project.layer_dir("extra").await.unwrap_err().is_not_found());
        assert!(project.delete_layer("extra").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_database_survives_reopen() {
        let mut project = project().await;
        project.create_master("bold", "bold.cps", "public.default", None).await.unwrap();
        let tree = project.open_master("bold").await.unwrap();
        let glyph = tree.find(ElementKind::Glyph, "a").unwrap();

        let mut edited = tree.clone();
        edited.set_property(glyph, "advanceWidth", "620");
        let db_dir = project.layout().properties_db_dir();
        write_db(project.io(), &db_dir, "bold.db", &edited).await.unwrap();

        project.close_master("bold");
        let reopened = project.open_master("bold").await.unwrap();
        assert_eq!(reopened.element(glyph).property("advanceWidth"), Some("620"));
        assert!(!project.rules().inner.is_loaded("bold.cps"));
    }

    #[tokio::test]
    async fn test_deleting_generated_skeleton_drops_cached_tree() {
        let mut project = project().await;
        project.create_master("bold", "bold.cps", "skeleton.bold", None).await.unwrap();
        project.open_master("bold").await.unwrap();
        assert!(project.cache().has_source_tree("skeleton.bold"));

        project.delete_master("bold").await.unwrap();
        assert!(!project.cache().has_source_tree("skeleton.bold"));
        assert!(!project.cache().is_open("bold"));
        assert!(project.active_masters().is_empty());
    }
}

mod notifications {
    use super::*;

    #[tokio::test]
    async fn test_change_outside_rules_dir_is_ignored() {
        let mut project = rule_project(weight_rules("700")).await;
        project.open_master("bold").await.unwrap();
        let calls_after_open = project.rules().calls.load(Ordering::SeqCst);

        let updates = Rc::new(Cell::new(0));
        let seen = Rc::clone(&updates);
        project.set_update_handlers(Some(Box::new(move |_: &RuleUpdate| seen.set(seen.get() + 1))), None);

        for path in ["glyphs/a.glif", "data/org.bezy.project/cpsx/bold.cps", RULES_DIR] {
            let outcome = project.handle_file_change(path).await.unwrap();
            assert_eq!(outcome, ChangeOutcome::Ignored);
        }
        assert_eq!(project.rules().calls.load(Ordering::SeqCst), calls_after_open);
        assert_eq!(updates.get(), 0);
    }

    #[tokio::test]
    async fn test_rule_change_updates_open_masters() {
        let mut project = rule_project(weight_rules("700")).await;
        let tree = project.open_master("bold").await.unwrap();
        let glyph = tree.find(ElementKind::Glyph, "a").unwrap();
        assert_eq!(tree.element(glyph).property("weight"), Some("700"));

        let received = Rc::new(Cell::new(0));
        let seen = Rc::clone(&received);
        project.set_update_handlers(
            Some(Box::new(move |update: &RuleUpdate| {
                assert_eq!(update.masters, vec!["bold"]);
                seen.set(seen.get() + 1);
            })),
            None,
        );

        project.rules().inner.insert("bold.cps", weight_rules("900"));
        let outcome = project
            .handle_file_change("data/org.bezy.project/cps/bold.cps")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ChangeOutcome::Updated(RuleUpdate {
                source: "bold.cps".to_string(),
                masters: vec!["bold".to_string()],
            })
        );
        assert_eq!(received.get(), 1);
        let tree = project.master_tree("bold").unwrap();
        assert_eq!(tree.element(glyph).property("weight"), Some("900"));
    }

    #[tokio::test]
    async fn test_unused_source_and_closed_masters() {
        let mut project = rule_project(weight_rules("700")).await;

        let outcome = project
            .handle_file_change("data/org.bezy.project/cps/bold.cps")
            .await
            .unwrap();
        assert_eq!(outcome, ChangeOutcome::Unused);

        project.open_master("bold").await.unwrap();
        project.close_master("bold");
        let outcome = project
            .handle_file_change("data/org.bezy.project/cps/bold.cps")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ChangeOutcome::Updated(RuleUpdate {
                source: "bold.cps".to_string(),
                masters: Vec::new(),
            })
        );
    }

    #[tokio::test]
    async fn test_rule_resolution_is_idempotent() {
        let mut project = rule_project(weight_rules("700")).await;
        let before = project.open_master("bold").await.unwrap().clone();

        let paths = ["data/org.bezy.project/cps/bold.cps"; 2];
        let outcomes = project.handle_file_changes(paths).await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(project.master_tree("bold"), Some(&before));
    }

    #[tokio::test]
    async fn test_failures_go_to_the_failure_handler() {
        let mut project = rule_project(weight_rules("700")).await;
        project.open_master("bold").await.unwrap();
        project.rules().fail_replace.store(true, Ordering::SeqCst);

        let failures = Rc::new(Cell::new(0));
        let seen = Rc::clone(&failures);
        project.set_update_handlers(
            None,
            Some(Box::new(move |error: &ProjectError| {
                assert!(matches!(error, ProjectError::Malformed { .. }));
                seen.set(seen.get() + 1);
            })),
        );

        let outcome = project
            .handle_file_change("data/org.bezy.project/cps/bold.cps")
            .await
            .unwrap();
        assert_eq!(outcome, ChangeOutcome::Failed);
        assert_eq!(failures.get(), 1);
    }

    #[tokio::test]
    async fn test_failures_propagate_without_handler() {
        let mut project = rule_project(weight_rules("700")).await;
        project.open_master("bold").await.unwrap();
        project.rules().fail_replace.store(true, Ordering::SeqCst);

        let error = project
            .handle_file_change("data/org.bezy.project/cps/bold.cps")
            .await
            .unwrap_err();
        assert!(matches!(error, ProjectError::Malformed { .. }));
        assert_eq!(project.notifier().state(), crate::project::NotifierState::Idle);
    }

    #[tokio::test]
    async fn test_failed_batch_is_not_replayed() {
        let mut project = rule_project(weight_rules("700")).await;
        project.open_master("bold").await.unwrap();
        project.rules().fail_replace.store(true, Ordering::SeqCst);

        let batch = [
            "data/org.bezy.project/cps/bold.cps",
            "glyphs/a.glif",
            "data/org.bezy.project/cps/bold.cps",
        ];
        let error = project.handle_file_changes(batch).await.unwrap_err();
        assert!(matches!(error, ProjectError::Malformed { .. }));

        project.rules().fail_replace.store(false, Ordering::SeqCst);
        let calls_after_failure = project.rules().calls.load(Ordering::SeqCst);
        let updates = Rc::new(Cell::new(0));
        let seen = Rc::clone(&updates);
        project.set_update_handlers(Some(Box::new(move |_: &RuleUpdate| seen.set(seen.get() + 1))), None);

        let outcomes = project.handle_file_changes(["glyphs/b.glif"]).await.unwrap();
        assert_eq!(outcomes, vec![ChangeOutcome::Ignored]);
        assert_eq!(project.rules().calls.load(Ordering::SeqCst), calls_after_failure);
        assert_eq!(updates.get(), 0);
    }

    #[tokio::test]
    async fn test_bound_rule_file_updates_database_master() {
        let mut project = project().await;
        project.create_master("bold", "bold.cps", "public.default", None).await.unwrap();
        project.rules().inner.insert("bold.cps", weight_rules("700"));

        let tree = project.open_master("bold").await.unwrap();
        let glyph = tree.find(ElementKind::Glyph, "a").unwrap();
        assert_eq!(tree.element(glyph).property("weight"), Some("700"));

        project.rules().inner.insert("bold.cps", weight_rules("900"));
        let outcome = project
            .handle_file_change("data/org.bezy.project/cps/bold.cps")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ChangeOutcome::Updated(RuleUpdate {
                source: "bold.cps".to_string(),
                masters: vec!["bold".to_string()],
            })
        );
        let tree = project.master_tree("bold").unwrap();
        assert_eq!(tree.element(glyph).property("weight"), Some("900"));
    }
}

mod import {
    use super::*;
    use crate::data::ufo::read_plist;
    use crate::io::archive::tests::zip_blob;
    use crate::project::import::tests::write_source_ufo;
    use crate::project::{ImportedMaster, UfoSourceImporter};

    const UFO_FILES: [&str; 4] = [
        "alpha.ufo/metainfo.plist",
        "alpha.ufo/layercontents.plist",
        "alpha.ufo/glyphs/contents.plist",
        "alpha.ufo/glyphs/a.glif",
    ];

    async fn nested_upload() -> Vec<u8> {
        let staging = MemoryIo::new();
        write_source_ufo(&staging, "alpha.ufo").await;
        let mut files = Vec::new();
        for path in UFO_FILES {
            files.push((path, staging.read_file(path).await.unwrap()));
        }
        let inner = zip_blob(&files);
        zip_blob(&[("alpha.ufo.zip", inner)])
    }

    #[tokio::test]
    async fn test_nested_archive_becomes_master() {
        let mut project = Project::new(MemoryIo::new());
        project.init().await.unwrap();

        let imported = project
            .import_zipped_masters(&UfoSourceImporter, &nested_upload().await, "")
            .await
            .unwrap();

        assert_eq!(
            imported,
            vec![ImportedMaster {
                name: "alpha".to_string(),
                skeleton: "skeleton.alpha".to_string(),
            }]
        );
        assert!(project.cache().is_open("alpha"));

        let tree = project.master_tree("alpha").unwrap();
        assert_eq!(tree.master_id(), Some("alpha"));
        let glyph = tree.find(ElementKind::Glyph, "a").unwrap();
        assert_eq!(tree.element(glyph).property("advanceWidth"), Some("500"));

        let io = project.io();
        assert!(io.path_exists("glyphs.skeleton.alpha/a.glif").await);
        assert!(io.path_exists("data/org.bezy.project/cps/alpha.cps").await);
        assert!(io.path_exists("data/org.bezy.project/propertiesDB/alpha.db").await);
        let contents: std::collections::BTreeMap<String, String> =
            read_plist(io, "glyphs.skeleton.alpha/contents.plist").await.unwrap();
        assert_eq!(contents.get("a").map(String::as_str), Some("a.glif"));
    }

    #[tokio::test]
    async fn test_imported_master_reopens_from_database() {
        let mut project = Project::new(MemoryIo::new());
        project.init().await.unwrap();
        project
            .import_zipped_masters(&UfoSourceImporter, &nested_upload().await, "v2-")
            .await
            .unwrap();

        assert!(project.close_master("v2-alpha"));
        let tree = project.open_master("v2-alpha").await.unwrap();
        let glyph = tree.find(ElementKind::Glyph, "a").unwrap();
        assert_eq!(tree.element(glyph).property("advanceWidth"), Some("500"));
    }

    #[tokio::test]
    async fn test_upload_without_sources() {
        let mut project = Project::new(MemoryIo::new());
        project.init().await.unwrap();
        let blob = zip_blob(&[("readme.txt", "nothing here")]);

        let imported = project
            .import_zipped_masters(&UfoSourceImporter, &blob, "")
            .await
            .unwrap();
        assert!(imported.is_empty());
        assert!(project.masters().is_empty());
    }
}
