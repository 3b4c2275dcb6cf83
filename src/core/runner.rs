//! Application runner logic
//!
//! Executes one CLI command against a project on disk

use crate::core::cli::{CliArgs, Command};
use crate::core::config_file::ConfigFile;
use crate::io::DiskIo;
use crate::logging;
use crate::model::GlyphTree;
use crate::project::registry::generated_skeleton_name;
use crate::project::{BlockingProject, ChangeOutcome, Project, UfoSourceImporter};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

/// Run the command given on the command line
pub fn run_app(cli_args: CliArgs) -> Result<()> {
    if cli_args.command == Command::NewConfig {
        return ConfigFile::initialize_config_directory()
            .context("Failed to initialize config directory");
    }

    let config = ConfigFile::load().unwrap_or_default();
    let level = cli_args.log_level.as_deref().unwrap_or(config.log_level());
    let _guard = logging::init_tracing(level, config.log_to_file())?;

    let io = DiskIo::new(&cli_args.project);
    let mut project = BlockingProject::new(Project::new(io))?;

    if cli_args.command == Command::Init {
        project
            .init()
            .with_context(|| format!("Failed to initialize {:?}", cli_args.project))?;
        println!("Initialized project in {:?}", cli_args.project);
        return Ok(());
    }

    project
        .load()
        .with_context(|| format!("{:?} is not a bezy-project directory", cli_args.project))?;

    match cli_args.command {
        Command::Init | Command::NewConfig => Ok(()),
        Command::Masters => {
            for name in project.project().masters() {
                println!("{name}");
            }
            Ok(())
        }
        Command::CreateMaster {
            name,
            cps_file,
            skeleton,
            properties,
        } => {
            let cps_file = cps_file.unwrap_or_else(|| config.default_cps_file().to_string());
            let skeleton = skeleton.unwrap_or_else(|| generated_skeleton_name(&name));
            let initial = (!properties.is_empty()).then_some(properties);
            let handle = project
                .create_master(&name, &cps_file, &skeleton, initial)
                .with_context(|| format!("Failed to create master '{name}'"))?;
            println!("{} -> {} ({})", handle.name, handle.glyph_set_dir, handle.cps_file);
            Ok(())
        }
        Command::DeleteMaster { name } => project
            .delete_master(&name)
            .with_context(|| format!("Failed to delete master '{name}'")),
        Command::Open { name } => {
            let tree = project
                .open_master(&name)
                .with_context(|| format!("Failed to open master '{name}'"))?;
            print_properties(tree);
            Ok(())
        }
        Command::Import { archive, prefix } => {
            let blob = std::fs::read(&archive)
                .with_context(|| format!("Failed to read {}", archive.display()))?;
            let imported = project
                .import_zipped_masters(&UfoSourceImporter, &blob, &prefix)
                .with_context(|| format!("Failed to import {}", archive.display()))?;
            if imported.is_empty() {
                println!("No UFO sources found in {}", archive.display());
            }
            for master in imported {
                println!("Imported master {} (skeleton {})", master.name, master.skeleton);
            }
            Ok(())
        }
        Command::Layers => {
            for entry in project.layers()?.entries() {
                println!("{}\t{}", entry.name, entry.directory);
            }
            Ok(())
        }
        Command::Watch {
            masters,
            debounce_ms,
        } => {
            for name in &masters {
                project
                    .open_master(name)
                    .with_context(|| format!("Failed to open master '{name}'"))?;
            }
            let debounce_ms = debounce_ms.unwrap_or(config.watch_debounce_ms());
            watch(&mut project, debounce_ms)
        }
    }
}

fn watch(project: &mut BlockingProject<DiskIo>, debounce_ms: u64) -> Result<()> {
    let watcher = project.project().watch_rules(debounce_ms)?;
    info!("Watching for rule changes, press Ctrl-C to stop");
    loop {
        std::thread::sleep(Duration::from_millis(debounce_ms.max(50)));
        for outcome in project.process_watcher_events(&watcher)? {
            if let ChangeOutcome::Updated(update) = outcome {
                println!("{}: updated {}", update.source, update.masters.join(", "));
            }
        }
    }
}

fn print_properties(tree: &GlyphTree) {
    for node in tree.walk_depth_first() {
        let properties = tree.properties(node);
        if properties.is_empty() {
            continue;
        }
        let rendered: Vec<String> = properties
            .iter()
            .map(|property| format!("{}={}", property.name, property.value))
            .collect();
        println!("{}\t{}", tree.path(node), rendered.join(" "));
    }
}
