//! Filesystem watcher for the rules directory
//!
//! Uses the platform's native backend when available and falls back to
//! polling otherwise. Changes are reported as project paths so they can be
//! fed straight into [`Project::handle_file_changes`].

use super::cache::SkeletonLoader;
use super::notifier::ChangeOutcome;
use super::Project;
use crate::core::errors::{ProjectError, ProjectResult};
use crate::io::ProjectIo;
use crate::rules::RuleController;
use notify::{Config as NotifyConfig, Event, PollWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// A changed file below the watched rules directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFileEvent {
    /// Path relative to the project storage root, `/` separated
    pub path: String,
}

pub struct RulesWatcher {
    _watcher: Box<dyn Watcher + Send>,
    event_receiver: Receiver<RuleFileEvent>,
}

impl std::fmt::Debug for RulesWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulesWatcher").finish_non_exhaustive()
    }
}

/// Project path of `path`, if it lies below `root`
fn relative_project_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!segments.is_empty()).then(|| segments.join("/"))
}

fn make_event_handler(
    root: PathBuf,
    debounce_delay: Duration,
    tx: Sender<RuleFileEvent>,
    last_events: Arc<Mutex<HashMap<PathBuf, Instant>>>,
) -> impl Fn(Result<Event, notify::Error>) + Send + 'static {
    move |result: Result<Event, notify::Error>| {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                warn!("Rules watcher error: {}", e);
                return;
            }
        };
        if !matches!(
            event.kind,
            notify::EventKind::Modify(_) | notify::EventKind::Create(_)
        ) {
            return;
        }

        for path in event.paths {
            if path.is_dir() {
                continue;
            }
            let should_send = {
                let now = Instant::now();
                let mut last = last_events.lock();
                match last.get(&path) {
                    Some(seen) if now.duration_since(*seen) < debounce_delay => false,
                    _ => {
                        last.insert(path.clone(), now);
                        true
                    }
                }
            };
            if !should_send {
                trace!("Debouncing change of {}", path.display());
                continue;
            }

            let Some(project_path) = relative_project_path(&root, &path) else {
                continue;
            };
            debug!("Rule file changed: {}", project_path);
            if let Err(e) = tx.send(RuleFileEvent { path: project_path }) {
                error!("Failed to send rule file event: {}", e);
            }
        }
    }
}

impl RulesWatcher {
    /// Watch `rules_dir` recursively and report paths relative to `root`
    pub fn new(root: &Path, rules_dir: &Path, debounce_delay_ms: u64) -> ProjectResult<Self> {
        if !rules_dir.is_dir() {
            return Err(ProjectError::not_found(
                "rules directory",
                rules_dir.display().to_string(),
            ));
        }
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let rules_dir = rules_dir
            .canonicalize()
            .unwrap_or_else(|_| rules_dir.to_path_buf());

        let (tx, rx) = channel();
        let debounce_delay = Duration::from_millis(debounce_delay_ms);
        let last_events = Arc::new(Mutex::new(HashMap::new()));

        let mut watcher = Self::create_watcher(root, debounce_delay, tx, last_events)?;
        watcher
            .watch(&rules_dir, RecursiveMode::Recursive)
            .map_err(|e| ProjectError::Watch(format!("{}: {e}", rules_dir.display())))?;

        info!("Watching rule files in {}", rules_dir.display());
        Ok(Self {
            _watcher: watcher,
            event_receiver: rx,
        })
    }

    fn create_watcher(
        root: PathBuf,
        debounce_delay: Duration,
        tx: Sender<RuleFileEvent>,
        last_events: Arc<Mutex<HashMap<PathBuf, Instant>>>,
    ) -> ProjectResult<Box<dyn Watcher + Send>> {
        let handler = make_event_handler(
            root.clone(),
            debounce_delay,
            tx.clone(),
            Arc::clone(&last_events),
        );

        match notify::recommended_watcher(handler) {
            Ok(watcher) => {
                debug!("Rules watcher: using native backend");
                Ok(Box::new(watcher))
            }
            Err(e) => {
                warn!("Rules watcher: native backend unavailable ({}), polling instead", e);
                let fallback = make_event_handler(root, debounce_delay, tx, last_events);
                let watcher = PollWatcher::new(
                    fallback,
                    NotifyConfig::default().with_poll_interval(Duration::from_millis(500)),
                )
                .map_err(|e| ProjectError::Watch(e.to_string()))?;
                Ok(Box::new(watcher))
            }
        }
    }

    /// Next pending change, without blocking
    pub fn try_recv(&self) -> Option<RuleFileEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// All pending changes
    pub fn drain(&self) -> Vec<RuleFileEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl<I, R, L> Project<I, R, L>
where
    I: ProjectIo,
    R: RuleController,
    L: SkeletonLoader,
{
    /// Start watching the rules directory of a project on the local
    /// filesystem
    pub fn watch_rules(&self, debounce_delay_ms: u64) -> ProjectResult<RulesWatcher> {
        let local = |path: &str| {
            self.io.local_path(path).ok_or_else(|| {
                ProjectError::Watch("project storage is not on the local filesystem".to_string())
            })
        };
        let root = local("")?;
        let rules_dir = local(&self.layout.rules_dir())?;
        RulesWatcher::new(&root, &rules_dir, debounce_delay_ms)
    }

    /// Feed everything the watcher saw since the last call to the notifier
    pub async fn process_watcher_events(
        &mut self,
        watcher: &RulesWatcher,
    ) -> ProjectResult<Vec<ChangeOutcome>> {
        let paths: Vec<String> = watcher.drain().into_iter().map(|event| event.path).collect();
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        self.handle_file_changes(paths).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_project_path() {
        let root = Path::new("/work/font");
        assert_eq!(
            relative_project_path(root, Path::new("/work/font/data/org.bezy.project/cps/a.cps")),
            Some("data/org.bezy.project/cps/a.cps".to_string())
        );
        assert_eq!(relative_project_path(root, Path::new("/elsewhere/a.cps")), None);
        assert_eq!(relative_project_path(root, root), None);
    }

    #[test]
    fn test_watcher_requires_rules_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("cps");
        let error = RulesWatcher::new(temp_dir.path(), &missing, 50).unwrap_err();
        assert!(error.is_not_found());

        std::fs::create_dir_all(&missing).unwrap();
        let watcher = RulesWatcher::new(temp_dir.path(), &missing, 50).unwrap();
        assert!(watcher.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_memory_projects_cannot_be_watched() {
        let project = Project::new(crate::io::MemoryIo::new());
        let error = project.watch_rules(50).unwrap_err();
        assert!(matches!(error, ProjectError::Watch(_)));
    }
}
