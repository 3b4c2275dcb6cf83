//! Re-resolving masters when rule files change
//!
//! File change events come in as project paths. Only paths below the
//! rules directory are of interest; their source name (the path relative to
//! the rules directory) is reloaded through the rule controller and every
//! open master bound to that source, as its rule file or as its properties
//! source, is re-resolved.
//! A change of `groups.plist` only drops the cached glyph classes.

use super::cache::SkeletonLoader;
use super::descriptor::MasterConfig;
use super::resolver::apply_rule_set;
use super::Project;
use crate::core::errors::{ProjectError, ProjectResult};
use crate::io::{normalize_path, ProjectIo};
use crate::rules::RuleController;
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, info, warn};

pub type UpdateHandler = Box<dyn FnMut(&RuleUpdate)>;
pub type FailureHandler = Box<dyn FnMut(&ProjectError)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifierState {
    #[default]
    Idle,
    Processing,
}

/// A rule source that was reloaded and the masters it touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleUpdate {
    pub source: String,
    pub masters: Vec<String>,
}

/// What happened to one change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// The path is outside the rules directory
    Ignored,
    /// No rule set was loaded from this source
    Unused,
    Updated(RuleUpdate),
    /// The update failed and the failure handler was told
    Failed,
}

/// Processing state and the single pair of update handlers
#[derive(Default)]
pub struct ChangeNotifier {
    state: NotifierState,
    on_update: Option<UpdateHandler>,
    on_failure: Option<FailureHandler>,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("state", &self.state)
            .field("on_update", &self.on_update.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

impl ChangeNotifier {
    pub fn state(&self) -> NotifierState {
        self.state
    }
}

/// Source name of `path` if it lies inside `rules_dir`
pub fn source_name(rules_dir: &str, path: &str) -> Option<String> {
    let rules_dir = normalize_path(rules_dir);
    let path = normalize_path(path);
    let rest = if rules_dir.is_empty() {
        path.as_str()
    } else {
        path.strip_prefix(rules_dir.as_str())?.strip_prefix('/')?
    };
    (!rest.is_empty()).then(|| rest.to_string())
}

impl<I, R, L> Project<I, R, L>
where
    I: ProjectIo,
    R: RuleController,
    L: SkeletonLoader,
{
    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Install the handlers told about rule updates; replaces any earlier
    /// pair, `None` clears a handler
    ///
    /// Without a failure handler, update errors are returned to the caller
    /// of [`handle_file_change`](Self::handle_file_change).
    pub fn set_update_handlers(
        &mut self,
        on_update: Option<UpdateHandler>,
        on_failure: Option<FailureHandler>,
    ) {
        self.notifier.on_update = on_update;
        self.notifier.on_failure = on_failure;
    }

    /// Reload a rule source and re-resolve the open masters bound to it
    ///
    /// A master is bound to a source through its rule file or, for rule
    /// backed masters, its properties file. Returns `None` when the source
    /// is not in use.
    pub async fn update_changed_rule(&mut self, source: &str) -> ProjectResult<Option<RuleUpdate>> {
        let rule_set = match self.rules.replace_rule(source).await {
            Ok(rule_set) => rule_set,
            Err(e) if e.is_not_found() => {
                debug!("Rule source '{}' is not in use", source);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let affected: Vec<(String, MasterConfig)> = self
            .cache
            .open
            .keys()
            .filter_map(|name| {
                let config = self.descriptor.masters.get(name)?;
                (config.cps_file == source || config.properties_file == source)
                    .then(|| (name.clone(), config.clone()))
            })
            .collect();

        let mut masters = Vec::new();
        for (name, config) in affected {
            // Properties first and the master's rule file on top, as on open.
            let cps_rules = if config.cps_file == source || config.cps_file == config.properties_file {
                None
            } else {
                self.resolver().master_rules(&config.cps_file).await?
            };

            let Some(tree) = self.cache.open.get_mut(&name) else {
                continue;
            };
            let nodes = tree.walk_depth_first();
            let engine = self.selector_engine.as_ref();
            if config.properties_file == source {
                apply_rule_set(engine, &rule_set, tree, &nodes);
            }
            if config.cps_file == source && config.properties_file != source {
                apply_rule_set(engine, &rule_set, tree, &nodes);
            } else if let Some(cps_rules) = &cps_rules {
                apply_rule_set(engine, cps_rules, tree, &nodes);
            }
            masters.push(name);
        }

        info!("Rule source '{}' changed, updated masters {:?}", source, masters);
        Ok(Some(RuleUpdate {
            source: source.to_string(),
            masters,
        }))
    }

    /// React to one changed project path
    pub async fn handle_file_change(&mut self, path: &str) -> ProjectResult<ChangeOutcome> {
        let mut outcomes = self.handle_file_changes([path]).await?;
        Ok(outcomes.pop().unwrap_or(ChangeOutcome::Ignored))
    }

    /// Process changed paths in arrival order
    ///
    /// The batch is consumed by this call: after a propagated failure the
    /// remaining paths are dropped, never replayed by a later call.
    pub async fn handle_file_changes<P: AsRef<str>>(
        &mut self,
        paths: impl IntoIterator<Item = P>,
    ) -> ProjectResult<Vec<ChangeOutcome>> {
        let mut queue: VecDeque<String> = paths
            .into_iter()
            .map(|path| path.as_ref().to_string())
            .collect();
        if self.notifier.state == NotifierState::Processing {
            warn!("Earlier change processing was interrupted");
        }

        self.notifier.state = NotifierState::Processing;
        let result = self.drain_change_queue(&mut queue).await;
        self.notifier.state = NotifierState::Idle;
        if !queue.is_empty() {
            debug!("Dropping {} changes after a failed update", queue.len());
        }
        result
    }

    async fn drain_change_queue(
        &mut self,
        queue: &mut VecDeque<String>,
    ) -> ProjectResult<Vec<ChangeOutcome>> {
        let rules_dir = self.layout.rules_dir();
        let groups_file = normalize_path(&self.layout.groups_file());
        let mut outcomes = Vec::new();

        while let Some(path) = queue.pop_front() {
            if normalize_path(&path) == groups_file && self.glyph_classes.take().is_some() {
                debug!("groups.plist changed, dropping glyph classes");
            }
            let Some(source) = source_name(&rules_dir, &path) else {
                debug!("Ignoring change outside the rules directory: {}", path);
                outcomes.push(ChangeOutcome::Ignored);
                continue;
            };

            let outcome = match self.update_changed_rule(&source).await {
                Ok(None) => ChangeOutcome::Unused,
                Ok(Some(update)) => {
                    if let Some(handler) = self.notifier.on_update.as_mut() {
                        handler(&update);
                    }
                    ChangeOutcome::Updated(update)
                }
                Err(e) => match self.notifier.on_failure.as_mut() {
                    Some(handler) => {
                        warn!("Updating rule source '{}' failed: {}", source, e);
                        handler(&e);
                        ChangeOutcome::Failed
                    }
                    None => return Err(e),
                },
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}
