//! Rule sources by name

use super::{Rule, RuleSet};
use crate::core::errors::{ProjectError, ProjectResult};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Provides rule sets by source name
#[allow(async_fn_in_trait)]
pub trait RuleController {
    /// Fetch the rule set of a source, loading it if necessary
    async fn get_rule(&self, source: &str) -> ProjectResult<RuleSet>;

    /// Reload a source that is currently in use
    ///
    /// Fails with [`ProjectError::NotFound`] when the source has never been
    /// loaded. Callers watching files treat that as "source is unused".
    async fn replace_rule(&self, source: &str) -> ProjectResult<RuleSet>;
}

/// Rule sets held in memory, for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryRuleController {
    sources: RwLock<HashMap<String, Vec<Rule>>>,
    loaded: RwLock<HashSet<String>>,
}

impl MemoryRuleController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a source; already loaded users see the change on the
    /// next `replace_rule`
    pub fn insert(&self, source: impl Into<String>, rules: Vec<Rule>) {
        self.sources.write().insert(source.into(), rules);
    }

    pub fn is_loaded(&self, source: &str) -> bool {
        self.loaded.read().contains(source)
    }

    fn lookup(&self, source: &str) -> ProjectResult<RuleSet> {
        self.sources
            .read()
            .get(source)
            .map(|rules| RuleSet::new(source, rules.clone()))
            .ok_or_else(|| ProjectError::not_found("rule source", source))
    }
}

impl RuleController for MemoryRuleController {
    async fn get_rule(&self, source: &str) -> ProjectResult<RuleSet> {
        let rule_set = self.lookup(source)?;
        self.loaded.write().insert(source.to_string());
        debug!("Loaded rule source '{}' ({} rules)", source, rule_set.rules.len());
        Ok(rule_set)
    }

    async fn replace_rule(&self, source: &str) -> ProjectResult<RuleSet> {
        if !self.is_loaded(source) {
            return Err(ProjectError::not_found("rule source", source));
        }
        self.lookup(source)
    }
}
