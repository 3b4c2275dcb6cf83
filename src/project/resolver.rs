//! Computing the final property list of every node
//!
//! A master's properties come from exactly one source, chosen by the name
//! of its properties file: `*.db` files are flat tables read with
//! [`read_db`], everything else names a rule source. The rule file a
//! master is bound to (its `cpsFile`) is layered on top when the rule
//! controller knows it.

use super::layout::DB_SUFFIX;
use super::properties_db::read_db;
use crate::core::errors::ProjectResult;
use crate::io::ProjectIo;
use crate::model::{GlyphTree, NodeId};
use crate::rules::{RuleController, RuleSet, SelectorEngine};
use tracing::debug;

/// Where the properties of a master come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertiesSource<'a> {
    Database(&'a str),
    Rules(&'a str),
}

impl<'a> PropertiesSource<'a> {
    pub fn from_file(file: &'a str) -> Self {
        if file.ends_with(DB_SUFFIX) {
            Self::Database(file)
        } else {
            Self::Rules(file)
        }
    }
}

/// Borrowed view of the collaborators needed to resolve properties
pub struct PropertyResolver<'a, I, R> {
    pub io: &'a I,
    pub db_dir: String,
    pub rules: &'a R,
    pub engine: &'a dyn SelectorEngine,
}

impl<I: ProjectIo, R: RuleController> PropertyResolver<'_, I, R> {
    /// Resolve every node of `tree` from `properties_file`
    pub async fn resolve(&self, properties_file: &str, tree: &mut GlyphTree) -> ProjectResult<()> {
        let nodes = tree.walk_depth_first();
        self.resolve_nodes(properties_file, tree, &nodes).await
    }

    /// Resolve only `nodes`; all other nodes keep their properties
    pub async fn resolve_nodes(
        &self,
        properties_file: &str,
        tree: &mut GlyphTree,
        nodes: &[NodeId],
    ) -> ProjectResult<()> {
        match PropertiesSource::from_file(properties_file) {
            PropertiesSource::Database(file) => match read_db(self.io, &self.db_dir, file).await? {
                Some(db) => {
                    let applied = db.apply_to_nodes(tree, nodes);
                    debug!("Applied {} database entries from '{}'", applied, file);
                }
                None => debug!("Properties database '{}' missing, keeping properties", file),
            },
            PropertiesSource::Rules(source) => {
                let rule_set = self.rules.get_rule(source).await?;
                apply_rule_set(self.engine, &rule_set, tree, nodes);
            }
        }
        Ok(())
    }

    /// Rules of a master's bound rule file, `None` when no such source exists
    pub async fn master_rules(&self, cps_file: &str) -> ProjectResult<Option<RuleSet>> {
        match self.rules.get_rule(cps_file).await {
            Ok(rule_set) => Ok(Some(rule_set)),
            Err(e) if e.is_not_found() => {
                debug!("No rules for bound rule file '{}'", cps_file);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Give each node the parameters of its top ranked rule
///
/// Nodes without a matching rule are left alone. Returns the number of
/// nodes that received new properties.
pub fn apply_rule_set(
    engine: &dyn SelectorEngine,
    rule_set: &RuleSet,
    tree: &mut GlyphTree,
    nodes: &[NodeId],
) -> usize {
    let mut updated = 0;
    for node in nodes {
        let parameters = engine
            .matching_rules(&rule_set.rules, tree, *node)
            .first()
            .map(|rule| rule.parameters.clone());
        if let Some(parameters) = parameters {
            tree.set_properties(*node, parameters);
            updated += 1;
        }
    }
    debug!(
        "Rule source '{}' set properties of {} of {} nodes",
        rule_set.source,
        updated,
        nodes.len()
    );
    updated
}
