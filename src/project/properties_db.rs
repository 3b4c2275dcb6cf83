//! Flat per-master property tables
//!
//! A properties database maps node paths (`/0/2`) to the ordered
//! `[name, value]` pairs of that node. Only nodes that carry properties are
//! stored. The YAML mapping keeps document order.

use crate::core::errors::{ProjectError, ProjectResult};
use crate::io::{join_path, ProjectIo};
use crate::model::{GlyphTree, NodeId, Property};
use serde_yaml_ng::{Mapping, Value};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertiesDb {
    entries: Vec<(String, Vec<Property>)>,
}

impl PropertiesDb {
    /// Collect the properties of every node in document order
    pub fn serialize(tree: &GlyphTree) -> Self {
        let entries = tree
            .walk_depth_first()
            .into_iter()
            .filter(|node| !tree.properties(*node).is_empty())
            .map(|node| (tree.path(node), tree.properties(node).to_vec()))
            .collect();
        Self { entries }
    }

    /// Replace the property list of every node that has an entry
    ///
    /// Nodes without an entry keep their properties.
    pub fn deserialize(&self, tree: &mut GlyphTree) -> usize {
        let nodes = tree.walk_depth_first();
        self.apply_to_nodes(tree, &nodes)
    }

    /// Like [`deserialize`](Self::deserialize), restricted to `nodes`
    pub fn apply_to_nodes(&self, tree: &mut GlyphTree, nodes: &[NodeId]) -> usize {
        let by_path: HashMap<&str, &Vec<Property>> = self
            .entries
            .iter()
            .map(|(path, properties)| (path.as_str(), properties))
            .collect();

        let mut applied = 0;
        for node in nodes {
            if let Some(properties) = by_path.get(tree.path(*node).as_str()) {
                tree.set_properties(*node, (*properties).clone());
                applied += 1;
            }
        }
        applied
    }

    pub fn get(&self, path: &str) -> Option<&[Property]> {
        self.entries
            .iter()
            .find(|(entry_path, _)| entry_path == path)
            .map(|(_, properties)| properties.as_slice())
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(path, _)| path.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_yaml(&self) -> ProjectResult<String> {
        let mut mapping = Mapping::new();
        for (path, properties) in &self.entries {
            let pairs = properties
                .iter()
                .map(|property| {
                    Value::Sequence(vec![
                        Value::String(property.name.clone()),
                        Value::String(property.value_string().to_string()),
                    ])
                })
                .collect();
            mapping.insert(Value::String(path.clone()), Value::Sequence(pairs));
        }
        serde_yaml_ng::to_string(&mapping).map_err(|e| ProjectError::malformed("properties database", e))
    }

    /// Parse a database; `path` is only used in error messages
    pub fn from_yaml(contents: &str, path: &str) -> ProjectResult<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let mapping: Mapping =
            serde_yaml_ng::from_str(contents).map_err(|e| ProjectError::malformed(path, e))?;

        let mut entries = Vec::with_capacity(mapping.len());
        for (key, value) in &mapping {
            let node_path = key
                .as_str()
                .ok_or_else(|| ProjectError::malformed(path, format!("non-string key {key:?}")))?;
            let pairs = value.as_sequence().ok_or_else(|| {
                ProjectError::malformed(path, format!("{node_path}: expected a list of pairs"))
            })?;

            let mut properties = Vec::with_capacity(pairs.len());
            for pair in pairs {
                let parsed = pair.as_sequence().and_then(|pair| match pair.as_slice() {
                    [name, value] => Some((scalar_text(name)?, scalar_text(value)?)),
                    _ => None,
                });
                let (name, value) = parsed.ok_or_else(|| {
                    ProjectError::malformed(path, format!("{node_path}: expected [name, value]"))
                })?;
                properties.push(Property::new(name, value));
            }
            entries.push((node_path.to_string(), properties));
        }
        Ok(Self { entries })
    }
}

/// Values are stored as text, but hand-edited files may contain plain
/// numbers or booleans
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Write the database of `tree` as `file` in `db_dir`, creating the
/// directory when needed
pub async fn write_db<I: ProjectIo>(
    io: &I,
    db_dir: &str,
    file: &str,
    tree: &GlyphTree,
) -> ProjectResult<()> {
    let db = PropertiesDb::serialize(tree);
    io.ensure_dir(db_dir).await?;
    io.write_file(&join_path(db_dir, file), db.to_yaml()?.as_bytes()).await?;
    debug!("Wrote properties of {} nodes to '{}'", db.len(), file);
    Ok(())
}

/// Read a database; `None` when the file does not exist
pub async fn read_db<I: ProjectIo>(
    io: &I,
    db_dir: &str,
    file: &str,
) -> ProjectResult<Option<PropertiesDb>> {
    let path = join_path(db_dir, file);
    match io.read_to_string(&path).await {
        Ok(contents) => PropertiesDb::from_yaml(&contents, &path).map(Some),
        Err(e) if e.is_missing_file() => {
            debug!("No properties database at '{}'", path);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Delete a database; a missing file is not an error
pub async fn remove_db<I: ProjectIo>(io: &I, db_dir: &str, file: &str) -> ProjectResult<()> {
    let path = join_path(db_dir, file);
    match io.unlink(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_missing_file() => {
            debug!("Properties database '{}' did not exist", path);
            Ok(())
        }
        Err(e) => Err(e),
    }
}
