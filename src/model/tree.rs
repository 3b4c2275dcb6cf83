//! Arena-backed glyph trees
//!
//! Nodes live in a flat vector and refer to each other by [`NodeId`]. A
//! parent exclusively owns its children; nodes are never removed, so a
//! handle stays valid for the lifetime of the tree and of all its clones.

use super::element::{Element, ElementKind, NodeId, Property};
use crate::core::errors::{ProjectError, ProjectResult};

/// A rooted tree of [`Element`]s
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphTree {
    nodes: Vec<Element>,
}

impl Default for GlyphTree {
    fn default() -> Self {
        Self::new(ElementKind::Master)
    }
}

impl GlyphTree {
    /// Create a tree that contains only a root of the given kind
    pub fn new(root_kind: ElementKind) -> Self {
        Self {
            nodes: vec![Element::new(root_kind, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Access a node; panics on a handle that did not come from this tree
    /// or one of its clones
    pub fn element(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    pub fn element_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0)
    }

    /// The identity of the tree, i.e. the id of its root
    pub fn master_id(&self) -> Option<&str> {
        self.element(self.root()).id.as_deref()
    }

    pub fn set_master_id(&mut self, id: impl Into<String>) {
        let root = self.root();
        self.element_mut(root).id = Some(id.into());
    }

    /// Append a child, checking the parent's accepted children
    pub fn append_child(&mut self, parent: NodeId, kind: ElementKind) -> ProjectResult<NodeId> {
        let parent_kind = self
            .get(parent)
            .ok_or_else(|| ProjectError::InvalidTree(format!("no node {parent:?}")))?
            .kind;
        if !parent_kind.accepts_child(kind) {
            return Err(ProjectError::InvalidTree(format!(
                "{parent_kind} does not accept {kind} children"
            )));
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Element::new(kind, Some(parent)));
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Set an attribute after validating it against the capability table
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> ProjectResult<()> {
        let value = value.into();
        let kind = self.element(id).kind;
        if !kind.validate_attribute(name, &value) {
            return Err(ProjectError::InvalidTree(format!(
                "invalid attribute {name}=\"{value}\" for {kind}"
            )));
        }
        self.element_mut(id).attributes.insert(name.to_string(), value);
        Ok(())
    }

    pub fn properties(&self, id: NodeId) -> &[Property] {
        &self.element(id).properties
    }

    /// Replace a node's property list wholesale
    pub fn set_properties(&mut self, id: NodeId, properties: Vec<Property>) {
        self.element_mut(id).properties = properties;
    }

    /// Set a single property, replacing an existing one with the same name
    pub fn set_property(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let properties = &mut self.element_mut(id).properties;
        match properties.iter_mut().find(|property| property.name == name) {
            Some(property) => property.value = value,
            None => properties.push(Property::new(name, value)),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.element(id).parent
    }

    /// All nodes in document order (pre-order, children left to right)
    pub fn walk_depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];

        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.element(id).children.iter().rev().copied());
        }

        order
    }

    /// Deterministic position key of a node: `/` for the root, then the
    /// child index at every level, e.g. `/0/2/5`
    pub fn path(&self, id: NodeId) -> String {
        let mut indices = Vec::new();
        let mut current = id;

        while let Some(parent) = self.parent(current) {
            let index = self
                .element(parent)
                .children
                .iter()
                .position(|child| *child == current)
                .unwrap_or_default();
            indices.push(index);
            current = parent;
        }

        if indices.is_empty() {
            return "/".to_string();
        }
        indices
            .iter()
            .rev()
            .map(|index| format!("/{index}"))
            .collect()
    }

    /// Look up a node by its path
    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root();
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            let index: usize = segment.parse().ok()?;
            current = *self.element(current).children.get(index)?;
        }
        Some(current)
    }

    /// First node of the given kind whose id matches
    pub fn find(&self, kind: ElementKind, id: &str) -> Option<NodeId> {
        self.walk_depth_first().into_iter().find(|node| {
            let element = self.element(*node);
            element.kind == kind && element.id.as_deref() == Some(id)
        })
    }
}
