//! Element kinds and the capability table
//!
//! Every node of a glyph tree is tagged with an [`ElementKind`]. What a kind
//! may contain and which attributes it accepts is looked up in a static
//! [`Capabilities`] table instead of being spread over per-kind types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Closed set of node kinds in a glyph tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Master,
    Glyph,
    PenStroke,
    StrokePoint,
    Contour,
    ContourPoint,
    Component,
}

/// Attribute validator: returns true when the value is acceptable
pub type Validator = fn(&str) -> bool;

/// What a kind of element may contain
#[derive(Debug)]
pub struct Capabilities {
    pub children: &'static [ElementKind],
    pub attributes: &'static [(&'static str, Validator)],
}

fn validate_number(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok()
}

fn validate_name(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(char::is_whitespace)
}

static MASTER: Capabilities = Capabilities {
    children: &[ElementKind::Glyph],
    attributes: &[],
};

static GLYPH: Capabilities = Capabilities {
    children: &[
        ElementKind::PenStroke,
        ElementKind::Contour,
        ElementKind::Component,
    ],
    attributes: &[("width", validate_number), ("height", validate_number)],
};

static PEN_STROKE: Capabilities = Capabilities {
    children: &[ElementKind::StrokePoint],
    attributes: &[],
};

static CONTOUR: Capabilities = Capabilities {
    children: &[ElementKind::ContourPoint],
    attributes: &[("open", validate_number)],
};

static COMPONENT: Capabilities = Capabilities {
    children: &[],
    attributes: &[("base", validate_name)],
};

static LEAF: Capabilities = Capabilities {
    children: &[],
    attributes: &[],
};

impl ElementKind {
    pub fn capabilities(self) -> &'static Capabilities {
        match self {
            ElementKind::Master => &MASTER,
            ElementKind::Glyph => &GLYPH,
            ElementKind::PenStroke => &PEN_STROKE,
            ElementKind::Contour => &CONTOUR,
            ElementKind::Component => &COMPONENT,
            ElementKind::StrokePoint | ElementKind::ContourPoint => &LEAF,
        }
    }

    pub fn accepts_child(self, child: ElementKind) -> bool {
        self.capabilities().children.contains(&child)
    }

    /// Check an attribute against the capability table
    pub fn validate_attribute(self, name: &str, value: &str) -> bool {
        self.capabilities()
            .attributes
            .iter()
            .find(|(attribute, _)| *attribute == name)
            .is_some_and(|(_, validator)| validator(value))
    }

    /// Name used in rule selectors
    pub fn selector_name(self) -> &'static str {
        match self {
            ElementKind::Master => "master",
            ElementKind::Glyph => "glyph",
            ElementKind::PenStroke => "penstroke",
            ElementKind::StrokePoint => "point",
            ElementKind::Contour => "contour",
            ElementKind::ContourPoint => "p",
            ElementKind::Component => "component",
        }
    }

    pub fn from_selector_name(name: &str) -> Option<Self> {
        match name {
            "master" => Some(ElementKind::Master),
            "glyph" => Some(ElementKind::Glyph),
            "penstroke" => Some(ElementKind::PenStroke),
            "point" => Some(ElementKind::StrokePoint),
            "contour" => Some(ElementKind::Contour),
            "p" => Some(ElementKind::ContourPoint),
            "component" => Some(ElementKind::Component),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector_name())
    }
}

/// A named design parameter attached to a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The value as persisted in a properties database
    pub fn value_string(&self) -> &str {
        &self.value
    }
}

/// A node handle inside one [`GlyphTree`](super::GlyphTree)
///
/// Clones of a tree keep the same handles for corresponding nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// One node of a glyph tree
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    pub id: Option<String>,
    pub(crate) attributes: BTreeMap<String, String>,
    pub properties: Vec<Property>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Element {
    pub(crate) fn new(kind: ElementKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            id: None,
            attributes: BTreeMap::new(),
            properties: Vec::new(),
            parent,
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .map(|property| property.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_table_children() {
        assert!(ElementKind::Master.accepts_child(ElementKind::Glyph));
        assert!(ElementKind::Glyph.accepts_child(ElementKind::Contour));
        assert!(ElementKind::Contour.accepts_child(ElementKind::ContourPoint));
        assert!(!ElementKind::Contour.accepts_child(ElementKind::Glyph));
        assert!(!ElementKind::ContourPoint.accepts_child(ElementKind::ContourPoint));
    }

    #[test]
    fn test_attribute_validators() {
        assert!(ElementKind::Contour.validate_attribute("open", "1"));
        assert!(!ElementKind::Contour.validate_attribute("open", "yes"));
        assert!(!ElementKind::Contour.validate_attribute("closed", "1"));
        assert!(ElementKind::Component.validate_attribute("base", "a.alt"));
        assert!(!ElementKind::Component.validate_attribute("base", ""));
    }

    #[test]
    fn test_selector_names_round_trip() {
        for kind in [
            ElementKind::Master,
            ElementKind::Glyph,
            ElementKind::PenStroke,
            ElementKind::StrokePoint,
            ElementKind::Contour,
            ElementKind::ContourPoint,
            ElementKind::Component,
        ] {
            assert_eq!(ElementKind::from_selector_name(kind.selector_name()), Some(kind));
        }
        assert_eq!(ElementKind::from_selector_name("univers"), None);
    }
}
