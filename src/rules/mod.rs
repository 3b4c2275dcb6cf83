//! Rule sets and the collaborators that rank and load them
//!
//! Rule parsing is not part of this crate. A [`RuleController`] hands out
//! already parsed [`RuleSet`]s by source name and a [`SelectorEngine`]
//! returns, for one node, the matching rules in priority order.

mod controller;
mod selector;

pub use controller::{MemoryRuleController, RuleController};
pub use selector::{SelectorEngine, SimpleSelectorEngine};

use crate::model::Property;

/// A selector plus the parameters it assigns
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selector: String,
    pub parameters: Vec<Property>,
}

impl Rule {
    pub fn new(selector: impl Into<String>, parameters: Vec<Property>) -> Self {
        Self {
            selector: selector.into(),
            parameters,
        }
    }
}

/// All rules of one source, in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub source: String,
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(source: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            source: source.into(),
            rules,
        }
    }
}
