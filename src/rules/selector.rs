//! Selector matching and ranking

use super::Rule;
use crate::model::{ElementKind, GlyphTree, NodeId};

/// Ranks the rules that apply to a node
///
/// The first entry of the result is the rule that wins the cascade.
pub trait SelectorEngine {
    fn matching_rules<'r>(&self, rules: &'r [Rule], tree: &GlyphTree, node: NodeId) -> Vec<&'r Rule>;
}

/// A small engine for `*`, `kind`, `#id` and `kind#id` selectors, with
/// comma separated alternatives
///
/// Higher specificity wins; among equal specificity the later rule wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleSelectorEngine;

impl SimpleSelectorEngine {
    /// Specificity of the best matching alternative, if any matches
    fn specificity(selector: &str, tree: &GlyphTree, node: NodeId) -> Option<u32> {
        let element = tree.element(node);
        selector
            .split(',')
            .map(str::trim)
            .filter(|alternative| !alternative.is_empty())
            .filter_map(|alternative| {
                if alternative == "*" {
                    return Some(0);
                }
                let (kind, id) = match alternative.split_once('#') {
                    Some((kind, id)) => (kind, Some(id)),
                    None => (alternative, None),
                };

                let mut score = 0;
                if !kind.is_empty() {
                    if ElementKind::from_selector_name(kind) != Some(element.kind) {
                        return None;
                    }
                    score += 1;
                }
                if let Some(id) = id {
                    if element.id.as_deref() != Some(id) {
                        return None;
                    }
                    score += 100;
                }
                Some(score)
            })
            .max()
    }
}

impl SelectorEngine for SimpleSelectorEngine {
    fn matching_rules<'r>(&self, rules: &'r [Rule], tree: &GlyphTree, node: NodeId) -> Vec<&'r Rule> {
        let mut ranked: Vec<(u32, usize, &Rule)> = rules
            .iter()
            .enumerate()
            .filter_map(|(index, rule)| {
                Self::specificity(&rule.selector, tree, node).map(|score| (score, index, rule))
            })
            .collect();

        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
        ranked.into_iter().map(|(_, _, rule)| rule).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Property;

    fn rule(selector: &str, value: &str) -> Rule {
        Rule::new(selector, vec![Property::new("weight", value)])
    }

    #[test]
    fn test_ranking_by_specificity_then_order() {
        let mut tree = GlyphTree::new(ElementKind::Master);
        let glyph = tree.append_child(tree.root(), ElementKind::Glyph).unwrap();
        tree.element_mut(glyph).id = Some("a".to_string());

        let rules = vec![
            rule("glyph#a", "id"),
            rule("*", "any"),
            rule("glyph", "kind"),
            rule("glyph", "later-kind"),
            rule("contour", "never"),
        ];

        let ranked: Vec<&str> = SimpleSelectorEngine
            .matching_rules(&rules, &tree, glyph)
            .iter()
            .map(|rule| rule.parameters[0].value.as_str())
            .collect();
        assert_eq!(ranked, vec!["id", "later-kind", "kind", "any"]);
    }

    #[test]
    fn test_alternatives_and_bare_ids() {
        let mut tree = GlyphTree::new(ElementKind::Master);
        tree.set_master_id("bold");
        let rules = vec![rule("glyph, #bold", "x"), rule("#regular", "y")];

        let matched = SimpleSelectorEngine.matching_rules(&rules, &tree, tree.root());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].parameters[0].value, "x");
    }
}
