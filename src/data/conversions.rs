//! UFO format conversion utilities
//!
//! Turns a norad [`Font`] into a [`GlyphTree`]. Skeleton trees are built
//! without properties; imports additionally carry the glyph metrics and
//! point data over as node properties.

use crate::core::errors::ProjectResult;
use crate::model::{ElementKind, GlyphTree, NodeId};
use norad::{Font, Glyph};

/// Build a master tree from the default layer of a font
///
/// Glyphs are added in name order so node paths are stable across loads.
pub fn tree_from_font(font: &Font, with_properties: bool) -> ProjectResult<GlyphTree> {
    tree_from_glyphs(font.default_layer().iter(), with_properties)
}

/// Build a master tree from an arbitrary set of glyphs
pub fn tree_from_glyphs<'a>(
    glyphs: impl IntoIterator<Item = &'a Glyph>,
    with_properties: bool,
) -> ProjectResult<GlyphTree> {
    let mut glyphs: Vec<&Glyph> = glyphs.into_iter().collect();
    glyphs.sort_by(|a, b| a.name().as_str().cmp(b.name().as_str()));

    let mut tree = GlyphTree::new(ElementKind::Master);
    let root = tree.root();
    for glyph in glyphs {
        append_glyph(&mut tree, root, glyph, with_properties)?;
    }
    Ok(tree)
}

/// Append one glyph with its contours and components below `parent`
pub fn append_glyph(
    tree: &mut GlyphTree,
    parent: NodeId,
    glyph: &Glyph,
    with_properties: bool,
) -> ProjectResult<NodeId> {
    let node = tree.append_child(parent, ElementKind::Glyph)?;
    tree.element_mut(node).id = Some(glyph.name().to_string());
    tree.set_attribute(node, "width", format_number(glyph.width))?;
    tree.set_attribute(node, "height", format_number(glyph.height))?;

    if with_properties {
        tree.set_property(node, "advanceWidth", format_number(glyph.width));
        tree.set_property(node, "advanceHeight", format_number(glyph.height));
        if !glyph.codepoints.is_empty() {
            let unicodes: Vec<String> = glyph
                .codepoints
                .iter()
                .map(|c| format!("{:04X}", c as u32))
                .collect();
            tree.set_property(node, "unicodes", unicodes.join(" "));
        }
    }

    for contour in &glyph.contours {
        let contour_node = tree.append_child(node, ElementKind::Contour)?;
        let open = contour
            .points
            .first()
            .is_some_and(|point| point.typ == norad::PointType::Move);
        tree.set_attribute(contour_node, "open", if open { "1" } else { "0" })?;

        for point in &contour.points {
            let point_node = tree.append_child(contour_node, ElementKind::ContourPoint)?;
            tree.element_mut(point_node).id = point.name.as_ref().map(|name| name.to_string());
            if with_properties {
                tree.set_property(
                    point_node,
                    "on",
                    format!("{} {}", format_number(point.x), format_number(point.y)),
                );
                tree.set_property(point_node, "type", point_type_name(&point.typ));
                if point.smooth {
                    tree.set_property(point_node, "smooth", "1");
                }
            }
        }
    }

    for component in &glyph.components {
        let component_node = tree.append_child(node, ElementKind::Component)?;
        tree.set_attribute(component_node, "base", component.base.to_string())?;
        if with_properties {
            let t = &component.transform;
            let transform = [t.x_scale, t.xy_scale, t.yx_scale, t.y_scale, t.x_offset, t.y_offset]
                .iter()
                .map(|value| format_number(*value))
                .collect::<Vec<_>>()
                .join(" ");
            tree.set_property(component_node, "transform", transform);
        }
    }

    Ok(node)
}

/// Name of a point type as written in glif files
pub fn point_type_name(point_type: &norad::PointType) -> &'static str {
    match point_type {
        norad::PointType::Move => "move",
        norad::PointType::Line => "line",
        norad::PointType::OffCurve => "offcurve",
        norad::PointType::Curve => "curve",
        norad::PointType::QCurve => "qcurve",
    }
}

/// Integral values without a fractional part, everything else as is
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
