use crate::assets::Icon;
use crate::geometry::{Margin, Padding, Rect};
use crate::ir::{ArrowHeadSpec, Document, LinkSpec, ResourceSpec, ResourceType, Spacing};
use crate::layout::{
    Align, ArrowHead, Diagram, Link, LinkLabels, Node, NodeId, NodeKind, Orientation, PathStyle, Windrose,
};
use crate::theme::Theme;
use anyhow::{anyhow, Context, Result};
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub fn parse_document(input: &str) -> Result<Document> {
    let doc: Document = serde_json::from_str(input).context("invalid diagram document")?;
    Ok(doc)
}

/// Reads a document from disk and builds its diagram. Relative icon paths
/// resolve against the document's directory.
pub fn load_diagram(path: &Path, theme: &Theme) -> Result<Diagram> {
    let input = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let doc = parse_document(&input)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    build_diagram(&doc, base_dir, theme)
}

/// Turns a parsed document into an unscaled diagram. Structural cycles are
/// left in place; they are reported by layout.
pub fn build_diagram(doc: &Document, base_dir: &Path, theme: &Theme) -> Result<Diagram> {
    let mut diagram = Diagram::new();
    let mut ids: HashMap<&str, NodeId> = HashMap::new();
    let mut icons: HashMap<PathBuf, Icon> = HashMap::new();

    for (name, spec) in &doc.resources {
        let node = build_node(name, spec, base_dir, theme, &mut icons)?;
        ids.insert(name.as_str(), diagram.add_node(node));
    }

    for (name, spec) in &doc.resources {
        let parent = lookup(&ids, name, "itself")?;
        for child in &spec.children {
            let child = lookup(&ids, child, &format!("children of `{name}`"))?;
            diagram.add_child(parent, child);
        }
        for border_child in &spec.border_children {
            let child = lookup(&ids, &border_child.resource, &format!("borderChildren of `{name}`"))?;
            let position: Windrose = border_child
                .position
                .parse()
                .with_context(|| format!("border child `{}` of `{name}`", border_child.resource))?;
            diagram.add_border_child(parent, position, child);
        }
    }

    for (idx, spec) in doc.links.iter().enumerate() {
        let context = format!("link #{idx}");
        let source = lookup(&ids, &spec.source, &context)?;
        let target = lookup(&ids, &spec.target, &context)?;
        let link = build_link(source, target, spec, theme).with_context(|| context.clone())?;
        diagram.add_link(link);
    }

    let root = lookup(&ids, &doc.root, "the document root")?;
    diagram.set_root(root);
    debug!(
        "built diagram: {} resources, {} links, {} icons",
        doc.resources.len(),
        doc.links.len(),
        icons.len()
    );
    Ok(diagram)
}

fn lookup(ids: &HashMap<&str, NodeId>, name: &str, context: &str) -> Result<NodeId> {
    ids.get(name)
        .copied()
        .ok_or_else(|| anyhow!("unknown resource `{name}` referenced by {context}"))
}

fn build_node(
    name: &str,
    spec: &ResourceSpec,
    base_dir: &Path,
    theme: &Theme,
    icons: &mut HashMap<PathBuf, Icon>,
) -> Result<Node> {
    let mut node = match spec.kind {
        ResourceType::Resource => Node::resource(name),
        ResourceType::Group => Node::group(name),
        ResourceType::HorizontalStack => Node::horizontal_stack(name),
        ResourceType::VerticalStack => Node::vertical_stack(name),
    };

    if spec.width.is_some() || spec.height.is_some() {
        let width = spec.width.unwrap_or(node.bindings.width()).max(0);
        let height = spec.height.unwrap_or(node.bindings.height()).max(0);
        node.bindings = Rect::from_size(width, height);
        if node.kind == NodeKind::Resource {
            node.icon_bounds = node.bindings;
        }
    }

    if let Some(margin) = spec.margin {
        node.margin = apply_margin(node.margin, margin);
    }
    if let Some(padding) = spec.padding {
        node.padding = apply_padding(node.padding, padding);
    }
    if let Some(direction) = spec.direction.as_deref() {
        node.direction = direction
            .parse::<Orientation>()
            .with_context(|| format!("resource `{name}`"))?;
    }
    if let Some(align) = spec.align.as_deref() {
        node.align = Align::parse(align, node.direction).with_context(|| format!("resource `{name}`"))?;
    }

    node.label = spec.label.clone();
    node.label_color = spec.label_color;
    node.label_font = spec.label_font.clone();
    node.border_color = match (spec.border_color, node.kind) {
        (Some(color), _) => Some(color),
        (None, NodeKind::Group) => Some(theme.border_color),
        (None, _) => None,
    };
    if let Some(fill) = spec.fill_color {
        node.fill_color = fill;
    }

    if let Some(icon) = spec.icon.as_deref() {
        let path = base_dir.join(icon);
        let icon = match icons.get(&path) {
            Some(icon) => icon.clone(),
            None => {
                let loaded = Icon::open(&path).with_context(|| format!("icon of resource `{name}`"))?;
                icons.insert(path, loaded.clone());
                loaded
            }
        };
        node.icon = Some(icon);
    }
    Ok(node)
}

fn apply_margin(base: Margin, spacing: Spacing) -> Margin {
    Margin::new(
        spacing.top.unwrap_or(base.top),
        spacing.right.unwrap_or(base.right),
        spacing.bottom.unwrap_or(base.bottom),
        spacing.left.unwrap_or(base.left),
    )
}

fn apply_padding(base: Padding, spacing: Spacing) -> Padding {
    Padding::new(
        spacing.top.unwrap_or(base.top),
        spacing.right.unwrap_or(base.right),
        spacing.bottom.unwrap_or(base.bottom),
        spacing.left.unwrap_or(base.left),
    )
}

fn build_link(source: NodeId, target: NodeId, spec: &LinkSpec, theme: &Theme) -> Result<Link> {
    let mut link = Link::new(source, target);
    if let Some(position) = spec.source_position.as_deref() {
        link.source_position = position.parse()?;
    }
    if let Some(position) = spec.target_position.as_deref() {
        link.target_position = position.parse()?;
    }
    let arrow = |head: &ArrowHeadSpec| ArrowHead::new(&head.width, head.length);
    link.source_arrow = spec.source_arrow_head.as_ref().and_then(|head| head.as_ref().map(arrow));
    link.target_arrow = match &spec.target_arrow_head {
        None => Some(ArrowHead::default()),
        Some(head) => head.as_ref().map(arrow),
    };
    if let Some(width) = spec.line_width {
        link.line_width = width.max(1);
    }
    link.line_color = spec.line_color.unwrap_or(theme.line_color);
    if let Some(style) = spec.style.as_deref() {
        link.style = PathStyle::from_token(style).ok_or_else(|| anyhow!("unknown link type `{style}`"))?;
    }
    link.labels = LinkLabels {
        source_left: spec.labels.source_left.clone(),
        source_right: spec.labels.source_right.clone(),
        target_left: spec.labels.target_left.clone(),
        target_right: spec.labels.target_right.clone(),
    };
    Ok(link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ArrowWidth, LayoutError};
    use crate::theme::Rgba;

    fn build(input: &str) -> Result<Diagram> {
        let doc = parse_document(input)?;
        build_diagram(&doc, Path::new("."), &Theme::default())
    }

    #[test]
    fn builds_tree_and_links() {
        let diagram = build(
            r##"{
                "root": "vpc",
                "resources": {
                    "vpc": { "type": "group", "label": "VPC", "children": ["web", "db"],
                             "borderChildren": [{ "position": "N", "resource": "igw" }] },
                    "web": { "label": "web" },
                    "db": { "width": 80, "margin": { "left": 10 } },
                    "igw": {}
                },
                "links": [
                    { "source": "web", "target": "db", "sourcePosition": "E", "targetPosition": "auto",
                      "type": "orthogonal", "lineColor": "#FF0000", "sourceArrowHead": { "width": "narrow", "length": 8 },
                      "labels": { "sourceLeft": "443" } }
                ]
            }"##,
        )
        .unwrap();

        let vpc = diagram.find("vpc").unwrap();
        let db = diagram.find("db").unwrap();
        assert_eq!(diagram.root(), Some(vpc));
        assert_eq!(diagram.node(vpc).children().len(), 2);
        assert_eq!(diagram.node(vpc).border_children()[0].position, Windrose::North);
        assert_eq!(diagram.node(vpc).border_color, Some(Theme::default().border_color));
        assert_eq!(diagram.bindings(db), Rect::from_size(80, 64));
        assert_eq!(diagram.margin(db), Margin::new(30, 100, 30, 10));

        let (_, link) = diagram.links().next().unwrap();
        assert_eq!(link.style, PathStyle::Orthogonal);
        assert_eq!(link.source_position, Windrose::East);
        assert_eq!(link.target_position, Windrose::Auto);
        assert_eq!(link.line_color, Rgba::new(255, 0, 0, 255));
        assert_eq!(link.source_arrow.map(|head| head.width), Some(ArrowWidth::Narrow));
        assert_eq!(link.target_arrow, Some(ArrowHead::default()));
        assert_eq!(link.labels.source_left.as_deref(), Some("443"));
    }

    #[test]
    fn unknown_ids_are_errors() {
        let err = build(r#"{ "root": "a", "resources": { "a": { "children": ["ghost"] } } }"#).unwrap_err();
        assert!(err.to_string().contains("ghost"));
        assert!(build(r#"{ "root": "nope", "resources": {} }"#).is_err());
    }

    #[test]
    fn unknown_direction_is_a_load_error() {
        let err = build(
            r#"{ "root": "a", "resources": { "a": {}, "b": {} },
                 "links": [{ "source": "a", "target": "b", "sourcePosition": "NORTHISH" }] }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err.root_cause().downcast_ref::<LayoutError>(),
            Some(LayoutError::UnknownDirection { .. })
        ));
    }

    #[test]
    fn cycles_survive_loading() {
        let diagram = build(r#"{ "root": "a", "resources": { "a": { "type": "group", "children": ["a"] } } }"#);
        assert!(diagram.is_ok());
    }

    #[test]
    fn unknown_arrow_width_is_not_an_error() {
        let diagram = build(
            r#"{ "root": "a", "resources": { "a": {}, "b": {} },
                 "links": [{ "source": "a", "target": "b", "targetArrowHead": { "width": "huge" } }] }"#,
        )
        .unwrap();
        let (_, link) = diagram.links().next().unwrap();
        assert_eq!(link.target_arrow.map(|head| head.width), Some(ArrowWidth::None));
    }

    #[test]
    fn missing_icon_fails_the_load() {
        let err = build(r#"{ "root": "a", "resources": { "a": { "icon": "does/not/exist.png" } } }"#).unwrap_err();
        assert!(err.to_string().contains("icon of resource `a`"));
    }
}
