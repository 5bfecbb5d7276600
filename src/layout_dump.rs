use crate::config::LayoutConfig;
use crate::layout::{route, Diagram};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: u32,
    pub height: u32,
    pub nodes: Vec<NodeDump>,
    pub links: Vec<LinkDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub kind: String,
    pub min: [i32; 2],
    pub max: [i32; 2],
}

#[derive(Debug, Serialize)]
pub struct LinkDump {
    pub source: String,
    pub target: String,
    pub style: String,
    pub source_position: String,
    pub target_position: String,
    pub points: Vec<[i32; 2]>,
}

impl LayoutDump {
    /// Snapshot of a laid-out diagram: final bindings and routed connectors.
    pub fn from_diagram(diagram: &Diagram, config: &LayoutConfig) -> anyhow::Result<Self> {
        let (width, height) = diagram.canvas_size().unwrap_or((0, 0));
        let nodes = diagram
            .nodes()
            .map(|(_, node)| NodeDump {
                id: node.name.clone(),
                kind: node.kind.name().to_string(),
                min: [node.bindings.min.x, node.bindings.min.y],
                max: [node.bindings.max.x, node.bindings.max.y],
            })
            .collect();

        let mut links = Vec::new();
        for (_, link) in diagram.links() {
            let routed = route(diagram, link, config)?;
            links.push(LinkDump {
                source: diagram.node(link.source).name.clone(),
                target: diagram.node(link.target).name.clone(),
                style: link.style.name().to_string(),
                source_position: routed.source_position.to_string(),
                target_position: routed.target_position.to_string(),
                points: routed.points.iter().map(|p| [p.x, p.y]).collect(),
            });
        }

        Ok(LayoutDump {
            width,
            height,
            nodes,
            links,
        })
    }
}

pub fn write_layout_dump(path: &Path, diagram: &Diagram, config: &LayoutConfig) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_diagram(diagram, config)?;
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compute_layout, Link, Node, PathStyle};

    #[test]
    fn dump_lists_bindings_and_routes() {
        let mut diagram = Diagram::new();
        let root = diagram.add_node(Node::horizontal_stack("row"));
        let a = diagram.add_node(Node::resource("a"));
        let b = diagram.add_node(Node::resource("b"));
        diagram.add_child(root, a);
        diagram.add_child(root, b);
        let mut link = Link::new(a, b);
        link.style = PathStyle::Orthogonal;
        diagram.add_link(link);
        diagram.set_root(root);
        let config = LayoutConfig::default();
        compute_layout(&mut diagram, &config).unwrap();

        let dump = LayoutDump::from_diagram(&diagram, &config).unwrap();
        assert_eq!(dump.nodes.len(), 3);
        assert_eq!(dump.nodes[1].id, "a");
        assert_eq!(dump.nodes[1].kind, "resource");
        assert_eq!(dump.links[0].style, "orthogonal");
        assert_eq!(dump.links[0].source_position, "E");
        assert_eq!(dump.links[0].target_position, "W");
        assert!(dump.links[0].points.len() >= 2);

        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["width"], dump.width);
    }
}
