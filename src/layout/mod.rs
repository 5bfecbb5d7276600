mod error;
pub(crate) mod label_placement;
pub mod routing;
pub(crate) mod types;
pub mod windrose;
pub use error::{LayoutError, Result};
pub use label_placement::label_offset;
pub use routing::{arrowhead_points, route, RoutedPath};
pub use types::*;
pub use windrose::{EdgeSide, Windrose};

use crate::config::LayoutConfig;
use crate::geometry::{Margin, Padding, Rect};
use log::{debug, trace};
use std::collections::HashSet;

/// Arena owning every node and connector of one diagram.
///
/// Nodes reference children, border-children and links by index, so shared
/// subtrees and connectors never hold borrows into the tree.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    nodes: Vec<Node>,
    links: Vec<Link>,
    root: Option<NodeId>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(idx, node)| (NodeId(idx), node))
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(NodeId)
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    pub fn links(&self) -> impl Iterator<Item = (LinkId, &Link)> {
        self.links.iter().enumerate().map(|(idx, link)| (LinkId(idx), link))
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
    }

    pub fn add_border_child(&mut self, parent: NodeId, position: Windrose, child: NodeId) {
        self.nodes[parent.0]
            .border_children
            .push(BorderChild { position, node: child });
    }

    /// Registers the connector with both endpoints so whichever is drawn
    /// second can draw it.
    pub fn add_link(&mut self, link: Link) -> LinkId {
        let id = LinkId(self.links.len());
        let (source, target) = (link.source, link.target);
        self.links.push(link);
        self.nodes[source.0].links.push(id);
        if target != source {
            self.nodes[target.0].links.push(id);
        }
        id
    }

    pub fn bindings(&self, id: NodeId) -> Rect {
        self.nodes[id.0].bindings
    }

    pub fn margin(&self, id: NodeId) -> Margin {
        self.nodes[id.0].margin
    }

    pub fn padding(&self, id: NodeId) -> Padding {
        self.nodes[id.0].padding
    }

    pub fn is_drawn(&self, id: NodeId) -> bool {
        self.nodes[id.0].drawn
    }

    pub(crate) fn mark_drawn(&mut self, id: NodeId) {
        self.nodes[id.0].drawn = true;
    }

    /// Sets the link's drawn flag; returns false if it was already set.
    pub(crate) fn mark_link_drawn(&mut self, id: LinkId) -> bool {
        let link = &mut self.links[id.0];
        if link.drawn {
            return false;
        }
        link.drawn = true;
        true
    }

    /// Sizes and positions the subtree rooted at `id`, children first.
    ///
    /// `visiting` holds the nodes on the current recursion path; meeting one of
    /// them again through a child or border-child edge is a cycle.
    pub fn scale(&mut self, id: NodeId, visiting: &mut HashSet<NodeId>) -> Result<()> {
        if !visiting.insert(id) {
            return Err(LayoutError::Cycle {
                node: self.nodes[id.0].name.clone(),
            });
        }
        let result = self.scale_children(id, visiting);
        visiting.remove(&id);
        result
    }

    fn scale_children(&mut self, id: NodeId, visiting: &mut HashSet<NodeId>) -> Result<()> {
        let node = &self.nodes[id.0];
        let direction = node.direction;
        let align = node.align;
        let padding = node.padding;
        let children = node.children.clone();
        let border_children = node.border_children.clone();

        if !children.is_empty() {
            check_alignment(direction, align)?;
        }

        let mut bounds: Option<Rect> = None;
        let mut primary_extent = 0;
        let mut cross_extent = 0;
        let mut prev: Option<NodeId> = None;
        for child in children {
            self.scale(child, visiting)?;
            if let Some(prev) = prev {
                let (dx, dy) = self.placement_delta(prev, child, direction, align);
                self.translate(child, dx, dy);
            }

            let m = self.margin(child);
            let outer = self.bindings(child).expand(m.top, m.right, m.bottom, m.left);
            bounds = Some(bounds.map_or(outer, |acc| acc.union(outer)));
            match direction {
                Orientation::Horizontal => {
                    primary_extent += outer.width();
                    cross_extent = cross_extent.max(outer.height());
                }
                Orientation::Vertical => {
                    primary_extent += outer.height();
                    cross_extent = cross_extent.max(outer.width());
                }
            }
            prev = Some(child);
        }

        if let Some(bounds) = bounds {
            let bindings = bounds.expand(padding.top, padding.right, padding.bottom, padding.left);
            trace!(
                "scaled `{}` ({direction}): primary={primary_extent} cross={cross_extent} -> {bindings:?}",
                self.nodes[id.0].name
            );
            self.nodes[id.0].bindings = bindings;
        }

        for border_child in border_children {
            self.scale(border_child.node, visiting)?;
            self.attach_border_child(id, border_child)?;
        }
        Ok(())
    }

    /// Offset that puts `child` edge-to-edge (margins touching) after `prev`
    /// along the primary axis, aligned to `prev` on the cross axis.
    fn placement_delta(
        &self,
        prev: NodeId,
        child: NodeId,
        direction: Orientation,
        align: Align,
    ) -> (i32, i32) {
        let pb = self.bindings(prev);
        let pm = self.margin(prev);
        let b = self.bindings(child);
        let m = self.margin(child);
        match direction {
            Orientation::Horizontal => {
                let dx = pb.max.x + pm.right + m.left - b.min.x;
                let dy = match align {
                    Align::Top => pb.min.y - b.min.y,
                    Align::Bottom => pb.max.y - b.max.y,
                    _ => pb.min.y + (pb.height() - b.height()) / 2 - b.min.y,
                };
                (dx, dy)
            }
            Orientation::Vertical => {
                let dy = pb.max.y + pm.bottom + m.top - b.min.y;
                let dx = match align {
                    Align::Left => pb.min.x - b.min.x,
                    Align::Right => pb.max.x - b.max.x,
                    _ => pb.min.x + (pb.width() - b.width()) / 2 - b.min.x,
                };
                (dx, dy)
            }
        }
    }

    /// Centers a border-child on its compass anchor of the owner's bindings.
    fn attach_border_child(&mut self, owner: NodeId, border_child: BorderChild) -> Result<()> {
        let anchor = windrose::resolve(&self.bindings(owner), border_child.position)?;
        let b = self.bindings(border_child.node);
        let dx = anchor.x - b.min.x - b.width() / 2;
        let dy = anchor.y - b.min.y - b.height() / 2;
        self.translate(border_child.node, dx, dy);
        Ok(())
    }

    /// Shifts a node and everything below it. Each distinct node moves once
    /// per call, even when reachable along several paths.
    pub fn translate(&mut self, id: NodeId, dx: i32, dy: i32) {
        if dx == 0 && dy == 0 {
            return;
        }
        let mut seen = HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let node = &mut self.nodes[current.0];
            node.bindings = node.bindings.translate(dx, dy);
            stack.extend(node.children.iter().copied());
            stack.extend(node.border_children.iter().map(|bc| bc.node));
        }
    }

    /// Moves the tree so the root's top-left corner sits at its own padding.
    pub fn zero_adjust(&mut self, root: NodeId) {
        let b = self.bindings(root);
        let p = self.padding(root);
        let (dx, dy) = (-b.min.x + p.left, -b.min.y + p.top);
        debug!("zero-adjusting `{}` by ({dx}, {dy})", self.nodes[root.0].name);
        self.translate(root, dx, dy);
    }

    /// Canvas size needed to draw the adjusted tree.
    pub fn canvas_size(&self) -> Option<(u32, u32)> {
        let root = self.root?;
        let b = self.bindings(root);
        let p = self.padding(root);
        let width = (b.max.x + p.right).max(1) as u32;
        let height = (b.max.y + p.bottom).max(1) as u32;
        Some((width, height))
    }
}

fn check_alignment(direction: Orientation, align: Align) -> Result<()> {
    let valid = match direction {
        Orientation::Horizontal => matches!(align, Align::Top | Align::Center | Align::Bottom),
        Orientation::Vertical => matches!(align, Align::Left | Align::Center | Align::Right),
    };
    if valid {
        Ok(())
    } else {
        Err(LayoutError::UnknownAlignment {
            align: align.to_string(),
            orientation: direction,
        })
    }
}

/// Runs `scale` then `zero_adjust` on the diagram's root.
pub fn compute_layout(diagram: &mut Diagram, config: &LayoutConfig) -> Result<()> {
    let Some(root) = diagram.root() else {
        debug!("diagram has no root; nothing to lay out");
        return Ok(());
    };
    let mut visiting = HashSet::new();
    diagram.scale(root, &mut visiting)?;
    diagram.zero_adjust(root);
    debug!(
        "layout finished: root bindings {:?}, clearance {}",
        diagram.bindings(root),
        config.clearance
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(diagram: &mut Diagram, name: &str) -> NodeId {
        diagram.add_node(Node::resource(name))
    }

    fn scale_root(diagram: &mut Diagram, root: NodeId) -> Result<()> {
        diagram.scale(root, &mut HashSet::new())
    }

    fn two_sibling_group() -> (Diagram, NodeId, NodeId, NodeId) {
        let mut diagram = Diagram::new();
        let mut group = Node::group("group");
        group.padding = Padding::new(20, 45, 20, 45);
        group.direction = Orientation::Horizontal;
        group.align = Align::Center;
        let group = diagram.add_node(group);
        let a = leaf(&mut diagram, "a");
        let b = leaf(&mut diagram, "b");
        diagram.add_child(group, a);
        diagram.add_child(group, b);
        diagram.set_root(group);
        (diagram, group, a, b)
    }

    #[test]
    fn two_sibling_horizontal_group() {
        let (mut diagram, group, a, b) = two_sibling_group();
        compute_layout(&mut diagram, &LayoutConfig::default()).unwrap();

        let g = diagram.bindings(group);
        assert_eq!(g.width(), 2 * (64 + 100 + 100) + 45 + 45);
        assert_eq!(g.height(), 64 + 30 + 30 + 20 + 20);
        assert_eq!(g, Rect::new(45, 20, 663, 184));

        let ab = diagram.bindings(a);
        let bb = diagram.bindings(b);
        assert_eq!(ab, Rect::new(190, 70, 254, 134));
        assert_eq!(bb.min.x, ab.max.x + 100 + 100);
        assert_eq!(bb.min.y, ab.min.y);
    }

    #[test]
    fn zero_adjust_is_idempotent() {
        let (mut diagram, group, a, b) = two_sibling_group();
        compute_layout(&mut diagram, &LayoutConfig::default()).unwrap();
        let before: Vec<Rect> = [group, a, b].iter().map(|id| diagram.bindings(*id)).collect();
        diagram.zero_adjust(group);
        let after: Vec<Rect> = [group, a, b].iter().map(|id| diagram.bindings(*id)).collect();
        assert_eq!(before, after);
        let root = diagram.bindings(group);
        let pad = diagram.padding(group);
        assert_eq!((root.min.x, root.min.y), (pad.left, pad.top));
    }

    #[test]
    fn vertical_stack_right_alignment() {
        let mut diagram = Diagram::new();
        let mut stack = Node::vertical_stack("stack");
        stack.align = Align::Right;
        let stack = diagram.add_node(stack);
        let wide = leaf(&mut diagram, "wide");
        diagram.node_mut(wide).bindings = Rect::from_size(120, 64);
        let narrow = leaf(&mut diagram, "narrow");
        diagram.add_child(stack, wide);
        diagram.add_child(stack, narrow);
        scale_root(&mut diagram, stack).unwrap();

        let w = diagram.bindings(wide);
        let n = diagram.bindings(narrow);
        assert_eq!(n.max.x, w.max.x);
        assert_eq!(n.min.y, w.max.y + 30 + 30);
        let s = diagram.bindings(stack);
        assert_eq!(s.height(), 2 * (64 + 60));
        assert_eq!(s.width(), 120 + 100 + 100);
    }

    #[test]
    fn horizontal_top_and_bottom_alignment() {
        for (align, expect_top) in [(Align::Top, true), (Align::Bottom, false)] {
            let mut diagram = Diagram::new();
            let mut stack = Node::horizontal_stack("row");
            stack.align = align;
            let stack = diagram.add_node(stack);
            let tall = leaf(&mut diagram, "tall");
            diagram.node_mut(tall).bindings = Rect::from_size(64, 100);
            let short = leaf(&mut diagram, "short");
            diagram.add_child(stack, tall);
            diagram.add_child(stack, short);
            scale_root(&mut diagram, stack).unwrap();

            let t = diagram.bindings(tall);
            let s = diagram.bindings(short);
            if expect_top {
                assert_eq!(s.min.y, t.min.y);
            } else {
                assert_eq!(s.max.y, t.max.y);
            }
        }
    }

    #[test]
    fn mismatched_alignment_is_fatal() {
        let mut diagram = Diagram::new();
        let mut stack = Node::horizontal_stack("row");
        stack.align = Align::Left;
        let stack = diagram.add_node(stack);
        let a = leaf(&mut diagram, "a");
        diagram.add_child(stack, a);
        let err = scale_root(&mut diagram, stack).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::UnknownAlignment { ref align, orientation: Orientation::Horizontal } if align == "left"
        ));
    }

    #[test]
    fn leaf_bindings_are_left_alone() {
        let mut diagram = Diagram::new();
        let a = leaf(&mut diagram, "a");
        diagram.node_mut(a).bindings = Rect::new(5, 5, 69, 69);
        scale_root(&mut diagram, a).unwrap();
        assert_eq!(diagram.bindings(a), Rect::new(5, 5, 69, 69));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut diagram = Diagram::new();
        let a = diagram.add_node(Node::group("a"));
        diagram.add_child(a, a);
        let err = scale_root(&mut diagram, a).unwrap_err();
        assert!(matches!(err, LayoutError::Cycle { ref node } if node == "a"));
    }

    #[test]
    fn two_and_three_cycles_through_children() {
        let mut diagram = Diagram::new();
        let a = diagram.add_node(Node::group("a"));
        let b = diagram.add_node(Node::group("b"));
        diagram.add_child(a, b);
        diagram.add_child(b, a);
        assert!(matches!(scale_root(&mut diagram, a), Err(LayoutError::Cycle { .. })));

        let mut diagram = Diagram::new();
        let a = diagram.add_node(Node::group("a"));
        let b = diagram.add_node(Node::group("b"));
        let c = diagram.add_node(Node::group("c"));
        diagram.add_child(a, b);
        diagram.add_child(b, c);
        diagram.add_child(c, a);
        let err = scale_root(&mut diagram, a).unwrap_err();
        assert!(matches!(err, LayoutError::Cycle { ref node } if node == "a"));
    }

    #[test]
    fn cycles_through_border_children() {
        let mut diagram = Diagram::new();
        let a = diagram.add_node(Node::group("a"));
        diagram.add_border_child(a, Windrose::North, a);
        assert!(matches!(scale_root(&mut diagram, a), Err(LayoutError::Cycle { .. })));

        let mut diagram = Diagram::new();
        let a = diagram.add_node(Node::group("a"));
        let b = diagram.add_node(Node::group("b"));
        diagram.add_border_child(a, Windrose::East, b);
        diagram.add_border_child(b, Windrose::West, a);
        assert!(matches!(scale_root(&mut diagram, a), Err(LayoutError::Cycle { .. })));

        let mut diagram = Diagram::new();
        let a = diagram.add_node(Node::group("a"));
        let b = diagram.add_node(Node::group("b"));
        let c = diagram.add_node(Node::group("c"));
        diagram.add_child(a, b);
        diagram.add_border_child(b, Windrose::South, c);
        diagram.add_child(c, a);
        assert!(matches!(scale_root(&mut diagram, a), Err(LayoutError::Cycle { .. })));
    }

    #[test]
    fn shared_leaf_diamond_is_not_a_cycle() {
        let mut diagram = Diagram::new();
        let root = diagram.add_node(Node::group("root"));
        let left = diagram.add_node(Node::group("left"));
        let right = diagram.add_node(Node::group("right"));
        let shared = leaf(&mut diagram, "shared");
        diagram.add_child(root, left);
        diagram.add_border_child(root, Windrose::South, right);
        diagram.add_child(left, shared);
        diagram.add_child(right, shared);
        diagram.set_root(root);
        assert!(compute_layout(&mut diagram, &LayoutConfig::default()).is_ok());
    }

    #[test]
    fn border_child_is_centered_on_its_anchor() {
        let mut diagram = Diagram::new();
        let owner = diagram.add_node(Node::group("owner"));
        let inner = leaf(&mut diagram, "inner");
        let badge = diagram.add_node(Node::resource("badge"));
        diagram.node_mut(badge).bindings = Rect::from_size(20, 20);
        diagram.add_child(owner, inner);
        diagram.add_border_child(owner, Windrose::East, badge);
        scale_root(&mut diagram, owner).unwrap();

        let o = diagram.bindings(owner);
        let b = diagram.bindings(badge);
        let anchor = windrose::resolve(&o, Windrose::East).unwrap();
        assert_eq!((b.min.x + 10, b.min.y + 10), (anchor.x, anchor.y));
        // excluded from flow: owner size only reflects the regular child
        assert_eq!(o.width(), 64 + 200 + 40);
    }

    #[test]
    fn auto_border_position_is_rejected() {
        let mut diagram = Diagram::new();
        let owner = diagram.add_node(Node::group("owner"));
        let badge = leaf(&mut diagram, "badge");
        diagram.add_border_child(owner, Windrose::Auto, badge);
        assert!(matches!(
            scale_root(&mut diagram, owner),
            Err(LayoutError::UnresolvedAuto)
        ));
    }

    #[test]
    fn translate_moves_whole_subtree_once() {
        let mut diagram = Diagram::new();
        let root = diagram.add_node(Node::group("root"));
        let a = diagram.add_node(Node::group("a"));
        let shared = leaf(&mut diagram, "shared");
        diagram.add_child(root, a);
        diagram.add_child(a, shared);
        diagram.add_border_child(root, Windrose::North, shared);
        diagram.translate(root, 7, -3);
        assert_eq!(diagram.bindings(shared), Rect::new(7, -3, 71, 61));
    }

    #[test]
    fn links_register_with_both_endpoints() {
        let mut diagram = Diagram::new();
        let a = leaf(&mut diagram, "a");
        let b = leaf(&mut diagram, "b");
        let link = diagram.add_link(Link::new(a, b));
        assert_eq!(diagram.node(a).links(), &[link]);
        assert_eq!(diagram.node(b).links(), &[link]);
        assert!(diagram.mark_link_drawn(link));
        assert!(!diagram.mark_link_drawn(link));
    }
}
