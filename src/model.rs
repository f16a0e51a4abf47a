//! Host-independent view of the editor graph.
//!
//! Everything the navigator reads from the host is copied into these types at the
//! boundary, with absent host fields represented as `None` rather than probed for
//! at every use site.

use std::collections::BTreeMap;

/// Stable node identifier, unique within one graph.
pub type NodeId = i64;

/// Key into the graph-wide link table.
pub type LinkId = i64;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}

	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}

	pub fn offset(self, dx: f64, dy: f64) -> Self {
		Self::new(self.x + dx, self.y + dy)
	}
}

/// Axis-aligned rectangle; `x`/`y` is the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self {
			x,
			y,
			width,
			height,
		}
	}

	pub fn contains(&self, p: Point) -> bool {
		p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
	}

	pub fn center(&self) -> Point {
		Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
	}

	pub fn inflate(&self, margin: f64) -> Self {
		Self::new(
			self.x - margin,
			self.y - margin,
			self.width + 2.0 * margin,
			self.height + 2.0 * margin,
		)
	}

	pub fn is_empty(&self) -> bool {
		!(self.width > 0.0 && self.height > 0.0)
	}
}

/// Which way a connection points relative to the node it was resolved from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
	/// The connected node feeds one of our inputs.
	From,
	/// One of our outputs feeds the connected node.
	To,
}

impl Direction {
	pub fn as_str(self) -> &'static str {
		match self {
			Direction::From => "from",
			Direction::To => "to",
		}
	}

	pub fn for_input(is_input: bool) -> Self {
		if is_input { Direction::From } else { Direction::To }
	}
}

/// Link ids attached to a port.
///
/// Hosts store an input's link either as a bare id or as a one-element list, and an
/// output's links as a list; both shapes are accepted for either direction.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PortLinks {
	#[default]
	None,
	Single(LinkId),
	Many(Vec<LinkId>),
}

impl PortLinks {
	/// The link an input port follows, if any.
	pub fn first(&self) -> Option<LinkId> {
		match self {
			PortLinks::None => None,
			PortLinks::Single(id) => Some(*id),
			PortLinks::Many(ids) => ids.first().copied(),
		}
	}

	pub fn ids(&self) -> &[LinkId] {
		match self {
			PortLinks::None => &[],
			PortLinks::Single(id) => std::slice::from_ref(id),
			PortLinks::Many(ids) => ids,
		}
	}

	pub fn is_connected(&self) -> bool {
		!self.ids().is_empty()
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Port {
	pub name: Option<String>,
	pub port_type: Option<String>,
	pub links: PortLinks,
	/// Position relative to the owning node's top-left corner, when the host records one.
	pub pos: Option<Point>,
}

impl Port {
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			..Default::default()
		}
	}

	pub fn with_links(mut self, links: PortLinks) -> Self {
		self.links = links;
		self
	}

	/// Label shown in menus; unnamed ports fall back to their direction and index.
	pub fn label(&self, index: usize, is_input: bool) -> String {
		match self.name.as_deref() {
			Some(name) if !name.is_empty() => name.to_string(),
			_ if is_input => format!("input {index}"),
			_ => format!("output {index}"),
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Widget {
	pub name: Option<String>,
	pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphNode {
	pub id: NodeId,
	pub title: Option<String>,
	pub node_type: String,
	pub pos: Option<Point>,
	/// Width and height of the node body.
	pub size: Option<(f64, f64)>,
	pub inputs: Vec<Port>,
	pub outputs: Vec<Port>,
	pub widgets: Vec<Widget>,
	pub properties: Vec<(String, String)>,
}

impl GraphNode {
	pub fn new(id: NodeId, node_type: impl Into<String>) -> Self {
		Self {
			id,
			node_type: node_type.into(),
			..Default::default()
		}
	}

	pub fn at(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
		self.pos = Some(Point::new(x, y));
		self.size = Some((width, height));
		self
	}

	pub fn display_title(&self) -> &str {
		match self.title.as_deref() {
			Some(title) if !title.is_empty() => title,
			_ => &self.node_type,
		}
	}

	/// The node's position, provided it is usable for geometry.
	pub fn finite_pos(&self) -> Option<Point> {
		self.pos.filter(|p| p.is_finite())
	}

	pub fn bounds(&self) -> Option<Rect> {
		let pos = self.finite_pos()?;
		let (w, h) = self.size.filter(|(w, h)| w.is_finite() && h.is_finite())?;
		Some(Rect::new(pos.x, pos.y, w, h))
	}

	pub fn center(&self) -> Option<Point> {
		self.bounds().map(|r| r.center())
	}

	pub fn port(&self, index: usize, is_input: bool) -> Option<&Port> {
		if is_input {
			self.inputs.get(index)
		} else {
			self.outputs.get(index)
		}
	}

	pub fn has_connections(&self) -> bool {
		self.inputs
			.iter()
			.chain(self.outputs.iter())
			.any(|p| p.links.is_connected())
	}
}

/// Directed edge from an output slot to an input slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
	pub id: LinkId,
	pub origin_id: NodeId,
	pub origin_slot: usize,
	pub target_id: NodeId,
	pub target_slot: usize,
}

/// Nearest port to a query point.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotHit {
	pub index: usize,
	pub is_input: bool,
	pub slot: Port,
}

/// One node reachable through a port.
#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
	pub node: GraphNode,
	pub port_index: usize,
	pub direction: Direction,
}

/// Read access to the host graph.
pub trait GraphSource {
	fn node(&self, id: NodeId) -> Option<GraphNode>;

	fn link(&self, id: LinkId) -> Option<Link>;

	/// All nodes in host order.
	fn nodes(&self) -> Vec<GraphNode>;
}

/// Owned graph snapshot.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	nodes: Vec<GraphNode>,
	links: BTreeMap<LinkId, Link>,
}

impl Graph {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_node(&mut self, node: GraphNode) -> NodeId {
		let id = node.id;
		self.nodes.retain(|n| n.id != id);
		self.nodes.push(node);
		id
	}

	/// Adds a link and records its id on both endpoint ports, growing port lists as needed.
	pub fn connect(
		&mut self,
		id: LinkId,
		origin: NodeId,
		origin_slot: usize,
		target: NodeId,
		target_slot: usize,
	) {
		self.links.insert(
			id,
			Link {
				id,
				origin_id: origin,
				origin_slot,
				target_id: target,
				target_slot,
			},
		);
		if let Some(node) = self.nodes.iter_mut().find(|n| n.id == origin) {
			if node.outputs.len() <= origin_slot {
				node.outputs.resize_with(origin_slot + 1, Port::default);
			}
			let port = &mut node.outputs[origin_slot];
			let mut ids = port.links.ids().to_vec();
			ids.push(id);
			port.links = PortLinks::Many(ids);
		}
		if let Some(node) = self.nodes.iter_mut().find(|n| n.id == target) {
			if node.inputs.len() <= target_slot {
				node.inputs.resize_with(target_slot + 1, Port::default);
			}
			node.inputs[target_slot].links = PortLinks::Single(id);
		}
	}

	/// Drops a link from the table only, leaving port references dangling.
	pub fn forget_link(&mut self, id: LinkId) {
		self.links.remove(&id);
	}

	pub fn remove_node(&mut self, id: NodeId) {
		self.nodes.retain(|n| n.id != id);
	}

	pub fn node_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
		self.nodes.iter_mut().find(|n| n.id == id)
	}
}

impl GraphSource for Graph {
	fn node(&self, id: NodeId) -> Option<GraphNode> {
		self.nodes.iter().find(|n| n.id == id).cloned()
	}

	fn link(&self, id: LinkId) -> Option<Link> {
		self.links.get(&id).copied()
	}

	fn nodes(&self) -> Vec<GraphNode> {
		self.nodes.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn port_links_accept_both_shapes() {
		assert_eq!(PortLinks::Single(7).first(), Some(7));
		assert_eq!(PortLinks::Many(vec![7]).first(), Some(7));
		assert_eq!(PortLinks::Many(vec![]).first(), None);
		assert!(!PortLinks::None.is_connected());
	}

	#[test]
	fn bounds_require_finite_geometry() {
		let node = GraphNode::new(1, "Load").at(f64::NAN, 0.0, 100.0, 50.0);
		assert!(node.bounds().is_none());
		let node = GraphNode::new(1, "Load").at(10.0, 20.0, 100.0, 50.0);
		assert_eq!(node.center(), Some(Point::new(60.0, 45.0)));
	}

	#[test]
	fn connect_records_link_on_both_ports() {
		let mut graph = Graph::new();
		graph.add_node(GraphNode::new(1, "A"));
		graph.add_node(GraphNode::new(2, "B"));
		graph.connect(10, 1, 0, 2, 1);

		let a = graph.node(1).unwrap();
		let b = graph.node(2).unwrap();
		assert_eq!(a.outputs[0].links.ids(), &[10]);
		assert_eq!(b.inputs.len(), 2);
		assert_eq!(b.inputs[1].links.first(), Some(10));
	}
}
