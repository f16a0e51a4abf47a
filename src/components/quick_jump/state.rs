use crate::model::{GraphNode, GraphSource, NodeId, Point};
use crate::navigator::resolve;

pub const POPUP_WIDTH: f64 = 280.0;
const HEADER_HEIGHT: f64 = 32.0;
const SECTION_HEIGHT: f64 = 24.0;
const ROW_HEIGHT: f64 = 26.0;

#[derive(Clone, Debug, PartialEq)]
pub struct QuickJumpRow {
	pub port_index: usize,
	pub port_name: String,
	pub targets: Vec<(NodeId, String)>,
}

/// Connected ports of one node, split by side.
#[derive(Clone, Debug, PartialEq)]
pub struct QuickJumpModel {
	pub node_id: NodeId,
	pub title: String,
	pub inputs: Vec<QuickJumpRow>,
	pub outputs: Vec<QuickJumpRow>,
}

fn rows<G: GraphSource + ?Sized>(graph: &G, node: &GraphNode, is_input: bool) -> Vec<QuickJumpRow> {
	let ports = if is_input { &node.inputs } else { &node.outputs };
	ports
		.iter()
		.enumerate()
		.filter_map(|(index, port)| {
			let targets: Vec<_> = resolve(graph, node, index, is_input)
				.into_iter()
				.map(|c| (c.node.id, format!("{} #{}", c.node.display_title(), c.node.id)))
				.collect();
			(!targets.is_empty()).then(|| QuickJumpRow {
				port_index: index,
				port_name: port.label(index, is_input),
				targets,
			})
		})
		.collect()
}

impl QuickJumpModel {
	pub fn build<G: GraphSource + ?Sized>(graph: &G, node: &GraphNode) -> Self {
		Self {
			node_id: node.id,
			title: node.display_title().to_string(),
			inputs: rows(graph, node, true),
			outputs: rows(graph, node, false),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.inputs.is_empty() && self.outputs.is_empty()
	}

	/// Rough on-screen size, used to keep the popup inside the window before it
	/// has been laid out.
	pub fn estimated_size(&self, scale: f64) -> (f64, f64) {
		let sections = [&self.inputs, &self.outputs]
			.iter()
			.filter(|rows| !rows.is_empty())
			.count()
			.max(1) as f64;
		let rows = (self.inputs.len() + self.outputs.len()).max(1) as f64;
		(
			POPUP_WIDTH * scale,
			(HEADER_HEIGHT + sections * SECTION_HEIGHT + rows * ROW_HEIGHT) * scale,
		)
	}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub start: Point,
	pub origin_start: Point,
}

impl DragState {
	pub fn begin(&mut self, pointer: Point, origin: Point) {
		self.active = true;
		self.start = pointer;
		self.origin_start = origin;
	}

	/// New popup origin for a pointer at `pointer`, while dragging.
	pub fn moved_to(&self, pointer: Point) -> Option<Point> {
		self.active.then(|| {
			self.origin_start
				.offset(pointer.x - self.start.x, pointer.y - self.start.y)
		})
	}

	pub fn end(&mut self) {
		self.active = false;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{Graph, Port};

	#[test]
	fn model_lists_connected_ports_only() {
		let mut graph = Graph::new();
		let mut hub = GraphNode::new(1, "Hub");
		hub.inputs = vec![Port::named("a"), Port::named("b")];
		graph.add_node(hub);
		graph.add_node(GraphNode::new(2, "Source"));
		graph.add_node(GraphNode::new(3, "SinkA"));
		graph.add_node(GraphNode::new(4, "SinkB"));
		graph.connect(10, 2, 0, 1, 1);
		graph.connect(11, 1, 0, 3, 0);
		graph.connect(12, 1, 0, 4, 0);

		let model = QuickJumpModel::build(&graph, &graph.node(1).unwrap());
		assert_eq!(model.inputs.len(), 1);
		assert_eq!(model.inputs[0].port_index, 1);
		assert_eq!(model.inputs[0].port_name, "b");
		assert_eq!(model.inputs[0].targets, vec![(2, "Source #2".to_string())]);
		assert_eq!(model.outputs.len(), 1);
		assert_eq!(model.outputs[0].targets.len(), 2);
		assert!(!model.is_empty());
	}

	#[test]
	fn unconnected_node_gives_empty_model() {
		let mut graph = Graph::new();
		graph.add_node(GraphNode::new(1, "Lonely"));
		let model = QuickJumpModel::build(&graph, &graph.node(1).unwrap());
		assert!(model.is_empty());
		assert_eq!(model.estimated_size(1.0).0, POPUP_WIDTH);
	}

	#[test]
	fn drag_moves_origin_by_pointer_delta() {
		let mut drag = DragState::default();
		assert_eq!(drag.moved_to(Point::new(5.0, 5.0)), None);

		drag.begin(Point::new(100.0, 100.0), Point::new(300.0, 200.0));
		assert_eq!(drag.moved_to(Point::new(130.0, 90.0)), Some(Point::new(330.0, 190.0)));

		drag.end();
		assert_eq!(drag.moved_to(Point::new(130.0, 90.0)), None);
	}
}
