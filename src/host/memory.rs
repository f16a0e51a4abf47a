use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::menu::{ActionHandler, MenuItem};
use crate::model::{Graph, GraphNode, GraphSource, Link, LinkId, NodeId, Point, Rect};
use crate::navigator::{SlotAnchor, ViewState, slots::HIT_RADIUS};

use super::{EditorHost, HostError};

/// A host-side effect the navigator asked for.
#[derive(Clone, Debug, PartialEq)]
pub enum HostCall {
	CenterOn(NodeId),
	Select(NodeId),
	ShowMenu { labels: Vec<String>, at: Point },
}

/// Editor host over an owned [`Graph`], recording every effect it is asked to perform.
#[derive(Default)]
pub struct MemoryHost {
	pub graph: RefCell<Graph>,
	pub view: Cell<Option<ViewState>>,
	/// The host's own graph → screen transform as `(offset, scale)`, if it has one.
	pub screen_transform: Cell<Option<(Point, f64)>>,
	/// Screen rectangles of nodes rendered as DOM elements.
	pub element_rects: RefCell<HashMap<NodeId, Rect>>,
	selected: Cell<Option<NodeId>>,
	calls: RefCell<Vec<HostCall>>,
}

impl MemoryHost {
	pub fn new(graph: Graph) -> Self {
		Self {
			graph: RefCell::new(graph),
			..Default::default()
		}
	}

	pub fn calls(&self) -> Vec<HostCall> {
		self.calls.borrow().clone()
	}

	pub fn clear_calls(&self) {
		self.calls.borrow_mut().clear();
	}

	pub fn set_selected(&self, id: Option<NodeId>) {
		self.selected.set(id);
	}
}

impl GraphSource for MemoryHost {
	fn node(&self, id: NodeId) -> Option<GraphNode> {
		self.graph.borrow().node(id)
	}

	fn link(&self, id: LinkId) -> Option<Link> {
		self.graph.borrow().link(id)
	}

	fn nodes(&self) -> Vec<GraphNode> {
		self.graph.borrow().nodes()
	}
}

impl SlotAnchor for MemoryHost {
	fn slot_position(&self, _: &GraphNode, _: usize, _: bool) -> Option<Point> {
		None
	}
}

impl EditorHost for MemoryHost {
	fn selected_node(&self) -> Option<NodeId> {
		self.selected.get()
	}

	fn node_at(&self, point: Point) -> Option<GraphNode> {
		self.nodes()
			.into_iter()
			.rev()
			.find(|n| n.bounds().is_some_and(|b| b.inflate(HIT_RADIUS).contains(point)))
	}

	fn center_on_node(&self, id: NodeId) -> Result<(), HostError> {
		self.node(id).ok_or(HostError::UnknownNode(id))?;
		self.calls.borrow_mut().push(HostCall::CenterOn(id));
		Ok(())
	}

	fn select_node(&self, id: NodeId) -> Result<(), HostError> {
		self.node(id).ok_or(HostError::UnknownNode(id))?;
		self.selected.set(Some(id));
		self.calls.borrow_mut().push(HostCall::Select(id));
		Ok(())
	}

	fn view_state(&self) -> Option<ViewState> {
		self.view.get()
	}

	fn graph_to_screen(&self, p: Point) -> Option<Point> {
		let (offset, scale) = self.screen_transform.get()?;
		Some(Point::new((p.x + offset.x) * scale, (p.y + offset.y) * scale))
	}

	fn node_element_rect(&self, id: NodeId) -> Option<Rect> {
		self.element_rects.borrow().get(&id).copied()
	}

	fn show_menu(&self, items: &[MenuItem], at: Point, _: ActionHandler) -> Result<(), HostError> {
		let labels = crate::menu::flatten(items).into_iter().map(|(l, _)| l).collect();
		self.calls.borrow_mut().push(HostCall::ShowMenu { labels, at });
		Ok(())
	}
}
