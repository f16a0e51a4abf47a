//! The editor the extension runs inside.
//!
//! [`EditorHost`] is everything the navigator needs from the host. The browser build
//! talks to the host's JS `app` object through [`litegraph::LiteGraphHost`];
//! [`memory::MemoryHost`] backs a headless graph.

pub mod input;
pub mod litegraph;
pub mod memory;
pub mod settings;

use thiserror::Error;

use crate::menu::{ActionHandler, MenuItem};
use crate::model::{GraphNode, GraphSource, NodeId, Point, Rect};
use crate::navigator::{SlotAnchor, ViewState};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
	#[error("host value has no `{0}`")]
	Missing(&'static str),

	#[error("host `{0}` is not a function")]
	NotCallable(&'static str),

	#[error("host `{0}` has an unexpected shape")]
	WrongType(&'static str),

	#[error("host call `{name}` threw: {message}")]
	Threw { name: &'static str, message: String },

	#[error("node {0} is not in the graph")]
	UnknownNode(NodeId),
}

pub trait EditorHost: GraphSource + SlotAnchor {
	/// The node the user has selected, if exactly one stands out.
	fn selected_node(&self) -> Option<NodeId>;

	/// Topmost node whose body (or slot margin) covers a graph-space point.
	fn node_at(&self, point: Point) -> Option<GraphNode>;

	fn center_on_node(&self, id: NodeId) -> Result<(), HostError>;

	fn select_node(&self, id: NodeId) -> Result<(), HostError>;

	fn view_state(&self) -> Option<ViewState>;

	/// The host's own graph → screen conversion, when it has one.
	fn graph_to_screen(&self, point: Point) -> Option<Point>;

	/// Screen rectangle of the node's DOM element, for hosts that render nodes as DOM.
	fn node_element_rect(&self, id: NodeId) -> Option<Rect>;

	/// Shows a standalone menu at a screen position using the host's generic menu.
	fn show_menu(&self, items: &[MenuItem], at: Point, on_action: ActionHandler) -> Result<(), HostError>;
}
