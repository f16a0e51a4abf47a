use log::debug;

use crate::model::{Connection, Direction, GraphNode, GraphSource, LinkId};

/// Nodes connected to one port of `node`.
///
/// An input yields at most one `From` entry (the link's origin); an output yields one
/// `To` entry per attached link, in link-id order. Dangling ids and missing nodes are
/// skipped.
pub fn resolve<G: GraphSource + ?Sized>(
	graph: &G,
	node: &GraphNode,
	slot: usize,
	is_input: bool,
) -> Vec<Connection> {
	let Some(port) = node.port(slot, is_input) else {
		return Vec::new();
	};

	if is_input {
		port.links
			.first()
			.and_then(|id| follow(graph, node, id, true))
			.into_iter()
			.collect()
	} else {
		port.links
			.ids()
			.iter()
			.filter_map(|&id| follow(graph, node, id, false))
			.collect()
	}
}

fn follow<G: GraphSource + ?Sized>(
	graph: &G,
	node: &GraphNode,
	link_id: LinkId,
	is_input: bool,
) -> Option<Connection> {
	let Some(link) = graph.link(link_id) else {
		debug!("[PortTeleport] node {} references missing link {link_id}", node.id);
		return None;
	};
	let (other_id, other_slot) = if is_input {
		(link.origin_id, link.origin_slot)
	} else {
		(link.target_id, link.target_slot)
	};
	let Some(other) = graph.node(other_id) else {
		debug!("[PortTeleport] link {link_id} points at missing node {other_id}");
		return None;
	};
	Some(Connection {
		node: other,
		port_index: other_slot,
		direction: Direction::for_input(is_input),
	})
}

/// Connections of one port, tagged with the port they came from.
#[derive(Clone, Debug, PartialEq)]
pub struct PortConnections {
	pub index: usize,
	pub is_input: bool,
	pub label: String,
	pub connections: Vec<Connection>,
}

/// Every connected port of `node`, inputs first, then outputs.
pub fn resolve_all<G: GraphSource + ?Sized>(graph: &G, node: &GraphNode) -> Vec<PortConnections> {
	let inputs = node.inputs.iter().enumerate().map(|(i, p)| (i, true, p));
	let outputs = node.outputs.iter().enumerate().map(|(i, p)| (i, false, p));

	inputs
		.chain(outputs)
		.filter(|(_, _, port)| port.links.is_connected())
		.filter_map(|(index, is_input, port)| {
			let connections = resolve(graph, node, index, is_input);
			(!connections.is_empty()).then(|| PortConnections {
				index,
				is_input,
				label: port.label(index, is_input),
				connections,
			})
		})
		.collect()
}
