//! Context-menu contributions.
//!
//! Entries are built as plain [`MenuItem`] values. The host adapter turns them into
//! its own option objects for the declarative hooks; [`dom::DomMenuSurface`] splices
//! them into an already rendered menu when the hooks did not run.

pub mod dom;
pub mod poll;

use std::rc::Rc;

use crate::model::{Connection, NodeId, SlotHit};
use crate::navigator::PortConnections;

pub use poll::InteractionToken;

pub const JUMP_LABEL: &str = "Jump to connected node";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
	Jump(NodeId),
	OpenSearch,
}

pub type ActionHandler = Rc<dyn Fn(MenuAction)>;

#[derive(Clone, Debug, PartialEq)]
pub enum MenuItem {
	Separator,
	/// A clickable entry; `None` renders it disabled.
	Entry {
		label: String,
		action: Option<MenuAction>,
	},
	Submenu {
		label: String,
		items: Vec<MenuItem>,
	},
}

impl MenuItem {
	pub fn entry(label: impl Into<String>, action: MenuAction) -> Self {
		MenuItem::Entry {
			label: label.into(),
			action: Some(action),
		}
	}
}

fn target_label(conn: &Connection) -> String {
	format!("{} #{}", conn.node.display_title(), conn.node.id)
}

/// Entries for a right-clicked port: one direct entry, or a submenu when the port
/// fans out to several nodes. Nothing when the port is unconnected.
pub fn slot_items(hit: &SlotHit, connections: &[Connection]) -> Vec<MenuItem> {
	match connections {
		[] => Vec::new(),
		[only] => vec![
			MenuItem::Separator,
			MenuItem::entry(
				format!("Jump to {}", target_label(only)),
				MenuAction::Jump(only.node.id),
			),
		],
		many => {
			let port = hit.slot.label(hit.index, hit.is_input);
			vec![
				MenuItem::Separator,
				MenuItem::Submenu {
					label: format!("{JUMP_LABEL} ({port}, {})", many.len()),
					items: many
						.iter()
						.map(|c| MenuItem::entry(target_label(c), MenuAction::Jump(c.node.id)))
						.collect(),
				},
			]
		}
	}
}

/// Node-wide submenu listing every connection of every port.
pub fn node_items(ports: &[PortConnections]) -> Vec<MenuItem> {
	let items: Vec<MenuItem> = ports
		.iter()
		.flat_map(|port| {
			port.connections.iter().map(move |conn| {
				let label = if port.is_input {
					format!("← {} → {}", port.label, conn.node.display_title())
				} else {
					format!("{} → {}", port.label, conn.node.display_title())
				};
				MenuItem::entry(label, MenuAction::Jump(conn.node.id))
			})
		})
		.collect();

	if items.is_empty() {
		return Vec::new();
	}
	vec![
		MenuItem::Separator,
		MenuItem::Submenu {
			label: JUMP_LABEL.into(),
			items,
		},
	]
}

pub fn canvas_items(search_hotkey: &str) -> Vec<MenuItem> {
	vec![
		MenuItem::Separator,
		MenuItem::entry(format!("Search nodes ({search_hotkey})"), MenuAction::OpenSearch),
	]
}

/// Clickable leaves in display order, submenus expanded in place.
pub fn flatten(items: &[MenuItem]) -> Vec<(String, MenuAction)> {
	let mut out = Vec::new();
	for item in items {
		match item {
			MenuItem::Separator => {}
			MenuItem::Entry {
				label,
				action: Some(action),
			} => out.push((label.clone(), *action)),
			MenuItem::Entry { action: None, .. } => {}
			MenuItem::Submenu { items, .. } => out.extend(flatten(items)),
		}
	}
	out
}

/// A place jump entries can be attached to after the host has rendered its menu.
pub trait MenuSurface {
	/// Whether this surface can work in the current environment at all.
	fn is_available(&self) -> bool;

	/// Attaches `items` for `token`, replacing anything attached earlier. Returns
	/// `false` if there is no menu to attach to yet.
	fn attach(&self, token: &InteractionToken, items: &[MenuItem], on_action: &ActionHandler) -> bool;
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{Direction, GraphNode, Port};

	fn conn(id: NodeId, title: &str) -> Connection {
		let mut node = GraphNode::new(id, "Preview");
		node.title = Some(title.into());
		Connection {
			node,
			port_index: 0,
			direction: Direction::To,
		}
	}

	fn hit() -> SlotHit {
		SlotHit {
			index: 0,
			is_input: false,
			slot: Port::named("IMAGE"),
		}
	}

	#[test]
	fn unconnected_slot_contributes_nothing() {
		assert!(slot_items(&hit(), &[]).is_empty());
		assert!(node_items(&[]).is_empty());
	}

	#[test]
	fn single_connection_is_a_direct_entry() {
		let items = slot_items(&hit(), &[conn(2, "B")]);
		assert_eq!(items[0], MenuItem::Separator);
		assert_eq!(items[1], MenuItem::entry("Jump to B #2", MenuAction::Jump(2)));
	}

	#[test]
	fn fan_out_becomes_a_submenu() {
		let items = slot_items(&hit(), &[conn(2, "B"), conn(3, "C")]);
		let MenuItem::Submenu { label, items: sub } = &items[1] else {
			panic!("expected submenu, got {items:?}");
		};
		assert_eq!(label, "Jump to connected node (IMAGE, 2)");
		assert_eq!(
			flatten(sub),
			vec![
				("B #2".to_string(), MenuAction::Jump(2)),
				("C #3".to_string(), MenuAction::Jump(3)),
			]
		);
	}

	#[test]
	fn node_items_mark_direction() {
		let ports = vec![
			PortConnections {
				index: 0,
				is_input: true,
				label: "model".into(),
				connections: vec![conn(5, "Loader")],
			},
			PortConnections {
				index: 0,
				is_input: false,
				label: "LATENT".into(),
				connections: vec![conn(6, "Decode")],
			},
		];
		let labels: Vec<_> = flatten(&node_items(&ports)).into_iter().map(|(l, _)| l).collect();
		assert_eq!(labels, vec!["← model → Loader", "LATENT → Decode"]);
	}
}
