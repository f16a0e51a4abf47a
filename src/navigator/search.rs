//! Text search over node titles, types, widgets and properties.

use crate::model::{GraphNode, NodeId};

const DISPLAY_LIMIT: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchKind {
	Title,
	Type,
	WidgetName,
	WidgetValue,
	PropertyName,
	PropertyValue,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchMatch {
	pub kind: MatchKind,
	pub name: String,
	pub display: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
	pub node_id: NodeId,
	pub title: String,
	pub node_type: String,
	pub matches: Vec<SearchMatch>,
}

fn truncate(value: &str) -> String {
	value.chars().take(DISPLAY_LIMIT).collect()
}

pub fn search_nodes(nodes: &[GraphNode], keyword: &str) -> Vec<SearchResult> {
	let needle = keyword.trim().to_lowercase();
	if needle.is_empty() {
		return Vec::new();
	}
	let hit = |s: &str| s.to_lowercase().contains(&needle);

	nodes
		.iter()
		.filter_map(|node| {
			let mut matches = Vec::new();
			let title = node.display_title();

			if hit(title) {
				matches.push(SearchMatch {
					kind: MatchKind::Title,
					name: "title".into(),
					display: format!("Node: {title}"),
				});
			}
			if hit(&node.node_type) {
				matches.push(SearchMatch {
					kind: MatchKind::Type,
					name: "type".into(),
					display: format!("Type: {}", node.node_type),
				});
			}

			for widget in &node.widgets {
				let name = widget.name.as_deref().unwrap_or_default();
				if !name.is_empty() && hit(name) {
					matches.push(SearchMatch {
						kind: MatchKind::WidgetName,
						name: name.into(),
						display: format!("Widget: {name} = {}", truncate(&widget.value)),
					});
				}
				if !name.is_empty() && hit(&widget.value) {
					matches.push(SearchMatch {
						kind: MatchKind::WidgetValue,
						name: name.into(),
						display: format!("Value: {name} = {}", truncate(&widget.value)),
					});
				}
			}

			for (name, value) in &node.properties {
				if hit(name) {
					matches.push(SearchMatch {
						kind: MatchKind::PropertyName,
						name: name.clone(),
						display: format!("Property: {name} = {}", truncate(value)),
					});
				}
				if hit(value) {
					matches.push(SearchMatch {
						kind: MatchKind::PropertyValue,
						name: name.clone(),
						display: format!("Property value: {name} = {}", truncate(value)),
					});
				}
			}

			(!matches.is_empty()).then(|| SearchResult {
				node_id: node.id,
				title: title.to_string(),
				node_type: node.node_type.clone(),
				matches,
			})
		})
		.collect()
}

/// Keyboard selection within a result list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchCursor {
	selected: Option<usize>,
	len: usize,
}

impl SearchCursor {
	pub fn reset(len: usize) -> Self {
		Self {
			selected: (len > 0).then_some(0),
			len,
		}
	}

	pub fn selected(&self) -> Option<usize> {
		self.selected
	}

	pub fn down(&mut self) {
		if let Some(i) = self.selected {
			if i + 1 < self.len {
				self.selected = Some(i + 1);
			}
		}
	}

	pub fn up(&mut self) {
		if let Some(i) = self.selected {
			self.selected = Some(i.saturating_sub(1));
		}
	}

	pub fn select(&mut self, index: usize) {
		if index < self.len {
			self.selected = Some(index);
		}
	}
}
