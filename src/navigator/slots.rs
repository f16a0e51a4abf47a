use crate::model::{GraphNode, Point, SlotHit};

/// Graph-space distance within which a point counts as "on" a port.
pub const HIT_RADIUS: f64 = 20.0;
/// Vertical spacing of stacked ports when the host cannot report their positions.
pub const SLOT_ROW_HEIGHT: f64 = 20.0;

/// Host-provided per-slot position accessor, returning graph-space coordinates.
pub trait SlotAnchor {
	fn slot_position(&self, node: &GraphNode, index: usize, is_input: bool) -> Option<Point>;
}

/// Finds the port nearest to a graph-space point.
#[derive(Clone, Copy, Debug)]
pub struct SlotLocator {
	pub hit_radius: f64,
	pub row_height: f64,
}

impl Default for SlotLocator {
	fn default() -> Self {
		Self {
			hit_radius: HIT_RADIUS,
			row_height: SLOT_ROW_HEIGHT,
		}
	}
}

impl SlotLocator {
	pub fn locate(
		&self,
		node: &GraphNode,
		query: Point,
		anchor: Option<&dyn SlotAnchor>,
	) -> Option<SlotHit> {
		let origin = node.finite_pos()?;
		if !query.is_finite() {
			return None;
		}

		let inputs = node.inputs.iter().enumerate().map(|(i, p)| (i, true, p));
		let outputs = node.outputs.iter().enumerate().map(|(i, p)| (i, false, p));

		let mut best: Option<(f64, usize, bool)> = None;
		for (index, is_input, _) in inputs.chain(outputs) {
			let Some(pos) = self.slot_position(node, origin, index, is_input, anchor) else {
				continue;
			};
			let dist = pos.distance(query);
			if best.is_none_or(|(d, _, _)| dist < d) {
				best = Some((dist, index, is_input));
			}
		}

		let (dist, index, is_input) = best?;
		if dist > self.hit_radius {
			return None;
		}
		let slot = node.port(index, is_input)?.clone();
		Some(SlotHit {
			index,
			is_input,
			slot,
		})
	}

	/// Graph-space position of one port: host accessor first, then the position the
	/// port itself records, then the stacked-rows layout.
	pub fn slot_position(
		&self,
		node: &GraphNode,
		origin: Point,
		index: usize,
		is_input: bool,
		anchor: Option<&dyn SlotAnchor>,
	) -> Option<Point> {
		if let Some(pos) = anchor
			.and_then(|a| a.slot_position(node, index, is_input))
			.filter(|p| p.is_finite())
		{
			return Some(pos);
		}

		if let Some(rel) = node
			.port(index, is_input)
			.and_then(|p| p.pos)
			.filter(|p| p.is_finite())
		{
			return Some(origin.offset(rel.x, rel.y));
		}

		let x = if is_input {
			origin.x
		} else {
			let (width, _) = node.size.filter(|(w, _)| w.is_finite())?;
			origin.x + width
		};
		Some(Point::new(x, origin.y + (index as f64 + 0.5) * self.row_height))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::Port;

	fn two_in_one_out() -> GraphNode {
		let mut node = GraphNode::new(1, "Mix").at(100.0, 200.0, 140.0, 60.0);
		node.inputs = vec![Port::named("a"), Port::named("b")];
		node.outputs = vec![Port::named("out")];
		node
	}

	struct Fixed(Point);

	impl SlotAnchor for Fixed {
		fn slot_position(&self, _: &GraphNode, index: usize, is_input: bool) -> Option<Point> {
			(is_input && index == 1).then_some(self.0)
		}
	}

	#[test]
	fn layout_fallback_stacks_rows() {
		let locator = SlotLocator::default();
		let node = two_in_one_out();

		let hit = locator.locate(&node, Point::new(101.0, 231.0), None).unwrap();
		assert_eq!((hit.index, hit.is_input), (1, true));
		assert_eq!(hit.slot.name.as_deref(), Some("b"));

		let hit = locator.locate(&node, Point::new(238.0, 209.0), None).unwrap();
		assert_eq!((hit.index, hit.is_input), (0, false));
	}

	#[test]
	fn far_points_miss() {
		let locator = SlotLocator::default();
		let node = two_in_one_out();
		assert!(locator.locate(&node, Point::new(170.0, 400.0), None).is_none());
	}

	#[test]
	fn host_accessor_wins_over_layout() {
		let locator = SlotLocator::default();
		let node = two_in_one_out();
		let anchor = Fixed(Point::new(500.0, 500.0));

		let hit = locator
			.locate(&node, Point::new(505.0, 500.0), Some(&anchor))
			.unwrap();
		assert_eq!((hit.index, hit.is_input), (1, true));
	}

	#[test]
	fn recorded_port_offset_is_used() {
		let locator = SlotLocator::default();
		let mut node = two_in_one_out();
		node.outputs[0].pos = Some(Point::new(140.0, 50.0));

		let hit = locator.locate(&node, Point::new(240.0, 250.0), None).unwrap();
		assert_eq!((hit.index, hit.is_input), (0, false));
	}

	#[test]
	fn malformed_nodes_yield_nothing() {
		let locator = SlotLocator::default();
		let mut node = two_in_one_out();
		node.pos = None;
		assert!(locator.locate(&node, Point::new(100.0, 210.0), None).is_none());

		node.pos = Some(Point::new(f64::INFINITY, 0.0));
		assert!(locator.locate(&node, Point::new(100.0, 210.0), None).is_none());

		let empty = GraphNode::new(2, "Empty").at(0.0, 0.0, 10.0, 10.0);
		assert!(locator.locate(&empty, Point::new(0.0, 0.0), None).is_none());
	}

	#[test]
	fn ties_go_to_first_port_in_order() {
		let locator = SlotLocator::default();
		let mut node = GraphNode::new(1, "Thin").at(0.0, 0.0, 0.0, 20.0);
		node.inputs = vec![Port::named("in")];
		node.outputs = vec![Port::named("out")];

		let hit = locator.locate(&node, Point::new(0.0, 10.0), None).unwrap();
		assert!(hit.is_input);
	}

	#[test]
	fn approaching_a_port_keeps_it_selected() {
		let locator = SlotLocator::default();
		let node = two_in_one_out();
		let target = Point::new(100.0, 230.0);
		let start = Point::new(80.0, 236.0);

		let mut last = None;
		for step in 0..=10 {
			let t = step as f64 / 10.0;
			let p = Point::new(
				start.x + (target.x - start.x) * t,
				start.y + (target.y - start.y) * t,
			);
			if let Some(hit) = locator.locate(&node, p, None) {
				assert_eq!((hit.index, hit.is_input), (1, true));
				last = Some(hit.index);
			} else {
				assert!(last.is_none(), "lost the port after acquiring it");
			}
		}
		assert_eq!(last, Some(1));
	}
}
