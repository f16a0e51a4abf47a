//! Screen placement for popups attached to a node.

use crate::host::EditorHost;
use crate::model::{GraphNode, Point, Rect};

use super::coords::{OffsetConvention, ViewState, to_screen_space};

/// Screen-space point to attach a popup for `node`.
///
/// Asks the host to convert the node centre first, then looks for a rendered DOM
/// element for the node, then maps the centre through the view state.
pub fn resolve_anchor(node: &GraphNode, host: &dyn EditorHost) -> Option<Point> {
	let center = node.center()?;
	host.graph_to_screen(center)
		.filter(|p| p.is_finite())
		.or_else(|| {
			host.node_element_rect(node.id)
				.filter(|r| !r.is_empty())
				.map(|r| r.center())
		})
		.or_else(|| host.view_state().and_then(|view| fallback_anchor(center, &view)))
}

/// Maps `center` under both offset conventions and keeps the reading that lands on
/// the canvas, nearest the canvas centre when both do.
pub fn fallback_anchor(center: Point, view: &ViewState) -> Option<Point> {
	let canvas_center = view.canvas.center();
	let candidates = [view.convention, view.convention.alternate()]
		.into_iter()
		.filter_map(|c: OffsetConvention| to_screen_space(center, view, c).ok())
		.filter(|p| p.is_finite());

	let mut best: Option<(bool, f64, Point)> = None;
	for p in candidates {
		let on_canvas = view.canvas.contains(p);
		let dist = p.distance(canvas_center);
		let better = match best {
			None => true,
			Some((best_on, best_dist, _)) => (on_canvas && !best_on) || (on_canvas == best_on && dist < best_dist),
		};
		if better {
			best = Some((on_canvas, dist, p));
		}
	}
	best.map(|(_, _, p)| p)
}

/// Top-left corner for a popup of `size` anchored at `anchor`, kept inside `viewport`.
pub fn place_popup(anchor: Point, size: (f64, f64), viewport: Rect, margin: f64) -> Point {
	let (w, h) = size;
	let max_x = (viewport.x + viewport.width - w - margin).max(viewport.x + margin);
	let max_y = (viewport.y + viewport.height - h - margin).max(viewport.y + margin);
	Point::new(
		(anchor.x - w / 2.0).clamp(viewport.x + margin, max_x),
		(anchor.y - h / 2.0).clamp(viewport.y + margin, max_y),
	)
}
