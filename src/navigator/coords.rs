//! Screen ↔ graph coordinate conversion.
//!
//! Hosts disagree on whether the pan offset is stored in graph units (applied before
//! scaling) or screen units (applied after). The mapper tries the view's preferred
//! convention, validates the result, and falls back to the other one.

use thiserror::Error;

use crate::model::{Point, Rect};

/// Largest coordinate magnitude accepted as a real graph position.
pub const PLAUSIBLE_LIMIT: f64 = 100_000.0;
/// Slack around the visible area before a mapped point is considered off-canvas.
const VISIBLE_MARGIN: f64 = 50.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
	#[error("view scale must be positive and finite, got {0}")]
	InvalidScale(f64),

	#[error("input point is not finite")]
	NonFinite,

	#[error("no offset convention yields a plausible position")]
	Implausible,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OffsetConvention {
	/// `screen = (graph + offset) * scale + origin`
	#[default]
	GraphUnits,
	/// `screen = graph * scale + offset + origin`
	ScreenUnits,
}

impl OffsetConvention {
	pub fn alternate(self) -> Self {
		match self {
			OffsetConvention::GraphUnits => OffsetConvention::ScreenUnits,
			OffsetConvention::ScreenUnits => OffsetConvention::GraphUnits,
		}
	}

	fn to_graph(self, screen: Point, view: &ViewState) -> Point {
		let (sx, sy) = (screen.x - view.canvas.x, screen.y - view.canvas.y);
		match self {
			OffsetConvention::GraphUnits => Point::new(
				sx / view.scale - view.offset.x,
				sy / view.scale - view.offset.y,
			),
			OffsetConvention::ScreenUnits => Point::new(
				(sx - view.offset.x) / view.scale,
				(sy - view.offset.y) / view.scale,
			),
		}
	}

	fn to_screen(self, graph: Point, view: &ViewState) -> Point {
		let (cx, cy) = match self {
			OffsetConvention::GraphUnits => (
				(graph.x + view.offset.x) * view.scale,
				(graph.y + view.offset.y) * view.scale,
			),
			OffsetConvention::ScreenUnits => (
				graph.x * view.scale + view.offset.x,
				graph.y * view.scale + view.offset.y,
			),
		};
		Point::new(cx + view.canvas.x, cy + view.canvas.y)
	}
}

/// Pan/zoom state of the canvas view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
	pub offset: Point,
	pub scale: f64,
	/// Canvas element rectangle in screen space; its corner is the mapping origin.
	pub canvas: Rect,
	/// Graph-space area the host reports as visible, when it exposes one.
	pub visible_area: Option<Rect>,
	pub convention: OffsetConvention,
}

impl ViewState {
	pub fn new(offset: Point, scale: f64, canvas: Rect) -> Self {
		Self {
			offset,
			scale,
			canvas,
			visible_area: None,
			convention: OffsetConvention::default(),
		}
	}

	fn check_scale(&self) -> Result<(), MapError> {
		if self.scale.is_finite() && self.scale > 0.0 {
			Ok(())
		} else {
			Err(MapError::InvalidScale(self.scale))
		}
	}

	fn accepts(&self, graph: Point) -> bool {
		if !is_plausible(graph) {
			return false;
		}
		match self.visible_area {
			Some(area) if !area.is_empty() => area.inflate(VISIBLE_MARGIN / self.scale).contains(graph),
			_ => true,
		}
	}
}

/// Result of a screen → graph conversion, with the convention that produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mapped {
	pub point: Point,
	pub convention: OffsetConvention,
}

pub fn is_plausible(p: Point) -> bool {
	p.is_finite() && p.x.abs() <= PLAUSIBLE_LIMIT && p.y.abs() <= PLAUSIBLE_LIMIT
}

pub fn to_graph_space(screen: Point, view: &ViewState) -> Result<Mapped, MapError> {
	view.check_scale()?;
	if !screen.is_finite() {
		return Err(MapError::NonFinite);
	}

	let primary = view.convention;
	let first = primary.to_graph(screen, view);
	if view.accepts(first) {
		return Ok(Mapped {
			point: first,
			convention: primary,
		});
	}

	let alternate = primary.alternate();
	let second = alternate.to_graph(screen, view);
	if view.accepts(second) {
		return Ok(Mapped {
			point: second,
			convention: alternate,
		});
	}

	// Off the visible area under both readings: keep the primary if it is at least sane.
	if is_plausible(first) {
		Ok(Mapped {
			point: first,
			convention: primary,
		})
	} else if is_plausible(second) {
		Ok(Mapped {
			point: second,
			convention: alternate,
		})
	} else {
		Err(MapError::Implausible)
	}
}

pub fn to_screen_space(
	graph: Point,
	view: &ViewState,
	convention: OffsetConvention,
) -> Result<Point, MapError> {
	view.check_scale()?;
	if !graph.is_finite() {
		return Err(MapError::NonFinite);
	}
	Ok(convention.to_screen(graph, view))
}

/// Mouse position fields a host may attach to a pointer event.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerSample {
	/// Viewport position (`clientX`/`clientY`).
	pub client: Point,
	/// Graph position the host stamped on the event, if any.
	pub canvas_pos: Option<Point>,
	/// Graph position the host tracks for its own cursor, if any.
	pub graph_mouse: Option<Point>,
}

/// Best graph-space reading of a pointer sample.
///
/// Host-tracked positions are trusted when plausible; otherwise the client position is
/// mapped through `view`.
pub fn pointer_graph_position(sample: &PointerSample, view: Option<&ViewState>) -> Option<Point> {
	if let Some(p) = sample.graph_mouse.filter(|p| is_plausible(*p)) {
		return Some(p);
	}
	// Some hosts copy clientX into canvasX when they have not converted yet.
	if let Some(p) = sample
		.canvas_pos
		.filter(|p| is_plausible(*p) && *p != sample.client)
	{
		return Some(p);
	}
	let view = view?;
	match to_graph_space(sample.client, view) {
		Ok(mapped) => Some(mapped.point),
		Err(err) => {
			log::debug!("[PortTeleport] pointer mapping failed: {err}");
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn view(convention: OffsetConvention) -> ViewState {
		ViewState {
			offset: Point::new(-300.0, 120.0),
			scale: 1.5,
			canvas: Rect::new(40.0, 60.0, 1200.0, 800.0),
			visible_area: None,
			convention,
		}
	}

	fn close(a: Point, b: Point) -> bool {
		(a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
	}

	#[test]
	fn round_trip_restores_screen_point() {
		for convention in [OffsetConvention::GraphUnits, OffsetConvention::ScreenUnits] {
			for scale in [0.1, 0.75, 1.0, 2.5, 10.0] {
				let mut v = view(convention);
				v.scale = scale;
				let screen = Point::new(517.25, 333.5);
				let mapped = to_graph_space(screen, &v).unwrap();
				let back = to_screen_space(mapped.point, &v, mapped.convention).unwrap();
				assert!(close(back, screen), "{convention:?} at {scale}");
			}
		}
	}

	#[test]
	fn graph_units_formula() {
		let v = view(OffsetConvention::GraphUnits);
		let mapped = to_graph_space(Point::new(190.0, 210.0), &v).unwrap();
		assert!(close(mapped.point, Point::new(400.0, -20.0)));
		assert_eq!(mapped.convention, OffsetConvention::GraphUnits);
	}

	#[test]
	fn invalid_scale_fails() {
		let mut v = view(OffsetConvention::GraphUnits);
		for scale in [0.0, -1.0, f64::NAN] {
			v.scale = scale;
			assert!(matches!(
				to_graph_space(Point::new(1.0, 1.0), &v),
				Err(MapError::InvalidScale(_))
			));
			assert!(to_screen_space(Point::new(1.0, 1.0), &v, v.convention).is_err());
		}
	}

	#[test]
	fn falls_back_when_primary_lands_off_the_visible_area() {
		// Offset stored in screen units by the host.
		let mut v = view(OffsetConvention::GraphUnits);
		v.offset = Point::new(600.0, 400.0);
		v.scale = 0.5;
		v.visible_area = Some(Rect::new(-1200.0, -800.0, 2400.0, 1600.0));

		let screen = Point::new(40.0 + 1200.0, 60.0 + 750.0);
		let mapped = to_graph_space(screen, &v).unwrap();
		assert_eq!(mapped.convention, OffsetConvention::ScreenUnits);
		assert!(close(mapped.point, Point::new(1200.0, 700.0)));
	}

	#[test]
	fn implausible_under_both_conventions_fails() {
		let mut v = view(OffsetConvention::GraphUnits);
		v.offset = Point::new(1e12, 1e12);
		v.scale = 1e-9;
		assert_eq!(
			to_graph_space(Point::new(10.0, 10.0), &v),
			Err(MapError::Implausible)
		);
	}

	#[test]
	fn pointer_prefers_host_tracked_position() {
		let v = view(OffsetConvention::GraphUnits);
		let sample = PointerSample {
			client: Point::new(190.0, 210.0),
			canvas_pos: Some(Point::new(190.0, 210.0)),
			graph_mouse: Some(Point::new(12.0, 34.0)),
		};
		assert_eq!(pointer_graph_position(&sample, Some(&v)), Some(Point::new(12.0, 34.0)));

		let sample = PointerSample {
			graph_mouse: None,
			..sample
		};
		let p = pointer_graph_position(&sample, Some(&v)).unwrap();
		assert!(close(p, Point::new(400.0, -20.0)));

		assert_eq!(pointer_graph_position(&sample, None), None);
	}
}
