//! Adapter over the host editor's JS `app` object (LiteGraph-based canvas).
//!
//! Every host value is read through `Reflect` and converted into [`crate::model`]
//! types on the way in; absent or oddly shaped fields become `None` or a
//! [`HostError`], never a panic.

use std::rc::Rc;

use js_sys::{Array, Function, Map, Object, Reflect};
use log::{debug, info};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, MouseEvent};

use super::{EditorHost, HostError};
use crate::menu::{ActionHandler, MenuItem};
use crate::model::{
	GraphNode, GraphSource, Link, LinkId, NodeId, Point, Port, PortLinks, Rect, Widget,
};
use crate::navigator::{OffsetConvention, PointerSample, SlotAnchor, ViewState};
use crate::plugin::PortTeleport;

pub const EXTENSION_NAME: &str = "PortTeleport";

fn get(obj: &JsValue, key: &'static str) -> Result<JsValue, HostError> {
	let value = Reflect::get(obj, &JsValue::from_str(key)).map_err(|_| HostError::Missing(key))?;
	if value.is_undefined() || value.is_null() {
		Err(HostError::Missing(key))
	} else {
		Ok(value)
	}
}

fn opt(obj: &JsValue, key: &'static str) -> Option<JsValue> {
	get(obj, key).ok()
}

fn method(obj: &JsValue, key: &'static str) -> Result<Function, HostError> {
	get(obj, key)?
		.dyn_into::<Function>()
		.map_err(|_| HostError::NotCallable(key))
}

fn describe(err: &JsValue) -> String {
	err.dyn_ref::<js_sys::Error>()
		.map(|e| String::from(e.message()))
		.or_else(|| err.as_string())
		.unwrap_or_else(|| format!("{err:?}"))
}

fn call(obj: &JsValue, key: &'static str, args: &[JsValue]) -> Result<JsValue, HostError> {
	let f = method(obj, key)?;
	let args: Array = args.iter().collect();
	f.apply(obj, &args).map_err(|err| HostError::Threw {
		name: key,
		message: describe(&err),
	})
}

fn number(value: &JsValue) -> Option<f64> {
	value.as_f64().filter(|n| n.is_finite())
}

fn index(value: &JsValue) -> Option<usize> {
	number(value).filter(|n| *n >= 0.0 && n.fract() == 0.0).map(|n| n as usize)
}

fn id(value: &JsValue) -> Option<i64> {
	number(value)
		.filter(|n| n.fract() == 0.0)
		.map(|n| n as i64)
		.or_else(|| value.as_string()?.trim().parse().ok())
}

/// `[x, y]` from an array or typed array.
fn point(value: &JsValue) -> Option<Point> {
	let x = number(&Reflect::get_u32(value, 0).ok()?)?;
	let y = number(&Reflect::get_u32(value, 1).ok()?)?;
	Some(Point::new(x, y))
}

/// `[x, y, w, h]` from an array or typed array.
fn rect(value: &JsValue) -> Option<Rect> {
	let part = |i| Reflect::get_u32(value, i).ok().as_ref().and_then(number);
	Some(Rect::new(part(0)?, part(1)?, part(2)?, part(3)?))
}

fn text(value: &JsValue) -> String {
	if let Some(s) = value.as_string() {
		return s;
	}
	if let Some(n) = value.as_f64() {
		return n.to_string();
	}
	if let Some(b) = value.as_bool() {
		return b.to_string();
	}
	if value.is_null() || value.is_undefined() {
		return String::new();
	}
	js_sys::JSON::stringify(value)
		.ok()
		.and_then(|s| s.as_string())
		.unwrap_or_default()
}

fn array(value: &JsValue) -> Vec<JsValue> {
	if Array::is_array(value) {
		Array::from(value).iter().collect()
	} else {
		Vec::new()
	}
}

fn parse_links(value: Option<JsValue>) -> PortLinks {
	let Some(value) = value else {
		return PortLinks::None;
	};
	if Array::is_array(&value) {
		PortLinks::Many(array(&value).iter().filter_map(id).collect())
	} else {
		id(&value).map_or(PortLinks::None, PortLinks::Single)
	}
}

fn parse_port(value: &JsValue, is_input: bool) -> Port {
	let links = if is_input { opt(value, "link") } else { opt(value, "links") };
	Port {
		name: opt(value, "label")
			.or_else(|| opt(value, "name"))
			.and_then(|v| v.as_string()),
		port_type: opt(value, "type").map(|v| text(&v)),
		links: parse_links(links),
		pos: opt(value, "pos").as_ref().and_then(point),
	}
}

/// Copies a host node into the model.
pub fn parse_node(value: &JsValue) -> Result<GraphNode, HostError> {
	let node_id = id(&get(value, "id")?).ok_or(HostError::WrongType("id"))?;
	let title = call(value, "getTitle", &[])
		.ok()
		.and_then(|t| t.as_string())
		.or_else(|| opt(value, "title").and_then(|t| t.as_string()));
	let size = opt(value, "size")
		.as_ref()
		.and_then(point)
		.map(|p| (p.x, p.y));

	let widget_values = opt(value, "widgets_values").map(|v| array(&v)).unwrap_or_default();
	let widgets = opt(value, "widgets")
		.map(|v| array(&v))
		.unwrap_or_default()
		.iter()
		.enumerate()
		.map(|(i, w)| Widget {
			name: opt(w, "name").and_then(|n| n.as_string()),
			value: widget_values
				.get(i)
				.filter(|v| !v.is_undefined())
				.map(text)
				.or_else(|| opt(w, "value").map(|v| text(&v)))
				.unwrap_or_default(),
		})
		.collect();

	let properties = opt(value, "properties")
		.and_then(|p| p.dyn_into::<Object>().ok())
		.map(|obj| {
			Object::entries(&obj)
				.iter()
				.filter_map(|pair| {
					let pair = Array::from(&pair);
					Some((pair.get(0).as_string()?, text(&pair.get(1))))
				})
				.collect()
		})
		.unwrap_or_default();

	Ok(GraphNode {
		id: node_id,
		title,
		node_type: opt(value, "type").map(|t| text(&t)).unwrap_or_default(),
		pos: opt(value, "pos").as_ref().and_then(point),
		size,
		inputs: opt(value, "inputs")
			.map(|v| array(&v).iter().map(|p| parse_port(p, true)).collect())
			.unwrap_or_default(),
		outputs: opt(value, "outputs")
			.map(|v| array(&v).iter().map(|p| parse_port(p, false)).collect())
			.unwrap_or_default(),
		widgets,
		properties,
	})
}

/// Reads a link record in either object form or the serialised
/// `[id, origin_id, origin_slot, target_id, target_slot, type]` form.
fn parse_link(value: &JsValue, link_id: LinkId) -> Option<Link> {
	if Array::is_array(value) {
		let a = Array::from(value);
		return Some(Link {
			id: link_id,
			origin_id: id(&a.get(1))?,
			origin_slot: index(&a.get(2))?,
			target_id: id(&a.get(3))?,
			target_slot: index(&a.get(4))?,
		});
	}
	Some(Link {
		id: link_id,
		origin_id: id(&opt(value, "origin_id")?)?,
		origin_slot: index(&opt(value, "origin_slot")?)?,
		target_id: id(&opt(value, "target_id")?)?,
		target_slot: index(&opt(value, "target_slot")?)?,
	})
}

fn to_js_items(items: &[MenuItem], on_action: &ActionHandler) -> Array {
	items
		.iter()
		.map(|item| match item {
			MenuItem::Separator => JsValue::NULL,
			MenuItem::Entry { label, action } => {
				let obj = Object::new();
				let _ = Reflect::set(&obj, &"content".into(), &label.into());
				match action {
					Some(action) => {
						let (handler, action) = (on_action.clone(), *action);
						let callback = Closure::<dyn Fn()>::new(move || handler(action)).into_js_value();
						let _ = Reflect::set(&obj, &"callback".into(), &callback);
					}
					None => {
						let _ = Reflect::set(&obj, &"disabled".into(), &JsValue::TRUE);
					}
				}
				obj.into()
			}
			MenuItem::Submenu { label, items } => {
				let obj = Object::new();
				let submenu = Object::new();
				let _ = Reflect::set(&submenu, &"options".into(), &to_js_items(items, on_action));
				let _ = Reflect::set(&obj, &"content".into(), &label.into());
				let _ = Reflect::set(&obj, &"has_submenu".into(), &JsValue::TRUE);
				let _ = Reflect::set(&obj, &"submenu".into(), &submenu);
				obj.into()
			}
		})
		.collect()
}

/// The host editor reached through its global `app` object.
#[derive(Clone)]
pub struct LiteGraphHost {
	app: JsValue,
}

impl LiteGraphHost {
	pub fn new(app: JsValue) -> Self {
		Self { app }
	}

	fn graph(&self) -> Result<JsValue, HostError> {
		get(&self.app, "graph")
	}

	fn canvas(&self) -> Result<JsValue, HostError> {
		get(&self.app, "canvas")
	}

	/// The `<canvas>` element the editor draws into.
	pub fn canvas_element(&self) -> Option<HtmlCanvasElement> {
		opt(&self.canvas().ok()?, "canvas")?.dyn_into().ok()
	}

	fn js_node(&self, node_id: NodeId) -> Result<JsValue, HostError> {
		call(&self.graph()?, "getNodeById", &[JsValue::from_f64(node_id as f64)])
			.and_then(|n| {
				if n.is_null() || n.is_undefined() {
					Err(HostError::UnknownNode(node_id))
				} else {
					Ok(n)
				}
			})
	}

	fn js_link(&self, link_id: LinkId) -> Option<JsValue> {
		let links = get(&self.graph().ok()?, "links").ok()?;
		let key = JsValue::from_f64(link_id as f64);
		let link = match links.dyn_ref::<Map>() {
			Some(map) => map.get(&key),
			None => Reflect::get(&links, &key).ok()?,
		};
		(!link.is_null() && !link.is_undefined()).then_some(link)
	}

	fn canvas_rect(&self) -> Option<Rect> {
		let r = self.canvas_element()?.get_bounding_client_rect();
		Some(Rect::new(r.left(), r.top(), r.width(), r.height()))
	}

	/// Collects every mouse-position field the host may have stamped on `ev`.
	pub fn pointer_sample(&self, ev: &MouseEvent) -> PointerSample {
		let ev_value: &JsValue = ev.as_ref();
		let canvas_pos = match (opt(ev_value, "canvasX"), opt(ev_value, "canvasY")) {
			(Some(x), Some(y)) => number(&x).zip(number(&y)).map(|(x, y)| Point::new(x, y)),
			_ => None,
		};
		PointerSample {
			client: Point::new(ev.client_x() as f64, ev.client_y() as f64),
			canvas_pos,
			graph_mouse: self
				.canvas()
				.ok()
				.and_then(|c| opt(&c, "graph_mouse"))
				.as_ref()
				.and_then(point),
		}
	}

	/// Registers the extension's declarative hooks with the host.
	///
	/// `setup` runs once the host has finished building its canvas.
	pub fn register_extension(
		&self,
		ctx: &Rc<PortTeleport>,
		setup: impl FnOnce() + 'static,
	) -> Result<(), HostError> {
		let ext = Object::new();
		let set = |key: &str, value: &JsValue| {
			let _ = Reflect::set(&ext, &JsValue::from_str(key), value);
		};
		set("name", &EXTENSION_NAME.into());
		set("setup", &Closure::once_into_js(setup));

		let node_hook = {
			let ctx = Rc::downgrade(ctx);
			Closure::<dyn Fn(JsValue) -> JsValue>::new(move |node: JsValue| {
				let Some(ctx) = ctx.upgrade() else {
					return Array::new().into();
				};
				match parse_node(&node) {
					Ok(node) => to_js_items(&ctx.node_menu_items(&node), &ctx.action_handler()).into(),
					Err(err) => {
						debug!("[PortTeleport] node menu hook skipped: {err}");
						Array::new().into()
					}
				}
			})
		};
		set("getNodeMenuItems", &node_hook.into_js_value());

		let canvas_hook = {
			let ctx = Rc::downgrade(ctx);
			Closure::<dyn Fn(JsValue) -> JsValue>::new(move |_canvas: JsValue| match ctx.upgrade() {
				Some(ctx) => to_js_items(&ctx.canvas_menu_items(), &ctx.action_handler()).into(),
				None => Array::new().into(),
			})
		};
		set("getCanvasMenuItems", &canvas_hook.into_js_value());

		let slot_hook = slot_menu_hook(ctx);
		let before_register = Closure::<dyn Fn(JsValue, JsValue, JsValue)>::new(
			move |node_type: JsValue, _data: JsValue, _app: JsValue| {
				match wrap_slot_menu(&node_type, &slot_hook) {
					Ok(true) => {}
					Ok(false) => debug!("[PortTeleport] node type has no slot menu; using the DOM fallback"),
					Err(err) => debug!("[PortTeleport] slot hook not installed: {err}"),
				}
			},
		);
		set("beforeRegisterNodeDef", &before_register.into_js_value());

		call(&self.app, "registerExtension", &[ext.into()])?;
		info!("[PortTeleport] extension registered");
		Ok(())
	}
}

/// `(node, slotInfo, baseOptions) -> options` for a node type's slot menu.
fn slot_menu_hook(ctx: &Rc<PortTeleport>) -> JsValue {
	let ctx = Rc::downgrade(ctx);
	Closure::<dyn Fn(JsValue, JsValue, JsValue) -> JsValue>::new(
		move |node: JsValue, slot: JsValue, base: JsValue| {
			// The node type's own menu gave nothing to extend.
			if !Array::is_array(&base) {
				return base;
			}
			let Some(ctx) = ctx.upgrade() else {
				return base;
			};
			let Some(slot_index) = opt(&slot, "slot").as_ref().and_then(index) else {
				return base;
			};
			let is_input = opt(&slot, "input").is_some();
			match parse_node(&node) {
				Ok(node) => {
					let options = Array::from(&base);
					let items = ctx.slot_menu_items(&node, slot_index, is_input);
					for item in to_js_items(&items, &ctx.action_handler()).iter() {
						options.push(&item);
					}
				}
				Err(err) => debug!("[PortTeleport] slot menu hook skipped: {err}"),
			}
			base
		},
	)
	.into_js_value()
}

/// Chains our slot hook after the node type's own `getSlotMenuOptions`.
///
/// Types without one are left alone: the host only builds its default port menu when
/// the method is absent, so those ports get their entries from the DOM fallback.
/// Returns whether the prototype was wrapped.
fn wrap_slot_menu(node_type: &JsValue, hook: &JsValue) -> Result<bool, HostError> {
	let proto = get(node_type, "prototype")?;
	let Some(inner) = opt(&proto, "getSlotMenuOptions").filter(|f| f.is_function()) else {
		return Ok(false);
	};
	let factory = Function::new_with_args(
		"inner, hook",
		"return function (slot) { \
			return hook(this, slot, inner.apply(this, arguments)); \
		};",
	);
	let wrapped = factory
		.call2(&JsValue::NULL, &inner, hook)
		.map_err(|err| HostError::Threw {
			name: "getSlotMenuOptions",
			message: describe(&err),
		})?;
	Reflect::set(&proto, &"getSlotMenuOptions".into(), &wrapped)
		.map_err(|_| HostError::WrongType("prototype"))?;
	Ok(true)
}

impl GraphSource for LiteGraphHost {
	fn node(&self, node_id: NodeId) -> Option<GraphNode> {
		let node = self.js_node(node_id).ok()?;
		parse_node(&node)
			.inspect_err(|err| debug!("[PortTeleport] node {node_id} unreadable: {err}"))
			.ok()
	}

	fn link(&self, link_id: LinkId) -> Option<Link> {
		parse_link(&self.js_link(link_id)?, link_id)
	}

	fn nodes(&self) -> Vec<GraphNode> {
		let Ok(graph) = self.graph() else {
			return Vec::new();
		};
		let list = opt(&graph, "_nodes").or_else(|| opt(&graph, "nodes"));
		list.map(|l| array(&l))
			.unwrap_or_default()
			.iter()
			.filter_map(|n| parse_node(n).ok())
			.collect()
	}
}

impl SlotAnchor for LiteGraphHost {
	fn slot_position(&self, node: &GraphNode, index: usize, is_input: bool) -> Option<Point> {
		let js = self.js_node(node.id).ok()?;
		let pos = call(
			&js,
			"getConnectionPos",
			&[JsValue::from_bool(is_input), JsValue::from_f64(index as f64)],
		)
		.ok()?;
		point(&pos)
	}
}

impl EditorHost for LiteGraphHost {
	fn selected_node(&self) -> Option<NodeId> {
		let canvas = self.canvas().ok()?;
		if let Some(current) = opt(&canvas, "current_node").and_then(|n| opt(&n, "id")) {
			return id(&current);
		}
		let selected = opt(&canvas, "selected_nodes")?.dyn_into::<Object>().ok()?;
		let keys = Object::keys(&selected);
		if keys.length() == 1 { id(&keys.get(0)) } else { None }
	}

	fn node_at(&self, p: Point) -> Option<GraphNode> {
		let node = call(
			&self.graph().ok()?,
			"getNodeOnPos",
			&[JsValue::from_f64(p.x), JsValue::from_f64(p.y)],
		)
		.ok()?;
		if node.is_null() || node.is_undefined() {
			return None;
		}
		parse_node(&node).ok()
	}

	fn center_on_node(&self, node_id: NodeId) -> Result<(), HostError> {
		let node = self.js_node(node_id)?;
		call(&self.canvas()?, "centerOnNode", &[node])?;
		Ok(())
	}

	fn select_node(&self, node_id: NodeId) -> Result<(), HostError> {
		let node = self.js_node(node_id)?;
		let canvas = self.canvas()?;
		call(&canvas, "selectNode", &[node])?;
		let _ = call(&canvas, "setDirty", &[JsValue::TRUE, JsValue::TRUE]);
		Ok(())
	}

	fn view_state(&self) -> Option<ViewState> {
		let ds = opt(&self.canvas().ok()?, "ds")?;
		Some(ViewState {
			offset: opt(&ds, "offset").as_ref().and_then(point)?,
			scale: opt(&ds, "scale").as_ref().and_then(number)?,
			canvas: self.canvas_rect()?,
			visible_area: opt(&ds, "visible_area").as_ref().and_then(rect),
			convention: OffsetConvention::GraphUnits,
		})
	}

	fn graph_to_screen(&self, p: Point) -> Option<Point> {
		let ds = opt(&self.canvas().ok()?, "ds")?;
		let pos: Array = [JsValue::from_f64(p.x), JsValue::from_f64(p.y)].iter().collect();
		let local = point(&call(&ds, "convertOffsetToCanvas", &[pos.into()]).ok()?)?;
		let origin = self.canvas_rect()?;
		Some(local.offset(origin.x, origin.y))
	}

	fn node_element_rect(&self, node_id: NodeId) -> Option<Rect> {
		let document = web_sys::window()?.document()?;
		let el = document
			.query_selector(&format!("[data-node-id=\"{node_id}\"]"))
			.ok()??;
		let r = el.get_bounding_client_rect();
		Some(Rect::new(r.left(), r.top(), r.width(), r.height()))
	}

	fn show_menu(&self, items: &[MenuItem], at: Point, on_action: ActionHandler) -> Result<(), HostError> {
		let window: JsValue = web_sys::window().ok_or(HostError::Missing("window"))?.into();
		let ctor = get(&get(&window, "LiteGraph")?, "ContextMenu")?
			.dyn_into::<Function>()
			.map_err(|_| HostError::NotCallable("ContextMenu"))?;
		let options = Object::new();
		let _ = Reflect::set(&options, &"left".into(), &at.x.into());
		let _ = Reflect::set(&options, &"top".into(), &at.y.into());
		let args: Array = [to_js_items(items, &on_action).into(), JsValue::from(options)]
			.iter()
			.collect();
		Reflect::construct(&ctor, &args).map_err(|err| HostError::Threw {
			name: "ContextMenu",
			message: describe(&err),
		})?;
		Ok(())
	}
}
