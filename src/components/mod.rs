//! Leptos popups: the quick-jump overlay and the node search dialog.
//!
//! Both are mounted once into a container appended to `<body>` and toggled through
//! signals held by [`BrowserUi`].

pub mod node_search;
pub mod quick_jump;

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, KeyboardEvent};

use crate::host::input::ListenerGuard;
use crate::model::{NodeId, Point, Rect};
use crate::navigator::anchor::{place_popup, resolve_anchor};
use crate::navigator::search::{SearchResult, search_nodes};
use crate::plugin::{PortTeleport, UiDriver};

use node_search::NodeSearchDialog;
use quick_jump::{QuickJumpModel, QuickJumpPopup};

pub const POPUP_ATTR: &str = "data-port-teleport-popup";
const VIEWPORT_MARGIN: f64 = 8.0;

/// Copyable handle the components use to reach the extension.
#[derive(Clone, Copy)]
pub struct UiBridge {
	ui: StoredValue<Weak<BrowserUi>, LocalStorage>,
	pub search_open: RwSignal<bool>,
	pub quick_jump: RwSignal<Option<QuickJumpModel>>,
	pub origin: RwSignal<Point>,
	pub scale: RwSignal<f64>,
}

impl UiBridge {
	fn with_ui(&self, f: impl FnOnce(&BrowserUi)) {
		if let Some(ui) = self.ui.get_value().upgrade() {
			f(&ui);
		}
	}

	/// Jumps to `id` and closes whichever popup asked for it.
	pub fn jump(&self, id: NodeId) {
		self.with_ui(|ui| {
			ui.close_all();
			if let Some(ctx) = ui.ctx.upgrade() {
				ctx.jump_to(id);
			}
		});
	}

	pub fn search(&self, keyword: &str) -> Vec<SearchResult> {
		let Some(ctx) = self.ui.get_value().upgrade().and_then(|ui| ui.ctx.upgrade()) else {
			return Vec::new();
		};
		search_nodes(&ctx.host().nodes(), keyword)
	}

	pub fn close_search(&self) {
		self.search_open.set(false);
	}

	pub fn close_quick_jump(&self) {
		self.with_ui(BrowserUi::close_quick_jump);
	}
}

/// The browser implementation of [`UiDriver`].
pub struct BrowserUi {
	ctx: Weak<PortTeleport>,
	bridge: UiBridge,
	dismiss: RefCell<Vec<ListenerGuard>>,
	mounted: RefCell<Option<Box<dyn Any>>>,
}

impl BrowserUi {
	pub fn new(ctx: &Rc<PortTeleport>) -> Rc<Self> {
		Rc::new_cyclic(|me| Self {
			ctx: Rc::downgrade(ctx),
			bridge: UiBridge {
				ui: StoredValue::new_local(me.clone()),
				search_open: RwSignal::new(false),
				quick_jump: RwSignal::new(None),
				origin: RwSignal::new(Point::default()),
				scale: RwSignal::new(1.0),
			},
			dismiss: RefCell::new(Vec::new()),
			mounted: RefCell::new(None),
		})
	}

	/// Mounts the popups under a fresh container in `<body>`. Repeated calls are no-ops.
	pub fn mount(&self) {
		if self.mounted.borrow().is_some() {
			return;
		}
		let Some(body) = web_sys::window()
			.and_then(|w| w.document())
			.and_then(|d| d.body().map(|b| (d, b)))
		else {
			warn!("[PortTeleport] no document body; popups disabled");
			return;
		};
		let (document, body) = body;
		let container = match document
			.create_element("div")
			.and_then(|el| el.dyn_into::<web_sys::HtmlElement>().map_err(Into::into))
		{
			Ok(el) => el,
			Err(err) => {
				warn!("[PortTeleport] could not create popup root: {err:?}");
				return;
			}
		};
		let _ = container.set_attribute("data-port-teleport-root", "");
		if let Err(err) = body.append_child(&container) {
			warn!("[PortTeleport] could not attach popup root: {err:?}");
			return;
		}

		let bridge = self.bridge;
		let handle = leptos::mount::mount_to(container, move || {
			view! {
				<NodeSearchDialog bridge=bridge />
				<QuickJumpPopup bridge=bridge />
			}
		});
		*self.mounted.borrow_mut() = Some(Box::new(handle));
	}

	fn close_quick_jump(&self) {
		self.bridge.quick_jump.set(None);
		self.dismiss.borrow_mut().clear();
	}

	fn close_all(&self) {
		self.bridge.search_open.set(false);
		self.close_quick_jump();
	}

	/// Escape anywhere, or a press outside the popup, closes the quick-jump overlay.
	fn bind_dismiss(&self) {
		let Some(document) = web_sys::window().and_then(|w| w.document()) else {
			return;
		};
		let bridge = self.bridge;
		let on_key = move |ev: Event| {
			if ev.dyn_ref::<KeyboardEvent>().is_some_and(|k| k.key() == "Escape") {
				ev.stop_propagation();
				bridge.close_quick_jump();
			}
		};
		let on_press = move |ev: Event| {
			let inside = ev
				.target()
				.and_then(|t| t.dyn_into::<Element>().ok())
				.and_then(|el| el.closest(&format!("[{POPUP_ATTR}]")).ok().flatten())
				.is_some();
			if !inside {
				bridge.close_quick_jump();
			}
		};

		let mut guards = self.dismiss.borrow_mut();
		guards.clear();
		for guard in [
			ListenerGuard::new(&document, "keydown", true, on_key),
			ListenerGuard::new(&document, "pointerdown", true, on_press),
		] {
			match guard {
				Ok(guard) => guards.push(guard),
				Err(err) => warn!("[PortTeleport] could not bind popup listener: {err:?}"),
			}
		}
	}
}

fn viewport() -> Option<Rect> {
	let window = web_sys::window()?;
	let width = window.inner_width().ok()?.as_f64()?;
	let height = window.inner_height().ok()?.as_f64()?;
	Some(Rect::new(0.0, 0.0, width, height))
}

impl UiDriver for BrowserUi {
	fn open_search(&self) {
		self.close_quick_jump();
		self.bridge.search_open.set(true);
	}

	fn open_quick_jump(&self, id: NodeId) {
		let Some(ctx) = self.ctx.upgrade() else {
			return;
		};
		let host = ctx.host();
		let Some(node) = host.node(id) else {
			debug!("[PortTeleport] quick jump: node {id} is gone");
			return;
		};
		let model = QuickJumpModel::build(&**host, &node);
		let scale = ctx.settings().quick_jump_scale;
		let viewport = viewport().unwrap_or_default();
		let anchor = resolve_anchor(&node, &**host).unwrap_or_else(|| viewport.center());
		let origin = place_popup(anchor, model.estimated_size(scale), viewport, VIEWPORT_MARGIN);

		self.bridge.search_open.set(false);
		self.bridge.scale.set(scale);
		self.bridge.origin.set(origin);
		self.bridge.quick_jump.set(Some(model));
		self.bind_dismiss();
	}
}
