//! Browser wiring: builds the extension context over the live host and binds input.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use log::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget, KeyboardEvent, MouseEvent};

use crate::components::BrowserUi;
use crate::host::input::{KeyPress, ListenerGuard, dispatched_within, first_sighting, is_typing};
use crate::host::litegraph::LiteGraphHost;
use crate::host::settings::LocalStore;
use crate::host::HostError;
use crate::menu::MenuSurface;
use crate::menu::dom::DomMenuSurface;
use crate::menu::poll::TimeoutScheduler;
use crate::model::Point;
use crate::plugin::{PointerOutcome, PortTeleport};

const SECONDARY_BUTTON: i16 = 2;

/// Creates the extension for the host `app` and registers it.
pub fn install(app: JsValue) -> Result<Rc<PortTeleport>, HostError> {
	let host = Rc::new(LiteGraphHost::new(app));
	let ctx = PortTeleport::new(
		host.clone(),
		Rc::new(LocalStore),
		Rc::new(TimeoutScheduler),
		Some(Rc::new(DomMenuSurface::new()) as Rc<dyn MenuSurface>),
	);

	let ui = BrowserUi::new(&ctx);
	ui.mount();
	ctx.set_ui(ui);

	let setup = {
		let (ctx, host) = (Rc::downgrade(&ctx), host.clone());
		move || {
			if let Some(ctx) = ctx.upgrade() {
				bind_input(&ctx, &host);
			}
		}
	};
	host.register_extension(&ctx, setup)?;
	Ok(ctx)
}

fn targets(host: &LiteGraphHost) -> Vec<EventTarget> {
	let Some(window) = web_sys::window() else {
		return Vec::new();
	};
	let mut targets: Vec<EventTarget> = Vec::new();
	if let Some(document) = window.document() {
		targets.push(document.into());
	}
	targets.push(window.into());
	match host.canvas_element() {
		Some(canvas) => targets.push(canvas.into()),
		None => debug!("[PortTeleport] canvas element not found; binding document and window only"),
	}
	targets
}

/// Capture-phase listeners on document, window and canvas. Each event is acted on
/// once however many layers see it.
fn bind_input(ctx: &Rc<PortTeleport>, host: &Rc<LiteGraphHost>) {
	// Set when a direct jump should swallow the host's context menu.
	let suppress_menu = Rc::new(Cell::new(false));

	let bound = ctx.bind_once(|| {
		let mut guards = Vec::new();
		for target in targets(host) {
			let listeners: [(&'static str, Box<dyn FnMut(Event)>); 4] = [
				("pointerdown", Box::new(on_pointerdown(Rc::downgrade(ctx), host.clone(), suppress_menu.clone()))),
				("contextmenu", Box::new(on_contextmenu(suppress_menu.clone()))),
				("keydown", Box::new(on_keydown(Rc::downgrade(ctx)))),
				("mouseup", Box::new(on_mouseup(Rc::downgrade(ctx)))),
			];
			for (event, handler) in listeners {
				match ListenerGuard::new(&target, event, true, handler) {
					Ok(guard) => guards.push(guard),
					Err(err) => warn!("[PortTeleport] could not bind {event}: {err:?}"),
				}
			}
		}
		guards
	});
	if bound {
		info!("[PortTeleport] input listeners bound");
	}
}

fn on_pointerdown(
	ctx: Weak<PortTeleport>,
	host: Rc<LiteGraphHost>,
	suppress_menu: Rc<Cell<bool>>,
) -> impl FnMut(Event) {
	move |ev: Event| {
		let Some(mouse) = ev.dyn_ref::<MouseEvent>() else {
			return;
		};
		if mouse.button() != SECONDARY_BUTTON || !first_sighting(&ev) {
			return;
		}
		let Some(ctx) = ctx.upgrade() else {
			return;
		};
		suppress_menu.set(false);
		// `graph_mouse` goes stale once the pointer leaves the canvas.
		if !host.canvas_element().is_some_and(|canvas| dispatched_within(&ev, &canvas)) {
			return;
		}
		let client = Point::new(mouse.client_x() as f64, mouse.client_y() as f64);
		let sample = host.pointer_sample(mouse);
		if let PointerOutcome::Jumped { suppress_native: true } = ctx.on_secondary_pointer(&sample, client) {
			suppress_menu.set(true);
			ev.prevent_default();
			ev.stop_propagation();
		}
	}
}

fn on_contextmenu(suppress_menu: Rc<Cell<bool>>) -> impl FnMut(Event) {
	move |ev: Event| {
		if suppress_menu.replace(false) {
			ev.prevent_default();
			ev.stop_propagation();
		}
	}
}

fn on_keydown(ctx: Weak<PortTeleport>) -> impl FnMut(Event) {
	move |ev: Event| {
		let Some(key) = ev.dyn_ref::<KeyboardEvent>() else {
			return;
		};
		if is_typing(&ev) || !first_sighting(&ev) {
			return;
		}
		let Some(ctx) = ctx.upgrade() else {
			return;
		};
		if ctx.handle_key(&KeyPress::from_event(key)) {
			ev.prevent_default();
			ev.stop_propagation();
		}
	}
}

fn on_mouseup(ctx: Weak<PortTeleport>) -> impl FnMut(Event) {
	move |ev: Event| {
		let Some(mouse) = ev.dyn_ref::<MouseEvent>() else {
			return;
		};
		if !first_sighting(&ev) {
			return;
		}
		let Some(ctx) = ctx.upgrade() else {
			return;
		};
		if ctx.handle_mouse_button(mouse.button()) {
			ev.prevent_default();
			ev.stop_propagation();
		}
	}
}
