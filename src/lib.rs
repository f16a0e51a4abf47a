//! Port locator and connection navigator for LiteGraph-based node editors.
//!
//! Right-clicking a connected port offers (or directly performs) a jump to the
//! node on the other end of the link; visited nodes go into a back/forward history.
//! The core under [`navigator`] and [`menu`] is host-independent; [`host`] adapts
//! the editor's JS objects and [`browser`] wires everything to DOM events.

use std::cell::RefCell;
use std::rc::Rc;

use log::{Level, info, warn};
use wasm_bindgen::prelude::*;

pub mod browser;
pub mod components;
pub mod host;
pub mod menu;
pub mod model;
pub mod navigator;
pub mod plugin;

thread_local! {
	static INSTALLED: RefCell<Option<Rc<plugin::PortTeleport>>> = const { RefCell::new(None) };
}

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Registers the extension with the host editor's `app` object.
///
/// Called once by the JS loader; later calls are ignored.
#[wasm_bindgen]
pub fn register(app: JsValue) -> Result<(), JsValue> {
	if INSTALLED.with(|i| i.borrow().is_some()) {
		warn!("[PortTeleport] already registered");
		return Ok(());
	}
	init_logging();
	let ctx = browser::install(app).map_err(|err| JsValue::from_str(&err.to_string()))?;
	INSTALLED.with(|i| *i.borrow_mut() = Some(ctx));
	Ok(())
}
