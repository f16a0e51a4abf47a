//! Splicing jump entries into a context menu the host has already rendered.
//!
//! Injected elements carry `data-port-teleport` plus the node id, slot index and
//! direction of the interaction they belong to, so a later right-click can find and
//! remove them before adding its own.

use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, MouseEvent};

use super::{ActionHandler, InteractionToken, MenuAction, MenuItem, MenuSurface, flatten};

pub const MARKER_ATTR: &str = "data-port-teleport";
pub const NODE_ATTR: &str = "data-node-id";
pub const SLOT_ATTR: &str = "data-slot-index";
pub const DIRECTION_ATTR: &str = "data-direction";
pub const TARGET_ATTR: &str = "data-target-id";

/// Candidate menu containers, most specific first.
const MENU_SELECTORS: &[&str] = &[
	".litecontextmenu",
	".p-contextmenu",
	"[class*='contextmenu']",
	"[class*='context-menu']",
];
/// Markup a real menu container is expected to hold.
const ITEM_SELECTOR: &str = ".litemenu-entry, .p-menuitem, [role='menuitem']";

fn elements(root: &Document, selector: &str) -> Vec<Element> {
	let Ok(list) = root.query_selector_all(selector) else {
		return Vec::new();
	};
	(0..list.length())
		.filter_map(|i| list.get(i))
		.filter_map(|node| node.dyn_into::<Element>().ok())
		.collect()
}

fn is_visible(element: &Element) -> bool {
	let rect = element.get_bounding_client_rect();
	rect.width() > 0.0 && rect.height() > 0.0
}

/// The most recently rendered host context menu, if one is showing.
pub fn find_menu(document: &Document) -> Option<Element> {
	MENU_SELECTORS.iter().find_map(|selector| {
		elements(document, selector).into_iter().rev().find(|el| {
			matches!(el.query_selector(ITEM_SELECTOR), Ok(Some(_)))
				&& !el.has_attribute(MARKER_ATTR)
				&& is_visible(el)
		})
	})
}

/// Removes every element injected by an earlier interaction. Returns how many went.
pub fn remove_stale(document: &Document) -> usize {
	let stale = elements(document, &format!("[{MARKER_ATTR}]"));
	for el in &stale {
		el.remove();
	}
	stale.len()
}

/// Number of injected entry groups under `root`.
pub fn injected_groups(root: &Element) -> u32 {
	root.query_selector_all(&format!("[{MARKER_ATTR}='separator']"))
		.map(|list| list.length())
		.unwrap_or(0)
}

fn tagged(document: &Document, kind: &str, token: &InteractionToken) -> Result<Element, JsValue> {
	let el = document.create_element("div")?;
	el.set_attribute(MARKER_ATTR, kind)?;
	el.set_attribute(NODE_ATTR, &token.node.to_string())?;
	el.set_attribute(SLOT_ATTR, &token.slot.to_string())?;
	el.set_attribute(DIRECTION_ATTR, token.direction.as_str())?;
	Ok(el)
}

/// Replaces any earlier injected entries with `items`, appended to `menu` after a
/// separator. Submenus are expanded inline.
pub fn inject(
	document: &Document,
	menu: &Element,
	token: &InteractionToken,
	items: &[MenuItem],
	on_action: &ActionHandler,
) -> Result<usize, JsValue> {
	let removed = remove_stale(document);
	if removed > 0 {
		debug!("[PortTeleport] removed {removed} stale menu elements");
	}

	let entries = flatten(items);
	if entries.is_empty() {
		return Ok(0);
	}

	let separator = tagged(document, "separator", token)?;
	separator.set_class_name("litemenu-entry separator");
	menu.append_child(&separator)?;

	for (label, action) in &entries {
		let entry = tagged(document, "entry", token)?;
		entry.set_class_name("litemenu-entry submenu");
		entry.set_text_content(Some(label));
		if let MenuAction::Jump(target) = action {
			entry.set_attribute(TARGET_ATTR, &target.to_string())?;
		}
		if let Some(html) = entry.dyn_ref::<HtmlElement>() {
			let _ = html.style().set_property("cursor", "pointer");
		}

		let (handler, action, menu_el) = (on_action.clone(), *action, menu.clone());
		let on_click = Closure::<dyn FnMut(MouseEvent)>::new(move |ev: MouseEvent| {
			ev.prevent_default();
			ev.stop_propagation();
			menu_el.remove();
			handler(action);
		})
		.into_js_value();
		// Handed to the JS heap: collected together with the entry element.
		entry.add_event_listener_with_callback("click", on_click.unchecked_ref())?;
		menu.append_child(&entry)?;
	}
	Ok(entries.len())
}

/// Attaches entries to whatever context menu the host rendered into the page.
pub struct DomMenuSurface {
	document: Option<Document>,
}

impl DomMenuSurface {
	pub fn new() -> Self {
		Self {
			document: web_sys::window().and_then(|w| w.document()),
		}
	}

	pub fn with_document(document: Document) -> Self {
		Self {
			document: Some(document),
		}
	}
}

impl Default for DomMenuSurface {
	fn default() -> Self {
		Self::new()
	}
}

impl MenuSurface for DomMenuSurface {
	fn is_available(&self) -> bool {
		self.document.is_some()
	}

	fn attach(&self, token: &InteractionToken, items: &[MenuItem], on_action: &ActionHandler) -> bool {
		let Some(document) = &self.document else {
			return false;
		};
		let Some(menu) = find_menu(document) else {
			return false;
		};
		match inject(document, &menu, token, items, on_action) {
			Ok(count) => {
				debug!("[PortTeleport] injected {count} entries for {token:?}");
				true
			}
			Err(err) => {
				warn!("[PortTeleport] menu injection failed: {err:?}");
				false
			}
		}
	}
}
