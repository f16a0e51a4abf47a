//! Keyboard shortcuts and DOM listener plumbing.

use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Event, EventListenerOptions, EventTarget, KeyboardEvent, Node};

/// A key combination such as `Ctrl+Shift+F`.
///
/// `Ctrl` also matches the Meta (Command) key so one binding serves every platform.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyChord {
	pub ctrl: bool,
	pub alt: bool,
	pub shift: bool,
	pub key: String,
}

/// Modifier and key state of one key press.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyPress {
	pub key: String,
	pub ctrl: bool,
	pub meta: bool,
	pub alt: bool,
	pub shift: bool,
}

impl KeyPress {
	pub fn from_event(ev: &KeyboardEvent) -> Self {
		Self {
			key: ev.key(),
			ctrl: ev.ctrl_key(),
			meta: ev.meta_key(),
			alt: ev.alt_key(),
			shift: ev.shift_key(),
		}
	}
}

impl KeyChord {
	/// Parses `Mod+Mod+Key`; `None` when there is no key part.
	pub fn parse(spec: &str) -> Option<Self> {
		let mut chord = KeyChord::default();
		for part in spec.split('+').map(str::trim).filter(|p| !p.is_empty()) {
			match part.to_ascii_lowercase().as_str() {
				"ctrl" | "control" | "cmd" | "meta" => chord.ctrl = true,
				"alt" | "option" => chord.alt = true,
				"shift" => chord.shift = true,
				_ => chord.key = part.to_string(),
			}
		}
		(!chord.key.is_empty()).then_some(chord)
	}

	pub fn matches(&self, press: &KeyPress) -> bool {
		(press.ctrl || press.meta) == self.ctrl
			&& press.alt == self.alt
			&& press.shift == self.shift
			&& press.key.eq_ignore_ascii_case(&self.key)
	}
}

/// Whether focus is in a text field, where shortcuts must not fire.
pub fn is_typing(ev: &Event) -> bool {
	let Some(el) = ev.target().and_then(|t| t.dyn_into::<web_sys::Element>().ok()) else {
		return false;
	};
	matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT")
		|| el.get_attribute("contenteditable").is_some_and(|v| v != "false")
}

const SEEN_MARK: &str = "__portTeleportSeen";

/// Marks `ev` as handled and reports whether it had been seen already. Listeners on
/// several DOM layers observe the same event; only the first one acts.
pub fn first_sighting(ev: &Event) -> bool {
	let key = JsValue::from_str(SEEN_MARK);
	if Reflect::get(ev, &key).ok().is_some_and(|v| v.is_truthy()) {
		return false;
	}
	let _ = Reflect::set(ev, &key, &JsValue::TRUE);
	true
}

/// Whether `ev` was dispatched at `node` or at something inside it.
pub fn dispatched_within(ev: &Event, node: &Node) -> bool {
	ev.target()
		.and_then(|t| t.dyn_into::<Node>().ok())
		.is_some_and(|target| node.contains(Some(&target)))
}

/// A registered DOM listener, removed when dropped.
pub struct ListenerGuard {
	target: EventTarget,
	event: &'static str,
	capture: bool,
	callback: Closure<dyn FnMut(Event)>,
}

impl ListenerGuard {
	pub fn new(
		target: &EventTarget,
		event: &'static str,
		capture: bool,
		handler: impl FnMut(Event) + 'static,
	) -> Result<Self, JsValue> {
		let callback = Closure::<dyn FnMut(Event)>::new(handler);
		let options = AddEventListenerOptions::new();
		options.set_capture(capture);
		target.add_event_listener_with_callback_and_add_event_listener_options(
			event,
			callback.as_ref().unchecked_ref(),
			&options,
		)?;
		Ok(Self {
			target: target.clone(),
			event,
			capture,
			callback,
		})
	}
}

impl Drop for ListenerGuard {
	fn drop(&mut self) {
		let options = EventListenerOptions::new();
		options.set_capture(self.capture);
		let _ = self
			.target
			.remove_event_listener_with_callback_and_event_listener_options(
				self.event,
				self.callback.as_ref().unchecked_ref(),
				&options,
			);
	}
}
