//! User settings persisted in browser-local key/value storage.

use std::cell::RefCell;
use std::collections::HashMap;

use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;

const PREFIX: &str = "PortTeleport.";

/// String key/value storage.
pub trait KeyValueStore {
	fn get(&self, key: &str) -> Option<String>;
	fn set(&self, key: &str, value: &str);
}

/// `window.localStorage`; reads and writes become no-ops when storage is unavailable.
#[derive(Clone, Debug, Default)]
pub struct LocalStore;

impl LocalStore {
	fn storage() -> Option<web_sys::Storage> {
		web_sys::window()?.local_storage().ok().flatten()
	}
}

impl KeyValueStore for LocalStore {
	fn get(&self, key: &str) -> Option<String> {
		Self::storage()?.get_item(key).ok().flatten()
	}

	fn set(&self, key: &str, value: &str) {
		let Some(storage) = Self::storage() else {
			return;
		};
		if let Err(err) = storage.set_item(key, value) {
			warn!("[PortTeleport] could not persist {key}: {err:?}");
		}
	}
}

#[derive(Debug, Default)]
pub struct MemoryStore(RefCell<HashMap<String, String>>);

impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Option<String> {
		self.0.borrow().get(key).cloned()
	}

	fn set(&self, key: &str, value: &str) {
		self.0.borrow_mut().insert(key.to_string(), value.to_string());
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
	pub auto_jump_single: bool,
	pub block_native_menu: bool,
	pub history_enabled: bool,
	pub history_capacity: usize,
	pub history_back_key: String,
	pub history_forward_key: String,
	pub history_back_button: i16,
	pub history_forward_button: i16,
	pub quick_jump_hotkey: String,
	pub quick_jump_scale: f64,
	pub search_hotkey: String,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			auto_jump_single: true,
			block_native_menu: false,
			history_enabled: true,
			history_capacity: crate::navigator::history::DEFAULT_CAPACITY,
			history_back_key: "Alt+ArrowLeft".into(),
			history_forward_key: "Alt+ArrowRight".into(),
			history_back_button: 3,
			history_forward_button: 4,
			quick_jump_hotkey: "Alt+Q".into(),
			quick_jump_scale: 1.0,
			search_hotkey: "Ctrl+F".into(),
		}
	}
}

fn read<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
	let raw = store.get(&format!("{PREFIX}{key}"))?;
	serde_json::from_str(&raw).ok()
}

fn read_bool(store: &dyn KeyValueStore, key: &str, default: bool) -> bool {
	let Some(raw) = store.get(&format!("{PREFIX}{key}")) else {
		return default;
	};
	match raw.trim() {
		"true" | "1" | "\"true\"" => true,
		"false" | "0" | "\"false\"" => false,
		_ => default,
	}
}

fn read_string(store: &dyn KeyValueStore, key: &str, default: &str) -> String {
	match store.get(&format!("{PREFIX}{key}")) {
		Some(raw) => serde_json::from_str::<String>(&raw).unwrap_or(raw),
		None => default.to_string(),
	}
	.trim()
	.to_string()
}

fn write<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
	match serde_json::to_string(value) {
		Ok(json) => store.set(&format!("{PREFIX}{key}"), &json),
		Err(err) => warn!("[PortTeleport] could not serialise {key}: {err}"),
	}
}

impl Settings {
	pub const SCALE_RANGE: (f64, f64) = (0.5, 2.0);

	/// Reads every setting, falling back to its default when absent or malformed.
	pub fn load(store: &dyn KeyValueStore) -> Self {
		let d = Self::default();
		let key_or = |key: &str, default: &str| {
			let value = read_string(store, key, default);
			if value.is_empty() { default.to_string() } else { value }
		};
		let scale = read::<f64>(store, "quick_jump_scale")
			.filter(|s| s.is_finite())
			.unwrap_or(d.quick_jump_scale)
			.clamp(Self::SCALE_RANGE.0, Self::SCALE_RANGE.1);

		Self {
			auto_jump_single: read_bool(store, "auto_jump_single", d.auto_jump_single),
			block_native_menu: read_bool(store, "block_native_menu", d.block_native_menu),
			history_enabled: read_bool(store, "history_enabled", d.history_enabled),
			history_capacity: read::<usize>(store, "history_capacity")
				.filter(|&c| c > 0)
				.unwrap_or(d.history_capacity),
			history_back_key: key_or("history_back_key", &d.history_back_key),
			history_forward_key: key_or("history_forward_key", &d.history_forward_key),
			history_back_button: read(store, "history_back_button").unwrap_or(d.history_back_button),
			history_forward_button: read(store, "history_forward_button")
				.unwrap_or(d.history_forward_button),
			quick_jump_hotkey: key_or("quick_jump_hotkey", &d.quick_jump_hotkey),
			quick_jump_scale: scale,
			search_hotkey: key_or("search_hotkey", &d.search_hotkey),
		}
	}

	pub fn save(&self, store: &dyn KeyValueStore) {
		write(store, "auto_jump_single", &self.auto_jump_single);
		write(store, "block_native_menu", &self.block_native_menu);
		write(store, "history_enabled", &self.history_enabled);
		write(store, "history_capacity", &self.history_capacity);
		write(store, "history_back_key", &self.history_back_key);
		write(store, "history_forward_key", &self.history_forward_key);
		write(store, "history_back_button", &self.history_back_button);
		write(store, "history_forward_button", &self.history_forward_button);
		write(store, "quick_jump_hotkey", &self.quick_jump_hotkey);
		write(store, "quick_jump_scale", &self.quick_jump_scale);
		write(store, "search_hotkey", &self.search_hotkey);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_store_yields_defaults() {
		assert_eq!(Settings::load(&MemoryStore::default()), Settings::default());
	}

	#[test]
	fn save_then_load_preserves_values() {
		let store = MemoryStore::default();
		let settings = Settings {
			auto_jump_single: false,
			quick_jump_hotkey: "Ctrl+Shift+J".into(),
			history_capacity: 12,
			..Settings::default()
		};
		settings.save(&store);
		assert_eq!(Settings::load(&store), settings);
	}

	#[test]
	fn loose_values_are_coerced() {
		let store = MemoryStore::default();
		store.set("PortTeleport.block_native_menu", "1");
		store.set("PortTeleport.history_enabled", "nonsense");
		store.set("PortTeleport.search_hotkey", "Ctrl+K");
		store.set("PortTeleport.quick_jump_scale", "9.5");
		store.set("PortTeleport.history_capacity", "-3");

		let settings = Settings::load(&store);
		assert!(settings.block_native_menu);
		assert!(settings.history_enabled);
		assert_eq!(settings.search_hotkey, "Ctrl+K");
		assert_eq!(settings.quick_jump_scale, 2.0);
		assert_eq!(settings.history_capacity, crate::navigator::history::DEFAULT_CAPACITY);
	}
}
