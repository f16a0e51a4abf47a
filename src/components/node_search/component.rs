use leptos::prelude::*;
use web_sys::{Event, KeyboardEvent};

use crate::components::UiBridge;
use crate::navigator::search::{SearchCursor, SearchResult};

const SHOWN_MATCHES: usize = 3;

/// Modal search over node titles, types, widgets and properties.
///
/// Arrow keys move the selection, Enter jumps to it, Escape closes.
#[component]
pub fn NodeSearchDialog(bridge: UiBridge) -> impl IntoView {
	let results = RwSignal::new(Vec::<SearchResult>::new());
	let cursor = RwSignal::new(SearchCursor::default());
	let input_ref = NodeRef::<leptos::html::Input>::new();
	let open = bridge.search_open;

	// Fresh state every time the dialog opens.
	Effect::new(move |_| {
		if !open.get() {
			return;
		}
		results.set(Vec::new());
		cursor.set(SearchCursor::default());
		if let Some(input) = input_ref.get() {
			input.set_value("");
			let _ = input.focus();
		}
	});

	let on_input = move |ev: Event| {
		let found = bridge.search(&event_target_value(&ev));
		cursor.set(SearchCursor::reset(found.len()));
		results.set(found);
	};

	let on_keydown = move |ev: KeyboardEvent| {
		// Keep the host's shortcuts out of the text field.
		ev.stop_propagation();
		match ev.key().as_str() {
			"ArrowDown" => {
				ev.prevent_default();
				cursor.update(SearchCursor::down);
			}
			"ArrowUp" => {
				ev.prevent_default();
				cursor.update(SearchCursor::up);
			}
			"Enter" => {
				let picked = cursor
					.get_untracked()
					.selected()
					.and_then(|i| results.with_untracked(|r| r.get(i).map(|r| r.node_id)));
				if let Some(id) = picked {
					bridge.jump(id);
				}
			}
			"Escape" => bridge.close_search(),
			_ => {}
		}
	};

	let rows = move || {
		results.with(|found| {
			found
				.iter()
				.enumerate()
				.map(|(i, result)| {
					let id = result.node_id;
					let selected = move || cursor.with(|c| c.selected() == Some(i));
					let style = move || {
						format!(
							"list-style: none; padding: 6px 10px; cursor: pointer; border-bottom: 1px solid #333; background: {};",
							if selected() { "#3a4a6a" } else { "transparent" },
						)
					};
					view! {
						<li
							style=style
							on:mouseenter=move |_| cursor.update(|c| c.select(i))
							on:click=move |_| bridge.jump(id)
						>
							<div style="font-weight: bold;">{format!("{} #{}", result.title, id)}</div>
							<div style="font-size: 11px; opacity: 0.6;">{result.node_type.clone()}</div>
							{result
								.matches
								.iter()
								.take(SHOWN_MATCHES)
								.map(|m| view! { <div style="font-size: 11px;">{m.display.clone()}</div> })
								.collect_view()}
						</li>
					}
				})
				.collect_view()
		})
	};

	view! {
		<Show when=move || open.get()>
			<div
				data-port-teleport-popup="search"
				style="position: fixed; inset: 0; z-index: 10000; background: rgba(0,0,0,0.4); display: flex; justify-content: center; align-items: flex-start;"
				on:pointerdown=move |ev| {
					if ev.target() == ev.current_target() {
						bridge.close_search();
					}
				}
			>
				<div style="margin-top: 12vh; width: 480px; max-height: 60vh; display: flex; flex-direction: column; background: #222; color: #ddd; border: 1px solid #444; border-radius: 6px; font: 13px sans-serif;">
					<input
						node_ref=input_ref
						type="text"
						placeholder="Search nodes, widgets, properties..."
						autofocus=true
						style="padding: 8px 10px; border: none; border-bottom: 1px solid #444; background: #1a1a1a; color: inherit; outline: none;"
						on:input=on_input
						on:keydown=on_keydown
					/>
					<ul style="margin: 0; padding: 0; overflow-y: auto;">
						{rows}
					</ul>
					<Show when=move || results.with(Vec::is_empty)>
						<div style="padding: 8px 10px; opacity: 0.6;">"Type to search"</div>
					</Show>
				</div>
			</div>
		</Show>
	}
}
