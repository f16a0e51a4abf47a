use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, PointerEvent};

use super::state::{DragState, POPUP_WIDTH, QuickJumpRow};
use crate::components::UiBridge;
use crate::model::Point;

fn client(ev: &PointerEvent) -> Point {
	Point::new(ev.client_x() as f64, ev.client_y() as f64)
}

fn section(label: &'static str, rows: Vec<QuickJumpRow>, bridge: UiBridge) -> impl IntoView {
	(!rows.is_empty()).then(move || {
		view! {
			<div class="port-teleport-section">
				<div style="padding: 4px 10px; font-size: 11px; opacity: 0.6; text-transform: uppercase;">
					{label}
				</div>
				{rows
					.into_iter()
					.map(|row| {
						view! {
							<div style="display: flex; gap: 6px; align-items: baseline; padding: 2px 10px;">
								<span style="min-width: 80px; opacity: 0.8;">{row.port_name}</span>
								<span style="display: flex; flex-wrap: wrap; gap: 4px;">
									{row
										.targets
										.into_iter()
										.map(|(id, title)| {
											view! {
												<button
													class="port-teleport-target"
													style="cursor: pointer; border: 1px solid #555; background: #333; color: inherit; border-radius: 3px; padding: 1px 6px;"
													on:click=move |_| bridge.jump(id)
												>
													{title}
												</button>
											}
										})
										.collect_view()}
								</span>
							</div>
						}
					})
					.collect_view()}
			</div>
		}
	})
}

/// Floating list of a node's connections. Drag the header to move it.
#[component]
pub fn QuickJumpPopup(bridge: UiBridge) -> impl IntoView {
	let drag = StoredValue::new(DragState::default());
	let model = bridge.quick_jump;

	let on_pointerdown = move |ev: PointerEvent| {
		if ev.button() != 0 {
			return;
		}
		let origin = bridge.origin.get_untracked();
		drag.update_value(|d| d.begin(client(&ev), origin));
		if let Some(header) = ev.current_target().and_then(|t| t.dyn_into::<Element>().ok()) {
			let _ = header.set_pointer_capture(ev.pointer_id());
		}
		ev.prevent_default();
	};

	let on_pointermove = move |ev: PointerEvent| {
		if let Some(origin) = drag.with_value(|d| d.moved_to(client(&ev))) {
			bridge.origin.set(origin);
		}
	};

	let on_pointerup = move |_: PointerEvent| drag.update_value(DragState::end);

	let style = move || {
		let origin = bridge.origin.get();
		format!(
			"position: fixed; left: {}px; top: {}px; width: {POPUP_WIDTH}px; z-index: 10000; \
			transform: scale({}); transform-origin: top left; background: #222; color: #ddd; \
			border: 1px solid #444; border-radius: 6px; box-shadow: 0 4px 16px rgba(0,0,0,0.5); \
			font: 12px sans-serif; padding-bottom: 6px;",
			origin.x,
			origin.y,
			bridge.scale.get(),
		)
	};

	view! {
		<Show when=move || model.with(Option::is_some)>
			<div data-port-teleport-popup="quick-jump" style=style>
				<div
					style="cursor: move; padding: 6px 10px; border-bottom: 1px solid #444; font-weight: bold; user-select: none;"
					on:pointerdown=on_pointerdown
					on:pointermove=on_pointermove
					on:pointerup=on_pointerup
				>
					{move || {
						model.with(|m| m.as_ref().map(|m| format!("{} #{}", m.title, m.node_id)))
					}}
				</div>
				{move || {
					model
						.get()
						.map(|m| {
							if m.is_empty() {
								view! {
									<div style="padding: 6px 10px; opacity: 0.6;">"No connections"</div>
								}
									.into_any()
							} else {
								view! {
									{section("Inputs", m.inputs, bridge)}
									{section("Outputs", m.outputs, bridge)}
								}
									.into_any()
							}
						})
				}}
			</div>
		</Show>
	}
}
