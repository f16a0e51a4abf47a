//! Drives the extension context end to end over an in-memory host.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use port_teleport::host::input::KeyPress;
use port_teleport::host::memory::{HostCall, MemoryHost};
use port_teleport::host::settings::{MemoryStore, Settings};
use port_teleport::menu::poll::ManualScheduler;
use port_teleport::menu::{
	ActionHandler, InteractionToken, JUMP_LABEL, MenuAction, MenuItem, MenuSurface, flatten,
};
use port_teleport::model::{Direction, Graph, GraphNode, GraphSource, NodeId, Point};
use port_teleport::navigator::PointerSample;
use port_teleport::plugin::{PointerOutcome, PortTeleport, UiDriver};

/// A menu that shows up after `ready_after` failed lookups.
#[derive(Default)]
struct FakeSurface {
	ready_after: Cell<u32>,
	lookups: Cell<u32>,
	attached: RefCell<Vec<(InteractionToken, Vec<MenuItem>)>>,
	handler: RefCell<Option<ActionHandler>>,
}

impl FakeSurface {
	fn ready_after(n: u32) -> Rc<Self> {
		let surface = Self::default();
		surface.ready_after.set(n);
		Rc::new(surface)
	}

	fn click(&self, action: MenuAction) {
		let handler = self.handler.borrow().clone().expect("no menu attached");
		handler(action);
	}
}

impl MenuSurface for FakeSurface {
	fn is_available(&self) -> bool {
		true
	}

	fn attach(&self, token: &InteractionToken, items: &[MenuItem], on_action: &ActionHandler) -> bool {
		self.lookups.set(self.lookups.get() + 1);
		if self.lookups.get() <= self.ready_after.get() {
			return false;
		}
		self.attached.borrow_mut().push((*token, items.to_vec()));
		*self.handler.borrow_mut() = Some(on_action.clone());
		true
	}
}

#[derive(Default)]
struct RecordingUi {
	searches: Cell<u32>,
	quick_jumps: RefCell<Vec<NodeId>>,
}

impl UiDriver for RecordingUi {
	fn open_search(&self) {
		self.searches.set(self.searches.get() + 1);
	}

	fn open_quick_jump(&self, node: NodeId) {
		self.quick_jumps.borrow_mut().push(node);
	}
}

/// A(1) output 0 fans out to B(2) and C(3); B(2) output 0 feeds D(4) alone.
///
/// With the stacked layout, A's output 0 sits at (200, 10) and B's at (600, 10).
fn fan_out_graph() -> Graph {
	let mut graph = Graph::new();
	graph.add_node(GraphNode::new(1, "A").at(0.0, 0.0, 200.0, 80.0));
	graph.add_node(GraphNode::new(2, "B").at(400.0, 0.0, 200.0, 80.0));
	graph.add_node(GraphNode::new(3, "C").at(400.0, 200.0, 200.0, 80.0));
	graph.add_node(GraphNode::new(4, "D").at(800.0, 0.0, 200.0, 80.0));
	graph.connect(10, 1, 0, 2, 0);
	graph.connect(11, 1, 0, 3, 0);
	graph.connect(12, 2, 0, 4, 0);
	graph
}

struct Fixture {
	host: Rc<MemoryHost>,
	scheduler: Rc<ManualScheduler>,
	surface: Rc<FakeSurface>,
	ctx: Rc<PortTeleport>,
}

fn fixture(surface: Rc<FakeSurface>) -> Fixture {
	let host = Rc::new(MemoryHost::new(fan_out_graph()));
	let scheduler = Rc::new(ManualScheduler::default());
	let ctx = PortTeleport::new(
		host.clone(),
		Rc::new(MemoryStore::default()),
		scheduler.clone(),
		Some(surface.clone() as Rc<dyn MenuSurface>),
	);
	Fixture {
		host,
		scheduler,
		surface,
		ctx,
	}
}

fn right_click(ctx: &PortTeleport, x: f64, y: f64) -> PointerOutcome {
	let sample = PointerSample {
		client: Point::new(5.0, 5.0),
		canvas_pos: None,
		graph_mouse: Some(Point::new(x, y)),
	};
	ctx.on_secondary_pointer(&sample, Point::new(5.0, 5.0))
}

const A_OUT: (f64, f64) = (202.0, 12.0);
const B_OUT: (f64, f64) = (598.0, 9.0);

#[test]
fn fan_out_menu_jumps_to_chosen_node() {
	let f = fixture(FakeSurface::ready_after(2));
	f.host.set_selected(Some(1));

	let outcome = right_click(&f.ctx, A_OUT.0, A_OUT.1);
	let token = InteractionToken {
		node: 1,
		slot: 0,
		direction: Direction::To,
	};
	assert_eq!(outcome, PointerOutcome::Injecting(token));

	f.scheduler.run_all();
	let attached = f.surface.attached.borrow().clone();
	assert_eq!(attached.len(), 1);
	assert_eq!(attached[0].0, token);
	assert_eq!(
		flatten(&attached[0].1),
		vec![
			("B #2".to_string(), MenuAction::Jump(2)),
			("C #3".to_string(), MenuAction::Jump(3)),
		]
	);

	f.surface.click(MenuAction::Jump(3));
	assert_eq!(f.host.calls(), vec![HostCall::CenterOn(3), HostCall::Select(3)]);
	let history = f.ctx.history();
	assert_eq!(history.current(), Some(3));
	assert_eq!(history.entries().collect::<Vec<_>>(), vec![1, 3]);
}

#[test]
fn single_connection_jumps_without_a_menu() {
	let f = fixture(FakeSurface::ready_after(0));

	let outcome = right_click(&f.ctx, B_OUT.0, B_OUT.1);
	assert_eq!(outcome, PointerOutcome::Jumped { suppress_native: false });
	assert_eq!(f.host.calls(), vec![HostCall::CenterOn(4), HostCall::Select(4)]);
	assert_eq!(f.scheduler.pending(), 0);

	f.ctx.update_settings(Settings {
		block_native_menu: true,
		..Settings::default()
	});
	let outcome = right_click(&f.ctx, B_OUT.0, B_OUT.1);
	assert_eq!(outcome, PointerOutcome::Jumped { suppress_native: true });
}

#[test]
fn single_connection_offers_menu_when_auto_jump_is_off() {
	let f = fixture(FakeSurface::ready_after(0));
	f.ctx.update_settings(Settings {
		auto_jump_single: false,
		..Settings::default()
	});

	let outcome = right_click(&f.ctx, B_OUT.0, B_OUT.1);
	assert!(matches!(outcome, PointerOutcome::Injecting(_)));
	f.scheduler.run_all();
	let attached = f.surface.attached.borrow();
	assert_eq!(flatten(&attached[0].1), vec![("Jump to D #4".to_string(), MenuAction::Jump(4))]);
	assert!(f.host.calls().is_empty());
}

#[test]
fn missing_menu_falls_back_to_standalone_menu() {
	let f = fixture(FakeSurface::ready_after(u32::MAX));

	right_click(&f.ctx, A_OUT.0, A_OUT.1);
	let ran = f.scheduler.run_all();

	assert_eq!(ran, 10);
	assert_eq!(f.surface.lookups.get(), 10);
	assert_eq!(
		f.host.calls(),
		vec![HostCall::ShowMenu {
			labels: vec!["B #2".into(), "C #3".into()],
			at: Point::new(5.0, 5.0),
		}]
	);
}

#[test]
fn newer_click_cancels_pending_injection() {
	let f = fixture(FakeSurface::ready_after(u32::MAX));

	right_click(&f.ctx, A_OUT.0, A_OUT.1);
	f.scheduler.run_next();
	// Empty canvas: nothing to offer, and the earlier poll must stop.
	assert_eq!(right_click(&f.ctx, 2000.0, 2000.0), PointerOutcome::Ignored);
	f.scheduler.run_all();

	assert_eq!(f.surface.lookups.get(), 1);
	assert!(f.host.calls().is_empty());
}

#[test]
fn host_hook_contribution_suppresses_dom_injection() {
	let f = fixture(FakeSurface::ready_after(0));

	right_click(&f.ctx, A_OUT.0, A_OUT.1);
	let a = f.host.node(1).unwrap();
	let items = f.ctx.node_menu_items(&a);
	assert_eq!(flatten(&items).len(), 2);

	f.scheduler.run_all();
	assert!(f.surface.attached.borrow().is_empty());
}

#[test]
fn slot_hook_only_offers_connected_ports() {
	let f = fixture(FakeSurface::ready_after(0));
	let a = f.host.node(1).unwrap();

	assert!(f.ctx.slot_menu_items(&a, 0, true).is_empty());
	assert!(f.ctx.slot_menu_items(&a, 3, false).is_empty());

	let items = f.ctx.slot_menu_items(&a, 0, false);
	let MenuItem::Submenu { label, .. } = &items[1] else {
		panic!("expected submenu, got {items:?}");
	};
	assert_eq!(label, &format!("{JUMP_LABEL} (output 0, 2)"));
}

#[test]
fn node_menu_lists_every_connection_off_port() {
	let f = fixture(FakeSurface::ready_after(0));

	// Inside B's body, far from either port.
	assert_eq!(right_click(&f.ctx, 500.0, 60.0), PointerOutcome::Ignored);
	let b = f.host.node(2).unwrap();
	let items = f.ctx.node_menu_items(&b);

	let MenuItem::Submenu { label, items: sub } = &items[1] else {
		panic!("expected submenu, got {items:?}");
	};
	assert_eq!(label, JUMP_LABEL);
	assert_eq!(
		flatten(sub),
		vec![
			("← input 0 → A".to_string(), MenuAction::Jump(1)),
			("output 0 → D".to_string(), MenuAction::Jump(4)),
		]
	);
}

#[test]
fn history_steps_over_deleted_nodes() {
	let f = fixture(FakeSurface::ready_after(0));
	for id in [2, 3, 4] {
		assert!(f.ctx.jump_to(id));
	}
	assert!(!f.ctx.jump_to(99));
	f.host.graph.borrow_mut().remove_node(3);
	f.host.clear_calls();

	assert_eq!(f.ctx.history_back(), Some(2));
	assert_eq!(f.host.calls(), vec![HostCall::CenterOn(2), HostCall::Select(2)]);
	assert_eq!(f.ctx.history_back(), None);
	assert_eq!(f.ctx.history_forward(), Some(4));
	assert_eq!(f.ctx.history_forward(), None);
	// Navigating does not record.
	assert_eq!(f.ctx.history().len(), 3);
}

#[test]
fn history_stays_put_when_only_deleted_nodes_remain() {
	let f = fixture(FakeSurface::ready_after(0));
	for id in [2, 3, 4] {
		assert!(f.ctx.jump_to(id));
	}
	f.host.graph.borrow_mut().remove_node(2);

	assert_eq!(f.ctx.history_back(), Some(3));
	assert_eq!(f.ctx.history_back(), None);
	assert_eq!(f.ctx.history().current(), Some(3));
	assert_eq!(f.ctx.history_forward(), Some(4));
}

#[test]
fn unmappable_click_forgets_the_previous_port() {
	let f = fixture(FakeSurface::ready_after(u32::MAX));
	assert!(matches!(right_click(&f.ctx, A_OUT.0, A_OUT.1), PointerOutcome::Injecting(_)));

	let nowhere = PointerSample {
		client: Point::new(5.0, 5.0),
		canvas_pos: None,
		graph_mouse: None,
	};
	assert_eq!(f.ctx.on_secondary_pointer(&nowhere, Point::new(5.0, 5.0)), PointerOutcome::Ignored);

	let a = f.host.node(1).unwrap();
	let items = f.ctx.node_menu_items(&a);
	let MenuItem::Submenu { label, .. } = &items[1] else {
		panic!("expected submenu, got {items:?}");
	};
	assert_eq!(label, JUMP_LABEL);
}

#[test]
fn shortcuts_and_side_buttons_drive_history() {
	let f = fixture(FakeSurface::ready_after(0));
	f.ctx.jump_to(2);
	f.ctx.jump_to(4);

	let alt_left = KeyPress {
		key: "ArrowLeft".into(),
		alt: true,
		..KeyPress::default()
	};
	assert!(f.ctx.handle_key(&alt_left));
	assert_eq!(f.ctx.history().current(), Some(2));

	assert!(f.ctx.handle_mouse_button(4));
	assert_eq!(f.ctx.history().current(), Some(4));
	assert!(!f.ctx.handle_mouse_button(0));

	f.ctx.update_settings(Settings {
		history_enabled: false,
		..Settings::default()
	});
	assert!(!f.ctx.handle_key(&alt_left));
	assert!(!f.ctx.handle_mouse_button(3));
}

#[test]
fn hotkeys_open_popups() {
	let f = fixture(FakeSurface::ready_after(0));
	let ui = Rc::new(RecordingUi::default());
	f.ctx.set_ui(ui.clone());

	let ctrl_f = KeyPress {
		key: "f".into(),
		ctrl: true,
		..KeyPress::default()
	};
	assert!(f.ctx.handle_key(&ctrl_f));
	assert_eq!(ui.searches.get(), 1);

	let alt_q = KeyPress {
		key: "q".into(),
		alt: true,
		..KeyPress::default()
	};
	f.ctx.handle_key(&alt_q);
	assert!(ui.quick_jumps.borrow().is_empty());
	f.host.set_selected(Some(2));
	f.ctx.handle_key(&alt_q);
	assert_eq!(*ui.quick_jumps.borrow(), vec![2]);

	let canvas = flatten(&f.ctx.canvas_menu_items());
	assert_eq!(canvas, vec![("Search nodes (Ctrl+F)".to_string(), MenuAction::OpenSearch)]);
	f.ctx.perform(MenuAction::OpenSearch);
	assert_eq!(ui.searches.get(), 2);
}
