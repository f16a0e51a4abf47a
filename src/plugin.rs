//! The extension context: one per registration, owning all navigator state.

use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use log::{debug, info, warn};

use crate::host::input::{KeyChord, KeyPress, ListenerGuard};
use crate::host::settings::{KeyValueStore, Settings};
use crate::host::EditorHost;
use crate::menu::poll::{InteractionLatch, PollStep, RetryPolicy, Scheduler, start_poll};
use crate::menu::{self, ActionHandler, InteractionToken, MenuAction, MenuItem, MenuSurface};
use crate::model::{Direction, GraphNode, NodeId, Point, SlotHit};
use crate::navigator::coords::pointer_graph_position;
use crate::navigator::{NavigationHistory, PointerSample, SlotAnchor, SlotLocator, resolve, resolve_all};

/// Opens the extension's own popups. Absent in headless use.
pub trait UiDriver {
	fn open_search(&self);
	fn open_quick_jump(&self, node: NodeId);
}

/// What a secondary-button press over the canvas led to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerOutcome {
	/// Not over a connected port.
	Ignored,
	/// Jumped straight to the only connected node.
	Jumped { suppress_native: bool },
	/// Waiting for the host menu to appear so entries can be attached.
	Injecting(InteractionToken),
}

/// Slot accessor backed by the host, for the locator.
struct HostAnchor<'a>(&'a dyn EditorHost);

impl SlotAnchor for HostAnchor<'_> {
	fn slot_position(&self, node: &GraphNode, index: usize, is_input: bool) -> Option<Point> {
		self.0.slot_position(node, index, is_input)
	}
}

pub struct PortTeleport {
	me: Weak<PortTeleport>,
	host: Rc<dyn EditorHost>,
	store: Rc<dyn KeyValueStore>,
	settings: RefCell<Settings>,
	history: RefCell<NavigationHistory>,
	locator: SlotLocator,
	last_pointer: Cell<Option<Point>>,
	latch: InteractionLatch,
	contributed: Cell<Option<InteractionToken>>,
	scheduler: Rc<dyn Scheduler>,
	surface: Option<Rc<dyn MenuSurface>>,
	retry: RetryPolicy,
	ui: RefCell<Option<Rc<dyn UiDriver>>>,
	listeners: RefCell<Vec<ListenerGuard>>,
	bound: Cell<bool>,
}

impl PortTeleport {
	pub fn new(
		host: Rc<dyn EditorHost>,
		store: Rc<dyn KeyValueStore>,
		scheduler: Rc<dyn Scheduler>,
		surface: Option<Rc<dyn MenuSurface>>,
	) -> Rc<Self> {
		let settings = Settings::load(&*store);
		let history = NavigationHistory::with_capacity(settings.history_capacity);
		let surface = surface.filter(|s| s.is_available());
		if surface.is_none() {
			info!("[PortTeleport] no DOM menu surface; using declarative hooks only");
		}

		Rc::new_cyclic(|me| Self {
			me: me.clone(),
			host,
			store,
			settings: RefCell::new(settings),
			history: RefCell::new(history),
			locator: SlotLocator::default(),
			last_pointer: Cell::new(None),
			latch: InteractionLatch::default(),
			contributed: Cell::new(None),
			scheduler,
			surface,
			retry: RetryPolicy::default(),
			ui: RefCell::new(None),
			listeners: RefCell::new(Vec::new()),
			bound: Cell::new(false),
		})
	}

	pub fn host(&self) -> &Rc<dyn EditorHost> {
		&self.host
	}

	pub fn settings(&self) -> Ref<'_, Settings> {
		self.settings.borrow()
	}

	pub fn history(&self) -> Ref<'_, NavigationHistory> {
		self.history.borrow()
	}

	/// Replaces the settings, persisting them and resizing the history.
	pub fn update_settings(&self, settings: Settings) {
		settings.save(&*self.store);
		self.history.borrow_mut().set_capacity(settings.history_capacity);
		*self.settings.borrow_mut() = settings;
	}

	pub fn set_ui(&self, ui: Rc<dyn UiDriver>) {
		*self.ui.borrow_mut() = Some(ui);
	}

	fn ui(&self) -> Option<Rc<dyn UiDriver>> {
		self.ui.borrow().clone()
	}

	/// Runs `bind` the first time only, keeping the listeners it returns alive for
	/// the lifetime of the extension.
	pub fn bind_once(&self, bind: impl FnOnce() -> Vec<ListenerGuard>) -> bool {
		if self.bound.replace(true) {
			return false;
		}
		let guards = bind();
		debug!("[PortTeleport] bound {} listeners", guards.len());
		self.listeners.borrow_mut().extend(guards);
		true
	}

	pub fn action_handler(&self) -> ActionHandler {
		let me = self.me.clone();
		Rc::new(move |action| {
			if let Some(me) = me.upgrade() {
				me.perform(action);
			}
		})
	}

	pub fn perform(&self, action: MenuAction) {
		match action {
			MenuAction::Jump(id) => {
				self.jump_to(id);
			}
			MenuAction::OpenSearch => match self.ui() {
				Some(ui) => ui.open_search(),
				None => debug!("[PortTeleport] search requested without a UI"),
			},
		}
	}

	/// Centres and selects `id`, recording the visit in the history.
	pub fn jump_to(&self, id: NodeId) -> bool {
		if self.host.node(id).is_none() {
			warn!("[PortTeleport] cannot jump to missing node {id}");
			return false;
		}
		if self.settings.borrow().history_enabled {
			let current = self.host.selected_node();
			self.history.borrow_mut().record(id, current);
		}
		self.reveal(id);
		true
	}

	fn reveal(&self, id: NodeId) {
		if let Err(err) = self.host.center_on_node(id) {
			warn!("[PortTeleport] centre on {id} failed: {err}");
		}
		if let Err(err) = self.host.select_node(id) {
			warn!("[PortTeleport] select {id} failed: {err}");
		}
	}

	fn step_history(&self, forward: bool) -> Option<NodeId> {
		if !self.settings.borrow().history_enabled {
			return None;
		}
		let id = self.history.borrow_mut().step(forward, |id| {
			let exists = self.host.node(id).is_some();
			if !exists {
				debug!("[PortTeleport] skipping deleted node {id} in history");
			}
			exists
		})?;
		self.reveal(id);
		Some(id)
	}

	pub fn history_back(&self) -> Option<NodeId> {
		self.step_history(false)
	}

	pub fn history_forward(&self) -> Option<NodeId> {
		self.step_history(true)
	}

	fn locate(&self, node: &GraphNode, point: Point) -> Option<SlotHit> {
		self.locator.locate(node, point, Some(&HostAnchor(&*self.host)))
	}

	fn mark_contributed(&self, node: NodeId, slot: usize, is_input: bool) {
		self.contributed.set(Some(InteractionToken {
			node,
			slot,
			direction: Direction::for_input(is_input),
		}));
	}

	/// Entries for the host's per-node menu hook.
	///
	/// The hook does not say which port was clicked, so the last pointer position is
	/// run through the locator first; without a port hit, every connection of the
	/// node is offered.
	pub fn node_menu_items(&self, node: &GraphNode) -> Vec<MenuItem> {
		if let Some(hit) = self.last_pointer.get().and_then(|p| self.locate(node, p)) {
			let connections = resolve(&*self.host, node, hit.index, hit.is_input);
			if !connections.is_empty() {
				self.mark_contributed(node.id, hit.index, hit.is_input);
				return menu::slot_items(&hit, &connections);
			}
		}
		menu::node_items(&resolve_all(&*self.host, node))
	}

	/// Entries for the host's per-slot menu hook.
	pub fn slot_menu_items(&self, node: &GraphNode, index: usize, is_input: bool) -> Vec<MenuItem> {
		let Some(port) = node.port(index, is_input) else {
			return Vec::new();
		};
		let connections = resolve(&*self.host, node, index, is_input);
		if connections.is_empty() {
			return Vec::new();
		}
		self.mark_contributed(node.id, index, is_input);
		let hit = SlotHit {
			index,
			is_input,
			slot: port.clone(),
		};
		menu::slot_items(&hit, &connections)
	}

	pub fn canvas_menu_items(&self) -> Vec<MenuItem> {
		menu::canvas_items(&self.settings.borrow().search_hotkey)
	}

	/// Handles a secondary-button press that will be followed by a context menu.
	///
	/// `client` is the viewport position used if a standalone menu has to be shown.
	pub fn on_secondary_pointer(&self, sample: &PointerSample, client: Point) -> PointerOutcome {
		self.contributed.set(None);
		self.last_pointer.set(None);
		let view = self.host.view_state();
		let Some(point) = pointer_graph_position(sample, view.as_ref()) else {
			self.latch.clear();
			return PointerOutcome::Ignored;
		};
		self.last_pointer.set(Some(point));

		let Some(node) = self.host.node_at(point) else {
			self.latch.clear();
			return PointerOutcome::Ignored;
		};
		let Some(hit) = self.locate(&node, point) else {
			self.latch.clear();
			return PointerOutcome::Ignored;
		};
		let connections = resolve(&*self.host, &node, hit.index, hit.is_input);
		if connections.is_empty() {
			self.latch.clear();
			return PointerOutcome::Ignored;
		}

		let (auto_jump, block) = {
			let s = self.settings.borrow();
			(s.auto_jump_single, s.block_native_menu)
		};
		if auto_jump && connections.len() == 1 {
			self.latch.clear();
			self.jump_to(connections[0].node.id);
			return PointerOutcome::Jumped {
				suppress_native: block,
			};
		}

		let token = InteractionToken {
			node: node.id,
			slot: hit.index,
			direction: Direction::for_input(hit.is_input),
		};
		self.latch.begin(token);
		self.start_injection(token, menu::slot_items(&hit, &connections), client);
		PointerOutcome::Injecting(token)
	}

	fn start_injection(&self, token: InteractionToken, items: Vec<MenuItem>, client: Point) {
		let handler = self.action_handler();
		let Some(surface) = self.surface.clone() else {
			self.show_standalone(&items, client, handler);
			return;
		};

		let items = Rc::new(items);
		let attempt = {
			let (me, items, handler) = (self.me.clone(), items.clone(), handler.clone());
			move || {
				let Some(me) = me.upgrade() else {
					return PollStep::Done;
				};
				if me.contributed.get() == Some(token) {
					debug!("[PortTeleport] host hook already added entries for {token:?}");
					return PollStep::Done;
				}
				if surface.attach(&token, &items, &handler) {
					PollStep::Done
				} else {
					PollStep::Pending
				}
			}
		};
		let exhausted = {
			let me = self.me.clone();
			move || {
				if let Some(me) = me.upgrade() {
					me.show_standalone(&items, client, handler);
				}
			}
		};
		start_poll(
			self.scheduler.clone(),
			self.latch.clone(),
			token,
			self.retry,
			attempt,
			exhausted,
		);
	}

	fn show_standalone(&self, items: &[MenuItem], client: Point, handler: ActionHandler) {
		if let Err(err) = self.host.show_menu(items, client, handler) {
			warn!("[PortTeleport] could not show fallback menu: {err}");
		}
	}

	/// Reacts to a key press; returns whether it was consumed.
	pub fn handle_key(&self, press: &KeyPress) -> bool {
		let s = self.settings.borrow().clone();
		let hit = |spec: &str| KeyChord::parse(spec).is_some_and(|c| c.matches(press));

		if hit(&s.search_hotkey) {
			self.perform(MenuAction::OpenSearch);
			return true;
		}
		if hit(&s.quick_jump_hotkey) {
			match (self.host.selected_node(), self.ui()) {
				(Some(id), Some(ui)) => ui.open_quick_jump(id),
				(None, _) => debug!("[PortTeleport] quick jump needs a selected node"),
				(_, None) => debug!("[PortTeleport] quick jump requested without a UI"),
			}
			return true;
		}
		if s.history_enabled && hit(&s.history_back_key) {
			self.history_back();
			return true;
		}
		if s.history_enabled && hit(&s.history_forward_key) {
			self.history_forward();
			return true;
		}
		false
	}

	/// Reacts to a mouse button press (side buttons); returns whether it was consumed.
	pub fn handle_mouse_button(&self, button: i16) -> bool {
		let (enabled, back, forward) = {
			let s = self.settings.borrow();
			(s.history_enabled, s.history_back_button, s.history_forward_button)
		};
		if !enabled {
			return false;
		}
		if button == back {
			self.history_back();
			true
		} else if button == forward {
			self.history_forward();
			true
		} else {
			false
		}
	}
}
