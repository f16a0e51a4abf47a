//! Bounded, cancelable retries for waiting on host-rendered DOM.
//!
//! Each poll is stamped with the interaction that started it. A newer interaction
//! replaces the latch value, and any pending attempt for the old one exits without
//! acting.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use crate::model::{Direction, NodeId};

/// Identity of one right-click on a port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InteractionToken {
	pub node: NodeId,
	pub slot: usize,
	pub direction: Direction,
}

/// The most recent interaction; shared between the input handlers and pending polls.
#[derive(Clone, Debug, Default)]
pub struct InteractionLatch(Rc<Cell<Option<InteractionToken>>>);

impl InteractionLatch {
	pub fn begin(&self, token: InteractionToken) {
		self.0.set(Some(token));
	}

	pub fn clear(&self) {
		self.0.set(None);
	}

	pub fn current(&self) -> Option<InteractionToken> {
		self.0.get()
	}

	pub fn is_current(&self, token: &InteractionToken) -> bool {
		self.0.get().as_ref() == Some(token)
	}
}

/// Runs a task after a delay on the UI thread.
pub trait Scheduler {
	fn schedule(&self, delay_ms: i32, task: Box<dyn FnOnce()>);
}

/// `window.setTimeout`-backed scheduler.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
	fn schedule(&self, delay_ms: i32, task: Box<dyn FnOnce()>) {
		let Some(window) = web_sys::window() else {
			warn!("[PortTeleport] no window; dropping scheduled task");
			return;
		};
		let callback = Closure::once_into_js(move || task());
		if let Err(err) = window
			.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay_ms)
		{
			warn!("[PortTeleport] setTimeout failed: {err:?}");
		}
	}
}

/// Queues tasks until [`ManualScheduler::run_next`] is called; for headless hosts and tests.
#[derive(Default)]
pub struct ManualScheduler {
	queue: RefCell<VecDeque<(i32, Box<dyn FnOnce()>)>>,
}

impl ManualScheduler {
	pub fn pending(&self) -> usize {
		self.queue.borrow().len()
	}

	/// Runs the oldest task, returning its delay, or `None` if the queue was empty.
	pub fn run_next(&self) -> Option<i32> {
		let (delay, task) = self.queue.borrow_mut().pop_front()?;
		task();
		Some(delay)
	}

	/// Runs tasks, including ones scheduled while running, until the queue is empty.
	pub fn run_all(&self) -> usize {
		let mut ran = 0;
		while self.run_next().is_some() {
			ran += 1;
		}
		ran
	}
}

impl Scheduler for ManualScheduler {
	fn schedule(&self, delay_ms: i32, task: Box<dyn FnOnce()>) {
		self.queue.borrow_mut().push_back((delay_ms, task));
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	pub interval_ms: i32,
	pub max_attempts: u32,
}

impl Default for RetryPolicy {
	/// Ten checks 25 ms apart: about a quarter second in total.
	fn default() -> Self {
		Self {
			interval_ms: 25,
			max_attempts: 10,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollStep {
	Done,
	Pending,
}

struct PollTask {
	scheduler: Rc<dyn Scheduler>,
	latch: InteractionLatch,
	token: InteractionToken,
	policy: RetryPolicy,
	attempts: u32,
	attempt: Box<dyn FnMut() -> PollStep>,
	exhausted: Box<dyn FnOnce()>,
}

impl PollTask {
	fn schedule(self) {
		let scheduler = self.scheduler.clone();
		let delay = self.policy.interval_ms;
		scheduler.schedule(delay, Box::new(move || self.run()));
	}

	fn run(mut self) {
		if !self.latch.is_current(&self.token) {
			debug!("[PortTeleport] dropping stale poll for {:?}", self.token);
			return;
		}
		if (self.attempt)() == PollStep::Done {
			return;
		}
		self.attempts += 1;
		if self.attempts >= self.policy.max_attempts {
			debug!(
				"[PortTeleport] gave up waiting after {} attempts for {:?}",
				self.attempts, self.token
			);
			(self.exhausted)();
			return;
		}
		self.schedule();
	}
}

/// Calls `attempt` every `policy.interval_ms` until it reports [`PollStep::Done`],
/// the attempt budget runs out (then `exhausted` runs once), or `token` stops being
/// the latest interaction (then nothing more runs).
pub fn start_poll(
	scheduler: Rc<dyn Scheduler>,
	latch: InteractionLatch,
	token: InteractionToken,
	policy: RetryPolicy,
	attempt: impl FnMut() -> PollStep + 'static,
	exhausted: impl FnOnce() + 'static,
) {
	PollTask {
		scheduler,
		latch,
		token,
		policy,
		attempts: 0,
		attempt: Box::new(attempt),
		exhausted: Box::new(exhausted),
	}
	.schedule();
}
