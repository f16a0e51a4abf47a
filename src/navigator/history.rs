use std::collections::VecDeque;

use crate::model::NodeId;

pub const DEFAULT_CAPACITY: usize = 50;

/// Browser-style back/forward stack of visited nodes.
///
/// Entries are node ids only; whether a node still exists is the caller's concern.
#[derive(Clone, Debug)]
pub struct NavigationHistory {
	entries: VecDeque<NodeId>,
	cursor: usize,
	capacity: usize,
}

impl Default for NavigationHistory {
	fn default() -> Self {
		Self::with_capacity(DEFAULT_CAPACITY)
	}
}

impl NavigationHistory {
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			entries: VecDeque::new(),
			cursor: 0,
			capacity: capacity.max(1),
		}
	}

	/// Records a visit to `node`.
	///
	/// `current` seeds an empty history so the first jump can be undone. Forward
	/// entries past the cursor are discarded; revisiting the entry under the cursor
	/// is a no-op.
	pub fn record(&mut self, node: NodeId, current: Option<NodeId>) {
		if self.entries.is_empty() {
			if let Some(seed) = current.filter(|&c| c != node) {
				self.entries.push_back(seed);
			}
		} else {
			self.entries.truncate(self.cursor + 1);
		}

		if self.entries.back() == Some(&node) {
			self.cursor = self.entries.len() - 1;
			return;
		}

		self.entries.push_back(node);
		while self.entries.len() > self.capacity {
			self.entries.pop_front();
		}
		self.cursor = self.entries.len() - 1;
	}

	pub fn back(&mut self) -> Option<NodeId> {
		if self.cursor == 0 || self.entries.is_empty() {
			return None;
		}
		self.cursor -= 1;
		self.entries.get(self.cursor).copied()
	}

	pub fn forward(&mut self) -> Option<NodeId> {
		if self.cursor + 1 >= self.entries.len() {
			return None;
		}
		self.cursor += 1;
		self.entries.get(self.cursor).copied()
	}

	/// Steps back or forward past every entry `accept` rejects.
	///
	/// The cursor only moves when an accepted entry is found.
	pub fn step(&mut self, forward: bool, mut accept: impl FnMut(NodeId) -> bool) -> Option<NodeId> {
		let start = self.cursor;
		loop {
			let next = if forward { self.forward() } else { self.back() };
			match next {
				Some(id) if accept(id) => return Some(id),
				Some(_) => {}
				None => {
					self.cursor = start;
					return None;
				}
			}
		}
	}

	pub fn current(&self) -> Option<NodeId> {
		self.entries.get(self.cursor).copied()
	}

	pub fn can_go_back(&self) -> bool {
		self.cursor > 0
	}

	pub fn can_go_forward(&self) -> bool {
		self.cursor + 1 < self.entries.len()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn entries(&self) -> impl Iterator<Item = NodeId> + '_ {
		self.entries.iter().copied()
	}

	/// Changes the capacity, evicting the oldest entries if the stack is now too long.
	pub fn set_capacity(&mut self, capacity: usize) {
		self.capacity = capacity.max(1);
		while self.entries.len() > self.capacity {
			self.entries.pop_front();
			self.cursor = self.cursor.saturating_sub(1);
		}
	}

	pub fn clear(&mut self) {
		self.entries.clear();
		self.cursor = 0;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const A: NodeId = 1;
	const B: NodeId = 2;
	const C: NodeId = 3;
	const D: NodeId = 4;

	fn abc() -> NavigationHistory {
		let mut history = NavigationHistory::default();
		for node in [A, B, C] {
			history.record(node, None);
		}
		history
	}

	#[test]
	fn back_and_forward_walk_the_stack() {
		let mut history = abc();
		assert_eq!(history.back(), Some(B));
		assert_eq!(history.back(), Some(A));
		assert_eq!(history.back(), None);
		assert_eq!(history.current(), Some(A));
		assert_eq!(history.forward(), Some(B));
		assert_eq!(history.forward(), Some(C));
		assert_eq!(history.forward(), None);
	}

	#[test]
	fn recording_after_back_drops_forward_entries() {
		let mut history = abc();
		history.back();
		history.back();
		history.record(D, None);

		assert_eq!(history.entries().collect::<Vec<_>>(), vec![A, D]);
		assert!(!history.can_go_forward());
		assert_eq!(history.back(), Some(A));
	}

	#[test]
	fn repeated_visit_is_suppressed() {
		let mut history = abc();
		history.record(C, None);
		assert_eq!(history.len(), 3);
	}

	#[test]
	fn empty_history_is_seeded_with_current_node() {
		let mut history = NavigationHistory::default();
		history.record(B, Some(A));
		assert_eq!(history.entries().collect::<Vec<_>>(), vec![A, B]);

		let mut history = NavigationHistory::default();
		history.record(B, Some(B));
		assert_eq!(history.entries().collect::<Vec<_>>(), vec![B]);
	}

	#[test]
	fn capacity_evicts_oldest_first() {
		let max = 10;
		let mut history = NavigationHistory::with_capacity(max);
		for node in 0..(max as NodeId + 5) {
			history.record(node, None);
		}
		assert_eq!(history.len(), max);
		assert_eq!(history.entries().next(), Some(5));
		assert_eq!(history.current(), Some(14));
	}

	#[test]
	fn step_skips_rejected_entries() {
		let mut history = abc();
		history.record(D, None);
		assert_eq!(history.step(false, |id| id != C), Some(B));
		assert_eq!(history.current(), Some(B));

		// Only rejected entries remain behind: stay put.
		assert_eq!(history.step(false, |id| id != A), None);
		assert_eq!(history.current(), Some(B));
		assert_eq!(history.step(true, |id| id != C), Some(D));
	}

	#[test]
	fn shrinking_capacity_keeps_cursor_in_range() {
		let mut history = abc();
		history.record(D, None);
		history.set_capacity(2);
		assert_eq!(history.entries().collect::<Vec<_>>(), vec![C, D]);
		assert_eq!(history.current(), Some(D));
		assert_eq!(history.back(), Some(C));
	}
}
