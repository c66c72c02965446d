//! Focused node and highlight set, kept independent of each other.

use std::collections::BTreeSet;

/// Ids of emphasized nodes. Ordered so style passes iterate deterministically.
pub type HighlightSet = BTreeSet<String>;

/// Tracks the single focused file and the set of highlighted ids.
///
/// Clearing one never touches the other: closing the sidebar keeps an
/// assistant-driven highlight alive, and resetting highlights keeps the
/// sidebar open.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionController {
	selected: Option<String>,
	highlighted: HighlightSet,
}

impl SelectionController {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn select(&mut self, id: Option<String>) {
		self.selected = id;
	}

	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	/// Flip membership of `id`. Returns whether it is highlighted afterwards.
	pub fn toggle_highlight(&mut self, id: &str) -> bool {
		if self.highlighted.remove(id) {
			false
		} else {
			self.highlighted.insert(id.to_string());
			true
		}
	}

	/// Replace the highlight set wholesale.
	pub fn set_highlighted<I, S>(&mut self, ids: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.highlighted = ids.into_iter().map(Into::into).collect();
	}

	pub fn clear_highlights(&mut self) {
		self.highlighted.clear();
	}

	pub fn highlighted(&self) -> &HighlightSet {
		&self.highlighted
	}

	pub fn is_highlighted(&self, id: &str) -> bool {
		self.highlighted.contains(id)
	}

	/// Drop the focus if it no longer names a node after a rebuild.
	pub fn retain_present(&mut self, is_present: impl Fn(&str) -> bool) {
		if self.selected.as_deref().is_some_and(|id| !is_present(id)) {
			self.selected = None;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn toggle_adds_then_removes() {
		let mut sel = SelectionController::new();
		assert!(sel.toggle_highlight("a.rs"));
		assert!(sel.is_highlighted("a.rs"));
		assert!(!sel.toggle_highlight("a.rs"));
		assert!(sel.highlighted().is_empty());
	}

	#[test]
	fn set_highlighted_dedupes() {
		let mut sel = SelectionController::new();
		sel.set_highlighted(["b", "a", "b"]);
		assert_eq!(sel.highlighted().iter().collect::<Vec<_>>(), ["a", "b"]);
	}

	#[test]
	fn selection_and_highlights_are_independent() {
		let mut sel = SelectionController::new();
		sel.select(Some("a".into()));
		sel.set_highlighted(["b"]);
		sel.select(None);
		assert!(sel.is_highlighted("b"));
		sel.select(Some("a".into()));
		sel.clear_highlights();
		assert_eq!(sel.selected(), Some("a"));
	}

	#[test]
	fn retain_present_clears_stale_focus_only() {
		let mut sel = SelectionController::new();
		sel.select(Some("gone.rs".into()));
		sel.set_highlighted(["gone.rs"]);
		sel.retain_present(|id| id == "kept.rs");
		assert_eq!(sel.selected(), None);
		assert!(sel.is_highlighted("gone.rs"));

		sel.select(Some("kept.rs".into()));
		sel.retain_present(|id| id == "kept.rs");
		assert_eq!(sel.selected(), Some("kept.rs"));
	}
}
