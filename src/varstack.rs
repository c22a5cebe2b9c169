//! Variable capture stack
//!
//! Tracks, per input position, which pattern variable currently owns the
//! position and the original word captured there. Ownership is rewritten
//! as the DFS backtracks, so at any terminal the stack describes exactly
//! the current root-to-node path.

use hashbrown::HashMap;

/// Capture state for one traversal. Anonymous wildcard slots use the empty
/// name.
#[derive(Debug, Clone, Default)]
pub struct VarStack {
    /// offset -> owning variable name.
    owners: HashMap<usize, String>,
    /// offset -> original word captured at that position.
    captures: HashMap<usize, String>,
}

impl VarStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `offset` is currently owned by `name` (empty for an
    /// anonymous wildcard slot). Any previous capture at the position is
    /// dropped.
    pub fn update(&mut self, name: &str, offset: usize) {
        self.owners.insert(offset, name.to_string());
        self.captures.remove(&offset);
    }

    /// Record the word captured at `offset`.
    pub fn capture(&mut self, word: &str, offset: usize) {
        self.captures.insert(offset, word.to_string());
    }

    /// The concatenated capture for `name`, in input order.
    pub fn value(&self, name: &str) -> String {
        let mut offsets: Vec<usize> = self
            .owners
            .iter()
            .filter(|(_, n)| n.as_str() == name)
            .map(|(o, _)| *o)
            .collect();
        offsets.sort_unstable();

        let words: Vec<&str> = offsets
            .iter()
            .filter_map(|o| self.captures.get(o).map(String::as_str))
            .collect();
        words.join(" ")
    }

    pub fn clear(&mut self) {
        self.owners.clear();
        self.captures.clear();
    }
}
