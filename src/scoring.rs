//! Scoring algorithms
//!
//! A scoring algorithm folds the per-step match weights of the current DFS
//! path into a cumulative score. The tree treats it as opaque: it calls
//! `update_score` on every matched step and reads `current_score` when a
//! terminal emits a candidate.

use std::collections::BTreeMap;

pub trait ScoringAlgorithm {
    /// Fold `weight` at input position `offset` into the cumulative state.
    fn update_score(&mut self, offset: usize, weight: f32);

    /// The score of the current path.
    fn current_score(&self) -> f32;

    /// Clear accumulated state; invoked at the top of each top-level query.
    fn reset(&mut self);

    /// A clean instance, installed during recursive context switches.
    fn fresh(&self) -> Box<dyn ScoringAlgorithm>;
}

/// Default scorer: arithmetic mean of the weights along the current path.
///
/// `update_score` overwrites the slot at `offset` and discards deeper
/// slots, so state left behind by an abandoned sibling branch never leaks
/// into the next candidate's score.
#[derive(Debug, Clone, Default)]
pub struct WeightedAverageScorer {
    weights: BTreeMap<usize, f32>,
}

impl WeightedAverageScorer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoringAlgorithm for WeightedAverageScorer {
    fn update_score(&mut self, offset: usize, weight: f32) {
        self.weights.split_off(&(offset + 1));
        self.weights.insert(offset, weight);
    }

    fn current_score(&self) -> f32 {
        if self.weights.is_empty() {
            return 0.0;
        }
        self.weights.values().sum::<f32>() / self.weights.len() as f32
    }

    fn reset(&mut self) {
        self.weights.clear();
    }

    fn fresh(&self) -> Box<dyn ScoringAlgorithm> {
        Box::new(Self::new())
    }
}
