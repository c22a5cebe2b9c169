//! Riposte: rule-driven response matching for conversational bots
//!
//! A match tree ingests authored rules mapping natural-language patterns to
//! output templates and answers user utterances with the best-scoring
//! expanded response.

// Core modules (leaves first)
pub mod token; // Token classification and exact-match literals
pub mod lex; // Pattern lexing and the Lemmatizer seam
pub mod rule; // Rules and match results
pub mod output; // Conditional output lists
pub mod varstack; // Variable capture stack
pub mod policy; // Per-token match weighting
pub mod scoring; // Cumulative path scoring
pub mod node; // Automaton nodes and omap keys
pub mod expand; // Template variable references
pub mod tree; // Tree builder + scored DFS + expander

// Re-exports for convenience
pub use expand::ExpandError;
pub use lex::{Lemmatizer, LexError, SimpleLemmatizer};
pub use node::{Node, NodeId, NodeKind};
pub use output::{CondOutput, CondOutputList, Condition};
pub use policy::{LemmaMatchPolicy, MatchPolicy};
pub use rule::{MatchResult, Rule, RuleId, RuleMatch};
pub use scoring::{ScoringAlgorithm, WeightedAverageScorer};
pub use token::{Token, TokenKind};
pub use tree::{RuleTree, MAX_EXPANSION_DEPTH};
pub use varstack::VarStack;
