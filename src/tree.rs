//! The match tree
//!
//! This module is the operational core of the engine:
//!
//! - `add` tokenises each rule input and threads it into the automaton,
//!   reusing nodes for shared prefixes and merging wildcards.
//! - `results` runs a scored depth-first search of the automaton over the
//!   input tokens, collecting candidates wherever the input ends on a node
//!   that terminates a rule input.
//! - Candidate outputs pass through conditional selection and template
//!   expansion; recursive references re-enter the engine under a fresh
//!   capture/scoring context.
//!
//! A tree instance evaluates one query at a time: the variable stack,
//! scoring algorithm, and loop detector are instance state shared by the
//! whole traversal, including recursive re-dispatch.

use std::mem;

use rustc_hash::FxHashSet;
use tracing::{debug, trace, warn};

use crate::expand::{self, ExpandError};
use crate::lex::{Lemmatizer, LexError, SimpleLemmatizer};
use crate::node::{self, Node, NodeId, NodeKind};
use crate::output::CondOutputList;
use crate::policy::{LemmaMatchPolicy, MatchPolicy};
use crate::rule::{MatchResult, Rule, RuleId, RuleMatch};
use crate::scoring::{ScoringAlgorithm, WeightedAverageScorer};
use crate::token::{self, Token, TokenKind};
use crate::varstack::VarStack;

/// Maximum depth of recursive template expansion.
pub const MAX_EXPANSION_DEPTH: usize = 64;

const ROOT: NodeId = 0;

/// Rule-driven match tree with scored DFS and recursive response expansion.
pub struct RuleTree {
    nodes: Vec<Node>,
    lemmatizer: Box<dyn Lemmatizer>,
    policy: Box<dyn MatchPolicy>,
    scoring: Box<dyn ScoringAlgorithm>,
    stack: VarStack,
    /// (node, offset) pairs currently on the terminal stack.
    loop_detector: FxHashSet<(NodeId, usize)>,
    rec_depth: usize,
}

impl RuleTree {
    pub fn new() -> Self {
        Self::with_components(
            Box::new(SimpleLemmatizer),
            Box::new(LemmaMatchPolicy),
            Box::new(WeightedAverageScorer::new()),
        )
    }

    pub fn with_components(
        lemmatizer: Box<dyn Lemmatizer>,
        policy: Box<dyn MatchPolicy>,
        scoring: Box<dyn ScoringAlgorithm>,
    ) -> Self {
        Self {
            nodes: vec![Node::new(ROOT, NodeKind::Root, None)],
            lemmatizer,
            policy,
            scoring,
            stack: VarStack::new(),
            loop_detector: FxHashSet::default(),
            rec_depth: 0,
        }
    }

    /// All nodes in the automaton, root first.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Insert a rule. Empty inputs are skipped; inputs past the omap key
    /// capacity are dropped with a warning.
    pub fn add(&mut self, rule: &Rule) -> Result<(), LexError> {
        let mut onodes: Vec<(usize, NodeId)> = Vec::new();

        for (idx, input) in rule.inputs.iter().enumerate() {
            if idx >= node::MAX_INPUTS_PER_RULE {
                warn!(
                    rule_id = rule.id,
                    max = node::MAX_INPUTS_PER_RULE,
                    "rule exceeds the input capacity of an omap key; dropping the rest"
                );
                break;
            }

            debug!(rule_id = rule.id, input_idx = idx, input = %input, "parsing rule input");
            let words = self.parse_rule_input(input)?;
            if words.is_empty() {
                continue;
            }

            let mut cur = ROOT;
            for word in &words {
                cur = self.add_node(word, cur);
            }

            if !onodes.contains(&(idx, cur)) {
                onodes.push((idx, cur));
            }

            // A trailing `*` may consume nothing, so the input also
            // terminates at the wildcard's parent.
            if matches!(words.last(), Some(w) if w.kind == TokenKind::WildcardStar) {
                if let Some(parent) = self.nodes[cur].parent {
                    if parent != ROOT && !onodes.contains(&(idx, parent)) {
                        onodes.push((idx, parent));
                    }
                }
            }
        }

        for (idx, node_id) in onodes {
            self.nodes[node_id]
                .omap
                .insert(node::omap_key(rule.id, idx), rule.outputs.clone());
        }

        Ok(())
    }

    /// Find or create the child of `parent` for `word`.
    fn add_node(&mut self, word: &Token, parent: NodeId) -> NodeId {
        match &word.kind {
            TokenKind::Word | TokenKind::Symbol => {
                for i in 0..self.nodes[parent].children.len() {
                    let c = self.nodes[parent].children[i];
                    if let NodeKind::Word(t) = &self.nodes[c].kind {
                        if t.node_eq(word) {
                            return c;
                        }
                    }
                }
            }
            TokenKind::WildcardStar | TokenKind::WildcardPlus => {
                // An adjacent wildcard merges into the wildcard itself: its
                // self-loop already consumes further tokens.
                if let NodeKind::Wildcard { min, .. } = &mut self.nodes[parent].kind {
                    if word.kind == TokenKind::WildcardStar {
                        *min = 0;
                    }
                    return parent;
                }
                for i in 0..self.nodes[parent].children.len() {
                    let c = self.nodes[parent].children[i];
                    if let NodeKind::Wildcard { min, .. } = &mut self.nodes[c].kind {
                        if word.kind == TokenKind::WildcardStar && *min == 1 {
                            *min = 0;
                        }
                        return c;
                    }
                }
            }
            TokenKind::Variable(name) => {
                for i in 0..self.nodes[parent].children.len() {
                    let c = self.nodes[parent].children[i];
                    if let NodeKind::Variable { name: existing } = &self.nodes[c].kind {
                        if existing == name {
                            return c;
                        }
                    }
                }
            }
        }

        let id = self.nodes.len();
        let kind = match &word.kind {
            TokenKind::WildcardStar => NodeKind::Wildcard {
                original: word.original.clone(),
                min: 0,
            },
            TokenKind::WildcardPlus => NodeKind::Wildcard {
                original: word.original.clone(),
                min: 1,
            },
            TokenKind::Variable(name) => NodeKind::Variable { name: name.clone() },
            TokenKind::Word | TokenKind::Symbol => NodeKind::Word(word.clone()),
        };
        self.nodes.push(Node::new(id, kind, Some(parent)));
        self.nodes[parent].children.push(id);

        // A zero-min wildcard may consume nothing: its children are also
        // reachable from its own parent.
        if let NodeKind::Wildcard { min: 0, .. } = self.nodes[parent].kind {
            if let Some(grandparent) = self.nodes[parent].parent {
                self.nodes[grandparent].children.push(id);
            }
        }

        trace!(node = id, parent, "added node");
        id
    }

    /// Best-scoring response for `input`, with its rule match.
    pub fn get_response(&mut self, input: &str) -> Option<(String, RuleMatch)> {
        let mut results = self.results(input);
        if results.is_empty() {
            None
        } else {
            let best = results.remove(0);
            let rule_match = best.rule_match();
            Some((best.output, rule_match))
        }
    }

    /// All responses for `input`, score-descending, with the match trail.
    pub fn get_responses(&mut self, input: &str) -> (Vec<String>, Vec<RuleMatch>) {
        self.results(input)
            .into_iter()
            .map(|r| {
                let m = r.rule_match();
                (r.output, m)
            })
            .unzip()
    }

    /// All scored candidates for `input`, score-descending. Equal scores
    /// keep discovery order.
    pub fn results(&mut self, input: &str) -> Vec<MatchResult> {
        self.stack.clear();
        self.scoring.reset();

        let words = match self.parse_user_input(input) {
            Ok(words) => words,
            Err(err) => {
                warn!(%err, "failed to lex user input");
                return Vec::new();
            }
        };

        let mut results = Vec::new();
        self.scored_dfs(&mut results, ROOT, &words, 0);

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!(input, count = results.len(), "query finished");
        results
    }

    fn scored_dfs(
        &mut self,
        results: &mut Vec<MatchResult>,
        node: NodeId,
        words: &[Token],
        offset: usize,
    ) {
        if offset >= words.len() {
            return;
        }

        for next in self.successors(node) {
            let weight = self.policy.weight(&self.nodes[next], &words[offset]);

            // Ownership is recorded before the match decision so anonymous
            // wildcard slots track the position too.
            let var_name = match &self.nodes[next].kind {
                NodeKind::Variable { name } => Some(name.clone()),
                _ => None,
            };
            self.stack.update(var_name.as_deref().unwrap_or(""), offset);

            if weight > 0.0 {
                trace!(node = next, offset, weight, "token matched");
                self.stack.capture(&words[offset].original, offset);
                self.scoring.update_score(offset, weight);

                if offset + 1 < words.len() {
                    self.scored_dfs(results, next, words, offset + 1);
                } else {
                    self.handle_end_word(results, next, offset);
                }
            }
        }
    }

    /// Nodes reachable from `node` for the next input token: itself when it
    /// self-loops, then its children in insertion order.
    fn successors(&self, node: NodeId) -> Vec<NodeId> {
        let n = &self.nodes[node];
        let mut out = Vec::with_capacity(n.children.len() + 1);
        if n.loops() {
            out.push(node);
        }
        out.extend_from_slice(&n.children);
        out
    }

    /// The input ended on `node`: emit a candidate if a rule input
    /// terminates here and its output survives expansion.
    fn handle_end_word(&mut self, results: &mut Vec<MatchResult>, node: NodeId, offset: usize) {
        let key = (node, offset);
        if !self.loop_detector.insert(key) {
            trace!(node, offset, "terminal loop detected; aborting branch");
            return;
        }

        if let Some((rule_id, input_idx, output)) = self.get_valid_output(node) {
            let score = self.scoring.current_score();
            results.push(MatchResult {
                rule_id,
                input_idx,
                output,
                score,
            });
        } else {
            trace!(node, offset, "no output at terminal");
        }

        self.loop_detector.remove(&key);
    }

    /// Walk the node's omap in key order; the first entry whose conditional
    /// list yields a template that expands successfully wins.
    fn get_valid_output(&mut self, node: NodeId) -> Option<(RuleId, usize, String)> {
        let entries: Vec<(u64, CondOutputList)> = self.nodes[node]
            .omap
            .iter()
            .map(|(k, list)| (*k, list.clone()))
            .collect();

        for (key, list) in entries {
            let Some(template) = list.next_valid_output(&self.stack).map(str::to_owned) else {
                continue;
            };

            match self.expand_vars(&template) {
                Ok(expanded) => {
                    return Some((node::rule_id_of(key), node::input_idx_of(key), expanded));
                }
                Err(err) => {
                    debug!(%err, %template, "expansion failed; trying next output");
                }
            }
        }

        None
    }

    /// Substitute variable references in `template`.
    fn expand_vars(&mut self, template: &str) -> Result<String, ExpandError> {
        let mut out = String::new();
        let mut offset = 0;

        while let Some(var) = expand::parse_variable(template, offset) {
            out.push_str(&template[offset..var.start]);

            let mut value = self.stack.value(&var.name);
            if var.recursive {
                value = self.get_rec_response(&value)?;
                if value.is_empty() {
                    return Err(ExpandError::EmptyRecursion(var.name));
                }
            }
            out.push_str(&value);
            offset = var.end();
        }

        out.push_str(&template[offset..]);
        Ok(out)
    }

    /// Re-dispatch a captured value as a fresh utterance. The outer capture
    /// stack and score survive untouched; the inner score and match trail
    /// are discarded.
    fn get_rec_response(&mut self, input: &str) -> Result<String, ExpandError> {
        if self.rec_depth >= MAX_EXPANSION_DEPTH {
            return Err(ExpandError::DepthExceeded(MAX_EXPANSION_DEPTH));
        }
        self.rec_depth += 1;

        let saved_stack = mem::take(&mut self.stack);
        let fresh = self.scoring.fresh();
        let saved_scoring = mem::replace(&mut self.scoring, fresh);

        let response = self
            .get_response(input)
            .map(|(resp, _)| resp)
            .unwrap_or_default();

        self.scoring = saved_scoring;
        self.stack = saved_stack;
        self.rec_depth -= 1;

        Ok(response)
    }

    fn parse_rule_input(&self, input: &str) -> Result<Vec<Token>, LexError> {
        let mut words = self.lemmatizer.lemmatize(input)?;
        token::parse_exact_match(&mut words);
        words.retain(|w| !w.is_symbol());
        Ok(words)
    }

    fn parse_user_input(&self, input: &str) -> Result<Vec<Token>, LexError> {
        let stripped: String = input.chars().filter(|&c| c != '\'').collect();
        let mut words = self.lemmatizer.lemmatize(&stripped)?;

        // Pattern operators have no meaning in an utterance: wildcards are
        // punctuation, a bracketed chunk is an ordinary word.
        for w in &mut words {
            match w.kind {
                TokenKind::WildcardStar | TokenKind::WildcardPlus => w.kind = TokenKind::Symbol,
                TokenKind::Variable(_) => w.kind = TokenKind::Word,
                _ => {}
            }
        }

        words.retain(|w| !w.is_symbol());
        Ok(words)
    }
}

impl Default for RuleTree {
    fn default() -> Self {
        Self::new()
    }
}
