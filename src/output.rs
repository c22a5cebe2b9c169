//! Conditional output lists
//!
//! A rule's outputs are an ordered list of `(condition, template)` pairs;
//! the first pair whose condition holds against the current capture stack
//! supplies the response template. The list is installed at every output
//! node for the rule, so the pairs live behind shared storage and cloning
//! is a refcount bump.

use std::sync::Arc;

use crate::varstack::VarStack;

/// A predicate over captured variables.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Always,
    /// The named capture is non-empty.
    Defined(String),
    /// The named capture equals the value, ignoring ASCII case.
    Equals(String, String),
    Not(Box<Condition>),
    All(Vec<Condition>),
}

impl Condition {
    pub fn evaluate(&self, stack: &VarStack) -> bool {
        match self {
            Condition::Always => true,
            Condition::Defined(var) => !stack.value(var).is_empty(),
            Condition::Equals(var, value) => stack.value(var).eq_ignore_ascii_case(value),
            Condition::Not(inner) => !inner.evaluate(stack),
            Condition::All(conds) => conds.iter().all(|c| c.evaluate(stack)),
        }
    }
}

/// One `(condition, template)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CondOutput {
    pub condition: Condition,
    pub template: String,
}

impl CondOutput {
    pub fn new(condition: Condition, template: impl Into<String>) -> Self {
        Self {
            condition,
            template: template.into(),
        }
    }
}

/// Ordered conditional outputs with shared backing storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CondOutputList {
    outputs: Arc<[CondOutput]>,
}

impl CondOutputList {
    pub fn new(outputs: Vec<CondOutput>) -> Self {
        Self {
            outputs: outputs.into(),
        }
    }

    /// Convenience for the common case of unconditional templates.
    pub fn unconditional<I, S>(templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            templates
                .into_iter()
                .map(|t| CondOutput::new(Condition::Always, t))
                .collect(),
        )
    }

    /// The first template whose condition holds against `stack`.
    pub fn next_valid_output(&self, stack: &VarStack) -> Option<&str> {
        self.outputs
            .iter()
            .find(|o| o.condition.evaluate(stack))
            .map(|o| o.template.as_str())
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl From<&str> for CondOutputList {
    fn from(template: &str) -> Self {
        Self::unconditional([template])
    }
}
