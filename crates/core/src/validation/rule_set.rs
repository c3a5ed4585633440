//! Declarative rule sets.
//!
//! A [`RuleSet`] is an ordered list of named predicates over one input
//! type. Evaluation runs every rule and collects every violation; no rule
//! sees the outcome of another.

use std::borrow::Cow;

use super::{ValidationContext, ValidationErrors};

type Check<T> = Box<dyn Fn(&T, &ValidationContext) -> Result<(), Cow<'static, str>> + Send + Sync>;

struct Rule<T> {
    field: &'static str,
    check: Check<T>,
}

/// Ordered, independently evaluated rules for inputs of type `T`.
pub struct RuleSet<T> {
    name: &'static str,
    rules: Vec<Rule<T>>,
}

impl<T> RuleSet<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rules: Vec::new(),
        }
    }

    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Add a rule with a fixed message. `predicate` returns `true` when the
    /// input passes.
    pub fn rule<F>(mut self, field: &'static str, message: &'static str, predicate: F) -> Self
    where
        F: Fn(&T, &ValidationContext) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            field,
            check: Box::new(move |input, ctx| {
                if predicate(input, ctx) {
                    Ok(())
                } else {
                    Err(Cow::Borrowed(message))
                }
            }),
        });
        self
    }

    /// Add a rule whose message is computed at evaluation time.
    pub fn check<F>(mut self, field: &'static str, check: F) -> Self
    where
        F: Fn(&T, &ValidationContext) -> Result<(), String> + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            field,
            check: Box::new(move |input, ctx| check(input, ctx).map_err(Cow::Owned)),
        });
        self
    }

    /// Evaluate every rule against `input`.
    pub fn evaluate(&self, input: &T, ctx: &ValidationContext) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for rule in &self.rules {
            if let Err(message) = (rule.check)(input, ctx) {
                errors.add(rule.field, message);
            }
        }
        errors
    }
}
