//! Rule engine: decides whether a customer's activity profile matches
//! a segment's rule sequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::customer::ActivityProfile;

/// The profile field a rule clause compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleField {
    /// Cumulative spend, in dollars.
    TotalSpend,
    /// Number of transactions.
    VisitCount,
    /// Ceiling of days elapsed since the last transaction.
    DaysSinceLastActive,
}

/// Comparison operator of a rule clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    GreaterThan,
    LessThan,
    EqualTo,
    GreaterEqual,
    LessEqual,
}

/// How a clause's result folds into the running result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleLogic {
    #[default]
    And,
    Or,
}

/// One clause of a segment definition.
///
/// The combinator (`logic`) governs how the *next* clause folds into
/// the accumulator, not how this clause itself joins it. See
/// [`evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRule {
    pub field: RuleField,
    pub operator: RuleOperator,
    pub value: f64,
    #[serde(default)]
    pub logic: RuleLogic,
}

impl SegmentRule {
    /// Creates a rule with the default AND combinator.
    pub fn new(field: RuleField, operator: RuleOperator, value: f64) -> Self {
        Self {
            field,
            operator,
            value,
            logic: RuleLogic::And,
        }
    }

    /// Sets the combinator applied to the following rule.
    pub fn with_logic(mut self, logic: RuleLogic) -> Self {
        self.logic = logic;
        self
    }
}

/// Evaluates a profile against an ordered rule sequence.
///
/// Evaluation is strictly sequential and left-associative; there is no
/// operator precedence. The accumulator starts from the first clause's
/// comparison (its combinator is ignored), and each subsequent clause
/// is folded in using the combinator carried by the *previous* rule.
///
/// Fails closed: an empty rule list does not match. A clause whose
/// profile field is unavailable evaluates to false instead of aborting
/// the whole evaluation.
///
/// Pure: no side effects, identical results for identical inputs.
pub fn evaluate(profile: &ActivityProfile, rules: &[SegmentRule], now: DateTime<Utc>) -> bool {
    let Some((first, rest)) = rules.split_first() else {
        return false;
    };

    let mut result = clause(profile, first, now);
    let mut combinator = first.logic;

    for rule in rest {
        let outcome = clause(profile, rule, now);
        result = match combinator {
            RuleLogic::And => result && outcome,
            RuleLogic::Or => result || outcome,
        };
        combinator = rule.logic;
    }

    result
}

/// Evaluates a single clause. Thresholds compare exactly; no epsilon.
fn clause(profile: &ActivityProfile, rule: &SegmentRule, now: DateTime<Utc>) -> bool {
    let Some(value) = profile.field_value(rule.field, now) else {
        return false;
    };

    match rule.operator {
        RuleOperator::GreaterThan => value > rule.value,
        RuleOperator::LessThan => value < rule.value,
        RuleOperator::EqualTo => value == rule.value,
        RuleOperator::GreaterEqual => value >= rule.value,
        RuleOperator::LessEqual => value <= rule.value,
    }
}
