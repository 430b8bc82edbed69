//! Evaluation state
//!
//! A cached member is in exactly one of three states. The value and the
//! fault live inside the variants, so a faulted entry cannot also hold a
//! value and an unevaluated one holds neither.
//!
//! ```text
//! NotEvaluated ──evaluate──▶ Evaluated ◀──evaluate──▶ Faulted
//!       ▲                        │                       │
//!       └──────── invalidate ────┴───────────────────────┘
//! ```

use spyglass_sdk::Value;

use crate::error::EvalFault;

/// Evaluation state of a cache entry
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EvalState {
    /// Never evaluated, or invalidated since
    #[default]
    NotEvaluated,
    /// Last evaluation produced a value
    Evaluated(Value),
    /// Last evaluation raised a fault
    Faulted(EvalFault),
}

impl EvalState {
    /// State after an evaluation attempt
    pub fn settle(result: Result<Value, EvalFault>) -> Self {
        match result {
            Ok(value) => EvalState::Evaluated(value),
            Err(fault) => EvalState::Faulted(fault),
        }
    }

    /// Last value, if evaluated
    pub fn value(&self) -> Option<&Value> {
        match self {
            EvalState::Evaluated(value) => Some(value),
            _ => None,
        }
    }

    /// Last fault, if faulted
    pub fn fault(&self) -> Option<&EvalFault> {
        match self {
            EvalState::Faulted(fault) => Some(fault),
            _ => None,
        }
    }

    /// Whether no evaluation result is held
    pub fn is_not_evaluated(&self) -> bool {
        matches!(self, EvalState::NotEvaluated)
    }

    /// Whether the last evaluation succeeded
    pub fn is_evaluated(&self) -> bool {
        matches!(self, EvalState::Evaluated(_))
    }

    /// Whether the last evaluation faulted
    pub fn is_faulted(&self) -> bool {
        matches!(self, EvalState::Faulted(_))
    }
}
