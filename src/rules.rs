//! Rule evaluation over tracked torrents.
//!
//! The rule language itself lives elsewhere; here a rule is any
//! [`Predicate`] that maps a torrent plus its [`TorrentFacts`] to a
//! [`Value`].

use crate::error::TidyError;
use crate::identity::IdentityResolver;
use crate::index::{TorrentFacts, TorrentRegistry};
use crate::types::Torrent;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
}

impl Value {
    fn type_name(self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
        }
    }

    pub fn as_bool(self) -> Result<bool, EvaluationError> {
        match self {
            Value::Bool(b) => Ok(b),
            other => Err(EvaluationError::TypeMismatch {
                expected: "bool",
                found: other.type_name(),
            }),
        }
    }

    pub fn as_number(self) -> Result<f64, EvaluationError> {
        match self {
            Value::Number(n) => Ok(n),
            other => Err(EvaluationError::TypeMismatch {
                expected: "number",
                found: other.type_name(),
            }),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0}")]
    Failed(String),
}

impl From<EvaluationError> for TidyError {
    fn from(e: EvaluationError) -> Self {
        TidyError::Evaluation(e.to_string())
    }
}

/// Input handed to a predicate.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub torrent: &'a Torrent,
    pub facts: TorrentFacts,
}

pub trait Predicate: Send + Sync {
    fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Value, EvaluationError>;
}

impl<F> Predicate for F
where
    F: Fn(&EvalContext<'_>) -> Result<Value, EvaluationError> + Send + Sync,
{
    fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Value, EvaluationError> {
        self(ctx)
    }
}

/// Result of [`plan_removals`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RemovalPlan {
    /// Hashes selected for removal, in evaluation order
    pub remove: Vec<String>,
    /// Hashes whose rule evaluation failed, with the reason
    pub errors: Vec<(String, String)>,
}

/// Evaluates `predicate` against every torrent in hash order.
///
/// A matching torrent is forgotten by the registry before the next one is
/// evaluated, so facts such as uniqueness reflect earlier removals. A
/// failed evaluation keeps the torrent and is recorded in the plan.
pub fn plan_removals<R: IdentityResolver>(
    registry: &TorrentRegistry<R>,
    torrents: &[Torrent],
    predicate: &dyn Predicate,
) -> RemovalPlan {
    let mut ordered: Vec<&Torrent> = torrents.iter().collect();
    ordered.sort_by(|a, b| a.hash.cmp(&b.hash));

    let mut plan = RemovalPlan::default();
    for torrent in ordered {
        let ctx = EvalContext {
            torrent,
            facts: registry.facts(torrent),
        };
        match predicate.evaluate(&ctx).and_then(Value::as_bool) {
            Ok(true) => {
                registry.forget(torrent);
                info!(hash = %torrent.hash, name = %torrent.name, "Torrent matched removal rule");
                plan.remove.push(torrent.hash.clone());
            }
            Ok(false) => {
                debug!(hash = %torrent.hash, "Torrent kept");
            }
            Err(e) => {
                warn!(hash = %torrent.hash, error = %e, "Failed evaluating rule");
                plan.errors.push((torrent.hash.clone(), e.to_string()));
            }
        }
    }
    plan
}
