//! Specifies the contract of a pluggable evaluator and the isolation the optimizer wraps it in.

mod isolation;
pub use self::isolation::*;

use crate::models::{Artifacts, CandidateOutcome, Metrics};
use crate::utils::Float;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// A time given to evaluate one candidate. Evaluator (and, transitively, candidate code) can query
/// remaining time to limit itself; the value only goes down.
#[derive(Clone, Debug)]
pub struct TimeBudget {
    limit: Option<Duration>,
    expires_at: Option<Instant>,
}

impl TimeBudget {
    /// Creates a budget which expires after `limit` from now.
    pub fn new(limit: Option<Duration>) -> Self {
        Self { limit, expires_at: limit.and_then(|limit| Instant::now().checked_add(limit)) }
    }

    /// Creates a budget without a limit.
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Returns the initial limit of the budget.
    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    /// Returns remaining time or `None` when budget is not limited.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at.map(|expires_at| expires_at.saturating_duration_since(Instant::now()))
    }

    /// Returns true when no time is left.
    pub fn is_exhausted(&self) -> bool {
        self.remaining().is_some_and(|remaining| remaining.is_zero())
    }
}

/// A result of a finished evaluation.
#[derive(Clone, Debug, PartialEq)]
pub enum Evaluation {
    /// Candidate produced a valid result.
    Scored {
        /// A score of the candidate.
        score: Float,
        /// Additional metrics, e.g. stats of repeated runs.
        metrics: Metrics,
        /// Outputs worth keeping with the candidate, e.g. captured stdout of every run.
        artifacts: Artifacts,
    },
    /// Candidate ran, but its result violates problem constraints or it has not finished in time.
    Invalid {
        /// A human readable reason.
        reason: String,
        /// Outputs worth keeping with the candidate.
        artifacts: Artifacts,
    },
}

impl Evaluation {
    /// Creates a scored evaluation without metrics and artifacts.
    pub fn scored(score: Float) -> Self {
        Self::Scored { score, metrics: Metrics::default(), artifacts: Artifacts::default() }
    }

    /// Creates an invalid evaluation without artifacts.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid { reason: reason.into(), artifacts: Artifacts::default() }
    }

    /// Replaces artifacts of the evaluation.
    pub fn with_artifacts(self, artifacts: Artifacts) -> Self {
        match self {
            Self::Scored { score, metrics, .. } => Self::Scored { score, metrics, artifacts },
            Self::Invalid { reason, .. } => Self::Invalid { reason, artifacts },
        }
    }
}

/// An error which happens while evaluating candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvaluationError {
    /// Evaluator failed to do its job.
    Failed(String),
    /// Evaluator returned something which cannot be used as a result.
    Malformed(String),
    /// Evaluator panicked or its worker stopped without a result.
    Crashed(String),
    /// Evaluation has not finished within its budget.
    Timeout(Duration),
}

impl Display for EvaluationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationError::Failed(msg) => write!(f, "evaluation failed: {msg}"),
            EvaluationError::Malformed(msg) => write!(f, "malformed evaluation result: {msg}"),
            EvaluationError::Crashed(msg) => write!(f, "evaluator crashed: {msg}"),
            EvaluationError::Timeout(budget) => write!(f, "evaluation exceeded its budget of {}ms", budget.as_millis()),
        }
    }
}

impl std::error::Error for EvaluationError {}

/// A problem specific scorer of candidates.
pub trait Evaluator {
    /// Evaluates candidate source honoring given time budget. A candidate which does not finish or
    /// produces a structurally invalid result is reported as [`Evaluation::Invalid`], not as error.
    fn evaluate(&self, source: &str, budget: &TimeBudget) -> Result<Evaluation, EvaluationError>;
}

impl<F> Evaluator for F
where
    F: Fn(&str, &TimeBudget) -> Result<Evaluation, EvaluationError>,
{
    fn evaluate(&self, source: &str, budget: &TimeBudget) -> Result<Evaluation, EvaluationError> {
        (self)(source, budget)
    }
}

/// Maps evaluation result to candidate outcome: every error makes candidate invalid.
pub fn to_outcome(result: Result<Evaluation, EvaluationError>) -> CandidateOutcome {
    match result {
        Ok(Evaluation::Scored { score, metrics, artifacts }) => CandidateOutcome::Evaluated { score, metrics, artifacts },
        Ok(Evaluation::Invalid { reason, artifacts }) => CandidateOutcome::Invalid { reason, artifacts },
        Err(err) => CandidateOutcome::Invalid { reason: err.to_string(), artifacts: Artifacts::default() },
    }
}
