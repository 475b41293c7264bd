use crate::models::Candidate;
use std::sync::Arc;

/// An output port which is called synchronously every time a new best candidate is accepted.
///
/// Calls are never batched: every call supersedes the previous one, so the last call made before
/// the run ends holds the final answer.
pub trait ImprovementReporter {
    /// Called with the new best candidate.
    fn on_improvement(&self, candidate: &Candidate);
}

impl<F> ImprovementReporter for F
where
    F: Fn(&Candidate),
{
    fn on_improvement(&self, candidate: &Candidate) {
        (self)(candidate)
    }
}

/// A shared report hook handle.
pub type SharedReporter = Arc<dyn ImprovementReporter + Send + Sync>;
