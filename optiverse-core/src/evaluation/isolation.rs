#[cfg(test)]
#[path = "../../tests/unit/evaluation/isolation_test.rs"]
mod isolation_test;

use super::*;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;

/// A shared evaluator handle.
pub type SharedEvaluator = Arc<dyn Evaluator + Send + Sync>;

/// Runs evaluator on its own worker thread and waits for the result no longer than the budget.
///
/// A worker which runs out of time is abandoned: its late result is dropped. A panic inside the
/// evaluator is reported as [`EvaluationError::Crashed`]. A score which is not a finite number is
/// reported as [`EvaluationError::Malformed`].
pub fn evaluate_isolated(
    evaluator: &SharedEvaluator,
    source: &str,
    budget: &TimeBudget,
) -> Result<Evaluation, EvaluationError> {
    let limit = budget.limit().unwrap_or_default();

    if budget.is_exhausted() {
        return Err(EvaluationError::Timeout(limit));
    }

    let (sender, receiver) = mpsc::channel();

    let spawned = thread::Builder::new().name("optiverse-evaluator".to_string()).spawn({
        let evaluator = evaluator.clone();
        let source = source.to_string();
        let budget = budget.clone();
        move || {
            let result = evaluator.evaluate(source.as_str(), &budget);
            // NOTE receiver is gone when the worker is abandoned
            let _ = sender.send(result);
        }
    });

    if let Err(err) = spawned {
        return Err(EvaluationError::Failed(format!("cannot start evaluation worker: {err}")));
    }

    let received = match budget.remaining() {
        Some(remaining) => receiver.recv_timeout(remaining),
        None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
    };

    let evaluation = match received {
        Ok(result) => result?,
        Err(RecvTimeoutError::Timeout) => return Err(EvaluationError::Timeout(limit)),
        Err(RecvTimeoutError::Disconnected) => {
            return Err(EvaluationError::Crashed("evaluation worker stopped without result".to_string()));
        }
    };

    if budget.is_exhausted() {
        return Err(EvaluationError::Timeout(limit));
    }

    match evaluation {
        Evaluation::Scored { score, .. } if !score.is_finite() => {
            Err(EvaluationError::Malformed(format!("score is not a finite number: {score}")))
        }
        evaluation => Ok(evaluation),
    }
}
