use crate::evaluation::{Evaluation, EvaluationError, Evaluator, TimeBudget};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// An evaluator which looks up a score by candidate source.
pub struct TableEvaluator {
    scores: HashMap<String, TableEntry>,
    calls: Mutex<Vec<String>>,
}

/// A scripted evaluation behavior.
#[derive(Clone)]
pub enum TableEntry {
    Score(f64),
    Invalid(&'static str),
    Sleep(Duration, f64),
}

impl TableEvaluator {
    pub fn new(entries: Vec<(&str, TableEntry)>) -> Self {
        Self {
            scores: entries.into_iter().map(|(source, entry)| (source.to_string(), entry)).collect(),
            calls: Mutex::default(),
        }
    }

    pub fn with_scores(scores: &[(&str, f64)]) -> Self {
        Self::new(scores.iter().map(|(source, score)| (*source, TableEntry::Score(*score))).collect())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Evaluator for TableEvaluator {
    fn evaluate(&self, source: &str, _: &TimeBudget) -> Result<Evaluation, EvaluationError> {
        self.calls.lock().unwrap().push(source.to_string());

        match self.scores.get(source) {
            Some(TableEntry::Score(score)) => Ok(Evaluation::scored(*score)),
            Some(TableEntry::Invalid(reason)) => Ok(Evaluation::invalid(*reason)),
            Some(TableEntry::Sleep(duration, score)) => {
                std::thread::sleep(*duration);
                Ok(Evaluation::scored(*score))
            }
            None => Err(EvaluationError::Failed(format!("unknown source: '{source}'"))),
        }
    }
}
