use crate::utils::{Float, compare_floats};
use serde::Deserialize;
use std::cmp::Ordering;

/// Specifies optimization direction of a score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// Lower score is better.
    #[default]
    Minimize,
    /// Higher score is better.
    Maximize,
}

impl Direction {
    /// Orders scores so that the better one comes first.
    pub fn total_order(&self, a: Float, b: Float) -> Ordering {
        match self {
            Direction::Minimize => compare_floats(a, b),
            Direction::Maximize => compare_floats(b, a),
        }
    }

    /// Returns true if `candidate` score is strictly better than `current` one.
    pub fn is_better(&self, candidate: Float, current: Float) -> bool {
        candidate.is_finite() && self.total_order(candidate, current) == Ordering::Less
    }
}

/// An optimization problem: what to optimize and where to start from.
#[derive(Clone, Debug)]
pub struct Problem {
    description: String,
    initial_source: String,
    direction: Direction,
}

impl Problem {
    /// Creates a new minimization problem.
    pub fn new(description: impl Into<String>, initial_source: impl Into<String>) -> Self {
        Self { description: description.into(), initial_source: initial_source.into(), direction: Direction::Minimize }
    }

    /// Sets optimization direction. Default is minimization.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Returns the objective description given to the oracle.
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the initial candidate source.
    pub fn initial_source(&self) -> &str {
        self.initial_source.as_str()
    }

    /// Returns optimization direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }
}
