#[cfg(test)]
#[path = "../../tests/unit/prompt/elitism_test.rs"]
mod elitism_test;

use super::*;
use crate::utils::{Random, SeededRandom};

/// A prompt generator which always anchors on the current best candidate and adds a few other
/// evaluated candidates sampled from history to keep some diversity.
pub struct ElitismPromptGenerator {
    inspirations: usize,
}

impl ElitismPromptGenerator {
    /// Creates a new instance of `ElitismPromptGenerator` with max amount of inspiration candidates.
    pub fn new(inspirations: usize) -> Self {
        Self { inspirations }
    }
}

impl Default for ElitismPromptGenerator {
    fn default() -> Self {
        Self::new(3)
    }
}

impl PromptGenerator for ElitismPromptGenerator {
    fn generate(&self, problem: &Problem, state: &EvolutionState) -> Prompt {
        let parent = state.best().or_else(|| state.initial());
        let parent_id = parent.map(|parent| parent.id());

        let mut sections = vec![match parent {
            Some(parent) => Section::from_candidate("Parent solution", parent),
            None => Section::from_problem("Parent solution", problem),
        }];

        let others = state.evaluated().filter(|candidate| Some(candidate.id()) != parent_id).collect::<Vec<_>>();
        let random = SeededRandom::new(seed_from_state(state));

        random
            .sample_indices(others.len(), self.inspirations)
            .into_iter()
            .filter_map(|idx| others.get(idx))
            .enumerate()
            .for_each(|(idx, candidate)| {
                sections.push(Section::from_candidate(format!("Solution {} (for inspiration)", idx + 1), candidate))
            });

        let task = if sections.len() > 1 {
            "Improve the parent solution. Other solutions are given for inspiration only: borrow ideas from them \
             when they help."
        } else {
            "Improve the parent solution."
        };

        Prompt { text: render(problem, state, sections.as_slice(), task), parent_id, group: 0 }
    }
}
