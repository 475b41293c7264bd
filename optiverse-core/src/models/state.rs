#[cfg(test)]
#[path = "../../tests/unit/models/state_test.rs"]
mod state_test;

use crate::models::{Candidate, CandidateId, Direction, Generation};
use crate::utils::Timer;
use std::time::Duration;

/// An evolution state of the run: the whole candidate history, generations, the running best
/// and the iteration counter.
///
/// The state is owned by the optimizer and is passed explicitly to collaborators which need it.
/// The best candidate is kept as a position in history, so it always refers to the very same
/// record which was persisted.
#[derive(Clone, Debug)]
pub struct EvolutionState {
    direction: Direction,
    history: Vec<Candidate>,
    generations: Vec<Generation>,
    best: Option<usize>,
    iteration: usize,
    timer: Timer,
}

impl EvolutionState {
    /// Creates a new empty state.
    pub fn new(direction: Direction) -> Self {
        Self { direction, history: vec![], generations: vec![], best: None, iteration: 0, timer: Timer::start() }
    }

    /// Returns optimization direction used to compare candidates.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns all recorded candidates in the order of their ids.
    pub fn history(&self) -> &[Candidate] {
        self.history.as_slice()
    }

    /// Returns evaluated candidates.
    pub fn evaluated(&self) -> impl Iterator<Item = &Candidate> + '_ {
        self.history.iter().filter(|candidate| candidate.is_evaluated())
    }

    /// Returns recorded generations.
    pub fn generations(&self) -> &[Generation] {
        self.generations.as_slice()
    }

    /// Returns the best candidate, if any.
    pub fn best(&self) -> Option<&Candidate> {
        self.best.and_then(|idx| self.history.get(idx))
    }

    /// Returns candidate by its id.
    pub fn get(&self, id: CandidateId) -> Option<&Candidate> {
        self.history.binary_search_by_key(&id, |candidate| candidate.id()).ok().and_then(|idx| self.history.get(idx))
    }

    /// Returns the initial candidate, if it is recorded.
    pub fn initial(&self) -> Option<&Candidate> {
        self.history.first()
    }

    /// Returns amount of oracle requests issued so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Returns time elapsed since this state was created or restored.
    pub fn elapsed(&self) -> Duration {
        self.timer.elapsed()
    }

    /// Returns an id which the next recorded candidate gets.
    pub fn next_id(&self) -> CandidateId {
        self.history.last().map_or(1, |candidate| candidate.id() + 1)
    }

    /// Returns an index of the next generation. Candidates of a round which was interrupted before
    /// its generation record was written still occupy their generation index.
    pub fn next_generation(&self) -> usize {
        let after_generations = self.generations.last().map_or(0, |generation| generation.index + 1);
        let after_candidates = self.history.last().map_or(0, |candidate| candidate.generation() + 1);

        after_generations.max(after_candidates)
    }

    /// Increments iteration counter and returns its new value.
    pub fn advance_iteration(&mut self) -> usize {
        self.iteration += 1;
        self.iteration
    }

    /// Sets iteration counter, used when state is restored. The counter never goes back.
    pub(crate) fn restore_iteration(&mut self, iteration: usize) {
        self.iteration = self.iteration.max(iteration);
    }

    /// Returns true if the candidate would replace the current best one.
    pub fn is_improvement(&self, candidate: &Candidate) -> bool {
        if !candidate.is_evaluated() {
            return false;
        }

        match (candidate.score(), self.best().and_then(|best| best.score())) {
            (Some(score), Some(best_score)) => self.direction.is_better(score, best_score),
            (Some(_), None) => true,
            _ => false,
        }
    }

    /// Appends a candidate to history and returns true if it became the new best.
    ///
    /// The comparison is made against the best known at the moment of the call, so only a
    /// strictly better candidate can replace it and ties keep the older one.
    pub fn push(&mut self, candidate: Candidate) -> bool {
        debug_assert!(candidate.id() >= self.next_id(), "candidate ids must grow");

        let is_improvement = self.is_improvement(&candidate);
        self.history.push(candidate);

        if is_improvement {
            self.best = Some(self.history.len() - 1);
        }

        is_improvement
    }

    /// Appends a generation record.
    pub fn push_generation(&mut self, generation: Generation) {
        self.restore_iteration(generation.iteration);
        self.generations.push(generation);
    }
}
