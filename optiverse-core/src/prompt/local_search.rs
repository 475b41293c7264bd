#[cfg(test)]
#[path = "../../tests/unit/prompt/local_search_test.rs"]
mod local_search_test;

use super::*;
use crate::utils::{GenericResult, Random, SeededRandom};
use rustc_hash::FxHashMap;

/// A way to leave the current search group once it stagnates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Perturbation {
    /// Start over from the initial candidate, ignoring everything found so far.
    Restart,
    /// Combine the strongest features of the best candidates from different groups.
    Exploit,
    /// Look for an approach which differs from the best candidates of different groups.
    Explore,
}

impl Perturbation {
    fn task(&self, parents: usize) -> String {
        match self {
            Perturbation::Restart => "Write a fresh solution for this problem from scratch, independent of the solutions \
                 above. Build it from the problem requirements and constraints and from what is known about solving \
                 similar problems."
                .to_string(),
            Perturbation::Exploit => format!(
                "Analyse the {parents} solution(s) above and find what makes each of them effective. Build one \
                 improved solution which combines their complementary strengths into a consistent whole and is \
                 better than any of them alone."
            ),
            Perturbation::Explore => format!(
                "Propose a solution which follows a different strategy than the {parents} solution(s) above. Recall \
                 algorithms, heuristics and data structures known for this or related problems, including ideas from \
                 other domains, and pick one which has not been tried yet."
            ),
        }
    }
}

const LOCAL_SEARCH_TASK: &str = "Apply focused local improvements to the parent solution to make it score better.";

const MAX_PERTURBATION_PARENTS: usize = 3;

/// A prompt generator which runs iterated local search: it keeps improving the best candidate of
/// the current search group and, once the group stagnates, opens a new group with a perturbation.
///
/// Search groups are stored on candidates, so the strategy position is derived from the history
/// and survives resume without any extra state.
pub struct IteratedLocalSearch {
    max_iterations_without_improvement: usize,
    perturbations: Vec<(Perturbation, f64)>,
}

impl IteratedLocalSearch {
    /// Creates a new instance of `IteratedLocalSearch` with default perturbation weights.
    pub fn new(max_iterations_without_improvement: usize) -> Self {
        Self {
            max_iterations_without_improvement,
            perturbations: vec![(Perturbation::Restart, 0.1), (Perturbation::Exploit, 0.1), (Perturbation::Explore, 0.8)],
        }
    }

    /// Sets perturbation weights. Weights are normalized, their sum must be positive.
    pub fn with_perturbations(mut self, perturbations: Vec<(Perturbation, f64)>) -> GenericResult<Self> {
        let total = perturbations.iter().map(|(_, weight)| weight.max(0.)).sum::<f64>();
        if !(total > 0.) {
            return Err("total weight of perturbations must be positive".into());
        }

        self.perturbations =
            perturbations.into_iter().map(|(perturbation, weight)| (perturbation, weight.max(0.) / total)).collect();

        Ok(self)
    }

    fn improve(&self, problem: &Problem, state: &EvolutionState, group: usize, best: Option<&Candidate>) -> Prompt {
        match best {
            Some(parent) => Prompt {
                text: render(problem, state, &[Section::from_candidate("Parent solution", parent)], LOCAL_SEARCH_TASK),
                parent_id: Some(parent.id()),
                group,
            },
            None => self.restart(problem, state, group),
        }
    }

    fn perturb(&self, problem: &Problem, state: &EvolutionState, group: usize, random: &SeededRandom) -> Prompt {
        let weights = self.perturbations.iter().map(|(_, weight)| *weight).collect::<Vec<_>>();
        let perturbation =
            self.perturbations.get(random.weighted(weights.as_slice())).map_or(Perturbation::Restart, |(p, _)| *p);

        if perturbation == Perturbation::Restart {
            return self.restart(problem, state, group);
        }

        let parents = select_best_from_groups(state, random, MAX_PERTURBATION_PARENTS);
        if parents.is_empty() {
            return self.restart(problem, state, group);
        }

        let sections = parents
            .iter()
            .enumerate()
            .map(|(idx, candidate)| Section::from_candidate(format!("Solution {}", idx + 1), candidate))
            .collect::<Vec<_>>();

        Prompt {
            text: render(problem, state, sections.as_slice(), perturbation.task(parents.len()).as_str()),
            parent_id: parents.first().map(|parent| parent.id()),
            group,
        }
    }

    fn restart(&self, problem: &Problem, state: &EvolutionState, group: usize) -> Prompt {
        let initial = state.initial();
        let section = match initial {
            Some(initial) => Section::from_candidate("Initial solution", initial),
            None => Section::from_problem("Initial solution", problem),
        };

        Prompt {
            text: render(problem, state, &[section], Perturbation::Restart.task(1).as_str()),
            parent_id: initial.map(|initial| initial.id()),
            group,
        }
    }
}

impl PromptGenerator for IteratedLocalSearch {
    fn generate(&self, problem: &Problem, state: &EvolutionState) -> Prompt {
        let group = state.history().iter().map(|candidate| candidate.group()).max().unwrap_or(0);
        let (best, stagnation) = group_progress(state, group);

        if stagnation < self.max_iterations_without_improvement {
            self.improve(problem, state, group, best)
        } else {
            let random = SeededRandom::new(seed_from_state(state));
            self.perturb(problem, state, group + 1, &random)
        }
    }
}

/// Returns the best candidate of the group and amount of candidates produced after the last
/// improvement within the group.
fn group_progress(state: &EvolutionState, group: usize) -> (Option<&Candidate>, usize) {
    let direction = state.direction();

    state.history().iter().filter(|candidate| candidate.group() == group).fold(
        (None, 0),
        |(best, stagnation): (Option<&Candidate>, usize), candidate| {
            let is_improvement = match (candidate.is_evaluated(), candidate.score(), best.and_then(|b| b.score())) {
                (true, Some(score), Some(best_score)) => direction.is_better(score, best_score),
                (true, Some(_), None) => true,
                _ => false,
            };

            if is_improvement { (Some(candidate), 0) } else { (best, stagnation + 1) }
        },
    )
}

/// Picks the best evaluated candidate of each group and returns a random subset of them.
fn select_best_from_groups<'a>(state: &'a EvolutionState, random: &SeededRandom, amount: usize) -> Vec<&'a Candidate> {
    let direction = state.direction();

    let best_by_group = state.evaluated().fold(FxHashMap::<usize, &Candidate>::default(), |mut acc, candidate| {
        let is_better = acc.get(&candidate.group()).is_none_or(|current| match (candidate.score(), current.score()) {
            (Some(score), Some(current)) => direction.is_better(score, current),
            _ => false,
        });

        if is_better {
            acc.insert(candidate.group(), candidate);
        }

        acc
    });

    let mut best = best_by_group.into_values().collect::<Vec<_>>();
    best.sort_by_key(|candidate| candidate.id());

    random.sample_indices(best.len(), amount).into_iter().filter_map(|idx| best.get(idx).copied()).collect()
}
