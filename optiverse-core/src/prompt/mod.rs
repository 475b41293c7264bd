//! Builds prompts which ask the oracle for an improved candidate.
//!
//! Generators are stateless: everything they need comes from the problem and the evolution state,
//! and the random choices they make are seeded from the state, so the same state always yields the
//! same prompt.

#[cfg(test)]
#[path = "../../tests/unit/prompt/render_test.rs"]
mod render_test;

mod elitism;
pub use self::elitism::ElitismPromptGenerator;

mod local_search;
pub use self::local_search::{IteratedLocalSearch, Perturbation};

use crate::extraction::fence_for;
use crate::models::{Candidate, CandidateId, EvolutionState, Problem};
use crate::utils::Float;
use std::fmt::Write;

/// A prompt with lineage information of the candidate it is going to produce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    /// Prompt text sent to oracle.
    pub text: String,
    /// A candidate the produced one is derived from.
    pub parent_id: Option<CandidateId>,
    /// A search group the produced candidate belongs to.
    pub group: usize,
}

/// Builds a prompt from the problem and the current evolution state.
pub trait PromptGenerator {
    /// Generates a prompt. Must include the problem description, the current best candidate with
    /// its score and the response format instructions.
    fn generate(&self, problem: &Problem, state: &EvolutionState) -> Prompt;
}

/// Response format instructions appended to every prompt. They define the convention used to
/// extract a candidate back from the reply.
pub const RESPONSE_FORMAT: &str = r#"# Response

Reply with two parts, in this order:

1. A short plain-text description of your solution as a bullet list. Do not use headings and do not assume the reader has seen previous solutions.
2. The complete solution inside a single fenced code block. Do not put any other fenced block in the reply.
   If the solution itself contains a run of backticks, use a fence with more backticks than that run.

Example:

- What the solution does
- Why it should score better

```
complete solution text
```
"#;

/// A candidate shown in the prompt.
pub(crate) struct Section<'a> {
    title: String,
    id: Option<CandidateId>,
    source: &'a str,
    score: Option<Float>,
    description: Option<&'a str>,
}

impl<'a> Section<'a> {
    /// Creates a section from recorded candidate.
    pub fn from_candidate(title: impl Into<String>, candidate: &'a Candidate) -> Self {
        Self {
            title: title.into(),
            id: Some(candidate.id()),
            source: candidate.source(),
            score: candidate.score(),
            description: candidate.description(),
        }
    }

    /// Creates a section from the initial source of the problem, used before anything is recorded.
    pub fn from_problem(title: impl Into<String>, problem: &'a Problem) -> Self {
        Self { title: title.into(), id: None, source: problem.initial_source(), score: None, description: None }
    }
}

/// Seeds random choices of a generator from the state.
pub(crate) fn seed_from_state(state: &EvolutionState) -> u64 {
    ((state.iteration() as u64) << 32) ^ (state.history().len() as u64) ^ 0x5EED_0F_0A7E
}

/// Renders the prompt text. The best candidate is always shown: either as one of the sections or
/// in its own section placed first.
pub(crate) fn render(problem: &Problem, state: &EvolutionState, sections: &[Section<'_>], task: &str) -> String {
    let mut text = String::new();

    let _ = write!(text, "# Problem description\n\n{}\n\n", problem.description().trim());

    text.push_str("# Solutions\n\n");

    if let Some(best) = state.best() {
        let is_best_shown = sections.iter().any(|section| section.id == Some(best.id()));
        if !is_best_shown {
            write_section(&mut text, &Section::from_candidate("Best solution so far", best));
        }
    }

    sections.iter().for_each(|section| write_section(&mut text, section));

    let _ = write!(text, "# Task\n\n{}\n\n", task.trim());

    text.push_str(RESPONSE_FORMAT);

    text
}

fn write_section(text: &mut String, section: &Section<'_>) {
    let _ = write!(text, "## {}\n\n", section.title);

    match section.score {
        Some(score) => {
            let _ = write!(text, "Score: {score:.6}\n\n");
        }
        None => text.push_str("Score: not available\n\n"),
    }

    if let Some(description) = section.description {
        let _ = write!(text, "### Description\n\n{}\n\n", description.trim());
    }

    let source = section.source.trim_end();
    let fence = fence_for(source);
    let _ = write!(text, "### Code\n\n{fence}\n{source}\n{fence}\n\n");
}
