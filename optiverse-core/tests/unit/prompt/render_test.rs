use super::*;
use crate::helpers::models::*;
use crate::extraction::extract;
use crate::models::{CandidateOutcome, Direction, PendingCandidate};

#[test]
fn can_render_problem_best_and_response_format() {
    let problem = test_problem();
    let state = create_state(vec![evaluated(1, 0, 100.), evaluated(2, 1, 80.)]);

    let text = render(&problem, &state, &[], "Improve it.");

    assert!(text.starts_with("# Problem description\n\nFind a program which prints the smallest number."));
    assert!(text.contains("## Best solution so far\n\nScore: 80.000000"));
    assert!(text.contains("```\nprint(2)\n```"));
    assert!(text.contains("# Task\n\nImprove it."));
    assert!(text.ends_with(RESPONSE_FORMAT));
}

#[test]
fn can_skip_best_section_when_best_is_shown() {
    let problem = test_problem();
    let state = create_state(vec![evaluated(1, 0, 100.)]);
    let best = state.best().unwrap();

    let text = render(&problem, &state, &[Section::from_candidate("Parent solution", best)], "Improve it.");

    assert!(!text.contains("Best solution so far"));
    assert_eq!(text.matches("Score: 100.000000").count(), 1);
}

#[test]
fn can_render_problem_source_without_score() {
    let problem = test_problem().with_direction(Direction::Maximize);
    let state = EvolutionState::new(Direction::Maximize);

    let text = render(&problem, &state, &[Section::from_problem("Initial solution", &problem)], "Start.");

    assert!(text.contains("## Initial solution\n\nScore: not available"));
    assert!(text.contains("```\nprint(100)\n```"));
}

#[test]
fn can_render_description() {
    let problem = test_problem();
    let candidate = PendingCandidate::new(1, "print(1)".to_string(), Some(1))
        .with_description(Some("- prints one".to_string()))
        .resolve(2, CandidateOutcome::Evaluated { score: 1., metrics: Default::default(), artifacts: Default::default() });
    let state = create_state(vec![evaluated(1, 0, 100.), candidate]);

    let text = render(&problem, &state, &[], "Improve it.");

    assert!(text.contains("### Description\n\n- prints one"));
}

#[test]
fn can_seed_differently_after_iteration_advance() {
    let mut state = create_state(vec![evaluated(1, 0, 100.)]);
    let before = seed_from_state(&state);

    state.advance_iteration();

    assert_ne!(before, seed_from_state(&state));
}

#[test]
fn can_render_source_with_inner_fence_so_it_is_extracted_whole() {
    let problem = Problem::new("Print a markdown code block.", "print(\"```\")\nprint(\"```\")");
    let state = EvolutionState::new(Direction::Minimize);

    let text = render(&problem, &state, &[Section::from_problem("Parent solution", &problem)], "Improve it.");

    assert!(text.contains("````\nprint(\"```\")\nprint(\"```\")\n````"));
    let code = text.split("### Code\n\n").nth(1).unwrap();
    assert_eq!(extract(code).unwrap().source, problem.initial_source());
}
