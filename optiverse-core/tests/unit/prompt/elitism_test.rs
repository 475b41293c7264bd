use super::*;
use crate::helpers::models::*;

#[test]
fn can_use_best_candidate_as_parent() {
    let problem = test_problem();
    let state = create_state(vec![evaluated(1, 0, 100.), evaluated(2, 1, 80.), evaluated(3, 1, 95.)]);

    let prompt = ElitismPromptGenerator::default().generate(&problem, &state);

    assert_eq!(prompt.parent_id, Some(2));
    assert_eq!(prompt.group, 0);
    assert!(prompt.text.contains("## Parent solution\n\nScore: 80.000000"));
    assert!(!prompt.text.contains("Best solution so far"));
}

#[test]
fn can_use_initial_candidate_when_nothing_is_evaluated() {
    let problem = test_problem();
    let state = create_state(vec![invalid(1, 0), failed(2, 1)]);

    let prompt = ElitismPromptGenerator::default().generate(&problem, &state);

    assert_eq!(prompt.parent_id, Some(1));
    assert!(prompt.text.contains("Score: not available"));
}

#[test]
fn can_use_problem_source_for_empty_state() {
    let problem = test_problem();
    let state = create_state(vec![]);

    let prompt = ElitismPromptGenerator::default().generate(&problem, &state);

    assert_eq!(prompt.parent_id, None);
    assert!(prompt.text.contains("```\nprint(100)\n```"));
}

#[test]
fn can_limit_inspirations() {
    let problem = test_problem();
    let state = create_state((1..=10).map(|id| evaluated(id, id as usize, 100. - id as f64)).collect());

    let prompt = ElitismPromptGenerator::new(2).generate(&problem, &state);

    assert_eq!(prompt.parent_id, Some(10));
    assert_eq!(prompt.text.matches("(for inspiration)").count(), 2);
}

#[test]
fn can_generate_same_prompt_for_same_state() {
    let problem = test_problem();
    let state = create_state((1..=10).map(|id| evaluated(id, id as usize, id as f64)).collect());
    let generator = ElitismPromptGenerator::default();

    assert_eq!(generator.generate(&problem, &state), generator.generate(&problem, &state));
}
