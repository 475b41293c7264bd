use super::*;
use crate::helpers::models::*;

#[test]
fn can_improve_group_best_while_progressing() {
    let problem = test_problem();
    let state = create_state(vec![evaluated(1, 0, 100.), evaluated(2, 1, 80.), evaluated(3, 1, 90.)]);

    let prompt = IteratedLocalSearch::new(3).generate(&problem, &state);

    assert_eq!(prompt.parent_id, Some(2));
    assert_eq!(prompt.group, 0);
    assert!(prompt.text.contains(LOCAL_SEARCH_TASK));
}

#[test]
fn can_perturb_stagnated_group() {
    let problem = test_problem();
    let state = create_state(vec![evaluated(1, 0, 100.), evaluated(2, 1, 110.), failed(3, 1), evaluated(4, 2, 100.)]);

    let prompt = IteratedLocalSearch::new(3).generate(&problem, &state);

    assert_eq!(prompt.group, 1);
    assert!(!prompt.text.contains(LOCAL_SEARCH_TASK));
}

#[test]
fn can_continue_latest_group() {
    let problem = test_problem();
    let state = create_state(vec![
        evaluated(1, 0, 100.),
        evaluated(2, 1, 110.),
        with_group(evaluated(3, 2, 70.), 1),
        with_group(evaluated(4, 2, 60.), 1),
    ]);

    let prompt = IteratedLocalSearch::new(1).generate(&problem, &state);

    assert_eq!(prompt.group, 1);
    assert_eq!(prompt.parent_id, Some(4));
}

parameterized_test! {can_select_perturbation_by_weight, (perturbation, expected_text), {
    can_select_perturbation_by_weight_impl(perturbation, expected_text);
}}

can_select_perturbation_by_weight! {
    case01_restart: (Perturbation::Restart, "from scratch"),
    case02_exploit: (Perturbation::Exploit, "complementary strengths"),
    case03_explore: (Perturbation::Explore, "different strategy"),
}

fn can_select_perturbation_by_weight_impl(perturbation: Perturbation, expected_text: &str) {
    let problem = test_problem();
    let state = create_state(vec![evaluated(1, 0, 100.), evaluated(2, 1, 120.)]);
    let search = IteratedLocalSearch::new(1).with_perturbations(vec![(perturbation, 1.)]).unwrap();

    let prompt = search.generate(&problem, &state);

    assert_eq!(prompt.group, 1);
    assert!(prompt.text.contains(expected_text));
}

#[test]
fn can_reject_non_positive_weights() {
    let result = IteratedLocalSearch::new(1).with_perturbations(vec![(Perturbation::Restart, 0.), (Perturbation::Explore, -1.)]);

    assert!(result.is_err());
}

#[test]
fn can_select_best_from_each_group() {
    let state = create_state(vec![
        evaluated(1, 0, 100.),
        evaluated(2, 1, 90.),
        with_group(evaluated(3, 2, 95.), 1),
        with_group(evaluated(4, 2, 80.), 1),
        with_group(failed(5, 3), 2),
    ]);
    let random = SeededRandom::new(0);

    let mut selected = select_best_from_groups(&state, &random, 3).iter().map(|c| c.id()).collect::<Vec<_>>();
    selected.sort();

    assert_eq!(selected, vec![2, 4]);
}
