use super::*;

#[test]
fn can_collect_in_source_order() {
    let pool = ThreadPool::new(4);

    let results = pool.execute(|| parallel_into_collect((0..100).collect::<Vec<_>>(), |item| item * 2));

    assert_eq!(results, (0..100).map(|item| item * 2).collect::<Vec<_>>());
}

#[test]
fn can_run_with_zero_threads_requested() {
    let pool = ThreadPool::new(0);

    let results = pool.execute(|| parallel_into_collect(vec!["a", "b"], |item| item.to_uppercase()));

    assert_eq!(results, vec!["A".to_string(), "B".to_string()]);
}
