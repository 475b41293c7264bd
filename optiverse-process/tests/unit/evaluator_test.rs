use super::*;
use std::time::Instant;

fn shell_evaluator() -> ProcessEvaluator {
    ProcessEvaluator::new("sh", "candidate.sh").with_args(vec!["candidate.sh".to_string()])
}

fn budget(secs: u64) -> TimeBudget {
    TimeBudget::new(Some(Duration::from_secs(secs)))
}

#[cfg(unix)]
#[test]
fn can_parse_score_from_first_prefixed_line() {
    let source = "echo 'warming up'\necho '>>> 42.5'\necho '>>> 1'\n";

    let result = shell_evaluator().evaluate(source, &budget(10)).unwrap();

    match result {
        Evaluation::Scored { score, metrics, .. } => {
            assert_eq!(score, 42.5);
            assert_eq!(metrics.get("line_count"), Some(&3.));
        }
        other => panic!("unexpected evaluation: {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn can_average_repeated_runs() {
    let source = "n=$(cat counter 2>/dev/null || echo 0)\nn=$((n + 1))\necho $n > counter\necho \">>> $((n * 10))\"\n";

    let result = shell_evaluator().with_repeats(3).evaluate(source, &budget(10)).unwrap();

    match result {
        Evaluation::Scored { score, metrics, .. } => {
            assert_eq!(score, 20.);
            assert_eq!(metrics.get("best_score"), Some(&10.));
            assert_eq!(metrics.get("worst_score"), Some(&30.));
            assert_eq!(metrics.get("run_2_score"), Some(&20.));
            assert!((metrics["score_variance"] - 200. / 3.).abs() < 1e-9);
        }
        other => panic!("unexpected evaluation: {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn can_keep_output_of_every_run_as_artifacts() {
    let source = "echo 'compiling' >&2\necho 'tour: 1 2 3'\necho '>>> 12'\n";

    let result = shell_evaluator().with_repeats(2).evaluate(source, &budget(10)).unwrap();

    match result {
        Evaluation::Scored { artifacts, .. } => {
            assert_eq!(artifacts.len(), 4);
            assert_eq!(artifacts["run_1_stdout"], "tour: 1 2 3\n>>> 12\n");
            assert_eq!(artifacts["run_2_stderr"], "compiling\n");
        }
        other => panic!("unexpected evaluation: {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn can_keep_output_of_failed_run_as_artifacts() {
    let result = shell_evaluator().with_repeats(3).evaluate("echo 'out of memory' >&2\nexit 1", &budget(10)).unwrap();

    match result {
        Evaluation::Invalid { artifacts, .. } => {
            assert_eq!(artifacts.keys().collect::<Vec<_>>(), vec!["run_1_stderr", "run_1_stdout"]);
            assert_eq!(artifacts["run_1_stderr"], "out of memory\n");
        }
        other => panic!("unexpected evaluation: {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn can_copy_support_files() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.txt");
    fs::write(&data, "7\n").unwrap();

    let result = shell_evaluator()
        .with_support_files(vec![data])
        .evaluate("echo \">>> $(cat data.txt)\"", &budget(10))
        .unwrap();

    assert!(matches!(result, Evaluation::Scored { score, .. } if score == 7.));
}

#[cfg(unix)]
#[test]
fn can_return_invalid_for_failed_process() {
    let result = shell_evaluator().evaluate("echo 'broken' >&2\nexit 3", &budget(10)).unwrap();

    match result {
        Evaluation::Invalid { reason, .. } => {
            assert!(reason.starts_with("run 1 of 1: process exited"));
            assert!(reason.contains("broken"));
        }
        other => panic!("unexpected evaluation: {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn can_return_invalid_without_score_line() {
    let result = shell_evaluator().evaluate("echo 'done'", &budget(10)).unwrap();

    assert!(matches!(result, Evaluation::Invalid { reason, .. } if reason.contains("no line starting with '>>>'")));
}

#[cfg(unix)]
#[test]
fn can_return_invalid_for_unparsable_score() {
    let result = shell_evaluator().with_score_prefix("SCORE:").evaluate("echo 'SCORE: fast'", &budget(10)).unwrap();

    assert!(matches!(result, Evaluation::Invalid { reason, .. } if reason.contains("cannot parse score")));
}

#[cfg(unix)]
#[test]
fn can_kill_process_when_budget_is_exhausted() {
    let start = Instant::now();

    let result = shell_evaluator().evaluate("exec sleep 5", &TimeBudget::new(Some(Duration::from_millis(200))));

    assert_eq!(result, Err(EvaluationError::Timeout(Duration::from_millis(200))));
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[cfg(target_os = "linux")]
#[test]
fn can_kill_processes_started_by_candidate_when_budget_is_exhausted() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("sleeper.pid");
    let source = format!("/bin/sleep 30 &\necho $! > '{}'\nwait\necho '>>> 1'\n", pid_file.display());
    let limit = Duration::from_millis(300);

    let result = shell_evaluator().evaluate(source.as_str(), &TimeBudget::new(Some(limit)));

    assert_eq!(result, Err(EvaluationError::Timeout(limit)));
    let pid = fs::read_to_string(&pid_file).unwrap().trim().to_string();
    let start = Instant::now();
    while is_running(pid.as_str()) && start.elapsed() < Duration::from_secs(3) {
        thread::sleep(Duration::from_millis(20));
    }
    assert!(!is_running(pid.as_str()), "process {pid} started by candidate is still running");
}

/// Returns true if process exists and is not a zombie waiting to be reaped by its new parent.
#[cfg(target_os = "linux")]
fn is_running(pid: &str) -> bool {
    fs::read_to_string(format!("/proc/{pid}/stat"))
        .ok()
        .and_then(|stat| stat.rsplit_once(')').and_then(|(_, rest)| rest.trim_start().chars().next()))
        .is_some_and(|state| state != 'Z' && state != 'X')
}

#[test]
fn can_fail_when_program_is_missing() {
    let evaluator = ProcessEvaluator::new("optiverse-missing-program", "candidate.txt");

    let result = evaluator.evaluate("anything", &budget(10));

    assert!(matches!(result, Err(EvaluationError::Failed(msg)) if msg.contains("cannot start")));
}

#[test]
fn can_truncate_long_output() {
    assert_eq!(truncate("  abcdef  ", 3), "abc...");
    assert_eq!(truncate("abc", 3), "abc");
}
