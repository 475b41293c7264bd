#[cfg(test)]
#[path = "../tests/unit/evaluator_test.rs"]
mod evaluator_test;

use optiverse_core::evaluation::{Evaluation, EvaluationError, Evaluator, TimeBudget};
use optiverse_core::models::{Artifacts, Direction, Metrics};
use optiverse_core::utils::Float;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A default prefix of the stdout line which carries the score.
pub const SCORE_PREFIX: &str = ">>>";

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const OUTPUT_LIMIT: usize = 2000;

/// Evaluates candidates by running a command in a temporary directory which contains the candidate
/// source and support files.
#[derive(Clone, Debug)]
pub struct ProcessEvaluator {
    program: String,
    args: Vec<String>,
    source_file: String,
    support_files: Vec<PathBuf>,
    repeats: usize,
    score_prefix: String,
    direction: Direction,
    output_limit: usize,
}

impl ProcessEvaluator {
    /// Creates a new instance of `ProcessEvaluator` which runs `program` and writes candidate source
    /// into `source_file` inside the working directory.
    pub fn new(program: impl Into<String>, source_file: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
            source_file: source_file.into(),
            support_files: vec![],
            repeats: 1,
            score_prefix: SCORE_PREFIX.to_string(),
            direction: Direction::default(),
            output_limit: OUTPUT_LIMIT,
        }
    }

    /// Sets command arguments. Default is none.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Adds files copied into the working directory before the run. Default is none.
    pub fn with_support_files(mut self, files: Vec<PathBuf>) -> Self {
        self.support_files.extend(files);
        self
    }

    /// Sets how many times the command is run; the score is averaged. Default is 1.
    pub fn with_repeats(mut self, repeats: usize) -> Self {
        self.repeats = repeats.max(1);
        self
    }

    /// Sets prefix of the score line. Default is `>>>`.
    pub fn with_score_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.score_prefix = prefix.into();
        self
    }

    /// Sets direction used to name best and worst run in metrics. Default is minimize.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Sets max amount of characters of process output kept in the reason of invalid result.
    /// Default is 2000.
    pub fn with_output_limit(mut self, limit: usize) -> Self {
        self.output_limit = limit;
        self
    }

    fn prepare(&self, source: &str, directory: &Path) -> Result<(), EvaluationError> {
        fs::write(directory.join(self.source_file.as_str()), source)
            .map_err(|err| EvaluationError::Failed(format!("cannot write '{}': {err}", self.source_file)))?;

        self.support_files.iter().try_for_each(|path| {
            let name = path
                .file_name()
                .ok_or_else(|| EvaluationError::Failed(format!("support file has no name: '{}'", path.display())))?;

            fs::copy(path, directory.join(name))
                .map(|_| ())
                .map_err(|err| EvaluationError::Failed(format!("cannot copy '{}': {err}", path.display())))
        })
    }

    fn run_once(&self, directory: &Path, budget: &TimeBudget) -> Result<RunOutput, EvaluationError> {
        let mut command = Command::new(self.program.as_str());
        command
            .args(self.args.iter())
            .current_dir(directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        isolate_process_group(&mut command);

        let mut child =
            command.spawn().map_err(|err| EvaluationError::Failed(format!("cannot start '{}': {err}", self.program)))?;

        let stdout = capture(child.stdout.take());
        let stderr = capture(child.stderr.take());

        let status = wait_within_budget(&mut child, budget)?;

        let stdout = join_output(stdout)?;
        let stderr = join_output(stderr)?;

        let result = self.parse_result(status, stdout.as_str(), stderr.as_str());

        Ok(RunOutput { result, stdout, stderr })
    }

    fn parse_result(&self, status: ExitStatus, stdout: &str, stderr: &str) -> RunResult {
        if !status.success() {
            return RunResult::Invalid(format!(
                "process exited with {status}, stderr: '{}'",
                truncate(stderr, self.output_limit)
            ));
        }

        let Some(line) = stdout.lines().find(|line| line.starts_with(self.score_prefix.as_str())) else {
            return RunResult::Invalid(format!(
                "no line starting with '{}' in output: '{}'",
                self.score_prefix,
                truncate(stdout, self.output_limit)
            ));
        };

        let value = line[self.score_prefix.len()..].trim();
        match value.parse::<Float>() {
            Ok(score) if score.is_finite() => RunResult::Scored(score),
            _ => RunResult::Invalid(format!("cannot parse score from '{}'", truncate(line, self.output_limit))),
        }
    }

    fn aggregate(&self, source: &str, scores: &[Float]) -> Evaluation {
        let runs = scores.len() as Float;
        let average = scores.iter().sum::<Float>() / runs;
        let variance = scores.iter().map(|score| (score - average).powi(2)).sum::<Float>() / runs;

        let mut sorted = scores.to_vec();
        sorted.sort_by(|a, b| self.direction.total_order(*a, *b));

        let mut metrics = Metrics::default();
        metrics.insert("line_count".to_string(), source.matches('\n').count() as Float);
        metrics.insert("score_variance".to_string(), variance);
        if let (Some(best), Some(worst)) = (sorted.first(), sorted.last()) {
            metrics.insert("best_score".to_string(), *best);
            metrics.insert("worst_score".to_string(), *worst);
        }
        scores.iter().enumerate().for_each(|(idx, score)| {
            metrics.insert(format!("run_{}_score", idx + 1), *score);
        });

        Evaluation::Scored { score: average, metrics, artifacts: Artifacts::default() }
    }
}

impl Evaluator for ProcessEvaluator {
    fn evaluate(&self, source: &str, budget: &TimeBudget) -> Result<Evaluation, EvaluationError> {
        let directory = tempfile::Builder::new()
            .prefix("optiverse-")
            .tempdir()
            .map_err(|err| EvaluationError::Failed(format!("cannot create working directory: {err}")))?;

        self.prepare(source, directory.path())?;

        let mut scores = Vec::with_capacity(self.repeats);
        let mut artifacts = Artifacts::default();

        for run in 1..=self.repeats {
            let RunOutput { result, stdout, stderr } = self.run_once(directory.path(), budget)?;
            artifacts.insert(format!("run_{run}_stdout"), stdout);
            artifacts.insert(format!("run_{run}_stderr"), stderr);

            match result {
                RunResult::Scored(score) => scores.push(score),
                RunResult::Invalid(reason) => {
                    let reason = format!("run {run} of {}: {reason}", self.repeats);
                    return Ok(Evaluation::Invalid { reason, artifacts });
                }
            }
        }

        Ok(self.aggregate(source, scores.as_slice()).with_artifacts(artifacts))
    }
}

enum RunResult {
    Scored(Float),
    Invalid(String),
}

struct RunOutput {
    result: RunResult,
    stdout: String,
    stderr: String,
}

/// Makes the child a leader of its own process group, so everything it starts can be killed with it.
#[cfg(unix)]
fn isolate_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    command.process_group(0);
}

#[cfg(not(unix))]
fn isolate_process_group(_: &mut Command) {}

/// Kills the child and every process of its group, then reaps the child.
fn kill_process_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: the child is not reaped yet, so its pid still identifies the group it leads.
            unsafe {
                libc::kill(-pgid, libc::SIGKILL);
            }
        }
    }

    let _ = child.kill();
    let _ = child.wait();
}

fn capture<R: Read + Send + 'static>(reader: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    reader.map(|mut reader| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = reader.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn join_output(handle: Option<JoinHandle<Vec<u8>>>) -> Result<String, EvaluationError> {
    match handle {
        Some(handle) => handle
            .join()
            .map(|buffer| String::from_utf8_lossy(buffer.as_slice()).into_owned())
            .map_err(|_| EvaluationError::Crashed("output reader stopped unexpectedly".to_string())),
        None => Ok(String::new()),
    }
}

/// Waits for the child to exit, kills it with its whole process group once the budget is exhausted.
fn wait_within_budget(child: &mut Child, budget: &TimeBudget) -> Result<ExitStatus, EvaluationError> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(err) => return Err(EvaluationError::Failed(format!("cannot wait for process: {err}"))),
        }

        if budget.is_exhausted() {
            kill_process_tree(child);

            return Err(EvaluationError::Timeout(budget.limit().unwrap_or_default()));
        }

        let pause = budget.remaining().map_or(POLL_INTERVAL, |remaining| remaining.min(POLL_INTERVAL));
        thread::sleep(pause);
    }
}

fn truncate(text: &str, limit: usize) -> String {
    let text = text.trim();

    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
