//! The solver module contains the optimizer: a loop which asks the oracle for new candidates,
//! evaluates them, keeps the best one and journals everything into the store.
//!
//! # Run states
//!
//! A run goes through the following states:
//!
//! - `Init`: the previous state is restored from the store, or the initial candidate is evaluated
//!   and recorded when the store is empty
//! - `Iterating`: generations are produced while neither budget is exhausted
//! - `Converged`: the iteration cap is reached
//! - `BudgetExhausted`: the global deadline passed or the run was interrupted
//! - `Aborted`: the store failed, the run stops with an error
//!
//! # Generations
//!
//! Every generation issues up to `parallelism` oracle requests. Prompts are built sequentially from
//! the state, attempts (oracle call, extraction, evaluation) run concurrently, and their results are
//! applied one by one in prompt order: only then candidates receive their ids, get written to the
//! store and are compared with the best one. So the best candidate is only ever replaced by a
//! strictly better one, and the report hook sees improvements in the same order as the store does.

#[cfg(test)]
#[path = "../../tests/unit/solver/optimizer_test.rs"]
mod optimizer_test;

mod reporting;
pub use self::reporting::*;

mod telemetry;
pub use self::telemetry::*;

use crate::config::Config;
use crate::evaluation::{Evaluation, EvaluationError, SharedEvaluator, TimeBudget, evaluate_isolated, to_outcome};
use crate::extraction::{Extracted, extract};
use crate::models::{Candidate, CandidateOutcome, EvolutionState, Generation, PendingCandidate};
use crate::oracle::{OracleError, RetryOutcome, complete_with_retry};
use crate::prompt::Prompt;
use crate::store::{Store, StoreError};
use crate::utils::{Deadline, GenericError, Quota, ThreadPool, Timer, parallel_into_collect};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// A shared store handle.
pub type SharedStore = Arc<dyn Store + Send + Sync>;

/// A state of the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Restoring or creating the initial state.
    Init,
    /// Producing generations.
    Iterating,
    /// Iteration cap is reached.
    Converged,
    /// Time budget is exhausted or run is interrupted.
    BudgetExhausted,
    /// Run is stopped because of unrecoverable error.
    Aborted,
}

impl Display for RunState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunState::Init => "init",
            RunState::Iterating => "iterating",
            RunState::Converged => "converged",
            RunState::BudgetExhausted => "budget exhausted",
            RunState::Aborted => "aborted",
        };

        write!(f, "{name}")
    }
}

/// A result of the finished run.
pub struct RunReport {
    /// A terminal state: either [`RunState::Converged`] or [`RunState::BudgetExhausted`].
    pub state: RunState,
    /// The best candidate found, if any.
    pub best: Option<Candidate>,
    /// The evolution state at the end of the run.
    pub evolution: EvolutionState,
    /// Collected metrics, if telemetry is configured to collect them.
    pub metrics: Option<TelemetryMetrics>,
}

/// An unrecoverable error which aborts the run.
#[derive(Clone, Debug, PartialEq)]
pub enum OptimizerError {
    /// Configuration does not allow to run.
    Config(GenericError),
    /// Store cannot persist or restore the journal.
    Store(StoreError),
}

impl Display for OptimizerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizerError::Config(err) => write!(f, "run aborted, configuration error: {err}"),
            OptimizerError::Store(err) => write!(f, "run aborted, {err}"),
        }
    }
}

impl std::error::Error for OptimizerError {}

impl From<StoreError> for OptimizerError {
    fn from(value: StoreError) -> Self {
        OptimizerError::Store(value)
    }
}

/// A result of a single attempt to get a new candidate.
enum Attempt {
    /// Oracle has not replied, the iteration is consumed without a candidate.
    Skipped { error: OracleError, attempts: usize },
    /// Candidate is produced and its outcome is known.
    Finished { candidate: PendingCandidate, outcome: CandidateOutcome },
}

/// Runs the evolutionary optimization loop.
pub struct Optimizer {
    config: Config,
    evaluator: SharedEvaluator,
    store: SharedStore,
    reporter: Option<SharedReporter>,
}

impl Optimizer {
    /// Creates a new instance of `Optimizer`.
    pub fn new(config: Config, evaluator: SharedEvaluator, store: SharedStore) -> Self {
        Self { config, evaluator, store, reporter: None }
    }

    /// Sets a hook which is called every time the best candidate is replaced during iterations.
    pub fn with_reporter(mut self, reporter: SharedReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Returns configuration used by the optimizer.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the optimization until one of the budgets is exhausted.
    pub fn run(self) -> Result<RunReport, OptimizerError> {
        let deadline = Deadline::new(self.config.max_time);
        let mut telemetry = Telemetry::new(self.config.telemetry.clone());
        let pool = ThreadPool::new(self.config.parallelism);

        telemetry.on_state(RunState::Init);

        let result = self.init(&deadline, &mut telemetry).and_then(|mut state| {
            telemetry.on_state(RunState::Iterating);

            let terminal = loop {
                if let Some(terminal) = self.check_termination(&state, &deadline) {
                    break terminal;
                }

                self.run_generation(&mut state, &deadline, &pool, &mut telemetry)?;
            };

            Ok((terminal, state))
        });

        match result {
            Ok((terminal, evolution)) => {
                telemetry.on_state(terminal);
                let metrics = telemetry.on_result(&evolution);

                Ok(RunReport { state: terminal, best: evolution.best().cloned(), evolution, metrics })
            }
            Err(err) => {
                telemetry.on_state(RunState::Aborted);
                telemetry.log(err.to_string().as_str());

                Err(err)
            }
        }
    }

    /// Restores state from the store or evaluates and records the initial candidate.
    fn init(&self, deadline: &Deadline, telemetry: &mut Telemetry) -> Result<EvolutionState, OptimizerError> {
        let problem = &self.config.problem;

        if let Some(state) = self.store.load_latest(problem.direction())? {
            if state.initial().is_some_and(|initial| initial.source() != problem.initial_source()) {
                return Err(OptimizerError::Config(
                    "stored run belongs to another problem: initial candidate differs".into(),
                ));
            }

            telemetry.on_resume(&state);
            return Ok(state);
        }

        let evaluation_time = Timer::start();
        let budget = TimeBudget::new(deadline.budget(self.config.evaluation_timeout));
        let result = evaluate_isolated(&self.evaluator, problem.initial_source(), &budget);
        let outcome = to_outcome(discard_late(result, deadline, &budget));

        let mut state = EvolutionState::new(problem.direction());
        let candidate =
            PendingCandidate::new(0, problem.initial_source().to_string(), None).resolve(state.next_id(), outcome);

        telemetry.on_initial(&candidate, evaluation_time);
        self.accept(&mut state, candidate, false, telemetry)?;

        let generation = Generation {
            index: 0,
            candidate_ids: state.history().iter().map(|candidate| candidate.id()).collect(),
            best_id: state.best().map(|best| best.id()),
            iteration: state.iteration(),
        };
        self.store.append_generation(&generation)?;
        state.push_generation(generation);

        Ok(state)
    }

    fn check_termination(&self, state: &EvolutionState, deadline: &Deadline) -> Option<RunState> {
        let is_interrupted = self.config.quota.as_ref().is_some_and(|quota| quota.is_reached());

        if deadline.is_reached() || is_interrupted {
            return Some(RunState::BudgetExhausted);
        }

        if self.config.max_iterations.is_some_and(|max_iterations| state.iteration() >= max_iterations) {
            return Some(RunState::Converged);
        }

        None
    }

    fn run_generation(
        &self,
        state: &mut EvolutionState,
        deadline: &Deadline,
        pool: &ThreadPool,
        telemetry: &mut Telemetry,
    ) -> Result<(), OptimizerError> {
        let generation_time = Timer::start();
        let index = state.next_generation();

        let remaining = self
            .config
            .max_iterations
            .map_or(usize::MAX, |max_iterations| max_iterations.saturating_sub(state.iteration()));
        let batch_size = self.config.parallelism.max(1).min(remaining);

        let prompts = (0..batch_size)
            .map(|_| {
                state.advance_iteration();
                self.config.prompt_generator.generate(&self.config.problem, state)
            })
            .collect::<Vec<_>>();

        let attempts = pool.execute(|| parallel_into_collect(prompts, |prompt| self.attempt(index, prompt, deadline)));

        let mut candidate_ids = Vec::with_capacity(attempts.len());
        let mut is_improvement = false;

        for attempt in attempts {
            match attempt {
                Attempt::Skipped { error, attempts } => telemetry.on_skipped(&error, attempts),
                Attempt::Finished { candidate, outcome } => {
                    let candidate = candidate.resolve(state.next_id(), outcome);
                    candidate_ids.push(candidate.id());
                    is_improvement |= self.accept(state, candidate, true, telemetry)?;
                }
            }
        }

        let generation =
            Generation { index, candidate_ids, best_id: state.best().map(|best| best.id()), iteration: state.iteration() };

        self.store.append_generation(&generation)?;
        telemetry.on_generation(&generation, state, deadline, generation_time, is_improvement);
        state.push_generation(generation);

        Ok(())
    }

    /// Asks oracle for a new candidate and evaluates it. Runs concurrently with other attempts,
    /// so it has no access to the evolution state.
    fn attempt(&self, generation: usize, prompt: Prompt, deadline: &Deadline) -> Attempt {
        let oracle = &self.config.oracle;
        let RetryOutcome { result, attempts } =
            complete_with_retry(oracle.client.as_ref(), oracle.model.as_str(), prompt.text.as_str(), &self.config.retry, deadline);

        let response = match result {
            Ok(response) => response,
            Err(error) => return Attempt::Skipped { error, attempts },
        };

        let Extracted { source, description } = match extract(response.as_str()) {
            Ok(extracted) => extracted,
            Err(err) => {
                return Attempt::Finished {
                    candidate: PendingCandidate::new(generation, response, prompt.parent_id).with_group(prompt.group),
                    outcome: CandidateOutcome::Failed { reason: err.to_string() },
                };
            }
        };

        let candidate = PendingCandidate::new(generation, source, prompt.parent_id)
            .with_description(description)
            .with_group(prompt.group);

        let budget = TimeBudget::new(deadline.budget(self.config.evaluation_timeout));
        let result = evaluate_isolated(&self.evaluator, candidate.source(), &budget);

        Attempt::Finished { candidate, outcome: to_outcome(discard_late(result, deadline, &budget)) }
    }

    /// Records candidate: the store first, then the state. Returns true if candidate became the new best.
    fn accept(
        &self,
        state: &mut EvolutionState,
        candidate: Candidate,
        should_report: bool,
        telemetry: &mut Telemetry,
    ) -> Result<bool, OptimizerError> {
        self.store.append(&candidate)?;

        let is_improvement = state.push(candidate);

        if let Some(candidate) = state.history().last() {
            telemetry.on_candidate(candidate, is_improvement);
        }

        if let Some(best) = state.best().filter(|_| is_improvement) {
            self.store.append_best(best)?;

            if should_report {
                if let Some(reporter) = &self.reporter {
                    reporter.on_improvement(best);
                }
            }
        }

        Ok(is_improvement)
    }
}

/// Turns a result which completed after the global deadline into a timeout.
fn discard_late(
    result: Result<Evaluation, EvaluationError>,
    deadline: &Deadline,
    budget: &TimeBudget,
) -> Result<Evaluation, EvaluationError> {
    match result {
        Ok(_) if deadline.is_reached() => Err(EvaluationError::Timeout(budget.limit().unwrap_or_default())),
        result => result,
    }
}
