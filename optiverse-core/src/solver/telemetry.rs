//! A module which provides the logic to collect metrics about the run and simple logging.

#[cfg(test)]
#[path = "../../tests/unit/solver/telemetry_test.rs"]
mod telemetry_test;

use crate::models::{Candidate, CandidateStatus, EvolutionState, Generation};
use crate::oracle::OracleError;
use crate::solver::RunState;
use crate::utils::{Deadline, Float, Timer};
use std::sync::Arc;

/// A logger type which is called with various information regarding the work done by the optimizer.
pub type InfoLogger = Arc<dyn Fn(&str) + Send + Sync>;

/// Encapsulates different measurements regarding the run.
#[derive(Clone, Debug, Default)]
pub struct TelemetryMetrics {
    /// Run duration in seconds.
    pub duration: Float,
    /// Total amount of generations run in this session.
    pub generations: usize,
    /// Total amount of oracle requests issued in this session.
    pub iterations: usize,
    /// Speed: iterations per second.
    pub speed: Float,
    /// Amount of times the best candidate was replaced.
    pub improvements: usize,
    /// Amount of evaluated candidates.
    pub evaluated: usize,
    /// Amount of invalid candidates.
    pub invalid: usize,
    /// Amount of failed candidates.
    pub failed: usize,
    /// Amount of iterations skipped because oracle could not be reached.
    pub skipped: usize,
    /// Evolution progress.
    pub evolution: Vec<TelemetryGeneration>,
}

/// Represents information about generation.
#[derive(Clone, Debug)]
pub struct TelemetryGeneration {
    /// Generation sequence number.
    pub number: usize,
    /// Time since the run started.
    pub timestamp: Float,
    /// Best score known after the generation.
    pub best_score: Option<Float>,
    /// Amount of candidates produced.
    pub candidates: usize,
    /// True if this generation found a new best candidate.
    pub is_improvement: bool,
}

/// Specifies a telemetry mode.
#[derive(Clone, Default)]
pub enum TelemetryMode {
    /// No telemetry at all.
    #[default]
    None,
    /// Only logging.
    OnlyLogging {
        /// A logger type.
        logger: InfoLogger,
        /// Specifies how often (in generations) the best candidate is logged.
        log_best: usize,
    },
    /// Only metrics collection.
    OnlyMetrics,
    /// Both logging and metrics collection.
    All {
        /// A logger type.
        logger: InfoLogger,
        /// Specifies how often (in generations) the best candidate is logged.
        log_best: usize,
    },
}

/// Provides way to collect metrics and write information into log.
pub struct Telemetry {
    metrics: TelemetryMetrics,
    time: Timer,
    mode: TelemetryMode,
    start_iteration: usize,
}

impl Telemetry {
    /// Creates a new instance of `Telemetry`.
    pub fn new(mode: TelemetryMode) -> Self {
        Self { metrics: TelemetryMetrics::default(), time: Timer::start(), mode, start_iteration: 0 }
    }

    /// Reports a transition of the run state.
    pub fn on_state(&self, state: RunState) {
        self.log(format!("[{}s] run state: {state}", self.time.elapsed_secs()).as_str());
    }

    /// Reports evaluated initial candidate.
    pub fn on_initial(&mut self, candidate: &Candidate, evaluation_time: Timer) {
        self.log(
            format!(
                "[{}s] evaluated initial candidate in {}ms, {}",
                self.time.elapsed_secs(),
                evaluation_time.elapsed_millis(),
                format_outcome(candidate)
            )
            .as_str(),
        );
    }

    /// Reports state restored from store.
    pub fn on_resume(&mut self, state: &EvolutionState) {
        self.start_iteration = state.iteration();

        self.log(
            format!(
                "[{}s] resumed run with {} candidate(s), {} iteration(s), next candidate id: {}, best: {}",
                self.time.elapsed_secs(),
                state.history().len(),
                state.iteration(),
                state.next_id(),
                state.best().map_or("none".to_string(), format_outcome)
            )
            .as_str(),
        );
    }

    /// Reports recorded candidate.
    pub fn on_candidate(&mut self, candidate: &Candidate, is_improvement: bool) {
        match candidate.status() {
            CandidateStatus::Evaluated => self.metrics.evaluated += 1,
            CandidateStatus::Invalid => self.metrics.invalid += 1,
            CandidateStatus::Failed => self.metrics.failed += 1,
            CandidateStatus::Pending => {}
        }

        if is_improvement {
            self.metrics.improvements += 1;
            self.log(
                format!(
                    "[{}s] new best candidate #{} in generation {}, score: {}",
                    self.time.elapsed_secs(),
                    candidate.id(),
                    candidate.generation(),
                    format_score(candidate)
                )
                .as_str(),
            );
        } else if candidate.status() != CandidateStatus::Evaluated {
            self.log(
                format!(
                    "[{}s] candidate #{} is {}: {}",
                    self.time.elapsed_secs(),
                    candidate.id(),
                    candidate.status(),
                    candidate.reason().unwrap_or("no reason given")
                )
                .as_str(),
            );
        }
    }

    /// Reports an iteration skipped due to oracle failure.
    pub fn on_skipped(&mut self, error: &OracleError, attempts: usize) {
        self.metrics.skipped += 1;
        self.log(
            format!("[{}s] skipped iteration after {attempts} oracle attempt(s): {error}", self.time.elapsed_secs())
                .as_str(),
        );
    }

    /// Reports generation statistics.
    pub fn on_generation(
        &mut self,
        generation: &Generation,
        state: &EvolutionState,
        deadline: &Deadline,
        generation_time: Timer,
        is_improvement: bool,
    ) {
        self.metrics.generations += 1;
        self.metrics.iterations = state.iteration().saturating_sub(self.start_iteration);

        let best_score = state.best().and_then(|best| best.score());

        if let TelemetryMode::OnlyMetrics | TelemetryMode::All { .. } = &self.mode {
            self.metrics.evolution.push(TelemetryGeneration {
                number: generation.index,
                timestamp: self.time.elapsed_secs_as_float(),
                best_score,
                candidates: generation.candidate_ids.len(),
                is_improvement,
            });
        }

        let log_best = match &self.mode {
            TelemetryMode::OnlyLogging { log_best, .. } | TelemetryMode::All { log_best, .. } => *log_best,
            _ => return,
        };

        if log_best > 0 && generation.index % log_best == 0 {
            self.log(
                format!(
                    "[{}s] generation {} took {}ms, iteration: {}, candidates: {}, best: {}, time estimate: {:.2}",
                    self.time.elapsed_secs(),
                    generation.index,
                    generation_time.elapsed_millis(),
                    state.iteration(),
                    generation.candidate_ids.len(),
                    best_score.map_or("none".to_string(), |score| format!("{score:.6}")),
                    deadline.estimate()
                )
                .as_str(),
            );
        }
    }

    /// Reports final statistic and returns collected metrics, if metrics are enabled.
    pub fn on_result(&mut self, state: &EvolutionState) -> Option<TelemetryMetrics> {
        let duration = self.time.elapsed_secs_as_float();

        self.metrics.duration = duration;
        self.metrics.speed = if duration > 0. { self.metrics.iterations as Float / duration } else { 0. };

        self.log(
            format!(
                "[{}s] total generations: {}, iterations: {}, speed: {:.2} it/sec, improvements: {}, \
                 evaluated/invalid/failed/skipped: {}/{}/{}/{}",
                self.time.elapsed_secs(),
                self.metrics.generations,
                self.metrics.iterations,
                self.metrics.speed,
                self.metrics.improvements,
                self.metrics.evaluated,
                self.metrics.invalid,
                self.metrics.failed,
                self.metrics.skipped,
            )
            .as_str(),
        );

        if let Some(best) = state.best() {
            self.log(format!("best candidate #{}, {}", best.id(), format_outcome(best)).as_str());
        } else {
            self.log("no valid candidate found");
        }

        match &self.mode {
            TelemetryMode::OnlyMetrics | TelemetryMode::All { .. } => Some(std::mem::take(&mut self.metrics)),
            _ => None,
        }
    }

    /// Writes log message if logging is enabled.
    pub fn log(&self, message: &str) {
        match &self.mode {
            TelemetryMode::OnlyLogging { logger, .. } | TelemetryMode::All { logger, .. } => (logger)(message),
            _ => {}
        }
    }
}

fn format_score(candidate: &Candidate) -> String {
    candidate.score().map_or("none".to_string(), |score| format!("{score:.6}"))
}

fn format_outcome(candidate: &Candidate) -> String {
    match candidate.status() {
        CandidateStatus::Evaluated => format!("score: {}", format_score(candidate)),
        status => format!("{status}: {}", candidate.reason().unwrap_or("no reason given")),
    }
}
