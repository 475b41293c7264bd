//! Contains run configuration: a fluent builder and serde settings which can be read from json.

#[cfg(test)]
#[path = "../tests/unit/config_test.rs"]
mod config_test;

use crate::models::{Direction, Problem};
use crate::oracle::{OracleConfig, RetryPolicy};
use crate::prompt::{ElitismPromptGenerator, IteratedLocalSearch, Perturbation, PromptGenerator};
use crate::solver::TelemetryMode;
use crate::utils::{GenericResult, Quota};
use serde::Deserialize;
use std::io::{BufReader, Read};
use std::sync::Arc;
use std::time::Duration;

/// A shared prompt generator handle.
pub type SharedPromptGenerator = Arc<dyn PromptGenerator + Send + Sync>;

/// A shared quota handle.
pub type SharedQuota = Arc<dyn Quota + Send + Sync>;

/// An immutable configuration of the run.
#[derive(Clone)]
pub struct Config {
    /// A problem to optimize.
    pub problem: Problem,
    /// Oracle settings.
    pub oracle: OracleConfig,
    /// Max amount of oracle requests.
    pub max_iterations: Option<usize>,
    /// Max wall-clock time of the run.
    pub max_time: Option<Duration>,
    /// Max time of a single candidate evaluation.
    pub evaluation_timeout: Option<Duration>,
    /// Amount of candidates produced concurrently.
    pub parallelism: usize,
    /// Oracle retry policy.
    pub retry: RetryPolicy,
    /// Telemetry mode.
    pub telemetry: TelemetryMode,
    /// Builds prompts.
    pub prompt_generator: SharedPromptGenerator,
    /// An external interruption signal.
    pub quota: Option<SharedQuota>,
}

/// Provides configurable way to build [`Config`].
pub struct ConfigBuilder {
    problem: Problem,
    oracle: OracleConfig,
    max_iterations: Option<usize>,
    max_time: Option<Duration>,
    evaluation_timeout: Option<Duration>,
    parallelism: usize,
    retry: RetryPolicy,
    telemetry: TelemetryMode,
    prompt_generator: SharedPromptGenerator,
    quota: Option<SharedQuota>,
}

impl ConfigBuilder {
    /// Creates a new instance of `ConfigBuilder`.
    pub fn new(problem: Problem, oracle: OracleConfig) -> Self {
        Self {
            problem,
            oracle,
            max_iterations: None,
            max_time: None,
            evaluation_timeout: None,
            parallelism: 1,
            retry: RetryPolicy::default(),
            telemetry: TelemetryMode::None,
            prompt_generator: Arc::new(ElitismPromptGenerator::default()),
            quota: None,
        }
    }

    /// Sets max amount of oracle requests. Default is no limit.
    pub fn with_max_iterations(mut self, limit: Option<usize>) -> Self {
        self.max_iterations = limit;
        self
    }

    /// Sets max running time. Default is no limit.
    pub fn with_max_time(mut self, limit: Option<Duration>) -> Self {
        self.max_time = limit;
        self
    }

    /// Sets max time of a single candidate evaluation. Default is no limit apart from the run time.
    pub fn with_evaluation_timeout(mut self, limit: Option<Duration>) -> Self {
        self.evaluation_timeout = limit;
        self
    }

    /// Sets amount of candidates produced concurrently. Default is 1.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Sets oracle retry policy. Default is [`RetryPolicy::default`].
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets telemetry. Default is [`TelemetryMode::None`].
    pub fn with_telemetry(mut self, telemetry: TelemetryMode) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Sets prompt generator. Default is [`ElitismPromptGenerator`] with 3 inspirations.
    pub fn with_prompt_generator(mut self, prompt_generator: SharedPromptGenerator) -> Self {
        self.prompt_generator = prompt_generator;
        self
    }

    /// Sets an external interruption signal. Default is none.
    pub fn with_quota(mut self, quota: SharedQuota) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Applies settings on top of what is already configured.
    pub fn with_settings(self, settings: &Settings) -> GenericResult<Self> {
        let mut builder = self;

        if let Some(direction) = settings.problem.as_ref().and_then(|problem| problem.direction) {
            builder.problem = builder.problem.with_direction(direction);
        }

        if let Some(oracle) = &settings.oracle {
            if let Some(model) = &oracle.model {
                builder.oracle.model = model.clone();
            }
            if let Some(retry) = &oracle.retry {
                builder = builder.with_retry(create_retry_policy(retry));
            }
        }

        if let Some(termination) = &settings.termination {
            if termination.max_iterations.is_some() {
                builder = builder.with_max_iterations(termination.max_iterations);
            }
            if let Some(max_time) = termination.max_time {
                builder = builder.with_max_time(Some(Duration::from_secs(max_time)));
            }
        }

        if let Some(evaluation) = &settings.evaluation {
            if let Some(timeout) = evaluation.timeout {
                builder = builder.with_evaluation_timeout(Some(Duration::from_secs(timeout)));
            }
            if let Some(parallelism) = evaluation.parallelism {
                builder = builder.with_parallelism(parallelism);
            }
        }

        if let Some(search) = &settings.search {
            builder = builder.with_prompt_generator(create_prompt_generator(search)?);
        }

        if let Some(telemetry) = &settings.telemetry {
            builder = builder.with_telemetry(create_telemetry_mode(telemetry));
        }

        Ok(builder)
    }

    /// Builds the config checking that the run is going to end.
    pub fn build(self) -> GenericResult<Config> {
        if self.oracle.model.trim().is_empty() {
            return Err("oracle model is not specified".into());
        }

        if self.parallelism == 0 {
            return Err("parallelism must be positive".into());
        }

        if self.max_iterations.is_none() && self.max_time.is_none() && self.quota.is_none() {
            return Err("either max iterations, max time or interruption quota has to be set".into());
        }

        Ok(Config {
            problem: self.problem,
            oracle: self.oracle,
            max_iterations: self.max_iterations,
            max_time: self.max_time,
            evaluation_timeout: self.evaluation_timeout,
            parallelism: self.parallelism,
            retry: self.retry,
            telemetry: self.telemetry,
            prompt_generator: self.prompt_generator,
            quota: self.quota,
        })
    }
}

/// Run settings which can be read from json.
#[derive(Clone, Deserialize, Debug, Default)]
pub struct Settings {
    /// Specifies problem settings.
    pub problem: Option<ProblemSettings>,
    /// Specifies oracle settings.
    pub oracle: Option<OracleSettings>,
    /// Specifies termination settings.
    pub termination: Option<TerminationSettings>,
    /// Specifies evaluation settings.
    pub evaluation: Option<EvaluationSettings>,
    /// Specifies prompt generation strategy.
    pub search: Option<SearchType>,
    /// Specifies telemetry settings.
    pub telemetry: Option<TelemetrySettings>,
}

/// Problem settings.
#[derive(Clone, Deserialize, Debug)]
pub struct ProblemSettings {
    /// Optimization direction. Default is minimize.
    pub direction: Option<Direction>,
}

/// Oracle settings.
#[derive(Clone, Deserialize, Debug)]
pub struct OracleSettings {
    /// A model identifier.
    pub model: Option<String>,
    /// Retry policy.
    pub retry: Option<RetrySettings>,
}

/// Retry policy settings.
#[derive(Clone, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RetrySettings {
    /// Max amount of retries. Default is 3.
    pub max_retries: Option<usize>,
    /// Initial backoff in milliseconds. Default is 1000.
    pub initial_backoff: Option<u64>,
    /// Backoff multiplier. Default is 2.
    pub multiplier: Option<f64>,
    /// Max backoff in milliseconds. Default is 30000.
    pub max_backoff: Option<u64>,
}

/// Termination settings.
#[derive(Clone, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TerminationSettings {
    /// Max amount of oracle requests.
    pub max_iterations: Option<usize>,
    /// Max running time in seconds.
    pub max_time: Option<u64>,
}

/// Evaluation settings.
#[derive(Clone, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSettings {
    /// Max time of a single evaluation in seconds.
    pub timeout: Option<u64>,
    /// Amount of candidates produced concurrently. Default is 1.
    pub parallelism: Option<usize>,
}

/// A prompt generation strategy.
#[derive(Clone, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum SearchType {
    /// Always improves the best candidate, showing some other good ones as inspiration.
    #[serde(rename(deserialize = "elitism"))]
    Elitism {
        /// Amount of inspirations. Default is 3.
        inspirations: Option<usize>,
    },

    /// Improves candidates within groups and perturbs a group when it stagnates.
    #[serde(rename(deserialize = "iterated-local-search"))]
    #[serde(rename_all = "camelCase")]
    IteratedLocalSearch {
        /// Amount of iterations without improvement before perturbation. Default is 10.
        max_iterations_without_improvement: Option<usize>,
        /// Perturbation weights.
        perturbations: Option<PerturbationSettings>,
    },
}

/// Perturbation weights.
#[derive(Clone, Deserialize, Debug)]
pub struct PerturbationSettings {
    /// Weight of the restart perturbation. Default is 0.1.
    pub restart: Option<f64>,
    /// Weight of the exploit perturbation. Default is 0.1.
    pub exploit: Option<f64>,
    /// Weight of the explore perturbation. Default is 0.8.
    pub explore: Option<f64>,
}

/// Telemetry settings.
#[derive(Clone, Deserialize, Debug)]
pub struct TelemetrySettings {
    /// Logging settings.
    pub logging: Option<LoggingSettings>,
    /// Metrics settings.
    pub metrics: Option<MetricsSettings>,
}

/// Logging settings.
#[derive(Clone, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSettings {
    /// Specifies whether logging is enabled. Default is false.
    pub enabled: bool,
    /// Specifies how often best candidate is logged. Default is 1 (generation).
    pub log_best: Option<usize>,
}

/// Metrics settings.
#[derive(Clone, Deserialize, Debug)]
pub struct MetricsSettings {
    /// Specifies whether metrics are collected. Default is false.
    pub enabled: bool,
}

/// Reads settings from json.
pub fn read_settings<R: Read>(reader: BufReader<R>) -> GenericResult<Settings> {
    serde_json::from_reader(reader).map_err(|err| format!("cannot deserialize settings: '{err}'").into())
}

/// Creates a config builder from settings.
pub fn create_builder_from_settings(
    problem: Problem,
    oracle: OracleConfig,
    settings: &Settings,
) -> GenericResult<ConfigBuilder> {
    ConfigBuilder::new(problem, oracle).with_settings(settings)
}

fn create_retry_policy(settings: &RetrySettings) -> RetryPolicy {
    let default = RetryPolicy::default();

    RetryPolicy {
        max_retries: settings.max_retries.unwrap_or(default.max_retries),
        initial_backoff: settings.initial_backoff.map_or(default.initial_backoff, Duration::from_millis),
        multiplier: settings.multiplier.unwrap_or(default.multiplier),
        max_backoff: settings.max_backoff.map_or(default.max_backoff, Duration::from_millis),
    }
}

fn create_prompt_generator(search: &SearchType) -> GenericResult<SharedPromptGenerator> {
    const MAX_ITERATIONS_WITHOUT_IMPROVEMENT: usize = 10;

    let generator: SharedPromptGenerator = match search {
        SearchType::Elitism { inspirations } => Arc::new(
            inspirations.map_or_else(ElitismPromptGenerator::default, ElitismPromptGenerator::new),
        ),
        SearchType::IteratedLocalSearch { max_iterations_without_improvement, perturbations } => {
            let search = IteratedLocalSearch::new(
                max_iterations_without_improvement.unwrap_or(MAX_ITERATIONS_WITHOUT_IMPROVEMENT),
            );

            let search = match perturbations {
                Some(PerturbationSettings { restart, exploit, explore }) => search.with_perturbations(vec![
                    (Perturbation::Restart, restart.unwrap_or(0.1)),
                    (Perturbation::Exploit, exploit.unwrap_or(0.1)),
                    (Perturbation::Explore, explore.unwrap_or(0.8)),
                ])
                .map_err(|err| err.context("invalid iterated local search settings"))?,
                None => search,
            };

            Arc::new(search)
        }
    };

    Ok(generator)
}

fn create_telemetry_mode(settings: &TelemetrySettings) -> TelemetryMode {
    const LOG_BEST: usize = 1;

    let create_logger = || Arc::new(|msg: &str| println!("{msg}"));

    match (&settings.logging, &settings.metrics) {
        (Some(LoggingSettings { enabled: true, log_best }), Some(MetricsSettings { enabled: true })) => {
            TelemetryMode::All { logger: create_logger(), log_best: log_best.unwrap_or(LOG_BEST) }
        }
        (Some(LoggingSettings { enabled: true, log_best }), _) => {
            TelemetryMode::OnlyLogging { logger: create_logger(), log_best: log_best.unwrap_or(LOG_BEST) }
        }
        (_, Some(MetricsSettings { enabled: true })) => TelemetryMode::OnlyMetrics,
        _ => TelemetryMode::None,
    }
}
