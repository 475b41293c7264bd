//! This module reimports a common used types.

pub use crate::config::{Config, ConfigBuilder, Settings, read_settings};

pub use crate::evaluation::{Evaluation, EvaluationError, Evaluator, SharedEvaluator, TimeBudget};

pub use crate::models::{Candidate, CandidateId, CandidateStatus, Direction, EvolutionState, Generation, Problem};

pub use crate::oracle::{Oracle, OracleClient, OracleConfig, OracleError, RetryPolicy};

pub use crate::prompt::{ElitismPromptGenerator, IteratedLocalSearch, Prompt, PromptGenerator};

pub use crate::solver::{ImprovementReporter, InfoLogger, Optimizer, OptimizerError, RunReport, RunState, TelemetryMode};

pub use crate::store::{FileStore, MemoryStore, Store, StoreError};

pub use crate::utils::{Float, GenericError, GenericResult, Quota};
