#[cfg(test)]
#[path = "../tests/unit/settings_test.rs"]
mod settings_test;

use crate::ProcessEvaluator;
use optiverse_core::models::Direction;
use optiverse_core::utils::GenericResult;
use serde::Deserialize;
use std::path::PathBuf;

/// Process evaluator settings which can be read as a part of a json document.
#[derive(Clone, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSettings {
    /// A command with its arguments, e.g. `["python", "main.py"]`.
    pub command: Vec<String>,
    /// A file name the candidate source is written into.
    pub source_file: String,
    /// Files copied into the working directory. Default is none.
    pub support_files: Option<Vec<PathBuf>>,
    /// How many times the command is run. Default is 1.
    pub repeats: Option<usize>,
    /// A prefix of the score line. Default is `>>>`.
    pub score_prefix: Option<String>,
    /// Optimization direction. Default is minimize.
    pub direction: Option<Direction>,
}

/// Creates a process evaluator from settings.
pub fn create_process_evaluator(settings: &ProcessSettings) -> GenericResult<ProcessEvaluator> {
    let (program, args) = settings.command.split_first().ok_or("process command is empty")?;

    if settings.source_file.trim().is_empty() {
        return Err("source file name is empty".into());
    }

    let mut evaluator = ProcessEvaluator::new(program.as_str(), settings.source_file.as_str())
        .with_args(args.to_vec())
        .with_support_files(settings.support_files.clone().unwrap_or_default())
        .with_repeats(settings.repeats.unwrap_or(1))
        .with_direction(settings.direction.unwrap_or_default());

    if let Some(prefix) = &settings.score_prefix {
        evaluator = evaluator.with_score_prefix(prefix.as_str());
    }

    Ok(evaluator)
}
