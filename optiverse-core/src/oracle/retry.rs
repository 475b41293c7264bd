#[cfg(test)]
#[path = "../../tests/unit/oracle/retry_test.rs"]
mod retry_test;

use super::*;
use crate::utils::Deadline;
use std::time::Duration;

/// Specifies how retryable oracle errors are repeated.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Max amount of retries after the first attempt. Default is 3.
    pub max_retries: usize,
    /// A pause before the first retry. Default is 1 second.
    pub initial_backoff: Duration,
    /// A factor applied to the pause after every retry. Default is 2.
    pub multiplier: f64,
    /// An upper limit of a single pause. Default is 30 seconds.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2.,
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy which never retries.
    pub fn none() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    /// Returns a pause before the retry with the given number (starting from zero).
    pub fn backoff(&self, retry: usize) -> Duration {
        let factor = self.multiplier.max(1.).powi(retry.min(i32::MAX as usize) as i32);
        let backoff = self.initial_backoff.as_secs_f64() * factor;

        Duration::from_secs_f64(backoff.min(self.max_backoff.as_secs_f64()))
    }
}

/// A result of calling oracle with retries.
#[derive(Debug)]
pub struct RetryOutcome {
    /// Oracle reply or the last error.
    pub result: Result<String, OracleError>,
    /// Amount of attempts made.
    pub attempts: usize,
}

/// Calls oracle repeating retryable failures with exponential backoff. Never sleeps past the
/// deadline: when the next pause does not fit into remaining time, the last error is returned.
pub fn complete_with_retry(
    oracle: &(dyn Oracle + Send + Sync),
    model: &str,
    prompt: &str,
    policy: &RetryPolicy,
    deadline: &Deadline,
) -> RetryOutcome {
    let mut attempts = 0;

    loop {
        attempts += 1;

        let err = match oracle.complete(model, prompt) {
            Ok(response) => return RetryOutcome { result: Ok(response), attempts },
            Err(err) => err,
        };

        let retry = attempts - 1;
        if !err.is_retryable() || retry >= policy.max_retries {
            return RetryOutcome { result: Err(err), attempts };
        }

        let backoff = policy.backoff(retry);
        if deadline.remaining().is_some_and(|remaining| remaining <= backoff) {
            return RetryOutcome { result: Err(err), attempts };
        }

        std::thread::sleep(backoff);
    }
}
