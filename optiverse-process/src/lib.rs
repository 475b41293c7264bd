//! This crate provides an evaluator which scores optiverse candidates by running them in a
//! separate OS process.
//!
//! Every evaluation gets a fresh temporary directory: the candidate source is written there under
//! a configured file name next to the support files it needs, then a configured command is started
//! in that directory. The command reports its score by printing a line which starts with `>>>`.
//! A process which does not finish within the budget is killed.

#![warn(missing_docs)]

mod evaluator;
pub use self::evaluator::*;

mod settings;
pub use self::settings::*;
