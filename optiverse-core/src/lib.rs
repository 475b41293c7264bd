//! Core crate contains the building blocks of an evolutionary optimization loop where a
//! text-generation oracle proposes new candidate solutions to a problem and a pluggable evaluator
//! scores them.
//!
//! A run starts from the initial candidate and repeats the same cycle: a prompt is built from the
//! best candidates found so far, the oracle reply is parsed into a new candidate, the candidate is
//! evaluated within its time budget and recorded. Every candidate and every improvement of the best
//! one is written into an append-only journal, so an interrupted run can be resumed.
//!
//! The main entry point is [`solver::Optimizer`], configured with [`config::ConfigBuilder`].

#![warn(missing_docs)]

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[macro_use]
pub mod helpers;

pub mod config;
pub mod evaluation;
pub mod extraction;
pub mod models;
pub mod oracle;
pub mod prelude;
pub mod prompt;
pub mod solver;
pub mod store;
pub mod utils;
