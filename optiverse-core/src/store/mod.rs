//! A durable append-only journal of the run which allows to resume it.
//!
//! The journal is a sequence of records: candidates, generations and best updates. Records are
//! never rewritten, so the state is reconstructed by replaying them in order.

#[cfg(test)]
#[path = "../../tests/unit/store/replay_test.rs"]
mod replay_test;

mod file;
pub use self::file::FileStore;

mod memory;
pub use self::memory::MemoryStore;

use crate::models::{Candidate, CandidateId, CandidateStatus, Direction, EvolutionState, Generation};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A single journal record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Record {
    /// A candidate in its terminal state.
    Candidate(Candidate),
    /// A finished generation.
    Generation(Generation),
    /// A candidate became the new best one.
    #[serde(rename_all = "camelCase")]
    Best {
        /// An id of the new best candidate.
        candidate_id: CandidateId,
    },
}

/// An error which happens when journal cannot be written or read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// Underlying storage rejected the operation.
    Io(String),
    /// A record cannot be serialized.
    Serialization(String),
    /// Journal content is inconsistent.
    Corrupted(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(msg) => write!(f, "store i/o error: {msg}"),
            StoreError::Serialization(msg) => write!(f, "cannot serialize store record: {msg}"),
            StoreError::Corrupted(msg) => write!(f, "store is corrupted: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        StoreError::Io(value.to_string())
    }
}

/// A durable storage of the run. Implementations must make every record write atomic: a record
/// is either fully visible on reload or not visible at all.
pub trait Store {
    /// Appends a single record.
    fn append_record(&self, record: &Record) -> Result<(), StoreError>;

    /// Reads all fully written records in the order they were appended.
    fn read_records(&self) -> Result<Vec<Record>, StoreError>;

    /// Appends a candidate.
    fn append(&self, candidate: &Candidate) -> Result<(), StoreError> {
        self.append_record(&Record::Candidate(candidate.clone()))
    }

    /// Appends a generation.
    fn append_generation(&self, generation: &Generation) -> Result<(), StoreError> {
        self.append_record(&Record::Generation(generation.clone()))
    }

    /// Marks a candidate as the new best one.
    fn append_best(&self, candidate: &Candidate) -> Result<(), StoreError> {
        self.append_record(&Record::Best { candidate_id: candidate.id() })
    }

    /// Reconstructs the evolution state as it was after the last successful append. Returns `None`
    /// when nothing was stored yet.
    fn load_latest(&self, direction: Direction) -> Result<Option<EvolutionState>, StoreError> {
        replay(direction, self.read_records()?)
    }
}

/// Replays records into evolution state.
///
/// The best candidate is recomputed from candidate records using the same acceptance rule as the
/// optimizer, best records are only checked against it. This way a crash between a candidate
/// record and its best record cannot leave a stale best behind.
pub fn replay(
    direction: Direction,
    records: impl IntoIterator<Item = Record>,
) -> Result<Option<EvolutionState>, StoreError> {
    let mut state = EvolutionState::new(direction);
    let mut is_empty = true;

    for record in records {
        is_empty = false;

        match record {
            Record::Candidate(candidate) => {
                if candidate.id() != state.next_id() {
                    return Err(StoreError::Corrupted(format!(
                        "unexpected candidate id {}, expected {}",
                        candidate.id(),
                        state.next_id()
                    )));
                }

                if candidate.status() == CandidateStatus::Pending {
                    return Err(StoreError::Corrupted(format!("candidate {} is stored as pending", candidate.id())));
                }

                state.push(candidate);
            }
            Record::Generation(generation) => {
                if let Some(id) = generation.candidate_ids.iter().find(|id| state.get(**id).is_none()) {
                    return Err(StoreError::Corrupted(format!(
                        "generation {} refers to unknown candidate {id}",
                        generation.index
                    )));
                }

                state.push_generation(generation);
            }
            Record::Best { candidate_id } => {
                let best_id = state.best().map(|best| best.id());
                if best_id != Some(candidate_id) {
                    return Err(StoreError::Corrupted(format!(
                        "best record refers to candidate {candidate_id}, but replay gives {best_id:?}"
                    )));
                }
            }
        }
    }

    if is_empty {
        return Ok(None);
    }

    // NOTE every candidate except the initial one consumed an iteration
    let issued = state.history().len().saturating_sub(1);
    state.restore_iteration(issued);

    Ok(Some(state))
}
