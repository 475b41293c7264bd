use crate::models::CandidateId;
use serde::{Deserialize, Serialize};

/// One round of the loop and the candidates it produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    /// Generation index, initial candidate belongs to generation zero.
    pub index: usize,
    /// Candidates produced in the round in the order their requests were issued.
    pub candidate_ids: Vec<CandidateId>,
    /// The best candidate known after the round.
    pub best_id: Option<CandidateId>,
    /// Value of iteration counter after the round.
    #[serde(default)]
    pub iteration: usize,
}
