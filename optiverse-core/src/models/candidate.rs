#[cfg(test)]
#[path = "../../tests/unit/models/candidate_test.rs"]
mod candidate_test;

use crate::utils::Float;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A unique candidate identifier. Starts with 1 and grows by one with every recorded candidate.
pub type CandidateId = u64;

/// Named numeric values reported by an evaluator alongside the score.
pub type Metrics = BTreeMap<String, Float>;

/// Named text outputs kept by an evaluator for inspection, e.g. captured stdout of a run.
pub type Artifacts = BTreeMap<String, String>;

/// A candidate lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CandidateStatus {
    /// Extracted from an oracle reply, but not yet evaluated.
    Pending,
    /// Evaluated successfully and has a score.
    Evaluated,
    /// Reached the evaluator, but violated problem constraints, failed or ran out of time.
    Invalid,
    /// Never reached the evaluator: the oracle reply could not be parsed.
    Failed,
}

impl Display for CandidateStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CandidateStatus::Pending => "pending",
            CandidateStatus::Evaluated => "evaluated",
            CandidateStatus::Invalid => "invalid",
            CandidateStatus::Failed => "failed",
        };

        write!(f, "{name}")
    }
}

/// A terminal outcome of a pending candidate.
#[derive(Clone, Debug, PartialEq)]
pub enum CandidateOutcome {
    /// Candidate was scored.
    Evaluated {
        /// A score given by evaluator.
        score: Float,
        /// Additional metrics given by evaluator.
        metrics: Metrics,
        /// Outputs kept by evaluator.
        artifacts: Artifacts,
    },
    /// Candidate was run, but the result cannot be used.
    Invalid {
        /// A human readable reason.
        reason: String,
        /// Outputs kept by evaluator.
        artifacts: Artifacts,
    },
    /// Candidate could not be produced from oracle reply.
    Failed {
        /// A human readable reason.
        reason: String,
    },
}

/// A candidate which is proposed, but has no terminal state yet.
#[derive(Clone, Debug)]
pub struct PendingCandidate {
    generation: usize,
    source: String,
    description: Option<String>,
    parent_id: Option<CandidateId>,
    group: usize,
    created_at: String,
}

impl PendingCandidate {
    /// Creates a new pending candidate stamped with the current time.
    pub fn new(generation: usize, source: String, parent_id: Option<CandidateId>) -> Self {
        Self { generation, source, description: None, parent_id, group: 0, created_at: now_rfc3339() }
    }

    /// Sets a description of the candidate.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Sets a search group of the candidate.
    pub fn with_group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }

    /// Returns candidate source text.
    pub fn source(&self) -> &str {
        self.source.as_str()
    }

    /// Returns a lifecycle status which is always pending.
    pub fn status(&self) -> CandidateStatus {
        CandidateStatus::Pending
    }

    /// Moves the candidate into its terminal state under the given id.
    pub fn resolve(self, id: CandidateId, outcome: CandidateOutcome) -> Candidate {
        let (status, score, reason, metrics, artifacts) = match outcome {
            CandidateOutcome::Evaluated { score, metrics, artifacts } => {
                (CandidateStatus::Evaluated, Some(score), None, metrics, artifacts)
            }
            CandidateOutcome::Invalid { reason, artifacts } => {
                (CandidateStatus::Invalid, None, Some(reason), Metrics::default(), artifacts)
            }
            CandidateOutcome::Failed { reason } => {
                (CandidateStatus::Failed, None, Some(reason), Metrics::default(), Artifacts::default())
            }
        };

        Candidate {
            id,
            generation: self.generation,
            source: self.source,
            description: self.description,
            parent_id: self.parent_id,
            group: self.group,
            score,
            status,
            reason,
            metrics,
            artifacts,
            created_at: self.created_at,
        }
    }
}

/// A candidate with its terminal evaluation outcome. Cannot be modified once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    id: CandidateId,
    generation: usize,
    source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    parent_id: Option<CandidateId>,
    #[serde(default)]
    group: usize,
    score: Option<Float>,
    status: CandidateStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metrics: Metrics,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    artifacts: Artifacts,
    created_at: String,
}

impl Candidate {
    /// Returns candidate id.
    pub fn id(&self) -> CandidateId {
        self.id
    }

    /// Returns index of generation where the candidate was produced.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns proposed source text.
    pub fn source(&self) -> &str {
        self.source.as_str()
    }

    /// Returns the explanation given by oracle, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns parent candidate id, if any.
    pub fn parent_id(&self) -> Option<CandidateId> {
        self.parent_id
    }

    /// Returns search group.
    pub fn group(&self) -> usize {
        self.group
    }

    /// Returns score. Only evaluated candidates have it.
    pub fn score(&self) -> Option<Float> {
        self.score
    }

    /// Returns lifecycle status.
    pub fn status(&self) -> CandidateStatus {
        self.status
    }

    /// Returns a failure reason for invalid or failed candidate.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns evaluator metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Returns evaluator artifacts.
    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    /// Returns creation timestamp in RFC 3339 format.
    pub fn created_at(&self) -> &str {
        self.created_at.as_str()
    }

    /// Returns true if candidate can compete for being the best one.
    pub fn is_evaluated(&self) -> bool {
        self.status == CandidateStatus::Evaluated && self.score.is_some_and(|score| score.is_finite())
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}
