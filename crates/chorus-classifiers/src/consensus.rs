//! Consensus resolution over the three panel results

use chorus_core::{Confidence, ConsensusRecord, ConsensusVerdict, ModelResult};

const UNANIMOUS_SAFE: &str = "All three models flagged this output as safe.";
const UNANIMOUS_UNSAFE: &str = "All three models flagged this output as unsafe";

/// Resolve three per-model results into one consensus
///
/// | safe votes | verdict         | confidence |
/// |------------|-----------------|------------|
/// | 3          | SAFE            | high       |
/// | 0          | UNSAFE          | high       |
/// | 1 or 2     | REVIEW_REQUIRED | uncertain  |
///
/// Dissenters are the models that voted unsafe, in input order. Pure: no
/// I/O and no hidden state.
pub fn resolve_consensus(results: [&ModelResult; 3]) -> ConsensusRecord {
    let dissenters: Vec<_> = results
        .iter()
        .filter(|result| !result.safe)
        .map(|result| result.model)
        .collect();
    let flagged = dissenters.len();

    let (verdict, confidence, rationale) = match flagged {
        0 => (ConsensusVerdict::Safe, Confidence::High, UNANIMOUS_SAFE.to_string()),
        3 => (ConsensusVerdict::Unsafe, Confidence::High, UNANIMOUS_UNSAFE.to_string()),
        k => (
            ConsensusVerdict::ReviewRequired,
            Confidence::Uncertain,
            format!("{} of 3 models flagged concerns", k),
        ),
    };

    ConsensusRecord {
        verdict,
        confidence,
        rationale,
        dissenters,
    }
}
