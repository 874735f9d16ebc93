//! Core types for Chorus

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Maximum number of characters kept from a model reply for audit and concerns
pub const SNIPPET_LIMIT: usize = 200;

/// Truncate a string to at most `limit` characters (not bytes)
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Current time as an ISO-8601 / RFC 3339 UTC timestamp
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// The three panel members, in the fixed order they are consulted and stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelId {
    Claude,
    Gpt5,
    Llama,
}

impl ModelId {
    /// All panel members in panel order
    pub const ALL: [ModelId; 3] = [ModelId::Claude, ModelId::Gpt5, ModelId::Llama];

    /// Stable lowercase key used in routes, JSON keys and column prefixes
    pub fn key(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Gpt5 => "gpt5",
            Self::Llama => "llama",
        }
    }

    /// Name used in dissenter lists
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Claude => "Claude",
            Self::Gpt5 => "GPT-5",
            Self::Llama => "Llama",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ModelId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ModelId::ALL
            .into_iter()
            .find(|id| {
                id.key().eq_ignore_ascii_case(needle) || id.display_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| Error::invalid_input(format!("unknown model: {needle}")))
    }
}

/// Model lists serialized by display name (`"GPT-5"`); keys are accepted on input
mod display_names {
    use super::ModelId;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(models: &[ModelId], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(models.iter().map(ModelId::display_name))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ModelId>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|name| name.parse().map_err(D::Error::custom))
            .collect()
    }
}

/// Uniform per-model outcome of one classification call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResult {
    /// Which panel member produced this result
    pub model: ModelId,

    /// Human-readable name of the remote model (e.g. "Claude Sonnet 4")
    pub model_name: String,

    /// Whether the model judged the text safe
    pub safe: bool,

    /// Short concern strings, possibly empty
    pub concerns: Vec<String>,

    /// Bounded snippet of the model's reply (or an error note)
    pub reasoning: String,
}

/// Aggregated three-model decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsensusVerdict {
    Safe,
    Unsafe,
    ReviewRequired,
}

impl ConsensusVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Unsafe => "UNSAFE",
            Self::ReviewRequired => "REVIEW_REQUIRED",
        }
    }
}

impl fmt::Display for ConsensusVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsensusVerdict {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SAFE" => Ok(Self::Safe),
            "UNSAFE" => Ok(Self::Unsafe),
            "REVIEW_REQUIRED" => Ok(Self::ReviewRequired),
            other => Err(Error::invalid_input(format!("unknown verdict: {other}"))),
        }
    }
}

/// Confidence label attached to a consensus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Uncertain,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Uncertain => "uncertain",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Confidence {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "uncertain" => Ok(Self::Uncertain),
            other => Err(Error::invalid_input(format!("unknown confidence: {other}"))),
        }
    }
}

/// Consensus over the three panel results
///
/// `dissenters` lists every model that voted unsafe, in panel order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusRecord {
    pub verdict: ConsensusVerdict,
    pub confidence: Confidence,
    pub rationale: String,
    #[serde(with = "display_names")]
    pub dissenters: Vec<ModelId>,
}

/// The three per-model results of one analysis, in panel order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelResults {
    pub claude: ModelResult,
    pub gpt5: ModelResult,
    pub llama: ModelResult,
}

impl PanelResults {
    /// View the results as an ordered array
    pub fn as_array(&self) -> [&ModelResult; 3] {
        [&self.claude, &self.gpt5, &self.llama]
    }
}

/// Full result of analysing one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisBundle {
    /// The request text that was judged
    pub content: String,

    #[serde(flatten)]
    pub results: PanelResults,

    pub consensus: ConsensusRecord,

    /// ISO-8601 timestamp of completion
    pub timestamp: String,
}

/// One model's vote as it is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredVote {
    pub model: ModelId,
    pub safe: bool,
    pub reasoning: String,
}

/// One persisted analysis, flattened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTestResult {
    /// Row id, assigned by the store on append
    pub id: Option<i64>,
    pub prompt: String,
    pub timestamp: String,
    pub votes: [StoredVote; 3],
    pub verdict: ConsensusVerdict,
    pub confidence: Confidence,
    #[serde(with = "display_names")]
    pub flagged_by: Vec<ModelId>,
}

impl StoredTestResult {
    /// Flatten an analysis bundle into a storable row
    pub fn from_bundle(bundle: &AnalysisBundle) -> Self {
        let votes = bundle.results.as_array().map(|result| StoredVote {
            model: result.model,
            safe: result.safe,
            reasoning: result.reasoning.clone(),
        });

        Self {
            id: None,
            prompt: bundle.content.clone(),
            timestamp: bundle.timestamp.clone(),
            votes,
            verdict: bundle.consensus.verdict,
            confidence: bundle.consensus.confidence,
            flagged_by: bundle.consensus.dissenters.clone(),
        }
    }

    /// Dissenters as the comma-joined display names stored in the row
    pub fn flagged_by_joined(&self) -> String {
        self.flagged_by
            .iter()
            .map(ModelId::display_name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Parse a comma-joined dissenter column back into model ids
    pub fn parse_flagged_by(joined: &str) -> Result<Vec<ModelId>, Error> {
        joined
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ModelId::from_str)
            .collect()
    }
}

/// Summary counts over every stored analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_tests: u64,
    pub by_verdict: std::collections::BTreeMap<ConsensusVerdict, u64>,
}

/// A chat message sent to a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}
