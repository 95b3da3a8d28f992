//! Core data model shared by every component: seeds, turns, generated
//! conversations, tool schemas, and the findings/scores the two scorers emit.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The role of one turn in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Human,
    Gpt,
    FunctionCall,
    Observation,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Human => "human",
            Role::Gpt => "gpt",
            Role::FunctionCall => "function_call",
            Role::Observation => "observation",
        }
    }
}

/// One turn of a conversation: a role and its text content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub from: Role,
    pub value: String,
}

impl Turn {
    pub fn new(from: Role, value: impl Into<String>) -> Self {
        Self {
            from,
            value: value.into(),
        }
    }
}

/// The generator's behavioral profile for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatorMode {
    Base,
    Strict,
    Sycophantic,
}

impl SimulatorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulatorMode::Base => "base",
            SimulatorMode::Strict => "strict",
            SimulatorMode::Sycophantic => "sycophantic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "base" => Some(SimulatorMode::Base),
            "strict" => Some(SimulatorMode::Strict),
            "sycophantic" => Some(SimulatorMode::Sycophantic),
            _ => None,
        }
    }
}

impl std::fmt::Display for SimulatorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain inferred from a seed's policy text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Airline,
    Retail,
    Telecom,
    Other,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Airline => "airline",
            Domain::Retail => "retail",
            Domain::Telecom => "telecom",
            Domain::Other => "other",
        }
    }
}

/// An immutable input record: a policy prompt, a tool schema set, and an
/// exemplar dialogue that new conversations are generated to imitate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seed {
    pub system: String,
    /// JSON-encoded list of tool schemas, kept as the raw string the way it
    /// appears in the seed file (re-parsed on demand by the Prompt Builder
    /// and Tool Validator).
    pub tools: String,
    pub conversations: Vec<Turn>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub hardcase_score: Option<f64>,
    #[serde(default)]
    pub hardcase_tags: Option<Vec<String>>,
}

impl Seed {
    /// Concatenate the exemplar turns as `PREFIX: value` blocks joined by
    /// blank lines, for embedding into a generation prompt.
    pub fn exemplar_text(&self) -> String {
        self.conversations
            .iter()
            .map(|t| format!("{}: {}", prefix_for(t.from), t.value))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Re-parse `tools` into the structured schema list, skipping entries
    /// that don't parse as objects rather than failing the whole seed.
    pub fn tool_schemas(&self) -> Vec<ToolSchema> {
        serde_json::from_str::<Vec<serde_json::Value>>(&self.tools)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| serde_json::from_value::<ToolSchema>(v).ok())
            .collect()
    }
}

fn prefix_for(role: Role) -> &'static str {
    match role {
        Role::Human => "HUMAN",
        Role::Gpt => "ASSISTANT",
        Role::FunctionCall => "FUNCTION_CALL",
        Role::Observation => "OBSERVATION",
    }
}

/// A JSON-Schema-like description of one callable function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: ToolParameters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolParameters {
    #[serde(default)]
    pub properties: BTreeMap<String, ToolProperty>,
    #[serde(default)]
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolProperty {
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    /// Element type token, present only when `type_` is `"array"`.
    #[serde(default)]
    pub items: Option<ToolItemType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolItemType {
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
}

/// A parsed `{name, arguments}` function call, extracted from a
/// `function_call` turn's value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: serde_json::Map<String, serde_json::Value>,
    /// Opaque `<think>...</think>` block that preceded the JSON, if any,
    /// carried verbatim so it can be re-emitted on normalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub think_prefix: Option<String>,
}

/// Output record produced by the Conversation Generator from one seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedConversation {
    pub conversations: Vec<Turn>,
    pub tools: String,
    pub system: String,
    pub based_on_sample: String,
    pub sample_turns: usize,
    pub generated_turns: usize,
    pub domain: String,
    pub simulator_mode: SimulatorMode,
}

/// Severity bucket for a scorer finding, derived from its weight tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn from_weight(weight: u32) -> Self {
        if weight >= 60 {
            Severity::High
        } else if weight == 40 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// One piece of evidence emitted by a scorer: a violation that was rewarded
/// with a success-like observation, anchored to concrete turn indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub kind: String,
    pub turn_index: usize,
    pub tool_name: String,
    pub why: String,
    pub evidence_call: String,
    pub evidence_observation_snippet: String,
    pub severity: Severity,
}

/// Local scorer's verdict for one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationScore {
    pub mode: SimulatorMode,
    pub conv_idx: usize,
    pub score: u32,
    pub kinds: BTreeSet<String>,
    pub findings: Vec<Finding>,
}

/// Durable checkpoint document: the orchestrator's completed output plus the
/// config fingerprint that gates whether it's safe to resume from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub target_count: usize,
    pub completed: Vec<GeneratedConversation>,
    pub config_fingerprint: String,
}

impl CheckpointRecord {
    pub fn empty(target_count: usize, config_fingerprint: String) -> Self {
        Self {
            target_count,
            completed: Vec::new(),
            config_fingerprint,
        }
    }
}
