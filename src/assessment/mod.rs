// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Assessment data model shared by the HTTP API, the CLI and the session file

pub mod coerce;
pub mod confidence;
pub mod verdict;

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub use confidence::{apply_answers, recalculate_all_insights, recalculate_confidence, ConfidenceOverlay};
pub use verdict::Verdict;

/// Label of the pseudo-insight that tracks the savings estimate
pub const EST_SAVINGS_LABEL: &str = "Est. Savings";

/// Placeholder used when the model omits an insight's reasoning
pub const REASONING_PLACEHOLDER: &str = "Reasoning not available";

/// Evidential strength of an insight or recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Low and Medium tiers invite follow-up questions
    pub fn needs_help(&self) -> bool {
        *self != Self::High
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown confidence tier: {}", other)),
        }
    }
}

/// Client-supplied field where an explicit `null` means the same as an absent one
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Client-supplied tier in any casing. Null or unknown tiers fall back to Medium.
pub(crate) fn lenient_confidence<'de, D>(deserializer: D) -> Result<Confidence, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .and_then(|s| s.parse().ok())
        .unwrap_or_default())
}

/// How a follow-up question is best answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerType {
    Photo,
    Text,
}

impl AnswerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for AnswerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "photo" => Ok(Self::Photo),
            "text" => Ok(Self::Text),
            other => Err(format!("unknown answer type: {}", other)),
        }
    }
}

/// Headline buy/pass recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub headline: String,
    pub subhead: String,
    pub confidence: Confidence,
    #[serde(default)]
    pub chips: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rationale_points: Vec<String>,
}

/// One assessment dimension (age, materials, condition, restoration effort)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub label: String,
    pub value: String,
    pub confidence: Confidence,
    pub reasoning: String,
}

/// Follow-up question that would raise confidence in one or more insights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub answer_type: AnswerType,
    #[serde(default)]
    pub helps_insights: Vec<String>,
}

/// Full assessment of one item, produced once per analyze call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub title: String,
    pub recommendation: Recommendation,
    pub insights: Vec<Insight>,
    pub fair_value_range: [f64; 2],
    pub est_savings_range: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<Question>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings_reasoning: Option<String>,
}

impl AnalysisResult {
    /// Insights whose confidence is below High
    pub fn insights_needing_help(&self) -> Vec<&Insight> {
        self.insights.iter().filter(|i| i.confidence.needs_help()).collect()
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_headline(&self.recommendation.headline)
    }
}

/// A user's answer to a follow-up question. Stays on the client side; it is
/// never forwarded to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnswer {
    pub question_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight_label: Option<String>,
    #[serde(default)]
    pub helps_insights: Vec<String>,
    pub answer_type: AnswerType,
    #[serde(default)]
    pub answered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
}

impl QuestionAnswer {
    /// Answer carrying a photo
    pub fn photo(question_id: &str, helps_insights: Vec<String>, photo: String) -> Self {
        Self {
            question_id: question_id.to_string(),
            insight_label: None,
            helps_insights,
            answer_type: AnswerType::Photo,
            answered: true,
            answer_photo: Some(photo),
            answer_text: None,
        }
    }

    /// Answer carrying free text
    pub fn text(question_id: &str, helps_insights: Vec<String>, text: String) -> Self {
        Self {
            question_id: question_id.to_string(),
            insight_label: None,
            helps_insights,
            answer_type: AnswerType::Text,
            answered: true,
            answer_photo: None,
            answer_text: Some(text),
        }
    }

    pub fn has_photo(&self) -> bool {
        self.answered && self.answer_photo.as_deref().is_some_and(|p| !p.is_empty())
    }

    pub fn has_text(&self) -> bool {
        self.answered && self.answer_text.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Whether this answer bears on the insight with the given label
    pub fn helps(&self, label: &str) -> bool {
        self.helps_insights.iter().any(|l| l == label)
            || self.insight_label.as_deref() == Some(label)
    }
}
