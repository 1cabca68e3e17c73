// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Shape checks and defaults for model output
//!
//! The model is asked for JSON, but fields go missing, tiers come back in odd
//! casing and question lists overflow. Everything here turns raw completion
//! text into the typed assessment or reports `InvalidResponse`.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{
    AnalysisResult, AnswerType, Confidence, Insight, Question, Recommendation, REASONING_PLACEHOLDER,
};
use crate::{Result, SecondLookError};

const DEFAULT_TITLE: &str = "Furniture Item";

/// Remove ```json fences the model may have added. Each end is stripped on its own.
pub fn strip_markdown_json(text: &str) -> &str {
    let mut json = text.trim();
    if let Some(rest) = json.strip_prefix("```") {
        json = rest.strip_prefix("json").unwrap_or(rest).trim_start();
    }
    if let Some(rest) = json.strip_suffix("```") {
        json = rest;
    }
    json.trim()
}

fn parse_content(content: &str) -> Result<Value> {
    let json = strip_markdown_json(content);
    if json.is_empty() {
        return Err(SecondLookError::EmptyResponse);
    }
    serde_json::from_str(json).map_err(|e| {
        warn!("Model returned unparseable JSON: {}", e);
        SecondLookError::InvalidResponse
    })
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn confidence_field(obj: &Map<String, Value>, key: &str) -> Confidence {
    obj.get(key)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect()
    })
}

fn range_field(obj: &Map<String, Value>, key: &str) -> [f64; 2] {
    match obj.get(key).and_then(Value::as_array).map(Vec::as_slice) {
        Some([low, high]) => [low.as_f64().unwrap_or(0.0), high.as_f64().unwrap_or(0.0)],
        _ => [0.0, 0.0],
    }
}

fn coerce_recommendation(value: &Value) -> Option<Recommendation> {
    let obj = value.as_object()?;
    Some(Recommendation {
        headline: string_field(obj, "headline").unwrap_or_default(),
        subhead: string_field(obj, "subhead").unwrap_or_default(),
        confidence: confidence_field(obj, "confidence"),
        chips: string_list(obj.get("chips")).unwrap_or_default(),
        rationale_points: string_list(obj.get("rationalePoints")).unwrap_or_default(),
    })
}

fn coerce_insight(value: &Value) -> Option<Insight> {
    let obj = value.as_object()?;
    Some(Insight {
        label: string_field(obj, "label").unwrap_or_default(),
        value: string_field(obj, "value").unwrap_or_default(),
        confidence: confidence_field(obj, "confidence"),
        reasoning: string_field(obj, "reasoning")
            .unwrap_or_else(|| REASONING_PLACEHOLDER.to_string()),
    })
}

/// Strict form used for questions embedded in an analysis: incomplete entries are dropped.
fn complete_question(value: &Value) -> Option<Question> {
    let obj = value.as_object()?;
    Some(Question {
        id: string_field(obj, "id")?,
        text: string_field(obj, "text")?,
        answer_type: obj.get("answerType")?.as_str()?.parse().ok()?,
        helps_insights: string_list(obj.get("helpsInsights"))?,
    })
}

/// Lenient form used by the questions endpoint: only `helpsInsights` is patched.
fn lenient_question(value: &Value) -> Option<Question> {
    let obj = value.as_object()?;
    Some(Question {
        id: string_field(obj, "id").unwrap_or_default(),
        text: string_field(obj, "text").unwrap_or_default(),
        answer_type: obj
            .get("answerType")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or(AnswerType::Text),
        helps_insights: string_list(obj.get("helpsInsights")).unwrap_or_default(),
    })
}

/// Turn the analysis completion into an `AnalysisResult`.
///
/// `recommendation` must be an object and `insights` an array, otherwise the
/// response is rejected. Missing reasoning is replaced with a placeholder and
/// the question list is filtered to complete entries and capped at `max_questions`.
pub fn coerce_analysis(content: &str, max_questions: usize) -> Result<AnalysisResult> {
    let value = parse_content(content)?;
    let obj = value.as_object().ok_or(SecondLookError::InvalidResponse)?;

    let recommendation = obj
        .get("recommendation")
        .and_then(coerce_recommendation)
        .ok_or(SecondLookError::InvalidResponse)?;

    let insights: Vec<Insight> = obj
        .get("insights")
        .and_then(Value::as_array)
        .ok_or(SecondLookError::InvalidResponse)?
        .iter()
        .filter_map(coerce_insight)
        .collect();

    let questions = obj.get("questions").and_then(Value::as_array).map(|items| {
        let mut questions: Vec<Question> = items.iter().filter_map(complete_question).collect();
        if questions.len() > max_questions {
            debug!("Truncating {} questions to {}", questions.len(), max_questions);
        }
        questions.truncate(max_questions);
        questions
    });

    Ok(AnalysisResult {
        title: string_field(obj, "title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        recommendation,
        insights,
        fair_value_range: range_field(obj, "fairValueRange"),
        est_savings_range: range_field(obj, "estSavingsRange"),
        questions,
        savings_reasoning: string_field(obj, "savingsReasoning"),
    })
}

/// Turn the questions completion (a JSON array) into at most `max_questions` questions
pub fn coerce_questions(content: &str, max_questions: usize) -> Result<Vec<Question>> {
    let value = parse_content(content)?;
    let items = value.as_array().ok_or(SecondLookError::InvalidResponse)?;

    let mut questions: Vec<Question> = items.iter().filter_map(lenient_question).collect();
    questions.truncate(max_questions);
    Ok(questions)
}

/// Trimmed reasoning paragraph; empty text is an upstream failure
pub fn coerce_reasoning(content: &str) -> Result<String> {
    let reasoning = content.trim();
    if reasoning.is_empty() {
        return Err(SecondLookError::EmptyResponse);
    }
    Ok(reasoning.to_string())
}
