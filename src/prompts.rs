// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Prompt templates sent to the hosted model
//!
//! System prompts are the defaults for `PromptConfig`; user prompts are built
//! per request here and never reach the client.

use serde_json::Value;

use crate::assessment::{lenient_confidence, null_as_default, Confidence};

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert secondhand furniture advisor. \
Analyze furniture photos, price, and notes to provide a comprehensive assessment. \
Generate reasoning for all insights, and if any insights have Low or Medium confidence, \
generate questions to help improve confidence. Return valid JSON only, no markdown or explanation.";

pub const QUESTIONS_SYSTEM_PROMPT: &str = "You are an expert secondhand furniture advisor. \
Given multiple insights that need confidence improvement and full context about the item \
(photos, price, notes, and overall analysis), generate exactly 2 short questions that would be \
most beneficial and move the needle in confidence levels. Prioritize questions that help multiple \
insights simultaneously. Each question should be answerable by either a photo or a short text answer. \
Questions must be highly relevant to the specific item being analyzed, referencing details from the \
photos, price, or notes provided. Return valid JSON only, no markdown or explanation.";

pub const REASONING_SYSTEM_PROMPT: &str = "You are an expert secondhand furniture advisor. \
Write a clear, helpful 3-4 sentence paragraph explaining how we arrived at an assessment. \
Use plain language. Do not use markdown or bullet points.";

const ANALYSIS_SHAPE: &str = r#"Return a JSON object with this exact structure:
{
  "title": "Brief descriptive title (e.g., 'Late Victorian Dresser')",
  "recommendation": {
    "headline": "Main recommendation (e.g., 'Purchase this!' or 'Worth a closer look' or 'Pass')",
    "subhead": "One sentence explanation",
    "confidence": "High" | "Medium" | "Low",
    "chips": ["Save $X-Y", "Condition note", "Restoration note"]
  },
  "insights": [
    {
      "label": "Age",
      "value": "Estimated age range (e.g., '1890s - 1920s')",
      "confidence": "High" | "Medium" | "Low",
      "reasoning": "REQUIRED: 3-4 sentence explanation of how you arrived at this assessment"
    },
    {
      "label": "Materials",
      "value": "Material description (e.g., 'Solid oak hardwood')",
      "confidence": "High" | "Medium" | "Low",
      "reasoning": "REQUIRED: 3-4 sentence explanation of how you arrived at this assessment"
    },
    {
      "label": "Condition",
      "value": "Condition assessment (e.g., 'Excellent' or 'Good' or 'Fair')",
      "confidence": "High" | "Medium" | "Low",
      "reasoning": "REQUIRED: 3-4 sentence explanation of how you arrived at this assessment"
    },
    {
      "label": "Restoration effort",
      "value": "Restoration estimate (e.g., 'Minimal - ~1 hour' or 'Light - ~2 hours')",
      "confidence": "High" | "Medium" | "Low",
      "reasoning": "REQUIRED: 3-4 sentence explanation of how you arrived at this assessment"
    }
  ],
  "fairValueRange": [min, max],
  "estSavingsRange": [min, max],
  "questions": [ONLY include this field if ANY insight has Low or Medium confidence. Generate exactly 2 questions that would help improve confidence. Prioritize questions that help MULTIPLE insights simultaneously. Each question object must have: "id" (e.g., "q1", "q2"), "text" (one short sentence), "answerType" ("photo" | "text"), "helpsInsights" (array of insight labels this question helps, e.g., ["Age", "Materials"])],
  "savingsReasoning": "ONLY include this field if recommendation confidence is Low or Medium. Provide a 3-4 sentence explanation of how you calculated the savings estimate."
}

IMPORTANT REQUIREMENTS:
1. Provide reasoning for ALL insights (required, not optional)
2. If ANY insight has Low or Medium confidence, include a "questions" array with exactly 2 questions
3. If recommendation confidence is Low or Medium, include "savingsReasoning"
4. Questions should prioritize helping multiple insights simultaneously
5. Questions must reference details from the photos, price, or notes provided

Base your assessment on what you can see in the photos, the asking price, and any notes provided."#;

const QUESTIONS_FORMAT: &str = r#"Return a JSON array of exactly 2 objects. Each object must have:
- "id": short unique id (e.g. "q1", "q2")
- "text": the question text (one short sentence, specific to this item)
- "answerType": "photo" | "text" (use "photo" if a photo would best answer it, e.g. "Can you see the maker's mark?"; use "text" for things like style or provenance)
- "helpsInsights": array of insight labels that this question helps (e.g. ["Age", "Materials"])

Example format: [{"id":"q1","text":"Can you see a maker's mark or label?","answerType":"photo","helpsInsights":["Age","Materials"]},{"id":"q2","text":"What style period does it match?","answerType":"text","helpsInsights":["Age"]}]"#;

/// Insight summary sent when asking for follow-up questions
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InsightSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(default, deserialize_with = "lenient_confidence")]
    pub confidence: Confidence,
}

/// User prompt for the main analysis
pub fn build_analysis_prompt(photo_count: usize, price: &str, notes: &str) -> String {
    let price = price.trim();
    let notes = notes.trim();
    let price_line = if price.is_empty() {
        "Not provided".to_string()
    } else {
        format!("${}", price)
    };
    let notes_line = if notes.is_empty() { "None" } else { notes };

    format!(
        "Below are {count} photo(s) of the item. Analyze them along with the price and notes below.\n\n\
         Analyze this secondhand furniture item based on:\n\
         - {count} photo(s) provided\n\
         - Asking price: {price}\n\
         - Additional notes: {notes}\n\n\
         {shape}",
        count = photo_count,
        price = price_line,
        notes = notes_line,
        shape = ANALYSIS_SHAPE,
    )
}

fn summarize_analysis(analysis: &Value) -> String {
    let headline = analysis
        .pointer("/recommendation/headline")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("N/A");

    let insights = analysis
        .get("insights")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|i| {
                    format!(
                        "{}: {} ({})",
                        i.get("label").and_then(Value::as_str).unwrap_or(""),
                        i.get("value").and_then(Value::as_str).unwrap_or(""),
                        i.get("confidence").and_then(Value::as_str).unwrap_or(""),
                    )
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "\nOverall analysis summary:\n- Recommendation: {}\n- All insights: {}\n",
        headline, insights
    )
}

/// User prompt asking for follow-up questions
pub fn build_questions_prompt(
    insights_needing_help: &[InsightSummary],
    photo_count: usize,
    price: &str,
    notes: &str,
    overall_analysis: Option<&Value>,
) -> String {
    let price_info = if price.trim().is_empty() {
        "No price provided".to_string()
    } else {
        format!("Asking price: ${}", price.trim())
    };
    let notes_info = if notes.trim().is_empty() {
        "No notes provided".to_string()
    } else {
        format!("Notes: {}", notes.trim())
    };

    let analysis_summary = overall_analysis
        .filter(|v| !v.is_null())
        .map(summarize_analysis)
        .unwrap_or_default();

    let insights_list = insights_needing_help
        .iter()
        .map(|i| format!("- {}: \"{}\" ({} confidence)", i.label, i.value, i.confidence))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Insights that need confidence improvement:\n{insights}\n\n\
         Context about this specific item:\n\
         - Number of photos provided: {photos}\n\
         - {price}\n\
         - {notes}\n\
         {summary}\n\
         Generate exactly 2 questions that would be most beneficial and move the needle in confidence levels. \
         Prioritize questions that help MULTIPLE insights simultaneously (e.g., a question about maker's marks \
         could help both Age and Materials insights). Questions must reference details from the photos, price, \
         or notes provided.\n\n\
         {format}",
        insights = insights_list,
        photos = photo_count,
        price = price_info,
        notes = notes_info,
        summary = analysis_summary,
        format = QUESTIONS_FORMAT,
    )
}

/// User prompt asking for the reasoning behind one insight
pub fn build_reasoning_prompt(label: &str, value: &str, confidence: &str) -> String {
    format!(
        "Assessment: {} = \"{}\". Confidence: {}.\n\n\
         Write 3-4 sentences explaining how we landed on this answer \
         (what we looked at, what we inferred, and any caveats).",
        label, value, confidence
    )
}
