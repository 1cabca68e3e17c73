// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Confidence recalculation from answered follow-up questions
//!
//! Entirely local: answers never go back to the model. Each answered photo is
//! worth 2 points and each answered text 1 point; the total moves a tier up
//! the ladder Low -> Medium -> High. Tiers never move down.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{AnalysisResult, Confidence, QuestionAnswer, EST_SAVINGS_LABEL};

const PHOTO_POINTS: u32 = 2;
const TEXT_POINTS: u32 = 1;

const LOW_TO_MEDIUM: u32 = 2;
const LOW_TO_HIGH: u32 = 5;
const MEDIUM_TO_HIGH: u32 = 3;

/// Points earned by a set of answers
pub fn answer_points(answers: &[QuestionAnswer]) -> u32 {
    answers
        .iter()
        .map(|a| {
            let mut points = 0;
            if a.has_photo() {
                points += PHOTO_POINTS;
            }
            if a.has_text() {
                points += TEXT_POINTS;
            }
            points
        })
        .sum()
}

/// New tier for `current` given the answers that bear on it
pub fn recalculate_confidence(current: Confidence, answers: &[QuestionAnswer]) -> Confidence {
    if answers.is_empty() {
        return current;
    }

    let points = answer_points(answers);
    match current {
        Confidence::Low if points >= LOW_TO_HIGH => Confidence::High,
        Confidence::Low if points >= LOW_TO_MEDIUM => Confidence::Medium,
        Confidence::Low => Confidence::Low,
        Confidence::Medium if points >= MEDIUM_TO_HIGH => Confidence::High,
        Confidence::Medium => Confidence::Medium,
        Confidence::High => Confidence::High,
    }
}

/// Recalculate every labelled tier against the answers that help it.
///
/// Labels with no relevant answers are left out of the returned map.
pub fn recalculate_all_insights<'a, I>(insights: I, answers: &[QuestionAnswer]) -> BTreeMap<String, Confidence>
where
    I: IntoIterator<Item = (&'a str, Confidence)>,
{
    let mut updates = BTreeMap::new();

    for (label, confidence) in insights {
        let relevant: Vec<QuestionAnswer> = answers
            .iter()
            .filter(|a| a.helps(label))
            .cloned()
            .collect();

        if !relevant.is_empty() {
            updates.insert(label.to_string(), recalculate_confidence(confidence, &relevant));
        }
    }

    updates
}

/// Analysis with recalculated tiers laid over the baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceOverlay {
    pub updates: BTreeMap<String, Confidence>,
    pub analysis: AnalysisResult,
}

/// Apply answers to a baseline analysis.
///
/// The savings estimate takes part as the `Est. Savings` pseudo-insight only
/// while the recommendation is below High; its new tier becomes the
/// recommendation's confidence. The baseline is never mutated, so applying
/// the same answers twice yields the same overlay.
pub fn apply_answers(baseline: &AnalysisResult, answers: &[QuestionAnswer]) -> ConfidenceOverlay {
    let mut tiers: Vec<(&str, Confidence)> = baseline
        .insights
        .iter()
        .map(|i| (i.label.as_str(), i.confidence))
        .collect();

    let recommendation_confidence = baseline.recommendation.confidence;
    if recommendation_confidence.needs_help() {
        tiers.push((EST_SAVINGS_LABEL, recommendation_confidence));
    }

    let updates = recalculate_all_insights(tiers, answers);

    let mut analysis = baseline.clone();
    for insight in &mut analysis.insights {
        if let Some(tier) = updates.get(&insight.label) {
            insight.confidence = *tier;
        }
    }
    if let Some(tier) = updates.get(EST_SAVINGS_LABEL) {
        analysis.recommendation.confidence = *tier;
    }

    ConfidenceOverlay { updates, analysis }
}
