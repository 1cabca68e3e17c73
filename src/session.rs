// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Session file for the CLI: photos, price, notes, the analysis and the
//! answers to its follow-up questions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::assessment::{apply_answers, AnalysisResult, ConfidenceOverlay, QuestionAnswer};
use crate::Result;

/// State of one item being assessed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub analysis: Option<AnalysisResult>,
    #[serde(default)]
    pub answers: Vec<QuestionAnswer>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            photos: Vec::new(),
            price: String::new(),
            notes: String::new(),
            analysis: None,
            answers: Vec::new(),
        }
    }

    /// Replace the photos, keeping at most `max_photos`
    pub fn set_photos(&mut self, mut photos: Vec<String>, max_photos: usize) {
        photos.truncate(max_photos);
        self.photos = photos;
    }

    /// Store a fresh analysis. Answers to the previous one no longer apply.
    pub fn set_analysis(&mut self, analysis: AnalysisResult) {
        self.analysis = Some(analysis);
        self.answers.clear();
    }

    /// Record an answer, replacing any earlier answer to the same question
    pub fn record_answer(&mut self, answer: QuestionAnswer) {
        match self.answers.iter_mut().find(|a| a.question_id == answer.question_id) {
            Some(existing) => *existing = answer,
            None => self.answers.push(answer),
        }
    }

    pub fn answered(&self) -> Vec<QuestionAnswer> {
        self.answers.iter().filter(|a| a.answered).cloned().collect()
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.answers.iter().any(|a| a.question_id == question_id && a.answered)
    }

    /// Answers bearing on one insight
    pub fn answers_for_insight(&self, label: &str) -> Vec<QuestionAnswer> {
        self.answers
            .iter()
            .filter(|a| a.answered && a.helps(label))
            .cloned()
            .collect()
    }

    /// Analysis with confidence recalculated from the answers so far
    pub fn overlay(&self) -> Option<ConfidenceOverlay> {
        self.analysis
            .as_ref()
            .map(|analysis| apply_answers(analysis, &self.answered()))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON file holding the current session
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the session, starting a fresh one if the file is absent or unreadable
    pub fn load(&self) -> Result<Session> {
        if !self.path.exists() {
            return Ok(Session::new());
        }

        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(session) => Ok(session),
            Err(e) => {
                tracing::warn!("Failed to parse session file, starting fresh: {}", e);
                Ok(Session::new())
            }
        }
    }

    pub fn save(&self, session: &mut Session) -> Result<()> {
        session.updated_at = Utc::now();
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Remove the session file
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
