// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! The three model-backed operations: analyze an item, generate follow-up
//! questions, explain one insight

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::assessment::coerce::{coerce_analysis, coerce_questions, coerce_reasoning};
use crate::assessment::{null_as_default, AnalysisResult, Question};
use crate::openai::{ChatBackend, ChatRequest, OpenAiClient};
use crate::photo;
use crate::prompts::{self, InsightSummary};
use crate::{AppConfig, Result, SecondLookError};

/// Body of `POST /api/analyze-item`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeRequest {
    /// Data URLs (base64)
    #[serde(deserialize_with = "null_as_default")]
    pub photos: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub price: String,
    #[serde(deserialize_with = "null_as_default")]
    pub notes: String,
}

/// Body of `POST /api/generate-questions`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuestionsRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub insights_needing_help: Vec<InsightSummary>,
    #[serde(deserialize_with = "null_as_default")]
    pub photos: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub price: String,
    #[serde(deserialize_with = "null_as_default")]
    pub notes: String,
    pub overall_analysis: Option<Value>,
}

/// Body of `POST /api/generate-reasoning`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningRequest {
    #[serde(deserialize_with = "label_or_default")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(deserialize_with = "confidence_or_default")]
    pub confidence: String,
}

const DEFAULT_REASONING_LABEL: &str = "Assessment";
const DEFAULT_REASONING_CONFIDENCE: &str = "Medium";

impl Default for ReasoningRequest {
    fn default() -> Self {
        Self {
            label: DEFAULT_REASONING_LABEL.to_string(),
            value: String::new(),
            confidence: DEFAULT_REASONING_CONFIDENCE.to_string(),
        }
    }
}

fn label_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .unwrap_or_else(|| DEFAULT_REASONING_LABEL.to_string()))
}

fn confidence_or_default<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .unwrap_or_else(|| DEFAULT_REASONING_CONFIDENCE.to_string()))
}

/// Furniture advisor backed by a chat model
#[derive(Clone)]
pub struct Advisor {
    backend: Arc<dyn ChatBackend>,
    config: AppConfig,
}

impl Advisor {
    pub fn new(backend: Arc<dyn ChatBackend>, config: AppConfig) -> Self {
        Self { backend, config }
    }

    /// Build an advisor talking to the configured API, if a key is set
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key() else {
            return Ok(None);
        };
        let client = OpenAiClient::new(&config.ai_engine, api_key)?;
        Ok(Some(Self::new(Arc::new(client), config.clone())))
    }

    /// Like `from_config`, but a missing key is an error
    pub fn require(config: &AppConfig) -> Result<Self> {
        Self::from_config(config)?
            .ok_or_else(|| SecondLookError::MissingApiKey(config.ai_engine.api_key_env.clone()))
    }

    /// Assess an item from its photos, asking price and notes
    pub async fn analyze_item(&self, request: &AnalyzeRequest) -> Result<AnalysisResult> {
        if request.photos.is_empty() {
            return Err(SecondLookError::InvalidRequest(
                "At least one photo is required".to_string(),
            ));
        }

        let photos: Vec<String> = request
            .photos
            .iter()
            .take(self.config.limits.max_photos)
            .cloned()
            .collect();
        if photos.len() < request.photos.len() {
            debug!("Sending {} of {} photos", photos.len(), request.photos.len());
        }
        let remote = photos.iter().filter(|p| !photo::is_image_data_url(p)).count();
        if remote > 0 {
            warn!("{} photo(s) are not inline data URLs; the model will fetch them", remote);
        }

        let chat = ChatRequest {
            system: self.config.prompts.analysis.clone(),
            user: prompts::build_analysis_prompt(photos.len(), &request.price, &request.notes),
            images: photos,
            temperature: self.config.ai_engine.temperature.analysis,
            json_mode: true,
        };

        let content = self.backend.complete(&chat).await?;
        let result = coerce_analysis(&content, self.config.limits.max_questions)?;

        info!(
            "Analyzed '{}': {} ({} confidence, {} insights)",
            result.title,
            result.recommendation.headline,
            result.recommendation.confidence,
            result.insights.len()
        );
        Ok(result)
    }

    /// Follow-up questions for the insights that need help. No insights means
    /// no questions and no model call.
    pub async fn generate_questions(&self, request: &QuestionsRequest) -> Result<Vec<Question>> {
        if request.insights_needing_help.is_empty() {
            return Ok(Vec::new());
        }

        let chat = ChatRequest {
            system: self.config.prompts.questions.clone(),
            user: prompts::build_questions_prompt(
                &request.insights_needing_help,
                request.photos.len(),
                &request.price,
                &request.notes,
                request.overall_analysis.as_ref(),
            ),
            images: Vec::new(),
            temperature: self.config.ai_engine.temperature.questions,
            json_mode: false,
        };

        let content = self.backend.complete(&chat).await?;
        let questions = coerce_questions(&content, self.config.limits.max_questions)?;
        info!("Generated {} follow-up questions", questions.len());
        Ok(questions)
    }

    /// Plain-language explanation of one insight
    pub async fn generate_reasoning(&self, request: &ReasoningRequest) -> Result<String> {
        let chat = ChatRequest {
            system: self.config.prompts.reasoning.clone(),
            user: prompts::build_reasoning_prompt(&request.label, &request.value, &request.confidence),
            images: Vec::new(),
            temperature: self.config.ai_engine.temperature.reasoning,
            json_mode: false,
        };

        let content = self.backend.complete(&chat).await?;
        coerce_reasoning(&content)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::assessment::{Confidence, REASONING_PLACEHOLDER};

    fn advisor(backend: Arc<StubBackend>) -> Advisor {
        Advisor::new(backend, AppConfig::default())
    }

    fn photos(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("data:image/jpeg;base64,PHOTO{}", i)).collect()
    }

    #[tokio::test]
    async fn test_analyze_requires_photo() {
        let backend = StubBackend::replying(ANALYSIS_REPLY);
        let err = advisor(backend.clone())
            .analyze_item(&AnalyzeRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SecondLookError::InvalidRequest(_)));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_analyze_caps_photos_and_coerces() {
        let backend = StubBackend::replying(ANALYSIS_REPLY);
        let request = AnalyzeRequest { photos: photos(5), price: "250".into(), notes: String::new() };

        let result = advisor(backend.clone()).analyze_item(&request).await.unwrap();

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].images.len(), 3);
        assert!(seen[0].json_mode);
        assert_eq!(seen[0].temperature, 0.5);
        assert!(seen[0].user.contains("Below are 3 photo(s)"));
        assert!(seen[0].user.contains("$250"));

        assert_eq!(result.insights[0].reasoning, REASONING_PLACEHOLDER);
        assert_eq!(result.questions.as_ref().map(Vec::len), Some(2));
        assert_eq!(result.recommendation.confidence, Confidence::Medium);
    }

    #[tokio::test]
    async fn test_analyze_empty_reply() {
        let backend = StubBackend::replying("");
        let request = AnalyzeRequest { photos: photos(1), ..Default::default() };
        let err = advisor(backend).analyze_item(&request).await.unwrap_err();
        assert!(matches!(err, SecondLookError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_questions_skip_model_when_nothing_needs_help() {
        let backend = StubBackend::replying("[]");
        let questions = advisor(backend.clone())
            .generate_questions(&QuestionsRequest::default())
            .await
            .unwrap();

        assert!(questions.is_empty());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_questions_truncated() {
        let reply = r#"[
            {"id":"q1","text":"A?","answerType":"photo","helpsInsights":["Age"]},
            {"id":"q2","text":"B?","answerType":"text"},
            {"id":"q3","text":"C?","answerType":"text","helpsInsights":[]}
        ]"#;
        let backend = StubBackend::replying(reply);
        let request = QuestionsRequest {
            insights_needing_help: vec![InsightSummary {
                label: "Age".into(),
                value: "1960s".into(),
                confidence: Confidence::Low,
            }],
            ..Default::default()
        };

        let questions = advisor(backend.clone()).generate_questions(&request).await.unwrap();
        assert_eq!(questions.len(), 2);
        assert!(questions[1].helps_insights.is_empty());
        assert!(backend.seen.lock().unwrap()[0].images.is_empty());
    }

    #[test]
    fn test_reasoning_defaults_and_temperature() {
        let backend = StubBackend::replying("  We compared the joinery to period examples. ");
        let request: ReasoningRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.label, "Assessment");
        assert_eq!(request.confidence, "Medium");

        let reasoning = tokio_test::block_on(advisor(backend.clone()).generate_reasoning(&request)).unwrap();
        assert_eq!(reasoning, "We compared the joinery to period examples.");
        assert_eq!(backend.seen.lock().unwrap()[0].temperature, 0.4);
    }

    #[test]
    fn test_null_request_fields_take_defaults() {
        let request: ReasoningRequest =
            serde_json::from_str(r#"{"label":null,"value":null,"confidence":null}"#).unwrap();
        assert_eq!(request.label, "Assessment");
        assert_eq!(request.value, "");
        assert_eq!(request.confidence, "Medium");

        let request: AnalyzeRequest =
            serde_json::from_str(r#"{"photos":["data:image/jpeg;base64,AAAA"],"price":null,"notes":null}"#).unwrap();
        assert_eq!(request.photos.len(), 1);
        assert!(request.price.is_empty() && request.notes.is_empty());

        let request: QuestionsRequest = serde_json::from_str(
            r#"{"insightsNeedingHelp":null,"photos":null,"price":null,"notes":null,"overallAnalysis":null}"#,
        )
        .unwrap();
        assert!(request.insights_needing_help.is_empty());
        assert!(request.overall_analysis.is_none());
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let backend = StubBackend::failing("Rate limit reached");
        let request = AnalyzeRequest { photos: photos(1), ..Default::default() };
        let err = advisor(backend).analyze_item(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "Rate limit reached");
    }

    #[test]
    fn test_require_without_key() {
        let mut config = AppConfig::default();
        config.ai_engine.api_key_env = "SECONDLOOK_TEST_UNSET_KEY".to_string();
        std::env::remove_var("SECONDLOOK_TEST_UNSET_KEY");

        assert!(Advisor::from_config(&config).unwrap().is_none());
        assert!(matches!(Advisor::require(&config), Err(SecondLookError::MissingApiKey(_))));
    }
}
