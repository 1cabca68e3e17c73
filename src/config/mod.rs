// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for SecondLook

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::prompts;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Hosted model settings
    pub ai_engine: EngineConfig,

    /// System prompt templates
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Request and response limits
    #[serde(default)]
    pub limits: LimitConfig,

    /// HTTP server settings
    #[serde(default)]
    pub web: WebConfig,

    /// CLI session file settings
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    /// Base URL of an OpenAI-compatible API
    pub url: String,
    pub model: String,
    /// Environment variable holding the API key. The key itself never lives in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub temperature: TemperatureConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TemperatureConfig {
    #[serde(default = "default_analysis_temperature")]
    pub analysis: f32,
    #[serde(default = "default_analysis_temperature")]
    pub questions: f32,
    #[serde(default = "default_reasoning_temperature")]
    pub reasoning: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_analysis_prompt")]
    pub analysis: String,
    #[serde(default = "default_questions_prompt")]
    pub questions: String,
    #[serde(default = "default_reasoning_prompt")]
    pub reasoning: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LimitConfig {
    /// Photos forwarded to the model per analysis
    #[serde(default = "default_max_photos")]
    pub max_photos: usize,
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
    #[serde(default = "default_body_limit")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_session_path")]
    pub path: String,
}

// Default value functions
fn default_api_key_env() -> String { "OPENAI_API_KEY".to_string() }
fn default_timeout() -> u64 { 60 }
fn default_analysis_temperature() -> f32 { 0.5 }
fn default_reasoning_temperature() -> f32 { 0.4 }
fn default_max_photos() -> usize { 3 }
fn default_max_questions() -> usize { 2 }
fn default_body_limit() -> usize { 20 * 1024 * 1024 }
fn default_web_host() -> String { "127.0.0.1".to_string() }
fn default_web_port() -> u16 { 3000 }
fn default_session_path() -> String { ".secondlook-session.json".to_string() }
fn default_analysis_prompt() -> String { prompts::ANALYSIS_SYSTEM_PROMPT.to_string() }
fn default_questions_prompt() -> String { prompts::QUESTIONS_SYSTEM_PROMPT.to_string() }
fn default_reasoning_prompt() -> String { prompts::REASONING_SYSTEM_PROMPT.to_string() }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ai_engine: EngineConfig {
                url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key_env: default_api_key_env(),
                timeout_secs: default_timeout(),
                temperature: TemperatureConfig::default(),
            },
            prompts: PromptConfig::default(),
            limits: LimitConfig::default(),
            web: WebConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            analysis: default_analysis_temperature(),
            questions: default_analysis_temperature(),
            reasoning: default_reasoning_temperature(),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            analysis: default_analysis_prompt(),
            questions: default_questions_prompt(),
            reasoning: default_reasoning_prompt(),
        }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_photos: default_max_photos(),
            max_questions: default_max_questions(),
            max_body_bytes: default_body_limit(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::SecondLookError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Read the API key from the configured environment variable.
    /// Blank values count as unset.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.ai_engine.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_service_limits() {
        let config = AppConfig::default();
        assert_eq!(config.limits.max_photos, 3);
        assert_eq!(config.limits.max_questions, 2);
        assert_eq!(config.ai_engine.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.ai_engine.temperature.reasoning, 0.4);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.ai_engine.model, "gpt-4o-mini");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.web.port = 8088;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.web.port, 8088);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"ai_engine": {"url": "http://localhost:8080/v1", "model": "local-vision"}}"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.ai_engine.model, "local-vision");
        assert_eq!(config.ai_engine.timeout_secs, 60);
        assert_eq!(config.limits.max_photos, 3);
        assert_eq!(config.web.port, 3000);
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, crate::SecondLookError::Config(_)));
    }

    #[test]
    fn test_blank_api_key_counts_as_unset() {
        let mut config = AppConfig::default();
        config.ai_engine.api_key_env = "SECONDLOOK_TEST_BLANK_KEY".to_string();
        std::env::set_var("SECONDLOOK_TEST_BLANK_KEY", "   ");
        assert!(config.api_key().is_none());
        std::env::remove_var("SECONDLOOK_TEST_BLANK_KEY");
    }
}
