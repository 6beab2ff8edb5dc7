use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

use super::SpellingCorrector;
use crate::config::CorrectorConfig;
use crate::error::{CaptionError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionResult {
    pub text: String,
}

/// Spelling correction through an Ollama model
pub struct OllamaCorrector {
    client: Client,
    endpoint: String,
    model: String,
    cache: Mutex<HashMap<String, String>>,
}

impl OllamaCorrector {
    pub fn new(config: &CorrectorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn build_correction_prompt(text: &str) -> String {
        format!(
            "You are a meticulous proofreader for subtitles and transcripts.\n\
             Fix spelling mistakes and wrongly recognized characters in the text below.\n\
             \n\
             RULES:\n\
             1. Keep the language of the text; do not translate\n\
             2. Keep the wording, punctuation and line breaks unless they are misspelled\n\
             3. Leave already-correct text exactly as it is\n\
             \n\
             Please return the result in JSON format as {{\"text\":\"corrected text\"}}.\n\
             \n\
             [Text]\n\
             {}",
            text
        )
    }

    async fn request_correction(&self, text: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: Self::build_correction_prompt(text),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.endpoint);
        debug!("Sending correction request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CaptionError::Correction(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CaptionError::Correction(format!(
                "Ollama API error {}: {}",
                status, error_text
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CaptionError::Correction(format!("Failed to parse response: {}", e)))?;

        parse_correction_response(&generated.response, text)
    }
}

/// Extract the corrected text from a model reply.
///
/// A JSON reply must carry a `text` string. Any other reply is taken whole,
/// as long as it has as many lines as the text that was sent.
fn parse_correction_response(raw: &str, original: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CaptionError::Correction("Empty correction received".to_string()));
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
        return match serde_json::from_value::<CorrectionResult>(value) {
            Ok(result) => Ok(result.text),
            Err(_) => Err(CaptionError::Correction(format!(
                "Correction reply has no \"text\" field: {}",
                raw
            ))),
        };
    }

    let expected = original.trim().lines().count();
    let received = raw.lines().count();
    if received != expected {
        return Err(CaptionError::Correction(format!(
            "Correction reply has {} lines, expected {}",
            received, expected
        )));
    }
    Ok(raw.to_string())
}

#[async_trait]
impl SpellingCorrector for OllamaCorrector {
    async fn correct(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        if let Some(cached) = self.cache.lock().ok().and_then(|cache| cache.get(text).cloned()) {
            debug!("Using cached correction from memory");
            return Ok(cached);
        }

        let corrected = self.request_correction(text).await?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(text.to_string(), corrected.clone());
        }
        Ok(corrected)
    }

    fn name(&self) -> &str {
        "ollama"
    }

    /// Check if Ollama is reachable and the model is pulled
    async fn check_availability(&self) -> Result<()> {
        let url = format!("{}/api/show", self.endpoint);
        let request = json!({
            "name": self.model
        });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CaptionError::Correction(format!("Failed to connect to Ollama: {}", e)))?;

        if response.status().is_success() {
            info!("Ollama model '{}' is available", self.model);
            Ok(())
        } else {
            Err(CaptionError::Correction(format!(
                "Ollama model '{}' not found. Please pull the model first: ollama pull {}",
                self.model, self.model
            )))
        }
    }
}
