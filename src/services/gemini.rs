use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::GeminiConfig;
use crate::models::{Category, ClassificationResult};
use crate::services::classifier::{build_prompt, ClassifierError, EmailClassifier};

/// Classifier backed by the Gemini `generateContent` REST endpoint.
pub struct GeminiClassifier {
    client: Client,
    config: GeminiConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClassifier {
    pub fn new(config: GeminiConfig) -> Result<Self, ClassifierError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    fn request_body(email_content: &str) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": build_prompt(email_content) }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "category": {
                            "type": "STRING",
                            "enum": ["Produtivo", "Improdutivo"]
                        },
                        "reply": { "type": "STRING" }
                    },
                    "required": ["category", "reply"]
                }
            }
        })
    }
}

/// Pulls the JSON verdict out of a `generateContent` response body.
fn parse_response(body: GenerateContentResponse) -> Result<ClassificationResult, ClassifierError> {
    let text = body
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .find_map(|part| part.text)
        .ok_or(ClassifierError::MissingContent)?;

    parse_verdict(&text)
}

fn parse_verdict(text: &str) -> Result<ClassificationResult, ClassifierError> {
    let verdict: ClassificationResult = serde_json::from_str(text.trim())
        .map_err(|e| ClassifierError::InvalidPayload(format!("{}: {}", e, text)))?;

    if verdict.category == Category::Erro {
        return Err(ClassifierError::InvalidPayload(
            "model answered with the local error category".to_string(),
        ));
    }
    Ok(verdict)
}

#[async_trait]
impl EmailClassifier for GeminiClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifierError> {
        if !self.is_configured() {
            return Err(ClassifierError::NotConfigured(
                "GOOGLE_API_KEY is not set".to_string(),
            ));
        }

        debug!(model = %self.config.model, text_length = text.len(), "Calling Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.config.api_key.as_str())
            .json(&Self::request_body(text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Gemini returned an error status");
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        parse_response(body)
    }

    fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
