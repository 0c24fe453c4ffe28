use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::analyzer::{build_prompt, AnalyzeError, Analyzer};
use crate::config::Config;
use crate::models::{AnalysisResult, Recommendation};

/// Gemini `generateContent` client returning structured radio-readiness critiques.
pub struct GeminiClient {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    temperature: f64,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// The structured-output schema sent with every request.
pub fn response_schema() -> Value {
    let recommendations: Vec<&str> = Recommendation::ALL.iter().map(|r| r.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "overallScore": {
                "type": "NUMBER",
                "description": "A single overall score from 0 to 100 representing the track's radio-readiness."
            },
            "recommendation": {
                "type": "STRING",
                "description": "A final verdict, either 'Recommended for Radio', 'Needs Work', or 'Not Recommended'.",
                "enum": recommendations
            },
            "summary": {
                "type": "STRING",
                "description": "A 2-3 sentence summary of the analysis, written in an encouraging tone for an artist or audio engineer."
            },
            "metrics": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": {
                            "type": "STRING",
                            "description": "The name of the metric (e.g., 'Dynamic Range', 'Loudness (LUFS)', 'Stereo Width')."
                        },
                        "value": {
                            "type": "STRING",
                            "description": "The measured value or qualitative assessment (e.g., '8 DR', '-10 LUFS', 'Wide')."
                        },
                        "rating": {
                            "type": "NUMBER",
                            "description": "A numerical rating from 0 (poor) to 10 (excellent) for this metric."
                        },
                        "explanation": {
                            "type": "STRING",
                            "description": "A brief, constructive explanation of the rating and what it means for radio play."
                        }
                    },
                    "required": ["name", "value", "rating", "explanation"]
                }
            }
        },
        "required": ["overallScore", "recommendation", "summary", "metrics"]
    })
}

/// Pull the generated text out of a `generateContent` response body.
fn extract_text(body: &str) -> Result<String, AnalyzeError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| AnalyzeError::MalformedResult(format!("unreadable response envelope: {}", e)))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AnalyzeError::MalformedResult(
            "model returned no text".to_string(),
        ));
    }
    Ok(text)
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.trim().to_string())
}

impl GeminiClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        use anyhow::Context;

        let api_key = config
            .api_key
            .clone()
            .context("No API key configured. Set GEMINI_API_KEY or pass --api-key")?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!("Gemini client: {} at {}", config.model, config.base_url);

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn request_for(&self, file_name: &str) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(build_prompt(file_name)),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl Analyzer for GeminiClient {
    async fn analyze(&self, file_name: &str) -> Result<AnalysisResult, AnalyzeError> {
        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_for(file_name))
            .send()
            .await
            .map_err(|e| AnalyzeError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnalyzeError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(AnalyzeError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let text = extract_text(&body)?;
        AnalysisResult::from_json(&text).inspect_err(|e| {
            tracing::warn!("Rejected model output for {}: {} (raw: {})", file_name, e, text);
        })
    }
}
