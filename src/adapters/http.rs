use crate::config::{DEFAULT_FALLBACK_MODELS, DEFAULT_MODEL_FAMILY};
use crate::domain::model::ImageAttachment;
use crate::domain::ports::{AdvisoryGateway, ConfigProvider};
use crate::utils::error::{AdvisoryError, DeskError, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

const API_KEY_HEADER: &str = "x-goog-api-key";
const MAX_MODEL_PAGES: usize = 20;

/// Client for the Gemini `generativelanguage` REST API.
///
/// The discovered model list lives in `models` and is fetched at most once
/// per client.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model_family: String,
    fallback_models: Vec<String>,
    models: OnceCell<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}

/// `{base}/v1beta/models/{id}:generateContent` with the id escaped as a
/// single path segment.
fn generate_url(base_url: &str, model_id: &str) -> std::result::Result<Url, String> {
    let mut url = Url::parse(base_url).map_err(|e| format!("invalid base URL: {}", e))?;
    url.path_segments_mut()
        .map_err(|_| format!("base URL cannot carry a path: {}", base_url))?
        .pop_if_empty()
        .extend(["v1beta", "models"])
        .push(&format!("{}:generateContent", model_id));
    Ok(url)
}

/// Model names come back as `models/<id>`; the id alone is what users pick.
fn normalize_model(name: &str) -> &str {
    name.strip_prefix("models/").unwrap_or(name)
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeskError::ConfigError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model_family: DEFAULT_MODEL_FAMILY.to_string(),
            fallback_models: DEFAULT_FALLBACK_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            models: OnceCell::new(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Ok(Self::new(
            config.api_key(),
            config.base_url(),
            Duration::from_secs(config.timeout_seconds()),
        )?
        .with_model_family(config.model_family())
        .with_fallback_models(config.fallback_models().to_vec()))
    }

    pub fn with_model_family(mut self, family: impl Into<String>) -> Self {
        self.model_family = family.into();
        self
    }

    pub fn with_fallback_models(mut self, models: Vec<String>) -> Self {
        self.fallback_models = models;
        self
    }

    async fn fetch_models(&self) -> std::result::Result<Vec<String>, String> {
        let url = format!("{}/v1beta/models", self.base_url);
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_MODEL_PAGES {
            let mut request = self
                .client
                .get(&url)
                .header(API_KEY_HEADER, &self.api_key)
                .query(&[("pageSize", "1000")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            tracing::debug!("Listing models from: {}", url);
            let response = request.send().await.map_err(|e| e.to_string())?;
            if !response.status().is_success() {
                return Err(failure_message(response).await);
            }

            let page: ListModelsResponse = response.json().await.map_err(|e| e.to_string())?;
            names.extend(
                page.models
                    .into_iter()
                    .map(|m| normalize_model(&m.name).to_string())
                    .filter(|name| name.contains(&self.model_family)),
            );

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(names)
    }
}

/// Builds the text that gets classified: numeric status first, then the
/// provider's own status and message when the body is the usual error JSON.
async fn failure_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => format!(
            "{} {}. {}",
            envelope.error.code.unwrap_or(status.as_u16()),
            envelope
                .error
                .status
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string()),
            envelope.error.message.unwrap_or_default()
        ),
        Err(_) => format!(
            "{} {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            body.trim()
        ),
    }
}

fn extract_text(response: GenerateContentResponse) -> std::result::Result<String, String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(format!("prompt blocked by provider ({})", reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| "response contained no candidates".to_string())?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(format!(
            "response contained no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        ));
    }

    Ok(text)
}

#[async_trait]
impl AdvisoryGateway for GeminiClient {
    async fn available_models(&self) -> Vec<String> {
        self.models
            .get_or_init(|| async {
                match self.fetch_models().await {
                    Ok(names) if !names.is_empty() => {
                        tracing::info!("🔍 Found {} {} models", names.len(), self.model_family);
                        names
                    }
                    Ok(_) => {
                        tracing::warn!(
                            "No {} models listed by provider, using fallback list",
                            self.model_family
                        );
                        self.fallback_models.clone()
                    }
                    Err(e) => {
                        tracing::warn!("Model discovery failed ({}), using fallback list", e);
                        self.fallback_models.clone()
                    }
                }
            })
            .await
            .clone()
    }

    async fn invoke(
        &self,
        prompt: &str,
        model: &str,
        image: Option<&ImageAttachment>,
    ) -> std::result::Result<String, AdvisoryError> {
        let model_id = normalize_model(model);
        let url = generate_url(&self.base_url, model_id).map_err(|message| {
            AdvisoryError::Unknown {
                model: model_id.to_string(),
                message,
            }
        })?;

        let mut parts = Vec::with_capacity(2);
        if let Some(image) = image {
            parts.push(RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(&image.data),
                },
            });
        }
        parts.push(RequestPart::Text {
            text: prompt.to_string(),
        });

        let request = GenerateContentRequest {
            contents: vec![RequestContent { parts }],
        };

        tracing::debug!(
            "Calling {} (image attached: {})",
            model_id,
            image.is_some()
        );

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AdvisoryError::Unknown {
                model: model_id.to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!("Provider response status: {}", response.status());

        if !response.status().is_success() {
            let message = failure_message(response).await;
            return Err(AdvisoryError::classify(model_id, message));
        }

        let body: GenerateContentResponse =
            response.json().await.map_err(|e| AdvisoryError::Unknown {
                model: model_id.to_string(),
                message: e.to_string(),
            })?;

        extract_text(body).map_err(|message| AdvisoryError::Unknown {
            model: model_id.to_string(),
            message,
        })
    }
}
