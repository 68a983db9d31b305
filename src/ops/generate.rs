// ============================================================================
// IMAGE GENERATION: the external service behind a small trait
// ============================================================================
//
// Calls are blocking; callers run them off the UI thread (see
// `session::StudioSession`). One call = reference images + instruction in,
// exactly one image out.

use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::io::DataUrl;
use crate::settings::StudioSettings;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(
        "No API key configured. Set GEMINI_API_KEY or add api_key to {}.",
        StudioSettings::display_path()
    )]
    MissingApiKey,
    #[error("Request to the image service failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success status; `message` is the service's own text when it sent one.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Unexpected response from the image service: {0}")]
    InvalidResponse(String),
    #[error("The model did not return an image.{}", .0.as_deref().map(|t| format!(" It said: {}", t)).unwrap_or_default())]
    NoImage(Option<String>),
    /// Free-form failure (other implementations, tests).
    #[error("{0}")]
    Message(String),
}

/// Anything that can turn reference images + an instruction into an image.
pub trait ImageGenerator: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, images: &[DataUrl], prompt: &str) -> Result<DataUrl, GenerateError>;
}

// ============================================================================
// Gemini generateContent transport
// ============================================================================

pub struct GeminiGenerator {
    http: HttpClient,
    api_key: Option<String>,
    api_base: String,
    model: String,
}

impl GeminiGenerator {
    pub fn from_settings(settings: &StudioSettings) -> Result<Self, GenerateError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            http,
            api_key: settings.effective_api_key(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            model: settings.model.trim().to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        let model = self.model.trim_start_matches("models/");
        format!("{}/models/{}:generateContent", self.api_base, model)
    }
}

impl ImageGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, images: &[DataUrl], prompt: &str) -> Result<DataUrl, GenerateError> {
        let api_key = self.api_key.as_deref().ok_or(GenerateError::MissingApiKey)?;
        let endpoint = self.endpoint();
        log::debug!(
            "POST {} ({} image(s), {} prompt chars)",
            endpoint,
            images.len(),
            prompt.chars().count()
        );

        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", api_key)
            .json(&request_body(images, prompt))
            .send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        parse_response(status, &body)
    }
}

pub(crate) fn request_body(images: &[DataUrl], prompt: &str) -> Value {
    let mut parts: Vec<Value> = images
        .iter()
        .map(|img| {
            json!({
                "inlineData": {
                    "mimeType": img.mime_type(),
                    "data": img.payload(),
                }
            })
        })
        .collect();
    parts.push(json!({ "text": prompt }));
    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": { "responseModalities": ["IMAGE", "TEXT"] },
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    #[serde(alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

pub(crate) fn parse_response(status: u16, body: &str) -> Result<DataUrl, GenerateError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .map(|b| b.error.message)
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("The image service returned HTTP {}.", status));
        return Err(GenerateError::Api { status, message });
    }

    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| GenerateError::InvalidResponse(e.to_string()))?;

    let mut said = Vec::new();
    for candidate in &parsed.candidates {
        let Some(content) = &candidate.content else {
            continue;
        };
        for part in &content.parts {
            if let Some(inline) = &part.inline_data
                && !inline.data.is_empty()
            {
                let url = format!("data:{};base64,{}", inline.mime_type, inline.data);
                return DataUrl::parse(url)
                    .map_err(|e| GenerateError::InvalidResponse(e.to_string()));
            }
            if let Some(text) = &part.text
                && !text.trim().is_empty()
            {
                said.push(text.trim().to_string());
            }
        }
    }

    if said.is_empty() {
        let reason = parsed
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .or_else(|| parsed.candidates.iter().find_map(|c| c.finish_reason.clone()));
        if let Some(reason) = reason {
            said.push(format!("(finish reason: {})", reason));
        }
    }
    Err(GenerateError::NoImage(
        (!said.is_empty()).then(|| said.join(" ")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_lists_images_before_text() {
        let a = DataUrl::from_bytes("image/png", b"one");
        let b = DataUrl::from_bytes("image/jpeg", b"two");
        let body = request_body(&[a, b], "make it moody");
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "b25l");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[2]["text"], "make it moody");
        assert_eq!(
            body["generationConfig"]["responseModalities"],
            json!(["IMAGE", "TEXT"])
        );
    }

    #[test]
    fn text_only_request_has_single_part() {
        let body = request_body(&[], "a red fox");
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn first_inline_image_wins() {
        let body = r#"{"candidates":[{"content":{"parts":[
            {"text":"Here you go"},
            {"inlineData":{"mimeType":"image/png","data":"AAAA"}},
            {"inlineData":{"mimeType":"image/png","data":"BBBB"}}
        ]}}]}"#;
        let url = parse_response(200, body).unwrap();
        assert_eq!(url.as_str(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn snake_case_inline_data_is_accepted() {
        let body = r#"{"candidates":[{"content":{"parts":[
            {"inline_data":{"mime_type":"image/jpeg","data":"CCCC"}}
        ]}}]}"#;
        assert_eq!(parse_response(200, body).unwrap().mime_type(), "image/jpeg");
    }

    #[test]
    fn text_only_answer_is_reported() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"I can't edit that photo."}]}}]}"#;
        let err = parse_response(200, body).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The model did not return an image. It said: I can't edit that photo."
        );
    }

    #[test]
    fn blocked_prompt_reports_reason() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = parse_response(200, body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn api_error_message_is_verbatim() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        let err = parse_response(400, body).unwrap_err();
        assert!(matches!(err, GenerateError::Api { status: 400, .. }));
        assert_eq!(err.to_string(), "API key not valid.");
    }

    #[test]
    fn api_error_without_body_names_status() {
        let err = parse_response(503, "upstream connect error").unwrap_err();
        assert_eq!(err.to_string(), "The image service returned HTTP 503.");
    }

    #[test]
    fn endpoint_strips_models_prefix() {
        let settings = StudioSettings {
            api_base: "https://example.test/v1beta/".to_string(),
            model: "models/gemini-2.5-flash-image-preview".to_string(),
            ..StudioSettings::default()
        };
        let generator = GeminiGenerator::from_settings(&settings).unwrap();
        assert_eq!(
            generator.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash-image-preview:generateContent"
        );
    }
}
