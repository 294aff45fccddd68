//! Remote code generation collaborator.
//!
//! Talks to the Gemini `generateContent` endpoint over sync HTTP (ureq).
//! The API key is read from the environment and sent as a header; it never
//! appears in URLs, configuration files, or reports.

use crate::error::GenerateError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Capability to turn a prompt into C source.
pub trait CodeGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Connection settings for the generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateSettings {
    pub model: String,
    pub endpoint: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for GenerateSettings {
    fn default() -> Self {
        GenerateSettings {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 120,
        }
    }
}

impl GenerateSettings {
    pub fn url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gemini client over sync HTTP.
pub struct GeminiClient {
    settings: GenerateSettings,
    api_key: String,
    agent: ureq::Agent,
}

impl GeminiClient {
    pub fn new(settings: GenerateSettings, api_key: impl Into<String>) -> Self {
        let agent = ureq::config::Config::builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
            .build()
            .new_agent();
        GeminiClient {
            settings,
            api_key: api_key.into(),
            agent,
        }
    }

    pub fn from_env(settings: GenerateSettings) -> Result<Self, GenerateError> {
        let api_key = env::var(&settings.api_key_env).map_err(|_| GenerateError::MissingApiKey {
            env_var: settings.api_key_env.clone(),
        })?;
        Ok(Self::new(settings, api_key))
    }
}

impl CodeGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };
        debug!(model = %self.settings.model, prompt_len = prompt.len(), "requesting generation");
        let response = self
            .agent
            .post(&self.settings.url())
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .send_json(&body)
            .map_err(|e| GenerateError::Api {
                status: 0,
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.into_body().read_to_string().unwrap_or_default();
            return Err(GenerateError::Api { status, message });
        }

        let json: Json = response
            .into_body()
            .read_json()
            .map_err(|e| GenerateError::Parse(e.to_string()))?;
        extract_text(json)
    }
}

/// Pull `candidates[0].content.parts[0].text` out of a response body.
pub fn extract_text(json: Json) -> Result<String, GenerateError> {
    let resp: GenerateResponse =
        serde_json::from_value(json).map_err(|e| GenerateError::Parse(e.to_string()))?;
    resp.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or(GenerateError::EmptyResponse)
}

static FENCE_OPEN: OnceLock<Regex> = OnceLock::new();
static FENCE_CLOSE: OnceLock<Regex> = OnceLock::new();

/// Remove a leading ```` ```lang ```` and trailing ```` ``` ```` fence.
pub fn strip_markdown_fence(code: &str) -> String {
    let open = FENCE_OPEN.get_or_init(|| Regex::new(r"^```[a-zA-Z]*\s*").expect("valid regex"));
    let close = FENCE_CLOSE.get_or_init(|| Regex::new(r"```\s*$").expect("valid regex"));
    let code = open.replace(code, "");
    let code = close.replace(&code, "");
    code.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_fence_with_language_tag() {
        let raw = "```c\n#include <linux/module.h>\nint x;\n```\n";
        assert_eq!(strip_markdown_fence(raw), "#include <linux/module.h>\nint x;");
    }

    #[test]
    fn test_strip_fence_leaves_plain_code() {
        assert_eq!(strip_markdown_fence("  int x;\n"), "int x;");
    }

    #[test]
    fn test_strip_fence_only_at_edges() {
        let raw = "```\nchar *s = \"```\";\n```";
        assert_eq!(strip_markdown_fence(raw), "char *s = \"```\";");
    }

    #[test]
    fn test_extract_text_first_candidate() {
        let body = json!({
            "candidates": [
                {"content": {"parts": [{"text": "int a;"}, {"text": "int b;"}]}},
                {"content": {"parts": [{"text": "int c;"}]}}
            ]
        });
        assert_eq!(extract_text(body).unwrap(), "int a;");
    }

    #[test]
    fn test_extract_text_empty_response() {
        let err = extract_text(json!({"candidates": []})).unwrap_err();
        assert!(matches!(err, GenerateError::EmptyResponse));
        let err = extract_text(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap_err();
        assert!(matches!(err, GenerateError::EmptyResponse));
    }

    #[test]
    fn test_url_joins_model() {
        let s = GenerateSettings {
            endpoint: "http://localhost:9000/v1/models/".into(),
            ..GenerateSettings::default()
        };
        assert_eq!(
            s.url(),
            "http://localhost:9000/v1/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_missing_key_is_reported() {
        let settings = GenerateSettings {
            api_key_env: "DRVGRADE_TEST_KEY_THAT_IS_NOT_SET".into(),
            ..GenerateSettings::default()
        };
        let err = GeminiClient::from_env(settings).err().unwrap();
        assert!(matches!(err, GenerateError::MissingApiKey { .. }));
    }
}
