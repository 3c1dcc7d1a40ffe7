pub mod reference;
pub mod types;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::config::CONFIG;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_api_timing;
use types::{GeneratePayload, HistoryRecord, InitResponse};

pub const FALLBACK_NOTICE: &str = "（已触发兼容重试）";
pub const EMPTY_BODY_NOTICE: &str = "请求失败（无返回体）";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{}", .0.user_message())]
    Status(HttpFailure),
    #[error("{0}")]
    InitFailed(String),
    #[error("Failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpFailure {
    pub status: u16,
    pub detail: Option<Value>,
    pub body_text: String,
    pub request_id: Option<String>,
    pub fallback: bool,
}

static REQUEST_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)request id[:：]\s*([A-Za-z0-9_-]+)").expect("valid request id pattern")
});

pub fn extract_request_id(text: &str) -> Option<String> {
    REQUEST_ID
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl HttpFailure {
    pub fn from_body(status: u16, raw: &str) -> Self {
        let Ok(parsed) = serde_json::from_str::<Value>(raw) else {
            let body_text = if raw.is_empty() {
                EMPTY_BODY_NOTICE.to_string()
            } else {
                raw.to_string()
            };
            return HttpFailure {
                status,
                detail: None,
                request_id: extract_request_id(raw),
                body_text,
                fallback: false,
            };
        };

        let detail = match parsed.get("detail") {
            Some(detail) if !detail.is_null() => detail.clone(),
            _ => parsed,
        };
        let body_text = match &detail {
            Value::String(text) => text.clone(),
            other => match other.get("body") {
                Some(Value::String(text)) => text.clone(),
                Some(body) if !body.is_null() => body.to_string(),
                _ => other.to_string(),
            },
        };
        let fallback = detail.get("fallback").is_some_and(is_truthy);

        HttpFailure {
            status,
            request_id: extract_request_id(&body_text),
            body_text,
            detail: Some(detail),
            fallback,
        }
    }

    pub fn user_message(&self) -> String {
        let notice = if self.fallback { FALLBACK_NOTICE } else { "" };
        format!("HTTP {}{}\n{}", self.status, notice, self.body_text)
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: &'static Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url)?;
        Ok(ApiClient {
            base_url,
            client: get_http_client(),
        })
    }

    pub fn from_config() -> Result<Self, ApiError> {
        Self::new(&CONFIG.api_base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    pub async fn init(&self) -> Result<InitResponse, ApiError> {
        let url = self.endpoint("/api/init")?;
        log_api_timing("/api/init", "init", None, move || async move {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if !status.is_success() {
                warn!("Backend init failed with status {}", status);
                let message = if body.is_empty() {
                    format!("Init failed: {}", status.as_u16())
                } else {
                    body
                };
                return Err(ApiError::InitFailed(message));
            }

            let parsed: InitResponse = serde_json::from_str(&body)?;
            info!(
                "Backend init returned {} history records (saved key: {})",
                parsed.history.len(),
                parsed.has_saved_key
            );
            Ok(parsed)
        })
        .await
    }

    pub async fn generate(&self, payload: &GeneratePayload) -> Result<HistoryRecord, ApiError> {
        let url = self.endpoint("/api/generate")?;
        let metadata = json!({
            "style_tag": payload.style_tag,
            "aspect_ratio": payload.aspect_ratio,
            "prompt_chars": payload.prompt.chars().count(),
            "has_ref_image": payload.ref_image.is_some(),
        });

        log_api_timing("/api/generate", "generate", Some(metadata), move || async move {
            let response = self.client.post(url).json(payload).send().await?;
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if !status.is_success() {
                let failure = HttpFailure::from_body(status.as_u16(), &body);
                warn!(
                    status = failure.status,
                    request_id = failure.request_id.as_deref().unwrap_or(""),
                    fallback = failure.fallback,
                    "Generation request failed"
                );
                return Err(ApiError::Status(failure));
            }

            let record: HistoryRecord = serde_json::from_str(&body)?;
            info!(
                "Generated image {}",
                record.filename.as_deref().unwrap_or("<unnamed>")
            );
            Ok(record)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_is_found_case_insensitively() {
        assert_eq!(
            extract_request_id("upstream said Request ID: req_01-AbC, retry later"),
            Some("req_01-AbC".to_string())
        );
        assert_eq!(
            extract_request_id("request id：xyz789"),
            Some("xyz789".to_string())
        );
        assert_eq!(extract_request_id("no id here"), None);
    }

    #[test]
    fn string_detail_is_used_verbatim() {
        let failure = HttpFailure::from_body(400, r#"{"detail": "请填写 API Key"}"#);
        assert_eq!(failure.body_text, "请填写 API Key");
        assert!(!failure.fallback);
        assert_eq!(failure.user_message(), "HTTP 400\n请填写 API Key");
    }

    #[test]
    fn object_detail_prefers_body_and_flags_fallback() {
        let raw = r#"{"detail": {"status": 502, "body": "bad gateway, request id: abc_123", "fallback": true}}"#;
        let failure = HttpFailure::from_body(502, raw);
        assert_eq!(failure.body_text, "bad gateway, request id: abc_123");
        assert_eq!(failure.request_id.as_deref(), Some("abc_123"));
        assert!(failure.fallback);
        assert_eq!(
            failure.user_message(),
            "HTTP 502（已触发兼容重试）\nbad gateway, request id: abc_123"
        );
    }

    #[test]
    fn object_detail_without_body_is_serialized() {
        let failure = HttpFailure::from_body(500, r#"{"detail": {"code": 7, "fallback": 0}}"#);
        assert_eq!(failure.body_text, r#"{"code":7,"fallback":0}"#);
        assert!(!failure.fallback);
    }

    #[test]
    fn missing_detail_uses_whole_body() {
        let failure = HttpFailure::from_body(422, r#"{"error": "nope"}"#);
        assert_eq!(failure.body_text, r#"{"error":"nope"}"#);
    }

    #[test]
    fn non_json_bodies_fall_back_to_raw_text() {
        let failure = HttpFailure::from_body(504, "Gateway Timeout");
        assert_eq!(failure.user_message(), "HTTP 504\nGateway Timeout");
        assert_eq!(failure.detail, None);

        let empty = HttpFailure::from_body(500, "");
        assert_eq!(empty.user_message(), "HTTP 500\n请求失败（无返回体）");
    }

    #[test]
    fn status_error_displays_user_message() {
        let err = ApiError::Status(HttpFailure::from_body(500, r#"{"detail": "没有生成图片"}"#));
        assert_eq!(err.to_string(), "HTTP 500\n没有生成图片");
    }

    #[test]
    fn client_rejects_bad_base_url() {
        assert!(matches!(ApiClient::new("::nope"), Err(ApiError::InvalidUrl(_))));
        let client = ApiClient::new("http://127.0.0.1:8069/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8069");
        assert_eq!(
            client.endpoint("/api/init").unwrap().as_str(),
            "http://127.0.0.1:8069/api/init"
        );
    }
}
