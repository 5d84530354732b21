//! 모델 목록 조회 (API 연결 확인)
//!
//! `<apiBase>/v1/models`를 Bearer 인증으로 호출하고, 서로 다른 응답 형태를
//! `{ id, name, displayName }` 목록으로 정규화합니다.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use crate::models::{ModelInfo, ModelQueryResult};

const USER_AGENT: &str = "Claude-Key-Manager/1.0.0";

/// 알려진 모델 표시 이름
static DISPLAY_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("claude-3-5-sonnet-20241022", "Claude 3.5 Sonnet"),
        ("claude-3-sonnet-20240229", "Claude 3 Sonnet"),
        ("claude-3-haiku-20240307", "Claude 3 Haiku"),
        ("claude-3-opus-20240229", "Claude 3 Opus"),
        ("claude-2.1", "Claude 2.1"),
        ("claude-2.0", "Claude 2.0"),
        ("claude-instant-1.2", "Claude Instant 1.2"),
    ])
});

/// 모델 목록 조회 클라이언트
pub struct ModelProbe {
    http: reqwest::Client,
}

impl ModelProbe {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub async fn query_models(&self, api_key: &str, api_base: &str) -> ModelQueryResult {
        if api_key.trim().is_empty() || api_base.trim().is_empty() {
            return ModelQueryResult::failure("Missing API key or API base URL");
        }

        let url = match models_url(api_base) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(api_base, "invalid api base: {}", e);
                return ModelQueryResult::failure("Invalid API base URL format");
            }
        };
        tracing::info!(url = %url, "querying models");

        let response = match self
            .http
            .get(url)
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("model query failed: {}", e);
                return ModelQueryResult::failure(request_error_message(&e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "model query rejected: {}", body);
            return ModelQueryResult::failure(status_message(status));
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("model list is not JSON: {}", e);
                return ModelQueryResult::failure(format!("Failed to query models: {}", e));
            }
        };

        let models = extract_models(&body);
        tracing::debug!(count = models.len(), "models parsed");

        if models.is_empty() {
            return ModelQueryResult {
                success: true,
                message: "Connected, but no model data was found".to_string(),
                models,
            };
        }

        ModelQueryResult {
            success: true,
            message: format!("Connected, found {} available models", models.len()),
            models,
        }
    }
}

impl Default for ModelProbe {
    fn default() -> Self {
        Self::new()
    }
}

pub fn models_url(api_base: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!("{}/v1/models", api_base.trim().trim_end_matches('/')))
}

pub fn status_message(status: StatusCode) -> String {
    match status {
        StatusCode::UNAUTHORIZED => "API key is invalid or unauthorized".to_string(),
        StatusCode::FORBIDDEN => "API key lacks permission".to_string(),
        StatusCode::NOT_FOUND => {
            "API base URL is invalid or does not support model listing".to_string()
        }
        other => format!("API request failed: {}", other.as_u16()),
    }
}

fn request_error_message(error: &reqwest::Error) -> String {
    if error.is_connect() || error.is_timeout() {
        "Unable to reach the API server, check the network and API base URL".to_string()
    } else if error.is_builder() {
        "API request failed, check the API base URL format".to_string()
    } else {
        format!("Failed to query models: {}", error)
    }
}

/// `data[]`, `models[]`, bare array, `{object:"list",data:[]}` 형태 지원
pub fn extract_models(body: &Value) -> Vec<ModelInfo> {
    let items = body
        .get("data")
        .and_then(Value::as_array)
        .or_else(|| body.get("models").and_then(Value::as_array))
        .or_else(|| body.as_array());

    items
        .into_iter()
        .flatten()
        .filter_map(|item| {
            let id = item
                .get("id")
                .and_then(Value::as_str)
                .or_else(|| item.as_str())?;
            Some(ModelInfo {
                id: id.to_string(),
                name: id.to_string(),
                display_name: display_name(id),
            })
        })
        .collect()
}

/// 모델 id → 표시 이름 (알 수 없으면 하이픈 단위 title case)
pub fn display_name(model_id: &str) -> String {
    if model_id.is_empty() {
        return "Unknown Model".to_string();
    }
    if let Some(name) = DISPLAY_NAMES.get(model_id) {
        return name.to_string();
    }

    model_id
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
