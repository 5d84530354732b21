//! Key Manager Data Models
//!
//! 프론트엔드 TypeScript 타입과 매핑되는 Rust 데이터 모델

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 저장 파일 전체 구조 (`data.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreData {
    pub api_sources: Vec<ApiSource>,
    pub app_settings: Map<String, Value>,
    pub next_id: u64,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            api_sources: Vec::new(),
            app_settings: Map::new(),
            next_id: 1,
        }
    }
}

/// 디스크에 저장되는 API 소스 (키는 암호화 상태)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSource {
    pub id: u64,
    pub name: String,
    pub encrypted_key: String,
    pub api_base: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 복호화된 API 소스 (UI 및 활성화 sink 전달용)
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: u64,
    pub name: String,
    pub api_key: String,
    pub api_base: String,
    pub model: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Source {
    pub(crate) fn from_stored(stored: &ApiSource, api_key: String) -> Self {
        Self {
            id: stored.id,
            name: stored.name.clone(),
            api_key,
            api_base: stored.api_base.clone(),
            model: stored.model.clone(),
            is_default: stored.is_default,
            is_active: stored.is_active,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }

    pub fn credential(&self) -> Credential {
        Credential {
            api_key: self.api_key.clone(),
            api_base: self.api_base.clone(),
            model: self.model.clone(),
        }
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("api_key", &mask_key(&self.api_key))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("is_default", &self.is_default)
            .field("is_active", &self.is_active)
            .finish()
    }
}

/// 저장 요청 (id가 없으면 생성, 있으면 수정)
///
/// - `apiKey`가 없으면 수정 시 기존 암호문을 그대로 유지
/// - `isDefault`가 없으면 수정 시 기존 값을 유지
/// - 알 수 없는 필드는 거부
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SourceInput {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub api_base: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

/// 활성화 sink로 전달되는 평문 자격 증명
#[derive(Clone, PartialEq)]
pub struct Credential {
    pub api_key: String,
    pub api_base: String,
    pub model: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &mask_key(&self.api_key))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

/// 모델 목록 항목
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub display_name: String,
}

/// 모델 조회 결과
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelQueryResult {
    pub success: bool,
    pub message: String,
    pub models: Vec<ModelInfo>,
}

impl ModelQueryResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            models: Vec::new(),
        }
    }
}

/// 소스 전환 결과
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchResult {
    pub success: bool,
    pub message: String,
    pub warnings: Vec<String>,
}

/// 외부 도구용 환경 변수 확인 결과
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentStatus {
    pub success: bool,
    pub variables: std::collections::BTreeMap<String, Option<String>>,
    pub error: Option<String>,
}

/// 로그/디버그 출력용 키 마스킹 (앞 6자만 노출)
pub fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(6).collect();
    if key.chars().count() <= 6 {
        "***".to_string()
    } else {
        format!("{}***", prefix)
    }
}
