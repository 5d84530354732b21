//! Credential Store
//!
//! API 소스 CRUD + 암호화 저장/복호화 조회
//!
//! - 모든 변경은 사본에 적용 → 파일 flush → 성공 시 메모리에 반영
//! - 활성(isActive) / 기본(isDefault) 소스는 각각 최대 1개

pub mod file;

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::{KeyManagerError, Result};
use crate::models::{ApiSource, Source, SourceInput, StoreData};
use crate::secrets::{Cipher, MasterKey};

/// 파일 기반 Credential Store
///
/// 프로세스 시작 시 1회 생성하여 Tauri 상태로 관리합니다.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    cipher: Cipher,
    data: StoreData,
}

impl CredentialStore {
    /// 설정된 데이터 디렉토리에서 마스터키와 저장 파일을 로드
    pub fn open(config: &AppConfig) -> Result<Self> {
        let master_key = MasterKey::load_or_create(&config.master_key_path())?;
        Self::new(config.data_path(), Cipher::new(master_key))
    }

    pub fn new(path: PathBuf, cipher: Cipher) -> Result<Self> {
        let data = file::load(&path)?;
        tracing::info!(
            path = %path.display(),
            sources = data.api_sources.len(),
            "credential store loaded"
        );
        Ok(Self { path, cipher, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 암호화 상태 그대로의 저장 항목
    pub fn stored_sources(&self) -> &[ApiSource] {
        &self.data.api_sources
    }

    fn decrypt_source(&self, stored: &ApiSource) -> Result<Source> {
        let api_key = self.cipher.decrypt(&stored.encrypted_key).map_err(|e| {
            tracing::warn!(id = stored.id, "failed to decrypt api key: {}", e);
            KeyManagerError::from(e)
        })?;
        Ok(Source::from_stored(stored, api_key))
    }

    /// 사본을 파일에 기록한 뒤 메모리에 반영
    fn commit(&mut self, next: StoreData) -> Result<()> {
        file::write_atomic(&self.path, &next)?;
        self.data = next;
        Ok(())
    }

    /// 전체 소스 조회 (삽입 순서, 모든 키 복호화)
    ///
    /// 하나라도 복호화에 실패하면 전체 호출이 실패합니다.
    pub fn list_all(&self) -> Result<Vec<Source>> {
        self.data
            .api_sources
            .iter()
            .map(|s| self.decrypt_source(s))
            .collect()
    }

    pub fn get_by_id(&self, id: u64) -> Result<Option<Source>> {
        self.data
            .api_sources
            .iter()
            .find(|s| s.id == id)
            .map(|s| self.decrypt_source(s))
            .transpose()
    }

    pub fn get_active(&self) -> Result<Option<Source>> {
        self.data
            .api_sources
            .iter()
            .find(|s| s.is_active)
            .map(|s| self.decrypt_source(s))
            .transpose()
    }

    /// 소스 저장 (생성 또는 수정), 사용된 id 반환
    pub fn save(&mut self, input: SourceInput) -> Result<u64> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(KeyManagerError::InvalidInput(
                "name must not be empty".to_string(),
            ));
        }
        let api_base = input.api_base.trim().to_string();
        if api_base.is_empty() {
            return Err(KeyManagerError::InvalidInput(
                "api base must not be empty".to_string(),
            ));
        }
        let model = input
            .model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        let encrypted_key = match &input.api_key {
            Some(key) => Some(self.cipher.encrypt(key)?),
            None => None,
        };

        let mut next = self.data.clone();
        let now = Utc::now();

        let id = match input.id {
            Some(id) => {
                let index = next
                    .api_sources
                    .iter()
                    .position(|s| s.id == id)
                    .ok_or(KeyManagerError::NotFound(id))?;

                if input.is_default == Some(true) {
                    for other in next.api_sources.iter_mut().filter(|s| s.id != id) {
                        other.is_default = false;
                    }
                }

                let entry = &mut next.api_sources[index];
                entry.name = name;
                entry.api_base = api_base;
                entry.model = model;
                if let Some(encrypted_key) = encrypted_key {
                    entry.encrypted_key = encrypted_key;
                }
                if let Some(is_default) = input.is_default {
                    entry.is_default = is_default;
                }
                entry.updated_at = now;
                id
            }
            None => {
                let encrypted_key = encrypted_key.ok_or_else(|| {
                    KeyManagerError::InvalidInput("api key is required".to_string())
                })?;
                let is_default = input.is_default.unwrap_or(false);
                if is_default {
                    for other in next.api_sources.iter_mut() {
                        other.is_default = false;
                    }
                }

                // 파일의 nextId가 기존 id보다 작아도 재사용하지 않는다
                let id_exhausted =
                    || KeyManagerError::InvalidInput("id space exhausted".to_string());
                let max_id = next.api_sources.iter().map(|s| s.id).max().unwrap_or(0);
                let id = next
                    .next_id
                    .max(max_id.checked_add(1).ok_or_else(id_exhausted)?);
                next.next_id = id.checked_add(1).ok_or_else(id_exhausted)?;

                next.api_sources.push(ApiSource {
                    id,
                    name,
                    encrypted_key,
                    api_base,
                    model,
                    is_default,
                    is_active: false,
                    created_at: now,
                    updated_at: now,
                });
                id
            }
        };

        self.commit(next)?;
        tracing::info!(id, "api source saved");
        Ok(id)
    }

    /// 소스 삭제, 실제로 삭제되었는지 반환
    ///
    /// 활성 소스를 삭제해도 다른 소스가 자동으로 활성화되지 않습니다.
    pub fn delete_by_id(&mut self, id: u64) -> Result<bool> {
        if !self.data.api_sources.iter().any(|s| s.id == id) {
            return Ok(false);
        }

        let mut next = self.data.clone();
        next.api_sources.retain(|s| s.id != id);
        self.commit(next)?;
        tracing::info!(id, "api source deleted");
        Ok(true)
    }

    /// 활성 소스 지정 (나머지는 모두 비활성)
    pub fn set_active(&mut self, id: u64) -> Result<()> {
        if !self.data.api_sources.iter().any(|s| s.id == id) {
            return Err(KeyManagerError::NotFound(id));
        }

        let mut next = self.data.clone();
        let now = Utc::now();
        for source in next.api_sources.iter_mut() {
            let active = source.id == id;
            if source.is_active != active {
                source.is_active = active;
                source.updated_at = now;
            }
        }

        self.commit(next)?;
        tracing::info!(id, "active api source changed");
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Option<Value> {
        self.data.app_settings.get(key).cloned()
    }

    pub fn set_setting(&mut self, key: &str, value: Value) -> Result<()> {
        let mut next = self.data.clone();
        next.app_settings.insert(key.to_string(), value);
        self.commit(next)
    }
}
