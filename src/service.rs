//! Key Manager 서비스 (UI 경계 계층)
//!
//! Tauri 명령어가 호출하는 진입점입니다. CredentialStore를 단일 writer로
//! 감싸고, 소스 전환 시 ActivationSink 목록으로 자격 증명을 내보냅니다.

use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use crate::activation::{self, ActivationSink};
use crate::config::AppConfig;
use crate::error::{KeyManagerError, Result};
use crate::models::{EnvironmentStatus, ModelQueryResult, Source, SourceInput, SwitchResult};
use crate::probe::ModelProbe;
use crate::store::CredentialStore;

pub struct KeyManager {
    store: Mutex<CredentialStore>,
    sinks: Vec<Box<dyn ActivationSink>>,
    probe: ModelProbe,
}

impl KeyManager {
    pub fn new(store: CredentialStore, sinks: Vec<Box<dyn ActivationSink>>) -> Self {
        Self {
            store: Mutex::new(store),
            sinks,
            probe: ModelProbe::new(),
        }
    }

    /// 기본 경로의 저장소 + 현재 플랫폼 sink 구성
    pub fn open(config: &AppConfig) -> Result<Self> {
        let store = CredentialStore::open(config)?;
        Ok(Self::new(store, activation::system_sinks(config)))
    }

    fn store(&self) -> MutexGuard<'_, CredentialStore> {
        // 저장소는 commit 전까지 메모리를 바꾸지 않으므로 poison 상태여도 일관됨
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn list_sources(&self) -> Result<Vec<Source>> {
        self.store().list_all()
    }

    pub fn get_source(&self, id: u64) -> Result<Option<Source>> {
        self.store().get_by_id(id)
    }

    pub fn get_active_source(&self) -> Result<Option<Source>> {
        self.store().get_active()
    }

    pub fn save_source(&self, input: SourceInput) -> Result<u64> {
        self.store().save(input)
    }

    pub fn delete_source(&self, id: u64) -> Result<bool> {
        self.store().delete_by_id(id)
    }

    pub fn get_setting(&self, key: &str) -> Option<Value> {
        self.store().get_setting(key)
    }

    pub fn set_setting(&self, key: &str, value: Value) -> Result<()> {
        self.store().set_setting(key, value)
    }

    /// 활성 소스 전환
    ///
    /// 1. 평문 자격 증명 조회 (없으면 NotFound)
    /// 2. sink 순서대로 반영 (실패는 경고로 수집)
    /// 3. 저장소에 활성 표시
    ///
    /// 3단계가 실패하면 이미 반영된 sink는 그대로 두고 오류를 반환합니다.
    pub fn switch_source(&self, id: u64) -> Result<SwitchResult> {
        let mut store = self.store();
        let source = store.get_by_id(id)?.ok_or(KeyManagerError::NotFound(id))?;
        let credential = source.credential();

        let mut warnings = Vec::new();
        for sink in &self.sinks {
            if let Err(e) = sink.apply(&credential) {
                tracing::warn!(sink = sink.name(), "activation failed: {}", e);
                warnings.push(format!("{}: {}", sink.name(), e));
            }
        }

        if let Err(e) = store.set_active(id) {
            // sink 반영은 되돌리지 않음: 외부 설정은 새 소스, 저장소는 이전 활성 상태
            tracing::error!(id, "activation applied but active flag was not saved: {}", e);
            return Err(e);
        }
        tracing::info!(id, name = %source.name, "switched api source");

        Ok(SwitchResult {
            success: true,
            message: "API source switched successfully. Restart Claude Code for the new configuration to take effect.".to_string(),
            warnings,
        })
    }

    pub async fn query_models(&self, api_key: &str, api_base: &str) -> ModelQueryResult {
        self.probe.query_models(api_key, api_base).await
    }

    pub fn verify_environment(&self) -> EnvironmentStatus {
        activation::verify_environment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationError;
    use crate::models::Credential;
    use crate::secrets::{Cipher, MasterKey};
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[derive(Clone, Default)]
    struct RecordingSink {
        applied: Arc<Mutex<Vec<Credential>>>,
    }

    impl ActivationSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn apply(&self, credential: &Credential) -> std::result::Result<(), ActivationError> {
            self.applied.lock().unwrap().push(credential.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl ActivationSink for FailingSink {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn apply(&self, _: &Credential) -> std::result::Result<(), ActivationError> {
            Err(ActivationError::Command("setx exited with 1".to_string()))
        }
    }

    fn manager(dir: &tempfile::TempDir, sinks: Vec<Box<dyn ActivationSink>>) -> KeyManager {
        let store = CredentialStore::new(
            dir.path().join("data.json"),
            Cipher::with_iterations(MasterKey::generate(), 1_000),
        )
        .unwrap();
        KeyManager::new(store, sinks)
    }

    fn input(name: &str, api_key: &str, model: Option<&str>) -> SourceInput {
        SourceInput {
            name: name.to_string(),
            api_key: Some(api_key.to_string()),
            api_base: "https://api.anthropic.com".to_string(),
            model: model.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_switch_pushes_plaintext_credential() {
        let dir = tempdir().unwrap();
        let recorder = RecordingSink::default();
        let manager = manager(&dir, vec![Box::new(recorder.clone())]);

        manager.save_source(input("Official", "sk-aaa", None)).unwrap();
        let relay = manager
            .save_source(input("Relay", "sk-bbb", Some("claude-3-haiku-20240307")))
            .unwrap();

        let result = manager.switch_source(relay).unwrap();
        assert!(result.success);
        assert!(result.warnings.is_empty());

        let applied = recorder.applied.lock().unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].api_key, "sk-bbb");
        assert_eq!(applied[0].model.as_deref(), Some("claude-3-haiku-20240307"));

        assert_eq!(manager.get_active_source().unwrap().unwrap().id, relay);
    }

    #[test]
    fn test_sink_failure_is_a_warning() {
        let dir = tempdir().unwrap();
        let recorder = RecordingSink::default();
        let manager = manager(
            &dir,
            vec![Box::new(FailingSink), Box::new(recorder.clone())],
        );

        let id = manager.save_source(input("a", "sk-aaa", None)).unwrap();
        let result = manager.switch_source(id).unwrap();

        assert!(result.success);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("failing:"));
        // 뒤의 sink는 계속 실행된다
        assert_eq!(recorder.applied.lock().unwrap().len(), 1);
        assert!(manager.get_source(id).unwrap().unwrap().is_active);
    }

    #[test]
    fn test_switch_unknown_source() {
        let dir = tempdir().unwrap();
        let recorder = RecordingSink::default();
        let manager = manager(&dir, vec![Box::new(recorder.clone())]);

        let result = manager.switch_source(99);
        assert!(matches!(result, Err(KeyManagerError::NotFound(99))));
        assert!(recorder.applied.lock().unwrap().is_empty());
    }

    #[test]
    fn test_delete_and_settings_through_manager() {
        let dir = tempdir().unwrap();
        let manager = manager(&dir, Vec::new());

        let id = manager.save_source(input("a", "sk-aaa", None)).unwrap();
        assert!(manager.delete_source(id).unwrap());
        assert!(!manager.delete_source(id).unwrap());
        assert!(manager.list_sources().unwrap().is_empty());

        manager
            .set_setting("language", serde_json::json!("ko"))
            .unwrap();
        assert_eq!(
            manager.get_setting("language"),
            Some(serde_json::json!("ko"))
        );
    }

    #[test]
    fn test_open_with_system_sinks() {
        let dir = tempdir().unwrap();
        let config = AppConfig::with_home(dir.path());
        let manager = KeyManager::open(&config).unwrap();

        assert!(manager.list_sources().unwrap().is_empty());
        assert_eq!(manager.sinks.len(), 3);
    }

    #[test]
    fn test_flush_failure_after_activation() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let store = CredentialStore::new(
            data_dir.join("data.json"),
            Cipher::with_iterations(MasterKey::generate(), 1_000),
        )
        .unwrap();
        let recorder = RecordingSink::default();
        let manager = KeyManager::new(store, vec![Box::new(recorder.clone())]);

        let first = manager.save_source(input("a", "sk-aaa", None)).unwrap();
        let second = manager.save_source(input("b", "sk-bbb", None)).unwrap();
        manager.switch_source(first).unwrap();

        // 데이터 디렉토리 자리에 일반 파일이 있으면 flush 실패
        fs::remove_dir_all(&data_dir).unwrap();
        fs::write(&data_dir, "file, not a directory").unwrap();

        let result = manager.switch_source(second);
        assert!(matches!(result, Err(KeyManagerError::Storage(_))));

        let applied = recorder.applied.lock().unwrap();
        assert_eq!(applied.last().unwrap().api_key, "sk-bbb");
        assert_eq!(manager.get_active_source().unwrap().unwrap().id, first);
    }
}
