//! 현재 프로세스 환경 변수 반영

use crate::activation::{ActivationError, ActivationSink};
use crate::config::{
    ENV_AUTH_TOKEN, ENV_BASE_URL, ENV_LEGACY_BASE, ENV_LEGACY_KEY, ENV_LEGACY_MODEL, ENV_MODEL,
};
use crate::models::Credential;

const ALL_VARS: &[&str] = &[
    ENV_LEGACY_KEY,
    ENV_LEGACY_BASE,
    ENV_LEGACY_MODEL,
    ENV_AUTH_TOKEN,
    ENV_BASE_URL,
    ENV_MODEL,
];

pub struct ProcessEnvSink;

impl ActivationSink for ProcessEnvSink {
    fn name(&self) -> &'static str {
        "process environment"
    }

    fn apply(&self, credential: &Credential) -> Result<(), ActivationError> {
        std::env::set_var(ENV_LEGACY_KEY, &credential.api_key);
        std::env::set_var(ENV_LEGACY_BASE, &credential.api_base);
        std::env::set_var(ENV_AUTH_TOKEN, &credential.api_key);
        std::env::set_var(ENV_BASE_URL, &credential.api_base);

        match &credential.model {
            Some(model) => {
                std::env::set_var(ENV_LEGACY_MODEL, model);
                std::env::set_var(ENV_MODEL, model);
            }
            None => {
                // 이전 소스의 모델이 남지 않도록
                std::env::remove_var(ENV_LEGACY_MODEL);
                std::env::remove_var(ENV_MODEL);
            }
        }
        Ok(())
    }
}

/// 앱 종료 시 프로세스 환경 변수에서 자격 증명 제거
pub fn clear_process_environment() {
    for var in ALL_VARS {
        std::env::remove_var(var);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 프로세스 전역 상태를 건드리는 유일한 테스트
    #[test]
    fn test_apply_then_clear() {
        let sink = ProcessEnvSink;
        sink.apply(&Credential {
            api_key: "sk-env".to_string(),
            api_base: "https://relay.example.com".to_string(),
            model: Some("claude-3-haiku-20240307".to_string()),
        })
        .unwrap();

        assert_eq!(std::env::var(ENV_AUTH_TOKEN).unwrap(), "sk-env");
        assert_eq!(std::env::var(ENV_LEGACY_KEY).unwrap(), "sk-env");
        assert_eq!(
            std::env::var(ENV_BASE_URL).unwrap(),
            "https://relay.example.com"
        );
        assert_eq!(
            std::env::var(ENV_MODEL).unwrap(),
            "claude-3-haiku-20240307"
        );

        sink.apply(&Credential {
            api_key: "sk-env-2".to_string(),
            api_base: "https://api.anthropic.com".to_string(),
            model: None,
        })
        .unwrap();
        assert!(std::env::var(ENV_MODEL).is_err());
        assert!(std::env::var(ENV_LEGACY_MODEL).is_err());

        clear_process_environment();
        for var in ALL_VARS {
            assert!(std::env::var(var).is_err());
        }
    }
}
