//! 활성 소스 반영 (Activation Sink)
//!
//! 소스 전환 시 평문 자격 증명을 외부로 내보내는 부수 효과를 trait 뒤로 분리합니다.
//! - 현재 프로세스 환경 변수
//! - Windows: 사용자 환경 변수 (`setx`)
//! - POSIX: 쉘 설정 파일 (.bashrc / .zshrc / .profile)
//! - 외부 도구용 `config.json` + `claude.env`
//!
//! 코어(CredentialStore)는 이 모듈을 직접 호출하지 않습니다.

pub mod consumer_config;
pub mod process_env;
pub mod shell_profile;
pub mod user_env;

use std::path::Path;

use crate::config::AppConfig;
use crate::models::Credential;

pub use consumer_config::ConsumerConfigSink;
pub use process_env::{clear_process_environment, ProcessEnvSink};
pub use shell_profile::ShellProfileSink;
pub use user_env::verify_environment;

/// Activation 오류
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("Failed to update: {0}")]
    Files(String),
}

/// 활성 자격 증명을 외부에 반영하는 capability
pub trait ActivationSink: Send + Sync {
    /// 로그/경고 메시지용 이름
    fn name(&self) -> &'static str;

    fn apply(&self, credential: &Credential) -> Result<(), ActivationError>;
}

/// 현재 플랫폼의 기본 sink 목록
///
/// 순서가 중요: 프로세스 환경 변수가 항상 먼저 반영됩니다.
pub fn system_sinks(config: &AppConfig) -> Vec<Box<dyn ActivationSink>> {
    let mut sinks: Vec<Box<dyn ActivationSink>> = vec![Box::new(ProcessEnvSink)];

    #[cfg(windows)]
    sinks.push(Box::new(user_env::WindowsUserEnvSink));

    #[cfg(not(windows))]
    sinks.push(Box::new(ShellProfileSink::new(config.shell_profiles())));

    sinks.push(Box::new(ConsumerConfigSink::new(config.consumer_dir.clone())));
    sinks
}

/// 평문 키가 담긴 파일 기록 (unix에서는 기존 파일이 있어도 owner-only로 교체)
pub(crate) fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    crate::store::file::write_private_atomic(path, contents)
}
