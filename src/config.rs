//! 앱 경로/상수 설정
//!
//! 기본 경로는 홈 디렉토리 기준이며, 환경 변수로 덮어쓸 수 있습니다.
//! - `CKM_DATA_DIR`: master.key / data.json 위치 (기본 `~/.claude-key-manager`)
//! - `CKM_CONSUMER_DIR`: 외부 도구용 config.json / claude.env 위치 (기본 `~/.claude`)
//! - `CKM_HOME`: 쉘 설정 파일(.bashrc 등)을 찾을 홈 디렉토리

use std::path::{Path, PathBuf};

use crate::error::KeyManagerError;

pub const DATA_DIR_NAME: &str = ".claude-key-manager";
pub const CONSUMER_DIR_NAME: &str = ".claude";
pub const MASTER_KEY_FILE: &str = "master.key";
pub const DATA_FILE: &str = "data.json";
pub const CONSUMER_CONFIG_FILE: &str = "config.json";
pub const CONSUMER_ENV_FILE: &str = "claude.env";

/// 활성 소스에 model이 없을 때 config.json에 기록할 기본 모델
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// 쉘 설정 파일 (POSIX)
pub const SHELL_PROFILE_FILES: &[&str] = &[".bashrc", ".zshrc", ".profile"];

/// 외부 도구가 읽는 환경 변수
pub const ENV_AUTH_TOKEN: &str = "ANTHROPIC_AUTH_TOKEN";
pub const ENV_BASE_URL: &str = "ANTHROPIC_BASE_URL";
pub const ENV_MODEL: &str = "ANTHROPIC_MODEL";

/// 현재 프로세스 전용 환경 변수
pub const ENV_LEGACY_KEY: &str = "CLAUDE_API_KEY";
pub const ENV_LEGACY_BASE: &str = "CLAUDE_API_BASE";
pub const ENV_LEGACY_MODEL: &str = "CLAUDE_MODEL";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub consumer_dir: PathBuf,
    pub home_dir: PathBuf,
}

impl AppConfig {
    /// 홈 디렉토리 기준 기본 설정 + 환경 변수 override
    pub fn from_env() -> Result<Self, KeyManagerError> {
        let home_dir = match std::env::var_os("CKM_HOME") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir().ok_or_else(|| {
                KeyManagerError::Storage(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "home directory not found",
                ))
            })?,
        };

        let mut config = Self::with_home(&home_dir);
        if let Some(dir) = std::env::var_os("CKM_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = std::env::var_os("CKM_CONSUMER_DIR") {
            config.consumer_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn with_home(home: &Path) -> Self {
        Self {
            data_dir: home.join(DATA_DIR_NAME),
            consumer_dir: home.join(CONSUMER_DIR_NAME),
            home_dir: home.to_path_buf(),
        }
    }

    pub fn master_key_path(&self) -> PathBuf {
        self.data_dir.join(MASTER_KEY_FILE)
    }

    pub fn data_path(&self) -> PathBuf {
        self.data_dir.join(DATA_FILE)
    }

    pub fn shell_profiles(&self) -> Vec<PathBuf> {
        SHELL_PROFILE_FILES
            .iter()
            .map(|name| self.home_dir.join(name))
            .collect()
    }
}
