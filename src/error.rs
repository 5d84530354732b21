//! Key Manager Error Types
//!
//! 애플리케이션 전역 에러 타입 정의

use serde::Serialize;
use thiserror::Error;

use crate::secrets::cipher::CipherError;

/// Key Manager 에러
#[derive(Error, Debug)]
pub enum KeyManagerError {
    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("API source not found: {0}")]
    NotFound(u64),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid master key: {0}")]
    InvalidMasterKey(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<CipherError> for KeyManagerError {
    fn from(error: CipherError) -> Self {
        match error {
            CipherError::Encrypt(msg) => KeyManagerError::Encryption(msg),
            other => KeyManagerError::Decryption(other.to_string()),
        }
    }
}

/// Tauri 명령 응답용 직렬화 가능한 에러
#[derive(Debug, Serialize)]
pub struct CommandError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<KeyManagerError> for CommandError {
    fn from(error: KeyManagerError) -> Self {
        let code = match &error {
            KeyManagerError::Encryption(_) => "ENCRYPTION_ERROR",
            KeyManagerError::Decryption(_) => "DECRYPTION_ERROR",
            KeyManagerError::NotFound(_) => "NOT_FOUND",
            KeyManagerError::Storage(_) => "STORAGE_ERROR",
            KeyManagerError::Serialization(_) => "SERIALIZATION_ERROR",
            KeyManagerError::InvalidMasterKey(_) => "INVALID_MASTER_KEY",
            KeyManagerError::InvalidInput(_) => "INVALID_INPUT",
        };

        CommandError {
            code: code.to_string(),
            message: error.to_string(),
            details: None,
        }
    }
}

/// Tauri 명령 결과 타입
pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// 코어 결과 타입
pub type Result<T> = std::result::Result<T, KeyManagerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_codes() {
        let err: CommandError = KeyManagerError::NotFound(7).into();
        assert_eq!(err.code, "NOT_FOUND");
        assert_eq!(err.message, "API source not found: 7");

        let err: CommandError = KeyManagerError::from(CipherError::Authentication).into();
        assert_eq!(err.code, "DECRYPTION_ERROR");

        let err = KeyManagerError::from(CipherError::InvalidEncoding("bad".to_string()));
        assert!(matches!(err, KeyManagerError::Decryption(_)));

        let err = KeyManagerError::from(CipherError::Encrypt("aead".to_string()));
        assert!(matches!(err, KeyManagerError::Encryption(_)));
    }
}
