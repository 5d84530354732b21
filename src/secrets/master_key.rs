//! MasterKey 로드/생성
//!
//! - `master.key` 파일에 base64로 인코딩된 32바이트 키를 저장 (owner-only 권한)
//! - 파일이 없으면 CSPRNG로 새로 생성
//! - 파일이 있는데 읽을 수 없거나 형식이 잘못되면 오류 (재생성하면 기존 Profile 복호화 불가)

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use zeroize::Zeroize;

use crate::error::KeyManagerError;
use crate::store::file::write_private_atomic;

/// 마스터키 길이 (256-bit)
pub const MASTER_KEY_LEN: usize = 32;

/// Zeroize가 적용된 마스터키 래퍼
#[derive(Clone)]
pub struct MasterKey {
    bytes: [u8; MASTER_KEY_LEN],
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(***)")
    }
}

impl MasterKey {
    /// 마스터키 생성 (CSPRNG)
    pub fn generate() -> Self {
        let mut bytes = [0u8; MASTER_KEY_LEN];
        rand::thread_rng().fill(&mut bytes);
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn decode(encoded: &str) -> Result<Self, KeyManagerError> {
        let mut decoded = BASE64
            .decode(encoded.trim())
            .map_err(|e| KeyManagerError::InvalidMasterKey(e.to_string()))?;

        if decoded.len() != MASTER_KEY_LEN {
            let len = decoded.len();
            decoded.zeroize();
            return Err(KeyManagerError::InvalidMasterKey(format!(
                "expected {} bytes, got {}",
                MASTER_KEY_LEN, len
            )));
        }

        let mut bytes = [0u8; MASTER_KEY_LEN];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self { bytes })
    }

    /// 파일에서 마스터키 로드 (없으면 생성 후 저장)
    pub fn load_or_create(path: &Path) -> Result<Self, KeyManagerError> {
        match fs::read_to_string(path) {
            Ok(mut encoded) => {
                let key = Self::decode(&encoded);
                encoded.zeroize();
                tracing::debug!(path = %path.display(), "master key loaded");
                key
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no master key found, generating new one");
                let key = Self::generate();
                key.persist(path)?;
                Ok(key)
            }
            Err(e) => Err(KeyManagerError::Storage(e)),
        }
    }

    /// owner-only 권한으로 키 파일 기록 (임시 파일 → rename)
    ///
    /// 기록 도중 중단되어도 잘린 `master.key`가 남지 않습니다.
    fn persist(&self, path: &Path) -> Result<(), KeyManagerError> {
        let mut encoded = BASE64.encode(self.bytes);
        let written = write_private_atomic(path, encoded.as_bytes());
        encoded.zeroize();
        written?;
        Ok(())
    }
}
