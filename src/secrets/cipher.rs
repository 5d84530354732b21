//! 단일 텍스트 값 암호화/복호화
//!
//! Blob 포맷 (base64 인코딩 전):
//! - salt: 16 bytes (PBKDF2)
//! - iv: 16 bytes (AES-256-GCM nonce)
//! - tag: 16 bytes (GCM 인증 태그)
//! - ciphertext: 나머지
//!
//! 암호화마다 salt/iv를 새로 생성하므로 같은 평문도 매번 다른 blob이 나옵니다.

use aes_gcm::{
    aead::{consts::U16, AeadInPlace, KeyInit},
    aes::Aes256,
    AesGcm, Nonce, Tag,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::secrets::master_key::MasterKey;

/// 16-byte nonce를 쓰는 AES-256-GCM
type Aes256Gcm16 = AesGcm<Aes256, U16>;

pub const SALT_LEN: usize = 16;
pub const IV_LEN: usize = 16;
pub const TAG_LEN: usize = 16;
pub const HEADER_LEN: usize = SALT_LEN + IV_LEN + TAG_LEN;

/// 파생 키 길이 (256-bit)
pub const DERIVED_KEY_LEN: usize = 32;

/// PBKDF2 반복 횟수
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Cipher 오류
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("cipher failure: {0}")]
    Encrypt(String),

    #[error("invalid base64: {0}")]
    InvalidEncoding(String),

    #[error("blob too short: {0} bytes")]
    TooShort(usize),

    #[error("authentication tag mismatch")]
    Authentication,

    #[error("plaintext is not valid UTF-8")]
    InvalidUtf8,
}

/// MasterKey 기반 per-operation 키 파생 + AEAD
#[derive(Clone)]
pub struct Cipher {
    master_key: MasterKey,
    iterations: u32,
}

impl Cipher {
    pub fn new(master_key: MasterKey) -> Self {
        Self {
            master_key,
            iterations: PBKDF2_ITERATIONS,
        }
    }

    /// 테스트에서 PBKDF2 비용을 낮추기 위한 생성자
    #[cfg(test)]
    pub(crate) fn with_iterations(master_key: MasterKey, iterations: u32) -> Self {
        Self {
            master_key,
            iterations,
        }
    }

    fn derive_key(&self, salt: &[u8]) -> Zeroizing<[u8; DERIVED_KEY_LEN]> {
        let mut key = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
        pbkdf2::pbkdf2_hmac::<Sha256>(
            self.master_key.as_bytes(),
            salt,
            self.iterations,
            &mut key[..],
        );
        key
    }

    /// 평문을 암호화하여 base64 blob으로 반환
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut salt = [0u8; SALT_LEN];
        let mut iv = [0u8; IV_LEN];
        let mut rng = rand::thread_rng();
        rng.fill(&mut salt);
        rng.fill(&mut iv);

        let key = self.derive_key(&salt);
        let cipher = Aes256Gcm16::new_from_slice(&key[..])
            .map_err(|e| CipherError::Encrypt(e.to_string()))?;

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::<U16>::from_slice(&iv), b"", &mut buffer)
            .map_err(|e| CipherError::Encrypt(e.to_string()))?;

        let mut blob = Vec::with_capacity(HEADER_LEN + buffer.len());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&iv);
        blob.extend_from_slice(tag.as_slice());
        blob.extend_from_slice(&buffer);

        Ok(BASE64.encode(blob))
    }

    /// base64 blob을 복호화
    ///
    /// 태그 검증에 실패하면 어떤 부분 결과도 반환하지 않습니다.
    pub fn decrypt(&self, blob: &str) -> Result<String, CipherError> {
        let data = BASE64
            .decode(blob.trim())
            .map_err(|e| CipherError::InvalidEncoding(e.to_string()))?;

        if data.len() < HEADER_LEN {
            return Err(CipherError::TooShort(data.len()));
        }

        let (salt, rest) = data.split_at(SALT_LEN);
        let (iv, rest) = rest.split_at(IV_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let key = self.derive_key(salt);
        let cipher = Aes256Gcm16::new_from_slice(&key[..])
            .map_err(|_| CipherError::Authentication)?;

        let mut buffer = Zeroizing::new(ciphertext.to_vec());
        cipher
            .decrypt_in_place_detached(
                Nonce::<U16>::from_slice(iv),
                b"",
                buffer.as_mut_slice(),
                Tag::from_slice(tag),
            )
            .map_err(|_| CipherError::Authentication)?;

        String::from_utf8(buffer.to_vec()).map_err(|_| CipherError::InvalidUtf8)
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher")
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}
