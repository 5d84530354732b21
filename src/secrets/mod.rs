//! 시크릿 암호화 모듈
//!
//! MasterKey + per-value AEAD 구조로 API 키를 at-rest 암호화합니다.
//!
//! - `master.key` 파일에 32바이트 마스터키 1개만 저장
//! - 각 API 키는 PBKDF2로 파생한 키로 AES-256-GCM 암호화

pub mod cipher;
pub mod master_key;

pub use cipher::{Cipher, CipherError};
pub use master_key::MasterKey;
