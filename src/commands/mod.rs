//! Tauri Commands Module
//!
//! 프론트엔드에서 호출 가능한 Tauri 명령어 정의

pub mod probe;
pub mod settings;
pub mod sources;
