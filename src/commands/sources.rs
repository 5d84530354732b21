//! API Source Commands
//!
//! API 소스 관리 관련 Tauri 명령어

use serde::Deserialize;
use tauri::State;

use crate::error::CommandResult;
use crate::models::{Source, SourceInput, SwitchResult};
use crate::service::KeyManager;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceIdArgs {
    pub source_id: u64,
}

/// 전체 소스 조회 (키 복호화 포함)
#[tauri::command]
pub async fn get_api_sources(manager: State<'_, KeyManager>) -> CommandResult<Vec<Source>> {
    Ok(manager.list_sources()?)
}

#[tauri::command]
pub async fn get_api_source(
    args: SourceIdArgs,
    manager: State<'_, KeyManager>,
) -> CommandResult<Option<Source>> {
    Ok(manager.get_source(args.source_id)?)
}

#[tauri::command]
pub async fn get_active_source(manager: State<'_, KeyManager>) -> CommandResult<Option<Source>> {
    Ok(manager.get_active_source()?)
}

/// 소스 저장 (id 없으면 생성), 사용된 id 반환
#[tauri::command]
pub async fn save_api_source(
    source: SourceInput,
    manager: State<'_, KeyManager>,
) -> CommandResult<u64> {
    Ok(manager.save_source(source)?)
}

#[tauri::command]
pub async fn delete_api_source(
    args: SourceIdArgs,
    manager: State<'_, KeyManager>,
) -> CommandResult<bool> {
    Ok(manager.delete_source(args.source_id)?)
}

/// 활성 소스 전환 + 환경 변수/설정 파일 반영
#[tauri::command]
pub async fn switch_api_source(
    args: SourceIdArgs,
    manager: State<'_, KeyManager>,
) -> CommandResult<SwitchResult> {
    Ok(manager.switch_source(args.source_id)?)
}
