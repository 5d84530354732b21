//! Model Probe / Environment Commands

use serde::Deserialize;
use tauri::State;

use crate::error::CommandResult;
use crate::models::{EnvironmentStatus, ModelQueryResult};
use crate::service::KeyManager;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryModelsArgs {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_base: String,
}

/// 모델 목록 조회 (실패도 결과 객체로 반환)
#[tauri::command]
pub async fn query_models(
    args: QueryModelsArgs,
    manager: State<'_, KeyManager>,
) -> CommandResult<ModelQueryResult> {
    Ok(manager.query_models(&args.api_key, &args.api_base).await)
}

#[tauri::command]
pub async fn verify_environment_variables(
    manager: State<'_, KeyManager>,
) -> CommandResult<EnvironmentStatus> {
    Ok(manager.verify_environment())
}
