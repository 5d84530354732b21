//! Settings Commands

use serde::Deserialize;
use serde_json::Value;
use tauri::State;

use crate::error::CommandResult;
use crate::service::KeyManager;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSettingArgs {
    pub key: String,
    pub value: Value,
}

#[tauri::command]
pub async fn get_setting(key: String, manager: State<'_, KeyManager>) -> CommandResult<Option<Value>> {
    Ok(manager.get_setting(&key))
}

#[tauri::command]
pub async fn set_setting(args: SetSettingArgs, manager: State<'_, KeyManager>) -> CommandResult<()> {
    Ok(manager.set_setting(&args.key, args.value)?)
}
