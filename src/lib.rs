//! Claude Key Manager - Tauri Backend Library
//!
//! 여러 API 소스를 암호화하여 보관하고, 활성 소스를 현재 프로세스와
//! 외부 도구(쉘 설정, 사용자 환경 변수, 설정 파일)에 반영합니다.

pub mod activation;
#[cfg(feature = "desktop")]
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod probe;
pub mod secrets;
pub mod service;
pub mod store;

pub use config::AppConfig;
pub use error::{KeyManagerError, Result};
pub use service::KeyManager;
pub use store::CredentialStore;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// tracing 구독자 설치 (`RUST_LOG`, 기본 `ckm_lib=info`)
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ckm_lib=info,claude_key_manager=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Tauri 앱 실행
#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::RunEvent;

    let _ = dotenvy::dotenv();
    init_tracing();

    tauri::Builder::default()
        .setup(|app| {
            use tauri::Manager;

            let config = AppConfig::from_env()?;
            tracing::info!(
                data_dir = %config.data_dir.display(),
                "starting Claude Key Manager v{}",
                env!("CARGO_PKG_VERSION")
            );

            // 저장소는 프로세스당 1회 생성하여 앱 상태로 관리
            let manager = KeyManager::open(&config)?;
            app.manage(manager);

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::sources::get_api_sources,
            commands::sources::get_api_source,
            commands::sources::get_active_source,
            commands::sources::save_api_source,
            commands::sources::delete_api_source,
            commands::sources::switch_api_source,
            commands::settings::get_setting,
            commands::settings::set_setting,
            commands::probe::query_models,
            commands::probe::verify_environment_variables,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|_app, event| {
            if let RunEvent::Exit = event {
                // 종료 시 프로세스 환경 변수의 자격 증명 제거
                activation::clear_process_environment();
            }
        });
}
