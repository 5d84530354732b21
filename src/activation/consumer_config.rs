//! 외부 도구용 설정 파일 반영
//!
//! `<consumer_dir>/config.json`과 `<consumer_dir>/claude.env`를 덮어씁니다.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activation::{write_private, ActivationError, ActivationSink};
use crate::config::{
    CONSUMER_CONFIG_FILE, CONSUMER_ENV_FILE, DEFAULT_MODEL, ENV_AUTH_TOKEN, ENV_BASE_URL,
    ENV_MODEL,
};
use crate::models::Credential;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub last_updated: DateTime<Utc>,
}

pub struct ConsumerConfigSink {
    dir: PathBuf,
}

impl ConsumerConfigSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

fn env_file_contents(credential: &Credential, now: DateTime<Utc>) -> String {
    let mut lines = vec![
        format!("{}={}", ENV_AUTH_TOKEN, credential.api_key),
        format!("{}={}", ENV_BASE_URL, credential.api_base),
    ];
    if let Some(model) = &credential.model {
        lines.push(format!("{}={}", ENV_MODEL, model));
    }
    lines.push(format!("# Last updated: {}", now.to_rfc3339()));
    lines.join("\n")
}

impl ActivationSink for ConsumerConfigSink {
    fn name(&self) -> &'static str {
        "consumer config"
    }

    fn apply(&self, credential: &Credential) -> Result<(), ActivationError> {
        fs::create_dir_all(&self.dir)?;
        let now = Utc::now();

        let config = ConsumerConfig {
            api_key: credential.api_key.clone(),
            api_base: credential.api_base.clone(),
            model: credential
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            last_updated: now,
        };
        let config_path = self.dir.join(CONSUMER_CONFIG_FILE);
        write_private(&config_path, &serde_json::to_vec_pretty(&config)?)?;
        tracing::info!(path = %config_path.display(), "consumer config updated");

        let env_path = self.dir.join(CONSUMER_ENV_FILE);
        write_private(&env_path, env_file_contents(credential, now).as_bytes())?;
        tracing::info!(path = %env_path.display(), "consumer env file updated");

        Ok(())
    }
}
