//! OS 사용자 환경 변수
//!
//! - Windows: `setx`로 사용자 레벨 환경 변수 저장, PowerShell로 확인
//! - POSIX: 사용자 레벨 저장소가 없으므로 현재 프로세스 값을 확인

use crate::config::{ENV_AUTH_TOKEN, ENV_BASE_URL, ENV_MODEL};
use crate::models::{mask_key, EnvironmentStatus};

#[cfg(windows)]
use crate::activation::{ActivationError, ActivationSink};
#[cfg(windows)]
use crate::models::Credential;

#[cfg(windows)]
pub struct WindowsUserEnvSink;

#[cfg(windows)]
impl ActivationSink for WindowsUserEnvSink {
    fn name(&self) -> &'static str {
        "user environment"
    }

    fn apply(&self, credential: &Credential) -> Result<(), ActivationError> {
        let mut vars = vec![
            (ENV_AUTH_TOKEN, credential.api_key.as_str()),
            (ENV_BASE_URL, credential.api_base.as_str()),
        ];
        if let Some(model) = &credential.model {
            vars.push((ENV_MODEL, model.as_str()));
        }

        for (name, value) in vars {
            let output = std::process::Command::new("setx")
                .args([name, value])
                .output()?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                tracing::warn!(var = name, "setx failed: {}", stderr.trim());
                return Err(ActivationError::Command(format!(
                    "setx {} exited with {}",
                    name, output.status
                )));
            }
            tracing::info!(var = name, "user environment variable set");
        }
        Ok(())
    }
}

/// 외부 도구가 보게 될 환경 변수 값 확인
pub fn verify_environment() -> EnvironmentStatus {
    #[cfg(windows)]
    {
        verify_windows()
    }
    #[cfg(not(windows))]
    {
        let mut status = EnvironmentStatus {
            success: true,
            ..Default::default()
        };
        for var in [ENV_AUTH_TOKEN, ENV_BASE_URL, ENV_MODEL] {
            let value = std::env::var(var).ok().filter(|v| !v.is_empty());
            status.variables.insert(var.to_string(), value);
        }
        log_status(&status);
        status
    }
}

#[cfg(windows)]
fn verify_windows() -> EnvironmentStatus {
    let script = format!(
        "Write-Output \"TOKEN:$([Environment]::GetEnvironmentVariable('{}', 'User'))\"; \
         Write-Output \"BASE_URL:$([Environment]::GetEnvironmentVariable('{}', 'User'))\"; \
         Write-Output \"MODEL:$([Environment]::GetEnvironmentVariable('{}', 'User'))\"",
        ENV_AUTH_TOKEN, ENV_BASE_URL, ENV_MODEL
    );

    match std::process::Command::new("powershell")
        .args(["-NoProfile", "-Command", &script])
        .output()
    {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let mut status = parse_powershell_output(&stdout);
            status.success = output.status.success();
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if !stderr.is_empty() {
                status.error = Some(stderr);
            }
            log_status(&status);
            status
        }
        Err(e) => {
            tracing::warn!("failed to verify environment variables: {}", e);
            EnvironmentStatus {
                success: false,
                error: Some(e.to_string()),
                ..Default::default()
            }
        }
    }
}

/// `TOKEN:...` / `BASE_URL:...` / `MODEL:...` 출력 파싱
#[cfg_attr(not(windows), allow(dead_code))]
fn parse_powershell_output(stdout: &str) -> EnvironmentStatus {
    let mut status = EnvironmentStatus::default();
    for line in stdout.lines() {
        let (var, value) = if let Some(v) = line.strip_prefix("TOKEN:") {
            (ENV_AUTH_TOKEN, v)
        } else if let Some(v) = line.strip_prefix("BASE_URL:") {
            (ENV_BASE_URL, v)
        } else if let Some(v) = line.strip_prefix("MODEL:") {
            (ENV_MODEL, v)
        } else {
            continue;
        };
        let value = value.trim();
        let value = (!value.is_empty()).then(|| value.to_string());
        status.variables.insert(var.to_string(), value);
    }
    status
}

fn log_status(status: &EnvironmentStatus) {
    for (var, value) in &status.variables {
        match value {
            Some(v) if var == ENV_AUTH_TOKEN => tracing::debug!("{}: {}", var, mask_key(v)),
            Some(v) => tracing::debug!("{}: {}", var, v),
            None => tracing::debug!("{}: <unset>", var),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_powershell_output() {
        let status = parse_powershell_output(
            "TOKEN:sk-win\r\nBASE_URL:https://api.anthropic.com\r\nMODEL:\r\n",
        );
        assert_eq!(
            status.variables.get(ENV_AUTH_TOKEN),
            Some(&Some("sk-win".to_string()))
        );
        assert_eq!(
            status.variables.get(ENV_BASE_URL),
            Some(&Some("https://api.anthropic.com".to_string()))
        );
        assert_eq!(status.variables.get(ENV_MODEL), Some(&None));
    }

    #[test]
    fn test_verify_reports_all_variables() {
        let status = verify_environment();
        for var in [ENV_AUTH_TOKEN, ENV_BASE_URL, ENV_MODEL] {
            assert!(status.variables.contains_key(var));
        }
    }
}
