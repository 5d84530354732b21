//! POSIX 쉘 설정 파일 반영
//!
//! 존재하는 설정 파일만 수정합니다. 기존 `export ANTHROPIC_*=` 라인과
//! 자동 생성 헤더를 지운 뒤 새 블록을 파일 끝에 추가합니다.

use std::fs;
use std::path::PathBuf;

use crate::activation::{ActivationError, ActivationSink};
use crate::config::{ENV_AUTH_TOKEN, ENV_BASE_URL, ENV_MODEL};
use crate::models::Credential;

pub const MANAGED_HEADER: &str = "# Claude API Configuration (auto-generated)";

pub struct ShellProfileSink {
    files: Vec<PathBuf>,
}

impl ShellProfileSink {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }
}

impl ActivationSink for ShellProfileSink {
    fn name(&self) -> &'static str {
        "shell profiles"
    }

    fn apply(&self, credential: &Credential) -> Result<(), ActivationError> {
        let mut failures = Vec::new();

        for path in &self.files {
            // 파일이 없거나 일반 파일이 아니면 건너뜀
            let meta = match fs::metadata(path) {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };
            // 쉘 설정 파일의 권한은 사용자 소유이므로 바꾸지 않고 알리기만 함
            if let Some(mode) = shared_mode(&meta) {
                tracing::warn!(
                    path = %path.display(),
                    "shell profile is readable by other users (mode {:o}), api key is stored in plaintext",
                    mode
                );
            }

            let result = fs::read_to_string(path)
                .and_then(|content| fs::write(path, rewrite_profile(&content, credential)));

            match result {
                Ok(()) => tracing::info!(path = %path.display(), "shell profile updated"),
                Err(e) => {
                    tracing::warn!(path = %path.display(), "failed to update shell profile: {}", e);
                    failures.push(format!("{} ({})", path.display(), e));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ActivationError::Files(failures.join(", ")))
        }
    }
}

/// group/other 읽기 권한이 있으면 권한 비트 반환
#[cfg(unix)]
fn shared_mode(meta: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;

    let mode = meta.permissions().mode() & 0o777;
    (mode & 0o044 != 0).then_some(mode)
}

#[cfg(not(unix))]
fn shared_mode(_meta: &fs::Metadata) -> Option<u32> {
    None
}

fn is_managed_line(line: &str) -> bool {
    let line = line.trim_start();
    line == MANAGED_HEADER
        || [ENV_AUTH_TOKEN, ENV_BASE_URL, ENV_MODEL]
            .iter()
            .any(|var| line.starts_with(&format!("export {}=", var)))
}

/// 큰따옴표 안에서 해석되는 문자 escape
fn shell_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

pub fn export_lines(credential: &Credential) -> Vec<String> {
    let mut lines = vec![
        format!("export {}={}", ENV_AUTH_TOKEN, shell_quote(&credential.api_key)),
        format!("export {}={}", ENV_BASE_URL, shell_quote(&credential.api_base)),
    ];
    if let Some(model) = &credential.model {
        lines.push(format!("export {}={}", ENV_MODEL, shell_quote(model)));
    }
    lines
}

/// 기존 관리 블록을 제거하고 새 블록을 추가한 내용 반환
pub fn rewrite_profile(content: &str, credential: &Credential) -> String {
    let mut kept: Vec<&str> = content.lines().filter(|l| !is_managed_line(l)).collect();
    while kept.last().is_some_and(|l| l.trim().is_empty()) {
        kept.pop();
    }

    let mut out = kept.join("\n");
    if !out.is_empty() {
        out.push_str("\n\n");
    }
    out.push_str(MANAGED_HEADER);
    out.push('\n');
    for line in export_lines(credential) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn credential(model: Option<&str>) -> Credential {
        Credential {
            api_key: "sk-aaa".to_string(),
            api_base: "https://api.anthropic.com".to_string(),
            model: model.map(str::to_string),
        }
    }

    #[test]
    fn test_rewrite_replaces_previous_block() {
        let original = "alias ll='ls -l'\nexport PATH=\"$HOME/bin:$PATH\"\n";
        let first = rewrite_profile(original, &credential(Some("claude-3-opus-20240229")));
        assert!(first.starts_with("alias ll='ls -l'\nexport PATH=\"$HOME/bin:$PATH\"\n\n"));
        assert!(first.contains("export ANTHROPIC_MODEL=\"claude-3-opus-20240229\""));

        // 모델이 없는 소스로 전환하면 모델 라인도 사라진다
        let second = rewrite_profile(&first, &credential(None));
        assert_eq!(second.matches(MANAGED_HEADER).count(), 1);
        assert_eq!(second.matches("export ANTHROPIC_AUTH_TOKEN=").count(), 1);
        assert!(!second.contains("ANTHROPIC_MODEL"));
        assert!(second.contains("export PATH="));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let once = rewrite_profile("# my rc\n", &credential(Some("m")));
        let twice = rewrite_profile(&once, &credential(Some("m")));
        assert_eq!(once, twice);

        let empty = rewrite_profile("", &credential(None));
        assert!(empty.starts_with(MANAGED_HEADER));
    }

    #[test]
    fn test_values_are_quoted() {
        let lines = export_lines(&Credential {
            api_key: "sk-$(rm -rf ~)\"`x`\\".to_string(),
            api_base: "https://a".to_string(),
            model: None,
        });
        assert_eq!(
            lines[0],
            "export ANTHROPIC_AUTH_TOKEN=\"sk-\\$(rm -rf ~)\\\"\\`x\\`\\\\\""
        );
    }

    #[test]
    fn test_only_existing_files_are_touched() {
        let dir = tempdir().unwrap();
        let bashrc = dir.path().join(".bashrc");
        let zshrc = dir.path().join(".zshrc");
        fs::write(&bashrc, "export EDITOR=vim\n").unwrap();

        let sink = ShellProfileSink::new(vec![bashrc.clone(), zshrc.clone()]);
        sink.apply(&credential(None)).unwrap();

        let content = fs::read_to_string(&bashrc).unwrap();
        assert!(content.contains("export EDITOR=vim"));
        assert!(content.contains("export ANTHROPIC_AUTH_TOKEN=\"sk-aaa\""));
        assert!(!zshrc.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_profile_mode_is_preserved_and_reported() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let bashrc = dir.path().join(".bashrc");
        fs::write(&bashrc, "export EDITOR=vim\n").unwrap();
        fs::set_permissions(&bashrc, fs::Permissions::from_mode(0o644)).unwrap();
        assert_eq!(shared_mode(&fs::metadata(&bashrc).unwrap()), Some(0o644));

        ShellProfileSink::new(vec![bashrc.clone()])
            .apply(&credential(None))
            .unwrap();
        let meta = fs::metadata(&bashrc).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o644);

        fs::set_permissions(&bashrc, fs::Permissions::from_mode(0o600)).unwrap();
        assert_eq!(shared_mode(&fs::metadata(&bashrc).unwrap()), None);
    }
}
