//! 저장 파일 I/O
//!
//! `data.json`을 통째로 읽고 쓰며, 쓰기는 임시 파일에 기록한 뒤 rename 합니다.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::error::KeyManagerError;
use crate::models::StoreData;

/// 저장 파일 로드 (파일이 없으면 빈 저장소)
pub fn load(path: &Path) -> Result<StoreData, KeyManagerError> {
    match fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(StoreData::default()),
        Err(e) => Err(KeyManagerError::Storage(e)),
    }
}

/// Atomic write: 임시 파일에 쓰고 rename
pub fn write_atomic(path: &Path, data: &StoreData) -> Result<(), KeyManagerError> {
    let json = serde_json::to_vec_pretty(data)?;
    write_private_atomic(path, &json)?;
    Ok(())
}

/// owner-only(0600) 임시 파일에 기록 후 rename
///
/// 기존 파일의 권한은 이어받지 않습니다. rename 이전에 중단되면 대상 파일은 그대로입니다.
pub(crate) fn write_private_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(&tmp_path)?;
    // 이전에 남은 임시 파일은 mode가 적용되지 않으므로 다시 지정
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let data = load(&dir.path().join("data.json")).unwrap();
        assert_eq!(data, StoreData::default());
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub").join("data.json");

        let mut data = StoreData::default();
        data.next_id = 5;
        data.app_settings
            .insert("theme".to_string(), serde_json::json!("dark"));
        write_atomic(&path, &data).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("sub").join("data.json.tmp").exists());
        assert_eq!(load(&path).unwrap(), data);
    }

    #[test]
    fn test_corrupted_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load(&path), Err(KeyManagerError::Serialization(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_overwrite_resets_mode_to_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        // 이전 실행에서 남은 임시 파일도 권한을 물려주지 않는다
        let stale = dir.path().join("config.json.tmp");
        fs::write(&stale, "partial").unwrap();
        fs::set_permissions(&stale, fs::Permissions::from_mode(0o666)).unwrap();

        write_private_atomic(&path, b"{\"apiKey\":\"sk-secret\"}").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"apiKey\":\"sk-secret\"}");
        assert!(!stale.exists());
    }
}
