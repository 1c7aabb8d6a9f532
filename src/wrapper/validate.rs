//! Validation functions for job arguments and env keys.

use std::path::Path;
use validator::ValidationError;

pub fn validate_backup_name<S: AsRef<str>>(name: S) -> Result<(), ValidationError> {
    let name = name.as_ref();
    if name.is_empty() {
        return Err(ValidationError::new("InvalidBackupName")
            .with_message("backup name must not be empty".into()));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::new("InvalidBackupName").with_message(
            format!("invalid backup name {name:?}, allowed characters are [A-Za-z0-9_-]").into(),
        ));
    }

    Ok(())
}

/// Accepts a missing path (the backup tool creates it) but rejects a path that
/// exists and is not a directory.
pub fn validate_dir_or_absent<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    if dir.exists() && !dir.is_dir() {
        return Err(ValidationError::new("InvalidDirectory")
            .with_message(format!("{:?} is not a directory", dir).into()));
    }

    Ok(())
}

pub fn validate_non_empty_path<P: AsRef<Path>>(path: P) -> Result<(), ValidationError> {
    if path.as_ref().as_os_str().is_empty() {
        return Err(ValidationError::new("EmptyPath").with_message("path must not be empty".into()));
    }

    Ok(())
}

/// Env keys follow the shell variable rule `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_env_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_backup_name() {
        assert!(validate_backup_name("remote-linode").is_ok());
        assert!(validate_backup_name("local_NAS-2").is_ok());

        assert!(validate_backup_name("").is_err());
        assert!(validate_backup_name("../etc/passwd").is_err());
        assert!(validate_backup_name("with space").is_err());
        assert!(validate_backup_name("dot.name").is_err());
    }

    #[test]
    fn test_validate_dir_or_absent() {
        let temp_dir = TempDir::new().unwrap();
        assert!(validate_dir_or_absent(temp_dir.path()).is_ok());
        assert!(validate_dir_or_absent(temp_dir.path().join("not-yet")).is_ok());

        let file_path = temp_dir.path().join("file");
        std::fs::write(&file_path, "x").unwrap();
        assert!(validate_dir_or_absent(&file_path).is_err());
    }

    #[test]
    fn test_validate_non_empty_path() {
        assert!(validate_non_empty_path("restic").is_ok());
        assert!(validate_non_empty_path("").is_err());
    }

    #[test]
    fn test_is_valid_env_key() {
        assert!(is_valid_env_key("RESTIC_REPOSITORY"));
        assert!(is_valid_env_key("_private"));
        assert!(is_valid_env_key("AWS_ACCESS_KEY_ID2"));

        assert!(!is_valid_env_key(""));
        assert!(!is_valid_env_key("2FA"));
        assert!(!is_valid_env_key("WITH-DASH"));
        assert!(!is_valid_env_key("export FOO"));
    }
}
