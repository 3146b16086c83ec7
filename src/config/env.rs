use crate::utils::error::{EtlError, Result};
use std::path::{Path, PathBuf};

/// Where the credential variables came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvSource {
    File(PathBuf),
    /// No file found; only the process environment is used.
    ProcessOnly,
}

/// Loads a `.env` file into the process environment. Variables already set
/// in the environment are not overridden. A missing file is not an error.
pub fn load_dotenv(path: Option<&Path>) -> Result<EnvSource> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|_| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };

    match loaded {
        Ok(path) => Ok(EnvSource::File(path)),
        Err(e) if e.not_found() => Ok(EnvSource::ProcessOnly),
        Err(e) => Err(EtlError::ConfigValidationError {
            field: "env_file".to_string(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_env_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let source = load_dotenv(Some(&dir.path().join("absent.env"))).unwrap();
        assert_eq!(source, EnvSource::ProcessOnly);
    }

    #[test]
    fn test_loads_variables_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "RELAY_ENV_TEST_HOST=presto.internal").unwrap();
        writeln!(file, "RELAY_ENV_TEST_PORT=8443").unwrap();

        let source = load_dotenv(Some(file.path())).unwrap();
        assert_eq!(source, EnvSource::File(file.path().to_path_buf()));
        assert_eq!(std::env::var("RELAY_ENV_TEST_HOST").unwrap(), "presto.internal");
        assert_eq!(std::env::var("RELAY_ENV_TEST_PORT").unwrap(), "8443");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "NOT A VALID LINE ===").unwrap();
        writeln!(file, "'unterminated=\"x").unwrap();

        assert!(load_dotenv(Some(file.path())).is_err());
    }
}
