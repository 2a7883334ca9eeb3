//! Secret stores.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from resolving a secret.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret '{0}' not found")]
    NotFound(String),

    #[error("secret '{0}' is empty")]
    Empty(String),

    #[error("invalid secret name '{0}'")]
    InvalidName(String),

    /// The store could not be reached.
    #[error("secret store unavailable while reading '{name}': {reason}")]
    Unavailable { name: String, reason: String },

    #[error("failed to read secret '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Source of current secret values.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Latest version of `name`.
    async fn access(&self, name: &str) -> Result<String, SecretError>;
}

/// Reads `<prefix><name>` from the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore {
    prefix: String,
}

impl EnvSecretStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn access(&self, name: &str) -> Result<String, SecretError> {
        let var = format!("{}{}", self.prefix, name);
        match std::env::var(&var) {
            Ok(value) if value.trim().is_empty() => Err(SecretError::Empty(name.to_string())),
            Ok(value) => Ok(value),
            Err(std::env::VarError::NotPresent) => Err(SecretError::NotFound(name.to_string())),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::Unavailable {
                name: name.to_string(),
                reason: format!("{} is not valid unicode", var),
            }),
        }
    }
}

/// One file per secret, as mounted by volume-based secret managers.
#[derive(Debug, Clone)]
pub struct DirSecretStore {
    root: PathBuf,
}

impl DirSecretStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[async_trait]
impl SecretStore for DirSecretStore {
    async fn access(&self, name: &str) -> Result<String, SecretError> {
        if !is_valid_name(name) {
            return Err(SecretError::InvalidName(name.to_string()));
        }

        let path = self.root.join(name);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SecretError::NotFound(name.to_string())
            } else {
                SecretError::Io {
                    name: name.to_string(),
                    source: e,
                }
            }
        })?;

        let value = content.trim_end_matches(['\r', '\n']);
        if value.trim().is_empty() {
            return Err(SecretError::Empty(name.to_string()));
        }
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_env_store() {
        std::env::set_var("GENAI_BROKER_TEST_ENV_SECRET", "s3cr3t");
        std::env::set_var("GENAI_BROKER_TEST_BLANK", "  ");
        let store = EnvSecretStore::new("GENAI_BROKER_TEST_");

        assert_eq!(store.access("ENV_SECRET").await.unwrap(), "s3cr3t");
        assert!(matches!(store.access("BLANK").await, Err(SecretError::Empty(_))));
        assert!(matches!(store.access("ABSENT").await, Err(SecretError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_dir_store_strips_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("YOUTUBE_API_KEY"), "yt-key\n").unwrap();
        std::fs::write(dir.path().join("EMPTY"), "\n").unwrap();
        let store = DirSecretStore::new(dir.path());

        assert_eq!(store.access("YOUTUBE_API_KEY").await.unwrap(), "yt-key");
        assert!(matches!(store.access("EMPTY").await, Err(SecretError::Empty(_))));
        assert!(matches!(store.access("MISSING").await, Err(SecretError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_dir_store_rejects_traversal() {
        let store = DirSecretStore::new("/run/secrets");
        assert!(matches!(store.access("../etc/passwd").await, Err(SecretError::InvalidName(_))));
        assert!(matches!(store.access("..").await, Err(SecretError::InvalidName(_))));
    }
}
