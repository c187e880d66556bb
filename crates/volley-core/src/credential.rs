//! Credential sets and the sources that load them.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::CredentialError;
use crate::region::RegionClass;

/// Placeholder value some credential dumps use for a missing token.
const PLACEHOLDER_TOKEN: &str = "N/A";

/// Ordered, read-only list of opaque credentials shared by every worker of
/// a batch.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    tokens: Arc<[String]>,
}

impl CredentialSet {
    /// Build a set, dropping empty and placeholder entries.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens
            .into_iter()
            .map(Into::into)
            .filter(|t| !t.is_empty() && t != PLACEHOLDER_TOKEN)
            .collect();
        Self {
            tokens: tokens.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Credential used for the `attempt`-th attempt of a batch.
    ///
    /// Panics if the set is empty; the engine rejects empty sets before any
    /// attempt is reserved.
    pub fn for_attempt(&self, attempt: u64) -> &str {
        let idx = (attempt % self.tokens.len() as u64) as usize;
        &self.tokens[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

/// Loads the credential list for a routing class.
#[async_trait]
pub trait CredentialSource: Send + Sync + 'static {
    async fn load(&self, class: RegionClass) -> Result<CredentialSet, CredentialError>;
}

#[derive(Debug, Deserialize)]
struct TokenEntry {
    #[serde(default)]
    token: Option<String>,
}

/// Reads credentials from one JSON file per routing class.
///
/// Each file holds an array of objects; only the `token` field is used.
/// Classes without a configured file load as an empty set.
#[derive(Debug, Clone, Default)]
pub struct JsonFileCredentialSource {
    paths: HashMap<RegionClass, PathBuf>,
}

impl JsonFileCredentialSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, class: RegionClass, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(class, path.into());
        self
    }

    /// Parse a credential file's contents.
    pub fn parse(path: &str, content: &str) -> Result<CredentialSet, CredentialError> {
        let entries: Vec<TokenEntry> =
            serde_json::from_str(content).map_err(|source| CredentialError::Parse {
                path: path.to_string(),
                source,
            })?;
        Ok(CredentialSet::new(entries.into_iter().filter_map(|e| e.token)))
    }
}

#[async_trait]
impl CredentialSource for JsonFileCredentialSource {
    async fn load(&self, class: RegionClass) -> Result<CredentialSet, CredentialError> {
        let Some(path) = self.paths.get(&class) else {
            tracing::warn!(class = %class, "no credential file configured");
            return Ok(CredentialSet::default());
        };
        let shown = path.display().to_string();
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| CredentialError::Io {
                    path: shown.clone(),
                    source,
                })?;
        let set = Self::parse(&shown, &content)?;
        tracing::debug!(class = %class, path = %shown, count = set.len(), "loaded credentials");
        Ok(set)
    }
}

/// In-memory credential lists, keyed by routing class.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialSource {
    sets: HashMap<RegionClass, CredentialSet>,
}

impl StaticCredentialSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_set(mut self, class: RegionClass, set: CredentialSet) -> Self {
        self.sets.insert(class, set);
        self
    }
}

#[async_trait]
impl CredentialSource for StaticCredentialSource {
    async fn load(&self, class: RegionClass) -> Result<CredentialSet, CredentialError> {
        Ok(self.sets.get(&class).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn rotation_is_attempt_index_modulo_len() {
        let set = CredentialSet::new(["a", "b", "c"]);
        let picked: Vec<&str> = (0..7).map(|i| set.for_attempt(i)).collect();
        assert_eq!(picked, ["a", "b", "c", "a", "b", "c", "a"]);
    }

    #[test]
    fn placeholders_and_blanks_are_dropped() {
        let set = CredentialSet::new(["", "N/A", "tok"]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.for_attempt(5), "tok");
    }

    #[test]
    fn parse_skips_entries_without_token() {
        let json = r#"[
            {"uid": 1, "token": "first"},
            {"uid": 2},
            {"token": ""},
            {"token": "N/A"},
            {"token": "second"}
        ]"#;
        let set = JsonFileCredentialSource::parse("inline", json).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), ["first", "second"]);
    }

    #[test]
    fn parse_rejects_non_array() {
        let err = JsonFileCredentialSource::parse("inline", r#"{"token":"x"}"#).unwrap_err();
        assert!(matches!(err, CredentialError::Parse { .. }));
    }

    #[tokio::test]
    async fn file_source_reads_configured_class() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"token":"alpha"}},{{"token":"beta"}}]"#).unwrap();

        let source = JsonFileCredentialSource::new().with_file(RegionClass::India, file.path());
        let set = source.load(RegionClass::India).await.unwrap();
        assert_eq!(set.len(), 2);

        let missing = source.load(RegionClass::Americas).await.unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn file_source_reports_missing_file() {
        let source = JsonFileCredentialSource::new()
            .with_file(RegionClass::Global, "/definitely/not/here.json");
        let err = source.load(RegionClass::Global).await.unwrap_err();
        assert!(matches!(err, CredentialError::Io { .. }));
    }
}
