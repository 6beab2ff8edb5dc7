use indexmap::IndexMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{CaptionError, Result};

/// Ordered table of forced substring replacements.
///
/// Entries keep the order in which they appear in the mapping file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermMap {
    entries: IndexMap<String, String>,
}

impl TermMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON object or YAML mapping of source -> replacement strings.
    ///
    /// `.yaml` and `.yml` files are read as YAML, everything else as JSON.
    /// A file that does not exist yields an empty map; a file that exists but
    /// cannot be read or parsed is a configuration error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Special terms file {} not found, using an empty mapping", path.display());
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            CaptionError::Config(format!("Failed to read special terms file {}: {}", path.display(), e))
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_lowercase().as_str(), "yaml" | "yml"))
            .unwrap_or(false);

        let map = if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
        .map_err(|e| CaptionError::Config(format!("{} ({})", e, path.display())))?;

        info!("Loaded {} special terms from {}", map.len(), path.display());
        Ok(map)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let entries: IndexMap<String, String> = serde_json::from_str(content)
            .map_err(|e| CaptionError::Config(format!("Invalid special terms JSON: {}", e)))?;
        Ok(Self { entries })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty YAML document deserializes to unit, not a mapping
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        let entries: Option<IndexMap<String, String>> = serde_yaml::from_str(content)
            .map_err(|e| CaptionError::Config(format!("Invalid special terms YAML: {}", e)))?;
        Ok(Self {
            entries: entries.unwrap_or_default(),
        })
    }

    /// Replace every literal occurrence of each key with its value.
    ///
    /// Keys are applied one after another in map order, so a later key also
    /// matches text produced by an earlier replacement. With
    /// `{"A": "B", "B": "C"}` the input `"A"` becomes `"C"`.
    pub fn apply(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (source, replacement) in &self.entries {
            if source.is_empty() || !result.contains(source.as_str()) {
                continue;
            }
            debug!("Applying special term '{}' -> '{}'", source, replacement);
            result = result.replace(source.as_str(), replacement);
        }
        result
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TermMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
