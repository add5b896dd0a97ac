//! Repository index types
//!
//! Helm-compatible `index.yaml` format. Entries keep document order.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{RepoError, Result};

/// Repository index (Helm-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    /// API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// When this index was generated
    #[serde(default = "Utc::now")]
    pub generated: DateTime<Utc>,

    /// Package versions indexed by package name
    #[serde(default)]
    pub entries: IndexMap<String, Vec<VersionEntry>>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

impl Default for IndexDocument {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            generated: Utc::now(),
            entries: IndexMap::new(),
        }
    }
}

impl IndexDocument {
    /// Parse index from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| RepoError::IndexParseError {
            message: e.to_string(),
        })
    }

    /// Parse index from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let yaml = std::str::from_utf8(bytes).map_err(|e| RepoError::IndexParseError {
            message: format!("Invalid UTF-8: {}", e),
        })?;
        Self::from_yaml(yaml)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Get all versions of a package
    pub fn get(&self, name: &str) -> Option<&Vec<VersionEntry>> {
        self.entries.get(name)
    }

    /// List all package names in document order
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    /// Total number of version entries across all packages
    pub fn version_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Add an entry to the index
    pub fn add_entry(&mut self, entry: VersionEntry) {
        self.entries
            .entry(entry.name.clone())
            .or_default()
            .push(entry);
    }

    /// Order every package's versions newest first.
    ///
    /// Unparsable versions sort after parsable ones and keep their relative
    /// order.
    pub fn sort_entries(&mut self) {
        for versions in self.entries.values_mut() {
            versions.sort_by(|a, b| {
                match (a.parsed_version(), b.parsed_version()) {
                    (Some(va), Some(vb)) => vb.cmp(&va),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
            });
        }
    }
}

/// One published version of a package, with its chart metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    /// Package name
    #[serde(default)]
    pub name: String,

    /// Package version (semver)
    pub version: String,

    /// Application version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,

    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Home URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,

    /// Icon URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Keywords for search
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// URLs to download the package archive
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,

    /// SHA256 digest of the archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,

    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// Deprecated flag
    #[serde(default)]
    pub deprecated: bool,

    /// Annotations
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub annotations: HashMap<String, String>,

    /// Chart API version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Chart type (application or library)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
}

impl VersionEntry {
    /// Create a minimal entry
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    /// Parse version as semver (lenient, see [`crate::constraint::parse_version`])
    pub fn parsed_version(&self) -> Option<Version> {
        crate::constraint::parse_version(&self.version).ok()
    }
}
