// Package manifest (application.json) model

use crate::constants;
use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

const WHAT: &str = "package manifest";

/// Manifest for one product build: the document as fetched plus its package list
#[derive(Debug, Clone, PartialEq)]
pub struct PackageManifest {
    raw: Value,
    packages: Vec<PackageFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFile {
    #[serde(rename = "Path")]
    pub path: String,

    #[serde(rename = "PackageName", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,

    #[serde(rename = "Condition", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,

    #[serde(
        rename = "DownloadSize",
        default,
        deserialize_with = "lenient_size",
        skip_serializing_if = "Option::is_none"
    )]
    pub download_size: Option<u64>,
}

/// Language filter on a non-core package.
///
/// Manifests carry either a list of language codes or a condition expression
/// such as `[installLanguage]==en_US || [installLanguage]==en_GB`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Languages(Vec<String>),
    Expression(String),
}

impl Condition {
    pub fn is_empty(&self) -> bool {
        match self {
            Condition::Languages(languages) => languages.is_empty(),
            Condition::Expression(expr) => expr.trim().is_empty(),
        }
    }

    pub fn matches(&self, language: &str) -> bool {
        match self {
            Condition::Languages(languages) => languages.iter().any(|l| l == language),
            Condition::Expression(expr) => expr.contains(language),
        }
    }
}

impl PackageFile {
    pub fn is_core(&self) -> bool {
        self.package_type.as_deref() == Some(constants::CORE_PACKAGE_TYPE)
    }

    /// Whether this package applies to `language`, ignoring the core rule
    pub fn applies_to(&self, language: &str) -> bool {
        match &self.condition {
            None => true,
            Some(condition) => condition.is_empty() || condition.matches(language),
        }
    }
}

impl PackageManifest {
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(text).map_err(|e| Error::parse(WHAT, e.to_string()))?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: Value) -> Result<Self> {
        let list = raw
            .get("Packages")
            .and_then(|p| p.get("Package"))
            .ok_or_else(|| Error::parse(WHAT, "missing Packages.Package"))?;

        let packages: Vec<PackageFile> = serde_json::from_value(list.clone())
            .map_err(|e| Error::parse(WHAT, format!("invalid Packages.Package: {}", e)))?;

        Ok(Self { raw, packages })
    }

    pub fn packages(&self) -> &[PackageFile] {
        &self.packages
    }

    /// The document exactly as fetched, serialized without whitespace
    pub fn to_compact_json(&self) -> String {
        self.raw.to_string()
    }

    /// Write the manifest as `<dir>/application.json`, creating `dir` if needed
    pub async fn persist(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(constants::MANIFEST_FILE);
        tokio::fs::write(&path, self.to_compact_json()).await?;
        log::debug!("Saved {}", path.display());
        Ok(path)
    }
}

/// Accept sizes given as numbers or numeric strings; anything else is unknown
fn lenient_size<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
