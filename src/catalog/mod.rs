// Catalog module: typed records for the remote product catalog

use crate::platform::Platform;
use std::collections::HashMap;

pub mod client;
pub mod manifest;
pub mod xml;

pub use client::{CatalogClient, PackageSource};
pub use manifest::{Condition, PackageFile, PackageManifest};

/// Parsed product catalog for one platform
#[derive(Debug, Clone)]
pub struct Catalog {
    pub platform: Platform,
    /// Secure CDN base URL prepended to package paths
    pub cdn: String,
    products: Vec<ProductEntry>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductEntry {
    pub sap_code: String,
    pub display_name: String,
    pub hidden: bool,
    versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    pub sap_code: String,
    pub version: String,
    pub build_guid: String,
    pub dependencies: Vec<DependencyRef>,
}

/// Lookup key into another product's versions; the target may be absent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef {
    pub sap_code: String,
    pub version: String,
}

/// One `product` node of the catalog, with its visibility already decided
#[derive(Debug, Clone)]
pub struct ProductNode {
    pub display_name: String,
    pub hidden: bool,
    pub version: VersionEntry,
}

impl Catalog {
    pub fn new(platform: Platform, cdn: impl Into<String>) -> Self {
        Self {
            platform,
            cdn: cdn.into(),
            products: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert a product node, or merge it into the entry already recorded for its SAP code.
    ///
    /// The first node seen for a SAP code fixes `hidden` and `display_name`.
    /// Versions are keyed by version string: a repeated version replaces the
    /// earlier record in place, a new one is appended.
    pub fn upsert(&mut self, node: ProductNode) {
        let sap_code = node.version.sap_code.clone();
        let position = match self.index.get(&sap_code) {
            Some(&position) => position,
            None => {
                self.products.push(ProductEntry {
                    sap_code: sap_code.clone(),
                    display_name: node.display_name,
                    hidden: node.hidden,
                    versions: Vec::new(),
                });
                self.index.insert(sap_code, self.products.len() - 1);
                self.products.len() - 1
            }
        };
        self.products[position].insert_version(node.version);
    }

    pub fn product(&self, sap_code: &str) -> Option<&ProductEntry> {
        self.index.get(sap_code).map(|&i| &self.products[i])
    }

    /// All products in catalog order
    pub fn products(&self) -> impl Iterator<Item = &ProductEntry> {
        self.products.iter()
    }

    pub fn visible_products(&self) -> impl Iterator<Item = &ProductEntry> {
        self.products.iter().filter(|p| !p.hidden)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl ProductEntry {
    fn insert_version(&mut self, entry: VersionEntry) {
        match self.versions.iter_mut().find(|v| v.version == entry.version) {
            Some(existing) => *existing = entry,
            None => self.versions.push(entry),
        }
    }

    pub fn version(&self, version: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.version == version)
    }

    /// Versions oldest first, as listed in the catalog
    pub fn versions(&self) -> &[VersionEntry] {
        &self.versions
    }

    pub fn latest(&self) -> Option<&VersionEntry> {
        self.versions.last()
    }
}
