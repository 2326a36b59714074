// Resolver: turns a catalog selection into a download plan and filters package files

use crate::catalog::{Catalog, PackageFile, PackageManifest};
use crate::error::{Error, Result};
use log::{info, warn};
use std::fmt;

/// One product build to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub sap_code: String,
    pub version: String,
    pub build_guid: String,
}

impl fmt::Display for PlanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.sap_code, self.version)
    }
}

/// Primary product first, then its dependencies in declared order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDownloadPlan {
    pub entries: Vec<PlanEntry>,
    /// Dependencies that were skipped because the catalog does not contain them
    pub unresolved: Vec<UnresolvedDependency>,
}

impl ResolvedDownloadPlan {
    pub fn primary(&self) -> Option<&PlanEntry> {
        self.entries.first()
    }

    pub fn dependencies(&self) -> &[PlanEntry] {
        self.entries.get(1..).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingTarget {
    Product,
    Version,
}

impl fmt::Display for MissingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingTarget::Product => f.write_str("product missing"),
            MissingTarget::Version => f.write_str("version missing"),
        }
    }
}

/// A dependency whose target is absent from the catalog. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("dependency '{sap_code}' with version '{version}' not found in catalog ({missing})")]
pub struct UnresolvedDependency {
    pub sap_code: String,
    pub version: String,
    pub missing: MissingTarget,
}

/// Resolve `sap_code`/`version` against the catalog.
///
/// # Errors
///
/// `ProductNotFound` or `VersionNotFound` when the primary selection is absent.
/// Missing dependency targets are recorded in `unresolved` and skipped.
pub fn resolve(catalog: &Catalog, sap_code: &str, version: &str) -> Result<ResolvedDownloadPlan> {
    let product = catalog
        .product(sap_code)
        .ok_or_else(|| Error::ProductNotFound {
            sap_code: sap_code.to_string(),
        })?;
    let primary = product
        .version(version)
        .ok_or_else(|| Error::VersionNotFound {
            sap_code: sap_code.to_string(),
            version: version.to_string(),
        })?;

    let mut plan = ResolvedDownloadPlan::default();
    plan.entries.push(PlanEntry {
        sap_code: primary.sap_code.clone(),
        version: primary.version.clone(),
        build_guid: primary.build_guid.clone(),
    });

    for dependency in &primary.dependencies {
        let target = match catalog.product(&dependency.sap_code) {
            None => Err(MissingTarget::Product),
            Some(product) => product
                .version(&dependency.version)
                .ok_or(MissingTarget::Version),
        };

        match target {
            Ok(entry) => plan.entries.push(PlanEntry {
                sap_code: entry.sap_code.clone(),
                version: entry.version.clone(),
                build_guid: entry.build_guid.clone(),
            }),
            Err(missing) => {
                let unresolved = UnresolvedDependency {
                    sap_code: dependency.sap_code.clone(),
                    version: dependency.version.clone(),
                    missing,
                };
                warn!("{}, skipping", unresolved);
                plan.unresolved.push(unresolved);
            }
        }
    }

    info!(
        "Resolved {} {} to {} package set(s)",
        sap_code,
        version,
        plan.entries.len()
    );
    Ok(plan)
}

/// Files selected from one manifest, in manifest order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    pub files: Vec<PackageFile>,
    pub core_count: usize,
    pub noncore_count: usize,
}

/// Select the package files that apply to `install_language`.
///
/// Core packages are always taken. Other packages are taken when they carry no
/// condition or their condition names the language.
pub fn select_files(files: &[PackageFile], install_language: &str) -> FileSelection {
    let mut selection = FileSelection::default();
    for file in files {
        if file.is_core() {
            selection.core_count += 1;
        } else if file.applies_to(install_language) {
            selection.noncore_count += 1;
        } else {
            continue;
        }
        selection.files.push(file.clone());
    }
    selection
}

impl PackageManifest {
    pub fn select_files(&self, install_language: &str) -> FileSelection {
        select_files(self.packages(), install_language)
    }
}
