// Driver descriptor (driver.xml) consumed by the vendor installer

use crate::catalog::ProductEntry;
use crate::constants;
use crate::error::Result;
use crate::platform::Platform;
use crate::resolver::{PlanEntry, ResolvedDownloadPlan};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverDescriptor {
    pub name: String,
    pub sap_code: String,
    pub version: String,
    pub platform: Platform,
    pub dependencies: Vec<PlanEntry>,
    pub install_dir: String,
    pub install_language: String,
}

impl DriverDescriptor {
    /// Describe the plan's primary product.
    ///
    /// Only dependencies that resolved against the catalog are listed; unresolved ones are left out.
    pub fn new(
        product: &ProductEntry,
        plan: &ResolvedDownloadPlan,
        platform: Platform,
        install_language: &str,
    ) -> Option<Self> {
        let primary = plan.primary()?;
        Some(Self {
            name: format!("Adobe {}", product.display_name),
            sap_code: primary.sap_code.clone(),
            version: primary.version.clone(),
            platform,
            dependencies: plan.dependencies().to_vec(),
            install_dir: platform.install_dir().to_string(),
            install_language: install_language.to_string(),
        })
    }

    pub fn render(&self) -> String {
        let mut dependencies = String::new();
        for dep in &self.dependencies {
            dependencies.push_str(&format!(
                "            <Dependency>\n                <SAPCode>{sap}</SAPCode>\n                <BaseVersion>{version}</BaseVersion>\n                <EsdDirectory>./{sap}</EsdDirectory>\n            </Dependency>\n",
                sap = escape(&dep.sap_code),
                version = escape(&dep.version),
            ));
        }

        format!(
            "<DriverInfo>
    <ProductInfo>
        <Name>{name}</Name>
        <SAPCode>{sap}</SAPCode>
        <CodexVersion>{version}</CodexVersion>
        <Platform>{platform}</Platform>
        <EsdDirectory>./{sap}</EsdDirectory>
        <Dependencies>
{dependencies}        </Dependencies>
    </ProductInfo>
    <RequestInfo>
        <InstallDir>{install_dir}</InstallDir>
        <InstallLanguage>{language}</InstallLanguage>
    </RequestInfo>
</DriverInfo>
",
            name = escape(&self.name),
            sap = escape(&self.sap_code),
            version = escape(&self.version),
            platform = self.platform,
            install_dir = escape(&self.install_dir),
            language = escape(&self.install_language),
        )
    }

    /// Write `<dir>/driver.xml`
    pub async fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(constants::DRIVER_FILE);
        tokio::fs::write(&path, self.render()).await?;
        log::debug!("Wrote {}", path.display());
        Ok(path)
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
