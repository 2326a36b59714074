// Versions command for showing every build of one product

use crate::ui;
use ccpkg::catalog::CatalogClient;
use ccpkg::config::Config;
use ccpkg::error::Error;
use ccpkg::platform::Platform;
use console::style;

pub async fn versions(config: &Config, platform: Platform, sap_code: &str) -> anyhow::Result<i32> {
    let client = CatalogClient::new(config)?;
    let catalog = super::fetch_catalog(&client, platform).await?;

    let product = catalog
        .product(sap_code)
        .ok_or_else(|| Error::ProductNotFound {
            sap_code: sap_code.to_string(),
        })?;

    ui::header(&format!("{} ({})", product.display_name, product.sap_code));
    for version in product.versions().iter().rev() {
        let deps = match version.dependencies.len() {
            0 => String::new(),
            n => format!(", {} dependencies", n),
        };
        ui::line(&format!(
            "  {} {}",
            version.version,
            style(format!("build {}{}", version.build_guid, deps)).dim()
        ));
    }

    Ok(0)
}
