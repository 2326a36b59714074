// List command for showing the products of a platform catalog

use crate::ui;
use ccpkg::catalog::{CatalogClient, ProductEntry};
use ccpkg::config::Config;
use ccpkg::platform::Platform;
use console::style;

pub async fn list(config: &Config, platform: Platform, all: bool) -> anyhow::Result<i32> {
    let client = CatalogClient::new(config)?;
    let catalog = super::fetch_catalog(&client, platform).await?;

    let products: Vec<&ProductEntry> = if all {
        catalog.products().collect()
    } else {
        catalog.visible_products().collect()
    };

    if products.is_empty() {
        ui::warning(&format!("No products available for {}", platform));
        return Ok(0);
    }

    for product in products {
        let latest = product.latest().map_or("-", |v| v.version.as_str());
        let mut row = format!(
            "[{}] {} {}",
            style(&product.sap_code).cyan(),
            product.display_name,
            style(latest).dim()
        );
        if product.hidden {
            row.push_str(&format!(" {}", style("(hidden)").yellow()));
        }
        ui::line(&row);
    }

    Ok(0)
}
