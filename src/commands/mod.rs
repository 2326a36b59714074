// Command implementations; each returns the process exit code

pub mod download;
pub mod list;
pub mod versions;

use crate::ui;
use ccpkg::catalog::{Catalog, CatalogClient};
use ccpkg::platform::Platform;

/// Fetch the catalog for `platform` behind a spinner
pub(crate) async fn fetch_catalog(
    client: &CatalogClient,
    platform: Platform,
) -> anyhow::Result<Catalog> {
    let pb = ui::spinner(&format!("Fetching {} catalog...", platform));
    match client.fetch_catalog(platform).await {
        Ok(catalog) => {
            ui::finish_spinner_success(
                &pb,
                &format!("Fetched {} product(s) for {}", catalog.len(), platform),
            );
            Ok(catalog)
        }
        Err(e) => {
            let message = if e.is_network() {
                format!("Could not reach the {} catalog", platform)
            } else {
                format!("Failed to fetch {} catalog", platform)
            };
            ui::finish_spinner_error(&pb, &message);
            Err(e.into())
        }
    }
}
