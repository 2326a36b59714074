// Constants module for vendor endpoints, headers and file names

pub const CATALOG_URL: &str = "https://cdn-ffc.oobesaas.adobe.com/core/v5/products/all";
pub const MANIFEST_URL: &str = "https://cdn-ffc.oobesaas.adobe.com/core/v3/applications";

/// Channels requested from the catalog endpoint
pub const CATALOG_CHANNELS: &str = "ccm,sti";

/// Channel whose products are listed to users
pub const PRIMARY_CHANNEL: &str = "ccm";

pub const APP_ID: &str = "accc-hdcore-desktop";
pub const USER_AGENT: &str = "Adobe Application Manager 2.0";
pub const API_KEY: &str = "CC_HD_ESD_1_0";

pub const APP_ID_HEADER: &str = "x-adobe-app-id";
pub const API_KEY_HEADER: &str = "x-api-key";
pub const BUILD_GUID_HEADER: &str = "x-adobe-build-guid";

pub const MANIFEST_FILE: &str = "application.json";
pub const DRIVER_FILE: &str = "driver.xml";
pub const CONFIG_FILE: &str = "ccpkg.toml";

pub const CORE_PACKAGE_TYPE: &str = "core";
pub const DEFAULT_LANGUAGE: &str = "en_US";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_CHUNK_SIZE: usize = 8192;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;
