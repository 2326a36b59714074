// Shared HTTP client utilities

use crate::config::TransportConfig;
use crate::constants;
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};

/// Build the client used for catalog, manifest and file requests.
///
/// Every request carries the vendor app id, user agent and API key.
pub fn build_client(transport: &TransportConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(constants::APP_ID_HEADER),
        header_value(&transport.app_id)?,
    );
    headers.insert(
        HeaderName::from_static(constants::API_KEY_HEADER),
        header_value(&transport.api_key)?,
    );

    Client::builder()
        .user_agent(transport.user_agent.as_str())
        .default_headers(headers)
        .connect_timeout(transport.connect_timeout())
        .read_timeout(transport.read_timeout())
        .danger_accept_invalid_certs(transport.accept_invalid_certs)
        .build()
        .map_err(|e| Error::config(format!("failed to create HTTP client: {}", e)))
}

pub fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::config(format!("invalid header value: {:?}", value)))
}

/// Send a GET request with extra headers and return the body as text
pub async fn fetch_text(client: &Client, url: &str, headers: HeaderMap) -> Result<String> {
    log::debug!("GET {}", url);
    let response: Response = client
        .get(url)
        .headers(headers)
        .send()
        .await
        .map_err(|source| Error::Network {
            url: url.to_string(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    response.text().await.map_err(|source| Error::Network {
        url: url.to_string(),
        source,
    })
}

/// Extract the file name from the last URL path segment, without the query string
pub fn file_name_from_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
        .to_string()
}
