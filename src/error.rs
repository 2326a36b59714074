// Error types shared by the catalog, resolver and download layers

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("failed to parse {what}: {message}")]
    Parse { what: &'static str, message: String },

    #[error("product '{sap_code}' not found in catalog")]
    ProductNotFound { sap_code: String },

    #[error("version '{version}' of product '{sap_code}' not found in catalog")]
    VersionNotFound { sap_code: String, version: String },

    #[error("failed to download {url} after {attempts} attempt(s): {message}")]
    Download {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn parse<S: Into<String>>(what: &'static str, message: S) -> Self {
        Error::Parse {
            what,
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Whether the error came from talking to a remote endpoint
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network { .. } | Error::HttpStatus { .. })
    }
}
