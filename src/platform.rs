// Supported target platforms and install languages

use crate::error::{Error, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Platform {
    #[value(name = "winarm64")]
    WinArm64,
    #[value(name = "win64")]
    Win64,
    #[value(name = "osx10-64")]
    Osx64,
}

impl Platform {
    /// Platform id as it appears in catalog requests and `platform@id`
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::WinArm64 => "winarm64",
            Platform::Win64 => "win64",
            Platform::Osx64 => "osx10-64",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::WinArm64 | Platform::Win64)
    }

    /// Default install directory written into the driver descriptor
    pub fn install_dir(&self) -> &'static str {
        if self.is_windows() {
            "C:\\Program Files\\Adobe"
        } else {
            "/Applications"
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install languages offered by the vendor installer
pub const LANGUAGES: &[&str] = &[
    "en_US", "en_GB", "en_IL", "en_AE", "es_ES", "es_MX", "pt_BR", "fr_FR", "fr_CA", "fr_MA",
    "it_IT", "de_DE", "nl_NL", "ru_RU", "uk_UA", "zh_TW", "zh_CN", "ja_JP", "ko_KR", "pl_PL",
    "hu_HU", "cs_CZ", "tr_TR", "sv_SE", "nb_NO", "fi_FI", "da_DK",
];

pub fn validate_language(language: &str) -> Result<&str> {
    if LANGUAGES.contains(&language) {
        Ok(language)
    } else {
        Err(Error::config(format!(
            "language '{}' is not available. Available languages: {}",
            language,
            LANGUAGES.join(", ")
        )))
    }
}
