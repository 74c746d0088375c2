use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{AssetError, AssetResult};

/// Default name of the bookkeeping directory left out of directory archives.
pub const DEFAULT_BOOKKEEPING_DIR: &str = ".pulumi";

/// Configuration for expanding and packing archives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Directory name skipped (with everything beneath it) when a directory
    /// is expanded into an archive.
    pub bookkeeping_dir: String,
    /// Modification time stamped on every ZIP member. Must fall within the
    /// ZIP date range (1980..=2107); some extractors reject a zero time.
    pub zip_modified: NaiveDateTime,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            bookkeeping_dir: DEFAULT_BOOKKEEPING_DIR.to_string(),
            zip_modified: default_zip_modified(),
        }
    }
}

impl ArchiveConfig {
    /// Load a configuration from TOML. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> AssetResult<Self> {
        toml::from_str(s).map_err(|e| AssetError::Config(e.to_string()))
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> AssetResult<String> {
        toml::to_string(self).map_err(|e| AssetError::Config(e.to_string()))
    }
}

fn default_zip_modified() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1990, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}
