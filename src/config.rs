//! Runtime configuration, resolved once at startup.
//!
//! Values come from the process environment (after `.env` is loaded by the
//! binary) and may be overridden by CLI flags. Components receive the pieces
//! they need at construction time instead of reading the environment ad hoc.

use std::path::PathBuf;

use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str =
    "https://ftp.cpc.ncep.noaa.gov/htdocs/degree_days/weighted/daily_data/";
pub const DEFAULT_RAW_ROOT: &str = "data/raw/weather";
pub const DEFAULT_PROCESSED_DIR: &str = "data/processed";
pub const DEFAULT_FRED_URL: &str = "https://api.stlouisfed.org/fred/";

#[derive(Debug, Clone)]
pub struct Config {
    /// Listing page whose `YYYY/` entries are the partitions.
    pub base_url: Url,
    /// Cache root: `<raw_root>/<partition>/<artifact>`.
    pub raw_root: PathBuf,
    pub processed_dir: PathBuf,
    /// Extra PEM trust bundle for the HTTP client.
    pub ssl_cert_file: Option<PathBuf>,
    pub fred_api_key: Option<String>,
    pub fred_url: Url,
}

impl Config {
    /// Reads configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Blank values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let base_url = parse_dir_url(
            "DEGREE_DAY_BASE_URL",
            &get("DEGREE_DAY_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        )?;
        let fred_url = parse_dir_url(
            "FRED_API_URL",
            &get("FRED_API_URL").unwrap_or_else(|| DEFAULT_FRED_URL.to_string()),
        )?;

        Ok(Self {
            base_url,
            raw_root: get("RAW_ROOT")
                .unwrap_or_else(|| DEFAULT_RAW_ROOT.to_string())
                .into(),
            processed_dir: get("PROCESSED_DIR")
                .unwrap_or_else(|| DEFAULT_PROCESSED_DIR.to_string())
                .into(),
            ssl_cert_file: get("SSL_CERT_FILE").map(PathBuf::from),
            fred_api_key: get("FRED_API_KEY"),
            fred_url,
        })
    }

    /// Replaces the listing URL, normalising it the same way as the
    /// environment value.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_dir_url("--base-url", raw)?;
        Ok(self)
    }

    /// The FRED key, or a descriptive error when the caller needs it and it
    /// was never provided.
    pub fn require_fred_api_key(&self) -> Result<&str, ConfigError> {
        self.fred_api_key
            .as_deref()
            .ok_or(ConfigError::Missing { var: "FRED_API_KEY" })
    }
}

/// Parses `raw` as an absolute URL that relative joins treat as a directory.
fn parse_dir_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    let url = Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl {
        var,
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            var,
            reason: "URL cannot be used as a base".to_string(),
        });
    }
    Ok(url)
}
