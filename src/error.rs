//! Error taxonomy for the ingestion pipeline.
//!
//! Only [`DiscoveryError`] and [`ConfigError`] stop a run. [`FetchFailure`]
//! and [`FormatError`] are recovered where they happen and leave a gap in the
//! output tables.

use thiserror::Error;

/// The remote partition index could not be read.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("reading index body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// One artifact could not be retrieved. Soft: the run continues.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("HTTP {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

/// An artifact's text does not follow the degree-day layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("no header line starting with 'Region|'")]
    MissingHeader,

    #[error("header column {column} is not a YYYYMMDD date: '{label}'")]
    BadDateLabel { column: usize, label: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not set; add it to the environment or your .env file")]
    Missing { var: &'static str },

    #[error("{var} is not a valid URL: {reason}")]
    InvalidUrl { var: &'static str, reason: String },
}
