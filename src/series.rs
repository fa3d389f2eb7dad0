//! Daily spot-price series from FRED, written as two-column CSVs.
//!
//! This sits beside the degree-day pipeline as a plain data puller: one
//! request per series, reshaped into `(date, <column>)` rows.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

use crate::fetch::{self, HttpClient, UrlParam};
use crate::output::write_csv;

/// A FRED series and where its table goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Series {
    pub id: &'static str,
    pub column: &'static str,
    pub file_name: &'static str,
}

pub const HENRY_HUB: Series = Series {
    id: "DHHNGSP",
    column: "HH_spot",
    file_name: "henry_hub_spot.csv",
};

pub const WTI: Series = Series {
    id: "DCOILWTICO",
    column: "WTI_spot",
    file_name: "wti_spot.csv",
};

pub const DEFAULT_SERIES: [Series; 2] = [HENRY_HUB, WTI];

/// FRED marks days without a print with this value.
const MISSING: &str = ".";

#[derive(Deserialize)]
struct ObservationsResponse {
    observations: Vec<RawObservation>,
}

#[derive(Deserialize)]
struct RawObservation {
    date: String,
    value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

pub struct FredClient<C> {
    http: UrlParam<C>,
    base: Url,
}

impl<C: HttpClient> FredClient<C> {
    /// `base` is the API root, e.g. `https://api.stlouisfed.org/fred/`.
    pub fn new(inner: C, api_key: &str, base: Url) -> Self {
        Self {
            http: UrlParam::api_key(inner, api_key),
            base,
        }
    }

    /// Fetches every observation of `series_id`, dropping missing values.
    pub async fn observations(&self, series_id: &str) -> Result<Vec<SeriesPoint>> {
        let mut url = self.base.join("series/observations")?;
        url.query_pairs_mut()
            .append_pair("series_id", series_id)
            .append_pair("file_type", "json");

        let response = fetch::get(&self.http, &url)
            .await
            .with_context(|| format!("requesting FRED series {series_id}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "FRED returned status {} for {}: {}",
                status,
                series_id,
                body
            ));
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("reading FRED response for {series_id}"))?;
        parse_observations(&body).with_context(|| format!("parsing FRED series {series_id}"))
    }
}

/// Decodes a FRED `series/observations` JSON body.
pub fn parse_observations(json: &str) -> Result<Vec<SeriesPoint>> {
    let response: ObservationsResponse = serde_json::from_str(json)?;
    let mut points = Vec::with_capacity(response.observations.len());
    for raw in response.observations {
        if raw.value.trim() == MISSING {
            continue;
        }
        let date = NaiveDate::parse_from_str(&raw.date, "%Y-%m-%d")
            .with_context(|| format!("bad observation date '{}'", raw.date))?;
        let value: f64 = raw
            .value
            .trim()
            .parse()
            .with_context(|| format!("bad observation value '{}' on {}", raw.value, raw.date))?;
        points.push(SeriesPoint { date, value });
    }
    Ok(points)
}

/// Pulls `series` and writes `<out_dir>/<file_name>` with header `date,<column>`.
#[tracing::instrument(skip_all, fields(series = series.id))]
pub async fn pull_series<C: HttpClient>(
    client: &FredClient<C>,
    series: Series,
    out_dir: &Path,
) -> Result<(PathBuf, usize)> {
    let points = client.observations(series.id).await?;
    debug!(points = points.len(), "fetched series");

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let path = out_dir.join(series.file_name);
    write_csv(&path, &["date", series.column], &points)?;

    info!(rows = points.len(), path = %path.display(), "saved series");
    Ok((path, points.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fake::FakeClient;
    use std::fs;
    use tempfile::tempdir;

    const BODY: &str = r#"{
        "realtime_start": "2024-01-01",
        "observations": [
            {"realtime_start": "2024-01-01", "realtime_end": "2024-01-01", "date": "1997-01-07", "value": "3.82"},
            {"realtime_start": "2024-01-01", "realtime_end": "2024-01-01", "date": "1997-01-08", "value": "."},
            {"realtime_start": "2024-01-01", "realtime_end": "2024-01-01", "date": "1997-01-09", "value": "3.61"}
        ]
    }"#;

    #[test]
    fn test_missing_values_are_dropped() {
        let points = parse_observations(BODY).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(1997, 1, 7).unwrap());
        assert_eq!(points[1].value, 3.61);
    }

    #[test]
    fn test_garbage_value_is_an_error() {
        let body = r#"{"observations": [{"date": "1997-01-07", "value": "abc"}]}"#;
        assert!(parse_observations(body).is_err());
    }

    #[tokio::test]
    async fn test_api_key_is_sent_as_query_parameter() {
        let expected = "http://fred.test/fred/series/observations?series_id=DHHNGSP&file_type=json&api_key=secret";
        let fake = FakeClient::new().route(expected, 200, BODY);
        let client = FredClient::new(fake, "secret", Url::parse("http://fred.test/fred/").unwrap());

        let dir = tempdir().unwrap();
        let (path, rows) = pull_series(&client, HENRY_HUB, dir.path()).await.unwrap();

        assert_eq!(rows, 2);
        assert_eq!(client.http.inner.calls(), vec![expected.to_string()]);
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "date,HH_spot\n1997-01-07,3.82\n1997-01-09,3.61\n"
        );
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let client = FredClient::new(
            FakeClient::new(),
            "secret",
            Url::parse("http://fred.test/fred/").unwrap(),
        );
        let err = client.observations("DCOILWTICO").await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
