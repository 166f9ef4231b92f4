// src/models.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("no price data returned for {ticker}")]
    NoData { ticker: String },
    #[error(transparent)]
    Http(reqwest::Error),
    #[error("{provider} rejected the request: {message}")]
    Api {
        provider: &'static str,
        message: String,
    },
    #[error("Invalid timestamp encountered: {0}")]
    InvalidTimestamp(String),
    #[error("Invalid date format encountered: {0}")]
    InvalidDateFormat(String),
    #[error("Unknown quote provider: {0}")]
    UnknownProvider(String),
}

// Request URLs can carry an API key, so they never reach the message.
impl From<reqwest::Error> for QuoteError {
    fn from(err: reqwest::Error) -> Self {
        QuoteError::Http(err.without_url())
    }
}

impl QuoteError {
    pub fn no_data(ticker: &str) -> Self {
        QuoteError::NoData {
            ticker: ticker.to_string(),
        }
    }
}

/// A single daily closing price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

// Custom function to convert an optional JSON string to f64
fn optional_string_to_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| s.parse::<f64>())
        .transpose()
        .map_err(serde::de::Error::custom)
}

// Alpha Vantage TIME_SERIES_DAILY

#[derive(Debug, Deserialize)]
pub struct MetaData {
    #[serde(rename = "1. Information")]
    pub information: String,

    #[serde(rename = "2. Symbol")]
    pub symbol: String,

    #[serde(rename = "3. Last Refreshed")]
    pub last_refreshed: String,
}

// Only the close is used; the other OHLCV fields are ignored.
#[derive(Debug, Deserialize)]
pub struct DailyBar {
    #[serde(rename = "4. close", default, deserialize_with = "optional_string_to_f64")]
    pub close: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct DailyPriceResponse {
    #[serde(rename = "Meta Data")]
    pub meta_data: Option<MetaData>,

    #[serde(rename = "Time Series (Daily)", default)]
    pub daily_time_series: HashMap<String, DailyBar>, // Date -> DailyBar

    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,

    #[serde(rename = "Note")]
    pub note: Option<String>,

    #[serde(rename = "Information")]
    pub information: Option<String>,
}

impl DailyPriceResponse {
    /// Closes inside `[start, end]`, ascending. `Ok(None)` when any bar lacks a close.
    pub fn closes_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Vec<DailyClose>>, QuoteError> {
        let mut rows = Vec::with_capacity(self.daily_time_series.len());
        for (date_str, bar) in &self.daily_time_series {
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|_| QuoteError::InvalidDateFormat(date_str.clone()))?;
            let Some(close) = bar.close else {
                return Ok(None);
            };
            if date >= start && date <= end {
                rows.push(DailyClose { date, close });
            }
        }
        rows.sort_by_key(|row| row.date);
        Ok(Some(rows))
    }
}

// VCI (Vietcap) OHLC chart

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OhlcChartRequest<'a> {
    pub time_frame: &'static str,
    pub symbols: [&'a str; 1],
    pub to: i64,
    pub count_back: usize,
}

/// Epoch seconds; the chart endpoint has sent both encodings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EpochSeconds {
    Number(i64),
    Text(String),
}

impl EpochSeconds {
    pub fn seconds(&self) -> Result<i64, QuoteError> {
        match self {
            EpochSeconds::Number(secs) => Ok(*secs),
            EpochSeconds::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| QuoteError::InvalidTimestamp(s.clone())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OhlcChart {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub t: Vec<EpochSeconds>,
    #[serde(default)]
    pub c: Option<Vec<f64>>,
}
