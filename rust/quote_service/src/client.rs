// src/client.rs

use crate::models::{DailyClose, DailyPriceResponse, OhlcChart, OhlcChartRequest, QuoteError};
use chrono::{DateTime, Datelike, NaiveDate, Weekday};
use reqwest::header::REFERER;
use reqwest::Client;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub const VCI_BASE_URL: &str = "https://trading.vietcap.com.vn/api";
pub const ALPHAVANTAGE_BASE_URL: &str = "https://www.alphavantage.co";

const VCI_CHART_PATH: &str = "chart/OHLCChart/gap-chart";
const VCI_REFERER: &str = "https://trading.vietcap.com.vn/";
const USER_AGENT: &str = concat!("importfolio/", env!("CARGO_PKG_VERSION"));
// Exchange-local time is UTC+7; daily bars are stamped at local midnight.
const VIETNAM_UTC_OFFSET_SECS: i64 = 7 * 3600;

/// Anything that can produce a daily close series for one ticker.
#[allow(async_fn_in_trait)]
pub trait PriceSource {
    /// Closes for `ticker` within `[start, end]`, ascending by date.
    async fn daily_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyClose>, QuoteError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Vci,
    AlphaVantage,
}

impl FromStr for Provider {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vci" => Ok(Provider::Vci),
            "alphavantage" | "alpha_vantage" => Ok(Provider::AlphaVantage),
            other => Err(QuoteError::UnknownProvider(other.to_string())),
        }
    }
}

impl Provider {
    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::Vci => VCI_BASE_URL,
            Provider::AlphaVantage => ALPHAVANTAGE_BASE_URL,
        }
    }
}

pub fn http_client(timeout: Duration) -> Result<Client, QuoteError> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

pub struct VciClient {
    http: Client,
    base_url: String,
}

impl VciClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        VciClient {
            http,
            base_url: base_url.into(),
        }
    }
}

impl PriceSource for VciClient {
    async fn daily_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyClose>, QuoteError> {
        let payload = OhlcChartRequest {
            time_frame: "ONE_DAY",
            symbols: [ticker],
            to: local_midnight_epoch(end.succ_opt().unwrap_or(end))?,
            count_back: weekdays_between(start, end),
        };
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), VCI_CHART_PATH);
        debug!(ticker, %url, count_back = payload.count_back, "requesting VCI chart");

        let charts: Vec<OhlcChart> = self
            .http
            .post(&url)
            .header(REFERER, VCI_REFERER)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let chart = charts
            .into_iter()
            .next()
            .ok_or_else(|| QuoteError::no_data(ticker))?;
        let closes = chart
            .c
            .filter(|c| c.len() == chart.t.len())
            .ok_or_else(|| QuoteError::no_data(ticker))?;

        let mut rows = Vec::with_capacity(closes.len());
        for (stamp, close) in chart.t.iter().zip(closes) {
            let date = local_date(stamp.seconds()?)?;
            if date >= start && date <= end {
                rows.push(DailyClose { date, close });
            }
        }
        rows.sort_by_key(|row| row.date);

        if rows.is_empty() {
            return Err(QuoteError::no_data(ticker));
        }
        Ok(rows)
    }
}

pub struct AlphaVantageClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        AlphaVantageClient {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

impl PriceSource for AlphaVantageClient {
    async fn daily_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyClose>, QuoteError> {
        let url = format!("{}/query", self.base_url.trim_end_matches('/'));
        debug!(ticker, %url, "requesting Alpha Vantage daily series");

        let response: DailyPriceResponse = self
            .http
            .get(&url)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", ticker),
                ("outputsize", "full"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // An unknown symbol comes back as "Error Message" with status 200.
        if response.error_message.is_some() {
            return Err(QuoteError::no_data(ticker));
        }
        if let Some(message) = response.note.clone().or_else(|| response.information.clone()) {
            return Err(QuoteError::Api {
                provider: "Alpha Vantage",
                message,
            });
        }

        match response.closes_between(start, end)? {
            Some(rows) if !rows.is_empty() => Ok(rows),
            _ => Err(QuoteError::no_data(ticker)),
        }
    }
}

/// The configured provider, selected at startup.
pub enum QuoteClient {
    Vci(VciClient),
    AlphaVantage(AlphaVantageClient),
}

impl QuoteClient {
    pub fn new(
        provider: Provider,
        base_url: Option<&str>,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, QuoteError> {
        let http = http_client(timeout)?;
        let base_url = base_url.unwrap_or_else(|| provider.default_base_url());
        Ok(match provider {
            Provider::Vci => QuoteClient::Vci(VciClient::new(http, base_url)),
            Provider::AlphaVantage => {
                QuoteClient::AlphaVantage(AlphaVantageClient::new(http, base_url, api_key))
            }
        })
    }
}

impl PriceSource for QuoteClient {
    async fn daily_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyClose>, QuoteError> {
        match self {
            QuoteClient::Vci(client) => client.daily_closes(ticker, start, end).await,
            QuoteClient::AlphaVantage(client) => client.daily_closes(ticker, start, end).await,
        }
    }
}

fn local_midnight_epoch(date: NaiveDate) -> Result<i64, QuoteError> {
    date.and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc().timestamp() - VIETNAM_UTC_OFFSET_SECS)
        .ok_or_else(|| QuoteError::InvalidDateFormat(date.to_string()))
}

fn local_date(epoch_secs: i64) -> Result<NaiveDate, QuoteError> {
    DateTime::from_timestamp(epoch_secs + VIETNAM_UTC_OFFSET_SECS, 0)
        .map(|stamp| stamp.date_naive())
        .ok_or_else(|| QuoteError::InvalidTimestamp(epoch_secs.to_string()))
}

fn weekdays_between(start: NaiveDate, end: NaiveDate) -> usize {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .count()
}
