// tests/integration_tests.rs

use chrono::NaiveDate;
use mockito::{mock, Matcher};
use quote_service::client::http_client;
use quote_service::{AlphaVantageClient, PriceSource, QuoteError, VciClient};
use serde_json::json;
use std::error::Error;
use std::time::Duration;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

fn vci_client() -> VciClient {
    let http = http_client(Duration::from_secs(5)).expect("http client");
    VciClient::new(http, mockito::server_url())
}

fn alphavantage_client() -> AlphaVantageClient {
    let http = http_client(Duration::from_secs(5)).expect("http client");
    AlphaVantageClient::new(http, mockito::server_url(), "demo")
}

#[tokio::test]
async fn test_vci_daily_closes() -> Result<(), Box<dyn Error>> {
    // Bars at local (UTC+7) midnight for 2024-04-04, 04-05, 04-08, 04-09,
    // delivered out of order and with string-encoded stamps mixed in.
    let mock_server_response = r#"
    [
        {
            "symbol": "VIC",
            "t": ["1712509200", 1712163600, 1712250000, "1712595600"],
            "o": [44.1, 43.0, 43.5, 44.9],
            "h": [45.0, 43.9, 44.2, 45.3],
            "l": [43.8, 42.7, 43.1, 44.5],
            "c": [44.6, 43.2, 43.9, 45.1],
            "v": [1200, 1500, 1100, 900]
        }
    ]"#;

    let _mock = mock("POST", "/chart/OHLCChart/gap-chart")
        .match_body(Matcher::PartialJson(json!({
            "timeFrame": "ONE_DAY",
            "symbols": ["VIC"]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(mock_server_response)
        .create();

    let closes = vci_client()
        .daily_closes("VIC", date("2024-04-05"), date("2024-04-09"))
        .await?;

    // 2024-04-04 falls before the requested start and is filtered out.
    let dates: Vec<NaiveDate> = closes.iter().map(|row| row.date).collect();
    assert_eq!(
        dates,
        vec![date("2024-04-05"), date("2024-04-08"), date("2024-04-09")]
    );
    assert_eq!(closes[0].close, 43.9);
    assert_eq!(closes[2].close, 45.1);

    Ok(())
}

#[tokio::test]
async fn test_vci_missing_close_is_no_data() {
    let _mock = mock("POST", "/chart/OHLCChart/gap-chart")
        .match_body(Matcher::PartialJson(json!({ "symbols": ["NOCLOSE"] })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"symbol": "NOCLOSE", "t": [1712163600], "o": [1.0]}]"#)
        .create();

    let result = vci_client()
        .daily_closes("NOCLOSE", date("2024-04-01"), date("2024-04-30"))
        .await;

    assert!(matches!(result, Err(QuoteError::NoData { ticker }) if ticker == "NOCLOSE"));
}

#[tokio::test]
async fn test_vci_empty_response_is_no_data() {
    let _mock = mock("POST", "/chart/OHLCChart/gap-chart")
        .match_body(Matcher::PartialJson(json!({ "symbols": ["FAKE1"] })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create();

    let result = vci_client()
        .daily_closes("FAKE1", date("2024-01-01"), date("2025-01-01"))
        .await;

    assert!(matches!(result, Err(QuoteError::NoData { .. })));
}

#[tokio::test]
async fn test_vci_server_error_is_http_error() {
    let _mock = mock("POST", "/chart/OHLCChart/gap-chart")
        .match_body(Matcher::PartialJson(json!({ "symbols": ["BROKEN"] })))
        .with_status(502)
        .with_body("bad gateway")
        .create();

    let result = vci_client()
        .daily_closes("BROKEN", date("2024-01-01"), date("2024-02-01"))
        .await;

    assert!(matches!(result, Err(QuoteError::Http(_))));
}

#[tokio::test]
async fn test_alphavantage_daily_closes() -> Result<(), Box<dyn Error>> {
    let mock_server_response = r#"
    {
        "Meta Data": {
            "1. Information": "Daily Prices (open, high, low, close) and Volumes",
            "2. Symbol": "IBM",
            "3. Last Refreshed": "2024-09-06",
            "4. Output Size": "Full size",
            "5. Time Zone": "US/Eastern"
        },
        "Time Series (Daily)": {
            "2024-09-06": {
                "1. open": "203.9100",
                "2. high": "204.5600",
                "3. low": "200.9200",
                "4. close": "201.1100",
                "5. volume": "3425143"
            },
            "2024-09-05": {
                "1. open": "205.1900",
                "2. high": "205.7100",
                "3. low": "202.5100",
                "4. close": "203.9100",
                "5. volume": "3196380"
            },
            "2024-08-30": {
                "1. open": "202.5700",
                "2. high": "202.9200",
                "3. low": "200.6400",
                "4. close": "202.1300",
                "5. volume": "4807306"
            }
        }
    }"#;

    let _mock = mock("GET", "/query")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("function".into(), "TIME_SERIES_DAILY".into()),
            Matcher::UrlEncoded("symbol".into(), "IBM".into()),
            Matcher::UrlEncoded("outputsize".into(), "full".into()),
            Matcher::UrlEncoded("apikey".into(), "demo".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(mock_server_response)
        .create();

    let closes = alphavantage_client()
        .daily_closes("IBM", date("2024-09-01"), date("2024-09-30"))
        .await?;

    assert_eq!(closes.len(), 2);
    assert_eq!(closes[0].date, date("2024-09-05"));
    assert_eq!(closes[0].close, 203.91);
    assert_eq!(closes[1].date, date("2024-09-06"));
    assert_eq!(closes[1].close, 201.11);

    Ok(())
}

#[tokio::test]
async fn test_alphavantage_unknown_symbol_is_no_data() {
    let _mock = mock("GET", "/query")
        .match_query(Matcher::UrlEncoded("symbol".into(), "FAKE2".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"Error Message": "Invalid API call. Please retry or visit the documentation."}"#)
        .create();

    let result = alphavantage_client()
        .daily_closes("FAKE2", date("2024-01-01"), date("2025-01-01"))
        .await;

    assert!(matches!(result, Err(QuoteError::NoData { ticker }) if ticker == "FAKE2"));
}

#[tokio::test]
async fn test_alphavantage_rate_limit_is_api_error() {
    let _mock = mock("GET", "/query")
        .match_query(Matcher::UrlEncoded("symbol".into(), "MSFT".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"Information": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."}"#)
        .create();

    let result = alphavantage_client()
        .daily_closes("MSFT", date("2024-01-01"), date("2025-01-01"))
        .await;

    match result {
        Err(QuoteError::Api { provider, message }) => {
            assert_eq!(provider, "Alpha Vantage");
            assert!(message.contains("rate limit"));
        }
        other => panic!("expected an API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_vci_short_close_array_is_no_data() {
    let _mock = mock("POST", "/chart/OHLCChart/gap-chart")
        .match_body(Matcher::PartialJson(json!({ "symbols": ["SHORTC"] })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"[{"symbol": "SHORTC", "t": [1712163600, 1712250000, 1712509200], "c": [43.2]}]"#,
        )
        .create();

    let result = vci_client()
        .daily_closes("SHORTC", date("2024-04-01"), date("2024-04-30"))
        .await;

    assert!(matches!(result, Err(QuoteError::NoData { ticker }) if ticker == "SHORTC"));
}

#[tokio::test]
async fn test_alphavantage_http_error_hides_api_key() {
    let _mock = mock("GET", "/query")
        .match_query(Matcher::UrlEncoded("symbol".into(), "LEAK".into()))
        .with_status(503)
        .with_body("service unavailable")
        .create();

    let http = http_client(Duration::from_secs(5)).expect("http client");
    let client = AlphaVantageClient::new(http, mockito::server_url(), "SECRET123");
    let err = client
        .daily_closes("LEAK", date("2024-01-01"), date("2025-01-01"))
        .await
        .unwrap_err();

    assert!(matches!(err, QuoteError::Http(_)));
    let message = err.to_string();
    assert!(message.contains("503"), "unexpected message: {}", message);
    assert!(!message.contains("SECRET123"), "api key leaked: {}", message);
    assert!(!message.contains("apikey"), "request url leaked: {}", message);
}
