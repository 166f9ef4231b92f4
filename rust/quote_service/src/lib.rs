// src/lib.rs

pub mod client;
pub mod models;

pub use client::{
    AlphaVantageClient, PriceSource, Provider, QuoteClient, VciClient, ALPHAVANTAGE_BASE_URL,
    VCI_BASE_URL,
};
pub use models::{DailyClose, QuoteError};
