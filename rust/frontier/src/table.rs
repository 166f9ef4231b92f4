// src/table.rs

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Closing prices aligned on a common, strictly increasing date index.
///
/// Every row holds a finite price for every ticker; dates on which any ticker
/// is missing are dropped during alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    tickers: Vec<String>,
    dates: Vec<NaiveDate>,
    rows: Vec<Vec<f64>>,
}

impl PriceTable {
    /// Outer-joins the per-ticker series on date, then drops incomplete rows.
    ///
    /// Column order follows the order of `series`. Within one series a repeated
    /// date keeps its last price.
    pub fn align<I, S>(series: I) -> Self
    where
        I: IntoIterator<Item = (String, S)>,
        S: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let (tickers, joined) = series.into_iter().enumerate().fold(
            (Vec::new(), BTreeMap::<NaiveDate, Vec<Option<f64>>>::new()),
            |(mut tickers, mut joined), (column, (ticker, closes))| {
                tickers.push(ticker);
                for (date, close) in closes {
                    let row = joined.entry(date).or_default();
                    if row.len() <= column {
                        row.resize(column + 1, None);
                    }
                    row[column] = Some(close).filter(|price| price.is_finite());
                }
                (tickers, joined)
            },
        );

        let width = tickers.len();
        let (dates, rows) = joined
            .into_iter()
            .filter_map(|(date, mut row)| {
                row.resize(width, None);
                row.into_iter()
                    .collect::<Option<Vec<f64>>>()
                    .map(|prices| (date, prices))
            })
            .unzip();

        PriceTable {
            tickers,
            dates,
            rows,
        }
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of complete trading days.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
