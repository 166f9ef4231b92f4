// src/lib.rs

//! Mean-variance estimation and efficient-frontier optimization for a set of
//! aligned daily closing prices.

pub mod error;
pub mod estimate;
pub mod objective;
pub mod optimizer;
pub mod sampling;
pub mod table;

pub use error::{EstimationError, OptimizationError};
pub use estimate::{estimate, ReturnEstimates, TRADING_DAYS_PER_YEAR};
pub use optimizer::{EfficientFrontier, Performance};
pub use sampling::{sample_frontier, FrontierPoint, SampleOutcome};
pub use table::PriceTable;
