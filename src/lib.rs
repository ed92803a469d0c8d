pub mod apis;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod projection;
pub mod rate_limiter;
pub mod storage;
pub mod types;

pub use error::{GeoError, Result};
pub use pipeline::{Pipeline, PipelineSummary};
