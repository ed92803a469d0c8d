use tracing::{error, warn};

use crate::apis::request::GeocodeQuery;
use crate::types::GeocodeStatus;

/// What the pipeline does with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Status is `OK`; extract coordinates
    Proceed,
    /// Skip this record and keep going
    Continue,
    /// Abort the remaining batch
    Stop,
}

/// Maps a service status to a decision.
///
/// Only `OVER_QUERY_LIMIT` stops the batch: once the quota is spent every
/// further call fails. All other failures are specific to one row.
pub fn decide(status: &GeocodeStatus) -> Decision {
    match status {
        GeocodeStatus::Ok => Decision::Proceed,
        GeocodeStatus::OverQueryLimit => Decision::Stop,
        GeocodeStatus::ZeroResults
        | GeocodeStatus::RequestDenied
        | GeocodeStatus::InvalidRequest
        | GeocodeStatus::UnknownError
        | GeocodeStatus::Other(_) => Decision::Continue,
    }
}

/// Human-readable explanation for a non-`OK` status
pub fn describe(status: &GeocodeStatus, error_message: Option<&str>, request: &str) -> String {
    let error = format!("Error: {}", error_message.unwrap_or("N/A"));
    match status {
        GeocodeStatus::Ok => format!("Request {request} succeeded."),
        GeocodeStatus::ZeroResults => format!("No results for request {request}."),
        GeocodeStatus::OverQueryLimit => "Query limit reached. Exiting.".to_string(),
        GeocodeStatus::RequestDenied => format!("Request {request} was denied. {error}"),
        GeocodeStatus::InvalidRequest => format!("Request {request} is invalid. {error}"),
        GeocodeStatus::UnknownError => {
            format!("Unknown error occurred for request {request}. {error}")
        }
        GeocodeStatus::Other(s) => {
            format!("Unrecognized status {s} for request {request}. {error}")
        }
    }
}

/// Classifies a response and logs the outcome of anything but `OK`
pub fn classify(
    status: &GeocodeStatus,
    error_message: Option<&str>,
    query: &GeocodeQuery,
) -> Decision {
    let decision = decide(status);
    match decision {
        Decision::Proceed => {}
        Decision::Continue => {
            warn!(
                ordinal = query.ordinal,
                status = %status,
                "{}",
                describe(status, error_message, &query.redacted_url())
            );
        }
        Decision::Stop => {
            error!(
                ordinal = query.ordinal,
                status = %status,
                "{}",
                describe(status, error_message, &query.redacted_url())
            );
        }
    }
    decision
}
