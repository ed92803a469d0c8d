use std::fmt;

use serde::{Deserialize, Serialize};

use crate::apis::request::GeocodeQuery;
use crate::error::Result;

/// Service-level status carried in the body of every geocoder response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GeocodeStatus {
    Ok,
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    UnknownError,
    /// Any status string the service may add later
    Other(String),
}

impl GeocodeStatus {
    pub fn as_str(&self) -> &str {
        match self {
            GeocodeStatus::Ok => "OK",
            GeocodeStatus::ZeroResults => "ZERO_RESULTS",
            GeocodeStatus::OverQueryLimit => "OVER_QUERY_LIMIT",
            GeocodeStatus::RequestDenied => "REQUEST_DENIED",
            GeocodeStatus::InvalidRequest => "INVALID_REQUEST",
            GeocodeStatus::UnknownError => "UNKNOWN_ERROR",
            GeocodeStatus::Other(s) => s,
        }
    }
}

impl From<String> for GeocodeStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "OK" => GeocodeStatus::Ok,
            "ZERO_RESULTS" => GeocodeStatus::ZeroResults,
            "OVER_QUERY_LIMIT" => GeocodeStatus::OverQueryLimit,
            "REQUEST_DENIED" => GeocodeStatus::RequestDenied,
            "INVALID_REQUEST" => GeocodeStatus::InvalidRequest,
            "UNKNOWN_ERROR" => GeocodeStatus::UnknownError,
            _ => GeocodeStatus::Other(s),
        }
    }
}

impl From<GeocodeStatus> for String {
    fn from(status: GeocodeStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for GeocodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

/// One candidate location; only the first of a response is ever used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub formatted_address: Option<String>,
    pub geometry: Geometry,
}

/// Parsed geocoder response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub status: GeocodeStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<Candidate>,
}

impl GeocodeResponse {
    pub fn status_only(status: GeocodeStatus) -> Self {
        Self {
            status,
            error_message: None,
            results: Vec::new(),
        }
    }

    pub fn first_location(&self) -> Option<LatLng> {
        self.results.first().map(|c| c.geometry.location)
    }
}

/// A geocoding backend.
///
/// Network-level failures are returned as `Err` and abort the run; service
/// errors come back as `Ok` with a non-`OK` status.
pub trait GeocodeApi {
    fn geocode(&self, query: &GeocodeQuery) -> Result<GeocodeResponse>;
}

impl<T: GeocodeApi + ?Sized> GeocodeApi for &T {
    fn geocode(&self, query: &GeocodeQuery) -> Result<GeocodeResponse> {
        (**self).geocode(query)
    }
}
