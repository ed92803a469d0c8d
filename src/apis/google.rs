use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, instrument};

use crate::apis::request::GeocodeQuery;
use crate::config::GeocoderConfig;
use crate::error::{GeoError, Result};
use crate::types::{GeocodeApi, GeocodeResponse};

/// Google Maps Geocoding API client.
///
/// One blocking GET per query with an explicit timeout. Transport failures,
/// non-2xx responses and undecodable bodies are returned as errors.
pub struct GoogleGeocoder {
    client: Client,
}

impl GoogleGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        Self::with_timeout(config.timeout(), &config.user_agent)
    }

    pub fn with_timeout(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl GeocodeApi for GoogleGeocoder {
    #[instrument(skip(self, query), fields(ordinal = query.ordinal))]
    fn geocode(&self, query: &GeocodeQuery) -> Result<GeocodeResponse> {
        let response = self.client.get(query.url()).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::HttpStatus {
                status: status.as_u16(),
                url: query.redacted_url(),
            });
        }

        let body = response.text()?;
        debug!("Received {} bytes", body.len());
        let parsed: GeocodeResponse = serde_json::from_str(&body)?;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::request::RequestBuilder;
    use crate::storage::{RecordStore, ShortRowPolicy};
    use std::net::TcpListener;

    #[test]
    fn test_connection_failure_is_an_error() {
        // Bind then drop to get a local port with nothing listening
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let store = RecordStore::from_reader(
            "address;country\nStorgata 1;NO\n".as_bytes(),
            ShortRowPolicy::Reject,
        )
        .unwrap();
        let builder = RequestBuilder::new(format!("http://127.0.0.1:{port}/json"), "K");
        let query = builder.build(store.get(1).unwrap());

        let geocoder = GoogleGeocoder::with_timeout(Duration::from_secs(2), "test").unwrap();
        let err = geocoder.geocode(&query).unwrap_err();
        assert!(matches!(err, GeoError::Http(_)));
        assert!(!err.is_input_error());
    }
}
