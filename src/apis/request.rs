use url::form_urlencoded;

use crate::constants::{ADDRESS_COLUMN, DEFAULT_ENDPOINT};
use crate::storage::Record;

/// A fully-formed geocode request for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeQuery {
    pub ordinal: usize,
    url: String,
    key_len: usize,
}

impl GeocodeQuery {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The request URL with the API key masked, for logs and messages
    pub fn redacted_url(&self) -> String {
        let cut = self.url.len() - self.key_len;
        format!("{}***", &self.url[..cut])
    }
}

/// Builds geocode requests against a fixed endpoint and API key
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    endpoint: String,
    api_key: String,
}

impl RequestBuilder {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub fn with_default_endpoint(api_key: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, api_key)
    }

    /// Query parameters: `address=<addr>&components=country:<country>&key=<key>`
    pub fn parameters(&self, record: &Record) -> String {
        format!(
            "{}={}&components=country:{}&key={}",
            ADDRESS_COLUMN,
            escape(record.address()),
            escape(record.country()),
            self.api_key
        )
    }

    pub fn build(&self, record: &Record) -> GeocodeQuery {
        GeocodeQuery {
            ordinal: record.ordinal(),
            url: format!("{}?{}", self.endpoint, self.parameters(record)),
            key_len: self.api_key.len(),
        }
    }
}

/// Strips embedded quote characters, then form-encodes (space becomes `+`)
fn escape(value: &str) -> String {
    let unquoted = value.replace('"', "");
    form_urlencoded::byte_serialize(unquoted.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{RecordStore, ShortRowPolicy};

    fn record(line: &str) -> Record {
        let input = format!("address;country;id\n{line}\n");
        let store = RecordStore::from_reader(input.as_bytes(), ShortRowPolicy::Reject).unwrap();
        store.get(1).unwrap().clone()
    }

    #[test]
    fn test_parameters_template() {
        let builder = RequestBuilder::new("https://geo.example/json", "KEY123");
        let params = builder.parameters(&record("Karl Johans gate 1, Oslo;NO;7"));
        assert_eq!(
            params,
            "address=Karl+Johans+gate+1%2C+Oslo&components=country:NO&key=KEY123"
        );
    }

    #[test]
    fn test_full_url_and_ordinal() {
        let builder = RequestBuilder::new("https://geo.example/json", "KEY123");
        let query = builder.build(&record("Storgata 1;NO;7"));
        assert_eq!(query.ordinal, 1);
        assert_eq!(
            query.url(),
            "https://geo.example/json?address=Storgata+1&components=country:NO&key=KEY123"
        );
    }

    #[test]
    fn test_embedded_quotes_removed_before_encoding() {
        let builder = RequestBuilder::new("https://geo.example/json", "K");
        let query = builder.build(&record("\"Hotel \"\"Bristol\"\"\";NO;1"));
        assert!(query.url().contains("address=Hotel+Bristol&"));
    }

    #[test]
    fn test_non_ascii_percent_encoded() {
        let builder = RequestBuilder::new("https://geo.example/json", "K");
        let query = builder.build(&record("Bøgata 3 & 4;NO;1"));
        assert!(query.url().contains("address=B%C3%B8gata+3+%26+4&"));
    }

    #[test]
    fn test_deterministic() {
        let builder = RequestBuilder::with_default_endpoint("K");
        let rec = record("Storgata 1;NO;7");
        assert_eq!(builder.build(&rec), builder.build(&rec));
        assert!(builder.build(&rec).url().starts_with(DEFAULT_ENDPOINT));
    }

    #[test]
    fn test_redacted_url_hides_key() {
        let builder = RequestBuilder::new("https://geo.example/json", "SECRET");
        let query = builder.build(&record("Storgata 1;NO;7"));
        let redacted = query.redacted_url();
        assert!(!redacted.contains("SECRET"));
        assert!(redacted.ends_with("&key=***"));
    }
}
