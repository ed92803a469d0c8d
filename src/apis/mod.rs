pub mod google;
pub mod request;

pub use google::GoogleGeocoder;
pub use request::{GeocodeQuery, RequestBuilder};
