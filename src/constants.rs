/// Column and endpoint constants shared by the reader, request builder and writer

// Required input columns (header names are lower-cased on read)
pub const ADDRESS_COLUMN: &str = "address";
pub const COUNTRY_COLUMN: &str = "country";

// Optional input column forcing the projection zone; never written to output
pub const UTM_ZONE_COLUMN: &str = "utm_zone";

// Appended output columns
pub const UTM_EAST: &str = "UTM_EAST";
pub const UTM_NORTH: &str = "UTM_NORTH";
pub const UTM_ZONE: &str = "UTM_ZONE";

pub const DELIMITER: u8 = b';';

pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// The geocoder allows bursts of this many requests before a pause
pub const DEFAULT_BATCH_SIZE: u64 = 50;
pub const DEFAULT_PAUSE_MS: u64 = 1000;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

pub const DEFAULT_CONFIG_FILE: &str = "address_to_utm.toml";
pub const LOG_FILE_NAME: &str = "address_to_utm.log";

/// Output header columns appended after the pass-through columns
pub fn appended_columns() -> [&'static str; 3] {
    [UTM_EAST, UTM_NORTH, UTM_ZONE]
}
