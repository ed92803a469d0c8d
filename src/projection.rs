//! Latitude/longitude to UTM projection
//!
//! Transverse Mercator on a reference ellipsoid using the series expansion
//! from Snyder, *Map Projections: A Working Manual* (USGS PP 1395), which is
//! accurate to well under a millimetre within a zone.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::types::LatLng;

const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

const MIN_LATITUDE: f64 = -80.0;
const MAX_LATITUDE: f64 = 84.0;

/// Widest longitude offset from a forced zone's central meridian. Covers the
/// neighbouring zone; past this the series no longer converges usefully.
const MAX_FORCED_OFFSET_DEGREES: f64 = 9.0;

/// Latitude bands from 80°S northwards, 8° each; `X` spans 72°N to 84°N
const BANDS: &[u8; 20] = b"CDEFGHJKLMNPQRSTUVWX";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("coordinate ({lat}, {lon}) is not a finite number")]
    NonFinite { lat: f64, lon: f64 },

    #[error("latitude {0} is outside the UTM range -80..84")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside the range -180..180")]
    LongitudeOutOfRange(f64),

    #[error("invalid UTM zone designator '{0}'")]
    InvalidZone(String),

    #[error("longitude {lon} is more than 9 degrees from the central meridian of forced zone {zone}")]
    ForcedZoneTooFar { zone: String, lon: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    fn of_latitude(lat: f64) -> Self {
        if lat < 0.0 {
            Hemisphere::South
        } else {
            Hemisphere::North
        }
    }
}

/// Zone number (1..=60) with latitude band letter, displayed as e.g. `32V`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    number: u8,
    band: char,
}

impl Zone {
    pub fn new(number: u8, band: char) -> Result<Self, ProjectionError> {
        let band = band.to_ascii_uppercase();
        if !(1..=60).contains(&number) || !BANDS.contains(&(band as u8)) {
            return Err(ProjectionError::InvalidZone(format!("{number}{band}")));
        }
        Ok(Self { number, band })
    }

    /// The zone a point falls in, including the Norway and Svalbard exceptions
    pub fn natural(lat: f64, lon: f64) -> Result<Self, ProjectionError> {
        check_domain(lat, lon)?;
        let mut number = (((lon + 180.0) / 6.0).floor() as u8 + 1).min(60);

        if (56.0..64.0).contains(&lat) && (3.0..12.0).contains(&lon) {
            number = 32;
        }
        if (72.0..=MAX_LATITUDE).contains(&lat) {
            number = match lon {
                l if (0.0..9.0).contains(&l) => 31,
                l if (9.0..21.0).contains(&l) => 33,
                l if (21.0..33.0).contains(&l) => 35,
                l if (33.0..42.0).contains(&l) => 37,
                _ => number,
            };
        }

        Ok(Self {
            number,
            band: band_letter(lat),
        })
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn band(&self) -> char {
        self.band
    }

    /// Central meridian in degrees
    pub fn central_meridian(&self) -> f64 {
        f64::from(self.number) * 6.0 - 183.0
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.band)
    }
}

impl FromStr for Zone {
    type Err = ProjectionError;

    /// Parses a full designator such as `32V`; see [`ForcedZone`] for the
    /// band-less form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let forced: ForcedZone = s.parse()?;
        match forced.band {
            Some(band) => Zone::new(forced.number, band),
            None => Err(ProjectionError::InvalidZone(s.to_string())),
        }
    }
}

/// A caller-supplied zone: number with an optional band letter (`31` or `31V`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForcedZone {
    pub number: u8,
    pub band: Option<char>,
}

impl FromStr for ForcedZone {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProjectionError::InvalidZone(s.to_string());
        let trimmed = s.trim().trim_matches('"').trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (digits, rest) = trimmed.split_at(split);

        let number: u8 = digits.parse().map_err(|_| invalid())?;
        if !(1..=60).contains(&number) {
            return Err(invalid());
        }

        let band = match rest.len() {
            0 => None,
            1 => {
                let band = rest.chars().next().map(|c| c.to_ascii_uppercase());
                match band {
                    Some(b) if BANDS.contains(&(b as u8)) => Some(b),
                    _ => return Err(invalid()),
                }
            }
            _ => return Err(invalid()),
        };

        Ok(Self { number, band })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedCoordinate {
    /// Metres
    pub easting: f64,
    /// Metres, with 10,000,000 false northing in the southern hemisphere
    pub northing: f64,
    pub zone: Zone,
    pub hemisphere: Hemisphere,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis in metres
    pub semi_major_axis: f64,
    pub flattening: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        semi_major_axis: 6_378_137.0,
        flattening: 1.0 / 298.257_223_563,
    };

    fn eccentricity_squared(&self) -> f64 {
        self.flattening * (2.0 - self.flattening)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UtmProjector {
    ellipsoid: Ellipsoid,
}

impl Default for UtmProjector {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl UtmProjector {
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        Self { ellipsoid }
    }

    pub fn wgs84() -> Self {
        Self::new(Ellipsoid::WGS84)
    }

    /// Projects a point into its natural zone, or into `forced_zone` when given.
    ///
    /// A forced zone only changes the central meridian; the designator is the
    /// forced one, with the band computed from latitude when omitted. The point
    /// must lie within 9° of the forced zone's central meridian.
    pub fn project(
        &self,
        lat: f64,
        lon: f64,
        forced_zone: Option<&str>,
    ) -> Result<ProjectedCoordinate, ProjectionError> {
        let natural = Zone::natural(lat, lon)?;
        let zone = match forced_zone {
            Some(raw) => {
                let forced: ForcedZone = raw.parse()?;
                Zone::new(forced.number, forced.band.unwrap_or(natural.band))?
            }
            None => natural,
        };

        let offset = longitude_offset(lon, zone.central_meridian());
        if offset.abs() > MAX_FORCED_OFFSET_DEGREES {
            return Err(ProjectionError::ForcedZoneTooFar {
                zone: zone.to_string(),
                lon,
            });
        }

        let (easting, northing) = self.forward(lat, offset);
        let hemisphere = Hemisphere::of_latitude(lat);
        let northing = match hemisphere {
            Hemisphere::North => northing,
            Hemisphere::South => northing + FALSE_NORTHING_SOUTH,
        };

        Ok(ProjectedCoordinate {
            easting,
            northing,
            zone,
            hemisphere,
        })
    }

    /// `offset` is the longitude difference from the central meridian in degrees
    fn forward(&self, lat: f64, offset: f64) -> (f64, f64) {
        let a = self.ellipsoid.semi_major_axis;
        let e2 = self.ellipsoid.eccentricity_squared();
        let ep2 = e2 / (1.0 - e2);

        let phi = lat.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = a / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let big_a = cos_phi * offset.to_radians();
        let m = self.meridian_arc(phi);

        let a2 = big_a * big_a;
        let a3 = a2 * big_a;
        let a4 = a3 * big_a;
        let a5 = a4 * big_a;
        let a6 = a5 * big_a;

        let easting = SCALE_FACTOR
            * n
            * (big_a
                + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
            + FALSE_EASTING;

        let northing = SCALE_FACTOR
            * (m + n
                * tan_phi
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));

        (easting, northing)
    }

    /// Distance along the meridian from the equator to latitude `phi` (radians)
    fn meridian_arc(&self, phi: f64) -> f64 {
        let a = self.ellipsoid.semi_major_axis;
        let e2 = self.ellipsoid.eccentricity_squared();
        let e4 = e2 * e2;
        let e6 = e4 * e2;

        a * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    /// Inverse projection back to latitude/longitude
    pub fn to_lat_lng(&self, coord: &ProjectedCoordinate) -> LatLng {
        let a = self.ellipsoid.semi_major_axis;
        let e2 = self.ellipsoid.eccentricity_squared();
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let ep2 = e2 / (1.0 - e2);
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let x = coord.easting - FALSE_EASTING;
        let y = match coord.hemisphere {
            Hemisphere::North => coord.northing,
            Hemisphere::South => coord.northing - FALSE_NORTHING_SOUTH,
        };

        let m = y / SCALE_FACTOR;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();
        let n1 = a / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
        let t1 = tan_phi1 * tan_phi1;
        let c1 = ep2 * cos_phi1 * cos_phi1;
        let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
        let d = x / (n1 * SCALE_FACTOR);

        let d2 = d * d;
        let d3 = d2 * d;
        let d4 = d3 * d;
        let d5 = d4 * d;
        let d6 = d5 * d;

        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d6
                        / 720.0);

        let dlon = (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d5
                / 120.0)
            / cos_phi1;

        let mut lng = coord.zone.central_meridian() + dlon.to_degrees();
        if lng > 180.0 {
            lng -= 360.0;
        } else if lng < -180.0 {
            lng += 360.0;
        }

        LatLng {
            lat: lat.to_degrees(),
            lng,
        }
    }
}

fn check_domain(lat: f64, lon: f64) -> Result<(), ProjectionError> {
    if !lat.is_finite() || !lon.is_finite() {
        return Err(ProjectionError::NonFinite { lat, lon });
    }
    if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&lat) {
        return Err(ProjectionError::LatitudeOutOfRange(lat));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(ProjectionError::LongitudeOutOfRange(lon));
    }
    Ok(())
}

/// Signed difference `lon - meridian`, wrapped across the antimeridian
fn longitude_offset(lon: f64, meridian: f64) -> f64 {
    let offset = lon - meridian;
    if offset > 180.0 {
        offset - 360.0
    } else if offset < -180.0 {
        offset + 360.0
    } else {
        offset
    }
}

fn band_letter(lat: f64) -> char {
    let index = (((lat - MIN_LATITUDE) / 8.0).floor() as usize).min(BANDS.len() - 1);
    BANDS[index] as char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} ± {tolerance}, got {actual}"
        );
    }

    #[test]
    fn test_oslo_natural_zone() {
        let coord = UtmProjector::wgs84().project(59.9, 10.7, None).unwrap();
        assert_eq!(coord.zone.to_string(), "32V");
        assert_eq!(coord.hemisphere, Hemisphere::North);
        assert_close(coord.easting, 595_101.146, 0.01);
        assert_close(coord.northing, 6_641_495.241, 0.01);
    }

    #[test]
    fn test_forced_zone_changes_coordinates_not_designator() {
        let projector = UtmProjector::wgs84();
        let natural = projector.project(59.9, 10.7, None).unwrap();
        let forced = projector.project(59.9, 10.7, Some("31V")).unwrap();

        assert_eq!(forced.zone.to_string(), "31V");
        assert_close(forced.easting, 930_136.801, 0.01);
        assert_close(forced.northing, 6_665_336.865, 0.01);
        assert!((forced.easting - natural.easting).abs() > 1000.0);

        // Both invert to the same point
        let a = projector.to_lat_lng(&natural);
        let b = projector.to_lat_lng(&forced);
        assert_close(a.lat, b.lat, 1e-4);
        assert_close(a.lng, b.lng, 1e-4);
    }

    #[test]
    fn test_forced_zone_without_band_uses_latitude_band() {
        let coord = UtmProjector::wgs84().project(59.9, 10.7, Some(" 31 ")).unwrap();
        assert_eq!(coord.zone.to_string(), "31V");
    }

    #[test]
    fn test_invalid_forced_zones() {
        let projector = UtmProjector::wgs84();
        for raw in ["0V", "61V", "abc", "32VV", "32I", "V32", ""] {
            let err = projector.project(59.9, 10.7, Some(raw)).unwrap_err();
            assert!(
                matches!(err, ProjectionError::InvalidZone(_)),
                "{raw:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_southern_hemisphere_false_northing() {
        let coord = UtmProjector::wgs84()
            .project(-33.8688, 151.2093, None)
            .unwrap();
        assert_eq!(coord.zone.to_string(), "56H");
        assert_eq!(coord.hemisphere, Hemisphere::South);
        assert_close(coord.easting, 334_368.634, 0.01);
        assert_close(coord.northing, 6_250_948.345, 0.01);
    }

    #[test]
    fn test_equator_on_central_meridian() {
        let coord = UtmProjector::wgs84().project(0.0, 3.0, None).unwrap();
        assert_eq!(coord.zone.to_string(), "31N");
        assert_close(coord.easting, 500_000.0, 1e-6);
        assert_close(coord.northing, 0.0, 1e-6);
    }

    #[test]
    fn test_norway_exception() {
        assert_eq!(Zone::natural(60.0, 5.0).unwrap().number(), 32);
        assert_eq!(Zone::natural(55.9, 5.0).unwrap().number(), 31);
        assert_eq!(Zone::natural(60.0, 2.9).unwrap().number(), 31);
    }

    #[test]
    fn test_svalbard_exceptions() {
        assert_eq!(Zone::natural(78.0, 5.0).unwrap().to_string(), "31X");
        assert_eq!(Zone::natural(78.0, 10.0).unwrap().number(), 33);
        assert_eq!(Zone::natural(78.0, 15.0).unwrap().number(), 33);
        assert_eq!(Zone::natural(78.0, 25.0).unwrap().number(), 35);
        assert_eq!(Zone::natural(78.0, 40.0).unwrap().number(), 37);
        assert_eq!(Zone::natural(78.0, 45.0).unwrap().number(), 38);
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(Zone::natural(-80.0, 0.0).unwrap().band(), 'C');
        assert_eq!(Zone::natural(0.0, 0.0).unwrap().band(), 'N');
        assert_eq!(Zone::natural(-0.1, 0.0).unwrap().band(), 'M');
        assert_eq!(Zone::natural(84.0, 0.0).unwrap().band(), 'X');
        assert_eq!(Zone::natural(0.0, 180.0).unwrap().number(), 60);
        assert_eq!(Zone::natural(0.0, -180.0).unwrap().number(), 1);
    }

    #[test]
    fn test_domain_errors() {
        let projector = UtmProjector::wgs84();
        assert!(matches!(
            projector.project(84.5, 0.0, None),
            Err(ProjectionError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            projector.project(-80.5, 0.0, None),
            Err(ProjectionError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            projector.project(10.0, 180.5, None),
            Err(ProjectionError::LongitudeOutOfRange(_))
        ));
        assert!(matches!(
            projector.project(f64::NAN, 0.0, None),
            Err(ProjectionError::NonFinite { .. })
        ));
        assert!(matches!(
            projector.project(10.0, f64::INFINITY, None),
            Err(ProjectionError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_distant_forced_zone_rejected() {
        let projector = UtmProjector::wgs84();
        for raw in ["2V", "20V", "34V"] {
            match projector.project(59.9, 10.7, Some(raw)) {
                Err(ProjectionError::ForcedZoneTooFar { zone, lon }) => {
                    assert_eq!(zone, raw);
                    assert_eq!(lon, 10.7);
                }
                other => panic!("{raw:?} gave {other:?}"),
            }
        }
        // Zone 31 is 7.7 degrees away and still accepted
        assert!(projector.project(59.9, 10.7, Some("31V")).is_ok());
    }

    #[test]
    fn test_forced_zone_across_antimeridian() {
        let projector = UtmProjector::wgs84();
        let coord = projector.project(-16.0, 179.5, Some("1")).unwrap();
        assert_eq!(coord.zone.to_string(), "1K");
        assert!(coord.easting > 100_000.0 && coord.easting < 500_000.0);

        let back = projector.to_lat_lng(&coord);
        assert_close(back.lat, -16.0, 1e-5);
        assert_close(back.lng, 179.5, 1e-5);
    }

    #[test]
    fn test_round_trip_within_natural_zone() {
        let projector = UtmProjector::wgs84();
        let points = [
            (59.9, 10.7),
            (-33.8688, 151.2093),
            (0.0, 0.0),
            (45.0, -122.0),
            (-79.5, -70.5),
            (83.5, 30.0),
            (12.34, 56.78),
            (-45.0, 179.9),
        ];
        for (lat, lon) in points {
            let coord = projector.project(lat, lon, None).unwrap();
            let back = projector.to_lat_lng(&coord);
            assert_close(back.lat, lat, 1e-6);
            assert_close(back.lng, lon, 1e-6);
        }
    }

    #[test]
    fn test_zone_from_str() {
        let zone: Zone = "32v".parse().unwrap();
        assert_eq!(zone, Zone::new(32, 'V').unwrap());
        assert_eq!(zone.central_meridian(), 9.0);
        assert!("32".parse::<Zone>().is_err());
    }
}
