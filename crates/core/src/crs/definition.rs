//! Resolved CRS definitions and the registry of supported EPSG codes.

use super::projection;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of one US survey foot in metres (1200/3937).
pub const US_SURVEY_FOOT: f64 = 1200.0 / 3937.0;

/// Unit of the coordinate axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Angular degrees (geographic CRS)
    Degree,
    /// Metres
    Metre,
    /// US survey feet (State Plane)
    UsSurveyFoot,
}

impl Unit {
    /// Whether distances in this unit are uniform on the ground.
    pub fn is_linear(self) -> bool {
        !matches!(self, Unit::Degree)
    }

    /// Length of one unit in metres; `None` for angular units.
    pub fn metres(self) -> Option<f64> {
        match self {
            Unit::Degree => None,
            Unit::Metre => Some(1.0),
            Unit::UsSurveyFoot => Some(US_SURVEY_FOOT),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Unit::Degree => "degree",
            Unit::Metre => "metre",
            Unit::UsSurveyFoot => "US survey foot",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reference ellipsoid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub name: &'static str,
    /// Semi-major axis in metres
    pub semi_major: f64,
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        name: "WGS 84",
        semi_major: 6_378_137.0,
        inverse_flattening: 298.257_223_563,
    };

    pub const GRS80: Ellipsoid = Ellipsoid {
        name: "GRS 1980",
        semi_major: 6_378_137.0,
        inverse_flattening: 298.257_222_101,
    };

    pub fn flattening(&self) -> f64 {
        1.0 / self.inverse_flattening
    }

    /// First eccentricity squared
    pub fn e2(&self) -> f64 {
        let f = self.flattening();
        2.0 * f - f * f
    }
}

/// Geodetic datum. NAD83 and WGS 84 are treated as coincident: no datum
/// shift is applied when converting between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datum {
    Wgs84,
    Nad83,
}

impl Datum {
    pub fn ellipsoid(self) -> Ellipsoid {
        match self {
            Datum::Wgs84 => Ellipsoid::WGS84,
            Datum::Nad83 => Ellipsoid::GRS80,
        }
    }

    /// EPSG code of the geographic CRS on this datum.
    pub fn geographic_epsg(self) -> u32 {
        match self {
            Datum::Wgs84 => 4326,
            Datum::Nad83 => 4269,
        }
    }

    fn wkt_name(self) -> &'static str {
        match self {
            Datum::Wgs84 => "WGS_1984",
            Datum::Nad83 => "North_American_Datum_1983",
        }
    }
}

/// Transverse Mercator parameters. Angles in degrees, offsets in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    pub latitude_of_origin: f64,
    pub central_meridian: f64,
    pub scale_factor: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

impl TransverseMercator {
    fn utm(zone: u32, north: bool) -> Self {
        Self {
            latitude_of_origin: 0.0,
            central_meridian: (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0,
            scale_factor: 0.9996,
            false_easting: 500_000.0,
            false_northing: if north { 0.0 } else { 10_000_000.0 },
        }
    }
}

/// Map projection of a CRS
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Longitude/latitude in degrees
    Geographic,
    /// Spherical Mercator on the datum's semi-major axis (EPSG:3857)
    WebMercator,
    TransverseMercator(TransverseMercator),
}

/// A fully resolved coordinate reference system
#[derive(Debug, Clone, PartialEq)]
pub struct CrsDefinition {
    pub epsg: u32,
    pub name: String,
    pub datum: Datum,
    pub unit: Unit,
    pub projection: Projection,
}

impl CrsDefinition {
    /// Look up a supported EPSG code.
    pub fn from_epsg(code: u32) -> Option<Self> {
        let def = |name: &str, datum, unit, projection| CrsDefinition {
            epsg: code,
            name: name.to_string(),
            datum,
            unit,
            projection,
        };
        let illinois_east = TransverseMercator {
            latitude_of_origin: 36.0 + 40.0 / 60.0,
            central_meridian: -(88.0 + 20.0 / 60.0),
            scale_factor: 0.999_975,
            false_easting: 300_000.0,
            false_northing: 0.0,
        };
        let illinois_west = TransverseMercator {
            latitude_of_origin: 36.0 + 40.0 / 60.0,
            central_meridian: -(90.0 + 10.0 / 60.0),
            scale_factor: 0.999_941_177,
            false_easting: 700_000.0,
            false_northing: 0.0,
        };

        let definition = match code {
            4326 => def("WGS 84", Datum::Wgs84, Unit::Degree, Projection::Geographic),
            4269 => def("NAD83", Datum::Nad83, Unit::Degree, Projection::Geographic),
            3857 => def(
                "WGS 84 / Pseudo-Mercator",
                Datum::Wgs84,
                Unit::Metre,
                Projection::WebMercator,
            ),
            3435 => def(
                "NAD83 / Illinois East (ftUS)",
                Datum::Nad83,
                Unit::UsSurveyFoot,
                Projection::TransverseMercator(illinois_east),
            ),
            3436 => def(
                "NAD83 / Illinois West (ftUS)",
                Datum::Nad83,
                Unit::UsSurveyFoot,
                Projection::TransverseMercator(illinois_west),
            ),
            26971 => def(
                "NAD83 / Illinois East",
                Datum::Nad83,
                Unit::Metre,
                Projection::TransverseMercator(illinois_east),
            ),
            26972 => def(
                "NAD83 / Illinois West",
                Datum::Nad83,
                Unit::Metre,
                Projection::TransverseMercator(illinois_west),
            ),
            32601..=32660 => {
                let zone = code - 32600;
                def(
                    &format!("WGS 84 / UTM zone {}N", zone),
                    Datum::Wgs84,
                    Unit::Metre,
                    Projection::TransverseMercator(TransverseMercator::utm(zone, true)),
                )
            }
            32701..=32760 => {
                let zone = code - 32700;
                def(
                    &format!("WGS 84 / UTM zone {}S", zone),
                    Datum::Wgs84,
                    Unit::Metre,
                    Projection::TransverseMercator(TransverseMercator::utm(zone, false)),
                )
            }
            26901..=26923 => {
                let zone = code - 26900;
                def(
                    &format!("NAD83 / UTM zone {}N", zone),
                    Datum::Nad83,
                    Unit::Metre,
                    Projection::TransverseMercator(TransverseMercator::utm(zone, true)),
                )
            }
            _ => return None,
        };
        Some(definition)
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self.projection, Projection::Geographic)
    }

    /// Project geodetic longitude/latitude (degrees) into this CRS.
    pub fn project(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        projection::forward(self, lon, lat)
    }

    /// Inverse-project coordinates of this CRS to longitude/latitude (degrees).
    pub fn unproject(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        projection::inverse(self, x, y)
    }

    /// Generate OGC WKT1 with an EPSG authority node.
    pub fn to_wkt(&self) -> String {
        let geogcs = self.geogcs_wkt();
        let (method, params) = match self.projection {
            Projection::Geographic => return geogcs,
            Projection::WebMercator => (
                "Mercator_1SP",
                vec![
                    ("central_meridian", 0.0),
                    ("scale_factor", 1.0),
                    ("false_easting", 0.0),
                    ("false_northing", 0.0),
                ],
            ),
            Projection::TransverseMercator(tm) => {
                let per_unit = self.unit.metres().unwrap_or(1.0);
                (
                    "Transverse_Mercator",
                    vec![
                        ("latitude_of_origin", tm.latitude_of_origin),
                        ("central_meridian", tm.central_meridian),
                        ("scale_factor", tm.scale_factor),
                        ("false_easting", tm.false_easting / per_unit),
                        ("false_northing", tm.false_northing / per_unit),
                    ],
                )
            }
        };
        let params: String = params
            .iter()
            .map(|(name, value)| format!(r#",PARAMETER["{}",{}]"#, name, value))
            .collect();
        format!(
            r#"PROJCS["{}",{},PROJECTION["{}"]{},UNIT["{}",{}],AUTHORITY["EPSG","{}"]]"#,
            self.name,
            geogcs,
            method,
            params,
            self.unit.name(),
            self.unit.metres().unwrap_or(1.0),
            self.epsg
        )
    }

    fn geogcs_wkt(&self) -> String {
        let ellipsoid = self.datum.ellipsoid();
        let code = self.datum.geographic_epsg();
        let name = match self.datum {
            Datum::Wgs84 => "WGS 84",
            Datum::Nad83 => "NAD83",
        };
        format!(
            r#"GEOGCS["{}",DATUM["{}",SPHEROID["{}",{},{}]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","{}"]]"#,
            name,
            self.datum.wkt_name(),
            ellipsoid.name,
            ellipsoid.semi_major,
            ellipsoid.inverse_flattening,
            code
        )
    }
}

impl fmt::Display for CrsDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{} ({})", self.epsg, self.name)
    }
}
