//! Pure-Rust forward/inverse projections (Snyder 1987, USGS formulas).
//!
//! Covers geographic, spherical Web Mercator and ellipsoidal Transverse
//! Mercator (UTM and State Plane zones). No external C dependencies (no
//! libproj).

use super::definition::{CrsDefinition, Ellipsoid, Projection, TransverseMercator};
use crate::error::{Error, Result};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Latitude limit of EPSG:3857 (square world extent).
const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Longitudes further than this from the central meridian have no
/// Transverse Mercator image.
const TM_MAX_DLON: f64 = FRAC_PI_2;

const ANGLE_EPS: f64 = 1e-9;

// ── Public API ───────────────────────────────────────────────────────────

/// Project (lon, lat) in degrees into `def`'s coordinates and unit.
pub(crate) fn forward(def: &CrsDefinition, lon: f64, lat: f64) -> Result<(f64, f64)> {
    check_geodetic(def, lon, lat)?;

    let (x, y) = match def.projection {
        Projection::Geographic => return Ok((lon, lat)),
        Projection::WebMercator => {
            if lat.abs() > WEB_MERCATOR_MAX_LAT {
                return Err(out_of_domain(def, lon, lat));
            }
            let a = def.datum.ellipsoid().semi_major;
            let x = a * lon.to_radians();
            let y = a * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
            (x, y)
        }
        Projection::TransverseMercator(tm) => {
            let (x, y) = tm_forward(&def.datum.ellipsoid(), &tm, lon, lat)
                .ok_or_else(|| out_of_domain(def, lon, lat))?;
            (x + tm.false_easting, y + tm.false_northing)
        }
    };

    let per_unit = def.unit.metres().unwrap_or(1.0);
    finite(def, lon, lat, (x / per_unit, y / per_unit))
}

/// Inverse-project `def`'s coordinates to (lon, lat) in degrees.
pub(crate) fn inverse(def: &CrsDefinition, x: f64, y: f64) -> Result<(f64, f64)> {
    if !x.is_finite() || !y.is_finite() {
        return Err(out_of_domain(def, x, y));
    }

    let per_unit = def.unit.metres().unwrap_or(1.0);
    let (lon, lat) = match def.projection {
        Projection::Geographic => (x, y),
        Projection::WebMercator => {
            let a = def.datum.ellipsoid().semi_major;
            let lon = (x * per_unit / a).to_degrees();
            let lat = (y * per_unit / a).sinh().atan().to_degrees();
            (lon, lat)
        }
        Projection::TransverseMercator(tm) => {
            let e = x * per_unit - tm.false_easting;
            let n = y * per_unit - tm.false_northing;
            tm_inverse(&def.datum.ellipsoid(), &tm, e, n).ok_or_else(|| out_of_domain(def, x, y))?
        }
    };

    check_geodetic(def, lon, lat)?;
    finite(def, x, y, (lon, lat))
}

// ── Transverse Mercator (Snyder 1987, USGS Prof. Paper 1395, pp. 61-64) ─

/// Easting/northing in metres relative to the false origin, or `None` when
/// the longitude is more than 90° from the central meridian.
fn tm_forward(ellipsoid: &Ellipsoid, tm: &TransverseMercator, lon: f64, lat: f64) -> Option<(f64, f64)> {
    let a = ellipsoid.semi_major;
    let e2 = ellipsoid.e2();
    let ep2 = e2 / (1.0 - e2);
    let k0 = tm.scale_factor;

    let lat = lat.to_radians();
    let dlon = normalize_angle(lon.to_radians() - tm.central_meridian.to_radians());
    if dlon.abs() > TM_MAX_DLON {
        return None;
    }

    let m0 = meridional_arc(ellipsoid, tm.latitude_of_origin.to_radians());
    let m = meridional_arc(ellipsoid, lat);

    let cos_lat = lat.cos();
    if cos_lat.abs() < ANGLE_EPS {
        // At the poles every meridian converges on the central one.
        return Some((0.0, k0 * (m - m0)));
    }

    let sin_lat = lat.sin();
    let tan_lat = lat.tan();

    let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = ep2 * cos_lat * cos_lat;
    let a_coeff = cos_lat * dlon;

    let a2 = a_coeff * a_coeff;
    let a4 = a2 * a2;
    let a6 = a4 * a2;

    // Snyder eq. 8-9
    let easting = k0
        * n
        * (a_coeff
            + (1.0 - t + c) * a2 * a_coeff / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a4 * a_coeff / 120.0);

    // Snyder eq. 8-10
    let northing = k0
        * (m - m0
            + n * tan_lat
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));

    Some((easting, northing))
}

/// Snyder eqs. 8-17 to 8-25 (footpoint latitude method). Input is relative
/// to the false origin, in metres.
fn tm_inverse(ellipsoid: &Ellipsoid, tm: &TransverseMercator, easting: f64, northing: f64) -> Option<(f64, f64)> {
    let a = ellipsoid.semi_major;
    let e2 = ellipsoid.e2();
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let ep2 = e2 / (1.0 - e2);
    let k0 = tm.scale_factor;

    let m = meridional_arc(ellipsoid, tm.latitude_of_origin.to_radians()) + northing / k0;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
    if mu.abs() > FRAC_PI_2 {
        return None;
    }

    let sqrt_1me2 = (1.0 - e2).sqrt();
    let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);
    let e1_2 = e1 * e1;
    let e1_3 = e1_2 * e1;
    let e1_4 = e1_3 * e1;

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

    let cos_phi1 = phi1.cos();
    if cos_phi1.abs() < ANGLE_EPS {
        return Some((tm.central_meridian, phi1.signum() * 90.0));
    }
    let sin_phi1 = phi1.sin();
    let tan_phi1 = phi1.tan();

    let c1 = ep2 * cos_phi1 * cos_phi1;
    let t1 = tan_phi1 * tan_phi1;
    let w = 1.0 - e2 * sin_phi1 * sin_phi1;
    let n1 = a / w.sqrt();
    let r1 = a * (1.0 - e2) / (w * w.sqrt());
    let d = easting / (n1 * k0);

    let d2 = d * d;
    let d3 = d2 * d;
    let d4 = d2 * d2;
    let d5 = d4 * d;
    let d6 = d4 * d2;

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d2 / 2.0 - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d4 / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1) * d6
                    / 720.0);

    let dlon = (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d5 / 120.0)
        / cos_phi1;
    if dlon.abs() > TM_MAX_DLON {
        return None;
    }

    let lon = normalize_angle(tm.central_meridian.to_radians() + dlon);
    Some((lon.to_degrees(), lat.to_degrees()))
}

/// Meridional arc from equator to latitude `lat` (radians).
/// Snyder eq. 3-21.
fn meridional_arc(ellipsoid: &Ellipsoid, lat: f64) -> f64 {
    let e2 = ellipsoid.e2();
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    ellipsoid.semi_major
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Wrap an angle in radians into [-π, π].
fn normalize_angle(mut angle: f64) -> f64 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

fn check_geodetic(def: &CrsDefinition, lon: f64, lat: f64) -> Result<()> {
    let valid = lon.is_finite()
        && lat.is_finite()
        && lon.abs() <= 180.0 + ANGLE_EPS
        && lat.abs() <= 90.0 + ANGLE_EPS;
    if valid {
        Ok(())
    } else {
        Err(out_of_domain(def, lon, lat))
    }
}

fn finite(def: &CrsDefinition, in_x: f64, in_y: f64, out: (f64, f64)) -> Result<(f64, f64)> {
    if out.0.is_finite() && out.1.is_finite() {
        Ok(out)
    } else {
        Err(out_of_domain(def, in_x, in_y))
    }
}

fn out_of_domain(def: &CrsDefinition, x: f64, y: f64) -> Error {
    Error::Projection(format!("coordinate ({}, {}) is outside the domain of {}", x, y, def))
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(actual: f64, expected: f64, tol: f64, what: &str) {
        assert!(
            (actual - expected).abs() <= tol,
            "{what}: {actual} is not within {tol} of {expected}"
        );
    }

    fn def(code: u32) -> CrsDefinition {
        CrsDefinition::from_epsg(code).unwrap()
    }

    #[test]
    fn chicago_illinois_east_feet() {
        let (x, y) = def(3435).project(-87.6298, 41.8781).unwrap();
        assert_near(x, 1_175_844.4, 0.5, "easting ftUS");
        assert_near(y, 1_898_954.9, 0.5, "northing ftUS");
    }

    #[test]
    fn chicago_web_mercator() {
        let (x, y) = def(3857).project(-87.6298, 41.8781).unwrap();
        assert_near(x, -9_754_904.71, 0.01, "x");
        assert_near(y, 5_142_736.87, 0.01, "y");
    }

    #[test]
    fn utm_north_and_south() {
        let (e, n) = def(32630).project(-3.7037, 40.4168).unwrap();
        assert_near(e, 440_298.94, 1.0, "UTM 30N easting");
        assert_near(n, 4_474_257.31, 1.0, "UTM 30N northing");

        let (e, n) = def(32721).project(-58.3816, -34.6037).unwrap();
        assert_near(e, 373_317.50, 1.0, "UTM 21S easting");
        assert_near(n, 6_170_036.17, 1.0, "UTM 21S northing");

        // Central meridian on the equator maps onto the false origin.
        let (e, n) = def(32630).project(-3.0, 0.0).unwrap();
        assert_near(e, 500_000.0, 0.01, "easting");
        assert_near(n, 0.0, 0.01, "northing");
    }

    #[test]
    fn illinois_east_origin_in_feet() {
        let (x, y) = def(3435).project(-(88.0 + 20.0 / 60.0), 36.0 + 40.0 / 60.0).unwrap();
        assert_near(x, 984_250.0, 0.01, "false easting in ftUS");
        assert_near(y, 0.0, 0.01, "northing at latitude of origin");
    }

    #[test]
    fn feet_and_metres_agree() {
        let (xf, yf) = def(3435).project(-87.6298, 41.8781).unwrap();
        let (xm, ym) = def(26971).project(-87.6298, 41.8781).unwrap();
        assert_near(xf * US_FOOT, xm, 1e-6, "easting");
        assert_near(yf * US_FOOT, ym, 1e-6, "northing");
        // Downtown Chicago sits roughly 1.18M ft east, 1.9M ft north.
        assert!(xf > 1_100_000.0 && xf < 1_250_000.0, "easting {xf}");
        assert!(yf > 1_850_000.0 && yf < 1_950_000.0, "northing {yf}");
    }

    const US_FOOT: f64 = crate::crs::definition::US_SURVEY_FOOT;

    #[test]
    fn transverse_mercator_round_trip() {
        for code in [3435, 3436, 26971, 32616, 32721, 26916] {
            let d = def(code);
            let Projection::TransverseMercator(tm) = d.projection else {
                unreachable!()
            };
            for (dlon, lat) in [(0.0, 0.0), (1.5, 41.9), (-2.0, -33.0), (2.5, 60.0)] {
                let lon = tm.central_meridian + dlon;
                let (x, y) = d.project(lon, lat).unwrap();
                let (lon2, lat2) = d.unproject(x, y).unwrap();
                assert_near(lon2, lon, 1e-7, &format!("lon EPSG:{code}"));
                assert_near(lat2, lat, 1e-7, &format!("lat EPSG:{code}"));
            }
        }
    }

    #[test]
    fn web_mercator_round_trip_and_limits() {
        let d = def(3857);
        let (x, y) = d.project(-87.6298, 41.8781).unwrap();
        let (lon, lat) = d.unproject(x, y).unwrap();
        assert_near(lon, -87.6298, 1e-9, "lon");
        assert_near(lat, 41.8781, 1e-9, "lat");

        assert!(matches!(d.project(0.0, 89.0), Err(Error::Projection(_))));
    }

    #[test]
    fn geographic_rejects_out_of_range() {
        let d = def(4326);
        assert_eq!(d.project(10.0, 20.0).unwrap(), (10.0, 20.0));
        assert!(d.project(190.0, 0.0).is_err());
        assert!(d.project(0.0, -91.0).is_err());
        assert!(d.project(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn transverse_mercator_rejects_far_side() {
        let d = def(32616);
        assert!(matches!(d.project(93.0, 10.0), Err(Error::Projection(_))));
        assert!(d.unproject(500_000.0, 20_000_000.0).is_err());
    }
}
