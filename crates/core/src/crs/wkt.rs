//! Resolve OGC / ESRI WKT text to an EPSG code.
//!
//! The outermost `AUTHORITY["EPSG","n"]` (WKT1) or `ID["EPSG",n]` (WKT2) node
//! wins. ESRI `.prj` files carry no authority, so their `PROJCS` / `GEOGCS`
//! name is matched against the spellings of the supported definitions.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static AUTHORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:AUTHORITY|ID)\s*\[\s*"EPSG"\s*,\s*"?(\d+)"?"#).expect("valid regex")
});

static ROOT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^\s*(PROJCS|PROJCRS|GEOGCS|GEOGCRS|GEODCRS)\s*\[\s*"([^"]*)""#).expect("valid regex")
});

static UTM_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(wgs84|wgs1984|nad83|nad1983)utmzone(\d{1,2})([ns])$").expect("valid regex")
});

/// Resolve WKT text to the EPSG code of the CRS it describes.
pub(crate) fn resolve_epsg(wkt: &str) -> Result<u32> {
    if let Some(code) = root_authority(wkt) {
        return Ok(code);
    }

    let captures = ROOT_NAME
        .captures(wkt)
        .ok_or_else(|| Error::Projection("WKT has no PROJCS/GEOGCS root".to_string()))?;
    let name = normalize(&captures[2]);

    lookup_name(&name).ok_or_else(|| Error::Projection(format!("unrecognised CRS name '{}'", &captures[2])))
}

/// EPSG code of the authority node at nesting depth one, if any.
fn root_authority(wkt: &str) -> Option<u32> {
    AUTHORITY.captures_iter(wkt).find_map(|caps| {
        let start = caps.get(0)?.start();
        (bracket_depth(&wkt[..start]) == 1).then(|| caps[1].parse::<u32>().ok()).flatten()
    })
}

fn bracket_depth(prefix: &str) -> i32 {
    let mut depth = 0;
    let mut quoted = false;
    for c in prefix.chars() {
        match c {
            '"' => quoted = !quoted,
            '[' | '(' if !quoted => depth += 1,
            ']' | ')' if !quoted => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Lowercase and drop everything but ASCII letters and digits.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn lookup_name(name: &str) -> Option<u32> {
    let code = match name {
        "wgs84" | "wgs1984" | "gcswgs1984" | "worldgeodeticsystem1984" => 4326,
        "nad83" | "gcsnorthamerican1983" | "northamerican1983" => 4269,
        "wgs84pseudomercator" | "wgs1984webmercatorauxiliarysphere" | "wgs84webmercator" => 3857,
        "nad83illinoiseastftus" | "nad1983stateplaneillinoiseastfips1201feet" => 3435,
        "nad83illinoiswestftus" | "nad1983stateplaneillinoiswestfips1202feet" => 3436,
        "nad83illinoiseast" | "nad1983stateplaneillinoiseastfips1201" => 26971,
        "nad83illinoiswest" | "nad1983stateplaneillinoiswestfips1202" => 26972,
        _ => return lookup_utm(name),
    };
    Some(code)
}

fn lookup_utm(name: &str) -> Option<u32> {
    let caps = UTM_NAME.captures(name)?;
    let zone: u32 = caps[2].parse().ok()?;
    if !(1..=60).contains(&zone) {
        return None;
    }
    match (&caps[1], &caps[3]) {
        ("wgs84" | "wgs1984", "n") => Some(32600 + zone),
        ("wgs84" | "wgs1984", "s") => Some(32700 + zone),
        ("nad83" | "nad1983", "n") if zone <= 23 => Some(26900 + zone),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ESRI_WGS84: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

    const ESRI_IL_EAST: &str = r#"PROJCS["NAD_1983_StatePlane_Illinois_East_FIPS_1201_Feet",GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",984250.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",-88.33333333333333],PARAMETER["Scale_Factor",0.999975],PARAMETER["Latitude_Of_Origin",36.66666666666666],UNIT["Foot_US",0.3048006096012192]]"#;

    const OGC_UTM16: &str = r#"PROJCS["WGS 84 / UTM zone 16N",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]],PROJECTION["Transverse_Mercator"],PARAMETER["central_meridian",-87],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AUTHORITY["EPSG","32616"]]"#;

    #[test]
    fn outermost_authority_wins() {
        assert_eq!(resolve_epsg(OGC_UTM16).unwrap(), 32616);
    }

    #[test]
    fn wkt2_id_node() {
        let wkt = r#"GEOGCRS["WGS 84",DATUM["World Geodetic System 1984",ELLIPSOID["WGS 84",6378137,298.257223563]],CS[ellipsoidal,2],ID["EPSG",4326]]"#;
        assert_eq!(resolve_epsg(wkt).unwrap(), 4326);
    }

    #[test]
    fn esri_names() {
        assert_eq!(resolve_epsg(ESRI_WGS84).unwrap(), 4326);
        assert_eq!(resolve_epsg(ESRI_IL_EAST).unwrap(), 3435);
        assert_eq!(
            resolve_epsg(r#"PROJCS["NAD_1983_UTM_Zone_16N",GEOGCS["GCS_North_American_1983"]]"#).unwrap(),
            26916
        );
        assert_eq!(
            resolve_epsg(r#"PROJCS["WGS_1984_UTM_Zone_21S",GEOGCS["GCS_WGS_1984"]]"#).unwrap(),
            32721
        );
    }

    #[test]
    fn unknown_names_fail() {
        assert!(resolve_epsg(r#"PROJCS["Lambert_Conformal_Conic_Somewhere",GEOGCS["x"]]"#).is_err());
        assert!(resolve_epsg("not wkt at all").is_err());
        assert!(resolve_epsg(r#"PROJCS["NAD_1983_UTM_Zone_40N"]"#).is_err());
    }
}
