//! Coordinate Reference System handling
//!
//! A [`CRS`] keeps the representation it was read with (EPSG code, WKT text
//! or OGC URN). Derived equality compares those representations, so
//! `CRS::from_wkt(<WGS 84 WKT>) != CRS::from_epsg(4326)` even though both
//! describe the same system. Use [`CRS::is_equivalent`] to compare systems, or
//! [`CRS::canonicalize`] to normalise a tag to its `EPSG:<code>` form.

mod definition;
mod projection;
mod transform;
mod wkt;

pub use definition::{CrsDefinition, Datum, Ellipsoid, Projection, TransverseMercator, Unit};
pub use transform::Transformer;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// URN of OGC:CRS84, the implicit CRS of RFC 7946 GeoJSON.
pub const CRS84_URN: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation, as found in a `.prj` sidecar
    wkt: Option<String>,
    /// EPSG code if that is how the CRS was declared
    epsg: Option<u32>,
    /// OGC URN, as found in a GeoJSON `crs` member
    urn: Option<String>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
            urn: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
            urn: None,
        }
    }

    /// Create a CRS from an OGC URN
    pub fn from_urn(urn: impl Into<String>) -> Self {
        Self {
            wkt: None,
            epsg: None,
            urn: Some(urn.into()),
        }
    }

    /// Parse a user-supplied CRS: `EPSG:3435`, `3435`, an OGC URN or WKT text.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if let Some(code) = strip_prefix_ignore_case(text, "EPSG:") {
            return parse_code(code).map(Self::from_epsg);
        }
        if text.chars().all(|c| c.is_ascii_digit()) && !text.is_empty() {
            return parse_code(text).map(Self::from_epsg);
        }
        if strip_prefix_ignore_case(text, "urn:").is_some() {
            return Ok(Self::from_urn(text));
        }
        if text.contains('[') {
            return Ok(Self::from_wkt(text));
        }
        Err(Error::Projection(format!("cannot parse CRS '{}'", text)))
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// OGC:CRS84, the RFC 7946 GeoJSON default
    pub fn crs84() -> Self {
        Self::from_urn(CRS84_URN)
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::from_epsg(3857)
    }

    /// Get EPSG code if declared that way
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Get OGC URN
    pub fn urn(&self) -> Option<&str> {
        self.urn.as_deref()
    }

    /// Resolve this representation to the EPSG code it denotes.
    pub fn resolve_epsg(&self) -> Result<u32> {
        if let Some(code) = self.epsg {
            return Ok(code);
        }
        if let Some(urn) = &self.urn {
            return epsg_from_urn(urn);
        }
        if let Some(wkt) = &self.wkt {
            return wkt::resolve_epsg(wkt);
        }
        Err(Error::Projection("empty CRS".to_string()))
    }

    /// Resolve this representation to a full definition.
    pub fn definition(&self) -> Result<CrsDefinition> {
        let code = self.resolve_epsg()?;
        CrsDefinition::from_epsg(code).ok_or_else(|| {
            Error::Projection(format!("unsupported CRS EPSG:{} ({})", code, self.identifier()))
        })
    }

    /// Normalise to the canonical `EPSG:<code>` representation.
    pub fn canonicalize(&self) -> Result<CRS> {
        Ok(CRS::from_epsg(self.definition()?.epsg))
    }

    /// Check if two CRS describe the same system, whatever their encoding
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        match (self.definition(), other.definition()) {
            (Ok(a), Ok(b)) => a.epsg == b.epsg,
            _ => false,
        }
    }

    /// WKT for a `.prj` sidecar: verbatim when read from WKT, generated otherwise.
    pub fn to_wkt(&self) -> Result<String> {
        match &self.wkt {
            Some(wkt) => Ok(wkt.clone()),
            None => Ok(self.definition()?.to_wkt()),
        }
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(urn) = &self.urn {
            return urn.clone();
        }
        if let Some(wkt) = &self.wkt {
            let end = wkt
                .char_indices()
                .nth(50)
                .map(|(i, _)| i)
                .unwrap_or(wkt.len());
            return format!("WKT:{}", &wkt[..end]);
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::wgs84()
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

fn parse_code(code: &str) -> Result<u32> {
    code.trim()
        .parse()
        .map_err(|_| Error::Projection(format!("invalid EPSG code '{}'", code)))
}

/// `urn:ogc:def:crs:EPSG::3435`, `urn:ogc:def:crs:EPSG:6.3:3435`,
/// `urn:ogc:def:crs:OGC:1.3:CRS84`.
fn epsg_from_urn(urn: &str) -> Result<u32> {
    let parts: Vec<&str> = urn.split(':').collect();
    let (Some(authority), Some(code)) = (parts.get(4), parts.last()) else {
        return Err(Error::Projection(format!("malformed CRS URN '{}'", urn)));
    };
    if parts.len() < 6 || !parts[0].eq_ignore_ascii_case("urn") {
        return Err(Error::Projection(format!("malformed CRS URN '{}'", urn)));
    }
    if authority.eq_ignore_ascii_case("OGC") && code.eq_ignore_ascii_case("CRS84") {
        return Ok(4326);
    }
    if authority.eq_ignore_ascii_case("EPSG") {
        return parse_code(code);
    }
    Err(Error::Projection(format!("unsupported CRS authority in '{}'", urn)))
}
