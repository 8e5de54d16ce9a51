//! Coordinate transformation between two resolved CRS.

use super::{CrsDefinition, CRS};
use crate::error::Result;

/// Converts coordinates from a source CRS to a target CRS through geodetic
/// longitude/latitude.
#[derive(Debug, Clone)]
pub struct Transformer {
    source: CrsDefinition,
    target: CrsDefinition,
}

impl Transformer {
    /// Resolve both CRS; fails with `Error::Projection` if either is unsupported.
    pub fn new(source: &CRS, target: &CRS) -> Result<Self> {
        Ok(Self {
            source: source.definition()?,
            target: target.definition()?,
        })
    }

    pub fn source(&self) -> &CrsDefinition {
        &self.source
    }

    pub fn target(&self) -> &CrsDefinition {
        &self.target
    }

    /// True when coordinates pass through unchanged. Geographic CRS on
    /// different datums count as identical since no datum shift is modelled.
    pub fn is_identity(&self) -> bool {
        self.source.projection == self.target.projection && self.source.unit == self.target.unit
    }

    /// Transform a single coordinate pair.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if self.is_identity() {
            // Still validate: an out-of-range longitude is not a coordinate.
            let (lon, lat) = self.source.unproject(x, y)?;
            return self.target.project(lon, lat).map(|_| (x, y));
        }
        let (lon, lat) = self.source.unproject(x, y)?;
        self.target.project(lon, lat)
    }

    /// Transform a `geo_types` coordinate.
    pub fn transform_coord(&self, coord: geo_types::Coord<f64>) -> Result<geo_types::Coord<f64>> {
        let (x, y) = self.transform(coord.x, coord.y)?;
        Ok(geo_types::Coord { x, y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn wgs84_to_state_plane_and_back() {
        let forward = Transformer::new(&CRS::wgs84(), &CRS::from_epsg(3435)).unwrap();
        let back = Transformer::new(&CRS::from_epsg(3435), &CRS::wgs84()).unwrap();

        let (x, y) = forward.transform(-87.6298, 41.8781).unwrap();
        let (lon, lat) = back.transform(x, y).unwrap();
        assert!((lon + 87.6298).abs() < 1e-8);
        assert!((lat - 41.8781).abs() < 1e-8);
    }

    #[test]
    fn projected_to_projected() {
        let t = Transformer::new(&CRS::from_epsg(3435), &CRS::from_epsg(32616)).unwrap();
        assert!(!t.is_identity());
        let (e, n) = t.transform(1_175_844.4, 1_898_954.9).unwrap();
        let direct = CRS::from_epsg(32616)
            .definition()
            .unwrap()
            .project(-87.6298, 41.8781)
            .unwrap();
        assert!((e - direct.0).abs() < 0.01);
        assert!((n - direct.1).abs() < 0.01);
    }

    #[test]
    fn datum_only_change_is_identity() {
        let t = Transformer::new(&CRS::from_epsg(4269), &CRS::wgs84()).unwrap();
        assert!(t.is_identity());
        assert_eq!(t.transform(-87.5, 41.5).unwrap(), (-87.5, 41.5));
        assert!(matches!(t.transform(-200.0, 41.5), Err(Error::Projection(_))));
    }

    #[test]
    fn unsupported_target_fails() {
        let err = Transformer::new(&CRS::wgs84(), &CRS::from_epsg(2263)).unwrap_err();
        assert!(matches!(err, Error::Projection(_)));
    }
}
