//! Layer measurements: area and bounds

use geo::{Area as GeoArea, BoundingRect, Geometry, Rect};
use svcarea_core::FeatureCollection;

/// Calculate the area of a geometry.
///
/// Returns unsigned area in CRS units squared (square feet for a State
/// Plane feet CRS). Non-areal geometries have zero area.
pub fn area(geom: &Geometry<f64>) -> f64 {
    match geom {
        Geometry::Polygon(p) => p.unsigned_area(),
        Geometry::MultiPolygon(mp) => mp.unsigned_area(),
        Geometry::Rect(r) => r.unsigned_area(),
        Geometry::Triangle(t) => t.unsigned_area(),
        _ => 0.0,
    }
}

/// Sum of feature areas (overlaps counted once per feature).
pub fn total_area(collection: &FeatureCollection) -> f64 {
    collection.iter().map(|f| area(&f.geometry)).sum()
}

/// Axis-aligned envelope of every feature, `None` for an empty layer.
pub fn bounds(collection: &FeatureCollection) -> Option<Rect<f64>> {
    collection
        .iter()
        .filter_map(|f| f.geometry.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, MultiPolygon, Point, Polygon};
    use svcarea_core::{Feature, CRS};

    fn square() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_area_square() {
        let a = area(&Geometry::Polygon(square()));
        assert!((a - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_area_with_hole() {
        let hole = LineString::from(vec![(2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 4.0), (2.0, 2.0)]);
        let poly = Polygon::new(square().exterior().clone(), vec![hole]);
        assert!((area(&Geometry::Polygon(poly)) - 96.0).abs() < 1e-10);
    }

    #[test]
    fn test_area_multipolygon() {
        let mp = MultiPolygon::new(vec![square(), square()]);
        assert!((area(&Geometry::MultiPolygon(mp)) - 200.0).abs() < 1e-10);
    }

    #[test]
    fn test_area_point_is_zero() {
        assert_eq!(area(&Geometry::Point(Point::new(1.0, 1.0))), 0.0);
    }

    #[test]
    fn test_layer_bounds_and_area() {
        let layer = FeatureCollection::new(
            CRS::from_epsg(3435),
            vec![Feature::new(square()), Feature::new(Point::new(-5.0, 20.0))],
        );
        let rect = bounds(&layer).unwrap();
        assert_eq!(rect.min().x, -5.0);
        assert_eq!(rect.max().y, 20.0);
        assert!((total_area(&layer) - 100.0).abs() < 1e-10);
        assert!(bounds(&FeatureCollection::empty(CRS::wgs84())).is_none());
    }
}
