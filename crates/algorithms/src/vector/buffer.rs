//! Buffer operations
//!
//! Create circular buffer zones around point features. Each point becomes a
//! regular polygon inscribed in the circle of the requested radius, measured
//! in the linear unit of the collection's CRS.

use crate::maybe_rayon::*;
use geo::{Geometry, LineString, Point, Polygon};
use std::f64::consts::PI;
use svcarea_core::vector::GeometryKind;
use svcarea_core::{Algorithm, Error, Feature, FeatureCollection, Result};
use tracing::{debug, info};

/// Fewest vertices a buffer ring may have.
pub const MIN_SEGMENTS: usize = 32;

/// Default number of vertices per buffer ring (area error 0.16%).
pub const DEFAULT_SEGMENTS: usize = 64;

/// What buffer polygons carry over from their source point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributePolicy {
    /// Copy attributes and id of the source point
    #[default]
    Inherit,
    /// Emit bare polygons
    Drop,
}

/// Parameters for buffer operations
#[derive(Debug, Clone)]
pub struct BufferParams {
    /// Buffer radius in CRS units (must be finite and positive)
    pub distance: f64,
    /// Number of ring vertices (default: 64, raised to at least 32)
    pub segments: usize,
    /// Attribute handling for the output features
    pub attributes: AttributePolicy,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            distance: 1.0,
            segments: DEFAULT_SEGMENTS,
            attributes: AttributePolicy::Inherit,
        }
    }
}

impl BufferParams {
    pub fn new(distance: f64) -> Self {
        Self {
            distance,
            ..Default::default()
        }
    }

    /// Vertex count actually used for a ring.
    pub fn effective_segments(&self) -> usize {
        self.segments.max(MIN_SEGMENTS)
    }
}

/// Buffer algorithm
#[derive(Debug, Clone, Default)]
pub struct Buffer;

impl Algorithm for Buffer {
    type Input = FeatureCollection;
    type Output = FeatureCollection;
    type Params = BufferParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Buffer"
    }

    fn description(&self) -> &'static str {
        "Generate a circular buffer polygon around every point feature"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        buffer(&input, &params)
    }
}

/// Create a circular buffer around a point.
///
/// Ring vertex k sits at angle 2πk/n, so the ring runs counter-clockwise and
/// is closed by repeating the first vertex.
///
/// # Arguments
/// * `point` - Center point
/// * `radius` - Circle radius
/// * `segments` - Number of distinct ring vertices
pub fn buffer_point(point: &Point<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let n = segments.max(3);
    let (cx, cy) = (point.x(), point.y());

    let mut coords: Vec<(f64, f64)> = (0..n)
        .map(|k| {
            let angle = 2.0 * PI * k as f64 / n as f64;
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect();
    coords.push((cx + radius, cy));

    Polygon::new(LineString::from(coords), vec![])
}

/// Buffer every point of a collection.
///
/// Fails without producing output when any feature is not a Point
/// (`Error::Schema`), the distance is not a positive finite number
/// (`Error::InvalidParameter`), the CRS cannot be resolved
/// (`Error::Projection`) or its unit is angular (`Error::Unit`).
///
/// The output keeps the input order and CRS.
pub fn buffer(collection: &FeatureCollection, params: &BufferParams) -> Result<FeatureCollection> {
    let points = collection
        .iter()
        .enumerate()
        .map(|(index, feature)| match &feature.geometry {
            Geometry::Point(p) => Ok((feature, *p)),
            other => Err(Error::Schema(format!(
                "buffer expects Point features, feature {} is a {}",
                index,
                GeometryKind::of(other)
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    if !params.distance.is_finite() || params.distance <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "distance",
            value: params.distance.to_string(),
            reason: "must be a positive finite number".to_string(),
        });
    }

    let definition = collection.crs().definition()?;
    if !definition.unit.is_linear() {
        return Err(Error::Unit {
            crs: definition.to_string(),
            unit: definition.unit.to_string(),
        });
    }

    let radius = params.distance;
    let segments = params.effective_segments();
    debug!(
        "Buffering {} points by {} {} with {} segments",
        collection.len(),
        radius,
        definition.unit,
        segments
    );

    let features: Vec<Feature> = points
        .into_par_iter()
        .map(|(feature, point)| {
            let polygon = buffer_point(&point, radius, segments);
            match params.attributes {
                AttributePolicy::Inherit => Feature {
                    geometry: Geometry::Polygon(polygon),
                    properties: feature.properties.clone(),
                    id: feature.id.clone(),
                },
                AttributePolicy::Drop => Feature::new(polygon),
            }
        })
        .collect();

    info!("Generated {} buffer polygons", features.len());
    Ok(FeatureCollection::new(collection.crs().clone(), features))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, Contains, Winding};
    use svcarea_core::CRS;

    fn points(crs: CRS, coords: &[(f64, f64)]) -> FeatureCollection {
        let features = coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Feature::new(Point::new(x, y)).with_property("Provider", format!("Clinic {}", i)))
            .collect();
        FeatureCollection::new(crs, features)
    }

    #[test]
    fn test_buffer_point_circle() {
        let polygon = buffer_point(&Point::new(0.0, 0.0), 10.0, 64);

        let expected_area = PI * 100.0;
        let error = (polygon.unsigned_area() - expected_area).abs() / expected_area;
        assert!(error < 0.002, "Circle area error {:.3}%", error * 100.0);
    }

    #[test]
    fn test_buffer_point_ring_shape() {
        let polygon = buffer_point(&Point::new(5.0, 5.0), 1.0, 32);
        let ring = polygon.exterior();

        assert_eq!(ring.0.len(), 33);
        assert!(ring.is_closed());
        assert!(ring.is_ccw());
        assert_eq!(ring.0[0], ring.0[32]);
    }

    #[test]
    fn test_buffer_collection() {
        let input = points(CRS::from_epsg(3435), &[(0.0, 0.0), (1000.0, 0.0), (0.0, 500.0)]);
        let output = buffer(&input, &BufferParams::new(60.0)).unwrap();

        assert_eq!(output.len(), 3);
        assert_eq!(output.crs(), input.crs());
        for (src, buf) in input.iter().zip(output.iter()) {
            let (Geometry::Point(p), Geometry::Polygon(poly)) = (&src.geometry, &buf.geometry) else {
                panic!("unexpected geometry kinds");
            };
            assert!(poly.contains(p));
            assert_eq!(poly.exterior().0.len(), DEFAULT_SEGMENTS + 1);
            assert_eq!(buf.properties, src.properties);
        }
    }

    #[test]
    fn test_segments_floor() {
        let input = points(CRS::from_epsg(32630), &[(0.0, 0.0)]);
        let params = BufferParams {
            segments: 8,
            ..BufferParams::new(10.0)
        };
        let output = buffer(&input, &params).unwrap();
        let Geometry::Polygon(poly) = &output.features()[0].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(poly.exterior().0.len(), MIN_SEGMENTS + 1);
    }

    #[test]
    fn test_drop_attributes() {
        let input = points(CRS::from_epsg(3435), &[(0.0, 0.0)]);
        let params = BufferParams {
            attributes: AttributePolicy::Drop,
            ..BufferParams::new(5.0)
        };
        let output = buffer(&input, &params).unwrap();
        assert!(output.features()[0].properties.is_empty());
    }

    #[test]
    fn test_rejects_non_points() {
        let mut input = points(CRS::from_epsg(3435), &[(0.0, 0.0)]).into_features();
        input.push(Feature::new(buffer_point(&Point::new(0.0, 0.0), 1.0, 32)));
        let input = FeatureCollection::new(CRS::from_epsg(3435), input);
        assert!(matches!(buffer(&input, &BufferParams::new(5.0)), Err(Error::Schema(_))));
    }

    #[test]
    fn test_rejects_multipoint() {
        let multi = geo::MultiPoint::from(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        let input = FeatureCollection::new(CRS::from_epsg(3435), vec![Feature::new(multi)]);
        match buffer(&input, &BufferParams::new(5.0)) {
            Err(Error::Schema(msg)) => assert!(msg.contains("feature 0"), "{}", msg),
            other => panic!("expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_collection() {
        let input = FeatureCollection::empty(CRS::from_epsg(3435));
        let output = buffer(&input, &BufferParams::new(5.0)).unwrap();
        assert!(output.is_empty());
        assert_eq!(output.crs(), input.crs());
    }

    #[test]
    fn test_rejects_bad_distance() {
        let input = points(CRS::from_epsg(3435), &[(0.0, 0.0)]);
        for distance in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = buffer(&input, &BufferParams::new(distance));
            assert!(matches!(result, Err(Error::InvalidParameter { name: "distance", .. })));
        }
    }

    #[test]
    fn test_rejects_angular_unit() {
        let input = points(CRS::wgs84(), &[(-87.6, 41.8)]);
        assert!(matches!(buffer(&input, &BufferParams::new(0.01)), Err(Error::Unit { .. })));
    }

    #[test]
    fn test_rejects_unknown_crs() {
        let input = points(CRS::from_epsg(2154), &[(0.0, 0.0)]);
        assert!(matches!(buffer(&input, &BufferParams::new(1.0)), Err(Error::Projection(_))));
    }

    #[test]
    fn test_algorithm_trait() {
        let input = points(CRS::from_epsg(26971), &[(0.0, 0.0), (10.0, 10.0)]);
        let output = Buffer.execute_default(input).unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(Buffer.name(), "Buffer");
    }
}
