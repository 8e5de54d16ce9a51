//! Union (dissolve) of polygon layers
//!
//! All polygon parts are flattened and merged with a cascaded pairwise
//! union: neighbours at each level of a balanced tree are unioned, halving
//! the number of pieces until one remains. Pairing depends only on input
//! position, so the result does not depend on scheduling.

use crate::maybe_rayon::*;
use geo::{BooleanOps, Geometry, MultiPolygon, Polygon};
use svcarea_core::{Algorithm, Error, FeatureCollection, Result};
use tracing::{debug, info};

/// Union algorithm
#[derive(Debug, Clone, Default)]
pub struct Union;

impl Algorithm for Union {
    type Input = FeatureCollection;
    type Output = Geometry<f64>;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Union"
    }

    fn description(&self) -> &'static str {
        "Dissolve all polygons of a layer into one Polygon or MultiPolygon"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        union(&input)
    }
}

/// Dissolve every polygon of a collection into a single geometry.
///
/// Returns a `Polygon` when the result is one connected piece, a
/// `MultiPolygon` with one part per disjoint cluster otherwise, and an empty
/// `MultiPolygon` for an empty collection. Rects and triangles count as
/// polygons; any other kind is an `Error::Schema`.
pub fn union(collection: &FeatureCollection) -> Result<Geometry<f64>> {
    let merged = dissolve(collection.iter().map(|f| &f.geometry))?;
    info!(
        "Dissolved {} features into {} part(s)",
        collection.len(),
        part_count(&merged)
    );
    Ok(merged)
}

/// Dissolve bare geometries; same rules as [`union`].
pub fn union_geometries(geometries: &[Geometry<f64>]) -> Result<Geometry<f64>> {
    dissolve(geometries.iter())
}

fn dissolve<'a>(geometries: impl Iterator<Item = &'a Geometry<f64>>) -> Result<Geometry<f64>> {
    let mut parts: Vec<Polygon<f64>> = Vec::new();
    for (index, geometry) in geometries.enumerate() {
        match geometry {
            Geometry::Polygon(p) => parts.push(p.clone()),
            Geometry::MultiPolygon(mp) => parts.extend(mp.0.iter().cloned()),
            Geometry::Rect(r) => parts.push(r.to_polygon()),
            Geometry::Triangle(t) => parts.push(t.to_polygon()),
            other => {
                return Err(Error::Schema(format!(
                    "union expects Polygon or MultiPolygon features, feature {} is a {}",
                    index,
                    svcarea_core::vector::GeometryKind::of(other)
                )))
            }
        }
    }
    debug!("Union of {} polygon parts", parts.len());

    let merged = cascaded_union(parts);
    Ok(simplify_result(merged))
}

fn cascaded_union(parts: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    let mut level: Vec<MultiPolygon<f64>> = parts
        .into_iter()
        .filter(|p| !p.exterior().0.is_empty())
        .map(|p| MultiPolygon::new(vec![p]))
        .collect();

    if level.is_empty() {
        return MultiPolygon::new(vec![]);
    }

    // A single piece still goes through one union so overlapping parts of a
    // lone MultiPolygon get merged.
    if level.len() == 1 {
        let only = &level[0];
        return only.union(&MultiPolygon::new(vec![]));
    }

    while level.len() > 1 {
        let current = std::mem::take(&mut level);
        let current = &current;
        level = (0..current.len().div_ceil(2))
            .into_par_iter()
            .map(|i| match current.get(2 * i + 1) {
                Some(right) => current[2 * i].union(right),
                None => current[2 * i].clone(),
            })
            .collect();
    }

    level.pop().unwrap_or_else(|| MultiPolygon::new(vec![]))
}

fn simplify_result(mut merged: MultiPolygon<f64>) -> Geometry<f64> {
    if merged.0.len() == 1 {
        if let Some(polygon) = merged.0.pop() {
            return Geometry::Polygon(polygon);
        }
    }
    Geometry::MultiPolygon(merged)
}

fn part_count(geometry: &Geometry<f64>) -> usize {
    match geometry {
        Geometry::Polygon(_) => 1,
        Geometry::MultiPolygon(mp) => mp.0.len(),
        _ => 0,
    }
}
