//! Reprojection of feature collections between coordinate reference systems

use crate::maybe_rayon::*;
use geo::MapCoords;
use svcarea_core::crs::Transformer;
use svcarea_core::{Algorithm, Error, Feature, FeatureCollection, Result, CRS};
use tracing::{debug, info};

/// Parameters for reprojection
#[derive(Debug, Clone)]
pub struct ReprojectParams {
    /// Target CRS; becomes the output tag verbatim
    pub target: CRS,
}

impl Default for ReprojectParams {
    fn default() -> Self {
        Self { target: CRS::wgs84() }
    }
}

/// Reprojection algorithm
#[derive(Debug, Clone, Default)]
pub struct Reproject;

impl Algorithm for Reproject {
    type Input = FeatureCollection;
    type Output = FeatureCollection;
    type Params = ReprojectParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Reproject"
    }

    fn description(&self) -> &'static str {
        "Transform every coordinate of a layer into a target CRS"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        reproject(&input, &params.target)
    }
}

/// Transform every coordinate of `collection` into `target`.
///
/// Attributes and ids pass through. The output is tagged with `target`
/// exactly as given, even when source and target denote the same system.
/// Fails with `Error::Projection` if either CRS is unsupported or any
/// coordinate falls outside a projection's domain; nothing is returned in
/// that case.
pub fn reproject(collection: &FeatureCollection, target: &CRS) -> Result<FeatureCollection> {
    let transformer = Transformer::new(collection.crs(), target)?;
    debug!(
        "Reprojecting {} features from {} to {}",
        collection.len(),
        transformer.source(),
        transformer.target()
    );

    let transformer = &transformer;
    let features = collection
        .features()
        .into_par_iter()
        .enumerate()
        .map(|(index, feature)| {
            let geometry = feature
                .geometry
                .try_map_coords(|coord| transformer.transform_coord(coord))
                .map_err(|e| match e {
                    Error::Projection(msg) => Error::Projection(format!("feature {}: {}", index, msg)),
                    other => other,
                })?;
            Ok(Feature {
                geometry,
                properties: feature.properties.clone(),
                id: feature.id.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!("Reprojected {} features to {}", features.len(), target);
    Ok(FeatureCollection::new(target.clone(), features))
}
