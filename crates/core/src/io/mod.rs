//! I/O operations for reading and writing vector layers
//!
//! Two formats are supported, selected by file extension:
//! - ESRI Shapefile (`.shp` with `.shx`, `.dbf` and `.prj` companions)
//! - GeoJSON (`.geojson`, `.json`)

mod geojson_io;
mod shapefile_io;

pub use geojson_io::{parse_geojson, read_geojson, to_geojson_string, write_geojson};
pub use shapefile_io::{read_shapefile, write_shapefile, SHAPEFILE_COMPANIONS};

use crate::error::{Error, Result};
use crate::vector::FeatureCollection;
use std::path::Path;

/// Vector file formats understood by [`read_vector`] and [`write_vector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFormat {
    Shapefile,
    GeoJson,
}

impl VectorFormat {
    /// Detect the format from a path's extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "shp" => Ok(VectorFormat::Shapefile),
            "geojson" | "json" => Ok(VectorFormat::GeoJson),
            _ => Err(Error::Format(format!(
                "unrecognised vector format for {} (expected .shp, .geojson or .json)",
                path.display()
            ))),
        }
    }
}

/// Read a vector layer, dispatching on the file extension
pub fn read_vector<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let path = path.as_ref();
    match VectorFormat::from_path(path)? {
        VectorFormat::Shapefile => read_shapefile(path),
        VectorFormat::GeoJson => read_geojson(path),
    }
}

/// Write a vector layer, dispatching on the file extension. Existing files
/// are overwritten.
pub fn write_vector<P: AsRef<Path>>(collection: &FeatureCollection, path: P) -> Result<()> {
    let path = path.as_ref();
    match VectorFormat::from_path(path)? {
        VectorFormat::Shapefile => write_shapefile(collection, path),
        VectorFormat::GeoJson => write_geojson(collection, path),
    }
}
