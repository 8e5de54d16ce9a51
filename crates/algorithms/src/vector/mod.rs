//! Vector analysis algorithms
//!
//! The service-area pipeline stages operating on feature collections:
//! - Reproject: move a layer into another CRS
//! - Buffer: circular zones around point features
//! - Union: dissolve polygons into one geometry
//! - Area / bounds: layer measurements

mod buffer;
mod measurements;
mod reproject;
mod union;

pub use buffer::{
    buffer, buffer_point, AttributePolicy, Buffer, BufferParams, DEFAULT_SEGMENTS, MIN_SEGMENTS,
};
pub use measurements::{area, bounds, total_area};
pub use reproject::{reproject, Reproject, ReprojectParams};
pub use union::{union, union_geometries, Union};
