//! # svcarea algorithms
//!
//! Pipeline stages for buffer-zone service-area analysis.
//!
//! ## Available Stages
//!
//! - **reproject**: transform a layer into another CRS
//! - **buffer**: circular buffer polygons around point features
//! - **union**: dissolve overlapping polygons into one geometry
//! - **measurements**: area and bounds of a layer

pub mod vector;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::vector::{
        area, bounds, buffer, buffer_point, reproject, total_area, union, union_geometries,
        AttributePolicy, Buffer, BufferParams, Reproject, ReprojectParams, Union,
    };
    pub use svcarea_core::prelude::*;
}
