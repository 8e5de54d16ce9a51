//! # svcarea core
//!
//! Core types, CRS handling and vector I/O for buffer-zone service-area
//! analysis.
//!
//! This crate provides:
//! - `FeatureCollection`: ordered features sharing one CRS tag
//! - `CRS`: verbatim CRS representation, resolution and canonicalization
//! - A pure-Rust projection engine for the supported definitions
//! - Shapefile and GeoJSON loading and writing
//! - The `Algorithm` trait implemented by every pipeline stage

pub mod crs;
pub mod error;
pub mod io;
pub mod vector;

pub use crs::{CrsDefinition, Unit, CRS};
pub use error::{Error, Result};
pub use vector::{AttributeValue, Feature, FeatureCollection};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::{CrsDefinition, Unit, CRS};
    pub use crate::error::{Error, Result};
    pub use crate::vector::{AttributeValue, Feature, FeatureCollection};
    pub use crate::Algorithm;
}

/// Core trait for all pipeline stages.
///
/// Stages are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
