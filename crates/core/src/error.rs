//! Error types for svcarea

use thiserror::Error;

/// Main error type for svcarea operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable, malformed or incomplete input (including missing
    /// Shapefile companions).
    #[error("Format error: {0}")]
    Format(String),

    /// A geometry kind the requested operation cannot accept.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Unresolvable CRS or a coordinate outside the projection's domain.
    #[error("Projection error: {0}")]
    Projection(String),

    /// Distance operation requested on a CRS with an angular unit.
    #[error("Unit error: {crs} uses {unit}, a linear unit is required")]
    Unit { crs: String, unit: String },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Result type alias for svcarea operations
pub type Result<T> = std::result::Result<T, Error>;
