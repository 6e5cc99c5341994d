//! Simulation error types
//!
//! Only malformed static world data and invalid trainer input are errors;
//! geometric edge cases (parallel lines, zero-length vectors) are handled
//! locally and never surface here.

use thiserror::Error;

/// Errors raised at construction or on invalid trainer input
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    /// Obstacle polygons must close into at least a triangle
    #[error("obstacle polygon needs at least 3 vertices, got {count}")]
    DegeneratePolygon { count: usize },

    /// Parking spot corners collapse onto each other
    #[error("parking spot is degenerate: {reason}")]
    DegenerateSpot { reason: &'static str },

    /// Action magnitudes are non-negative by contract
    #[error("action magnitude must be non-negative, got {magnitude}")]
    NegativeMagnitude { magnitude: f32 },

    /// Inconsistent vehicle parameters
    #[error("invalid car parameters: {reason}")]
    InvalidParams { reason: &'static str },
}
