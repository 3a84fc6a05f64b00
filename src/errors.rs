//! Errors raised at the boundary of the geometry core.
//!
//! Degenerate geometry produced while splitting or transforming cells is never an
//! error: the offending face or cell is dropped. These variants only cover invalid
//! caller input and failures of the collaborating crates.

use crate::float_types::{Real, parry3d::shape::TriMeshBuilderError};
use nalgebra::Point3;

/// All the possible failures we might report
#[derive(Debug, thiserror::Error)]
pub enum CsgError {
    /// A constructor argument was out of range or not finite
    #[error("(InvalidParameter) {name} = {value} is not valid: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: Real,
        reason: &'static str,
    },
    /// The requested primitive collapsed to nothing
    #[error("(DegenerateShape) {0}")]
    DegenerateShape(String),
    /// The transform has no inverse (zero scale along some axis)
    #[error("(NonInvertibleTransform) the 4x4 transform is singular")]
    NonInvertibleTransform,
    /// The transform maps a point to NaN or infinity
    #[error("(NonFiniteTransform) the transform produced a non-finite point near {0}")]
    NonFiniteTransform(Point3<Real>),
    /// Parry refused the triangle data
    #[error(transparent)]
    TriMesh(#[from] TriMeshBuilderError),
    /// Writing an export buffer failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
