//! Incremental **constructive solid geometry** on convex cells with explicit face
//! adjacency.
//!
//! Convex brushes are combined into a [`CompositeSolid`] with [`Operator::Add`],
//! [`Operator::Subtract`], [`Operator::Replace`] and [`Operator::Paint`]. The solid is
//! kept as a set of [`ConvexCell`]s whose faces are partitioned into subfaces, each
//! either exposed or linked to the cell on its other side. Render meshes, per-cell
//! collision hulls, mass and broken-off fragments are all read from that structure
//! without re-triangulating the whole solid.
//!
//! Face polygons are stored as sets of 2D half-planes ([`BoundaryCut`]s) in each
//! face plane's local basis, so splitting a polygon is interval arithmetic rather
//! than vertex clipping.
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - [**stl-io**](https://en.wikipedia.org/wiki/STL_(file_format)): `.stl` export of render meshes
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//! - **parallel**: use rayon for read-only mesh extraction

#![forbid(unsafe_code)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod cell;
pub mod composite;
pub mod errors;
pub mod float_types;
pub mod io;
pub mod pool;
pub mod render;
pub mod traits;
pub mod triangulated;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use cell::{
    BoundaryCut, CellId, CellSplit, ConvexCell, Cut, CutSplit, Face, Jitter, Plane, SubFace,
};
pub use composite::{ChangeListener, ChangeSet, Component, CompositeSolid, Operator};
pub use errors::CsgError;
pub use render::{MeshVertex, RenderMesh};
pub use traits::Transformable;
