//! Test support library
//! Provides various helper functions & utilities for tests.
#![allow(dead_code)]

use convex_csg::{CellId, CompositeSolid, ConvexCell, float_types::Real};
use nalgebra::Point3;

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Axis-aligned box brush from two corner triples.
pub fn boxed(min: [Real; 3], max: [Real; 3], material: u32) -> ConvexCell {
    ConvexCell::cuboid(Point3::from(min), Point3::from(max), material).unwrap()
}

/// Unit cube with its minimum corner at `(x, y, z)`.
pub fn unit_cube(x: Real, y: Real, z: Real) -> ConvexCell {
    boxed([x, y, z], [x + 1.0, y + 1.0, z + 1.0], 0)
}

/// Total area of the subfaces of `a` linked to `b`.
pub fn link_area(solid: &CompositeSolid, a: CellId, b: CellId) -> Real {
    solid.cell(a).map_or(0.0, |cell| {
        cell.faces()
            .iter()
            .flat_map(|f| f.subfaces.iter())
            .filter(|s| s.neighbor == Some(b))
            .map(|s| s.area())
            .sum()
    })
}

/// Every link must be mirrored with the same area on the other side.
pub fn assert_links_balanced(solid: &CompositeSolid) {
    assert_links_balanced_within(solid, 1e-6);
}

/// Every link must be mirrored on the other side, with areas differing by less than
/// `tolerance`.
pub fn assert_links_balanced_within(solid: &CompositeSolid, tolerance: Real) {
    assert!(solid.adjacency_is_symmetric(), "one-sided neighbor link");
    for (id, cell) in solid.cells() {
        for neighbor in cell.neighbors() {
            let there = link_area(solid, id, neighbor);
            let back = link_area(solid, neighbor, id);
            assert!(
                approx_eq(there, back, tolerance),
                "link area {there} from {id:?} to {neighbor:?} but {back} back"
            );
        }
    }
}

/// Area of the exposed surface over all cells.
pub fn exposed_area(solid: &CompositeSolid) -> Real {
    solid.render_mesh().area()
}
