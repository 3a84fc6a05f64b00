//! Flat triangle buffers generated from cell faces.

use crate::cell::cut::{self, BoundaryCut};
use crate::cell::plane::Plane;
use crate::errors::CsgError;
use crate::float_types::{Real, parry3d::shape::TriMesh};
use crate::triangulated::Triangulated3D;
use nalgebra::{Point2, Point3, Vector3};

/// One vertex of a [`RenderMesh`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub position: Point3<Real>,
    pub normal: Vector3<Real>,
    /// Coordinates in the face plane's local basis.
    pub uv: Point2<Real>,
    pub material: u32,
}

/// Vertex buffer plus triangle index buffer, counter-clockwise seen from outside.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl RenderMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Fan-triangulate a convex cut polygon of `plane` from its first corner.
    ///
    /// Polygons that are not closed or have fewer than three corners are skipped.
    pub fn push_polygon(&mut self, plane: &Plane, cuts: &[BoundaryCut], material: u32) {
        if cuts.len() < 3 || !cut::is_closed(cuts) {
            return;
        }
        let base = self.vertices.len() as u32;
        let normal = plane.normal();
        self.vertices.extend(cut::vertices(cuts).into_iter().map(|uv| {
            MeshVertex {
                position: plane.to_world(&uv),
                normal,
                uv,
                material,
            }
        }));
        for i in 1..cuts.len() as u32 - 1 {
            self.indices.extend_from_slice(&[base, base + i, base + i + 1]);
        }
    }

    /// Move the contents of `other` into this mesh.
    pub fn append(&mut self, other: RenderMesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }

    pub fn triangles(&self) -> impl Iterator<Item = [MeshVertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| {
            [
                self.vertices[t[0] as usize],
                self.vertices[t[1] as usize],
                self.vertices[t[2] as usize],
            ]
        })
    }

    /// Total triangle area.
    pub fn area(&self) -> Real {
        self.triangles().map(|t| triangle_area(&t)).sum()
    }

    /// Total triangle area carrying `material`.
    pub fn material_area(&self, material: u32) -> Real {
        self.triangles()
            .filter(|t| t[0].material == material)
            .map(|t| triangle_area(&t))
            .sum()
    }

    /// Convert to a Parry `TriMesh` for collision queries.
    ///
    /// ## Errors
    /// If Parry rejects the triangle data (e.g. the mesh is empty).
    pub fn to_trimesh(&self) -> Result<TriMesh, CsgError> {
        let vertices = self.vertices.iter().map(|v| v.position).collect();
        let indices = self
            .indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect();
        Ok(TriMesh::new(vertices, indices)?)
    }
}

fn triangle_area([a, b, c]: &[MeshVertex; 3]) -> Real {
    (b.position - a.position).cross(&(c.position - a.position)).norm() * 0.5
}

impl Triangulated3D for RenderMesh {
    fn visit_triangles<F>(&self, mut f: F)
    where
        F: FnMut([MeshVertex; 3]),
    {
        for tri in self.triangles() {
            f(tri);
        }
    }
}
