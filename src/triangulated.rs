use crate::render::MeshVertex;

/// A triangulated 3D surface.
///
/// Anything that can present itself as a bunch of triangles in 3D
/// can automatically use all the triangle-based IO backends.
pub trait Triangulated3D {
    /// Call `f` for each triangle, corners counter-clockwise seen from outside.
    fn visit_triangles<F>(&self, f: F)
    where
        F: FnMut([MeshVertex; 3]);
}
