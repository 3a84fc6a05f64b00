use crate::errors::CsgError;
use crate::render::RenderMesh;
use crate::triangulated::Triangulated3D;
use std::fmt::Write;
use std::io::Cursor;

/// Export to ASCII STL
///
/// ```rust
/// # use convex_csg::{CompositeSolid, ConvexCell, Operator};
/// # use nalgebra::Point3;
/// let mut solid = CompositeSolid::new();
/// let cube = ConvexCell::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0), 0).unwrap();
/// solid.combine(cube, Operator::Add);
/// let text = convex_csg::io::to_stl_ascii(&solid.render_mesh(), "cube");
/// assert!(text.starts_with("solid cube"));
/// ```
pub fn to_stl_ascii<T: Triangulated3D>(shape: &T, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "solid {name}");

    shape.visit_triangles(|tri| {
        let n = tri[0].normal;
        let _ = writeln!(out, "  facet normal {:.6} {:.6} {:.6}", n.x, n.y, n.z);
        out.push_str("    outer loop\n");
        for v in &tri {
            let p = v.position;
            let _ = writeln!(out, "      vertex {:.6} {:.6} {:.6}", p.x, p.y, p.z);
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    });

    let _ = writeln!(out, "endsolid {name}");
    out
}

/// Export to BINARY STL (returns `Vec<u8>`)
pub fn to_stl_binary<T: Triangulated3D>(shape: &T) -> Result<Vec<u8>, CsgError> {
    use stl_io::{Normal, Triangle, Vertex, write_stl};

    let mut triangles = Vec::<Triangle>::new();
    shape.visit_triangles(|tri| {
        let n = tri[0].normal;
        #[allow(clippy::unnecessary_cast)]
        {
            triangles.push(Triangle {
                normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: tri.map(|v| {
                    let p = v.position;
                    Vertex::new([p.x as f32, p.y as f32, p.z as f32])
                }),
            });
        }
    });

    let mut cursor = Cursor::new(Vec::new());
    write_stl(&mut cursor, triangles.iter())?;
    Ok(cursor.into_inner())
}

impl RenderMesh {
    pub fn to_stl_ascii(&self, name: &str) -> String {
        self::to_stl_ascii(self, name)
    }

    pub fn to_stl_binary(&self) -> Result<Vec<u8>, CsgError> {
        self::to_stl_binary(self)
    }
}
