// main.rs
//
// Minimal tour of convex-csg: build a solid from brushes, carve it, paint it, then
// export the surface and report mass and fragments.

use convex_csg::{CompositeSolid, ConvexCell, CsgError, Jitter, Operator, Transformable};
use nalgebra::Point3;
use std::fs;

fn main() -> Result<(), CsgError> {
    // Ensure the /stls folder exists
    let _ = fs::create_dir_all("stl");

    let mut solid = CompositeSolid::new();
    solid.set_listener(|changes: &convex_csg::ChangeSet| {
        println!(
            "  +{} -{} ~{} cells",
            changes.added.len(),
            changes.removed.len(),
            changes.modified.len()
        );
    });

    // 1) A slab and a flush block on top of it
    println!("add slab");
    solid.combine(
        ConvexCell::cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 4.0, 1.0), 0)?,
        Operator::Add,
    );
    println!("add block");
    solid.combine(
        ConvexCell::cuboid(Point3::new(1.0, 1.0, 1.0), Point3::new(3.0, 3.0, 2.0), 0)?,
        Operator::Add,
    );

    // 2) Drill a hole through the slab
    println!("subtract hole");
    solid.combine(
        ConvexCell::cuboid(Point3::new(1.5, -1.0, 0.25), Point3::new(2.5, 5.0, 0.75), 0)?,
        Operator::Subtract,
    );

    // 3) Paint a stripe and replace a corner's material
    println!("paint stripe");
    solid.combine(
        ConvexCell::cuboid(Point3::new(-1.0, 1.8, -1.0), Point3::new(5.0, 2.2, 3.0), 1)?,
        Operator::Paint,
    );
    println!("replace corner");
    solid.combine(
        ConvexCell::cuboid(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 2.0), 2)?,
        Operator::Replace,
    );

    // 4) A loose rock, detached from the rest
    let jitter = Some(Jitter { amount: 0.25, seed: 42 });
    let mut rock = ConvexCell::dodecahedron(Point3::origin(), 0.6, jitter, 3)?;
    rock.translate(6.0, 2.0, 0.6)?;
    println!("add rock");
    solid.combine(rock, Operator::Add);

    let mesh = solid.render_mesh();
    println!("cells: {}, triangles: {}", solid.len(), mesh.triangle_count());
    println!("volume: {:.4}", solid.total_volume());
    println!("mass: {:.4}", solid.mass(|m| if m == 3 { 2.7 } else { 1.0 }));
    for fragment in solid.fragments() {
        println!(
            "fragment of {} cells, volume {:.4}",
            fragment.cells.len(),
            fragment.volume
        );
    }

    #[cfg(feature = "stl-io")]
    {
        let _ = fs::write("stl/solid.stl", mesh.to_stl_ascii("solid"));
        let _ = fs::write("stl/solid_binary.stl", mesh.to_stl_binary()?);
    }
    Ok(())
}
