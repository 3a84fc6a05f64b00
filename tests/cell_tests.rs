mod support;

use approx::assert_relative_eq;
use convex_csg::cell::cut;
use convex_csg::{
    BoundaryCut, CellId, CellSplit, ConvexCell, CsgError, Jitter, Plane, Transformable,
    float_types::Real,
};
use nalgebra::{Point2, Point3, Vector3};
use support::{boxed, unit_cube};

fn plane(nx: Real, ny: Real, nz: Real, offset: Real) -> Plane {
    Plane::from_normal(Vector3::new(nx, ny, nz), offset).unwrap()
}

/// Convex region in `plane`'s basis spanned by world points listed counter-clockwise.
fn region(plane: &Plane, corners: &[Point3<Real>]) -> Vec<BoundaryCut> {
    let local: Vec<Point2<Real>> = corners.iter().map(|p| plane.to_local(p)).collect();
    let sum = local.iter().fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords);
    let center = Point2::from(sum / local.len() as Real);
    let mut cuts: Vec<BoundaryCut> = (0..local.len())
        .filter_map(|i| BoundaryCut::from_segment(local[i], local[(i + 1) % local.len()], &center))
        .collect();
    cut::sort_by_angle(&mut cuts);
    cuts
}

#[test]
fn split_in_half() {
    let mut cell = unit_cube(0.0, 0.0, 0.0);
    let cutter = plane(1.0, 0.0, 0.0, 0.5);
    let CellSplit::Split(outside) = cell.split(&cutter, None) else {
        panic!("plane crosses the cube");
    };
    assert_relative_eq!(cell.volume(), 0.5, epsilon = 1e-9);
    assert_relative_eq!(outside.volume(), 0.5, epsilon = 1e-9);
    assert_eq!(cell.faces().len(), 6);
    assert_eq!(outside.faces().len(), 6);

    // The cap is the last face on both sides, facing away from each part.
    let kept_cap = cell.faces().last().unwrap();
    let new_cap = outside.faces().last().unwrap();
    assert!(kept_cap.plane.is_coplanar(&cutter));
    assert!(new_cap.plane.is_opposite(&cutter));
    assert_relative_eq!(kept_cap.area(), 1.0, epsilon = 1e-9);
    assert_relative_eq!(new_cap.area(), 1.0, epsilon = 1e-9);
    assert!(cell.bounding_box().maxs.x <= 0.5 + 1e-9);
    assert!(outside.bounding_box().mins.x >= 0.5 - 1e-9);
}

#[test]
fn split_misses_report_side() {
    let mut cell = unit_cube(0.0, 0.0, 0.0);
    assert!(matches!(cell.split(&plane(1.0, 0.0, 0.0, 2.0), None), CellSplit::Positive));
    assert!(matches!(cell.split(&plane(1.0, 0.0, 0.0, -1.0), None), CellSplit::Negative));
    // A plane touching a face does not split either.
    assert!(matches!(cell.split(&plane(1.0, 0.0, 0.0, 1.0), None), CellSplit::Positive));
    assert_relative_eq!(cell.volume(), 1.0, epsilon = 1e-9);
    assert_eq!(cell.faces().len(), 6);
}

#[test]
fn bounding_polygon_gates_split() {
    let mut cell = unit_cube(0.0, 0.0, 0.0);
    let cutter = plane(1.0, 0.0, 0.0, 0.5);

    let far = region(
        &cutter,
        &[
            Point3::new(0.5, 10.0, 10.0),
            Point3::new(0.5, 11.0, 10.0),
            Point3::new(0.5, 11.0, 11.0),
            Point3::new(0.5, 10.0, 11.0),
        ],
    );
    assert!(matches!(cell.split(&cutter, Some(&far)), CellSplit::Positive));
    assert_relative_eq!(cell.volume(), 1.0, epsilon = 1e-9);

    // A bounding polygon covering only part of the cross-section still cuts along
    // the whole plane.
    let near = region(
        &cutter,
        &[
            Point3::new(0.5, 0.25, 0.25),
            Point3::new(0.5, 0.75, 0.25),
            Point3::new(0.5, 0.75, 0.75),
            Point3::new(0.5, 0.25, 0.75),
        ],
    );
    let CellSplit::Split(outside) = cell.split(&cutter, Some(&near)) else {
        panic!("bounding polygon overlaps the cube");
    };
    assert_relative_eq!(cell.volume() + outside.volume(), 1.0, epsilon = 1e-9);
    assert_relative_eq!(outside.faces().last().unwrap().area(), 1.0, epsilon = 1e-9);
}

#[test]
fn clip_removes_outside_and_is_idempotent() {
    let mut cell = boxed([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0], 0);
    let cutter = plane(1.0, 1.0, 1.0, 0.9);
    assert!(cell.clip(&cutter, None));
    let volume = cell.volume();
    let faces = cell.faces().to_vec();
    assert!(volume < 8.0);
    assert!(!cell.clip(&cutter, None));
    assert_eq!(cell.faces(), faces.as_slice());
    assert_relative_eq!(cell.volume(), volume, epsilon = 1e-12);
    for corner in cell.vertices() {
        assert!(cutter.signed_distance(&corner) <= 1e-9);
    }
}

#[test]
fn clip_everything_empties_the_cell() {
    let mut cell = unit_cube(0.0, 0.0, 0.0);
    assert!(cell.clip(&plane(1.0, 0.0, 0.0, -1.0), None));
    assert!(cell.is_empty());
    assert!(cell.faces().is_empty());
    assert_eq!(cell.volume(), 0.0);

    // Empty cells ignore further work.
    assert!(matches!(cell.split(&plane(0.0, 1.0, 0.0, 0.5), None), CellSplit::Positive));
    assert!(!cell.clip(&plane(0.0, 1.0, 0.0, 0.5), None));
    assert!(cell.to_convex_shape().is_err());
}

#[test]
fn metrics_follow_geometry() {
    let mut cell = boxed([0.0, 0.0, 0.0], [2.0, 1.0, 1.0], 0);
    assert_relative_eq!(cell.volume(), 2.0, epsilon = 1e-9);
    assert_relative_eq!(cell.center_of_mass(), Point3::new(1.0, 0.5, 0.5), epsilon = 1e-9);
    assert!(cell.contains_point(&Point3::new(1.5, 0.5, 0.5)));
    assert!(!cell.contains_point(&Point3::new(2.5, 0.5, 0.5)));

    cell.clip(&plane(1.0, 0.0, 0.0, 1.0), None);
    assert_relative_eq!(cell.volume(), 1.0, epsilon = 1e-9);
    assert_relative_eq!(cell.bounding_box().maxs.x, 1.0, epsilon = 1e-9);
}

#[test]
fn translate_and_scale() {
    let mut cell = unit_cube(0.0, 0.0, 0.0);
    cell.translate(2.0, 0.0, 0.0).unwrap();
    assert_relative_eq!(cell.bounding_box().mins.x, 2.0, epsilon = 1e-9);
    assert_relative_eq!(cell.volume(), 1.0, epsilon = 1e-9);

    cell.scale(2.0, 1.0, 3.0).unwrap();
    assert_relative_eq!(cell.volume(), 6.0, epsilon = 1e-9);
    assert_relative_eq!(cell.bounding_box().maxs.x, 6.0, epsilon = 1e-9);
}

#[test]
fn rotate_preserves_volume() {
    let mut cell = unit_cube(-0.5, -0.5, -0.5);
    cell.rotate(0.0, 0.0, 45.0).unwrap();
    assert_relative_eq!(cell.volume(), 1.0, epsilon = 1e-9);
    let half_diagonal = (2.0 as Real).sqrt() / 2.0;
    assert_relative_eq!(cell.bounding_box().maxs.x, half_diagonal, epsilon = 1e-9);
}

#[test]
fn mirror_keeps_cell_inside_out_free() {
    let mut cell = unit_cube(0.0, 0.0, 0.0);
    cell.mirror(&plane(1.0, 0.0, 0.0, 2.0)).unwrap();
    assert_relative_eq!(cell.volume(), 1.0, epsilon = 1e-9);
    assert_relative_eq!(cell.bounding_box().mins.x, 3.0, epsilon = 1e-9);
    assert!(cell.contains_point(&Point3::new(3.5, 0.5, 0.5)));
    for face in cell.faces() {
        // Every face plane still faces away from the interior.
        assert!(face.plane.signed_distance(&cell.centroid()) < 0.0);
    }
}

#[test]
fn singular_transform_is_rejected() {
    let mut cell = unit_cube(0.0, 0.0, 0.0);
    let before = cell.faces().to_vec();
    assert!(matches!(cell.scale(0.0, 1.0, 1.0), Err(CsgError::NonInvertibleTransform)));
    assert_eq!(cell.faces(), before.as_slice());
    assert!(matches!(
        cell.translate(Real::NAN, 0.0, 0.0),
        Err(CsgError::NonFiniteTransform(_))
    ));
}

#[test]
fn paint_marks_exposed_surface_inside_brush() {
    let mut cell = unit_cube(0.0, 0.0, 0.0);
    let brush = boxed([0.5, -1.0, -1.0], [1.5, 2.0, 2.0], 1);
    assert!(cell.paint(&brush, Some(1)));
    let mesh = cell.exposed_mesh();
    assert_relative_eq!(mesh.material_area(1), 3.0, epsilon = 1e-9);
    assert_relative_eq!(mesh.area(), 6.0, epsilon = 1e-9);
    assert_eq!(cell.material(), 0);

    // Painting the same region again changes nothing.
    assert!(!cell.paint(&brush, Some(1)));
    // A brush that misses reports no change.
    assert!(!cell.paint(&boxed([5.0, 5.0, 5.0], [6.0, 6.0, 6.0], 2), Some(2)));
}

#[test]
fn convex_mesh_covers_every_face() {
    let cell = unit_cube(0.0, 0.0, 0.0);
    let mesh = cell.convex_mesh();
    assert_eq!(mesh.triangle_count(), 12);
    assert_relative_eq!(mesh.area(), 6.0, epsilon = 1e-9);
    assert_eq!(cell.distinct_vertices().len(), 8);
    let shape = cell.to_convex_shape().unwrap();
    let props = shape.mass_properties(1.0);
    assert_relative_eq!(props.mass(), 1.0, epsilon = 1e-9);
}

#[test]
fn face_remove_region() {
    let cell = unit_cube(0.0, 0.0, 0.0);
    let mut face = cell
        .faces()
        .iter()
        .find(|f| f.plane.normal().x > 0.5)
        .unwrap()
        .clone();
    let half = region(
        &face.plane,
        &[
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(1.0, 0.5, -1.0),
            Point3::new(1.0, 0.5, 2.0),
            Point3::new(1.0, -1.0, 2.0),
        ],
    );
    face.remove_subfaces_inside(&half);
    let remaining: Real = face.subfaces.iter().map(|s| s.area()).sum();
    assert_relative_eq!(remaining, 0.5, epsilon = 1e-9);
    assert_relative_eq!(face.area(), 1.0, epsilon = 1e-9);
}

#[test]
fn face_clone_flipped_links_back() {
    let cell = unit_cube(0.0, 0.0, 0.0);
    let face = &cell.faces()[0];
    let other = CellId::default();
    let flipped = face.clone_flipped(Some(other)).unwrap();
    assert!(flipped.plane.is_opposite(&face.plane));
    assert_relative_eq!(flipped.area(), face.area(), epsilon = 1e-9);
    assert_eq!(flipped.subfaces.len(), 1);
    assert_eq!(flipped.subfaces[0].neighbor, Some(other));
}

#[test]
fn jittered_rock_is_still_convex() {
    let rock = ConvexCell::dodecahedron(
        Point3::new(1.0, 2.0, 3.0),
        1.0,
        Some(Jitter {
            amount: 0.2,
            seed: 99,
        }),
        4,
    )
    .unwrap();
    assert_eq!(rock.material(), 4);
    assert!(rock.contains_point(&Point3::new(1.0, 2.0, 3.0)));
    let centroid = rock.centroid();
    for face in rock.faces() {
        assert!(face.plane.signed_distance(&centroid) < 0.0);
        assert!(!face.is_degenerate());
    }
    assert!(rock.to_convex_shape().is_ok());
}
