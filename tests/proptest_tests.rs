//! Property-based tests for cell splitting and brush combination.

mod support;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use convex_csg::float_types::{Real, TAU, distance_epsilon};
use convex_csg::{CellSplit, CompositeSolid, ConvexCell, Jitter, Operator, Plane};
use nalgebra::{Point3, Vector3};
use support::{assert_links_balanced_within, boxed};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Uniformly distributed unit normal.
fn arb_normal() -> impl Strategy<Value = Vector3<Real>> {
    (0.0..TAU, -1.0..1.0 as Real).prop_map(|(theta, z)| {
        let r = (1.0 - z * z).sqrt();
        Vector3::new(r * theta.cos(), r * theta.sin(), z)
    })
}

/// Box given by its minimum corner and extents, overlapping [-1, 1]^3 or near it.
fn arb_box() -> impl Strategy<Value = ([Real; 3], [Real; 3])> {
    (
        prop::array::uniform3(-1.5..1.0 as Real),
        prop::array::uniform3(0.2..1.5 as Real),
    )
        .prop_map(|(min, size)| (min, [min[0] + size[0], min[1] + size[1], min[2] + size[2]]))
}

fn rock(seed: u64) -> ConvexCell {
    ConvexCell::dodecahedron(Point3::origin(), 1.0, Some(Jitter { amount: 0.15, seed }), 0).unwrap()
}

fn overlap(a: ([Real; 3], [Real; 3]), b: ([Real; 3], [Real; 3])) -> Real {
    (0..3)
        .map(|i| (a.1[i].min(b.1[i]) - a.0[i].max(b.0[i])).max(0.0))
        .product()
}

const CUBE: ([Real; 3], [Real; 3]) = ([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]);

/// One brush of a random edit sequence.
#[derive(Debug, Clone)]
struct Edit {
    center: [Real; 3],
    radius: Real,
    rock: Option<u64>,
    operator: Operator,
}

impl Edit {
    fn brush(&self) -> ConvexCell {
        let center = Point3::from(self.center);
        match self.rock {
            Some(seed) => {
                let jitter = Some(Jitter { amount: 0.15, seed });
                ConvexCell::dodecahedron(center, self.radius, jitter, 1).unwrap()
            },
            None => {
                let half = Vector3::repeat(self.radius);
                ConvexCell::cuboid(center - half, center + half, 1).unwrap()
            },
        }
    }
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    (
        prop::array::uniform3(-1.0..1.0 as Real),
        0.3..1.2 as Real,
        prop::option::of(any::<u64>()),
        prop_oneof![Just(Operator::Add), Just(Operator::Subtract)],
    )
        .prop_map(|(center, radius, rock, operator)| Edit {
            center,
            radius,
            rock,
            operator,
        })
}

/// Split polygons drop edges and regions narrower than the distance epsilon on each
/// side independently, so the two halves of a link may differ by an epsilon-wide
/// strip along its boundary.
fn link_area_tolerance() -> Real {
    4.0 * distance_epsilon()
}

// ---------------------------------------------------------------------------
// 1. Splitting never creates or loses volume
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn split_conserves_volume(
        seed in any::<u64>(),
        normal in arb_normal(),
        offset in -1.2..1.2 as Real,
    ) {
        let mut cell = rock(seed);
        let before = cell.volume();
        let plane = Plane::from_normal(normal, offset).unwrap();
        let after = match cell.split(&plane, None) {
            CellSplit::Positive | CellSplit::Negative => cell.volume(),
            CellSplit::Split(outside) => {
                prop_assert!(outside.volume() > 0.0);
                prop_assert!(cell.volume() > 0.0);
                cell.volume() + outside.volume()
            },
        };
        // Corners merged across dropped sub-epsilon edges move by at most a few
        // epsilon, which shifts each face by an area of order epsilon squared.
        let tolerance = 100.0 * distance_epsilon().powi(2);
        prop_assert!((before - after).abs() < tolerance,
            "volume {} before split, {} after", before, after);
    }
}

// ---------------------------------------------------------------------------
// 2. Clipping twice by the same plane is the same as clipping once
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn clip_is_idempotent(
        seed in any::<u64>(),
        normal in arb_normal(),
        offset in -1.2..1.2 as Real,
    ) {
        let mut cell = rock(seed);
        let plane = Plane::from_normal(normal, offset).unwrap();
        cell.clip(&plane, None);
        let volume = cell.volume();
        prop_assert!(!cell.clip(&plane, None));
        prop_assert!((cell.volume() - volume).abs() < 1e-12);
    }
}

// ---------------------------------------------------------------------------
// 3. Subtract and add keep volume bookkeeping and symmetric adjacency
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn subtract_removes_the_overlap(brush in arb_box()) {
        let mut solid = CompositeSolid::new();
        solid.combine(boxed(CUBE.0, CUBE.1, 0), Operator::Subtract);
        prop_assert!(solid.is_empty());
        solid.combine(boxed(CUBE.0, CUBE.1, 0), Operator::Add);
        solid.combine(boxed(brush.0, brush.1, 0), Operator::Subtract);
        let expected = 8.0 - overlap(CUBE, brush);
        prop_assert!((solid.total_volume() - expected).abs() < 1e-2,
            "volume {} expected {}", solid.total_volume(), expected);
        prop_assert!(solid.adjacency_is_symmetric());
    }

    #[test]
    fn add_unions_the_volume(brush in arb_box()) {
        let mut solid = CompositeSolid::new();
        solid.combine(boxed(CUBE.0, CUBE.1, 0), Operator::Add);
        solid.combine(boxed(brush.0, brush.1, 1), Operator::Add);
        let brush_volume: Real = (0..3).map(|i| brush.1[i] - brush.0[i]).product();
        let expected = 8.0 + brush_volume - overlap(CUBE, brush);
        prop_assert!((solid.total_volume() - expected).abs() < 1e-2,
            "volume {} expected {}", solid.total_volume(), expected);
        prop_assert!(solid.adjacency_is_symmetric());
        if overlap(CUBE, brush) > 1e-2 {
            prop_assert_eq!(solid.connected_components().len(), 1);
        }
    }
}

// ---------------------------------------------------------------------------
// 4. Random edit sequences keep links mirrored and membership exact
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn edit_sequences_match_replayed_membership(
        edits in prop::collection::vec(arb_edit(), 1..=5),
        sample_seed in any::<u64>(),
    ) {
        let base = boxed(CUBE.0, CUBE.1, 0);
        let mut solid = CompositeSolid::new();
        solid.combine(base.clone(), Operator::Add);
        let mut brushes = vec![(base, Operator::Add)];
        for edit in &edits {
            let brush = edit.brush();
            solid.combine(brush.clone(), edit.operator);
            brushes.push((brush, edit.operator));
            prop_assert!(solid.adjacency_is_symmetric());
        }
        assert_links_balanced_within(&solid, link_area_tolerance());

        let planes: Vec<Plane> = brushes
            .iter()
            .flat_map(|(b, _)| b.faces().iter().map(|f| f.plane))
            .collect();
        let mut rng = StdRng::seed_from_u64(sample_seed);
        let mut checked = 0;
        for _ in 0..400 {
            let p = Point3::new(
                rng.random_range(-2.6..2.6),
                rng.random_range(-2.6..2.6),
                rng.random_range(-2.6..2.6),
            );
            if planes.iter().any(|pl| pl.signed_distance(&p).abs() < 1e-2) {
                continue;
            }
            let expected = brushes.iter().fold(false, |inside, (brush, operator)| {
                if brush.faces().iter().all(|f| f.plane.signed_distance(&p) < 0.0) {
                    *operator == Operator::Add
                } else {
                    inside
                }
            });
            prop_assert_eq!(solid.contains_point(&p), expected, "membership at {:?}", p);
            checked += 1;
        }
        prop_assert!(checked > 0);
    }
}

// ---------------------------------------------------------------------------
// 5. Volume agrees with point containment
// ---------------------------------------------------------------------------

#[test]
fn volume_matches_sampled_containment() {
    let mut rng = StdRng::seed_from_u64(2024);
    for seed in 0..4 {
        let mut cell = rock(seed);
        let normal = Vector3::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0), 1.0);
        cell.clip(&Plane::from_normal(normal, 0.3).unwrap(), None);

        let bounds = cell.bounding_box();
        let extent = bounds.maxs - bounds.mins;
        let box_volume = extent.x * extent.y * extent.z;
        let samples = 50_000;
        let hits = (0..samples)
            .filter(|_| {
                let p = Point3::new(
                    rng.random_range(bounds.mins.x..bounds.maxs.x),
                    rng.random_range(bounds.mins.y..bounds.maxs.y),
                    rng.random_range(bounds.mins.z..bounds.maxs.z),
                );
                cell.contains_point(&p)
            })
            .count();
        let sampled = box_volume * hits as Real / samples as Real;
        let volume = cell.volume();
        assert!(
            (sampled - volume).abs() < 0.03 * volume,
            "rock {seed}: sampled {sampled}, computed {volume}"
        );
    }
}
