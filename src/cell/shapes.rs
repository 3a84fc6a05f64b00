//! Primitive brushes.

use super::{ConvexCell, Face, Plane};
use crate::cell::cut::{self, CutSplit};
use crate::errors::CsgError;
use crate::float_types::{Real, distance_epsilon};
use nalgebra::{Point3, Vector3};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Random perturbation of the face normals of a generated hull.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jitter {
    /// Largest offset added to each normal component before renormalizing.
    pub amount: Real,
    pub seed: u64,
}

impl ConvexCell {
    /// Intersect a set of half-spaces (each keeping `dot(normal, p) <= offset`).
    ///
    /// Coplanar duplicates are merged and redundant planes produce no face.
    ///
    /// ## Errors
    /// [`CsgError::DegenerateShape`] if the half-spaces do not enclose a bounded,
    /// non-empty volume.
    pub fn from_planes(planes: &[Plane], material: u32) -> Result<ConvexCell, CsgError> {
        let mut distinct: Vec<Plane> = Vec::with_capacity(planes.len());
        for plane in planes {
            if !distinct.iter().any(|p| p.is_coplanar(plane)) {
                distinct.push(*plane);
            }
        }

        let min_area = distance_epsilon() * distance_epsilon();
        let mut faces = Vec::with_capacity(distinct.len());
        'planes: for (i, plane) in distinct.iter().enumerate() {
            let mut cuts = Vec::new();
            for (j, other) in distinct.iter().enumerate() {
                if i == j {
                    continue;
                }
                match cut::split_polygon(&cuts, &plane.get_cut(other)) {
                    CutSplit::Unchanged => {},
                    CutSplit::Excluded => continue 'planes,
                    CutSplit::Split { positive, .. } => cuts = positive,
                }
            }
            if !cut::is_closed(&cuts) {
                return Err(CsgError::DegenerateShape(format!(
                    "half-spaces leave face {i} unbounded"
                )));
            }
            if cuts.len() >= 3 && cut::area(&cuts) > min_area {
                faces.push(Face::new(*plane, cuts));
            }
        }

        if faces.len() < 4 {
            return Err(CsgError::DegenerateShape(format!(
                "{} half-spaces enclose no volume",
                planes.len()
            )));
        }
        Ok(ConvexCell::from_faces(faces, material))
    }

    /// Axis-aligned box spanning the two corners.
    pub fn cuboid(
        min: Point3<Real>,
        max: Point3<Real>,
        material: u32,
    ) -> Result<ConvexCell, CsgError> {
        let eps = distance_epsilon();
        for (name, lo, hi) in [("x", min.x, max.x), ("y", min.y, max.y), ("z", min.z, max.z)] {
            if !(hi - lo > eps) {
                return Err(CsgError::InvalidParameter {
                    name,
                    value: hi - lo,
                    reason: "box extent must be positive and finite",
                });
            }
        }

        let planes = [
            Plane::from_normal(Vector3::x(), max.x),
            Plane::from_normal(-Vector3::x(), -min.x),
            Plane::from_normal(Vector3::y(), max.y),
            Plane::from_normal(-Vector3::y(), -min.y),
            Plane::from_normal(Vector3::z(), max.z),
            Plane::from_normal(-Vector3::z(), -min.z),
        ]
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| CsgError::DegenerateShape("box corners are not finite".into()))?;
        Self::from_planes(&planes, material)
    }

    /// A twelve-sided hull around `center` whose faces sit `radius` away from it.
    ///
    /// The face normals are those of a regular dodecahedron. With `jitter` each
    /// normal is perturbed by a seeded random offset, giving irregular rock-like
    /// shapes that are reproducible from the seed.
    pub fn dodecahedron(
        center: Point3<Real>,
        radius: Real,
        jitter: Option<Jitter>,
        material: u32,
    ) -> Result<ConvexCell, CsgError> {
        if !(radius > distance_epsilon()) || !radius.is_finite() {
            return Err(CsgError::InvalidParameter {
                name: "radius",
                value: radius,
                reason: "must be positive and finite",
            });
        }

        // Icosahedron corners are the dodecahedron face directions.
        let phi: Real = (1.0 + (5.0 as Real).sqrt()) * 0.5;
        let mut normals = Vec::with_capacity(12);
        for a in [-1.0, 1.0] {
            for b in [-phi, phi] {
                normals.push(Vector3::new(0.0, a, b));
                normals.push(Vector3::new(a, b, 0.0));
                normals.push(Vector3::new(b, 0.0, a));
            }
        }

        if let Some(Jitter { amount, seed }) = jitter {
            if !(amount >= 0.0) || !amount.is_finite() {
                return Err(CsgError::InvalidParameter {
                    name: "jitter.amount",
                    value: amount,
                    reason: "must be non-negative and finite",
                });
            }
            if amount > 0.0 {
                let mut rng = StdRng::seed_from_u64(seed);
                for n in &mut normals {
                    let unit = n.normalize();
                    *n = unit
                        + Vector3::new(
                            rng.random_range(-amount..=amount),
                            rng.random_range(-amount..=amount),
                            rng.random_range(-amount..=amount),
                        );
                }
            }
        }

        let planes = normals
            .iter()
            .filter_map(|n| {
                let unit = n.try_normalize(Real::EPSILON)?;
                Plane::from_normal_and_point(unit, &(center + unit * radius))
            })
            .collect::<Vec<_>>();
        Self::from_planes(&planes, material)
    }
}
