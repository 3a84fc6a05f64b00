//! `ConvexCell`: a convex polytope stored as faces of boundary cuts.
//!
//! A cell never stores an explicit vertex list. Each face keeps its plane and a
//! polygon of [`BoundaryCut`]s in that plane's 2D basis; corners are derived from the
//! cut intervals when needed (bounds, volume, meshes) and cached until the next
//! geometric mutation.

use crate::errors::CsgError;
use crate::float_types::{
    Real, distance_epsilon,
    parry3d::bounding_volume::{Aabb, BoundingVolume},
    rapier3d::prelude::SharedShape,
};
use crate::pool::CutPool;
use crate::render::RenderMesh;
use crate::traits::{Transformable, check_transform};
use nalgebra::{Matrix4, Point3, Vector3};
use std::sync::OnceLock;

pub mod cut;
pub mod face;
pub mod plane;
mod shapes;

pub use cut::{BoundaryCut, Cut, CutSplit};
pub use face::{Face, FaceSplit, SubFace};
pub use plane::Plane;
pub use shapes::Jitter;

slotmap::new_key_type! {
    /// Stable handle of a cell inside a [`CompositeSolid`](crate::composite::CompositeSolid).
    pub struct CellId;
}

/// Values derived from a cell's geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub volume: Real,
    pub aabb: Aabb,
    /// Average of the cell corners.
    pub centroid: Point3<Real>,
    /// Volume-weighted center of the solid.
    pub center_of_mass: Point3<Real>,
}

impl CellMetrics {
    fn empty() -> Self {
        Self {
            volume: 0.0,
            aabb: Aabb::new(Point3::origin(), Point3::origin()),
            centroid: Point3::origin(),
            center_of_mass: Point3::origin(),
        }
    }
}

/// Outcome of [`ConvexCell::split`]. The cell itself always keeps the positive side
/// (inside the splitting plane).
#[derive(Debug, Clone)]
pub enum CellSplit {
    /// The cell lies inside the plane; nothing changed.
    Positive,
    /// The cell lies outside the plane; nothing changed.
    Negative,
    /// The cell was cut. It now holds the inside part; the returned cell holds the
    /// outside part. Both end with the shared capping face.
    Split(ConvexCell),
}

#[derive(Debug, Clone)]
pub struct ConvexCell {
    pub(crate) faces: Vec<Face>,
    material: u32,
    empty: bool,

    /// Lazily calculated volume, bounds and centers.
    metrics: OnceLock<CellMetrics>,
}

impl ConvexCell {
    pub(crate) fn from_faces(faces: Vec<Face>, material: u32) -> Self {
        let empty = faces.len() < 4;
        Self {
            faces: if empty { Vec::new() } else { faces },
            material,
            empty,
            metrics: OnceLock::new(),
        }
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub const fn material(&self) -> u32 {
        self.material
    }

    pub const fn set_material(&mut self, material: u32) {
        self.material = material;
    }

    pub const fn is_empty(&self) -> bool {
        self.empty
    }

    /// Drop every face and mark the cell empty.
    pub fn make_empty(&mut self) {
        self.faces.clear();
        self.empty = true;
        self.invalidate();
    }

    /// Forget cached metrics after a geometric mutation.
    pub fn invalidate(&mut self) {
        self.metrics = OnceLock::new();
    }

    pub fn metrics(&self) -> CellMetrics {
        *self.metrics.get_or_init(|| self.compute_metrics())
    }

    pub fn volume(&self) -> Real {
        self.metrics().volume
    }

    pub fn bounding_box(&self) -> Aabb {
        self.metrics().aabb
    }

    pub fn centroid(&self) -> Point3<Real> {
        self.metrics().centroid
    }

    pub fn center_of_mass(&self) -> Point3<Real> {
        self.metrics().center_of_mass
    }

    /// Corner points in world space, one per cut of every face (shared corners are
    /// repeated once per face they belong to).
    pub fn vertices(&self) -> Vec<Point3<Real>> {
        self.faces.iter().flat_map(Face::corners).collect()
    }

    /// Smallest and largest signed distance of any corner to `plane`.
    pub fn signed_range(&self, plane: &Plane) -> (Real, Real) {
        self.faces
            .iter()
            .flat_map(Face::corners)
            .fold((Real::INFINITY, Real::NEG_INFINITY), |(lo, hi), p| {
                let s = plane.signed_distance(&p);
                (lo.min(s), hi.max(s))
            })
    }

    /// Half-space test against every face, with the distance epsilon as slack.
    pub fn contains_point(&self, point: &Point3<Real>) -> bool {
        let eps = distance_epsilon();
        !self.empty && self.faces.iter().all(|f| f.plane.signed_distance(point) <= eps)
    }

    /// Every cell referenced by some subface, sorted and deduplicated.
    pub fn neighbors(&self) -> Vec<CellId> {
        let mut ids: Vec<CellId> = self
            .faces
            .iter()
            .flat_map(|f| f.subfaces.iter().filter_map(|s| s.neighbor))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// `true` if any subface is linked to `id`.
    pub fn links_to(&self, id: CellId) -> bool {
        self.faces.iter().any(|f| f.touches(id))
    }

    /// Split by `plane`; see [`split_in`](Self::split_in).
    pub fn split(&mut self, plane: &Plane, bounding: Option<&[BoundaryCut]>) -> CellSplit {
        self.split_in(plane, bounding, &mut CutPool::default())
    }

    /// Split this cell by `plane`, keeping the part inside the plane.
    ///
    /// `bounding` optionally restricts the plane to a polygon in its own basis: when
    /// that polygon misses the cell the split reports [`CellSplit::Positive`] without
    /// touching anything. It only gates the test; an actual split always cuts along
    /// the whole plane.
    pub fn split_in(
        &mut self,
        plane: &Plane,
        bounding: Option<&[BoundaryCut]>,
        pool: &mut CutPool,
    ) -> CellSplit {
        if self.empty {
            return CellSplit::Positive;
        }
        let eps = distance_epsilon();
        let (lo, hi) = self.signed_range(plane);
        if hi <= eps {
            return CellSplit::Positive;
        }
        if lo >= -eps {
            return CellSplit::Negative;
        }

        if let Some(bounding) = bounding {
            match self.cap_polygon(plane, bounding, pool) {
                Some(trial) => pool.release(trial),
                None => return CellSplit::Positive,
            }
        }

        let fallback = if hi > -lo {
            CellSplit::Negative
        } else {
            CellSplit::Positive
        };
        let Some(cap_cuts) = self.cap_polygon(plane, &[], pool) else {
            tracing::trace!(lo, hi, "plane crosses the cell but leaves no cap polygon");
            return fallback;
        };
        let cap_cuts = pool.detach(cap_cuts);

        let mut positive = Vec::with_capacity(self.faces.len() + 1);
        let mut negative = Vec::with_capacity(self.faces.len() + 1);
        for face in &self.faces {
            match face.split_in(&face.plane.get_cut(plane), pool) {
                FaceSplit::Positive => positive.push(face.clone()),
                FaceSplit::Negative => negative.push(face.clone()),
                FaceSplit::Split(pos, neg) => {
                    positive.push(pos);
                    negative.push(neg);
                },
            }
        }
        if positive.len() < 3 || negative.len() < 3 {
            tracing::trace!(
                positive = positive.len(),
                negative = negative.len(),
                "split side too thin to bound a volume"
            );
            return fallback;
        }

        let cap = Face::new(*plane, cap_cuts);
        let Some(flipped) = cap.clone_flipped(None) else {
            return fallback;
        };
        positive.push(cap);
        negative.push(flipped);

        self.faces = positive;
        self.invalidate();
        CellSplit::Split(ConvexCell::from_faces(negative, self.material))
    }

    /// The polygon `plane` cuts out of this cell, starting from `seed` (in the
    /// plane's basis) and trimmed by every face plane. `None` when nothing with a
    /// non-zero area is left.
    fn cap_polygon(
        &self,
        plane: &Plane,
        seed: &[BoundaryCut],
        pool: &mut CutPool,
    ) -> Option<Vec<BoundaryCut>> {
        let mut cuts = pool.acquire();
        cuts.extend_from_slice(seed);
        for face in &self.faces {
            match cut::split_polygon_in(&cuts, &plane.get_cut(&face.plane), pool) {
                CutSplit::Unchanged => {},
                CutSplit::Excluded => {
                    pool.release(cuts);
                    return None;
                },
                CutSplit::Split { positive, negative } => {
                    pool.release(negative);
                    pool.release(std::mem::replace(&mut cuts, positive));
                },
            }
        }

        let eps = distance_epsilon();
        if cuts.len() >= 3 && cut::is_closed(&cuts) && cut::area(&cuts) > eps * eps {
            Some(cuts)
        } else {
            pool.release(cuts);
            None
        }
    }

    /// Clip away the part outside `plane`; see [`clip_in`](Self::clip_in).
    pub fn clip(&mut self, plane: &Plane, bounding: Option<&[BoundaryCut]>) -> bool {
        self.clip_in(plane, bounding, &mut CutPool::default())
    }

    /// Split by `plane` and discard the outside part. A cell entirely outside
    /// becomes empty. Returns whether anything was removed.
    pub fn clip_in(
        &mut self,
        plane: &Plane,
        bounding: Option<&[BoundaryCut]>,
        pool: &mut CutPool,
    ) -> bool {
        match self.split_in(plane, bounding, pool) {
            CellSplit::Positive => false,
            CellSplit::Negative => {
                self.make_empty();
                true
            },
            CellSplit::Split(_) => true,
        }
    }

    /// Take over the adjacency of `other`; see
    /// [`merge_subfaces_from_in`](Self::merge_subfaces_from_in).
    pub fn merge_subfaces_from(&mut self, other: &ConvexCell) -> Vec<CellId> {
        self.merge_subfaces_from_in(other, &mut CutPool::default())
    }

    /// Take over the adjacency of `other`, a cell lying inside this one.
    ///
    /// For every face of `other` coplanar with a face of `self`, each linked subface
    /// of `other` is carved out of the exposed surface of the matching face and the
    /// carved pieces inherit the link. Returns the neighbors now linked to `self`;
    /// their mirror links still point at `other` and must be redirected by the
    /// caller.
    pub fn merge_subfaces_from_in(
        &mut self,
        other: &ConvexCell,
        pool: &mut CutPool,
    ) -> Vec<CellId> {
        let mut linked = Vec::new();
        for theirs in &other.faces {
            let Some(mine) = self
                .faces
                .iter_mut()
                .find(|f| f.plane.is_coplanar(&theirs.plane))
            else {
                continue;
            };
            for sub in &theirs.subfaces {
                let Some(neighbor) = sub.neighbor else {
                    continue;
                };
                let Some(region) = cut::remap_cuts(&sub.cuts, &theirs.plane, &mine.plane, |p| p)
                else {
                    continue;
                };
                let pieces = mine.carve_where_in(&region, SubFace::is_exposed, pool);
                if pieces.is_empty() {
                    continue;
                }
                mine.subfaces.extend(pieces.into_iter().map(|mut piece| {
                    piece.neighbor = Some(neighbor);
                    piece
                }));
                linked.push(neighbor);
            }
        }
        linked.sort_unstable();
        linked.dedup();
        linked
    }

    /// Paint the exposed surface inside `brush`; see [`paint_in`](Self::paint_in).
    pub fn paint(&mut self, brush: &ConvexCell, material: Option<u32>) -> bool {
        self.paint_in(brush, material, &mut CutPool::default())
    }

    /// Give every exposed subface region lying inside `brush` the material override
    /// `material`. Surface lying on a brush face (same orientation) counts as
    /// inside. Returns whether any subface changed.
    pub fn paint_in(
        &mut self,
        brush: &ConvexCell,
        material: Option<u32>,
        pool: &mut CutPool,
    ) -> bool {
        if self.empty || brush.empty {
            return false;
        }
        let reach = brush.bounding_box().loosened(distance_epsilon());
        if !self.bounding_box().intersects(&reach) {
            return false;
        }

        let mut changed = false;
        for face in &mut self.faces {
            let mut region = pool.acquire();
            let mut reachable = true;
            for other in &brush.faces {
                if face.plane.is_coplanar(&other.plane) {
                    continue;
                }
                match face.plane.get_cut(&other.plane) {
                    Cut::ExcludesNone => {},
                    Cut::ExcludesAll => {
                        reachable = false;
                        break;
                    },
                    Cut::Bounded(c) => region.push(c),
                }
            }
            if reachable {
                changed |= face.paint_region_in(&region, material, pool);
            }
            pool.release(region);
        }
        changed
    }

    /// Triangles of every face of this cell, ignoring adjacency. For collision and
    /// physics consumers that want one convex piece at a time.
    pub fn convex_mesh(&self) -> RenderMesh {
        let mut mesh = RenderMesh::new();
        for face in &self.faces {
            mesh.push_polygon(&face.plane, &face.cuts, self.material);
        }
        mesh
    }

    /// Triangles of the exposed subfaces only, with material overrides applied.
    pub fn exposed_mesh(&self) -> RenderMesh {
        let mut mesh = RenderMesh::new();
        for face in &self.faces {
            for sub in face.subfaces.iter().filter(|s| s.is_exposed()) {
                mesh.push_polygon(&face.plane, &sub.cuts, sub.material.unwrap_or(self.material));
            }
        }
        mesh
    }

    /// Corner points with repeats merged, suitable for hull construction.
    pub fn distinct_vertices(&self) -> Vec<Point3<Real>> {
        let eps = distance_epsilon();
        let mut out: Vec<Point3<Real>> = Vec::new();
        for p in self.vertices() {
            if !out.iter().any(|q| (q - p).norm() <= eps) {
                out.push(p);
            }
        }
        out
    }

    /// A parry convex hull of this cell, in world coordinates.
    pub fn to_convex_shape(&self) -> Result<SharedShape, CsgError> {
        if self.empty {
            return Err(CsgError::DegenerateShape("cell is empty".into()));
        }
        SharedShape::convex_hull(&self.distinct_vertices()).ok_or_else(|| {
            CsgError::DegenerateShape("cell corners do not span a volume".into())
        })
    }

    fn compute_metrics(&self) -> CellMetrics {
        let corners = self.vertices();
        if self.empty || corners.is_empty() {
            return CellMetrics::empty();
        }

        let first = corners[0];
        let (mins, maxs) = corners
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.inf(p), hi.sup(p)));
        let centroid = Point3::from(
            corners.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords)
                / corners.len() as Real,
        );

        // Fan every face polygon from its own centroid and close each triangle into
        // a tetrahedron with the cell centroid.
        let mut six_volume = 0.0;
        let mut weighted = Vector3::zeros();
        for face in &self.faces {
            let pts = face.corners();
            if pts.len() < 3 {
                continue;
            }
            let fc = Point3::from(
                pts.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / pts.len() as Real,
            );
            for (a, b) in pts.iter().zip(pts.iter().cycle().skip(1)) {
                let six = (a - fc).cross(&(b - fc)).dot(&(fc - centroid));
                six_volume += six;
                weighted += (centroid.coords + fc.coords + a.coords + b.coords) * (six * 0.25);
            }
        }

        let center_of_mass = if six_volume.abs() > Real::EPSILON {
            Point3::from(weighted / six_volume)
        } else {
            centroid
        };
        CellMetrics {
            volume: six_volume / 6.0,
            aabb: Aabb::new(mins, maxs),
            centroid,
            center_of_mass,
        }
    }
}

impl Transformable for ConvexCell {
    /// Move every face plane and reproject every cut polygon. Faces that collapse are
    /// dropped; a cell left with fewer than four faces becomes empty.
    fn transform(&mut self, matrix: &Matrix4<Real>) -> Result<(), CsgError> {
        check_transform(matrix)?;
        if self.empty {
            return Ok(());
        }
        let before = self.faces.len();
        self.faces = self
            .faces
            .iter()
            .filter_map(|f| f.transformed(matrix))
            .collect();
        if self.faces.len() < before {
            tracing::trace!(
                dropped = before - self.faces.len(),
                "faces degenerated under transform"
            );
        }
        if self.faces.len() < 4 {
            self.make_empty();
        }
        self.invalidate();
        Ok(())
    }
}
