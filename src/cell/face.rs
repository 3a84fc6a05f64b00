//! Faces of a convex cell and their adjacency partition.

use crate::cell::CellId;
use crate::cell::cut::{self, BoundaryCut, Cut, CutSplit};
use crate::cell::plane::Plane;
use crate::float_types::{Real, distance_epsilon};
use crate::pool::CutPool;
use nalgebra::{Matrix4, Point3};

/// A region of a face polygon with a single adjacency and material assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct SubFace {
    pub cuts: Vec<BoundaryCut>,
    /// The cell on the other side of this region, `None` when it is outer surface.
    pub neighbor: Option<CellId>,
    /// Overrides the owning cell's material for this region of surface.
    pub material: Option<u32>,
}

impl SubFace {
    pub const fn new(cuts: Vec<BoundaryCut>) -> Self {
        Self {
            cuts,
            neighbor: None,
            material: None,
        }
    }

    /// `true` when nothing lies on the other side.
    pub const fn is_exposed(&self) -> bool {
        self.neighbor.is_none()
    }

    pub fn area(&self) -> Real {
        cut::area(&self.cuts)
    }

    /// A new region carrying this subface's neighbor and material.
    pub fn fragment(&self, cuts: Vec<BoundaryCut>) -> Self {
        Self {
            cuts,
            neighbor: self.neighbor,
            material: self.material,
        }
    }
}

/// One bounding plane of a convex cell together with its polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub plane: Plane,
    /// The face polygon, ordered by angle.
    pub cuts: Vec<BoundaryCut>,
    /// Tiles `cuts` without gaps or overlaps.
    pub subfaces: Vec<SubFace>,
}

/// Outcome of [`Face::split`].
#[derive(Debug, Clone, PartialEq)]
pub enum FaceSplit {
    Positive,
    Negative,
    Split(Face, Face),
}

impl Face {
    /// A face covered by a single exposed subface.
    pub fn new(plane: Plane, cuts: Vec<BoundaryCut>) -> Self {
        let subfaces = vec![SubFace::new(cuts.clone())];
        Self {
            plane,
            cuts,
            subfaces,
        }
    }

    pub fn area(&self) -> Real {
        cut::area(&self.cuts)
    }

    /// Polygon corners in world space, counter-clockwise about the plane normal.
    pub fn corners(&self) -> Vec<Point3<Real>> {
        cut::vertices(&self.cuts)
            .iter()
            .map(|p| self.plane.to_world(p))
            .collect()
    }

    /// A face with fewer than three bounded cuts does not bound anything.
    pub fn is_degenerate(&self) -> bool {
        self.cuts.len() < 3 || !cut::is_closed(&self.cuts)
    }

    /// `true` if any subface is linked to `id`.
    pub fn touches(&self, id: CellId) -> bool {
        self.subfaces.iter().any(|s| s.neighbor == Some(id))
    }

    /// Split the polygon and every subface by `cut`; see [`split_in`](Self::split_in).
    pub fn split(&self, cut: &Cut) -> FaceSplit {
        self.split_in(cut, &mut CutPool::default())
    }

    /// Split the polygon and every subface by `cut` (expressed in this face's basis).
    /// Polygons of the resulting faces are drawn from `pool` and owned by the faces.
    pub fn split_in(&self, cut: &Cut, pool: &mut CutPool) -> FaceSplit {
        let (positive, negative) = match cut::split_polygon_in(&self.cuts, cut, pool) {
            CutSplit::Unchanged => return FaceSplit::Positive,
            CutSplit::Excluded => return FaceSplit::Negative,
            CutSplit::Split { positive, negative } => {
                (pool.detach(positive), pool.detach(negative))
            },
        };

        let mut pos = Face {
            plane: self.plane,
            cuts: positive,
            subfaces: Vec::with_capacity(self.subfaces.len()),
        };
        let mut neg = Face {
            plane: self.plane,
            cuts: negative,
            subfaces: Vec::with_capacity(self.subfaces.len()),
        };

        for sub in &self.subfaces {
            match cut::split_polygon_in(&sub.cuts, cut, pool) {
                CutSplit::Unchanged => pos.subfaces.push(sub.clone()),
                CutSplit::Excluded => neg.subfaces.push(sub.clone()),
                CutSplit::Split { positive, negative } => {
                    pos.subfaces.push(sub.fragment(pool.detach(positive)));
                    neg.subfaces.push(sub.fragment(pool.detach(negative)));
                },
            }
        }
        FaceSplit::Split(pos, neg)
    }

    /// Carve `region` out of the subfaces accepted by `filter`; see
    /// [`carve_where_in`](Self::carve_where_in).
    pub fn carve_where<P>(&mut self, region: &[BoundaryCut], filter: P) -> Vec<SubFace>
    where
        P: Fn(&SubFace) -> bool,
    {
        self.carve_where_in(region, filter, &mut CutPool::default())
    }

    /// Carve the region bounded by `region` out of every subface accepted by
    /// `filter`. Remainders outside the region stay as subfaces; the pieces inside
    /// are removed from the face and returned, still carrying their old neighbor
    /// and material.
    ///
    /// `region` is a list of constraints in this face's basis; it need not be a
    /// closed polygon. Intermediate polygons come from `pool` and those that are not
    /// kept go back to it.
    pub fn carve_where_in<P>(
        &mut self,
        region: &[BoundaryCut],
        filter: P,
        pool: &mut CutPool,
    ) -> Vec<SubFace>
    where
        P: Fn(&SubFace) -> bool,
    {
        let min_area = distance_epsilon() * distance_epsilon();
        let mut kept = Vec::with_capacity(self.subfaces.len());
        let mut inside = Vec::new();

        for sub in self.subfaces.drain(..) {
            if !filter(&sub) {
                kept.push(sub);
                continue;
            }

            // Fast path: the whole subface sits inside the region.
            if cut::is_closed(&sub.cuts)
                && cut::vertices(&sub.cuts)
                    .iter()
                    .all(|p| cut::contains_point(region, p))
                && cut::contains_point(region, &cut::centroid(&sub.cuts))
            {
                inside.push(sub);
                continue;
            }

            let mut rest = pool.acquire();
            rest.extend_from_slice(&sub.cuts);
            let mut remainders = Vec::new();
            let mut outside = false;
            for boundary in region {
                match cut::split_cuts_in(&rest, boundary, pool) {
                    CutSplit::Unchanged => {},
                    CutSplit::Excluded => {
                        outside = true;
                        break;
                    },
                    CutSplit::Split { positive, negative } => {
                        remainders.push(negative);
                        pool.release(std::mem::replace(&mut rest, positive));
                    },
                }
            }

            // Disjoint from the region, or overlapping it by a sliver only.
            if outside || cut::area(&rest) <= min_area {
                pool.release(rest);
                for remainder in remainders {
                    pool.release(remainder);
                }
                kept.push(sub);
            } else {
                kept.extend(remainders.into_iter().map(|c| sub.fragment(pool.detach(c))));
                inside.push(sub.fragment(pool.detach(rest)));
            }
        }

        self.subfaces = kept;
        inside
    }

    /// Carve `region` out of every subface; see [`carve_where`](Self::carve_where).
    pub fn carve(&mut self, region: &[BoundaryCut]) -> Vec<SubFace> {
        self.carve_where(region, |_| true)
    }

    /// Delete everything of the subface partition that lies inside `region`.
    pub fn remove_subfaces_inside(&mut self, region: &[BoundaryCut]) {
        let _ = self.carve(region);
    }

    /// Assign `material` to the exposed surface inside `region`.
    ///
    /// Returns `true` if any subface changed material.
    pub fn paint_region(&mut self, region: &[BoundaryCut], material: Option<u32>) -> bool {
        self.paint_region_in(region, material, &mut CutPool::default())
    }

    /// [`paint_region`](Self::paint_region) with scratch polygons from `pool`.
    pub fn paint_region_in(
        &mut self,
        region: &[BoundaryCut],
        material: Option<u32>,
        pool: &mut CutPool,
    ) -> bool {
        let pieces =
            self.carve_where_in(region, |s| s.is_exposed() && s.material != material, pool);
        let changed = !pieces.is_empty();
        self.subfaces.extend(pieces.into_iter().map(|mut piece| {
            piece.material = material;
            piece
        }));
        changed
    }

    /// The mirror of this face as seen from a cell on its other side: negated plane,
    /// polygon re-expressed in the flipped basis, and a single subface linked to
    /// `neighbor`.
    pub fn clone_flipped(&self, neighbor: Option<CellId>) -> Option<Face> {
        let plane = self.plane.flipped();
        let cuts = cut::remap_cuts(&self.cuts, &self.plane, &plane, |p| p)?;
        let mut face = Face::new(plane, cuts);
        face.subfaces[0].neighbor = neighbor;
        Some(face)
    }

    /// This face after an affine transform, or `None` if it degenerates.
    pub fn transformed(&self, matrix: &Matrix4<Real>) -> Option<Face> {
        let plane = self.plane.transform(matrix)?;
        let map = |p: Point3<Real>| matrix.transform_point(&p);
        let cuts = cut::remap_cuts(&self.cuts, &self.plane, &plane, map)?;
        let subfaces = self
            .subfaces
            .iter()
            .filter_map(|s| {
                cut::remap_cuts(&s.cuts, &self.plane, &plane, map).map(|cuts| s.fragment(cuts))
            })
            .collect();
        Some(Face {
            plane,
            cuts,
            subfaces,
        })
    }
}
