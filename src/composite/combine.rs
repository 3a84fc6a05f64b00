//! Brush combination: splitting existing cells against a convex brush and keeping
//! the face adjacency consistent while doing so.

use super::{ChangeSet, CompositeSolid};
use crate::cell::cut::{self, CutSplit};
use crate::cell::{CellId, CellSplit, ConvexCell, Plane, SubFace};
use crate::float_types::{distance_epsilon, parry3d::bounding_volume::BoundingVolume};
use tracing::{debug, instrument};

/// How a brush is combined into a [`CompositeSolid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Union: the brush becomes solid.
    Add,
    /// Difference: the brush volume is removed.
    Subtract,
    /// Cells inside the brush take its material, as does surface inside it.
    Replace,
    /// Only exposed surface inside the brush takes its material.
    Paint,
}

impl CompositeSolid {
    /// Combine `brush` into the solid. Returns whether anything changed.
    ///
    /// Cost grows with (overlapping cells x faces per cell x brush faces); callers
    /// that need interactive rates should batch brushes.
    #[instrument(level = "debug", skip(self, brush), fields(cells = self.cells.len()))]
    pub fn combine(&mut self, brush: ConvexCell, operator: Operator) -> bool {
        if brush.is_empty() {
            return false;
        }
        let mut changes = ChangeSet::default();
        let changed = match operator {
            Operator::Add => self.add(brush, &mut changes),
            Operator::Subtract => self.subtract(&brush, &mut changes),
            Operator::Replace | Operator::Paint => {
                self.paint_cells(&brush, operator, &mut changes)
            },
        };
        debug_assert!(
            self.adjacency_is_symmetric(),
            "combine left a neighbor link without its mirror"
        );
        debug!(
            changed,
            added = changes.added.len(),
            removed = changes.removed.len(),
            cells = self.cells.len(),
            "combined brush"
        );
        self.commit(changes);
        changed
    }

    /// Cells whose bounds reach the brush bounds, padded by the distance epsilon.
    fn candidates(&self, brush: &ConvexCell) -> Vec<CellId> {
        let reach = brush.bounding_box().loosened(distance_epsilon());
        self.cells
            .iter()
            .filter(|(_, c)| c.bounding_box().intersects(&reach))
            .map(|(id, _)| id)
            .collect()
    }

    /// `false` when some brush plane has the whole cell on its outside (touching
    /// counts as outside).
    fn overlaps_interior(&self, id: CellId, planes: &[Plane]) -> bool {
        let eps = distance_epsilon();
        self.cells.get(id).is_some_and(|cell| {
            planes.iter().all(|p| {
                let (lo, _) = cell.signed_range(p);
                lo < -eps
            })
        })
    }

    fn fully_inside(cell: &ConvexCell, planes: &[Plane]) -> bool {
        let eps = distance_epsilon();
        planes.iter().all(|p| cell.signed_range(p).1 <= eps)
    }

    fn add(&mut self, brush: ConvexCell, changes: &mut ChangeSet) -> bool {
        let candidates = self.candidates(&brush);
        let planes: Vec<Plane> = brush.faces().iter().map(|f| f.plane).collect();
        let brush_id = self.cells.insert(brush);
        changes.added.push(brush_id);

        let mut flush = Vec::new();
        for id in candidates {
            if !self.overlaps_interior(id, &planes) {
                flush.push(id);
                continue;
            }
            if let Some(inside) = self.carve_outside(id, &planes, changes) {
                self.absorb(brush_id, inside, changes);
            }
        }

        for id in flush {
            if self.connect_cells(brush_id, id) {
                changes.modified.push(id);
            }
        }
        true
    }

    fn subtract(&mut self, brush: &ConvexCell, changes: &mut ChangeSet) -> bool {
        let planes: Vec<Plane> = brush.faces().iter().map(|f| f.plane).collect();
        let mut changed = false;
        for id in self.candidates(brush) {
            if !self.overlaps_interior(id, &planes) {
                continue;
            }
            changed = true;
            if let Some(inside) = self.carve_outside(id, &planes, changes) {
                self.remove_cell(inside, changes);
            }
        }
        changed
    }

    fn paint_cells(
        &mut self,
        brush: &ConvexCell,
        operator: Operator,
        changes: &mut ChangeSet,
    ) -> bool {
        let material = brush.material();
        let planes: Vec<Plane> = brush.faces().iter().map(|f| f.plane).collect();
        let mut changed = false;
        for id in self.candidates(brush) {
            if !self.overlaps_interior(id, &planes) {
                continue;
            }
            let Some(cell) = self.cells.get_mut(id) else {
                continue;
            };
            let mut touched = cell.paint_in(brush, Some(material), &mut self.pool);
            if operator == Operator::Replace
                && cell.material() != material
                && Self::fully_inside(cell, &planes)
            {
                cell.set_material(material);
                touched = true;
            }
            if touched {
                changes.modified.push(id);
                changed = true;
            }
        }
        changed
    }

    /// Split cell `id` by every brush plane in turn. The pieces outside the brush stay
    /// in the solid as their own cells; the piece left inside is returned, or `None`
    /// once the remainder turned out to lie outside as well.
    fn carve_outside(
        &mut self,
        id: CellId,
        planes: &[Plane],
        changes: &mut ChangeSet,
    ) -> Option<CellId> {
        for plane in planes {
            let cell = self.cells.get_mut(id)?;
            match cell.split_in(plane, None, &mut self.pool) {
                CellSplit::Positive => {},
                CellSplit::Negative => return None,
                CellSplit::Split(outside) => {
                    let outside_id = self.cells.insert(outside);
                    changes.added.push(outside_id);
                    changes.modified.push(id);
                    self.link_split(id, outside_id, plane, changes);
                },
            }
        }
        Some(id)
    }

    /// Restore adjacency after `retained` was split by `plane` into itself and
    /// `split_off`: link the two caps, then hand every third-party link that now
    /// faces `split_off` over to it.
    fn link_split(
        &mut self,
        retained: CellId,
        split_off: CellId,
        plane: &Plane,
        changes: &mut ChangeSet,
    ) {
        for (cell, other) in [(retained, split_off), (split_off, retained)] {
            if let Some(cap) = self
                .cells
                .get_mut(cell)
                .and_then(|c| c.faces.last_mut())
            {
                for sub in &mut cap.subfaces {
                    sub.neighbor = Some(other);
                }
            }
        }

        let moved: Vec<CellId> = self
            .cells
            .get(split_off)
            .map(ConvexCell::neighbors)
            .unwrap_or_default()
            .into_iter()
            .filter(|&n| n != retained)
            .collect();

        for neighbor in moved {
            let Some(cell) = self.cells.get_mut(neighbor) else {
                continue;
            };
            for face in cell.faces.iter_mut().filter(|f| f.touches(retained)) {
                // Kept side of this cut is the retained side.
                let cut = face.plane.get_cut(plane);
                let mut next = Vec::with_capacity(face.subfaces.len() + 1);
                for sub in face.subfaces.drain(..) {
                    if sub.neighbor != Some(retained) {
                        next.push(sub);
                        continue;
                    }
                    match cut::split_polygon_in(&sub.cuts, &cut, &mut self.pool) {
                        CutSplit::Unchanged => next.push(sub),
                        CutSplit::Excluded => next.push(SubFace {
                            neighbor: Some(split_off),
                            ..sub
                        }),
                        CutSplit::Split { positive, negative } => {
                            let mut handed = sub.fragment(self.pool.detach(negative));
                            handed.neighbor = Some(split_off);
                            next.push(sub.fragment(self.pool.detach(positive)));
                            next.push(handed);
                        },
                    }
                }
                face.subfaces = next;
            }
            changes.modified.push(neighbor);
        }
    }

    /// Replace the fragment `inside` (lying within the brush) by the brush: links it
    /// had on brush planes move to the brush, all other links are cleared.
    fn absorb(&mut self, brush: CellId, inside: CellId, changes: &mut ChangeSet) {
        let Some(fragment) = self.cells.remove(inside) else {
            return;
        };
        changes.removed.push(inside);

        let linked = self
            .cells
            .get_mut(brush)
            .map(|b| b.merge_subfaces_from_in(&fragment, &mut self.pool))
            .unwrap_or_default();
        for &neighbor in &linked {
            self.retarget(neighbor, inside, Some(brush));
            changes.modified.push(neighbor);
        }
        for neighbor in fragment.neighbors() {
            if self.unlink(neighbor, inside) {
                changes.modified.push(neighbor);
            }
        }
    }

    /// Link the exposed parts of every pair of faces of `a` and `b` that lie on the
    /// same plane with opposite orientations. Returns whether any link was made.
    pub(crate) fn connect_cells(&mut self, a: CellId, b: CellId) -> bool {
        let pairs: Vec<(usize, usize)> = match (self.cells.get(a), self.cells.get(b)) {
            (Some(ca), Some(cb)) => ca
                .faces
                .iter()
                .enumerate()
                .flat_map(|(i, fa)| {
                    cb.faces
                        .iter()
                        .enumerate()
                        .filter(move |(_, fb)| fa.plane.is_opposite(&fb.plane))
                        .map(move |(j, _)| (i, j))
                })
                .collect(),
            _ => return false,
        };

        let mut connected = false;
        for (i, j) in pairs {
            connected |= self.connect_faces((a, i), (b, j));
        }
        connected
    }

    /// Carve the overlap of two opposite faces out of their exposed subfaces and link
    /// the carved pieces to each other.
    fn connect_faces(&mut self, (a, i): (CellId, usize), (b, j): (CellId, usize)) -> bool {
        let Some(face_b) = self.cells.get(b).and_then(|c| c.faces.get(j)).cloned() else {
            return false;
        };
        let Some(face_a) = self.cells.get_mut(a).and_then(|c| c.faces.get_mut(i)) else {
            return false;
        };
        let Some(region) = cut::remap_cuts(&face_b.cuts, &face_b.plane, &face_a.plane, |p| p) else {
            return false;
        };
        let plane_a = face_a.plane;
        let pieces = face_a.carve_where_in(&region, SubFace::is_exposed, &mut self.pool);
        if pieces.is_empty() {
            return false;
        }

        let mut linked_a = Vec::with_capacity(pieces.len());
        let mut linked_b = Vec::new();
        let mut unmatched = Vec::new();
        let pool = &mut self.pool;
        if let Some(target) = self.cells.get_mut(b).and_then(|c| c.faces.get_mut(j)) {
            for piece in pieces {
                let mirrored = cut::remap_cuts(&piece.cuts, &plane_a, &target.plane, |p| p)
                    .map(|region| target.carve_where_in(&region, SubFace::is_exposed, pool))
                    .unwrap_or_default();
                if mirrored.is_empty() {
                    unmatched.push(piece);
                    continue;
                }
                linked_b.extend(mirrored.into_iter().map(|m| SubFace {
                    neighbor: Some(a),
                    ..m
                }));
                linked_a.push(SubFace {
                    neighbor: Some(b),
                    ..piece
                });
            }
            target.subfaces.append(&mut linked_b);
        } else {
            unmatched = pieces;
        }

        let connected = !linked_a.is_empty();
        if let Some(face_a) = self.cells.get_mut(a).and_then(|c| c.faces.get_mut(i)) {
            face_a.subfaces.append(&mut linked_a);
            face_a.subfaces.append(&mut unmatched);
        }
        connected
    }
}
