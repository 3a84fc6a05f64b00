//! `CompositeSolid`: an arena of adjacency-linked convex cells.

use crate::cell::{CellId, ConvexCell};
use crate::errors::CsgError;
use crate::float_types::{
    Real,
    parry3d::bounding_volume::{Aabb, BoundingVolume},
};
use crate::pool::CutPool;
use crate::render::RenderMesh;
use crate::traits::{Transformable, check_transform};
use nalgebra::{Matrix4, Point3};
use slotmap::SlotMap;
use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

mod combine;
mod connectivity;
mod physics;

pub use combine::Operator;
pub use connectivity::Component;

/// Cells touched by one mutation of a composite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: Vec<CellId>,
    pub removed: Vec<CellId>,
    pub modified: Vec<CellId>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Collapse the raw log: a cell both added and removed never existed, and a cell
    /// added or removed is not also reported as modified.
    fn settle(&mut self) {
        for list in [&mut self.added, &mut self.removed, &mut self.modified] {
            list.sort_unstable();
            list.dedup();
        }
        let transient: Vec<CellId> = self
            .added
            .iter()
            .filter(|id| self.removed.binary_search(id).is_ok())
            .copied()
            .collect();
        self.added.retain(|id| transient.binary_search(id).is_err());
        self.removed.retain(|id| transient.binary_search(id).is_err());
        let (added, removed) = (&self.added, &self.removed);
        self.modified.retain(|id| {
            added.binary_search(id).is_err()
                && removed.binary_search(id).is_err()
                && transient.binary_search(id).is_err()
        });
    }
}

/// Receives the [`ChangeSet`] of every mutation, e.g. to rebuild render buffers or
/// colliders for the affected cells only.
pub trait ChangeListener: Send {
    fn on_change(&mut self, changes: &ChangeSet);
}

impl<F> ChangeListener for F
where
    F: FnMut(&ChangeSet) + Send,
{
    fn on_change(&mut self, changes: &ChangeSet) {
        self(changes)
    }
}

/// A solid built from brushes, kept as convex cells with face-to-face adjacency.
///
/// Cells live in an arena and refer to each other by [`CellId`]; removing a cell
/// clears every link that pointed at it.
#[derive(Default)]
pub struct CompositeSolid {
    cells: SlotMap<CellId, ConvexCell>,
    dirty: bool,
    pool: CutPool,
    listener: Option<Box<dyn ChangeListener>>,
}

impl fmt::Debug for CompositeSolid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeSolid")
            .field("cells", &self.cells)
            .field("dirty", &self.dirty)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

/// Clones the geometry; the change listener stays with the original.
impl Clone for CompositeSolid {
    fn clone(&self) -> Self {
        Self {
            cells: self.cells.clone(),
            dirty: self.dirty,
            pool: CutPool::default(),
            listener: None,
        }
    }
}

impl CompositeSolid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the callback invoked after every mutation that changed something.
    pub fn set_listener(&mut self, listener: impl ChangeListener + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, id: CellId) -> Option<&ConvexCell> {
        self.cells.get(id)
    }

    pub fn cells(&self) -> impl Iterator<Item = (CellId, &ConvexCell)> {
        self.cells.iter()
    }

    pub fn cell_ids(&self) -> Vec<CellId> {
        self.cells.keys().collect()
    }

    /// `true` once a mutation changed the solid, until [`clear_dirty`](Self::clear_dirty).
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub const fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Remove every cell.
    pub fn clear(&mut self) {
        let changes = ChangeSet {
            removed: self.cells.keys().collect(),
            ..ChangeSet::default()
        };
        self.cells.clear();
        self.commit(changes);
    }

    pub fn total_volume(&self) -> Real {
        self.cells.values().map(ConvexCell::volume).sum()
    }

    /// Union of the cell bounds, `None` for an empty solid.
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.cells
            .values()
            .map(ConvexCell::bounding_box)
            .reduce(|a, b| a.merged(&b))
    }

    pub fn contains_point(&self, point: &Point3<Real>) -> bool {
        self.cells.values().any(|c| c.contains_point(point))
    }

    /// The cell whose interior holds `point`, if any.
    pub fn cell_at(&self, point: &Point3<Real>) -> Option<CellId> {
        self.cells
            .iter()
            .find(|(_, c)| c.contains_point(point))
            .map(|(id, _)| id)
    }

    /// Triangles of the outer surface: every subface without a neighbor.
    #[cfg(not(feature = "parallel"))]
    pub fn render_mesh(&self) -> RenderMesh {
        let mut mesh = RenderMesh::new();
        for cell in self.cells.values() {
            mesh.append(cell.exposed_mesh());
        }
        mesh
    }

    /// Triangles of the outer surface: every subface without a neighbor.
    #[cfg(feature = "parallel")]
    pub fn render_mesh(&self) -> RenderMesh {
        let cells: Vec<&ConvexCell> = self.cells.values().collect();
        cells
            .par_iter()
            .map(|c| c.exposed_mesh())
            .reduce(RenderMesh::new, |mut a, b| {
                a.append(b);
                a
            })
    }

    /// Outer-surface triangles of a single cell.
    pub fn cell_mesh(&self, id: CellId) -> Option<RenderMesh> {
        self.cells.get(id).map(ConvexCell::exposed_mesh)
    }

    /// `true` when every neighbor link has a mirror link on the other cell.
    pub fn adjacency_is_symmetric(&self) -> bool {
        self.cells.iter().all(|(id, cell)| {
            cell.neighbors()
                .into_iter()
                .all(|n| n != id && self.cells.get(n).is_some_and(|other| other.links_to(id)))
        })
    }

    /// Remove a cell and clear the links pointing back at it.
    pub(crate) fn remove_cell(
        &mut self,
        id: CellId,
        changes: &mut ChangeSet,
    ) -> Option<ConvexCell> {
        let cell = self.cells.remove(id)?;
        for neighbor in cell.neighbors() {
            if self.unlink(neighbor, id) {
                changes.modified.push(neighbor);
            }
        }
        changes.removed.push(id);
        Some(cell)
    }

    /// Expose every subface of `cell` linked to `target`.
    fn unlink(&mut self, cell: CellId, target: CellId) -> bool {
        self.retarget(cell, target, None)
    }

    /// Point every subface of `cell` linked to `from` at `to` instead.
    pub(crate) fn retarget(&mut self, cell: CellId, from: CellId, to: Option<CellId>) -> bool {
        let Some(cell) = self.cells.get_mut(cell) else {
            return false;
        };
        let mut touched = false;
        for sub in cell.faces.iter_mut().flat_map(|f| f.subfaces.iter_mut()) {
            if sub.neighbor == Some(from) {
                sub.neighbor = to;
                touched = true;
            }
        }
        touched
    }

    fn commit(&mut self, mut changes: ChangeSet) {
        changes.settle();
        if changes.is_empty() {
            return;
        }
        self.dirty = true;
        if let Some(listener) = self.listener.as_mut() {
            listener.on_change(&changes);
        }
    }
}

impl Transformable for CompositeSolid {
    /// Apply `matrix` to every cell. Links survive unchanged since all cells move
    /// together; cells that collapse are removed.
    fn transform(&mut self, matrix: &Matrix4<Real>) -> Result<(), CsgError> {
        check_transform(matrix)?;
        let mut changes = ChangeSet::default();
        let mut collapsed = Vec::new();
        for (id, cell) in self.cells.iter_mut() {
            cell.transform(matrix)?;
            if cell.is_empty() {
                collapsed.push(id);
            } else {
                changes.modified.push(id);
            }
        }
        for id in collapsed {
            tracing::trace!(?id, "cell collapsed under transform");
            self.remove_cell(id, &mut changes);
        }
        debug_assert!(
            self.adjacency_is_symmetric(),
            "transform left a neighbor link without its mirror"
        );
        self.commit(changes);
        Ok(())
    }
}
