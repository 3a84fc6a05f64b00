//! Connected components of the face adjacency graph.

use super::{ChangeSet, CompositeSolid};
use crate::cell::CellId;
use crate::float_types::Real;
use hashbrown::{HashMap, HashSet};
use slotmap::SlotMap;
use std::collections::VecDeque;

/// A maximal set of cells reachable from each other through linked subfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub cells: Vec<CellId>,
    pub volume: Real,
}

impl CompositeSolid {
    /// All connected components, largest volume first.
    pub fn connected_components(&self) -> Vec<Component> {
        let mut visited: HashSet<CellId> = HashSet::with_capacity(self.cells.len());
        let mut components = Vec::new();
        let mut queue = VecDeque::new();

        for start in self.cells.keys() {
            if !visited.insert(start) {
                continue;
            }
            queue.push_back(start);
            let mut cells = Vec::new();
            let mut volume = 0.0;
            while let Some(id) = queue.pop_front() {
                let Some(cell) = self.cells.get(id) else {
                    continue;
                };
                cells.push(id);
                volume += cell.volume();
                for neighbor in cell.neighbors() {
                    if self.cells.contains_key(neighbor) && visited.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
            components.push(Component { cells, volume });
        }

        components.sort_by(|a, b| b.volume.total_cmp(&a.volume));
        components
    }

    /// Every component except the largest one: the pieces that broke off.
    pub fn fragments(&self) -> Vec<Component> {
        self.connected_components().into_iter().skip(1).collect()
    }

    /// Move the given cells into a new composite. Links between moved cells are
    /// carried over under their new ids; links to cells left behind are cleared on
    /// both sides.
    pub fn detach_component(&mut self, ids: &[CellId]) -> CompositeSolid {
        let moving: HashSet<CellId> = ids
            .iter()
            .copied()
            .filter(|id| self.cells.contains_key(*id))
            .collect();
        let mut changes = ChangeSet::default();

        let mut cells = SlotMap::with_key();
        let mut remap: HashMap<CellId, CellId> = HashMap::with_capacity(moving.len());
        for &id in ids {
            if !moving.contains(&id) || remap.contains_key(&id) {
                continue;
            }
            let Some(cell) = self.cells.remove(id) else {
                continue;
            };
            for neighbor in cell.neighbors() {
                if !moving.contains(&neighbor) && self.unlink(neighbor, id) {
                    changes.modified.push(neighbor);
                }
            }
            changes.removed.push(id);
            remap.insert(id, cells.insert(cell));
        }

        for cell in cells.values_mut() {
            for sub in cell.faces.iter_mut().flat_map(|f| f.subfaces.iter_mut()) {
                sub.neighbor = sub.neighbor.and_then(|n| remap.get(&n).copied());
            }
        }

        self.commit(changes);
        let mut detached = CompositeSolid {
            cells,
            ..CompositeSolid::default()
        };
        detached.dirty = true;
        detached
    }
}
