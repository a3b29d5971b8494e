use derive_more::IsVariant;
use std::collections::BTreeSet;

use crate::grid::{Grid, Tile};

/// Indices of the selected tiles.
///
/// Only non-empty tiles can be selected, so every member has an id.
/// Iteration is in ascending index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    indices: BTreeSet<usize>,
}

impl Selection {
    pub fn new() -> Self {
        return Self::default();
    }

    /// Selects `idx` unless the tile is empty or out of range
    pub fn add(&mut self, grid: &Grid, idx: usize) {
        match grid.get(idx) {
            Some(tile) if !tile.is_empty => {
                if self.indices.insert(idx) {
                    log::debug!("selected tile {idx} (id {:?})", tile.id);
                }
            }
            _ => (),
        }
    }

    pub fn remove(&mut self, idx: usize) {
        if self.indices.remove(&idx) {
            log::debug!("deselected tile {idx}");
        }
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    pub fn contains(&self, idx: usize) -> bool {
        return self.indices.contains(&idx);
    }

    pub fn len(&self) -> usize {
        return self.indices.len();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        return self.indices.iter().copied();
    }

    /// The selected tiles of `grid`
    pub fn tiles<'g>(&'g self, grid: &'g Grid) -> impl Iterator<Item = &'g Tile> + 'g {
        return self.iter().filter_map(|idx| grid.get(idx));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum PaintMode {
    Add,
    Remove,
}

/// Tracks a single press-drag-release gesture over the grid.
///
/// The mode is decided once, by whether the first tile touched was already
/// selected, and then forced onto every other tile the gesture passes over.
#[derive(Debug, Clone, Default)]
pub struct DragPainter {
    mode: Option<PaintMode>,
    last: Option<usize>,
}

impl DragPainter {
    pub fn new() -> Self {
        return Self::default();
    }

    pub fn mode(&self) -> Option<PaintMode> {
        self.mode
    }

    pub fn is_painting(&self) -> bool {
        self.mode.is_some()
    }

    /// Starts a gesture on `idx`, toggling it and fixing the mode
    pub fn press(&mut self, grid: &Grid, selection: &mut Selection, idx: usize) {
        let mode = if selection.contains(idx) {
            PaintMode::Remove
        } else {
            PaintMode::Add
        };
        self.mode = Some(mode);
        self.last = Some(idx);
        Self::apply(mode, grid, selection, idx);
    }

    /// Applies the gesture's mode to `idx` if it differs from the last tile touched
    pub fn drag(&mut self, grid: &Grid, selection: &mut Selection, idx: usize) {
        let Some(mode) = self.mode else {
            return;
        };
        if self.last == Some(idx) {
            return;
        }
        self.last = Some(idx);
        Self::apply(mode, grid, selection, idx);
    }

    pub fn release(&mut self) {
        self.mode = None;
        self.last = None;
    }

    fn apply(mode: PaintMode, grid: &Grid, selection: &mut Selection, idx: usize) {
        match mode {
            PaintMode::Add => selection.add(grid, idx),
            PaintMode::Remove => selection.remove(idx),
        }
    }
}
