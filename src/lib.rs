pub mod config;
pub mod error;
pub mod export;
pub mod grid;
pub mod selection;
pub mod session;

pub use config::Config;
pub use error::{TileError, TileResult};
pub use export::{ExportFormat, ExportMatrix, ExportStyle, ExportSummary};
pub use grid::{Grid, Tile, TileId, TileSize};
pub use selection::{DragPainter, PaintMode, Selection};
pub use session::Session;

use derive_more::{Deref, DerefMut, From};
use glam::UVec2;

pub trait Area {
    type Output;
    fn area(&self) -> Self::Output;
}

impl Area for GridSize {
    type Output = u32;

    fn area(&self) -> Self::Output {
        return self.x * self.y;
    }
}

/// Size of a grid in cells, `x` columns by `y` rows
#[derive(Deref, DerefMut, From, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridSize(pub UVec2);

impl GridSize {
    /// Cell locations in row-major order
    pub fn iter_locs(&self) -> impl Iterator<Item = UVec2> {
        return UVec2Iter::new(UVec2::ZERO, self.0);
    }
}

#[derive(Clone, Debug)]
pub struct UVec2Iter {
    pub cur: UVec2,
    pub end: UVec2,
}

impl UVec2Iter {
    pub fn new(start: UVec2, end: UVec2) -> Self {
        return Self { cur: start, end };
    }
}

impl Iterator for UVec2Iter {
    type Item = UVec2;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end.x == 0 || self.cur.y >= self.end.y {
            return None;
        }
        let ret = self.cur;
        self.cur.x += 1;
        if self.cur.x == self.end.x {
            self.cur.x = 0;
            self.cur.y += 1;
        }
        return Some(ret);
    }
}
