use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{
    error::{TileError, TileResult},
    grid::{Grid, TileId},
    selection::Selection,
};

/// Written for positions in the bounding box with no selected tile
pub const SENTINEL: i64 = -1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStyle {
    /// `private int[,] item = { {..}, {..} };`
    #[default]
    CSharp,
    /// `const ITEM: [[i32; W]; H] = [ [..], [..], ];`
    Rust,
    /// one comma separated line per row
    Csv,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportFormat {
    pub style: ExportStyle,
    /// Variable name used in the declaration
    pub name: String,
}

impl Default for ExportFormat {
    fn default() -> Self {
        return Self {
            style: ExportStyle::default(),
            name: String::from("item"),
        };
    }
}

/// The bounding box of a selection, holding the id of each selected tile
/// at its position relative to the box's top left corner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportMatrix {
    width: usize,
    height: usize,
    cells: Vec<Option<TileId>>,
}

impl ExportMatrix {
    pub fn build(grid: &Grid, selection: &Selection) -> TileResult<Self> {
        let mut tiles = selection.tiles(grid).peekable();
        let Some(first) = tiles.peek() else {
            return Err(TileError::EmptySelection);
        };

        let (mut min_row, mut max_row) = (first.row, first.row);
        let (mut min_col, mut max_col) = (first.col, first.col);
        for tile in selection.tiles(grid) {
            min_row = min_row.min(tile.row);
            max_row = max_row.max(tile.row);
            min_col = min_col.min(tile.col);
            max_col = max_col.max(tile.col);
        }

        let height = (max_row - min_row + 1) as usize;
        let width = (max_col - min_col + 1) as usize;
        let mut cells = vec![None; width * height];

        for tile in tiles {
            let rel_row = (tile.row - min_row) as usize;
            let rel_col = (tile.col - min_col) as usize;
            cells[rel_row * width + rel_col] = tile.id;
        }

        return Ok(Self {
            width,
            height,
            cells,
        });
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, row: usize, col: usize) -> Option<TileId> {
        if row >= self.height || col >= self.width {
            return None;
        }
        return self.cells[row * self.width + col];
    }

    /// Cell values with the sentinel in place of unselected positions
    pub fn rows(&self) -> impl Iterator<Item = Vec<i64>> + '_ {
        return self.cells.chunks(self.width).map(|row| {
            row.iter()
                .map(|cell| cell.map_or(SENTINEL, |id| id as i64))
                .collect()
        });
    }

    pub fn render(&self, format: &ExportFormat) -> String {
        let rows: Vec<String> = self
            .rows()
            .map(|row| {
                row.iter()
                    .map(|value| value.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .collect();

        return match format.style {
            ExportStyle::CSharp => {
                let lines: Vec<String> = rows.iter().map(|row| format!("    {{{row}}}")).collect();
                format!(
                    "private int[,] {} = {{\n{}\n}};",
                    format.name,
                    lines.join(",\n")
                )
            }
            ExportStyle::Rust => {
                let mut out = format!(
                    "const {}: [[i32; {}]; {}] = [\n",
                    format.name.to_uppercase(),
                    self.width,
                    self.height
                );
                for row in &rows {
                    out.push_str(&format!("    [{row}],\n"));
                }
                out.push_str("];\n");
                out
            }
            ExportStyle::Csv => {
                let mut out = rows.join("\n");
                out.push('\n');
                out
            }
        };
    }
}

/// What was written by [`write_export`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
}

/// Renders the selection's bounding box as an array literal
pub fn export(grid: &Grid, selection: &Selection, format: &ExportFormat) -> TileResult<String> {
    let matrix = ExportMatrix::build(grid, selection)?;
    return Ok(matrix.render(format));
}

/// Renders the selection and writes it to `path` as utf-8 text.
///
/// Nothing is written if the selection is empty.
pub fn write_export(
    grid: &Grid,
    selection: &Selection,
    format: &ExportFormat,
    path: impl AsRef<Path>,
) -> TileResult<ExportSummary> {
    let path = path.as_ref();
    let matrix = ExportMatrix::build(grid, selection)?;
    let text = matrix.render(format);
    std::fs::write(path, text).map_err(|source| TileError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(
        "exported {}x{} matrix ({} tiles) to {:?}",
        matrix.height(),
        matrix.width(),
        selection.len(),
        path
    );
    return Ok(ExportSummary {
        path: path.to_path_buf(),
        width: matrix.width(),
        height: matrix.height(),
    });
}
