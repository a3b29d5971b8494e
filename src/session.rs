use glam::UVec2;
use image::RgbaImage;
use std::path::{Path, PathBuf};

use crate::{
    config::Config,
    error::{TileError, TileResult},
    export::{self, ExportSummary},
    grid::{self, Grid, TileSize},
    selection::{DragPainter, Selection},
};

/// An image that has been loaded and split into tiles
#[derive(Debug, Clone)]
pub struct Sheet {
    pub path: PathBuf,
    pub image: RgbaImage,
    pub grid: Grid,
}

/// Everything the frontend needs short of drawing.
///
/// Pointer positions are given in image pixels; converting from window
/// coordinates is the frontend's job.
#[derive(Debug)]
pub struct Session {
    config: Config,
    tile_size: TileSize,
    sheet: Option<Sheet>,
    selection: Selection,
    painter: DragPainter,
}

impl Session {
    pub fn new(config: Config) -> TileResult<Self> {
        let tile_size = config.tile_size()?;
        return Ok(Self {
            config,
            tile_size,
            sheet: None,
            selection: Selection::new(),
            painter: DragPainter::new(),
        });
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sheet(&self) -> Option<&Sheet> {
        self.sheet.as_ref()
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.sheet.as_ref().map(|sheet| &sheet.grid)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Loads and partitions the image at `path`.
    /// On failure the current sheet and selection are kept.
    pub fn load(&mut self, path: impl AsRef<Path>) -> TileResult<()> {
        let path = path.as_ref();
        let image = grid::load_image(path)?;
        self.load_image(path, image);
        return Ok(());
    }

    /// Replaces the sheet with an already decoded image
    pub fn load_image(&mut self, path: impl Into<PathBuf>, image: RgbaImage) {
        let grid = grid::partition(&image, self.tile_size);
        let path = path.into();
        log::info!(
            "sheet {:?}: {} tiles, {} non-empty",
            path,
            grid.len(),
            grid.non_empty_count()
        );
        self.sheet = Some(Sheet { path, image, grid });
        self.selection = Selection::new();
        self.painter.release();
    }

    fn tile_at(&self, pixel: UVec2) -> Option<usize> {
        return self.grid()?.index_at(pixel);
    }

    /// Starts a paint gesture at `pixel`. Returns whether the selection changed.
    pub fn press_at(&mut self, pixel: UVec2) -> bool {
        let Some(idx) = self.tile_at(pixel) else {
            return false;
        };
        let Some(sheet) = &self.sheet else {
            return false;
        };
        let before = self.selection.len();
        self.painter.press(&sheet.grid, &mut self.selection, idx);
        return before != self.selection.len();
    }

    /// Continues the current gesture. Returns whether the selection changed.
    pub fn drag_at(&mut self, pixel: UVec2) -> bool {
        let Some(idx) = self.tile_at(pixel) else {
            return false;
        };
        let Some(sheet) = &self.sheet else {
            return false;
        };
        let before = self.selection.len();
        self.painter.drag(&sheet.grid, &mut self.selection, idx);
        return before != self.selection.len();
    }

    pub fn release(&mut self) {
        self.painter.release();
    }

    pub fn is_painting(&self) -> bool {
        self.painter.is_painting()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        log::debug!("selection cleared");
    }

    /// Writes the selection to `path` in the configured export format
    pub fn export_to(&self, path: impl AsRef<Path>) -> TileResult<ExportSummary> {
        let Some(sheet) = &self.sheet else {
            return Err(TileError::EmptySelection);
        };
        return export::write_export(&sheet.grid, &self.selection, &self.config.export, path);
    }

    pub fn status(&self) -> String {
        let Some(sheet) = &self.sheet else {
            return String::from("Load an image to begin");
        };
        let name = sheet
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| sheet.path.display().to_string());
        return format!(
            "Loaded: {} | {} tiles, {} non-empty | {} selected | IDs start at 0",
            name,
            sheet.grid.len(),
            sheet.grid.non_empty_count(),
            self.selection.len()
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgba;

    /// 2x2 tiles of 16px, top left transparent
    fn sheet_image() -> RgbaImage {
        RgbaImage::from_fn(32, 32, |x, y| {
            if x < 16 && y < 16 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([10, 20, 30, 255])
            }
        })
    }

    fn loaded() -> Session {
        let mut session = Session::new(Config::default()).unwrap();
        session.load_image("sheet.png", sheet_image());
        session
    }

    #[test]
    fn invalid_tile_size_rejected() {
        let config = Config {
            tile_width: 0,
            ..Default::default()
        };
        assert!(Session::new(config).is_err());
    }

    #[test]
    fn status_reports_counts() {
        let mut session = Session::new(Config::default()).unwrap();
        assert_eq!(session.status(), "Load an image to begin");
        session.load_image("dir/sheet.png", sheet_image());
        session.press_at(UVec2::new(20, 20));
        assert_eq!(
            session.status(),
            "Loaded: sheet.png | 4 tiles, 3 non-empty | 1 selected | IDs start at 0"
        );
    }

    #[test]
    fn pointer_before_load_is_ignored() {
        let mut session = Session::new(Config::default()).unwrap();
        assert!(!session.press_at(UVec2::ZERO));
        assert!(!session.drag_at(UVec2::ZERO));
        assert!(matches!(
            session.export_to(std::env::temp_dir().join("tile-select-unused.txt")),
            Err(TileError::EmptySelection)
        ));
    }

    #[test]
    fn drag_paints_across_tiles() {
        let mut session = loaded();
        assert!(session.press_at(UVec2::new(17, 0)));
        assert!(session.is_painting());
        // same tile again
        assert!(!session.drag_at(UVec2::new(30, 10)));
        assert!(session.drag_at(UVec2::new(5, 20)));
        assert!(session.drag_at(UVec2::new(25, 25)));
        // outside the grid
        assert!(!session.drag_at(UVec2::new(40, 40)));
        session.release();
        let selected: Vec<usize> = session.selection().iter().collect();
        assert_eq!(selected, vec![1, 2, 3]);

        // a new gesture on a selected tile removes
        session.press_at(UVec2::new(25, 25));
        session.drag_at(UVec2::new(5, 20));
        session.release();
        let selected: Vec<usize> = session.selection().iter().collect();
        assert_eq!(selected, vec![1]);
    }

    #[test]
    fn clear_then_export_fails() {
        let mut session = loaded();
        session.press_at(UVec2::new(20, 20));
        session.release();
        session.clear_selection();
        let path = std::env::temp_dir().join("tile-select-session-cleared.txt");
        std::fs::remove_file(&path).ok();
        assert!(matches!(
            session.export_to(&path),
            Err(TileError::EmptySelection)
        ));
        assert!(!path.exists());
    }

    #[test]
    fn export_selection() {
        let mut session = loaded();
        session.press_at(UVec2::new(20, 0));
        session.drag_at(UVec2::new(0, 20));
        session.release();
        let path = std::env::temp_dir().join("tile-select-session-export.txt");
        let summary = session.export_to(&path).unwrap();
        assert_eq!((summary.height, summary.width), (2, 2));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "private int[,] item = {\n    {-1, 0},\n    {1, -1}\n};"
        );
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn new_image_replaces_selection() {
        let mut session = loaded();
        session.press_at(UVec2::new(20, 20));
        assert_eq!(session.selection().len(), 1);
        session.load_image("other.png", sheet_image());
        assert!(session.selection().is_empty());
        assert!(!session.is_painting());
    }

    #[test]
    fn failed_load_keeps_state() {
        let mut session = loaded();
        session.press_at(UVec2::new(20, 20));
        session.release();
        let missing = std::env::temp_dir().join("tile-select-session-missing.png");
        let err = session.load(&missing).unwrap_err();
        assert!(matches!(err, TileError::ImageLoad { .. }));
        assert_eq!(session.sheet().unwrap().path, PathBuf::from("sheet.png"));
        assert_eq!(session.selection().len(), 1);
    }
}
