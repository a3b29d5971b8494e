use derive_more::Deref;
use glam::UVec2;
use image::{GenericImageView, ImageBuffer, ImageError, Rgba, RgbaImage, SubImage};
use std::{ops::Index, path::Path};

use crate::{
    error::{TileError, TileResult},
    Area, GridSize,
};

/// Sequential identifier given to each non-empty tile
pub type TileId = usize;

type TileSubImage<'a> = SubImage<&'a ImageBuffer<Rgba<u8>, Vec<u8>>>;

/// Width and height of a single tile in pixels. Never zero.
#[derive(Deref, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSize(UVec2);

impl TileSize {
    pub fn new(width: u32, height: u32) -> TileResult<Self> {
        if width == 0 || height == 0 {
            return Err(TileError::InvalidTileSize { width, height });
        }
        return Ok(Self(UVec2::new(width, height)));
    }

    pub fn width(&self) -> u32 {
        self.0.x
    }

    pub fn height(&self) -> u32 {
        self.0.y
    }
}

/// One tile_size rectangle of the source image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Row-major position among all tiles, empty ones included
    pub index: usize,
    pub row: u32,
    pub col: u32,
    /// Pixel offset of the top left corner
    pub x: u32,
    pub y: u32,
    pub is_empty: bool,
    /// `None` for empty tiles
    pub id: Option<TileId>,
}

impl Tile {
    pub fn loc(&self) -> UVec2 {
        UVec2::new(self.col, self.row)
    }
}

/// The tiles of a partitioned image in row-major order
#[derive(Debug, Clone)]
pub struct Grid {
    size: GridSize,
    tile_size: TileSize,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn rows(&self) -> u32 {
        self.size.y
    }

    pub fn cols(&self) -> u32 {
        self.size.x
    }

    pub fn tile_size(&self) -> TileSize {
        self.tile_size
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn non_empty_count(&self) -> usize {
        self.tiles.iter().filter(|tile| !tile.is_empty).count()
    }

    /// Index of the tile covering the pixel at `loc`, if any.
    /// Pixels in the trimmed remainder of the image belong to no tile.
    pub fn index_at(&self, loc: UVec2) -> Option<usize> {
        let cell = loc / *self.tile_size;
        if cell.x >= self.size.x || cell.y >= self.size.y {
            return None;
        }
        return Some((cell.y * self.size.x + cell.x) as usize);
    }
}

impl Index<usize> for Grid {
    type Output = Tile;
    fn index(&self, index: usize) -> &Self::Output {
        return &self.tiles[index];
    }
}

/// Decodes the image at `path` into rgba8.
///
/// The format is guessed from the file contents, so a mislabeled extension
/// still loads. Images without an alpha channel come back fully opaque.
pub fn load_image(path: impl AsRef<Path>) -> TileResult<RgbaImage> {
    let path = path.as_ref();
    let to_err = |source: ImageError| TileError::ImageLoad {
        path: path.to_path_buf(),
        source,
    };
    let reader = image::io::Reader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|err| to_err(ImageError::IoError(err)))?;
    let image = reader.decode().map_err(to_err)?;
    log::info!(
        "loaded {:?} ({}x{}, {:?})",
        path,
        image.width(),
        image.height(),
        image.color()
    );
    return Ok(image.to_rgba8());
}

/// Splits `image` into tiles and numbers the non-empty ones.
///
/// Edges that don't fill a whole tile are trimmed.
pub fn partition(image: &RgbaImage, tile_size: TileSize) -> Grid {
    let image_dims: UVec2 = image.dimensions().into();
    let size = GridSize(image_dims / *tile_size);
    let mut tiles = Vec::with_capacity(size.area() as usize);

    // incremented only for non-empty tiles so ids stay dense
    let mut current_id: TileId = 0;

    for loc in size.iter_locs() {
        let origin = loc * *tile_size;
        let is_empty = is_tile_empty(&sub_image_at(image, origin, tile_size));
        let id = if is_empty {
            None
        } else {
            let id = current_id;
            current_id += 1;
            Some(id)
        };
        tiles.push(Tile {
            index: tiles.len(),
            row: loc.y,
            col: loc.x,
            x: origin.x,
            y: origin.y,
            is_empty,
            id,
        });
    }

    log::debug!(
        "partitioned {}x{} image into {} rows x {} cols, {} non-empty",
        image_dims.x,
        image_dims.y,
        size.y,
        size.x,
        current_id
    );

    return Grid {
        size,
        tile_size,
        tiles,
    };
}

fn sub_image_at(image: &RgbaImage, loc: UVec2, tile_size: TileSize) -> TileSubImage<'_> {
    return image.view(loc.x, loc.y, tile_size.width(), tile_size.height());
}

/// A tile is empty when every pixel is fully transparent
fn is_tile_empty(tile: &TileSubImage<'_>) -> bool {
    return tile.pixels().all(|(_, _, px)| px[3] == 0);
}

#[cfg(test)]
mod test {
    use super::*;
    use image::{DynamicImage, RgbImage};

    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);
    const OPAQUE: Rgba<u8> = Rgba([200, 40, 40, 255]);

    fn size(w: u32, h: u32) -> TileSize {
        TileSize::new(w, h).expect("non-zero tile size")
    }

    /// Builds an image where the tile at (col,row) is opaque iff `filled(col,row)`
    fn tiled_image(cols: u32, rows: u32, tile: u32, filled: impl Fn(u32, u32) -> bool) -> RgbaImage {
        RgbaImage::from_fn(cols * tile, rows * tile, |x, y| {
            if filled(x / tile, y / tile) {
                OPAQUE
            } else {
                CLEAR
            }
        })
    }

    #[test]
    fn zero_tile_size_rejected() {
        assert!(matches!(
            TileSize::new(0, 16),
            Err(TileError::InvalidTileSize { width: 0, height: 16 })
        ));
        assert!(TileSize::new(16, 0).is_err());
    }

    #[test]
    fn tile_count_trims_remainder() {
        for (w, h) in [(32, 16), (33, 17), (47, 50), (16, 16), (100, 3)] {
            let image = RgbaImage::from_pixel(w, h, OPAQUE);
            let grid = partition(&image, size(16, 16));
            assert_eq!(grid.len() as u32, (w / 16) * (h / 16), "{w}x{h}");
            assert_eq!(grid.rows(), h / 16);
            assert_eq!(grid.cols(), w / 16);
        }
    }

    #[test]
    fn image_smaller_than_tile_is_empty_grid() {
        let image = RgbaImage::from_pixel(15, 40, OPAQUE);
        let grid = partition(&image, size(16, 16));
        assert!(grid.is_empty());
        assert_eq!(grid.non_empty_count(), 0);
    }

    #[test]
    fn transparent_first_tile_gets_no_id() {
        let image = tiled_image(2, 1, 16, |col, _| col == 1);
        let grid = partition(&image, size(16, 16));
        assert_eq!(grid.len(), 2);
        assert!(grid[0].is_empty);
        assert_eq!(grid[0].id, None);
        assert!(!grid[1].is_empty);
        assert_eq!(grid[1].id, Some(0));
    }

    #[test]
    fn single_visible_pixel_makes_tile_non_empty() {
        let mut image = RgbaImage::from_pixel(8, 8, CLEAR);
        image.put_pixel(7, 7, Rgba([0, 0, 0, 1]));
        let grid = partition(&image, size(4, 4));
        let empty: Vec<bool> = grid.tiles().iter().map(|t| t.is_empty).collect();
        assert_eq!(empty, vec![true, true, true, false]);
    }

    #[test]
    fn color_without_alpha_is_still_empty() {
        // rgb data but zero alpha everywhere
        let image = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 0]));
        let grid = partition(&image, size(4, 4));
        assert!(grid.tiles().iter().all(|t| t.is_empty));
    }

    #[test]
    fn ids_dense_and_increasing() {
        let image = tiled_image(5, 4, 2, |col, row| (col + row) % 3 != 0);
        let grid = partition(&image, size(2, 2));
        let ids: Vec<TileId> = grid.tiles().iter().filter_map(|t| t.id).collect();
        let expected: Vec<TileId> = (0..grid.non_empty_count()).collect();
        assert_eq!(ids, expected);
        for tile in grid.tiles() {
            assert_eq!(tile.is_empty, tile.id.is_none());
            assert_eq!(tile.is_empty, (tile.col + tile.row) % 3 == 0);
        }
    }

    #[test]
    fn tile_positions_row_major() {
        let image = RgbaImage::from_pixel(48, 32, OPAQUE);
        let grid = partition(&image, size(16, 16));
        let tile = &grid[4];
        assert_eq!(tile.index, 4);
        assert_eq!((tile.row, tile.col), (1, 1));
        assert_eq!((tile.x, tile.y), (16, 16));
        assert_eq!(tile.loc(), UVec2::new(1, 1));
    }

    #[test]
    fn non_square_tiles() {
        let image = RgbaImage::from_pixel(30, 30, OPAQUE);
        let grid = partition(&image, size(10, 15));
        assert_eq!((grid.rows(), grid.cols()), (2, 3));
        assert_eq!((grid[5].x, grid[5].y), (20, 15));
    }

    #[test]
    fn index_at_uses_tile_arithmetic() {
        let image = RgbaImage::from_pixel(50, 40, OPAQUE);
        let grid = partition(&image, size(16, 16));
        assert_eq!(grid.index_at(UVec2::new(0, 0)), Some(0));
        assert_eq!(grid.index_at(UVec2::new(17, 3)), Some(1));
        assert_eq!(grid.index_at(UVec2::new(47, 31)), Some(5));
        // trimmed remainder
        assert_eq!(grid.index_at(UVec2::new(48, 0)), None);
        assert_eq!(grid.index_at(UVec2::new(0, 32)), None);
    }

    #[test]
    fn opaque_source_without_alpha_channel() {
        let rgb = DynamicImage::ImageRgb8(RgbImage::new(32, 32));
        let grid = partition(&rgb.to_rgba8(), size(16, 16));
        assert_eq!(grid.non_empty_count(), 4);
    }

    #[test]
    fn load_missing_file_is_image_load_error() {
        let path = std::env::temp_dir().join("tile-select-does-not-exist.png");
        let err = load_image(&path).unwrap_err();
        assert!(matches!(err, TileError::ImageLoad { .. }));
    }

    #[test]
    fn load_garbage_is_image_load_error() {
        let path = std::env::temp_dir().join("tile-select-garbage.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        let err = load_image(&path).unwrap_err();
        assert!(matches!(err, TileError::ImageLoad { .. }));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_png_round_trip() {
        let path = std::env::temp_dir().join("tile-select-load.png");
        tiled_image(2, 2, 8, |col, row| col == row).save(&path).unwrap();
        let image = load_image(&path).unwrap();
        let grid = partition(&image, size(8, 8));
        let ids: Vec<Option<TileId>> = grid.tiles().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![Some(0), None, None, Some(1)]);
        std::fs::remove_file(&path).ok();
    }
}
