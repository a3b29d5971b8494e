use glam::{IVec2, UVec2};
use tile_select::{session::Sheet, Selection, TileId};

type Color = [u8; 4];

const BACKGROUND: Color = [0x33, 0x33, 0x33, 0xff];
const GRID_LINE: Color = [0x55, 0x55, 0x55, 0xff];
const SELECTED: Color = [0xff, 0x00, 0x00, 0xff];
const EMPTY_SHADE: Color = [0x00, 0x00, 0x00, 0xff];
const LABEL: Color = [0xff, 0xff, 0x00, 0xff];

/// Offset of an id label from the tile's top left corner
const LABEL_MARGIN: u32 = 2;
const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

/// 3x5 digit glyphs, one row per byte, high bit on the left
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b001, 0b001, 0b001],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Size of the whole sheet drawn at `scale`, or `None` if it doesn't fit in u32
pub fn frame_size(sheet: &Sheet, scale: u32) -> Option<UVec2> {
    let (width, height) = sheet.image.dimensions();
    return Some(UVec2::new(width.checked_mul(scale)?, height.checked_mul(scale)?));
}

/// Bytes needed for an rgba buffer of `size`
pub fn buffer_len(size: UVec2) -> Option<usize> {
    return (size.x as usize)
        .checked_mul(size.y as usize)?
        .checked_mul(4);
}

/// The part of the scaled sheet that is shown in the frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Size of the whole scaled sheet
    pub full: UVec2,
    /// Size of the frame buffer, never larger than `full`
    pub size: UVec2,
    /// Top left of the visible area within the scaled sheet
    pub offset: UVec2,
}

impl Viewport {
    pub fn new(full: UVec2, max: UVec2) -> Self {
        return Self {
            full,
            size: full.min(max).max(UVec2::ONE),
            offset: UVec2::ZERO,
        };
    }

    pub fn scroll_by(&mut self, delta: IVec2) {
        let scroll_axis = |offset: u32, delta: i32, full: u32, size: u32| -> u32 {
            let max = full.saturating_sub(size) as i64;
            (offset as i64 + delta as i64).clamp(0, max) as u32
        };
        self.offset = UVec2::new(
            scroll_axis(self.offset.x, delta.x, self.full.x, self.size.x),
            scroll_axis(self.offset.y, delta.y, self.full.y, self.size.y),
        );
    }

    /// Maps a frame buffer pixel to its position in the scaled sheet
    pub fn to_full(&self, buffer: UVec2) -> UVec2 {
        self.offset + buffer
    }
}

pub fn clear(frame: &mut [u8]) {
    for px in frame.chunks_exact_mut(4) {
        px.copy_from_slice(&BACKGROUND);
    }
}

/// Draws the visible part of the sheet with tile overlays on top.
///
/// `frame` must hold exactly `view.size` pixels, otherwise it is just cleared.
pub fn draw(frame: &mut [u8], sheet: &Sheet, selection: &Selection, scale: u32, view: &Viewport) {
    if buffer_len(view.size) != Some(frame.len()) {
        log::warn!("frame buffer does not match view size {}, skipping draw", view.size);
        clear(frame);
        return;
    }

    for (i, px) in frame.chunks_exact_mut(4).enumerate() {
        let buffer = UVec2::new(i as u32 % view.size.x, i as u32 / view.size.x);
        let color = pixel_at(sheet, selection, scale, view.to_full(buffer));
        px.copy_from_slice(&color);
    }
}

/// Color of the scaled sheet at `pos`
fn pixel_at(sheet: &Sheet, selection: &Selection, scale: u32, pos: UVec2) -> Color {
    let image_px = pos / scale;
    if image_px.x >= sheet.image.width() || image_px.y >= sheet.image.height() {
        return BACKGROUND;
    }
    let base = over_background(sheet.image.get_pixel(image_px.x, image_px.y).0);

    let grid = &sheet.grid;
    let Some(idx) = grid.index_at(image_px) else {
        return base;
    };
    let tile = &grid[idx];
    let extent = *grid.tile_size() * scale;
    let local = pos - tile.loc() * extent;

    if tile.is_empty {
        return if (pos.x + pos.y) % 2 == 0 {
            EMPTY_SHADE
        } else {
            base
        };
    }
    if tile.id.map_or(false, |id| label_covers(id, local)) {
        return LABEL;
    }
    let (color, thickness) = if selection.contains(idx) {
        (SELECTED, 2)
    } else {
        (GRID_LINE, 1)
    };
    if on_edge(local, extent, thickness) {
        return color;
    }
    return base;
}

fn over_background(src: Color) -> Color {
    let alpha = src[3] as u32;
    let mut out = BACKGROUND;
    for c in 0..3 {
        out[c] = ((src[c] as u32 * alpha + BACKGROUND[c] as u32 * (255 - alpha)) / 255) as u8;
    }
    return out;
}

fn on_edge(local: UVec2, extent: UVec2, thickness: u32) -> bool {
    let thickness = thickness.min(extent.x).min(extent.y);
    return local.x < thickness
        || local.y < thickness
        || local.x >= extent.x - thickness
        || local.y >= extent.y - thickness;
}

/// `i`th decimal digit of `id`, most significant first
fn nth_digit(id: TileId, i: u32) -> Option<usize> {
    let mut len = 1;
    let mut rest = id / 10;
    while rest > 0 {
        len += 1;
        rest /= 10;
    }
    if i >= len {
        return None;
    }
    return Some(id / 10usize.pow(len - 1 - i) % 10);
}

/// Whether the id label drawn in a tile covers the tile-local pixel `local`
fn label_covers(id: TileId, local: UVec2) -> bool {
    if local.x < LABEL_MARGIN || local.y < LABEL_MARGIN {
        return false;
    }
    let (lx, ly) = (local.x - LABEL_MARGIN, local.y - LABEL_MARGIN);
    if ly >= GLYPH_HEIGHT || lx % GLYPH_ADVANCE >= GLYPH_WIDTH {
        return false;
    }
    let Some(digit) = nth_digit(id, lx / GLYPH_ADVANCE) else {
        return false;
    };
    let row = DIGITS[digit][ly as usize];
    return row & (0b100 >> (lx % GLYPH_ADVANCE)) != 0;
}
