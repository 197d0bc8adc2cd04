//! Sprite sheets and the image-compositing render sink.
//!
//! A sheet is sliced into equally sized tiles numbered row by row, so a
//! render command's image index is simply a position in that list. When no
//! sheet is available a palette sheet is synthesized with the same layout:
//! six 9-tile blocks, one per terrain class, base sprite in the middle.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, Pixel, Rgba, RgbaImage};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::RenderSink;
use crate::terrain::TerrainClass;

/// Tiles per class block in the sheet layout
pub const BLOCK_SIZE: i32 = 9;

#[derive(Debug, Error)]
pub enum TilesetError {
    #[error("failed to load tileset image: {0}")]
    Image(#[from] image::ImageError),
    #[error("tileset image {width}x{height} is smaller than one {tile_size}px tile")]
    TooSmall { width: u32, height: u32, tile_size: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilesetConfig {
    /// Sprite sheet path; a palette sheet is used when unset
    pub path: Option<PathBuf>,
    /// Tile edge length in pixels
    pub tile_size: u32,
    /// Pixels shared by neighboring tiles on the canvas
    pub overlap: u32,
}

impl Default for TilesetConfig {
    fn default() -> Self {
        Self {
            path: None,
            tile_size: 16,
            overlap: 1,
        }
    }
}

/// A sprite sheet sliced into individual tiles.
pub struct Tileset {
    tile_size: u32,
    tiles: Vec<RgbaImage>,
}

impl Tileset {
    /// Load the configured sheet, or synthesize the palette sheet.
    pub fn from_config(config: &TilesetConfig) -> Result<Self, TilesetError> {
        match &config.path {
            Some(path) => Self::load(path, config.tile_size),
            None => Ok(Self::palette(config.tile_size)),
        }
    }

    pub fn load(path: &Path, tile_size: u32) -> Result<Self, TilesetError> {
        let img = image::open(path)?;
        let tileset = Self::from_image(&img, tile_size)?;
        info!("loaded {} tiles from {}", tileset.len(), path.display());
        Ok(tileset)
    }

    /// Slice an image into `tile_size` squares, left to right, top to bottom.
    /// Partial tiles at the right and bottom edges are dropped.
    pub fn from_image(img: &DynamicImage, tile_size: u32) -> Result<Self, TilesetError> {
        let (width, height) = img.dimensions();
        let cols = width / tile_size.max(1);
        let rows = height / tile_size.max(1);
        if tile_size == 0 || cols == 0 || rows == 0 {
            return Err(TilesetError::TooSmall { width, height, tile_size });
        }

        let mut tiles = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                let tile = img
                    .crop_imm(col * tile_size, row * tile_size, tile_size, tile_size)
                    .to_rgba8();
                tiles.push(tile);
            }
        }

        Ok(Self { tile_size, tiles })
    }

    /// Flat-colored stand-in sheet. Transition variants leave the blended
    /// side transparent so the underlay shows through.
    pub fn palette(tile_size: u32) -> Self {
        let mut slots = vec![RgbaImage::new(tile_size, tile_size); (BLOCK_SIZE * 6) as usize];

        for class in TerrainClass::ALL {
            let color = class_color(class);
            for offset in -(BLOCK_SIZE / 2)..=(BLOCK_SIZE / 2) {
                let index = (class.base_index() + offset) as usize;
                if let Some(slot) = slots.get_mut(index) {
                    *slot = variant_tile(tile_size, color, offset);
                }
            }
        }

        Self { tile_size, tiles: slots }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get_tile(&self, index: i32) -> Option<&RgbaImage> {
        usize::try_from(index).ok().and_then(|i| self.tiles.get(i))
    }
}

/// Display color of a class in the palette sheet
pub fn class_color(class: TerrainClass) -> Rgba<u8> {
    match class {
        TerrainClass::DeepWater => Rgba([24, 52, 120, 255]),
        TerrainClass::ShallowWater => Rgba([52, 110, 190, 255]),
        TerrainClass::Sand => Rgba([222, 204, 140, 255]),
        TerrainClass::Grass => Rgba([84, 156, 64, 255]),
        TerrainClass::SoftMountain => Rgba([128, 112, 92, 255]),
        TerrainClass::HardMountain => Rgba([210, 210, 215, 255]),
    }
}

/// Split a sheet index into its class and variant offset.
/// Returns `None` for indices outside the six class blocks.
pub fn decode_index(image_index: i32) -> Option<(TerrainClass, i32)> {
    TerrainClass::ALL.into_iter().find_map(|class| {
        let offset = image_index - class.base_index();
        (offset.abs() <= BLOCK_SIZE / 2).then_some((class, offset))
    })
}

fn variant_tile(tile_size: u32, color: Rgba<u8>, offset: i32) -> RgbaImage {
    // Position inside the 3x3 block, (1, 1) being the base sprite
    let slot = offset + BLOCK_SIZE / 2;
    let (col, row) = (slot % 3, slot / 3);
    let band = (tile_size / 3).max(1);

    RgbaImage::from_fn(tile_size, tile_size, |px, py| {
        let clear_x = (col == 0 && px < band) || (col == 2 && px >= tile_size - band);
        let clear_y = (row == 0 && py < band) || (row == 2 && py >= tile_size - band);
        if clear_x || clear_y {
            Rgba([0, 0, 0, 0])
        } else {
            color
        }
    })
}

// =============================================================================
// CANVAS SINK
// =============================================================================

struct Placement {
    x: usize,
    y: usize,
    image_index: i32,
    depth: u8,
}

/// Render sink that composites placed tiles into one image.
///
/// Grid row 0 is the bottom of the picture. Deeper layers are drawn first.
pub struct TileCanvas<'a> {
    tileset: &'a Tileset,
    grid_width: usize,
    grid_height: usize,
    stride: u32,
    placements: Vec<Placement>,
}

impl<'a> TileCanvas<'a> {
    pub fn new(tileset: &'a Tileset, grid_width: usize, grid_height: usize, overlap: u32) -> Self {
        let stride = tileset.tile_size().saturating_sub(overlap).max(1);
        Self {
            tileset,
            grid_width,
            grid_height,
            stride,
            placements: Vec::with_capacity(grid_width * grid_height),
        }
    }

    /// Output image size in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        let extent = |cells: usize| self.stride * (cells.max(1) as u32 - 1) + self.tileset.tile_size();
        (extent(self.grid_width), extent(self.grid_height))
    }

    /// Drop all placements, ready for the next render pass.
    pub fn clear(&mut self) {
        self.placements.clear();
    }

    pub fn compose(&self) -> RgbaImage {
        let (width, height) = self.dimensions();
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));

        let mut order: Vec<&Placement> = self.placements.iter().collect();
        order.sort_by(|a, b| b.depth.cmp(&a.depth));

        let mut missing = 0usize;
        for p in order {
            let Some(tile) = self.tileset.get_tile(p.image_index) else {
                missing += 1;
                continue;
            };
            let px = p.x as u32 * self.stride;
            let py = (self.grid_height - 1 - p.y) as u32 * self.stride;
            draw_tile(&mut canvas, tile, px, py);
        }

        if missing > 0 {
            warn!("{} placements referenced tiles outside the {}-tile sheet", missing, self.tileset.len());
        }

        canvas
    }
}

// Opaque and fully transparent pixels are copied or skipped exactly; only
// partial alpha goes through blending.
fn draw_tile(canvas: &mut RgbaImage, tile: &RgbaImage, px: u32, py: u32) {
    for (tx, ty, pixel) in tile.enumerate_pixels() {
        let (cx, cy) = (px + tx, py + ty);
        if cx >= canvas.width() || cy >= canvas.height() {
            continue;
        }
        match pixel[3] {
            0 => {}
            255 => canvas.put_pixel(cx, cy, *pixel),
            _ => canvas.get_pixel_mut(cx, cy).blend(pixel),
        }
    }
}

impl RenderSink for TileCanvas<'_> {
    fn place(&mut self, (x, y): (usize, usize), image_index: i32, depth: u8) {
        self.placements.push(Placement { x, y, image_index, depth });
    }
}

/// Convert an RGBA canvas into the 0RGB buffer a framebuffer window expects.
pub fn to_argb_buffer(img: &RgbaImage) -> Vec<u32> {
    img.pixels()
        .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
        .collect()
}
