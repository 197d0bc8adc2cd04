//! Terrain grid: noise classification and transition-aware rendering.
//!
//! Generation fills every cell from a [`NoiseSampler`]; rendering walks the
//! classified grid and, for each cell whose class blends toward a lower one,
//! builds a 3x3 [`NeighborMask`] and resolves it to a sprite variant through
//! a [`TransitionTable`].

use log::debug;
use thiserror::Error;

use crate::noise_sampler::NoiseSampler;
use crate::render::{CommandBuffer, RenderCommand, RenderSink, PRIMARY_DEPTH, UNDERLAY_DEPTH};
use crate::terrain::{TerrainClass, ThresholdPreset};
use crate::tilemap::Tilemap;
use crate::transitions::{NeighborMask, TransitionTable};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    ZeroSize { width: usize, height: usize },
    #[error("terrain has not been generated yet")]
    NotGenerated,
}

/// Sprites resolved for a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellTiles {
    /// Sprite drawn at the cell's own depth
    pub primary: i32,
    /// Lower-class sprite drawn behind a transition variant
    pub underlay: Option<i32>,
}

/// Counts from one render pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub cells: usize,
    pub transitions: usize,
}

/// Fixed-size grid of terrain classes.
///
/// Starts uninitialized; the first [`generate`](Self::generate) makes it
/// ready and every later call overwrites the whole grid.
pub struct TerrainGrid {
    width: usize,
    height: usize,
    tiles: Option<Tilemap<TerrainClass>>,
}

impl TerrainGrid {
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroSize { width, height });
        }
        Ok(Self { width, height, tiles: None })
    }

    /// Wrap an already classified map. The grid is ready immediately.
    pub fn from_classes(tiles: Tilemap<TerrainClass>) -> Result<Self, GridError> {
        let mut grid = Self::new(tiles.width, tiles.height)?;
        grid.tiles = Some(tiles);
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_ready(&self) -> bool {
        self.tiles.is_some()
    }

    /// Classified cells, `None` before the first generation.
    pub fn classes(&self) -> Option<&Tilemap<TerrainClass>> {
        self.tiles.as_ref()
    }

    /// Classify every cell using the sampler's own threshold preset.
    pub fn generate(&mut self, sampler: &dyn NoiseSampler) {
        self.generate_with_preset(sampler, sampler.preset());
    }

    /// Classify every cell with an explicit threshold preset.
    pub fn generate_with_preset(&mut self, sampler: &dyn NoiseSampler, preset: ThresholdPreset) {
        let mut tiles = Tilemap::new(self.width, self.height);
        let (w, h) = (self.width as f64, self.height as f64);

        for (x, y, cell) in tiles.iter_mut() {
            let noise = sampler.sample(x as f64 / w, y as f64 / h);
            *cell = preset.classify(noise);
        }

        debug!("generated {}x{} terrain with {:?}", self.width, self.height, preset);
        self.tiles = Some(tiles);
    }

    /// Mask of 3x3 positions around `(x, y)` holding `target`.
    /// Positions outside the grid never match.
    pub fn neighbor_mask(&self, x: usize, y: usize, target: TerrainClass) -> Result<NeighborMask, GridError> {
        let tiles = self.tiles.as_ref().ok_or(GridError::NotGenerated)?;
        Ok(mask_around(tiles, x, y, target))
    }

    /// Sprites for one cell.
    pub fn cell_tiles(&self, x: usize, y: usize, table: &TransitionTable) -> Result<CellTiles, GridError> {
        let tiles = self.tiles.as_ref().ok_or(GridError::NotGenerated)?;
        Ok(resolve_cell(tiles, x, y, table))
    }

    /// Render the grid into a list of commands.
    pub fn render(&self, table: &TransitionTable) -> Result<Vec<RenderCommand>, GridError> {
        let mut buffer = CommandBuffer::with_capacity(self.width * self.height);
        self.render_into(table, &mut buffer)?;
        Ok(buffer.commands)
    }

    /// Render the grid into a sink. Underlays are placed before the primary
    /// tile of the same cell.
    pub fn render_into(&self, table: &TransitionTable, sink: &mut dyn RenderSink) -> Result<RenderStats, GridError> {
        let tiles = self.tiles.as_ref().ok_or(GridError::NotGenerated)?;
        let mut stats = RenderStats::default();

        for x in 0..self.width {
            for y in 0..self.height {
                let cell = resolve_cell(tiles, x, y, table);
                if let Some(underlay) = cell.underlay {
                    sink.place((x, y), underlay, UNDERLAY_DEPTH);
                    stats.transitions += 1;
                }
                sink.place((x, y), cell.primary, PRIMARY_DEPTH);
                stats.cells += 1;
            }
        }

        debug!("rendered {} cells, {} transitions", stats.cells, stats.transitions);
        Ok(stats)
    }
}

fn mask_around(tiles: &Tilemap<TerrainClass>, x: usize, y: usize, target: TerrainClass) -> NeighborMask {
    NeighborMask::from_fn(|dx, dy| tiles.get_offset(x, y, dx, dy) == Some(&target))
}

fn resolve_cell(tiles: &Tilemap<TerrainClass>, x: usize, y: usize, table: &TransitionTable) -> CellTiles {
    let class = *tiles.get(x, y);
    let base = class.base_index();

    let Some(target) = class.lower() else {
        return CellTiles { primary: base, underlay: None };
    };

    let offset = table.resolve(mask_around(tiles, x, y, target));
    if offset == 0 {
        CellTiles { primary: base, underlay: None }
    } else {
        CellTiles {
            primary: base + offset,
            underlay: Some(target.base_index()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise_sampler::{FractalParams, FractalSampler, TimeAxis};
    use rand::RngCore;

    /// Returns the x coordinate, for checking normalization.
    struct RampSampler;

    impl NoiseSampler for RampSampler {
        fn sample(&self, x: f64, _y: f64) -> f64 {
            x
        }
        fn preset(&self) -> ThresholdPreset {
            ThresholdPreset::UnitRange
        }
        fn reseed(&mut self, _rng: &mut dyn RngCore) {}
    }

    fn sand_with_water_center() -> TerrainGrid {
        let mut map = Tilemap::new_with(3, 3, TerrainClass::Sand);
        map.set(1, 1, TerrainClass::ShallowWater);
        TerrainGrid::from_classes(map).unwrap()
    }

    #[test]
    fn test_zero_size_is_rejected() {
        assert_eq!(TerrainGrid::new(0, 4).err(), Some(GridError::ZeroSize { width: 0, height: 4 }));
    }

    #[test]
    fn test_render_before_generate_fails() {
        let grid = TerrainGrid::new(4, 4).unwrap();
        assert!(!grid.is_ready());
        assert_eq!(grid.render(&TransitionTable::constant()), Err(GridError::NotGenerated));
    }

    #[test]
    fn test_generate_normalizes_coordinates() {
        let mut grid = TerrainGrid::new(10, 2).unwrap();
        grid.generate(&RampSampler);
        let classes = grid.classes().unwrap();

        // x = i / 10 against the unit bands
        assert_eq!(*classes.get(0, 0), TerrainClass::DeepWater);
        assert_eq!(*classes.get(2, 1), TerrainClass::ShallowWater);
        assert_eq!(*classes.get(3, 0), TerrainClass::Sand);
        assert_eq!(*classes.get(4, 0), TerrainClass::Grass);
        assert_eq!(*classes.get(6, 1), TerrainClass::SoftMountain);
        assert_eq!(*classes.get(9, 0), TerrainClass::HardMountain);
    }

    #[test]
    fn test_generate_overwrites_whole_grid() {
        let mut grid = TerrainGrid::from_classes(Tilemap::new_with(5, 5, TerrainClass::Grass)).unwrap();
        grid.generate_with_preset(&RampSampler, ThresholdPreset::FractalRange);
        // Ramp stays in [0, 1) which the fractal bands never map to Grass at x < 0.4
        assert_eq!(*grid.classes().unwrap().get(0, 3), TerrainClass::ShallowWater);
        assert!(grid.is_ready());
    }

    #[test]
    fn test_fractal_generation_is_deterministic() {
        let time = TimeAxis { origin: 42.0, offset: 0.25 };
        let sampler_a = FractalSampler::with_time(FractalParams::default(), time);
        let sampler_b = FractalSampler::with_time(FractalParams::default(), time);

        let mut a = TerrainGrid::new(32, 24).unwrap();
        let mut b = TerrainGrid::new(32, 24).unwrap();
        a.generate(&sampler_a);
        b.generate(&sampler_b);
        assert_eq!(a.classes(), b.classes());

        // Regenerating in place gives the same grid again
        a.generate(&sampler_a);
        assert_eq!(a.classes(), b.classes());
    }

    #[test]
    fn test_sand_ring_around_shallow_water() {
        let grid = sand_with_water_center();
        let table = TransitionTable::constant();
        let water = TerrainClass::ShallowWater.base_index();
        let sand = TerrainClass::Sand.base_index();

        // (x, y, mask bits, expected offset)
        let expected = [
            (0, 0, 256, -2),
            (1, 0, 32, -3),
            (2, 0, 4, -4),
            (0, 1, 128, 1),
            (2, 1, 2, -1),
            (0, 2, 64, 4),
            (1, 2, 8, 3),
            (2, 2, 1, 2),
        ];

        for (x, y, bits, offset) in expected {
            let mask = grid.neighbor_mask(x, y, TerrainClass::ShallowWater).unwrap();
            assert_eq!(mask.bits(), bits, "mask at ({x}, {y})");
            let cell = grid.cell_tiles(x, y, &table).unwrap();
            assert_eq!(cell.primary, sand + offset, "primary at ({x}, {y})");
            assert_eq!(cell.underlay, Some(water), "underlay at ({x}, {y})");
        }

        // Shallow water blends toward deep water, which is absent
        let center = grid.cell_tiles(1, 1, &table).unwrap();
        assert_eq!(center, CellTiles { primary: water, underlay: None });
    }

    #[test]
    fn test_underlay_precedes_primary_and_only_for_transitions() {
        let grid = sand_with_water_center();
        let commands = grid.render(&TransitionTable::constant()).unwrap();

        // 9 primaries plus 8 underlays
        assert_eq!(commands.len(), 17);
        assert_eq!(commands.iter().filter(|c| c.is_underlay()).count(), 8);

        for (i, cmd) in commands.iter().enumerate() {
            if cmd.is_underlay() {
                let next = commands[i + 1];
                assert_eq!((next.x, next.y, next.depth), (cmd.x, cmd.y, PRIMARY_DEPTH));
                assert_ne!(next.image_index, TerrainClass::Sand.base_index());
            }
        }
    }

    #[test]
    fn test_unmatched_masks_draw_base_sprite() {
        let grid = sand_with_water_center();
        let table = TransitionTable::parse("128 1").unwrap();
        let mut buffer = CommandBuffer::default();
        let stats = grid.render_into(&table, &mut buffer).unwrap();

        assert_eq!(stats, RenderStats { cells: 9, transitions: 1 });
        assert_eq!(buffer.primary_at(0, 1).unwrap().image_index, 23);
        assert!(buffer.underlay_at(0, 1).is_some());
        assert_eq!(buffer.primary_at(0, 0).unwrap().image_index, 22);
        assert!(buffer.underlay_at(0, 0).is_none());
    }

    #[test]
    fn test_uniform_grid_has_no_underlays() {
        for class in TerrainClass::ALL {
            let mut map = Tilemap::new(4, 3);
            map.fill(class);
            let grid = TerrainGrid::from_classes(map).unwrap();
            let commands = grid.render(&TransitionTable::constant()).unwrap();

            assert_eq!(commands.len(), 12);
            assert!(commands.iter().all(|c| !c.is_underlay()));
            assert!(commands.iter().all(|c| c.image_index == class.base_index()));
        }
    }

    #[test]
    fn test_edge_cells_see_out_of_bounds_as_unmatched() {
        // A single column: every cell sits on an edge
        let mut map = Tilemap::new_with(1, 3, TerrainClass::Grass);
        map.set(0, 0, TerrainClass::Sand);
        let grid = TerrainGrid::from_classes(map).unwrap();

        assert_eq!(grid.neighbor_mask(0, 1, TerrainClass::Sand).unwrap().bits(), 8);
        assert_eq!(grid.neighbor_mask(0, 2, TerrainClass::Sand).unwrap().bits(), 0);

        let commands = grid.render(&TransitionTable::constant()).unwrap();
        assert_eq!(commands.len(), 4);
    }

    #[test]
    fn test_deep_water_never_transitions() {
        let mut map = Tilemap::new_with(3, 3, TerrainClass::ShallowWater);
        map.set(1, 1, TerrainClass::DeepWater);
        let grid = TerrainGrid::from_classes(map).unwrap();
        let cell = grid.cell_tiles(1, 1, &TransitionTable::constant()).unwrap();
        assert_eq!(cell, CellTiles { primary: 49, underlay: None });

        // The shallow ring does blend toward it
        let corner = grid.cell_tiles(0, 0, &TransitionTable::constant()).unwrap();
        assert_eq!(corner, CellTiles { primary: 4 - 2, underlay: Some(49) });
    }
}
