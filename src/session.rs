//! A running terrain session: sampler, grid, table and RNG together.
//!
//! Front ends (CLI export, interactive viewer) drive a session through the
//! two regeneration triggers: [`TerrainSession::regenerate`] for a new
//! random basis and [`TerrainSession::advance`] for moving along time.
//! Both rebuild the whole grid.

use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::GeneratorConfig;
use crate::generator::{GridError, RenderStats, TerrainGrid};
use crate::noise_sampler::{NoiseSampler, Sampler, TimeDirection};
use crate::render::RenderSink;
use crate::transitions::TransitionTable;

pub struct TerrainSession {
    sampler: Sampler,
    grid: TerrainGrid,
    table: TransitionTable,
    rng: ChaCha8Rng,
}

impl TerrainSession {
    /// Build a session and generate its first map.
    pub fn new(config: &GeneratorConfig, table: TransitionTable, seed: u64) -> Result<Self, GridError> {
        let mut session = Self {
            sampler: config.build_sampler(),
            grid: TerrainGrid::new(config.width, config.height)?,
            table,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        session.regenerate();
        Ok(session)
    }

    /// New random basis, then a full generation pass.
    pub fn regenerate(&mut self) {
        self.sampler.reseed(&mut self.rng);
        info!("regenerating: {}", self.sampler.describe());
        self.grid.generate(&self.sampler);
    }

    /// Move the time axis by `dt` seconds, then a full generation pass.
    pub fn advance(&mut self, dt: f64, direction: TimeDirection) {
        self.sampler.advance(dt, direction);
        self.grid.generate(&self.sampler);
    }

    pub fn render_into(&self, sink: &mut dyn RenderSink) -> Result<RenderStats, GridError> {
        self.grid.render_into(&self.table, sink)
    }

    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }
}
