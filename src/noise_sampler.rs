//! Noise strategies feeding terrain classification.
//!
//! Two interchangeable samplers share the [`NoiseSampler`] interface:
//! - [`FractalSampler`]: multi-octave 3D Perlin over (x, y, time), roughly [-2, 2]
//! - [`PowerSampler`]: single-octave 2D Perlin in [0, 1] raised to a random power
//!
//! Per-regeneration randomness always comes from an injected RNG so that
//! generation stays reproducible under a seeded source.

use log::debug;
use noise::{NoiseFn, Perlin};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::terrain::ThresholdPreset;

/// Range the fractal time origin is drawn from on regeneration
const TIME_ORIGIN_RANGE: f64 = 256.0;

// =============================================================================
// SAMPLER INTERFACE
// =============================================================================

/// Direction the time axis moves in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeDirection {
    Forward,
    Backward,
}

impl TimeDirection {
    fn sign(self) -> f64 {
        match self {
            TimeDirection::Forward => 1.0,
            TimeDirection::Backward => -1.0,
        }
    }
}

/// A scalar noise source over normalized map coordinates.
pub trait NoiseSampler {
    /// Sample at normalized coordinates `x, y ∈ [0, 1]`.
    fn sample(&self, x: f64, y: f64) -> f64;

    /// Threshold preset matching this sampler's output domain.
    fn preset(&self) -> ThresholdPreset;

    /// Pick a new random basis for the next regeneration.
    fn reseed(&mut self, rng: &mut dyn RngCore);

    /// Move along the time axis. Samplers without one ignore this.
    fn advance(&mut self, _dt: f64, _direction: TimeDirection) {}
}

// =============================================================================
// FRACTAL SAMPLER
// =============================================================================

/// Parameters for fractal (fBm-style) 3D noise
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalParams {
    /// Number of noise octaves
    pub octaves: u32,
    /// Frequency multiplier for the first octave
    pub base_frequency: f64,
    /// Amplitude decay per octave
    pub persistence: f64,
    /// Frequency multiplier per octave
    pub lacunarity: f64,
    /// Amplitude of the first octave
    pub amplitude: f64,
    /// Feature size in normalized map units (smaller = busier map)
    pub domain_scale: f64,
    /// Perlin permutation seed, fixed for the sampler's lifetime
    pub seed: u32,
    /// Time units travelled per second of `advance`
    pub time_scale: f64,
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            octaves: 2,
            base_frequency: 1.0,
            persistence: 0.5,
            lacunarity: 2.0,
            amplitude: 1.75,
            domain_scale: 0.25,
            seed: 0,
            time_scale: 0.15,
        }
    }
}

/// Position on the fractal sampler's third axis.
///
/// Regeneration moves the origin; advancing or rewinding moves the offset.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimeAxis {
    pub origin: f64,
    pub offset: f64,
}

impl TimeAxis {
    pub fn value(&self) -> f64 {
        self.origin + self.offset
    }
}

/// Multi-octave 3D Perlin noise. A pure function of (x, y, time).
pub struct FractalSampler {
    params: FractalParams,
    perlin: Perlin,
    time: TimeAxis,
}

impl FractalSampler {
    pub fn new(params: FractalParams) -> Self {
        let perlin = Perlin::new(params.seed);
        Self {
            params,
            perlin,
            time: TimeAxis::default(),
        }
    }

    /// Create with an explicit time position.
    pub fn with_time(params: FractalParams, time: TimeAxis) -> Self {
        let mut sampler = Self::new(params);
        sampler.time = time;
        sampler
    }

    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    pub fn time(&self) -> TimeAxis {
        self.time
    }

    fn fractal(&self, x: f64, y: f64, z: f64) -> f64 {
        let p = &self.params;
        let mut total = 0.0;
        let mut amplitude = p.amplitude;
        let mut frequency = p.base_frequency / (p.domain_scale + 0.01);

        for _ in 0..p.octaves {
            total += amplitude * self.perlin.get([x * frequency, y * frequency, z * frequency]);
            amplitude *= p.persistence;
            frequency *= p.lacunarity;
        }

        total
    }
}

impl NoiseSampler for FractalSampler {
    fn sample(&self, x: f64, y: f64) -> f64 {
        self.fractal(x, y, self.time.value())
    }

    fn preset(&self) -> ThresholdPreset {
        ThresholdPreset::FractalRange
    }

    fn reseed(&mut self, rng: &mut dyn RngCore) {
        self.time = TimeAxis {
            origin: rng.gen_range(0.0..TIME_ORIGIN_RANGE),
            offset: 0.0,
        };
        debug!("fractal time origin reset to {:.3}", self.time.origin);
    }

    fn advance(&mut self, dt: f64, direction: TimeDirection) {
        self.time.offset += dt * self.params.time_scale * direction.sign();
    }
}

// =============================================================================
// POWER SAMPLER
// =============================================================================

/// Parameters for power-biased unit noise
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerParams {
    /// Noise frequency across the whole map
    pub scale: f64,
    /// Exponents drawn from uniformly on every regeneration
    pub exponents: Vec<i32>,
    /// Sampling window origins are drawn from `[0, offset_range)` on both axes
    pub offset_range: f64,
    /// Perlin permutation seed
    pub seed: u32,
}

impl Default for PowerParams {
    fn default() -> Self {
        Self {
            scale: 4.0,
            exponents: vec![1, 2, 3],
            offset_range: 256.0,
            seed: 0,
        }
    }
}

/// Single-octave 2D Perlin in [0, 1] raised to a per-regeneration power.
pub struct PowerSampler {
    params: PowerParams,
    perlin: Perlin,
    origin: (f64, f64),
    exponent: i32,
}

impl PowerSampler {
    /// Create a sampler at origin (0, 0) using the first configured exponent.
    /// Call [`NoiseSampler::reseed`] to randomize before generating.
    pub fn new(params: PowerParams) -> Self {
        let perlin = Perlin::new(params.seed);
        let exponent = params.exponents.first().copied().unwrap_or(1);
        Self {
            params,
            perlin,
            origin: (0.0, 0.0),
            exponent,
        }
    }

    pub fn params(&self) -> &PowerParams {
        &self.params
    }

    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }
}

impl NoiseSampler for PowerSampler {
    fn sample(&self, x: f64, y: f64) -> f64 {
        let (ox, oy) = self.origin;
        let s = self.params.scale;
        let raw = self.perlin.get([ox + x * s, oy + y * s]);
        let unit = ((raw + 1.0) * 0.5).clamp(0.0, 1.0);
        unit.powi(self.exponent)
    }

    fn preset(&self) -> ThresholdPreset {
        ThresholdPreset::UnitRange
    }

    fn reseed(&mut self, rng: &mut dyn RngCore) {
        let range = self.params.offset_range;
        self.origin = (rng.gen_range(0.0..range), rng.gen_range(0.0..range));
        if !self.params.exponents.is_empty() {
            let pick = rng.gen_range(0..self.params.exponents.len());
            self.exponent = self.params.exponents[pick];
        }
        debug!(
            "power sampler origin ({:.2}, {:.2}), exponent {}",
            self.origin.0, self.origin.1, self.exponent
        );
    }
}

// =============================================================================
// STRATEGY SELECTION
// =============================================================================

/// Which noise strategy a deployment uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SamplerKind {
    Fractal,
    Power,
}

/// The configured sampler, dispatching to one of the two strategies.
pub enum Sampler {
    Fractal(FractalSampler),
    Power(PowerSampler),
}

impl Sampler {
    pub fn kind(&self) -> SamplerKind {
        match self {
            Sampler::Fractal(_) => SamplerKind::Fractal,
            Sampler::Power(_) => SamplerKind::Power,
        }
    }

    /// Short human-readable state, used in logs and window titles.
    pub fn describe(&self) -> String {
        match self {
            Sampler::Fractal(s) => format!("fractal t={:.3}", s.time().value()),
            Sampler::Power(s) => format!(
                "power ^{} @ ({:.1}, {:.1})",
                s.exponent(),
                s.origin().0,
                s.origin().1
            ),
        }
    }
}

impl NoiseSampler for Sampler {
    fn sample(&self, x: f64, y: f64) -> f64 {
        match self {
            Sampler::Fractal(s) => s.sample(x, y),
            Sampler::Power(s) => s.sample(x, y),
        }
    }

    fn preset(&self) -> ThresholdPreset {
        match self {
            Sampler::Fractal(s) => s.preset(),
            Sampler::Power(s) => s.preset(),
        }
    }

    fn reseed(&mut self, rng: &mut dyn RngCore) {
        match self {
            Sampler::Fractal(s) => s.reseed(rng),
            Sampler::Power(s) => s.reseed(rng),
        }
    }

    fn advance(&mut self, dt: f64, direction: TimeDirection) {
        match self {
            Sampler::Fractal(s) => s.advance(dt, direction),
            Sampler::Power(s) => s.advance(dt, direction),
        }
    }
}
