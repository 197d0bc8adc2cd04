//! Terrain classes and noise-to-class classification.
//!
//! Six classes ordered from water to mountain. Each class carries the index
//! of its base sprite in the tile sheet; transition variants sit at small
//! signed offsets around that index.

use serde::{Deserialize, Serialize};

// =============================================================================
// TERRAIN CLASSES
// =============================================================================

/// Discrete terrain category, ordered water → mountain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TerrainClass {
    #[default]
    DeepWater,
    ShallowWater,
    Sand,
    Grass,
    SoftMountain,
    HardMountain,
}

impl TerrainClass {
    /// All classes in progression order.
    pub const ALL: [TerrainClass; 6] = [
        TerrainClass::DeepWater,
        TerrainClass::ShallowWater,
        TerrainClass::Sand,
        TerrainClass::Grass,
        TerrainClass::SoftMountain,
        TerrainClass::HardMountain,
    ];

    /// Index of the class's unblended sprite in the tile sheet.
    pub fn base_index(self) -> i32 {
        match self {
            TerrainClass::DeepWater => 49,
            TerrainClass::ShallowWater => 4,
            TerrainClass::Sand => 22,
            TerrainClass::Grass => 13,
            TerrainClass::SoftMountain => 31,
            TerrainClass::HardMountain => 40,
        }
    }

    /// The class this one blends toward at its borders.
    /// `None` for `DeepWater`, the bottom of the progression.
    pub fn lower(self) -> Option<TerrainClass> {
        match self {
            TerrainClass::DeepWater => None,
            TerrainClass::ShallowWater => Some(TerrainClass::DeepWater),
            TerrainClass::Sand => Some(TerrainClass::ShallowWater),
            TerrainClass::Grass => Some(TerrainClass::Sand),
            TerrainClass::SoftMountain => Some(TerrainClass::Grass),
            TerrainClass::HardMountain => Some(TerrainClass::SoftMountain),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TerrainClass::DeepWater => "Deep Water",
            TerrainClass::ShallowWater => "Shallow Water",
            TerrainClass::Sand => "Sand",
            TerrainClass::Grass => "Grass",
            TerrainClass::SoftMountain => "Soft Mountain",
            TerrainClass::HardMountain => "Hard Mountain",
        }
    }
}

// =============================================================================
// CLASSIFICATION PRESETS
// =============================================================================

/// Noise domain a sampler produces, each with its own band table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPreset {
    /// Fractal 3D noise, domain [-2, 2]
    FractalRange,
    /// Power-biased unit noise, domain [0, 1]
    UnitRange,
}

// Lower bound of each band, DeepWater first. The first entry is the domain floor.
const FRACTAL_BANDS: [f64; 6] = [-2.0, 0.0, 0.25, 0.4, 0.75, 0.95];
const FRACTAL_MAX: f64 = 2.0;

const UNIT_BANDS: [f64; 6] = [0.0, 0.2, 0.3, 0.36, 0.6, 0.78];
const UNIT_MAX: f64 = 1.0;

impl ThresholdPreset {
    /// `(min, max)` of the declared noise domain.
    pub fn domain(self) -> (f64, f64) {
        match self {
            ThresholdPreset::FractalRange => (FRACTAL_BANDS[0], FRACTAL_MAX),
            ThresholdPreset::UnitRange => (UNIT_BANDS[0], UNIT_MAX),
        }
    }

    fn bands(self) -> &'static [f64; 6] {
        match self {
            ThresholdPreset::FractalRange => &FRACTAL_BANDS,
            ThresholdPreset::UnitRange => &UNIT_BANDS,
        }
    }

    /// Map a noise value to a terrain class.
    ///
    /// The value is clamped to the domain first. Bands are `[lo, hi)` except
    /// the last, which also includes the domain maximum.
    pub fn classify(self, noise: f64) -> TerrainClass {
        let (min, max) = self.domain();
        let value = noise.clamp(min, max);
        let bands = self.bands();

        // Walk from the top so each band only needs its lower bound
        for (class, &lo) in TerrainClass::ALL.iter().zip(bands.iter()).rev() {
            if value >= lo {
                return *class;
            }
        }

        // NaN compares false against every bound
        TerrainClass::DeepWater
    }
}
