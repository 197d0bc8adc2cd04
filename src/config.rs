//! Generator configuration.
//!
//! Everything has a default; a JSON file can override any subset of fields
//! and command-line flags override the file.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::noise_sampler::{FractalParams, FractalSampler, PowerParams, PowerSampler, Sampler, SamplerKind};
use crate::tileset::TilesetConfig;
use crate::transitions::{TransitionError, TransitionTable};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where the transition table comes from. Chosen once per deployment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionSource {
    /// The rule file compiled into the binary
    #[default]
    Embedded,
    /// A rule file on disk
    File(PathBuf),
    /// The built-in constant table
    Constant,
}

impl TransitionSource {
    pub fn load(&self) -> Result<TransitionTable, TransitionError> {
        match self {
            TransitionSource::Embedded => TransitionTable::embedded(),
            TransitionSource::File(path) => TransitionTable::load(path),
            TransitionSource::Constant => Ok(TransitionTable::constant()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Grid width in tiles
    pub width: usize,
    /// Grid height in tiles
    pub height: usize,
    /// Noise strategy
    pub sampler: SamplerKind,
    pub fractal: FractalParams,
    pub power: PowerParams,
    pub transitions: TransitionSource,
    pub tileset: TilesetConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            sampler: SamplerKind::Fractal,
            fractal: FractalParams::default(),
            power: PowerParams::default(),
            transitions: TransitionSource::default(),
            tileset: TilesetConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Load a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges the samplers and grid rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid(format!("grid size {}x{} must be non-zero", self.width, self.height)));
        }

        let f = &self.fractal;
        if f.octaves == 0 {
            return Err(invalid("fractal.octaves must be at least 1".into()));
        }
        if !(f.base_frequency > 0.0) {
            return Err(invalid(format!("fractal.base_frequency must be positive, got {}", f.base_frequency)));
        }
        if !(f.domain_scale + 0.01 > 0.0) {
            return Err(invalid(format!("fractal.domain_scale {} gives a non-positive feature size", f.domain_scale)));
        }

        let p = &self.power;
        if p.exponents.is_empty() {
            return Err(invalid("power.exponents must not be empty".into()));
        }
        if let Some(bad) = p.exponents.iter().find(|&&e| e < 1) {
            return Err(invalid(format!("power.exponents must be positive, got {}", bad)));
        }
        if !(p.offset_range > 0.0) {
            return Err(invalid(format!("power.offset_range must be positive, got {}", p.offset_range)));
        }

        if self.tileset.tile_size == 0 || self.tileset.overlap >= self.tileset.tile_size {
            return Err(invalid(format!(
                "tileset overlap {} must be smaller than tile size {}",
                self.tileset.overlap, self.tileset.tile_size
            )));
        }

        Ok(())
    }

    /// Build the configured noise sampler.
    pub fn build_sampler(&self) -> Sampler {
        match self.sampler {
            SamplerKind::Fractal => Sampler::Fractal(FractalSampler::new(self.fractal.clone())),
            SamplerKind::Power => Sampler::Power(PowerSampler::new(self.power.clone())),
        }
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise_sampler::NoiseSampler;
    use crate::terrain::ThresholdPreset;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = GeneratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fractal.octaves, 2);
        assert_eq!(config.fractal.amplitude, 1.75);
        assert_eq!(config.power.exponents, vec![1, 2, 3]);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GeneratorConfig::from_json(
            r#"{ "width": 20, "sampler": "power", "fractal": { "octaves": 4 } }"#,
        )
        .unwrap();

        assert_eq!(config.width, 20);
        assert_eq!(config.height, 64);
        assert_eq!(config.sampler, SamplerKind::Power);
        assert_eq!(config.fractal.octaves, 4);
        assert_eq!(config.fractal.persistence, 0.5);
        assert_eq!(config.build_sampler().preset(), ThresholdPreset::UnitRange);
    }

    #[test]
    fn test_transition_source_variants() {
        let config = GeneratorConfig::from_json(r#"{ "transitions": "constant" }"#).unwrap();
        assert_eq!(config.transitions, TransitionSource::Constant);

        let config = GeneratorConfig::from_json(r#"{ "transitions": { "file": "rules.txt" } }"#).unwrap();
        assert_eq!(config.transitions, TransitionSource::File(PathBuf::from("rules.txt")));

        assert_eq!(TransitionSource::Constant.load().unwrap().len(), 36);
        assert!(TransitionSource::File(PathBuf::from("/nonexistent/rules.txt")).load().is_err());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for json in [
            r#"{ "width": 0 }"#,
            r#"{ "fractal": { "octaves": 0 } }"#,
            r#"{ "fractal": { "base_frequency": -1.0 } }"#,
            r#"{ "power": { "exponents": [] } }"#,
            r#"{ "power": { "exponents": [2, 0] } }"#,
            r#"{ "power": { "offset_range": 0.0 } }"#,
            r#"{ "tileset": { "tile_size": 8, "overlap": 8 } }"#,
        ] {
            assert!(
                matches!(GeneratorConfig::from_json(json), Err(ConfigError::Invalid(_))),
                "accepted {json}"
            );
        }
        assert!(matches!(GeneratorConfig::from_json("{ width"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "height": 12, "fractal": {{ "seed": 7 }} }}"#).unwrap();

        let config = GeneratorConfig::load(file.path()).unwrap();
        assert_eq!(config.height, 12);
        assert_eq!(config.fractal.seed, 7);
    }
}
