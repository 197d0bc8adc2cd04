//! Tile terrain generation library
//!
//! Classifies coherent noise into six terrain classes and renders the grid
//! with transition variants chosen from 3x3 neighbor patterns.

pub mod ascii;
pub mod config;
pub mod generator;
pub mod noise_sampler;
pub mod render;
pub mod session;
pub mod terrain;
pub mod tilemap;
pub mod tileset;
pub mod transitions;
pub mod viewer;
