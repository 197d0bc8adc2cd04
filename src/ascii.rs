//! ASCII rendering of a terrain render pass.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::render::{RenderSink, PRIMARY_DEPTH};
use crate::terrain::TerrainClass;
use crate::tileset::decode_index;

/// ASCII rendering modes
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum AsciiMode {
    /// One character per terrain class
    Classes,
    /// Transition cells show their variant as a keypad digit
    Variants,
}

/// Get ASCII character for a terrain class
pub fn class_char(class: TerrainClass) -> char {
    match class {
        TerrainClass::DeepWater => '~',
        TerrainClass::ShallowWater => '-',
        TerrainClass::Sand => '.',
        TerrainClass::Grass => '"',
        TerrainClass::SoftMountain => 'n',
        TerrainClass::HardMountain => '^',
    }
}

// Variant slot (top-left .. bottom-right) as the matching numeric keypad key
fn variant_char(offset: i32) -> char {
    const KEYPAD: [char; 9] = ['7', '8', '9', '4', '5', '6', '1', '2', '3'];
    KEYPAD[(offset + 4).clamp(0, 8) as usize]
}

/// Render sink producing one character per cell. Underlays are ignored.
pub struct AsciiCanvas {
    mode: AsciiMode,
    width: usize,
    height: usize,
    cells: Vec<char>,
}

impl AsciiCanvas {
    pub fn new(width: usize, height: usize, mode: AsciiMode) -> Self {
        Self {
            mode,
            width,
            height,
            cells: vec![' '; width * height],
        }
    }

    pub fn char_at(&self, x: usize, y: usize) -> char {
        self.cells[y * self.width + x]
    }

    /// Rows from the top of the map (highest y) down.
    pub fn lines(&self) -> Vec<String> {
        (0..self.height)
            .rev()
            .map(|y| (0..self.width).map(|x| self.char_at(x, y)).collect())
            .collect()
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for line in self.lines() {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }

    pub fn export(&self, path: &Path) -> io::Result<()> {
        let mut file = File::create(path)?;
        self.write_to(&mut file)
    }
}

impl RenderSink for AsciiCanvas {
    fn place(&mut self, (x, y): (usize, usize), image_index: i32, depth: u8) {
        if depth != PRIMARY_DEPTH {
            return;
        }
        let ch = match decode_index(image_index) {
            Some((_, offset)) if offset != 0 && self.mode == AsciiMode::Variants => variant_char(offset),
            Some((class, _)) => class_char(class),
            None => '?',
        };
        self.cells[y * self.width + x] = ch;
    }
}
