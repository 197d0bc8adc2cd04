use std::time::Instant;

use log::info;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::noise_sampler::TimeDirection;
use crate::session::TerrainSession;
use crate::tileset::{to_argb_buffer, TileCanvas, Tileset};

/// Run the interactive terrain viewer.
/// R regenerates, hold T to advance time, hold Y to rewind, Escape exits.
pub fn run_viewer(mut session: TerrainSession, tileset: &Tileset, overlap: u32) -> Result<(), minifb::Error> {
    let width = session.grid().width();
    let height = session.grid().height();

    let mut canvas = TileCanvas::new(tileset, width, height, overlap);
    let (window_width, window_height) = canvas.dimensions();
    let (window_width, window_height) = (window_width as usize, window_height as usize);

    let mut window = Window::new(
        "Tile Terrain - R: Regenerate, T/Y: Advance/Rewind, Esc: Exit",
        window_width,
        window_height,
        WindowOptions {
            resize: false,
            scale: minifb::Scale::X1,
            ..WindowOptions::default()
        },
    )?;

    // Limit to ~60fps
    window.set_target_fps(60);

    let mut buffer = redraw(&session, &mut canvas);

    println!("Viewer started. Controls:");
    println!("  R: Regenerate");
    println!("  T: Advance time (hold)");
    println!("  Y: Rewind time (hold)");
    println!("  Esc: Exit");

    let mut last_frame = Instant::now();

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let dt = last_frame.elapsed().as_secs_f64();
        last_frame = Instant::now();
        let mut needs_redraw = false;

        if window.is_key_pressed(Key::R, KeyRepeat::No) {
            session.regenerate();
            needs_redraw = true;
        }

        // Rewind wins when both are held
        let direction = if window.is_key_down(Key::Y) {
            Some(TimeDirection::Backward)
        } else if window.is_key_down(Key::T) {
            Some(TimeDirection::Forward)
        } else {
            None
        };

        if let Some(direction) = direction {
            session.advance(dt, direction);
            needs_redraw = true;
        }

        if needs_redraw {
            buffer = redraw(&session, &mut canvas);
            window.set_title(&format!("Tile Terrain - {}", session.sampler().describe()));
        }

        window.update_with_buffer(&buffer, window_width, window_height)?;
    }

    info!("viewer closed");
    Ok(())
}

fn redraw(session: &TerrainSession, canvas: &mut TileCanvas) -> Vec<u32> {
    canvas.clear();
    if let Err(e) = session.render_into(canvas) {
        log::error!("render failed: {}", e);
    }
    to_argb_buffer(&canvas.compose())
}
