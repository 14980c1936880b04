use crate::control_system::traffic_light_controller::SignalState;
use crate::data_structures::CellState;
use crate::shared_data::Snapshot;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

pub const WALL_GRAY: RGBColor = RGBColor(125, 125, 125);

/// Display color of a cell. The light block follows the signal.
pub fn cell_color(cell: CellState, signal: SignalState) -> RGBColor {
    match cell {
        CellState::Wall => WALL_GRAY,
        CellState::Road => WHITE,
        CellState::Car => BLUE,
        CellState::TrafficLight => match signal {
            SignalState::Red => RED,
            SignalState::Green => GREEN,
            SignalState::RedToGreen | SignalState::GreenToRed => YELLOW,
        },
    }
}

/// Pixel size of a rendered snapshot.
pub fn image_size(snapshot: &Snapshot<'_>, pixels_per_cell: u32) -> (u32, u32) {
    (
        snapshot.cols as u32 * pixels_per_cell,
        snapshot.rows as u32 * pixels_per_cell,
    )
}

/// Paints every cell as a `pixels_per_cell` square.
pub fn draw_snapshot<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    snapshot: &Snapshot<'_>,
    pixels_per_cell: u32,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WALL_GRAY)?;
    let size = pixels_per_cell as i32;
    for row in 0..snapshot.rows {
        for col in 0..snapshot.cols {
            let cell = snapshot.cell(row, col);
            if cell == CellState::Wall {
                continue;
            }
            let (x0, y0) = (col as i32 * size, row as i32 * size);
            root.draw(&Rectangle::new(
                [(x0, y0), (x0 + size, y0 + size)],
                cell_color(cell, snapshot.signal).filled(),
            ))?;
        }
    }
    Ok(())
}

/// Saves the snapshot as a PNG file.
pub fn render_png(
    snapshot: &Snapshot<'_>,
    path: &Path,
    pixels_per_cell: u32,
) -> Result<(), Box<dyn Error>> {
    let root =
        BitMapBackend::new(path, image_size(snapshot, pixels_per_cell)).into_drawing_area();
    draw_snapshot(&root, snapshot, pixels_per_cell)?;
    root.present()?;
    Ok(())
}

/// Renders the snapshot into a packed RGB buffer, row by row.
pub fn render_rgb(
    snapshot: &Snapshot<'_>,
    pixels_per_cell: u32,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let (width, height) = image_size(snapshot, pixels_per_cell);
    let mut buffer = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_snapshot(&root, snapshot, pixels_per_cell)?;
        root.present()?;
    }
    Ok(buffer)
}
