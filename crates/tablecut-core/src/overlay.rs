//! Separator line rendering for session previews.
//!
//! Row separators are drawn green, column separators blue, both two pixels
//! thick, matching what operators of the digitization workflow are used to
//! seeing. The overlay mutates a working frame in place; it is only ever
//! applied to the preview copy, never to the frame segmentation crops from.

use crate::decode::Raster;

/// Stroke color of row separators.
pub const ROW_COLOR: [u8; 3] = [0, 255, 0];
/// Stroke color of column separators.
pub const COL_COLOR: [u8; 3] = [0, 0, 255];
/// Stroke thickness in pixels.
pub const LINE_THICKNESS: u32 = 2;

/// Draw every separator over a working frame.
pub fn draw_grid_overlay(frame: &mut Raster, row_lines: &[u32], col_lines: &[u32]) {
    for &y in row_lines {
        draw_hline(frame, y);
    }
    for &x in col_lines {
        draw_vline(frame, x);
    }
}

/// Horizontal stroke across the full width at `y`.
///
/// A separator at the bottom edge is pulled up so it stays visible.
fn draw_hline(frame: &mut Raster, y: u32) {
    if frame.height == 0 {
        return;
    }
    let top = y.min(frame.height.saturating_sub(LINE_THICKNESS));
    let bottom = (top + LINE_THICKNESS).min(frame.height);
    for row in top..bottom {
        for x in 0..frame.width {
            put_pixel(frame, x, row, ROW_COLOR);
        }
    }
}

/// Vertical stroke across the full height at `x`.
fn draw_vline(frame: &mut Raster, x: u32) {
    if frame.width == 0 {
        return;
    }
    let left = x.min(frame.width.saturating_sub(LINE_THICKNESS));
    let right = (left + LINE_THICKNESS).min(frame.width);
    for y in 0..frame.height {
        for col in left..right {
            put_pixel(frame, col, y, COL_COLOR);
        }
    }
}

fn put_pixel(frame: &mut Raster, x: u32, y: u32, color: [u8; 3]) {
    let idx = ((y as usize) * (frame.width as usize) + x as usize) * 3;
    frame.pixels[idx..idx + 3].copy_from_slice(&color);
}
