//! Pixel-rectangle cropping for grid cells.
//!
//! Cells are half-open rectangles `[x0, x1) x [y0, y1)` whose edges are grid
//! boundary coordinates, so adjacent cells share an edge without sharing a
//! pixel row or column.

use crate::decode::Raster;

/// Crop the half-open rectangle `[x0, x1) x [y0, y1)` out of a raster.
///
/// Coordinates beyond the source extent are clamped to it. A degenerate
/// rectangle (`x1 <= x0` or `y1 <= y0` after clamping) yields an empty
/// raster; callers decide what an empty cell means (the segmentation writer
/// reports it as a failed cell, downstream OCR treats it as blank).
pub fn crop_rect(source: &Raster, x0: u32, y0: u32, x1: u32, y1: u32) -> Raster {
    let x1 = x1.min(source.width);
    let y1 = y1.min(source.height);

    if x0 >= x1 || y0 >= y1 {
        return Raster::new(0, 0, Vec::new());
    }

    let out_w = x1 - x0;
    let out_h = y1 - y0;
    let src_stride = source.width as usize * 3;
    let out_stride = out_w as usize * 3;

    let mut output = Vec::with_capacity(out_stride * out_h as usize);
    for y in y0..y1 {
        let row_start = y as usize * src_stride + x0 as usize * 3;
        output.extend_from_slice(&source.pixels[row_start..row_start + out_stride]);
    }

    Raster::new(out_w, out_h, output)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
