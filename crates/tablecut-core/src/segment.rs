//! Grid finalization and per-cell cropping.
//!
//! Once line placement ends, the accumulated separators are normalized into
//! boundary lists, the working frame is rendered one last time at the
//! frozen angle, and every cell is cropped and written as
//! `<output_dir>/row_<i>/col_<j>.png` with 1-based indices. A downstream
//! OCR step consumes that layout cell by cell.
//!
//! Writing is best effort: a cell that fails to encode or store is logged
//! and counted, and the loop moves on. A partially digitized table is more
//! useful to the operator than an all-or-nothing failure.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::session::Session;
use crate::transform::{crop_rect, rotate_about_center, SampleFilter};

/// Error that prevents the crop loop from starting at all.
///
/// Per-cell failures are not errors; they are counted in the report.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// The session was cancelled; a cancelled session must write nothing.
    #[error("Session was cancelled; nothing was written")]
    Cancelled,

    /// The output directory could not be created.
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Outcome of a segmentation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentReport {
    /// Number of grid rows.
    pub rows: usize,
    /// Number of grid columns.
    pub cols: usize,
    /// Cells successfully written.
    pub cells_written: usize,
    /// Cells that failed to write (logged and skipped).
    pub cells_failed: usize,
}

impl SegmentReport {
    /// Total number of cells in the grid.
    pub fn cells(&self) -> usize {
        self.rows * self.cols
    }
}

/// Normalize separator coordinates into a full boundary list.
///
/// Sorts and deduplicates, drops anything outside the open interval
/// (0, extent), then adds the implicit image-edge boundaries 0 and
/// `extent`. Dropping the edge values first means a separator clicked
/// exactly on the border cannot produce a zero-size duplicate cell.
///
/// The result always has at least two entries, so the minimum grid is
/// 1x1 even when the operator placed no lines at all.
pub fn grid_boundaries(lines: &[u32], extent: u32) -> Vec<u32> {
    let mut interior: Vec<u32> = lines
        .iter()
        .copied()
        .filter(|&line| line > 0 && line < extent)
        .collect();
    interior.sort_unstable();
    interior.dedup();

    let mut boundaries = Vec::with_capacity(interior.len() + 2);
    boundaries.push(0);
    boundaries.extend(interior);
    boundaries.push(extent);
    boundaries
}

/// Crop every grid cell of a finished session and write the cells under
/// `output_dir`.
///
/// The session is consumed: segmentation is the terminal action, and the
/// angle and line sets it uses are exactly the ones the last preview
/// showed.
///
/// # Errors
///
/// [`SegmentError::Cancelled`] if the operator cancelled the session, and
/// [`SegmentError::CreateDir`] for the top-level output directory. Once the
/// crop loop starts everything is skip-and-continue, reported in the
/// [`SegmentReport`].
pub fn segment_session(session: Session, output_dir: &Path) -> Result<SegmentReport, SegmentError> {
    if session.is_cancelled() {
        return Err(SegmentError::Cancelled);
    }

    let rows = grid_boundaries(session.row_lines(), session.source().height);
    let cols = grid_boundaries(session.col_lines(), session.source().width);

    // Same rotation call as the preview path, at the frozen final angle.
    let frame = rotate_about_center(
        session.source(),
        session.angle_degrees(),
        SampleFilter::default(),
    );

    fs::create_dir_all(output_dir).map_err(|source| SegmentError::CreateDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut report = SegmentReport {
        rows: rows.len() - 1,
        cols: cols.len() - 1,
        cells_written: 0,
        cells_failed: 0,
    };

    for i in 0..rows.len() - 1 {
        let row_dir = output_dir.join(format!("row_{}", i + 1));
        if let Err(err) = fs::create_dir_all(&row_dir) {
            log::warn!("skipping row {}: cannot create {:?}: {}", i + 1, row_dir, err);
            report.cells_failed += cols.len() - 1;
            continue;
        }

        for j in 0..cols.len() - 1 {
            let cell = crop_rect(&frame, cols[j], rows[i], cols[j + 1], rows[i + 1]);
            let cell_path = row_dir.join(format!("col_{}.png", j + 1));

            let result = match cell.to_rgb_image() {
                Some(img) => img.save(&cell_path).map_err(|e| e.to_string()),
                None => Err("invalid cell buffer".to_string()),
            };

            match result {
                Ok(()) => report.cells_written += 1,
                Err(err) => {
                    log::warn!("cell ({}, {}) not written: {}", i + 1, j + 1, err);
                    report.cells_failed += 1;
                }
            }
        }
    }

    log::info!(
        "segmented {} rows x {} cols into {:?} ({} written, {} failed)",
        report.rows,
        report.cols,
        output_dir,
        report.cells_written,
        report.cells_failed
    );
    Ok(report)
}
