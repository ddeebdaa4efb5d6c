//! Line placement state machine for one segmentation session.
//!
//! A [`Session`] owns everything one table photograph accumulates before
//! segmentation: the source raster, the row and column separator
//! coordinates, the rotation angle, and the current [`Phase`]. Frontends
//! translate their physical input (mouse buttons, keys) into [`Command`]s
//! and feed them to [`Session::apply`], which is the single place state
//! changes happen. That keeps the whole interaction testable without any
//! UI harness.
//!
//! The canonical path is row drawing, then column drawing, then
//! segmentation. Rotation is a modal sub-state reachable from either
//! drawing phase; confirming it returns to whichever phase invoked it.
//! Cancel ends the session from anywhere, at any nesting.
//!
//! One deliberate quirk carried over from the field workflow: rotating
//! after lines are already placed does not re-project those lines into the
//! newly rotated frame. The coordinates stay as clicked while the image
//! turns underneath them, so operators are expected to settle the angle
//! before marking lines. See the note on [`Command::RotateEnter`].

use crate::decode::Raster;
use crate::overlay::draw_grid_overlay;
use crate::transform::{rotate_about_center, SampleFilter};

/// Angle change of a single rotate-left or rotate-right command, in degrees.
pub const ROTATE_STEP_DEGREES: f64 = 0.25;

/// Which separator set a pointer click mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawingMode {
    /// Clicks record y-coordinates (horizontal separators).
    Row,
    /// Clicks record x-coordinates (vertical separators).
    Column,
}

/// Interaction phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting row separator clicks.
    RowDrawing,
    /// Accepting column separator clicks.
    ColumnDrawing,
    /// Adjusting the rotation angle; returns to `prior` on confirm.
    Rotating {
        /// The drawing mode that invoked rotation.
        prior: DrawingMode,
    },
}

impl Phase {
    /// The drawing mode a pointer click would affect, if any.
    pub fn drawing_mode(self) -> Option<DrawingMode> {
        match self {
            Phase::RowDrawing => Some(DrawingMode::Row),
            Phase::ColumnDrawing => Some(DrawingMode::Column),
            Phase::Rotating { .. } => None,
        }
    }
}

/// The abstract command surface.
///
/// Physical bindings (which mouse button, which key) are a frontend
/// concern; the engine only sees these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Primary pointer action at a frame coordinate. In row drawing the
    /// y-coordinate is recorded, in column drawing the x-coordinate;
    /// ignored while rotating.
    PointerPrimary { x: u32, y: u32 },
    /// Secondary pointer action: undo the most recent separator of the
    /// active set. No-op when the set is empty or while rotating.
    PointerSecondary,
    /// Leave the current drawing phase: row drawing moves to column
    /// drawing, column drawing finishes line placement. Ignored while
    /// rotating.
    Advance,
    /// Enter the rotation sub-state from a drawing phase.
    ///
    /// Lines already placed are kept verbatim; they are NOT re-expressed
    /// in the rotated frame. Whether they should be is an open question
    /// with the people running the digitization effort, so the engine
    /// preserves the historical behavior instead of guessing.
    RotateEnter,
    /// Decrease the angle by [`ROTATE_STEP_DEGREES`]. Only while rotating.
    RotateLeft,
    /// Increase the angle by [`ROTATE_STEP_DEGREES`]. Only while rotating.
    RotateRight,
    /// Leave the rotation sub-state, returning to the phase that entered it.
    Confirm,
    /// Abort the whole session. Valid anywhere, at any nesting depth.
    Cancel,
}

/// What the frontend should do after a command was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep reading commands; redraw the preview.
    Continue,
    /// Line placement is complete: freeze the session and run segmentation.
    ReadyToSegment,
    /// The operator cancelled; drop the session, nothing is written.
    Cancelled,
}

impl Step {
    /// Terminal steps end the interaction; further commands are ignored.
    fn is_terminal(self) -> bool {
        matches!(self, Step::ReadyToSegment | Step::Cancelled)
    }
}

/// A rendered preview of the current session state.
///
/// The frame is produced by the same rotation call segmentation uses, so
/// the preview never diverges from the eventual crop.
#[derive(Debug, Clone)]
pub struct Preview {
    /// Working frame with separator lines drawn over it.
    pub frame: Raster,
    /// The live angle, for the frontend's readout while rotating.
    pub angle_degrees: f64,
    /// Phase at the time of rendering.
    pub phase: Phase,
}

/// One end-to-end segmentation session over a single source raster.
#[derive(Debug, Clone)]
pub struct Session {
    source: Raster,
    row_lines: Vec<u32>,
    col_lines: Vec<u32>,
    angle_degrees: f64,
    phase: Phase,
    terminal: Option<Step>,
}

impl Session {
    /// Start a session in row drawing with no lines and no rotation.
    pub fn new(source: Raster) -> Self {
        Self {
            source,
            row_lines: Vec::new(),
            col_lines: Vec::new(),
            angle_degrees: 0.0,
            phase: Phase::RowDrawing,
            terminal: None,
        }
    }

    /// The immutable source raster.
    pub fn source(&self) -> &Raster {
        &self.source
    }

    /// Row separator y-coordinates in click order.
    pub fn row_lines(&self) -> &[u32] {
        &self.row_lines
    }

    /// Column separator x-coordinates in click order.
    pub fn col_lines(&self) -> &[u32] {
        &self.col_lines
    }

    /// Current rotation angle in degrees.
    pub fn angle_degrees(&self) -> f64 {
        self.angle_degrees
    }

    /// Current interaction phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the operator has cancelled this session.
    ///
    /// A cancelled session is inert: commands are ignored and
    /// [`segment_session`](crate::segment::segment_session) refuses it.
    pub fn is_cancelled(&self) -> bool {
        self.terminal == Some(Step::Cancelled)
    }

    /// Apply one operator command and report what to do next.
    ///
    /// Commands that make no sense in the current phase are ignored (the
    /// session stays as it was and the step is `Continue`), with two
    /// exceptions: `Cancel` always cancels, and `Advance` from column
    /// drawing yields `ReadyToSegment`.
    ///
    /// Both terminal steps latch: once `Cancelled` or `ReadyToSegment` has
    /// been returned the session state is frozen and every further command
    /// just returns the same step again.
    pub fn apply(&mut self, command: Command) -> Step {
        if let Some(step) = self.terminal {
            return step;
        }

        if command == Command::Cancel {
            log::info!("session cancelled in {:?}", self.phase);
            self.terminal = Some(Step::Cancelled);
            return Step::Cancelled;
        }

        let step = match self.phase {
            Phase::Rotating { prior } => self.apply_rotating(command, prior),
            Phase::RowDrawing => self.apply_drawing(command, DrawingMode::Row),
            Phase::ColumnDrawing => self.apply_drawing(command, DrawingMode::Column),
        };
        if step.is_terminal() {
            self.terminal = Some(step);
        }
        step
    }

    fn apply_rotating(&mut self, command: Command, prior: DrawingMode) -> Step {
        match command {
            Command::RotateLeft => {
                self.angle_degrees -= ROTATE_STEP_DEGREES;
            }
            Command::RotateRight => {
                self.angle_degrees += ROTATE_STEP_DEGREES;
            }
            Command::Confirm => {
                log::debug!(
                    "rotation confirmed at {:.2} degrees, back to {:?}",
                    self.angle_degrees,
                    prior
                );
                self.phase = match prior {
                    DrawingMode::Row => Phase::RowDrawing,
                    DrawingMode::Column => Phase::ColumnDrawing,
                };
            }
            // Pointer events, advance, and nested rotate-enter are ignored
            // inside the modal rotation sub-state.
            _ => {}
        }
        Step::Continue
    }

    fn apply_drawing(&mut self, command: Command, mode: DrawingMode) -> Step {
        match command {
            Command::PointerPrimary { x, y } => {
                match mode {
                    DrawingMode::Row => {
                        if y <= self.source.height {
                            self.row_lines.push(y);
                        } else {
                            log::debug!("row click at y={} outside frame, ignored", y);
                        }
                    }
                    DrawingMode::Column => {
                        if x <= self.source.width {
                            self.col_lines.push(x);
                        } else {
                            log::debug!("column click at x={} outside frame, ignored", x);
                        }
                    }
                }
                Step::Continue
            }
            Command::PointerSecondary => {
                match mode {
                    DrawingMode::Row => self.row_lines.pop(),
                    DrawingMode::Column => self.col_lines.pop(),
                };
                Step::Continue
            }
            Command::RotateEnter => {
                self.phase = Phase::Rotating { prior: mode };
                Step::Continue
            }
            Command::Advance => match mode {
                DrawingMode::Row => {
                    log::debug!(
                        "row drawing done ({} lines), advancing to columns",
                        self.row_lines.len()
                    );
                    self.phase = Phase::ColumnDrawing;
                    Step::Continue
                }
                DrawingMode::Column => {
                    log::debug!(
                        "column drawing done ({} lines), ready to segment",
                        self.col_lines.len()
                    );
                    Step::ReadyToSegment
                }
            },
            // Rotate adjustments and confirm only mean something while
            // rotating.
            Command::RotateLeft | Command::RotateRight | Command::Confirm => Step::Continue,
            Command::Cancel => unreachable!("cancel handled in apply"),
        }
    }

    /// Render the current working frame with overlay lines.
    pub fn preview(&self) -> Preview {
        let mut frame =
            rotate_about_center(&self.source, self.angle_degrees, SampleFilter::default());
        draw_grid_overlay(&mut frame, &self.row_lines, &self.col_lines);
        Preview {
            frame,
            angle_degrees: self.angle_degrees,
            phase: self.phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_800x600() -> Session {
        Session::new(Raster::filled(800, 600, [255, 255, 255]))
    }

    fn click(x: u32, y: u32) -> Command {
        Command::PointerPrimary { x, y }
    }

    #[test]
    fn test_new_session_starts_in_row_drawing() {
        let s = session_800x600();
        assert_eq!(s.phase(), Phase::RowDrawing);
        assert!(s.row_lines().is_empty());
        assert!(s.col_lines().is_empty());
        assert_eq!(s.angle_degrees(), 0.0);
    }

    #[test]
    fn test_primary_click_records_y_in_row_drawing() {
        let mut s = session_800x600();
        assert_eq!(s.apply(click(123, 200)), Step::Continue);
        assert_eq!(s.apply(click(456, 400)), Step::Continue);
        assert_eq!(s.row_lines(), &[200, 400]);
        assert!(s.col_lines().is_empty());
    }

    #[test]
    fn test_primary_click_records_x_in_column_drawing() {
        let mut s = session_800x600();
        s.apply(Command::Advance);
        assert_eq!(s.phase(), Phase::ColumnDrawing);
        s.apply(click(300, 17));
        assert_eq!(s.col_lines(), &[300]);
        assert!(s.row_lines().is_empty());
    }

    #[test]
    fn test_click_outside_frame_is_rejected() {
        let mut s = session_800x600();
        s.apply(click(0, 601));
        assert!(s.row_lines().is_empty());

        // The frame edge itself is a valid coordinate; segmentation
        // dedups it against the implicit border.
        s.apply(click(0, 600));
        assert_eq!(s.row_lines(), &[600]);

        s.apply(Command::Advance);
        s.apply(click(801, 0));
        assert!(s.col_lines().is_empty());
        s.apply(click(800, 0));
        assert_eq!(s.col_lines(), &[800]);
    }

    #[test]
    fn test_secondary_click_undoes_most_recent() {
        let mut s = session_800x600();
        s.apply(click(0, 100));
        s.apply(click(0, 300));
        s.apply(click(0, 200));
        s.apply(Command::PointerSecondary);
        assert_eq!(s.row_lines(), &[100, 300]);
        s.apply(Command::PointerSecondary);
        assert_eq!(s.row_lines(), &[100]);
    }

    #[test]
    fn test_secondary_click_on_empty_set_is_noop() {
        let mut s = session_800x600();
        assert_eq!(s.apply(Command::PointerSecondary), Step::Continue);
        assert!(s.row_lines().is_empty());
    }

    #[test]
    fn test_undo_only_touches_active_set() {
        let mut s = session_800x600();
        s.apply(click(0, 100));
        s.apply(Command::Advance);
        s.apply(Command::PointerSecondary);
        // Row lines placed earlier survive column-mode undo.
        assert_eq!(s.row_lines(), &[100]);
    }

    #[test]
    fn test_advance_twice_reaches_segmentation() {
        let mut s = session_800x600();
        assert_eq!(s.apply(Command::Advance), Step::Continue);
        assert_eq!(s.phase(), Phase::ColumnDrawing);
        assert_eq!(s.apply(Command::Advance), Step::ReadyToSegment);
    }

    #[test]
    fn test_rotate_round_trip_returns_to_prior_phase() {
        let mut s = session_800x600();
        s.apply(Command::RotateEnter);
        assert_eq!(
            s.phase(),
            Phase::Rotating {
                prior: DrawingMode::Row
            }
        );
        s.apply(Command::RotateRight);
        s.apply(Command::Confirm);
        assert_eq!(s.phase(), Phase::RowDrawing);

        s.apply(Command::Advance);
        s.apply(Command::RotateEnter);
        assert_eq!(
            s.phase(),
            Phase::Rotating {
                prior: DrawingMode::Column
            }
        );
        s.apply(Command::Confirm);
        assert_eq!(s.phase(), Phase::ColumnDrawing);
    }

    #[test]
    fn test_rotate_steps_adjust_angle_by_quarter_degree() {
        let mut s = session_800x600();
        s.apply(Command::RotateEnter);
        s.apply(Command::RotateRight);
        s.apply(Command::RotateRight);
        s.apply(Command::RotateLeft);
        assert!((s.angle_degrees() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_rotate_commands_ignored_outside_rotating() {
        let mut s = session_800x600();
        s.apply(Command::RotateLeft);
        s.apply(Command::RotateRight);
        s.apply(Command::Confirm);
        assert_eq!(s.angle_degrees(), 0.0);
        assert_eq!(s.phase(), Phase::RowDrawing);
    }

    #[test]
    fn test_pointer_and_advance_ignored_while_rotating() {
        let mut s = session_800x600();
        s.apply(click(0, 100));
        s.apply(Command::RotateEnter);
        assert_eq!(s.apply(click(50, 50)), Step::Continue);
        assert_eq!(s.apply(Command::PointerSecondary), Step::Continue);
        assert_eq!(s.apply(Command::Advance), Step::Continue);
        assert_eq!(s.row_lines(), &[100]);
        assert!(matches!(s.phase(), Phase::Rotating { .. }));
    }

    #[test]
    fn test_rotation_preserves_placed_lines() {
        let mut s = session_800x600();
        s.apply(click(0, 200));
        s.apply(click(0, 400));
        s.apply(Command::RotateEnter);
        s.apply(Command::RotateRight);
        s.apply(Command::Confirm);
        // Coordinates are kept verbatim, not re-projected.
        assert_eq!(s.row_lines(), &[200, 400]);
        assert!((s.angle_degrees() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_cancel_from_drawing_phase() {
        let mut s = session_800x600();
        s.apply(click(0, 200));
        assert_eq!(s.apply(Command::Cancel), Step::Cancelled);
    }

    #[test]
    fn test_cancel_from_nested_rotation() {
        let mut s = session_800x600();
        s.apply(Command::Advance);
        s.apply(Command::RotateEnter);
        assert_eq!(s.apply(Command::Cancel), Step::Cancelled);
    }

    #[test]
    fn test_cancelled_session_is_inert() {
        let mut s = session_800x600();
        s.apply(click(0, 200));
        s.apply(Command::Cancel);
        assert!(s.is_cancelled());

        // Every further command is ignored and reports the cancellation.
        assert_eq!(s.apply(click(0, 300)), Step::Cancelled);
        assert_eq!(s.apply(Command::Advance), Step::Cancelled);
        assert_eq!(s.apply(Command::RotateEnter), Step::Cancelled);
        assert_eq!(s.row_lines(), &[200]);
        assert_eq!(s.phase(), Phase::RowDrawing);
    }

    #[test]
    fn test_ready_session_is_frozen() {
        let mut s = session_800x600();
        s.apply(click(0, 200));
        s.apply(Command::Advance);
        assert_eq!(s.apply(Command::Advance), Step::ReadyToSegment);
        assert!(!s.is_cancelled());

        // Late commands cannot disturb the frozen line sets or angle.
        assert_eq!(s.apply(click(300, 0)), Step::ReadyToSegment);
        assert_eq!(s.apply(Command::PointerSecondary), Step::ReadyToSegment);
        assert_eq!(s.apply(Command::Cancel), Step::ReadyToSegment);
        assert_eq!(s.row_lines(), &[200]);
        assert!(s.col_lines().is_empty());
        assert_eq!(s.angle_degrees(), 0.0);
    }

    #[test]
    fn test_preview_reflects_angle_and_phase() {
        let mut s = session_800x600();
        s.apply(Command::RotateEnter);
        s.apply(Command::RotateLeft);
        let preview = s.preview();
        assert!((preview.angle_degrees + 0.25).abs() < 1e-12);
        assert!(matches!(preview.phase, Phase::Rotating { .. }));
        assert_eq!(preview.frame.width, 800);
        assert_eq!(preview.frame.height, 600);
    }

    #[test]
    fn test_preview_draws_overlay_lines() {
        let mut s = session_800x600();
        s.apply(click(0, 200));
        let preview = s.preview();
        // The row stroke recolors the white frame at y=200.
        assert_ne!(preview.frame.pixel(400, 200), [255, 255, 255]);
        // Untouched area stays white.
        assert_eq!(preview.frame.pixel(400, 100), [255, 255, 255]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The final angle is step * (rights - lefts) regardless of
        /// interleaving.
        #[test]
        fn prop_angle_is_quarter_degree_times_net_steps(
            steps in proptest::collection::vec(any::<bool>(), 0..64),
        ) {
            let mut s = Session::new(Raster::filled(16, 16, [0, 0, 0]));
            s.apply(Command::RotateEnter);
            let mut rights = 0i64;
            let mut lefts = 0i64;
            for right in &steps {
                if *right {
                    s.apply(Command::RotateRight);
                    rights += 1;
                } else {
                    s.apply(Command::RotateLeft);
                    lefts += 1;
                }
            }
            let expected = ROTATE_STEP_DEGREES * (rights - lefts) as f64;
            prop_assert!((s.angle_degrees() - expected).abs() < 1e-9);
        }

        /// N clicks followed by M <= N undos leave the first N - M clicks
        /// in click order.
        #[test]
        fn prop_undo_removes_most_recent_first(
            ys in proptest::collection::vec(0u32..=600, 1..32),
            undo_count in 0usize..32,
        ) {
            let undos = undo_count.min(ys.len());
            let mut s = Session::new(Raster::filled(800, 600, [0, 0, 0]));
            for y in &ys {
                s.apply(Command::PointerPrimary { x: 0, y: *y });
            }
            for _ in 0..undos {
                s.apply(Command::PointerSecondary);
            }
            prop_assert_eq!(s.row_lines(), &ys[..ys.len() - undos]);
        }

        /// Cancel wins over any phase the session may be in.
        #[test]
        fn prop_cancel_always_cancels(
            advance_first in any::<bool>(),
            enter_rotation in any::<bool>(),
        ) {
            let mut s = Session::new(Raster::filled(16, 16, [0, 0, 0]));
            if advance_first {
                s.apply(Command::Advance);
            }
            if enter_rotation {
                s.apply(Command::RotateEnter);
            }
            prop_assert_eq!(s.apply(Command::Cancel), Step::Cancelled);
        }
    }
}
