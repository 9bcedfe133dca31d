//! Adapter contract between the turn controller and the presentation layer.
//!
//! Rendering, input wiring, and audio live outside the core; the controller
//! only ever talks to this trait.

use crate::board::Board;

/// Kinds of feedback sounds the controller may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    /// A mark was placed.
    Move,
    /// The local side won.
    Win,
    /// The local side lost.
    Lose,
    /// The game ended level.
    Draw,
}

/// Presentation surface driven by the turn controller.
///
/// Cell activation flows the other way: the adapter's event loop calls
/// the controller's `handle_cell` with the activated index.
pub trait GameUi {
    /// Redraws the board snapshot.
    fn render_board(&mut self, board: &Board);
    /// Shows a status line.
    fn render_status(&mut self, text: &str);
    /// Enables or disables cell activation.
    fn lock_input(&mut self, locked: bool);
    /// Plays a feedback sound.
    fn play_sound(&mut self, kind: SoundKind);
}
