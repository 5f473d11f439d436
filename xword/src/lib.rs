//! This crate is meant to be used as the foundation for a crossword solving app.
//! It provides no UI itself, but see `xwordtui` for an example of how you can use it
//! to produce a crossword app.
//!
//! Puzzles arrive as JSON documents (see [Puzzle]) and are indexed into a [Grid].
//! Everything that changes while a puzzle is being solved lives in a [SolveSession],
//! which is driven one input event at a time and can be snapshotted for saving at
//! any point.

use Direction::{Across, Down};
use serde::{Deserialize, Serialize};
use std::ops::Not;

#[cfg(test)]
mod fixtures;
mod grid;
mod input;
pub mod navigate;
mod progress;
mod puzzle;
mod session;
mod timer;

pub use grid::Grid;
pub use input::Input;
pub use navigate::Move;
pub use progress::{Progress, ProgressSnapshot, SavedProgress, UserGrid, cell_key, parse_cell_key};
pub use puzzle::{Cell, Clue, Puzzle};
pub use session::{CheckResult, SolveSession, SquareStyle};
pub use timer::{Clock, SystemClock, Timer, format_elapsed};

/// The two crossword directions: `Across` and `Down`
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
  Across,
  Down,
}

impl Not for Direction {
  type Output = Self;
  fn not(self) -> Self {
    match self {
      Across => Down,
      Down => Across,
    }
  }
}

/// A position in a grid: (row, column)
pub type Pos = (usize, usize);

/// The errors that may be produced by functions in this crate.
///
/// Solving itself never fails: a transition that cannot be carried out is a no-op.
/// Errors only come from reading puzzles and saved progress.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// A puzzle or progress document was not valid JSON, or had the wrong shape.
  #[error("invalid JSON: {0}")]
  Json(#[from] serde_json::Error),
  /// A key of a saved grid was not of the form `"row,col"`.
  #[error("invalid cell key {0:?}")]
  InvalidCellKey(String),
  /// An [I/O error](std::io::Error) occurred.
  #[error(transparent)]
  Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn direction_round_trips_through_backend_names() {
    assert_eq!(serde_json::to_string(&Across).unwrap(), "\"ACROSS\"");
    assert_eq!(serde_json::from_str::<Direction>("\"DOWN\"").unwrap(), Down);
    assert_eq!(!Across, Down);
    assert_eq!(!!Down, Down);
  }
}
