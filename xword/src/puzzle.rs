use crate::progress::SavedProgress;
use crate::{Direction, Error, Pos};
use serde::{Deserialize, Serialize};
use std::io::Read;

/// A square in a crossword grid, as served by the puzzle backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
  pub row: usize,
  pub col: usize,
  /// The expected letter. Absent for black squares, and for white squares whose
  /// answer the source didn't provide.
  #[serde(default)]
  pub solution: Option<String>,
  /// The clue number printed in this square, if it starts a word.
  #[serde(default)]
  pub number: Option<u32>,
  #[serde(default)]
  pub is_black_square: bool,
}

impl Cell {
  pub fn pos(&self) -> Pos {
    (self.row, self.col)
  }

  /// Whether this is a black square, which is never part of a word.
  pub fn is_black(&self) -> bool {
    self.is_black_square
  }

  /// Whether this square can hold a letter.
  pub fn is_white(&self) -> bool {
    !self.is_black()
  }

  /// Compares `entry` with the solution, ignoring case. Returns `None` when the
  /// solution is unknown, since such a square can be neither right nor wrong.
  pub fn matches(&self, entry: &str) -> Option<bool> {
    self
      .solution
      .as_deref()
      .map(|solution| solution.to_uppercase() == entry.to_uppercase())
  }
}

/// A clue, identified by its number and [Direction].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
  pub number: u32,
  pub direction: Direction,
  pub text: String,
  #[serde(default)]
  pub answer: String,
}

/// A puzzle as delivered by the puzzle backend: an N×N list of cells plus clues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Puzzle {
  #[serde(default)]
  pub id: u64,
  pub title: String,
  /// The grid is `grid_size` squares wide and `grid_size` squares high.
  pub grid_size: usize,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub difficulty: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub cells: Vec<Cell>,
  pub clues: Vec<Clue>,
  /// Progress the backend embedded in the puzzle response for the current user.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_progress: Option<SavedProgress>,
}

impl Puzzle {
  /// Parses a puzzle from its JSON representation.
  pub fn from_json(json: &str) -> Result<Self, Error> {
    Ok(serde_json::from_str(json)?)
  }

  /// Reads a puzzle from a JSON stream, such as a file.
  pub fn from_reader(reader: impl Read) -> Result<Self, Error> {
    Ok(serde_json::from_reader(reader)?)
  }
}
