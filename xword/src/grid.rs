use crate::Direction::{Across, Down};
use crate::{Cell, Clue, Direction, Pos, Puzzle};
use std::collections::HashMap;
use std::fmt::Display;

/// A [Puzzle] indexed for the lookups solving needs: squares by position, start
/// squares by clue number, and each direction's clues in numerical order.
///
/// The puzzle is never modified once loaded. Lookups tolerate inconsistent data
/// (missing squares, clues without a start square) by reporting "not found".
#[derive(Debug)]
pub struct Grid {
  id: u64,
  title: String,
  size: usize,
  cells: Vec<Cell>,
  /// Position to the index of the square there in `cells`. Only squares inside the
  /// grid are indexed, so this is bounded by the cell list, not by `size`.
  index: HashMap<Pos, usize>,
  /// The indexed squares in row-major order.
  reading_order: Vec<usize>,
  /// Clue number to the index of the first square carrying that number.
  numbered: HashMap<u32, usize>,
  across: Vec<Clue>,
  down: Vec<Clue>,
}

impl Grid {
  pub fn new(puzzle: Puzzle) -> Self {
    let size = puzzle.grid_size;
    let mut index = HashMap::with_capacity(puzzle.cells.len());
    let mut numbered = HashMap::new();

    for (i, cell) in puzzle.cells.iter().enumerate() {
      if cell.row < size && cell.col < size {
        // Duplicated coordinates keep the first square listed.
        index.entry(cell.pos()).or_insert(i);
      }
      if let Some(number) = cell.number {
        numbered.entry(number).or_insert(i);
      }
    }
    let mut reading_order: Vec<usize> = index.values().copied().collect();
    reading_order.sort_by_key(|&i| puzzle.cells[i].pos());

    let (mut across, mut down): (Vec<Clue>, Vec<Clue>) = puzzle
      .clues
      .into_iter()
      .partition(|clue| clue.direction == Across);
    across.sort_by_key(|clue| clue.number);
    down.sort_by_key(|clue| clue.number);

    Self {
      id: puzzle.id,
      title: puzzle.title,
      size,
      cells: puzzle.cells,
      index,
      reading_order,
      numbered,
      across,
      down,
    }
  }

  pub fn id(&self) -> u64 {
    self.id
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  /// The grid is this many squares wide, and this many squares high.
  pub fn size(&self) -> usize {
    self.size
  }

  /// Every square of the puzzle, in the order the puzzle listed them.
  pub fn cells(&self) -> &[Cell] {
    &self.cells
  }

  /// Returns the square at the given [Pos], if the puzzle has one there.
  pub fn cell(&self, pos: Pos) -> Option<&Cell> {
    self.index.get(&pos).map(|&i| &self.cells[i])
  }

  /// Whether there is a square at `pos` that can hold a letter.
  pub fn is_white(&self, pos: Pos) -> bool {
    self.cell(pos).is_some_and(Cell::is_white)
  }

  /// The white squares, from left to right and top to bottom.
  pub fn white_cells(&self) -> impl Iterator<Item = &Cell> {
    self
      .reading_order
      .iter()
      .map(|&i| &self.cells[i])
      .filter(|cell| cell.is_white())
  }

  pub fn white_count(&self) -> usize {
    self.white_cells().count()
  }

  /// The clues in the given direction, sorted by number.
  pub fn clues(&self, direction: Direction) -> &[Clue] {
    match direction {
      Across => &self.across,
      Down => &self.down,
    }
  }

  /// The square whose number is `number`, which is where that number's clues start.
  pub fn clue_start_cell(&self, number: u32) -> Option<&Cell> {
    self.numbered.get(&number).map(|&i| &self.cells[i])
  }

  /// The first numbered white square in the puzzle's listing order. A freshly loaded
  /// puzzle starts with this square selected.
  pub fn first_numbered_cell(&self) -> Option<&Cell> {
    self
      .cells
      .iter()
      .find(|cell| cell.is_white() && cell.number.is_some() && self.is_white(cell.pos()))
  }

  /// The position one square before `pos` in `direction`, i.e. to the left for
  /// Across and above for Down. `None` at the edge of the grid.
  pub(crate) fn step_back(&self, (row, col): Pos, direction: Direction) -> Option<Pos> {
    match direction {
      Across => col.checked_sub(1).map(|col| (row, col)),
      Down => row.checked_sub(1).map(|row| (row, col)),
    }
  }

  /// The position one square after `pos` in `direction`. `None` at the edge of the grid.
  pub(crate) fn step_forward(&self, (row, col): Pos, direction: Direction) -> Option<Pos> {
    let (row, col) = match direction {
      Across => (row, col + 1),
      Down => (row + 1, col),
    };
    (row < self.size && col < self.size).then_some((row, col))
  }

  /// The squares of the word through `pos` in `direction`, in reading order: the
  /// maximal run of white squares containing `pos`. Empty if `pos` is not a white
  /// square.
  pub fn word_cells(&self, pos: Pos, direction: Direction) -> Vec<&Cell> {
    if !self.is_white(pos) {
      return Vec::new();
    }

    let mut start = pos;
    while let Some(prev) = self
      .step_back(start, direction)
      .filter(|&p| self.is_white(p))
    {
      start = prev;
    }

    let mut word = Vec::new();
    let mut next = Some(start);
    while let Some(cell) = next.and_then(|p| self.cell(p)).filter(|c| c.is_white()) {
      word.push(cell);
      next = self.step_forward(cell.pos(), direction);
    }
    word
  }

  /// The index, within [Grid::clues], of the clue whose start square lies in the
  /// word through `pos`.
  pub fn clue_index(&self, pos: Pos, direction: Direction) -> Option<usize> {
    let clues = self.clues(direction);
    self
      .word_cells(pos, direction)
      .into_iter()
      .find_map(|cell| {
        let number = cell.number?;
        if self.clue_start_cell(number)?.pos() != cell.pos() {
          return None;
        }
        clues.binary_search_by_key(&number, |clue| clue.number).ok()
      })
  }

  /// The clue for the word through `pos` in `direction`.
  pub fn clue_for(&self, pos: Pos, direction: Direction) -> Option<&Clue> {
    self
      .clue_index(pos, direction)
      .map(|i| &self.clues(direction)[i])
  }
}

/// Draws the layout of the grid, one line per row: `■` for black squares, the
/// solution letter for white ones, `?` where the solution is unknown and a space
/// where the puzzle has no square at all.
impl Display for Grid {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for row in 0..self.size {
      for col in 0..self.size {
        match self.cell((row, col)) {
          None => write!(f, " ")?,
          Some(cell) if cell.is_black() => write!(f, "■")?,
          Some(cell) => write!(f, "{}", cell.solution.as_deref().unwrap_or("?"))?,
        }
      }
      writeln!(f)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fixtures::puzzle_from_rows;

  fn basic_grid() -> Grid {
    let grid = Grid::new(puzzle_from_rows(&["AB.C", "DE.F", "G.HI", "JKLM"]));

    #[rustfmt::skip]
    assert_eq!(
      grid.to_string(),
      concat!(
        "AB■C\n",
        "DE■F\n",
        "G■HI\n",
        "JKLM\n",
      )
    );

    grid
  }

  fn positions(cells: Vec<&Cell>) -> Vec<Pos> {
    cells.into_iter().map(Cell::pos).collect()
  }

  #[test]
  fn word_cells_walk_to_black_squares_and_edges() {
    let grid = basic_grid();

    assert_eq!(positions(grid.word_cells((0, 1), Across)), [(0, 0), (0, 1)]);
    assert_eq!(positions(grid.word_cells((3, 2), Across)), [(3, 0), (3, 1), (3, 2), (3, 3)]);
    assert_eq!(positions(grid.word_cells((2, 0), Down)), [(0, 0), (1, 0), (2, 0), (3, 0)]);
    assert_eq!(positions(grid.word_cells((3, 2), Down)), [(2, 2), (3, 2)]);
    // A single square between a black square and the edge is a word of its own.
    assert_eq!(positions(grid.word_cells((0, 3), Across)), [(0, 3)]);
  }

  #[test]
  fn word_cells_of_black_or_missing_square_is_empty() {
    let grid = basic_grid();
    assert!(grid.word_cells((0, 2), Across).is_empty());
    assert!(grid.word_cells((9, 9), Down).is_empty());
  }

  #[test]
  fn every_square_of_a_word_yields_the_same_word() {
    let grid = basic_grid();
    for cell in grid.white_cells() {
      for direction in [Across, Down] {
        let word = positions(grid.word_cells(cell.pos(), direction));
        assert!(word.contains(&cell.pos()));
        for &pos in &word {
          assert_eq!(positions(grid.word_cells(pos, direction)), word);
        }
      }
    }
  }

  #[test]
  fn clue_lookups() {
    let grid = basic_grid();

    let across: Vec<u32> = grid.clues(Across).iter().map(|c| c.number).collect();
    let down: Vec<u32> = grid.clues(Down).iter().map(|c| c.number).collect();
    assert_eq!(across, [1, 4, 5, 6]);
    assert_eq!(down, [1, 2, 3, 5]);

    assert_eq!(grid.clue_start_cell(5).map(Cell::pos), Some((2, 2)));
    assert_eq!(grid.clue_start_cell(6).map(Cell::pos), Some((3, 0)));
    assert_eq!(grid.clue_start_cell(42), None);

    assert_eq!(grid.clue_for((1, 1), Across).map(|c| c.number), Some(4));
    assert_eq!(grid.clue_for((1, 1), Down).map(|c| c.number), Some(2));
    assert_eq!(grid.clue_for((3, 3), Down).map(|c| c.number), Some(3));
    assert_eq!(grid.clue_index((3, 3), Across), Some(3));
    // The lone square at the top right has no across clue.
    assert_eq!(grid.clue_for((0, 3), Across), None);
  }

  #[test]
  fn counts_and_first_square() {
    let grid = basic_grid();
    assert_eq!(grid.white_count(), 13);
    assert_eq!(grid.first_numbered_cell().map(Cell::pos), Some((0, 0)));
    assert!(grid.is_white((3, 1)));
    assert!(!grid.is_white((2, 1)));
    assert!(!grid.is_white((4, 0)));
  }

  #[test]
  fn tolerates_missing_and_out_of_range_cells() {
    let mut puzzle = puzzle_from_rows(&["AB", "CD"]);
    puzzle.cells.retain(|cell| cell.pos() != (1, 1));
    puzzle.cells.push(Cell {
      row: 5,
      col: 0,
      solution: Some("Z".to_string()),
      number: None,
      is_black_square: false,
    });
    let grid = Grid::new(puzzle);

    assert_eq!(grid.to_string(), "AB\nC \n");
    assert_eq!(grid.white_count(), 3);
    assert_eq!(positions(grid.word_cells((1, 0), Across)), [(1, 0)]);
    assert_eq!(positions(grid.word_cells((0, 1), Down)), [(0, 1)]);
  }

  #[test]
  fn oversized_grid_with_few_cells() {
    let puzzle = Puzzle::from_json(
      r#"{"title": "Big", "grid_size": 5000000000,
        "cells": [{"row": 0, "col": 0, "solution": "A", "number": 1},
                  {"row": 0, "col": 1, "solution": "B"},
                  {"row": 7000000000, "col": 0, "solution": "Z"}],
        "clues": [{"number": 1, "direction": "ACROSS", "text": "Start", "answer": "AB"}]}"#,
    )
    .unwrap();
    let grid = Grid::new(puzzle);

    assert_eq!(grid.size(), 5_000_000_000);
    assert_eq!(grid.white_count(), 2);
    assert_eq!(positions(grid.word_cells((0, 0), Across)), [(0, 0), (0, 1)]);
    assert_eq!(grid.clue_for((0, 1), Across).map(|c| c.number), Some(1));
    assert!(!grid.is_white((4_999_999_999, 4_999_999_999)));
  }
}
