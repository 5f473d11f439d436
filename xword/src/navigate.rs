//! Where the cursor goes next. Each search takes the current square and direction
//! and returns the square to move to, or `None` if the cursor should stay put.
//!
//! Word-to-word searches only consider clues in the current direction, in order of
//! clue number.

use crate::{Cell, Clue, Direction, Grid, Pos, UserGrid};

/// A step of the arrow keys.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Move {
  Up,
  Down,
  Left,
  Right,
}

/// The square next to `pos` in the direction of `step`, provided it is white. The
/// step is clamped to the grid, so at the edge this is `pos` itself.
pub fn adjacent(grid: &Grid, (row, col): Pos, step: Move) -> Option<Pos> {
  let last = grid.size().saturating_sub(1);
  let target = match step {
    Move::Up => (row.saturating_sub(1), col),
    Move::Down => ((row + 1).min(last), col),
    Move::Left => (row, col.saturating_sub(1)),
    Move::Right => (row, (col + 1).min(last)),
  };
  grid.is_white(target).then_some(target)
}

/// The square after `pos` in `direction`, if it is white.
pub fn next_cell(grid: &Grid, pos: Pos, direction: Direction) -> Option<Pos> {
  grid
    .step_forward(pos, direction)
    .filter(|&next| grid.is_white(next))
}

fn first_empty(word: &[&Cell], entries: &UserGrid) -> Option<Pos> {
  word
    .iter()
    .map(|cell| cell.pos())
    .find(|&pos| !entries.is_filled(pos))
}

/// The first empty square of the word belonging to `clue`.
fn first_empty_of_clue(grid: &Grid, entries: &UserGrid, clue: &Clue) -> Option<Pos> {
  let start = grid.clue_start_cell(clue.number)?;
  first_empty(&grid.word_cells(start.pos(), clue.direction), entries)
}

/// The first empty square of the next word, after the current one, that has any.
/// Wraps around to the lowest-numbered clue.
pub fn next_word_with_empty_cell(
  grid: &Grid,
  entries: &UserGrid,
  pos: Pos,
  direction: Direction,
) -> Option<Pos> {
  let current = grid.clue_index(pos, direction)?;
  let clues = grid.clues(direction);
  clues[current + 1..]
    .iter()
    .chain(&clues[..current])
    .find_map(|clue| first_empty_of_clue(grid, entries, clue))
}

/// The first empty square of the closest word, before the current one, that has
/// any. Wraps around to the highest-numbered clue.
pub fn previous_word_with_empty_cell(
  grid: &Grid,
  entries: &UserGrid,
  pos: Pos,
  direction: Direction,
) -> Option<Pos> {
  let current = grid.clue_index(pos, direction)?;
  let clues = grid.clues(direction);
  clues[..current]
    .iter()
    .rev()
    .chain(clues[current + 1..].iter().rev())
    .find_map(|clue| first_empty_of_clue(grid, entries, clue))
}

/// Where backspacing out of an empty square lands: the square before `pos` in its
/// word, or, from the first square of a word, the last filled square of the previous
/// word (its last square if none is filled).
///
/// Unlike the word searches, this does not wrap: backspacing from the first word
/// stays put.
pub fn previous_cell(grid: &Grid, entries: &UserGrid, pos: Pos, direction: Direction) -> Option<Pos> {
  let word = grid.word_cells(pos, direction);
  let at = word.iter().position(|cell| cell.pos() == pos)?;
  if at > 0 {
    return Some(word[at - 1].pos());
  }

  let current = grid.clue_index(pos, direction)?;
  grid.clues(direction)[..current]
    .iter()
    .rev()
    .find_map(|clue| {
      let start = grid.clue_start_cell(clue.number)?;
      let word = grid.word_cells(start.pos(), direction);
      word
        .iter()
        .rev()
        .find(|cell| entries.is_filled(cell.pos()))
        .or(word.last())
        .map(|cell| cell.pos())
    })
}

/// The start of the next word in clue order. Does not wrap.
pub fn next_word_start(grid: &Grid, pos: Pos, direction: Direction) -> Option<Pos> {
  let current = grid.clue_index(pos, direction)?;
  let next = grid.clues(direction).get(current + 1)?;
  grid.clue_start_cell(next.number).map(Cell::pos)
}

/// The first empty square after `pos` in its word, or else the square after `pos`.
pub fn next_empty_in_word(grid: &Grid, entries: &UserGrid, pos: Pos, direction: Direction) -> Option<Pos> {
  let word = grid.word_cells(pos, direction);
  let at = word.iter().position(|cell| cell.pos() == pos)?;
  first_empty(&word[at + 1..], entries).or_else(|| next_cell(grid, pos, direction))
}
