//! Puzzles drawn as strings, for tests.

use crate::Direction::{self, Across, Down};
use crate::{Cell, Clue, Puzzle};

/// Builds a square puzzle from rows of solution letters, `.` marking black squares.
/// Squares are numbered the usual way, and every word of two or more letters gets a
/// clue whose answer is that word.
pub(crate) fn puzzle_from_rows(rows: &[&str]) -> Puzzle {
  let size = rows.len();
  let grid: Vec<Vec<char>> = rows.iter().map(|row| row.chars().collect()).collect();
  let white = |row: usize, col: usize| grid[row][col] != '.';

  let mut cells = Vec::new();
  let mut clues = Vec::new();
  let mut next_number = 1;

  for row in 0..size {
    for col in 0..size {
      let starts_across = white(row, col)
        && (col == 0 || !white(row, col - 1))
        && col + 1 < size
        && white(row, col + 1);
      let starts_down = white(row, col)
        && (row == 0 || !white(row - 1, col))
        && row + 1 < size
        && white(row + 1, col);

      let number = (starts_across || starts_down).then(|| {
        next_number += 1;
        next_number - 1
      });
      if let Some(number) = number {
        for (starts, direction) in [(starts_across, Across), (starts_down, Down)] {
          if starts {
            clues.push(Clue {
              number,
              direction,
              text: format!("{number} {direction:?}"),
              answer: answer(&grid, row, col, direction),
            });
          }
        }
      }

      cells.push(Cell {
        row,
        col,
        solution: white(row, col).then(|| grid[row][col].to_string()),
        number,
        is_black_square: !white(row, col),
      });
    }
  }

  Puzzle {
    id: 1,
    title: "Test".to_string(),
    grid_size: size,
    difficulty: None,
    description: None,
    cells,
    clues,
    user_progress: None,
  }
}

fn answer(grid: &[Vec<char>], mut row: usize, mut col: usize, direction: Direction) -> String {
  let mut answer = String::new();
  while row < grid.len() && col < grid.len() && grid[row][col] != '.' {
    answer.push(grid[row][col]);
    match direction {
      Across => col += 1,
      Down => row += 1,
    }
  }
  answer
}
