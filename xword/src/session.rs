use crate::Direction::Across;
use crate::navigate::{self, Move};
use crate::{
  Cell, Clock, Clue, Direction, Grid, Pos, Progress, ProgressSnapshot, Puzzle, SavedProgress,
  SystemClock, Timer, UserGrid,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// The verdict of checking a square against its solution.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckResult {
  Correct,
  Incorrect,
}

/// Indicates how a particular square should look. For instance, [Standard](Self::Standard)
/// might map to white, [Cursor](Self::Cursor) to red, and [Word](Self::Word) to yellow.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SquareStyle {
  /// A black square, or a position the puzzle has no square for.
  Black,
  /// Any white square of a completed puzzle.
  Solved,
  /// The cursor is positioned on this square.
  Cursor,
  /// The square was checked, or revealed, and is right.
  Correct,
  /// The square was checked and is wrong.
  Incorrect,
  /// The cursor is not on this square, but the word indicated by the cursor includes this square.
  Word,
  /// Default styling
  Standard,
}

/// The state of solving one puzzle: the entries, the cursor, check marks, completion
/// and solving time.
///
/// Every method is one complete transition. A transition that doesn't apply, such
/// as a move with nothing selected, leaves the session as it was. Once the puzzle
/// is completed, transitions that would change entries are refused.
#[derive(Debug)]
pub struct SolveSession<C: Clock = SystemClock> {
  grid: Grid,
  entries: UserGrid,
  selection: Option<Pos>,
  direction: Direction,
  checked: BTreeMap<Pos, CheckResult>,
  has_been_checked: bool,
  is_completed: bool,
  timer: Timer,
  clock: C,
}

impl SolveSession {
  /// Opens `puzzle` for solving, timed by the system clock.
  pub fn new(puzzle: Puzzle) -> Self {
    Self::with_clock(puzzle, SystemClock)
  }
}

impl<C: Clock> SolveSession<C> {
  /// Opens `puzzle` for solving. Entries the puzzle carries in its embedded progress
  /// are loaded; timing and completion start afresh. The first numbered square is
  /// selected, going Across.
  pub fn with_clock(mut puzzle: Puzzle, clock: C) -> Self {
    let entries = puzzle
      .user_progress
      .take()
      .map(|saved| saved.user_grid())
      .unwrap_or_default();
    let grid = Grid::new(puzzle);
    let selection = grid.first_numbered_cell().map(Cell::pos);

    Self {
      grid,
      entries,
      selection,
      direction: Across,
      checked: BTreeMap::new(),
      has_been_checked: false,
      is_completed: false,
      timer: Timer::new(),
      clock,
    }
  }

  pub fn grid(&self) -> &Grid {
    &self.grid
  }

  pub fn entries(&self) -> &UserGrid {
    &self.entries
  }

  /// The entry at `pos`, if any.
  pub fn entry(&self, pos: Pos) -> Option<&str> {
    self.entries.get(pos)
  }

  pub fn selection(&self) -> Option<Pos> {
    self.selection
  }

  pub fn direction(&self) -> Direction {
    self.direction
  }

  pub fn check_result(&self, pos: Pos) -> Option<CheckResult> {
    self.checked.get(&pos).copied()
  }

  pub fn has_been_checked(&self) -> bool {
    self.has_been_checked
  }

  pub fn is_completed(&self) -> bool {
    self.is_completed
  }

  pub fn progress(&self) -> Progress {
    Progress::measure(&self.grid, &self.entries)
  }

  /// The squares of the selected word.
  pub fn current_word(&self) -> Vec<&Cell> {
    self
      .selection
      .map(|pos| self.grid.word_cells(pos, self.direction))
      .unwrap_or_default()
  }

  pub fn is_in_current_word(&self, pos: Pos) -> bool {
    self.current_word().iter().any(|cell| cell.pos() == pos)
  }

  /// The clue for the selected word.
  pub fn current_clue(&self) -> Option<&Clue> {
    let pos = self.selection?;
    self.grid.clue_for(pos, self.direction)
  }

  /// The clue for the word crossing the selected one at the cursor. A crossing word of
  /// a single square has no clue worth showing.
  pub fn crossing_clue(&self) -> Option<&Clue> {
    let pos = self.selection?;
    if self.grid.word_cells(pos, !self.direction).len() < 2 {
      return None;
    }
    self.grid.clue_for(pos, !self.direction)
  }

  /// The number printed in the first square of the selected word.
  pub fn selected_clue_number(&self) -> Option<u32> {
    self.current_word().first().and_then(|cell| cell.number)
  }

  /// Determines how a particular square should be styled.
  /// See [SquareStyle].
  pub fn square_style(&self, pos: Pos) -> SquareStyle {
    if !self.grid.is_white(pos) {
      return SquareStyle::Black;
    }
    if self.is_completed {
      return SquareStyle::Solved;
    }
    if self.selection == Some(pos) {
      return SquareStyle::Cursor;
    }
    match self.check_result(pos) {
      Some(CheckResult::Correct) => SquareStyle::Correct,
      Some(CheckResult::Incorrect) => SquareStyle::Incorrect,
      None if self.is_in_current_word(pos) => SquareStyle::Word,
      None => SquareStyle::Standard,
    }
  }

  fn move_to(&mut self, pos: Option<Pos>) {
    if let Some(pos) = pos {
      debug!("Cursor {:?} -> {:?} ({:?})", self.selection, pos, self.direction);
      self.selection = Some(pos);
    }
  }

  /// Selects the square at `pos`, keeping the direction. Black squares and
  /// positions outside the grid can't be selected.
  pub fn select_cell(&mut self, pos: Pos) {
    if self.grid.is_white(pos) {
      self.selection = Some(pos);
    }
  }

  /// Drops the selection altogether.
  pub fn deselect(&mut self) {
    self.selection = None;
  }

  pub fn toggle_direction(&mut self) {
    self.direction = !self.direction;
  }

  /// Moves the cursor one square with the arrow keys. A black square in the way
  /// blocks the move.
  pub fn move_cursor(&mut self, step: Move) {
    let Some(pos) = self.selection else {
      return;
    };
    self.move_to(navigate::adjacent(&self.grid, pos, step));
  }

  /// Writes `letter`, upper-cased, into the selected square and moves on: to the
  /// next word with an empty square if this completed the word, otherwise to the
  /// first empty square left in the word.
  pub fn enter_letter(&mut self, letter: char) {
    let Some(pos) = self.selection else {
      return;
    };
    if self.is_completed || letter.is_whitespace() || letter.is_control() {
      return;
    }

    self.entries.set(pos, letter.to_uppercase().collect::<String>());
    self.evaluate_completion();

    let word = self.grid.word_cells(pos, self.direction);
    let target = if word.iter().all(|cell| self.entries.is_filled(cell.pos())) {
      navigate::next_word_with_empty_cell(&self.grid, &self.entries, pos, self.direction)
    } else {
      word
        .iter()
        .map(|cell| cell.pos())
        .find(|&other| other != pos && !self.entries.is_filled(other))
        .or_else(|| navigate::next_cell(&self.grid, pos, self.direction))
    };
    self.move_to(target);
  }

  /// Empties the selected square without moving.
  pub fn delete_letter(&mut self) {
    let Some(pos) = self.selection else {
      return;
    };
    if !self.is_completed {
      self.entries.clear(pos);
    }
  }

  /// Backspace: empties the selected square, or, if it was already empty, moves back
  /// a square (see [navigate::previous_cell]).
  pub fn delete_letter_and_move(&mut self) {
    let Some(pos) = self.selection else {
      return;
    };
    if self.is_completed {
      return;
    }
    if self.entries.clear(pos).is_none() {
      let target = navigate::previous_cell(&self.grid, &self.entries, pos, self.direction);
      self.move_to(target);
    }
  }

  /// Tab: on to the next word with an empty square, wrapping around.
  pub fn move_to_next_empty_word(&mut self) {
    let Some(pos) = self.selection else {
      return;
    };
    let target = navigate::next_word_with_empty_cell(&self.grid, &self.entries, pos, self.direction);
    self.move_to(target);
  }

  /// Shift-Tab: back to the previous word with an empty square, wrapping around.
  pub fn move_to_previous_empty_word(&mut self) {
    let Some(pos) = self.selection else {
      return;
    };
    let target =
      navigate::previous_word_with_empty_cell(&self.grid, &self.entries, pos, self.direction);
    self.move_to(target);
  }

  /// On to the start of the next word, whether or not it is filled. Stops at the
  /// last word.
  pub fn move_to_next_word(&mut self) {
    let Some(pos) = self.selection else {
      return;
    };
    self.move_to(navigate::next_word_start(&self.grid, pos, self.direction));
  }

  /// On to the next empty square of the current word, or a square forward if there
  /// is none.
  pub fn move_to_next_empty_cell(&mut self) {
    let Some(pos) = self.selection else {
      return;
    };
    let target = navigate::next_empty_in_word(&self.grid, &self.entries, pos, self.direction);
    self.move_to(target);
  }

  fn evaluate_completion(&mut self) {
    if self.is_completed || !self.progress().is_complete() {
      return;
    }
    self.is_completed = true;
    self.timer.stop(self.clock.now());
    info!(
      "Solved puzzle {} ({:?}) in {}",
      self.grid.id(),
      self.grid.title(),
      crate::format_elapsed(self.timer.accumulated())
    );
  }

  /// Marks every filled square whose solution is known as correct or incorrect.
  /// Marks from an earlier check are replaced. Entries are left alone.
  pub fn check_puzzle(&mut self) {
    self.checked.clear();
    self.has_been_checked = true;
    for cell in self.grid.white_cells() {
      let verdict = self
        .entries
        .get(cell.pos())
        .and_then(|entry| cell.matches(entry));
      match verdict {
        Some(true) => self.checked.insert(cell.pos(), CheckResult::Correct),
        Some(false) => self.checked.insert(cell.pos(), CheckResult::Incorrect),
        None => None,
      };
    }
  }

  /// Fills each of `positions` with its solution and marks it correct. Squares
  /// without a known solution are skipped.
  fn reveal(&mut self, positions: Vec<Pos>) {
    if self.is_completed {
      return;
    }
    for pos in positions {
      let Some(solution) = self.grid.cell(pos).and_then(|cell| cell.solution.as_deref()) else {
        continue;
      };
      self.entries.set(pos, solution);
      self.checked.insert(pos, CheckResult::Correct);
    }
  }

  /// Reveals the selected square.
  pub fn reveal_letter(&mut self) {
    let Some(pos) = self.selection else {
      return;
    };
    if self.grid.is_white(pos) {
      self.reveal(vec![pos]);
    }
  }

  /// Reveals every square of the selected word.
  pub fn reveal_word(&mut self) {
    let word = self.current_word().into_iter().map(Cell::pos).collect();
    self.reveal(word);
  }

  /// Reveals the whole puzzle. Revealing does not by itself complete the puzzle or
  /// stop the timer.
  pub fn reveal_puzzle(&mut self) {
    let all = self.grid.white_cells().map(Cell::pos).collect();
    self.reveal(all);
  }

  /// Empties every square and forgets all check marks. The cursor and the timer are
  /// untouched.
  pub fn clear_puzzle(&mut self) {
    if self.is_completed {
      return;
    }
    self.entries = UserGrid::new();
    self.checked.clear();
    self.has_been_checked = false;
  }

  /// Starts or resumes the timer. A completed puzzle's timer stays stopped.
  pub fn start_timer(&mut self) {
    if !self.is_completed {
      self.timer.start(self.clock.now());
    }
  }

  /// Pauses the timer, e.g. when the solver looks away.
  pub fn stop_timer(&mut self) {
    self.timer.stop(self.clock.now());
  }

  /// Sets the solving time back to zero.
  pub fn reset_timer(&mut self) {
    self.timer.reset(self.clock.now());
  }

  pub fn is_timer_running(&self) -> bool {
    self.timer.is_running()
  }

  /// Solving time so far, including the running interval.
  pub fn elapsed(&self) -> Duration {
    self.timer.elapsed(self.clock.now())
  }

  pub fn elapsed_ms(&self) -> u128 {
    self.elapsed().as_millis()
  }

  /// Replaces all entries with `entries`. Nothing is merged.
  pub fn load_user_grid(&mut self, entries: UserGrid) {
    self.entries = entries;
  }

  /// Resumes from progress saved earlier. The saved grid replaces the current one
  /// (an unreadable grid counts as empty) and check marks are dropped. A saved
  /// solving time replaces the current one. Completion is taken from the save, and
  /// a puzzle saved as completed is locked.
  pub fn restore(&mut self, saved: &SavedProgress) {
    self.entries = saved.user_grid();
    self.checked.clear();
    self.has_been_checked = false;
    if let Some(secs) = saved.completion_time.filter(|&secs| secs > 0) {
      self.timer.set_elapsed(Duration::from_secs(secs));
    }
    self.is_completed = saved.is_completed;
    if saved.is_completed {
      self.timer.stop(self.clock.now());
    }
  }

  /// Everything a collaborator needs to save this session.
  pub fn snapshot(&self) -> ProgressSnapshot {
    ProgressSnapshot {
      current_state: self.entries.clone(),
      completion_percentage: self.progress().percentage,
      completion_time: self.elapsed().as_secs(),
      is_completed: self.is_completed,
    }
  }
}
