use crate::navigate::Move;
use crate::{Clock, SolveSession};

/// A keystroke, as far as solving is concerned.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Input {
  /// A letter key. Anything but ASCII letters is ignored.
  Letter(char),
  Arrow(Move),
  Backspace,
  Delete,
  /// Switches between Across and Down.
  Space,
  Tab,
  /// Shift-Tab.
  BackTab,
  Enter,
  /// Drops the selection.
  Escape,
}

impl<C: Clock> SolveSession<C> {
  /// Applies one keystroke, returning whether it did anything.
  ///
  /// Keys are ignored while nothing is selected and once the puzzle is complete.
  /// Any key that is handled starts the timer if it isn't running.
  pub fn handle(&mut self, input: Input) -> bool {
    if self.selection().is_none() || self.is_completed() {
      return false;
    }
    if let Input::Letter(letter) = input {
      if !letter.is_ascii_alphabetic() {
        return false;
      }
    }

    self.start_timer();
    match input {
      Input::Letter(letter) => self.enter_letter(letter),
      Input::Arrow(step) => self.move_cursor(step),
      Input::Backspace | Input::Delete => self.delete_letter_and_move(),
      Input::Space => self.toggle_direction(),
      Input::Tab | Input::Enter => self.move_to_next_empty_word(),
      Input::BackTab => self.move_to_previous_empty_word(),
      Input::Escape => self.deselect(),
    }
    true
  }
}
