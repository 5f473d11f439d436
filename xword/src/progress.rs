use crate::{Error, Grid, Pos};
use log::warn;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Formats a position the way saved grids key their entries: `"row,col"`.
pub fn cell_key((row, col): Pos) -> String {
  format!("{row},{col}")
}

/// Parses a `"row,col"` key back into a position.
pub fn parse_cell_key(key: &str) -> Result<Pos, Error> {
  let invalid = || Error::InvalidCellKey(key.to_string());
  let (row, col) = key.split_once(',').ok_or_else(invalid)?;
  let row = row.trim().parse().map_err(|_| invalid())?;
  let col = col.trim().parse().map_err(|_| invalid())?;
  Ok((row, col))
}

/// The letters the solver has entered, by position. Squares without an entry are
/// empty; an entry is never the empty string.
///
/// Serialized as the JSON object the backend stores, keyed by [cell_key].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserGrid(BTreeMap<Pos, String>);

impl UserGrid {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reads a grid from its JSON form.
  pub fn from_json(json: &str) -> Result<Self, Error> {
    Ok(serde_json::from_str(json)?)
  }

  /// Returns the entry at `pos`, if there is one.
  pub fn get(&self, pos: Pos) -> Option<&str> {
    self.0.get(&pos).map(String::as_str)
  }

  pub fn is_filled(&self, pos: Pos) -> bool {
    self.0.contains_key(&pos)
  }

  /// Writes `entry` at `pos`. Writing an empty string clears the square.
  pub fn set(&mut self, pos: Pos, entry: impl Into<String>) {
    let entry = entry.into();
    if entry.is_empty() {
      self.0.remove(&pos);
    } else {
      self.0.insert(pos, entry);
    }
  }

  /// Empties the square at `pos`, returning what was there.
  pub fn clear(&mut self, pos: Pos) -> Option<String> {
    self.0.remove(&pos)
  }

  /// The number of squares with an entry.
  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (Pos, &str)> {
    self.0.iter().map(|(&pos, entry)| (pos, entry.as_str()))
  }
}

impl<S: Into<String>> FromIterator<(Pos, S)> for UserGrid {
  fn from_iter<I: IntoIterator<Item = (Pos, S)>>(iter: I) -> Self {
    let mut grid = Self::new();
    for (pos, entry) in iter {
      grid.set(pos, entry);
    }
    grid
  }
}

impl Serialize for UserGrid {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.0.len()))?;
    for (&pos, entry) in &self.0 {
      map.serialize_entry(&cell_key(pos), entry)?;
    }
    map.end()
  }
}

/// Cleared squares may be saved as `""` or `null`; both load as empty. Keys that
/// don't name a position are dropped.
impl<'de> Deserialize<'de> for UserGrid {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = BTreeMap::<String, Option<String>>::deserialize(deserializer)?;
    let mut grid = Self::new();
    for (key, entry) in raw {
      match parse_cell_key(&key) {
        Ok(pos) => grid.set(pos, entry.unwrap_or_default()),
        Err(e) => warn!("Dropping saved entry: {e}"),
      }
    }
    Ok(grid)
  }
}

/// Progress as the backend returns it when a puzzle is reopened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedProgress {
  /// The saved [UserGrid]. The backend stores it JSON-encoded, so this is usually a
  /// string holding JSON, but a plain object is accepted too.
  #[serde(default)]
  pub current_state: Option<Value>,
  /// Solving time so far, in seconds.
  #[serde(default)]
  pub completion_time: Option<u64>,
  #[serde(default)]
  pub is_completed: bool,
}

impl SavedProgress {
  /// Decodes the saved grid. A corrupt grid is reported and treated as empty, so a
  /// bad save never keeps a puzzle from opening.
  pub fn user_grid(&self) -> UserGrid {
    let decoded = match &self.current_state {
      None => return UserGrid::new(),
      Some(Value::String(encoded)) => UserGrid::from_json(encoded),
      Some(state) => UserGrid::deserialize(state).map_err(Error::from),
    };
    decoded.unwrap_or_else(|e| {
      warn!("Saved grid is unreadable, starting from an empty grid: {e}");
      UserGrid::new()
    })
  }
}

/// What a session hands over to be saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
  pub current_state: UserGrid,
  /// Share of white squares filled in, from 0 to 100.
  pub completion_percentage: f64,
  /// Solving time in whole seconds, rounded down.
  pub completion_time: u64,
  pub is_completed: bool,
}

/// How far along a puzzle is.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Progress {
  /// Share of white squares filled in, from 0 to 100.
  pub percentage: f64,
  pub filled: usize,
  /// The number of white squares.
  pub total: usize,
  /// Filled squares that match their solution. Squares without a known solution
  /// count as neither correct nor incorrect.
  pub correct: usize,
  pub incorrect: usize,
}

impl Progress {
  pub fn measure(grid: &Grid, entries: &UserGrid) -> Self {
    let mut progress = Self::default();
    for cell in grid.white_cells() {
      progress.total += 1;
      let Some(entry) = entries.get(cell.pos()) else {
        continue;
      };
      progress.filled += 1;
      match cell.matches(entry) {
        Some(true) => progress.correct += 1,
        Some(false) => progress.incorrect += 1,
        None => {}
      }
    }
    if progress.total > 0 {
      progress.percentage = progress.filled as f64 / progress.total as f64 * 100.0;
    }
    progress
  }

  /// Every white square is filled and none of them is wrong.
  pub fn is_complete(&self) -> bool {
    self.filled == self.total && self.incorrect == 0
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fixtures::puzzle_from_rows;

  #[test]
  fn cell_keys() {
    assert_eq!(cell_key((3, 12)), "3,12");
    assert_eq!(parse_cell_key("3,12").unwrap(), (3, 12));
    assert_eq!(parse_cell_key(" 0, 4").unwrap(), (0, 4));
    for bad in ["", "3", "a,b", "-1,0", "1,2,3"] {
      assert!(matches!(parse_cell_key(bad), Err(Error::InvalidCellKey(_))), "{bad}");
    }
  }

  #[test]
  fn user_grid_json_uses_cell_keys() {
    let grid: UserGrid = [((0, 0), "C"), ((1, 2), "A")].into_iter().collect();
    assert_eq!(serde_json::to_string(&grid).unwrap(), r#"{"0,0":"C","1,2":"A"}"#);
  }

  #[test]
  fn loading_skips_cleared_and_malformed_entries() {
    let grid = UserGrid::from_json(r#"{"0,0":"C","0,1":"","0,2":null,"x":"Q","2,2":"E"}"#).unwrap();
    assert_eq!(grid.len(), 2);
    assert_eq!(grid.get((0, 0)), Some("C"));
    assert_eq!(grid.get((2, 2)), Some("E"));
    assert!(!grid.is_filled((0, 1)));
  }

  #[test]
  fn setting_empty_string_clears() {
    let mut grid = UserGrid::new();
    grid.set((1, 1), "X");
    assert!(grid.is_filled((1, 1)));
    grid.set((1, 1), "");
    assert!(grid.is_empty());
    assert_eq!(grid.clear((1, 1)), None);
  }

  #[test]
  fn saved_grid_may_be_encoded_or_inline() {
    let encoded: SavedProgress =
      serde_json::from_str(r#"{"current_state": "{\"0,0\":\"C\"}", "completion_time": 42}"#).unwrap();
    assert_eq!(encoded.user_grid().get((0, 0)), Some("C"));
    assert_eq!(encoded.completion_time, Some(42));
    assert!(!encoded.is_completed);

    let inline: SavedProgress =
      serde_json::from_str(r#"{"current_state": {"0,1": "a"}, "is_completed": true}"#).unwrap();
    assert_eq!(inline.user_grid().get((0, 1)), Some("a"));
    assert!(inline.is_completed);
  }

  #[test]
  fn corrupt_saved_grid_is_empty() {
    for state in [r#""{not json""#, "17", "[1, 2]"] {
      let json = format!(r#"{{"current_state": {state}}}"#);
      let saved: SavedProgress = serde_json::from_str(&json).unwrap();
      assert!(saved.user_grid().is_empty(), "{state}");
    }
    assert!(SavedProgress::default().user_grid().is_empty());
  }

  #[test]
  fn measures_progress() {
    let grid = Grid::new(puzzle_from_rows(&["CA.", "RE.", "..T"]));
    let entries: UserGrid = [((0, 0), "c"), ((0, 1), "X"), ((1, 1), "E")].into_iter().collect();

    let progress = Progress::measure(&grid, &entries);
    assert_eq!(progress.total, 5);
    assert_eq!(progress.filled, 3);
    assert_eq!(progress.correct, 2);
    assert_eq!(progress.incorrect, 1);
    assert!((progress.percentage - 60.0).abs() < 1e-9);
    assert!(!progress.is_complete());

    // Entries outside the white squares don't count.
    let stray: UserGrid = [((0, 2), "Z"), ((9, 9), "Z")].into_iter().collect();
    assert_eq!(Progress::measure(&grid, &stray).filled, 0);
  }

  #[test]
  fn complete_when_full_and_right() {
    let grid = Grid::new(puzzle_from_rows(&["AB", "CD"]));
    let entries: UserGrid = [((0, 0), "a"), ((0, 1), "b"), ((1, 0), "c"), ((1, 1), "d")]
      .into_iter()
      .collect();
    assert!(Progress::measure(&grid, &entries).is_complete());
  }
}
