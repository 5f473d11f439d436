use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::event::{
  self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
  KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use env_logger::{Env, Target};
use log::{debug, error, info, warn};
use ratatui::{
  DefaultTerminal, Frame,
  buffer::Buffer,
  layout::{Constraint, Flex, Layout, Rect},
  style::{Color, Modifier, Style, Stylize},
  text::{Line, Text},
  widgets::{Block, List, ListItem, ListState, Padding, Paragraph, StatefulWidget, Widget, Wrap},
};
use ratatui_macros::{line, span};
use xword::Direction::{Across, Down};
use xword::{
  Direction, Input, Move, Pos, Puzzle, SavedProgress, SolveSession, SquareStyle, format_elapsed,
};

const SQUARE_WIDTH: u16 = 7;
const SQUARE_HEIGHT: u16 = 3;
const TICK_RATE: Duration = Duration::from_secs(1);
const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(10);

/// Solve a crossword puzzle in your terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
  /// The puzzle to solve, as JSON.
  puzzle: PathBuf,

  /// Keep solving progress in this file: it is loaded on start if it exists, and
  /// saved as you go and when you quit.
  #[arg(long, value_name = "FILE")]
  progress: Option<PathBuf>,

  /// Write log messages to this file. RUST_LOG controls what gets logged.
  #[arg(long, value_name = "FILE")]
  log: Option<PathBuf>,
}

fn main() -> io::Result<()> {
  let args = Args::parse();

  if let Some(path) = &args.log {
    init_logging(path)?;
  }

  let puzzle = load_puzzle(&args.puzzle);
  info!("Opened {:?} from {}", puzzle.title, args.puzzle.display());
  let mut session = SolveSession::new(puzzle);
  if let Some(saved) = args.progress.as_deref().and_then(load_progress) {
    session.restore(&saved);
  }
  let app = App::new(session, args.progress);

  let terminal = ratatui::init();
  let result = execute!(io::stdout(), EnableFocusChange, EnableMouseCapture)
    .and_then(|()| app.run(terminal));
  ratatui::restore();
  execute!(io::stdout(), DisableFocusChange, DisableMouseCapture)?;
  result
}

/// The terminal belongs to the UI, so logs go to a file or nowhere.
fn init_logging(path: &Path) -> io::Result<()> {
  let file = File::create(path)?;
  env_logger::Builder::from_env(Env::default().default_filter_or("info"))
    .target(Target::Pipe(Box::new(file)))
    .init();
  Ok(())
}

fn load_puzzle(path: &Path) -> Puzzle {
  let file = File::open(path).unwrap_or_else(|err| {
    println!("Couldn't open {}: {}", path.display(), err);
    std::process::exit(1);
  });
  Puzzle::from_reader(BufReader::new(file)).unwrap_or_else(|err| {
    println!("Failed to read puzzle: {}", err);
    std::process::exit(2);
  })
}

/// Reads saved progress, if there is any. A missing file means a fresh start; an
/// unreadable one is logged and ignored.
fn load_progress(path: &Path) -> Option<SavedProgress> {
  let file = match File::open(path) {
    Ok(file) => file,
    Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
    Err(err) => {
      warn!("Couldn't open progress file {}: {}", path.display(), err);
      return None;
    }
  };
  serde_json::from_reader(BufReader::new(file))
    .inspect_err(|err| warn!("Ignoring progress file {}: {}", path.display(), err))
    .ok()
}

fn save_progress(path: &Path, session: &SolveSession) -> Result<(), xword::Error> {
  let json = serde_json::to_vec_pretty(&session.snapshot())?;
  std::fs::write(path, json)?;
  Ok(())
}

fn square_style(style: SquareStyle) -> Style {
  let base_style = match style {
    SquareStyle::Black => return Style::new().bg(Color::Black),
    SquareStyle::Standard => Style::new().bg(Color::White),
    SquareStyle::Cursor => Style::new().bg(Color::LightRed),
    SquareStyle::Word => Style::new().bg(Color::LightYellow),
    SquareStyle::Correct => Style::new().bg(Color::LightBlue),
    SquareStyle::Incorrect => Style::new().bg(Color::LightMagenta),
    SquareStyle::Solved => Style::new().bg(Color::LightGreen),
  };
  base_style.fg(Color::Black).add_modifier(Modifier::BOLD)
}

#[derive(Debug)]
pub struct App {
  session: SolveSession,
  progress_path: Option<PathBuf>,
  /// Something changed since progress was last saved.
  dirty: bool,
  last_save: Instant,
  /// The timer was stopped because the terminal lost focus, and should resume when
  /// it comes back.
  paused_by_focus: bool,
  /// The area of the last frame drawn, for mapping mouse clicks to squares.
  area: Rect,
  running: bool,
}

impl App {
  fn new(session: SolveSession, progress_path: Option<PathBuf>) -> Self {
    Self {
      session,
      progress_path,
      dirty: false,
      last_save: Instant::now(),
      paused_by_focus: false,
      area: Rect::default(),
      running: true,
    }
  }

  pub fn run(mut self, mut terminal: DefaultTerminal) -> io::Result<()> {
    self.running = true;
    while self.running {
      terminal.draw(|frame| self.draw(frame))?;
      // Redraw at least once per tick so the timer keeps moving.
      if event::poll(TICK_RATE)? {
        self.handle_crossterm_events()?;
      }
      if self.dirty && self.last_save.elapsed() >= AUTOSAVE_INTERVAL {
        self.save();
      }
    }
    self.save();
    Ok(())
  }

  fn draw(&mut self, frame: &mut Frame) {
    self.area = frame.area();
    frame.render_widget(&*self, frame.area());
  }

  /// Reads the crossterm events and updates the state of [`App`].
  fn handle_crossterm_events(&mut self) -> io::Result<()> {
    match event::read()? {
      // it's important to check KeyEventKind::Press to avoid handling key release events
      Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
      Event::Mouse(mouse) => self.on_mouse_event(mouse),
      Event::FocusLost if self.session.is_timer_running() => {
        self.session.stop_timer();
        self.paused_by_focus = true;
      }
      Event::FocusGained if self.paused_by_focus => {
        self.session.start_timer();
        self.paused_by_focus = false;
      }
      _ => {}
    }
    Ok(())
  }

  /// Handles the key events and updates the state of [`App`].
  fn on_key_event(&mut self, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
      self.on_command(key.code);
      return;
    }

    // With nothing selected, the first key brings the cursor back.
    if self.session.selection().is_none() && !self.session.is_completed() {
      let first = self.session.grid().first_numbered_cell().map(|cell| cell.pos());
      if let Some(pos) = first {
        self.session.select_cell(pos);
      }
      return;
    }

    let input = match key.code {
      KeyCode::Char(' ') => Input::Space,
      KeyCode::Char(letter) => Input::Letter(letter),
      KeyCode::Up => Input::Arrow(Move::Up),
      KeyCode::Down => Input::Arrow(Move::Down),
      KeyCode::Left => Input::Arrow(Move::Left),
      KeyCode::Right => Input::Arrow(Move::Right),
      KeyCode::Backspace => Input::Backspace,
      KeyCode::Delete => Input::Delete,
      KeyCode::Tab => Input::Tab,
      KeyCode::BackTab => Input::BackTab,
      KeyCode::Enter => Input::Enter,
      KeyCode::Esc => Input::Escape,
      _ => return,
    };
    if self.session.handle(input) {
      self.paused_by_focus = false;
      self.dirty = true;
    }
  }

  /// Control-key commands: the puzzle-wide operations and quitting.
  fn on_command(&mut self, code: KeyCode) {
    let KeyCode::Char(c) = code else {
      return;
    };
    match c.to_ascii_lowercase() {
      'c' | 'q' => self.quit(),
      'k' => self.session.check_puzzle(),
      'l' => self.session.reveal_letter(),
      'w' => self.session.reveal_word(),
      'r' => self.session.reveal_puzzle(),
      'x' => self.session.clear_puzzle(),
      'p' if self.session.is_timer_running() => self.session.stop_timer(),
      'p' => self.session.start_timer(),
      't' => self.session.reset_timer(),
      _ => return,
    }
    self.paused_by_focus = false;
    self.dirty = true;
  }

  /// A click selects a square; clicking the selected square switches direction.
  fn on_mouse_event(&mut self, mouse: MouseEvent) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) || self.session.is_completed() {
      return;
    }
    let Some(pos) = self.square_at(mouse.column, mouse.row) else {
      return;
    };
    if self.session.selection() == Some(pos) {
      self.session.toggle_direction();
    } else {
      self.session.select_cell(pos);
    }
    self.session.start_timer();
    self.paused_by_focus = false;
    debug!("Clicked {:?}", pos);
  }

  /// The square drawn at the given screen coordinates.
  fn square_at(&self, x: u16, y: u16) -> Option<Pos> {
    let [_, grid_area, _] = layout(self.area, self.session.grid().size());
    let dx = x.checked_sub(grid_area.x)?;
    let dy = y.checked_sub(grid_area.y)?;
    let (step_x, step_y) = (SQUARE_WIDTH + 1, SQUARE_HEIGHT + 1);
    if dx % step_x >= SQUARE_WIDTH || dy % step_y >= SQUARE_HEIGHT {
      return None;
    }
    let pos = (usize::from(dy / step_y), usize::from(dx / step_x));
    self.session.grid().is_white(pos).then_some(pos)
  }

  fn save(&mut self) {
    let Some(path) = &self.progress_path else {
      return;
    };
    match save_progress(path, &self.session) {
      Ok(()) => debug!("Saved progress to {}", path.display()),
      Err(err) => error!("Couldn't save progress to {}: {}", path.display(), err),
    }
    // A failed save is not retried until something else changes.
    self.dirty = false;
    self.last_save = Instant::now();
  }

  /// Set running to false to quit the application.
  fn quit(&mut self) {
    self.running = false;
  }

  fn render_square(&self, pos: Pos, square_area: Rect, buf: &mut Buffer) {
    let style = square_style(self.session.square_style(pos));
    let Some(cell) = self.session.grid().cell(pos).filter(|cell| cell.is_white()) else {
      Block::new().style(style).render(square_area, buf);
      return;
    };

    let number = cell.number.map(|n| n.to_string()).unwrap_or_default();
    let letter = self.session.entry(pos).unwrap_or_default().to_string();
    Paragraph::new(Text::from(vec![
      Line::from(number).left_aligned().dim(),
      Line::from(letter).centered(),
    ]))
    .block(Block::new().style(style))
    .render(square_area, buf);
  }

  fn render_current_clues(&self, area: Rect, buf: &mut Buffer) {
    let describe = |clue: Option<&xword::Clue>| match clue {
      Some(clue) => line![
        span!(Modifier::BOLD; "{} {:?}: ", clue.number, clue.direction),
        clue.text.clone(),
      ],
      None => line!["-"],
    };
    let text = Text::from(vec![
      describe(self.session.current_clue()),
      Line::default(),
      describe(self.session.crossing_clue()).dim(),
    ]);
    Paragraph::new(text)
      .wrap(Wrap { trim: true })
      .block(
        Block::bordered()
          .title(Line::from("Current clue").centered())
          .padding(Padding::horizontal(1)),
      )
      .render(area, buf);
  }

  fn render_status(&self, area: Rect, buf: &mut Buffer) {
    let progress = self.session.progress();
    let time = format_elapsed(self.session.elapsed());
    let timer = if self.session.is_completed() {
      line![span!(Style::new().fg(Color::Green).add_modifier(Modifier::BOLD); "Solved in {}!", time)]
    } else if self.session.is_timer_running() {
      line!["Time: ", span!(Modifier::BOLD; "{}", time)]
    } else {
      line!["Time: ", span!(Modifier::BOLD; "{}", time), " (paused)".dim()]
    };
    let mut lines = vec![
      timer,
      line![format!(
        "Filled: {}/{} ({:.0}%)",
        progress.filled, progress.total, progress.percentage
      )],
    ];
    if self.session.has_been_checked() && !self.session.is_completed() {
      lines.push(line!["Checked: marked squares are right or wrong".dim()]);
    }
    Paragraph::new(lines)
      .block(Block::bordered().title(Line::from("Progress").centered()).padding(Padding::horizontal(1)))
      .render(area, buf);
  }

  fn render_clue_list(&self, direction: Direction, area: Rect, buf: &mut Buffer) {
    let highlighted = if direction == self.session.direction() {
      self.session.current_clue()
    } else {
      self.session.crossing_clue()
    };
    let clues = self.session.grid().clues(direction);
    let items: Vec<ListItem> = clues
      .iter()
      .map(|clue| ListItem::new(line![span!(Modifier::BOLD; "{:>3} ", clue.number), clue.text.clone()]))
      .collect();
    let selected = highlighted.and_then(|h| clues.iter().position(|clue| clue.number == h.number));

    let highlight = if direction == self.session.direction() {
      Style::new().bg(Color::LightRed).fg(Color::Black)
    } else {
      Style::new().bg(Color::LightYellow).fg(Color::Black)
    };
    let list = List::new(items)
      .highlight_style(highlight)
      .block(Block::bordered().title(Line::from(format!("{direction:?}")).centered()));
    let mut state = ListState::default().with_selected(selected);
    StatefulWidget::render(list, area, buf, &mut state);
  }
}

/// Splits the screen into the title, the grid itself and the side panel.
fn layout(area: Rect, size: usize) -> [Rect; 3] {
  let [title_area, main_area] =
    Layout::vertical([Constraint::Length(2), Constraint::Percentage(100)]).areas(area);
  let [puzzle_area, side_area] =
    Layout::horizontal([Constraint::Percentage(100), Constraint::Length(45)]).areas(main_area);

  let extent = |square: u16| {
    u16::try_from(size)
      .unwrap_or(u16::MAX)
      .saturating_mul(square + 1)
  };
  let grid_area = center(
    puzzle_area,
    Constraint::Length(extent(SQUARE_WIDTH)),
    Constraint::Length(extent(SQUARE_HEIGHT)),
  );
  [title_area, grid_area, side_area]
}

impl Widget for &App {
  fn render(self, area: Rect, buf: &mut Buffer) {
    let grid = self.session.grid();
    let [title_area, grid_area, side_area] = layout(area, grid.size());

    let title = Line::from(vec![
      "xwordtui".bold().blue(),
      ": ".bold(),
      grid.title().to_string().bold(),
    ])
    .centered();
    title.render(title_area, buf);

    let mut square_area = Rect {
      x: grid_area.x,
      y: grid_area.y,
      width: SQUARE_WIDTH,
      height: SQUARE_HEIGHT,
    };
    for row in 0..grid.size() {
      for col in 0..grid.size() {
        if grid_area.contains(square_area.as_position()) {
          self.render_square((row, col), square_area.intersection(grid_area), buf);
        }
        square_area.x = square_area.x.saturating_add(SQUARE_WIDTH + 1);
      }
      square_area.x = grid_area.x;
      square_area.y = square_area.y.saturating_add(SQUARE_HEIGHT + 1);
    }

    let [clue_area, status_area, lists_area, help_area] = Layout::vertical([
      Constraint::Length(8),
      Constraint::Length(5),
      Constraint::Fill(1),
      Constraint::Length(5),
    ])
    .areas(side_area);
    self.render_current_clues(clue_area, buf);
    self.render_status(status_area, buf);

    let [across_area, down_area] =
      Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(lists_area);
    self.render_clue_list(Across, across_area, buf);
    self.render_clue_list(Down, down_area, buf);

    Paragraph::new(vec![
      line!["Space".bold(), " direction  ", "Tab".bold(), " next word  ", "Esc".bold(), " deselect"],
      line!["^K".bold(), " check  ", "^L/^W/^R".bold(), " reveal letter/word/all"],
      line!["^X".bold(), " clear  ", "^P".bold(), " pause  ", "^T".bold(), " reset timer  ", "^Q".bold(), " quit"],
    ])
    .block(Block::bordered().title(Line::from("Keys").centered()))
    .render(help_area, buf);
  }
}

/// https://ratatui.rs/recipes/layout/center-a-widget/
fn center(area: Rect, horizontal: Constraint, vertical: Constraint) -> Rect {
  let [area] = Layout::horizontal([horizontal])
    .flex(Flex::Center)
    .areas(area);
  let [area] = Layout::vertical([vertical]).flex(Flex::Center).areas(area);
  area
}

#[cfg(test)]
mod tests {
  use super::*;

  fn app() -> App {
    let puzzle = Puzzle::from_json(include_str!("../puzzles/word-square.json")).unwrap();
    App::new(SolveSession::new(puzzle), None)
  }

  fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    app.on_key_event(KeyEvent::new(code, modifiers));
  }

  #[test]
  fn typing_goes_through_the_session() {
    let mut app = app();
    press(&mut app, KeyCode::Char('h'), KeyModifiers::NONE);
    press(&mut app, KeyCode::Char('e'), KeyModifiers::SHIFT);
    assert_eq!(app.session.entry((0, 0)), Some("H"));
    assert_eq!(app.session.entry((0, 1)), Some("E"));
    assert!(app.dirty);
    assert!(app.session.is_timer_running());
  }

  #[test]
  fn control_keys_run_commands() {
    let mut app = app();
    press(&mut app, KeyCode::Char('w'), KeyModifiers::CONTROL);
    assert_eq!(app.session.entry((0, 4)), Some("T"));
    press(&mut app, KeyCode::Char('x'), KeyModifiers::CONTROL);
    assert!(app.session.entries().is_empty());
    press(&mut app, KeyCode::Char('q'), KeyModifiers::CONTROL);
    assert!(!app.running);
  }

  #[test]
  fn escape_then_any_key_reselects() {
    let mut app = app();
    press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
    assert_eq!(app.session.selection(), None);
    press(&mut app, KeyCode::Char('a'), KeyModifiers::NONE);
    assert_eq!(app.session.selection(), Some((0, 0)));
    assert!(app.session.entries().is_empty());
  }

  #[test]
  fn clicks_map_to_squares() {
    let mut app = app();
    app.area = Rect::new(0, 0, 120, 40);
    let [_, grid_area, _] = layout(app.area, 5);
    let step = (SQUARE_WIDTH + 1, SQUARE_HEIGHT + 1);

    assert_eq!(app.square_at(grid_area.x, grid_area.y), Some((0, 0)));
    assert_eq!(app.square_at(grid_area.x + 2 * step.0 + 1, grid_area.y + 3 * step.1), Some((3, 2)));
    // The gap between squares.
    assert_eq!(app.square_at(grid_area.x + SQUARE_WIDTH, grid_area.y), None);
    assert_eq!(app.square_at(0, 0), None);

    let click = |column, row| MouseEvent {
      kind: MouseEventKind::Down(MouseButton::Left),
      column,
      row,
      modifiers: KeyModifiers::NONE,
    };
    app.on_mouse_event(click(grid_area.x + step.0, grid_area.y));
    assert_eq!(app.session.selection(), Some((0, 1)));
    app.on_mouse_event(click(grid_area.x + step.0, grid_area.y));
    assert_eq!(app.session.direction(), Down);
  }

  #[test]
  fn renders_grid_and_clues() {
    let mut app = app();
    press(&mut app, KeyCode::Char('h'), KeyModifiers::NONE);
    let area = Rect::new(0, 0, 120, 40);
    let mut buf = Buffer::empty(area);
    (&app).render(area, &mut buf);

    let screen: String = buf.content().iter().map(|cell| cell.symbol()).collect();
    assert!(screen.contains("xwordtui: Word Square"));
    assert!(!screen.contains("Ratatui"));
    assert!(screen.contains("Organ that keeps the beat"));
    assert!(screen.contains("Filled: 1/25 (4%)"));
  }
}
