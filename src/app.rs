use std::path::Path;

use tracing::{info, warn};

use colmatch::config::Config;
use colmatch::engine::{LayoutMode, TokenId};
use colmatch::session::{Counters, PlacementMode, PuzzleSession, SessionEvent};
use colmatch::store::session_file::SessionFile;

use crate::ui::layout::{BoardGeometry, follow_row, row_y, y_row};
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub column: usize,
    pub row: usize,
}

/// A token lifted off the board, waiting to be dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeldToken {
    pub id: TokenId,
    pub origin_row: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub kind: StatusKind,
}

pub struct App {
    pub session: PuzzleSession,
    pub config: Config,
    pub theme: Theme,
    pub session_file: SessionFile,
    pub cursor: Cursor,
    pub held: Option<HeldToken>,
    pub scroll: usize,
    pub counters: Counters,
    pub status: Option<Status>,
    pub geometry: BoardGeometry,
    pub should_quit: bool,
    pub discard_on_quit: bool,
}

impl App {
    pub fn new(config: Config, theme: Theme, session: PuzzleSession, session_file: SessionFile) -> Self {
        let counters = session.counters();
        let mut app = Self {
            session,
            config,
            theme,
            session_file,
            cursor: Cursor::default(),
            held: None,
            scroll: 0,
            counters,
            status: None,
            geometry: BoardGeometry::default(),
            should_quit: false,
            discard_on_quit: false,
        };
        app.sync();
        app
    }

    fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            kind,
        });
    }

    /// Drains session events into counters and status text.
    pub fn sync(&mut self) {
        for event in self.session.drain_events() {
            match event {
                SessionEvent::CountersChanged(counters) => self.counters = counters,
                SessionEvent::Completed => self.set_status(
                    StatusKind::Success,
                    "All rows matched. Press space for the next group.",
                ),
                SessionEvent::Advanced { grid_size: 0 } => {
                    self.set_status(StatusKind::Info, "Nothing left to learn. Load a word list.")
                }
                SessionEvent::Advanced { grid_size } => {
                    self.set_status(StatusKind::Info, format!("New group of {grid_size}"))
                }
                SessionEvent::ModeChanged(mode) => {
                    self.set_status(StatusKind::Info, format!("Mode: {}", mode.label()))
                }
                SessionEvent::BindingChanged(_) | SessionEvent::LayoutChanged => {}
            }
        }
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        let columns = self.session.board().column_count();
        self.cursor.column = self.cursor.column.min(columns.saturating_sub(1));
        if let Some(held) = self.held
            && self.session.board().token(held.id).is_none()
        {
            self.held = None;
        }
        self.scroll = follow_row(self.scroll, self.cursor.row, self.geometry.visible_rows());
    }

    /// Last row that holds a token, plus one free row below it.
    pub fn row_limit(&self) -> usize {
        self.session
            .board()
            .columns()
            .iter()
            .flat_map(|c| c.iter().map(|(_, t)| y_row(t.y())))
            .max()
            .map_or(0, |row| row + 1)
    }

    /// The token drawn at a cell, topmost first.
    pub fn token_at(&self, column: usize, row: usize) -> Option<TokenId> {
        let col = self.session.board().column(column)?;
        col.iter()
            .filter(|(_, t)| y_row(t.y()) == row)
            .map(|(slot, _)| TokenId::new(column, slot))
            .filter(|id| self.held.is_none_or(|h| h.id != *id))
            .last()
    }

    pub fn move_cursor(&mut self, columns: isize, rows: isize) {
        if self.held.is_none() {
            let last = self.session.board().column_count().saturating_sub(1);
            self.cursor.column = self.cursor.column.saturating_add_signed(columns).min(last);
        }
        self.cursor.row = self
            .cursor
            .row
            .saturating_add_signed(rows)
            .min(self.row_limit());
        self.scroll = follow_row(self.scroll, self.cursor.row, self.geometry.visible_rows());
    }

    pub fn set_cursor(&mut self, column: usize, row: usize) {
        match self.held {
            Some(held) => self.cursor.column = held.id.column,
            None => self.cursor.column = column,
        }
        self.cursor.row = row.min(self.row_limit());
    }

    pub fn pick_or_drop(&mut self) {
        if self.held.is_some() {
            self.drop_held();
        } else {
            self.pick();
        }
    }

    pub fn pick(&mut self) {
        let Some(id) = self.token_at(self.cursor.column, self.cursor.row) else {
            return;
        };
        let Some(token) = self.session.board().token(id) else {
            return;
        };
        if !token.can_move() {
            self.set_status(StatusKind::Warning, format!("\"{}\" is locked", token.text()));
            return;
        }
        self.held = Some(HeldToken {
            id,
            origin_row: self.cursor.row,
        });
    }

    /// Drops the held token at the cursor row. A token already there swaps into
    /// the held token's old row.
    pub fn drop_held(&mut self) {
        let Some(held) = self.held else {
            return;
        };
        let occupant = self.token_at(held.id.column, self.cursor.row);
        if let Some(occupant) = occupant
            && !self
                .session
                .board()
                .token(occupant)
                .is_some_and(|t| t.can_move())
        {
            self.set_status(StatusKind::Warning, "That row is taken by a locked token");
            return;
        }

        self.held = None;
        self.session.move_token(held.id, row_y(self.cursor.row));
        if let Some(occupant) = occupant
            && self.cursor.row != held.origin_row
        {
            self.session.move_token(occupant, row_y(held.origin_row));
        }
        self.sync();
    }

    pub fn cancel(&mut self) {
        if let Some(held) = self.held.take() {
            self.cursor.row = held.origin_row;
        }
    }

    pub fn check_advance(&mut self) {
        self.held = None;
        self.session.check_advance();
        self.sync();
    }

    pub fn add_one(&mut self) {
        self.held = None;
        self.session.add_one();
        self.sync();
    }

    pub fn remove_one(&mut self) {
        self.held = None;
        self.session.remove_one();
        self.sync();
    }

    pub fn relayout(&mut self) {
        self.held = None;
        self.session.relayout();
        self.sync();
    }

    pub fn set_mode(&mut self, mode: PlacementMode) {
        self.session.set_mode(mode);
        self.sync();
    }

    pub fn toggle_layout(&mut self) {
        let column = self.cursor.column;
        let Some(current) = self.session.board().column(column).map(|c| c.layout_mode()) else {
            return;
        };
        let next: LayoutMode = current.toggled();
        self.held = None;
        self.session.set_layout(column, next);
        self.set_status(StatusKind::Info, format!("Column {}: {}", column + 1, next.as_str()));
        self.sync();
    }

    pub fn toggle_lock(&mut self) {
        let column = self.cursor.column;
        if let Some(movable) = self.session.toggle_movable(column) {
            if !movable && self.held.is_some_and(|h| h.id.column == column) {
                self.cancel();
            }
            let state = if movable { "unlocked" } else { "locked" };
            self.set_status(StatusKind::Info, format!("Column {} {state}", column + 1));
        }
    }

    pub fn toggle_visible(&mut self) {
        let column = self.cursor.column;
        if let Some(visible) = self.session.toggle_visible(column) {
            let state = if visible { "shown" } else { "hidden" };
            self.set_status(StatusKind::Info, format!("Column {} {state}", column + 1));
        }
    }

    /// An explicit word list wins over the saved session.
    pub fn start(&mut self, file: Option<&Path>, restore: bool) {
        if let Some(path) = file {
            self.load_file(path);
        } else if restore && self.session_file.restore(&mut self.session) {
            self.sync();
            self.set_status(StatusKind::Info, "Previous session restored");
        } else {
            self.sync();
            self.set_status(StatusKind::Info, "No word list loaded. Run colmatch <FILE>.");
        }
    }

    pub fn load_file(&mut self, path: &Path) {
        self.held = None;
        match self.session.load(path) {
            Ok(columns) => {
                self.session.advance();
                self.cursor = Cursor::default();
                self.sync();
                self.set_status(
                    StatusKind::Info,
                    format!("Loaded {} ({columns} columns)", path.display()),
                );
            }
            Err(err) => {
                self.sync();
                self.set_status(StatusKind::Error, err.to_string());
            }
        }
    }

    pub fn save_now(&mut self) {
        match self.session_file.persist(&self.session) {
            Ok(()) => self.set_status(StatusKind::Info, "Session saved"),
            Err(err) => {
                warn!(error = %err, "failed to save session");
                self.set_status(StatusKind::Error, format!("Save failed: {err}"));
            }
        }
    }

    pub fn load_previous(&mut self) {
        self.held = None;
        if self.session_file.restore(&mut self.session) {
            self.cursor = Cursor::default();
            self.sync();
            self.set_status(StatusKind::Info, "Previous session loaded");
        } else {
            self.sync();
            self.set_status(StatusKind::Warning, "No previous session");
        }
    }

    pub fn quit(&mut self, discard: bool) {
        self.discard_on_quit = discard;
        self.should_quit = true;
    }

    /// Persists what is left to learn unless the player chose to discard it.
    pub fn shutdown(&self) {
        if self.discard_on_quit {
            info!("quit without saving session");
            return;
        }
        if !self.config.autosave {
            return;
        }
        if let Err(err) = self.session_file.persist(&self.session) {
            warn!(error = %err, "failed to save session on exit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colmatch::session::SessionOptions;
    use tempfile::TempDir;

    fn app(dir: &TempDir, entries: &[&str]) -> App {
        let options = SessionOptions {
            target_size: entries.len(),
            mode: PlacementMode::AutoCheck,
            layouts: vec![LayoutMode::Sort],
        };
        let mut session = PuzzleSession::with_seed(options, 1);
        session.replace_bank(2, entries.iter().map(|e| e.to_string()).collect());
        session.advance();
        App::new(
            Config::default(),
            Theme::default(),
            session,
            SessionFile::with_base_dir(dir.path()),
        )
    }

    fn text_at(app: &App, column: usize, row: usize) -> Option<String> {
        let id = app.token_at(column, row)?;
        app.session.board().token(id).map(|t| t.text().to_string())
    }

    #[test]
    fn test_sorted_columns_start_on_even_rows() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, &["b\t2", "a\t1"]);
        assert_eq!(text_at(&app, 0, 0).as_deref(), Some("a"));
        assert_eq!(text_at(&app, 0, 2).as_deref(), Some("b"));
        assert_eq!(text_at(&app, 0, 1), None);
        assert_eq!(app.row_limit(), 3);
    }

    #[test]
    fn test_drop_swaps_with_occupant() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, &["a\t2", "b\t1"]);
        // column 1 sorted: "1" on row 0, "2" on row 2
        app.set_cursor(1, 0);
        app.pick();
        assert!(app.held.is_some());
        app.move_cursor(0, 2);
        app.drop_held();

        assert_eq!(text_at(&app, 1, 0).as_deref(), Some("2"));
        assert_eq!(text_at(&app, 1, 2).as_deref(), Some("1"));
        assert_eq!(app.counters.correct, Some(2));
    }

    #[test]
    fn test_confirmed_token_cannot_be_picked() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, &["a\t2", "b\t1"]);
        app.set_cursor(1, 0);
        app.pick();
        app.move_cursor(0, 2);
        app.drop_held();
        assert_eq!(app.counters.correct, Some(2));

        app.set_cursor(0, 0);
        app.pick();
        assert!(app.held.is_none());
        assert!(matches!(
            app.status,
            Some(Status {
                kind: StatusKind::Warning,
                ..
            })
        ));
    }

    #[test]
    fn test_cancel_returns_cursor() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, &["a\t2", "b\t1"]);
        app.set_cursor(1, 2);
        app.pick();
        app.move_cursor(1, -2);
        assert_eq!(app.cursor.column, 1);
        app.cancel();
        assert_eq!(app.cursor.row, 2);
        assert!(app.held.is_none());
    }

    #[test]
    fn test_quit_discarding_skips_persist() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, &["a\t2", "b\t1"]);
        app.quit(true);
        app.shutdown();
        assert!(!app.session_file.exists());

        app.quit(false);
        app.shutdown();
        assert!(app.session_file.exists());
    }
}
