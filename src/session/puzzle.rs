use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::engine::{BindingChange, Board, LayoutMode, RecordId, Token, TokenId};
use crate::error::PuzzleError;
use crate::session::bank::{Bank, split_fields};
use crate::store::tsv;

/// Column count of a session that has not loaded a word list yet.
const DEFAULT_COLUMNS: usize = 2;

/// When confirmation of a correct alignment becomes visible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementMode {
    /// Reveal as soon as a record is bound.
    #[default]
    #[serde(rename = "auto")]
    AutoCheck,
    /// Reveal when the player asks for a check.
    #[serde(rename = "manual")]
    ManualCheck,
    /// Reveal only once the whole grid is solved.
    #[serde(rename = "none")]
    NoCheck,
}

impl PlacementMode {
    pub const ALL: [PlacementMode; 3] = [
        PlacementMode::AutoCheck,
        PlacementMode::ManualCheck,
        PlacementMode::NoCheck,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlacementMode::AutoCheck => "auto",
            PlacementMode::ManualCheck => "manual",
            PlacementMode::NoCheck => "none",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlacementMode::AutoCheck => "check on place",
            PlacementMode::ManualCheck => "check on demand",
            PlacementMode::NoCheck => "check when solved",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(name))
    }
}

/// Progress as shown to the player. `correct` is `None` while it is hidden.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Counters {
    pub correct: Option<usize>,
    pub remaining: usize,
}

impl Counters {
    /// Flat form with `-1` standing in for a hidden count.
    pub fn correct_or_sentinel(&self) -> i64 {
        self.correct.map_or(-1, |c| c as i64)
    }
}

impl fmt::Display for Counters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.correct {
            Some(correct) => write!(f, "{correct}/{}", self.remaining),
            None => write!(f, "?/{}", self.remaining),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    CountersChanged(Counters),
    BindingChanged(BindingChange),
    LayoutChanged,
    Advanced { grid_size: usize },
    ModeChanged(PlacementMode),
    Completed,
}

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub target_size: usize,
    pub mode: PlacementMode,
    pub layouts: Vec<LayoutMode>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            target_size: config.group_size,
            mode: config.placement_mode,
            layouts: config.column_layouts.clone(),
        }
    }
}

pub struct PuzzleSession {
    board: Board,
    bank: Bank,
    layouts: Vec<LayoutMode>,
    target_size: usize,
    correct_count: usize,
    mode: PlacementMode,
    rng: SmallRng,
    events: VecDeque<SessionEvent>,
    last_counters: Option<Counters>,
}

impl PuzzleSession {
    pub fn new(options: SessionOptions, rng: SmallRng) -> Self {
        let layouts = if options.layouts.is_empty() {
            vec![LayoutMode::Sort, LayoutMode::Shuffle]
        } else {
            options.layouts
        };
        Self {
            board: Board::new(DEFAULT_COLUMNS, &layouts),
            bank: Bank::new(),
            layouts,
            target_size: options.target_size.max(1),
            correct_count: 0,
            mode: options.mode,
            rng,
            events: VecDeque::new(),
            last_counters: None,
        }
    }

    pub fn with_seed(options: SessionOptions, seed: u64) -> Self {
        Self::new(options, SmallRng::seed_from_u64(seed))
    }

    pub fn from_entropy(options: SessionOptions) -> Self {
        Self::new(options, SmallRng::from_entropy())
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    pub fn mode(&self) -> PlacementMode {
        self.mode
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn grid_size(&self) -> usize {
        self.board.grid_size()
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn is_complete(&self) -> bool {
        self.correct_count == self.board.grid_size()
    }

    pub fn counters(&self) -> Counters {
        let pool = self.board.grid_size() + self.bank.len();
        if self.mode == PlacementMode::NoCheck && !self.is_complete() {
            Counters {
                correct: None,
                remaining: pool,
            }
        } else {
            Counters {
                correct: Some(self.correct_count),
                remaining: pool.saturating_sub(self.correct_count),
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    fn emit_counters(&mut self) {
        let counters = self.counters();
        if self.last_counters != Some(counters) {
            self.last_counters = Some(counters);
            self.events.push_back(SessionEvent::CountersChanged(counters));
        }
    }

    /// Folds a binding change into the correct count and reveals per mode.
    fn apply(&mut self, change: BindingChange) {
        if change.is_empty() {
            return;
        }
        self.correct_count = (self.correct_count as isize + change.delta()).max(0) as usize;
        debug_assert_eq!(self.correct_count, self.board.bound_count());
        debug!(
            bound = change.bound.len(),
            released = change.released,
            correct = self.correct_count,
            "binding changed"
        );

        let solved = self.board.grid_size() > 0 && self.is_complete();
        match self.mode {
            PlacementMode::AutoCheck => {
                for &id in &change.bound {
                    self.board.reveal_record(id);
                }
            }
            PlacementMode::ManualCheck | PlacementMode::NoCheck => {
                if solved {
                    self.board.reveal(true);
                }
            }
        }

        self.events.push_back(SessionEvent::BindingChanged(change));
        if solved {
            info!(grid = self.board.grid_size(), "grid solved");
            self.events.push_back(SessionEvent::Completed);
        }
        self.emit_counters();
    }

    /// Drops a token at `y`. Returns false when the token is locked or gone.
    pub fn move_token(&mut self, id: TokenId, y: f32) -> bool {
        if !self.board.token(id).is_some_and(Token::can_move) {
            return false;
        }
        let change = self.board.move_token(id, y);
        self.apply(change);
        true
    }

    fn draw_entry(&mut self) -> bool {
        let columns = self.board.column_count();
        while let Some(entry) = self.bank.take_random(&mut self.rng) {
            match split_fields(&entry, columns) {
                Some(fields) => {
                    self.board.insert_line(&entry, &fields);
                    return true;
                }
                None => warn!(%entry, columns, "dropping bank entry with too few fields"),
            }
        }
        false
    }

    /// Lays every column out again. On a partly solved grid the confirmed
    /// entries are dropped first as learned. Nothing is bound here.
    fn layout_board(&mut self) {
        if self.correct_count > 0 && !self.is_complete() {
            let (confirmed, _) = self.board.partition_entries();
            if !confirmed.is_empty() {
                info!(learned = confirmed.len(), "dropping learned entries");
            }
            for id in confirmed {
                let change = self.board.remove_entry(id);
                self.apply(change);
            }
        }
        self.board.layout_all(&mut self.rng);
        self.events.push_back(SessionEvent::LayoutChanged);
        self.emit_counters();
    }

    /// Clears the grid and deals a fresh one from the bank.
    pub fn advance(&mut self) {
        self.board.clear();
        self.correct_count = 0;

        let mut placed = 0;
        while placed < self.target_size && self.draw_entry() {
            placed += 1;
        }
        self.board.layout_all(&mut self.rng);

        info!(grid = placed, bank = self.bank.len(), "dealt new grid");
        self.events.push_back(SessionEvent::Advanced { grid_size: placed });
        self.events.push_back(SessionEvent::LayoutChanged);
        self.emit_counters();
    }

    pub fn add_one(&mut self) {
        self.target_size += 1;
        if self.draw_entry() {
            self.layout_board();
        } else {
            self.emit_counters();
        }
    }

    /// Evicts one random grid entry. Unconfirmed entries go back to the bank;
    /// confirmed ones count as learned and are dropped.
    pub fn remove_one(&mut self) {
        let entries: Vec<RecordId> = self.board.entries().map(|(id, _)| id).collect();
        if entries.len() <= 1 {
            return;
        }
        let victim = entries[self.rng.gen_range(0..entries.len())];
        let learned = self.board.is_entry_confirmed(victim);
        if !learned && let Some(line) = self.board.literal(victim) {
            self.bank.push(line);
        }

        let change = self.board.remove_entry(victim);
        self.target_size = self.board.grid_size();
        debug!(learned, target = self.target_size, "removed grid entry");
        self.apply(change);
        self.layout_board();
    }

    /// Advances when the grid is solved, otherwise reveals what is correct so far.
    pub fn check_advance(&mut self) {
        if self.is_complete() {
            self.advance();
        } else if self.mode != PlacementMode::NoCheck {
            self.board.reveal(true);
            self.emit_counters();
        }
    }

    pub fn set_mode(&mut self, mode: PlacementMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        match mode {
            PlacementMode::NoCheck => {
                if !self.is_complete() {
                    self.board.reveal(false);
                }
            }
            PlacementMode::AutoCheck => self.board.reveal(true),
            PlacementMode::ManualCheck => {}
        }
        info!(mode = mode.as_str(), "placement mode changed");
        self.events.push_back(SessionEvent::ModeChanged(mode));
        self.emit_counters();
    }

    pub fn relayout(&mut self) {
        self.layout_board();
    }

    pub fn set_layout(&mut self, column: usize, mode: LayoutMode) {
        if column >= self.board.column_count() {
            return;
        }
        while self.layouts.len() <= column {
            let next = LayoutMode::for_column(&self.layouts, self.layouts.len());
            self.layouts.push(next);
        }
        self.layouts[column] = mode;
        self.board.set_layout_mode(column, mode);
        self.layout_board();
    }

    pub fn toggle_movable(&mut self, column: usize) -> Option<bool> {
        self.board.toggle_movable(column)
    }

    pub fn toggle_visible(&mut self, column: usize) -> Option<bool> {
        self.board.toggle_visible(column)
    }

    /// Replaces the bank. A different column count rebuilds the board empty.
    pub fn replace_bank(&mut self, columns: usize, entries: Vec<String>) {
        if columns != self.board.column_count() {
            self.board = Board::new(columns, &self.layouts);
            self.correct_count = 0;
            self.events.push_back(SessionEvent::LayoutChanged);
        }
        self.bank.replace(entries);
        self.emit_counters();
    }

    /// Loads a word list into the bank and returns its column count.
    ///
    /// The bank is emptied as soon as the file opens, before the first line is
    /// validated, so a malformed file leaves the bank empty.
    pub fn load(&mut self, path: &Path) -> Result<usize, PuzzleError> {
        let file = File::open(path).map_err(|e| PuzzleError::io(path, e))?;
        self.bank.clear();

        let batch = match tsv::read_entries(BufReader::new(file), path) {
            Ok(batch) => batch,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "rejected word list");
                self.emit_counters();
                return Err(err);
            }
        };

        info!(
            path = %path.display(),
            entries = batch.entries.len(),
            columns = batch.columns,
            "loaded word list"
        );
        self.replace_bank(batch.columns, batch.entries);
        Ok(batch.columns)
    }

    /// Writes the bank, then every unconfirmed grid entry, one per line.
    pub fn save(&self, path: &Path) -> Result<(), PuzzleError> {
        let pending = self.board.unconfirmed_entries();
        tsv::write_entries(
            path,
            self.bank.iter().chain(pending.iter().map(String::as_str)),
        )?;
        info!(
            path = %path.display(),
            bank = self.bank.len(),
            pending = pending.len(),
            "saved word list"
        );
        Ok(())
    }
}
