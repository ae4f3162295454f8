use ratatui::layout::{Constraint, Direction, Layout, Rect};

use colmatch::engine::{SLOT_ORIGIN, SLOT_STEP};

/// Vertical distance covered by one terminal row. Layout slots land on every
/// other row, leaving a free row between bands.
pub const ROW_STEP: f32 = SLOT_STEP / 2.0;

const MIN_COLUMN_WIDTH: usize = 4;
const COLUMN_PADDING: u16 = 2;
const COLUMN_GAP: u16 = 1;

pub fn row_y(row: usize) -> f32 {
    SLOT_ORIGIN + row as f32 * ROW_STEP
}

pub fn y_row(y: f32) -> usize {
    ((y - SLOT_ORIGIN) / ROW_STEP).round().max(0.0) as usize
}

pub struct AppLayout {
    pub header: Rect,
    pub board: Rect,
    pub footer: Rect,
}

impl AppLayout {
    pub fn new(area: Rect, footer_lines: u16) -> Self {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(footer_lines.max(1)),
            ])
            .split(area);

        Self {
            header: vertical[0],
            board: vertical[1],
            footer: vertical[2],
        }
    }
}

/// Screen placement of the board's columns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoardGeometry {
    pub area: Rect,
    /// `(x, width)` per column; columns past the right edge get zero width.
    pub columns: Vec<(u16, u16)>,
}

impl BoardGeometry {
    pub fn new(area: Rect, widest: &[usize]) -> Self {
        let right = area.x.saturating_add(area.width);
        let mut x = area.x;
        let columns = widest
            .iter()
            .map(|&w| {
                let wanted = u16::try_from(w.max(MIN_COLUMN_WIDTH))
                    .unwrap_or(u16::MAX)
                    .saturating_add(COLUMN_PADDING);
                let width = wanted.min(right.saturating_sub(x));
                let placed = (x, width);
                x = x.saturating_add(width).saturating_add(COLUMN_GAP).min(right);
                placed
            })
            .collect();
        Self { area, columns }
    }

    pub fn visible_rows(&self) -> usize {
        self.area.height as usize
    }

    pub fn column_at(&self, x: u16) -> Option<usize> {
        self.columns
            .iter()
            .position(|&(start, width)| width > 0 && x >= start && x < start + width)
    }

    pub fn row_at(&self, y: u16, scroll: usize) -> Option<usize> {
        if y < self.area.y || y >= self.area.y + self.area.height {
            return None;
        }
        Some((y - self.area.y) as usize + scroll)
    }
}

/// Scroll offset that keeps `row` inside a viewport of `height` rows.
pub fn follow_row(scroll: usize, row: usize, height: usize) -> usize {
    if height == 0 {
        return row;
    }
    if row < scroll {
        row
    } else if row >= scroll + height {
        row + 1 - height
    } else {
        scroll
    }
}

pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    if width == 0 || hints.is_empty() {
        return Vec::new();
    }

    let prefix = " ";
    let separator = "  ";
    let mut out: Vec<String> = Vec::new();
    let mut current = prefix.to_string();
    let mut has_hint = false;

    for hint in hints.iter().filter(|h| !h.is_empty()) {
        let candidate = if has_hint {
            format!("{current}{separator}{hint}")
        } else {
            format!("{current}{hint}")
        };
        if candidate.chars().count() <= width || !has_hint {
            current = candidate;
        } else {
            out.push(current);
            current = format!("{prefix}{hint}");
        }
        has_hint = true;
    }

    if has_hint {
        out.push(current);
    }
    out
}
