use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Widget;

use colmatch::engine::{Board, Column, Token};

use crate::app::{Cursor, HeldToken};
use crate::ui::layout::{BoardGeometry, y_row};
use crate::ui::theme::Theme;

const HIDDEN_GLYPH: char = '\u{00b7}'; // ·

pub struct BoardView<'a> {
    board: &'a Board,
    geometry: &'a BoardGeometry,
    cursor: Cursor,
    held: Option<HeldToken>,
    scroll: usize,
    theme: &'a Theme,
}

impl<'a> BoardView<'a> {
    pub fn new(
        board: &'a Board,
        geometry: &'a BoardGeometry,
        cursor: Cursor,
        held: Option<HeldToken>,
        scroll: usize,
        theme: &'a Theme,
    ) -> Self {
        Self {
            board,
            geometry,
            cursor,
            held,
            scroll,
            theme,
        }
    }

    fn token_style(&self, column: &Column, token: &Token) -> Style {
        let colors = &self.theme.colors;
        if token.is_confirmed() {
            Style::default()
                .fg(colors.token_confirmed())
                .add_modifier(Modifier::BOLD)
        } else if !column.is_visible() {
            Style::default().fg(colors.token_hidden())
        } else if !token.can_move() {
            Style::default().fg(colors.token_locked())
        } else {
            Style::default().fg(colors.token())
        }
    }
}

/// Token text fitted to a cell, or a placeholder when the column is hidden.
fn cell_text(token: &Token, visible: bool, width: usize) -> String {
    let mut text: String = if visible {
        token.text().chars().take(width).collect()
    } else {
        std::iter::repeat_n(HIDDEN_GLYPH, token.width().min(width)).collect()
    };
    if token.width() > width && width > 0 && visible {
        text.pop();
        text.push('\u{2026}'); // …
    }
    text
}

impl Widget for BoardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let rows = area.height as usize;
        if rows == 0 {
            return;
        }

        // layout slots sit on even rows
        for offset in 0..rows {
            let row = self.scroll + offset;
            if row % 2 == 0 {
                let y = area.y + offset as u16;
                for x in area.x..area.x + area.width {
                    buf[(x, y)].set_bg(colors.band());
                }
            }
        }

        let visible_row = |row: usize| -> Option<u16> {
            (row >= self.scroll && row < self.scroll + rows)
                .then(|| area.y + (row - self.scroll) as u16)
        };

        for (index, column) in self.board.columns().iter().enumerate() {
            let Some(&(x, width)) = self.geometry.columns.get(index) else {
                continue;
            };
            if width < 3 {
                continue;
            }
            let inner = (width - 2) as usize;

            if index == self.cursor.column
                && let Some(y) = visible_row(self.cursor.row)
            {
                let style = Style::default()
                    .bg(colors.cursor_bg())
                    .fg(colors.cursor_fg());
                buf.set_string(x, y, " ".repeat(width as usize), style);
            }

            for (slot, token) in column.iter() {
                let held = self
                    .held
                    .is_some_and(|h| h.id.column == index && h.id.slot == slot);
                let row = if held {
                    self.cursor.row
                } else {
                    y_row(token.y())
                };
                let Some(y) = visible_row(row) else {
                    continue;
                };

                let mut style = self.token_style(column, token);
                if held {
                    style = style
                        .bg(colors.held_bg())
                        .fg(colors.held_fg())
                        .add_modifier(Modifier::BOLD);
                    buf.set_string(x, y, " ".repeat(width as usize), style);
                } else if index == self.cursor.column && row == self.cursor.row {
                    style = style.bg(colors.cursor_bg()).fg(colors.cursor_fg());
                }
                let text = cell_text(token, column.is_visible(), inner);
                buf.set_stringn(x + 1, y, text, inner, style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colmatch::engine::LayoutMode;

    fn board() -> Board {
        let mut board = Board::new(2, &[LayoutMode::Sort]);
        board.insert_entry(&["elephant", "x"]);
        board
    }

    #[test]
    fn test_cell_text_truncates_with_ellipsis() {
        let b = board();
        let token = b.column(0).unwrap().iter().next().unwrap().1;
        assert_eq!(cell_text(token, true, 20), "elephant");
        assert_eq!(cell_text(token, true, 4), "ele\u{2026}");
        assert_eq!(cell_text(token, false, 3), "\u{00b7}\u{00b7}\u{00b7}");
    }

    #[test]
    fn test_render_places_tokens_on_their_rows() {
        let mut b = board();
        b.layout_all(&mut rand::rngs::mock::StepRng::new(0, 1));
        let geometry = BoardGeometry::new(Rect::new(0, 0, 30, 4), &[8, 1]);
        let theme = Theme::default();
        let view = BoardView::new(&b, &geometry, Cursor::default(), None, 0, &theme);

        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 4));
        view.render(Rect::new(0, 0, 30, 4), &mut buf);
        let first_line: String = (0..30).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(first_line.contains("elephant"));
        assert!(first_line.contains('x'));
    }
}
