use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use colmatch::session::{Counters, PlacementMode};

use crate::app::{Status, StatusKind};
use crate::ui::layout::pack_hint_lines;
use crate::ui::theme::Theme;

pub const HINTS: &[&str] = &[
    "[hjkl] Move",
    "[Enter] Pick/Drop",
    "[Esc] Cancel",
    "[Space] Check/Next",
    "[+/-] Grow/Shrink",
    "[1-3] Mode",
    "[s] Sort/Shuffle",
    "[m] Lock",
    "[v] Hide",
    "[r] Relayout",
    "[w] Save",
    "[L] Load last",
    "[q] Quit",
    "[Q] Quit, discard",
];

/// Counters, mode and group size on one bordered line.
pub struct Header<'a> {
    pub counters: Counters,
    pub mode: PlacementMode,
    pub target_size: usize,
    pub bank: usize,
    pub theme: &'a Theme,
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.header_bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let correct = match self.counters.correct {
            Some(correct) => correct.to_string(),
            None => "?".to_string(),
        };
        let info = format!(
            " correct {correct}  remaining {}  |  {}  |  group {}  |  bank {} ",
            self.counters.remaining,
            self.mode.label(),
            self.target_size,
            self.bank,
        );
        let line = Line::from(vec![
            Span::styled(
                " colmatch ",
                Style::default()
                    .fg(colors.header_bg())
                    .bg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(info, Style::default().fg(colors.header_fg())),
        ]);
        Paragraph::new(line).render(inner, buf);
    }
}

/// Status message followed by the key hints.
pub struct Footer<'a> {
    pub status: Option<&'a Status>,
    pub theme: &'a Theme,
}

impl Footer<'_> {
    pub fn height(width: u16) -> u16 {
        pack_hint_lines(HINTS, width as usize).len() as u16 + 1
    }
}

impl Widget for Footer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let mut lines = Vec::new();

        let status_line = match self.status {
            Some(status) => {
                let color = match status.kind {
                    StatusKind::Info => colors.fg(),
                    StatusKind::Success => colors.success(),
                    StatusKind::Warning => colors.warning(),
                    StatusKind::Error => colors.error(),
                };
                Line::from(Span::styled(
                    format!(" {}", status.text),
                    Style::default().fg(color),
                ))
            }
            None => Line::default(),
        };
        lines.push(status_line);

        for hint in pack_hint_lines(HINTS, area.width as usize) {
            lines.push(Line::from(Span::styled(
                hint,
                Style::default().fg(colors.token_locked()),
            )));
        }
        Paragraph::new(lines).render(area, buf);
    }
}
