use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::Dialog;
use crate::ui::theme::Theme;

/// Keybind reference, one `key  description` pair per line.
pub fn render_help(frame: &mut Frame, area: Rect, entries: &[(String, &str)], theme: &Theme) {
    let lines: Vec<Line> = entries
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(
                    format!(" {key:>9} "),
                    Style::default()
                        .fg(theme.pill_key_fg)
                        .bg(theme.pill_key_bg)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  {desc}"), Style::default().fg(theme.pill_desc_fg)),
            ])
        })
        .collect();

    let height = entries.len() as u16 + 2;
    draw_box(frame, area, 46, height, " Help ", lines, theme);
}

/// Modal message for action failures. Dismissed with Enter or Esc.
pub fn render_dialog(frame: &mut Frame, area: Rect, dialog: &Dialog, theme: &Theme) {
    let mut lines: Vec<Line> = dialog
        .body
        .lines()
        .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(theme.text_primary))))
        .collect();
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Enter / Esc to close",
        Style::default().fg(theme.text_secondary),
    )));

    let widest = dialog.body.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    let width = (widest as u16).saturating_add(4).clamp(30, 72);
    let height = lines.len() as u16 + 2;
    let title = format!(" {} ", dialog.title);
    draw_box(frame, area, width, height, &title, lines, theme);
}

fn draw_box(
    frame: &mut Frame,
    area: Rect,
    width: u16,
    height: u16,
    title: &str,
    lines: Vec<Line>,
    theme: &Theme,
) {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let overlay = centered_rect(width, height, area);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.overlay_border))
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(overlay);

    frame.render_widget(block, overlay);
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .style(Style::default().bg(theme.surface_bg)),
        inner,
    );
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let [vert] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [horiz] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(vert);
    horiz
}
