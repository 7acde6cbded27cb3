use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders, Row, Table};

use crate::pipeline::render::{COLUMN_TITLES, TableModel};
use crate::ui::theme::Theme;

const WIDTHS: [Constraint; 7] = [
    Constraint::Length(8),
    Constraint::Length(16),
    Constraint::Min(16),
    Constraint::Length(7),
    Constraint::Length(10),
    Constraint::Length(7),
    Constraint::Length(10),
];

/// Data rows that fit inside `area` after borders and the column header.
pub fn viewport_rows(area: Rect) -> usize {
    usize::from(area.height.saturating_sub(3))
}

/// Draws the visible slice of the table model. Rows the filler has not
/// reached yet are drawn blank.
pub fn render(frame: &mut Frame, area: Rect, table: &TableModel, theme: &Theme) {
    let (start, end) = table.visible_range(viewport_rows(area));

    let rows: Vec<Row> = (start..end)
        .map(|index| {
            let Some(painted) = table.row(index) else {
                return Row::new(vec![String::new(); COLUMN_TITLES.len()]);
            };
            let mut style = Style::default().fg(theme.text_primary);
            if let Some(bg) = theme.highlight_bg(painted.highlight) {
                style = style.bg(bg);
            }
            if table.is_selected(painted.pid) {
                style = style.bg(theme.selection_bg).add_modifier(Modifier::BOLD);
            }
            if index == table.cursor() {
                style = style.bg(theme.cursor_bg).add_modifier(Modifier::BOLD);
            }
            Row::new(painted.cells.to_vec()).style(style)
        })
        .collect();

    let header = Row::new(COLUMN_TITLES.to_vec()).style(
        Style::default()
            .fg(theme.table_header_fg)
            .add_modifier(Modifier::BOLD),
    );

    let title = if table.is_empty() {
        " Processes ".to_string()
    } else {
        format!(" Processes {}-{} of {} ", start + 1, end, table.len())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.overlay_border))
        .title(Span::styled(
            title,
            Style::default()
                .fg(theme.text_secondary)
                .add_modifier(Modifier::BOLD),
        ));

    let widget = Table::new(rows, WIDTHS).header(header).block(block);
    frame.render_widget(widget, area);
}
