use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Gauge, Paragraph};

use crate::format::truncate_unicode;
use crate::pipeline::filter::FilterCriteria;
use crate::system::snapshot::MemorySnapshot;
use crate::ui::theme::Theme;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    memory: Option<MemorySnapshot>,
    criteria: &FilterCriteria,
    theme: &Theme,
) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(35),
            Constraint::Percentage(30),
        ])
        .split(area);

    render_branding(frame, chunks[0], criteria, theme);
    render_memory_figures(frame, chunks[1], memory, theme);
    render_memory_gauge(frame, chunks[2], memory, theme);
}

fn rounded_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.overlay_border))
}

fn checkbox(label: &str, checked: bool, theme: &Theme) -> Span<'static> {
    let mark = if checked { "[x]" } else { "[ ]" };
    let color = if checked {
        theme.accent
    } else {
        theme.text_secondary
    };
    Span::styled(format!("{mark} {label}"), Style::default().fg(color))
}

fn render_branding(frame: &mut Frame, area: Rect, criteria: &FilterCriteria, theme: &Theme) {
    let block = rounded_block(theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut title = vec![Span::styled(
        " taskwatch ",
        Style::default()
            .fg(theme.header_accent_fg)
            .bg(theme.header_accent_bg)
            .add_modifier(Modifier::BOLD),
    )];
    let needle = criteria.search.trim();
    if !needle.is_empty() {
        title.push(Span::styled(
            format!("  search: {}", truncate_unicode(needle, 24)),
            Style::default().fg(theme.accent),
        ));
    }

    let flags = Line::from(vec![
        checkbox("Hide system", criteria.hide_system, theme),
        Span::raw("  "),
        checkbox("Hide inaccessible", criteria.hide_inaccessible, theme),
    ]);

    frame.render_widget(Paragraph::new(vec![Line::from(title), flags]), inner);
}

fn render_memory_figures(
    frame: &mut Frame,
    area: Rect,
    memory: Option<MemorySnapshot>,
    theme: &Theme,
) {
    let block = rounded_block(theme).title(Span::styled(
        " Memory ",
        Style::default()
            .fg(theme.text_secondary)
            .add_modifier(Modifier::BOLD),
    ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let label = Style::default().fg(theme.text_secondary);
    let value = Style::default().fg(theme.text_primary);
    let lines = match memory {
        Some(mem) => vec![
            Line::from(vec![
                Span::styled("Total ", label),
                Span::styled(format!("{:.2} GB", mem.total_gb), value),
                Span::styled("  Used ", label),
                Span::styled(format!("{:.2} GB", mem.used_gb), value),
            ]),
            Line::from(vec![
                Span::styled("Available ", label),
                Span::styled(format!("{:.2} GB", mem.available_gb), value),
            ]),
        ],
        None => vec![Line::from(Span::styled("Sampling...", label))],
    };
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_memory_gauge(
    frame: &mut Frame,
    area: Rect,
    memory: Option<MemorySnapshot>,
    theme: &Theme,
) {
    let percent = memory.map(|m| m.percent).unwrap_or(0.0);
    let block = rounded_block(theme).title(Span::styled(
        " RAM ",
        Style::default()
            .fg(theme.text_secondary)
            .add_modifier(Modifier::BOLD),
    ));

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(
            Style::default()
                .fg(theme.gauge_color(percent))
                .bg(theme.gauge_unfilled),
        )
        .ratio((percent / 100.0).clamp(0.0, 1.0))
        .label(format!("{percent:.1}%"));

    frame.render_widget(gauge, area);
}
