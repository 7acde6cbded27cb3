use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::InputMode;
use crate::config::KeybindsConfig;
use crate::ui::theme::Theme;

/// Transient action messages take priority over the render summary.
pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    status_message: Option<&str>,
    render_status: &str,
    theme: &Theme,
) {
    let bg_style = Style::default().bg(theme.statusbar_bg);

    let line = match status_message {
        Some(msg) => Line::from(Span::styled(
            format!(" {msg}"),
            Style::default()
                .fg(theme.status_ok)
                .add_modifier(Modifier::BOLD),
        )),
        None if render_status.is_empty() => Line::from(Span::styled(
            " Loading processes...",
            Style::default().fg(theme.text_secondary),
        )),
        None => Line::from(Span::styled(
            format!(" {render_status}"),
            Style::default().fg(theme.text_primary),
        )),
    };

    frame.render_widget(Paragraph::new(line).style(bg_style), area);
}

/// Key hints for the current mode, labelled with the configured keybinds.
pub fn render_hints(
    frame: &mut Frame,
    area: Rect,
    input_mode: InputMode,
    search_input: &str,
    keybinds: &KeybindsConfig,
    theme: &Theme,
) {
    let bg_style = Style::default().bg(theme.statusbar_bg);

    let line = match input_mode {
        InputMode::Search => {
            let mut spans = vec![
                Span::styled(
                    " / ",
                    Style::default()
                        .fg(theme.pill_key_fg)
                        .bg(theme.pill_key_bg)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" {search_input}"),
                    Style::default().fg(theme.pill_desc_fg),
                ),
                Span::styled("\u{2588}", Style::default().fg(theme.pill_key_bg)),
            ];
            spans.extend(pill_spans("Esc", "Clear", theme));
            spans.extend(pill_spans("Enter", "Done", theme));
            Line::from(spans)
        }
        InputMode::Dialog => Line::from(pill_spans("Enter", "Close", theme)),
        InputMode::Normal if !search_input.is_empty() => {
            let mut spans = vec![
                Span::styled(
                    " Search: ",
                    Style::default()
                        .fg(theme.pill_key_bg)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(search_input, Style::default().fg(theme.pill_desc_fg)),
            ];
            spans.extend(pill_spans("Esc", "Clear", theme));
            spans.extend(pill_spans(&keybinds.search, "Edit", theme));
            Line::from(spans)
        }
        InputMode::Normal | InputMode::Help => {
            let mut spans = Vec::new();
            spans.extend(pill_spans(&keybinds.quit, "Quit", theme));
            spans.extend(pill_spans(&keybinds.search, "Search", theme));
            spans.extend(pill_spans(&keybinds.terminate, "Terminate", theme));
            spans.extend(pill_spans(&keybinds.open_location, "Location", theme));
            spans.extend(pill_spans(&keybinds.select, "Select", theme));
            spans.extend(pill_spans(&keybinds.toggle_system, "System", theme));
            spans.extend(pill_spans(&keybinds.toggle_inaccessible, "Inaccessible", theme));
            spans.extend(pill_spans(&keybinds.cycle_theme, "Theme", theme));
            spans.extend(pill_spans(&keybinds.help, "Help", theme));
            Line::from(spans)
        }
    };

    frame.render_widget(Paragraph::new(line).style(bg_style), area);
}

fn pill_spans<'a>(key: &'a str, desc: &'a str, theme: &Theme) -> Vec<Span<'a>> {
    vec![
        Span::raw(" "),
        Span::styled(
            format!(" {key} "),
            Style::default()
                .fg(theme.pill_key_fg)
                .bg(theme.pill_key_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {desc}"),
            Style::default().fg(theme.pill_desc_fg).bg(theme.surface_bg),
        ),
    ]
}
