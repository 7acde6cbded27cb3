pub mod header;
pub mod overlay;
pub mod statusbar;
pub mod table;
pub mod theme;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::{App, InputMode};

pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    header::render(
        frame,
        chunks[0],
        app.memory(),
        app.criteria(),
        &app.theme,
    );

    app.table_area = Some(chunks[1]);
    app.set_viewport_rows(table::viewport_rows(chunks[1]));
    table::render(frame, chunks[1], &app.table, &app.theme);

    statusbar::render_status(
        frame,
        chunks[2],
        app.status_message(),
        app.render_status(),
        &app.theme,
    );
    statusbar::render_hints(
        frame,
        chunks[3],
        app.input_mode,
        &app.search_input,
        app.keybind_labels(),
        &app.theme,
    );

    // Overlays last so they draw on top
    match app.input_mode {
        InputMode::Help => overlay::render_help(frame, frame.area(), &app.help_entries(), &app.theme),
        InputMode::Dialog => {
            if let Some(dialog) = &app.dialog {
                overlay::render_dialog(frame, frame.area(), dialog, &app.theme);
            }
        }
        InputMode::Normal | InputMode::Search => {}
    }
}
