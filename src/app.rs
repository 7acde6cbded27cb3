use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;

use crate::action::{Action, Direction};
use crate::config::{Config, KeybindsConfig, SignificanceConfig, parse_key, save_config_to_path};
use crate::pipeline::coalesce::{Coalescer, CoalescerEvent, is_significant_change};
use crate::pipeline::filter::{FilterCriteria, FilteredView, apply_filters};
use crate::pipeline::interaction::{InteractionEvent, InteractionTracker};
use crate::pipeline::render::{Renderer, TableModel};
use crate::pipeline::timer::earliest;
use crate::system::actions::{
    ActionTarget, ProcessControl, locate_batch, locate_executable, locate_message, terminate_batch,
};
use crate::system::snapshot::{FullSnapshot, MemorySnapshot};
use crate::ui::theme::Theme;

const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);
const WHEEL_STEP: isize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Help,
    Dialog,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedKeybinds {
    pub quit: KeyCode,
    pub search: KeyCode,
    pub terminate: KeyCode,
    pub open_location: KeyCode,
    pub toggle_system: KeyCode,
    pub toggle_inaccessible: KeyCode,
    pub cycle_theme: KeyCode,
    pub refresh: KeyCode,
    pub select: KeyCode,
    pub help: KeyCode,
    pub elevate: KeyCode,
}

impl ResolvedKeybinds {
    pub fn from_config(kb: &KeybindsConfig) -> Self {
        Self {
            quit: parse_key(&kb.quit).unwrap_or(KeyCode::Char('q')),
            search: parse_key(&kb.search).unwrap_or(KeyCode::Char('/')),
            terminate: parse_key(&kb.terminate).unwrap_or(KeyCode::Char('k')),
            open_location: parse_key(&kb.open_location).unwrap_or(KeyCode::Char('o')),
            toggle_system: parse_key(&kb.toggle_system).unwrap_or(KeyCode::Char('s')),
            toggle_inaccessible: parse_key(&kb.toggle_inaccessible).unwrap_or(KeyCode::Char('i')),
            cycle_theme: parse_key(&kb.cycle_theme).unwrap_or(KeyCode::Char('t')),
            refresh: parse_key(&kb.refresh).unwrap_or(KeyCode::Char('r')),
            select: parse_key(&kb.select).unwrap_or(KeyCode::Char(' ')),
            help: parse_key(&kb.help).unwrap_or(KeyCode::Char('?')),
            elevate: parse_key(&kb.elevate).unwrap_or(KeyCode::Char('e')),
        }
    }
}

/// Foreground state. Owns the sample cache, the filter criteria and every
/// pipeline stage; nothing here is shared with the sampler thread.
pub struct App {
    pub running: bool,
    pub input_mode: InputMode,
    pub theme: Theme,
    pub keybinds: ResolvedKeybinds,
    pub search_input: String,
    pub table: TableModel,
    pub table_area: Option<Rect>,
    pub dialog: Option<Dialog>,
    cache: Option<Arc<FullSnapshot>>,
    criteria: FilterCriteria,
    view: Option<FilteredView>,
    memory: Option<MemorySnapshot>,
    coalescer: Coalescer,
    interaction: InteractionTracker,
    renderer: Renderer,
    significance: SignificanceConfig,
    control: Box<dyn ProcessControl>,
    config: Config,
    config_path: Option<PathBuf>,
    viewport_rows: Option<usize>,
    status_message: Option<(String, Instant)>,
    fetch_requested: bool,
    needs_draw: bool,
    relaunch_requested: bool,
}

impl App {
    pub fn new(config: Config, config_path: Option<PathBuf>, control: Box<dyn ProcessControl>) -> Self {
        let pipeline = &config.pipeline;
        let criteria = FilterCriteria {
            hide_system: config.general.hide_system_processes,
            hide_inaccessible: config.general.hide_inaccessible_processes,
            search: String::new(),
        };
        App {
            running: true,
            input_mode: InputMode::Normal,
            theme: Theme::from_name(&config.general.theme),
            keybinds: ResolvedKeybinds::from_config(&config.keybinds),
            search_input: String::new(),
            table: TableModel::default(),
            table_area: None,
            dialog: None,
            cache: None,
            criteria,
            view: None,
            memory: None,
            coalescer: Coalescer::new(pipeline),
            interaction: InteractionTracker::new(
                Duration::from_millis(pipeline.scroll_idle_ms),
                Duration::from_millis(pipeline.move_idle_ms),
            ),
            renderer: Renderer::new(
                Duration::from_millis(pipeline.fill_interval_ms),
                pipeline.fill_batch,
                pipeline.fallback_visible_rows,
            ),
            significance: pipeline.significance.clone(),
            control,
            config,
            config_path,
            viewport_rows: None,
            status_message: None,
            fetch_requested: false,
            needs_draw: true,
            relaunch_requested: false,
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Keybinds as written in the config, for hints and help.
    pub fn keybind_labels(&self) -> &KeybindsConfig {
        &self.config.keybinds
    }

    /// Memory summary of the last render, if any.
    pub fn memory(&self) -> Option<MemorySnapshot> {
        self.memory
    }

    pub fn render_status(&self) -> &str {
        self.renderer.status()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_ref().map(|(msg, _)| msg.as_str())
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn paint_enabled(&self) -> bool {
        self.interaction.paint_enabled()
    }

    pub fn viewport_rows(&self) -> usize {
        self.viewport_rows
            .unwrap_or(self.config.pipeline.fallback_visible_rows)
    }

    /// Recorded by the UI after each draw.
    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.viewport_rows = (rows > 0).then_some(rows);
    }

    pub fn request_fetch(&mut self) {
        self.fetch_requested = true;
    }

    pub fn take_fetch_request(&mut self) -> bool {
        std::mem::take(&mut self.fetch_requested)
    }

    /// The loop ended so the binary can restart itself elevated.
    pub fn relaunch_requested(&self) -> bool {
        self.relaunch_requested
    }

    pub fn take_needs_draw(&mut self) -> bool {
        std::mem::take(&mut self.needs_draw)
    }

    /// A snapshot arrived from the sampler: cache it, re-filter, and schedule
    /// a render, immediately if it differs enough from what is on screen.
    pub fn on_snapshot(&mut self, snapshot: Arc<FullSnapshot>, now: Instant) {
        let view = apply_filters(&snapshot, &self.criteria, self.control.as_mut());
        let immediate = !self.interaction.is_scrolling()
            && is_significant_change(self.renderer.rendered(), &view, &self.significance);
        tracing::debug!(
            processes = snapshot.len(),
            shown = view.rows.len(),
            immediate,
            "snapshot cached"
        );
        self.cache = Some(snapshot);
        self.view = Some(view);
        if immediate {
            self.coalescer.request_immediate(now);
        } else {
            self.coalescer.request_render(now);
        }
    }

    /// Re-derive the filtered view from the cache. Without a cached snapshot
    /// there is nothing to filter, so ask the sampler instead.
    fn refilter(&mut self, now: Instant) {
        let Some(snapshot) = self.cache.as_ref() else {
            self.fetch_requested = true;
            return;
        };
        self.view = Some(apply_filters(snapshot, &self.criteria, self.control.as_mut()));
        self.coalescer.request_render(now);
    }

    fn render_now(&mut self, now: Instant) {
        let Some(view) = self.view.as_ref() else {
            return;
        };
        let clock = chrono::Local::now().time();
        self.renderer
            .render(view, &mut self.table, self.viewport_rows, now, clock);
        self.memory = Some(view.memory);
        self.needs_draw = true;
    }

    /// Run every timer that is due at `now`.
    pub fn on_timers(&mut self, now: Instant) {
        for event in self.interaction.poll(now) {
            match event {
                InteractionEvent::ScrollStopped => self.coalescer.scroll_stopped(now),
                InteractionEvent::MoveStopped => {
                    self.coalescer.resume(now);
                    self.renderer.resume_fill(now);
                    self.needs_draw = true;
                }
            }
        }

        for event in self.coalescer.poll(now, self.interaction.is_scrolling()) {
            match event {
                CoalescerEvent::ApplySearch => {
                    self.criteria.search = self.search_input.clone();
                    self.refilter(now);
                }
                CoalescerEvent::Render => self.render_now(now),
            }
        }

        if self.renderer.poll(&mut self.table, self.viewport_rows, now) {
            self.needs_draw = true;
        }

        if let Some((_, created)) = &self.status_message
            && now.saturating_duration_since(*created) >= STATUS_MESSAGE_TTL
        {
            self.status_message = None;
            self.needs_draw = true;
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        earliest([
            self.coalescer.next_deadline(),
            self.interaction.next_deadline(),
            self.renderer.next_deadline(),
            self.status_message
                .as_ref()
                .map(|(_, created)| *created + STATUS_MESSAGE_TTL),
        ])
    }

    /// Terminal resize: treated like the window being dragged.
    pub fn on_resize(&mut self, now: Instant) {
        if self.interaction.on_window_moved(now) {
            self.coalescer.pause();
            self.renderer.pause_fill();
        }
    }

    pub fn map_key(&self, key: KeyEvent) -> Action {
        // Ctrl+C always quits
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }

        match self.input_mode {
            InputMode::Normal => self.map_key_normal(key),
            InputMode::Search => self.map_key_search(key),
            InputMode::Help => self.map_key_help(key),
            InputMode::Dialog => match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ') => Action::DismissDialog,
                _ => Action::None,
            },
        }
    }

    fn map_key_normal(&self, key: KeyEvent) -> Action {
        let code = key.code;
        let kb = &self.keybinds;

        match code {
            KeyCode::Up => return Action::Navigate(Direction::Up),
            KeyCode::Down => return Action::Navigate(Direction::Down),
            KeyCode::PageUp => return Action::Navigate(Direction::PageUp),
            KeyCode::PageDown => return Action::Navigate(Direction::PageDown),
            KeyCode::Home => return Action::Navigate(Direction::Home),
            KeyCode::End => return Action::Navigate(Direction::End),
            KeyCode::Esc if !self.search_input.is_empty() => return Action::ClearSearch,
            _ => {}
        }

        if code == kb.quit {
            Action::Quit
        } else if code == kb.search {
            Action::EnterSearchMode
        } else if code == kb.terminate {
            Action::Terminate
        } else if code == kb.open_location {
            Action::OpenLocation
        } else if code == kb.toggle_system {
            Action::ToggleHideSystem
        } else if code == kb.toggle_inaccessible {
            Action::ToggleHideInaccessible
        } else if code == kb.cycle_theme {
            Action::CycleTheme
        } else if code == kb.refresh {
            Action::Refresh
        } else if code == kb.select {
            Action::ToggleSelect
        } else if code == kb.help {
            Action::ToggleHelp
        } else if code == kb.elevate {
            Action::RelaunchElevated
        } else {
            Action::None
        }
    }

    fn map_key_help(&self, key: KeyEvent) -> Action {
        if key.code == self.keybinds.help || key.code == KeyCode::Esc {
            return Action::ToggleHelp;
        }
        Action::None
    }

    fn map_key_search(&self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => Action::ClearSearch,
            KeyCode::Enter => Action::ExitSearchMode,
            KeyCode::Backspace => {
                let mut text = self.search_input.clone();
                text.pop();
                Action::UpdateSearch(text)
            }
            KeyCode::Char(c) => {
                let mut text = self.search_input.clone();
                text.push(c);
                Action::UpdateSearch(text)
            }
            _ => Action::None,
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        self.dispatch_at(action, Instant::now());
    }

    pub fn dispatch_at(&mut self, action: Action, now: Instant) {
        if action != Action::None {
            self.needs_draw = true;
        }
        match action {
            Action::Quit => self.running = false,
            Action::Navigate(direction) => self.navigate(direction, now),
            Action::Scroll(delta) => {
                let viewport = self.viewport_rows();
                if self.table.scroll_by(delta, viewport) {
                    self.interaction.on_scroll(now);
                }
            }
            Action::EnterSearchMode => self.input_mode = InputMode::Search,
            Action::ExitSearchMode => self.input_mode = InputMode::Normal,
            Action::ClearSearch => {
                self.search_input.clear();
                self.input_mode = InputMode::Normal;
                if !self.criteria.search.is_empty() {
                    self.criteria.search.clear();
                    self.refilter(now);
                }
            }
            Action::UpdateSearch(text) => {
                self.search_input = text;
                self.coalescer.search_changed(now);
            }
            Action::ToggleHideSystem => {
                self.criteria.hide_system = !self.criteria.hide_system;
                self.config.general.hide_system_processes = self.criteria.hide_system;
                self.persist_settings();
                self.refilter(now);
            }
            Action::ToggleHideInaccessible => {
                self.criteria.hide_inaccessible = !self.criteria.hide_inaccessible;
                self.config.general.hide_inaccessible_processes = self.criteria.hide_inaccessible;
                self.persist_settings();
                self.refilter(now);
            }
            Action::ToggleSelect => {
                if let Some(pid) = self.cursor_target().map(|t| t.pid) {
                    self.table.toggle_selected(pid);
                }
            }
            Action::Terminate => self.terminate_targets(now),
            Action::OpenLocation => self.open_location(now),
            Action::CycleTheme => {
                self.theme = self.theme.next();
                self.config.general.theme = self.theme.name.to_string();
                self.persist_settings();
            }
            Action::ToggleHelp => {
                self.input_mode = if self.input_mode == InputMode::Help {
                    InputMode::Normal
                } else {
                    InputMode::Help
                };
            }
            Action::DismissDialog => {
                self.dialog = None;
                self.input_mode = InputMode::Normal;
            }
            Action::Refresh => self.fetch_requested = true,
            Action::RelaunchElevated => {
                if self.control.is_elevated() {
                    self.set_status("Already running with elevated privileges".to_string(), now);
                } else {
                    tracing::info!("relaunch with elevated privileges requested");
                    self.relaunch_requested = true;
                    self.running = false;
                }
            }
            Action::SelectAt(col, row) => self.select_at(col, row, now),
            Action::None => {}
        }
    }

    fn navigate(&mut self, direction: Direction, now: Instant) {
        let viewport = self.viewport_rows();
        let page = viewport.max(1) as isize;
        let last = self.table.len() as isize;
        let delta = match direction {
            Direction::Up => -1,
            Direction::Down => 1,
            Direction::PageUp => -page,
            Direction::PageDown => page,
            Direction::Home => -last,
            Direction::End => last,
        };
        if self.table.move_cursor(delta, viewport) {
            self.interaction.on_scroll(now);
        }
    }

    fn select_at(&mut self, col: u16, row: u16, now: Instant) {
        let Some(area) = self.table_area else {
            return;
        };
        // One border line plus the column header row.
        let first_row = area.y + 2;
        let last_row = area.y + area.height.saturating_sub(1);
        if col < area.x || col >= area.x + area.width || row < first_row || row >= last_row {
            return;
        }
        let index = self.table.scroll_offset() + usize::from(row - first_row);
        if index >= self.table.len() {
            return;
        }
        let delta = index as isize - self.table.cursor() as isize;
        if self.table.move_cursor(delta, self.viewport_rows()) {
            self.interaction.on_scroll(now);
        }
    }

    fn cursor_target(&self) -> Option<ActionTarget> {
        let rendered = self.renderer.rendered()?;
        rendered
            .rows
            .get(self.table.cursor())
            .map(|r| ActionTarget::new(r.pid, r.name.clone()))
    }

    /// Selected rows currently shown, or the cursor row when none are.
    pub fn action_targets(&self) -> Vec<ActionTarget> {
        let Some(rendered) = self.renderer.rendered() else {
            return Vec::new();
        };
        let selected: Vec<ActionTarget> = rendered
            .rows
            .iter()
            .filter(|r| self.table.is_selected(r.pid))
            .map(|r| ActionTarget::new(r.pid, r.name.clone()))
            .collect();
        if selected.is_empty() {
            return self.cursor_target().into_iter().collect();
        }
        selected
    }

    fn terminate_targets(&mut self, now: Instant) {
        let targets = self.action_targets();
        if targets.is_empty() {
            return;
        }
        let report = terminate_batch(self.control.as_mut(), &targets);
        if let Some(msg) = report.status_message() {
            self.set_status(msg, now);
        }
        if let Some(mut body) = report.dialog_message() {
            if !report.access_denied.is_empty() && !self.control.is_elevated() {
                body.push_str(&format!(
                    "\n\nPress {} to relaunch with elevated privileges.",
                    self.config.keybinds.elevate
                ));
            }
            self.show_dialog("Terminate", body);
        }
        self.table.clear_selection();
        self.fetch_requested = true;
    }

    fn open_location(&mut self, now: Instant) {
        let targets = self.action_targets();
        match targets.as_slice() {
            [] => {}
            [target] => match locate_executable(self.control.as_mut(), target.pid) {
                Ok(path) => {
                    tracing::info!(pid = target.pid, path = %path.display(), "revealed executable");
                    let dir = path.parent().unwrap_or(&path).display().to_string();
                    self.set_status(format!("Opened location: {dir}"), now);
                }
                Err(err) => {
                    tracing::warn!(pid = target.pid, error = %err, "open location failed");
                    self.show_dialog("Open Location", locate_message(&err));
                }
            },
            _ => {
                let report = locate_batch(self.control.as_mut(), &targets);
                if let Some(msg) = report.status_message() {
                    self.set_status(msg, now);
                }
                if let Some(body) = report.dialog_message() {
                    self.show_dialog("Open Location", body);
                }
            }
        }
    }

    fn set_status(&mut self, msg: String, now: Instant) {
        self.status_message = Some((msg, now));
    }

    fn show_dialog(&mut self, title: &str, body: String) {
        self.dialog = Some(Dialog {
            title: title.to_string(),
            body,
        });
        self.input_mode = InputMode::Dialog;
    }

    /// Theme and hide flags are written back whenever they change.
    fn persist_settings(&self) {
        let Some(path) = self.config_path.as_deref() else {
            return;
        };
        if let Err(err) = save_config_to_path(path, &self.config) {
            tracing::warn!(path = %path.display(), error = %err, "failed to save settings");
        }
    }

    pub fn help_entries(&self) -> Vec<(String, &'static str)> {
        let kb = &self.config.keybinds;
        vec![
            (kb.quit.clone(), "Quit"),
            (kb.search.clone(), "Search by name"),
            (kb.terminate.clone(), "Terminate process(es)"),
            (kb.open_location.clone(), "Open file location"),
            (kb.select.clone(), "Toggle row selection"),
            (kb.toggle_system.clone(), "Hide system processes"),
            (kb.toggle_inaccessible.clone(), "Hide inaccessible"),
            (kb.cycle_theme.clone(), "Cycle theme"),
            (kb.refresh.clone(), "Refresh now"),
            (kb.elevate.clone(), "Relaunch elevated"),
            ("\u{2191}\u{2193}".to_string(), "Move cursor"),
            ("PgUp/PgDn".to_string(), "Page"),
            ("Esc".to_string(), "Clear search / close"),
            (kb.help.clone(), "Toggle help"),
        ]
    }
}
