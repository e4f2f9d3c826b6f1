//! Interactive terminal session: crossterm events in, cell grid out.
//!
//! [`Viewer`] owns everything a session needs (model, cell grid, hover timer,
//! activity log) and is driven by plain values, so tests feed it crossterm
//! events and an in-memory writer. [`run_viewer`] wraps it in the terminal
//! guard and the poll loop.

#![allow(missing_docs)]

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::MoveTo;
use crossterm::event::{
    self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use crossterm::queue;
use crossterm::style::{
    Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{Clear, ClearType};

use crate::bridge::hover::TimerSlot;
use crate::bridge::input::{Key, KeyInput};
use crate::bridge::model::{TimelineCmd, TimelineModel, TimelineMsg};
use crate::bridge::update::{paint_detail, paint_full, update};
use crate::core::config::Config;
use crate::core::errors::{AtlError, Result};
use crate::logger::jsonl::{EventType, JsonlWriter, LogEntry, Severity};
use crate::timeline::event::EventCatalog;
use crate::timeline::grid::CellSurface;
use crate::timeline::render::Theme;
use crate::timeline::scale::Coord;
use crate::timeline::surface::{Rgb, Surface};
use crate::timeline::viewport::{ViewportController, ViewportState};

use super::terminal_guard::TerminalGuard;

/// How often a degraded activity log retries its primary path.
const LOG_RECOVER_INTERVAL: Duration = Duration::from_secs(60);

const STATUS_HINT: &str = "Up/Down scroll  PgUp/PgDn zoom  Left/Right select  q quit";

// ──────────────────── event translation ────────────────────

/// Map a crossterm key event onto a bridge key. Releases are ignored.
#[must_use]
pub fn translate_key(event: &KeyEvent) -> Option<KeyInput> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    let key = match event.code {
        KeyCode::Up => Key::ArrowUp,
        KeyCode::Down => Key::ArrowDown,
        KeyCode::Left => Key::ArrowLeft,
        KeyCode::Right => Key::ArrowRight,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Char(ch) => Key::Char(ch),
        _ => return None,
    };
    Some(KeyInput {
        key,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
    })
}

/// Pointer message for a mouse position in terminal cells.
///
/// The status row and anything past the grid count as leaving the surface.
#[must_use]
pub fn pointer_msg(surface: &CellSurface, column: u16, row: u16) -> TimelineMsg {
    let (col, row) = (usize::from(column), usize::from(row));
    if col >= surface.cols() || row >= surface.rows() {
        return TimelineMsg::PointerLeave;
    }
    let (x, y) = surface.pixel_for_cell(col, row);
    TimelineMsg::PointerMove {
        x: Coord::from_px_f64(x),
        y: Coord::from_px_f64(y),
    }
}

/// One-line summary shown under the timeline, padded to `cols`.
#[must_use]
pub fn status_line(model: &TimelineModel, cols: usize) -> String {
    let state = model.state();
    let selected = state
        .selected_index
        .and_then(|index| model.catalog.get(index))
        .map_or_else(
            || "-".to_string(),
            |event| format!("{} ({})", event.title, event.date.format("%Y-%m-%d")),
        );
    let text = format!(
        " {} | offset {:.0}px | {} events | {} | {STATUS_HINT}",
        state.zoom,
        state.scroll_offset_x.to_px(),
        model.catalog.len(),
        selected,
    );
    let mut line: String = text.chars().take(cols).collect();
    let pad = cols.saturating_sub(line.chars().count());
    line.push_str(&" ".repeat(pad));
    line
}

/// Grid size for a terminal of `cols × rows`; the last row holds the status.
fn grid_dims(cols: u16, rows: u16) -> (usize, usize) {
    (
        usize::from(cols.max(1)),
        usize::from(rows.saturating_sub(1).max(1)),
    )
}

const fn to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.0,
        g: rgb.1,
        b: rgb.2,
    }
}

fn terminal_err(source: io::Error) -> AtlError {
    AtlError::Terminal { source }
}

// ──────────────────── viewer ────────────────────

pub struct Viewer {
    model: TimelineModel,
    surface: CellSurface,
    timer: TimerSlot,
    theme: Theme,
    log: JsonlWriter,
    logging_enabled: bool,
    last_log_recover: Instant,
    status_dirty: bool,
}

impl Viewer {
    /// Build a session for a terminal of `cols × rows` and paint the first frame.
    #[must_use]
    pub fn new(
        catalog: EventCatalog,
        config: &Config,
        log: JsonlWriter,
        cols: u16,
        rows: u16,
    ) -> Self {
        let (grid_cols, grid_rows) = grid_dims(cols, rows);
        let initial = ViewportState::default();
        let mut surface = CellSurface::new(
            grid_cols,
            grid_rows,
            f64::from(config.terminal.cell_width_px),
            f64::from(initial.zoom.font_size_px()),
        );
        surface.fit_tier(initial.zoom);

        let width = Coord::from_px_f64(surface.width());
        let viewport = ViewportController::new(width)
            .with_state(initial)
            .keep_center_on_zoom(config.input.keep_center_on_zoom);
        let model = TimelineModel::new(catalog, width)
            .with_layout(config.layout.to_settings())
            .with_bridge(config.input.to_bridge_settings())
            .with_viewport(viewport);

        let mut viewer = Self {
            model,
            surface,
            timer: TimerSlot::default(),
            theme: config.theme.clone(),
            log,
            logging_enabled: config.logging.enabled,
            last_log_recover: Instant::now(),
            status_dirty: true,
        };
        viewer.render_full();
        viewer
    }

    #[must_use]
    pub const fn model(&self) -> &TimelineModel {
        &self.model
    }

    #[must_use]
    pub const fn surface(&self) -> &CellSurface {
        &self.surface
    }

    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.model.should_quit
    }

    /// How long the loop may block on input before the hover timer is due.
    #[must_use]
    pub fn next_timeout(&self, now: Instant, max: Duration) -> Duration {
        self.timer.timeout(now, max)
    }

    pub fn handle_event(&mut self, event: &TermEvent, now: Instant) {
        let msg = match event {
            TermEvent::Key(key) => match translate_key(key) {
                Some(input) => TimelineMsg::Key(input),
                None => return,
            },
            TermEvent::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                    pointer_msg(&self.surface, mouse.column, mouse.row)
                }
                _ => return,
            },
            TermEvent::Resize(cols, rows) => {
                let (grid_cols, grid_rows) = grid_dims(*cols, *rows);
                self.surface.resize_cells(grid_cols, grid_rows);
                self.status_dirty = true;
                TimelineMsg::Resize {
                    width: Coord::from_px_f64(self.surface.width()),
                }
            }
            TermEvent::FocusLost => TimelineMsg::PointerLeave,
            _ => return,
        };
        self.dispatch(msg, now);
    }

    /// Deliver the hover timer if its deadline has passed.
    pub fn fire_due(&mut self, now: Instant) {
        if let Some(token) = self.timer.take_due(now) {
            self.dispatch(TimelineMsg::HoverTimerFired(token), now);
        }
    }

    /// Give a degraded activity log a chance to return to its primary file.
    pub fn maintain_log(&mut self, now: Instant) {
        if self.logging_enabled
            && now.saturating_duration_since(self.last_log_recover) >= LOG_RECOVER_INTERVAL
        {
            self.log.try_recover();
            self.last_log_recover = now;
        }
    }

    /// Write changed rows and the status line to `out`.
    ///
    /// # Errors
    /// Returns I/O errors from `out`.
    pub fn draw<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let rows = self.surface.take_dirty_rows();
        if rows.is_empty() && !self.status_dirty {
            return Ok(());
        }

        for row in rows {
            queue!(
                out,
                MoveTo(0, u16::try_from(row).unwrap_or(u16::MAX)),
                SetBackgroundColor(to_color(self.theme.background_color))
            )?;
            let mut current = None;
            for cell in self.surface.row_cells(row) {
                let color = cell.color.unwrap_or(self.theme.default_color);
                if current != Some(color) {
                    queue!(out, SetForegroundColor(to_color(color)))?;
                    current = Some(color);
                }
                queue!(out, Print(cell.ch))?;
            }
        }

        if self.status_dirty {
            queue!(
                out,
                ResetColor,
                MoveTo(0, u16::try_from(self.surface.rows()).unwrap_or(u16::MAX)),
                SetAttribute(Attribute::Reverse),
                Print(status_line(&self.model, self.surface.cols())),
                SetAttribute(Attribute::Reset)
            )?;
            self.status_dirty = false;
        }

        queue!(out, ResetColor)?;
        out.flush()
    }

    /// Record the end of the session and flush the log.
    pub fn finish(&mut self, error: Option<&AtlError>) {
        if let Some(err) = error {
            self.log.write_entry(&LogEntry::failure(err));
        }
        let mut stop = LogEntry::viewport(EventType::SessionStop, &self.model.state());
        if error.is_some() {
            stop.severity = Severity::Warning;
        }
        self.log.write_entry(&stop);
        self.log.flush();
    }

    // ──────────────────── internals ────────────────────

    fn dispatch(&mut self, msg: TimelineMsg, now: Instant) {
        let resized = matches!(msg, TimelineMsg::Resize { .. });
        let before = self.model.state();
        let cmd = update(&mut self.model, msg);
        self.log_transition(before, resized);
        self.execute(cmd, now);
    }

    fn execute(&mut self, cmd: TimelineCmd, now: Instant) {
        for cmd in cmd.flatten() {
            match cmd {
                TimelineCmd::RenderFull => self.render_full(),
                TimelineCmd::RenderDetail { index } => {
                    paint_detail(&self.model, Some(&mut self.surface), &self.theme, index);
                    if let Some(event) = self.model.catalog.get(index) {
                        let entry = LogEntry::viewport(EventType::HoverDetail, &self.model.state())
                            .with_event_id(event.id.clone());
                        self.log.write_entry(&entry);
                    }
                }
                TimelineCmd::ScheduleHover { token, after } => self.timer.arm(token, after, now),
                TimelineCmd::CancelHover => self.timer.clear(),
                TimelineCmd::None | TimelineCmd::Quit | TimelineCmd::Batch(_) => {}
            }
        }
    }

    fn render_full(&mut self) {
        self.surface.fit_tier(self.model.state().zoom);
        paint_full(&mut self.model, Some(&mut self.surface), &self.theme);
        self.status_dirty = true;
    }

    fn log_transition(&mut self, before: ViewportState, resized: bool) {
        let after = self.model.state();
        let event = if resized {
            EventType::Resize
        } else if after.zoom != before.zoom {
            EventType::Zoom
        } else if after.selected_index != before.selected_index {
            EventType::Select
        } else if after.scroll_offset_x != before.scroll_offset_x {
            EventType::Scroll
        } else {
            return;
        };
        let mut entry = LogEntry::viewport(event, &after);
        if let Some(selected) = after.selected_index.and_then(|i| self.model.catalog.get(i)) {
            entry = entry.with_event_id(selected.id.clone());
        }
        self.log.write_entry(&entry);
    }
}

// ──────────────────── session ────────────────────

/// Open the activity log described by `config`, or a discarding writer.
#[must_use]
pub fn open_activity_log(config: &Config) -> JsonlWriter {
    if config.logging.enabled {
        JsonlWriter::open(config.jsonl_config())
    } else {
        JsonlWriter::disabled(config.jsonl_config())
    }
}

/// Run an interactive session until the user quits.
///
/// # Errors
/// Returns terminal failures. The terminal is restored before returning.
pub fn run_viewer(catalog: EventCatalog, config: &Config, source: &str) -> Result<()> {
    let mut log = open_activity_log(config);
    log.write_entry(
        &LogEntry::new(EventType::SessionStart, Severity::Info)
            .with_details(format!("config_hash={}", config.stable_hash()?)),
    );
    let mut loaded = LogEntry::new(EventType::DatasetLoad, Severity::Info).with_details(source);
    loaded.events = Some(catalog.len());
    log.write_entry(&loaded);

    let guard = TerminalGuard::new().map_err(terminal_err)?;
    let (cols, rows) = TerminalGuard::terminal_size();
    let mut viewer = Viewer::new(catalog, config, log, cols, rows);
    let result = session_loop(
        &mut viewer,
        Duration::from_millis(config.terminal.frame_poll_ms),
    );
    drop(guard);

    viewer.finish(result.as_ref().err());
    result
}

fn session_loop(viewer: &mut Viewer, max_wait: Duration) -> Result<()> {
    let mut stdout = io::stdout();
    queue!(stdout, Clear(ClearType::All)).map_err(terminal_err)?;
    viewer.draw(&mut stdout).map_err(terminal_err)?;

    while !viewer.should_quit() {
        let wait = viewer.next_timeout(Instant::now(), max_wait);
        if event::poll(wait).map_err(terminal_err)? {
            let event = event::read().map_err(terminal_err)?;
            viewer.handle_event(&event, Instant::now());
        }
        let now = Instant::now();
        viewer.fire_due(now);
        viewer.maintain_log(now);
        viewer.draw(&mut stdout).map_err(terminal_err)?;
    }
    Ok(())
}
