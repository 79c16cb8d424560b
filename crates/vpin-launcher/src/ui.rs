//! Terminal UI

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use tracing::{error, info};

use vpin_library::Snapshot;
use vpin_scores::ScoreResult;

use crate::controller::{ControllerError, SessionController};

/// What the side panel shows for the current table
struct Details {
    title: String,
    score: ScoreResult,
    snapshot: Result<Snapshot, String>,
}

/// Application state
pub struct App {
    controller: SessionController,

    /// Table list state
    list_state: ListState,

    /// Details of the current table
    details: Option<Details>,

    /// Status message
    status: String,

    /// Error shown on top of everything until dismissed
    notice: Option<String>,

    /// Should quit
    should_quit: bool,
}

impl App {
    pub fn new(controller: SessionController) -> Self {
        let mut app = Self {
            controller,
            list_state: ListState::default(),
            details: None,
            status: "Ready".to_string(),
            notice: None,
            should_quit: false,
        };
        app.rescan();
        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Handle input
    pub fn handle_input(&mut self, key: KeyCode) -> Result<()> {
        if self.notice.is_some() {
            if matches!(key, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.notice = None;
            }
            return Ok(());
        }

        match key {
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Enter => self.play(),
            KeyCode::Char('c') => {
                if self.controller.cancel_session() {
                    self.status = "Cancelling session...".to_string();
                }
            }
            KeyCode::Char('r') => self.rescan(),
            KeyCode::Char('i') => {
                let enabled = !self.controller.popup_image_errors();
                self.controller.set_popup_image_errors(enabled);
                self.status = format!(
                    "Image errors: {}",
                    if enabled { "pop up" } else { "log only" }
                );
            }
            KeyCode::Esc | KeyCode::Char('q') => {
                if self.controller.is_session_active() {
                    self.status = "Cancel the session before quitting".to_string();
                } else {
                    self.should_quit = true;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Called once per UI tick
    pub fn on_tick(&mut self) {
        if let Some(outcome) = self.controller.poll_session() {
            if outcome.is_failure() {
                error!("{}", outcome);
                self.notice = Some(outcome.to_string());
            }
            self.status = outcome.to_string();

            // Scores may have changed while playing
            if let Some(index) = self.list_state.selected() {
                self.select(index);
            }
        }
    }

    fn rescan(&mut self) {
        match self.controller.rescan() {
            Ok(count) => {
                self.status = format!("Found {} tables", count);
                self.details = None;
                if count == 0 {
                    self.list_state.select(None);
                } else {
                    let index = self.list_state.selected().unwrap_or(0).min(count - 1);
                    self.select(index);
                }
            }
            Err(ControllerError::SessionActive) => {
                self.status = "Cannot rescan while a table is being played".to_string();
            }
            Err(e) => {
                error!("Failed to scan tables: {}", e);
                self.list_state.select(None);
                self.details = None;
                self.notice = Some(format!(
                    "Cannot read {}: {}",
                    self.controller.tables_dir().display(),
                    e
                ));
                self.status = "No tables".to_string();
            }
        }
    }

    fn select(&mut self, index: usize) {
        match self.controller.select(index) {
            Ok(selection) => {
                self.list_state.select(Some(index));

                if let Err(e) = &selection.snapshot {
                    if self.controller.popup_image_errors() {
                        self.notice = Some(e.to_string());
                    }
                }

                self.details = Some(Details {
                    title: selection.table.display_title().to_string(),
                    score: selection.score,
                    snapshot: selection.snapshot.map_err(|e| e.to_string()),
                });
            }
            Err(ControllerError::SessionActive) => {
                self.status = "A table is being played".to_string();
            }
            Err(e) => {
                error!("Selection failed: {}", e);
                self.status = format!("Error: {}", e);
            }
        }
    }

    fn select_prev(&mut self) {
        let len = self.controller.tables().len();
        if len == 0 {
            return;
        }

        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.select(i);
    }

    fn select_next(&mut self) {
        let len = self.controller.tables().len();
        if len == 0 {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.select(i);
    }

    fn play(&mut self) {
        match self.controller.play() {
            Ok(table) => {
                info!("Playing {}", table.display_title());
                self.status = format!("Playing {}...", table.display_title());
            }
            Err(e) => {
                error!("Failed to launch table: {}", e);
                self.status = format!("Error: {}", e);
            }
        }
    }
}

/// Draw the UI
pub fn draw_ui(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(3), // Footer
        ])
        .split(frame.size());

    draw_header(frame, chunks[0]);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    draw_tables(frame, main[0], app);
    draw_details(frame, main[1], app);
    draw_footer(frame, chunks[2], app);

    if let Some(notice) = &app.notice {
        draw_notice(frame, notice);
    }
}

fn draw_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new("VPin Launcher - Select Table")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn draw_tables(frame: &mut Frame, area: Rect, app: &mut App) {
    let items: Vec<ListItem> = app
        .controller
        .titles()
        .into_iter()
        .map(ListItem::new)
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Tables"))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn draw_details(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(4)])
        .split(area);

    let bold = Style::default().add_modifier(Modifier::BOLD);

    let content = match &app.details {
        Some(details) => {
            let mut lines = vec![
                Line::from(Span::styled(details.title.as_str(), bold)),
                Line::from(""),
                Line::from(Span::styled(
                    details.score.to_string(),
                    Style::default().fg(Color::Green),
                )),
                Line::from(""),
            ];

            match &details.snapshot {
                Ok(snapshot) => {
                    lines.push(Line::from(vec![
                        Span::styled("Snapshot: ", bold),
                        Span::raw(snapshot.path.display().to_string()),
                    ]));
                    lines.push(Line::from(vec![
                        Span::styled("Size: ", bold),
                        Span::raw(format!("{}x{}", snapshot.width, snapshot.height)),
                    ]));
                }
                Err(_) => lines.push(Line::from(Span::styled(
                    "No snapshot",
                    Style::default().fg(Color::DarkGray),
                ))),
            }

            Text::from(lines)
        }
        None => Text::raw("No table selected"),
    };

    let details = Paragraph::new(content)
        .block(Block::default().borders(Borders::ALL).title("Table"))
        .wrap(Wrap { trim: true });
    frame.render_widget(details, chunks[0]);

    let state = app.controller.session_state();
    let session = Paragraph::new(vec![
        Line::from(vec![Span::styled("Session: ", bold), Span::raw(state.to_string())]),
        Line::from(vec![
            Span::styled("Image errors: ", bold),
            Span::raw(if app.controller.popup_image_errors() {
                "pop up"
            } else {
                "log only"
            }),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Session"));
    frame.render_widget(session, chunks[1]);
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = if app.controller.is_session_active() {
        "[C] Cancel session"
    } else {
        "[↑↓] Navigate  [Enter] Play  [R] Rescan  [I] Image errors  [Q] Quit"
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));

    let status = Paragraph::new(app.status.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(help, chunks[0]);
    frame.render_widget(status, chunks[1]);
}

fn draw_notice(frame: &mut Frame, notice: &str) {
    let area = centered(frame.size(), 60, 7);
    let popup = Paragraph::new(vec![
        Line::from(notice),
        Line::from(""),
        Line::from(Span::styled(
            "[Enter] Dismiss",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .style(Style::default().fg(Color::Red))
    .block(Block::default().borders(Borders::ALL).title("Error"))
    .wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(popup, area);
}

/// Rectangle of `percent_x` width and `height` rows centered in `area`
fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x.min(100)) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_fits_area() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(centered(area, 60, 7), Rect::new(16, 8, 48, 7));
    }

    #[test]
    fn test_centered_wide_terminal() {
        let area = Rect::new(0, 0, 2000, 10);
        let popup = centered(area, 60, 20);
        assert_eq!(popup.width, 1200);
        assert_eq!(popup.height, 10);
        assert_eq!(popup.x, 400);
        assert_eq!(popup.y, 0);
    }
}
