use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use race_tracker::category::category_name;
use race_tracker::{format_countdown, RaceCategory, RaceSummary, RefreshState};

// Layout constants
const HEADER_HEIGHT: u16 = 5;
const FOOTER_HEIGHT: u16 = 3;
const STATUS_HEIGHT: u16 = 3;
const MARGIN: u16 = 1;

// Race row layout
const HIGHLIGHT_WIDTH: usize = 3; // " > "
const GLYPH_WIDTH: usize = 3;
const RACE_NUMBER_WIDTH: usize = 4; // "R12 "
const COUNTDOWN_WIDTH: usize = 8;
const SEPARATORS_WIDTH: usize = 9; // " │ " * 3
const MIN_MEETING_WIDTH: usize = 10;

pub struct UIState {
    pub board: RefreshState,
    pub current_race_index: usize,
    pub list_state: ListState,
    pub should_quit: bool,
}

impl UIState {
    pub fn new(board: RefreshState) -> Self {
        let mut ui = Self {
            board,
            current_race_index: 0,
            list_state: ListState::default(),
            should_quit: false,
        };
        ui.clamp_selection();
        ui
    }

    /// Replace the board with a fresh snapshot, keeping the cursor in range.
    pub fn apply(&mut self, board: RefreshState) {
        self.board = board;
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        if self.board.races.is_empty() {
            self.current_race_index = 0;
            self.list_state.select(None);
        } else {
            self.current_race_index = self.current_race_index.min(self.board.races.len() - 1);
            self.list_state.select(Some(self.current_race_index));
        }
    }

    pub fn current_race(&self) -> Option<&RaceSummary> {
        self.board.races.get(self.current_race_index)
    }

    pub fn next_race(&mut self) {
        if !self.board.races.is_empty() {
            self.current_race_index = (self.current_race_index + 1) % self.board.races.len();
            self.list_state.select(Some(self.current_race_index));
        }
    }

    pub fn previous_race(&mut self) {
        if !self.board.races.is_empty() {
            self.current_race_index = if self.current_race_index == 0 {
                self.board.races.len() - 1
            } else {
                self.current_race_index - 1
            };
            self.list_state.select(Some(self.current_race_index));
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

/// Draw the whole board. `now` is the wall clock in epoch seconds.
pub fn render_ui(f: &mut Frame, app: &mut UIState, now: i64) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(MARGIN)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(7),
            Constraint::Length(STATUS_HEIGHT),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(f.area());

    render_header(f, chunks[0], app, now);
    render_race_list(f, chunks[1], app, now);
    render_status(f, chunks[2], &app.board);
    render_footer(f, chunks[3]);
}

fn render_header(f: &mut Frame, area: Rect, app: &UIState, now: i64) {
    let board = &app.board;
    let mut toggles = Vec::new();
    for (i, category) in RaceCategory::ALL.into_iter().enumerate() {
        let on = board.selected.contains(category.id());
        let style = if on {
            Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let mark = if on { "x" } else { " " };
        toggles.push(Span::styled(
            format!(" {} [{}] {} ", i + 1, mark, category.display_name()),
            style,
        ));
        toggles.push(Span::raw(" "));
    }

    let content = vec![
        Line::from(vec![
            Span::styled("NEXT TO GO", Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
            Span::styled(" - upcoming races", Style::default().fg(Color::Cyan)),
        ]),
        Line::from(toggles),
        Line::from(Span::styled(
            app.current_race()
                .map(|race| describe_race(race, now))
                .unwrap_or_default(),
            Style::default().fg(Color::White),
        )),
    ];

    let header = Paragraph::new(Text::from(content)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title("Filters"),
    );

    f.render_widget(header, area);
}

fn render_race_list(f: &mut Frame, area: Rect, app: &mut UIState, now: i64) {
    let meeting_width = (area.width as usize)
        .saturating_sub(4 + HIGHLIGHT_WIDTH + GLYPH_WIDTH + RACE_NUMBER_WIDTH + COUNTDOWN_WIDTH + SEPARATORS_WIDTH)
        .max(MIN_MEETING_WIDTH);

    let items: Vec<ListItem> = app
        .board
        .races
        .iter()
        .map(|race| {
            let remaining = race.seconds_until(now);
            let item = ListItem::new(race_row(race, remaining, meeting_width));
            if remaining < 0 {
                item.style(Style::default().fg(Color::Red).add_modifier(Modifier::DIM))
            } else {
                item
            }
        })
        .collect();

    let title = if app.board.races.is_empty() && !app.board.is_loading() {
        "Upcoming Races - none to show".to_string()
    } else {
        format!("Upcoming Races ({})", app.board.races.len())
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(" > ");

    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn race_row(race: &RaceSummary, remaining: i64, meeting_width: usize) -> String {
    let glyph = race.category().map(RaceCategory::glyph).unwrap_or("???");
    format!(
        "{:<gw$} │ {:<mw$} │ R{:<3}│ {:>cw$}",
        glyph,
        truncate_string(&race.meeting_name, meeting_width),
        race.race_number,
        format_countdown(remaining),
        gw = GLYPH_WIDTH,
        mw = meeting_width,
        cw = COUNTDOWN_WIDTH,
    )
}

fn render_status(f: &mut Frame, area: Rect, board: &RefreshState) {
    let line = if board.is_loading() {
        Line::from(Span::styled("Loading races…", Style::default().fg(Color::Cyan)))
    } else if let Some(error) = &board.last_error {
        Line::from(vec![
            Span::styled(error.clone(), Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::styled("  R retry • D dismiss", Style::default().fg(Color::Gray)),
        ])
    } else if let Some(updated) = board.last_updated {
        Line::from(Span::styled(
            format!(
                "Updated {} • showing {} of {} races",
                updated.with_timezone(&Local).format("%H:%M:%S"),
                board.races.len(),
                board.fetched
            ),
            Style::default().fg(Color::White),
        ))
    } else {
        Line::from("")
    };

    let border = if board.last_error.is_some() { Color::Red } else { Color::Blue };
    let status = Paragraph::new(Text::from(line)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title("Status"),
    );

    f.render_widget(status, area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let controls_text = vec![Line::from(vec![
        Span::styled("1/2/3 ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::styled("Toggle category • ", Style::default().fg(Color::White)),
        Span::styled("↑/↓ ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::styled("Navigate • ", Style::default().fg(Color::White)),
        Span::styled("R ", Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)),
        Span::styled("Refresh • ", Style::default().fg(Color::White)),
        Span::styled("Q ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::styled("Quit", Style::default().fg(Color::White)),
    ])];

    let controls = Paragraph::new(Text::from(controls_text))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Gray))
                .title("Controls"),
        );

    f.render_widget(controls, area);
}

/// Label read out for a race, e.g. for a screen reader or a detail line.
pub fn describe_race(race: &RaceSummary, now: i64) -> String {
    format!(
        "{}, {}, race {}, starts in {}",
        category_name(&race.category_id),
        race.meeting_name,
        race.race_number,
        format_countdown(race.seconds_until(now))
    )
}

fn truncate_string(s: &str, max_len: usize) -> String {
    // Char-aware; each char counted as width 1
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return s.chars().take(max_len).collect();
    }
    let trimmed: String = s.chars().take(max_len - 3).collect();
    format!("{}...", trimmed)
}
