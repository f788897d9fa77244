//! User intents forwarded from the terminal to the refresh scheduler
use crossterm::event::KeyCode;
use race_tracker::RaceCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    ToggleCategory(RaceCategory),
    // Doubles as "retry" while an error is showing
    Refresh,
    DismissError,
    SelectNext,
    SelectPrevious,
    Quit,
}

impl Intent {
    pub fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Intent::Quit),
            KeyCode::Char('1') => Some(Intent::ToggleCategory(RaceCategory::Horse)),
            KeyCode::Char('2') => Some(Intent::ToggleCategory(RaceCategory::Harness)),
            KeyCode::Char('3') => Some(Intent::ToggleCategory(RaceCategory::Greyhound)),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Intent::Refresh),
            KeyCode::Char('d') | KeyCode::Char('D') => Some(Intent::DismissError),
            KeyCode::Down => Some(Intent::SelectNext),
            KeyCode::Up => Some(Intent::SelectPrevious),
            _ => None,
        }
    }
}
