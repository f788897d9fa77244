use crossterm::event::KeyCode;
use log::debug;
use tokio::sync::watch;

use race_tracker::{RefreshScheduler, RefreshState};

use crate::actions::Intent;
use crate::ui::UIState as UIApp;

pub struct AppController {
    pub ui_app: UIApp,
    scheduler: RefreshScheduler,
    state_rx: watch::Receiver<RefreshState>,
}

impl AppController {
    pub fn new(scheduler: RefreshScheduler) -> Self {
        let state_rx = scheduler.subscribe();
        let ui_app = UIApp::new(scheduler.snapshot());
        Self {
            ui_app,
            scheduler,
            state_rx,
        }
    }

    /// Load the board once and start the periodic refresh.
    pub fn initialize(&mut self) {
        self.scheduler.start();
        self.spawn_refresh();
    }

    pub fn shutdown(&self) {
        self.scheduler.stop();
    }

    /// Returns true when quit was requested.
    pub fn handle_key_event(&mut self, key_code: KeyCode) -> bool {
        match Intent::from_key(key_code) {
            Some(intent) => self.dispatch(intent),
            None => false,
        }
    }

    fn dispatch(&mut self, intent: Intent) -> bool {
        debug!("Dispatching {:?}", intent);
        match intent {
            Intent::Quit => {
                self.ui_app.quit();
                return true;
            }
            Intent::ToggleCategory(category) => {
                let scheduler = self.scheduler.clone();
                tokio::spawn(async move {
                    scheduler.toggle_category(category.id()).await;
                });
            }
            Intent::Refresh => self.spawn_refresh(),
            Intent::DismissError => self.scheduler.dismiss_error(),
            Intent::SelectNext => self.ui_app.next_race(),
            Intent::SelectPrevious => self.ui_app.previous_race(),
        }
        false
    }

    // Manual refresh and retry both re-run with the last-used filter
    fn spawn_refresh(&self) {
        let scheduler = self.scheduler.clone();
        tokio::spawn(async move {
            scheduler.retry().await;
        });
    }

    /// Pull the latest published state into the UI. Returns true if it changed.
    pub fn sync_state(&mut self) -> bool {
        if !matches!(self.state_rx.has_changed(), Ok(true)) {
            return false;
        }
        let state = self.state_rx.borrow_and_update().clone();
        self.ui_app.apply(state);
        true
    }

    pub fn should_quit(&self) -> bool {
        self.ui_app.should_quit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use race_tracker::{CategoryFilter, RaceCategory, RacingClient};
    use std::sync::Arc;
    use std::time::Duration;

    fn controller_with_bad_endpoint() -> (AppController, RefreshScheduler) {
        let client = RacingClient::with_endpoint("invalidURL", Duration::from_secs(1));
        let scheduler = RefreshScheduler::new(Arc::new(client), Duration::from_secs(30));
        (AppController::new(scheduler.clone()), scheduler)
    }

    #[tokio::test]
    async fn test_refresh_then_dismiss_error() {
        let (mut app, scheduler) = controller_with_bad_endpoint();
        let mut rx = scheduler.subscribe();

        assert!(!app.handle_key_event(KeyCode::Char('r')));
        rx.wait_for(|s| s.last_error.is_some()).await.unwrap();

        assert!(app.sync_state());
        assert!(app.ui_app.board.last_error.is_some());

        assert!(!app.handle_key_event(KeyCode::Char('d')));
        assert!(app.sync_state());
        assert!(app.ui_app.board.last_error.is_none());
        assert!(!app.sync_state());
    }

    #[tokio::test]
    async fn test_toggle_key_updates_filter() {
        let (mut app, scheduler) = controller_with_bad_endpoint();
        let mut rx = scheduler.subscribe();

        app.handle_key_event(KeyCode::Char('1'));
        rx.wait_for(|s| !s.selected.contains(race_tracker::category::HORSE_RACING_ID))
            .await
            .unwrap();

        app.sync_state();
        assert_eq!(
            app.ui_app.board.selected,
            CategoryFilter::from_categories([RaceCategory::Harness, RaceCategory::Greyhound])
        );
    }

    #[tokio::test]
    async fn test_quit_key() {
        let (mut app, _scheduler) = controller_with_bad_endpoint();
        assert!(app.handle_key_event(KeyCode::Char('q')));
        assert!(app.should_quit());
    }

    #[tokio::test]
    async fn test_initialize_starts_timer_and_shutdown_stops_it() {
        let (mut app, scheduler) = controller_with_bad_endpoint();
        app.initialize();
        assert!(scheduler.is_running());
        app.shutdown();
        assert!(!scheduler.is_running());
    }
}
