//! Next-to-go racing board.
//!
//! Polls a public racing feed, keeps the next few upcoming races for the
//! selected categories and republishes them on a fixed cadence. Front-ends
//! subscribe to [`scheduler::RefreshState`] and forward user intents back to
//! the [`scheduler::RefreshScheduler`].

pub mod api;
pub mod category;
pub mod config;
pub mod countdown;
pub mod error;
pub mod scheduler;
pub mod selection;

pub use api::{RaceCollection, RaceSource, RaceSummary, RacingClient};
pub use category::{CategoryFilter, RaceCategory};
pub use countdown::format_countdown;
pub use error::{ApiError, NetworkError};
pub use scheduler::{RefreshPhase, RefreshScheduler, RefreshState};
pub use selection::select;
