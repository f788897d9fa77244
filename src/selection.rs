//! Turns a raw race collection into the handful of races worth showing.
use crate::api::{RaceCollection, RaceSummary};
use crate::category::CategoryFilter;

/// Most races shown at once.
pub const MAX_RACES: usize = 5;

/// Races that jumped less than this many seconds ago still count as upcoming.
pub const START_GRACE_SECS: i64 = 60;

/// A race is upcoming while its start lies after `now - START_GRACE_SECS`.
pub fn is_upcoming(race: &RaceSummary, now: i64) -> bool {
    race.start_seconds() > now.saturating_sub(START_GRACE_SECS)
}

/// Filter by category and start time, order by start, keep the first [`MAX_RACES`].
///
/// Ties on start time are broken by race id so the result does not depend
/// on the collection's iteration order.
pub fn select(races: &RaceCollection, filter: &CategoryFilter, now: i64) -> Vec<RaceSummary> {
    let mut selected: Vec<&RaceSummary> = races
        .values()
        .filter(|race| filter.allows(&race.category_id) && is_upcoming(race, now))
        .collect();

    selected.sort_by(|a, b| {
        a.start_seconds()
            .cmp(&b.start_seconds())
            .then_with(|| a.race_id.cmp(&b.race_id))
    });

    selected.into_iter().take(MAX_RACES).cloned().collect()
}
