// Fetch once, print the board, exit
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use log::debug;

use race_tracker::category::category_name;
use race_tracker::config::{init_logging, Config};
use race_tracker::{format_countdown, select};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(config.log_file.as_deref(), true)?;

    let client = config.client();
    let response = client
        .get_races()
        .await
        .with_context(|| format!("Failed to load race data from {}", client.base_url()))?;

    let now = Utc::now().timestamp();
    let summaries = response.data.race_summaries;
    let races = select(&summaries, &config.initial_filter(), now);
    debug!("Selected {} of {} races", races.len(), summaries.len());

    if races.is_empty() {
        println!("No upcoming races.");
        return Ok(());
    }

    for race in &races {
        println!(
            "{:<17} {:<28} R{:<3} {:>8}",
            category_name(&race.category_id),
            race.meeting_name,
            race.race_number,
            format_countdown(race.seconds_until(now))
        );
    }

    Ok(())
}
