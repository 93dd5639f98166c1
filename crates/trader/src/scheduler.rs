use chrono::{DateTime, Days, NaiveTime, Utc};
use tracing::info;

use crate::services::pipeline::TradingPipeline;

/// The next wall-clock trigger strictly after `now`. Trigger times are
/// assumed sorted and deduplicated (the config loader guarantees both);
/// when every time today has passed, the first time tomorrow is next.
pub fn next_trigger(now: DateTime<Utc>, times: &[NaiveTime]) -> DateTime<Utc> {
    let today = now.date_naive();
    for time in times {
        let candidate = today.and_time(*time).and_utc();
        if candidate > now {
            return candidate;
        }
    }
    (today + Days::new(1)).and_time(times[0]).and_utc()
}

/// Runs cycles at fixed UTC times, strictly sequentially. A cycle that runs
/// past the next trigger simply defers it; no cycles ever overlap.
pub struct Scheduler {
    pipeline: TradingPipeline,
    times: Vec<NaiveTime>,
}

impl Scheduler {
    pub fn new(pipeline: TradingPipeline, times: Vec<NaiveTime>) -> Self {
        Self { pipeline, times }
    }

    pub async fn run(self) {
        info!(triggers = ?self.times, "scheduler started");
        loop {
            let now = Utc::now();
            let trigger = next_trigger(now, &self.times);
            let wait = (trigger - now)
                .to_std()
                .unwrap_or_else(|_| std::time::Duration::from_secs(0));
            info!(at = %trigger, wait_secs = wait.as_secs(), "sleeping until next trigger");
            tokio::time::sleep(wait).await;
            self.pipeline.run_cycle().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn times() -> Vec<NaiveTime> {
        ["03:58", "07:58", "11:58", "15:58", "19:58", "23:58"]
            .iter()
            .map(|t| NaiveTime::parse_from_str(t, "%H:%M").unwrap())
            .collect()
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 8, h, m, s).unwrap()
    }

    #[test]
    fn picks_the_next_time_today() {
        assert_eq!(next_trigger(at(5, 0, 0), &times()), at(7, 58, 0));
    }

    #[test]
    fn midnight_rolls_to_first_slot_of_the_day() {
        assert_eq!(next_trigger(at(0, 0, 0), &times()), at(3, 58, 0));
    }

    #[test]
    fn after_last_slot_rolls_to_tomorrow() {
        let next = next_trigger(at(23, 58, 30), &times());
        assert_eq!(
            next,
            Utc.with_ymd_and_hms(2024, 9, 9, 3, 58, 0).unwrap()
        );
    }

    #[test]
    fn exact_trigger_instant_advances_to_the_following_slot() {
        assert_eq!(next_trigger(at(7, 58, 0), &times()), at(11, 58, 0));
    }
}
