use anyhow::Result;
use chrono::{Datelike, Utc};
use log::{info, warn};
use serde::Serialize;
use tokio::sync::Mutex;

use staffbook_parser::{diff_calendars, parse_calendar, Calendar};

use crate::config::Config;
use crate::mailer::Mailer;
use crate::session::Session;
use crate::store::SnapshotStore;

/// Outcome of one check run.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub months: u32,
    pub total_events: usize,
    pub new_events: usize,
    pub notified: bool,
}

pub struct Watcher {
    config: Config,
    session: Session,
    store: SnapshotStore,
    mailer: Option<Mailer>,
    /// Serializes check runs; concurrent triggers wait their turn.
    run_lock: Mutex<()>,
}

impl Watcher {
    pub fn new(config: Config) -> Result<Self> {
        let session = Session::new(&config)?;
        let store = SnapshotStore::new(&config.data_dir);
        let mailer = config.email.clone().map(Mailer::new).transpose()?;

        Ok(Self {
            config,
            session,
            store,
            mailer,
            run_lock: Mutex::new(()),
        })
    }

    /// Runs one full check: scrape the configured months, diff against the
    /// stored snapshot, persist the results, send the notification mail.
    /// Nothing is written until every month page is fetched, so a flaky
    /// portal can delay a report but never corrupt the snapshot.
    pub async fn run_check(&self) -> Result<CheckReport> {
        let _guard = self.run_lock.lock().await;

        // A fresh login every run; the previous session may have expired.
        self.session.login().await?;

        let today = Utc::now();
        let months = month_window(today.year(), today.month(), self.config.months);

        let mut pages = Vec::with_capacity(months.len());
        let mut merged = Calendar::new();

        for &(year, month) in &months {
            let html = self.session.month_html(year, month).await?;
            let calendar = parse_calendar(&html, &self.config.base_url);
            if calendar.is_empty() {
                warn!("no events extracted for {year}-{month:02}; expired login or layout change?");
            }
            merged.merge(calendar);
            pages.push((year, month, html));
        }

        for (year, month, html) in &pages {
            self.store.save_month_html(*year, *month, html).await?;
        }

        let previous = self.store.load_snapshot().await?;
        let new_events = diff_calendars(previous.as_ref(), &merged);

        self.store.save_snapshot(&merged).await?;
        self.store.save_new_events(&new_events).await?;

        info!(
            "checked {} months: {} events, {} new",
            months.len(),
            merged.event_count(),
            new_events.event_count()
        );

        let mut notified = false;
        if !new_events.is_empty() {
            if let Some(mailer) = &self.mailer {
                match mailer.send_new_events(&new_events).await {
                    Ok(()) => notified = true,
                    // The snapshot is already saved and the diff sits in
                    // new-events.json, so a lost mail does not fail the run.
                    Err(err) => warn!("failed to send the notification mail: {err:#}"),
                }
            }
        }

        Ok(CheckReport {
            months: months.len() as u32,
            total_events: merged.event_count(),
            new_events: new_events.event_count(),
            notified,
        })
    }
}

/// The `count` consecutive `(year, month)` pairs starting at `year`/`month`,
/// wrapping December into January of the next year.
fn month_window(year: i32, month: u32, count: u32) -> Vec<(i32, u32)> {
    (0..count)
        .map(|offset| {
            let zero_based = (month - 1) + offset;
            (year + (zero_based / 12) as i32, zero_based % 12 + 1)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_window_starts_at_the_given_month() {
        assert_eq!(month_window(2026, 8, 2), vec![(2026, 8), (2026, 9)]);
        assert_eq!(month_window(2026, 8, 1), vec![(2026, 8)]);
    }

    #[test]
    fn month_window_wraps_december_into_the_next_year() {
        assert_eq!(month_window(2026, 12, 2), vec![(2026, 12), (2027, 1)]);
        assert_eq!(
            month_window(2026, 11, 4),
            vec![(2026, 11), (2026, 12), (2027, 1), (2027, 2)]
        );
    }

    #[test]
    fn month_window_covers_a_full_year_without_gaps() {
        let window = month_window(2026, 1, 12);
        assert_eq!(window.len(), 12);
        assert_eq!(window.first(), Some(&(2026, 1)));
        assert_eq!(window.last(), Some(&(2026, 12)));
    }
}
