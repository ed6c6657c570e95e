use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs;

use staffbook_parser::Calendar;

const SNAPSHOT: &str = "calendar.json";
const SNAPSHOT_PREV: &str = "calendar.prev.json";
const NEW_EVENTS: &str = "new-events.json";

/// Filesystem-backed snapshot storage. Everything lives as flat files under
/// one data directory; where a file is rotated, the previous version is kept
/// alongside the new one under a `.prev` name.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Loads the stored calendar snapshot. A missing file is the valid
    /// first-run state and loads as `None`. A snapshot that no longer parses
    /// is an error rather than an empty calendar, so a bad write cannot
    /// silently turn every event "new" again.
    pub async fn load_snapshot(&self) -> Result<Option<Calendar>> {
        let path = self.dir.join(SNAPSHOT);

        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", path.display()))
            }
        };

        let snapshot = serde_json::from_str(&json)
            .with_context(|| format!("{} does not contain a valid snapshot", path.display()))?;

        Ok(Some(snapshot))
    }

    pub async fn save_snapshot(&self, calendar: &Calendar) -> Result<()> {
        self.write_rotated(SNAPSHOT, SNAPSHOT_PREV, &serde_json::to_string_pretty(calendar)?)
            .await
    }

    /// Persists the latest diff result. Not rotated; each check overwrites
    /// the one report the operator cares about.
    pub async fn save_new_events(&self, new_events: &Calendar) -> Result<()> {
        self.write(NEW_EVENTS, &serde_json::to_string_pretty(new_events)?)
            .await
    }

    /// Archives a raw month page as `month-YYYY-MM.html` for debugging
    /// parser drift against what the portal actually served.
    pub async fn save_month_html(&self, year: i32, month: u32, html: &str) -> Result<()> {
        let name = format!("month-{year:04}-{month:02}.html");
        let prev = format!("month-{year:04}-{month:02}.prev.html");
        self.write_rotated(&name, &prev, html).await
    }

    async fn write_rotated(&self, name: &str, prev_name: &str, contents: &str) -> Result<()> {
        let path = self.dir.join(name);
        let prev = self.dir.join(prev_name);

        match fs::rename(&path, &prev).await {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("failed to rotate {}", path.display()))
            }
        }

        self.write(name, contents).await
    }

    async fn write(&self, name: &str, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;

        let path = self.dir.join(name);
        fs::write(&path, contents)
            .await
            .with_context(|| format!("failed to write {}", path.display()))
    }
}
