use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One reservable shift entry as rendered on a monthly calendar page.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalendarEvent {
    /// Date label exactly as the portal renders it, never normalized.
    pub date: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub day_of_week: Option<String>,
    pub name: String,
    pub details: String,
    /// Absolute URL of the event's detail page.
    pub link: String,
    /// Total slot count from the tooltip.
    pub antal: u32,
    /// Unfilled slot count from the tooltip.
    pub mangler: u32,
    /// Verbatim inner markup of the event wrapper, kept for rich rendering.
    pub html: String,
}

impl CalendarEvent {
    /// Identity used when comparing snapshots. The portal exposes no stable
    /// event id, so the details text doubles as one; two events with
    /// identical details are indistinguishable.
    pub fn fingerprint(&self) -> &str {
        &self.details
    }
}

/// Events grouped by date label, in the order they appear on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Calendar(BTreeMap<String, Vec<CalendarEvent>>);

impl Calendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends events under a date label. Empty lists are dropped here so a
    /// date never maps to zero events.
    pub fn insert(&mut self, date: impl Into<String>, events: Vec<CalendarEvent>) {
        if events.is_empty() {
            return;
        }
        self.0.entry(date.into()).or_default().extend(events);
    }

    /// Key union with `other`. Months have mutually exclusive date labels,
    /// so callers merging per-month extractions never collide; a colliding
    /// key keeps `other`'s list.
    pub fn merge(&mut self, other: Calendar) {
        self.0.extend(other.0);
    }

    pub fn get(&self, date: &str) -> Option<&[CalendarEvent]> {
        self.0.get(date).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CalendarEvent])> {
        self.0.iter().map(|(date, events)| (date.as_str(), events.as_slice()))
    }

    /// Number of dates.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of events across all dates.
    pub fn event_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}
