use crate::{Calendar, CalendarEvent};

/// Returns the events in `current` that were not present in `previous`,
/// grouped by date. Presence is decided per date by
/// [`CalendarEvent::fingerprint`]; a date that `previous` does not know (or
/// knows with an empty list) is new in its entirety. Without a previous
/// snapshot everything in `current` is new. Dates only `previous` knows
/// never show up in the result.
pub fn diff_calendars(previous: Option<&Calendar>, current: &Calendar) -> Calendar {
    let Some(previous) = previous else {
        return current.clone();
    };

    let mut diffed = Calendar::new();

    for (date, events) in current.iter() {
        let new_events: Vec<CalendarEvent> = match previous.get(date) {
            Some(seen) if !seen.is_empty() => events
                .iter()
                .filter(|event| {
                    !seen
                        .iter()
                        .any(|old| old.fingerprint() == event.fingerprint())
                })
                .cloned()
                .collect(),
            _ => events.to_vec(),
        };

        // A date whose events were all seen before drops out entirely.
        diffed.insert(date, new_events);
    }

    diffed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(date: &str, details: &str) -> CalendarEvent {
        CalendarEvent {
            date: date.to_string(),
            day_of_week: None,
            name: "Vagt".to_string(),
            details: details.to_string(),
            link: "https://system1.staffbook.dk/default.asp?pageid=290".to_string(),
            antal: 1,
            mangler: 1,
            html: String::new(),
        }
    }

    fn calendar(entries: &[(&str, &[&str])]) -> Calendar {
        let mut calendar = Calendar::new();
        for (date, details) in entries {
            calendar.insert(
                *date,
                details.iter().map(|d| event(date, d)).collect(),
            );
        }
        calendar
    }

    #[test]
    fn without_a_previous_snapshot_everything_is_new() {
        let current = calendar(&[("Jan 1", &["Shift A"]), ("Jan 2", &["Shift B"])]);
        assert_eq!(diff_calendars(None, &current), current);
    }

    #[test]
    fn reports_only_unseen_events_per_date() {
        let previous = calendar(&[("Jan 1", &["Shift A"])]);
        let current = calendar(&[
            ("Jan 1", &["Shift A", "Shift B"]),
            ("Jan 2", &["Shift C"]),
        ]);

        let expected = calendar(&[("Jan 1", &["Shift B"]), ("Jan 2", &["Shift C"])]);
        assert_eq!(diff_calendars(Some(&previous), &current), expected);
    }

    #[test]
    fn fully_seen_dates_are_dropped_from_the_result() {
        let previous = calendar(&[("Jan 1", &["Shift A", "Shift B"])]);
        let current = calendar(&[("Jan 1", &["Shift B", "Shift A"])]);

        let diffed = diff_calendars(Some(&previous), &current);
        assert!(diffed.is_empty());
    }

    #[test]
    fn dates_only_in_the_previous_snapshot_never_appear() {
        let previous = calendar(&[("Jan 1", &["Shift A"]), ("Jan 2", &["Shift B"])]);
        let current = calendar(&[("Jan 1", &["Shift A"])]);

        let diffed = diff_calendars(Some(&previous), &current);
        assert!(diffed.is_empty());
    }

    #[test]
    fn matching_details_on_another_date_still_count_as_new() {
        let previous = calendar(&[("Jan 1", &["Shift A"])]);
        let current = calendar(&[("Jan 2", &["Shift A"])]);

        // Fingerprints are compared within a date, not across the snapshot.
        assert_eq!(diff_calendars(Some(&previous), &current), current);
    }

    #[test]
    fn identity_is_the_details_text_alone() {
        let previous = calendar(&[("Jan 1", &["Shift A"])]);

        let mut renamed = event("Jan 1", "Shift A");
        renamed.name = "Helt andet navn".to_string();
        renamed.antal = 9;
        let mut current = Calendar::new();
        current.insert("Jan 1", vec![renamed]);

        // Same details means same event, whatever the other fields say.
        assert!(diff_calendars(Some(&previous), &current).is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn a_stored_empty_list_counts_as_an_unseen_date() {
        // Snapshots written by hand or by older builds can carry an empty
        // list; the differ treats that date as never seen.
        let previous: Calendar = serde_json::from_str(r#"{"Jan 1": []}"#).unwrap();
        let current = calendar(&[("Jan 1", &["Shift A"])]);

        assert_eq!(diff_calendars(Some(&previous), &current), current);
    }
}
