use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{Calendar, CalendarEvent};

macro_rules! selector {
    ($query:expr) => {{
        static SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse($query).unwrap());
        &SELECTOR
    }};
}

/// Extracts every recognizable shift event from a monthly calendar page.
///
/// Malformed markup never fails the call: unrecognized day cells, broken
/// event tables and events without a matching tooltip are skipped while the
/// rest of the document is still processed. Entirely unparseable input
/// yields an empty [`Calendar`].
pub fn parse_calendar(html: &str, base_url: &Url) -> Calendar {
    let doc = Html::parse_document(html);
    let mut calendar = Calendar::new();

    for cell in doc.select(selector!(".CalendarHeader")) {
        let Some((date, events)) = parse_day(cell, base_url) else {
            continue;
        };
        calendar.insert(date, events);
    }

    calendar
}

fn parse_day(cell: ElementRef, base_url: &Url) -> Option<(String, Vec<CalendarEvent>)> {
    let children: Vec<ElementRef> = cell.child_elements().collect();

    // Two known cell shapes, told apart by element-child count. The skipped
    // positions are <br> separators.
    let (day_of_week_el, date_el, table) = match children.as_slice() {
        [day_of_week, _, date, _, table] => (Some(*day_of_week), *date, *table),
        [date, _, table] => (None, *date, *table),
        _ => return None,
    };

    let date = date_el.text().collect::<String>();
    let day_of_week = day_of_week_el.map(|el| el.text().collect::<String>());

    // A broken event table means zero events for this date, not a failure.
    let events = event_wrappers(table)
        .map(|wrappers| {
            wrappers
                .into_iter()
                .filter_map(|wrapper| parse_event(wrapper, &date, day_of_week.as_deref(), base_url))
                .collect()
        })
        .unwrap_or_default();

    Some((date, events))
}

/// Descends the fixed path from the day cell's table to the elements that
/// each wrap one event: first tbody, second row, first cell, first
/// container, the container's children.
fn event_wrappers(table: ElementRef) -> Option<Vec<ElementRef>> {
    let tbody = table
        .child_elements()
        .find(|el| el.value().name() == "tbody")?;
    let row = tbody
        .child_elements()
        .filter(|el| el.value().name() == "tr")
        .nth(1)?;
    let cell = row.child_elements().next()?;
    let container = cell.child_elements().next()?;
    Some(container.child_elements().collect())
}

fn parse_event(
    wrapper: ElementRef,
    date: &str,
    day_of_week: Option<&str>,
    base_url: &Url,
) -> Option<CalendarEvent> {
    // Reservable slots are wrapped in an anchor with a tooltip; anything
    // else in the cell is decoration.
    let anchor = wrapper.child_elements().next()?;
    if anchor.value().name() != "a" {
        return None;
    }

    let (antal, mangler) = parse_tooltip(anchor.value().attr("title")?)?;

    let href = anchor.value().attr("href").unwrap_or("");
    let link = base_url.join(href).ok()?.to_string();

    let mut parts = anchor.child_elements();
    let name = parts.next()?.text().collect::<String>();
    // The second child is a line-break placeholder, the third holds the
    // details text.
    let details = collapse_whitespace(&parts.nth(1)?.text().collect::<String>());

    Some(CalendarEvent {
        date: date.to_string(),
        day_of_week: day_of_week.map(str::to_string),
        name,
        details,
        link,
        antal,
        mangler,
        html: wrapper.inner_html(),
    })
}

fn parse_tooltip(tooltip: &str) -> Option<(u32, u32)> {
    static TOOLTIP: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"Antal : (\d+) Mangler : (\d+)").unwrap());

    let caps = TOOLTIP.captures(tooltip)?;
    let antal = caps[1].parse().ok()?;
    let mangler = caps[2].parse().ok()?;
    Some((antal, mangler))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
