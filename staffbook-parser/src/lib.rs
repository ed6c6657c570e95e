mod diff;
mod parser;
mod structs;

pub use diff::diff_calendars;
pub use parser::parse_calendar;
pub use structs::{Calendar, CalendarEvent};
