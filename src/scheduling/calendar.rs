//! Flatten assignments and exceptions into calendar events.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use super::models::{TechnicianAssignment, TechnicianException};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Assignment,
    Unavailable,
    Available,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    // ---
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub all_day: bool,
    /// Technician the event belongs to.
    pub resource_id: Uuid,
    pub kind: EventKind,
}

/// Build the calendar view for a set of assignments and exceptions.
///
/// Entries without both a start and end time become all-day events. The
/// result is ordered by start time.
pub fn convert_to_calendar_events(
    assignments: &[TechnicianAssignment],
    exceptions: &[TechnicianException],
) -> Vec<CalendarEvent> {
    // ---
    let mut events = Vec::with_capacity(assignments.len() + exceptions.len());

    for a in assignments {
        let (start, end, all_day) = span(a.assignment_date, a.start_time, a.end_time);
        let title = a
            .job_title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Assignment")
            .to_string();
        events.push(CalendarEvent {
            id: format!("assignment-{}", a.id),
            title,
            start,
            end,
            all_day,
            resource_id: a.user_id,
            kind: EventKind::Assignment,
        });
    }

    for e in exceptions {
        let (start, end, all_day) = span(e.exception_date, e.start_time, e.end_time);
        let (kind, label) = if e.is_available {
            (EventKind::Available, "Available")
        } else {
            (EventKind::Unavailable, "Unavailable")
        };
        let title = match e.reason.as_deref().map(str::trim) {
            Some(reason) if !reason.is_empty() => format!("{}: {}", label, reason),
            _ => label.to_string(),
        };
        events.push(CalendarEvent {
            id: format!("exception-{}", e.id),
            title,
            start,
            end,
            all_day,
            resource_id: e.user_id,
            kind,
        });
    }

    events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
    events
}

fn span(
    date: NaiveDate,
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
) -> (NaiveDateTime, NaiveDateTime, bool) {
    // ---
    match (start, end) {
        (Some(s), Some(e)) => (date.and_time(s), date.and_time(e), false),
        _ => {
            let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
            (
                date.and_time(NaiveTime::MIN),
                next.and_time(NaiveTime::MIN),
                true,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::scheduling::models::PortalType;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, d).unwrap()
    }

    fn time(h: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, 0, 0)
    }

    fn assignment(day: u32, start: Option<NaiveTime>, end: Option<NaiveTime>, title: Option<&str>) -> TechnicianAssignment {
        TechnicianAssignment {
            id: Uuid::new_v4(),
            user_id: Uuid::from_u128(7),
            job_id: None,
            job_title: title.map(String::from),
            portal_type: PortalType::Neta,
            division: Some("north".into()),
            assignment_date: date(day),
            start_time: start,
            end_time: end,
            status: "scheduled".into(),
            notes: None,
        }
    }

    fn exception(day: u32, available: bool, reason: Option<&str>) -> TechnicianException {
        TechnicianException {
            id: Uuid::new_v4(),
            user_id: Uuid::from_u128(7),
            portal_type: PortalType::Neta,
            exception_date: date(day),
            start_time: None,
            end_time: None,
            is_available: available,
            reason: reason.map(String::from),
        }
    }

    #[test]
    fn test_timed_assignment() {
        // ---
        let events = convert_to_calendar_events(
            &[assignment(3, time(8), time(12), Some("Substation 4 acceptance"))],
            &[],
        );
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.title, "Substation 4 acceptance");
        assert!(!e.all_day);
        assert_eq!(e.start, date(3).and_time(time(8).unwrap()));
        assert_eq!(e.end, date(3).and_time(time(12).unwrap()));
        assert_eq!(e.kind, EventKind::Assignment);
    }

    #[test]
    fn test_untimed_entries_are_all_day() {
        // ---
        let events = convert_to_calendar_events(
            &[assignment(4, time(8), None, None)],
            &[exception(5, false, Some("Doctor"))],
        );
        assert_eq!(events[0].title, "Assignment");
        assert!(events[0].all_day);
        assert_eq!(events[0].end, date(5).and_time(NaiveTime::MIN));

        assert_eq!(events[1].title, "Unavailable: Doctor");
        assert_eq!(events[1].kind, EventKind::Unavailable);
        assert!(events[1].all_day);
    }

    #[test]
    fn test_events_sorted_by_start() {
        // ---
        let events = convert_to_calendar_events(
            &[assignment(9, None, None, Some("Late")), assignment(1, None, None, Some("Early"))],
            &[exception(5, true, None)],
        );
        let titles: Vec<_> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Early", "Available", "Late"]);
    }
}
