//! Technician scheduling: availability, exceptions, time off and
//! assignments, plus their calendar rendering.

mod calendar;
mod models;
mod service;

pub use calendar::{convert_to_calendar_events, CalendarEvent, EventKind};
pub use models::{
    NewTimeOffRequest, PortalType, Technician, TechnicianAssignment, TechnicianAvailability,
    TechnicianException, TimeOffFilter, TimeOffRequest, TimeOffStatus,
};
pub use service::SchedulingService;
