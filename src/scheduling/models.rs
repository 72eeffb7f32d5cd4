//! Scheduling records: technicians, weekly availability, date exceptions,
//! time-off requests and job assignments.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

// ---

/// Which business portal a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalType {
    Neta,
    Lab,
    Scavenger,
}

impl PortalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortalType::Neta => "neta",
            PortalType::Lab => "lab",
            PortalType::Scavenger => "scavenger",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "neta" => Some(PortalType::Neta),
            "lab" => Some(PortalType::Lab),
            "scavenger" => Some(PortalType::Scavenger),
            _ => None,
        }
    }
}

impl TryFrom<String> for PortalType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PortalType::parse(&value).ok_or_else(|| format!("unknown portal type '{}'", value))
    }
}

/// Lifecycle of a time-off request.
///
/// ```text
/// pending ──▶ approved ──▶ cancelled
///    │  └───▶ rejected
///    └──────────────────▶ cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOffStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl TimeOffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOffStatus::Pending => "pending",
            TimeOffStatus::Approved => "approved",
            TimeOffStatus::Rejected => "rejected",
            TimeOffStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(TimeOffStatus::Pending),
            "approved" => Some(TimeOffStatus::Approved),
            "rejected" => Some(TimeOffStatus::Rejected),
            "cancelled" | "canceled" => Some(TimeOffStatus::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition_to(self, next: TimeOffStatus) -> bool {
        use TimeOffStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Pending, Cancelled) | (Approved, Cancelled)
        )
    }

    /// Validate a transition, returning a `Conflict` error when not allowed.
    pub fn transition_to(self, next: TimeOffStatus) -> AppResult<TimeOffStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::Conflict(format!(
                "time-off request cannot move from {} to {}",
                self.as_str(),
                next.as_str()
            )))
        }
    }
}

impl TryFrom<String> for TimeOffStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TimeOffStatus::parse(&value).ok_or_else(|| format!("unknown time-off status '{}'", value))
    }
}

// ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Technician {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    #[sqlx(try_from = "String")]
    pub portal_type: PortalType,
    pub division: Option<String>,
}

/// A recurring weekly window in which a technician can be scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TechnicianAvailability {
    // ---
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub portal_type: PortalType,
    /// 0 = Sunday … 6 = Saturday.
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "default_true")]
    pub recurring: bool,
    #[serde(default)]
    pub effective_from: Option<NaiveDate>,
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
}

impl TechnicianAvailability {
    pub fn validate(&self) -> AppResult<()> {
        // ---
        if !(0..=6).contains(&self.day_of_week) {
            return Err(AppError::InvalidInput(format!(
                "day_of_week must be 0-6, got {}",
                self.day_of_week
            )));
        }
        if self.start_time >= self.end_time {
            return Err(AppError::InvalidInput("start_time must be before end_time".into()));
        }
        if let (Some(from), Some(to)) = (self.effective_from, self.effective_to) {
            if from > to {
                return Err(AppError::InvalidInput(
                    "effective_from must not be after effective_to".into(),
                ));
            }
        }
        Ok(())
    }
}

/// A one-off change to availability on a specific date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TechnicianException {
    // ---
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub portal_type: PortalType,
    pub exception_date: NaiveDate,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl TechnicianException {
    pub fn validate(&self) -> AppResult<()> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if start >= end => {
                Err(AppError::InvalidInput("start_time must be before end_time".into()))
            }
            (Some(_), None) | (None, Some(_)) => Err(AppError::InvalidInput(
                "start_time and end_time must be given together".into(),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimeOffRequest {
    // ---
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub portal_type: PortalType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: TimeOffStatus,
    pub approver_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTimeOffRequest {
    pub user_id: Uuid,
    pub portal_type: PortalType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
}

impl NewTimeOffRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.start_date > self.end_date {
            return Err(AppError::InvalidInput("start_date must not be after end_date".into()));
        }
        Ok(())
    }
}

/// Query filter for time-off requests. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TimeOffFilter {
    pub user_id: Option<Uuid>,
    pub portal_type: Option<PortalType>,
    pub status: Option<TimeOffStatus>,
    /// Requests overlapping `[start, end]`.
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TechnicianAssignment {
    // ---
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Option<Uuid>,
    pub job_title: Option<String>,
    #[sqlx(try_from = "String")]
    pub portal_type: PortalType,
    pub division: Option<String>,
    pub assignment_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub status: String,
    pub notes: Option<String>,
}

fn default_true() -> bool {
    true
}
