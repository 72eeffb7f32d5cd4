//! Editing lifecycle of a single report, independent of any transport.
//!
//! The session never performs I/O itself. A caller asks it to start a load
//! or save, does the request however it likes, and hands the outcome back.
//! That keeps ordering decisions (which response is stale, when edits are
//! allowed) in one testable place.
//!
//! ```text
//!  New ──edit──▶ Editing ──save ok──▶ Viewing ──edit()──▶ Editing
//!                   ▲                                       │
//!                   └──────────── save failed ◀─────────────┘
//! ```

use uuid::Uuid;

use super::form::{FieldUpdate, FormError, ReportForm};
use super::ReportKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No report id yet; the form is editable.
    New,
    Editing,
    /// Saved and read-only until [`ReportSession::edit`] is called.
    Viewing,
}

/// Result of fetching a report, as reported by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Found(ReportForm),
    NotFound,
    Failed(String),
}

/// Issued by [`ReportSession::begin_load`]; identifies one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    edits_at_issue: u64,
}

/// What the session did with a finished load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadDisposition {
    Applied,
    /// A newer load was started after this one.
    Superseded,
    /// The user edited the form while this load was in flight.
    EditsInProgress,
    /// The session was torn down before the response arrived.
    Detached,
    /// A stored report arrived for a session with no report id.
    NoReportId,
}

#[derive(Debug, Clone)]
pub struct ReportSession {
    // ---
    kind: ReportKind,
    job_id: Uuid,
    report_id: Option<Uuid>,
    form: ReportForm,
    mode: Mode,
    latest_load: u64,
    edit_count: u64,
    alert: Option<String>,
    detached: bool,
}

impl ReportSession {
    // ---

    /// Start a session for a brand-new report on a job.
    pub fn new(kind: ReportKind, job_id: Uuid) -> Self {
        Self::with_form(kind, job_id, ReportForm::initial(kind))
    }

    /// Start a session for a new report with a prefilled form.
    pub fn with_form(kind: ReportKind, job_id: Uuid, form: ReportForm) -> Self {
        ReportSession {
            kind,
            job_id,
            report_id: None,
            form,
            mode: Mode::New,
            latest_load: 0,
            edit_count: 0,
            alert: None,
            detached: false,
        }
    }

    /// Start a session for an existing report that still has to be loaded.
    pub fn open(kind: ReportKind, job_id: Uuid, report_id: Uuid) -> Self {
        ReportSession {
            report_id: Some(report_id),
            mode: Mode::Viewing,
            ..Self::new(kind, job_id)
        }
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn report_id(&self) -> Option<Uuid> {
        self.report_id
    }

    pub fn form(&self) -> &ReportForm {
        &self.form
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_editable(&self) -> bool {
        matches!(self.mode, Mode::New | Mode::Editing)
    }

    /// Message to show the user, if the last load or save failed.
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    // ---

    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest_load += 1;
        LoadTicket {
            seq: self.latest_load,
            edits_at_issue: self.edit_count,
        }
    }

    /// Apply a finished load unless it has gone stale.
    ///
    /// - `Found` replaces the form and switches to viewing. It is refused
    ///   when the session has no report id, since a save from viewing mode
    ///   would have nothing to address.
    /// - `NotFound` switches to editing silently: there is nothing to load yet.
    /// - `Failed` raises an alert and forces editing so work is not blocked.
    pub fn finish_load(&mut self, ticket: LoadTicket, outcome: LoadOutcome) -> LoadDisposition {
        // ---
        if self.detached {
            return LoadDisposition::Detached;
        }
        if ticket.seq != self.latest_load {
            tracing::debug!(seq = ticket.seq, latest = self.latest_load, "ignoring superseded load");
            return LoadDisposition::Superseded;
        }
        if self.edit_count != ticket.edits_at_issue {
            tracing::debug!(seq = ticket.seq, "ignoring load that finished after edits began");
            return LoadDisposition::EditsInProgress;
        }

        if self.report_id.is_none() && matches!(outcome, LoadOutcome::Found(_)) {
            tracing::warn!(job_id = %self.job_id, "ignoring stored report for a session without an id");
            return LoadDisposition::NoReportId;
        }

        match outcome {
            LoadOutcome::Found(form) => {
                self.form = form;
                self.mode = Mode::Viewing;
            }
            LoadOutcome::NotFound => {
                self.mode = Mode::Editing;
            }
            LoadOutcome::Failed(message) => {
                tracing::warn!(report_id = ?self.report_id, %message, "report load failed");
                self.alert = Some(message);
                self.mode = Mode::Editing;
            }
        }
        LoadDisposition::Applied
    }

    /// Apply one edit. Rejected while viewing a saved report.
    pub fn apply(&mut self, update: FieldUpdate) -> Result<(), FormError> {
        // ---
        if !self.is_editable() {
            return Err(FormError::ReadOnly);
        }
        self.form.apply(update)?;
        self.edit_count += 1;
        Ok(())
    }

    /// Re-enable editing of a saved report.
    pub fn edit(&mut self) {
        if self.mode == Mode::Viewing {
            self.mode = Mode::Editing;
        }
    }

    /// Snapshot of the form to send to storage.
    pub fn begin_save(&self) -> Result<ReportForm, FormError> {
        if !self.is_editable() {
            return Err(FormError::ReadOnly);
        }
        Ok(self.form.clone())
    }

    /// Record the outcome of a save.
    ///
    /// On success the session adopts the (possibly newly assigned) id and
    /// becomes read-only. On failure it stays editable and raises an alert.
    pub fn finish_save(&mut self, outcome: Result<Uuid, String>) {
        // ---
        if self.detached {
            return;
        }
        match outcome {
            Ok(id) => {
                self.report_id = Some(id);
                self.mode = Mode::Viewing;
                self.alert = None;
            }
            Err(message) => {
                tracing::warn!(report_id = ?self.report_id, %message, "report save failed");
                self.alert = Some(message);
                if self.mode == Mode::Viewing {
                    self.mode = Mode::Editing;
                }
            }
        }
    }

    /// Detach the session from its view. Responses arriving later are
    /// dropped.
    pub fn teardown(&mut self) {
        self.detached = true;
    }
}
