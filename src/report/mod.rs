//! Report forms: the in-memory model, its storage shapes, and the editing
//! session that ties them together.

pub mod form;
mod kind;
pub mod session;
pub mod shape;

pub use form::{FieldUpdate, FormError, ReportForm, ReportStatus};
pub use kind::ReportKind;
pub use session::{LoadDisposition, LoadOutcome, LoadTicket, Mode, ReportSession};
pub use shape::{normalize_loaded, serialize_for_save, SaveShape, StoredRow, StoredShape};
