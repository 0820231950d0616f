//! Check-in flow: resolve a scanned code to a user, find today's meeting,
//! and create an attendance page unless one already exists.

pub mod reconciler;
pub mod writer;

use thiserror::Error;

use crate::api::ApiError;

pub use reconciler::{reconcile, CheckInOutcome};
pub use writer::create_attendance;

/// Reasons a check-in could not be decided this cycle.
#[derive(Error, Debug)]
pub enum CheckInError {
    #[error(transparent)]
    Remote(#[from] ApiError),

    /// An attendance page linked to the meeting has no person; the scan is
    /// abandoned rather than risking a duplicate.
    #[error("attendance {attendance_id} has no person associated")]
    MissingPerson { attendance_id: String },
}
