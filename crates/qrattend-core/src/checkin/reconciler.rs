use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::{create_attendance, CheckInError};
use crate::api::Directory;
use crate::cache::DirectoryCache;

/// What a single scan led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// The code does not match any user id.
    UnknownCode,
    /// The user exists but no meeting is dated today.
    NoMeetingToday { user_id: String },
    /// An attendance page for this user is already linked to today's meeting.
    AlreadyCheckedIn {
        user_id: String,
        meeting_id: String,
        attendance_id: String,
    },
    /// A new attendance page was created.
    CheckedIn {
        user_id: String,
        meeting_id: String,
        attendance_id: String,
        title: String,
    },
}

/// Decide and, if needed, record a check-in for a scanned `code`.
///
/// 1. The code must equal a user id (users from cache).
/// 2. The first meeting, in API order, dated exactly `today` is used.
/// 3. Attendance pages linked to that meeting are read live, in relation
///    order. A page without a person aborts the scan; a page for this user
///    means the user is already checked in.
/// 4. Otherwise an attendance page is created.
pub async fn reconcile<D: Directory + ?Sized>(
    directory: &D,
    cache: &mut DirectoryCache,
    code: &str,
    today: NaiveDate,
) -> Result<CheckInOutcome, CheckInError> {
    let users = cache.users(directory, false).await?;
    let Some(user) = users.iter().find(|u| u.id == code) else {
        debug!(code, "Found invalid QR code value");
        return Ok(CheckInOutcome::UnknownCode);
    };
    debug!(
        user = %user.display_name(),
        id = %user.id,
        email = ?user.email(),
        "Found Notion user"
    );

    let meetings = cache.meetings(directory, false).await?;
    let Some(meeting) = meetings.iter().find(|m| m.is_on(today)) else {
        debug!(user = %user.id, %today, "No meeting scheduled today");
        return Ok(CheckInOutcome::NoMeetingToday {
            user_id: user.id.clone(),
        });
    };
    debug!(meeting = %meeting.name(), date = ?meeting.date(), "Found meeting");

    for reference in meeting.attendance() {
        let page = directory.fetch_attendance(&reference.id).await?;
        match page.person() {
            None => {
                warn!(
                    attendance = %page.id,
                    %today,
                    "Found attendance with no person associated with meeting"
                );
                return Err(CheckInError::MissingPerson {
                    attendance_id: page.id,
                });
            }
            Some(person) if person.id == user.id => {
                debug!(user = %user.display_name(), "User already checked in");
                return Ok(CheckInOutcome::AlreadyCheckedIn {
                    user_id: user.id.clone(),
                    meeting_id: meeting.id.clone(),
                    attendance_id: page.id,
                });
            }
            Some(person) => {
                debug!(
                    attendance = %page.id,
                    person = %person.id,
                    "Attendance belongs to someone else"
                );
            }
        }
    }

    info!(user = %user.display_name(), meeting = %meeting.name(), "Creating new attendance");
    let page = create_attendance(directory, cache, user, meeting, today).await?;
    Ok(CheckInOutcome::CheckedIn {
        user_id: user.id.clone(),
        meeting_id: meeting.id.clone(),
        title: page.title(),
        attendance_id: page.id,
    })
}
