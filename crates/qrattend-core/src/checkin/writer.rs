use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::api::{ApiError, Directory};
use crate::cache::{DirectoryCache, ResourceKind};
use crate::models::{AttendancePage, Meeting, NewAttendance, User};

/// Create an attendance page for `user` at `meeting` dated `today`.
///
/// On success the page is appended to the cached attendance snapshot and the
/// meetings snapshot is refreshed, so the meeting's relation includes the new
/// page on the next scan. Failures are not retried here; the next poll starts
/// over.
pub async fn create_attendance<D: Directory + ?Sized>(
    directory: &D,
    cache: &mut DirectoryCache,
    user: &User,
    meeting: &Meeting,
    today: NaiveDate,
) -> Result<AttendancePage, ApiError> {
    let new = NewAttendance::for_meeting(user, meeting, today);
    let title = new.title();

    let page = match directory.create_attendance(&new).await {
        Ok(page) => page,
        Err(e) => {
            error!(
                title = %title,
                user = %user.id,
                meeting = %meeting.id,
                error = %e,
                "Error creating attendance"
            );
            return Err(e);
        }
    };
    info!(title = %title, attendance = %page.id, meeting = %meeting.id, "Created attendance");

    cache.record_attendance(page.clone());
    if let Err(e) = cache.meetings(directory, true).await {
        warn!(error = %e, "Failed to refresh meetings after check-in");
        cache.invalidate(ResourceKind::Meetings);
    }

    Ok(page)
}
