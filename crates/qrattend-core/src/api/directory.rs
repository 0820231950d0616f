use async_trait::async_trait;

use super::ApiError;
use crate::models::{AttendancePage, Meeting, NewAttendance, User};

/// The remote collections the check-in flow reads and writes.
///
/// `ApiClient` is the production implementation; tests substitute an
/// in-memory directory.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Every user in the workspace.
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;

    /// Every page of the meetings database, in API order.
    async fn query_meetings(&self) -> Result<Vec<Meeting>, ApiError>;

    /// Every page of the attendance database, in API order.
    async fn query_attendance(&self) -> Result<Vec<AttendancePage>, ApiError>;

    /// A single attendance page, always read live.
    async fn fetch_attendance(&self, page_id: &str) -> Result<AttendancePage, ApiError>;

    /// Create an attendance page and return it as stored.
    async fn create_attendance(
        &self,
        attendance: &NewAttendance,
    ) -> Result<AttendancePage, ApiError>;
}
