//! Data models for Notion entities.
//!
//! - `User`: workspace members from the users endpoint
//! - `Meeting`: pages of the meetings database
//! - `AttendancePage`, `NewAttendance`: pages of the attendance database
//! - Property shapes shared between page types

pub mod attendance;
pub mod meeting;
pub mod property;
pub mod user;

use serde::Deserialize;

pub use attendance::{AttendancePage, AttendanceProperties, NewAttendance};
pub use meeting::{Meeting, MeetingProperties, NOTION_DATE_FORMAT};
pub use property::{
    DateProperty, DateValue, PageRef, PeopleProperty, PersonRef, RelationProperty, RichText,
    TextContent, TitleProperty,
};
pub use user::{PersonDetails, User};

// Paginated list envelope shared by /users and /databases/{id}/query
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}
