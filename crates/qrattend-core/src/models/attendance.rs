use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Meeting, PeopleProperty, PersonRef, RelationProperty, TitleProperty, User};

/// Month/day suffix appended to attendance titles
const TITLE_DATE_FORMAT: &str = "%m/%d";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceProperties {
    #[serde(rename = "Title", default)]
    pub title: TitleProperty,
    #[serde(rename = "Meetings", default)]
    pub meetings: RelationProperty,
    #[serde(rename = "Person", default)]
    pub person: PeopleProperty,
}

/// A page in the attendance database: one person at one meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendancePage {
    pub id: String,
    #[serde(default)]
    pub properties: AttendanceProperties,
}

impl AttendancePage {
    pub fn title(&self) -> String {
        self.properties.title.plain_text()
    }

    /// The person this attendance belongs to. Only the first entry counts.
    pub fn person(&self) -> Option<&PersonRef> {
        self.properties.person.people.first()
    }
}

/// Properties for an attendance page that has not been created yet.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub properties: AttendanceProperties,
}

impl NewAttendance {
    /// Attendance of `user` at `meeting`, titled "<first name> MM/DD".
    pub fn for_meeting(user: &User, meeting: &Meeting, day: NaiveDate) -> Self {
        let title = format!("{} {}", user.first_name(), day.format(TITLE_DATE_FORMAT));
        Self {
            properties: AttendanceProperties {
                title: TitleProperty::from_text(title),
                meetings: RelationProperty::to_page(meeting.id.clone()),
                person: PeopleProperty {
                    people: vec![user.as_person_ref()],
                },
            },
        }
    }

    pub fn title(&self) -> String {
        self.properties.title.plain_text()
    }

    pub fn person_id(&self) -> Option<&str> {
        self.properties.person.people.first().map(|p| p.id.as_str())
    }

    pub fn meeting_id(&self) -> Option<&str> {
        self.properties.meetings.relation.first().map(|r| r.id.as_str())
    }
}
