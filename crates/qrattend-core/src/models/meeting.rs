use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DateProperty, PageRef, RelationProperty, TitleProperty};

/// Date format used by Notion date properties without a time component
pub const NOTION_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeetingProperties {
    #[serde(rename = "Name", default)]
    pub name: TitleProperty,
    #[serde(rename = "Date", default)]
    pub date: DateProperty,
    #[serde(rename = "Attendance", default)]
    pub attendance: RelationProperty,
}

/// A page in the meetings database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    #[serde(default)]
    pub properties: MeetingProperties,
}

impl Meeting {
    pub fn name(&self) -> String {
        self.properties.name.plain_text()
    }

    pub fn date(&self) -> Option<&str> {
        self.properties.date.start()
    }

    /// Attendance pages linked to this meeting, in relation order
    pub fn attendance(&self) -> &[PageRef] {
        &self.properties.attendance.relation
    }

    /// True when the meeting's date is present and is exactly `day`.
    pub fn is_on(&self, day: NaiveDate) -> bool {
        let wanted = day.format(NOTION_DATE_FORMAT).to_string();
        self.date() == Some(wanted.as_str())
    }
}
