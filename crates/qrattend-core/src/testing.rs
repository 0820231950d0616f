//! In-memory `Directory` and record builders shared by unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{ApiError, Directory};
use crate::models::{
    AttendancePage, AttendanceProperties, DateProperty, DateValue, Meeting, MeetingProperties,
    NewAttendance, PageRef, PeopleProperty, PersonRef, RelationProperty, TitleProperty, User,
};

pub fn user(id: &str, name: &str) -> User {
    User {
        id: id.to_string(),
        name: Some(name.to_string()),
        kind: Some("person".to_string()),
        avatar_url: None,
        person: None,
    }
}

pub fn meeting(id: &str, date: Option<&str>, attendance: &[&str]) -> Meeting {
    Meeting {
        id: id.to_string(),
        properties: MeetingProperties {
            name: TitleProperty::from_text(format!("Meeting {}", id)),
            date: DateProperty {
                date: date.map(|d| DateValue {
                    start: Some(d.to_string()),
                    end: None,
                }),
            },
            attendance: RelationProperty {
                relation: attendance
                    .iter()
                    .map(|a| PageRef { id: a.to_string() })
                    .collect(),
            },
        },
    }
}

pub fn attendance(id: &str, person: Option<&str>) -> AttendancePage {
    AttendancePage {
        id: id.to_string(),
        properties: AttendanceProperties {
            title: TitleProperty::from_text(id),
            meetings: RelationProperty::default(),
            person: PeopleProperty {
                people: person.map(PersonRef::user).into_iter().collect(),
            },
        },
    }
}

/// Directory backed by vectors. Creating an attendance page links it to its
/// meeting the way the Notion relation does.
#[derive(Default)]
pub struct MemoryDirectory {
    pub users: Mutex<Vec<User>>,
    pub meetings: Mutex<Vec<Meeting>>,
    pub pages: Mutex<Vec<AttendancePage>>,
    pub created: Mutex<Vec<NewAttendance>>,
    pub user_fetches: AtomicUsize,
    pub meeting_fetches: AtomicUsize,
    pub attendance_fetches: AtomicUsize,
    pub page_fetches: AtomicUsize,
    pub fail_meetings: AtomicBool,
    pub fail_create: AtomicBool,
}

impl MemoryDirectory {
    pub fn new(users: Vec<User>, meetings: Vec<Meeting>, pages: Vec<AttendancePage>) -> Self {
        Self {
            users: Mutex::new(users),
            meetings: Mutex::new(meetings),
            pages: Mutex::new(pages),
            ..Self::default()
        }
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

fn non_empty<T: Clone>(kind: &'static str, items: &[T]) -> Result<Vec<T>, ApiError> {
    if items.is_empty() {
        Err(ApiError::EmptyCollection(kind))
    } else {
        Ok(items.to_vec())
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.user_fetches.fetch_add(1, Ordering::SeqCst);
        non_empty("users", &self.users.lock().unwrap())
    }

    async fn query_meetings(&self) -> Result<Vec<Meeting>, ApiError> {
        self.meeting_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_meetings.load(Ordering::SeqCst) {
            return Err(ApiError::ServerError("meetings unavailable".to_string()));
        }
        non_empty("meetings", &self.meetings.lock().unwrap())
    }

    async fn query_attendance(&self) -> Result<Vec<AttendancePage>, ApiError> {
        self.attendance_fetches.fetch_add(1, Ordering::SeqCst);
        non_empty("attendance", &self.pages.lock().unwrap())
    }

    async fn fetch_attendance(&self, page_id: &str) -> Result<AttendancePage, ApiError> {
        self.page_fetches.fetch_add(1, Ordering::SeqCst);
        self.pages
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == page_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(page_id.to_string()))
    }

    async fn create_attendance(&self, new: &NewAttendance) -> Result<AttendancePage, ApiError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ApiError::InvalidResponse(
                "Status 400 Bad Request: validation_error".to_string(),
            ));
        }

        let mut created = self.created.lock().unwrap();
        created.push(new.clone());
        let page = AttendancePage {
            id: format!("created-{}", created.len()),
            properties: new.properties.clone(),
        };

        if let Some(meeting_id) = new.meeting_id() {
            let mut meetings = self.meetings.lock().unwrap();
            if let Some(meeting) = meetings.iter_mut().find(|m| m.id == meeting_id) {
                meeting
                    .properties
                    .attendance
                    .relation
                    .push(PageRef { id: page.id.clone() });
            }
        }
        self.pages.lock().unwrap().push(page.clone());
        Ok(page)
    }
}
