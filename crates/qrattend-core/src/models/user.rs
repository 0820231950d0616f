use serde::{Deserialize, Serialize};

use super::PersonRef;

/// Fallback used in attendance titles when a user has no display name
const UNNAMED_USER: &str = "Unknown";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonDetails {
    #[serde(default)]
    pub email: Option<String>,
}

/// A workspace member returned by the Notion users endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub person: Option<PersonDetails>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED_USER)
    }

    /// First space-separated token of the name, used in attendance titles
    pub fn first_name(&self) -> &str {
        self.display_name()
            .split(' ')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(UNNAMED_USER)
    }

    pub fn email(&self) -> Option<&str> {
        self.person.as_ref().and_then(|p| p.email.as_deref())
    }

    pub fn as_person_ref(&self) -> PersonRef {
        PersonRef::user(self.id.clone())
    }
}
