//! Notion page property shapes shared by meetings and attendance pages.
//!
//! Only the fields this application reads or writes are modelled. Every
//! struct deserializes leniently so one malformed page does not fail the
//! whole collection.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain_text: Option<String>,
}

impl RichText {
    pub fn text(&self) -> &str {
        self.plain_text
            .as_deref()
            .or_else(|| self.text.as_ref().map(|t| t.content.as_str()))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleProperty {
    #[serde(default)]
    pub title: Vec<RichText>,
}

impl TitleProperty {
    pub fn from_text(content: impl Into<String>) -> Self {
        Self {
            title: vec![RichText {
                text: Some(TextContent {
                    content: content.into(),
                }),
                plain_text: None,
            }],
        }
    }

    /// Concatenated text of all title fragments
    pub fn plain_text(&self) -> String {
        self.title.iter().map(RichText::text).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateValue {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateProperty {
    #[serde(default)]
    pub date: Option<DateValue>,
}

impl DateProperty {
    pub fn start(&self) -> Option<&str> {
        self.date.as_ref().and_then(|d| d.start.as_deref())
    }
}

/// Reference to another page through a relation property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationProperty {
    #[serde(default)]
    pub relation: Vec<PageRef>,
}

impl RelationProperty {
    pub fn to_page(id: impl Into<String>) -> Self {
        Self {
            relation: vec![PageRef { id: id.into() }],
        }
    }
}

/// A user as it appears inside a `people` property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PersonRef {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            object: Some("user".to_string()),
            id: id.into(),
            name: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeopleProperty {
    #[serde(default)]
    pub people: Vec<PersonRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_prefers_plain_text() {
        let json = r#"{"id":"title","type":"title","title":[
            {"type":"text","text":{"content":"Weekly "},"plain_text":"Weekly "},
            {"type":"text","text":{"content":"Sync"}}
        ]}"#;
        let title: TitleProperty = serde_json::from_str(json).unwrap();
        assert_eq!(title.plain_text(), "Weekly Sync");
    }

    #[test]
    fn test_null_date_parses_as_absent() {
        let date: DateProperty = serde_json::from_str(r#"{"type":"date","date":null}"#).unwrap();
        assert_eq!(date.start(), None);

        let date: DateProperty =
            serde_json::from_str(r#"{"date":{"start":"2026-10-16","end":null}}"#).unwrap();
        assert_eq!(date.start(), Some("2026-10-16"));
    }

    #[test]
    fn test_person_ref_serializes_as_user_object() {
        let json = serde_json::to_value(PersonRef::user("u-1")).unwrap();
        assert_eq!(json, serde_json::json!({"object": "user", "id": "u-1"}));
    }
}
