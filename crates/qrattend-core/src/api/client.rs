//! API client for communicating with the Notion REST API.
//!
//! This module provides the `ApiClient` struct for reading the user
//! directory and the meetings/attendance databases, and for creating
//! attendance pages.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};

use super::{ApiError, Directory};
use crate::config::{Config, DEFAULT_API_URL};
use crate::models::{
    AttendancePage, AttendanceProperties, ListResponse, Meeting, NewAttendance, User,
};

// ============================================================================
// Constants
// ============================================================================

/// Notion API version sent with every request
const NOTION_VERSION: &str = "2022-06-28";

/// HTTP request timeout in seconds.
/// A slow response blocks the capture loop, so fail well before a person
/// gives up waiting at the camera.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum page size accepted by Notion list endpoints
const PAGE_SIZE: u32 = 100;

/// Where the last successful response body is written for inspection
pub const DEBUG_DUMP_FILE: &str = "./full-properties.json";

#[derive(Debug, Default, Serialize)]
struct QueryRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DatabaseParent<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    database_id: &'a str,
}

#[derive(Debug, Serialize)]
struct CreatePageRequest<'a> {
    parent: DatabaseParent<'a>,
    properties: &'a AttendanceProperties,
}

/// API client for Notion.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    meetings_db_id: Option<String>,
    attendance_db_id: Option<String>,
    dump_path: Option<PathBuf>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("meetings_db_id", &self.meetings_db_id)
            .field("attendance_db_id", &self.attendance_db_id)
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client against the public Notion endpoint
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            meetings_db_id: None,
            attendance_db_id: None,
            dump_path: None,
        })
    }

    /// Create a client with the token, database ids and endpoint from config.
    /// Responses are dumped to `DEBUG_DUMP_FILE`.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let mut client = Self::new()?.with_base_url(&config.api_url);
        client.token = config.notion_token.clone();
        client.meetings_db_id = config.meetings_db_id.clone();
        client.attendance_db_id = config.attendance_db_id.clone();
        client.set_dump_path(Some(PathBuf::from(DEBUG_DUMP_FILE)));
        Ok(client)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Set the integration token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn set_databases(&mut self, meetings_db_id: String, attendance_db_id: String) {
        self.meetings_db_id = Some(meetings_db_id);
        self.attendance_db_id = Some(attendance_db_id);
    }

    pub fn set_dump_path(&mut self, path: Option<PathBuf>) {
        self.dump_path = path;
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let token = self
            .token
            .as_deref()
            .ok_or(ApiError::MissingSetting("NOTION_TOKEN"))?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        headers.insert("Notion-Version", header::HeaderValue::from_static(NOTION_VERSION));
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }

    fn meetings_db(&self) -> Result<&str, ApiError> {
        self.meetings_db_id
            .as_deref()
            .ok_or(ApiError::MissingSetting("NOTION_MEETINGS_DBID"))
    }

    fn attendance_db(&self) -> Result<&str, ApiError> {
        self.attendance_db_id
            .as_deref()
            .ok_or(ApiError::MissingSetting("NOTION_ATTENDANCE_DBID"))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let url = response.url().to_string();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, url = %url, body = %body, "Notion request failed");
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request, check its status and parse the JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.send_inner(request, false).await
    }

    /// Like `send`, but the raw body of a successful read is also written to
    /// the dump file.
    async fn read<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.send_inner(request, true).await
    }

    async fn send_inner<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        dump: bool,
    ) -> Result<T, ApiError> {
        let response = request.headers(self.auth_headers()?).send().await?;
        let response = Self::check_response(response).await?;
        let url = response.url().to_string();
        let text = response.text().await?;

        if let (true, Some(path)) = (dump, self.dump_path.as_deref()) {
            Self::dump_response(path, &text);
        }

        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    fn dump_response(path: &Path, body: &str) {
        if let Err(e) = std::fs::write(path, body) {
            warn!(path = %path.display(), error = %e, "Failed to write debug dump");
        }
    }

    /// Follow `next_cursor` until the whole collection has been read.
    /// An empty collection is reported as an error.
    async fn fetch_all<T, F>(&self, kind: &'static str, request: F) -> Result<Vec<T>, ApiError>
    where
        T: DeserializeOwned,
        F: Fn(Option<&str>) -> RequestBuilder,
    {
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page: ListResponse<T> = self.read(request(cursor.as_deref())).await?;
            results.extend(page.results);

            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        if results.is_empty() {
            error!(kind, "Notion returned an empty collection");
            return Err(ApiError::EmptyCollection(kind));
        }
        debug!(kind, count = results.len(), "Fetched collection");
        Ok(results)
    }

    /// Query every page of a database (no filter, no sort).
    async fn query_database<T: DeserializeOwned>(
        &self,
        kind: &'static str,
        database_id: &str,
    ) -> Result<Vec<T>, ApiError> {
        let url = self.url(&format!("databases/{}/query", database_id));
        self.fetch_all(kind, |cursor| {
            self.client
                .post(&url)
                .json(&QueryRequest { start_cursor: cursor })
        })
        .await
    }
}

#[async_trait]
impl Directory for ApiClient {
    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let url = self.url("users");
        let page_size = PAGE_SIZE.to_string();
        self.fetch_all("users", |cursor| {
            let request = self
                .client
                .get(&url)
                .query(&[("page_size", page_size.as_str())]);
            match cursor {
                Some(cursor) => request.query(&[("start_cursor", cursor)]),
                None => request,
            }
        })
        .await
    }

    async fn query_meetings(&self) -> Result<Vec<Meeting>, ApiError> {
        let database_id = self.meetings_db()?;
        self.query_database("meetings", database_id).await
    }

    async fn query_attendance(&self) -> Result<Vec<AttendancePage>, ApiError> {
        let database_id = self.attendance_db()?;
        self.query_database("attendance", database_id).await
    }

    async fn fetch_attendance(&self, page_id: &str) -> Result<AttendancePage, ApiError> {
        let url = self.url(&format!("pages/{}", page_id));
        let page: AttendancePage = self.read(self.client.get(&url)).await?;
        debug!(page_id, person = ?page.person().map(|p| &p.id), "Read attendance page");
        Ok(page)
    }

    async fn create_attendance(
        &self,
        attendance: &NewAttendance,
    ) -> Result<AttendancePage, ApiError> {
        let body = CreatePageRequest {
            parent: DatabaseParent {
                kind: "database_id",
                database_id: self.attendance_db()?,
            },
            properties: &attendance.properties,
        };
        let url = self.url("pages");
        self.send(self.client.post(&url).json(&body)).await
    }
}
