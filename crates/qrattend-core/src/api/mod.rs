//! REST API client module for the Notion API.
//!
//! `ApiClient` talks to the users, database query and pages endpoints using
//! an integration token. The `Directory` trait is the seam the check-in flow
//! depends on.

pub mod client;
pub mod directory;
pub mod error;

pub use client::ApiClient;
pub use directory::Directory;
pub use error::ApiError;
