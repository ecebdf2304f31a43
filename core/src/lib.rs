//! Blocking client for the Instagram v1 REST API.
//!
//! # Overview
//! `Session` exposes one method per API capability (users, media, comments,
//! likes, tags, locations, relationships). Each call builds a URL from an
//! endpoint template, performs the HTTP round trip through a `Transport`,
//! unwraps the `{meta, data, pagination}` envelope and maps `data` onto the
//! records in `types` and `relationship`.
//!
//! # Design
//! - The access token is explicit configuration (`SessionConfig`), never
//!   global state, and is kept out of logs.
//! - `Transport` is the only I/O seam. `UreqTransport` (default `ureq`
//!   feature) talks to the network; `ReplayTransport` replays fixtures.
//! - Records are plain data with no back-reference to the session; actions
//!   on a record go through `Session` with the record's id.
//! - The session is stateless between calls and never retries.

pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod relationship;
pub mod replay;
pub mod session;
pub mod types;
pub mod uri;
#[cfg(feature = "ureq")]
pub mod ureq_transport;

pub use config::{AccessToken, SessionConfig};
pub use envelope::Envelope;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use relationship::{Action, IncomingStatus, OutgoingStatus, Relationship};
pub use replay::ReplayTransport;
pub use session::Session;
pub use types::{Comment, Counted, Image, Location, Media, MediaKind, MediaSearch, Tag, User, UserCounts};
pub use uri::UriBuilder;
#[cfg(feature = "ureq")]
pub use ureq_transport::UreqTransport;
