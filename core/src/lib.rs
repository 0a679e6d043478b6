//! Typed client for the marketplace REST API.
//!
//! # Overview
//! Five independent resource clients (listings, users, messages, images,
//! tags) built over plain-data HTTP types: each operation is a `build_*`
//! method producing an [`http::HttpRequest`] and a `parse_*` method
//! consuming an [`http::HttpResponse`] (host-does-IO pattern). The
//! [`transport::Marketplace`] facade executes them asynchronously with
//! `reqwest`, one fire-and-fail round trip per call.
//!
//! # Design
//! - Resource clients are stateless and hold only a [`config::ApiConfig`];
//!   split build/parse keeps the I/O boundary explicit and the clients
//!   deterministic under test.
//! - Errors are a tagged [`error::ApiError`] enum so callers branch on kind,
//!   never on message strings. Server `{"error": ...}` bodies become the
//!   error message when present.
//! - The two best-effort paths (profile images, per-listing primary images)
//!   degrade to placeholders instead of propagating; everything else
//!   propagates.
//! - Thread grouping and primary-image selection are pure functions
//!   ([`messages::group_threads`], [`images::primary_image`]).
//! - DTOs are defined independently of the mock-server crate; integration
//!   tests catch schema drift.

pub mod config;
pub mod error;
pub mod http;
pub mod images;
pub mod listings;
pub mod messages;
pub mod tags;
pub mod transport;
pub mod types;
pub mod users;

pub use config::{ApiConfig, Session};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Part, RequestBody};
pub use images::{primary_image, ImageUpload, ImagesClient, ListingImage, ProfileImage};
pub use listings::{CreateListing, Listing, ListingsClient, ListingsPage};
pub use messages::{group_threads, Message, MessagesClient, SendMessage, Thread, ThreadKey};
pub use tags::{Tag, TagsClient};
pub use transport::{ImageLookup, Marketplace, Transport};
pub use types::{Confirmation, PaginationMeta};
pub use users::{CreateUser, UpdateUser, User, UsersClient};
