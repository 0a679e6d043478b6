//! Async request execution and the high-level facade.
//!
//! # Design
//! `Transport` is the one place that touches the network: it turns a
//! plain-data `HttpRequest` into a `reqwest` call and hands back a
//! plain-data `HttpResponse`. `Marketplace` composes the five resource
//! clients with a shared transport and exposes one async method per API
//! operation — a single round trip each, no retry, no timeout, no
//! cancellation, no coalescing of identical in-flight requests.
//!
//! Batch lookups (`primary_images`, `profile_images`) issue their requests
//! concurrently and await them jointly. Each item degrades independently:
//! a failed image fetch becomes a placeholder for that item only, logged
//! and never propagated. Everything else fails the call.

use futures::future::join_all;
use tracing::{debug, warn};

use crate::config::{ApiConfig, Session};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Part, RequestBody};
use crate::images::{primary_image, ImageUpload, ImagesClient, ListingImage, ProfileImage};
use crate::listings::{CreateListing, Listing, ListingsClient, ListingsPage};
use crate::messages::{group_threads, Message, MessagesClient, SendMessage, Thread};
use crate::tags::{Tag, TagsClient};
use crate::types::Confirmation;
use crate::users::{CreateUser, UpdateUser, User, UsersClient};

/// Executes plain-data requests over HTTP.
#[derive(Debug, Clone, Default)]
pub struct Transport {
    client: reqwest::Client,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    /// One HTTP round trip. Transport-level failures (connect, DNS, body
    /// read) map to `ApiError::Network`; status interpretation is left to
    /// the resource clients' `parse_*` methods.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = ?request.method, path = %request.path, "executing request");
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.path),
            HttpMethod::Post => self.client.post(&request.path),
            HttpMethod::Put => self.client.put(&request.path),
            HttpMethod::Delete => self.client.delete(&request.path),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        builder = match request.body {
            Some(RequestBody::Json(json)) => builder.body(json),
            Some(RequestBody::Multipart(parts)) => builder.multipart(to_form(parts)?),
            None => builder,
        };
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Convert plain-data parts into a `reqwest` multipart form.
fn to_form(parts: Vec<Part>) -> Result<reqwest::multipart::Form, ApiError> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        form = match part {
            Part::Text { name, value } => form.text(name, value),
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                let file = reqwest::multipart::Part::bytes(bytes)
                    .file_name(filename)
                    .mime_str(&content_type)
                    .map_err(|e| ApiError::Encode(e.to_string()))?;
                form.part(name, file)
            }
        };
    }
    Ok(form)
}

/// Per-item outcome of a best-effort image lookup.
///
/// `Placeholder` covers both "the listing has no images" and "the fetch
/// failed"; callers render the same fallback either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLookup {
    Found(ListingImage),
    Placeholder,
}

impl ImageLookup {
    pub fn url(&self) -> Option<&str> {
        match self {
            ImageLookup::Found(image) => Some(&image.url),
            ImageLookup::Placeholder => None,
        }
    }
}

/// High-level async client over the whole marketplace API.
#[derive(Debug, Clone)]
pub struct Marketplace {
    transport: Transport,
    listings: ListingsClient,
    users: UsersClient,
    messages: MessagesClient,
    images: ImagesClient,
    tags: TagsClient,
}

impl Marketplace {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            transport: Transport::new(),
            listings: ListingsClient::new(config.clone()),
            users: UsersClient::new(config.clone()),
            messages: MessagesClient::new(config.clone()),
            images: ImagesClient::new(config.clone()),
            tags: TagsClient::new(config),
        }
    }

    /// Client against `MARKET_API_URL`, or the hosted backend by default.
    pub fn from_env() -> Self {
        Self::new(ApiConfig::from_env())
    }

    // Listings

    pub async fn listings(&self) -> Result<ListingsPage, ApiError> {
        let response = self.transport.execute(self.listings.build_list()).await?;
        self.listings.parse_list(response)
    }

    pub async fn listing(&self, id: i64) -> Result<Listing, ApiError> {
        let response = self.transport.execute(self.listings.build_get(id)).await?;
        self.listings.parse_get(response)
    }

    pub async fn create_listing(&self, input: &CreateListing) -> Result<Listing, ApiError> {
        let request = self.listings.build_create(input)?;
        let response = self.transport.execute(request).await?;
        self.listings.parse_create(response)
    }

    pub async fn delete_listing(&self, id: i64) -> Result<Confirmation, ApiError> {
        let response = self.transport.execute(self.listings.build_delete(id)).await?;
        self.listings.parse_delete(response)
    }

    // Users

    pub async fn create_user(&self, input: &CreateUser) -> Result<User, ApiError> {
        let request = self.users.build_create(input)?;
        let response = self.transport.execute(request).await?;
        self.users.parse_create(response)
    }

    pub async fn user(&self, username: &str) -> Result<User, ApiError> {
        let response = self.transport.execute(self.users.build_get(username)).await?;
        self.users.parse_get(response)
    }

    pub async fn update_user(
        &self,
        username: &str,
        input: &UpdateUser,
    ) -> Result<Confirmation, ApiError> {
        let request = self.users.build_update(username, input)?;
        let response = self.transport.execute(request).await?;
        self.users.parse_update(response)
    }

    /// Replaces the whole favorites set; see [`UsersClient::build_update_favorites`].
    pub async fn update_favorite_listings(
        &self,
        username: &str,
        listing_ids: &[i64],
    ) -> Result<Confirmation, ApiError> {
        let request = self.users.build_update_favorites(username, listing_ids)?;
        let response = self.transport.execute(request).await?;
        self.users.parse_update_favorites(response)
    }

    // Messages

    pub async fn messages_between(
        &self,
        sender: &str,
        receiver: &str,
    ) -> Result<Vec<Message>, ApiError> {
        let request = self.messages.build_between(sender, receiver);
        let response = self.transport.execute(request).await?;
        self.messages.parse_between(response)
    }

    pub async fn inbox(&self, session: &Session) -> Result<Vec<Message>, ApiError> {
        let request = self.messages.build_inbox(&session.username);
        let response = self.transport.execute(request).await?;
        self.messages.parse_inbox(response)
    }

    /// Inbox grouped into threads, newest-first.
    pub async fn inbox_threads(&self, session: &Session) -> Result<Vec<Thread>, ApiError> {
        let messages = self.inbox(session).await?;
        Ok(group_threads(&messages))
    }

    pub async fn send_message(&self, input: &SendMessage) -> Result<Message, ApiError> {
        let request = self.messages.build_send(input)?;
        let response = self.transport.execute(request).await?;
        self.messages.parse_send(response)
    }

    // Images

    pub async fn listing_images(&self, listing_id: i64) -> Result<Vec<ListingImage>, ApiError> {
        let request = self.images.build_listing_images(listing_id);
        let response = self.transport.execute(request).await?;
        self.images.parse_listing_images(response)
    }

    pub async fn upload_image(
        &self,
        upload: ImageUpload,
        listing_id: i64,
        session: &Session,
        is_primary: bool,
    ) -> Result<ListingImage, ApiError> {
        let request = self
            .images
            .build_upload(upload, listing_id, &session.username, is_primary);
        let response = self.transport.execute(request).await?;
        self.images.parse_upload(response)
    }

    /// Strict profile-image fetch; most callers want
    /// [`Self::profile_image_or_placeholder`] instead.
    pub async fn profile_image(&self, username: &str) -> Result<ProfileImage, ApiError> {
        let request = self.images.build_profile_image(username);
        let response = self.transport.execute(request).await?;
        self.images.parse_profile_image(response)
    }

    /// Best-effort profile-image fetch. Any failure, transport included,
    /// degrades to `ProfileImage { url: None }`; profile photos never block
    /// a screen.
    pub async fn profile_image_or_placeholder(&self, username: &str) -> ProfileImage {
        match self.profile_image(username).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(username, error = %err, "profile image fetch failed, using placeholder");
                ProfileImage { url: None }
            }
        }
    }

    /// Representative image for each listing id, fetched concurrently and
    /// awaited jointly. Each item degrades to `Placeholder` on its own
    /// failure; the batch itself never fails. Results align with the input.
    pub async fn primary_images(&self, listing_ids: &[i64]) -> Vec<ImageLookup> {
        let lookups = listing_ids.iter().map(|&id| async move {
            match self.listing_images(id).await {
                Ok(images) => match primary_image(&images) {
                    Some(image) => ImageLookup::Found(image.clone()),
                    None => ImageLookup::Placeholder,
                },
                Err(err) => {
                    warn!(listing_id = id, error = %err, "listing image fetch failed, using placeholder");
                    ImageLookup::Placeholder
                }
            }
        });
        join_all(lookups).await
    }

    /// Profile image per username, concurrently, with per-item degrade.
    /// Results align with the input order.
    pub async fn profile_images(&self, usernames: &[String]) -> Vec<ProfileImage> {
        let lookups = usernames
            .iter()
            .map(|username| self.profile_image_or_placeholder(username));
        join_all(lookups).await
    }

    // Tags

    pub async fn tags(&self) -> Result<Vec<Tag>, ApiError> {
        let response = self.transport.execute(self.tags.build_list()).await?;
        self.tags.parse_list(response)
    }

    pub async fn tags_for_listing(&self, listing_id: i64) -> Result<Vec<Tag>, ApiError> {
        let request = self.tags.build_for_listing(listing_id);
        let response = self.transport.execute(request).await?;
        self.tags.parse_for_listing(response)
    }

    pub async fn create_tag(&self, name: &str) -> Result<Tag, ApiError> {
        let request = self.tags.build_create(name)?;
        let response = self.transport.execute(request).await?;
        self.tags.parse_create(response)
    }
}
