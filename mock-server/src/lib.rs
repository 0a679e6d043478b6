//! In-memory mock of the marketplace REST API.
//!
//! Implements the same routes, envelopes, and `{"error": "..."}` failure
//! bodies as the hosted backend, backed by a `RwLock`ed store. Used by the
//! core crate's integration tests and runnable standalone for manual poking.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub seller: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub item_condition: Option<String>,
    pub location: Option<String>,
    pub is_sold: Option<bool>,
    pub active_status: Option<String>,
    pub expiration_datetime: Option<NaiveDateTime>,
    pub created_datetime: Option<NaiveDateTime>,
    pub updated_datetime: Option<NaiveDateTime>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub user_location: Option<String>,
    pub favorite_listings: Vec<i64>,
    pub created_datetime: Option<NaiveDateTime>,
    pub updated_datetime: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub message_body: String,
    pub sent_datetime: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListingImage {
    pub id: i64,
    pub filename: String,
    pub url: String,
    pub is_primary: bool,
    pub created_datetime: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tag {
    pub tag_id: i64,
    pub listing_id: Option<i64>,
    pub name: String,
    pub created_datetime: Option<NaiveDateTime>,
}

/// Everything the mock backend remembers. Fields are public so tests can
/// seed state directly.
#[derive(Debug, Default)]
pub struct Store {
    pub listings: HashMap<i64, Listing>,
    pub users: HashMap<String, User>,
    pub messages: Vec<Message>,
    pub listing_images: HashMap<i64, Vec<ListingImage>>,
    pub profile_images: HashMap<String, String>,
    pub tags: Vec<Tag>,
    next_id: i64,
}

impl Store {
    pub fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub type Db = Arc<RwLock<Store>>;

type ErrorResponse = (StatusCode, Json<Value>);

fn err(status: StatusCode, message: impl Into<String>) -> ErrorResponse {
    (status, Json(json!({ "error": message.into() })))
}

fn bad_request(message: impl Into<String>) -> ErrorResponse {
    err(StatusCode::BAD_REQUEST, message)
}

fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

fn require_str(input: &Value, field: &str) -> Result<String, ErrorResponse> {
    input
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| bad_request(format!("{field} is required")))
}

/// Routes served under `/v1`, matching the hosted backend's prefix.
pub fn router(db: Db) -> Router {
    let api = Router::new()
        .route("/Listings", get(list_listings).post(create_listing))
        .route("/Listings/{id}", get(get_listing).delete(delete_listing))
        .route("/Listings/{id}/Images", get(listing_images))
        .route("/Users", post(create_user))
        .route("/Users/{username}", get(get_user).put(update_user))
        .route("/Users/{username}/favorite_listings", put(update_favorites))
        .route("/Users/{username}/profile-image", get(profile_image))
        .route("/Messages", get(get_messages).post(send_message))
        .route("/Images", post(upload_image))
        .route("/Tags", get(list_tags).post(create_tag))
        .route("/Tags/{listing_id}", get(tags_for_listing))
        .with_state(db);
    Router::new().nest("/v1", api)
}

pub fn app() -> Router {
    router(Db::default())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Serve against a caller-owned store, so tests can seed and inspect it.
pub async fn run_with_db(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, router(db)).await
}

// --- pagination ---

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    100
}

#[derive(Deserialize)]
struct PageParams {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_page_size")]
    page_size: u32,
}

fn paginate<T: Clone>(items: &[T], page: u32, page_size: u32) -> (Vec<T>, Value) {
    let total_count = items.len() as u64;
    let size = page_size.max(1) as usize;
    let total_pages = items.len().div_ceil(size) as u32;
    let start = (page.max(1) as usize - 1) * size;
    let slice = items
        .iter()
        .skip(start)
        .take(size)
        .cloned()
        .collect::<Vec<_>>();
    let meta = json!({
        "page": page,
        "page_size": page_size,
        "total_count": total_count,
        "total_pages": total_pages,
    });
    (slice, meta)
}

// --- listings ---

async fn list_listings(
    State(db): State<Db>,
    Query(params): Query<PageParams>,
) -> Json<Value> {
    let store = db.read().await;
    let mut listings: Vec<Listing> = store.listings.values().cloned().collect();
    listings.sort_by_key(|l| l.id);
    let (page, pagination) = paginate(&listings, params.page, params.page_size);
    Json(json!({ "listings": page, "pagination": pagination }))
}

async fn get_listing(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Listing>, ErrorResponse> {
    let store = db.read().await;
    store
        .listings
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| err(StatusCode::NOT_FOUND, "Listing not found"))
}

async fn create_listing(
    State(db): State<Db>,
    Json(input): Json<Value>,
) -> Result<(StatusCode, Json<Listing>), ErrorResponse> {
    let seller = require_str(&input, "seller")?;
    let title = require_str(&input, "title")?;
    let description = require_str(&input, "description")?;
    let price = input
        .get("price")
        .and_then(Value::as_f64)
        .ok_or_else(|| bad_request("price is required"))?;

    let mut store = db.write().await;
    if !store.users.contains_key(&seller) {
        return Err(bad_request(format!("seller {seller} does not exist")));
    }
    let listing = Listing {
        id: store.next_id(),
        seller,
        title,
        description,
        price,
        item_condition: input
            .get("item_condition")
            .and_then(Value::as_str)
            .map(str::to_string),
        location: input
            .get("location")
            .and_then(Value::as_str)
            .map(str::to_string),
        is_sold: Some(false),
        active_status: Some("active".to_string()),
        expiration_datetime: None,
        created_datetime: Some(now()),
        updated_datetime: Some(now()),
        tags: input.get("tags").and_then(|v| {
            v.as_array().map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
        }),
        images: None,
    };
    store.listings.insert(listing.id, listing.clone());
    Ok((StatusCode::CREATED, Json(listing)))
}

async fn delete_listing(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ErrorResponse> {
    let mut store = db.write().await;
    if store.listings.remove(&id).is_none() {
        return Err(err(StatusCode::NOT_FOUND, "Listing not found"));
    }
    store.listing_images.remove(&id);
    Ok(Json(json!({ "message": format!("Listing {id} deleted") })))
}

// --- users ---

async fn create_user(
    State(db): State<Db>,
    Json(input): Json<Value>,
) -> Result<(StatusCode, Json<User>), ErrorResponse> {
    let username = require_str(&input, "username")?;
    let email = require_str(&input, "email")?;
    let password = require_str(&input, "password")?;

    let mut store = db.write().await;
    if store.users.contains_key(&username) {
        return Err(bad_request(format!("username {username} already exists")));
    }
    let user = User {
        username: username.clone(),
        email,
        password,
        full_name: input
            .get("full_name")
            .and_then(Value::as_str)
            .map(str::to_string),
        user_location: input
            .get("user_location")
            .and_then(Value::as_str)
            .map(str::to_string),
        favorite_listings: Vec::new(),
        created_datetime: Some(now()),
        updated_datetime: Some(now()),
    };
    store.users.insert(username, user.clone());
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(db): State<Db>,
    Path(username): Path<String>,
) -> Result<Json<User>, ErrorResponse> {
    let store = db.read().await;
    store
        .users
        .get(&username)
        .cloned()
        .map(Json)
        .ok_or_else(|| err(StatusCode::NOT_FOUND, "User not found"))
}

async fn update_user(
    State(db): State<Db>,
    Path(username): Path<String>,
    Json(input): Json<Value>,
) -> Result<Json<Value>, ErrorResponse> {
    let mut store = db.write().await;
    let user = store
        .users
        .get_mut(&username)
        .ok_or_else(|| err(StatusCode::NOT_FOUND, "User not found"))?;
    if let Some(email) = input.get("email").and_then(Value::as_str) {
        user.email = email.to_string();
    }
    if let Some(password) = input.get("password").and_then(Value::as_str) {
        user.password = password.to_string();
    }
    if let Some(full_name) = input.get("full_name").and_then(Value::as_str) {
        user.full_name = Some(full_name.to_string());
    }
    if let Some(location) = input.get("user_location").and_then(Value::as_str) {
        user.user_location = Some(location.to_string());
    }
    user.updated_datetime = Some(now());
    Ok(Json(json!({ "message": format!("User {username} updated") })))
}

/// Full replacement of the favorites set. Duplicates collapse, order of the
/// submitted list is preserved.
async fn update_favorites(
    State(db): State<Db>,
    Path(username): Path<String>,
    Json(input): Json<Value>,
) -> Result<Json<Value>, ErrorResponse> {
    let ids = input
        .get("favorite_listings")
        .and_then(Value::as_array)
        .ok_or_else(|| bad_request("favorite_listings is required"))?
        .iter()
        .map(|v| v.as_i64().ok_or_else(|| bad_request("favorite_listings must be listing ids")))
        .collect::<Result<Vec<i64>, ErrorResponse>>()?;

    let mut deduped = Vec::new();
    for id in ids {
        if !deduped.contains(&id) {
            deduped.push(id);
        }
    }

    let mut store = db.write().await;
    let user = store
        .users
        .get_mut(&username)
        .ok_or_else(|| err(StatusCode::NOT_FOUND, "User not found"))?;
    user.favorite_listings = deduped;
    user.updated_datetime = Some(now());
    Ok(Json(json!({ "message": "Favorites updated" })))
}

async fn profile_image(
    State(db): State<Db>,
    Path(username): Path<String>,
) -> Result<Json<Value>, ErrorResponse> {
    let store = db.read().await;
    if !store.users.contains_key(&username) {
        return Err(err(StatusCode::NOT_FOUND, "User not found"));
    }
    Ok(Json(json!({ "url": store.profile_images.get(&username) })))
}

// --- messages ---

#[derive(Deserialize)]
struct MessageQuery {
    sender: Option<String>,
    receiver: Option<String>,
    user: Option<String>,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_page_size")]
    page_size: u32,
}

async fn get_messages(
    State(db): State<Db>,
    Query(query): Query<MessageQuery>,
) -> Result<Json<Value>, ErrorResponse> {
    let store = db.read().await;
    let messages: Vec<Message> = match (&query.sender, &query.receiver, &query.user) {
        (Some(sender), Some(receiver), _) => {
            let mut selected: Vec<Message> = store
                .messages
                .iter()
                .filter(|m| {
                    (m.sender == *sender && m.receiver == *receiver)
                        || (m.sender == *receiver && m.receiver == *sender)
                })
                .cloned()
                .collect();
            // Thread view: chronological.
            selected.sort_by(|a, b| a.sent_datetime.cmp(&b.sent_datetime));
            selected
        }
        (_, _, Some(user)) => {
            let mut selected: Vec<Message> = store
                .messages
                .iter()
                .filter(|m| m.sender == *user || m.receiver == *user)
                .cloned()
                .collect();
            // Inbox view: newest first.
            selected.sort_by(|a, b| b.sent_datetime.cmp(&a.sent_datetime));
            selected
        }
        _ => {
            return Err(bad_request("Provide either sender and receiver, or user"));
        }
    };
    let (page, pagination) = paginate(&messages, query.page, query.page_size);
    Ok(Json(json!({ "messages": page, "pagination": pagination })))
}

async fn send_message(
    State(db): State<Db>,
    Json(input): Json<Value>,
) -> Result<(StatusCode, Json<Message>), ErrorResponse> {
    let sender = input.get("sender").and_then(Value::as_str);
    let receiver = input.get("receiver").and_then(Value::as_str);
    let message_body = input.get("message_body").and_then(Value::as_str);
    let (Some(sender), Some(receiver), Some(message_body)) = (sender, receiver, message_body)
    else {
        return Err(bad_request("sender, receiver, and message_body are required"));
    };

    let mut store = db.write().await;
    let message = Message {
        id: store.next_id(),
        sender: sender.to_string(),
        receiver: receiver.to_string(),
        message_body: message_body.to_string(),
        sent_datetime: now(),
    };
    store.messages.push(message.clone());
    Ok((StatusCode::CREATED, Json(message)))
}

// --- images ---

async fn listing_images(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ErrorResponse> {
    let store = db.read().await;
    if !store.listings.contains_key(&id) {
        return Err(err(StatusCode::NOT_FOUND, "Listing not found"));
    }
    let images = store.listing_images.get(&id).cloned().unwrap_or_default();
    Ok(Json(json!({ "images": images })))
}

async fn upload_image(
    State(db): State<Db>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ListingImage>), ErrorResponse> {
    let mut filename: Option<String> = None;
    let mut bytes: Option<Vec<u8>> = None;
    let mut listing_id: Option<i64> = None;
    let mut upload_username: Option<String> = None;
    let mut is_primary = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                filename = field.file_name().map(str::to_string);
                bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| bad_request(e.to_string()))?
                        .to_vec(),
                );
            }
            "listing_id" => {
                let text = field.text().await.map_err(|e| bad_request(e.to_string()))?;
                listing_id = text.parse().ok();
            }
            "upload_username" => {
                upload_username =
                    Some(field.text().await.map_err(|e| bad_request(e.to_string()))?);
            }
            "is_primary" => {
                is_primary =
                    field.text().await.map_err(|e| bad_request(e.to_string()))? == "true";
            }
            _ => {}
        }
    }

    // Content itself is not persisted; only the record is.
    if bytes.map_or(true, |b| b.is_empty()) {
        return Err(bad_request("image file is required"));
    }
    let filename = filename.ok_or_else(|| bad_request("image filename is required"))?;
    let listing_id = listing_id.ok_or_else(|| bad_request("listing_id is required"))?;
    upload_username.ok_or_else(|| bad_request("upload_username is required"))?;

    let mut store = db.write().await;
    if !store.listings.contains_key(&listing_id) {
        return Err(err(StatusCode::NOT_FOUND, "Listing not found"));
    }
    let id = store.next_id();
    let image = ListingImage {
        id,
        url: format!("/static/uploads/{id}_{filename}"),
        filename,
        is_primary,
        created_datetime: Some(now()),
    };
    store
        .listing_images
        .entry(listing_id)
        .or_default()
        .push(image.clone());
    Ok((StatusCode::CREATED, Json(image)))
}

// --- tags ---

async fn list_tags(State(db): State<Db>) -> Json<Vec<Tag>> {
    let store = db.read().await;
    Json(store.tags.clone())
}

async fn tags_for_listing(
    State(db): State<Db>,
    Path(listing_id): Path<i64>,
) -> Result<Json<Vec<Tag>>, ErrorResponse> {
    let store = db.read().await;
    if !store.listings.contains_key(&listing_id) {
        return Err(err(StatusCode::NOT_FOUND, "Listing not found"));
    }
    let tags = store
        .tags
        .iter()
        .filter(|t| t.listing_id == Some(listing_id))
        .cloned()
        .collect();
    Ok(Json(tags))
}

async fn create_tag(
    State(db): State<Db>,
    Json(input): Json<Value>,
) -> Result<(StatusCode, Json<Tag>), ErrorResponse> {
    let name = require_str(&input, "name")?;
    let mut store = db.write().await;
    let tag = Tag {
        tag_id: store.next_id(),
        listing_id: input.get("listing_id").and_then(Value::as_i64),
        name,
        created_datetime: Some(now()),
    };
    store.tags.push(tag.clone());
    Ok((StatusCode::CREATED, Json(tag)))
}
