//! Users client: profile fetch/update and favorite-listings management.
//!
//! `build_update_favorites` replaces the whole favorites set on the server.
//! Callers computing "add one" or "remove one" must send the full desired
//! set; there is no delta endpoint.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{check_status, ApiError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
use crate::types::Confirmation;

/// A user profile as returned by the backend.
///
/// `password` is whatever opaque credential material the backend stores;
/// it is deliberately excluded from the `Debug` output.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub user_location: Option<String>,
    #[serde(default)]
    pub favorite_listings: Vec<i64>,
    pub created_datetime: Option<NaiveDateTime>,
    pub updated_datetime: Option<NaiveDateTime>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("full_name", &self.full_name)
            .field("user_location", &self.user_location)
            .field("favorite_listings", &self.favorite_listings)
            .finish_non_exhaustive()
    }
}

/// Request payload for registering a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_location: Option<String>,
}

/// Partial profile update. Only the fields present in the JSON are applied;
/// omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_location: Option<String>,
}

/// Body of the favorites replacement call.
#[derive(Serialize)]
struct FavoritesBody<'a> {
    favorite_listings: &'a [i64],
}

/// Stateless client for the `/Users` resource.
#[derive(Debug, Clone)]
pub struct UsersClient {
    config: ApiConfig,
}

impl UsersClient {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    pub fn build_create(&self, input: &CreateUser) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Encode(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/Users", self.config.base_url()),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(RequestBody::Json(body)),
        })
    }

    pub fn build_get(&self, username: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/Users/{username}", self.config.base_url()),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_update(&self, username: &str, input: &UpdateUser) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Encode(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: format!("{}/Users/{username}", self.config.base_url()),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(RequestBody::Json(body)),
        })
    }

    /// Full replacement of the favorites set, not a merge.
    pub fn build_update_favorites(
        &self,
        username: &str,
        listing_ids: &[i64],
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(&FavoritesBody {
            favorite_listings: listing_ids,
        })
        .map_err(|e| ApiError::Encode(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: format!("{}/Users/{username}/favorite_listings", self.config.base_url()),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(RequestBody::Json(body)),
        })
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<User, ApiError> {
        check_status(&response, 201, "Failed to create user")?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn parse_get(&self, response: HttpResponse) -> Result<User, ApiError> {
        check_status(&response, 200, "Failed to fetch user")?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn parse_update(&self, response: HttpResponse) -> Result<Confirmation, ApiError> {
        check_status(&response, 200, "Failed to update user")?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn parse_update_favorites(&self, response: HttpResponse) -> Result<Confirmation, ApiError> {
        check_status(&response, 200, "Failed to update favorites")?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
