//! Tags client: tag listing and creation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{check_status, ApiError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};

/// A tag, optionally associated with a listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub tag_id: i64,
    pub listing_id: Option<i64>,
    pub name: String,
    pub created_datetime: Option<NaiveDateTime>,
}

#[derive(Serialize)]
struct CreateTagBody<'a> {
    name: &'a str,
}

/// Stateless client for the `/Tags` resource.
#[derive(Debug, Clone)]
pub struct TagsClient {
    config: ApiConfig,
}

impl TagsClient {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    pub fn build_list(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/Tags", self.config.base_url()),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_for_listing(&self, listing_id: i64) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/Tags/{listing_id}", self.config.base_url()),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create(&self, name: &str) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(&CreateTagBody { name })
            .map_err(|e| ApiError::Encode(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/Tags", self.config.base_url()),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(RequestBody::Json(body)),
        })
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<Tag>, ApiError> {
        check_status(&response, 200, "Failed to fetch tags")?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn parse_for_listing(&self, response: HttpResponse) -> Result<Vec<Tag>, ApiError> {
        check_status(&response, 200, "Failed to fetch tags for listing")?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<Tag, ApiError> {
        check_status(&response, 201, "Failed to create tag")?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
