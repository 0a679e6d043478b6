//! Listings client: CRUD over marketplace listings.
//!
//! Stateless build/parse pairs over the plain-data HTTP types; the caller
//! (normally [`crate::transport::Marketplace`]) executes the round trip in
//! between. One request per operation, no retries, no client-side
//! validation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{check_status, ApiError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
use crate::types::{Confirmation, PaginationMeta};

/// A marketplace listing as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
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
    /// Tag names embedded on the listing record, when the backend inlines
    /// them. The tags client is authoritative.
    pub tags: Option<Vec<String>>,
    /// Image URLs embedded on the listing record, when present.
    pub images: Option<Vec<String>>,
}

/// One page of listings plus pagination metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingsPage {
    pub listings: Vec<Listing>,
    pub pagination: PaginationMeta,
}

/// Request payload for creating a listing. `id` and timestamps are
/// server-assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateListing {
    pub seller: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Stateless client for the `/Listings` resource.
#[derive(Debug, Clone)]
pub struct ListingsClient {
    config: ApiConfig,
}

impl ListingsClient {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    pub fn build_list(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/Listings", self.config.base_url()),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_get(&self, id: i64) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/Listings/{id}", self.config.base_url()),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create(&self, input: &CreateListing) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Encode(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/Listings", self.config.base_url()),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(RequestBody::Json(body)),
        })
    }

    pub fn build_delete(&self, id: i64) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("{}/Listings/{id}", self.config.base_url()),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<ListingsPage, ApiError> {
        check_status(&response, 200, "Failed to fetch listings")?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn parse_get(&self, response: HttpResponse) -> Result<Listing, ApiError> {
        check_status(&response, 200, "Failed to fetch listing")?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<Listing, ApiError> {
        check_status(&response, 201, "Failed to create listing")?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<Confirmation, ApiError> {
        check_status(&response, 200, "Failed to delete listing")?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ListingsClient {
        ListingsClient::new(ApiConfig::new("http://localhost:3000"))
    }

    #[test]
    fn build_list_produces_correct_request() {
        let req = client().build_list();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/Listings");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_get_produces_correct_request() {
        let req = client().build_get(42);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/Listings/42");
        assert!(req.body.is_none());
    }

    #[test]
    fn build_create_produces_correct_request() {
        let input = CreateListing {
            seller: "ikeafan".to_string(),
            title: "Desk lamp".to_string(),
            description: "Barely used".to_string(),
            price: 12.5,
            item_condition: Some("good".to_string()),
            location: None,
            tags: None,
        };
        let req = client().build_create(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/Listings");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        let body: serde_json::Value = serde_json::from_str(req.json_body().unwrap()).unwrap();
        assert_eq!(body["title"], "Desk lamp");
        assert_eq!(body["price"], 12.5);
        assert_eq!(body["item_condition"], "good");
        assert!(body.get("location").is_none());
    }

    #[test]
    fn build_create_passes_negative_price_through() {
        // The client performs no validation; the backend decides.
        let input = CreateListing {
            seller: "ikeafan".to_string(),
            title: "Haunted mirror".to_string(),
            description: "Pays you to take it".to_string(),
            price: -5.0,
            item_condition: None,
            location: None,
            tags: None,
        };
        let req = client().build_create(&input).unwrap();
        let body: serde_json::Value = serde_json::from_str(req.json_body().unwrap()).unwrap();
        assert_eq!(body["price"], -5.0);
    }

    #[test]
    fn build_delete_produces_correct_request() {
        let req = client().build_delete(7);
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "http://localhost:3000/Listings/7");
        assert!(req.body.is_none());
    }

    #[test]
    fn parse_list_success() {
        let body = r#"{
            "listings": [{
                "id": 1, "seller": "ikeafan", "title": "Chair",
                "description": "Wobbly", "price": 3.0
            }],
            "pagination": {"page": 1, "page_size": 100, "total_count": 1, "total_pages": 1}
        }"#;
        let page = client().parse_list(HttpResponse::new(200, body)).unwrap();
        assert_eq!(page.listings.len(), 1);
        assert_eq!(page.listings[0].title, "Chair");
        assert_eq!(page.pagination.total_count, 1);
    }

    #[test]
    fn parse_get_not_found() {
        let response = HttpResponse::new(404, r#"{"error":"Listing not found"}"#);
        let err = client().parse_get(response).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_create_carries_server_message() {
        let response = HttpResponse::new(400, r#"{"error":"seller is required"}"#);
        let err = client().parse_create(response).unwrap_err();
        match err {
            ApiError::Http { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "seller is required");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_delete_returns_confirmation() {
        let response = HttpResponse::new(200, r#"{"message":"Listing 7 deleted"}"#);
        let confirmation = client().parse_delete(response).unwrap();
        assert_eq!(confirmation.message, "Listing 7 deleted");
    }

    #[test]
    fn parse_list_bad_json() {
        let err = client().parse_list(HttpResponse::new(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
