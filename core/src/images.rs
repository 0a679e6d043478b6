//! Images client: listing photos and user profile images.
//!
//! Upload is the one multipart endpoint in the API. Profile images are
//! best-effort reads: the transport layer degrades any failure to
//! `ProfileImage { url: None }` instead of propagating it (see
//! [`crate::transport::Marketplace::profile_image_or_placeholder`]).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{check_status, ApiError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Part, RequestBody};

/// A photo attached to a listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingImage {
    pub id: i64,
    pub filename: String,
    pub url: String,
    pub is_primary: bool,
    pub created_datetime: Option<NaiveDateTime>,
}

/// `{"images": [...]}` envelope on the listing-images endpoint.
#[derive(Debug, Clone, Deserialize)]
struct ImagesBody {
    images: Vec<ListingImage>,
}

/// Result of a profile-image lookup. `url: None` means the user has no
/// photo, which is a normal outcome rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileImage {
    pub url: Option<String>,
}

/// File content handed to `build_upload`.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Pick the representative image for a listing: the one flagged
/// `is_primary`, else the first returned, else none (caller substitutes a
/// placeholder).
pub fn primary_image(images: &[ListingImage]) -> Option<&ListingImage> {
    images.iter().find(|i| i.is_primary).or_else(|| images.first())
}

/// Stateless client for listing and profile images.
#[derive(Debug, Clone)]
pub struct ImagesClient {
    config: ApiConfig,
}

impl ImagesClient {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    pub fn build_listing_images(&self, listing_id: i64) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/Listings/{listing_id}/Images", self.config.base_url()),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Multipart upload of one image. Field names are the backend's wire
    /// contract: `image`, `listing_id`, `upload_username`, `is_primary`.
    pub fn build_upload(
        &self,
        upload: ImageUpload,
        listing_id: i64,
        upload_username: &str,
        is_primary: bool,
    ) -> HttpRequest {
        let parts = vec![
            Part::File {
                name: "image".to_string(),
                filename: upload.filename,
                content_type: upload.content_type,
                bytes: upload.bytes,
            },
            Part::Text {
                name: "listing_id".to_string(),
                value: listing_id.to_string(),
            },
            Part::Text {
                name: "upload_username".to_string(),
                value: upload_username.to_string(),
            },
            Part::Text {
                name: "is_primary".to_string(),
                value: is_primary.to_string(),
            },
        ];
        HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/Images", self.config.base_url()),
            headers: Vec::new(),
            body: Some(RequestBody::Multipart(parts)),
        }
    }

    pub fn build_profile_image(&self, username: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/Users/{username}/profile-image", self.config.base_url()),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_listing_images(&self, response: HttpResponse) -> Result<Vec<ListingImage>, ApiError> {
        check_status(&response, 200, "Failed to fetch listing images")?;
        let body: ImagesBody =
            serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(body.images)
    }

    pub fn parse_upload(&self, response: HttpResponse) -> Result<ListingImage, ApiError> {
        check_status(&response, 201, "Failed to upload image")?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn parse_profile_image(&self, response: HttpResponse) -> Result<ProfileImage, ApiError> {
        check_status(&response, 200, "Failed to fetch profile image")?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ImagesClient {
        ImagesClient::new(ApiConfig::new("http://localhost:3000"))
    }

    fn image(id: i64, is_primary: bool) -> ListingImage {
        ListingImage {
            id,
            filename: format!("photo-{id}.jpg"),
            url: format!("/static/uploads/photo-{id}.jpg"),
            is_primary,
            created_datetime: None,
        }
    }

    #[test]
    fn build_listing_images_produces_correct_request() {
        let req = client().build_listing_images(42);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/Listings/42/Images");
    }

    #[test]
    fn build_upload_produces_multipart_request() {
        let upload = ImageUpload {
            filename: "chair.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xff, 0xd8, 0xff],
        };
        let req = client().build_upload(upload, 42, "ikeafan", true);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/Images");
        let parts = match req.body {
            Some(RequestBody::Multipart(parts)) => parts,
            other => panic!("expected multipart body, got {other:?}"),
        };
        assert_eq!(parts.len(), 4);
        match &parts[0] {
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                assert_eq!(name, "image");
                assert_eq!(filename, "chair.jpg");
                assert_eq!(content_type, "image/jpeg");
                assert_eq!(bytes, &[0xff, 0xd8, 0xff]);
            }
            other => panic!("expected file part, got {other:?}"),
        }
        match &parts[3] {
            Part::Text { name, value } => {
                assert_eq!(name, "is_primary");
                assert_eq!(value, "true");
            }
            other => panic!("expected text part, got {other:?}"),
        }
    }

    #[test]
    fn build_profile_image_produces_correct_request() {
        let req = client().build_profile_image("ikeafan");
        assert_eq!(
            req.path,
            "http://localhost:3000/Users/ikeafan/profile-image"
        );
    }

    #[test]
    fn parse_listing_images_unwraps_envelope() {
        let body = r#"{"images": [{
            "id": 1, "filename": "a.jpg", "url": "/static/uploads/a.jpg",
            "is_primary": false, "created_datetime": null
        }]}"#;
        let images = client()
            .parse_listing_images(HttpResponse::new(200, body))
            .unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].filename, "a.jpg");
    }

    #[test]
    fn parse_profile_image_null_url_is_ok() {
        let profile = client()
            .parse_profile_image(HttpResponse::new(200, r#"{"url": null}"#))
            .unwrap();
        assert_eq!(profile, ProfileImage { url: None });
    }

    #[test]
    fn parse_profile_image_server_error() {
        let err = client()
            .parse_profile_image(HttpResponse::new(500, "boom"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 500, .. }));
    }

    #[test]
    fn primary_image_prefers_flagged() {
        let images = vec![image(1, false), image(2, true)];
        assert_eq!(primary_image(&images).unwrap().id, 2);
    }

    #[test]
    fn primary_image_falls_back_to_first() {
        let images = vec![image(1, false), image(2, false)];
        assert_eq!(primary_image(&images).unwrap().id, 1);
    }

    #[test]
    fn primary_image_empty_is_none() {
        assert!(primary_image(&[]).is_none());
    }
}
