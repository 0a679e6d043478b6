//! Wire types shared by more than one resource client.
//!
//! # Design
//! These mirror the backend's envelopes but are defined independently of the
//! mock-server crate; the integration tests catch schema drift between the
//! two.

use serde::{Deserialize, Serialize};

/// Pagination metadata attached to collection responses.
///
/// The client decodes it but does not walk pages; traversal is out of scope
/// for this layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u32,
}

/// `{"message": "..."}` acknowledgements returned by delete/update endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Confirmation {
    pub message: String,
}
