//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! resource clients build `HttpRequest` values and parse `HttpResponse`
//! values without ever touching the network — executing the round trip is
//! the transport's job (or a test's). This separation keeps every client
//! deterministic and easy to test.
//!
//! Bodies are either a JSON string or a multipart form (image upload is the
//! only multipart endpoint). All fields use owned types so values can be
//! moved freely between the builder, the executor, and test code.

/// HTTP method for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// Request payload, described as plain data.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// A JSON document, already serialized.
    Json(String),
    /// A multipart/form-data body as an ordered list of parts.
    Multipart(Vec<Part>),
}

/// One part of a multipart form.
#[derive(Debug, Clone)]
pub enum Part {
    /// A plain text field.
    Text { name: String, value: String },
    /// A file field with raw bytes.
    File {
        name: String,
        filename: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

/// An HTTP request described as plain data.
///
/// Built by the resource clients' `build_*` methods. The caller is
/// responsible for executing this request and returning the corresponding
/// `HttpResponse`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    /// The request body as a JSON string, if it is one.
    pub fn json_body(&self) -> Option<&str> {
        match &self.body {
            Some(RequestBody::Json(s)) => Some(s),
            _ => None,
        }
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the executor after running an `HttpRequest`, then passed
/// to the resource clients' `parse_*` methods for deserialization.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Shorthand for test fixtures and simple executors.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}
