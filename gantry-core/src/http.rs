// HTTP request and response types

use crate::form;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Why an uploaded file failed to arrive intact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadError {
    /// The file exceeded the configured size limit
    SizeExceeded,
    /// The file was only partially transferred
    Partial,
    /// The form field was present but carried no file
    Missing,
    /// The file could not be written to its temporary location
    Io,
}

/// Descriptor for a file received with a request.
///
/// The payload itself lives at `temp_path`; the descriptor only carries what
/// the client declared about it.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original filename as sent by the client
    pub filename: String,
    /// Temporary location the transport stored the payload at
    pub temp_path: PathBuf,
    /// Declared size in bytes
    pub size: u64,
    /// Declared MIME type
    pub content_type: String,
    /// Upload failure, if any
    pub error: Option<UploadError>,
}

impl UploadedFile {
    /// True if the upload completed without error
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// HTTP request wrapper.
///
/// The query string is stripped from the path and parsed at construction.
/// Header names are stored lowercased; use [`HttpRequest::header`] for
/// case-insensitive lookup. `path_params` is filled exactly once by the
/// router after a successful match; everything else is fixed once the
/// transport hands the request to dispatch.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub query_params: HashMap<String, String>,
    pub form_params: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
    pub path_params: HashMap<String, String>,
}

impl HttpRequest {
    pub fn new(method: String, target: String) -> Self {
        let mut path = target;
        let mut query_params = HashMap::new();
        if let Some(idx) = path.find('?') {
            let query = path.split_off(idx);
            query_params = form::parse_query(&query[1..]);
        }

        Self {
            method,
            path,
            headers: HashMap::new(),
            body: Vec::new(),
            query_params,
            form_params: HashMap::new(),
            files: HashMap::new(),
            path_params: HashMap::new(),
        }
    }

    /// Parse the request body as JSON
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> Result<T, crate::Error> {
        serde_json::from_slice(&self.body).map_err(|e| crate::Error::Deserialization(e.to_string()))
    }

    /// Get a path parameter by name
    pub fn param(&self, name: &str) -> Option<&String> {
        self.path_params.get(name)
    }

    /// Get a query parameter by name
    pub fn query(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    /// Get a form body field by name
    pub fn form(&self, name: &str) -> Option<&String> {
        self.form_params.get(name)
    }

    /// Get an uploaded file by field name
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    /// Get a header by name, case-insensitively
    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers.get(&name.to_ascii_lowercase())
    }

    /// Insert a header, normalizing the name to lowercase
    pub fn insert_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }
}

/// HTTP response wrapper.
///
/// Headers keep insertion order; writing an existing key replaces its value
/// in place.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: IndexMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: IndexMap::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn created() -> Self {
        Self::new(201)
    }

    pub fn no_content() -> Self {
        Self::new(204)
    }

    pub fn bad_request() -> Self {
        Self::new(400)
    }

    pub fn unauthorized() -> Self {
        Self::new(401)
    }

    pub fn forbidden() -> Self {
        Self::new(403)
    }

    pub fn not_found() -> Self {
        Self::new(404)
    }

    pub fn internal_server_error() -> Self {
        Self::new(500)
    }

    /// A 302 redirect to the given location
    pub fn redirect(location: &str) -> Self {
        Self::new(302).with_header("Location", location)
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Set a plain-text body
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.body = text.into().into_bytes();
        self.headers.insert(
            "Content-Type".to_string(),
            "text/plain; charset=utf-8".to_string(),
        );
        self
    }

    /// Serialize a value as the JSON body
    pub fn with_json<T: Serialize>(mut self, value: &T) -> Result<Self, crate::Error> {
        self.body =
            serde_json::to_vec(value).map_err(|e| crate::Error::Serialization(e.to_string()))?;
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body_ref(&self) -> &[u8] {
        &self.body
    }
}

/// Normalization of handler return values into responses.
///
/// Whatever a route handler or controller method produces passes through
/// here before leaving dispatch: responses are untouched, strings become
/// 200 text, JSON-able values become JSON, and `()` becomes an empty 204.
pub trait IntoResponse {
    fn into_response(self) -> Result<HttpResponse, crate::Error>;
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Result<HttpResponse, crate::Error> {
        Ok(self)
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Result<HttpResponse, crate::Error> {
        Ok(HttpResponse::ok().with_text(self))
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Result<HttpResponse, crate::Error> {
        Ok(HttpResponse::ok().with_text(self))
    }
}

impl IntoResponse for serde_json::Value {
    fn into_response(self) -> Result<HttpResponse, crate::Error> {
        HttpResponse::ok().with_json(&self)
    }
}

impl IntoResponse for () {
    fn into_response(self) -> Result<HttpResponse, crate::Error> {
        Ok(HttpResponse::no_content())
    }
}

/// JSON response helper
#[derive(Debug)]
pub struct Json<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Result<HttpResponse, crate::Error> {
        HttpResponse::ok().with_json(&self.0)
    }
}
