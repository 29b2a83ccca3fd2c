//! Purpose: Output sinks for streamed rows, with optional response metadata.
//! Exports: `Sink`, `ContentType`, `ResponseBuffer`, `JSON_CONTENT_TYPE`.
//! Role: Boundary between the row streamer and whatever accepts the bytes.
//! Invariants: Sinks without metadata report `None`; the writer then skips content-type.
//! Invariants: A caller-chosen content type is never overwritten by the writer.
use std::fs::File;
use std::io::{self, BufWriter, Stdout, StdoutLock, Write};

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Settable content-type metadata, as exposed by HTTP-style responses.
pub trait ContentType {
    fn content_type(&self) -> Option<&str>;
    fn set_content_type(&mut self, value: &str);
}

/// A byte sink the writer flushes rows into.
pub trait Sink: Write {
    fn metadata(&mut self) -> Option<&mut dyn ContentType> {
        None
    }
}

impl Sink for Vec<u8> {}
impl Sink for File {}
impl Sink for Stdout {}
impl Sink for StdoutLock<'_> {}
impl Sink for io::Cursor<Vec<u8>> {}
impl<W: Write> Sink for BufWriter<W> {}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn metadata(&mut self) -> Option<&mut dyn ContentType> {
        (**self).metadata()
    }
}

/// In-memory HTTP response: headers plus body bytes, convertible into an axum response.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

impl Write for ResponseBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ContentType for ResponseBuffer {
    fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    fn set_content_type(&mut self, value: &str) {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(CONTENT_TYPE, value);
        }
    }
}

impl Sink for ResponseBuffer {
    fn metadata(&mut self) -> Option<&mut dyn ContentType> {
        Some(self)
    }
}

impl IntoResponse for ResponseBuffer {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(Bytes::from(self.body)));
        *response.headers_mut() = self.headers;
        response
    }
}
