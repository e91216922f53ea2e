//! h1_ingest - Request-ingestion core for HTTP/1.x servers
//!
//! Everything between "the tokenizer has parsed a request head" and "the
//! application may look at the request": header storage, the per-request
//! record, and the protocol checks that decide whether a request is served
//! or refused. No sockets and no response writing live here; the crate is
//! plain synchronous logic meant to sit inside an async connection loop.
//!
//! # Components
//!
//! - [`HeaderStore`] - header lines in wire order, duplicates kept,
//!   case-insensitive lookup with last-wins semantics
//! - [`SharedHeaders`] - reference-counted store with a copy-on-write
//!   [`reset`](SharedHeaders::try_reset), so a late reader (access log,
//!   async handler) never sees the next request's headers
//! - [`Request`] / [`Physical`] - per-connection records, allocated once and
//!   truncated between pipelined requests
//! - [`Validator`] - ordered fail-fast checks mapping every refusal to one
//!   [`StatusCode`]
//! - [`HttpConnection`] - ties the above together for one connection
//!
//! # Examples
//!
//! ```
//! use h1_ingest::{HttpConnection, Outcome, StatusCode};
//!
//! let mut conn = HttpConnection::default();
//!
//! let request = conn.request_mut();
//! request.set_method(b"GET");
//! request.set_raw_uri(b"/docs/../index.html?lang=en");
//! request.set_version(b"HTTP/1.1");
//! request.insert_header(b"Host", b"Example.com:8080");
//!
//! assert_eq!(conn.validate_request(), Outcome::Proceed);
//! assert_eq!(conn.request().uri().path(), b"/index.html");
//! assert_eq!(conn.request().uri().host(), b"example.com");
//! assert_eq!(conn.request().content_length(), Some(0));
//!
//! // A second request on the same connection
//! conn.reset_request();
//! let request = conn.request_mut();
//! request.set_method(b"GET");
//! request.set_raw_uri(b"/");
//! request.set_version(b"HTTP/1.1");
//! request.insert_header(b"Host", b"a.example");
//! request.insert_header(b"Host", b"b.example");
//!
//! assert_eq!(conn.validate_request(), Outcome::Rejected(StatusCode::BadRequest));
//! assert!(!conn.is_keep_alive());
//! ```
//!
//! # Logging
//!
//! Refusals are reported through [`tracing`] at `debug` level with the
//! status, reason and failing rule; accepted requests at `trace`. The crate
//! never installs a subscriber.

pub(crate) mod http {
    pub(crate) mod headers;
    pub(crate) mod physical;
    pub(crate) mod request;
    pub(crate) mod types;
    pub(crate) mod uri;
    pub(crate) mod validate;
}
pub(crate) mod server {
    pub(crate) mod connection;
}
pub(crate) mod errors;
pub mod limits;

pub use crate::{
    errors::ErrorKind,
    http::{
        headers::{HeaderCursor, HeaderEntry, HeaderStore, SharedHeaders},
        physical::Physical,
        request::Request,
        types::{Method, StatusCode, Version},
        uri::{BasicUriParser, Uri, UriError, UriParser},
        validate::{ConnState, Outcome, Validator},
    },
    server::connection::HttpConnection,
};

#[cfg(test)]
pub mod tools {
    use std::str::from_utf8;

    #[inline]
    pub fn str(value: Option<&[u8]>) -> Option<&str> {
        Some(from_utf8(value?).unwrap())
    }

    #[inline]
    pub fn str_op(value: &[u8]) -> &str {
        from_utf8(value).unwrap()
    }
}
