use crate::{
    http::{
        headers::{HeaderStore, SharedHeaders},
        uri::Uri,
    },
    limits::ReqLimits,
    Method, Version,
};

/// One in-flight HTTP/1.x request on a connection.
///
/// A connection builds its `Request` once, sized from [`ReqLimits`], and
/// [`reset`](Self::reset)s it between pipelined requests. Every buffer keeps
/// its capacity across resets; dropping the request frees them and releases
/// its reference to the header store.
///
/// # Filling a request
///
/// The tokenizer feeds the request line and header lines in wire order:
///
/// ```
/// use h1_ingest::{limits::ReqLimits, Method, Request, Version};
///
/// let mut request = Request::new(&ReqLimits::default());
/// request.set_method(b"PROPFIND");
/// request.set_raw_uri(b"/calendars/");
/// request.set_version(b"HTTP/1.1");
/// request.insert_header(b"Host", b"dav.example.com");
/// request.insert_header(b"Depth", b"1");
///
/// assert_eq!(request.method(), Method::Unset);
/// assert_eq!(request.method_str(), Some("PROPFIND"));
/// assert_eq!(request.version(), Version::Http11);
/// assert_eq!(request.header(b"depth"), Some(&b"1"[..]));
/// ```
///
/// Nothing is interpreted at this point. The parsed path, host and
/// `Content-Length` are filled in by the [`Validator`](crate::Validator).
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    method_token: Vec<u8>,
    version: Version,

    pub(crate) uri: Uri,
    pub(crate) headers: SharedHeaders,
    pub(crate) content_length: Option<u64>,
}

impl Request {
    #[inline]
    pub fn new(limits: &ReqLimits) -> Self {
        Request {
            method: Method::Unset,
            method_token: Vec::with_capacity(limits.method_size),
            version: Version::Unset,

            uri: Uri::new(limits),
            headers: SharedHeaders::new(limits.header_count),
            content_length: None,
        }
    }

    /// Prepares the request for the next one on the same connection.
    ///
    /// Buffers are truncated, not freed. The header store is cleared in
    /// place when this request is its only owner; otherwise the request
    /// moves on to a new store and leaves the old one to its other owners.
    #[inline]
    pub fn reset(&mut self) {
        self.method = Method::Unset;
        self.method_token.clear();
        self.version = Version::Unset;

        self.uri.clear();
        self.headers.reset();
        self.content_length = None;
    }
}

// Tokenizer-facing setters
impl Request {
    /// Records the method token verbatim and its recognised [`Method`], if any.
    #[inline]
    pub fn set_method(&mut self, token: &[u8]) {
        self.method = Method::from_bytes(token);
        self.method_token.clear();
        self.method_token.extend_from_slice(token);
    }

    #[inline]
    pub fn set_version(&mut self, token: &[u8]) {
        self.version = Version::from_bytes(token);
    }

    #[inline]
    pub fn set_raw_uri(&mut self, raw: &[u8]) {
        self.uri.raw.clear();
        self.uri.raw.extend_from_slice(raw);
    }

    /// Adds one header line as received.
    #[inline]
    pub fn insert_header(&mut self, key: &[u8], value: &[u8]) {
        self.headers.make_mut().insert(key, value);
    }

    /// Mutable access to the headers of this request.
    ///
    /// If some other owner still holds the store, this request switches to
    /// a private copy first.
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderStore {
        self.headers.make_mut()
    }
}

// Public API
impl Request {
    #[inline(always)]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Method token exactly as sent, including extension methods.
    #[inline(always)]
    pub fn method_bytes(&self) -> &[u8] {
        &self.method_token
    }

    #[inline]
    pub fn method_str(&self) -> Option<&str> {
        simdutf8::basic::from_utf8(&self.method_token).ok()
    }

    #[inline(always)]
    pub const fn version(&self) -> Version {
        self.version
    }

    #[inline(always)]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Handle to the header store. [`acquire`](SharedHeaders::acquire) it to
    /// keep the headers readable after this request is reset.
    #[inline(always)]
    pub const fn headers(&self) -> &SharedHeaders {
        &self.headers
    }

    /// Value of the last occurrence of `name` (case-insensitive).
    #[inline]
    pub fn header(&self, name: &[u8]) -> Option<&[u8]> {
        self.headers.lookup(name).map(|h| h.value())
    }

    #[inline]
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.lookup(name.as_bytes())?.value_str()
    }

    /// Declared body length, `None` when the request announced none.
    ///
    /// Only meaningful after validation; GET and HEAD then report
    /// `Some(0)` even without the header.
    #[inline(always)]
    pub const fn content_length(&self) -> Option<u64> {
        self.content_length
    }
}

#[cfg(test)]
impl Request {
    /// Builds a request the way the tokenizer would fill it.
    pub(crate) fn from_head(
        method: &str,
        uri: &str,
        version: &str,
        headers: &[(&str, &str)],
    ) -> Self {
        let mut request = Request::new(&ReqLimits::default());
        request.set_method(method.as_bytes());
        request.set_raw_uri(uri.as_bytes());
        request.set_version(version.as_bytes());

        for (key, value) in headers {
            request.insert_header(key.as_bytes(), value.as_bytes());
        }
        request
    }
}
