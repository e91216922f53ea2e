use crate::{
    http::{
        physical::Physical,
        request::Request,
        uri::{BasicUriParser, UriParser},
        validate::{ConnState, Outcome, Validator},
    },
    limits::{PhysicalLimits, ReqLimits},
    StatusCode,
};
use tracing::trace;

/// Request-side state of one client connection.
///
/// Owns the [`Request`] and [`Physical`] records for the lifetime of the
/// connection and reuses them for every pipelined request. The I/O loop
/// around it is expected to:
///
/// 1. feed the request head into [`request_mut`](Self::request_mut),
/// 2. call [`validate_request`](Self::validate_request),
/// 3. on [`Outcome::Rejected`] send [`status`](Self::status) and close,
///    otherwise serve the request (sending `100 Continue` first when
///    [`state`](Self::state) asks for it),
/// 4. call [`reset_request`](Self::reset_request) if the connection stays
///    open.
///
/// # Examples
/// ```
/// use h1_ingest::{HttpConnection, Outcome};
///
/// let mut conn = HttpConnection::default();
///
/// let request = conn.request_mut();
/// request.set_method(b"GET");
/// request.set_raw_uri(b"/");
/// request.set_version(b"HTTP/1.1");
/// request.insert_header(b"Host", b"example.com");
///
/// assert_eq!(conn.validate_request(), Outcome::Proceed);
/// assert!(conn.is_keep_alive());
///
/// conn.reset_request();
/// assert!(conn.request().headers().is_empty());
/// ```
#[derive(Debug)]
pub struct HttpConnection<P: UriParser = BasicUriParser> {
    validator: Validator<P>,

    request: Request,
    physical: Physical,

    state: ConnState,
    status: Option<StatusCode>,
    request_count: usize,
}

impl Default for HttpConnection {
    fn default() -> Self {
        HttpConnection::new(&ReqLimits::default(), &PhysicalLimits::default())
    }
}

impl HttpConnection {
    #[inline]
    pub fn new(req_limits: &ReqLimits, physical_limits: &PhysicalLimits) -> Self {
        HttpConnection::with_validator(Validator::new(), req_limits, physical_limits)
    }
}

impl<P: UriParser> HttpConnection<P> {
    #[inline]
    pub fn with_validator(
        validator: Validator<P>,
        req_limits: &ReqLimits,
        physical_limits: &PhysicalLimits,
    ) -> Self {
        HttpConnection {
            validator,

            request: Request::new(req_limits),
            physical: Physical::new(physical_limits),

            state: ConnState::default(),
            status: None,
            request_count: 0,
        }
    }

    /// Checks the current request and records the verdict.
    ///
    /// A rejection stores the error status and marks the connection for
    /// closing; nothing else about this request should be processed.
    pub fn validate_request(&mut self) -> Outcome {
        let outcome = self.validator.validate(&mut self.request, &mut self.state);

        if let Outcome::Rejected(status) = outcome {
            self.bad_request(status);
        }
        outcome
    }

    /// Fails the current request with `status` and closes after the reply.
    #[inline]
    pub fn bad_request(&mut self, status: StatusCode) {
        self.status = Some(status);
        self.state.keep_alive = false;
    }

    /// Gets the records ready for the next request on this connection.
    pub fn reset_request(&mut self) {
        self.request.reset();
        self.physical.reset();

        self.state.reset();
        self.status = None;
        self.request_count += 1;

        trace!(served = self.request_count, "connection ready for next request");
    }
}

// Public API
impl<P: UriParser> HttpConnection<P> {
    #[inline(always)]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    #[inline(always)]
    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    #[inline(always)]
    pub const fn physical(&self) -> &Physical {
        &self.physical
    }

    #[inline(always)]
    pub fn physical_mut(&mut self) -> &mut Physical {
        &mut self.physical
    }

    #[inline(always)]
    pub const fn state(&self) -> &ConnState {
        &self.state
    }

    #[inline(always)]
    pub const fn is_keep_alive(&self) -> bool {
        self.state.keep_alive
    }

    /// Status decided for the current request, if it was refused.
    #[inline(always)]
    pub const fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Requests completed on this connection so far.
    #[inline(always)]
    pub const fn request_count(&self) -> usize {
        self.request_count
    }
}

#[cfg(test)]
impl HttpConnection {
    pub(crate) fn from_head(method: &str, uri: &str, version: &str, headers: &[(&str, &str)]) -> Self {
        let mut conn = HttpConnection::default();
        conn.request = Request::from_head(method, uri, version, headers);
        conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::*;

    #[test]
    fn rejection_closes_connection() {
        let mut conn = HttpConnection::from_head("POST", "/", "HTTP/1.1", &[("Host", "h")]);

        assert_eq!(
            conn.validate_request(),
            Outcome::Rejected(StatusCode::LengthRequired)
        );
        assert_eq!(conn.status(), Some(StatusCode::LengthRequired));
        assert!(!conn.is_keep_alive());
    }

    #[test]
    fn pipelined_requests() {
        #[rustfmt::skip]
        let requests: [(&str, &str, &[(&str, &str)], Outcome); 3] = [
            ("GET",  "/a/./b", &[("Host", "h")],                                 Outcome::Proceed),
            ("POST", "/form",  &[("Host", "h"), ("Content-Length", "3"),
                                 ("Expect", "100-continue")],                    Outcome::Proceed),
            ("HEAD", "/",      &[("Host", "h"), ("Connection", "close")],        Outcome::Proceed),
        ];

        let mut conn = HttpConnection::default();

        for (i, (method, uri, headers, expected)) in requests.into_iter().enumerate() {
            let request = conn.request_mut();
            request.set_method(method.as_bytes());
            request.set_raw_uri(uri.as_bytes());
            request.set_version(b"HTTP/1.1");
            for (key, value) in headers {
                request.insert_header(key.as_bytes(), value.as_bytes());
            }

            assert_eq!(conn.validate_request(), expected);
            assert_eq!(conn.request().headers().len(), headers.len());

            match i {
                0 => assert_eq!(str_op(conn.request().uri().path()), "/a/b"),
                1 => assert!(conn.state().expect_100_continue),
                _ => assert!(!conn.is_keep_alive()),
            }

            conn.reset_request();
            assert_eq!(conn.state(), &ConnState::default());
            assert_eq!(conn.status(), None);
        }

        assert_eq!(conn.request_count(), 3);
    }

    #[test]
    fn reset_clears_physical() {
        let mut conn = HttpConnection::from_head("GET", "/index.html", "HTTP/1.1", &[("Host", "h")]);
        assert_eq!(conn.validate_request(), Outcome::Proceed);

        let physical = conn.physical_mut();
        physical.doc_root.extend_from_slice(b"/srv/www");
        physical.path.extend_from_slice(b"/srv/www/index.html");
        physical.size = Some(42);

        conn.reset_request();
        assert_eq!(conn.physical(), &Physical::default());
        assert_eq!(conn.request().content_length(), None);
    }

    #[test]
    fn reset_reuses_unshared_store() {
        let mut conn = HttpConnection::from_head("GET", "/", "HTTP/1.1", &[("Host", "h")]);
        assert_eq!(conn.validate_request(), Outcome::Proceed);
        let store = conn.request().headers().as_ptr();

        conn.reset_request();

        assert_eq!(conn.request().headers().as_ptr(), store);
        assert!(conn.request().headers().is_empty());
    }

    #[test]
    fn reset_with_lingering_header_owner() {
        let mut conn = HttpConnection::from_head("GET", "/", "HTTP/1.1", &[("Host", "h"), ("X-Id", "1")]);
        assert_eq!(conn.validate_request(), Outcome::Proceed);

        let access_log = conn.request().headers().acquire();
        conn.reset_request();

        assert!(conn.request().headers().is_empty());
        assert_eq!(access_log.len(), 2);
        assert_eq!(str(access_log.lookup(b"x-id").map(|h| h.value())), Some("1"));
    }
}
