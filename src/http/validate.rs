//! Protocol checks run once per request, after the head has been parsed.
//!
//! The checks form an ordered list. The first one that fails decides the
//! status; later checks are skipped because they rely on what earlier ones
//! established (path normalization needs a valid target, the body policy
//! needs the parsed `Content-Length`).
//!
//! | # | Rule             | Rejects with |
//! |---|------------------|--------------|
//! | 1 | `version`        | 505 unknown version |
//! | 2 | `raw_uri`        | 400 empty target |
//! | 3 | `host`           | 400 duplicate or unparseable `Host` |
//! | 4 | `host_required`  | 400 HTTP/1.1 without a host |
//! | 5 | `uri`            | 400 bad target, `*` outside OPTIONS |
//! | 6 | `content_length` | 400 not a number or negative, 413 out of range |
//! | 7 | `expect`         | 417 anything but `100-continue`, or from HTTP/1.0 |
//! | 8 | `method_body`    | 400 GET/HEAD with a body, 411 POST without length |

use crate::{
    errors::ErrorKind,
    http::{
        request::Request,
        types::parse_content_length,
        uri::{BasicUriParser, UriParser},
    },
    Method, StatusCode, Version,
};
use tracing::{debug, trace};

/// Per-request connection flags decided by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnState {
    /// Connection stays open after the response
    pub keep_alive: bool,
    /// Client waits for `100 Continue` before sending the body
    pub expect_100_continue: bool,
}

impl Default for ConnState {
    fn default() -> Self {
        ConnState {
            keep_alive: true,
            expect_100_continue: false,
        }
    }
}

impl ConnState {
    #[inline]
    pub fn reset(&mut self) {
        *self = ConnState::default();
    }
}

/// Result of [`Validator::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Request is well-formed; its URI, host and length are filled in
    Proceed,
    /// Answer with this status and close the connection
    Rejected(StatusCode),
}

type Rule = fn(&mut Checked<'_>) -> Result<(), ErrorKind>;

/// Everything a rule may look at or change.
struct Checked<'a> {
    req: &'a mut Request,
    conn: &'a mut ConnState,
    uri_parser: &'a dyn UriParser,
}

#[rustfmt::skip]
const RULES: [(&str, Rule); 8] = [
    ("version",        check_version),
    ("raw_uri",        check_raw_uri),
    ("host",           check_host),
    ("host_required",  check_host_required),
    ("uri",            check_uri),
    ("content_length", check_content_length),
    ("expect",         check_expect),
    ("method_body",    check_method_body),
];

/// Runs the protocol checks against a parsed request.
///
/// Generic over the URL primitives so a server can bring its own; the
/// default is [`BasicUriParser`].
///
/// # Examples
/// ```
/// use h1_ingest::{limits::ReqLimits, ConnState, Outcome, Request, StatusCode, Validator};
///
/// let mut request = Request::new(&ReqLimits::default());
/// request.set_method(b"POST");
/// request.set_raw_uri(b"/upload");
/// request.set_version(b"HTTP/1.1");
/// request.insert_header(b"Host", b"example.com");
///
/// let mut conn = ConnState::default();
/// let outcome = Validator::new().validate(&mut request, &mut conn);
///
/// assert_eq!(outcome, Outcome::Rejected(StatusCode::LengthRequired));
/// assert!(!conn.keep_alive);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Validator<P: UriParser = BasicUriParser> {
    uri_parser: P,
}

impl Validator {
    #[inline]
    pub fn new() -> Self {
        Validator {
            uri_parser: BasicUriParser,
        }
    }
}

impl<P: UriParser> Validator<P> {
    #[inline]
    pub fn with_parser(uri_parser: P) -> Self {
        Validator { uri_parser }
    }

    #[inline]
    pub fn uri_parser(&self) -> &P {
        &self.uri_parser
    }

    /// Validates `req`, updating `conn` and the request's derived fields.
    ///
    /// On rejection `conn.keep_alive` is cleared; the caller sends the
    /// returned status and closes the connection.
    pub fn validate(&self, req: &mut Request, conn: &mut ConnState) -> Outcome {
        match self.run(req, conn) {
            Ok(()) => {
                trace!(
                    keep_alive = conn.keep_alive,
                    expect_100_continue = conn.expect_100_continue,
                    content_length = ?req.content_length,
                    "request accepted"
                );
                Outcome::Proceed
            }
            Err((rule, err)) => {
                conn.keep_alive = false;

                let status = err.status();
                debug!(
                    status = status.as_u16(),
                    reason = %err,
                    rule,
                    "request rejected"
                );
                Outcome::Rejected(status)
            }
        }
    }

    /// Same checks as [`validate`](Self::validate), reporting the precise
    /// reason instead of only the status. `conn` is left as the failing
    /// rule found it.
    pub fn check(&self, req: &mut Request, conn: &mut ConnState) -> Result<(), ErrorKind> {
        self.run(req, conn).map_err(|(_, err)| err)
    }

    fn run(
        &self,
        req: &mut Request,
        conn: &mut ConnState,
    ) -> Result<(), (&'static str, ErrorKind)> {
        let mut checked = Checked {
            req,
            conn,
            uri_parser: &self.uri_parser,
        };

        for (name, rule) in RULES {
            rule(&mut checked).map_err(|err| (name, err))?;
        }
        Ok(())
    }
}

// RULES

fn check_version(c: &mut Checked<'_>) -> Result<(), ErrorKind> {
    let headers = &c.req.headers;

    c.conn.keep_alive = match c.req.version() {
        Version::Http11 => !headers.is_value(b"connection", b"close"),
        Version::Http10 => headers.is_value(b"connection", b"keep-alive"),
        Version::Unset => return Err(ErrorKind::UnsupportedVersion),
    };
    Ok(())
}

fn check_raw_uri(c: &mut Checked<'_>) -> Result<(), ErrorKind> {
    match c.req.uri.raw.is_empty() {
        true => Err(ErrorKind::EmptyUri),
        false => Ok(()),
    }
}

/// A single `Host` seeds the authority. No `Host` at all leaves the
/// authority empty, which only HTTP/1.1 refuses (next rule).
fn check_host(c: &mut Checked<'_>) -> Result<(), ErrorKind> {
    let req = &mut *c.req;

    let Some(first) = req.headers.find_first(b"host") else {
        return Ok(());
    };
    if req.headers.find_next(first, b"host").is_some() {
        return Err(ErrorKind::DuplicateHost);
    }

    req.uri.authority.clear();
    req.uri
        .authority
        .extend_from_slice(req.headers[first].value());

    c.uri_parser
        .parse_hostname(&mut req.uri)
        .map_err(|_| ErrorKind::InvalidHost)
}

fn check_host_required(c: &mut Checked<'_>) -> Result<(), ErrorKind> {
    match c.req.version() == Version::Http11 && c.req.uri.host.is_empty() {
        true => Err(ErrorKind::MissingHost),
        false => Ok(()),
    }
}

fn check_uri(c: &mut Checked<'_>) -> Result<(), ErrorKind> {
    let method = c.req.method();
    let uri = &mut c.req.uri;
    uri.path.clear();
    uri.query.clear();

    c.uri_parser.parse_raw_url(uri)?;

    if uri.path == b"*" {
        return match method {
            Method::Options => Ok(()),
            _ => Err(ErrorKind::AsteriskNotAllowed),
        };
    }

    c.uri_parser.url_decode(&mut uri.path);
    c.uri_parser.path_simplify(&mut uri.path);
    Ok(())
}

fn check_content_length(c: &mut Checked<'_>) -> Result<(), ErrorKind> {
    let req = &mut *c.req;

    if let Some(entry) = req.headers.lookup(b"content-length") {
        req.content_length = Some(parse_content_length(entry.value())?);
    }
    Ok(())
}

fn check_expect(c: &mut Checked<'_>) -> Result<(), ErrorKind> {
    let mut expected = false;

    for entry in c.req.headers.occurrences(b"expect") {
        if !entry.value().eq_ignore_ascii_case(b"100-continue") {
            return Err(ErrorKind::UnsupportedExpectation);
        }
        expected = true;
    }

    if expected {
        if c.req.version() == Version::Http10 {
            return Err(ErrorKind::ExpectFromHttp10);
        }
        c.conn.expect_100_continue = true;
    }
    Ok(())
}

fn check_method_body(c: &mut Checked<'_>) -> Result<(), ErrorKind> {
    let req = &mut *c.req;

    match (req.method(), req.content_length) {
        (Method::Get | Method::Head, Some(len)) if len > 0 => Err(ErrorKind::UnexpectedBody),
        (Method::Get | Method::Head, _) => {
            req.content_length = Some(0);
            Ok(())
        }
        (Method::Post, None) => Err(ErrorKind::LengthRequired),
        _ => Ok(()),
    }
}
