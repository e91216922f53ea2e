//! Request-target buffers and the URL parsing seam.
//!
//! [`Uri`] owns six independent buffers that live as long as the connection
//! and are only truncated between requests. The validator never looks
//! inside the raw target itself; it drives a [`UriParser`] that fills the
//! other buffers in place. [`BasicUriParser`] is the implementation used
//! unless the embedding server plugs in its own.

use crate::limits::ReqLimits;
use memchr::{memchr, memchr2, memmem, memrchr};

/// Failure reported by a [`UriParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UriError {
    /// Target is not `*`, an absolute path, or an absolute URI
    #[error("malformed request target")]
    Malformed,
    #[error("invalid URI scheme")]
    InvalidScheme,
    /// Authority does not hold a usable `host[:port]`
    #[error("invalid host")]
    InvalidHost,
}

// URI

/// Request-target buffers of one request.
///
/// - **raw**: target exactly as sent (e.g. `http://Example.com/a/../b?x=1`)
/// - **scheme**: lower-cased scheme of an absolute target (e.g. `http`)
/// - **authority**: `Host` header value or the authority of an absolute
///   target, original bytes
/// - **host**: lower-cased host derived from the authority, port stripped
/// - **path**: decoded and simplified path used to resolve the resource
/// - **query**: query string without the leading `?`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Uri {
    pub(crate) raw: Vec<u8>,
    pub(crate) scheme: Vec<u8>,
    pub(crate) authority: Vec<u8>,
    pub(crate) path: Vec<u8>,
    pub(crate) query: Vec<u8>,
    pub(crate) host: Vec<u8>,
}

impl Uri {
    #[inline]
    pub(crate) fn new(limits: &ReqLimits) -> Self {
        Uri {
            raw: Vec::with_capacity(limits.uri_size),
            scheme: Vec::with_capacity(8),
            authority: Vec::with_capacity(limits.host_size),
            path: Vec::with_capacity(limits.uri_size),
            query: Vec::with_capacity(limits.uri_size / 2),
            host: Vec::with_capacity(limits.host_size),
        }
    }

    /// Truncates every buffer, keeping its capacity.
    #[inline]
    pub(crate) fn clear(&mut self) {
        self.raw.clear();
        self.scheme.clear();
        self.authority.clear();
        self.path.clear();
        self.query.clear();
        self.host.clear();
    }
}

// Public API
impl Uri {
    #[inline(always)]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    #[inline(always)]
    pub fn scheme(&self) -> &[u8] {
        &self.scheme
    }

    #[inline(always)]
    pub fn authority(&self) -> &[u8] {
        &self.authority
    }

    #[inline(always)]
    pub fn host(&self) -> &[u8] {
        &self.host
    }

    /// Decoded, simplified path. May hold bytes that are not UTF-8 after
    /// percent-decoding; see [`path_str`](Self::path_str).
    #[inline(always)]
    pub fn path(&self) -> &[u8] {
        &self.path
    }

    #[inline(always)]
    pub fn query(&self) -> &[u8] {
        &self.query
    }

    #[inline]
    pub fn path_str(&self) -> Option<&str> {
        simdutf8::basic::from_utf8(&self.path).ok()
    }

    #[inline]
    pub fn host_str(&self) -> Option<&str> {
        simdutf8::basic::from_utf8(&self.host).ok()
    }
}

// PARSER SEAM

/// URL primitives the validator relies on.
///
/// All calls work in place on the request's [`Uri`] buffers.
///
/// Contract expected by the validator:
/// - `parse_raw_url` fills `path` (non-empty: `*` or starting with `/`) and
///   `query` from `raw`. For an absolute target it also replaces
///   `scheme`, `authority` and `host`.
/// - `parse_hostname` fills `host` from `authority`; an empty authority
///   yields an empty host and is not an error.
/// - `url_decode` and `path_simplify` never fail.
pub trait UriParser: Send + Sync {
    fn parse_raw_url(&self, uri: &mut Uri) -> Result<(), UriError>;
    fn url_decode(&self, path: &mut Vec<u8>);
    fn path_simplify(&self, path: &mut Vec<u8>);
    fn parse_hostname(&self, uri: &mut Uri) -> Result<(), UriError>;
}

/// Default [`UriParser`] covering the target forms of RFC 9112, Section 3.2
/// except authority-form (`CONNECT host:port`).
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicUriParser;

impl UriParser for BasicUriParser {
    fn parse_raw_url(&self, uri: &mut Uri) -> Result<(), UriError> {
        let raw = uri.raw.as_slice();

        if raw
            .iter()
            .any(|&b| b <= b' ' || b == 0x7f || b == b'#')
        {
            return Err(UriError::Malformed);
        }

        let target = match raw {
            [] => return Err(UriError::Malformed),
            b"*" => {
                uri.path.push(b'*');
                return Ok(());
            }
            [b'/', ..] => raw,
            _ => {
                let colon = memmem::find(raw, b"://").ok_or(UriError::Malformed)?;
                let scheme = &raw[..colon];
                if !is_scheme(scheme) {
                    return Err(UriError::InvalidScheme);
                }

                let after = &raw[colon + 3..];
                let end = memchr2(b'/', b'?', after).unwrap_or(after.len());

                uri.scheme.clear();
                uri.scheme.extend(scheme.iter().map(u8::to_ascii_lowercase));
                uri.authority.clear();
                uri.authority.extend_from_slice(&after[..end]);
                uri.host.clear();
                split_host(&after[..end], &mut uri.host)?;

                &after[end..]
            }
        };

        let (path, query) = match memchr(b'?', target) {
            Some(i) => (&target[..i], &target[i + 1..]),
            None => (target, &b""[..]),
        };

        match path {
            [] => uri.path.push(b'/'),
            _ => uri.path.extend_from_slice(path),
        }
        uri.query.extend_from_slice(query);

        Ok(())
    }

    /// Decodes `%XX` escapes in place. Malformed escapes are copied as-is.
    /// `+` is left alone (it only means space in form bodies).
    fn url_decode(&self, path: &mut Vec<u8>) {
        if memchr(b'%', path).is_none() {
            return;
        }

        let len = path.len();
        let (mut read, mut write) = (0, 0);

        while read < len {
            let byte = match path[read] {
                b'%' if read + 2 < len => {
                    match (hex_digit(path[read + 1]), hex_digit(path[read + 2])) {
                        (Some(hi), Some(lo)) => {
                            read += 2;
                            hi << 4 | lo
                        }
                        _ => b'%',
                    }
                }
                other => other,
            };

            path[write] = byte;
            write += 1;
            read += 1;
        }

        path.truncate(write);
    }

    /// Collapses repeated `/`, drops `.` segments and resolves `..` without
    /// climbing above the root. A trailing `/`, `/.` or `/..` keeps the
    /// result a directory path (`/a/b/.` becomes `/a/b/`).
    fn path_simplify(&self, path: &mut Vec<u8>) {
        if path.first() != Some(&b'/') {
            return;
        }

        let len = path.len();
        let directory =
            path.ends_with(b"/") || path.ends_with(b"/.") || path.ends_with(b"/..");
        let (mut read, mut write) = (0, 0);

        // Output is always `path[..write]`, a run of `/segment` pieces, and
        // never catches up with `read`.
        while read < len {
            while read < len && path[read] == b'/' {
                read += 1;
            }
            let start = read;
            while read < len && path[read] != b'/' {
                read += 1;
            }

            match &path[start..read] {
                b"" | b"." => {}
                b".." => {
                    write = memrchr(b'/', &path[..write]).unwrap_or(0);
                }
                _ => {
                    path[write] = b'/';
                    write += 1;
                    path.copy_within(start..read, write);
                    write += read - start;
                }
            }
        }

        path.truncate(write);
        if write == 0 || directory {
            path.push(b'/');
        }
    }

    fn parse_hostname(&self, uri: &mut Uri) -> Result<(), UriError> {
        uri.host.clear();
        split_host(&uri.authority, &mut uri.host)
    }
}

/// `scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
#[inline]
fn is_scheme(scheme: &[u8]) -> bool {
    match scheme {
        [first, rest @ ..] => {
            first.is_ascii_alphabetic()
                && rest
                    .iter()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
        }
        [] => false,
    }
}

/// Writes the lower-cased host of `authority` into `host`.
///
/// Accepts `[userinfo@]host[:port]` where host is a reg-name of
/// `[A-Za-z0-9._-]` or a bracketed IPv6 literal, and port is all digits
/// (possibly empty).
fn split_host(authority: &[u8], host: &mut Vec<u8>) -> Result<(), UriError> {
    let authority = match memrchr(b'@', authority) {
        Some(at) => &authority[at + 1..],
        None => authority,
    };
    if authority.is_empty() {
        return Ok(());
    }

    let (name, port) = match authority[0] {
        b'[' => {
            let close = memchr(b']', authority).ok_or(UriError::InvalidHost)?;
            let literal = &authority[1..close];

            if literal.is_empty()
                || !literal
                    .iter()
                    .all(|b| b.is_ascii_hexdigit() || matches!(b, b':' | b'.'))
            {
                return Err(UriError::InvalidHost);
            }
            (&authority[..=close], &authority[close + 1..])
        }
        _ => {
            let (name, port) = match memchr(b':', authority) {
                Some(colon) => (&authority[..colon], &authority[colon..]),
                None => (authority, &b""[..]),
            };

            if name.is_empty()
                || !name
                    .iter()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'))
            {
                return Err(UriError::InvalidHost);
            }
            (name, port)
        }
    };

    match port {
        [] => {}
        [b':', digits @ ..] if digits.iter().all(u8::is_ascii_digit) => {}
        _ => return Err(UriError::InvalidHost),
    }

    host.extend(name.iter().map(u8::to_ascii_lowercase));
    Ok(())
}

#[inline]
fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::*;

    fn uri(raw: &str) -> Uri {
        let mut uri = Uri::new(&ReqLimits::default());
        uri.raw.extend_from_slice(raw.as_bytes());
        uri
    }

    #[test]
    fn parse_raw_url() {
        #[rustfmt::skip]
        let cases = [
            ("/",                          Ok(("/",          "",        ""))),
            ("*",                          Ok(("*",          "",        ""))),
            ("/a/b?x=1&y",                 Ok(("/a/b",       "x=1&y",   ""))),
            ("/?",                         Ok(("/",          "",        ""))),
            ("/%7Euser",                   Ok(("/%7Euser",   "",        ""))),
            ("http://Example.COM:8080/p?q", Ok(("/p",        "q",       "example.com"))),
            ("https://example.com",        Ok(("/",          "",        "example.com"))),
            ("http://example.com?q",       Ok(("/",          "q",       "example.com"))),

            ("",                           Err(UriError::Malformed)),
            ("a/b",                        Err(UriError::Malformed)),
            ("/a b",                       Err(UriError::Malformed)),
            ("/a#frag",                    Err(UriError::Malformed)),
            ("/a\tb",                      Err(UriError::Malformed)),
            ("1http://host/",              Err(UriError::InvalidScheme)),
            ("://host/",                   Err(UriError::InvalidScheme)),
            ("http://ho!st/",              Err(UriError::InvalidHost)),
        ];

        for (raw, expected) in cases {
            let mut u = uri(raw);
            let result = BasicUriParser.parse_raw_url(&mut u);

            match expected {
                Ok((path, query, host)) => {
                    assert_eq!(result, Ok(()), "{raw:?}");
                    assert_eq!(str_op(u.path()), path, "{raw:?}");
                    assert_eq!(str_op(u.query()), query, "{raw:?}");
                    assert_eq!(str_op(u.host()), host, "{raw:?}");
                }
                Err(e) => assert_eq!(result, Err(e), "{raw:?}"),
            }
        }
    }

    #[test]
    fn absolute_target_replaces_authority() {
        let mut u = uri("HTTP://user@Other.org:81/x");
        u.authority.extend_from_slice(b"from-host-header");

        assert_eq!(BasicUriParser.parse_raw_url(&mut u), Ok(()));
        assert_eq!(str_op(u.scheme()), "http");
        assert_eq!(str_op(u.authority()), "user@Other.org:81");
        assert_eq!(str_op(u.host()), "other.org");
    }

    #[test]
    fn url_decode() {
        #[rustfmt::skip]
        let cases = [
            ("/plain",          "/plain"),
            ("/a%20b",          "/a b"),
            ("/%7euser/%7E",    "/~user/~"),
            ("/100%",           "/100%"),
            ("/%zz%4",          "/%zz%4"),
            ("/%41",            "/A"),
            ("/a+b",            "/a+b"),
            ("/%2e%2E/x",       "/../x"),
        ];

        for (input, expected) in cases {
            let mut path = input.as_bytes().to_vec();
            BasicUriParser.url_decode(&mut path);
            assert_eq!(str_op(&path), expected, "{input:?}");
        }
    }

    #[test]
    fn path_simplify() {
        #[rustfmt::skip]
        let cases = [
            ("/",               "/"),
            ("/a/../b/./c",     "/b/c"),
            ("/a/b/",           "/a/b/"),
            ("//a///b",         "/a/b"),
            ("/..",             "/"),
            ("/../../etc/passwd", "/etc/passwd"),
            ("/a/b/..",         "/a/"),
            ("/a/b/.",          "/a/b/"),
            ("/a/./",           "/a/"),
            ("/a/..b/c",        "/a/..b/c"),
            ("/.hidden/x",      "/.hidden/x"),
            ("*",               "*"),
        ];

        for (input, expected) in cases {
            let mut path = input.as_bytes().to_vec();
            BasicUriParser.path_simplify(&mut path);
            assert_eq!(str_op(&path), expected, "{input:?}");
        }
    }

    #[test]
    fn parse_hostname() {
        #[rustfmt::skip]
        let cases = [
            ("example.com",        Ok("example.com")),
            ("Example.COM:443",    Ok("example.com")),
            ("",                   Ok("")),
            ("user:pw@host",       Ok("host")),
            ("[::1]:8080",         Ok("[::1]")),
            ("[2001:DB8::1]",      Ok("[2001:db8::1]")),
            ("host:",              Ok("host")),
            ("my_host-1.local",    Ok("my_host-1.local")),

            (":80",                Err(UriError::InvalidHost)),
            ("host:80a",           Err(UriError::InvalidHost)),
            ("ho st",              Err(UriError::InvalidHost)),
            ("[::1",               Err(UriError::InvalidHost)),
            ("[]",                 Err(UriError::InvalidHost)),
            ("[::1]x",             Err(UriError::InvalidHost)),
            ("host/path",          Err(UriError::InvalidHost)),
        ];

        for (authority, expected) in cases {
            let mut u = uri("/");
            u.authority.extend_from_slice(authority.as_bytes());
            let result = BasicUriParser.parse_hostname(&mut u);

            match expected {
                Ok(host) => {
                    assert_eq!(result, Ok(()), "{authority:?}");
                    assert_eq!(str_op(u.host()), host, "{authority:?}");
                }
                Err(e) => assert_eq!(result, Err(e), "{authority:?}"),
            }
        }
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut u = uri("/some/long/path?with=query");
        BasicUriParser.parse_raw_url(&mut u).unwrap();
        let capacity = u.path.capacity();

        u.clear();
        assert_eq!(u, Uri::default());
        assert_eq!(u.path.capacity(), capacity);
    }
}
