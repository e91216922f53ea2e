#![allow(rustdoc::bare_urls)]

//! Core HTTP protocol types and utilities

use crate::errors::ErrorKind;

// CONTENT LENGTH

/// Parses a `Content-Length` value the way a base-10 `strtoll` would.
///
/// Leading C `isspace` bytes (space, `\t` through `\r`) and a single sign
/// are accepted. Every remaining byte must be a digit. An empty value
/// parses as `0`.
///
/// Trailing garbage wins over overflow, and a negative value wins over
/// overflow, so `-99999999999999999999` is a plain bad request.
#[inline]
pub(crate) fn parse_content_length(bytes: &[u8]) -> Result<u64, ErrorKind> {
    let start = bytes
        .iter()
        .position(|b| !matches!(b, b' ' | b'\t'..=b'\r'))
        .unwrap_or(bytes.len());
    let mut rest = &bytes[start..];

    let negative = match rest.first() {
        Some(b'-') => {
            rest = &rest[1..];
            true
        }
        Some(b'+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };

    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        // Nothing converted: only an entirely empty value is accepted.
        return match bytes.is_empty() {
            true => Ok(0),
            false => Err(ErrorKind::InvalidContentLength),
        };
    }
    if digits != rest.len() {
        return Err(ErrorKind::InvalidContentLength);
    }

    let mut overflow = false;
    let mut result: u64 = 0;
    for &byte in &rest[..digits] {
        match result
            .checked_mul(10)
            .and_then(|r| r.checked_add((byte - b'0') as u64))
            .filter(|r| *r <= i64::MAX as u64)
        {
            Some(value) => result = value,
            None => {
                overflow = true;
                break;
            }
        }
    }

    match (negative, overflow) {
        (true, _) if overflow || result != 0 => Err(ErrorKind::NegativeContentLength),
        (_, true) => Err(ErrorKind::ContentLengthTooLarge),
        _ => Ok(result),
    }
}

// METHOD

/// HTTP request methods
///
/// Only the methods the validator has a policy for, plus the ones a
/// general-purpose server is expected to recognise. Any other token is kept
/// as [`Method::Unset`] and stays available verbatim through
/// [`Request::method_str`](crate::Request::method_str).
///
/// # References
///
/// - [RFC 9110, Section 9](https://datatracker.ietf.org/doc/html/rfc9110#section-9)
/// - [RFC 5789](https://datatracker.ietf.org/doc/html/rfc5789) (PATCH method)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// No request line parsed yet, or an extension method
    #[default]
    Unset,
    /// GET method - transfer a current representation of the target resource
    /// [[RFC9110, Section 9.3.1](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.1)]
    Get,
    /// HEAD method - same as GET but without response body
    /// [[RFC9110, Section 9.3.2](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.2)]
    Head,
    /// POST method - perform resource-specific processing on the request payload
    /// [[RFC9110, Section 9.3.3](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.3)]
    Post,
    /// PUT method - replace all current representations of the target resource
    /// [[RFC9110, Section 9.3.4](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.4)]
    Put,
    /// DELETE method - remove all current representations of the target resource
    /// [[RFC9110, Section 9.3.5](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.5)]
    Delete,
    /// CONNECT method - establish a tunnel to the server identified by the target
    /// [[RFC9110, Section 9.3.6](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.6)]
    Connect,
    /// OPTIONS method - describe the communication options for the target resource
    /// [[RFC9110, Section 9.3.7](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.7)]
    Options,
    /// TRACE method - message loop-back test along the path to the target
    /// [[RFC9110, Section 9.3.8](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.8)]
    Trace,
    /// PATCH method - apply partial modifications to a resource
    /// [[RFC5789, Section 2](https://datatracker.ietf.org/doc/html/rfc5789#section-2)]
    Patch,
}

impl Method {
    /// Method tokens are case-sensitive.
    #[inline(always)]
    pub const fn from_bytes(src: &[u8]) -> Self {
        match src {
            b"GET" => Method::Get,
            b"HEAD" => Method::Head,
            b"POST" => Method::Post,
            b"PUT" => Method::Put,
            b"DELETE" => Method::Delete,
            b"CONNECT" => Method::Connect,
            b"OPTIONS" => Method::Options,
            b"TRACE" => Method::Trace,
            b"PATCH" => Method::Patch,
            _ => Method::Unset,
        }
    }
}

// VERSION

/// HTTP protocol version
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// Missing, unparseable or unknown version token
    #[default]
    Unset,

    /// HTTP/1.0 - Added headers and status codes (1996)
    ///
    /// [RFC 1945](https://tools.ietf.org/html/rfc1945)
    Http10,

    /// HTTP/1.1 - Current standard with keep-alive and chunking (1999)
    ///
    /// [RFC 9112](https://datatracker.ietf.org/doc/html/rfc9112)
    Http11,
}

impl Version {
    #[inline(always)]
    pub const fn from_bytes(src: &[u8]) -> Self {
        match src {
            b"HTTP/1.1" => Self::Http11,
            b"HTTP/1.0" => Self::Http10,
            _ => Self::Unset,
        }
    }
}

// STATUS_CODE

macro_rules! set_status_codes {
    ($(
        $(#[$docs:meta])+
        $name:ident = ($num:expr, $str:expr);
    )+) => {
        /// HTTP status codes produced while ingesting a request
        ///
        /// See [RFC 9110, Section 15](https://datatracker.ietf.org/doc/html/rfc9110#section-15).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StatusCode { $(
            #[doc = concat!(stringify!($num), " ", $str)]
            $(#[$docs])+
            $name = $num,
        )+ }

        impl StatusCode {
            /// Numeric code, e.g. `417`.
            #[inline]
            pub const fn as_u16(&self) -> u16 {
                *self as u16
            }

            /// Canonical reason phrase, e.g. `"Expectation Failed"`.
            #[inline]
            pub const fn reason(&self) -> &'static str {
                match self { $(
                    StatusCode::$name => $str,
                )+ }
            }
        }
    }
}

set_status_codes! {
    /// [[RFC9110, Section 15.2.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.2.1)]
    Continue = (100, "Continue");

    /// [[RFC9110, Section 15.3.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.3.1)]
    Ok = (200, "OK");

    /// [[RFC9110, Section 15.5.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.1)]
    BadRequest = (400, "Bad Request");
    /// [[RFC9110, Section 15.5.12](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.12)]
    LengthRequired = (411, "Length Required");
    /// [[RFC9110, Section 15.5.14](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.14)]
    PayloadTooLarge = (413, "Payload Too Large");
    /// [[RFC9110, Section 15.5.18](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.18)]
    ExpectationFailed = (417, "Expectation Failed");

    /// [[RFC9110, Section 15.6.6](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.6)]
    HttpVersionNotSupported = (505, "HTTP Version Not Supported");
}
