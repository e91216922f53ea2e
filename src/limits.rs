//! Buffer pre-sizing for per-connection request state
//!
//! A connection allocates its [`Request`](crate::Request) and
//! [`Physical`](crate::Physical) once, sized from these limits, and then only
//! truncates them between pipelined requests. Limits are *initial capacities*,
//! not hard caps: a longer URI or more header lines still fit, they just cost
//! a reallocation on that connection.
//!
//! # Examples
//!
//! ```
//! use h1_ingest::{limits::ReqLimits, Request};
//!
//! let limits = ReqLimits {
//!     header_count: 32, // Proxies forwarding many `x-` headers
//!     ..ReqLimits::default()
//! };
//! let request = Request::new(&limits);
//! assert_eq!(request.content_length(), None);
//! ```

/// Initial capacities of the [`Request`](crate::Request) buffers
///
/// # Memory Consumption (Default Values)
///
/// | Buffer | Field | Size |
/// |--------|-------|------|
/// | Method token | `method_size` | 16 B |
/// | Raw URI + path | `uri_size` × 2 | 512 B |
/// | Authority + host | `host_size` × 2 | 128 B |
/// | Scheme + query | `uri_size / 2` + 8 | 136 B |
/// | Header slots | `header_count` × entry | 16 entries |
///
/// Header lines themselves are allocated per entry (one allocation each).
#[derive(Debug, Clone)]
pub struct ReqLimits {
    /// Capacity of the verbatim method token (default: `16 B`)
    pub method_size: usize,
    /// Capacity of the raw URI and the decoded path (default: `256 B`)
    pub uri_size: usize,
    /// Capacity of the authority and host buffers (default: `64 B`)
    pub host_size: usize,
    /// Number of header entries reserved in a fresh store (default: `16`)
    ///
    /// Typical browsers send 10-12 headers.
    pub header_count: usize,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ReqLimits {
    fn default() -> Self {
        Self {
            method_size: 16, // Longest standard token is `OPTIONS`/`CONNECT`
            uri_size: 256,
            host_size: 64,
            header_count: 16,

            _priv: (),
        }
    }
}

/// Initial capacities of the [`Physical`](crate::Physical) path buffers
#[derive(Debug, Clone)]
pub struct PhysicalLimits {
    /// Capacity of the full filesystem path (default: `512 B`)
    pub path_size: usize,
    /// Capacity of base directory, document root, relative path and
    /// path-info (default: `256 B`)
    pub dir_size: usize,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for PhysicalLimits {
    fn default() -> Self {
        Self {
            path_size: 512,
            dir_size: 256,

            _priv: (),
        }
    }
}
