use crate::limits::PhysicalLimits;

/// Filesystem mapping of the current request.
///
/// Filled by whatever resolves the request path against a document root;
/// this crate only owns its lifecycle. Like [`Request`](crate::Request), it is
/// built once per connection and [`reset`](Self::reset) between requests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Physical {
    /// Full filesystem path
    pub path: Vec<u8>,
    pub basedir: Vec<u8>,
    pub doc_root: Vec<u8>,
    /// Path below `doc_root`
    pub rel_path: Vec<u8>,
    /// Trailing part of the URL path past the resolved file (CGI `PATH_INFO`)
    pub pathinfo: Vec<u8>,

    /// File size, `None` until the target has been looked up
    pub size: Option<u64>,
}

impl Physical {
    #[inline]
    pub fn new(limits: &PhysicalLimits) -> Self {
        Physical {
            path: Vec::with_capacity(limits.path_size),
            basedir: Vec::with_capacity(limits.dir_size),
            doc_root: Vec::with_capacity(limits.dir_size),
            rel_path: Vec::with_capacity(limits.dir_size),
            pathinfo: Vec::with_capacity(limits.dir_size),

            size: None,
        }
    }

    /// Truncates every buffer, keeping its capacity.
    #[inline]
    pub fn reset(&mut self) {
        self.path.clear();
        self.basedir.clear();
        self.doc_root.clear();
        self.rel_path.clear();
        self.pathinfo.clear();

        self.size = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_presized() {
        let physical = Physical::new(&PhysicalLimits::default());

        assert!(physical.path.capacity() >= 512);
        assert!(physical.doc_root.capacity() >= 256);
        assert!(physical.pathinfo.capacity() >= 256);
        assert_eq!(physical, Physical::default());
    }

    #[test]
    fn reset() {
        let mut physical = Physical::new(&PhysicalLimits::default());
        physical.doc_root.extend_from_slice(b"/srv/www");
        physical.rel_path.extend_from_slice(b"/index.html");
        physical.path.extend_from_slice(b"/srv/www/index.html");
        physical.size = Some(1024);
        let capacity = physical.path.capacity();

        physical.reset();

        assert_eq!(physical, Physical::default());
        assert_eq!(physical.path.capacity(), capacity);
    }
}
