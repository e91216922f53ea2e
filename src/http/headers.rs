//! Ordered, duplicate-preserving header storage with shared ownership.
//!
//! Header lines are kept exactly as they arrived from the tokenizer: in wire
//! order, with repeated keys kept as separate entries. Lookups pick the
//! **last** occurrence of a key, while the `find_first`/`find_next` family
//! still sees every occurrence (that is what duplicate checks such as
//! "more than one `Host`" rely on).
//!
//! # Examples
//! ```
//! use h1_ingest::HeaderStore;
//!
//! let mut headers = HeaderStore::new();
//! headers.insert(b"Accept", b"text/html");
//! headers.insert(b"accept", b"application/json");
//!
//! assert_eq!(headers.lookup(b"ACCEPT").unwrap().value(), b"application/json");
//! assert_eq!(headers.occurrences(b"accept").count(), 2);
//!
//! let mut joined = Vec::new();
//! headers.get_fast_concat(b"accept", &mut joined);
//! assert_eq!(joined, b"text/html, application/json");
//! ```

use std::{ops::Deref, ops::Index, sync::Arc};
use tracing::trace;

const SEPARATOR: &[u8] = b": ";
const FOLD: &[u8] = b", ";

// HEADER ENTRY

/// One header line as it will be retransmitted.
///
/// Stored as a single `"<key>: <value>"` buffer plus the key length, so an
/// entry costs exactly one allocation and re-serializes byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeaderEntry {
    line: Vec<u8>,
    key_len: usize,
}

impl HeaderEntry {
    #[inline]
    pub(crate) fn new(key: &[u8], value: &[u8]) -> Self {
        let mut line = Vec::with_capacity(key.len() + SEPARATOR.len() + value.len());
        line.extend_from_slice(key);
        line.extend_from_slice(SEPARATOR);
        line.extend_from_slice(value);

        HeaderEntry {
            line,
            key_len: key.len(),
        }
    }

    /// Header name in its original case.
    #[inline(always)]
    pub fn key(&self) -> &[u8] {
        &self.line[..self.key_len]
    }

    /// Header value, everything after `"<key>: "`.
    #[inline(always)]
    pub fn value(&self) -> &[u8] {
        &self.line[self.key_len + SEPARATOR.len()..]
    }

    /// Header value as `&str`, if it is valid UTF-8.
    #[inline]
    pub fn value_str(&self) -> Option<&str> {
        simdutf8::basic::from_utf8(self.value()).ok()
    }

    /// The whole stored line, `"<key>: <value>"`, without a line terminator.
    #[inline(always)]
    pub fn line(&self) -> &[u8] {
        &self.line
    }

    #[inline(always)]
    fn is_key(&self, key: &[u8]) -> bool {
        self.key_len == key.len() && self.key().eq_ignore_ascii_case(key)
    }

    #[inline]
    fn fold_value(&mut self, value: &[u8]) {
        self.line.extend_from_slice(FOLD);
        self.line.extend_from_slice(value);
    }

    #[inline]
    fn rewrite(&mut self, key: &[u8], value: &[u8]) {
        self.line.clear();
        self.line.extend_from_slice(key);
        self.line.extend_from_slice(SEPARATOR);
        self.line.extend_from_slice(value);
        self.key_len = key.len();
    }
}

// HEADER CURSOR

/// Position of one entry inside a [`HeaderStore`].
///
/// Obtained from the `find_*` family. A cursor only stays valid until the
/// next structural change of the store (`insert`, `remove`, `remove_at`,
/// or an `append`/`overwrite` that had to insert).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeaderCursor(usize);

// HEADER STORE

/// Insertion-ordered header lines with ASCII case-insensitive key matching.
///
/// Mutating methods take `&mut self`; when the store is shared through
/// [`SharedHeaders`] the borrow checker only hands out `&mut` to a sole
/// owner, so a store observed by someone else is never changed in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderStore {
    entries: Vec<HeaderEntry>,
}

impl HeaderStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        HeaderStore {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Number of header lines, duplicates included.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in arrival order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, HeaderEntry> {
        self.entries.iter()
    }

    /// Entry addressed by `cursor`, `None` if the cursor is stale.
    #[inline(always)]
    pub fn get(&self, cursor: HeaderCursor) -> Option<&HeaderEntry> {
        self.entries.get(cursor.0)
    }

    #[inline(always)]
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

// Lookup
impl HeaderStore {
    /// First occurrence of `key` in arrival order.
    #[inline]
    pub fn find_first(&self, key: &[u8]) -> Option<HeaderCursor> {
        self.entries
            .iter()
            .position(|h| h.is_key(key))
            .map(HeaderCursor)
    }

    /// Next occurrence of `key` strictly after `cursor`.
    #[inline]
    pub fn find_next(&self, cursor: HeaderCursor, key: &[u8]) -> Option<HeaderCursor> {
        let start = cursor.0 + 1;
        self.entries
            .get(start..)?
            .iter()
            .position(|h| h.is_key(key))
            .map(|i| HeaderCursor(start + i))
    }

    /// Most recently inserted occurrence of `key`.
    #[inline]
    pub fn find_last(&self, key: &[u8]) -> Option<HeaderCursor> {
        self.entries
            .iter()
            .rposition(|h| h.is_key(key))
            .map(HeaderCursor)
    }

    /// Every occurrence of `key`, in arrival order.
    ///
    /// Same walk as `find_first` followed by repeated `find_next`.
    pub fn occurrences<'a>(&'a self, key: &'a [u8]) -> impl Iterator<Item = &'a HeaderEntry> + 'a {
        std::iter::successors(self.find_first(key), move |c| self.find_next(*c, key))
            .map(move |c| &self.entries[c.0])
    }

    /// Authoritative entry for `key`: the last occurrence.
    #[inline]
    pub fn lookup(&self, key: &[u8]) -> Option<&HeaderEntry> {
        self.find_last(key).map(|c| &self.entries[c.0])
    }

    /// `true` if **any** occurrence of `key` has exactly `value`
    /// (ASCII case-insensitive, whole value).
    #[inline]
    pub fn is_value(&self, key: &[u8], value: &[u8]) -> bool {
        self.occurrences(key)
            .any(|h| h.value().len() == value.len() && h.value().eq_ignore_ascii_case(value))
    }

    /// Clears `dest`, then writes every value of `key` in arrival order,
    /// joined by `", "`.
    pub fn get_fast_concat(&self, key: &[u8], dest: &mut Vec<u8>) {
        dest.clear();

        for h in self.occurrences(key) {
            if !dest.is_empty() {
                dest.extend_from_slice(FOLD);
            }
            dest.extend_from_slice(h.value());
        }
    }
}

// Mutation
impl HeaderStore {
    /// Appends a new line at the tail. Never deduplicates.
    #[inline]
    pub fn insert(&mut self, key: &[u8], value: &[u8]) {
        self.entries.push(HeaderEntry::new(key, value));
    }

    /// Folds `value` into the last occurrence of `key` as `", <value>"`,
    /// or inserts a new line if `key` is absent.
    pub fn append(&mut self, key: &[u8], value: &[u8]) {
        match self.find_last(key) {
            Some(cursor) => self.entries[cursor.0].fold_value(value),
            None => self.insert(key, value),
        }
    }

    /// Replaces the last occurrence of `key` with `key: value`, or inserts
    /// a new line if `key` is absent.
    ///
    /// Earlier duplicates stay in place. They are still visible to
    /// `find_first`/`find_next` but no longer to [`lookup`](Self::lookup).
    pub fn overwrite(&mut self, key: &[u8], value: &[u8]) {
        match self.find_last(key) {
            Some(cursor) => self.entries[cursor.0].rewrite(key, value),
            None => self.insert(key, value),
        }
    }

    /// Removes every occurrence of `key`. Returns `false` if there was none.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        let mut removed = false;
        let mut pending = self.find_first(key);

        // Locate the next occurrence before dropping the pending one,
        // then shift the found position over the removed slot.
        while let Some(cursor) = pending {
            let next = self.find_next(cursor, key);
            self.remove_at(cursor);
            removed = true;
            pending = next.map(|c| HeaderCursor(c.0 - 1));
        }

        removed
    }

    /// Removes exactly the entry at `cursor` and returns it.
    ///
    /// # Panics
    /// If `cursor` does not address an entry, i.e. it was not obtained from
    /// this store or a structural change happened since.
    #[inline]
    #[track_caller]
    pub fn remove_at(&mut self, cursor: HeaderCursor) -> HeaderEntry {
        self.entries.remove(cursor.0)
    }
}

impl Index<HeaderCursor> for HeaderStore {
    type Output = HeaderEntry;

    #[inline(always)]
    #[track_caller]
    fn index(&self, cursor: HeaderCursor) -> &HeaderEntry {
        &self.entries[cursor.0]
    }
}

impl<'a> IntoIterator for &'a HeaderStore {
    type Item = &'a HeaderEntry;
    type IntoIter = std::slice::Iter<'a, HeaderEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// SHARED HEADERS

/// Reference-counted handle to a [`HeaderStore`].
///
/// The live request holds one handle; longer-lived consumers (deferred
/// logging, an async handler finishing late) may [`acquire`](Self::acquire)
/// their own. All handles read the same store. Only a sole owner can borrow
/// it mutably, and [`try_reset`](Self::try_reset) is the way to get an
/// empty store back without disturbing other owners.
#[derive(Debug, Clone)]
pub struct SharedHeaders(Arc<HeaderStore>);

impl SharedHeaders {
    #[inline]
    pub fn new(capacity: usize) -> Self {
        SharedHeaders(Arc::new(HeaderStore::with_capacity(capacity)))
    }

    /// Takes another reference to the same store.
    #[inline(always)]
    pub fn acquire(&self) -> Self {
        SharedHeaders(Arc::clone(&self.0))
    }

    /// Gives up this reference. The store and its entries are freed with
    /// the last one.
    #[inline(always)]
    pub fn release(self) {}

    /// Number of live handles to this store.
    #[inline(always)]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Address of the shared store, stable for as long as it lives.
    #[inline(always)]
    pub fn as_ptr(&self) -> *const HeaderStore {
        Arc::as_ptr(&self.0)
    }

    /// `true` if both handles refer to the same store.
    #[inline(always)]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Mutable access, only while this is the sole handle.
    #[inline(always)]
    pub fn get_mut(&mut self) -> Option<&mut HeaderStore> {
        Arc::get_mut(&mut self.0)
    }

    /// Mutable access for the tokenizer path.
    ///
    /// A sole owner mutates in place. If the store is shared, the caller
    /// gets a private copy and the other owners keep the original.
    #[inline]
    pub fn make_mut(&mut self) -> &mut HeaderStore {
        Arc::make_mut(&mut self.0)
    }

    /// Copy-on-write reset.
    ///
    /// Drops this handle's reference. If that was the last one, the same
    /// store is cleared in place and handed back (no allocation). Otherwise
    /// the old store is left untouched for its remaining owners and a new
    /// empty store is returned.
    #[inline]
    pub fn try_reset(mut self) -> Self {
        self.reset();
        self
    }

    /// In-place form of [`try_reset`](Self::try_reset), for handles stored
    /// inside another struct.
    pub fn reset(&mut self) {
        if let Some(store) = Arc::get_mut(&mut self.0) {
            store.clear();
            return;
        }

        let capacity = self.0.entries.capacity();
        trace!(
            owners = Arc::strong_count(&self.0) - 1,
            "header store still shared, starting a fresh one"
        );
        *self = SharedHeaders::new(capacity);
    }
}

impl PartialEq for SharedHeaders {
    /// Compares the stores' contents, not their identity.
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

impl Eq for SharedHeaders {}

impl Deref for SharedHeaders {
    type Target = HeaderStore;

    #[inline(always)]
    fn deref(&self) -> &HeaderStore {
        &self.0
    }
}
