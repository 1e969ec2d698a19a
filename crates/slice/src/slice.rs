use std::{
    cmp::{min, Ordering},
    fmt,
    hash::{Hash, Hasher},
    ptr,
    slice::SliceIndex,
};

use fleece_hash::HashAlgorithm;

/// A borrowed, non-owning view of a byte range.
///
/// A slice is either null, meaning no data at all, or present. A present
/// slice may still be empty. Both null and empty slices have length 0 and
/// compare equal, but only the null one reports [`Slice::is_null`].
#[derive(Clone, Copy, Default)]
pub struct Slice<'a> {
    bytes: Option<&'a [u8]>,
}

impl Slice<'static> {
    pub const NULL: Slice<'static> = Slice { bytes: None };
    pub const EMPTY: Slice<'static> = Slice { bytes: Some(&[]) };
}

impl<'a> Slice<'a> {
    #[inline]
    pub const fn new(bytes: &'a [u8]) -> Slice<'a> {
        Slice { bytes: Some(bytes) }
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        self.bytes.is_none()
    }

    #[inline]
    pub const fn len(&self) -> usize {
        match self.bytes {
            Some(bytes) => bytes.len(),
            None => 0,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The viewed bytes, or `None` for the null slice
    #[inline]
    pub const fn bytes(&self) -> Option<&'a [u8]> {
        self.bytes
    }

    /// The viewed bytes, null slice views as empty
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes.unwrap_or(&[])
    }

    /// Start of the viewed range, null pointer for the null slice
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.map_or(ptr::null(), <[u8]>::as_ptr)
    }

    /// Sub-view of this slice, `None` if out of bounds or if this slice is
    /// null.
    pub fn get<I>(&self, index: I) -> Option<Slice<'a>>
    where
        I: SliceIndex<[u8], Output = [u8]>,
    {
        self.bytes?.get(index).map(Slice::new)
    }

    /// Byte equality, slices of different lengths are never equal.
    #[inline]
    pub fn equal(&self, other: &Slice<'_>) -> bool {
        self.len() == other.len() && self.as_bytes() == other.as_bytes()
    }

    /// Lexicographic byte order. If one slice is a prefix of the other, the
    /// shorter one sorts first.
    pub fn compare(&self, other: &Slice<'_>) -> Ordering {
        let (a, b) = (self.as_bytes(), other.as_bytes());
        let n = min(a.len(), b.len());
        match a[..n].cmp(&b[..n]) {
            Ordering::Equal => a.len().cmp(&b.len()),
            ord => ord,
        }
    }

    /// Copy the slice into `buffer` as a zero terminated string.
    ///
    /// At most `buffer.len() - 1` bytes are copied and a 0 byte is always
    /// written right after them. Returns `false` if the content was truncated.
    ///
    /// # Panics
    ///
    /// If `buffer` is empty.
    pub fn to_cstring(&self, buffer: &mut [u8]) -> bool {
        assert!(
            !buffer.is_empty(),
            "to_cstring requires a buffer with room for the terminator"
        );

        let bytes = self.as_bytes();
        let n = min(bytes.len(), buffer.len() - 1);
        buffer[..n].copy_from_slice(&bytes[..n]);
        buffer[n] = 0;
        n == bytes.len()
    }

    /// 32-bit hash of the bytes using [`HashAlgorithm::DEFAULT`].
    ///
    /// Named apart from [`Hash::hash`], which feeds a [`Hasher`] instead.
    #[inline]
    pub fn hash32(&self) -> u32 {
        fleece_hash::hash(self.as_bytes())
    }

    #[inline]
    pub fn hash_with(&self, algorithm: HashAlgorithm) -> u32 {
        algorithm.hash(self.as_bytes())
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.as_bytes().starts_with(prefix)
    }

    pub fn ends_with(&self, suffix: &[u8]) -> bool {
        self.as_bytes().ends_with(suffix)
    }

    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        self.as_bytes().iter().position(|b| *b == byte)
    }
}

impl<'a> PartialEq for Slice<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl<'a> Eq for Slice<'a> {}

impl<'a> PartialEq<[u8]> for Slice<'a> {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl<'a> PartialOrd for Slice<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a> Ord for Slice<'a> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

// Only the bytes, no length prefix, so a SliceHasher finishes with the same
// value as Slice::hash32
impl<'a> Hash for Slice<'a> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(self.as_bytes())
    }
}

impl<'a> AsRef<[u8]> for Slice<'a> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<'a> fmt::Debug for Slice<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bytes {
            Some(bytes) => write!(f, "Slice(\"{}\")", bytes.escape_ascii()),
            None => write!(f, "Slice(null)"),
        }
    }
}

impl<'a> From<&'a [u8]> for Slice<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Slice::new(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Slice<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Slice::new(bytes)
    }
}

impl<'a> From<&'a str> for Slice<'a> {
    fn from(s: &'a str) -> Self {
        Slice::new(s.as_bytes())
    }
}

impl<'a> From<Option<&'a [u8]>> for Slice<'a> {
    fn from(bytes: Option<&'a [u8]>) -> Self {
        Slice { bytes }
    }
}
