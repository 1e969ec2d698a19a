use std::{
    alloc::{self, Layout},
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    mem::{self, ManuallyDrop},
    ops::Deref,
    process,
    ptr::{self, NonNull},
    slice,
    sync::atomic::{self, AtomicU32, Ordering as AtomicOrdering},
};

use crate::Slice;

/// Low bits that must be clear in the content pointer of every [`AllocSlice`].
#[cfg(not(feature = "embedded"))]
pub const HEAP_ALIGNMENT_MASK: usize = 0x07;
#[cfg(feature = "embedded")]
pub const HEAP_ALIGNMENT_MASK: usize = 0x03;

/// Refcount above which retaining aborts, guards against overflow
const MAX_REFCOUNT: u32 = i32::MAX as u32;

/// Control block, the content bytes follow it in the same allocation.
#[cfg_attr(not(feature = "embedded"), repr(C, align(8)))]
#[cfg_attr(feature = "embedded", repr(C, align(4)))]
struct Header {
    refcount: AtomicU32,
    len: usize,
}

const HEADER_SIZE: usize = mem::size_of::<Header>();
const _: () = assert!(HEADER_SIZE & HEAP_ALIGNMENT_MASK == 0);
const _: () = assert!(mem::align_of::<Header>() > HEAP_ALIGNMENT_MASK);

impl Header {
    #[inline]
    fn retain(&self) {
        debug_assert!(is_heap_aligned(self as *const Header as *const u8));
        let old = self.refcount.fetch_add(1, AtomicOrdering::Relaxed);
        if old > MAX_REFCOUNT {
            process::abort();
        }
    }
}

/// Returns true if `ptr` satisfies the alignment every [`AllocSlice`] content
/// pointer has. Anything else can not have come from an `AllocSlice`.
#[inline]
pub fn is_heap_aligned(ptr: *const u8) -> bool {
    ptr as usize & HEAP_ALIGNMENT_MASK == 0
}

fn layout(len: usize) -> Option<Layout> {
    let size = HEADER_SIZE.checked_add(len)?;
    Layout::from_size_align(size, mem::align_of::<Header>()).ok()
}

/// # Safety
/// `header` must point to a live block
#[inline]
unsafe fn content(header: NonNull<Header>) -> *mut u8 {
    (header.as_ptr() as *mut u8).add(HEADER_SIZE)
}

/// # Safety
/// `ptr` must be null or a content pointer of a live block
unsafe fn header_of(ptr: *const u8) -> Option<NonNull<Header>> {
    if ptr.is_null() {
        return None;
    }

    debug_assert!(
        is_heap_aligned(ptr),
        "{ptr:p} is not aligned, it is not an AllocSlice"
    );
    #[cfg(feature = "detect-copies")]
    debug_assert!(
        crate::detect::is_live(ptr),
        "{ptr:p} is not a live AllocSlice"
    );
    NonNull::new(ptr.sub(HEADER_SIZE) as *mut Header)
}

/// Drop one share, frees the block if it was the last one.
///
/// # Safety
/// `header` must point to a live block and the caller must own the share.
unsafe fn release(header: NonNull<Header>) {
    debug_assert!(is_heap_aligned(header.as_ptr() as *const u8));
    if header.as_ref().refcount.fetch_sub(1, AtomicOrdering::Release) != 1 {
        return;
    }

    // Synchronize with the releases of other threads before freeing
    atomic::fence(AtomicOrdering::Acquire);
    let len = header.as_ref().len;

    #[cfg(feature = "detect-copies")]
    crate::detect::unregister(content(header));

    // Same layout was valid when the block was allocated
    let layout = Layout::from_size_align_unchecked(HEADER_SIZE + len, mem::align_of::<Header>());
    alloc::dealloc(header.as_ptr() as *mut u8, layout);
}

/// Reference counted, heap allocated bytes.
///
/// The reference count and the content share a single allocation. Clone
/// retains the buffer and drop releases it; the memory is freed when the last
/// handle is dropped.
///
/// An `AllocSlice` can also be null. Null is what [`AllocSlice::new`] and
/// [`AllocSlice::copy_from`] return when allocation fails, so check
/// [`AllocSlice::is_null`] where that matters.
///
/// Contents are not synchronized between handles. Mutable access is only
/// given out through [`AllocSlice::get_mut`] to a handle that is the only
/// owner.
pub struct AllocSlice {
    header: Option<NonNull<Header>>,
}

// SAFETY: the refcount is atomic and content is only mutated through a unique
// handle.
unsafe impl Send for AllocSlice {}
unsafe impl Sync for AllocSlice {}

impl AllocSlice {
    pub const fn null() -> AllocSlice {
        AllocSlice { header: None }
    }

    /// Allocate a zero filled buffer of `size` bytes with a refcount of 1.
    ///
    /// Returns a null `AllocSlice` if the allocation fails.
    pub fn new(size: usize) -> AllocSlice {
        AllocSlice {
            header: Self::allocate(size),
        }
    }

    /// Copy the bytes of `source` into a new buffer.
    ///
    /// Copying a null slice, or failing to allocate, returns a null
    /// `AllocSlice`.
    pub fn copy_from(source: Slice<'_>) -> AllocSlice {
        let bytes = match source.bytes() {
            Some(bytes) => bytes,
            None => return AllocSlice::null(),
        };

        #[cfg(feature = "detect-copies")]
        crate::detect::check_copy(bytes);

        match Self::allocate(bytes.len()) {
            Some(header) => {
                // SAFETY: block was just allocated with room for bytes.len()
                unsafe {
                    ptr::copy_nonoverlapping(bytes.as_ptr(), content(header), bytes.len());
                }
                AllocSlice {
                    header: Some(header),
                }
            }
            None => AllocSlice::null(),
        }
    }

    fn allocate(len: usize) -> Option<NonNull<Header>> {
        let layout = match layout(len) {
            Some(layout) => layout,
            None => {
                log::debug!("AllocSlice of {len} bytes exceeds the maximum allocation size");
                return None;
            }
        };

        // SAFETY: layout size is never zero, it always contains the header
        let ptr = unsafe { alloc::alloc_zeroed(layout) } as *mut Header;
        let header = match NonNull::new(ptr) {
            Some(header) => header,
            None => {
                log::debug!("Failed to allocate AllocSlice of {len} bytes");
                return None;
            }
        };

        // SAFETY: ptr is valid for writes and aligned for Header
        unsafe {
            header.as_ptr().write(Header {
                refcount: AtomicU32::new(1),
                len,
            });
        }

        #[cfg(feature = "detect-copies")]
        crate::detect::register(unsafe { content(header) }, len);

        Some(header)
    }

    #[inline]
    fn header(&self) -> Option<&Header> {
        // SAFETY: the block lives at least as long as this handle
        self.header.map(|header| unsafe { &*header.as_ptr() })
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.header.is_none()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.header().map_or(0, |header| header.len)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current number of owners, 0 for a null `AllocSlice`.
    pub fn refcount(&self) -> u32 {
        self.header()
            .map_or(0, |header| header.refcount.load(AtomicOrdering::Acquire))
    }

    /// Content pointer, null for a null `AllocSlice`
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        match self.header {
            // SAFETY: the block lives at least as long as this handle
            Some(header) => unsafe { content(header) },
            None => ptr::null(),
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self.header {
            // SAFETY: content is initialized and lives as long as self
            Some(header) => unsafe { slice::from_raw_parts(content(header), self.len()) },
            None => &[],
        }
    }

    /// View of the content. A null `AllocSlice` gives the null slice.
    #[inline]
    pub fn as_slice(&self) -> Slice<'_> {
        if self.is_null() {
            Slice::NULL
        } else {
            Slice::new(self.as_bytes())
        }
    }

    /// Mutable access to the content if this handle is the only owner.
    pub fn get_mut(&mut self) -> Option<&mut [u8]> {
        let header = self.header?;
        let len = self.len();
        if self.refcount() != 1 {
            return None;
        }

        // SAFETY: refcount is 1 and we hold &mut self, no other handle can
        // observe the content
        Some(unsafe { slice::from_raw_parts_mut(content(header), len) })
    }

    /// Give up this handle without releasing it and return the content
    /// pointer. The share must be given back with [`AllocSlice::from_raw`] or
    /// [`AllocSlice::release_raw`].
    pub fn into_raw(self) -> *const u8 {
        let this = ManuallyDrop::new(self);
        this.as_ptr()
    }

    /// Take ownership of a share given up with [`AllocSlice::into_raw`].
    ///
    /// # Safety
    ///
    /// `ptr` must be null or come from [`AllocSlice::into_raw`], and the caller
    /// must own the share it represents.
    pub unsafe fn from_raw(ptr: *const u8) -> AllocSlice {
        AllocSlice {
            header: header_of(ptr),
        }
    }

    /// Retain the buffer whose content starts at `ptr`. Null is ignored.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or the content pointer of a live `AllocSlice`.
    pub unsafe fn retain_raw(ptr: *const u8) {
        if let Some(header) = header_of(ptr) {
            header.as_ref().retain();
        }
    }

    /// Release the buffer whose content starts at `ptr`. Null is ignored.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or the content pointer of a live `AllocSlice` and the
    /// caller must own one share of it.
    pub unsafe fn release_raw(ptr: *const u8) {
        if let Some(header) = header_of(ptr) {
            release(header);
        }
    }
}

impl Clone for AllocSlice {
    fn clone(&self) -> Self {
        if let Some(header) = self.header() {
            header.retain();
        }

        AllocSlice {
            header: self.header,
        }
    }
}

impl Drop for AllocSlice {
    fn drop(&mut self) {
        if let Some(header) = self.header.take() {
            // SAFETY: this handle owns one share
            unsafe { release(header) }
        }
    }
}

impl Default for AllocSlice {
    fn default() -> Self {
        AllocSlice::null()
    }
}

impl Deref for AllocSlice {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for AllocSlice {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq for AllocSlice {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice().equal(&other.as_slice())
    }
}

impl Eq for AllocSlice {}

impl<'a> PartialEq<Slice<'a>> for AllocSlice {
    fn eq(&self, other: &Slice<'a>) -> bool {
        self.as_slice().equal(other)
    }
}

impl PartialOrd for AllocSlice {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AllocSlice {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().compare(&other.as_slice())
    }
}

impl Hash for AllocSlice {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Hash::hash(&self.as_slice(), state)
    }
}

impl fmt::Debug for AllocSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocSlice")
            .field("content", &self.as_slice())
            .field("refcount", &self.refcount())
            .finish()
    }
}

impl<'a> From<Slice<'a>> for AllocSlice {
    fn from(slice: Slice<'a>) -> Self {
        AllocSlice::copy_from(slice)
    }
}

impl From<&[u8]> for AllocSlice {
    fn from(bytes: &[u8]) -> Self {
        AllocSlice::copy_from(Slice::new(bytes))
    }
}

impl From<&str> for AllocSlice {
    fn from(s: &str) -> Self {
        AllocSlice::copy_from(Slice::from(s))
    }
}

impl From<Vec<u8>> for AllocSlice {
    fn from(vec: Vec<u8>) -> Self {
        AllocSlice::copy_from(Slice::new(&vec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello() {
        let mut buf = AllocSlice::new(5);
        buf.get_mut().unwrap().copy_from_slice(b"hello");
        assert!(buf.as_slice().equal(&Slice::from("hello")));
        assert_eq!(buf.refcount(), 1);
    }

    #[test]
    fn new_is_zeroed() {
        let buf = AllocSlice::new(64);
        assert_eq!(buf.len(), 64);
        assert!(buf.iter().all(|b| *b == 0));
    }

    #[test]
    fn zero_size() {
        let buf = AllocSlice::new(0);
        assert!(!buf.is_null());
        assert!(buf.is_empty());
        assert!(!buf.as_slice().is_null());
        assert_eq!(buf.refcount(), 1);
    }

    #[test]
    fn content_is_aligned() {
        for size in [0, 1, 3, 7, 8, 13, 100] {
            let buf = AllocSlice::new(size);
            assert!(is_heap_aligned(buf.as_ptr()));
        }
    }

    #[test]
    fn allocation_failure_is_null() {
        let buf = AllocSlice::new(usize::MAX);
        assert!(buf.is_null());
        assert_eq!(buf.refcount(), 0);
        assert!(buf.as_slice().is_null());
        assert!(buf.as_ptr().is_null());

        // Null handles can be cloned and dropped freely
        let other = buf.clone();
        drop(buf);
        assert!(other.is_null());
    }

    #[test]
    fn copy_from_null() {
        assert!(AllocSlice::copy_from(Slice::NULL).is_null());
        assert!(!AllocSlice::copy_from(Slice::EMPTY).is_null());
    }

    #[test]
    fn copy_is_distinct() {
        let mut orig = AllocSlice::new(4);
        orig.get_mut().unwrap().copy_from_slice(&[1, 2, 3, 4]);

        let copy = AllocSlice::copy_from(orig.as_slice());
        assert_eq!(copy, orig);
        assert_ne!(copy.as_ptr(), orig.as_ptr());
        assert_eq!(orig.refcount(), 1);
        assert_eq!(copy.refcount(), 1);
    }

    #[test]
    fn clone_shares_content() {
        let buf = AllocSlice::from("shared");
        let other = buf.clone();
        assert_eq!(buf.as_ptr(), other.as_ptr());
        assert_eq!(buf.refcount(), 2);
        drop(other);
        assert_eq!(buf.refcount(), 1);
    }

    #[test]
    fn get_mut_requires_unique() {
        let mut buf = AllocSlice::from("abc");
        let other = buf.clone();
        assert!(buf.get_mut().is_none());
        drop(other);
        assert!(buf.get_mut().is_some());
        assert!(AllocSlice::null().get_mut().is_none());
    }

    #[test]
    fn bounds_checked_access() {
        let buf = AllocSlice::from("hello");
        assert_eq!(buf.get(1..3), Some(&b"el"[..]));
        assert_eq!(buf.get(4..9), None);
        assert_eq!(buf.get(5), None);
    }

    #[test]
    fn raw_round_trip() {
        let buf = AllocSlice::from("raw");
        let keep = buf.clone();
        let ptr = buf.into_raw();
        assert_eq!(keep.refcount(), 2);

        unsafe {
            AllocSlice::retain_raw(ptr);
            assert_eq!(keep.refcount(), 3);
            AllocSlice::release_raw(ptr);
            assert_eq!(keep.refcount(), 2);

            let back = AllocSlice::from_raw(ptr);
            assert_eq!(back.as_bytes(), b"raw");
            drop(back);
        }
        assert_eq!(keep.refcount(), 1);
    }

    #[test]
    fn raw_null_is_ignored() {
        unsafe {
            AllocSlice::retain_raw(ptr::null());
            AllocSlice::release_raw(ptr::null());
            assert!(AllocSlice::from_raw(ptr::null()).is_null());
        }
        assert!(AllocSlice::null().into_raw().is_null());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn raw_misaligned_pointer() {
        let buf = AllocSlice::from("aligned");
        unsafe { AllocSlice::retain_raw(buf.as_ptr().add(1)) }
    }

    #[test]
    fn ordering_and_equality() {
        let a = AllocSlice::from("abc");
        let b = AllocSlice::from("abcd");
        assert!(a < b);
        assert_eq!(a, Slice::from("abc"));
        assert_eq!(AllocSlice::null(), AllocSlice::from(""));
    }

    #[test]
    fn debug() {
        let buf = AllocSlice::from("x");
        assert_eq!(
            format!("{buf:?}"),
            "AllocSlice { content: Slice(\"x\"), refcount: 1 }"
        );
    }
}
