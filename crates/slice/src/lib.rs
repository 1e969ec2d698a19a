//! Byte ranges and reference counted byte buffers.
//!
//! [`Slice`] is a borrowed view of some bytes, or the absent "null" slice.
//! [`AllocSlice`] owns a single heap block holding a reference count followed
//! by the bytes themselves. Cloning an `AllocSlice` retains it and dropping it
//! releases it, the block is freed when the last handle is dropped.
//!
//! ```
//! use fleece_slice::{AllocSlice, Slice};
//!
//! let mut buf = AllocSlice::new(5);
//! buf.get_mut().unwrap().copy_from_slice(b"hello");
//! assert_eq!(buf.as_slice(), Slice::from("hello"));
//!
//! let shared = buf.clone();
//! assert_eq!(buf.refcount(), 2);
//! drop(shared);
//! assert_eq!(buf.refcount(), 1);
//! ```

mod alloc_slice;
#[cfg(feature = "detect-copies")]
mod detect;
mod hasher;
mod slice;

pub use alloc_slice::{is_heap_aligned, AllocSlice, HEAP_ALIGNMENT_MASK};
#[cfg(feature = "detect-copies")]
pub use detect::copies_detected;
pub use fleece_hash::{HashAlgorithm, HashAlgorithmError};
pub use hasher::{BuildSliceHasher, SliceHasher};
pub use slice::Slice;
