//! Copy detection.
//!
//! Keeps a side table of the content ranges of every live [`AllocSlice`] so
//! that [`AllocSlice::copy_from`] can tell when it is asked to copy bytes that
//! already belong to a buffer. Retaining that buffer would have avoided the
//! allocation. Lookups only compare addresses, the source bytes are never read.
//!
//! Every allocation and free takes a global lock, use for diagnostics only.
//!
//! [`AllocSlice`]: crate::AllocSlice
//! [`AllocSlice::copy_from`]: crate::AllocSlice::copy_from

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

/// Content start address => content length
static LIVE: Mutex<BTreeMap<usize, usize>> = Mutex::new(BTreeMap::new());
static DETECTED: AtomicUsize = AtomicUsize::new(0);

fn live() -> MutexGuard<'static, BTreeMap<usize, usize>> {
    LIVE.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn register(start: *const u8, len: usize) {
    live().insert(start as usize, len);
}

pub(crate) fn unregister(start: *const u8) {
    live().remove(&(start as usize));
}

/// Returns true if `start` is the content pointer of a live buffer.
pub(crate) fn is_live(start: *const u8) -> bool {
    live().contains_key(&(start as usize))
}

/// Returns the start of the live buffer containing `bytes`, if any. Empty
/// ranges own no bytes and are never reported.
pub(crate) fn owner_of(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() {
        return None;
    }

    let addr = bytes.as_ptr() as usize;
    let map = live();
    let (start, len) = map.range(..=addr).next_back()?;
    let end = addr.checked_add(bytes.len())?;
    (end <= start + len).then_some(*start)
}

pub(crate) fn check_copy(bytes: &[u8]) {
    if let Some(start) = owner_of(bytes) {
        DETECTED.fetch_add(1, Ordering::Relaxed);
        log::warn!(
            "Copying {} bytes at {:p} that belong to the AllocSlice at {:#x}, retain it instead",
            bytes.len(),
            bytes.as_ptr(),
            start,
        );
    }
}

/// Number of copies of already allocated bytes seen by
/// [`AllocSlice::copy_from`](crate::AllocSlice::copy_from).
pub fn copies_detected() -> usize {
    DETECTED.load(Ordering::Relaxed)
}
