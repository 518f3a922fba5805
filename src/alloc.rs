//! The allocation seam.
//!
//! Every byte of payload memory flows through a [`RawAlloc`]. The default
//! [`SysAlloc`] just forwards to [`std::alloc`]; [`TrackingAlloc`] adds
//! bookkeeping so tests (and the occasional leak hunt) can watch the traffic.

use std::alloc::{self, Layout};
use std::sync::atomic::{AtomicUsize, Ordering};

use log::trace;

/// Source of the buffers' heap memory.
///
/// A zero-sized strategy the buffer type is generic over; the functions are
/// associated so an allocator costs nothing to carry around.
///
/// # Safety
///
/// Implementations must behave like [`std::alloc::GlobalAlloc`]:
/// [`alloc`][RawAlloc::alloc] returns null or a block valid for
/// `layout.size()` bytes, [`realloc`][RawAlloc::realloc] preserves the common
/// prefix and leaves the original block valid when it fails, and
/// [`free`][RawAlloc::free] accepts exactly the blocks (with the layouts)
/// the other two handed out.
pub unsafe trait RawAlloc {
    /// Allocates a fresh block, null on failure.
    ///
    /// # Safety
    ///
    /// `layout` must have a non-zero size.
    unsafe fn alloc(layout: Layout) -> *mut u8;

    /// Resizes `ptr` to `new_size` bytes, null on failure (the original block
    /// is then still valid and unchanged).
    ///
    /// # Safety
    ///
    /// `ptr` must have come from this allocator with `layout`, and `new_size`
    /// must be non-zero.
    unsafe fn realloc(ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8;

    /// Returns a block to the allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must have come from this allocator with `layout`.
    unsafe fn free(ptr: *mut u8, layout: Layout);
}

/// The default passthrough to [`std::alloc`].
#[derive(Copy, Clone, Debug, Default)]
pub struct SysAlloc;

unsafe impl RawAlloc for SysAlloc {
    #[inline]
    unsafe fn alloc(layout: Layout) -> *mut u8 {
        alloc::alloc(layout)
    }

    #[inline]
    unsafe fn realloc(ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        alloc::realloc(ptr, layout, new_size)
    }

    #[inline]
    unsafe fn free(ptr: *mut u8, layout: Layout) {
        alloc::dealloc(ptr, layout)
    }
}

static OUTSTANDING: AtomicUsize = AtomicUsize::new(0);
static ALLOCS: AtomicUsize = AtomicUsize::new(0);
static REALLOCS: AtomicUsize = AtomicUsize::new(0);
static FREES: AtomicUsize = AtomicUsize::new(0);

/// One snapshot of [`TrackingAlloc`]'s counters.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct AllocStats {
    /// Bytes currently held.
    pub outstanding: usize,
    /// Fresh blocks handed out.
    pub allocs: usize,
    /// Resizes.
    pub reallocs: usize,
    /// Blocks returned.
    pub frees: usize,
}

/// [`SysAlloc`] with bookkeeping, mostly for leak checks in tests.
///
/// The counters are process-global (the type is zero-sized, there is nowhere
/// else to put them), so tests reading them must not run in parallel with
/// other users of this allocator. Every call also emits a `trace!` line for
/// the really desperate debugging sessions.
#[derive(Copy, Clone, Debug, Default)]
pub struct TrackingAlloc;

impl TrackingAlloc {
    /// Bytes allocated through this allocator and not yet freed.
    pub fn outstanding() -> usize {
        OUTSTANDING.load(Ordering::Relaxed)
    }

    /// A snapshot of all the counters.
    pub fn stats() -> AllocStats {
        AllocStats {
            outstanding: OUTSTANDING.load(Ordering::Relaxed),
            allocs: ALLOCS.load(Ordering::Relaxed),
            reallocs: REALLOCS.load(Ordering::Relaxed),
            frees: FREES.load(Ordering::Relaxed),
        }
    }
}

unsafe impl RawAlloc for TrackingAlloc {
    unsafe fn alloc(layout: Layout) -> *mut u8 {
        let ptr = SysAlloc::alloc(layout);
        if !ptr.is_null() {
            OUTSTANDING.fetch_add(layout.size(), Ordering::Relaxed);
            ALLOCS.fetch_add(1, Ordering::Relaxed);
            trace!("alloc {} B -> {:p}", layout.size(), ptr);
        }
        ptr
    }

    unsafe fn realloc(ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let moved = SysAlloc::realloc(ptr, layout, new_size);
        if !moved.is_null() {
            OUTSTANDING.fetch_add(new_size, Ordering::Relaxed);
            OUTSTANDING.fetch_sub(layout.size(), Ordering::Relaxed);
            REALLOCS.fetch_add(1, Ordering::Relaxed);
            trace!(
                "realloc {:p} {} B -> {:p} {} B",
                ptr,
                layout.size(),
                moved,
                new_size,
            );
        }
        moved
    }

    unsafe fn free(ptr: *mut u8, layout: Layout) {
        SysAlloc::free(ptr, layout);
        OUTSTANDING.fetch_sub(layout.size(), Ordering::Relaxed);
        FREES.fetch_add(1, Ordering::Relaxed);
        trace!("free {:p} {} B", ptr, layout.size());
    }
}
