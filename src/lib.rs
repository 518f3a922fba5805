// TODO: Can we go alloc-only? CStr lives in core these days and std is barely used otherwise.

//! Binary-safe byte strings with the bookkeeping folded into the allocation.
//!
//! A [`Buf`] is a growable byte string that keeps its length, its capacity and the payload in a
//! single heap block: a compact header sits right in front of the bytes and a zero byte always
//! follows them. The handle is one pointer wide, lengths are stored rather than scanned for (so
//! zero bytes inside the payload are fine) and thanks to the terminator the contents can still
//! be handed to APIs expecting a C string.
//!
//! The header adapts to the payload. Short strings pay three bytes of overhead and the fields
//! widen as the string grows. Appending is amortised by doubling the buffer up to
//! [`MAX_PREALLOC`], past which it grows linearly.
//!
//! ```rust
//! use strand::Buf;
//!
//! fn demo() -> Result<(), strand::Error> {
//!     let mut greeting: Buf = Buf::from_slice(b"Hello")?;
//!     greeting.append(b", world!")?;
//!     assert_eq!(greeting, b"Hello, world!");
//!     assert_eq!(greeting.as_c_str().map(|c| c.to_bytes()), Some(&b"Hello, world!"[..]));
//!
//!     // Zero bytes are data here, not terminators.
//!     greeting.push(0)?;
//!     greeting.append(b"and more")?;
//!     assert_eq!(greeting.len(), 22);
//!     assert_eq!(greeting.as_c_str(), None);
//!     Ok(())
//! }
//! # demo().unwrap();
//! ```
//!
//! Allocation goes through the [`RawAlloc`] seam; the default [`SysAlloc`] is the global
//! allocator and [`TrackingAlloc`] wraps it with counters for tests and leak hunts.

mod alloc;
mod buf;
mod error;
mod header;
mod num;
mod quote;
mod text;

pub use alloc::{AllocStats, RawAlloc, SysAlloc, TrackingAlloc};
pub use buf::{Buf, MAX_PREALLOC};
pub use error::Error;
pub use header::Width;
