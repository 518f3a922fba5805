use std::borrow::Borrow;
use std::cmp::Ordering;
use std::ffi::CStr;
use std::fmt::{self, Debug, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

use crate::alloc::{RawAlloc, SysAlloc};
use crate::error::Error;
use crate::header::{self, Width};
use crate::quote;

// We want to have the null pointer optimisation but we also don't want to allocate for empty
// buffers. That means we need some pointer that denotes an empty buffer that we recognize and
// won't ever be returned from the allocator, but is not Null. So we simply get this pointer.
//
// As a bonus the sentinel byte is zero, so it doubles as the terminator of the empty payload.
static ZERO_SENTINEL: u8 = 0;

/// The ceiling of the preallocation strategy.
///
/// Growing buffers double in size until they reach this many bytes; past that they grow by this
/// many bytes at a time.
pub const MAX_PREALLOC: usize = 1024 * 1024;

/// A binary-safe dynamic byte string.
///
/// The whole thing lives in a single allocation. A small header (length, capacity, a flags byte)
/// sits directly in front of the payload and the payload is always followed by a zero byte, so
/// the buffer can be handed to C APIs expecting a terminated string while still being allowed to
/// contain zero bytes itself. The handle is just one pointer.
///
/// The header fields come in four widths and a buffer starts with the smallest one that fits;
/// growing past a width's range moves the contents under a wider header. Shrinking never narrows
/// the header, except for [`shrink_to_fit`][Buf::shrink_to_fit], which may repack.
///
/// All the reading goes through `Deref<Target = [u8]>`, so the whole `&[u8]` API is available on
/// a `Buf` directly.
pub struct Buf<A = SysAlloc>
where
    A: RawAlloc,
{
    base: NonNull<u8>,
    _alloc: PhantomData<A>,
}

impl<A> Buf<A>
where
    A: RawAlloc,
{
    #[inline]
    fn sentinel() -> NonNull<u8> {
        NonNull::new(&ZERO_SENTINEL as *const u8 as *mut u8).expect("A static is never null")
    }

    #[inline]
    fn is_sentinel(&self) -> bool {
        ptr::eq(self.base.as_ptr(), &ZERO_SENTINEL)
    }

    #[inline]
    fn width_raw(&self) -> Width {
        if self.is_sentinel() {
            return Width::W8;
        }
        unsafe { Width::from_flags(self.base.as_ptr().read()) }
    }

    // Never call on the sentinel; even the pointer arithmetic would be out of bounds there.
    #[inline]
    fn payload(&self) -> *mut u8 {
        debug_assert!(!self.is_sentinel());
        unsafe { self.base.as_ptr().add(self.width_raw().header_size()) }
    }

    /// Stamps a new payload length and keeps the derived state (the free-space hint and the
    /// terminator) in sync.
    ///
    /// # Safety
    ///
    /// Must not be the sentinel. `len` must not exceed the capacity and the first `len` payload
    /// bytes must be initialized.
    unsafe fn commit_len(&mut self, len: usize) {
        debug_assert!(!self.is_sentinel());
        debug_assert!(len <= self.capacity());
        let width = self.width_raw();
        let base = self.base.as_ptr();
        header::write_len(base, width, len);
        header::write_flags(base, width, self.capacity() - len);
        self.payload().add(len).write(0);
    }

    /// Moves the contents into a fresh allocation of `new_cap` payload bytes under a `new_width`
    /// header and releases the old block.
    ///
    /// The new block is secured before the old one is touched, so a failure leaves the buffer
    /// exactly as it was.
    fn relocate(&mut self, new_width: Width, new_cap: usize) -> Result<(), Error> {
        let len = self.len();
        debug_assert!(new_cap >= len);
        let layout = header::layout_for(new_width, new_cap)?;
        let fresh = unsafe { A::alloc(layout) };
        let fresh = match NonNull::new(fresh) {
            Some(fresh) => fresh,
            None => return Err(Error::Alloc { size: layout.size() }),
        };
        unsafe {
            header::write_len(fresh.as_ptr(), new_width, len);
            header::write_cap(fresh.as_ptr(), new_width, new_cap);
            header::write_flags(fresh.as_ptr(), new_width, new_cap - len);
            let payload = fresh.as_ptr().add(new_width.header_size());
            if self.is_sentinel() {
                payload.write(0);
            } else {
                // The payload plus its terminator in one go.
                ptr::copy_nonoverlapping(self.payload(), payload, len + 1);
                let old_layout = header::layout_for(self.width_raw(), self.capacity())
                    .expect("Already had this layout");
                A::free(self.base.as_ptr(), old_layout);
            }
        }
        self.base = fresh;
        Ok(())
    }

    /// Resizes the allocation to `new_cap` payload bytes, keeping the contents.
    fn realloc_to(&mut self, new_cap: usize) -> Result<(), Error> {
        debug_assert!(new_cap >= self.len());
        let new_width = Width::for_len(new_cap);
        if self.is_sentinel() {
            return self.relocate(new_width, new_cap);
        }
        let old_width = self.width_raw();
        if new_width > old_width {
            // The header grows, which shifts the payload, so realloc in place can't work.
            return self.relocate(new_width, new_cap);
        }
        // Headers never narrow here; moving the payload backwards inside the block would cost
        // more than the one or two field bytes it saves.
        let width = old_width;
        let old_layout = header::layout_for(width, self.capacity())
            .expect("Already had this layout");
        let new_layout = header::layout_for(width, new_cap)?;
        let moved = unsafe { A::realloc(self.base.as_ptr(), old_layout, new_layout.size()) };
        let moved = match NonNull::new(moved) {
            Some(moved) => moved,
            None => return Err(Error::Alloc { size: new_layout.size() }),
        };
        self.base = moved;
        unsafe {
            header::write_cap(moved.as_ptr(), width, new_cap);
            let len = header::read_len(moved.as_ptr(), width);
            header::write_flags(moved.as_ptr(), width, new_cap - len);
        }
        Ok(())
    }

    /// Creates an empty buffer.
    ///
    /// This doesn't allocate; all empty buffers point at the same sentinel byte until they first
    /// grow.
    pub fn new() -> Self {
        Self {
            base: Self::sentinel(),
            _alloc: PhantomData,
        }
    }

    /// Creates a buffer holding a copy of `src`, with no spare capacity.
    pub fn from_slice(src: &[u8]) -> Result<Self, Error> {
        if src.is_empty() {
            // Use the sentinel thing
            return Ok(Self::new());
        }

        let mut buf = Self::new();
        buf.relocate(Width::for_len(src.len()), src.len())?;
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), buf.payload(), src.len());
            buf.commit_len(src.len());
        }
        Ok(buf)
    }

    /// Length of the payload, in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        if self.is_sentinel() {
            return 0;
        }

        unsafe { header::read_len(self.base.as_ptr(), self.width_raw()) }
    }

    /// Checks whether there is no payload.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Payload bytes the current allocation can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        if self.is_sentinel() {
            return 0;
        }

        unsafe { header::read_cap(self.base.as_ptr(), self.width_raw()) }
    }

    /// Bytes that can be appended without reallocating.
    ///
    /// Small amounts come straight from the hint in the flags byte; once the spare space
    /// outgrows the hint's range this falls back to the full header fields.
    #[inline]
    pub fn available(&self) -> usize {
        if self.is_sentinel() {
            return 0;
        }

        let hint = header::hint_from_flags(unsafe { self.base.as_ptr().read() });
        if hint < header::HINT_MAX {
            return hint as usize;
        }
        self.capacity() - self.len()
    }

    /// Total footprint of the allocation: header, capacity and terminator.
    pub fn alloc_size(&self) -> usize {
        if self.is_sentinel() {
            return 0;
        }

        self.width_raw().header_size() + self.capacity() + 1
    }

    /// Width of the header fields currently in use.
    pub fn width(&self) -> Width {
        self.width_raw()
    }

    /// The payload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        if self.is_sentinel() {
            return &[];
        }

        unsafe { slice::from_raw_parts(self.payload(), self.len()) }
    }

    /// Mutable view of the payload.
    ///
    /// The header and the terminator are not part of it, so no amount of in-place editing can
    /// corrupt the bookkeeping.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        if self.is_sentinel() {
            return &mut [];
        }

        let len = self.len();
        unsafe { slice::from_raw_parts_mut(self.payload(), len) }
    }

    /// The payload including the terminating zero byte.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        if self.is_sentinel() {
            return slice::from_ref(&ZERO_SENTINEL);
        }

        unsafe { slice::from_raw_parts(self.payload(), self.len() + 1) }
    }

    /// The payload as a C string, unless interior zero bytes make that impossible.
    pub fn as_c_str(&self) -> Option<&CStr> {
        CStr::from_bytes_with_nul(self.as_bytes_with_nul()).ok()
    }

    /// Raw pointer to the payload.
    ///
    /// Valid for `len() + 1` bytes of reading (the terminator is always there), even for an
    /// empty buffer.
    pub fn as_ptr(&self) -> *const u8 {
        if self.is_sentinel() {
            return &ZERO_SENTINEL;
        }

        self.payload()
    }

    /// Makes sure at least `additional` bytes can be appended without another allocation.
    ///
    /// Asking for room that is already there is free. Everything else goes through the usual
    /// amortisation scheme: the buffer doubles while it is small and grows by [`MAX_PREALLOC`]
    /// at a time once doubling would get silly.
    pub fn reserve(&mut self, additional: usize) -> Result<(), Error> {
        if self.available() >= additional {
            return Ok(());
        }

        let target = self.len().checked_add(additional).ok_or(Error::TooLong)?;
        let padded = if target < MAX_PREALLOC {
            target * 2
        } else {
            target.checked_add(MAX_PREALLOC).ok_or(Error::TooLong)?
        };
        self.realloc_to(padded)
    }

    /// Gives the spare capacity back to the allocator.
    ///
    /// The header keeps its width unless the payload fits the smallest one again; saving one or
    /// two field bytes is not worth moving the whole payload for.
    pub fn shrink_to_fit(&mut self) -> Result<(), Error> {
        let len = self.len();
        if self.is_sentinel() || self.capacity() == len {
            return Ok(());
        }

        let tight = Width::for_len(len);
        if tight == Width::W8 && self.width_raw() != Width::W8 {
            return self.relocate(tight, len);
        }
        self.realloc_to(len)
    }

    /// Extends the payload to `new_len` bytes, filling the new tail with zeroes.
    ///
    /// A `new_len` at or below the current length leaves the buffer alone.
    pub fn grow_zeroed(&mut self, new_len: usize) -> Result<(), Error> {
        let len = self.len();
        if new_len <= len {
            return Ok(());
        }

        self.reserve(new_len - len)?;
        unsafe {
            self.payload().add(len).write_bytes(0, new_len - len);
            self.commit_len(new_len);
        }
        Ok(())
    }

    /// Cuts the payload down to `new_len` bytes. Longer requests are a no-op.
    ///
    /// The spare capacity stays with the buffer.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len() {
            return;
        }

        unsafe { self.commit_len(new_len) }
    }

    /// Empties the buffer, keeping the allocation around for reuse.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Appends a copy of `data` after the current payload.
    pub fn append(&mut self, data: &[u8]) -> Result<(), Error> {
        if data.is_empty() {
            return Ok(());
        }

        self.reserve(data.len())?;
        let len = self.len();
        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr(), self.payload().add(len), data.len());
            self.commit_len(len + data.len());
        }
        Ok(())
    }

    /// Appends a single byte.
    pub fn push(&mut self, byte: u8) -> Result<(), Error> {
        self.reserve(1)?;
        let len = self.len();
        unsafe {
            self.payload().add(len).write(byte);
            self.commit_len(len + 1);
        }
        Ok(())
    }

    /// Replaces the whole payload with a copy of `data`.
    pub fn set(&mut self, data: &[u8]) -> Result<(), Error> {
        if self.capacity() < data.len() {
            self.reserve(data.len() - self.len())?;
        }
        if data.is_empty() {
            self.clear();
            return Ok(());
        }

        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr(), self.payload(), data.len());
            self.commit_len(data.len());
        }
        Ok(())
    }

    /// Appends formatted text.
    ///
    /// Like `write!`, except the buffer's own errors come through instead of being squashed into
    /// [`fmt::Error`]. A `Display` implementation failing on its own surfaces as
    /// [`Error::Format`].
    pub fn append_fmt(&mut self, args: fmt::Arguments) -> Result<(), Error> {
        struct Sink<'a, A>
        where
            A: RawAlloc,
        {
            buf: &'a mut Buf<A>,
            err: Option<Error>,
        }

        impl<A> fmt::Write for Sink<'_, A>
        where
            A: RawAlloc,
        {
            fn write_str(&mut self, s: &str) -> FmtResult {
                self.buf.append(s.as_bytes()).map_err(|err| {
                    self.err = Some(err);
                    fmt::Error
                })
            }
        }

        let mut sink = Sink { buf: self, err: None };
        match fmt::write(&mut sink, args) {
            Ok(()) => Ok(()),
            Err(fmt::Error) => Err(sink.err.unwrap_or(Error::Format)),
        }
    }

    /// The uninitialized tail between the payload and the capacity.
    ///
    /// Fill some prefix of it, then declare it with [`set_len`][Buf::set_len]. This is the
    /// escape hatch for readers and syscalls that want to write directly into the buffer.
    pub fn spare_capacity_mut(&mut self) -> &mut [MaybeUninit<u8>] {
        if self.is_sentinel() {
            return &mut [];
        }

        let len = self.len();
        let spare = self.capacity() - len;
        unsafe {
            slice::from_raw_parts_mut(self.payload().add(len).cast::<MaybeUninit<u8>>(), spare)
        }
    }

    /// Declares the payload to be `new_len` bytes long.
    ///
    /// # Safety
    ///
    /// `new_len` must not exceed [`capacity`][Buf::capacity] and the payload must be initialized
    /// up to `new_len`, usually by writing into
    /// [`spare_capacity_mut`][Buf::spare_capacity_mut] first.
    pub unsafe fn set_len(&mut self, new_len: usize) {
        if self.is_sentinel() {
            debug_assert_eq!(new_len, 0);
            return;
        }

        self.commit_len(new_len);
    }

    /// A deep copy, sized exactly to the payload.
    pub fn try_clone(&self) -> Result<Self, Error> {
        Self::from_slice(self.as_bytes())
    }
}

impl<A> Drop for Buf<A>
where
    A: RawAlloc,
{
    fn drop(&mut self) {
        if self.is_sentinel() {
            return;
        }

        let layout = header::layout_for(self.width_raw(), self.capacity())
            .expect("Already had this layout");
        unsafe { A::free(self.base.as_ptr(), layout) }
    }
}

impl<A> Clone for Buf<A>
where
    A: RawAlloc,
{
    fn clone(&self) -> Self {
        self.try_clone().expect("Out of memory cloning a buffer")
    }
}

impl<A> Default for Buf<A>
where
    A: RawAlloc,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Deref for Buf<A>
where
    A: RawAlloc,
{
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<A> DerefMut for Buf<A>
where
    A: RawAlloc,
{
    #[inline]
    fn deref_mut(&mut self) -> &mut [u8] {
        self.as_bytes_mut()
    }
}

impl<A> AsRef<[u8]> for Buf<A>
where
    A: RawAlloc,
{
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<A> Borrow<[u8]> for Buf<A>
where
    A: RawAlloc,
{
    fn borrow(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<A, B> PartialEq<Buf<B>> for Buf<A>
where
    A: RawAlloc,
    B: RawAlloc,
{
    fn eq(&self, other: &Buf<B>) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<A> Eq for Buf<A> where A: RawAlloc {}

impl<A> PartialEq<[u8]> for Buf<A>
where
    A: RawAlloc,
{
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl<A> PartialEq<&[u8]> for Buf<A>
where
    A: RawAlloc,
{
    fn eq(&self, other: &&[u8]) -> bool {
        self.as_bytes() == *other
    }
}

impl<A, const N: usize> PartialEq<[u8; N]> for Buf<A>
where
    A: RawAlloc,
{
    fn eq(&self, other: &[u8; N]) -> bool {
        self.as_bytes() == &other[..]
    }
}

impl<A, const N: usize> PartialEq<&[u8; N]> for Buf<A>
where
    A: RawAlloc,
{
    fn eq(&self, other: &&[u8; N]) -> bool {
        self.as_bytes() == &other[..]
    }
}

impl<A> PartialEq<Vec<u8>> for Buf<A>
where
    A: RawAlloc,
{
    fn eq(&self, other: &Vec<u8>) -> bool {
        self.as_bytes() == other.as_slice()
    }
}

impl<A> PartialOrd for Buf<A>
where
    A: RawAlloc,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Buf<A>
where
    A: RawAlloc,
{
    fn cmp(&self, other: &Self) -> Ordering {
        // The same allocation (or both sentinels) compares equal without looking.
        if ptr::eq(self.base.as_ptr(), other.base.as_ptr()) {
            return Ordering::Equal;
        }
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl<A> Hash for Buf<A>
where
    A: RawAlloc,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must match the Hash of [u8] so Borrow-based map lookups work.
        self.as_bytes().hash(state)
    }
}

impl<A> Debug for Buf<A>
where
    A: RawAlloc,
{
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        fmt.write_str("\"")?;
        for &b in self.as_bytes() {
            match quote::named_escape(b) {
                Some(esc) => fmt.write_str(esc)?,
                None if quote::is_printable(b) => write!(fmt, "{}", b as char)?,
                None => write!(fmt, "\\x{:02x}", b)?,
            }
        }
        fmt.write_str("\"")
    }
}

impl<A> fmt::Write for Buf<A>
where
    A: RawAlloc,
{
    fn write_str(&mut self, s: &str) -> FmtResult {
        self.append(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

impl<'a, A> TryFrom<&'a [u8]> for Buf<A>
where
    A: RawAlloc,
{
    type Error = Error;

    fn try_from(src: &'a [u8]) -> Result<Self, Error> {
        Self::from_slice(src)
    }
}

impl<'a, A> TryFrom<&'a str> for Buf<A>
where
    A: RawAlloc,
{
    type Error = Error;

    fn try_from(src: &'a str) -> Result<Self, Error> {
        Self::from_slice(src.as_bytes())
    }
}

// The buffer owns its allocation outright, there's no sharing going on, so moving it between
// threads or reading it from several is as fine as it would be for a Vec<u8>.
unsafe impl<A> Send for Buf<A> where A: RawAlloc {}
unsafe impl<A> Sync for Buf<A> where A: RawAlloc {}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fmt::Write;
    use std::mem;

    use super::*;

    /// Check we have the null-pointer optimisation.
    #[test]
    fn null_ptr_opt() {
        assert_eq!(mem::size_of::<Buf>(), mem::size_of::<Option<Buf>>());
        assert_eq!(mem::size_of::<Buf>(), mem::size_of::<*const u8>());
    }

    /// Exercise the special handling of the sentinel.
    #[test]
    fn empty() {
        let mut b: Buf = Buf::new();
        assert_eq!(b.len(), 0);
        assert!(b.is_empty());
        assert_eq!(b.capacity(), 0);
        assert_eq!(b.available(), 0);
        assert_eq!(b.alloc_size(), 0);
        assert_eq!(b.as_bytes(), b"");
        assert_eq!(b.as_bytes_mut(), b"");
        assert_eq!(b.as_bytes_with_nul(), b"\0");
        assert_eq!(unsafe { *b.as_ptr() }, 0);
        assert_eq!("\"\"", format!("{:?}", b));

        let c = b.clone();
        assert_eq!(b, c);
        let d: Buf = Buf::default();
        assert_eq!(b, d);
    }

    /// An explicit length cuts the input short, interior zeroes don't.
    #[test]
    fn init_respects_len() {
        let b: Buf = Buf::from_slice(&b"foo"[..2]).unwrap();
        assert_eq!(b, b"fo");
        assert_eq!(b.len(), 2);
        assert_eq!(b.capacity(), 2);
        assert_eq!(b.available(), 0);

        let z: Buf = Buf::from_slice(b"a\0b").unwrap();
        assert_eq!(z.len(), 3);
        assert_eq!(z.as_bytes(), b"a\0b");
        assert_eq!(z.as_bytes_with_nul(), b"a\0b\0");
    }

    #[test]
    fn cat() {
        let mut b: Buf = Buf::from_slice(&b"foo"[..2]).unwrap();
        b.append(b"bar").unwrap();
        assert_eq!(b, b"fobar");
        assert_eq!(b.len(), 5);

        b.push(b'!').unwrap();
        assert_eq!(b, b"fobar!");
        assert_eq!(b.as_bytes_with_nul(), b"fobar!\0");
    }

    #[test]
    fn copy_over() {
        let mut b: Buf = Buf::from_slice(b"hello").unwrap();
        b.set(b"a").unwrap();
        assert_eq!(b, b"a");

        let long = "xyz".repeat(18);
        b.set(long.as_bytes()).unwrap();
        assert_eq!(b.as_bytes(), long.as_bytes());
        assert_eq!(b.len(), 54);

        b.set(b"").unwrap();
        assert!(b.is_empty());
        assert_eq!(b.as_bytes_with_nul(), b"\0");
    }

    #[test]
    fn truncate_keeps_the_block() {
        let mut b: Buf = Buf::from_slice(b"Hello World").unwrap();
        let cap = b.capacity();
        b.truncate(5);
        assert_eq!(b, b"Hello");
        assert_eq!(b.capacity(), cap);
        assert_eq!(b.available(), cap - 5);
        assert_eq!(b.as_bytes_with_nul(), b"Hello\0");

        // Too-long requests do nothing.
        b.truncate(100);
        assert_eq!(b, b"Hello");

        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.capacity(), cap);
    }

    #[test]
    fn reserve_is_amortised() {
        let mut b: Buf = Buf::new();
        b.reserve(10).unwrap();
        assert_eq!(b.capacity(), 20);
        assert_eq!(b.len(), 0);
        let before = b.capacity();
        // Room already there, nothing to do.
        b.reserve(15).unwrap();
        assert_eq!(b.capacity(), before);
    }

    /// The classic grow-and-fill loop, driven through the raw spare-capacity door.
    #[test]
    fn make_room_and_fill() {
        let mut b: Buf = Buf::from_slice(b"0").unwrap();
        for round in 0..10u8 {
            let old = b.len();
            b.reserve(10).unwrap();
            assert!(b.available() >= 10);
            for slot in &mut b.spare_capacity_mut()[..10] {
                slot.write(b'A' + round);
            }
            unsafe { b.set_len(old + 10) };
        }
        assert_eq!(b.len(), 101);
        assert_eq!(b[0], b'0');
        for round in 0..10usize {
            let chunk = &b[1 + round * 10..1 + (round + 1) * 10];
            assert!(chunk.iter().all(|&c| c == b'A' + round as u8));
        }
    }

    #[test]
    fn grow_zeroed_pads_with_zeroes() {
        let mut b: Buf = Buf::from_slice(b"abc").unwrap();
        b.grow_zeroed(8).unwrap();
        assert_eq!(b.len(), 8);
        assert_eq!(b.as_bytes(), b"abc\0\0\0\0\0");
        assert_eq!(b.as_bytes_with_nul(), b"abc\0\0\0\0\0\0");

        // Shorter targets don't touch anything.
        b.grow_zeroed(2).unwrap();
        assert_eq!(b.len(), 8);
    }

    #[test]
    fn shrink_in_place() {
        let mut b: Buf = Buf::new();
        b.append(&[b'x'; 100]).unwrap();
        assert!(b.capacity() > 100);
        b.shrink_to_fit().unwrap();
        assert_eq!(b.capacity(), 100);
        assert_eq!(b.width(), Width::W8);
        assert_eq!(b.available(), 0);
        assert_eq!(b.as_bytes(), &[b'x'; 100]);

        // Wide header, still too long for the small one: stays wide.
        let mut w: Buf = Buf::from_slice(&[b'y'; 70_000]).unwrap();
        w.truncate(30_000);
        w.shrink_to_fit().unwrap();
        assert_eq!(w.capacity(), 30_000);
        assert_eq!(w.width(), Width::W32);
    }

    #[test]
    fn shrink_repacks_small_leftovers() {
        let mut b: Buf = Buf::from_slice(&[b'z'; 300]).unwrap();
        assert_eq!(b.width(), Width::W16);
        b.truncate(10);
        b.shrink_to_fit().unwrap();
        assert_eq!(b.width(), Width::W8);
        assert_eq!(b.capacity(), 10);
        assert_eq!(b.as_bytes(), &[b'z'; 10]);
        assert_eq!(b.as_bytes_with_nul().last(), Some(&0));
    }

    #[test]
    fn widths_upgrade_with_content_intact() {
        let mut b: Buf = Buf::from_slice(&[b'a'; 250]).unwrap();
        assert_eq!(b.width(), Width::W8);
        b.append(&[b'b'; 10]).unwrap();
        assert_eq!(b.width(), Width::W16);
        assert_eq!(b.len(), 260);
        assert_eq!(&b[..250], &[b'a'; 250]);
        assert_eq!(&b[250..], &[b'b'; 10]);

        b.append(&vec![b'c'; 70_000]).unwrap();
        assert_eq!(b.width(), Width::W32);
        assert_eq!(b.len(), 70_260);
        assert_eq!(b[259], b'b');
        assert_eq!(b[260], b'c');
        assert_eq!(b.as_bytes_with_nul().last(), Some(&0));
    }

    /// Reserving into spare space after a truncate must not narrow the header.
    #[test]
    fn width_never_narrows_on_growth() {
        let mut b: Buf = Buf::from_slice(&[b'q'; 300]).unwrap();
        assert_eq!(b.width(), Width::W16);
        b.truncate(3);
        b.reserve(1).unwrap();
        assert_eq!(b.width(), Width::W16);
        b.append(b"xyz").unwrap();
        assert_eq!(b.width(), Width::W16);
        assert_eq!(b, b"qqqxyz");
    }

    #[test]
    fn c_str_view() {
        let b: Buf = Buf::from_slice(b"fobar").unwrap();
        let c = CStr::from_bytes_with_nul(b"fobar\0").unwrap();
        assert_eq!(b.as_c_str(), Some(c));

        let z: Buf = Buf::from_slice(b"a\0b").unwrap();
        assert_eq!(z.as_c_str(), None);

        let e: Buf = Buf::new();
        assert_eq!(e.as_c_str().map(CStr::to_bytes), Some(&b""[..]));
    }

    #[test]
    fn available_past_the_hint() {
        let mut b: Buf = Buf::new();
        b.reserve(100).unwrap();
        // The hint saturates way below this, so the answer comes from the header fields.
        assert!(b.capacity() > crate::header::HINT_MAX as usize);
        assert_eq!(b.available(), b.capacity());

        b.append(&[b'x'; 150]).unwrap();
        b.truncate(120);
        assert_eq!(b.available(), b.capacity() - 120);
    }

    #[test]
    fn clones_are_independent() {
        let mut a: Buf = Buf::from_slice(b"shared").unwrap();
        let b = a.clone();
        a.append(b"!").unwrap();
        assert_eq!(a, b"shared!");
        assert_eq!(b, b"shared");
        assert_ne!(a, b);

        let c = b.try_clone().unwrap();
        assert_eq!(c, b);
        assert_eq!(c.capacity(), c.len());
    }

    #[test]
    fn compares_and_mixed_eq() {
        let a: Buf = Buf::from_slice(b"abc").unwrap();
        let b: Buf = Buf::from_slice(b"abd").unwrap();
        let prefix: Buf = Buf::from_slice(b"ab").unwrap();
        assert!(a < b);
        assert!(prefix < a);
        assert_eq!(a.cmp(&a), Ordering::Equal);

        assert_eq!(a, *b"abc");
        assert_eq!(a, b"abc");
        assert_eq!(a, &b"abc"[..]);
        assert_eq!(a, b"abc".to_vec());
    }

    #[test]
    fn hashes_like_a_slice() {
        let mut map: HashMap<Buf, u32> = HashMap::new();
        let key: Buf = Buf::from_slice(b"answer").unwrap();
        map.insert(key, 42);
        assert_eq!(map.get(b"answer".as_slice()), Some(&42));
        assert_eq!(map.get(b"question".as_slice()), None);
    }

    #[test]
    fn debug_quotes_and_escapes() {
        let b: Buf = Buf::from_slice(b"a\"b\n\x01").unwrap();
        assert_eq!(format!("{:?}", b), r#""a\"b\n\x01""#);
    }

    #[test]
    fn formatted_appends() {
        let mut b: Buf = Buf::from_slice(b"sum: ").unwrap();
        b.append_fmt(format_args!("{} + {} = {}", 1, 2, 1 + 2)).unwrap();
        assert_eq!(b, b"sum: 1 + 2 = 3");

        write!(b, " ({})", "checked").unwrap();
        assert_eq!(b, b"sum: 1 + 2 = 3 (checked)");
    }

    #[test]
    fn conversions() {
        let b: Buf = Buf::try_from(&b"bytes"[..]).unwrap();
        assert_eq!(b, b"bytes");
        let s: Buf = Buf::try_from("text").unwrap();
        assert_eq!(s, b"text");
        let r: &[u8] = s.as_ref();
        assert_eq!(r, b"text");
    }

    /// In-place edits through the mutable view stay inside the payload.
    #[test]
    fn mutable_view() {
        let mut b: Buf = Buf::from_slice(b"Hello World").unwrap();
        b.as_bytes_mut().make_ascii_uppercase();
        assert_eq!(b, b"HELLO WORLD");
        b[0] = b'J';
        assert_eq!(b, b"JELLO WORLD");
        assert_eq!(b.as_bytes_with_nul().last(), Some(&0));
    }
}
