//! The inline header in front of the payload.
//!
//! One allocation holds everything: a flags byte, then the length and the
//! capacity in fields of the selected [`Width`], then the payload, then the
//! terminating zero. Nothing here is aligned beyond a byte (the fields are
//! read and written unaligned), which keeps the overhead of a short string at
//! three bytes total.

use std::alloc::Layout;

use crate::error::Error;

/// Size of the length and capacity fields in the buffer's header.
///
/// Selected as the narrowest one the capacity fits at the time the
/// allocation is made and stored in the low bits of the flags byte. Growth
/// can only ever move to a wider header; only
/// [`shrink_to_fit`][crate::Buf::shrink_to_fit] re-evaluates from scratch.
#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Width {
    /// 8-bit fields, strings under 256 bytes.
    W8 = 0,
    /// 16-bit fields.
    W16 = 1,
    /// 32-bit fields.
    W32 = 2,
    /// 64-bit fields. Unreachable on 32-bit targets.
    W64 = 3,
}

const WIDTH_MASK: u8 = 0b11;

/// Largest free-space value the flags byte can hint at.
///
/// A saturated hint means "this much or more" and the accessor recomputes
/// from the real fields instead.
pub(crate) const HINT_MAX: u8 = 0b11_1111;

impl Width {
    /// The narrowest width able to encode `len`.
    #[inline]
    pub fn for_len(len: usize) -> Self {
        if len < 1 << 8 {
            Width::W8
        } else if len < 1 << 16 {
            Width::W16
        } else if (len as u64) < 1u64 << 32 {
            Width::W32
        } else {
            Width::W64
        }
    }

    #[inline]
    pub(crate) fn from_flags(flags: u8) -> Self {
        match flags & WIDTH_MASK {
            0 => Width::W8,
            1 => Width::W16,
            2 => Width::W32,
            _ => Width::W64,
        }
    }

    #[inline]
    pub(crate) fn field_bytes(self) -> usize {
        match self {
            Width::W8 => 1,
            Width::W16 => 2,
            Width::W32 => 4,
            Width::W64 => 8,
        }
    }

    /// Bytes between the start of the allocation and the payload.
    #[inline]
    pub(crate) fn header_size(self) -> usize {
        1 + 2 * self.field_bytes()
    }

    #[inline]
    fn max_len(self) -> usize {
        match self {
            Width::W8 => u8::MAX as usize,
            Width::W16 => u16::MAX as usize,
            Width::W32 => u32::MAX as usize,
            Width::W64 => usize::MAX,
        }
    }
}

/// Layout of a whole allocation: header, payload capacity, terminator.
pub(crate) fn layout_for(width: Width, cap: usize) -> Result<Layout, Error> {
    let size = width
        .header_size()
        .checked_add(cap)
        .and_then(|s| s.checked_add(1))
        .ok_or(Error::TooLong)?;
    Layout::from_size_align(size, 1).map_err(|_| Error::TooLong)
}

#[inline]
pub(crate) fn hint_from_flags(flags: u8) -> u8 {
    flags >> 2
}

/// Writes the flags byte: width tag plus the (saturating) free-space hint.
///
/// # Safety
///
/// `base` must point at a live allocation of this buffer type.
#[inline]
pub(crate) unsafe fn write_flags(base: *mut u8, width: Width, avail: usize) {
    let hint = avail.min(HINT_MAX as usize) as u8;
    base.write(width as u8 | hint << 2)
}

/// # Safety
///
/// `base` must point at a live allocation carrying a header of `width`.
#[inline]
pub(crate) unsafe fn read_len(base: *const u8, width: Width) -> usize {
    read_field(base.add(1), width)
}

/// # Safety
///
/// Same as [`read_len`], and `len` must fit the width.
#[inline]
pub(crate) unsafe fn write_len(base: *mut u8, width: Width, len: usize) {
    write_field(base.add(1), width, len)
}

/// # Safety
///
/// Same as [`read_len`].
#[inline]
pub(crate) unsafe fn read_cap(base: *const u8, width: Width) -> usize {
    read_field(base.add(1 + width.field_bytes()), width)
}

/// # Safety
///
/// Same as [`write_len`].
#[inline]
pub(crate) unsafe fn write_cap(base: *mut u8, width: Width, cap: usize) {
    write_field(base.add(1 + width.field_bytes()), width, cap)
}

// The fields live at odd offsets, hence the unaligned accesses. Native
// endianness; the header never leaves this process.
#[inline]
unsafe fn read_field(p: *const u8, width: Width) -> usize {
    match width {
        Width::W8 => p.read() as usize,
        Width::W16 => p.cast::<u16>().read_unaligned() as usize,
        Width::W32 => p.cast::<u32>().read_unaligned() as usize,
        Width::W64 => p.cast::<u64>().read_unaligned() as usize,
    }
}

#[inline]
unsafe fn write_field(p: *mut u8, width: Width, value: usize) {
    debug_assert!(value <= width.max_len());
    match width {
        Width::W8 => p.write(value as u8),
        Width::W16 => p.cast::<u16>().write_unaligned(value as u16),
        Width::W32 => p.cast::<u32>().write_unaligned(value as u32),
        Width::W64 => p.cast::<u64>().write_unaligned(value as u64),
    }
}
