//! Appending numbers without going through the formatting machinery.
//!
//! `write!(buf, "{}", n)` works too, but it drags the whole `core::fmt` apparatus in for what is
//! a handful of divisions. These render straight into a stack scratch buffer instead.

use crate::alloc::RawAlloc;
use crate::buf::Buf;
use crate::error::Error;

// Enough for the 20 digits of u64::MAX, or 19 digits plus the sign.
const DEC_SCRATCH: usize = 21;
const HEX_SCRATCH: usize = 16;

static HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

// The digits land in the tail of the scratch, which conveniently avoids the reversing pass the
// textbook formulation needs. Returns the offset where they start.
fn encode_u64(mut value: u64, scratch: &mut [u8; DEC_SCRATCH]) -> usize {
    let mut at = scratch.len();
    loop {
        at -= 1;
        scratch[at] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    at
}

fn encode_i64(value: i64, scratch: &mut [u8; DEC_SCRATCH]) -> usize {
    // unsigned_abs sidesteps the overflow on i64::MIN.
    let mut at = encode_u64(value.unsigned_abs(), scratch);
    if value < 0 {
        at -= 1;
        scratch[at] = b'-';
    }
    at
}

fn encode_hex(mut value: u64, scratch: &mut [u8; HEX_SCRATCH]) -> usize {
    let mut at = scratch.len();
    loop {
        at -= 1;
        scratch[at] = HEX_DIGITS[(value & 0xf) as usize];
        value >>= 4;
        if value == 0 {
            break;
        }
    }
    at
}

impl<A> Buf<A>
where
    A: RawAlloc,
{
    /// Appends the decimal digits of `value`.
    pub fn append_u64(&mut self, value: u64) -> Result<(), Error> {
        let mut scratch = [0; DEC_SCRATCH];
        let at = encode_u64(value, &mut scratch);
        self.append(&scratch[at..])
    }

    /// Appends the decimal form of `value`, sign and all.
    pub fn append_i64(&mut self, value: i64) -> Result<(), Error> {
        let mut scratch = [0; DEC_SCRATCH];
        let at = encode_i64(value, &mut scratch);
        self.append(&scratch[at..])
    }

    /// [`append_u64`][Buf::append_u64] for the narrower type.
    pub fn append_u32(&mut self, value: u32) -> Result<(), Error> {
        self.append_u64(u64::from(value))
    }

    /// [`append_i64`][Buf::append_i64] for the narrower type.
    pub fn append_i32(&mut self, value: i32) -> Result<(), Error> {
        self.append_i64(i64::from(value))
    }

    /// Appends `value` as upper-case hex digits, with no prefix and no padding.
    pub fn append_hex(&mut self, value: u64) -> Result<(), Error> {
        let mut scratch = [0; HEX_SCRATCH];
        let at = encode_hex(value, &mut scratch);
        self.append(&scratch[at..])
    }

    /// Creates a buffer holding the decimal form of `value`.
    pub fn from_i64(value: i64) -> Result<Self, Error> {
        let mut scratch = [0; DEC_SCRATCH];
        let at = encode_i64(value, &mut scratch);
        Self::from_slice(&scratch[at..])
    }

    /// Creates a buffer holding the decimal digits of `value`.
    pub fn from_u64(value: u64) -> Result<Self, Error> {
        let mut scratch = [0; DEC_SCRATCH];
        let at = encode_u64(value, &mut scratch);
        Self::from_slice(&scratch[at..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_extremes() {
        let b: Buf = Buf::from_i64(i64::MIN).unwrap();
        assert_eq!(b, b"-9223372036854775808");
        let b: Buf = Buf::from_i64(i64::MAX).unwrap();
        assert_eq!(b, b"9223372036854775807");
        let b: Buf = Buf::from_u64(u64::MAX).unwrap();
        assert_eq!(b, b"18446744073709551615");
        let b: Buf = Buf::from_i64(0).unwrap();
        assert_eq!(b, b"0");
        let b: Buf = Buf::from_i64(-1).unwrap();
        assert_eq!(b, b"-1");
    }

    #[test]
    fn appends_after_existing_content() {
        let mut b: Buf = Buf::from_slice(b"*").unwrap();
        b.append_i64(i64::MAX).unwrap();
        assert_eq!(b, b"*9223372036854775807");

        let mut b: Buf = Buf::from_slice(b"*").unwrap();
        b.append_u64(u64::MAX).unwrap();
        assert_eq!(b, b"*18446744073709551615");

        let mut b: Buf = Buf::from_slice(b"123").unwrap();
        b.append_i32(456).unwrap();
        assert_eq!(b, b"123456");

        let mut b: Buf = Buf::from_slice(b"123").unwrap();
        b.append_u32(456).unwrap();
        assert_eq!(b, b"123456");
    }

    #[test]
    fn hex_is_uppercase_and_unpadded() {
        let mut b: Buf = Buf::from_slice(b"*").unwrap();
        b.append_hex(u64::MAX).unwrap();
        assert_eq!(b, b"*FFFFFFFFFFFFFFFF");

        let mut b: Buf = Buf::new();
        b.append_hex(0).unwrap();
        assert_eq!(b, b"0");
        b.push(b' ').unwrap();
        b.append_hex(0xabc).unwrap();
        assert_eq!(b, b"0 ABC");
    }

    /// Spot-check against the std formatter across the value range.
    #[test]
    fn agrees_with_display() {
        let signed = [
            0,
            7,
            -7,
            42,
            -100,
            9999,
            1_234_567_890_123,
            i64::MIN,
            i64::MAX,
        ];
        for v in signed {
            let b: Buf = Buf::from_i64(v).unwrap();
            assert_eq!(b.as_bytes(), format!("{}", v).as_bytes(), "value {}", v);
        }

        let unsigned = [0, 9, 10, 99, 100, 101, u64::MAX / 2, u64::MAX];
        for v in unsigned {
            let b: Buf = Buf::from_u64(v).unwrap();
            assert_eq!(b.as_bytes(), format!("{}", v).as_bytes(), "value {}", v);

            let mut h: Buf = Buf::new();
            h.append_hex(v).unwrap();
            assert_eq!(h.as_bytes(), format!("{:X}", v).as_bytes(), "value {:X}", v);
        }
    }
}
