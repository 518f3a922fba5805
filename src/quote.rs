//! Quoting for humans and the parser that reads it back.
//!
//! [`Buf::append_quoted`] renders arbitrary bytes as a double-quoted string with escapes, the
//! way a REPL would show them. [`Buf::split_args`] goes the other way and chops a command line
//! into arguments, understanding both quoting styles plus the escapes.

use crate::alloc::RawAlloc;
use crate::buf::Buf;
use crate::error::Error;

static HEX_LOWER: &[u8; 16] = b"0123456789abcdef";

// The escapes with a name of their own; unprintable bytes without one go the \xhh way.
pub(crate) fn named_escape(b: u8) -> Option<&'static str> {
    match b {
        b'\\' => Some("\\\\"),
        b'"' => Some("\\\""),
        b'\n' => Some("\\n"),
        b'\r' => Some("\\r"),
        b'\t' => Some("\\t"),
        0x07 => Some("\\a"),
        0x08 => Some("\\b"),
        _ => None,
    }
}

pub(crate) fn is_printable(b: u8) -> bool {
    (0x20..=0x7e).contains(&b)
}

// What C's isspace considers blank. Note that u8::is_ascii_whitespace would miss the vertical
// tab.
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r')
}

fn is_hex_digit(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

fn hex_digit(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => 0,
    }
}

impl<A> Buf<A>
where
    A: RawAlloc,
{
    /// Appends `data` as a double-quoted, escaped string.
    ///
    /// Printable characters stay as they are, the usual suspects get their named escapes and
    /// everything else turns into `\xhh`. [`split_args`][Buf::split_args] parses this exact
    /// format back.
    pub fn append_quoted(&mut self, data: &[u8]) -> Result<(), Error> {
        self.push(b'"')?;
        for &b in data {
            match named_escape(b) {
                Some(esc) => self.append(esc.as_bytes())?,
                None if is_printable(b) => self.push(b)?,
                None => {
                    let hex = HEX_LOWER[(b >> 4) as usize];
                    let lo = HEX_LOWER[(b & 0xf) as usize];
                    self.append(&[b'\\', b'x', hex, lo])?;
                }
            }
        }
        self.push(b'"')
    }

    /// Splits a command line into its arguments.
    ///
    /// Arguments are separated by whitespace and can be quoted. Double quotes understand the
    /// escapes produced by [`append_quoted`][Buf::append_quoted], `\xhh` included; single
    /// quotes take everything literally except `\'`. A closing quote must be followed by
    /// whitespace or the end of the line.
    ///
    /// Unterminated quotes, or a closing quote glued directly to more text, fail the whole
    /// line. That's a typo on the user's side and guessing what they meant helps nobody.
    pub fn split_args(line: &[u8]) -> Result<Vec<Self>, Error> {
        let mut args = Vec::new();
        let mut at = 0;
        loop {
            while at < line.len() && is_space(line[at]) {
                at += 1;
            }
            if at >= line.len() {
                return Ok(args);
            }

            let mut current = Self::new();
            let mut in_quotes = false;
            let mut in_single = false;
            let mut done = false;
            while !done {
                if in_quotes {
                    let b = match line.get(at) {
                        Some(&b) => b,
                        // Ran out of line before the closing quote.
                        None => return Err(Error::UnbalancedQuotes),
                    };
                    if b == b'\\'
                        && at + 3 < line.len()
                        && line[at + 1] == b'x'
                        && is_hex_digit(line[at + 2])
                        && is_hex_digit(line[at + 3])
                    {
                        current.push(hex_digit(line[at + 2]) * 16 + hex_digit(line[at + 3]))?;
                        at += 3;
                    } else if b == b'\\' && at + 1 < line.len() {
                        at += 1;
                        let unescaped = match line[at] {
                            b'n' => b'\n',
                            b'r' => b'\r',
                            b't' => b'\t',
                            b'b' => 0x08,
                            b'a' => 0x07,
                            other => other,
                        };
                        current.push(unescaped)?;
                    } else if b == b'"' {
                        // The closing quote can only be followed by whitespace, or nothing.
                        if at + 1 < line.len() && !is_space(line[at + 1]) {
                            return Err(Error::UnbalancedQuotes);
                        }
                        done = true;
                    } else {
                        current.push(b)?;
                    }
                } else if in_single {
                    let b = match line.get(at) {
                        Some(&b) => b,
                        None => return Err(Error::UnbalancedQuotes),
                    };
                    if b == b'\\' && line.get(at + 1) == Some(&b'\'') {
                        at += 1;
                        current.push(b'\'')?;
                    } else if b == b'\'' {
                        if at + 1 < line.len() && !is_space(line[at + 1]) {
                            return Err(Error::UnbalancedQuotes);
                        }
                        done = true;
                    } else {
                        current.push(b)?;
                    }
                } else {
                    match line.get(at) {
                        None | Some(&b' ') | Some(&b'\n') | Some(&b'\r') | Some(&b'\t') => {
                            done = true;
                        }
                        Some(&b'"') => in_quotes = true,
                        Some(&b'\'') => in_single = true,
                        Some(&other) => current.push(other)?,
                    }
                }
                if at < line.len() {
                    at += 1;
                }
            }
            args.push(current);
        }
    }
}
