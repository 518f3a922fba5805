//! Text-ish manipulation of the payload.
//!
//! Everything here works on raw bytes. The operations just happen to be the ones people usually
//! want when the bytes hold something text-like.

use crate::alloc::RawAlloc;
use crate::buf::Buf;
use crate::error::Error;

impl<A> Buf<A>
where
    A: RawAlloc,
{
    /// Removes the bytes contained in `cut` from both ends of the payload.
    ///
    /// Only the ends; occurrences in the middle stay where they are.
    pub fn trim(&mut self, cut: &[u8]) {
        let bytes = self.as_bytes();
        let start = bytes
            .iter()
            .position(|b| !cut.contains(b))
            .unwrap_or(bytes.len());
        let end = bytes
            .iter()
            .rposition(|b| !cut.contains(b))
            .map_or(start, |last| last + 1);
        if start == 0 && end == bytes.len() {
            return;
        }

        self.as_bytes_mut().copy_within(start..end, 0);
        self.truncate(end - start);
    }

    /// Keeps just the `start..=end` part of the payload.
    ///
    /// Both indices are inclusive and negative ones count from the end, the way scripting
    /// languages tend to do it. Anything out of range gets clamped, an inverted range empties
    /// the buffer. The allocation is kept either way.
    pub fn range(&mut self, start: isize, end: isize) {
        let len = self.len();
        if len == 0 {
            return;
        }

        let mut start = start;
        let mut end = end;
        if start < 0 {
            start += len as isize;
            if start < 0 {
                start = 0;
            }
        }
        if end < 0 {
            end += len as isize;
            if end < 0 {
                end = 0;
            }
        }
        // Clamp an oversized end before computing the span, end - start + 1 overflows for
        // end = isize::MAX. An oversized start needs no clamp of its own, it just lands
        // above end and produces the empty range.
        if end >= len as isize {
            end = len as isize - 1;
        }
        let newlen = if start > end {
            0
        } else {
            (end - start + 1) as usize
        };
        if newlen != 0 && start != 0 {
            let start = start as usize;
            self.as_bytes_mut().copy_within(start..start + newlen, 0);
        }
        self.truncate(newlen);
    }

    /// Substitutes every byte found in `from` with the byte at the same position in `to`.
    ///
    /// The first match in `from` wins. The sets must have the same length, otherwise there'd be
    /// nothing to substitute some of the bytes with.
    pub fn map_bytes(&mut self, from: &[u8], to: &[u8]) -> Result<(), Error> {
        if from.len() != to.len() {
            return Err(Error::MismatchedMapSets);
        }

        for b in self.as_bytes_mut() {
            if let Some(i) = from.iter().position(|f| f == b) {
                *b = to[i];
            }
        }
        Ok(())
    }

    /// Byte offset of the first occurrence of `needle` in the payload.
    ///
    /// An empty needle matches right at the start.
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        find_in(self.as_bytes(), needle, |a, b| a == b)
    }

    /// Like [`find`][Buf::find], but ignoring ASCII case on both sides.
    pub fn find_ignore_ascii_case(&self, needle: &[u8]) -> Option<usize> {
        find_in(self.as_bytes(), needle, |a, b| a.eq_ignore_ascii_case(&b))
    }

    /// Splits `text` by the separator into freshly allocated buffers.
    ///
    /// Tokens can be empty (two separators back to back produce one) and whatever follows the
    /// last separator is always a token of its own, so joining the result with the same
    /// separator reproduces `text`. Except for an empty `text`, which produces no tokens at all.
    pub fn split(text: &[u8], sep: &[u8]) -> Result<Vec<Self>, Error> {
        if sep.is_empty() {
            return Err(Error::EmptySeparator);
        }

        let mut tokens = Vec::new();
        if text.is_empty() {
            return Ok(tokens);
        }
        let mut start = 0;
        let mut at = 0;
        while at + sep.len() <= text.len() {
            if &text[at..at + sep.len()] == sep {
                tokens.push(Self::from_slice(&text[start..at])?);
                start = at + sep.len();
                at = start;
            } else {
                at += 1;
            }
        }
        tokens.push(Self::from_slice(&text[start..])?);
        Ok(tokens)
    }

    /// Glues `parts` together, with `sep` between each two neighbours.
    pub fn join<P>(parts: &[P], sep: &[u8]) -> Result<Self, Error>
    where
        P: AsRef<[u8]>,
    {
        let mut joined = Self::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                joined.append(sep)?;
            }
            joined.append(part.as_ref())?;
        }
        Ok(joined)
    }
}

// Naive scan. The payloads this runs on are short enough that anything smarter would be all
// constant factors and no actual win.
fn find_in(haystack: &[u8], needle: &[u8], eq: impl Fn(u8, u8) -> bool) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|w| w.iter().zip(needle).all(|(&h, &n)| eq(h, n)))
}
