/*!
Placeholder encoding.

The regex engine only understands a single-character alphabet, so every distinct
literal (a token, a tag, a phrase...) is folded into one code point. Placeholders are
drawn from [Supplementary Private Use Area-A](https://en.wikipedia.org/wiki/Private_Use_Areas):

- `U+F0000` is the shared wildcard for elements no pattern literal refers to.
- `U+F0001..=U+FFFFD` are allocated to literals on first encounter, in order.

Every placeholder therefore takes exactly [`PLACEHOLDER_LEN`] bytes in UTF-8, and a byte
offset in an encoded sequence divided by `PLACEHOLDER_LEN * ndim` is a tuple index.
*/
use std::collections::HashMap;

use crate::{
    error::Error,
    sequence::{Element, Tuple},
};

/// Shared placeholder of unmapped elements.
pub const WILDCARD: char = '\u{F0000}';
const FIRST: u32 = 0xF0001;
const LAST: u32 = 0xFFFFD;

/// The number of literals an [`Encoder`] can hold. Tens of thousands, enough for realistic
/// vocabularies.
pub const PLACEHOLDER_CAPACITY: usize = (LAST - FIRST + 1) as usize;

/// UTF-8 length of every placeholder.
pub const PLACEHOLDER_LEN: usize = 4;

/// Literal to placeholder table of one compiled pattern.
///
/// Allocation is monotonic. The table is never shrunk; a recompilation builds a new one.
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    map: HashMap<String, char>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the placeholder of `literal`.
    ///
    /// If `literal` is not mapped yet, `default` is returned as is; without a `default` the next
    /// free placeholder is allocated.
    pub fn encode(&mut self, literal: &str, default: Option<char>) -> Result<char, Error> {
        if let Some(&c) = self.map.get(literal) {
            return Ok(c);
        }
        if let Some(default) = default {
            return Ok(default);
        }
        let c = placeholder(self.map.len())?;
        self.map.insert(literal.to_owned(), c);
        Ok(c)
    }

    pub fn get(&self, literal: &str) -> Option<char> {
        self.map.get(literal).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear()
    }
}

fn placeholder(i: usize) -> Result<char, Error> {
    if i >= PLACEHOLDER_CAPACITY {
        return Err(Error::TooManyStrings);
    }
    // All values in the range are scalar values
    char::from_u32(FIRST + i as u32).ok_or(Error::TooManyStrings)
}

/// How elements without a placeholder are encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unmapped {
    /// All map to [`WILDCARD`]. Keeps the alphabet small.
    SharedWildcard,
    /// Each distinct string (and each multi-value element) gets a fresh placeholder, so that an
    /// unseen token can never be confused with a literal a negated set excludes.
    Unique,
}

/// Flattens sequences against a read-only [`Encoder`].
///
/// Fresh placeholders for [`Unmapped::Unique`] live in a per-call overlay, allocated after the
/// encoder's own, so encoding a sequence never changes the compiled pattern.
pub(crate) struct SequenceEncoder<'e> {
    encoder: &'e Encoder,
    unmapped: Unmapped,
    ndim: usize,
}

impl<'e> SequenceEncoder<'e> {
    pub fn new(encoder: &'e Encoder, unmapped: Unmapped, ndim: usize) -> Self {
        Self {
            encoder,
            unmapped,
            ndim,
        }
    }

    /// Encode `sequence` into exactly `ndim * sequence.len()` placeholders, in tuple then
    /// dimension order.
    pub fn encode(&self, sequence: &[Tuple]) -> Result<String, Error> {
        let mut overlay: HashMap<&str, char> = HashMap::new();
        let mut next = self.encoder.len();
        let fresh = |next: &mut usize| {
            let c = placeholder(*next)?;
            *next += 1;
            Ok::<_, Error>(c)
        };

        let mut encoded = String::with_capacity(sequence.len() * self.ndim * PLACEHOLDER_LEN);
        for (index, tuple) in sequence.iter().enumerate() {
            if tuple.len() != self.ndim {
                return Err(Error::DimensionMismatch {
                    index,
                    expected: self.ndim,
                    found: tuple.len(),
                });
            }
            for element in tuple {
                let c = match element {
                    Element::Single(s) => match (self.encoder.get(s), self.unmapped) {
                        (Some(c), _) => c,
                        (None, Unmapped::SharedWildcard) => WILDCARD,
                        (None, Unmapped::Unique) => match overlay.get(s.as_str()) {
                            Some(&c) => c,
                            None => {
                                let c = fresh(&mut next)?;
                                overlay.insert(s, c);
                                c
                            }
                        },
                    },
                    Element::MultiValue(_) => match self.unmapped {
                        Unmapped::SharedWildcard => WILDCARD,
                        Unmapped::Unique => fresh(&mut next)?,
                    },
                };
                encoded.push(c);
            }
        }
        Ok(encoded)
    }
}
