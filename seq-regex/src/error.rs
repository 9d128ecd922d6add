//! Errors raised while compiling patterns and encoding sequences.
//!
//! Pattern errors carry the char offset of the first offending character in the
//! original (unstripped) pattern text. Nothing is recovered: the first error
//! ends the compilation.

use std::fmt;

use thiserror::Error;

use crate::encode::PLACEHOLDER_CAPACITY;

/// Errors of [`SeqRegex`](crate::SeqRegex), [`CompiledPattern`](crate::CompiledPattern) and [`Bootstrap`](crate::bootstrap::Bootstrap).
#[derive(Debug, Error)]
pub enum Error {
    /// The number of dimensions must be positive.
    #[error("invalid number of dimensions: {0}")]
    InvalidDimensions(usize),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// More distinct strings than the placeholder space can hold.
    #[error("too many different strings, at most {} can be encoded", PLACEHOLDER_CAPACITY)]
    TooManyStrings,

    /// A tuple of the sequence does not have `ndim` elements.
    #[error("tuple {index} has {found} elements, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    /// The regex engine rejected the flattened pattern.
    #[error("failed to build the automaton: {0}")]
    Build(#[from] regex_automata::meta::BuildError),

    /// The backtracking engine rejected the flattened pattern, e.g. a variable-length
    /// look-behind, or gave up a search after too many steps.
    #[error("backtracking engine: {0}")]
    Backtracking(#[from] fancy_regex::Error),
}

/// A malformed pattern.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} at position {offset}")]
pub struct PatternError {
    pub kind: PatternErrorKind,
    /// Char offset into the original pattern text.
    pub offset: usize,
}

impl PatternError {
    pub fn new(kind: PatternErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum PatternErrorKind {
    /// `(` without `)` or `)` without `(`.
    UnbalancedParenthesis(char),
    /// `/` without the closing `/`.
    UnbalancedSlash,
    /// Backslash outside of a tuple.
    InvalidEscape,
    /// `[` or `]` outside of a tuple.
    InvalidSetIndicator(char),
    /// A tuple dimension or format index not less than `ndim`.
    OutOfDimensionRange,
    /// `^` with nothing to negate.
    UnexpectedNegativeSign,
    /// `(?` followed by something unsupported, e.g. `?<3`.
    UnknownExtension(String),
    /// A group name or reference not terminated by the given char.
    UnterminatedName(char),
    UnterminatedComment,
    UnexpectedEnd,
    /// `{` not forming `{m}`, `{m,}`, `{,n}` or `{m,n}`.
    InvalidRepetition,
    InvalidFormatSpec,
    UnknownGroupName(String),
    DuplicateGroupName(String),
    /// A substitution with an empty set of values.
    EmptySubstitution(String),
    UnexpectedCharacter(char),
}

impl fmt::Display for PatternErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnbalancedParenthesis(c) => write!(f, "unbalanced parenthesis `{c}`"),
            Self::UnbalancedSlash => write!(f, "unbalanced slash `/`"),
            Self::InvalidEscape => write!(f, "invalid escape expression `\\`"),
            Self::InvalidSetIndicator(c) => write!(f, "invalid set indicator `{c}`"),
            Self::OutOfDimensionRange => write!(f, "out of dimension range"),
            Self::UnexpectedNegativeSign => write!(f, "unexpected negative sign `^`"),
            Self::UnknownExtension(ext) => write!(f, "unknown extension {ext}"),
            Self::UnterminatedName(c) => write!(f, "missing `{c}`, unterminated characters"),
            Self::UnterminatedComment => write!(f, "missing `)`, unterminated comment"),
            Self::UnexpectedEnd => write!(f, "unexpected end of pattern"),
            Self::InvalidRepetition => write!(f, "invalid repetition `{{`"),
            Self::InvalidFormatSpec => write!(f, "invalid format specification"),
            Self::UnknownGroupName(name) => write!(f, "unknown group name `{name}`"),
            Self::DuplicateGroupName(name) => write!(f, "duplicate group name `{name}`"),
            Self::EmptySubstitution(name) => write!(f, "substitution `{name}` has no values"),
            Self::UnexpectedCharacter(c) => write!(f, "unexpected character `{c}`"),
        }
    }
}
