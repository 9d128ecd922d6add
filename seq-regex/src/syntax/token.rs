use std::fmt::Write;

/// What a parsed [`Token`] stands for in the flattened pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// A tuple value, replaced by its placeholder.
    Literal,
    /// Regex syntax copied verbatim, or synthesized for tuples (`(?:`, `[^`, `.`, ...).
    Passthrough,
    /// The prefix of a group extension, e.g. `(?P<`, `(?:`, `(?=`.
    ExtensionSign,
    /// The name of a named group, a back-reference or a condition.
    GroupName,
    /// `@...` after a group name. No payload; only kept for offsets.
    FormatSpec,
    /// `(?#...)`. No payload.
    Comment,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// `None` for tokens that produce nothing in the flattened pattern.
    pub payload: Option<String>,
    /// Char offset into the original pattern text.
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, payload: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            payload: Some(payload.into()),
            offset,
        }
    }

    pub fn structural(kind: TokenKind, offset: usize) -> Self {
        Self {
            kind,
            payload: None,
            offset,
        }
    }
}

/// Render tokens as pseudo-regex: literals quoted, everything else verbatim.
pub(crate) fn dump(tokens: &[Token]) -> String {
    let mut s = String::new();
    for token in tokens {
        match (token.kind, &token.payload) {
            (TokenKind::Literal, Some(literal)) => {
                _ = write!(s, "\"{literal}\"");
            }
            (_, Some(payload)) => s.push_str(payload),
            (_, None) => (),
        }
    }
    s
}
