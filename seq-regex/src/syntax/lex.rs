use logos::Logos;

/// Tokens outside of tuple delimiters.
///
/// Tuples, group extensions and repetitions are context sensitive; the parser scans them from
/// [`remainder()`](logos::Lexer::remainder) and [`bump()`](logos::Lexer::bump)s past them.
#[derive(Logos, Clone, Copy, Debug, PartialEq)]
pub enum OuterToken {
    /// Ignored.
    #[regex(r"\s+")]
    Whitespace,

    /// Opens a tuple, `/.../`.
    #[token("/")]
    Tuple,

    /// Equivalent to `/::/`, a tuple of wildcards.
    #[token(".")]
    Any,

    /// `(?`, followed by an extension.
    #[token("(?")]
    Extension,

    /// Capturing group.
    #[token("(")]
    Open,

    #[token(")")]
    Close,

    #[token("|")]
    Alternation,

    #[token("?")]
    Optional,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    /// `{m,n}`.
    #[token("{")]
    Repetition,

    /// Not supported outside of tuples.
    #[token(r"\")]
    Escape,

    /// `[` or `]`, not supported.
    #[token("[")]
    #[token("]")]
    SetIndicator,

    /// Anything else, passed through.
    #[regex(r"[^\s/.()|?*+{\\\[\]]+")]
    Text,
}
