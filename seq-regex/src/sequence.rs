//! The matched data: sequences of fixed-arity tuples.
use std::{collections::BTreeSet, fmt};

use itertools::Itertools;

/// One dimension slot of one tuple.
///
/// A [`MultiValue`](Element::MultiValue) element is opaque to matching: it is encoded like a string
/// that no pattern literal refers to. Only the [`Prefilter`](crate::prefilter::Prefilter) and
/// formatting look into it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    Single(String),
    MultiValue(BTreeSet<String>),
}

/// `ndim` elements, one per dimension.
pub type Tuple = Vec<Element>;

impl Element {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Element::Single(s) => Some(s),
            Element::MultiValue(_) => None,
        }
    }

    pub fn contains(&self, literal: &str) -> bool {
        match self {
            Element::Single(s) => s == literal,
            Element::MultiValue(set) => set.contains(literal),
        }
    }

    /// All strings of the element.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let (single, multi) = match self {
            Element::Single(s) => (Some(s.as_str()), None),
            Element::MultiValue(set) => (None, Some(set.iter().map(String::as_str))),
        };
        single.into_iter().chain(multi.into_iter().flatten())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Element::Single(s) => s.is_empty(),
            Element::MultiValue(set) => set.is_empty(),
        }
    }

    /// Render the element as a tuple dimension of a pattern: multi-value elements become
    /// `|`-joined alternatives and the tuple metacharacters are escaped.
    pub fn to_pattern(&self) -> String {
        match self {
            Element::Single(s) => escape_literal(s),
            Element::MultiValue(set) => set.iter().map(|s| escape_literal(s)).join("|"),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Single(s) => f.write_str(s),
            Element::MultiValue(set) => write!(f, "{}", set.iter().format("|")),
        }
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Element::Single(value.to_owned())
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Element::Single(value)
    }
}

impl From<BTreeSet<String>> for Element {
    fn from(value: BTreeSet<String>) -> Self {
        Element::MultiValue(value)
    }
}

impl<const N: usize> From<[&str; N]> for Element {
    fn from(values: [&str; N]) -> Self {
        Element::MultiValue(values.into_iter().map(str::to_owned).collect())
    }
}

/// Build a sequence from rows of strings.
///
/// ```
/// use seq_regex::sequence::{tuples, Element};
///
/// let seq = tuples([["Apple", "ORG"], ["released", "VERB"]]);
/// assert_eq!(seq[1][0], Element::from("released"));
/// ```
pub fn tuples<R, E>(rows: impl IntoIterator<Item = R>) -> Vec<Tuple>
where
    R: IntoIterator<Item = E>,
    E: Into<Element>,
{
    rows.into_iter()
        .map(|row| row.into_iter().map(Into::into).collect())
        .collect()
}

/// Escape `\`, `/`, `:`, `|` and a leading `^` so that `s` is read back as one literal.
pub fn escape_literal(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        match c {
            '\\' | '/' | ':' | '|' => escaped.push('\\'),
            '^' if i == 0 => escaped.push('\\'),
            _ => (),
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element() {
        let e = Element::from("NN");
        assert!(e.contains("NN"));
        assert!(e.contains("N") == false);
        assert_eq!(e.values().collect::<Vec<_>>(), ["NN"]);

        let e = Element::from(["PERSON", "ARTIST"]);
        assert!(e.contains("ARTIST"));
        assert_eq!(e.values().collect::<Vec<_>>(), ["ARTIST", "PERSON"]);
        assert_eq!(e.to_string(), "ARTIST|PERSON");
        assert_eq!(e.as_single(), None);
    }

    #[test]
    fn escape() {
        assert_eq!(escape_literal("a/b"), r"a\/b");
        assert_eq!(escape_literal("^x^"), r"\^x^");
        assert_eq!(escape_literal(r"1:2|3\"), r"1\:2\|3\\");
        assert_eq!(Element::from(["a|b", "c"]).to_pattern(), r"a\|b|c");
    }

    #[test]
    fn tuples_from_rows() {
        let seq = tuples([["a", "b"], ["c", "d"]]);
        assert_eq!(seq.len(), 2);
        assert_eq!(seq[1], vec![Element::from("c"), Element::from("d")]);
    }
}
