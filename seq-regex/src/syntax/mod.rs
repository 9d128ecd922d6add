/*!
Pattern syntax.

A pattern is ordinary regex syntax over *tuples*. A tuple is written between slashes, with one
`:`-separated slot per dimension:

```text
/Apple:ORG/          token "Apple" tagged ORG
/:NN|NNS/            any token tagged NN or NNS
/^the|a:DT/          a determiner other than "the" or "a"
/1:3/                trailing dimensions may be omitted
.                    any tuple, same as /::/ with 3 dimensions
```

Inside a tuple, `\` escapes `/ : | ^ \`; everything else (whitespace included) is part of a
literal. Outside of tuples, whitespace is ignored, groups, alternation, quantifiers and
anchors are passed to the regex engine, and the following extensions are recognized:

| Extension | |
| --- | --- |
| `(?:...)` | Non-capturing group |
| `(?P<name>...)` | Named group |
| `(?P<name@spec>...)` | Named group with a [format spec](FormatSpec) |
| `(?P=name)` | Back-reference |
| `(?#...)` | Comment |
| `(?=...)`, `(?!...)`, `(?<=...)`, `(?<!...)` | Look-around |
| `(?(name)...)`, `(?(1)...)` | Conditional |

Patterns with back-references, look-around or conditionals run on a backtracking engine; see
[`ParsedPattern::needs_backtracking()`]. Look-behind must have a fixed length.
*/
use std::collections::{BTreeSet, HashMap};

use crate::error::PatternError;

mod group;
mod lex;
mod parse;
mod token;

pub use group::{FormatSpec, GroupTable, NamedGroup};
pub use token::{Token, TokenKind};

/// Replacement of a tuple literal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Substitution {
    Single(String),
    /// Any of the values. Must not be empty.
    Alternatives(Vec<String>),
}

impl Substitution {
    pub fn values(&self) -> &[String] {
        match self {
            Substitution::Single(s) => std::slice::from_ref(s),
            Substitution::Alternatives(values) => values,
        }
    }
}

impl From<&str> for Substitution {
    fn from(value: &str) -> Self {
        Substitution::Single(value.to_owned())
    }
}

impl From<String> for Substitution {
    fn from(value: String) -> Self {
        Substitution::Single(value)
    }
}

impl From<Vec<String>> for Substitution {
    fn from(values: Vec<String>) -> Self {
        Substitution::Alternatives(values)
    }
}

impl From<Vec<&str>> for Substitution {
    fn from(values: Vec<&str>) -> Self {
        Substitution::Alternatives(values.into_iter().map(str::to_owned).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Substitution {
    fn from(values: [&str; N]) -> Self {
        Substitution::Alternatives(values.into_iter().map(str::to_owned).collect())
    }
}

/// Literal to substitution.
pub type Substitutions = HashMap<String, Substitution>;

/// Literals of one top-level alternative.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiteralSets {
    /// Conjunction of clauses. For the alternative to match, at least one literal of every
    /// clause must occur in the sequence.
    pub positive: Vec<BTreeSet<String>>,
    /// Literals of negated sets.
    pub negative: BTreeSet<String>,
}

#[derive(Clone, Debug)]
pub struct ParsedPattern {
    ndim: usize,
    tokens: Vec<Token>,
    groups: GroupTable,
    literal_sets: Vec<LiteralSets>,
    has_negated_set: bool,
    has_backreference: bool,
    needs_backtracking: bool,
}

impl ParsedPattern {
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The pattern as pseudo-regex, with literals quoted.
    ///
    /// ```
    /// use seq_regex::syntax::{parse, Substitutions};
    ///
    /// let parsed = parse(3, "/^2|4^:7^9:^2/", &Substitutions::new()).unwrap();
    /// assert_eq!(parsed.dump(), r#"(?:[^"2""4^"]"7^9"[^"2"])"#);
    /// ```
    pub fn dump(&self) -> String {
        token::dump(&self.tokens)
    }

    pub fn exists_negative_set(&self) -> bool {
        self.has_negated_set
    }

    pub fn has_backreference(&self) -> bool {
        self.has_backreference
    }

    /// Uses look-around, back-references or conditionals.
    pub fn needs_backtracking(&self) -> bool {
        self.needs_backtracking
    }

    /// One entry per top-level alternative.
    pub fn literal_sets(&self) -> &[LiteralSets] {
        &self.literal_sets
    }

    pub fn positive_literal_sets(&self) -> impl Iterator<Item = &[BTreeSet<String>]> {
        self.literal_sets.iter().map(|sets| sets.positive.as_slice())
    }

    pub fn groups(&self) -> &GroupTable {
        &self.groups
    }

    pub fn format_spec(&self, name: &str) -> Option<&FormatSpec> {
        self.groups.format_spec(name)
    }

    pub fn group_source(&self, name: &str, trimmed: bool) -> Option<&str> {
        self.groups.source(name, trimmed)
    }
}

/// Parse `pattern` for sequences of `ndim` dimensions.
pub fn parse(
    ndim: usize,
    pattern: &str,
    substitutions: &Substitutions,
) -> Result<ParsedPattern, PatternError> {
    parse::Parser::new(ndim, pattern, substitutions).parse()
}

#[cfg(test)]
mod tests {
    use crate::error::PatternErrorKind as Kind;

    use super::*;

    #[track_caller]
    fn dump(pattern: &str) -> String {
        parse(3, pattern, &Substitutions::new()).unwrap().dump()
    }

    #[track_caller]
    fn error(pattern: &str) -> (Kind, usize) {
        let e = parse(3, pattern, &Substitutions::new()).unwrap_err();
        (e.kind, e.offset)
    }

    fn set<const N: usize>(literals: [&str; N]) -> BTreeSet<String> {
        literals.into_iter().map(str::to_owned).collect()
    }

    #[test]
    fn outer() {
        assert_eq!(dump("0.23"), "0(?:...)23");
        assert_eq!(dump("(123)56"), "(123)56");
        assert_eq!(dump("(?P<45>78)0"), "(?P<45>78)0");
        assert_eq!(dump("(?#34)6"), "6");
        assert_eq!(dump("^ . * $"), "^(?:...)*$");
        assert_eq!(dump(".*?/a/+"), r#"(?:...)*?(?:"a"..)+"#);
        assert_eq!(dump("/a/{2} ./b/{,3}"), r#"(?:"a"..){2}(?:...)(?:"b"..){0,3}"#);
        assert_eq!(dump("(?=/a/)(?<!/b/)"), r#"(?=(?:"a"..))(?<!(?:"b"..))"#);
    }

    #[test]
    fn outer_error() {
        assert_eq!(error("(.23"), (Kind::UnbalancedParenthesis('('), 0));
        assert_eq!(error(").23"), (Kind::UnbalancedParenthesis(')'), 0));
        assert_eq!(error("012("), (Kind::UnbalancedParenthesis('('), 3));
        assert_eq!(error(r"012\456"), (Kind::InvalidEscape, 3));
        assert_eq!(error("012345["), (Kind::InvalidSetIndicator('['), 6));
        assert_eq!(error("]123456"), (Kind::InvalidSetIndicator(']'), 0));
        assert_eq!(error("(1(3"), (Kind::UnbalancedParenthesis('('), 2));
        assert_eq!(error("0(2)4)"), (Kind::UnbalancedParenthesis(')'), 5));
        assert_eq!(error("/a/{x}"), (Kind::InvalidRepetition, 3));
        assert_eq!(error("/a/{,}"), (Kind::InvalidRepetition, 3));
        assert_eq!(error("/a/{2"), (Kind::InvalidRepetition, 3));
    }

    #[test]
    fn extension_error() {
        assert_eq!(error("(?:34"), (Kind::UnbalancedParenthesis('('), 0));
        assert_eq!(error("(?P=45"), (Kind::UnterminatedName(')'), 4));
        assert_eq!(error("(?<345"), (Kind::UnknownExtension("?<3".into()), 1));
        assert_eq!(error("(?(34"), (Kind::UnterminatedName(')'), 3));
        assert_eq!(error("(?)"), (Kind::UnknownExtension("?)".into()), 1));
        assert_eq!(error("(?"), (Kind::UnexpectedEnd, 2));
        assert_eq!(error("(?P<a"), (Kind::UnterminatedName('>'), 4));
        assert_eq!(error("(?#a"), (Kind::UnterminatedComment, 0));
        assert_eq!(error("(?P=a)"), (Kind::UnknownGroupName("a".into()), 4));
        assert_eq!(error("(?(nope)/a/)"), (Kind::UnknownGroupName("nope".into()), 3));
        assert_eq!(error("(/a/)(?(2)/b/)"), (Kind::UnknownGroupName("2".into()), 8));
        assert_eq!(error("(?(x)/a/)(?P<x>/b/)"), (Kind::UnknownGroupName("x".into()), 3));
        assert_eq!(
            error("(?P<a>/x/)(?P<a>/y/)"),
            (Kind::DuplicateGroupName("a".into()), 14)
        );
    }

    #[test]
    fn whitespace() {
        assert_eq!(dump("( ?:/a/) (?P<x>/b/)"), r#"(?:(?:"a"..))(?P<x>(?:"b"..))"#);
        let parsed = parse(2, "( ?:/a/) (?P<x>/b/)", &Substitutions::new()).unwrap();
        assert_eq!(parsed.groups().captures(), 1);
        assert_eq!(parsed.groups().get("x").unwrap().index, 1);

        let parsed = parse(2, "( ?P< y @ 0 >/a/) /b/", &Substitutions::new()).unwrap();
        assert_eq!(parsed.dump(), r#"(?P<y>(?:"a".))(?:"b".)"#);
        assert_eq!(parsed.format_spec("y"), Some(&FormatSpec::Dimensions(vec![0..1])));
        assert_eq!(parsed.groups().captures(), 1);

        assert_eq!(dump(".{0, 5}"), "(?:...){0,5}");
        assert_eq!(dump("/a/ { 2 }"), r#"(?:"a"..){2}"#);
        assert_eq!(dump("/a/ * ?"), r#"(?:"a"..)*?"#);
        assert_eq!(dump("(? = /a/)(? < ! /b/)"), r#"(?=(?:"a"..))(?<!(?:"b"..))"#);
        assert_eq!(dump("( ?# note )/a/"), r#"(?:"a"..)"#);
        assert_eq!(error("( ?)"), (Kind::UnknownExtension("?)".into()), 2));
    }

    #[test]
    fn backtracking() {
        let parsed = |pattern: &str| parse(3, pattern, &Substitutions::new()).unwrap();
        assert!(parsed("(/a/) /b/ | /^c/").needs_backtracking() == false);
        assert!(parsed("(?!/:Z:/)/::/").needs_backtracking());
        assert!(parsed("(?<=/a/)/b/").needs_backtracking());
        let p = parsed("(?P<x>/a/) (?P=x)");
        assert!(p.needs_backtracking() && p.has_backreference());
        assert_eq!(p.dump(), r#"(?P<x>(?:"a"..))\k<x>"#);
        let p = parsed("(?P<x>/a/)? (?(x)/b/|/c/)");
        assert!(p.needs_backtracking() && p.has_backreference() == false);
        assert_eq!(
            p.dump(),
            r#"(?P<x>(?:"a"..))?(?(<x>)(?:"b"..)|(?:"c"..))"#
        );
        assert_eq!(parsed("(/a/)(?(1)/b/)").dump(), r#"((?:"a"..))(?(1)(?:"b"..))"#);
    }

    #[test]
    fn tuple() {
        assert_eq!(dump("0/2:4:6/8"), r#"0(?:"2""4""6")8"#);
        assert_eq!(dump("0(?P<56>/90:23:56/)90"), r#"0(?P<56>(?:"90""23""56"))90"#);
        assert_eq!(dump("/1:3:5/"), r#"(?:"1""3""5")"#);
        assert_eq!(dump("/1:3:/"), r#"(?:"1""3".)"#);
        assert_eq!(dump("/:2/"), r#"(?:."2".)"#);
        assert_eq!(dump("/1/"), r#"(?:"1"..)"#);
        assert_eq!(dump("//"), "(?:...)");
        assert_eq!(dump("/a b/"), r#"(?:"a b"..)"#);
    }

    #[test]
    fn tuple_error() {
        assert_eq!(error("/1:3:5:7/"), (Kind::OutOfDimensionRange, 7));
        assert_eq!(error("/1:3:5:/"), (Kind::OutOfDimensionRange, 7));
        assert_eq!(error("/1:3:5:7"), (Kind::OutOfDimensionRange, 7));
        assert_eq!(error("/1:3:5"), (Kind::UnbalancedSlash, 0));
        assert_eq!(error("./"), (Kind::UnbalancedSlash, 1));
    }

    #[test]
    fn escape() {
        assert_eq!(dump(r"/\:\/\|\\9/1"), r#"(?:":/|\9"..)1"#);
        assert_eq!(dump(r"/\:\/\|\8/0"), r#"(?:":/|\8"..)0"#);
        assert_eq!(dump("/.()[]*+?/"), r#"(?:".()[]*+?"..)"#);
        assert_eq!(dump(r"/1:\^:6/"), r#"(?:"1""^""6")"#);
    }

    #[test]
    fn boolean() {
        assert_eq!(dump("/1|3/"), r#"(?:["1""3"]..)"#);
        assert_eq!(dump("/1|/"), r#"(?:"1"..)"#);
        assert_eq!(dump("/|/"), "(?:...)");
        assert_eq!(dump("/^2|4^:7^9:^2/"), r#"(?:[^"2""4^"]"7^9"[^"2"])"#);
        assert_eq!(dump("/^|3/"), r#"(?:[^"3"]..)"#);
        assert_eq!(error("/^|/"), (Kind::UnexpectedNegativeSign, 1));
        assert_eq!(error("/^/"), (Kind::UnexpectedNegativeSign, 1));
    }

    #[test]
    fn char_offset() {
        assert_eq!(error("/自然:語/)"), (Kind::UnbalancedParenthesis(')'), 6));
        assert_eq!(dump("/自然:語/"), r#"(?:"自然""語".)"#);
    }

    #[test]
    fn substitution() {
        let substitutions = Substitutions::from([
            ("X".to_owned(), Substitution::from("Apple")),
            ("Y".to_owned(), Substitution::from(["ORG", "GPE"])),
            ("Z".to_owned(), Substitution::from(Vec::<String>::new())),
        ]);
        let parsed = parse(2, "/X:Y/ /x:Y|PER/", &substitutions).unwrap();
        assert_eq!(
            parsed.dump(),
            r#"(?:"Apple"["ORG""GPE"])(?:"x"["ORG""GPE""PER"])"#
        );
        let e = parse(2, "/a:Z/", &substitutions).unwrap_err();
        assert_eq!(e.kind, Kind::EmptySubstitution("Z".into()));
        assert_eq!(e.offset, 3);
    }

    #[test]
    fn groups() {
        let parsed = parse(
            2,
            "(/a/)(?P<subj@0>/:ORG/) (?:.) (?P<rule@@>.{0,5})",
            &Substitutions::new(),
        )
        .unwrap();
        let groups = parsed.groups();
        assert_eq!(groups.captures(), 3);
        assert_eq!(groups.get("subj").unwrap().index, 2);
        assert_eq!(groups.get("rule").unwrap().index, 3);
        assert_eq!(
            parsed.format_spec("subj"),
            Some(&FormatSpec::Dimensions(vec![0..1]))
        );
        assert_eq!(parsed.format_spec("rule"), Some(&FormatSpec::Source));
        assert_eq!(parsed.group_source("subj", false), Some("(?P<subj@0>/:ORG/)"));
        assert_eq!(parsed.group_source("rule", true), Some(".{0,5}"));
        assert_eq!(parsed.group_source("none", true), None);
        assert_eq!(
            parsed.dump(),
            r#"((?:"a".))(?P<subj>(?:."ORG"))(?:(?:..))(?P<rule>(?:..){0,5})"#
        );

        let e = parse(2, "(?P<a@2>.)", &Substitutions::new()).unwrap_err();
        assert_eq!((e.kind, e.offset), (Kind::OutOfDimensionRange, 6));
        let e = parse(2, "(?P<a@0,x>.)", &Substitutions::new()).unwrap_err();
        assert_eq!((e.kind, e.offset), (Kind::InvalidFormatSpec, 8));
    }

    #[test]
    fn negative_set() {
        let parsed = parse(3, "/a/ /^b/", &Substitutions::new()).unwrap();
        assert!(parsed.exists_negative_set());
        assert_eq!(parsed.literal_sets()[0].negative, set(["b"]));
        assert!(parse(3, "/a/", &Substitutions::new())
            .unwrap()
            .exists_negative_set()
            == false);
    }

    #[test]
    fn literal_sets() {
        let positive = |pattern: &str| {
            parse(3, pattern, &Substitutions::new())
                .unwrap()
                .positive_literal_sets()
                .map(<[_]>::to_vec)
                .collect::<Vec<_>>()
        };
        assert_eq!(
            positive("/a:b/ /c|d/"),
            [vec![set(["a"]), set(["b"]), set(["c", "d"])]]
        );
        assert_eq!(positive("/a/ | /b/"), [vec![set(["a"])], vec![set(["b"])]]);
        // Optional atoms
        assert_eq!(positive("/a/? /b/* /c/+ /d/{0,2} /e/{1}"), [vec![set(["c"]), set(["e"])]]);
        assert_eq!(positive("(/a/ /b/)?"), [vec![]]);
        // Groups
        assert_eq!(positive("(/a/ /b/) /c/"), [vec![set(["a"]), set(["b"]), set(["c"])]]);
        assert_eq!(positive("(/a/ /b/|/c/)"), [vec![set(["a", "c"])]]);
        assert_eq!(positive("(/a/|.)"), [vec![]]);
        // Assertions and negated sets
        assert_eq!(positive("(?=/a/)(?!/b/) /^c/"), [vec![]]);
        // A lazy modifier is not a quantifier
        assert_eq!(positive("/a/+? /b/"), [vec![set(["a"]), set(["b"])]]);
    }
}
