use std::ops::Range;

use crate::error::PatternErrorKind;

/// Output directive of a named group, `(?P<name@spec>...)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatSpec {
    /// Half-open dimension ranges to keep; other dimensions are rendered empty.
    Dimensions(Vec<Range<usize>>),
    /// `@@`: output the group's own pattern source instead of the matched data.
    Source,
}

impl FormatSpec {
    /// Parse the text after `@`.
    ///
    /// - `` (empty): all dimensions.
    /// - `@`: [`FormatSpec::Source`].
    /// - `0,2`, `1:3`, `1:`, `:2` or mixed: dimension indices and half-open ranges.
    ///
    /// On error returns the byte offset in `spec` of the offending item.
    pub fn parse(spec: &str, ndim: usize) -> Result<Self, (PatternErrorKind, usize)> {
        let mut significant = spec.chars().filter(|c| !c.is_whitespace());
        match (significant.next(), significant.next()) {
            (None, _) => return Ok(FormatSpec::Dimensions(vec![0..ndim])),
            (Some('@'), None) => return Ok(FormatSpec::Source),
            _ => (),
        }

        let parse_index = |s: &str, offset: usize| {
            s.trim()
                .parse::<usize>()
                .map_err(|_| (PatternErrorKind::InvalidFormatSpec, offset))
        };
        let mut ranges = Vec::new();
        let mut offset = 0;
        for item in spec.split(',') {
            let item_offset = offset + (item.len() - item.trim_start().len());
            offset += item.len() + 1;

            let range = match item.split_once(':') {
                Some((low, high)) => {
                    let low = if low.trim().is_empty() {
                        0
                    } else {
                        parse_index(low, item_offset)?
                    };
                    let high = if high.trim().is_empty() {
                        ndim
                    } else {
                        parse_index(high, item_offset)?
                    };
                    if low >= ndim || high > ndim {
                        return Err((PatternErrorKind::OutOfDimensionRange, item_offset));
                    }
                    if low >= high {
                        return Err((PatternErrorKind::InvalidFormatSpec, item_offset));
                    }
                    low..high
                }
                None => {
                    let i = parse_index(item, item_offset)?;
                    if i >= ndim {
                        return Err((PatternErrorKind::OutOfDimensionRange, item_offset));
                    }
                    i..i + 1
                }
            };
            ranges.push(range);
        }
        Ok(FormatSpec::Dimensions(ranges))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedGroup {
    pub name: String,
    /// Capture group index in the automaton.
    pub index: usize,
    /// `None` if the name has no `@`.
    pub format: Option<FormatSpec>,
    /// `(?P<name...>...)`, as written in the pattern.
    pub source: String,
}

impl NamedGroup {
    /// The source with the `(?P<name...>` and `)` wrapper stripped.
    pub fn source_trimmed(&self) -> &str {
        let start = self.source.find('>').map_or(0, |i| i + 1);
        let end = self.source.len().saturating_sub(1).max(start);
        self.source.get(start..end).unwrap_or_default()
    }
}

/// Capture groups of a parsed pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupTable {
    captures: usize,
    /// In index order.
    named: Vec<NamedGroup>,
}

impl GroupTable {
    /// Number of capture groups, excluding the implicit whole match group.
    pub fn captures(&self) -> usize {
        self.captures
    }

    pub fn named(&self) -> &[NamedGroup] {
        &self.named
    }

    pub fn get(&self, name: &str) -> Option<&NamedGroup> {
        self.named.iter().find(|g| g.name == name)
    }

    pub fn format_spec(&self, name: &str) -> Option<&FormatSpec> {
        self.get(name).and_then(|g| g.format.as_ref())
    }

    pub fn source(&self, name: &str, trimmed: bool) -> Option<&str> {
        self.get(name).map(|g| {
            if trimmed {
                g.source_trimmed()
            } else {
                g.source.as_str()
            }
        })
    }

    /// Returns the new group's index.
    pub(crate) fn push_unnamed(&mut self) -> usize {
        self.captures += 1;
        self.captures
    }

    /// Returns the position of the new group in [`named()`](Self::named).
    pub(crate) fn push_named(&mut self, name: String, format: Option<FormatSpec>) -> usize {
        let index = self.push_unnamed();
        self.named.push(NamedGroup {
            name,
            index,
            format,
            source: String::new(),
        });
        self.named.len() - 1
    }

    pub(crate) fn set_source(&mut self, i: usize, source: &str) {
        if let Some(group) = self.named.get_mut(i) {
            group.source = source.to_owned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_spec() {
        assert_eq!(
            FormatSpec::parse("", 3),
            Ok(FormatSpec::Dimensions(vec![0..3]))
        );
        assert_eq!(FormatSpec::parse("@", 3), Ok(FormatSpec::Source));
        assert_eq!(FormatSpec::parse(" @ ", 3), Ok(FormatSpec::Source));
        assert_eq!(
            FormatSpec::parse(" 0 , 1 : 3", 3),
            Ok(FormatSpec::Dimensions(vec![0..1, 1..3]))
        );
        assert_eq!(
            FormatSpec::parse("0,1:3", 3),
            Ok(FormatSpec::Dimensions(vec![0..1, 1..3]))
        );
        assert_eq!(
            FormatSpec::parse("1:,:1", 3),
            Ok(FormatSpec::Dimensions(vec![1..3, 0..1]))
        );
        assert_eq!(
            FormatSpec::parse("0,3", 3),
            Err((PatternErrorKind::OutOfDimensionRange, 2))
        );
        assert_eq!(
            FormatSpec::parse("1:4", 3),
            Err((PatternErrorKind::OutOfDimensionRange, 0))
        );
        assert_eq!(
            FormatSpec::parse("2:1", 3),
            Err((PatternErrorKind::InvalidFormatSpec, 0))
        );
        assert_eq!(
            FormatSpec::parse("0,x", 3),
            Err((PatternErrorKind::InvalidFormatSpec, 2))
        );
        assert_eq!(
            FormatSpec::parse("@@", 3),
            Err((PatternErrorKind::InvalidFormatSpec, 0))
        );
    }

    #[test]
    fn source_trimmed() {
        let group = NamedGroup {
            name: "x".into(),
            index: 1,
            format: Some(FormatSpec::Source),
            source: "(?P<x@@>.{0,5})".into(),
        };
        assert_eq!(group.source_trimmed(), ".{0,5}");
    }
}
