use std::{ops::Range, sync::Arc};

use itertools::Itertools;
use tracing::warn;

use crate::{
    encode::PLACEHOLDER_LEN,
    engine::Engine,
    error::Error,
    sequence::Tuple,
    syntax::{FormatSpec, GroupTable},
};

/// A match of a [`CompiledPattern`](crate::CompiledPattern) in a sequence.
///
/// Group 0 is the whole match. Spans are tuple indices into the searched sequence.
#[derive(Clone, Debug)]
pub struct SeqMatch<'s> {
    sequence: &'s [Tuple],
    spans: Vec<Option<Range<usize>>>,
    groups: Arc<GroupTable>,
    ndim: usize,
}

/// A matched capture group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeqGroup<'s> {
    index: usize,
    tuples: &'s [Tuple],
    start: usize,
    end: usize,
}

impl<'s> SeqGroup<'s> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_slice(&self) -> &'s [Tuple] {
        self.tuples
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl<'s> SeqMatch<'s> {
    /// The whole match.
    pub fn group(&self) -> SeqGroup<'s> {
        let range = self.spans.first().cloned().flatten().unwrap_or(0..0);
        self.to_group(0, range)
    }

    pub fn start(&self) -> usize {
        self.group().start
    }

    pub fn end(&self) -> usize {
        self.group().end
    }

    pub fn range(&self) -> Range<usize> {
        self.group().range()
    }

    pub fn as_slice(&self) -> &'s [Tuple] {
        self.group().tuples
    }

    /// `None` if the group does not exist or did not participate in the match.
    pub fn get(&self, index: usize) -> Option<SeqGroup<'s>> {
        let range = self.spans.get(index).cloned().flatten()?;
        Some(self.to_group(index, range))
    }

    pub fn name(&self, name: &str) -> Option<SeqGroup<'s>> {
        self.get(self.groups.get(name)?.index)
    }

    /// The number of groups, including group 0.
    pub fn group_len(&self) -> usize {
        self.spans.len()
    }

    /// All groups in index order.
    pub fn iter(&self) -> impl Iterator<Item = Option<SeqGroup<'s>>> + '_ {
        (0..self.spans.len()).map(|i| self.get(i))
    }

    /// Named groups in index order.
    pub fn named_groups(&self) -> impl Iterator<Item = (&str, Option<SeqGroup<'s>>)> + '_ {
        self.groups
            .named()
            .iter()
            .map(|g| (g.name.as_str(), self.get(g.index)))
    }

    fn to_group(&self, index: usize, range: Range<usize>) -> SeqGroup<'s> {
        SeqGroup {
            index,
            tuples: self.sequence.get(range.clone()).unwrap_or_default(),
            start: range.start,
            end: range.end,
        }
    }

    /// Format a named group according to its format spec.
    ///
    /// Matched tuples are rendered back into pattern syntax, e.g. `/Apple/ /released:VERB/`:
    /// dimensions outside the spec are emptied, trailing empty dimensions are dropped and a
    /// tuple left with nothing is rendered as `.`. With `@@`, the group's own source is returned
    /// instead (`trimmed` strips the `(?P<name@@>` and `)` around it).
    ///
    /// Unknown groups and groups that did not participate in the match give an empty string.
    pub fn format_group_to_str(&self, name: &str, trimmed: bool) -> String {
        let Some(group) = self.groups.get(name) else {
            return String::new();
        };
        let Some(matched) = self.get(group.index) else {
            return String::new();
        };
        match &group.format {
            Some(FormatSpec::Source) => {
                if trimmed {
                    group.source_trimmed().to_owned()
                } else {
                    group.source.clone()
                }
            }
            Some(FormatSpec::Dimensions(ranges)) => format_tuples(matched.tuples, ranges),
            None => format_tuples(matched.tuples, &[0..self.ndim]),
        }
    }

    /// All named groups formatted by [`format_group_to_str()`](Self::format_group_to_str) and
    /// concatenated in index order.
    pub fn format_named_groups(&self, trimmed: bool) -> String {
        self.groups
            .named()
            .iter()
            .map(|g| self.format_group_to_str(&g.name, trimmed))
            .collect()
    }
}

fn format_tuples(tuples: &[Tuple], ranges: &[Range<usize>]) -> String {
    tuples.iter().map(|tuple| format_tuple(tuple, ranges)).join(" ")
}

fn format_tuple(tuple: &Tuple, ranges: &[Range<usize>]) -> String {
    let mut dims: Vec<String> = tuple
        .iter()
        .enumerate()
        .map(|(d, element)| {
            if ranges.iter().any(|r| r.contains(&d)) {
                element.to_pattern()
            } else {
                String::new()
            }
        })
        .collect();
    while dims.last().is_some_and(String::is_empty) {
        dims.pop();
    }
    if dims.is_empty() {
        ".".to_owned()
    } else {
        format!("/{}/", dims.join(":"))
    }
}

/// An iterator over non-overlapping matches, left to right.
///
/// Created by [`CompiledPattern::find_iter()`](crate::CompiledPattern::find_iter).
/// A search of the backtracking engine can fail; the iteration then ends early and
/// [`take_error()`](Self::take_error) returns the error.
pub struct Matches<'r, 's> {
    engine: &'r Engine,
    groups: Arc<GroupTable>,
    ndim: usize,
    sequence: &'s [Tuple],
    haystack: String,
    caps: Option<regex_automata::util::captures::Captures>,
    at: usize,
    last_end: Option<usize>,
    error: Option<Error>,
}

impl<'r, 's> Matches<'r, 's> {
    pub(crate) fn new(
        engine: &'r Engine,
        groups: Arc<GroupTable>,
        ndim: usize,
        sequence: &'s [Tuple],
        haystack: String,
    ) -> Self {
        Self {
            engine,
            groups,
            ndim,
            sequence,
            haystack,
            caps: None,
            at: 0,
            last_end: None,
            error: None,
        }
    }

    /// The error that ended the iteration, if any.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    fn tuple_len(&self) -> usize {
        PLACEHOLDER_LEN * self.ndim
    }

    fn to_tuple_range(&self, span: Range<usize>) -> Range<usize> {
        let len = self.tuple_len();
        span.start / len..span.end.div_ceil(len)
    }
}

impl<'r, 's> Iterator for Matches<'r, 's> {
    type Item = SeqMatch<'s>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.at > self.haystack.len() {
                return None;
            }
            let found = self.engine.find_at(
                &self.haystack,
                self.at,
                self.tuple_len(),
                self.groups.captures(),
                &mut self.caps,
            );
            let spans = match found {
                Ok(Some(spans)) => spans,
                Ok(None) => {
                    self.at = self.haystack.len() + 1;
                    return None;
                }
                Err(e) => {
                    warn!(error = %e, at = self.at, "search failed");
                    self.error = Some(e);
                    self.at = self.haystack.len() + 1;
                    return None;
                }
            };
            let whole = spans.first().cloned().flatten()?;

            if whole.is_empty() {
                self.at = whole.end + self.tuple_len();
                if self.last_end == Some(whole.end) {
                    // Empty match right after the previous one
                    continue;
                }
            } else {
                self.at = whole.end;
            }
            self.last_end = Some(whole.end);

            let spans = spans
                .into_iter()
                .map(|span| span.map(|span| self.to_tuple_range(span)))
                .collect();
            return Some(SeqMatch {
                sequence: self.sequence,
                spans,
                groups: self.groups.clone(),
                ndim: self.ndim,
            });
        }
    }
}

impl std::iter::FusedIterator for Matches<'_, '_> {}

#[cfg(test)]
mod tests {
    use crate::sequence::{tuples, Element};

    use super::*;

    #[test]
    fn format() {
        let tuple = tuples([["Apple", "ORG", "x"]]).remove(0);
        assert_eq!(format_tuple(&tuple, &[0..3]), "/Apple:ORG:x/");
        assert_eq!(format_tuple(&tuple, &[0..1]), "/Apple/");
        assert_eq!(format_tuple(&tuple, &[1..2]), "/:ORG/");
        assert_eq!(format_tuple(&tuple, &[0..1, 2..3]), "/Apple::x/");
        assert_eq!(format_tuple(&tuple, &[]), ".");

        let tuple = vec![Element::from("a/b"), Element::from(["P", "Q"])];
        assert_eq!(format_tuple(&tuple, &[0..2]), r"/a\/b:P|Q/");

        let seq = tuples([["a", "b"], ["c", "d"]]);
        assert_eq!(format_tuples(&seq, &[1..2]), "/:b/ /:d/");
        assert_eq!(format_tuples(&[], &[0..2]), "");
    }
}
