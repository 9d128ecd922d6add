/*!
Regex engines a flattened pattern runs on.

[`meta::Regex`] runs every pattern it can express. Look-around, back-references and conditionals
need backtracking and are run by [`fancy_regex`] instead, which is slower but shares the same
capture group numbering and byte offsets.
*/
use std::ops::Range;

use regex_automata::{meta, Anchored, Input};
use tracing::trace;

use crate::error::Error;

/// Byte spans of the pattern's capture groups. Index 0 is the whole match.
pub(crate) type Spans = Vec<Option<Range<usize>>>;

#[derive(Clone, Debug)]
pub enum Engine {
    /// `(?s:.{ndim})*?(flat)`, searched anchored at a tuple boundary.
    Meta(meta::Regex),
    /// `(flat)`, searched unanchored. Matches starting inside a tuple are retried at the next
    /// boundary.
    Backtracking(fancy_regex::Regex),
}

impl Engine {
    pub(crate) fn build(
        flat: &str,
        ndim: usize,
        backtracking: bool,
        meta: meta::Config,
        backtrack_limit: Option<usize>,
    ) -> Result<Self, Error> {
        if backtracking {
            let mut builder = fancy_regex::RegexBuilder::new(&format!("({flat})"));
            if let Some(limit) = backtrack_limit {
                builder.backtrack_limit(limit);
            }
            Ok(Engine::Backtracking(builder.build()?))
        } else {
            // Anchored searches skip whole tuples before the match
            let wrapped = format!("(?s:.{{{ndim}}})*?({flat})");
            Ok(Engine::Meta(
                meta::Regex::builder().configure(meta).build(&wrapped)?,
            ))
        }
    }

    pub fn is_backtracking(&self) -> bool {
        matches!(self, Engine::Backtracking(_))
    }

    /// The leftmost match starting at a tuple boundary at or after `at`, itself a boundary.
    ///
    /// Returns the spans of the whole match and of the first `groups` capture groups.
    /// `caps` is scratch space for [`Engine::Meta`], allocated on first use.
    pub(crate) fn find_at(
        &self,
        haystack: &str,
        at: usize,
        tuple_len: usize,
        groups: usize,
        caps: &mut Option<regex_automata::util::captures::Captures>,
    ) -> Result<Option<Spans>, Error> {
        match self {
            Engine::Meta(regex) => {
                let caps = caps.get_or_insert_with(|| regex.create_captures());
                let input = Input::new(haystack)
                    .span(at..haystack.len())
                    .anchored(Anchored::Yes);
                regex.search_captures(&input, caps);
                if !caps.is_match() {
                    return Ok(None);
                }
                Ok(Some(
                    (1..=groups + 1)
                        .map(|i| caps.get_group(i).map(|span| span.range()))
                        .collect(),
                ))
            }
            Engine::Backtracking(regex) => {
                let mut at = at;
                while at <= haystack.len() {
                    let Some(found) = regex.captures_from_pos(haystack, at)? else {
                        return Ok(None);
                    };
                    let Some(whole) = found.get(1) else {
                        return Ok(None);
                    };
                    if whole.start() % tuple_len == 0 {
                        return Ok(Some(
                            (1..=groups + 1)
                                .map(|i| found.get(i).map(|m| m.start()..m.end()))
                                .collect(),
                        ));
                    }
                    // No match starts between `at` and `whole.start()`
                    trace!(start = whole.start(), "match inside a tuple");
                    at = whole.start().next_multiple_of(tuple_len);
                }
                Ok(None)
            }
        }
    }
}
