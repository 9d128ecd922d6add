//! Cheap rejection of sequences that can't match.
use std::collections::{BTreeSet, HashSet};

use tracing::trace;

use crate::{sequence::Tuple, syntax::ParsedPattern};

/// Required literals of every top-level alternative of a pattern.
///
/// Sound but not complete: [`is_useless_for()`](Prefilter::is_useless_for) never rejects a
/// sequence the pattern matches, but may accept sequences it doesn't.
#[derive(Clone, Debug, Default)]
pub struct Prefilter {
    /// Per alternative, clauses that must all be satisfied.
    alternatives: Vec<Vec<BTreeSet<String>>>,
}

impl Prefilter {
    pub fn from_parsed(parsed: &ParsedPattern) -> Self {
        Self {
            alternatives: parsed.positive_literal_sets().map(<[_]>::to_vec).collect(),
        }
    }

    /// Whether no alternative can match `sequence`.
    pub fn is_useless_for(&self, sequence: &[Tuple]) -> bool {
        let present: HashSet<&str> = sequence
            .iter()
            .flatten()
            .flat_map(|element| element.values())
            .collect();
        let useless = self.alternatives.iter().all(|clauses| {
            clauses
                .iter()
                .any(|clause| clause.iter().all(|literal| !present.contains(literal.as_str())))
        });
        if useless {
            trace!(tuples = sequence.len(), "prefilter rejected sequence");
        }
        useless
    }
}
