/*!
Pattern induction.

A *trigger* pattern is written against a few example substitutions, e.g. a subject and object
known to be related. Every match of every variant in a corpus yields a generated pattern: the
concatenation of the trigger's named groups, formatted by their format specs. Groups formatted
with `@@` keep the trigger's own text, so the generated patterns generalize over the examples.

## Example
```
use seq_regex::{bootstrap::bootstrap, sequence::tuples, Substitution, Substitutions};

let example = |s: &str, o: &str| {
    Substitutions::from([
        ("S".to_owned(), Substitution::from(s)),
        ("O".to_owned(), Substitution::from(o)),
    ])
};
let trigger = "(?P<subj@@>/S/) (?P<verb@1>.) (?P<obj@@>/O/)";
let examples = [example("Apple", "iPhone"), example("Google", "Pixel")];
let corpus = [
    tuples([["Apple", "ORG"], ["released", "VERB"], ["iPhone", "PRODUCT"]]),
    tuples([["Google", "ORG"], ["launched", "VERB"], ["Pixel", "PRODUCT"]]),
];
let ranked = bootstrap(2, trigger, &examples, &corpus)?;
assert_eq!(ranked, [("/S//:VERB//O/".to_owned(), 2)]);
# Ok::<(), seq_regex::Error>(())
```
*/
use bon::bon;
use indexmap::IndexMap;
use regex_automata::meta;
use tracing::debug;

use crate::{
    error::Error,
    regex::CompiledPattern,
    sequence::Tuple,
    syntax::Substitutions,
};

/// Generated pattern to the number of matches that produced it, in first-observation order.
type Counter = IndexMap<String, usize>;

/// Compiled variants of a trigger pattern.
#[derive(Clone, Debug)]
pub struct Bootstrap {
    patterns: Vec<CompiledPattern>,
    trimmed: bool,
}

#[bon]
impl Bootstrap {
    #[builder(builder_type = BootstrapBuilder, finish_fn = build)]
    pub fn builder(
        /// The number of dimensions of every tuple.
        ndim: usize,
        /// The pattern to compile once per substitution map.
        #[builder(into)]
        trigger: String,
        /// One map per example.
        #[builder(into)]
        substitutions: Vec<Substitutions>,
        /// Strip the `(?P<name@@>`/`)` wrapper of `@@` groups.
        #[builder(default = true)]
        trimmed: bool,
        /// Config of the underlying regex engine.
        #[builder(default)]
        meta: meta::Config,
    ) -> Result<Self, Error> {
        let patterns = substitutions
            .into_iter()
            .map(|substitutions| {
                CompiledPattern::builder()
                    .ndim(ndim)
                    .substitutions(substitutions)
                    .meta(meta.clone())
                    .build(&trigger)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns, trimmed })
    }
}

impl Bootstrap {
    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Count the generated patterns of one sequence.
    fn count(&self, sequence: &[Tuple], counter: &mut Counter) -> Result<(), Error> {
        for pattern in self.patterns.iter() {
            if pattern.is_useless_for(sequence) {
                continue;
            }
            let mut matches = pattern.find_iter(sequence)?;
            for m in matches.by_ref() {
                *counter.entry(m.format_named_groups(self.trimmed)).or_default() += 1;
            }
            if let Some(e) = matches.take_error() {
                return Err(e);
            }
        }
        Ok(())
    }

    /// Generated patterns sorted by descending frequency. Ties keep first-observation order.
    pub fn run<S>(&self, sequences: impl IntoIterator<Item = S>) -> Result<Vec<(String, usize)>, Error>
    where
        S: AsRef<[Tuple]>,
    {
        let mut counter = Counter::new();
        let mut n = 0;
        for sequence in sequences {
            self.count(sequence.as_ref(), &mut counter)?;
            n += 1;
        }
        debug!(sequences = n, generated = counter.len(), "bootstrap finished");
        Ok(rank(counter))
    }

    /// [`run()`](Self::run) with sequences processed in parallel. The result is the same.
    #[cfg(feature = "rayon")]
    pub fn par_run<I, S>(&self, sequences: I) -> Result<Vec<(String, usize)>, Error>
    where
        I: rayon::iter::IntoParallelIterator<Item = S>,
        S: AsRef<[Tuple]> + Send,
    {
        use rayon::prelude::*;

        let counters = sequences
            .into_par_iter()
            .map(|sequence| {
                let mut counter = Counter::new();
                self.count(sequence.as_ref(), &mut counter)?;
                Ok(counter)
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let n = counters.len();
        let mut merged = Counter::new();
        for counter in counters {
            for (generated, count) in counter {
                *merged.entry(generated).or_default() += count;
            }
        }
        debug!(sequences = n, generated = merged.len(), "parallel bootstrap finished");
        Ok(rank(merged))
    }
}

fn rank(counter: Counter) -> Vec<(String, usize)> {
    let mut ranked: Vec<_> = counter.into_iter().collect();
    // Stable
    ranked.sort_by(|(_, a), (_, b)| b.cmp(a));
    ranked
}

/// Run a [`Bootstrap`] with default options.
pub fn bootstrap<S>(
    ndim: usize,
    trigger: &str,
    substitutions: &[Substitutions],
    sequences: impl IntoIterator<Item = S>,
) -> Result<Vec<(String, usize)>, Error>
where
    S: AsRef<[Tuple]>,
{
    Bootstrap::builder()
        .ndim(ndim)
        .trigger(trigger)
        .substitutions(substitutions.to_vec())
        .build()?
        .run(sequences)
}
