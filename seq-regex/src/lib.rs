/*!
Regular expressions over homogeneous n-dimensional sequences.

A sequence is a list of tuples with the same number of dimensions, e.g. `[token, part of speech,
entity tag]`. Patterns combine tuples with the usual regex operators; inside a tuple, `:`
separates dimensions (AND), `|` separates alternative values (OR) and a leading `^` negates a
dimension (NOT):

```
use seq_regex::{sequence::tuples, SeqRegex, Substitutions};

let mut re = SeqRegex::new(2)?;
let seq = tuples([["Apple", "ORG"], ["released", "VERB"], ["iPhone", "PRODUCT"]]);

let m = re
    .compile("(?P<subj@0>/:ORG/) .{0,1} (?P<obj@0>/:PRODUCT/)", &Substitutions::new())?
    .search(&seq)?
    .unwrap();
assert_eq!(m.range(), 0..3);
assert_eq!(m.format_group_to_str("subj", true), "/Apple/");
assert_eq!(m.format_group_to_str("obj", true), "/iPhone/");
# Ok::<(), seq_regex::Error>(())
```

See [`syntax`] for the pattern syntax and [`bootstrap`] for pattern induction.

## How it works
Every literal of a pattern is [encoded](encode) as one private-use code point, tuples become
fixed-width groups of `ndim` code points, and the resulting flat pattern is run by
[`regex_automata::meta::Regex`] over the sequence encoded the same way. Matches always start and
end at tuple boundaries, and are mapped back to tuple indices.

Patterns with look-around, back-references or conditionals run on [`fancy_regex`] instead; see
[`engine`].

## Performance
The following `Cargo.toml` settings are recommended if best performance is desired:
```toml
[profile.release]
lto = "fat"
codegen-units = 1
```
*/
//! ## Crate features
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(feature = "doc", doc = document_features::document_features!())]

pub mod bootstrap;
pub mod encode;
pub mod engine;
pub mod error;
pub mod matches;
pub mod prefilter;
pub mod regex;
pub mod sequence;
pub mod syntax;

pub use error::{Error, PatternError, PatternErrorKind};
pub use matches::{SeqGroup, SeqMatch};
pub use regex::{CompiledPattern, SeqRegex};
pub use sequence::{Element, Tuple};
pub use syntax::{Substitution, Substitutions};
