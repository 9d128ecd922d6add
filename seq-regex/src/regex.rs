use std::sync::Arc;

use bon::bon;
use regex_automata::meta;
use tracing::debug;

use crate::{
    encode::{Encoder, SequenceEncoder, Unmapped},
    engine::Engine,
    error::Error,
    matches::{Matches, SeqMatch},
    prefilter::Prefilter,
    sequence::Tuple,
    syntax::{self, GroupTable, ParsedPattern, Substitutions, TokenKind},
};

/// A pattern compiled for sequences of a fixed number of dimensions.
///
/// Immutable after construction; searches never change it, so it can be shared across threads.
///
/// # Example
/// ```
/// use seq_regex::{sequence::tuples, CompiledPattern};
///
/// let re = CompiledPattern::builder().ndim(2).build("/:DT/? /:JJ/* /:NN|NNS/")?;
/// let seq = tuples([["the", "DT"], ["big", "JJ"], ["dogs", "NNS"], ["bark", "VBP"]]);
/// let m = re.search(&seq)?.unwrap();
/// assert_eq!(m.range(), 0..3);
/// # Ok::<(), seq_regex::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct CompiledPattern {
    ndim: usize,
    source: String,
    substitutions: Substitutions,
    parsed: ParsedPattern,
    encoder: Encoder,
    /// The pattern with literals replaced by placeholders.
    flat: String,
    engine: Engine,
    groups: Arc<GroupTable>,
    prefilter: Prefilter,
}

#[bon]
impl CompiledPattern {
    pub fn new(ndim: usize, pattern: &str) -> Result<Self, Error> {
        Self::builder().ndim(ndim).build(pattern)
    }

    #[builder(builder_type = CompiledPatternBuilder, finish_fn = build)]
    pub fn builder(
        #[builder(finish_fn)] pattern: &str,
        /// The number of dimensions of every tuple.
        ndim: usize,
        /// Tuple literals to replace.
        #[builder(default)]
        substitutions: Substitutions,
        /// Config of the underlying regex engine.
        #[builder(default)]
        meta: meta::Config,
        /// Step limit of a backtracking search, for patterns with look-around,
        /// back-references or conditionals.
        backtrack_limit: Option<usize>,
    ) -> Result<Self, Error> {
        if ndim == 0 {
            return Err(Error::InvalidDimensions(ndim));
        }
        let parsed = syntax::parse(ndim, pattern, &substitutions)?;

        let mut encoder = Encoder::new();
        let mut flat = String::new();
        for token in parsed.tokens() {
            match (token.kind, &token.payload) {
                (TokenKind::Literal, Some(literal)) => flat.push(encoder.encode(literal, None)?),
                (_, Some(payload)) => flat.push_str(payload),
                (_, None) => (),
            }
        }
        #[cfg(test)]
        dbg!(parsed.dump(), &flat);

        let engine = Engine::build(
            &flat,
            ndim,
            parsed.needs_backtracking(),
            meta,
            backtrack_limit,
        )?;

        let groups = Arc::new(parsed.groups().clone());
        let prefilter = Prefilter::from_parsed(&parsed);
        debug!(
            pattern,
            flat_len = flat.len(),
            literals = encoder.len(),
            groups = groups.captures(),
            backtracking = engine.is_backtracking(),
            "compiled pattern"
        );
        Ok(Self {
            ndim,
            source: pattern.to_owned(),
            substitutions,
            parsed,
            encoder,
            flat,
            engine,
            groups,
            prefilter,
        })
    }
}

impl CompiledPattern {
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// The pattern text as given.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn substitutions(&self) -> &Substitutions {
        &self.substitutions
    }

    pub fn parsed(&self) -> &ParsedPattern {
        &self.parsed
    }

    /// See [`ParsedPattern::dump()`].
    pub fn dump(&self) -> String {
        self.parsed.dump()
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// The pattern as run by the regex engine, with literals replaced by placeholders.
    pub fn flat_pattern(&self) -> &str {
        &self.flat
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn groups(&self) -> &GroupTable {
        &self.groups
    }

    pub fn prefilter(&self) -> &Prefilter {
        &self.prefilter
    }

    fn is_compiled_from(&self, pattern: &str, substitutions: &Substitutions) -> bool {
        self.source == pattern && &self.substitutions == substitutions
    }

    /// Encode `sequence` into `ndim * sequence.len()` placeholders.
    ///
    /// Elements no literal of the pattern refers to share one wildcard placeholder, unless the
    /// pattern has a negated set or a back-reference. Then each distinct one gets its own.
    pub fn encode_sequence(&self, sequence: &[Tuple]) -> Result<String, Error> {
        let unmapped = if self.parsed.exists_negative_set() || self.parsed.has_backreference() {
            Unmapped::Unique
        } else {
            Unmapped::SharedWildcard
        };
        SequenceEncoder::new(&self.encoder, unmapped, self.ndim).encode(sequence)
    }

    /// Lazily iterate over non-overlapping matches.
    pub fn find_iter<'r, 's>(&'r self, sequence: &'s [Tuple]) -> Result<Matches<'r, 's>, Error> {
        let haystack = self.encode_sequence(sequence)?;
        Ok(Matches::new(
            &self.engine,
            self.groups.clone(),
            self.ndim,
            sequence,
            haystack,
        ))
    }

    /// The leftmost match.
    pub fn search<'s>(&self, sequence: &'s [Tuple]) -> Result<Option<SeqMatch<'s>>, Error> {
        let mut matches = self.find_iter(sequence)?;
        let found = matches.next();
        match matches.take_error() {
            Some(e) => Err(e),
            None => Ok(found),
        }
    }

    pub fn findall<'s>(&self, sequence: &'s [Tuple]) -> Result<Vec<SeqMatch<'s>>, Error> {
        let mut matches = self.find_iter(sequence)?;
        let all = matches.by_ref().collect();
        match matches.take_error() {
            Some(e) => Err(e),
            None => Ok(all),
        }
    }

    /// See [`Prefilter::is_useless_for()`].
    pub fn is_useless_for(&self, sequence: &[Tuple]) -> bool {
        self.prefilter.is_useless_for(sequence)
    }
}

/// A compiler with a one-pattern cache.
///
/// Compiling the same text with the same substitutions again returns the cached pattern.
/// The convenience methods taking pattern text reuse the cached pattern if the text is
/// the same, and otherwise compile it without substitutions.
#[derive(Clone, Debug)]
pub struct SeqRegex {
    ndim: usize,
    meta: meta::Config,
    backtrack_limit: Option<usize>,
    compiled: Option<CompiledPattern>,
}

#[bon]
impl SeqRegex {
    pub fn new(ndim: usize) -> Result<Self, Error> {
        Self::builder().ndim(ndim).build()
    }

    #[builder(builder_type = Builder, finish_fn = build)]
    pub fn builder(
        /// The number of dimensions of every tuple. Must be positive.
        ndim: usize,
        /// Config of the underlying regex engine.
        #[builder(default)]
        meta: meta::Config,
        /// See [`CompiledPattern::builder()`].
        backtrack_limit: Option<usize>,
    ) -> Result<Self, Error> {
        if ndim == 0 {
            return Err(Error::InvalidDimensions(ndim));
        }
        Ok(Self {
            ndim,
            meta,
            backtrack_limit,
            compiled: None,
        })
    }
}

impl SeqRegex {
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// The text of the cached pattern.
    pub fn pattern(&self) -> Option<&str> {
        self.compiled.as_ref().map(CompiledPattern::source)
    }

    pub fn compiled(&self) -> Option<&CompiledPattern> {
        self.compiled.as_ref()
    }

    /// Compile `pattern`, or return the cached pattern if it was compiled from the same text and
    /// substitutions. On error the cache is left empty.
    pub fn compile(
        &mut self,
        pattern: &str,
        substitutions: &Substitutions,
    ) -> Result<&CompiledPattern, Error> {
        let compiled = match self.compiled.take() {
            Some(compiled) if compiled.is_compiled_from(pattern, substitutions) => compiled,
            _ => CompiledPattern::builder()
                .ndim(self.ndim)
                .substitutions(substitutions.clone())
                .meta(self.meta.clone())
                .maybe_backtrack_limit(self.backtrack_limit)
                .build(pattern)?,
        };
        let compiled: &CompiledPattern = self.compiled.insert(compiled);
        Ok(compiled)
    }

    fn compile_text(&mut self, pattern: &str) -> Result<&CompiledPattern, Error> {
        let substitutions = match &self.compiled {
            Some(compiled) if compiled.source == pattern => compiled.substitutions.clone(),
            _ => Substitutions::new(),
        };
        self.compile(pattern, &substitutions)
    }

    pub fn find_iter<'r, 's>(
        &'r mut self,
        pattern: &str,
        sequence: &'s [Tuple],
    ) -> Result<Matches<'r, 's>, Error> {
        self.compile_text(pattern)?.find_iter(sequence)
    }

    pub fn search<'s>(
        &mut self,
        pattern: &str,
        sequence: &'s [Tuple],
    ) -> Result<Option<SeqMatch<'s>>, Error> {
        self.compile_text(pattern)?.search(sequence)
    }

    pub fn findall<'s>(
        &mut self,
        pattern: &str,
        sequence: &'s [Tuple],
    ) -> Result<Vec<SeqMatch<'s>>, Error> {
        self.compile_text(pattern)?.findall(sequence)
    }

    pub fn is_useless_for(&mut self, pattern: &str, sequence: &[Tuple]) -> Result<bool, Error> {
        Ok(self.compile_text(pattern)?.is_useless_for(sequence))
    }
}
