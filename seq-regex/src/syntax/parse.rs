use std::{collections::BTreeSet, mem};

use logos::{Lexer, Logos};

use crate::{
    error::{PatternError, PatternErrorKind as Kind},
    syntax::{
        group::{FormatSpec, GroupTable},
        lex::OuterToken,
        token::{Token, TokenKind},
        LiteralSets, ParsedPattern, Substitutions,
    },
};

/// At least one of the literals must occur in a sequence.
type Clause = BTreeSet<String>;

#[derive(Clone, Copy, PartialEq)]
enum FrameKind {
    /// Capturing or non-capturing group.
    Group,
    /// Look-around or conditional. Its literals prove nothing.
    Assertion,
}

struct Frame {
    kind: FrameKind,
    /// Byte offset of `(`.
    open: usize,
    /// Required clauses of each alternative.
    alternatives: Vec<Vec<Clause>>,
    /// Position in the group table, for named groups.
    named: Option<usize>,
}

impl Frame {
    fn new(kind: FrameKind, open: usize) -> Self {
        Self {
            kind,
            open,
            alternatives: vec![Vec::new()],
            named: None,
        }
    }

    /// Clauses the whole group requires.
    fn into_clauses(mut self) -> Vec<Clause> {
        if self.kind == FrameKind::Assertion {
            return Vec::new();
        }
        if self.alternatives.len() == 1 {
            return self.alternatives.pop().unwrap_or_default();
        }
        // (A & B) | C requires A | C
        if self.alternatives.iter().any(Vec::is_empty) {
            return Vec::new();
        }
        let union = self
            .alternatives
            .into_iter()
            .filter_map(|clauses| clauses.into_iter().next())
            .flatten()
            .collect();
        vec![union]
    }
}

/// One dimension of a tuple being scanned.
struct Dimension {
    /// Byte offset of the first char.
    start: usize,
    /// Byte offset of the negation `^`.
    negated: Option<usize>,
    /// Anything but a negation `^` seen.
    consumed: bool,
    values: Vec<String>,
}

impl Dimension {
    fn new(start: usize) -> Self {
        Self {
            start,
            negated: None,
            consumed: false,
            values: Vec::new(),
        }
    }
}

pub(crate) struct Parser<'p> {
    ndim: usize,
    pattern: &'p str,
    substitutions: &'p Substitutions,
    lex: Lexer<'p, OuterToken>,
    tokens: Vec<Token>,
    groups: GroupTable,
    root: Frame,
    frames: Vec<Frame>,
    /// Clauses of the last atom, dropped if a quantifier makes it optional.
    pending: Option<Vec<Clause>>,
    /// The last token was a quantifier, so a `?` is a lazy modifier.
    quantified: bool,
    /// Negated literals of each top-level alternative.
    negative: Vec<BTreeSet<String>>,
    has_negated_set: bool,
    has_backreference: bool,
    /// Look-around, back-references or conditionals.
    needs_backtracking: bool,
}

impl<'p> Parser<'p> {
    pub fn new(ndim: usize, pattern: &'p str, substitutions: &'p Substitutions) -> Self {
        Self {
            ndim,
            pattern,
            substitutions,
            lex: OuterToken::lexer(pattern),
            tokens: Vec::new(),
            groups: GroupTable::default(),
            root: Frame::new(FrameKind::Group, 0),
            frames: Vec::new(),
            pending: None,
            quantified: false,
            negative: vec![BTreeSet::new()],
            has_negated_set: false,
            has_backreference: false,
            needs_backtracking: false,
        }
    }

    pub fn parse(mut self) -> Result<ParsedPattern, PatternError> {
        while let Some(token) = self.lex.next() {
            let span = self.lex.span();
            let Ok(token) = token else {
                let c = self.lex.slice().chars().next().unwrap_or_default();
                return Err(self.error(Kind::UnexpectedCharacter(c), span.start));
            };
            let mut quantified = false;
            match token {
                OuterToken::Whitespace => continue,
                OuterToken::Tuple => {
                    self.flush();
                    let clauses = self.tuple(span.start)?;
                    self.pending = Some(clauses);
                }
                OuterToken::Any => {
                    self.flush();
                    self.wildcard_tuple(span.start);
                    self.pending = Some(Vec::new());
                }
                OuterToken::Extension => self.extension(span.start, span.start + 1)?,
                OuterToken::Open => match significant(self.lex.remainder()).next() {
                    // `( ?`
                    Some((i, '?')) => {
                        self.lex.bump(i + 1);
                        self.extension(span.start, span.end + i)?
                    }
                    _ => {
                        self.flush();
                        self.groups.push_unnamed();
                        self.push(TokenKind::Passthrough, "(", span.start);
                        self.frames.push(Frame::new(FrameKind::Group, span.start));
                    }
                },
                OuterToken::Close => self.close(span.start)?,
                OuterToken::Alternation => self.alternation(span.start),
                OuterToken::Optional if self.quantified => {
                    // Lazy modifier
                    self.push(TokenKind::Passthrough, "?", span.start);
                }
                OuterToken::Optional | OuterToken::Star | OuterToken::Plus => {
                    let min = if token == OuterToken::Plus { 1 } else { 0 };
                    self.quantifier(min);
                    let text = self.lex.slice();
                    self.push(TokenKind::Passthrough, text, span.start);
                    quantified = true;
                }
                OuterToken::Repetition => {
                    self.repetition(span.start)?;
                    quantified = true;
                }
                OuterToken::Escape => return Err(self.error(Kind::InvalidEscape, span.start)),
                OuterToken::SetIndicator => {
                    let c = self.lex.slice().chars().next().unwrap_or('[');
                    return Err(self.error(Kind::InvalidSetIndicator(c), span.start));
                }
                OuterToken::Text => {
                    self.flush();
                    let text = self.lex.slice();
                    self.push(TokenKind::Passthrough, text, span.start);
                    self.pending = Some(Vec::new());
                }
            }
            self.quantified = quantified;
        }
        self.finish()
    }

    fn finish(mut self) -> Result<ParsedPattern, PatternError> {
        self.flush();
        if let Some(frame) = self.frames.last() {
            return Err(self.error(Kind::UnbalancedParenthesis('('), frame.open));
        }
        let literal_sets = mem::take(&mut self.root.alternatives)
            .into_iter()
            .zip(self.negative)
            .map(|(positive, negative)| LiteralSets { positive, negative })
            .collect();
        Ok(ParsedPattern {
            ndim: self.ndim,
            tokens: self.tokens,
            groups: self.groups,
            literal_sets,
            has_negated_set: self.has_negated_set,
            has_backreference: self.has_backreference,
            needs_backtracking: self.needs_backtracking,
        })
    }

    fn error(&self, kind: Kind, byte: usize) -> PatternError {
        PatternError::new(kind, self.char_offset(byte))
    }

    fn char_offset(&self, byte: usize) -> usize {
        self.pattern.get(..byte).map_or(0, |s| s.chars().count())
    }

    fn push(&mut self, kind: TokenKind, payload: impl Into<String>, byte: usize) {
        let offset = self.char_offset(byte);
        self.tokens.push(Token::new(kind, payload, offset));
    }

    fn push_structural(&mut self, kind: TokenKind, byte: usize) {
        let offset = self.char_offset(byte);
        self.tokens.push(Token::structural(kind, offset));
    }

    fn current(&mut self) -> &mut Frame {
        self.frames.last_mut().unwrap_or(&mut self.root)
    }

    /// Commit the clauses of the previous atom.
    fn flush(&mut self) {
        if let Some(clauses) = self.pending.take() {
            if let Some(alternative) = self.current().alternatives.last_mut() {
                alternative.extend(clauses);
            }
        }
    }

    fn quantifier(&mut self, min: usize) {
        if min == 0 {
            if let Some(clauses) = &mut self.pending {
                clauses.clear();
            }
        }
    }

    fn alternation(&mut self, at: usize) {
        self.flush();
        self.push(TokenKind::Passthrough, "|", at);
        if self.frames.is_empty() {
            self.negative.push(BTreeSet::new());
        }
        self.current().alternatives.push(Vec::new());
    }

    fn close(&mut self, at: usize) -> Result<(), PatternError> {
        self.flush();
        let Some(frame) = self.frames.pop() else {
            return Err(self.error(Kind::UnbalancedParenthesis(')'), at));
        };
        self.push(TokenKind::Passthrough, ")", at);
        if let Some(i) = frame.named {
            let source = self.pattern.get(frame.open..at + 1).unwrap_or_default();
            self.groups.set_source(i, source);
        }
        self.pending = Some(frame.into_clauses());
        Ok(())
    }

    /// `{m}`, `{m,}`, `{,n}` or `{m,n}`. `{,n}` is normalized to `{0,n}`.
    fn repetition(&mut self, at: usize) -> Result<(), PatternError> {
        let rest = self.lex.remainder();
        let Some(end) = rest.find('}') else {
            return Err(self.error(Kind::InvalidRepetition, at));
        };
        let body: String = rest[..end].chars().filter(|c| !c.is_whitespace()).collect();
        let body = body.as_str();
        let is_number = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        let (min, text) = match body.split_once(',') {
            Some((min, max)) if is_number(min) && is_number(max) => {
                if min.is_empty() && max.is_empty() {
                    return Err(self.error(Kind::InvalidRepetition, at));
                }
                let min = if min.is_empty() { "0" } else { min };
                (min, format!("{{{min},{max}}}"))
            }
            None if !body.is_empty() && is_number(body) => (body, format!("{{{body}}}")),
            _ => return Err(self.error(Kind::InvalidRepetition, at)),
        };
        let min: usize = min
            .parse()
            .map_err(|_| self.error(Kind::InvalidRepetition, at))?;
        self.quantifier(min);
        self.push(TokenKind::Passthrough, text, at);
        self.lex.bump(end + 1);
        Ok(())
    }

    /// `.`, i.e. `/::/`.
    fn wildcard_tuple(&mut self, at: usize) {
        self.push(TokenKind::Passthrough, "(?:", at);
        for _ in 0..self.ndim {
            self.push(TokenKind::Passthrough, ".", at);
        }
        self.push(TokenKind::Passthrough, ")", at);
    }

    /// Scan `/.../` after the opening slash at `open`. Returns the required clauses.
    fn tuple(&mut self, open: usize) -> Result<Vec<Clause>, PatternError> {
        let base = open + 1;
        if self.ndim == 0 {
            return Err(self.error(Kind::OutOfDimensionRange, base));
        }
        let rest = self.lex.remainder();
        let mut dims = vec![Dimension::new(base)];
        let mut value = String::new();
        let mut value_start = base;

        let mut chars = rest.char_indices().peekable();
        let close = loop {
            let Some((i, c)) = chars.next() else {
                return Err(self.error(Kind::UnbalancedSlash, open));
            };
            let at = base + i;
            let dim = dims.last_mut().ok_or_else(|| self.error(Kind::UnbalancedSlash, open))?;
            match c {
                '/' => break at,
                ':' => {
                    self.finish_value(dim, &mut value, value_start)?;
                    self.finish_dimension(dim)?;
                    if dims.len() == self.ndim {
                        return Err(self.error(Kind::OutOfDimensionRange, at + 1));
                    }
                    dims.push(Dimension::new(at + 1));
                    value_start = at + 1;
                }
                '|' => {
                    self.finish_value(dim, &mut value, value_start)?;
                    dim.consumed = true;
                    value_start = at + 1;
                }
                '^' if !dim.consumed => {
                    dim.negated = Some(at);
                    dim.consumed = true;
                    value_start = at + 1;
                }
                '\\' => {
                    dim.consumed = true;
                    match chars.peek() {
                        Some(&(_, e @ ('/' | ':' | '|' | '^' | '\\'))) => {
                            chars.next();
                            value.push(e);
                        }
                        _ => value.push('\\'),
                    }
                }
                c => {
                    dim.consumed = true;
                    value.push(c);
                }
            }
        };
        if let Some(dim) = dims.last_mut() {
            self.finish_value(dim, &mut value, value_start)?;
            self.finish_dimension(dim)?;
        }
        self.lex.bump(close + 1 - base);

        // Emit
        let mut clauses = Vec::new();
        self.push(TokenKind::Passthrough, "(?:", open);
        for dim in dims.iter() {
            let literals = dim.values.iter().cloned();
            match (dim.negated, dim.values.len()) {
                (Some(_), _) => {
                    self.has_negated_set = true;
                    if let Some(negative) = self.negative.last_mut() {
                        negative.extend(dim.values.iter().cloned());
                    }
                    self.push(TokenKind::Passthrough, "[^", dim.start);
                    for literal in literals {
                        self.push(TokenKind::Literal, literal, dim.start);
                    }
                    self.push(TokenKind::Passthrough, "]", dim.start);
                }
                (None, 0) => self.push(TokenKind::Passthrough, ".", dim.start),
                (None, 1) => {
                    clauses.push(dim.values.iter().cloned().collect());
                    for literal in literals {
                        self.push(TokenKind::Literal, literal, dim.start);
                    }
                }
                (None, _) => {
                    clauses.push(dim.values.iter().cloned().collect());
                    self.push(TokenKind::Passthrough, "[", dim.start);
                    for literal in literals {
                        self.push(TokenKind::Literal, literal, dim.start);
                    }
                    self.push(TokenKind::Passthrough, "]", dim.start);
                }
            }
        }
        // Omitted trailing dimensions
        for _ in dims.len()..self.ndim {
            self.push(TokenKind::Passthrough, ".", close);
        }
        self.push(TokenKind::Passthrough, ")", close);
        Ok(clauses)
    }

    /// Move `value` into `dim`, expanding substitutions. Empty values are ignored.
    fn finish_value(
        &self,
        dim: &mut Dimension,
        value: &mut String,
        value_start: usize,
    ) -> Result<(), PatternError> {
        if value.is_empty() {
            return Ok(());
        }
        let value = mem::take(value);
        match self.substitutions.get(&value) {
            Some(substitution) => {
                let values = substitution.values();
                if values.is_empty() {
                    return Err(self.error(Kind::EmptySubstitution(value), value_start));
                }
                dim.values.extend(values.iter().cloned());
            }
            None => dim.values.push(value),
        }
        Ok(())
    }

    fn finish_dimension(&self, dim: &Dimension) -> Result<(), PatternError> {
        match dim.negated {
            Some(at) if dim.values.is_empty() => {
                Err(self.error(Kind::UnexpectedNegativeSign, at))
            }
            _ => Ok(()),
        }
    }

    /// After `(?` at `open`, with the `?` at `question`.
    fn extension(&mut self, open: usize, question: usize) -> Result<(), PatternError> {
        let mut chars = significant(self.lex.remainder());
        let Some((i, c)) = chars.next() else {
            return Err(self.unexpected_end());
        };
        match c {
            ':' => {
                self.flush();
                self.lex.bump(i + 1);
                self.push(TokenKind::ExtensionSign, "(?:", open);
                self.frames.push(Frame::new(FrameKind::Group, open));
                Ok(())
            }
            'P' => match chars.next() {
                Some((j, '<')) => {
                    self.flush();
                    self.lex.bump(j + 1);
                    self.named_group(open)
                }
                Some((j, '=')) => {
                    self.flush();
                    self.lex.bump(j + 1);
                    self.backreference(open)?;
                    self.pending = Some(Vec::new());
                    Ok(())
                }
                None => Err(self.unexpected_end()),
                Some((_, c)) => Err(self.error(Kind::UnknownExtension(format!("?P{c}")), question)),
            },
            '#' => self.comment(open),
            '=' | '!' => {
                self.flush();
                self.lex.bump(i + 1);
                self.needs_backtracking = true;
                self.push(TokenKind::ExtensionSign, format!("(?{c}"), open);
                self.frames.push(Frame::new(FrameKind::Assertion, open));
                Ok(())
            }
            '<' => match chars.next() {
                Some((j, c @ ('=' | '!'))) => {
                    self.flush();
                    self.lex.bump(j + 1);
                    self.needs_backtracking = true;
                    self.push(TokenKind::ExtensionSign, format!("(?<{c}"), open);
                    self.frames.push(Frame::new(FrameKind::Assertion, open));
                    Ok(())
                }
                None => Err(self.unexpected_end()),
                Some((_, c)) => Err(self.error(Kind::UnknownExtension(format!("?<{c}")), question)),
            },
            '(' => {
                self.flush();
                self.lex.bump(i + 1);
                self.condition(open)?;
                self.frames.push(Frame::new(FrameKind::Assertion, open));
                Ok(())
            }
            c => Err(self.error(Kind::UnknownExtension(format!("?{c}")), question)),
        }
    }

    fn unexpected_end(&self) -> PatternError {
        self.error(Kind::UnexpectedEnd, self.pattern.trim_end().len())
    }

    /// Byte length of the remainder up to the first of `stops`, and the stop found.
    fn scan_until(&self, stops: &[char]) -> Option<(usize, char)> {
        self.lex
            .remainder()
            .char_indices()
            .find(|(_, c)| stops.contains(c))
    }

    /// After `(?P<`.
    fn named_group(&mut self, open: usize) -> Result<(), PatternError> {
        let name_start = self.lex.span().end;
        let Some((name_len, stop)) = self.scan_until(&['@', '>']) else {
            return Err(self.error(Kind::UnterminatedName('>'), name_start));
        };
        let rest = self.lex.remainder();
        let name = strip_whitespace(&rest[..name_len]);

        let (format, close) = if stop == '@' {
            let spec_start = name_len + 1;
            let Some(spec_len) = rest[spec_start..].find('>') else {
                return Err(self.error(Kind::UnterminatedName('>'), name_start));
            };
            let spec = &rest[spec_start..spec_start + spec_len];
            let format = FormatSpec::parse(spec, self.ndim).map_err(|(kind, offset)| {
                self.error(kind, name_start + spec_start + offset)
            })?;
            (Some(format), spec_start + spec_len)
        } else {
            (None, name_len)
        };

        if self.groups.get(&name).is_some() {
            return Err(self.error(Kind::DuplicateGroupName(name), name_start));
        }
        self.push(TokenKind::ExtensionSign, "(?P<", open);
        self.push(TokenKind::GroupName, name.as_str(), name_start);
        if format.is_some() {
            self.push_structural(TokenKind::FormatSpec, name_start + name_len);
        }
        self.push(TokenKind::Passthrough, ">", name_start + close);
        self.lex.bump(close + 1);

        let i = self.groups.push_named(name, format);
        let mut frame = Frame::new(FrameKind::Group, open);
        frame.named = Some(i);
        self.frames.push(frame);
        Ok(())
    }

    /// After `(?P=`. Emitted as `\k<name>`.
    fn backreference(&mut self, open: usize) -> Result<(), PatternError> {
        let name_start = self.lex.span().end;
        let Some((name_len, _)) = self.scan_until(&[')']) else {
            return Err(self.error(Kind::UnterminatedName(')'), name_start));
        };
        let name = strip_whitespace(&self.lex.remainder()[..name_len]);
        if self.groups.get(&name).is_none() {
            return Err(self.error(Kind::UnknownGroupName(name), name_start));
        }
        self.has_backreference = true;
        self.needs_backtracking = true;
        self.push(TokenKind::ExtensionSign, r"\k<", open);
        self.push(TokenKind::GroupName, name, name_start);
        self.push(TokenKind::Passthrough, ">", name_start + name_len);
        self.lex.bump(name_len + 1);
        Ok(())
    }

    /// After `(?(`. The condition is a group index or the name of a group defined before it.
    fn condition(&mut self, open: usize) -> Result<(), PatternError> {
        let name_start = self.lex.span().end;
        let Some((name_len, _)) = self.scan_until(&[')']) else {
            return Err(self.error(Kind::UnterminatedName(')'), name_start));
        };
        let name = strip_whitespace(&self.lex.remainder()[..name_len]);
        let known = match name.parse::<usize>() {
            Ok(i) => (1..=self.groups.captures()).contains(&i),
            Err(_) => self.groups.get(&name).is_some(),
        };
        if !known {
            return Err(self.error(Kind::UnknownGroupName(name), name_start));
        }
        self.needs_backtracking = true;
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            self.push(TokenKind::ExtensionSign, "(?(", open);
            self.push(TokenKind::GroupName, name, name_start);
            self.push(TokenKind::Passthrough, ")", name_start + name_len);
        } else {
            self.push(TokenKind::ExtensionSign, "(?(<", open);
            self.push(TokenKind::GroupName, name, name_start);
            self.push(TokenKind::Passthrough, ">)", name_start + name_len);
        }
        self.lex.bump(name_len + 1);
        Ok(())
    }

    /// After `(?`, at `#`.
    fn comment(&mut self, open: usize) -> Result<(), PatternError> {
        let Some((len, _)) = self.scan_until(&[')']) else {
            return Err(self.error(Kind::UnterminatedComment, open));
        };
        self.push_structural(TokenKind::Comment, open);
        self.lex.bump(len + 1);
        Ok(())
    }
}

/// Chars of `s` other than whitespace, with their byte offsets.
fn significant(s: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    s.char_indices().filter(|(_, c)| !c.is_whitespace())
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
