//! Tree references into the projected collection.
//!
//! A reference is an optionally absolute list of named segments. Each segment
//! addresses either one child by position or every child (unbound), and may
//! carry equality predicates.
//!
//! Text form:
//!
//! ```text
//! /casedb/case[3]                  absolute, position 3
//! casedb/case                      relative, unbound
//! /casedb/case[*]                  explicit wildcard
//! /casedb/case[@status='open']     predicate (the `@` is optional)
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::predicate::Predicate;

/// Position of a segment among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Multiplicity {
    /// A concrete 0-based position.
    Position(usize),
    /// Any position.
    #[default]
    Unbound,
}

impl Multiplicity {
    /// The concrete position, if any.
    pub fn position(self) -> Option<usize> {
        match self {
            Multiplicity::Position(p) => Some(p),
            Multiplicity::Unbound => None,
        }
    }
}

/// One step of a reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub name: String,
    pub multiplicity: Multiplicity,
    pub predicates: Vec<Predicate>,
}

impl PathSegment {
    /// Create an unbound segment without predicates.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            multiplicity: Multiplicity::Unbound,
            predicates: Vec::new(),
        }
    }

    /// Bind the segment to a concrete position.
    pub fn at(mut self, position: usize) -> Self {
        self.multiplicity = Multiplicity::Position(position);
        self
    }

    /// Attach an equality predicate.
    pub fn with_predicate(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.push(Predicate::new(key, value));
        self
    }
}

/// A path into the projected tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TreeReference {
    absolute: bool,
    segments: Vec<PathSegment>,
}

impl TreeReference {
    /// Create an absolute reference with no segments.
    pub fn absolute() -> Self {
        Self {
            absolute: true,
            segments: Vec::new(),
        }
    }

    /// Create a relative reference with no segments.
    pub fn relative() -> Self {
        Self {
            absolute: false,
            segments: Vec::new(),
        }
    }

    /// Append a segment.
    pub fn with_segment(mut self, segment: PathSegment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Check if the reference is rooted.
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Number of segments.
    pub fn size(&self) -> usize {
        self.segments.len()
    }

    /// All segments in order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Name of the segment at `index`.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(|s| s.name.as_str())
    }

    /// Multiplicity of the segment at `index`.
    pub fn multiplicity(&self, index: usize) -> Option<Multiplicity> {
        self.segments.get(index).map(|s| s.multiplicity)
    }

    /// Check if any segment carries predicates.
    pub fn has_predicates(&self) -> bool {
        self.segments.iter().any(|s| !s.predicates.is_empty())
    }

    /// Predicates of the last segment, in order.
    pub fn last_predicates(&self) -> &[Predicate] {
        self.segments
            .last()
            .map(|s| s.predicates.as_slice())
            .unwrap_or(&[])
    }

    /// Parse the text form.
    pub fn parse(input: &str) -> Result<Self> {
        Parser::new(input).parse()
    }
}

impl FromStr for TreeReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TreeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if self.absolute || i > 0 {
                f.write_str("/")?;
            }
            f.write_str(&segment.name)?;
            if let Multiplicity::Position(p) = segment.multiplicity {
                write!(f, "[{}]", p)?;
            }
            for predicate in &segment.predicates {
                write!(f, "[@{}='{}']", predicate.key, predicate.value)?;
            }
        }
        Ok(())
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.trim(),
            pos: 0,
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::InvalidReference(format!("{} at offset {} in '{}'", message, self.pos, self.input))
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", expected)))
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.input[start..self.pos]
    }

    fn parse(mut self) -> Result<TreeReference> {
        if self.input.is_empty() {
            return Err(self.error("empty reference"));
        }

        let mut reference = TreeReference {
            absolute: self.eat('/'),
            segments: Vec::new(),
        };

        loop {
            reference.segments.push(self.segment()?);
            if self.peek().is_none() {
                break;
            }
            self.expect('/')?;
        }

        Ok(reference)
    }

    fn segment(&mut self) -> Result<PathSegment> {
        let name = self.take_while(is_name_char);
        if name.is_empty() {
            return Err(self.error("expected segment name"));
        }

        let mut segment = PathSegment::new(name);
        let mut bound = false;

        while self.eat('[') {
            match self.peek() {
                Some('*') => {
                    self.bump();
                    if bound {
                        return Err(self.error("duplicate position"));
                    }
                    bound = true;
                }
                Some(c) if c.is_ascii_digit() => {
                    if bound {
                        return Err(self.error("duplicate position"));
                    }
                    let digits = self.take_while(|c| c.is_ascii_digit());
                    let position = digits
                        .parse::<usize>()
                        .map_err(|_| self.error("position out of range"))?;
                    segment.multiplicity = Multiplicity::Position(position);
                    bound = true;
                }
                _ => segment.predicates.push(self.predicate()?),
            }
            self.expect(']')?;
        }

        Ok(segment)
    }

    fn predicate(&mut self) -> Result<Predicate> {
        self.eat('@');
        let key = self.take_while(is_name_char);
        if key.is_empty() {
            return Err(self.error("expected predicate key"));
        }
        self.expect('=')?;

        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected quoted value")),
        };
        let value = self.take_while(|c| c != quote);
        self.expect(quote)?;

        Ok(Predicate::new(key, value))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}
