use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::phase::{PhaseTag, SPECIAL_SEGMENT};
use crate::error::AppError;

const NAME_ATTRIBUTE: &str = "Name";

/// One step of a [`Urn`]: an entity type plus its key attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Segment {
    type_name: String,
    attributes: Vec<(String, String)>,
}

impl Segment {
    fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    fn set_attribute(&mut self, key: &str, value: &str) {
        match self
            .attributes
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
        {
            Some(existing) => existing.1 = value.to_string(),
            None => self.attributes.push((key.to_string(), value.to_string())),
        }
        self.canonicalize();
    }

    // `Name` leads, the rest follow alphabetically, so equality does not
    // depend on how the caller spelled the predicate.
    fn canonicalize(&mut self) {
        self.attributes.sort_by(|(a, _), (b, _)| {
            let a_name = a.eq_ignore_ascii_case(NAME_ATTRIBUTE);
            let b_name = b.eq_ignore_ascii_case(NAME_ATTRIBUTE);
            b_name.cmp(&a_name).then_with(|| a.cmp(b))
        });
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name)?;
        if self.attributes.is_empty() {
            return Ok(());
        }
        f.write_str("[")?;
        for (idx, (key, value)) in self.attributes.iter().enumerate() {
            if idx > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "@{}='{}'", key, value.replace('\'', "''"))?;
        }
        f.write_str("]")
    }
}

/// Hierarchical identifier of one server entity, e.g.
/// `Server[@Name='srv']/Database[@Name='db']/Table[@Name='t' and @Schema='dbo']`.
///
/// Urns are values: every helper that "changes" one returns a new Urn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Urn {
    segments: Vec<Segment>,
}

impl Urn {
    pub fn root(type_name: &str, name: &str) -> Self {
        let mut segment = Segment::new(type_name);
        segment.set_attribute(NAME_ATTRIBUTE, name);
        Self {
            segments: vec![segment],
        }
    }

    pub fn child(&self, type_name: &str, name: &str) -> Self {
        let mut segment = Segment::new(type_name);
        segment.set_attribute(NAME_ATTRIBUTE, name);
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Sets an extra key attribute (e.g. `Schema`) on the last segment.
    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.set_attribute(key, value);
        }
        self
    }

    pub fn parse(input: &str) -> Result<Self> {
        UrnParser::new(input).parse()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    fn last(&self) -> &Segment {
        // Construction guarantees at least one segment.
        &self.segments[self.segments.len() - 1]
    }

    pub fn type_name(&self) -> &str {
        self.last().type_name()
    }

    pub fn name(&self) -> Option<&str> {
        self.last().attribute(NAME_ATTRIBUTE)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.last().attribute(key)
    }

    pub fn parent(&self) -> Option<Urn> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn parent_type(&self) -> Option<&str> {
        let len = self.segments.len();
        if len < 2 {
            return None;
        }
        Some(self.segments[len - 2].type_name())
    }

    /// Nearest enclosing Urn (this one included) whose type is `type_name`.
    pub fn ancestor(&self, type_name: &str) -> Option<Urn> {
        let pos = self
            .segments
            .iter()
            .rposition(|segment| segment.type_name.eq_ignore_ascii_case(type_name))?;
        Some(Self {
            segments: self.segments[..=pos].to_vec(),
        })
    }

    pub fn with_phase(&self, phase: PhaseTag) -> Urn {
        let mut segments = self.segments.clone();
        segments.push(Segment::new(phase.as_str()));
        segments.push(Segment::new(SPECIAL_SEGMENT));
        Self { segments }
    }

    pub fn phase(&self) -> Option<PhaseTag> {
        let len = self.segments.len();
        if len < 3 {
            return None;
        }
        let special = &self.segments[len - 1];
        let tag = &self.segments[len - 2];
        if special.type_name != SPECIAL_SEGMENT
            || !special.attributes.is_empty()
            || !tag.attributes.is_empty()
        {
            return None;
        }
        PhaseTag::from_segment(&tag.type_name)
    }

    /// The Urn without its phase suffix; the Urn itself when it has none.
    pub fn base(&self) -> Urn {
        match self.phase() {
            Some(_) => Self {
                segments: self.segments[..self.segments.len() - 2].to_vec(),
            },
            None => self.clone(),
        }
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            if idx > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for Urn {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Urn::parse(s)
    }
}

impl TryFrom<String> for Urn {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Urn::parse(&value)
    }
}

impl From<Urn> for String {
    fn from(value: Urn) -> Self {
        value.to_string()
    }
}

struct UrnParser<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> UrnParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn error(&self, detail: &str) -> anyhow::Error {
        AppError::config(format!("Invalid urn '{}': {}", self.input, detail)).into()
    }

    fn parse(mut self) -> Result<Urn> {
        let mut segments = Vec::new();
        loop {
            segments.push(self.segment()?);
            match self.chars.next() {
                None => break,
                Some((_, '/')) => continue,
                Some((_, ch)) => return Err(self.error(&format!("unexpected '{}'", ch))),
            }
        }
        Ok(Urn { segments })
    }

    fn segment(&mut self) -> Result<Segment> {
        let type_name = self.identifier();
        if type_name.is_empty() {
            return Err(self.error("empty segment type"));
        }
        let mut segment = Segment::new(type_name);
        if self.chars.peek().map(|(_, ch)| *ch) == Some('[') {
            self.chars.next();
            loop {
                self.skip_whitespace();
                self.expect('@')?;
                let key = self.identifier();
                if key.is_empty() {
                    return Err(self.error("empty attribute name"));
                }
                self.skip_whitespace();
                self.expect('=')?;
                self.skip_whitespace();
                let value = self.quoted()?;
                if segment.attribute(&key).is_some() {
                    return Err(self.error(&format!("duplicate attribute '{}'", key)));
                }
                segment.attributes.push((key, value));
                self.skip_whitespace();
                match self.chars.next() {
                    Some((_, ']')) => break,
                    Some((_, 'a')) | Some((_, 'A')) => self.expect_keyword_tail()?,
                    _ => return Err(self.error("expected 'and' or ']'")),
                }
            }
            segment.canonicalize();
        }
        Ok(segment)
    }

    fn identifier(&mut self) -> String {
        let mut out = String::new();
        while let Some((_, ch)) = self.chars.peek() {
            if ch.is_alphanumeric() || *ch == '_' {
                out.push(*ch);
                self.chars.next();
            } else {
                break;
            }
        }
        out
    }

    fn quoted(&mut self) -> Result<String> {
        self.expect('\'')?;
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((_, '\'')) => {
                    if self.chars.peek().map(|(_, ch)| *ch) == Some('\'') {
                        self.chars.next();
                        value.push('\'');
                    } else {
                        return Ok(value);
                    }
                }
                Some((_, ch)) => value.push(ch),
                None => return Err(self.error("unterminated attribute value")),
            }
        }
    }

    // The leading 'a' of "and" has already been consumed.
    fn expect_keyword_tail(&mut self) -> Result<()> {
        for expected in ['n', 'd'] {
            match self.chars.next() {
                Some((_, ch)) if ch.eq_ignore_ascii_case(&expected) => {}
                _ => return Err(self.error("expected 'and'")),
            }
        }
        match self.chars.peek() {
            Some((_, ch)) if ch.is_whitespace() => Ok(()),
            _ => Err(self.error("expected whitespace after 'and'")),
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.chars.next() {
            Some((_, ch)) if ch == expected => Ok(()),
            Some((pos, ch)) => Err(self.error(&format!(
                "expected '{}' at offset {}, found '{}'",
                expected, pos, ch
            ))),
            None => Err(self.error(&format!("expected '{}' at end of input", expected))),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some((_, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }
}
