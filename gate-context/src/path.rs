//! Field paths selecting values out of a launch context.

use std::fmt::{self, Display, Formatter, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ContextError, ContextResult};

/// One segment of a [`FieldPath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Selects the named key of a mapping.
    Key(String),
    /// Selects every element of a sequence, in order.
    Wildcard,
}

impl PathSegment {
    /// Creates a key segment.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::MalformedPath`] when the key is empty.
    pub fn key(key: impl Into<String>) -> ContextResult<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(ContextError::malformed("", "path segments cannot be empty"));
        }
        Ok(Self::Key(key))
    }
}

/// Ordered sequence of segments addressing zero or more values in a context.
///
/// The text form joins keys with `.`, writes the wildcard as `[*]` (a bare `*`
/// segment is accepted too), and quotes keys containing delimiters as
/// `["key.with.dots"]`:
///
/// ```
/// use gate_context::{FieldPath, PathSegment};
///
/// let path: FieldPath = "credentials[*].organization".parse().unwrap();
/// assert_eq!(path.segments().len(), 3);
/// assert_eq!(path.segments()[1], PathSegment::Wildcard);
/// assert_eq!(path.to_string(), "credentials[*].organization");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Creates a path from pre-built segments.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::MalformedPath`] when no segments are supplied or a
    /// key segment is empty.
    pub fn new(segments: Vec<PathSegment>) -> ContextResult<Self> {
        if segments.is_empty() {
            return Err(ContextError::malformed("", "path must have at least one segment"));
        }
        if segments
            .iter()
            .any(|segment| matches!(segment, PathSegment::Key(key) if key.is_empty()))
        {
            return Err(ContextError::malformed("", "path segments cannot be empty"));
        }
        Ok(Self { segments })
    }

    /// Creates a path from a list of plain keys.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::MalformedPath`] when the list or any key is empty.
    pub fn from_keys<I, S>(keys: I) -> ContextResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(keys.into_iter().map(|key| PathSegment::Key(key.into())).collect())
    }

    /// Parses the text form of a path.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::MalformedPath`] for empty segments, unterminated
    /// brackets, or bracket contents other than `*` or a quoted key.
    pub fn parse(text: &str) -> ContextResult<Self> {
        let mut segments = Vec::new();
        let mut rest = text;
        let mut first = true;

        while first || !rest.is_empty() {
            if let Some(inner) = rest.strip_prefix('[') {
                let (segment, remainder) = parse_bracket(text, inner)?;
                segments.push(segment);
                rest = remainder;
            } else {
                if !first {
                    rest = rest.strip_prefix('.').ok_or_else(|| {
                        ContextError::malformed(text, "expected `.` or `[` between segments")
                    })?;
                }
                let end = rest.find(['.', '[', ']', '"']).unwrap_or(rest.len());
                let key = &rest[..end];
                if key.is_empty() {
                    return Err(ContextError::malformed(text, "path segments cannot be empty"));
                }
                segments.push(if key == "*" {
                    PathSegment::Wildcard
                } else {
                    PathSegment::Key(key.to_owned())
                });
                rest = &rest[end..];
            }
            first = false;
        }

        Ok(Self { segments })
    }

    /// Returns a new path with `key` appended.
    #[must_use]
    pub fn child(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !key.is_empty() {
            self.segments.push(PathSegment::Key(key));
        }
        self
    }

    /// Returns a new path with a wildcard segment appended.
    #[must_use]
    pub fn each(mut self) -> Self {
        self.segments.push(PathSegment::Wildcard);
        self
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns the last key segment, skipping trailing wildcards.
    #[must_use]
    pub fn last_key(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|segment| match segment {
            PathSegment::Key(key) => Some(key.as_str()),
            PathSegment::Wildcard => None,
        })
    }

    /// Returns `true` when the path contains at least one wildcard.
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        self.segments.contains(&PathSegment::Wildcard)
    }
}

fn parse_bracket<'a>(text: &str, inner: &'a str) -> ContextResult<(PathSegment, &'a str)> {
    if let Some(after) = inner.strip_prefix("*]") {
        return Ok((PathSegment::Wildcard, after));
    }

    if !inner.starts_with('"') {
        return Err(ContextError::malformed(
            text,
            "bracket segments must be `[*]` or a quoted key",
        ));
    }

    let close = closing_quote(inner)
        .ok_or_else(|| ContextError::malformed(text, "unterminated quoted key"))?;
    let key: String = serde_json::from_str(&inner[..=close])
        .map_err(|_| ContextError::malformed(text, "invalid escape in quoted key"))?;
    if key.is_empty() {
        return Err(ContextError::malformed(text, "path segments cannot be empty"));
    }
    let after = inner[close + 1..]
        .strip_prefix(']')
        .ok_or_else(|| ContextError::malformed(text, "unterminated bracket segment"))?;

    Ok((PathSegment::Key(key), after))
}

/// Byte index of the quote closing the string literal that opens `text`.
fn closing_quote(text: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, ch) in text.char_indices().skip(1) {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(idx),
            _ => {}
        }
    }
    None
}

fn needs_quoting(key: &str) -> bool {
    key == "*" || key.contains(['.', '[', ']', '"'])
}

fn write_quoted(f: &mut impl Write, key: &str) -> fmt::Result {
    write!(f, "[{}]", Value::String(key.to_owned()))
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Wildcard => f.write_str("[*]")?,
                PathSegment::Key(key) if needs_quoting(key) => write_quoted(f, key)?,
                PathSegment::Key(key) => {
                    if idx > 0 {
                        f.write_char('.')?;
                    }
                    f.write_str(key)?;
                }
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = ContextError;

    fn from_str(s: &str) -> ContextResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = ContextError;

    fn try_from(value: String) -> ContextResult<Self> {
        Self::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(value: FieldPath) -> Self {
        value.to_string()
    }
}

/// One concrete step taken while resolving a path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    /// Entered the named key of a mapping.
    Key(String),
    /// Entered the element at this index of a sequence.
    Index(usize),
}

/// Concrete location of a resolved value, e.g. `credentials[0].organization`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Location {
    steps: Vec<Step>,
}

impl Location {
    /// Returns the location of the context root.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, step: Step) -> Self {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push(step);
        Self { steps }
    }

    /// Returns the steps leading to the value.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns the nearest key step, i.e. the key the value was found under.
    #[must_use]
    pub fn nearest_key(&self) -> Option<&str> {
        self.steps.iter().rev().find_map(|step| match step {
            Step::Key(key) => Some(key.as_str()),
            Step::Index(_) => None,
        })
    }

    /// Returns the location with its final step removed.
    #[must_use]
    pub fn parent(&self) -> Self {
        let mut steps = self.steps.clone();
        steps.pop();
        Self { steps }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (idx, step) in self.steps.iter().enumerate() {
            match step {
                Step::Index(index) => write!(f, "[{index}]")?,
                Step::Key(key) if needs_quoting(key) => write_quoted(f, key)?,
                Step::Key(key) => {
                    if idx > 0 {
                        f.write_char('.')?;
                    }
                    f.write_str(key)?;
                }
            }
        }
        Ok(())
    }
}
