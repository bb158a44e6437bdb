//! Path patterns and parameter capture.
//!
//! A pattern is a `/`-separated list of segments. A segment that starts with
//! `:` captures exactly one non-empty segment of the concrete path under the
//! given name; every other segment must match byte-for-byte. There is no
//! trailing-slash or case normalisation: `/pets/` is not `/pets`, and `/Pets`
//! is not `/pets`.
//!
//! ```rust
//! use schemaroute::PathPattern;
//!
//! let pattern: PathPattern = "/owners/:owner/pets/:id".parse().unwrap();
//! let params = pattern.matches("/owners/ana/pets/42").unwrap();
//! assert_eq!(params.get("owner"), Some("ana"));
//! assert_eq!(params.get("id"), Some("42"));
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// One segment of a [`PathPattern`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    pub fn is_param(&self) -> bool {
        matches!(self, Self::Param(_))
    }
}

/// A parsed route path such as `/pets/:id`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let invalid = |reason| Error::InvalidPattern { pattern: raw.to_owned(), reason };

        let rest = raw.strip_prefix('/').ok_or_else(|| invalid("must start with `/`"))?;

        let mut segments = Vec::new();
        for part in rest.split('/') {
            let segment = match part.strip_prefix(':') {
                Some("") => return Err(invalid("parameter name is empty")),
                Some(name) => {
                    let taken = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Param(n) if n == name));
                    if taken {
                        return Err(invalid("parameter name is used twice"));
                    }
                    Segment::Param(name.to_owned())
                }
                None => Segment::Literal(part.to_owned()),
            };
            segments.push(segment);
        }

        Ok(Self { raw: raw.to_owned(), segments })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in the order they appear.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn literal_count(&self) -> usize {
        self.segments.iter().filter(|s| !s.is_param()).count()
    }

    /// `true` when both patterns match exactly the same set of concrete
    /// paths, i.e. they differ at most in parameter names.
    pub fn same_shape(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|pair| match pair {
                (Segment::Param(_), Segment::Param(_)) => true,
                (Segment::Literal(a), Segment::Literal(b)) => a == b,
                _ => false,
            })
    }

    /// Matches a concrete request path, returning the captured parameters.
    ///
    /// Captured values are percent-decoded; a value that does not decode to
    /// valid UTF-8 is kept as sent.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let rest = path.strip_prefix('/')?;
        let mut parts = rest.split('/');
        let mut params = Params::default();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    let value = urlencoding::decode(part)
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| part.to_owned());
                    params.push(name.clone(), value);
                }
            }
        }

        // Concrete path has more segments than the pattern.
        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

impl FromStr for PathPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ── Params ────────────────────────────────────────────────────────────────────

/// Path parameters captured by a match, in pattern order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub(crate) fn push(&mut self, name: String, value: String) {
        self.entries.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
