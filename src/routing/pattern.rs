//! Path pattern parsing and structural matching.
//!
//! # Syntax
//! ```text
//! /                    root, zero segments
//! /api/health          literal segments (case-sensitive)
//! /users/:id           `:id` matches exactly one non-empty segment
//! /static/*path        trailing `*path` matches zero or more segments
//! /static/*            bare rest wildcard, nothing captured
//! ```
//!
//! # Design Decisions
//! - Paths are split on `/` after the leading slash; empty segments are kept,
//!   so `/ping/` is `["ping", ""]` and does not match `/ping`
//! - Patterns may not contain empty segments
//! - No percent-decoding: segments are compared as they arrive on the wire
//! - Two patterns are the same route when their segment shapes agree;
//!   parameter names do not distinguish routes

use std::fmt;
use std::str::FromStr;

use crate::error::RouteError;

/// One segment of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
    /// Trailing wildcard. An empty name means a bare `*`.
    Rest(String),
}

impl Segment {
    /// Structural equality, ignoring wildcard names.
    fn same_shape(&self, other: &Segment) -> bool {
        match (self, other) {
            (Segment::Literal(a), Segment::Literal(b)) => a == b,
            (Segment::Param(_), Segment::Param(_)) => true,
            (Segment::Rest(_), Segment::Rest(_)) => true,
            _ => false,
        }
    }
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let invalid = |reason| RouteError::InvalidPattern {
            pattern: raw.to_string(),
            reason,
        };

        let rest = raw.strip_prefix('/').ok_or_else(|| invalid("must start with '/'"))?;
        if rest.is_empty() {
            return Ok(Self { segments: Vec::new() });
        }

        let parts: Vec<&str> = rest.split('/').collect();
        let mut segments = Vec::with_capacity(parts.len());
        let mut names: Vec<&str> = Vec::new();

        for (i, part) in parts.iter().enumerate() {
            let segment = if part.is_empty() {
                return Err(invalid("empty segment"));
            } else if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(invalid("parameter needs a name"));
                }
                if names.contains(&name) {
                    return Err(invalid("duplicate parameter name"));
                }
                names.push(name);
                Segment::Param(name.to_string())
            } else if let Some(name) = part.strip_prefix('*') {
                if i + 1 != parts.len() {
                    return Err(invalid("rest wildcard must be the last segment"));
                }
                if !name.is_empty() && names.contains(&name) {
                    return Err(invalid("duplicate parameter name"));
                }
                Segment::Rest(name.to_string())
            } else {
                Segment::Literal(part.to_string())
            };
            segments.push(segment);
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether a `:name` or `*name` wildcard in this pattern captures `name`.
    pub fn has_capture(&self, name: &str) -> bool {
        self.segments.iter().any(|segment| match segment {
            Segment::Param(n) | Segment::Rest(n) => !n.is_empty() && n == name,
            Segment::Literal(_) => false,
        })
    }

    /// True when both patterns would match exactly the same paths.
    pub fn same_shape(&self, other: &Pattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.same_shape(b))
    }

    /// Match a request path, returning the captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let parts = split_path(path);
        let mut params = Params::default();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(lit) => {
                    if parts.get(i) != Some(&lit.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => match parts.get(i) {
                    Some(value) if !value.is_empty() => params.push(name, value),
                    _ => return None,
                },
                Segment::Rest(name) => {
                    let remainder = parts.get(i..).unwrap_or_default().join("/");
                    if !name.is_empty() {
                        params.push(name, &remainder);
                    }
                    return Some(params);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }
}

impl FromStr for Pattern {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::parse(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => write!(f, "/{lit}")?,
                Segment::Param(name) => write!(f, "/:{name}")?,
                Segment::Rest(name) => write!(f, "/*{name}")?,
            }
        }
        Ok(())
    }
}

fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

/// Wildcard values captured by a match, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    fn push(&mut self, name: &str, value: &str) {
        self.entries.push((name.to_string(), value.to_string()));
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

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
