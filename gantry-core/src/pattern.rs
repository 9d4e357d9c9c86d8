// Route pattern tokenizing and matching.
//
// A pattern is a path template: `{name}` captures exactly one non-slash
// segment, `{name?}` optionally captures one (the segment may be omitted from
// the path entirely). One tokenizer pass produces both the segment list and
// the ordered parameter names, so the names captured during matching always
// line up positionally with the pattern text.

use crate::Error;
use std::collections::HashMap;
use std::fmt;

/// A parsed pattern segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// Literal segment, matched verbatim
    Static(String),
    /// Named parameter capturing one segment
    Param(String),
    /// Named parameter capturing one segment, omittable
    OptionalParam(String),
}

impl PatternSegment {
    fn param_name(&self) -> Option<&str> {
        match self {
            PatternSegment::Static(_) => None,
            PatternSegment::Param(name) | PatternSegment::OptionalParam(name) => Some(name),
        }
    }
}

/// A compiled route pattern
#[derive(Debug, Clone)]
pub struct RoutePattern {
    pattern: String,
    segments: Vec<PatternSegment>,
    /// Count of segments that must be present in a matching path
    required: usize,
    is_static: bool,
}

impl RoutePattern {
    /// Tokenize a pattern string.
    ///
    /// Rejects unterminated or embedded braces, empty or non-identifier
    /// parameter names, and duplicate names.
    pub fn parse(pattern: &str) -> Result<Self, Error> {
        let mut segments: Vec<PatternSegment> = Vec::new();
        let mut required = 0;

        for raw in pattern.split('/').filter(|s| !s.is_empty()) {
            if let Some(inner) = raw.strip_prefix('{') {
                let Some(inner) = inner.strip_suffix('}') else {
                    return Err(Error::InvalidRoutePattern(format!(
                        "unterminated placeholder `{}` in `{}`",
                        raw, pattern
                    )));
                };

                let (name, optional) = match inner.strip_suffix('?') {
                    Some(name) => (name, true),
                    None => (inner, false),
                };

                if name.is_empty()
                    || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Err(Error::InvalidRoutePattern(format!(
                        "invalid parameter name `{}` in `{}`",
                        name, pattern
                    )));
                }

                if segments.iter().any(|s| s.param_name() == Some(name)) {
                    return Err(Error::InvalidRoutePattern(format!(
                        "duplicate parameter `{}` in `{}`",
                        name, pattern
                    )));
                }

                if optional {
                    segments.push(PatternSegment::OptionalParam(name.to_string()));
                } else {
                    required += 1;
                    segments.push(PatternSegment::Param(name.to_string()));
                }
            } else if raw.contains('{') || raw.contains('}') {
                return Err(Error::InvalidRoutePattern(format!(
                    "malformed segment `{}` in `{}`",
                    raw, pattern
                )));
            } else {
                required += 1;
                segments.push(PatternSegment::Static(raw.to_string()));
            }
        }

        let is_static = segments
            .iter()
            .all(|s| matches!(s, PatternSegment::Static(_)));

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            required,
            is_static,
        })
    }

    /// The original pattern text
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// True if the pattern contains no placeholders
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Parameter names in pattern order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| s.param_name())
    }

    /// Match against a request path.
    ///
    /// Returns the captured parameters on a match. Omitted optional segments
    /// simply have no entry in the map. Trailing slashes in the path are
    /// tolerated.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        // Placeholder-free patterns compare directly
        if self.is_static && self.pattern == path {
            return Some(HashMap::new());
        }

        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if path_segments.len() < self.required || path_segments.len() > self.segments.len() {
            return None;
        }

        // How many optional segments the path actually supplies
        let mut optional_slots = path_segments.len() - self.required;
        let mut params = HashMap::new();
        let mut i = 0;

        for segment in &self.segments {
            match segment {
                PatternSegment::Static(literal) => {
                    if i >= path_segments.len() || path_segments[i] != literal {
                        return None;
                    }
                    i += 1;
                }
                PatternSegment::Param(name) => {
                    if i >= path_segments.len() {
                        return None;
                    }
                    params.insert(name.clone(), path_segments[i].to_string());
                    i += 1;
                }
                PatternSegment::OptionalParam(name) => {
                    if optional_slots > 0 && i < path_segments.len() {
                        params.insert(name.clone(), path_segments[i].to_string());
                        optional_slots -= 1;
                        i += 1;
                    }
                }
            }
        }

        if i != path_segments.len() {
            return None;
        }

        Some(params)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}
