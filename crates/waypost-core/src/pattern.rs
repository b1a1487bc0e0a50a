//! Pattern compilation
//!
//! Turns a route pattern such as `/users/{id:int}/posts/{slug:slug}` into an
//! anchored regular expression with one capture group per placeholder, e.g.
//! `^/users/([0-9]+)/posts/([a-z0-9-]+)$`. Compilation happens once, when the
//! route is registered.

use crate::constraint::Constraint;
use crate::error::RouteError;
use crate::path_params::PathParams;
use crate::path_validation::{parse_pattern, PatternPart};
use regex::Regex;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, constraint: Constraint },
}

/// A route pattern compiled into a matcher.
#[derive(Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
    segments: Vec<Segment>,
    param_names: Vec<String>,
    shape: String,
}

impl CompiledPattern {
    /// Compile `pattern`, applying `constraints` (placeholder name → type tag)
    /// on top of any inline `{name:type}` tags.
    pub fn compile(pattern: &str, constraints: &[(String, String)]) -> Result<Self, RouteError> {
        let parts = parse_pattern(pattern)?;

        for (param, _) in constraints {
            let declared = parts
                .iter()
                .any(|p| matches!(p, PatternPart::Param { name, .. } if name == param));
            if !declared {
                return Err(RouteError::InvalidConstraint {
                    pattern: pattern.to_string(),
                    param: param.clone(),
                    reason: "no placeholder with this name".to_string(),
                });
            }
        }

        let mut segments = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                PatternPart::Literal(text) => segments.push(Segment::Literal(text)),
                PatternPart::Param { name, tag } => {
                    let constraint = resolve_constraint(pattern, &name, tag.as_deref(), constraints)?;
                    segments.push(Segment::Param { name, constraint });
                }
            }
        }

        let mut regex_src = String::with_capacity(pattern.len() * 2);
        let mut shape = String::with_capacity(pattern.len());
        let mut param_names = Vec::new();
        regex_src.push('^');
        for segment in &segments {
            match segment {
                Segment::Literal(text) => {
                    regex_src.push_str(&regex::escape(text));
                    shape.push_str(text);
                }
                Segment::Param { name, constraint } => {
                    regex_src.push('(');
                    regex_src.push_str(constraint.regex_fragment());
                    regex_src.push(')');
                    shape.push_str("{}");
                    param_names.push(name.clone());
                }
            }
        }
        regex_src.push('$');

        let regex = Regex::new(&regex_src).map_err(|e| RouteError::MatcherCompile {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            segments,
            param_names,
            shape,
        })
    }

    /// The pattern as registered
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The pattern with every placeholder erased to `{}`.
    ///
    /// Two patterns with the same shape can never be told apart by the
    /// matcher's precedence rules, so the router rejects them per method.
    pub fn shape(&self) -> &str {
        &self.shape
    }

    /// Placeholder names in declared order
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// True when the pattern has no placeholders
    pub fn is_literal(&self) -> bool {
        self.param_names.is_empty()
    }

    /// Number of placeholders
    pub fn placeholder_count(&self) -> usize {
        self.param_names.len()
    }

    /// Test a path without extracting anything.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match a path and extract its parameters in declared order.
    pub fn captures(&self, path: &str) -> Option<PathParams> {
        let caps = self.regex.captures(path)?;
        let mut params = PathParams::with_capacity(self.param_names.len());
        for (i, name) in self.param_names.iter().enumerate() {
            let value = caps.get(i + 1)?;
            params.insert(name.as_str(), value.as_str());
        }
        Some(params)
    }

    /// Build a concrete path by substituting `params` into the placeholders.
    ///
    /// `route_name` is only used to label errors.
    pub fn build_path<K, V>(&self, route_name: &str, params: &[(K, V)]) -> Result<String, RouteError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut path = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Param { name, constraint } => {
                    let value = params
                        .iter()
                        .find(|(k, _)| k.as_ref() == name)
                        .map(|(_, v)| v.as_ref())
                        .ok_or_else(|| RouteError::MissingParameter {
                            name: route_name.to_string(),
                            param: name.clone(),
                        })?;
                    if !constraint.accepts(value) || !is_path_segment(value) {
                        return Err(RouteError::InvalidParameterValue {
                            name: route_name.to_string(),
                            param: name.clone(),
                            value: value.to_string(),
                            constraint: constraint.tag(),
                        });
                    }
                    path.push_str(value);
                }
            }
        }
        Ok(path)
    }
}

/// Whether `value` can be written into a URI path segment as is: RFC 3986
/// `pchar`s only (unreserved, sub-delims, `:` and `@`), with `%` allowed only
/// as the start of a `%XX` escape.
fn is_path_segment(value: &str) -> bool {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let escaped = bytes
                    .get(i + 1..i + 3)
                    .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
                if !escaped {
                    return false;
                }
                i += 3;
                continue;
            }
            b if b.is_ascii_alphanumeric() => {}
            b'-' | b'.' | b'_' | b'~' => {}
            b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'=' => {}
            b':' | b'@' => {}
            _ => return false,
        }
        i += 1;
    }
    true
}

fn resolve_constraint(
    pattern: &str,
    name: &str,
    inline: Option<&str>,
    constraints: &[(String, String)],
) -> Result<Constraint, RouteError> {
    let invalid = |reason: String| RouteError::InvalidConstraint {
        pattern: pattern.to_string(),
        param: name.to_string(),
        reason,
    };

    let mut resolved: Option<Constraint> = match inline {
        Some(tag) => Some(tag.parse::<Constraint>().map_err(|e| invalid(e.to_string()))?),
        None => None,
    };

    for (_, tag) in constraints.iter().filter(|(param, _)| param == name) {
        let parsed = tag.parse::<Constraint>().map_err(|e| invalid(e.to_string()))?;
        match resolved {
            Some(existing) if existing != parsed => {
                return Err(invalid(format!(
                    "conflicting types '{}' and '{}'",
                    existing, parsed
                )));
            }
            _ => resolved = Some(parsed),
        }
    }

    Ok(resolved.unwrap_or_default())
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("source", &self.source)
            .field("regex", &self.regex.as_str())
            .field("params", &self.param_names)
            .finish()
    }
}
