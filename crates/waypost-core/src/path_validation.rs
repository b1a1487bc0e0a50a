//! Route pattern parsing and validation
//!
//! A pattern is a sequence of literal text and placeholders. Placeholders take
//! the form `{name}` or `{name:type}`; the type tag is kept as written and
//! resolved against the constraint vocabulary by the router.

/// One piece of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternPart {
    /// Text matched verbatim
    Literal(String),
    /// A named placeholder with its optional inline type tag
    Param {
        name: String,
        tag: Option<String>,
    },
}

/// Result of path validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathValidationError {
    /// Path must start with '/'
    MustStartWithSlash { path: String },
    /// Path contains empty segment (double slash)
    EmptySegment { path: String },
    /// Nested braces are not allowed
    NestedBraces { path: String, position: usize },
    /// Unmatched closing brace
    UnmatchedClosingBrace { path: String, position: usize },
    /// Empty parameter name
    EmptyParameterName { path: String, position: usize },
    /// Invalid parameter name (contains invalid characters)
    InvalidParameterName { path: String, param_name: String, position: usize },
    /// Parameter name starts with digit
    ParameterStartsWithDigit { path: String, param_name: String, position: usize },
    /// The same placeholder name appears twice
    DuplicateParameterName { path: String, param_name: String, position: usize },
    /// Two placeholders with no literal text between them
    AdjacentParameters { path: String, position: usize },
    /// Unclosed brace
    UnclosedBrace { path: String },
    /// Invalid character in path
    InvalidCharacter { path: String, character: char, position: usize },
}

impl std::fmt::Display for PathValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathValidationError::MustStartWithSlash { path } => {
                write!(f, "route pattern must start with '/', got: \"{}\"", path)
            }
            PathValidationError::EmptySegment { path } => {
                write!(f, "route pattern contains empty segment (double slash): \"{}\"", path)
            }
            PathValidationError::NestedBraces { path, position } => {
                write!(f, "nested braces are not allowed in route pattern at position {}: \"{}\"", position, path)
            }
            PathValidationError::UnmatchedClosingBrace { path, position } => {
                write!(f, "unmatched closing brace '}}' at position {} in route pattern: \"{}\"", position, path)
            }
            PathValidationError::EmptyParameterName { path, position } => {
                write!(f, "empty parameter name at position {} in route pattern: \"{}\"", position, path)
            }
            PathValidationError::InvalidParameterName { path, param_name, position } => {
                write!(f, "invalid parameter name '{}' at position {} - parameter names must contain only alphanumeric characters and underscores: \"{}\"", param_name, position, path)
            }
            PathValidationError::ParameterStartsWithDigit { path, param_name, position } => {
                write!(f, "parameter name '{}' cannot start with a digit at position {}: \"{}\"", param_name, position, path)
            }
            PathValidationError::DuplicateParameterName { path, param_name, position } => {
                write!(f, "parameter name '{}' is used more than once (again at position {}): \"{}\"", param_name, position, path)
            }
            PathValidationError::AdjacentParameters { path, position } => {
                write!(f, "placeholder at position {} directly follows another placeholder: \"{}\"", position, path)
            }
            PathValidationError::UnclosedBrace { path } => {
                write!(f, "unclosed brace '{{' in route pattern (missing closing '}}'): \"{}\"", path)
            }
            PathValidationError::InvalidCharacter { path, character, position } => {
                write!(f, "invalid character '{}' at position {} in route pattern: \"{}\"", character, position, path)
            }
        }
    }
}

impl std::error::Error for PathValidationError {}

/// Characters allowed in literal text besides ASCII alphanumerics and '/'.
const LITERAL_EXTRA: &str = "-._~!$&'()*+,;=:@%";

/// Parse a route pattern into literal and placeholder parts.
///
/// # Rules
/// - Must start with '/'
/// - No empty segments ('//')
/// - Braces must be balanced and not nested
/// - Placeholder names are identifiers (`[A-Za-z_][A-Za-z0-9_]*`), unique
///   within the pattern
/// - Two placeholders must be separated by literal text
///
/// # Examples
///
/// ```
/// use waypost_core::path_validation::{parse_pattern, PatternPart};
///
/// let parts = parse_pattern("/users/{id:int}").unwrap();
/// assert_eq!(parts, vec![
///     PatternPart::Literal("/users/".to_string()),
///     PatternPart::Param { name: "id".to_string(), tag: Some("int".to_string()) },
/// ]);
/// ```
pub fn parse_pattern(path: &str) -> Result<Vec<PatternPart>, PathValidationError> {
    if !path.starts_with('/') {
        return Err(PathValidationError::MustStartWithSlash {
            path: path.to_string(),
        });
    }

    if path.contains("//") {
        return Err(PathValidationError::EmptySegment {
            path: path.to_string(),
        });
    }

    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut param_start: Option<usize> = None;
    let mut seen: Vec<String> = Vec::new();

    for (i, ch) in path.char_indices() {
        match ch {
            '{' => {
                if param_start.is_some() {
                    return Err(PathValidationError::NestedBraces {
                        path: path.to_string(),
                        position: i,
                    });
                }
                if literal.is_empty() && matches!(parts.last(), Some(PatternPart::Param { .. })) {
                    return Err(PathValidationError::AdjacentParameters {
                        path: path.to_string(),
                        position: i,
                    });
                }
                if !literal.is_empty() {
                    parts.push(PatternPart::Literal(std::mem::take(&mut literal)));
                }
                param_start = Some(i);
            }
            '}' => {
                let Some(start) = param_start.take() else {
                    return Err(PathValidationError::UnmatchedClosingBrace {
                        path: path.to_string(),
                        position: i,
                    });
                };
                let inner = &path[start + 1..i];
                let (name, tag) = match inner.split_once(':') {
                    Some((name, tag)) => (name, Some(tag.to_string())),
                    None => (inner, None),
                };
                validate_param_name(path, name, start)?;
                if seen.iter().any(|s| s == name) {
                    return Err(PathValidationError::DuplicateParameterName {
                        path: path.to_string(),
                        param_name: name.to_string(),
                        position: start,
                    });
                }
                seen.push(name.to_string());
                parts.push(PatternPart::Param {
                    name: name.to_string(),
                    tag,
                });
            }
            _ if param_start.is_some() => {}
            _ => {
                if !ch.is_ascii_alphanumeric() && ch != '/' && !LITERAL_EXTRA.contains(ch) {
                    return Err(PathValidationError::InvalidCharacter {
                        path: path.to_string(),
                        character: ch,
                        position: i,
                    });
                }
                literal.push(ch);
            }
        }
    }

    if param_start.is_some() {
        return Err(PathValidationError::UnclosedBrace {
            path: path.to_string(),
        });
    }

    if !literal.is_empty() {
        parts.push(PatternPart::Literal(literal));
    }

    Ok(parts)
}

fn validate_param_name(path: &str, name: &str, position: usize) -> Result<(), PathValidationError> {
    if name.is_empty() {
        return Err(PathValidationError::EmptyParameterName {
            path: path.to_string(),
            position,
        });
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(PathValidationError::InvalidParameterName {
            path: path.to_string(),
            param_name: name.to_string(),
            position,
        });
    }
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return Err(PathValidationError::ParameterStartsWithDigit {
            path: path.to_string(),
            param_name: name.to_string(),
            position,
        });
    }
    Ok(())
}

/// Validate route pattern syntax without keeping the parsed parts
pub fn validate_path(path: &str) -> Result<(), PathValidationError> {
    parse_pattern(path).map(|_| ())
}

/// Check if a path is valid (convenience function)
pub fn is_valid_path(path: &str) -> bool {
    validate_path(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_paths() {
        assert!(validate_path("/").is_ok());
        assert!(validate_path("/users").is_ok());
        assert!(validate_path("/users/").is_ok());
        assert!(validate_path("/users/{id}").is_ok());
        assert!(validate_path("/users/{id:int}").is_ok());
        assert!(validate_path("/users/{user_id}/posts/{post_id:slug}").is_ok());
        assert!(validate_path("/api-v1/users").is_ok());
        assert!(validate_path("/files/{name}.{ext}").is_ok());
        assert!(validate_path("/report-{year:int}").is_ok());
    }

    #[test]
    fn test_parts_of_mixed_segment() {
        let parts = parse_pattern("/files/{name}.{ext}").unwrap();
        assert_eq!(
            parts,
            vec![
                PatternPart::Literal("/files/".into()),
                PatternPart::Param { name: "name".into(), tag: None },
                PatternPart::Literal(".".into()),
                PatternPart::Param { name: "ext".into(), tag: None },
            ]
        );
    }

    #[test]
    fn test_missing_leading_slash() {
        let result = validate_path("users/{id}");
        assert!(matches!(result, Err(PathValidationError::MustStartWithSlash { .. })));
    }

    #[test]
    fn test_double_slash() {
        let result = validate_path("/users//posts");
        assert!(matches!(result, Err(PathValidationError::EmptySegment { .. })));
    }

    #[test]
    fn test_brace_errors() {
        assert!(matches!(
            validate_path("/users/{id"),
            Err(PathValidationError::UnclosedBrace { .. })
        ));
        assert!(matches!(
            validate_path("/users/id}"),
            Err(PathValidationError::UnmatchedClosingBrace { .. })
        ));
        assert!(matches!(
            validate_path("/users/{{id}}"),
            Err(PathValidationError::NestedBraces { .. })
        ));
        assert!(matches!(
            validate_path("/users/{}"),
            Err(PathValidationError::EmptyParameterName { .. })
        ));
        assert!(matches!(
            validate_path("/users/{:int}"),
            Err(PathValidationError::EmptyParameterName { .. })
        ));
    }

    #[test]
    fn test_parameter_names() {
        assert!(matches!(
            validate_path("/users/{1id}"),
            Err(PathValidationError::ParameterStartsWithDigit { .. })
        ));
        assert!(matches!(
            validate_path("/users/{id-name}"),
            Err(PathValidationError::InvalidParameterName { .. })
        ));
        assert!(matches!(
            validate_path("/users/{id}/posts/{id}"),
            Err(PathValidationError::DuplicateParameterName { .. })
        ));
    }

    #[test]
    fn test_adjacent_parameters() {
        assert!(matches!(
            validate_path("/x/{a}{b}"),
            Err(PathValidationError::AdjacentParameters { .. })
        ));
    }

    #[test]
    fn test_invalid_characters() {
        assert!(matches!(
            validate_path("/users?query"),
            Err(PathValidationError::InvalidCharacter { .. })
        ));
        assert!(matches!(
            validate_path("/users#anchor"),
            Err(PathValidationError::InvalidCharacter { .. })
        ));
        assert!(matches!(
            validate_path("/users list"),
            Err(PathValidationError::InvalidCharacter { .. })
        ));
    }

    #[test]
    fn test_error_display_mentions_pattern() {
        let err = validate_path("/users/{id").unwrap_err();
        assert!(err.to_string().contains("/users/{id"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Well-formed patterns parse into exactly one Param per placeholder
        #[test]
        fn prop_valid_patterns_accepted(
            segments in prop::collection::vec("[a-z][a-z0-9_-]{0,8}", 1..5),
            params in prop::collection::vec("[a-z_][a-z0-9_]{0,8}", 0..3),
        ) {
            let mut path = String::new();
            for seg in &segments {
                path.push('/');
                path.push_str(seg);
            }
            let mut distinct = params.clone();
            distinct.sort();
            distinct.dedup();
            for p in &distinct {
                path.push_str("/{");
                path.push_str(p);
                path.push('}');
            }

            let parts = parse_pattern(&path);
            prop_assert!(parts.is_ok(), "'{}' should parse: {:?}", path, parts);
            let count = parts
                .unwrap()
                .iter()
                .filter(|p| matches!(p, PatternPart::Param { .. }))
                .count();
            prop_assert_eq!(count, distinct.len());
        }

        /// Anything not starting with '/' is rejected
        #[test]
        fn prop_missing_slash_rejected(path in "[a-z][a-z0-9/]{0,12}") {
            prop_assert!(
                matches!(
                    validate_path(&path),
                    Err(PathValidationError::MustStartWithSlash { .. })
                ),
                "expected MustStartWithSlash for '{}'", path
            );
        }
    }
}
