//! Placeholder type constraints
//!
//! The vocabulary is fixed:
//!
//! | tag    | matches                                   |
//! |--------|-------------------------------------------|
//! | `int`  | one or more ASCII digits                  |
//! | `slug` | lowercase ASCII letters, digits, hyphens  |
//! | `uuid` | canonical 8-4-4-4-12 hexadecimal grouping |
//! | `any`  | any run of characters except `/`          |
//!
//! An untyped placeholder (`{id}`) behaves like `any`.

use std::fmt;
use std::str::FromStr;

/// Type tag restricting what a placeholder may capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Constraint {
    /// Digits only
    Int,
    /// Lowercase alphanumerics and hyphens
    Slug,
    /// Canonical UUID text form
    Uuid,
    /// Anything but a path separator
    #[default]
    Any,
}

impl Constraint {
    /// All constraint kinds, in documentation order.
    pub const ALL: [Constraint; 4] = [
        Constraint::Int,
        Constraint::Slug,
        Constraint::Uuid,
        Constraint::Any,
    ];

    /// The tag used in patterns and constraint maps.
    pub fn tag(&self) -> &'static str {
        match self {
            Constraint::Int => "int",
            Constraint::Slug => "slug",
            Constraint::Uuid => "uuid",
            Constraint::Any => "any",
        }
    }

    /// Regex fragment (without anchors or groups) matching one value.
    pub fn regex_fragment(&self) -> &'static str {
        match self {
            Constraint::Int => "[0-9]+",
            Constraint::Slug => "[a-z0-9-]+",
            Constraint::Uuid => {
                "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}"
            }
            Constraint::Any => "[^/]+",
        }
    }

    /// Check a standalone value against this constraint.
    ///
    /// Agrees with [`Constraint::regex_fragment`] without compiling a regex.
    pub fn accepts(&self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        match self {
            Constraint::Int => value.bytes().all(|b| b.is_ascii_digit()),
            Constraint::Slug => value
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'),
            Constraint::Uuid => {
                let groups: Vec<&str> = value.split('-').collect();
                groups.len() == 5
                    && groups
                        .iter()
                        .zip([8, 4, 4, 4, 12])
                        .all(|(g, len)| g.len() == len && g.bytes().all(|b| b.is_ascii_hexdigit()))
            }
            Constraint::Any => !value.contains('/'),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Returned when a tag is not part of the constraint vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown constraint type '{0}' (expected one of: int, slug, uuid, any)")]
pub struct UnknownConstraint(pub String);

impl FromStr for Constraint {
    type Err = UnknownConstraint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(Constraint::Int),
            "slug" => Ok(Constraint::Slug),
            "uuid" => Ok(Constraint::Uuid),
            "any" => Ok(Constraint::Any),
            other => Err(UnknownConstraint(other.to_string())),
        }
    }
}
