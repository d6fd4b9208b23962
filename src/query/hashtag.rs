//! Hashtag expressions
//!
//! A raw hashtag from the caller is either an exact tag (`missingmaps`) or a
//! prefix wildcard (`missingmaps*`). Stored hashtags carry a leading `#`,
//! which is only added when the expression is bound to a query.

use crate::query::ast::Predicate;
use serde::Serialize;

/// Marker prefix stored in front of every hashtag in the dataset
pub const HASHTAG_MARKER: char = '#';

/// Suffix that turns a hashtag into a prefix match
pub const WILDCARD_SUFFIX: char = '*';

/// A classified, normalized hashtag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashtagExpression {
    normalized_tag: String,
    is_wildcard: bool,
}

impl HashtagExpression {
    /// Classify a raw hashtag string
    ///
    /// Any string is accepted, including the empty string. A single
    /// trailing `*` marks a prefix wildcard and is stripped; everything
    /// else is kept verbatim.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_suffix(WILDCARD_SUFFIX) {
            Some(prefix) => Self {
                normalized_tag: prefix.to_string(),
                is_wildcard: true,
            },
            None => Self {
                normalized_tag: raw.to_string(),
                is_wildcard: false,
            },
        }
    }

    /// The tag without wildcard suffix or marker
    pub fn normalized_tag(&self) -> &str {
        &self.normalized_tag
    }

    /// Whether this expression matches by prefix
    pub fn is_wildcard(&self) -> bool {
        self.is_wildcard
    }

    /// The value bound into the query, with the stored marker prepended
    pub fn bound_tag(&self) -> String {
        format!("{}{}", HASHTAG_MARKER, self.normalized_tag)
    }

    /// Matching predicate for this expression
    pub fn predicate(&self) -> Predicate {
        if self.is_wildcard {
            Predicate::HashtagPrefix(self.bound_tag())
        } else {
            Predicate::HashtagEquals(self.bound_tag())
        }
    }
}

impl std::fmt::Display for HashtagExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_wildcard {
            write!(f, "{}{}", self.normalized_tag, WILDCARD_SUFFIX)
        } else {
            write!(f, "{}", self.normalized_tag)
        }
    }
}
