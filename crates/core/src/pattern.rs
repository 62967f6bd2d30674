//! Splitting user patterns into name and range.

/// The parts of a `name[@range]` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternParts {
    /// Package name, with the `@scope/` prefix restored for scoped packages.
    pub name: String,
    /// Requested range. `latest` when no `@` was given, `*` for a trailing `@`.
    pub range: String,
    /// Whether the user typed a non-empty range.
    pub has_version: bool,
}

/// Splits a pattern into name and range.
///
/// # Example
///
/// ```
/// use pkgadd_core::normalize_pattern;
///
/// let parts = normalize_pattern("@types/node@^20.1.0");
/// assert_eq!(parts.name, "@types/node");
/// assert_eq!(parts.range, "^20.1.0");
/// assert!(parts.has_version);
///
/// let bare = normalize_pattern("lodash");
/// assert_eq!(bare.range, "latest");
/// assert!(!bare.has_version);
/// ```
#[must_use]
pub fn normalize_pattern(pattern: &str) -> PatternParts {
    let (scope, rest) = match pattern.strip_prefix('@') {
        Some(rest) => ("@", rest),
        None => ("", pattern),
    };

    match rest.split_once('@') {
        Some((name, "")) => PatternParts {
            name: format!("{scope}{name}"),
            range: "*".to_string(),
            has_version: false,
        },
        Some((name, range)) => PatternParts {
            name: format!("{scope}{name}"),
            range: range.to_string(),
            has_version: true,
        },
        None => PatternParts {
            name: pattern.to_string(),
            range: "latest".to_string(),
            has_version: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name() {
        let parts = normalize_pattern("left-pad");
        assert_eq!(parts.name, "left-pad");
        assert_eq!(parts.range, "latest");
        assert!(!parts.has_version);
    }

    #[test]
    fn test_name_with_range() {
        let parts = normalize_pattern("lodash@~4.0.0");
        assert_eq!(parts.name, "lodash");
        assert_eq!(parts.range, "~4.0.0");
        assert!(parts.has_version);
    }

    #[test]
    fn test_trailing_at_is_star() {
        let parts = normalize_pattern("lodash@");
        assert_eq!(parts.name, "lodash");
        assert_eq!(parts.range, "*");
        assert!(!parts.has_version);
    }

    #[test]
    fn test_scoped_without_range() {
        let parts = normalize_pattern("@babel/core");
        assert_eq!(parts.name, "@babel/core");
        assert_eq!(parts.range, "latest");
        assert!(!parts.has_version);
    }

    #[test]
    fn test_range_may_contain_at() {
        let parts = normalize_pattern("foo@git+ssh://git@github.com:u/foo.git");
        assert_eq!(parts.name, "foo");
        assert_eq!(parts.range, "git+ssh://git@github.com:u/foo.git");
        assert!(parts.has_version);
    }

    #[test]
    fn test_tag_range() {
        let parts = normalize_pattern("react@next");
        assert_eq!(parts.name, "react");
        assert_eq!(parts.range, "next");
        assert!(parts.has_version);
    }
}
