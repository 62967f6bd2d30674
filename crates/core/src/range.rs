//! npm-style range matching on top of the `semver` crate.
//!
//! `semver` implements Cargo's requirement syntax, which agrees with npm on
//! caret, tilde and comparison operators but differs on a few points. This
//! module translates an npm range into one `VersionReq` per `||` alternative:
//!
//! - comparators are separated by whitespace instead of commas
//! - a bare version means an exact match (`1.2.3` is `=1.2.3`)
//! - hyphen ranges (`1.2.3 - 2.0`)
//! - `~>` is an alias for `~`, and versions may carry a leading `v`

use semver::{Version, VersionReq};

const OPERATORS: [&str; 8] = ["<=", ">=", "~>", "<", ">", "=", "^", "~"];

/// Returns `true` if `version` satisfies the npm `range`.
///
/// Unparsable versions or ranges never match, so dist-tags such as `latest`
/// return `false`.
///
/// # Example
///
/// ```
/// use pkgadd_core::satisfies;
///
/// assert!(satisfies("4.0.0", "~4.0.0"));
/// assert!(satisfies("1.2.3", "1.2.3"));
/// assert!(!satisfies("1.2.4", "1.2.3"));
/// assert!(satisfies("2.5.0", "^1.0.0 || ^2.0.0"));
/// assert!(!satisfies("4.17.21", "latest"));
/// ```
#[must_use]
pub fn satisfies(version: &str, range: &str) -> bool {
    let Ok(version) = parse_version(version) else {
        return false;
    };
    satisfies_version(&version, range)
}

/// Same as [`satisfies`] for an already-parsed version.
#[must_use]
pub fn satisfies_version(version: &Version, range: &str) -> bool {
    range
        .split("||")
        .filter_map(|alternative| translate(alternative.trim()))
        .any(|req| req.matches(version))
}

/// Parses a version the way npm does for user input: surrounding
/// whitespace, `=` and `v` prefixes are ignored.
///
/// # Errors
///
/// Returns the underlying `semver` error for malformed versions.
pub fn parse_version(version: &str) -> Result<Version, semver::Error> {
    let trimmed = version.trim().trim_start_matches('=');
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(trimmed)
}

fn translate(alternative: &str) -> Option<VersionReq> {
    if matches!(alternative, "" | "*" | "x" | "X") {
        return Some(VersionReq::STAR);
    }

    let comparators = if let Some((low, high)) = alternative.split_once(" - ") {
        vec![
            format!(">={}", strip_v(low.trim())),
            format!("<={}", strip_v(high.trim())),
        ]
    } else {
        comparator_tokens(alternative)?
            .into_iter()
            .map(|(op, version)| translate_comparator(op, version))
            .collect::<Option<Vec<_>>>()?
    };

    if comparators.iter().any(|c| c == "*") {
        return if comparators.len() == 1 {
            Some(VersionReq::STAR)
        } else {
            VersionReq::parse(
                &comparators
                    .into_iter()
                    .filter(|c| c != "*")
                    .collect::<Vec<_>>()
                    .join(", "),
            )
            .ok()
        };
    }

    VersionReq::parse(&comparators.join(", ")).ok()
}

/// Splits a comparator set into `(operator, version)` pairs, allowing a
/// space between an operator and its version (`>= 1.2.0`).
fn comparator_tokens(alternative: &str) -> Option<Vec<(&str, &str)>> {
    let mut tokens = Vec::new();
    let mut pending_op: Option<&str> = None;

    for word in alternative.split_whitespace() {
        let op = OPERATORS
            .iter()
            .find(|op| word.starts_with(*op))
            .copied()
            .unwrap_or("");
        let version = &word[op.len()..];

        match (pending_op.take(), op, version) {
            (Some(_), "", _) if version.is_empty() => return None,
            (Some(prev), "", version) => tokens.push((prev, version)),
            (Some(_), _, _) => return None,
            (None, op, "") if !op.is_empty() => pending_op = Some(op),
            (None, op, version) => tokens.push((op, version)),
        }
    }

    if pending_op.is_some() || tokens.is_empty() {
        return None;
    }
    Some(tokens)
}

fn translate_comparator(op: &str, version: &str) -> Option<String> {
    let version = strip_wildcards(strip_v(version));
    if version.is_empty() {
        return None;
    }
    if version == "*" {
        return match op {
            "" | "=" | ">=" | "^" | "~" | "~>" => Some("*".to_string()),
            _ => None,
        };
    }

    let op = match op {
        "" => "=",
        "~>" => "~",
        other => other,
    };
    Some(format!("{op}{version}"))
}

/// Drops trailing wildcard components so `1.2.x` becomes the partial
/// version `1.2`. A version made only of wildcards becomes `*`.
fn strip_wildcards(version: &str) -> &str {
    let is_wildcard = |part: &str| matches!(part, "*" | "x" | "X");
    let mut end = 0;
    for (index, part) in version.split('.').enumerate() {
        if is_wildcard(part) {
            return if index == 0 { "*" } else { &version[..end] };
        }
        end += part.len() + usize::from(index > 0);
    }
    version
}

fn strip_v(version: &str) -> &str {
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}
