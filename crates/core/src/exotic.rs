//! Recognizes specifiers that are resolved by something other than semver
//! range matching (paths, links, git repositories, tarball URLs).

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// `user/repo` or `user/repo#ref`, where `user` cannot start like a scope,
/// a relative path or a flag.
#[allow(clippy::expect_used)]
static GITHUB_SHORTHAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^:@%/\s.-][^:@%/\s]*/[^:@\s/%]+(?:#.*)?$").expect("static regex is valid")
});

/// scp-like git remotes such as `git@github.com:user/repo.git`.
#[allow(clippy::expect_used)]
static SCP_REMOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.-]+@[\w-]+(?:\.[\w-]+)+:.+$").expect("static regex is valid")
});

/// Windows drive-letter paths.
#[allow(clippy::expect_used)]
static DRIVE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]:[\\/]").expect("static regex is valid"));

const HOSTED_PREFIXES: [&str; 3] = ["github:", "gitlab:", "bitbucket:"];
const GIT_HOSTS: [&str; 3] = ["github.com", "gitlab.com", "bitbucket.org"];

/// Kind of exotic specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExoticKind {
    /// `link:<path>`
    Link,
    /// `file:<path>`, `./dir`, `../dir` or an absolute path.
    File,
    /// `github:`, `gitlab:`, `bitbucket:` or the `user/repo` shorthand.
    HostedGit,
    /// A git remote URL.
    Git,
    /// Any other http(s) URL.
    Tarball,
}

impl fmt::Display for ExoticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Link => "link",
            Self::File => "file",
            Self::HostedGit => "hosted-git",
            Self::Git => "git",
            Self::Tarball => "tarball",
        };
        f.write_str(name)
    }
}

/// Classifies a pattern, returning `None` for registry patterns.
///
/// # Example
///
/// ```
/// use pkgadd_core::exotic::{classify, ExoticKind};
///
/// assert_eq!(classify("file:../local-pkg"), Some(ExoticKind::File));
/// assert_eq!(classify("expressjs/express#4.x"), Some(ExoticKind::HostedGit));
/// assert_eq!(classify("lodash@^4.17.0"), None);
/// ```
#[must_use]
pub fn classify(pattern: &str) -> Option<ExoticKind> {
    if pattern.starts_with("link:") {
        return Some(ExoticKind::Link);
    }
    if pattern.starts_with("file:") || is_local_path(pattern) {
        return Some(ExoticKind::File);
    }
    if HOSTED_PREFIXES.iter().any(|p| pattern.starts_with(p)) {
        return Some(ExoticKind::HostedGit);
    }
    if is_git_remote(pattern) {
        return Some(ExoticKind::Git);
    }
    if GITHUB_SHORTHAND.is_match(pattern) {
        return Some(ExoticKind::HostedGit);
    }
    if pattern.starts_with("http://") || pattern.starts_with("https://") {
        return Some(ExoticKind::Tarball);
    }
    None
}

/// Returns `true` if the pattern is not a plain `name[@range]` pair.
#[must_use]
pub fn is_exotic(pattern: &str) -> bool {
    classify(pattern).is_some()
}

fn is_local_path(pattern: &str) -> bool {
    pattern.starts_with("./")
        || pattern.starts_with("../")
        || pattern.starts_with('/')
        || DRIVE_PATH.is_match(pattern)
}

fn is_git_remote(pattern: &str) -> bool {
    if SCP_REMOTE.is_match(pattern) {
        return true;
    }

    let Some((scheme, rest)) = pattern.split_once("://") else {
        return pattern.starts_with("git:");
    };
    let scheme = scheme.to_ascii_lowercase();
    if scheme == "git" || scheme == "ssh" || scheme.starts_with("git+") {
        return true;
    }
    if scheme != "http" && scheme != "https" {
        return false;
    }

    let rest = rest.split(['#', '?']).next().unwrap_or(rest);
    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
    if path.ends_with(".git") {
        return true;
    }

    let host = authority.rsplit('@').next().unwrap_or(authority);
    let host = host.split(':').next().unwrap_or(host);
    let host = host.strip_prefix("www.").unwrap_or(host);
    GIT_HOSTS.contains(&host) && path.split('/').filter(|s| !s.is_empty()).count() >= 2
}
