//! Error types for the add pipeline.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for add operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while adding dependencies.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// An internal invariant of the pipeline does not hold.
    ///
    /// This indicates a bug in an earlier stage (usually resolution), not a
    /// user mistake. It is never recovered from.
    #[error("Invariant violation: {message}")]
    #[diagnostic(
        code(pkgadd::invariant_violation),
        help("This is a bug in pkgadd. Run with RUST_LOG=debug and report the output")
    )]
    InvariantViolation {
        /// What was expected but missing.
        message: String,
    },

    /// `add` was invoked at a workspace root without an explicit override.
    #[error("Running this command will add the dependency to the workspace root at {root}")]
    #[diagnostic(
        code(pkgadd::workspace_root_check),
        help(
            "If this is what you want, run the command again with --ignore-workspace-root-check (or -W)"
        )
    )]
    WorkspaceRootCheck {
        /// The workspace root the command was run in.
        root: PathBuf,
    },

    /// No package patterns were given.
    #[error("Missing list of packages to add to your project")]
    #[diagnostic(
        code(pkgadd::missing_patterns),
        help("Pass one or more packages, e.g. 'pkgadd add lodash'")
    )]
    MissingPatterns,

    /// No package with this name exists in any registry index.
    #[error("Package '{name}' not found")]
    #[diagnostic(
        code(pkgadd::package_not_found),
        help("Check the package name or refresh the package index")
    )]
    PackageNotFound {
        /// The requested package name.
        name: String,
    },

    /// The package exists but no version satisfies the requested range.
    #[error("Couldn't find any versions for '{name}' that match '{range}'")]
    #[diagnostic(
        code(pkgadd::no_matching_version),
        help("Loosen the range or check the available versions in the package index")
    )]
    NoMatchingVersion {
        /// The requested package name.
        name: String,
        /// The range that could not be satisfied.
        range: String,
    },

    /// The pattern is an exotic specifier this resolver cannot handle.
    #[error("Unsupported specifier '{pattern}'")]
    #[diagnostic(
        code(pkgadd::unsupported_specifier),
        help("Only registry ranges and local paths (file:, link:, ./dir) can be resolved offline")
    )]
    UnsupportedSpecifier {
        /// The offending pattern.
        pattern: String,
    },

    /// Failed to parse a lockfile.
    #[error("Failed to parse lockfile at {path}: {message}")]
    #[diagnostic(
        code(pkgadd::lockfile_parse),
        help("The lockfile may be corrupted. Try regenerating it with your package manager")
    )]
    LockfileParse {
        /// Path to the lockfile.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(pkgadd::config), help("{help}"))]
    Config {
        /// The error message.
        message: String,
        /// Help text for the user.
        help: String,
    },

    /// I/O error occurred.
    #[error("I/O error during {operation}{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(pkgadd::io),
        help("Check that the referenced paths exist and that you have permission to read or write them")
    )]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Optional path where the error occurred.
        path: Option<PathBuf>,
        /// Description of the operation being performed.
        operation: String,
    },

    /// JSON parsing or serialization error.
    #[error("JSON error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(pkgadd::json),
        help("Ensure the file contains valid JSON")
    )]
    Json {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },
}

impl Error {
    /// Create a new invariant violation.
    #[must_use]
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Create a new I/O error with context.
    #[must_use]
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: Some(path.into()),
            operation: operation.into(),
        }
    }

    /// Create a new JSON error for a file.
    #[must_use]
    pub fn json(source: serde_json::Error, path: impl Into<PathBuf>) -> Self {
        Self::Json {
            source,
            path: Some(path.into()),
        }
    }

    /// Create a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a new lockfile parse error.
    #[must_use]
    pub fn lockfile_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::LockfileParse {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            path: None,
            operation: "file operation".to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { source, path: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_violation_message() {
        let err = Error::invariant("missing package lodash");
        assert!(err.to_string().contains("Invariant violation"));
        assert!(err.to_string().contains("lodash"));
    }

    #[test]
    fn test_workspace_root_check_message() {
        let err = Error::WorkspaceRootCheck {
            root: PathBuf::from("/repo"),
        };
        assert!(err.to_string().contains("workspace root"));
        assert!(err.to_string().contains("/repo"));
    }

    #[test]
    fn test_no_matching_version_message() {
        let err = Error::NoMatchingVersion {
            name: "left-pad".to_string(),
            range: "^9.0.0".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("left-pad"));
        assert!(message.contains("^9.0.0"));
    }

    #[test]
    fn test_io_error_display() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::io(source, "/repo/package.json", "reading manifest");
        let message = err.to_string();
        assert!(message.contains("I/O error during reading manifest"));
        assert!(message.contains("/repo/package.json"));
    }

    #[test]
    fn test_io_error_no_path() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = source.into();
        let message = err.to_string();
        assert!(message.contains("I/O error during file operation"));
        assert!(!message.contains(" at "));
    }

    #[test]
    fn test_config_error_help() {
        use miette::Diagnostic;

        let err = Error::config("bad save-prefix", "use one of ^, ~ or an empty string");
        let help = err.help().map(|h| h.to_string());
        assert_eq!(help.as_deref(), Some("use one of ^, ~ or an empty string"));
    }
}
