//! Project configuration read from `pkgadd.toml`.
//!
//! ```toml
//! save-prefix = "~"
//! save-exact = false
//! ```
//!
//! Command-line flags and their environment variables take precedence over
//! the file, which takes precedence over the defaults.

use crate::cli::AddArgs;
use pkgadd_core::{Error, Result, SaveOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name looked up in the project directory.
pub const CONFIG_FILENAME: &str = "pkgadd.toml";

/// Save policy configured for a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct AddConfig {
    /// Prefix placed in front of resolved versions. Empty means exact.
    pub save_prefix: Option<String>,
    /// Always save exact versions.
    pub save_exact: bool,
}

impl AddConfig {
    /// Loads `pkgadd.toml` from `dir`, or the defaults if there is none.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILENAME);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::io(e, &path, "reading configuration")),
        };
        toml::from_str(&contents).map_err(|e| {
            Error::config(
                format!("Invalid {}: {e}", path.display()),
                "Supported keys are save-prefix (string) and save-exact (boolean)",
            )
        })
    }

    /// Combines the file settings with the command line.
    pub fn save_options(&self, args: &AddArgs) -> SaveOptions {
        SaveOptions {
            tilde: args.tilde,
            exact: args.exact,
            save_exact: args.save_exact.unwrap_or(self.save_exact),
            save_prefix: args.save_prefix.clone().or_else(|| self.save_prefix.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use tempfile::TempDir;

    fn args(extra: &[&str]) -> AddArgs {
        let mut argv = vec!["pkgadd", "add"];
        argv.extend_from_slice(extra);
        argv.push("lodash");
        let Commands::Add(add) = Cli::try_parse_from(argv).unwrap().command;
        add
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(AddConfig::load(dir.path()).unwrap(), AddConfig::default());
    }

    #[test]
    fn test_file_is_parsed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "save-prefix = \"~\"\nsave-exact = true\n",
        )
        .unwrap();

        let config = AddConfig::load(dir.path()).unwrap();
        assert_eq!(config.save_prefix.as_deref(), Some("~"));
        assert!(config.save_exact);
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "save-prefx = \"~\"\n").unwrap();

        let err = AddConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_flags_override_file() {
        let config = AddConfig {
            save_prefix: Some("~".to_string()),
            save_exact: true,
        };

        let options = config.save_options(&args(&["--save-prefix", ">=", "--save-exact=false"]));
        assert_eq!(options.save_prefix.as_deref(), Some(">="));
        assert!(!options.save_exact);

        let options = config.save_options(&args(&["--tilde"]));
        assert!(options.tilde);
        assert!(options.save_exact);
        assert_eq!(options.save_prefix.as_deref(), Some("~"));
    }
}
