use crate::tracing::{LogLevel, TracingFormat};
use clap::{ArgGroup, Args, Parser, Subcommand};
use pkgadd_core::DependencyOrigin;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pkgadd")]
#[command(about = "Add dependencies to package.json and bower.json manifests")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(
        long,
        global = true,
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,

    #[arg(long, global = true, help = "Output logs in JSON format")]
    pub json: bool,
}

impl Cli {
    /// `--json` overrides `--log-format`.
    pub const fn tracing_format(&self) -> TracingFormat {
        if self.json {
            TracingFormat::Json
        } else {
            self.log_format
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Add one or more packages to the project")]
    Add(AddArgs),
}

#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("origin").args(["dev", "peer", "optional"])))]
pub struct AddArgs {
    #[arg(help = "Packages to add, e.g. lodash, react@^18, file:../local")]
    pub patterns: Vec<String>,

    #[arg(short = 'D', long, help = "Save to devDependencies")]
    pub dev: bool,

    #[arg(short = 'P', long, help = "Save to peerDependencies")]
    pub peer: bool,

    #[arg(short = 'O', long, help = "Save to optionalDependencies")]
    pub optional: bool,

    #[arg(
        short = 'E',
        long,
        conflicts_with = "tilde",
        help = "Save the exact resolved version"
    )]
    pub exact: bool,

    #[arg(short = 'T', long, help = "Save with a ~ prefix")]
    pub tilde: bool,

    #[arg(
        short = 'W',
        long,
        help = "Allow adding dependencies to the workspace root"
    )]
    pub ignore_workspace_root_check: bool,

    #[arg(long, help = "Project directory", default_value = ".")]
    pub cwd: PathBuf,

    #[arg(
        long,
        help = "Package index file, relative to the project directory",
        default_value = ".pkgadd/index.json"
    )]
    pub index: PathBuf,

    #[arg(
        long,
        env = "PKGADD_SAVE_PREFIX",
        help = "Prefix for saved versions (default ^)"
    )]
    pub save_prefix: Option<String>,

    #[arg(
        long,
        env = "PKGADD_SAVE_EXACT",
        num_args = 0..=1,
        default_missing_value = "true",
        help = "Always save exact versions"
    )]
    pub save_exact: Option<bool>,

    #[arg(long, help = "Record a production-only install in the integrity check")]
    pub production: bool,

    #[arg(long, help = "Record that optional dependencies are skipped")]
    pub ignore_optional: bool,
}

impl AddArgs {
    /// Collapses the mutually exclusive section flags.
    pub const fn origin(&self) -> DependencyOrigin {
        DependencyOrigin::from_flags(self.dev, self.peer, self.optional)
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_args(args: &[&str]) -> AddArgs {
        let mut argv = vec!["pkgadd", "add"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        let Commands::Add(add) = cli.command;
        add
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["pkgadd", "add", "lodash"]).unwrap();

        assert_eq!(cli.level, LogLevel::Warn);
        assert!(!cli.json);
        assert_eq!(cli.tracing_format(), TracingFormat::Compact);

        let Commands::Add(add) = cli.command;
        assert_eq!(add.patterns, vec!["lodash"]);
        assert_eq!(add.origin(), DependencyOrigin::Dependencies);
        assert_eq!(add.index, PathBuf::from(".pkgadd/index.json"));
        assert!(!add.exact && !add.tilde);
    }

    #[test]
    fn test_cli_json_flag_overrides_format() {
        let cli = Cli::try_parse_from(["pkgadd", "--json", "--log-format", "pretty", "add", "a"]).unwrap();
        assert_eq!(cli.tracing_format(), TracingFormat::Json);
    }

    #[test]
    fn test_origin_flags() {
        assert_eq!(add_args(&["-D", "jest"]).origin(), DependencyOrigin::DevDependencies);
        assert_eq!(add_args(&["--peer", "react"]).origin(), DependencyOrigin::PeerDependencies);
        assert_eq!(add_args(&["-O", "fsevents"]).origin(), DependencyOrigin::OptionalDependencies);
    }

    #[test]
    fn test_origin_flags_are_exclusive() {
        assert!(Cli::try_parse_from(["pkgadd", "add", "--dev", "--peer", "a"]).is_err());
        assert!(Cli::try_parse_from(["pkgadd", "add", "-D", "-O", "a"]).is_err());
    }

    #[test]
    fn test_exact_conflicts_with_tilde() {
        assert!(Cli::try_parse_from(["pkgadd", "add", "--exact", "--tilde", "a"]).is_err());
        assert!(add_args(&["-E", "a"]).exact);
        assert!(add_args(&["-T", "a"]).tilde);
    }

    #[test]
    fn test_save_exact_flag_without_value() {
        assert_eq!(add_args(&["--save-exact", "--", "a"]).save_exact, Some(true));
        assert_eq!(add_args(&["--save-exact=false", "a"]).save_exact, Some(false));
    }

    #[test]
    fn test_patterns_may_be_empty_at_parse_time() {
        assert!(add_args(&[]).patterns.is_empty());
    }

    #[test]
    fn test_workspace_root_override() {
        assert!(add_args(&["-W", "a"]).ignore_workspace_root_check);
    }
}
