//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use wikiprobe::SuiteKind;

use crate::config::ColorChoice;
use crate::output::OutputFormat;

/// Wikiprobe: end-to-end UI test suites for Wikipedia
#[derive(Parser, Debug)]
#[command(name = "wikiprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// YAML run configuration
    #[arg(long, global = true, env = "WIKIPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List suites and their cases in run order
    List(ListArgs),

    /// Run suites against the live site
    Run(RunArgs),

    /// Show the effective configuration
    Config,
}

/// Arguments for the list command
#[derive(Parser, Debug, Default)]
pub struct ListArgs {
    /// Only list these suites
    #[arg(short, long = "suite", value_enum)]
    pub suites: Vec<SuiteArg>,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suites to run (default: all)
    #[arg(short, long = "suite", value_enum)]
    pub suites: Vec<SuiteArg>,

    /// Only run cases whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Pause after notable actions, in milliseconds
    #[arg(long)]
    pub pacing_ms: Option<u64>,

    /// Skip remaining cases of a suite after its first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: FormatArg,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Suite selector
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuiteArg {
    /// Site navigation
    Navigation,
    /// Login and logout
    Authentication,
    /// Article content
    Content,
    /// Search
    Search,
}

impl From<SuiteArg> for SuiteKind {
    fn from(arg: SuiteArg) -> Self {
        match arg {
            SuiteArg::Navigation => Self::Navigation,
            SuiteArg::Authentication => Self::Authentication,
            SuiteArg::Content => Self::Content,
            SuiteArg::Search => Self::Search,
        }
    }
}

/// Suites named on the command line, or all of them, without repeats
#[must_use]
pub fn resolve_suites(args: &[SuiteArg]) -> Vec<SuiteKind> {
    if args.is_empty() {
        return SuiteKind::ALL.to_vec();
    }
    let mut kinds: Vec<SuiteKind> = Vec::with_capacity(args.len());
    for kind in args.iter().copied().map(SuiteKind::from) {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds
}

/// Report format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON document
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Detect from the terminal
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod parsing_tests {
        use super::*;

        #[test]
        fn test_run_defaults() {
            let cli = Cli::try_parse_from(["wikiprobe", "run"]).unwrap();
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert!(args.suites.is_empty());
            assert!(!args.headed);
            assert_eq!(args.format, FormatArg::Text);
            assert!(args.output.is_none());
        }

        #[test]
        fn test_run_with_options() {
            let cli = Cli::try_parse_from([
                "wikiprobe",
                "-vv",
                "run",
                "--suite",
                "search",
                "-s",
                "content",
                "--filter",
                "logo",
                "--headed",
                "--pacing-ms",
                "500",
                "--fail-fast",
                "--format",
                "json",
            ])
            .unwrap();
            assert_eq!(cli.verbose, 2);
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(args.suites, vec![SuiteArg::Search, SuiteArg::Content]);
            assert_eq!(args.filter.as_deref(), Some("logo"));
            assert!(args.headed);
            assert_eq!(args.pacing_ms, Some(500));
            assert!(args.fail_fast);
            assert_eq!(args.format, FormatArg::Json);
        }

        #[test]
        fn test_unknown_suite_rejected() {
            assert!(Cli::try_parse_from(["wikiprobe", "run", "--suite", "login"]).is_err());
        }

        #[test]
        fn test_config_is_global() {
            let cli = Cli::try_parse_from(["wikiprobe", "config", "--config", "x.yaml"]).unwrap();
            assert_eq!(cli.config, Some(PathBuf::from("x.yaml")));
            assert!(matches!(cli.command, Commands::Config));
        }
    }

    mod conversion_tests {
        use super::*;

        #[test]
        fn test_resolve_defaults_to_all() {
            assert_eq!(resolve_suites(&[]), SuiteKind::ALL.to_vec());
        }

        #[test]
        fn test_resolve_keeps_order_and_drops_repeats() {
            let kinds = resolve_suites(&[SuiteArg::Search, SuiteArg::Navigation, SuiteArg::Search]);
            assert_eq!(kinds, vec![SuiteKind::Search, SuiteKind::Navigation]);
        }

        #[test]
        fn test_color_and_format() {
            assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
            assert_eq!(OutputFormat::from(FormatArg::Json), OutputFormat::Json);
        }
    }
}
