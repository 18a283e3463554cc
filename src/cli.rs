use crate::config::{self, Config, MAX_CONTEXT_LINES};
use crate::patcher::PatchRule;
use anyhow::{Context, Result};
use clap::builder::RangedU64ValueParser;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "callfix")]
#[command(about = "Insert a missing argument at matching call sites in a source file")]
#[command(long_about = "callfix scans a single source file for a three-line call-argument pattern
and inserts one line before the matched line.

A line is matched when:
  • the line before it contains the previous marker  (default: 'resumeData,')
  • the line itself contains the current marker       (default: 'apiKey')
  • the line after it contains the next marker        (default: ');')
  • an anchor line (default: 'generateCustomSectionContent') appears within
    the lookback window above it                      (default: 10 lines)

The inserted line reuses the indentation in front of the current marker,
followed by the insert text (default: 'undefined,').

Matching is plain substring search, not parsing. Running twice is a no-op,
since the inserted line breaks the three-line pattern.

EXAMPLES:
  callfix src/components/ResumeForm.tsx          Patch the file in place
  callfix -d src/components/ResumeForm.tsx       Preview without writing
  callfix --anchor buildSection --lookback 5 f.ts
  callfix config --show                          Show effective configuration")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    /// File to patch (defaults to [target] path from the config file)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Dry run mode (preview changes without applying)
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Number of context lines to show (default: 2, max: 10)
    #[arg(short = 'n', long, value_name = "NUM",
          value_parser = RangedU64ValueParser::<usize>::new().range(0..=MAX_CONTEXT_LINES as u64))]
    context: Option<usize>,

    /// No context (show only inserted lines)
    #[arg(long = "no-context", conflicts_with = "context")]
    no_context: bool,

    /// Only print the completion message
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Use an alternate config file
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Write a debug log to ~/.callfix/callfix.log
    #[arg(long, global = true)]
    debug: bool,

    #[command(flatten)]
    rule: RuleOverrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Per-run overrides of the configured patch rule
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct RuleOverrides {
    /// Substring required on the line before the matched line
    #[arg(long = "previous", value_name = "TEXT")]
    pub previous_marker: Option<String>,

    /// Substring required on the matched line
    #[arg(long = "current", value_name = "TEXT")]
    pub current_marker: Option<String>,

    /// Substring required on the line after the matched line
    #[arg(long = "next", value_name = "TEXT")]
    pub next_marker: Option<String>,

    /// Anchor call name that confirms a match
    #[arg(long, value_name = "TEXT")]
    pub anchor: Option<String>,

    /// Lines above the matched line searched for the anchor
    #[arg(long, value_name = "NUM")]
    pub lookback: Option<usize>,

    /// Text of the inserted line (after indentation)
    #[arg(long = "insert", value_name = "TEXT")]
    pub insert_text: Option<String>,
}

impl RuleOverrides {
    /// Apply the flags given on the command line on top of `base`
    pub fn apply(&self, base: &PatchRule) -> PatchRule {
        let mut rule = base.clone();
        if let Some(v) = &self.previous_marker {
            rule.previous_marker = v.clone();
        }
        if let Some(v) = &self.current_marker {
            rule.current_marker = v.clone();
        }
        if let Some(v) = &self.next_marker {
            rule.next_marker = v.clone();
        }
        if let Some(v) = &self.anchor {
            rule.anchor = v.clone();
        }
        if let Some(n) = self.lookback {
            rule.lookback = n;
        }
        if let Some(v) = &self.insert_text {
            rule.insert_text = v.clone();
        }
        rule
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show configuration
    #[command(long_about = "Print the configuration file location.

The file (~/.callfix/config.toml) is created with commented defaults if missing.

CONFIGURATION OPTIONS:
  [target]
    path = \"/abs/path/File.tsx\"   # File patched when FILE is omitted

  [rule]
    previous_marker = \"resumeData,\"
    current_marker = \"apiKey\"
    next_marker = \");\"
    anchor = \"generateCustomSectionContent\"
    lookback = 10
    insert_text = \"undefined,\"

  [output]
    context_lines = 2               # Context lines to show (max 10)

  [logging]
    debug = false                   # Write ~/.callfix/callfix.log

EXAMPLES:
  callfix config                  Print the config file path
  callfix config --show           Show the effective configuration")]
    Config {
        /// Show the effective configuration
        #[arg(long = "show")]
        show: bool,
    },
}

pub fn parse_args() -> Result<Args> {
    Ok(into_args(Cli::parse()))
}

fn into_args(cli: Cli) -> Args {
    match cli.command {
        Some(Commands::Config { show }) => Args::Config {
            show,
            config: cli.config,
        },
        None => {
            // None means "use the config default"
            let context = if cli.no_context { Some(0) } else { cli.context };

            Args::Execute {
                file: cli.file,
                dry_run: cli.dry_run,
                context,
                quiet: cli.quiet,
                config: cli.config,
                debug: cli.debug,
                rule: cli.rule,
            }
        }
    }
}

/// Everything a patch run needs, after merging flags over the config file
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub file: PathBuf,
    pub rule: PatchRule,
    pub context_lines: usize,
    pub debug: bool,
}

/// Merge command-line values over `config`
///
/// Precedence is flag, then config file, then built-in default. The merged
/// rule and context are validated the same way as config values.
pub fn resolve_run(
    config: &Config,
    file: Option<PathBuf>,
    overrides: &RuleOverrides,
    context: Option<usize>,
    debug: bool,
) -> Result<RunSettings> {
    let rule = overrides.apply(&config.rule);
    config::validate_rule(&rule)?;

    let file = file
        .or_else(|| config.target.path.clone())
        .context("Missing file to patch. Usage: callfix <FILE>, or set [target] path in the config file")?;

    let context_lines = context.unwrap_or(config.output.context_lines);
    if context_lines > MAX_CONTEXT_LINES {
        anyhow::bail!("Invalid context: {} (max {})", context_lines, MAX_CONTEXT_LINES);
    }

    Ok(RunSettings {
        file,
        rule,
        context_lines,
        debug: debug || config.logging.debug,
    })
}

#[derive(Debug)]
pub enum Args {
    Execute {
        file: Option<PathBuf>,
        dry_run: bool,
        context: Option<usize>,
        quiet: bool,
        config: Option<PathBuf>,
        debug: bool,
        rule: RuleOverrides,
    },
    Config {
        show: bool,
        config: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        into_args(Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_execute_defaults() {
        match parse(&["callfix", "ResumeForm.tsx"]) {
            Args::Execute { file, dry_run, context, quiet, rule, .. } => {
                assert_eq!(file, Some(PathBuf::from("ResumeForm.tsx")));
                assert!(!dry_run);
                assert_eq!(context, None);
                assert!(!quiet);
                assert_eq!(rule.apply(&PatchRule::default()), PatchRule::default());
            }
            other => panic!("unexpected args: {:?}", other),
        }
    }

    #[test]
    fn test_no_file_is_allowed() {
        match parse(&["callfix", "--dry-run"]) {
            Args::Execute { file, dry_run, .. } => {
                assert_eq!(file, None);
                assert!(dry_run);
            }
            other => panic!("unexpected args: {:?}", other),
        }
    }

    #[test]
    fn test_no_context_flag() {
        match parse(&["callfix", "--no-context", "f.ts"]) {
            Args::Execute { context, .. } => assert_eq!(context, Some(0)),
            other => panic!("unexpected args: {:?}", other),
        }
        assert!(Cli::try_parse_from(["callfix", "--no-context", "-n", "3", "f.ts"]).is_err());
    }

    #[test]
    fn test_rule_overrides() {
        let args = parse(&[
            "callfix", "--anchor", "buildSection", "--lookback", "3", "--insert", "null,", "f.ts",
        ]);
        match args {
            Args::Execute { rule, .. } => {
                let applied = rule.apply(&PatchRule::default());
                assert_eq!(applied.anchor, "buildSection");
                assert_eq!(applied.lookback, 3);
                assert_eq!(applied.insert_text, "null,");
                assert_eq!(applied.current_marker, "apiKey");
            }
            other => panic!("unexpected args: {:?}", other),
        }
    }

    #[test]
    fn test_config_subcommand() {
        match parse(&["callfix", "config", "--show", "--config", "/tmp/c.toml"]) {
            Args::Config { show, config } => {
                assert!(show);
                assert_eq!(config, Some(PathBuf::from("/tmp/c.toml")));
            }
            other => panic!("unexpected args: {:?}", other),
        }
    }

    #[test]
    fn test_context_flag_is_limited() {
        assert!(Cli::try_parse_from(["callfix", "-n", "10", "f.ts"]).is_ok());
        assert!(Cli::try_parse_from(["callfix", "-n", "11", "f.ts"]).is_err());
    }

    // ============================================================================
    // resolve_run() tests
    // ============================================================================

    fn config_with_target(path: &str) -> Config {
        let mut config = Config::default();
        config.target.path = Some(PathBuf::from(path));
        config
    }

    #[test]
    fn test_resolve_file_argument_wins_over_config() {
        let config = config_with_target("/configured/Form.tsx");
        let settings = resolve_run(
            &config,
            Some(PathBuf::from("given.tsx")),
            &RuleOverrides::default(),
            None,
            false,
        )
        .unwrap();
        assert_eq!(settings.file, PathBuf::from("given.tsx"));
    }

    #[test]
    fn test_resolve_falls_back_to_config_target() {
        let config = config_with_target("/configured/Form.tsx");
        let settings =
            resolve_run(&config, None, &RuleOverrides::default(), None, false).unwrap();
        assert_eq!(settings.file, PathBuf::from("/configured/Form.tsx"));
        assert_eq!(settings.rule, PatchRule::default());
        assert_eq!(settings.context_lines, 2);
    }

    #[test]
    fn test_resolve_missing_file_is_error() {
        let err = resolve_run(&Config::default(), None, &RuleOverrides::default(), None, false)
            .unwrap_err();
        assert!(err.to_string().contains("Missing file to patch"));
    }

    #[test]
    fn test_resolve_context_precedence() {
        let mut config = config_with_target("f.ts");
        config.output.context_lines = 5;

        let from_config =
            resolve_run(&config, None, &RuleOverrides::default(), None, false).unwrap();
        assert_eq!(from_config.context_lines, 5);

        let from_flag =
            resolve_run(&config, None, &RuleOverrides::default(), Some(1), false).unwrap();
        assert_eq!(from_flag.context_lines, 1);

        // --no-context arrives as Some(0)
        let no_context = match parse(&["callfix", "--no-context"]) {
            Args::Execute { context, .. } => context,
            other => panic!("unexpected args: {:?}", other),
        };
        let settings =
            resolve_run(&config, None, &RuleOverrides::default(), no_context, false).unwrap();
        assert_eq!(settings.context_lines, 0);

        assert!(resolve_run(&config, None, &RuleOverrides::default(), Some(11), false).is_err());
    }

    #[test]
    fn test_resolve_rule_overrides_are_validated() {
        let config = config_with_target("f.ts");

        let overrides = RuleOverrides {
            anchor: Some(String::new()),
            ..RuleOverrides::default()
        };
        let err = resolve_run(&config, None, &overrides, None, false).unwrap_err();
        assert!(err.to_string().contains("anchor"));

        let overrides = RuleOverrides {
            insert_text: Some("null,\r".to_string()),
            ..RuleOverrides::default()
        };
        assert!(resolve_run(&config, None, &overrides, None, false).is_err());

        let overrides = RuleOverrides {
            lookback: Some(3),
            ..RuleOverrides::default()
        };
        let settings = resolve_run(&config, None, &overrides, None, false).unwrap();
        assert_eq!(settings.rule.lookback, 3);
        assert_eq!(settings.rule.anchor, "generateCustomSectionContent");
    }

    #[test]
    fn test_resolve_debug_from_flag_or_config() {
        let mut config = config_with_target("f.ts");
        let defaults = RuleOverrides::default();

        assert!(!resolve_run(&config, None, &defaults, None, false).unwrap().debug);
        assert!(resolve_run(&config, None, &defaults, None, true).unwrap().debug);

        config.logging.debug = true;
        assert!(resolve_run(&config, None, &defaults, None, false).unwrap().debug);
    }
}
