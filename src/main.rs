use anyhow::Result;
use callfix::cli::{parse_args, resolve_run, Args, RuleOverrides};
use callfix::config::{self, Config};
use callfix::diff_formatter::DiffFormatter;
use callfix::file_processor::LinePatcher;
use callfix::logger;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let args = parse_args()?;

    match args {
        Args::Execute {
            file,
            dry_run,
            context,
            quiet,
            config,
            debug,
            rule,
        } => {
            let config = load_config(config.as_deref())?;
            execute_command(&config, file, &rule, dry_run, context, quiet, debug)?;
        }
        Args::Config { show, config } => {
            show_config(config.as_deref(), show)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    }
}

fn execute_command(
    config: &Config,
    file: Option<PathBuf>,
    overrides: &RuleOverrides,
    dry_run: bool,
    context: Option<usize>,
    quiet: bool,
    debug: bool,
) -> Result<()> {
    let settings = resolve_run(config, file, overrides, context, debug)?;

    if let Some(log_path) = logger::init_debug_logging(settings.debug)? {
        tracing::info!(log = %log_path.display(), "debug logging enabled");
    }

    tracing::info!(file = %settings.file.display(), dry_run, rule = ?settings.rule, "processing file");

    let patcher = LinePatcher::new(settings.rule);
    let diff = if dry_run {
        patcher.process_file(&settings.file)?
    } else {
        patcher.apply_to_file(&settings.file)?
    };

    if !quiet {
        if dry_run {
            print!("{}", DiffFormatter::format_dry_run_header(&diff.file_path));
        }
        if diff.has_changes() {
            print!("{}", DiffFormatter::format_diff_with_context(&diff, settings.context_lines));
            println!();
        }
        print!("{}", DiffFormatter::format_summary(&diff, !dry_run));
    }

    println!("Finished processing file.");

    Ok(())
}

fn show_config(path: Option<&Path>, show: bool) -> Result<()> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => config::config_file_path()?,
    };

    let config = config::load_config_from(&config_path)?;
    println!("Config file: {}", config_path.display());

    if show {
        println!();
        print!("{}", config::to_toml(&config)?);
    }

    Ok(())
}
