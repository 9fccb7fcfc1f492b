use std::path::PathBuf;
use std::process::ExitCode;
use clap::{Args, Parser, Subcommand};
use anyhow::Result;

use jsext::batch::{BatchRewriter, WriteMode};
use jsext::classifier::classify_text;
use jsext::config::Config;
use jsext::output::{Explanation, OutputFormat, OutputFormatter, RewriteStats};
use jsext::JS_EXTENSION;

mod logger;

#[derive(Parser)]
#[command(name = "jsext")]
#[command(about = "Append .js extensions to relative ES module specifiers")]
#[command(version)]
struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors and suppress summary lines
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ForceRules {
    /// Regex of specifiers to rewrite even when not relative (repeatable)
    #[arg(long = "force-include", value_name = "REGEX")]
    include: Vec<String>,

    /// Regex of specifiers never force-included (repeatable)
    #[arg(long = "force-exclude", value_name = "REGEX")]
    exclude: Vec<String>,

    /// Also rewrite `import('./x')` calls with a literal argument
    #[arg(long)]
    dynamic_imports: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite module specifiers in files or directories
    Rewrite {
        /// Files or directories to process (defaults to the root)
        paths: Vec<PathBuf>,

        /// Project root directory
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Write changes back to disk
        #[arg(short, long)]
        write: bool,

        /// Exit with a failure code if any file would change
        #[arg(long, conflicts_with = "write")]
        check: bool,

        /// Output format: list, json
        #[arg(short, long, default_value = "list")]
        format: String,

        #[command(flatten)]
        rules: ForceRules,
    },

    /// Explain how a single specifier would be treated
    Explain {
        /// The module specifier, e.g. ./utils or my-pkg
        specifier: String,

        /// Project root directory
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Output format: list, json
        #[arg(short, long, default_value = "list")]
        format: String,

        #[command(flatten)]
        rules: ForceRules,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Rewrite { paths, root, write, check, format, rules } => {
            run_rewrite(paths, root, write, check, cli.quiet, format, rules)
        }
        Commands::Explain { specifier, root, format, rules } => {
            run_explain(specifier, root, format, rules)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn get_root(root: Option<PathBuf>) -> PathBuf {
    root.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn load_config(root: &PathBuf, rules: &ForceRules) -> Result<Config> {
    let mut config = Config::load(root)?;
    config.extend_with(&rules.include, &rules.exclude, rules.dynamic_imports);
    Ok(config)
}

fn parse_format(format: &str) -> Result<OutputFormat> {
    format.parse().map_err(|e: String| anyhow::anyhow!(e))
}

fn run_rewrite(
    paths: Vec<PathBuf>,
    root: Option<PathBuf>,
    write: bool,
    check: bool,
    quiet: bool,
    format: String,
    rules: ForceRules,
) -> Result<ExitCode> {
    let root = get_root(root);
    let output_format = parse_format(&format)?;
    let config = load_config(&root, &rules)?;

    let batch = BatchRewriter::new(root.clone(), config)?;
    let mode = if write { WriteMode::Write } else { WriteMode::DryRun };
    let summary = batch.run(&paths, mode)?;

    let output = match output_format {
        OutputFormat::List => OutputFormatter::format_list(&summary, &root),
        OutputFormat::Json => OutputFormatter::format_json(&summary, &root),
    };
    if !output.is_empty() {
        println!("{}", output);
    }

    let stats = OutputFormatter::stats(&summary);
    if !quiet {
        for line in status_lines(&stats, write, check) {
            eprintln!("{}", line);
        }
    }

    if check && stats.changed_files > 0 {
        return Ok(ExitCode::FAILURE);
    }

    if stats.failed_files > 0 {
        return Ok(ExitCode::from(2));
    }

    Ok(ExitCode::SUCCESS)
}

fn status_lines(stats: &RewriteStats, write: bool, check: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if write {
        lines.push(format!(
            "Rewrote {} specifiers in {} of {} files.",
            stats.rewritten_specifiers, stats.changed_files, stats.scanned_files
        ));
    } else if stats.changed_files == 0 {
        lines.push(format!("All {} files already use explicit extensions.", stats.scanned_files));
    }
    if check && stats.changed_files > 0 {
        lines.push(format!("{} files need rewriting.", stats.changed_files));
    }
    lines
}

fn run_explain(
    specifier: String,
    root: Option<PathBuf>,
    format: String,
    rules: ForceRules,
) -> Result<ExitCode> {
    let root = get_root(root);
    let output_format = parse_format(&format)?;
    let rewrite = load_config(&root, &rules)?.rewrite_config()?;

    let verdict = classify_text(&specifier, &rewrite);
    let explanation = Explanation {
        specifier: &specifier,
        verdict,
        reason: verdict.describe(),
        rewritten: verdict
            .should_rewrite()
            .then(|| format!("{}{}", specifier, JS_EXTENSION)),
    };

    println!("{}", OutputFormatter::format_explanation(&explanation, output_format));
    Ok(ExitCode::SUCCESS)
}
