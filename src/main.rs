//! linehound: recursive text search CLI.
//!
//! Usage:
//!   linehound PATTERN [PATH...]             # search files
//!   linehound -r -i -C 2 "fn main" src/     # recursive, folded, context
//!   linehound --json --stats PATTERN        # machine-readable output
//!
//! Exit codes: 0 when at least one match was found, 1 when none, 2 on
//! errors. A search cut short by `--timeout` still reports its partial
//! matches and exits by match count.

use anyhow::Context;
use clap::Parser;
use linehound::{fmt, SearchConfig, SearchError, SearchResults};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linehound")]
#[command(about = "Recursive text search with gitignore support")]
#[command(version)]
struct Cli {
    /// Pattern to search for (literal or regex)
    pattern: String,

    /// Paths to search (default: current directory)
    paths: Vec<PathBuf>,

    /// Case-insensitive matching
    #[arg(short = 'i', long = "ignore-case")]
    ignore_case: bool,

    /// Context lines around each match
    #[arg(short = 'C', long = "context", value_name = "N", default_value_t = 0)]
    context: usize,

    /// Stop after N matches
    #[arg(short = 'm', long = "max-count", value_name = "N", default_value_t = 1000)]
    max_count: usize,

    /// Worker thread count
    #[arg(long, value_name = "N", default_value_t = 4)]
    workers: usize,

    /// Per-path timeout, e.g. 500ms, 2s, 1m (bare numbers are seconds)
    #[arg(long, value_name = "D", value_parser = parse_duration)]
    timeout: Option<Duration>,

    /// Include hidden files and skip-listed directories
    #[arg(long)]
    hidden: bool,

    /// Follow symbolic links
    #[arg(short = 'L', long = "follow")]
    follow: bool,

    /// Honor .gitignore files
    #[arg(long, value_name = "BOOL", default_value_t = true, action = clap::ArgAction::Set)]
    gitignore: bool,

    /// Recurse into subdirectories
    #[arg(short = 'r', long)]
    recursive: bool,

    /// Only search files whose basename matches GLOB
    #[arg(short = 'g', long, value_name = "GLOB")]
    glob: Option<String>,

    /// Emit results as JSON
    #[arg(long)]
    json: bool,

    /// Print a statistics summary after the matches
    #[arg(long)]
    stats: bool,
}

fn parse_duration(arg: &str) -> Result<Duration, String> {
    let (number, unit) = match arg.find(|c: char| c.is_ascii_alphabetic()) {
        Some(split) => arg.split_at(split),
        None => (arg, "s"),
    };
    let value: f64 = number
        .parse()
        .map_err(|_| format!("invalid duration: {arg:?}"))?;
    if value < 0.0 {
        return Err(format!("invalid duration: {arg:?}"));
    }
    let seconds = match unit {
        "ms" => value / 1000.0,
        "s" => value,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        _ => return Err(format!("unknown duration unit: {unit:?}")),
    };
    Ok(Duration::from_secs_f64(seconds))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("linehound: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let config = SearchConfig {
        recursive: cli.recursive,
        case_insensitive: cli.ignore_case,
        include_hidden: cli.hidden,
        follow_symlinks: cli.follow,
        use_gitignore: cli.gitignore,
        file_glob: cli.glob.clone(),
        max_results: cli.max_count,
        context_lines: cli.context,
        workers: cli.workers,
        timeout: cli.timeout,
        ..SearchConfig::default()
    };

    let paths = if cli.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        cli.paths.clone()
    };

    let mut combined: Option<SearchResults> = None;
    for path in &paths {
        let results = match linehound::find(&cli.pattern, path, config.clone()) {
            Ok(results) => results,
            Err(SearchError::Cancelled { results }) => {
                // The CLI's only cancellation source is the requested
                // timeout; report the partial results without failing.
                tracing::warn!("search of {} timed out; results are partial", path.display());
                *results
            }
            Err(e) => {
                return Err(e).with_context(|| format!("searching {}", path.display()));
            }
        };
        combined = Some(match combined {
            Some(acc) => merge(acc, results),
            None => results,
        });
    }

    let results = combined.unwrap_or_else(|| SearchResults::empty(&cli.pattern));
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&results)?)?;
    } else {
        fmt::fmt_matches(&mut out, &results)?;
        if cli.stats {
            fmt::fmt_stats(&mut out, &results)?;
        }
    }

    Ok(results.has_matches())
}

/// Folds the results of one search root into the running totals.
fn merge(mut acc: SearchResults, next: SearchResults) -> SearchResults {
    acc.matches.extend(next.matches);
    acc.stats.files_scanned += next.stats.files_scanned;
    acc.stats.files_skipped += next.stats.files_skipped;
    acc.stats.files_ignored += next.stats.files_ignored;
    acc.stats.bytes_scanned += next.stats.bytes_scanned;
    acc.stats.matches_found += next.stats.matches_found;
    acc.stats.duration += next.stats.duration;
    acc.stats.end_time = next.stats.end_time;
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_forms() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
        assert!(parse_duration("5fortnights").is_err());
        assert!(parse_duration("oops").is_err());
    }

    #[test]
    fn test_cli_parses_short_and_long_flags() {
        let cli = Cli::parse_from([
            "linehound",
            "-r",
            "-i",
            "-C",
            "2",
            "-m",
            "50",
            "--gitignore",
            "false",
            "-g",
            "*.rs",
            "pattern",
            "src",
        ]);
        assert!(cli.recursive);
        assert!(cli.ignore_case);
        assert_eq!(cli.context, 2);
        assert_eq!(cli.max_count, 50);
        assert!(!cli.gitignore);
        assert_eq!(cli.glob.as_deref(), Some("*.rs"));
        assert_eq!(cli.pattern, "pattern");
        assert_eq!(cli.paths, vec![PathBuf::from("src")]);
    }

    #[test]
    fn test_gitignore_defaults_on() {
        let cli = Cli::parse_from(["linehound", "x"]);
        assert!(cli.gitignore);
        assert!(cli.paths.is_empty());
    }
}
