//! awg-syntax CLI tool
//!
//! Examples:
//!   awg-syntax wg0.conf                  - print with highlighting (on a TTY)
//!   awg-syntax wg0.conf --check          - report problems, exit non-zero on errors
//!   awg-syntax - --spans < wg0.conf      - dump highlights read from stdin

use std::io::{self, IsTerminal, Read};

use awg_syntax::{Category, Highlight, ObfuscationLimits, Severity, validate};
use facet::Facet;
use figue as args;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Exit codes
// ============================================================================

const EXIT_SUCCESS: i32 = 0;
const EXIT_INVALID: i32 = 1;
const EXIT_WARNINGS: i32 = 2;
const EXIT_IO_ERROR: i32 = 3;
const EXIT_USAGE: i32 = 4;

// ============================================================================
// CLI argument structures
// ============================================================================

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is unset or unparsable.
const DEFAULT_LOG_FILTER: &str = "warn";

/// `awg-syntax <file> [options]`
#[derive(Facet, Debug, Default)]
struct FileArgs {
    /// Input file path (or "-" for stdin)
    #[facet(args::positional)]
    input: String,

    /// Print one highlight per line instead of the source
    #[facet(args::named, default)]
    spans: bool,

    /// Output highlights as JSON to file (or "-" for stdout)
    #[facet(args::named, default)]
    json_out: Option<String>,

    /// Print diagnostics only
    #[facet(args::named, default)]
    check: bool,

    /// Fail on warnings as well as errors
    #[facet(args::named, default)]
    deny_warnings: bool,

    /// Skip the obfuscation consistency checks
    #[facet(args::named, default)]
    no_reconcile: bool,

    /// MTU assumed when the file has none
    #[facet(args::named, default)]
    default_mtu: Option<String>,
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let raw_args: Vec<String> = std::env::args().skip(1).collect();

    if raw_args.is_empty() {
        print_help();
        std::process::exit(EXIT_USAGE);
    }

    if raw_args[0] == "--version" || raw_args[0] == "-V" {
        println!("awg-syntax {VERSION}");
        std::process::exit(EXIT_SUCCESS);
    }

    if raw_args[0] == "--help" || raw_args[0] == "-h" {
        print_help();
        std::process::exit(EXIT_SUCCESS);
    }

    match run(&raw_args) {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

/// `RUST_LOG` directives, or [`DEFAULT_LOG_FILTER`] if there are none.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn print_help() {
    eprintln!("awg-syntax {VERSION} - highlight and check AmneziaWG configuration files\n");
    eprintln!("USAGE:");
    eprintln!("    awg-syntax <file> [options]     Use '-' to read from stdin\n");
    eprintln!("OPTIONS:");
    eprintln!("        --spans                     Print highlights as a table");
    eprintln!("        --json-out <FILE>           Output highlights as JSON (use '-' for stdout)");
    eprintln!("        --check                     Print diagnostics only");
    eprintln!("        --deny-warnings             Exit with an error on warnings");
    eprintln!("        --no-reconcile              Skip obfuscation consistency checks");
    eprintln!("        --default-mtu <N>           MTU to assume when none is set (default 1420)");
    eprintln!("    -V, --version                   Print version");
    eprintln!("    -h, --help                      Print this help\n");
    eprintln!("EXAMPLES:");
    eprintln!("    awg-syntax wg0.conf             Print with highlighting");
    eprintln!("    awg-syntax wg0.conf --check     Report problems");
    eprintln!("    awg-syntax - --spans            Dump highlights read from stdin");
    eprintln!("\nSet RUST_LOG=awg_syntax=trace to log every highlight.");
}

fn run(args: &[String]) -> Result<(), CliError> {
    let args_strs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
    let opts: FileArgs =
        figue::from_slice(&args_strs).map_err(|e| CliError::Usage(e.to_string()))?;

    if opts.check && (opts.spans || opts.json_out.is_some()) {
        return Err(CliError::Usage(
            "--check cannot be combined with --spans or --json-out".into(),
        ));
    }
    if opts.spans && opts.json_out.as_deref() == Some("-") {
        return Err(CliError::Usage(
            "--spans and --json-out - both write to stdout".into(),
        ));
    }
    let limits = limits_from(opts.default_mtu.as_deref())?;

    let source = read_input(&opts.input)?;
    let filename = if opts.input == "-" {
        "<stdin>"
    } else {
        opts.input.as_str()
    };

    let highlights = if opts.no_reconcile {
        awg_syntax::classify(&source)
    } else {
        awg_syntax::analyze_with(&source, &limits)
    };
    debug!("{} highlights in {}", highlights.len(), filename);

    let diagnostics = awg_syntax::diagnose(&source, &highlights);
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = diagnostics.len() - errors;

    if opts.check {
        for diagnostic in &diagnostics {
            diagnostic.write_report(filename, &source, io::stderr());
        }
    } else {
        if let Some(ref json_path) = opts.json_out {
            let json = highlights_to_json(&source, &highlights);
            let output = serde_json::to_string_pretty(&json)
                .map_err(|e| CliError::Io(io::Error::other(e)))?;
            write_output(json_path, &format!("{output}\n"))?;
        }
        if opts.spans {
            print!("{}", span_table(&source, &highlights));
        } else if opts.json_out.as_deref() != Some("-") {
            print_source(&source, &highlights);
        }
    }

    if errors > 0 {
        return Err(CliError::Invalid { errors, warnings });
    }
    if opts.deny_warnings && warnings > 0 {
        return Err(CliError::Warnings(warnings));
    }
    Ok(())
}

fn limits_from(default_mtu: Option<&str>) -> Result<ObfuscationLimits, CliError> {
    let mut limits = ObfuscationLimits::default();
    if let Some(mtu) = default_mtu {
        if !validate::is_valid_mtu(mtu.as_bytes()) {
            return Err(CliError::Usage(format!(
                "--default-mtu must be a number between 576 and 65535, got '{mtu}'"
            )));
        }
        limits.default_mtu = mtu
            .parse()
            .map_err(|_| CliError::Usage(format!("invalid --default-mtu '{mtu}'")))?;
    }
    Ok(limits)
}

// ============================================================================

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Invalid { errors: usize, warnings: usize },
    Warnings(usize),
    Usage(String),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Io(_) => EXIT_IO_ERROR,
            CliError::Invalid { .. } => EXIT_INVALID,
            CliError::Warnings(_) => EXIT_WARNINGS,
            CliError::Usage(_) => EXIT_USAGE,
        }
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "{e}"),
            CliError::Invalid {
                errors,
                warnings: 0,
            } => write!(f, "found {}", plural(*errors, "error")),
            CliError::Invalid { errors, warnings } => write!(
                f,
                "found {} and {}",
                plural(*errors, "error"),
                plural(*warnings, "warning")
            ),
            CliError::Warnings(n) => {
                write!(f, "found {} (denied)", plural(*n, "warning"))
            }
            CliError::Usage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

// ============================================================================
// I/O helpers
// ============================================================================

fn read_input(path: &str) -> Result<String, io::Error> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| io::Error::new(e.kind(), format!("{path}: {e}")))
    }
}

fn write_output(path: &str, content: &str) -> Result<(), io::Error> {
    if path == "-" {
        print!("{content}");
        Ok(())
    } else {
        std::fs::write(path, content)
    }
}

// ============================================================================
// Output formats
// ============================================================================

fn highlights_to_json(source: &str, highlights: &[Highlight]) -> serde_json::Value {
    serde_json::Value::Array(
        highlights
            .iter()
            .map(|h| {
                serde_json::json!({
                    "start": h.span.start,
                    "len": h.len(),
                    "category": h.category.as_str(),
                    "text": h.text(source),
                })
            })
            .collect(),
    )
}

/// One `start len category text` row per highlight.
fn span_table(source: &str, highlights: &[Highlight]) -> String {
    let mut out = String::new();
    for h in highlights {
        out.push_str(&format!(
            "{:<6}{:<4}{:<14}{}\n",
            h.start(),
            h.len(),
            h.category,
            h.text(source).escape_debug()
        ));
    }
    out
}

/// ANSI color codes for highlight categories
mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const COMMENT: &str = "\x1b[38;5;243m"; // Gray
    pub const SECTION: &str = "\x1b[1;38;5;203m"; // Bold red
    pub const FIELD: &str = "\x1b[38;5;75m"; // Blue
    pub const DELIMITER: &str = "\x1b[38;5;250m"; // Light gray
    pub const KEY: &str = "\x1b[38;5;214m"; // Orange
    pub const ADDRESS: &str = "\x1b[38;5;80m"; // Cyan
    pub const NUMBER: &str = "\x1b[38;5;141m"; // Purple
    pub const COMMAND: &str = "\x1b[38;5;71m"; // Green
    pub const OBFUSCATION: &str = "\x1b[38;5;177m"; // Pink
    pub const WARNING: &str = "\x1b[4;38;5;220m"; // Underlined yellow
    pub const ERROR: &str = "\x1b[4;38;5;196m"; // Underlined red
}

fn ansi_color_for_category(category: Category) -> &'static str {
    match category {
        Category::Section => ansi::SECTION,
        Category::Field => ansi::FIELD,
        Category::Delimiter => ansi::DELIMITER,
        Category::Comment => ansi::COMMENT,
        Category::PrivateKey | Category::PublicKey | Category::PresharedKey => ansi::KEY,
        Category::IpAddress | Category::Hostname => ansi::ADDRESS,
        Category::CidrSuffix
        | Category::Port
        | Category::Mtu
        | Category::Table
        | Category::KeepAlive => ansi::NUMBER,
        Category::Command => ansi::COMMAND,
        Category::Jc
        | Category::Jmin
        | Category::Jmax
        | Category::S1
        | Category::S2
        | Category::H1
        | Category::H2
        | Category::H3
        | Category::H4 => ansi::OBFUSCATION,
        Category::Warning => ansi::WARNING,
        Category::Error => ansi::ERROR,
    }
}

/// Wrap every highlight in its color, leaving the text between them alone
fn highlight_source(source: &str, highlights: &[Highlight]) -> String {
    let mut result = String::with_capacity(source.len() * 2);
    let mut last_end = 0;

    for h in highlights {
        let range: std::ops::Range<usize> = h.span.into();
        if range.start > last_end {
            result.push_str(&source[last_end..range.start]);
        }
        result.push_str(ansi_color_for_category(h.category));
        result.push_str(&source[range.clone()]);
        result.push_str(ansi::RESET);
        last_end = range.end;
    }

    if last_end < source.len() {
        result.push_str(&source[last_end..]);
    }

    result
}

/// Print the source with highlighting if stdout is a TTY
fn print_source(source: &str, highlights: &[Highlight]) {
    if io::stdout().is_terminal() {
        print!("{}", highlight_source(source, highlights));
    } else {
        print!("{source}");
    }
}
