use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser as ClapParser};
use tracing::{Level, debug};

use httpframe::{
    HttpMessage, ParserConfig, ParserKind, format_debug, format_headers_only, format_json,
    parse_messages,
};

/// httpframe CLI: incremental HTTP/1.x message parser.
///
/// Reads raw HTTP messages from a file, --raw string, or stdin and outputs
/// a structured representation of each message in the chosen format.
///
/// Escape sequences (\r, \n, \t, \\) in the --raw value are interpreted so
/// you can pass a full HTTP message as a single shell argument.
#[derive(ClapParser)]
#[command(name = "httpframe-cli", version, about, long_about = None)]
struct Cli {
    /// Path to a file containing raw HTTP messages.
    /// Reads from stdin when neither FILE nor --raw is given.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Raw HTTP message string (escape sequences \r \n \t \\ are expanded).
    #[arg(long)]
    raw: Option<String>,

    /// Which messages to expect.
    #[arg(short, long, default_value = "both", value_enum)]
    kind: Kind,

    /// Output format.
    #[arg(short, long, default_value = "json", value_enum)]
    format: OutputFormat,

    /// Pretty-print JSON output (ignored for other formats).
    #[arg(short, long)]
    pretty: bool,

    /// Accept obsolete header line folding.
    #[arg(long)]
    allow_obs_fold: bool,

    /// Accept Transfer-Encoding together with Content-Length.
    #[arg(long)]
    allow_chunked_with_content_length: bool,

    /// Maximum size of the header section in bytes (0 for no limit).
    #[arg(long, default_value = "81920")]
    max_header_size: usize,

    /// Maximum number of headers allowed.
    #[arg(long, default_value = "128")]
    max_headers: usize,

    /// Log parser activity to stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Kind {
    Request,
    Response,
    Both,
}

impl From<Kind> for ParserKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Request => ParserKind::Request,
            Kind::Response => ParserKind::Response,
            Kind::Both => ParserKind::Both,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable debug output
    Debug,
    /// Start line + headers only
    Headers,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // When no input source is provided and stdin is a terminal (not piped),
    // show help instead of blocking.
    if cli.file.is_none() && cli.raw.is_none() && std::io::stdin().is_terminal() {
        Cli::command().print_help().ok();
        println!();
        process::exit(0);
    }

    let data = match read_input(&cli) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading input: {e}");
            process::exit(1);
        }
    };

    if data.is_empty() {
        eprintln!("Error: empty input");
        process::exit(1);
    }
    debug!(bytes = data.len(), kind = ?cli.kind, "parsing input");

    let config = ParserConfig {
        max_header_size: (cli.max_header_size > 0).then_some(cli.max_header_size),
        max_headers_count: cli.max_headers,
        allow_obs_fold: cli.allow_obs_fold,
        allow_chunked_with_content_length: cli.allow_chunked_with_content_length,
        ..ParserConfig::default()
    };

    let messages = match parse_messages(cli.kind.into(), &data, config) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Parse error: {e}");
            process::exit(2);
        }
    };

    for message in &messages {
        print!("{}", render(&cli, message));
        if matches!(cli.format, OutputFormat::Json) {
            println!();
        }
    }
}

fn render(cli: &Cli, message: &HttpMessage) -> String {
    match cli.format {
        OutputFormat::Json => format_json(message, cli.pretty),
        OutputFormat::Debug => format_debug(message),
        OutputFormat::Headers => format_headers_only(message),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Read raw HTTP bytes from --raw, a file, or stdin.
fn read_input(cli: &Cli) -> Result<Vec<u8>, std::io::Error> {
    if let Some(raw) = &cli.raw {
        return Ok(unescape(raw).into_bytes());
    }
    match &cli.file {
        Some(path) => std::fs::read(path),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Expand C-style escape sequences (`\r`, `\n`, `\t`, `\\`) in a string.
///
/// Any other `\X` sequence is kept as-is (both the backslash and `X`).
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('r') => out.push('\r'),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}
